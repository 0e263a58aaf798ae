//! Provides a general interface to a physical OPC package (ZIP file).
//!
//! This module handles the low-level reading of OPC packages from ZIP
//! archives, built on `soapberry_zip`'s slice-backed reader rather than
//! streaming I/O: a validation run needs random access to every part, so
//! the whole archive is decompressed up front (in parallel, see
//! [`PhysPkgReader::archive`]) instead of being read lazily part by part.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use soapberry_zip::office::ArchiveReader;

use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;

/// Owns the raw archive bytes so a borrowed [`PhysPkgReader`] can be handed
/// out without the caller juggling a lifetime over a temporary file read.
pub struct OwnedPhysPkgReader {
    bytes: Vec<u8>,
}

impl OwnedPhysPkgReader {
    /// Read an OPC package's raw bytes from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(OpcError::PackageNotFound(path.display().to_string()));
        }
        let bytes = std::fs::read(path)?;
        Ok(Self { bytes })
    }

    /// Read an OPC package's raw bytes from any [`Read`] stream.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(Self { bytes })
    }

    /// Borrow a [`PhysPkgReader`] over the owned bytes.
    pub fn reader(&self) -> Result<PhysPkgReader<'_>> {
        PhysPkgReader::new(&self.bytes)
    }
}

/// Physical package reader that provides access to parts in a ZIP-based OPC
/// package. Wraps `soapberry_zip`'s slice archive, which indexes the central
/// directory eagerly and decompresses entries lazily (or in bulk via
/// [`Self::archive`]'s `read_all_parallel`).
pub struct PhysPkgReader<'data> {
    archive: ArchiveReader<'data>,
}

impl<'data> PhysPkgReader<'data> {
    /// Open an OPC package directly from an in-memory byte slice.
    pub fn new(data: &'data [u8]) -> Result<Self> {
        let archive = ArchiveReader::new(data).map_err(|e| OpcError::ZipError(e.to_string()))?;
        Ok(Self { archive })
    }

    /// Open an OPC package from a file path, loading it entirely into memory
    /// by way of a temporary owned buffer.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<OwnedPhysPkgReader> {
        OwnedPhysPkgReader::open(path)
    }

    /// The underlying archive reader, for bulk parallel decompression.
    pub fn archive(&self) -> &ArchiveReader<'data> {
        &self.archive
    }

    /// Get the binary content for a part by its PackURI.
    pub fn blob_for(&self, pack_uri: &PackURI) -> Result<Vec<u8>> {
        self.archive
            .read(pack_uri.membername())
            .map_err(|_| OpcError::PartNotFound(pack_uri.to_string()))
    }

    /// Get the `[Content_Types].xml` content.
    pub fn content_types_xml(&self) -> Result<Vec<u8>> {
        let content_types_uri = PackURI::new(crate::ooxml::opc::packuri::CONTENT_TYPES_URI)
            .map_err(OpcError::InvalidPackUri)?;
        self.blob_for(&content_types_uri)
    }

    /// Get the relationships XML for a specific source URI, or `None` if
    /// the source has no `.rels` part.
    pub fn rels_xml_for(&self, source_uri: &PackURI) -> Result<Option<Vec<u8>>> {
        let rels_uri = source_uri.rels_uri().map_err(OpcError::InvalidPackUri)?;
        match self.blob_for(&rels_uri) {
            Ok(blob) => Ok(Some(blob)),
            Err(OpcError::PartNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Get the number of files in the package.
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    /// Check if the package is empty.
    pub fn is_empty(&self) -> bool {
        self.archive.is_empty()
    }

    /// List all member names in the package.
    pub fn member_names(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }

    /// Check if a specific member exists in the package.
    pub fn contains(&self, pack_uri: &PackURI) -> bool {
        self.archive.contains(pack_uri.membername())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soapberry_zip::office::StreamingArchiveWriter;

    #[test]
    fn test_reader_from_slice() {
        let mut writer = StreamingArchiveWriter::new();
        writer.write_deflated("test.txt", b"Hello, World!").unwrap();
        let zip_data = writer.finish_to_bytes().unwrap();

        let reader = PhysPkgReader::new(&zip_data).unwrap();
        let pack_uri = PackURI::new("/test.txt").unwrap();
        let content = reader.blob_for(&pack_uri).unwrap();
        assert_eq!(content, b"Hello, World!");
    }

    #[test]
    fn test_contains_and_member_names() {
        let mut writer = StreamingArchiveWriter::new();
        writer.write_deflated("a.xml", b"<a/>").unwrap();
        writer.write_deflated("b.xml", b"<b/>").unwrap();
        let zip_data = writer.finish_to_bytes().unwrap();

        let reader = PhysPkgReader::new(&zip_data).unwrap();
        assert!(reader.contains(&PackURI::new("/a.xml").unwrap()));
        assert!(!reader.contains(&PackURI::new("/missing.xml").unwrap()));
        assert_eq!(reader.member_names().len(), 2);
    }
}
