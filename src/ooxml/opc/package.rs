//! The in-memory OPC package: a part graph addressable by [`PackURI`], built
//! by unmarshalling a [`PackageReader`] walk of a physical ZIP archive.
//!
//! This is a read-only view by design (see the crate's Non-goals: the
//! validator never mutates its input), so there is no writer counterpart -
//! only the operations a validation pipeline needs to enumerate parts,
//! look one up by name or relationship type, and reach package-level
//! relationships.

use crate::ooxml::opc::constants::relationship_type;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{PACKAGE_URI, PackURI};
use crate::ooxml::opc::part::{Part, PartFactory};
use crate::ooxml::opc::phys_pkg::{OwnedPhysPkgReader, PhysPkgReader};
use crate::ooxml::opc::pkgreader::PackageReader;
use crate::ooxml::opc::rel::Relationships;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// An Open Packaging Conventions package, loaded entirely into memory.
///
/// Holds every part reachable from the package's relationship graph, each
/// with its own relationship collection, plus the package-level
/// relationships rooted at `_rels/.rels`.
pub struct OpcPackage {
    /// Package-level relationships
    rels: Relationships,

    /// All parts in the package, indexed by partname
    parts: HashMap<PackURI, Box<dyn Part + Send + Sync>>,

    /// Malformed-package conditions found while loading (missing content
    /// type, dangling relationship target) that didn't abort the load but
    /// that a validator should surface as `Package` errors.
    load_warnings: Vec<String>,
}

impl std::fmt::Debug for OpcPackage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpcPackage")
            .field("rels", &self.rels)
            .field("parts_count", &self.parts.len())
            .finish()
    }
}

impl OpcPackage {
    /// Open an OPC package from a file.
    ///
    /// # Example
    /// ```no_run
    /// use litchi::ooxml::opc::package::OpcPackage;
    ///
    /// let pkg = OpcPackage::open("document.docx").unwrap();
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let owned_reader = OwnedPhysPkgReader::open(path)?;
        let phys_reader = owned_reader.reader()?;
        let pkg_reader = PackageReader::from_phys_reader(&phys_reader)?;
        Self::unmarshal(pkg_reader)
    }

    /// Load an OPC package from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let owned_reader = OwnedPhysPkgReader::from_reader(reader)?;
        let phys_reader = owned_reader.reader()?;
        let pkg_reader = PackageReader::from_phys_reader(&phys_reader)?;
        Self::unmarshal(pkg_reader)
    }

    /// Load an OPC package from a byte slice, without copying it onto the heap twice.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let phys_reader = PhysPkgReader::new(data)?;
        let pkg_reader = PackageReader::from_phys_reader(&phys_reader)?;
        Self::unmarshal(pkg_reader)
    }

    /// Unmarshal a package from a package reader: convert serialized parts
    /// and relationships into the in-memory object graph.
    fn unmarshal(mut pkg_reader: PackageReader) -> Result<Self> {
        let pkg_srels = pkg_reader.take_pkg_srels();
        let sparts = pkg_reader.take_sparts();
        let load_warnings = pkg_reader.take_load_warnings();

        let mut parts_map: HashMap<PackURI, Box<dyn Part + Send + Sync>> =
            HashMap::with_capacity(sparts.len());

        for spart in sparts {
            let partname = spart.partname.clone();
            let mut part = PartFactory::load(spart.partname, spart.content_type, spart.blob)?;

            for srel in spart.srels {
                let is_external = srel.is_external();
                part.rels_mut()
                    .add_relationship(srel.reltype, srel.target_ref, srel.r_id, is_external);
            }

            parts_map.insert(partname, part);
        }

        let mut rels = Relationships::new(PACKAGE_URI.to_string());
        for srel in pkg_srels {
            let is_external = srel.is_external();
            rels.add_relationship(srel.reltype, srel.target_ref, srel.r_id, is_external);
        }

        Ok(Self {
            rels,
            parts: parts_map,
            load_warnings,
        })
    }

    /// Get a reference to the main document part (document.xml / workbook.xml / presentation.xml).
    pub fn main_document_part(&self) -> Result<&dyn Part> {
        let rel = self
            .rels
            .part_with_reltype(relationship_type::OFFICE_DOCUMENT)?;
        let partname = rel.target_partname()?;
        self.get_part(&partname)
    }

    /// Get a part by its partname.
    pub fn get_part(&self, partname: &PackURI) -> Result<&dyn Part> {
        self.parts
            .get(partname)
            .map(|b| &**b as &dyn Part)
            .ok_or_else(|| OpcError::PartNotFound(partname.to_string()))
    }

    /// Get a part by relationship type from the package level.
    pub fn part_by_reltype(&self, reltype: &str) -> Result<&dyn Part> {
        let rel = self.rels.part_with_reltype(reltype)?;
        let partname = rel.target_partname()?;
        self.get_part(&partname)
    }

    /// Iterate over every part in the package, in no particular order
    /// (callers that need document order should sort by [`PackURI`]).
    pub fn iter_parts(&self) -> impl Iterator<Item = &dyn Part> {
        self.parts.values().map(|b| &**b as &dyn Part)
    }

    /// The number of parts in the package.
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// The package-level relationships (rooted at `_rels/.rels`).
    pub fn rels(&self) -> &Relationships {
        &self.rels
    }

    /// Whether a part with this partname exists in the package.
    pub fn contains_part(&self, partname: &PackURI) -> bool {
        self.parts.contains_key(partname)
    }

    /// Malformed-package conditions discovered while loading (missing
    /// content type, dangling relationship target) that a validator should
    /// report as `Package` errors.
    pub fn load_warnings(&self) -> &[String] {
        &self.load_warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soapberry_zip::office::StreamingArchiveWriter;
    use std::io::Cursor;

    fn create_minimal_docx() -> Vec<u8> {
        let mut writer = StreamingArchiveWriter::new();

        writer
            .write_deflated(
                "[Content_Types].xml",
                br#"<?xml version="1.0"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#,
            )
            .unwrap();

        writer
            .write_deflated(
                "_rels/.rels",
                br#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#,
            )
            .unwrap();

        writer
            .write_deflated(
                "word/document.xml",
                br#"<?xml version="1.0"?>
<document xmlns="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
    <body><p><t>Test</t></p></body>
</document>"#,
            )
            .unwrap();

        writer.finish_to_bytes().unwrap()
    }

    #[test]
    fn test_open_package() {
        let zip_data = create_minimal_docx();
        let cursor = Cursor::new(zip_data);
        let pkg = OpcPackage::from_reader(cursor).unwrap();

        assert!(pkg.part_count() > 0);
    }

    #[test]
    fn test_main_document_part() {
        let zip_data = create_minimal_docx();
        let cursor = Cursor::new(zip_data);
        let pkg = OpcPackage::from_reader(cursor).unwrap();

        let main_part = pkg.main_document_part().unwrap();
        assert_eq!(
            main_part.content_type(),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"
        );
    }
}
