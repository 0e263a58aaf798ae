//! Minimal ODF (OpenDocument Format) package validation.
//!
//! ODT/ODS/ODP packages are ZIP archives but not OPC containers - there is
//! no `[Content_Types].xml`, no relationship graph, and the part layout
//! the rest of this crate assumes does not apply. This module is
//! deliberately narrow: it checks the `mimetype` entry and
//! `META-INF/manifest.xml` the ODF spec requires every package to carry,
//! and that the manifest's declared entries actually exist in the
//! archive. A full schema/schematron validator for ODF is a separate
//! system and out of scope here.

use soapberry_zip::office::ArchiveReader;

use crate::ooxml::xmltree::{self, XmlNode};
use crate::validate::error::{ErrorKind, Severity, ValidationError};
use crate::validate::options::FileFormat;
use crate::validate::result::ValidationResult;

const MIMETYPE_ENTRY: &str = "mimetype";
const MANIFEST_ENTRY: &str = "META-INF/manifest.xml";
/// Some ODF producers place the manifest at the archive root instead.
const MANIFEST_ENTRY_FALLBACK: &str = "manifest.xml";
const MANIFEST_NAMESPACE: &str = "urn:oasis:names:tc:opendocument:xmlns:manifest:1.0";

/// One `<manifest:file-entry>` declared by an ODF package's manifest.
#[derive(Debug, Clone)]
pub struct OdfManifestEntry {
    pub full_path: String,
    pub media_type: String,
}

/// Validates an ODF package's structure against the minimal checks this
/// crate performs for the format (mimetype entry, manifest presence and
/// well-formedness, manifest entries resolving to real archive members).
pub struct OdfValidator {
    format: FileFormat,
}

impl OdfValidator {
    pub fn new(format: FileFormat) -> Self {
        Self { format }
    }

    pub fn validate_bytes(&self, data: &[u8]) -> ValidationResult {
        self.validate_bytes_with_path(data, None)
    }

    pub fn validate_path<P: AsRef<std::path::Path>>(&self, path: P) -> ValidationResult {
        let path = path.as_ref();
        match std::fs::read(path) {
            Ok(data) => self.validate_bytes_with_path(&data, Some(path.display().to_string())),
            Err(e) => {
                let error = ValidationError::new(ErrorKind::Package, Severity::Error, format!("Cannot read package: {e}"), "", "");
                ValidationResult::new(vec![error], Some(path.display().to_string()), self.format)
            }
        }
    }

    fn validate_bytes_with_path(&self, data: &[u8], file_path: Option<String>) -> ValidationResult {
        let mut errors = Vec::new();

        let archive = match ArchiveReader::new(data) {
            Ok(archive) => archive,
            Err(e) => {
                errors.push(ValidationError::new(ErrorKind::Package, Severity::Error, format!("Cannot open package as a ZIP archive: {e}"), "", ""));
                return ValidationResult::new(errors, file_path, self.format);
            }
        };

        if !archive.contains(MIMETYPE_ENTRY) {
            errors.push(ValidationError::new(ErrorKind::Package, Severity::Error, "Missing mimetype entry", MIMETYPE_ENTRY, ""));
        }

        let manifest_bytes = archive.read(MANIFEST_ENTRY).or_else(|_| archive.read(MANIFEST_ENTRY_FALLBACK));
        match manifest_bytes {
            Err(_) => {
                errors.push(ValidationError::new(ErrorKind::Package, Severity::Error, "Missing META-INF/manifest.xml", MANIFEST_ENTRY, ""));
            },
            Ok(bytes) => match xmltree::parse(&bytes) {
                Err(e) => {
                    errors.push(ValidationError::new(ErrorKind::Schema, Severity::Error, format!("Invalid manifest.xml: {e}"), MANIFEST_ENTRY, ""));
                },
                Ok(root) => self.check_manifest(&archive, &root, &mut errors),
            },
        }

        ValidationResult::new(errors, file_path, self.format)
    }

    fn check_manifest(&self, archive: &ArchiveReader<'_>, root: &XmlNode, errors: &mut Vec<ValidationError>) {
        let entries = manifest_entries(root);
        if entries.is_empty() {
            errors.push(ValidationError::new(ErrorKind::Schema, Severity::Warning, "Manifest declares no file entries", MANIFEST_ENTRY, ""));
            return;
        }
        for entry in &entries {
            let full_path = entry.full_path.trim_start_matches('/');
            if full_path.is_empty() || full_path == "/" {
                continue;
            }
            if !archive.contains(full_path) {
                errors.push(ValidationError::new(
                    ErrorKind::Relationship,
                    Severity::Error,
                    format!("Manifest entry '{}' not found in package", entry.full_path),
                    MANIFEST_ENTRY,
                    "",
                ));
            }
        }
    }
}

fn manifest_entries(root: &XmlNode) -> Vec<OdfManifestEntry> {
    root.iter()
        .filter(|n| n.namespace() == Some(MANIFEST_NAMESPACE) && n.local_name() == "file-entry")
        .map(|n| OdfManifestEntry {
            full_path: n.attr(&format!("{{{MANIFEST_NAMESPACE}}}full-path")).unwrap_or_default().to_string(),
            media_type: n.attr(&format!("{{{MANIFEST_NAMESPACE}}}media-type")).unwrap_or_default().to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use soapberry_zip::office::StreamingArchiveWriter;

    fn minimal_odt() -> Vec<u8> {
        let mut writer = StreamingArchiveWriter::new();
        writer.write_stored("mimetype", b"application/vnd.oasis.opendocument.text").unwrap();
        writer
            .write_deflated(
                "META-INF/manifest.xml",
                br#"<?xml version="1.0"?><manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0" manifest:version="1.3">
                    <manifest:file-entry manifest:full-path="/" manifest:media-type="application/vnd.oasis.opendocument.text"/>
                    <manifest:file-entry manifest:full-path="content.xml" manifest:media-type="text/xml"/>
                </manifest:manifest>"#,
            )
            .unwrap();
        writer.write_deflated("content.xml", br#"<?xml version="1.0"?><office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0"/>"#).unwrap();
        writer.finish_to_bytes().unwrap()
    }

    #[test]
    fn well_formed_package_validates() {
        let data = minimal_odt();
        let validator = OdfValidator::new(FileFormat::Odf1_3);
        let result = validator.validate_bytes(&data);
        assert!(result.is_valid, "{:?}", result.errors);
    }

    #[test]
    fn missing_mimetype_is_reported() {
        let mut writer = StreamingArchiveWriter::new();
        writer
            .write_deflated(
                "META-INF/manifest.xml",
                br#"<?xml version="1.0"?><manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0"/>"#,
            )
            .unwrap();
        let data = writer.finish_to_bytes().unwrap();

        let validator = OdfValidator::new(FileFormat::Odf1_2);
        let result = validator.validate_bytes(&data);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.description.contains("mimetype")));
    }

    #[test]
    fn missing_manifest_is_reported() {
        let mut writer = StreamingArchiveWriter::new();
        writer.write_stored("mimetype", b"application/vnd.oasis.opendocument.spreadsheet").unwrap();
        let data = writer.finish_to_bytes().unwrap();

        let validator = OdfValidator::new(FileFormat::Odf1_3);
        let result = validator.validate_bytes(&data);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.description.contains("manifest.xml")));
    }

    #[test]
    fn root_level_manifest_is_used_as_fallback() {
        let mut writer = StreamingArchiveWriter::new();
        writer.write_stored("mimetype", b"application/vnd.oasis.opendocument.text").unwrap();
        writer
            .write_deflated(
                "manifest.xml",
                br#"<?xml version="1.0"?><manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0">
                    <manifest:file-entry manifest:full-path="/" manifest:media-type="application/vnd.oasis.opendocument.text"/>
                </manifest:manifest>"#,
            )
            .unwrap();
        let data = writer.finish_to_bytes().unwrap();

        let validator = OdfValidator::new(FileFormat::Odf1_3);
        let result = validator.validate_bytes(&data);
        assert!(result.is_valid, "{:?}", result.errors);
    }

    #[test]
    fn manifest_entry_missing_from_archive_is_reported() {
        let mut writer = StreamingArchiveWriter::new();
        writer.write_stored("mimetype", b"application/vnd.oasis.opendocument.text").unwrap();
        writer
            .write_deflated(
                "META-INF/manifest.xml",
                br#"<?xml version="1.0"?><manifest:manifest xmlns:manifest="urn:oasis:names:tc:opendocument:xmlns:manifest:1.0">
                    <manifest:file-entry manifest:full-path="content.xml" manifest:media-type="text/xml"/>
                </manifest:manifest>"#,
            )
            .unwrap();
        let data = writer.finish_to_bytes().unwrap();

        let validator = OdfValidator::new(FileFormat::Odf1_3);
        let result = validator.validate_bytes(&data);
        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.description.contains("content.xml")));
    }
}
