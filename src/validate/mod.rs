//! Top-level validation pipeline (ECMA-376 §4.9 "Pipeline phases"):
//! orchestrates package structure, the document-kind profile's structural
//! walk, relationship integrity, binary payloads, schema validation, and
//! semantic validation into a single [`ValidationResult`].
//!
//! The constraint data the pipeline checks against - the Schema Registry
//! and Schematron Registry - is not shipped inside this crate; §1 treats
//! the tool that fetches and refreshes that upstream JSON as an external
//! collaborator. Callers build a [`ConstraintRegistries`] once (typically
//! at process startup) and share it, immutably, across every validation
//! run (§5 "Resource ownership").

pub mod context;
pub mod error;
pub mod options;
pub mod profile;
pub mod result;

use std::sync::Arc;

use crate::ooxml::OpcPackage;
use crate::ooxml::binary::{deobfuscation_key_for, validate_binary_content};
use crate::ooxml::fonts::collect_word_font_keys;
use crate::ooxml::schema::registry::SchemaRegistry;
use crate::ooxml::schema::validator::SchemaValidator;
use crate::ooxml::schematron::registry::SchematronRegistry;
use crate::ooxml::schematron::rule::Application;
use crate::ooxml::semantic::SemanticValidator;

pub use context::ValidationContext;
pub use error::{ErrorKind, Severity, ValidationError};
pub use options::{FileFormat, ValidationOptions};
pub use profile::DocumentKind;
pub use result::ValidationResult;

/// ODF (OpenDocument) packages do not fit the OPC-oriented pipeline above;
/// re-exported here so callers branching on [`FileFormat::is_odf`] find
/// both validators under the same module.
pub use crate::ooxml::odf::OdfValidator;

/// The immutable, shared constraint data a validation run is checked
/// against: the Schema Registry (element/attribute/particle constraints)
/// and the Schematron Registry (classified semantic rules).
///
/// Built once via [`ConstraintRegistries::builder`] and then wrapped in an
/// `Arc` so many concurrent validations can share it without locking (§5
/// "Locking"): refreshing the upstream data means building a new instance
/// and swapping the `Arc`, never mutating one in place.
#[derive(Debug, Default)]
pub struct ConstraintRegistries {
    pub schema: SchemaRegistry,
    pub schematron: SchematronRegistry,
}

impl ConstraintRegistries {
    pub fn builder() -> ConstraintRegistriesBuilder {
        ConstraintRegistriesBuilder::default()
    }
}

/// Accumulates namespace schema files, the prefix/URI map, and Schematron
/// rule sets before freezing them into a [`ConstraintRegistries`].
#[derive(Default)]
pub struct ConstraintRegistriesBuilder {
    schema: SchemaRegistry,
    schematron: SchematronRegistry,
}

impl ConstraintRegistriesBuilder {
    /// Registers one namespace's schema JSON file (ECMA-376 §4.3, §6).
    pub fn add_schema_namespace(mut self, namespace: &str, json: &str) -> crate::ooxml::error::Result<Self> {
        self.schema.load_namespace_file(namespace, json)?;
        Ok(self)
    }

    /// Registers the shared prefix-to-namespace-URI map used to resolve
    /// `"prefix:TYPE/prefix:elem"` element references.
    pub fn add_namespace_prefixes(mut self, json: &str) -> crate::ooxml::error::Result<Self> {
        self.schema.load_namespaces_file(json)?;
        Ok(self)
    }

    /// Registers a JSON array of `{Context, Test, App}` Schematron records (§4.4, §6).
    pub fn add_schematron_rules(mut self, json: &str) -> crate::ooxml::error::Result<Self> {
        self.schematron.load_json(json)?;
        Ok(self)
    }

    pub fn build(self) -> Arc<ConstraintRegistries> {
        Arc::new(ConstraintRegistries {
            schema: self.schema,
            schematron: self.schematron,
        })
    }
}

/// Orchestrates the full validation pipeline over one [`OpcPackage`].
///
/// Holds a shared, immutable handle to the constraint registries plus the
/// per-run [`ValidationOptions`]; neither is mutated by a validation run,
/// so one `OpenXmlValidator` can validate many packages, sequentially or
/// from multiple threads (§5 "Scheduling model").
pub struct OpenXmlValidator {
    registries: Arc<ConstraintRegistries>,
    options: ValidationOptions,
}

impl OpenXmlValidator {
    pub fn new(registries: Arc<ConstraintRegistries>, options: ValidationOptions) -> Self {
        Self { registries, options }
    }

    /// Validates `package`, running every enabled phase in the order §4.9
    /// specifies, short-circuiting once the error ceiling is reached.
    pub fn validate(&self, package: &OpcPackage) -> ValidationResult {
        self.validate_with_path(package, None)
    }

    /// Opens the package at `path` and validates it. An unrecoverable
    /// container failure (non-ZIP input, missing `[Content_Types].xml`,
    /// etc.) is the sole exception permitted to surface outside a
    /// `ValidationResult` (§7 "Propagation"); here it's caught and recorded
    /// as a single `Package` error instead, matching [`crate::ooxml::odf::OdfValidator::validate_path`].
    pub fn validate_file<P: AsRef<std::path::Path>>(&self, path: P) -> ValidationResult {
        let path = path.as_ref();
        let file_path = Some(path.display().to_string());
        match OpcPackage::open(path) {
            Ok(package) => self.validate_with_path(&package, file_path),
            Err(e) => self.package_open_failure(e, file_path),
        }
    }

    /// As [`Self::validate_file`], but from an in-memory byte slice.
    pub fn validate_bytes(&self, data: &[u8]) -> ValidationResult {
        match OpcPackage::from_bytes(data) {
            Ok(package) => self.validate_with_path(&package, None),
            Err(e) => self.package_open_failure(e, None),
        }
    }

    fn package_open_failure(&self, error: crate::ooxml::opc::error::OpcError, file_path: Option<String>) -> ValidationResult {
        let diagnostic = ValidationError::new(ErrorKind::Package, Severity::Error, format!("Cannot open package: {error}"), "", "");
        ValidationResult::new(vec![diagnostic], file_path, self.options.format)
    }

    /// As [`Self::validate`], but records the source path on the result
    /// for callers that report it alongside diagnostics.
    pub fn validate_with_path(&self, package: &OpcPackage, file_path: Option<String>) -> ValidationResult {
        let mut ctx = ValidationContext::new(package, self.options.format, self.options.strict, self.options.max_errors, self.options.validate_unknown_elements);

        // Phase 1: package structure.
        self.validate_package_structure(&mut ctx);
        if ctx.has_reached_ceiling() {
            return self.finish(ctx, file_path);
        }

        // Phase 2: profile-specific structural walk(s).
        let kind = profile::detect_document_kind(&ctx);
        self.run_structural_walk(kind, &mut ctx);
        if ctx.has_reached_ceiling() {
            return self.finish(ctx, file_path);
        }

        let mut part_uris: Vec<String> = package.iter_parts().map(|p| p.partname().as_str().to_string()).collect();
        part_uris.sort();

        // Phase 3: relationship integrity, per part and at the package level.
        self.validate_relationship_integrity(package, &part_uris, &mut ctx);
        if ctx.has_reached_ceiling() {
            return self.finish(ctx, file_path);
        }

        // Phase 4: binary payloads.
        let font_keys = collect_word_font_keys(package);
        for uri in &part_uris {
            if ctx.has_reached_ceiling() {
                break;
            }
            self.validate_binary_part(package, uri, &font_keys, &mut ctx);
        }
        if ctx.has_reached_ceiling() {
            return self.finish(ctx, file_path);
        }

        // Phase 5: schema validation over every XML part.
        if self.options.schema_validation {
            let schema_validator = SchemaValidator::new(self.options.validate_unknown_elements);
            for uri in &part_uris {
                if ctx.has_reached_ceiling() {
                    break;
                }
                self.validate_xml_part(package, uri, |data, ctx| schema_validator.validate_part(data, &self.registries.schema, ctx), &mut ctx);
            }
        }
        if ctx.has_reached_ceiling() {
            return self.finish(ctx, file_path);
        }

        // Phase 6: semantic validation over every XML part.
        if self.options.semantic_validation {
            let semantic_validator = SemanticValidator::new(application_for(kind), true);
            for uri in &part_uris {
                if ctx.has_reached_ceiling() {
                    break;
                }
                ctx.enter_part(uri);
                let Ok(packuri) = crate::ooxml::opc::packuri::PackURI::new(uri.clone()) else { continue };
                let Ok(part) = package.get_part(&packuri) else { continue };
                if !is_xml_part(part.content_type()) {
                    continue;
                }
                let data = part.blob().to_vec();
                semantic_validator.validate_part(uri, &data, &self.registries.schematron, &mut ctx);
            }
        }
        if ctx.has_reached_ceiling() {
            return self.finish(ctx, file_path);
        }

        // Phase 7: profile-specific deep walk and cross-part wiring checks.
        profile::validate_cross_part_wiring(kind, &mut ctx);

        self.finish(ctx, file_path)
    }

    fn finish(&self, ctx: ValidationContext, file_path: Option<String>) -> ValidationResult {
        ValidationResult::new(ctx.into_errors(), file_path, self.options.format)
    }

    /// `[Content_Types].xml` / root `.rels` existence, and that the main
    /// document relationship resolves (§3 "Package"). Also surfaces any
    /// malformed-package conditions the package loader swallowed rather
    /// than aborting on (missing content type, dangling relationship
    /// target) - see [`crate::ooxml::opc::package::OpcPackage::load_warnings`].
    fn validate_package_structure(&self, ctx: &mut ValidationContext) {
        if ctx.package.main_document_part().is_err() {
            ctx.record(ErrorKind::Package, Severity::Error, "Package has no main document relationship or part");
        }
        for warning in ctx.package.load_warnings() {
            ctx.record(ErrorKind::Package, Severity::Error, warning.clone());
        }
    }

    fn run_structural_walk(&self, kind: DocumentKind, ctx: &mut ValidationContext) {
        match kind {
            DocumentKind::Presentation => profile::validate_presentation_structure(ctx),
            DocumentKind::Word => profile::validate_word_structure(ctx),
            DocumentKind::Spreadsheet => profile::validate_spreadsheet_structure(ctx),
            DocumentKind::Unknown => {}
        }
    }

    /// Per-part relationship integrity: internal targets must resolve to
    /// parts that actually exist in the package (§4.7 "Relationship
    /// integrity per part").
    fn validate_relationship_integrity(&self, package: &OpcPackage, part_uris: &[String], ctx: &mut ValidationContext) {
        for dup_id in package.rels().duplicate_ids() {
            ctx.record(
                ErrorKind::Relationship,
                Severity::Error,
                format!("Duplicate relationship id '{dup_id}' in '_rels/.rels'"),
            );
        }
        for uri in part_uris {
            if ctx.has_reached_ceiling() {
                return;
            }
            ctx.enter_part(uri);
            let Ok(packuri) = crate::ooxml::opc::packuri::PackURI::new(uri.clone()) else { continue };
            let Ok(part) = package.get_part(&packuri) else { continue };
            for rel in part.rels().iter() {
                if rel.is_external() {
                    continue;
                }
                match rel.target_partname() {
                    Ok(target) if !package.contains_part(&target) => {
                        ctx.record(
                            ErrorKind::Relationship,
                            Severity::Error,
                            format!("Relationship '{}' target not found: '{}'", rel.r_id(), target.as_str()),
                        );
                    }
                    _ => {}
                }
            }
            for dup_id in part.rels().duplicate_ids() {
                ctx.record(
                    ErrorKind::Relationship,
                    Severity::Error,
                    format!("Duplicate relationship id '{dup_id}' in '{uri}'"),
                );
            }
        }
    }

    fn validate_binary_part(&self, package: &OpcPackage, uri: &str, font_keys: &std::collections::HashMap<String, [u8; 16]>, ctx: &mut ValidationContext) {
        let Ok(packuri) = crate::ooxml::opc::packuri::PackURI::new(uri.to_string()) else { return };
        let Ok(part) = package.get_part(&packuri) else { return };
        if is_xml_part(part.content_type()) {
            return;
        }
        ctx.enter_part(uri);
        let key = deobfuscation_key_for(font_keys, uri);
        if let Some(result) = validate_binary_content(Some(part.content_type()), uri, part.blob(), key.as_ref()) {
            ctx.record(ErrorKind::Binary, result.severity, result.message);
        }
    }

    /// Parses `uri`'s XML once and hands the root to `run`, recording a
    /// `Schema` error and aborting only this part's validation on parse
    /// failure (§7 "Recovery policy").
    fn validate_xml_part(&self, package: &OpcPackage, uri: &str, run: impl FnOnce(&[u8], &mut ValidationContext), ctx: &mut ValidationContext) {
        let Ok(packuri) = crate::ooxml::opc::packuri::PackURI::new(uri.to_string()) else { return };
        let Ok(part) = package.get_part(&packuri) else { return };
        if !is_xml_part(part.content_type()) {
            return;
        }
        ctx.enter_part(uri);
        run(part.blob(), ctx);
    }
}

fn is_xml_part(content_type: &str) -> bool {
    content_type.contains("xml")
}

fn application_for(kind: DocumentKind) -> Application {
    match kind {
        DocumentKind::Word => Application::Word,
        DocumentKind::Spreadsheet => Application::Excel,
        DocumentKind::Presentation => Application::PowerPoint,
        DocumentKind::Unknown => Application::All,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soapberry_zip::office::StreamingArchiveWriter;

    fn minimal_pptx() -> OpcPackage {
        let mut writer = StreamingArchiveWriter::new();
        writer
            .write_deflated(
                "[Content_Types].xml",
                br#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
                    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
                    <Default Extension="xml" ContentType="application/xml"/>
                    <Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
                    <Override PartName="/ppt/slides/slide1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>
                    <Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/>
                    <Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>
                    <Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>
                </Types>"#,
            )
            .unwrap();
        writer
            .write_deflated(
                "_rels/.rels",
                br#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
                    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>
                </Relationships>"#,
            )
            .unwrap();
        writer
            .write_deflated(
                "ppt/presentation.xml",
                br#"<?xml version="1.0"?><p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
                    <p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rIdM1"/></p:sldMasterIdLst>
                    <p:sldIdLst><p:sldId id="256" r:id="rIdS1"/></p:sldIdLst>
                </p:presentation>"#,
            )
            .unwrap();
        writer
            .write_deflated(
                "ppt/_rels/presentation.xml.rels",
                br#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
                    <Relationship Id="rIdM1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/>
                    <Relationship Id="rIdS1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide1.xml"/>
                    <Relationship Id="rIdT1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="theme/theme1.xml"/>
                </Relationships>"#,
            )
            .unwrap();
        writer
            .write_deflated(
                "ppt/slides/slide1.xml",
                br#"<?xml version="1.0"?><p:sld xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"/>"#,
            )
            .unwrap();
        writer
            .write_deflated(
                "ppt/slideMasters/slideMaster1.xml",
                br#"<?xml version="1.0"?><p:sldMaster xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rIdL1"/></p:sldLayoutIdLst></p:sldMaster>"#,
            )
            .unwrap();
        writer
            .write_deflated(
                "ppt/slideMasters/_rels/slideMaster1.xml.rels",
                br#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rIdL1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/></Relationships>"#,
            )
            .unwrap();
        writer
            .write_deflated(
                "ppt/slideLayouts/slideLayout1.xml",
                br#"<?xml version="1.0"?><p:sldLayout xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"/>"#,
            )
            .unwrap();
        writer
            .write_deflated(
                "ppt/theme/theme1.xml",
                br#"<?xml version="1.0"?><a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"/>"#,
            )
            .unwrap();
        let data = writer.finish_to_bytes().unwrap();
        OpcPackage::from_bytes(&data).unwrap()
    }

    #[test]
    fn minimal_pptx_validates_with_no_errors() {
        let package = minimal_pptx();
        let registries = ConstraintRegistries::builder().build();
        let validator = OpenXmlValidator::new(registries, ValidationOptions::default());
        let result = validator.validate(&package);
        assert!(result.is_valid, "{:?}", result.errors);
    }

    #[test]
    fn duplicate_slide_id_is_reported() {
        let mut writer = StreamingArchiveWriter::new();
        writer
            .write_deflated(
                "[Content_Types].xml",
                br#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
                    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
                    <Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
                </Types>"#,
            )
            .unwrap();
        writer
            .write_deflated(
                "_rels/.rels",
                br#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
                    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>
                </Relationships>"#,
            )
            .unwrap();
        writer
            .write_deflated(
                "ppt/presentation.xml",
                br#"<?xml version="1.0"?><p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
                    <p:sldIdLst><p:sldId id="256" r:id="rId2"/><p:sldId id="256" r:id="rId3"/></p:sldIdLst>
                </p:presentation>"#,
            )
            .unwrap();
        let data = writer.finish_to_bytes().unwrap();
        let package = OpcPackage::from_bytes(&data).unwrap();

        let registries = ConstraintRegistries::builder().build();
        let validator = OpenXmlValidator::new(registries, ValidationOptions::default());
        let result = validator.validate(&package);
        assert!(!result.is_valid, "{:?}", result.errors);
        assert!(result.errors.iter().any(|e| e.description.contains("Duplicate ID")));
    }

    #[test]
    fn duplicate_root_relationship_id_is_reported() {
        let mut writer = StreamingArchiveWriter::new();
        writer
            .write_deflated(
                "[Content_Types].xml",
                br#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
                    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
                    <Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
                </Types>"#,
            )
            .unwrap();
        writer
            .write_deflated(
                "_rels/.rels",
                br#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
                    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>
                    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>
                </Relationships>"#,
            )
            .unwrap();
        writer
            .write_deflated(
                "ppt/presentation.xml",
                br#"<?xml version="1.0"?><p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"/>"#,
            )
            .unwrap();
        let data = writer.finish_to_bytes().unwrap();
        let package = OpcPackage::from_bytes(&data).unwrap();

        let registries = ConstraintRegistries::builder().build();
        let validator = OpenXmlValidator::new(registries, ValidationOptions::default());
        let result = validator.validate(&package);
        assert!(!result.is_valid, "{:?}", result.errors);
        assert!(result.errors.iter().any(|e| e.description.contains("Duplicate relationship id 'rId1'")));
    }

    /// A presentation whose main part has two dangling relationship
    /// targets - two real violations - so a ceiling of 1 can be observed
    /// actually cutting the run short rather than just passing through a
    /// clean package.
    fn pptx_with_two_dangling_relationships() -> OpcPackage {
        let mut writer = StreamingArchiveWriter::new();
        writer
            .write_deflated(
                "[Content_Types].xml",
                br#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
                    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
                    <Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
                </Types>"#,
            )
            .unwrap();
        writer
            .write_deflated(
                "_rels/.rels",
                br#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
                    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>
                </Relationships>"#,
            )
            .unwrap();
        writer
            .write_deflated(
                "ppt/presentation.xml",
                br#"<?xml version="1.0"?><p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"/>"#,
            )
            .unwrap();
        writer
            .write_deflated(
                "ppt/_rels/presentation.xml.rels",
                br#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
                    <Relationship Id="rIdA" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/missing1.xml"/>
                    <Relationship Id="rIdB" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="theme/missing2.xml"/>
                </Relationships>"#,
            )
            .unwrap();
        let data = writer.finish_to_bytes().unwrap();
        OpcPackage::from_bytes(&data).unwrap()
    }

    #[test]
    fn max_errors_ceiling_stops_the_pipeline() {
        let package = pptx_with_two_dangling_relationships();
        let registries = ConstraintRegistries::builder().build();
        let mut unbounded_options = ValidationOptions::default();
        unbounded_options.max_errors = 0;
        let unbounded_validator = OpenXmlValidator::new(registries.clone(), unbounded_options);
        let unbounded_result = unbounded_validator.validate(&package);
        assert!(!unbounded_result.is_valid);
        let total_violations = unbounded_result.errors.len();
        assert!(total_violations >= 2, "expected at least 2 real violations, got {:?}", unbounded_result.errors);

        let mut capped_options = ValidationOptions::default();
        capped_options.max_errors = 1;
        let capped_validator = OpenXmlValidator::new(registries, capped_options);
        let capped_result = capped_validator.validate(&package);
        assert!(!capped_result.is_valid);
        assert_eq!(capped_result.errors.len(), 1);
        assert!(capped_result.errors.len() < total_violations);
    }

    #[test]
    fn validate_bytes_reports_a_package_error_on_open_failure() {
        let registries = ConstraintRegistries::builder().build();
        let validator = OpenXmlValidator::new(registries, ValidationOptions::default());
        let result = validator.validate_bytes(b"not a zip file");
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, ErrorKind::Package);
    }
}
