//! Semantic Validator: applies per-element semantic predicates derived from
//! Schematron, the generic relationship-attribute and `mc:Ignorable` checks,
//! id uniqueness, and per-part relationship integrity (ECMA-376 §4.7).
//!
//! `constraint` is the predicate-evaluation half (the runtime form of a
//! classified [`crate::ooxml::schematron::rule::RuleKind`]); this module is
//! the walker that applies it to every element of a part, in the order
//! §4.7 specifies.

pub mod constraint;

use crate::ooxml::namespaces::{MC, OFFICE_DOC_RELATIONSHIPS};
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::schematron::registry::SchematronRegistry;
use crate::ooxml::schematron::rule::Application;
use crate::ooxml::xmltree::{self, XmlNode};
use crate::validate::context::ValidationContext;
use crate::validate::error::{ErrorKind, Severity};

use constraint::EvalContext;

/// Walks a part's XML tree, applying the checks §4.7 lists in order for
/// every element, filtered to the rules registered for `app_filter` (plus
/// any rule marked `Application::All`).
pub struct SemanticValidator {
    app_filter: Application,
    validate_unique_ids: bool,
}

impl SemanticValidator {
    pub fn new(app_filter: Application, validate_unique_ids: bool) -> Self {
        Self { app_filter, validate_unique_ids }
    }

    /// Validates one part: relationship integrity for the part as a whole,
    /// then the element walk over its parsed XML. A parse failure here is
    /// silent - the Schema Validator already reported it for this part.
    pub fn validate_part(&self, part_uri: &str, data: &[u8], registry: &SchematronRegistry, ctx: &mut ValidationContext) {
        self.validate_part_relationships(part_uri, ctx);

        let Ok(root) = xmltree::parse(data) else { return };
        let mut eval_ctx = EvalContext::new(ctx.package, part_uri);
        self.validate_element(&root, registry, &mut eval_ctx, ctx);
    }

    /// Checks internal-target existence for every relationship and reports
    /// any relationship id declared more than once in the part's `.rels`
    /// file (§4.7).
    fn validate_part_relationships(&self, part_uri: &str, ctx: &mut ValidationContext) {
        let Ok(packuri) = PackURI::new(part_uri.to_string()) else { return };
        let Ok(part) = ctx.package.get_part(&packuri) else { return };
        for rel in part.rels().iter() {
            if rel.is_external() {
                continue;
            }
            if let Ok(target) = rel.target_partname() {
                if !ctx.package.contains_part(&target) {
                    ctx.record(
                        ErrorKind::Relationship,
                        Severity::Error,
                        format!("Relationship '{}' target not found: '{}'", rel.r_id(), target.as_str()),
                    );
                }
            }
        }
        for dup_id in part.rels().duplicate_ids() {
            ctx.record(
                ErrorKind::Relationship,
                Severity::Error,
                format!("Duplicate relationship id '{dup_id}' in '{part_uri}'"),
            );
        }
    }

    fn validate_element(&self, element: &XmlNode, registry: &SchematronRegistry, eval_ctx: &mut EvalContext, ctx: &mut ValidationContext) {
        if ctx.has_reached_ceiling() {
            return;
        }
        ctx.push_element(element.local_name());

        self.validate_relationship_attributes(element, ctx);
        self.validate_mc_ignorable(element, ctx);

        if self.validate_unique_ids {
            if let Some(id) = element.attr_local("id") {
                if ctx.observe_id(id) {
                    ctx.record(ErrorKind::Semantic, Severity::Error, format!("Duplicate ID '{id}'"));
                }
            }
        }

        for rule in registry.rules_for(element.local_name()) {
            if rule.app != Application::All && rule.app != self.app_filter {
                continue;
            }
            if let Err(message) = constraint::evaluate(&rule.kind, element, eval_ctx) {
                ctx.record(ErrorKind::Semantic, Severity::Error, message);
            }
        }

        for child in &element.children {
            self.validate_element(child, registry, eval_ctx, ctx);
        }

        ctx.pop_element();
    }

    /// Every attribute in the relationships namespace whose value is a
    /// non-empty id must resolve in the current part's relationship
    /// collection (§4.7 item 1).
    fn validate_relationship_attributes(&self, element: &XmlNode, ctx: &mut ValidationContext) {
        let prefix = format!("{{{OFFICE_DOC_RELATIONSHIPS}}}");
        let current_part = ctx.current_part().to_string();
        let Ok(packuri) = PackURI::new(current_part) else { return };
        let Ok(part) = ctx.package.get_part(&packuri) else { return };

        for (name, value) in &element.attrs {
            let Some(local) = name.strip_prefix(&prefix) else { continue };
            if value.is_empty() {
                continue;
            }
            if part.rels().get(value).is_none() {
                ctx.record(
                    ErrorKind::Semantic,
                    Severity::Error,
                    format!("Relationship '{value}' referenced by '{local}' does not exist"),
                );
            }
        }
    }

    /// If present, `mc:Ignorable` tokenizes to space-separated prefixes;
    /// every prefix must be bound in the element's in-scope namespaces
    /// (§4.7 item 2). [`XmlNode::xmlns`] already carries the cumulative
    /// scope (ancestors' declarations merged with this element's own).
    fn validate_mc_ignorable(&self, element: &XmlNode, ctx: &mut ValidationContext) {
        let Some(ignorable) = element.attr(&format!("{{{MC}}}Ignorable")) else { return };
        let prefixes: Vec<&str> = ignorable.split_whitespace().collect();
        if prefixes.is_empty() {
            ctx.record(ErrorKind::Semantic, Severity::Error, "Ignorable attribute is empty".to_string());
            return;
        }
        for prefix in prefixes {
            if !element.xmlns.contains_key(prefix) {
                ctx.record(
                    ErrorKind::Semantic,
                    Severity::Error,
                    format!("Ignorable attribute contains undefined prefix '{prefix}'"),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::options::FileFormat;
    use soapberry_zip::office::StreamingArchiveWriter;

    fn package_with_document(document_xml: &[u8]) -> crate::ooxml::OpcPackage {
        let mut writer = StreamingArchiveWriter::new();
        writer
            .write_deflated(
                "[Content_Types].xml",
                br#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
                    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
                    <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
                </Types>"#,
            )
            .unwrap();
        writer
            .write_deflated(
                "_rels/.rels",
                br#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
                    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
                </Relationships>"#,
            )
            .unwrap();
        writer.write_deflated("word/document.xml", document_xml).unwrap();
        writer
            .write_deflated(
                "word/_rels/document.xml.rels",
                br#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
                    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
                </Relationships>"#,
            )
            .unwrap();
        let data = writer.finish_to_bytes().unwrap();
        crate::ooxml::OpcPackage::from_bytes(&data).unwrap()
    }

    #[test]
    fn unresolved_relationship_attribute_is_reported() {
        let package = package_with_document(
            br#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body r:id="rIdMissing"/></w:document>"#,
        );
        let registry = SchematronRegistry::new();
        let mut ctx = ValidationContext::new(&package, FileFormat::default(), true, 0, false);
        ctx.enter_part("/word/document.xml");
        let validator = SemanticValidator::new(Application::Word, false);
        validator.validate_part("/word/document.xml", package.get_part(&PackURI::new("/word/document.xml".to_string()).unwrap()).unwrap().blob(), &registry, &mut ctx);
        let errors = ctx.into_errors();
        assert!(errors.iter().any(|e| e.description.contains("rIdMissing")));
    }

    #[test]
    fn resolved_relationship_attribute_passes() {
        let package = package_with_document(
            br#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><w:body r:id="rId1"/></w:document>"#,
        );
        let registry = SchematronRegistry::new();
        let mut ctx = ValidationContext::new(&package, FileFormat::default(), true, 0, false);
        ctx.enter_part("/word/document.xml");
        let validator = SemanticValidator::new(Application::Word, false);
        validator.validate_part("/word/document.xml", package.get_part(&PackURI::new("/word/document.xml".to_string()).unwrap()).unwrap().blob(), &registry, &mut ctx);
        assert!(ctx.into_errors().is_empty());
    }

    #[test]
    fn undefined_ignorable_prefix_is_reported() {
        let package = package_with_document(
            br#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006" mc:Ignorable="w14"/>"#,
        );
        let registry = SchematronRegistry::new();
        let mut ctx = ValidationContext::new(&package, FileFormat::default(), true, 0, false);
        ctx.enter_part("/word/document.xml");
        let validator = SemanticValidator::new(Application::Word, false);
        validator.validate_part("/word/document.xml", package.get_part(&PackURI::new("/word/document.xml".to_string()).unwrap()).unwrap().blob(), &registry, &mut ctx);
        let errors = ctx.into_errors();
        assert!(errors.iter().any(|e| e.description.contains("w14")));
    }

    #[test]
    fn duplicate_id_is_reported_when_enabled() {
        let package = package_with_document(
            br#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p id="1"/><w:p id="1"/></w:body></w:document>"#,
        );
        let registry = SchematronRegistry::new();
        let mut ctx = ValidationContext::new(&package, FileFormat::default(), true, 0, false);
        ctx.enter_part("/word/document.xml");
        let validator = SemanticValidator::new(Application::Word, true);
        validator.validate_part("/word/document.xml", package.get_part(&PackURI::new("/word/document.xml".to_string()).unwrap()).unwrap().blob(), &registry, &mut ctx);
        let errors = ctx.into_errors();
        assert!(errors.iter().any(|e| e.description.contains("Duplicate ID")));
    }

    #[test]
    fn duplicate_relationship_id_in_a_part_rels_file_is_reported() {
        let mut writer = StreamingArchiveWriter::new();
        writer
            .write_deflated(
                "[Content_Types].xml",
                br#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
                    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
                    <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
                </Types>"#,
            )
            .unwrap();
        writer
            .write_deflated(
                "_rels/.rels",
                br#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
                    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
                </Relationships>"#,
            )
            .unwrap();
        writer
            .write_deflated(
                "word/document.xml",
                br#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"/>"#,
            )
            .unwrap();
        writer
            .write_deflated(
                "word/_rels/document.xml.rels",
                br#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
                    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
                    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering" Target="numbering.xml"/>
                </Relationships>"#,
            )
            .unwrap();
        let data = writer.finish_to_bytes().unwrap();
        let package = crate::ooxml::OpcPackage::from_bytes(&data).unwrap();

        let registry = SchematronRegistry::new();
        let mut ctx = ValidationContext::new(&package, FileFormat::default(), true, 0, false);
        ctx.enter_part("/word/document.xml");
        let validator = SemanticValidator::new(Application::Word, false);
        validator.validate_part(
            "/word/document.xml",
            package.get_part(&PackURI::new("/word/document.xml".to_string()).unwrap()).unwrap().blob(),
            &registry,
            &mut ctx,
        );
        let errors = ctx.into_errors();
        assert!(errors.iter().any(|e| e.description.contains("Duplicate relationship id 'rId1'")));
    }
}
