//! Schema Validator: walks an XML part's tree against the Schema
//! Registry's element/attribute/particle constraints (ECMA-376 §4.6).
//!
//! Required attributes, fixed/typed attribute values, and content-model
//! shape are all checked here; id uniqueness and relationship-attribute
//! resolution are the Semantic Validator's job, not this one's.

use crate::ooxml::namespaces::MC;
use crate::ooxml::schema::particle::{Particle, validate_particle};
use crate::ooxml::schema::registry::{ElementConstraint, SchemaRegistry};
use crate::ooxml::xmltree::{self, XmlNode};
use crate::validate::context::ValidationContext;
use crate::validate::error::{ErrorKind, Severity};

/// Walks a part's XML tree against a [`SchemaRegistry`], unfolding
/// markup-compatibility alternate content before matching children against
/// a particle's content model.
pub struct SchemaValidator {
    validate_unknown_elements: bool,
}

impl SchemaValidator {
    pub fn new(validate_unknown_elements: bool) -> Self {
        Self { validate_unknown_elements }
    }

    /// Validates one part's raw XML bytes. A parse failure aborts only this
    /// part's schema validation (§7 "Recovery policy").
    pub fn validate_part(&self, data: &[u8], registry: &SchemaRegistry, ctx: &mut ValidationContext) {
        let root = match xmltree::parse(data) {
            Ok(root) => root,
            Err(e) => {
                ctx.record(ErrorKind::Schema, Severity::Error, format!("XML parse error: {e}"));
                return;
            }
        };
        self.validate_element(&root, registry, ctx);
    }

    fn validate_element(&self, element: &XmlNode, registry: &SchemaRegistry, ctx: &mut ValidationContext) {
        if ctx.has_reached_ceiling() {
            return;
        }
        ctx.push_element(element.local_name());

        match registry.best_candidate(element) {
            Some(constraint) => {
                self.validate_attributes(element, constraint, ctx);
                if let Some(particle) = &constraint.particle {
                    self.validate_content_model(element, particle, ctx);
                }
            }
            None if self.validate_unknown_elements => {
                ctx.record(
                    ErrorKind::Schema,
                    Severity::Warning,
                    format!("No schema constraint found for element '{}'", element.local_name()),
                );
            }
            None => {}
        }

        for child in self.validation_children(element) {
            self.validate_element(child, registry, ctx);
        }

        ctx.pop_element();
    }

    fn validate_attributes(&self, element: &XmlNode, constraint: &ElementConstraint, ctx: &mut ValidationContext) {
        for attr in constraint.required_attributes() {
            if !attribute_present(element, attr) {
                ctx.record(
                    ErrorKind::Schema,
                    Severity::Error,
                    format!("Required attribute '{}' is missing", attr.local_name),
                );
            }
        }

        for attr in &constraint.attributes {
            let Some(value) = attribute_value(element, attr) else { continue };
            let result = attr.check(value);
            if !result.is_valid {
                ctx.record(
                    ErrorKind::Schema,
                    Severity::Error,
                    format!(
                        "Invalid value for attribute '{}': {}",
                        attr.local_name,
                        result.error_message.unwrap_or_default()
                    ),
                );
            }
        }
    }

    fn validate_content_model(&self, element: &XmlNode, particle: &Particle, ctx: &mut ValidationContext) {
        let children = self.validation_children(element);
        let mut errors = Vec::new();
        validate_particle(particle, &children, &mut errors);
        for error in errors {
            ctx.record(ErrorKind::Schema, Severity::Error, error.message);
        }
    }

    /// Non-comment children, with any `mc:AlternateContent` replaced by the
    /// children of its chosen branch (Fallback, else Choice; neither yields
    /// no children at all - §4.6, open question on shallow unfolding).
    fn validation_children<'n>(&self, element: &'n XmlNode) -> Vec<&'n XmlNode> {
        let mut out = Vec::new();
        for child in &element.children {
            if is_mc(child, "AlternateContent") {
                out.extend(resolve_alternate_content(child));
            } else {
                out.push(child);
            }
        }
        out
    }
}

fn is_mc(node: &XmlNode, local_name: &str) -> bool {
    node.namespace() == Some(MC) && node.local_name() == local_name
}

fn resolve_alternate_content(alt: &XmlNode) -> Vec<&XmlNode> {
    let chosen = alt
        .children
        .iter()
        .find(|c| is_mc(c, "Fallback"))
        .or_else(|| alt.children.iter().find(|c| is_mc(c, "Choice")));
    match chosen {
        Some(node) => node.children.iter().collect(),
        None => Vec::new(),
    }
}

fn attribute_present(node: &XmlNode, attr: &crate::ooxml::schema::registry::AttributeConstraint) -> bool {
    attribute_value(node, attr).is_some()
}

fn attribute_value<'n>(node: &'n XmlNode, attr: &crate::ooxml::schema::registry::AttributeConstraint) -> Option<&'n str> {
    match &attr.namespace {
        Some(ns) => node.attr(&format!("{{{ns}}}{}", attr.local_name)),
        None => node.attr_local(&attr.local_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::package::OpcPackage;
    use crate::validate::options::FileFormat;

    fn minimal_registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        let json = r#"{"types": [
            {
                "Name": "t:root/t:root",
                "ClassName": "Root",
                "IsLeafElement": false,
                "Attributes": [
                    {"Name": "id", "Required": true, "Type": "StringValue"}
                ],
                "Particle": {
                    "Kind": "Sequence",
                    "Items": [
                        {"Kind": "Element", "Name": "t:child"},
                        {"Kind": "Element", "Name": "t:child2"}
                    ]
                }
            }
        ]}"#;
        registry.load_namespace_file("urn:t", json).unwrap();
        registry
    }

    fn empty_package() -> OpcPackage {
        use soapberry_zip::office::StreamingArchiveWriter;
        let mut writer = StreamingArchiveWriter::new();
        writer
            .write_deflated(
                "[Content_Types].xml",
                br#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/></Types>"#,
            )
            .unwrap();
        writer
            .write_deflated(
                "_rels/.rels",
                br#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"/>"#,
            )
            .unwrap();
        let data = writer.finish_to_bytes().unwrap();
        OpcPackage::from_bytes(&data).unwrap()
    }

    #[test]
    fn missing_required_attribute_is_reported() {
        let registry = minimal_registry();
        let package = empty_package();
        let mut ctx = ValidationContext::new(&package, FileFormat::default(), true, 0, false);
        let validator = SchemaValidator::new(false);
        validator.validate_part(br#"<root xmlns="urn:t"><child/><child2/></root>"#, &registry, &mut ctx);
        let errors = ctx.into_errors();
        assert!(errors.iter().any(|e| e.description.contains("id")));
    }

    #[test]
    fn complete_element_validates_cleanly() {
        let registry = minimal_registry();
        let package = empty_package();
        let mut ctx = ValidationContext::new(&package, FileFormat::default(), true, 0, false);
        let validator = SchemaValidator::new(false);
        validator.validate_part(br#"<root xmlns="urn:t" id="a"><child/><child2/></root>"#, &registry, &mut ctx);
        assert!(ctx.into_errors().is_empty());
    }

    #[test]
    fn empty_alternate_content_unfolds_to_no_children() {
        let registry = minimal_registry();
        let package = empty_package();
        let mut ctx = ValidationContext::new(&package, FileFormat::default(), true, 0, false);
        let validator = SchemaValidator::new(false);
        validator.validate_part(
            br#"<root xmlns="urn:t" xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006" id="a"><mc:AlternateContent/></root>"#,
            &registry,
            &mut ctx,
        );
        let errors = ctx.into_errors();
        assert!(errors.iter().any(|e| e.description.contains("child")));
    }
}
