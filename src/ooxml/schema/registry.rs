//! Schema Registry: loads element-type definitions from external JSON,
//! builds a namespace-aware lookup, and picks the best type when a tag has
//! ambiguous definitions (ECMA-376 §4.3).

use std::collections::HashMap;

use serde::Deserialize;

use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::schema::particle::{AnyNamespaceConstraint, Occurs, Particle};
use crate::ooxml::schema::types::{TypeValidationResult, XsdBuiltinType, XsdTypeValidator, get_type_validator};
use crate::ooxml::xmltree::XmlNode;

/// An attribute a registered element type may (or must) carry.
#[derive(Debug)]
pub struct AttributeConstraint {
    pub namespace: Option<String>,
    pub local_name: String,
    pub required: bool,
    pub default: Option<String>,
    pub fixed: Option<String>,
    pub type_validator: Option<Box<dyn XsdTypeValidator>>,
}

impl AttributeConstraint {
    pub fn check(&self, value: &str) -> TypeValidationResult {
        if let Some(fixed) = &self.fixed {
            if value != fixed {
                return TypeValidationResult::invalid(format!(
                    "attribute '{}' must be fixed value '{fixed}', found '{value}'",
                    self.local_name
                ));
            }
        }
        match &self.type_validator {
            Some(v) => v.validate(value),
            None => TypeValidationResult::ok(),
        }
    }
}

bitflags::bitflags! {
    /// Characteristics a registered element type carries (§4.3). Packed as
    /// flags rather than separate bools since the set grows with whatever
    /// the schema JSON's own type metadata adds next.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ElementFlags: u8 {
        const ABSTRACT = 0b0000_0001;
        const LEAF     = 0b0000_0010;
    }
}

/// A registered element type: namespace/local-name, its attribute set, and
/// its content model (absent for simple/leaf content).
#[derive(Debug)]
pub struct ElementConstraint {
    pub namespace: String,
    pub local_name: String,
    pub class_name: String,
    pub flags: ElementFlags,
    pub attributes: Vec<AttributeConstraint>,
    pub particle: Option<Particle>,
}

impl ElementConstraint {
    pub fn qualified_name(&self) -> String {
        format!("{{{}}}{}", self.namespace, self.local_name)
    }

    pub fn is_abstract(&self) -> bool {
        self.flags.contains(ElementFlags::ABSTRACT)
    }

    pub fn is_leaf_element(&self) -> bool {
        self.flags.contains(ElementFlags::LEAF)
    }

    pub fn required_attributes(&self) -> impl Iterator<Item = &AttributeConstraint> {
        self.attributes.iter().filter(|a| a.required)
    }

    fn particle_item_count(&self) -> u32 {
        self.particle.as_ref().map(particle_item_count).unwrap_or(0)
    }

    /// Load-time "richer type" score used to resolve tag collisions (§4.3).
    fn richness_score(&self) -> i32 {
        let mut score = 0;
        if !self.is_leaf_element() {
            score += 100;
        }
        if self.particle.is_some() {
            score += 50;
        }
        score += self.particle_item_count() as i32;
        score += self.attributes.len() as i32;
        score
    }
}

fn particle_item_count(particle: &Particle) -> u32 {
    match particle {
        Particle::Element { .. } | Particle::Any { .. } => 1,
        Particle::Sequence { children, .. } | Particle::Choice { children, .. } | Particle::All { children, .. } => {
            children.iter().map(particle_item_count).sum()
        },
        Particle::Group { particle, .. } => particle_item_count(particle),
    }
}

/// Registry of element-type definitions, keyed by `{namespace}local-name`.
/// Every candidate registered for a tag is preserved (for per-instance
/// disambiguation); candidates are ordered richest-first so index 0 is
/// always the load-time default.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    by_tag: HashMap<String, Vec<ElementConstraint>>,
    namespace_prefixes: HashMap<String, String>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one namespace's schema file plus the shared prefix↔URI map.
    pub fn load_namespace_file(&mut self, namespace: &str, json: &str) -> Result<()> {
        let file: SchemaFileJson =
            serde_json::from_str(json).map_err(|e| OoxmlError::InvalidFormat(e.to_string()))?;
        for ty in file.types {
            if let Some(constraint) = self.build_constraint(namespace, &ty)? {
                let tag = constraint.qualified_name();
                self.by_tag.entry(tag).or_default().push(constraint);
            }
        }
        for entries in self.by_tag.values_mut() {
            entries.sort_by(|a, b| b.richness_score().cmp(&a.richness_score()));
        }
        Ok(())
    }

    /// Register the namespaces JSON file (`{"prefix": "uri", ...}`) used to
    /// resolve `"prefix:TYPE/prefix:elem"` element-reference names.
    pub fn load_namespaces_file(&mut self, json: &str) -> Result<()> {
        let map: HashMap<String, String> =
            serde_json::from_str(json).map_err(|e| OoxmlError::InvalidFormat(e.to_string()))?;
        self.namespace_prefixes.extend(map);
        Ok(())
    }

    fn resolve_prefix(&self, prefix: &str, fallback_namespace: &str) -> String {
        self.namespace_prefixes
            .get(prefix)
            .cloned()
            .unwrap_or_else(|| crate::ooxml::namespaces::get_prefix(fallback_namespace).map(str::to_string).unwrap_or_else(|| fallback_namespace.to_string()))
    }

    fn build_constraint(&self, default_namespace: &str, ty: &SchemaTypeJson) -> Result<Option<ElementConstraint>> {
        // `Name` is `"prefix:TYPE/prefix:elem"`; abstract base types may omit
        // the element segment entirely, in which case there is nothing to
        // index by tag.
        let Some(elem_part) = ty.name.split('/').nth(1) else {
            return Ok(None);
        };
        let (namespace, local_name) = self.split_element_ref(elem_part, default_namespace);

        let attributes = ty
            .attributes
            .iter()
            .map(|a| self.build_attribute(a, default_namespace))
            .collect();
        let particle = ty
            .particle
            .as_ref()
            .map(|p| self.build_particle(p, default_namespace))
            .transpose()?
            .map(crate::ooxml::schema::bridge::normalize);

        Ok(Some(ElementConstraint {
            namespace,
            local_name,
            class_name: ty.class_name.clone(),
            flags: {
                let mut flags = ElementFlags::empty();
                flags.set(ElementFlags::ABSTRACT, ty.is_abstract);
                flags.set(ElementFlags::LEAF, ty.is_leaf_element);
                flags
            },
            attributes,
            particle,
        }))
    }

    /// Resolve `"prefix:elem"` (element-reference form) to (namespace, local-name).
    fn split_element_ref(&self, reference: &str, default_namespace: &str) -> (String, String) {
        match reference.split_once(':') {
            Some((prefix, local)) => (self.resolve_prefix(prefix, default_namespace), local.to_string()),
            None => (default_namespace.to_string(), reference.to_string()),
        }
    }

    fn build_attribute(&self, json: &AttributeJson, default_namespace: &str) -> AttributeConstraint {
        let namespace = json
            .namespace
            .as_ref()
            .map(|ns| self.resolve_prefix(ns, default_namespace));
        let type_validator = json.sdk_type.as_deref().and_then(sdk_type_to_builtin).map(|builtin| {
            let mut v = get_type_validator(builtin);
            apply_facets(&mut v, json);
            v
        });
        AttributeConstraint {
            namespace,
            local_name: json.name.clone(),
            required: json.required,
            default: json.default.clone(),
            fixed: json.fixed.clone(),
            type_validator,
        }
    }

    fn build_particle(&self, json: &ParticleJson, default_namespace: &str) -> Result<Particle> {
        Ok(match json {
            ParticleJson::Element { name, occurs } => {
                let (namespace, local_name) = self.split_element_ref(name, default_namespace);
                Particle::Element {
                    namespace,
                    local_name,
                    occurs: parse_occurs(occurs),
                }
            },
            ParticleJson::Sequence { items, occurs } => Particle::Sequence {
                children: items
                    .iter()
                    .map(|p| self.build_particle(p, default_namespace))
                    .collect::<Result<Vec<_>>>()?,
                occurs: parse_occurs(occurs),
            },
            ParticleJson::Choice { items, occurs } => Particle::Choice {
                children: items
                    .iter()
                    .map(|p| self.build_particle(p, default_namespace))
                    .collect::<Result<Vec<_>>>()?,
                occurs: parse_occurs(occurs),
            },
            ParticleJson::All { items, occurs } => Particle::All {
                children: items
                    .iter()
                    .map(|p| self.build_particle(p, default_namespace))
                    .collect::<Result<Vec<_>>>()?,
                occurs: parse_occurs(occurs),
            },
            ParticleJson::Group { name, items, occurs } => Particle::Group {
                name: name.clone(),
                particle: Box::new(Particle::Sequence {
                    children: items
                        .iter()
                        .map(|p| self.build_particle(p, default_namespace))
                        .collect::<Result<Vec<_>>>()?,
                    occurs: Occurs::ONE,
                }),
                occurs: parse_occurs(occurs),
            },
            ParticleJson::Any { namespace, occurs } => Particle::Any {
                namespace_constraint: parse_any_namespace(namespace.as_deref(), default_namespace),
                occurs: parse_occurs(occurs),
            },
        })
    }

    /// All candidates registered for a tag, richest-scored first.
    pub fn candidates(&self, namespace: &str, local_name: &str) -> &[ElementConstraint] {
        self.by_tag
            .get(&format!("{{{namespace}}}{local_name}"))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// The load-time default candidate (richest score) for a tag.
    pub fn default_candidate(&self, namespace: &str, local_name: &str) -> Option<&ElementConstraint> {
        self.candidates(namespace, local_name).first()
    }

    /// Per-instance best-candidate selection (§4.3): among candidates whose
    /// required attributes are all present on `node`, pick the one with the
    /// highest `(specific_matches, total_matches)` score against the node's
    /// actual children, tie-breaking by declaration order and falling back
    /// to the registry default.
    pub fn best_candidate(&self, node: &XmlNode) -> Option<&ElementConstraint> {
        let (namespace, local_name) = (node.namespace().unwrap_or_default(), node.local_name());
        let candidates = self.candidates(namespace, local_name);
        if candidates.is_empty() {
            return None;
        }
        let eligible: Vec<&ElementConstraint> = candidates
            .iter()
            .filter(|c| c.required_attributes().all(|a| attribute_present(node, a)))
            .collect();
        let pool = if eligible.is_empty() { candidates.iter().collect() } else { eligible };

        let mut best: Option<(&ElementConstraint, (u32, u32))> = None;
        for candidate in pool {
            let score = instance_score(candidate, node);
            match best {
                Some((_, best_score)) if score <= best_score => {},
                _ => best = Some((candidate, score)),
            }
        }
        best.map(|(c, _)| c).or_else(|| self.default_candidate(namespace, local_name))
    }
}

fn attribute_present(node: &XmlNode, attr: &AttributeConstraint) -> bool {
    match &attr.namespace {
        Some(ns) => node.attr(&format!("{{{ns}}}{}", attr.local_name)).is_some(),
        None => node.attr_local(&attr.local_name).is_some(),
    }
}

/// `(specific_matches, total_matches)` packed into a single ordering key.
fn instance_score(candidate: &ElementConstraint, node: &XmlNode) -> (u32, u32) {
    let Some(particle) = &candidate.particle else {
        return (0, 0);
    };
    let mut specific = 0u32;
    let mut total = 0u32;
    for child in &node.children {
        if particle_has_specific_match(particle, child) {
            specific += 1;
            total += 1;
        } else if particle_has_any_match(particle, child) {
            total += 1;
        }
    }
    (specific, total)
}

fn particle_has_specific_match(particle: &Particle, node: &XmlNode) -> bool {
    match particle {
        Particle::Element { .. } => particle.qualified_name().as_deref() == Some(node.tag.as_str()),
        Particle::Sequence { children, .. } | Particle::Choice { children, .. } | Particle::All { children, .. } => {
            children.iter().any(|p| particle_has_specific_match(p, node))
        },
        Particle::Group { particle, .. } => particle_has_specific_match(particle, node),
        Particle::Any { .. } => false,
    }
}

fn particle_has_any_match(particle: &Particle, node: &XmlNode) -> bool {
    particle.matches(node)
}

fn parse_occurs(occurs: &Option<Vec<OccursJson>>) -> Occurs {
    match occurs {
        None => Occurs::ONE,
        Some(records) => {
            let record = records.first();
            let min_occurs = record.and_then(|r| r.min).unwrap_or(0);
            let max_occurs = match record.and_then(|r| r.max) {
                Some(0) => None,
                Some(n) => Some(n),
                None => None,
            };
            Occurs::new(min_occurs, max_occurs)
        },
    }
}

fn parse_any_namespace(namespace: Option<&str>, target_namespace: &str) -> AnyNamespaceConstraint {
    match namespace {
        None | Some("##any") => AnyNamespaceConstraint::Any,
        Some("##other") => AnyNamespaceConstraint::Other,
        Some("##local") => AnyNamespaceConstraint::Local,
        Some("##targetNamespace") => AnyNamespaceConstraint::TargetNamespace,
        Some(uri) if uri == target_namespace => AnyNamespaceConstraint::TargetNamespace,
        Some(uri) => AnyNamespaceConstraint::Specific(uri.to_string()),
    }
}

/// Fixed SDK→XSD type-name mapping table (§4.3).
fn sdk_type_to_builtin(sdk_type: &str) -> Option<XsdBuiltinType> {
    Some(match sdk_type {
        "StringValue" => XsdBuiltinType::String,
        "BooleanValue" => XsdBuiltinType::Boolean,
        "Int16Value" => XsdBuiltinType::Short,
        "Int32Value" => XsdBuiltinType::Int,
        "Int64Value" => XsdBuiltinType::Long,
        "UInt16Value" => XsdBuiltinType::UnsignedShort,
        "UInt32Value" => XsdBuiltinType::UnsignedInt,
        "UInt64Value" => XsdBuiltinType::UnsignedLong,
        "ByteValue" => XsdBuiltinType::Byte,
        "SByteValue" => XsdBuiltinType::UnsignedByte,
        "SingleValue" => XsdBuiltinType::Float,
        "DoubleValue" => XsdBuiltinType::Double,
        "DecimalValue" => XsdBuiltinType::Decimal,
        "DateTimeValue" => XsdBuiltinType::DateTime,
        "HexBinaryValue" => XsdBuiltinType::HexBinary,
        "Base64BinaryValue" => XsdBuiltinType::Base64Binary,
        other if other.starts_with("EnumValue") => XsdBuiltinType::String,
        other => XsdBuiltinType::from_name(other)?,
    })
}

fn apply_facets(validator: &mut Box<dyn XsdTypeValidator>, json: &AttributeJson) {
    use crate::ooxml::schema::types::{IntegerTypeValidator, StringTypeValidator};
    // Downcast-free facet application: rebuild validators that carry facets
    // when the JSON declares them, since `XsdTypeValidator` is object-safe
    // and intentionally has no `Any` escape hatch.
    if json.pattern.is_some() || json.min_length.is_some() || json.max_length.is_some() || json.enumeration.is_some()
    {
        *validator = Box::new(StringTypeValidator {
            min_length: json.min_length,
            max_length: json.max_length,
            pattern: json.pattern.as_deref().and_then(|p| regex::Regex::new(p).ok()),
            enumeration: json.enumeration.clone(),
        });
    } else if json.min_inclusive.is_some() || json.max_inclusive.is_some() {
        *validator = Box::new(IntegerTypeValidator::bounded(
            json.min_inclusive.map(|v| v as i64),
            json.max_inclusive.map(|v| v as i64),
        ));
    }
}

#[derive(Debug, Deserialize)]
struct SchemaFileJson {
    #[serde(default)]
    types: Vec<SchemaTypeJson>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SchemaTypeJson {
    name: String,
    class_name: String,
    #[serde(default)]
    base_class: Option<String>,
    #[serde(default)]
    is_abstract: bool,
    #[serde(default)]
    is_derived: bool,
    #[serde(default)]
    is_leaf_element: bool,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    attributes: Vec<AttributeJson>,
    #[serde(default)]
    particle: Option<ParticleJson>,
    #[serde(default)]
    children: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AttributeJson {
    name: String,
    #[serde(default)]
    namespace: Option<String>,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    default: Option<String>,
    #[serde(default)]
    fixed: Option<String>,
    #[serde(rename = "Type", default)]
    sdk_type: Option<String>,
    #[serde(default)]
    pattern: Option<String>,
    #[serde(default)]
    min_length: Option<usize>,
    #[serde(default)]
    max_length: Option<usize>,
    #[serde(default)]
    enumeration: Option<Vec<String>>,
    #[serde(default)]
    min_inclusive: Option<f64>,
    #[serde(default)]
    max_inclusive: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OccursJson {
    #[serde(rename = "Min", default)]
    min: Option<u32>,
    #[serde(rename = "Max", default)]
    max: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "Kind", rename_all = "PascalCase")]
enum ParticleJson {
    Element {
        #[serde(rename = "Name")]
        name: String,
        #[serde(rename = "Occurs", default)]
        occurs: Option<Vec<OccursJson>>,
    },
    Sequence {
        #[serde(rename = "Items", default)]
        items: Vec<ParticleJson>,
        #[serde(rename = "Occurs", default)]
        occurs: Option<Vec<OccursJson>>,
    },
    Choice {
        #[serde(rename = "Items", default)]
        items: Vec<ParticleJson>,
        #[serde(rename = "Occurs", default)]
        occurs: Option<Vec<OccursJson>>,
    },
    All {
        #[serde(rename = "Items", default)]
        items: Vec<ParticleJson>,
        #[serde(rename = "Occurs", default)]
        occurs: Option<Vec<OccursJson>>,
    },
    Group {
        #[serde(rename = "Name")]
        name: String,
        #[serde(rename = "Items", default)]
        items: Vec<ParticleJson>,
        #[serde(rename = "Occurs", default)]
        occurs: Option<Vec<OccursJson>>,
    },
    Any {
        #[serde(rename = "Namespace", default)]
        namespace: Option<String>,
        #[serde(rename = "Occurs", default)]
        occurs: Option<Vec<OccursJson>>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occurs_defaults_to_one_when_absent() {
        assert_eq!(parse_occurs(&None).min_occurs, 1);
        assert_eq!(parse_occurs(&None).max_occurs, Some(1));
    }

    #[test]
    fn empty_occurrence_record_means_unbounded() {
        let occ = parse_occurs(&Some(vec![]));
        assert_eq!(occ.min_occurs, 0);
        assert!(occ.is_unbounded());
    }

    #[test]
    fn max_zero_means_unbounded() {
        let occ = parse_occurs(&Some(vec![OccursJson { min: Some(1), max: Some(0) }]));
        assert_eq!(occ.min_occurs, 1);
        assert!(occ.is_unbounded());
    }

    #[test]
    fn min_only_means_unbounded() {
        let occ = parse_occurs(&Some(vec![OccursJson { min: Some(2), max: None }]));
        assert_eq!(occ.min_occurs, 2);
        assert!(occ.is_unbounded());
    }

    #[test]
    fn loads_a_minimal_schema_file_and_indexes_by_tag() {
        let mut registry = SchemaRegistry::new();
        let json = r#"{
            "types": [
                {
                    "Name": "w:CT_Body/w:body",
                    "ClassName": "Body",
                    "IsAbstract": false,
                    "IsDerived": false,
                    "IsLeafElement": false,
                    "Attributes": [],
                    "Particle": {
                        "Kind": "Sequence",
                        "Items": [
                            { "Kind": "Element", "Name": "w:p", "Occurs": [] }
                        ]
                    }
                }
            ]
        }"#;
        registry.load_namespace_file(crate::ooxml::namespaces::WORDPROCESSINGML, json).unwrap();
        let candidates = registry.candidates(crate::ooxml::namespaces::WORDPROCESSINGML, "body");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].class_name, "Body");
    }
}
