//! Element/attribute/particle constraint model derived from the ECMA-376
//! schemas, plus the validator that walks a part's XML tree against it.
//!
//! The registry (`registry`) loads per-namespace JSON schema files into an
//! in-memory, namespace-aware lookup of [`registry::ElementConstraint`].
//! `particle` models the XSD content-model tagged union those constraints
//! reference, `types` the XSD built-in attribute-value validators, and
//! `validator` the part-walking Schema Validator itself (ECMA-376 §4.6).
pub mod bridge;
pub mod particle;
pub mod registry;
pub mod types;
pub mod validator;

pub use particle::{AnyNamespaceConstraint, ContentModelError, Occurs, Particle};
pub use registry::{AttributeConstraint, ElementConstraint, SchemaRegistry};
pub use validator::SchemaValidator;
