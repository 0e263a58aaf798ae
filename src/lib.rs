//! Litchi - an OOXML (Office Open XML) conformance validator
//!
//! This crate validates Office Open XML packages (.docx, .xlsx, .pptx)
//! against the package-structure, schema, and semantic rules defined by
//! ECMA-376 / ISO/IEC 29500, without needing a copy of Microsoft Office.
//!
//! A validation run proceeds in layers, each of which can surface its own
//! diagnostics independent of the others:
//!
//! 1. **Package structure** - the ZIP/OPC container: `[Content_Types].xml`,
//!    relationship parts, and the relationship graph reachable from them.
//! 2. **Schema** - every XML part is checked against the element/attribute
//!    constraints derived from the ECMA-376 schemas for its document type.
//! 3. **Semantic** - cross-cutting rules a schema alone can't express: ID
//!    references, relationship-attribute targets, Schematron-derived value
//!    constraints, and cross-part wiring.
//! 4. **Binary payloads** - embedded media and font parts are sniffed and,
//!    for obfuscated fonts, deobfuscated before inspection.
//!
//! # Example
//!
//! ```no_run
//! use litchi::ooxml::OpcPackage;
//! use litchi::validate::{ConstraintRegistries, OpenXmlValidator, ValidationOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let package = OpcPackage::open("presentation.pptx")?;
//! let registries = ConstraintRegistries::builder().build();
//! let validator = OpenXmlValidator::new(registries, ValidationOptions::default());
//! let report = validator.validate(&package);
//!
//! for diagnostic in report.diagnostics() {
//!     println!("{}", diagnostic);
//! }
//! # Ok(())
//! # }
//! ```

/// OOXML (Office Open XML) package, schema, and semantic handling.
///
/// This module provides the Open Packaging Conventions (OPC) layer used to
/// read `.docx`/`.xlsx`/`.pptx` containers, plus the schema and semantic
/// constraint model the validator checks parts against.
pub mod ooxml;

/// Top-level validation pipeline, orchestrating package, schema, semantic,
/// and binary-payload checks into a single validation report.
pub mod validate;

/// Common types, traits, and utilities shared across the validator.
pub mod common;

// Re-export commonly used types for convenience
pub use ooxml::{OoxmlError, OpcPackage, PackURI};
