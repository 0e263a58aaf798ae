//! Office Open XML (OOXML) package, schema, and semantic handling.
//!
//! This module provides the Open Packaging Conventions (OPC) layer used to
//! read `.docx`/`.xlsx`/`.pptx` containers, the namespace/relationship-type
//! constants ECMA-376 defines for them, and the schema and semantic
//! constraint model the validation pipeline checks parts against.
//!
//! # Architecture
//!
//! 1. **OPC Layer** (`opc`): package handling (ZIP, parts, relationships).
//! 2. **Namespaces** (`namespaces`): Clark-notation namespace and
//!    relationship-type URI constants shared by the schema and semantic
//!    layers.
//! 3. **Schema** (`schema`): element/attribute/particle constraint model
//!    derived from the ECMA-376 schemas for each document type.
//! 4. **Semantic** (`semantic`): ID-reference, relationship-attribute, and
//!    Schematron-derived value constraints that schema validation alone
//!    can't express.
//! 5. **Fonts** (`fonts`): embedded-font deobfuscation for binary payload
//!    validation.
//! 6. **Binary** (`binary`): magic-byte payload sniffing for embedded
//!    images, OLE objects, and fonts.
//! 7. **ODF** (`odf`): minimal, separate structural validator for
//!    OpenDocument packages (mimetype entry, manifest presence).
pub mod binary;
pub mod error;
pub mod fonts;
pub mod namespaces;
pub mod odf;
pub mod opc;
pub mod schema;
pub mod schematron;
pub mod semantic;
pub mod xmltree;

// Re-export commonly used types from the OPC layer
pub use opc::{OpcPackage, PackURI};

// Re-export error types
pub use error::{OoxmlError, Result};
