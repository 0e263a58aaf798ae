//! Schematron rule loading and classification (§4.4): turns the
//! Schematron-derived JSON rule records shipped alongside the XSD schemas
//! into canonical [`rule::RuleKind`] values the Constraint Bridge can lower
//! into runtime predicates.

pub mod classify;
pub mod registry;
pub mod rule;

pub use registry::SchematronRegistry;
pub use rule::{Application, ComparisonOp, RuleKind, SchematronRule};
