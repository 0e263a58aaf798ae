//! The validator's diagnostic record and severity/kind taxonomy (§3, §7).

use std::fmt;

/// The pipeline phase a diagnostic originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Cannot treat the input as a valid OPC container.
    Package,
    /// Magic-byte mismatch or font deobfuscation failure.
    Binary,
    /// XML well-formedness, attribute, or content-model violation.
    Schema,
    /// Schematron-derived predicate, id uniqueness, or relationship-attribute failure.
    Semantic,
    /// Duplicate relationship id or unresolved internal target.
    Relationship,
    /// Markup-compatibility (`mc:`) structure violation.
    MarkupCompatibility,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Package => "Package",
            ErrorKind::Binary => "Binary",
            ErrorKind::Schema => "Schema",
            ErrorKind::Semantic => "Semantic",
            ErrorKind::Relationship => "Relationship",
            ErrorKind::MarkupCompatibility => "MarkupCompatibility",
        };
        f.write_str(s)
    }
}

/// Diagnostic severity, orthogonal to [`ErrorKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "Info",
            Severity::Warning => "Warning",
            Severity::Error => "Error",
        };
        f.write_str(s)
    }
}

/// A single validation diagnostic.
///
/// Two records compare equal iff `(description.trim(), part_uri, element_path)`
/// match (§6), which lets a caller diff a run against a reference tool's
/// output without the two agreeing on node/related-node bookkeeping.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub kind: ErrorKind,
    pub severity: Severity,
    pub description: String,
    pub part_uri: String,
    pub element_path: String,
    pub node_name: Option<String>,
    pub related_node: Option<String>,
    pub id: Option<String>,
}

impl ValidationError {
    pub fn new(kind: ErrorKind, severity: Severity, description: impl Into<String>, part_uri: impl Into<String>, element_path: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            description: description.into(),
            part_uri: part_uri.into(),
            element_path: element_path.into(),
            node_name: None,
            related_node: None,
            id: None,
        }
    }

    pub fn with_node(mut self, node_name: impl Into<String>) -> Self {
        self.node_name = Some(node_name.into());
        self
    }

    pub fn with_related_node(mut self, related_node: impl Into<String>) -> Self {
        self.related_node = Some(related_node.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl PartialEq for ValidationError {
    fn eq(&self, other: &Self) -> bool {
        self.description.trim() == other.description.trim()
            && self.part_uri == other.part_uri
            && self.element_path == other.element_path
    }
}

impl Eq for ValidationError {}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}/{}] {} ({}{})",
            self.kind,
            self.severity,
            self.description,
            self.part_uri,
            if self.element_path.is_empty() { String::new() } else { format!(" {}", self.element_path) }
        )
    }
}
