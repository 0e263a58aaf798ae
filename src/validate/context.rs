//! [`ValidationContext`]: the element-path stack, bounded error buffer, and
//! id/relationship-integrity bookkeeping threaded through a single
//! validation run (§4.10, §5 "Memory").

use std::collections::{HashMap, HashSet};

use crate::ooxml::OpcPackage;
use crate::validate::error::{ErrorKind, Severity, ValidationError};
use crate::validate::options::FileFormat;

/// Mutable state for one package validation. Not reused across packages:
/// a fresh context is built per [`crate::validate::OpenXmlValidator::validate`] call.
pub struct ValidationContext<'a> {
    pub package: &'a OpcPackage,
    pub format: FileFormat,
    pub strict: bool,
    pub error_ceiling: usize,
    pub validate_unknown_elements: bool,
    current_part: String,
    element_stack: Vec<String>,
    ids_by_part: HashMap<String, HashSet<String>>,
    errors: Vec<ValidationError>,
}

impl<'a> ValidationContext<'a> {
    pub fn new(package: &'a OpcPackage, format: FileFormat, strict: bool, error_ceiling: usize, validate_unknown_elements: bool) -> Self {
        Self {
            package,
            format,
            strict,
            error_ceiling,
            validate_unknown_elements,
            current_part: String::new(),
            element_stack: Vec::new(),
            ids_by_part: HashMap::new(),
            errors: Vec::new(),
        }
    }

    pub fn enter_part(&mut self, part_uri: &str) {
        self.current_part = part_uri.to_string();
        self.element_stack.clear();
    }

    pub fn current_part(&self) -> &str {
        &self.current_part
    }

    pub fn push_element(&mut self, local_name: &str) {
        self.element_stack.push(local_name.to_string());
    }

    pub fn pop_element(&mut self) {
        self.element_stack.pop();
    }

    pub fn current_path(&self) -> String {
        if self.element_stack.is_empty() {
            "/".to_string()
        } else {
            format!("/{}", self.element_stack.join("/"))
        }
    }

    /// Per-part id tracker: returns `true` if `id` was already seen in the
    /// current part (i.e. this occurrence is a duplicate).
    pub fn observe_id(&mut self, id: &str) -> bool {
        let seen = self.ids_by_part.entry(self.current_part.clone()).or_default();
        !seen.insert(id.to_string())
    }

    /// Number of `Error`-severity records recorded so far.
    pub fn error_count(&self) -> usize {
        self.errors.iter().filter(|e| e.severity == Severity::Error).count()
    }

    /// Whether the configured `error_ceiling` has been reached (`0` = unlimited).
    pub fn has_reached_ceiling(&self) -> bool {
        self.error_ceiling != 0 && self.error_count() >= self.error_ceiling
    }

    /// Record a diagnostic at the current part/path, applying strict-mode
    /// severity demotion (non-Package Errors become Warnings when `!strict`).
    pub fn record(&mut self, kind: ErrorKind, severity: Severity, description: impl Into<String>) {
        if self.has_reached_ceiling() {
            return;
        }
        let severity = self.demote(kind, severity);
        self.errors.push(ValidationError::new(kind, severity, description, self.current_part.clone(), self.current_path()));
    }

    pub fn record_full(&mut self, mut error: ValidationError) {
        if self.has_reached_ceiling() {
            return;
        }
        error.severity = self.demote(error.kind, error.severity);
        self.errors.push(error);
    }

    fn demote(&self, kind: ErrorKind, severity: Severity) -> Severity {
        if !self.strict && severity == Severity::Error && kind != ErrorKind::Package {
            Severity::Warning
        } else {
            severity
        }
    }

    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }
}
