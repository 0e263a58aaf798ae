//! The validator's output: an ordered diagnostic list plus a boolean verdict (§6).

use crate::validate::error::{Severity, ValidationError};
use crate::validate::options::FileFormat;

/// Outcome of validating one package.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
    pub file_path: Option<String>,
    pub file_format: FileFormat,
}

impl ValidationResult {
    pub fn new(errors: Vec<ValidationError>, file_path: Option<String>, file_format: FileFormat) -> Self {
        let is_valid = !errors.iter().any(|e| e.severity == Severity::Error);
        Self {
            is_valid,
            errors,
            file_path,
            file_format,
        }
    }

    /// Every recorded diagnostic, in document/enumeration order.
    pub fn diagnostics(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    pub fn errors_of_severity(&self, severity: Severity) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(move |e| e.severity == severity)
    }
}
