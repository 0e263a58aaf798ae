//! File-format identification and per-run validation options (§6).

/// The declared Office/ODF generation a package targets. Used for
/// version-sensitive rules (e.g. a theme format-scheme name required only
/// in Office 2007).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileFormat {
    Office2007,
    Office2010,
    Office2013,
    Office2016,
    Office2019,
    Office2021,
    #[default]
    Microsoft365,
    Odf1_2,
    Odf1_3,
}

impl FileFormat {
    pub fn is_odf(&self) -> bool {
        matches!(self, FileFormat::Odf1_2 | FileFormat::Odf1_3)
    }
}

/// Options controlling one validation run.
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    /// When `false`, non-Package Errors are demoted to Warnings (§6 "Strict flag").
    pub strict: bool,
    /// `0` means unlimited; otherwise the pipeline short-circuits once this
    /// many Error-severity records have been collected.
    pub max_errors: usize,
    /// Whether the Schema Validator reports elements with no matching
    /// constraint and no `Any` match (off by default, §4.6).
    pub validate_unknown_elements: bool,
    /// The format version the caller declares the package targets.
    pub format: FileFormat,
    /// Run the Schema Validator phase at all.
    pub schema_validation: bool,
    /// Run the Semantic Validator phase at all.
    pub semantic_validation: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            strict: true,
            max_errors: 0,
            validate_unknown_elements: false,
            format: FileFormat::default(),
            schema_validation: true,
            semantic_validation: true,
        }
    }
}
