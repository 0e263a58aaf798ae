//! XSD built-in type validators for attribute and element content validation.

use std::fmt;

/// XSD built-in type names, restricted to the subset the validator cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XsdBuiltinType {
    String,
    Boolean,
    Integer,
    PositiveInteger,
    NonNegativeInteger,
    NegativeInteger,
    NonPositiveInteger,
    Long,
    Int,
    Short,
    Byte,
    UnsignedLong,
    UnsignedInt,
    UnsignedShort,
    UnsignedByte,
    Decimal,
    Float,
    Double,
    DateTime,
    HexBinary,
    Base64Binary,
    NcName,
    Id,
    IdRef,
    AnyUri,
}

impl XsdBuiltinType {
    /// Parse an XSD type name (e.g. `"nonNegativeInteger"`) into its variant.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "string" => Self::String,
            "boolean" => Self::Boolean,
            "integer" => Self::Integer,
            "positiveInteger" => Self::PositiveInteger,
            "nonNegativeInteger" => Self::NonNegativeInteger,
            "negativeInteger" => Self::NegativeInteger,
            "nonPositiveInteger" => Self::NonPositiveInteger,
            "long" => Self::Long,
            "int" => Self::Int,
            "short" => Self::Short,
            "byte" => Self::Byte,
            "unsignedLong" => Self::UnsignedLong,
            "unsignedInt" => Self::UnsignedInt,
            "unsignedShort" => Self::UnsignedShort,
            "unsignedByte" => Self::UnsignedByte,
            "decimal" => Self::Decimal,
            "float" => Self::Float,
            "double" => Self::Double,
            "dateTime" => Self::DateTime,
            "hexBinary" => Self::HexBinary,
            "base64Binary" => Self::Base64Binary,
            "NCName" => Self::NcName,
            "ID" => Self::Id,
            "IDREF" => Self::IdRef,
            "anyURI" => Self::AnyUri,
            _ => return None,
        })
    }
}

/// Result of validating a string value against an [`XsdTypeValidator`].
#[derive(Debug, Clone)]
pub struct TypeValidationResult {
    pub is_valid: bool,
    pub error_message: Option<String>,
}

impl TypeValidationResult {
    pub fn ok() -> Self {
        Self {
            is_valid: true,
            error_message: None,
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error_message: Some(message.into()),
        }
    }
}

/// Validates a lexical string value against an XSD type's constraints.
pub trait XsdTypeValidator: fmt::Debug + Send + Sync {
    fn validate(&self, value: &str) -> TypeValidationResult;
}

/// Validates `xsd:string` with optional length, pattern, and enumeration constraints.
#[derive(Debug, Default)]
pub struct StringTypeValidator {
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<regex::Regex>,
    pub enumeration: Option<Vec<String>>,
}

impl XsdTypeValidator for StringTypeValidator {
    fn validate(&self, value: &str) -> TypeValidationResult {
        if let Some(min) = self.min_length {
            if value.chars().count() < min {
                return TypeValidationResult::invalid(format!(
                    "string length {} is less than minimum {min}",
                    value.chars().count()
                ));
            }
        }
        if let Some(max) = self.max_length {
            if value.chars().count() > max {
                return TypeValidationResult::invalid(format!(
                    "string length {} exceeds maximum {max}",
                    value.chars().count()
                ));
            }
        }
        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(value) {
                return TypeValidationResult::invalid(format!(
                    "value '{value}' does not match required pattern"
                ));
            }
        }
        if let Some(enumeration) = &self.enumeration {
            if !enumeration.iter().any(|v| v == value) {
                return TypeValidationResult::invalid(format!(
                    "value '{value}' is not in allowed values: {enumeration:?}"
                ));
            }
        }
        TypeValidationResult::ok()
    }
}

/// Validates `xsd:boolean` (`true`/`false`/`1`/`0`, case-insensitive).
#[derive(Debug, Default)]
pub struct BooleanTypeValidator;

impl XsdTypeValidator for BooleanTypeValidator {
    fn validate(&self, value: &str) -> TypeValidationResult {
        match value.to_ascii_lowercase().as_str() {
            "true" | "false" | "1" | "0" => TypeValidationResult::ok(),
            _ => TypeValidationResult::invalid(format!(
                "invalid boolean value: '{value}'. expected true, false, 1, or 0"
            )),
        }
    }
}

/// Validates integral XSD types with optional inclusive/exclusive min/max bounds.
#[derive(Debug, Default)]
pub struct IntegerTypeValidator {
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
}

impl IntegerTypeValidator {
    pub fn bounded(min_value: Option<i64>, max_value: Option<i64>) -> Self {
        Self {
            min_value,
            max_value,
        }
    }
}

impl XsdTypeValidator for IntegerTypeValidator {
    fn validate(&self, value: &str) -> TypeValidationResult {
        let parsed: i64 = match value.parse() {
            Ok(v) => v,
            Err(_) => return TypeValidationResult::invalid(format!("invalid integer value: '{value}'")),
        };
        if let Some(min) = self.min_value {
            if parsed < min {
                return TypeValidationResult::invalid(format!(
                    "value {parsed} is less than minimum {min}"
                ));
            }
        }
        if let Some(max) = self.max_value {
            if parsed > max {
                return TypeValidationResult::invalid(format!(
                    "value {parsed} exceeds maximum {max}"
                ));
            }
        }
        TypeValidationResult::ok()
    }
}

/// Validates `xsd:decimal` as an `f64`. ECMA-376's decimal-typed attributes
/// (line widths, percentages) don't need arbitrary precision, so this skips
/// the `Decimal` crate the original uses and accepts the rounding an `f64`
/// implies.
#[derive(Debug, Default)]
pub struct DecimalTypeValidator {
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
}

impl XsdTypeValidator for DecimalTypeValidator {
    fn validate(&self, value: &str) -> TypeValidationResult {
        let parsed: f64 = match value.parse() {
            Ok(v) => v,
            Err(_) => return TypeValidationResult::invalid(format!("invalid decimal value: '{value}'")),
        };
        if let Some(min) = self.min_value {
            if parsed < min {
                return TypeValidationResult::invalid(format!(
                    "value {parsed} is less than minimum {min}"
                ));
            }
        }
        if let Some(max) = self.max_value {
            if parsed > max {
                return TypeValidationResult::invalid(format!(
                    "value {parsed} exceeds maximum {max}"
                ));
            }
        }
        TypeValidationResult::ok()
    }
}

/// Validates `xsd:float` as an `f32`, distinct from `xsd:double` because a
/// value that overflows single precision (e.g. `"1e400"`) is invalid here
/// but a valid double.
#[derive(Debug, Default)]
pub struct FloatTypeValidator;

impl XsdTypeValidator for FloatTypeValidator {
    fn validate(&self, value: &str) -> TypeValidationResult {
        match value.parse::<f32>() {
            Ok(v) if v.is_finite() || value.trim() == "INF" || value.trim() == "-INF" || value.trim() == "NaN" => TypeValidationResult::ok(),
            Ok(_) => TypeValidationResult::invalid(format!("float value '{value}' overflows single precision")),
            Err(_) => TypeValidationResult::invalid(format!("invalid float value: '{value}'")),
        }
    }
}

/// Validates `xsd:double` as an `f64`.
#[derive(Debug, Default)]
pub struct DoubleTypeValidator;

impl XsdTypeValidator for DoubleTypeValidator {
    fn validate(&self, value: &str) -> TypeValidationResult {
        match value.parse::<f64>() {
            Ok(_) => TypeValidationResult::ok(),
            Err(_) => TypeValidationResult::invalid(format!("invalid double value: '{value}'")),
        }
    }
}

/// Validates `xsd:base64Binary` by attempting a real decode with the
/// standard base64 alphabet (with padding), the form ECMA-376's embedded
/// binary parts (`w:binData`, OLE object payloads) use.
#[derive(Debug, Default)]
pub struct Base64BinaryTypeValidator;

impl XsdTypeValidator for Base64BinaryTypeValidator {
    fn validate(&self, value: &str) -> TypeValidationResult {
        use base64::Engine;
        let stripped: String = value.chars().filter(|c| !c.is_whitespace()).collect();
        match base64::engine::general_purpose::STANDARD.decode(&stripped) {
            Ok(_) => TypeValidationResult::ok(),
            Err(e) => TypeValidationResult::invalid(format!("invalid base64Binary value: {e}")),
        }
    }
}

/// Validates `xsd:dateTime` via `chrono`'s RFC 3339-compatible parser, which
/// accepts the ISO 8601 profile ECMA-376 uses (optional fractional seconds,
/// `Z` or `+HH:MM` offset).
#[derive(Debug, Default)]
pub struct DateTimeTypeValidator;

impl XsdTypeValidator for DateTimeTypeValidator {
    fn validate(&self, value: &str) -> TypeValidationResult {
        match chrono::DateTime::parse_from_rfc3339(value) {
            Ok(_) => TypeValidationResult::ok(),
            Err(err) => TypeValidationResult::invalid(format!("invalid dateTime value: '{value}' ({err})")),
        }
    }
}

/// Validates `xsd:hexBinary`: an even-length string of hex digits, optionally
/// of a fixed decoded byte length.
#[derive(Debug, Default)]
pub struct HexBinaryTypeValidator {
    pub length: Option<usize>,
}

impl XsdTypeValidator for HexBinaryTypeValidator {
    fn validate(&self, value: &str) -> TypeValidationResult {
        if !value.chars().all(|c| c.is_ascii_hexdigit()) {
            return TypeValidationResult::invalid(format!("invalid hexBinary value: '{value}'"));
        }
        if value.len() % 2 != 0 {
            return TypeValidationResult::invalid("hexBinary value must have an even number of characters");
        }
        if let Some(length) = self.length {
            if value.len() / 2 != length {
                return TypeValidationResult::invalid(format!(
                    "hexBinary length {} does not match required {length}",
                    value.len() / 2
                ));
            }
        }
        TypeValidationResult::ok()
    }
}

/// Validates `xsd:NCName` (and, by extension, `ID`/`IDREF`): starts with a
/// letter or underscore, followed by letters, digits, hyphens, underscores,
/// or periods.
#[derive(Debug, Default)]
pub struct NcNameTypeValidator;

impl XsdTypeValidator for NcNameTypeValidator {
    fn validate(&self, value: &str) -> TypeValidationResult {
        if value.is_empty() {
            return TypeValidationResult::invalid("NCName cannot be empty");
        }
        let mut chars = value.chars();
        let first = chars.next().unwrap();
        if !(first.is_alphabetic() || first == '_') {
            return TypeValidationResult::invalid(format!("invalid NCName: '{value}'"));
        }
        if !chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.')) {
            return TypeValidationResult::invalid(format!("invalid NCName: '{value}'"));
        }
        TypeValidationResult::ok()
    }
}

/// Validates `xsd:anyURI` with a best-effort character blacklist rather than
/// full RFC 3986 parsing.
#[derive(Debug, Default)]
pub struct AnyUriTypeValidator;

impl XsdTypeValidator for AnyUriTypeValidator {
    fn validate(&self, value: &str) -> TypeValidationResult {
        const INVALID_CHARS: &[char] = &['<', '>', '"', '{', '}', '|', '\\', '^', '`'];
        if value.chars().any(|c| INVALID_CHARS.contains(&c)) {
            return TypeValidationResult::invalid("invalid URI: contains invalid characters");
        }
        TypeValidationResult::ok()
    }
}

/// Get the pre-built validator for an XSD built-in type.
pub fn get_type_validator(builtin: XsdBuiltinType) -> Box<dyn XsdTypeValidator> {
    use XsdBuiltinType::*;
    match builtin {
        String => Box::new(StringTypeValidator::default()),
        Boolean => Box::new(BooleanTypeValidator),
        Integer => Box::new(IntegerTypeValidator::default()),
        PositiveInteger => Box::new(IntegerTypeValidator::bounded(Some(1), None)),
        NonNegativeInteger => Box::new(IntegerTypeValidator::bounded(Some(0), None)),
        NegativeInteger => Box::new(IntegerTypeValidator::bounded(None, Some(-1))),
        NonPositiveInteger => Box::new(IntegerTypeValidator::bounded(None, Some(0))),
        Long => Box::new(IntegerTypeValidator::bounded(Some(i64::MIN), Some(i64::MAX))),
        Int => Box::new(IntegerTypeValidator::bounded(
            Some(i32::MIN as i64),
            Some(i32::MAX as i64),
        )),
        Short => Box::new(IntegerTypeValidator::bounded(
            Some(i16::MIN as i64),
            Some(i16::MAX as i64),
        )),
        Byte => Box::new(IntegerTypeValidator::bounded(
            Some(i8::MIN as i64),
            Some(i8::MAX as i64),
        )),
        UnsignedLong => Box::new(IntegerTypeValidator::bounded(Some(0), Some(i64::MAX))),
        UnsignedInt => Box::new(IntegerTypeValidator::bounded(Some(0), Some(u32::MAX as i64))),
        UnsignedShort => Box::new(IntegerTypeValidator::bounded(Some(0), Some(u16::MAX as i64))),
        UnsignedByte => Box::new(IntegerTypeValidator::bounded(Some(0), Some(u8::MAX as i64))),
        Decimal => Box::new(DecimalTypeValidator::default()),
        Float => Box::new(FloatTypeValidator),
        Double => Box::new(DoubleTypeValidator),
        DateTime => Box::new(DateTimeTypeValidator),
        HexBinary => Box::new(HexBinaryTypeValidator::default()),
        Base64Binary => Box::new(Base64BinaryTypeValidator),
        NcName | Id | IdRef => Box::new(NcNameTypeValidator),
        AnyUri => Box::new(AnyUriTypeValidator),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_accepts_canonical_lexical_forms() {
        let v = BooleanTypeValidator;
        assert!(v.validate("true").is_valid);
        assert!(v.validate("0").is_valid);
        assert!(!v.validate("yes").is_valid);
    }

    #[test]
    fn unsigned_int_rejects_negative_and_overflow() {
        let v = get_type_validator(XsdBuiltinType::UnsignedInt);
        assert!(v.validate("0").is_valid);
        assert!(!v.validate("-1").is_valid);
        assert!(!v.validate("4294967296").is_valid);
    }

    #[test]
    fn ncname_rejects_leading_digit() {
        let v = NcNameTypeValidator;
        assert!(!v.validate("1abc").is_valid);
        assert!(v.validate("_abc-1.2").is_valid);
    }

    #[test]
    fn hex_binary_requires_even_length() {
        let v = HexBinaryTypeValidator::default();
        assert!(v.validate("1A2B").is_valid);
        assert!(!v.validate("1A2").is_valid);
        assert!(!v.validate("1AZZ").is_valid);
    }

    #[test]
    fn float_rejects_double_precision_overflow() {
        let v = FloatTypeValidator;
        assert!(v.validate("3.14").is_valid);
        assert!(!v.validate("1e400").is_valid);
    }

    #[test]
    fn double_accepts_values_float_would_overflow_on() {
        let v = DoubleTypeValidator;
        assert!(v.validate("1e300").is_valid);
        assert!(!v.validate("not-a-number").is_valid);
    }

    #[test]
    fn base64_binary_rejects_invalid_alphabet() {
        let v = Base64BinaryTypeValidator;
        assert!(v.validate("SGVsbG8=").is_valid);
        assert!(!v.validate("not valid base64!!").is_valid);
    }
}
