//! Parsed Schematron rule records and the canonical semantic kinds their
//! XPath tests classify into (§3, §4.4).

/// Which document family a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Application {
    All,
    Word,
    Excel,
    PowerPoint,
}

impl Application {
    pub fn from_str(s: &str) -> Self {
        match s {
            "Word" | "WordprocessingML" => Application::Word,
            "Excel" | "SpreadsheetML" => Application::Excel,
            "PowerPoint" | "PresentationML" => Application::PowerPoint,
            _ => Application::All,
        }
    }
}

/// A two-sided comparison operator for `AttributeComparison`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Lt,
    Le,
    Gt,
    Ge,
}

/// The canonical semantic kind a Schematron test classifies into, with the
/// parameters extracted from the XPath test string.
#[derive(Debug, Clone)]
pub enum RuleKind {
    AttributeValueRange {
        attribute: String,
        min: Option<f64>,
        max: Option<f64>,
    },
    AttributeValueLength {
        attribute: String,
        min: Option<usize>,
        max: Option<usize>,
    },
    AttributeValuePattern {
        attribute: String,
        pattern: String,
    },
    UniqueAttribute {
        attribute: String,
    },
    RelationshipType {
        attribute: String,
        expected_type: String,
    },
    ElementReference,
    AttributeNotEqual {
        attribute: String,
        value: String,
    },
    AttributeEquals {
        attribute: String,
        value: String,
    },
    AttributeComparison {
        left: String,
        right: String,
        op: ComparisonOp,
    },
    OrCondition {
        branches: Vec<RuleKind>,
    },
    AndCondition {
        conjuncts: Vec<RuleKind>,
    },
    AttributesPresent {
        attributes: Vec<String>,
        all_required: bool,
    },
    ConditionalValue {
        condition_attribute: String,
        then: Box<RuleKind>,
    },
    CrossPartCount {
        attribute: String,
        part_path: String,
        xpath: String,
        offset: i64,
    },
    Unknown,
}

/// A Schematron rule as loaded from the registry, with its test already classified.
#[derive(Debug, Clone)]
pub struct SchematronRule {
    pub context: String,
    pub test: String,
    pub app: Application,
    pub kind: RuleKind,
}
