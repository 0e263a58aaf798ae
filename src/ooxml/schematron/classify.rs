//! Classifies a Schematron `test` XPath string into a [`RuleKind`] (§4.4).
//!
//! The classifier is an ordered list of regex matchers: the first pattern
//! that matches wins. A test that matches none of them becomes `Unknown`,
//! which the bridge simply never turns into a runtime constraint.

use once_cell::sync::Lazy;
use regex::Regex;

use super::rule::{ComparisonOp, RuleKind};

const NUM: &str = r"[+-]?\d+(?:\.\d+)?(?:[eE][+-]?\d+)?f?";

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("classifier pattern must compile")
}

static RANGE_GE_LE: Lazy<Regex> =
    Lazy::new(|| re(&format!(r"^@(?P<a1>[\w:.-]+)\s*>=\s*(?P<min>{NUM})\s+and\s+@(?P<a2>[\w:.-]+)\s*<=\s*(?P<max>{NUM})$")));
static RANGE_LE_GE: Lazy<Regex> =
    Lazy::new(|| re(&format!(r"^@(?P<a1>[\w:.-]+)\s*<=\s*(?P<max>{NUM})\s+and\s+@(?P<a2>[\w:.-]+)\s*>=\s*(?P<min>{NUM})$")));
static RANGE_LE_ONLY: Lazy<Regex> = Lazy::new(|| re(&format!(r"^@(?P<a>[\w:.-]+)\s*<=\s*(?P<max>{NUM})$")));
static RANGE_GE_ONLY: Lazy<Regex> = Lazy::new(|| re(&format!(r"^@(?P<a>[\w:.-]+)\s*>=\s*(?P<min>{NUM})$")));

static STRLEN_BOTH: Lazy<Regex> = Lazy::new(|| {
    re(&format!(
        r"^string-length\(@(?P<a1>[\w:.-]+)\)\s*>=\s*(?P<min>{NUM})\s+and\s+string-length\(@(?P<a2>[\w:.-]+)\)\s*<=\s*(?P<max>{NUM})$"
    ))
});
static STRLEN_MIN_ONLY: Lazy<Regex> = Lazy::new(|| re(&format!(r"^string-length\(@(?P<a>[\w:.-]+)\)\s*>=\s*(?P<min>{NUM})$")));
static STRLEN_MAX_ONLY: Lazy<Regex> = Lazy::new(|| re(&format!(r"^string-length\(@(?P<a>[\w:.-]+)\)\s*<=\s*(?P<max>{NUM})$")));

static MATCHES: Lazy<Regex> = Lazy::new(|| re(r#"^matches\(@(?P<a>[\w:.-]+),\s*'(?P<pat>.*)'\)$"#));

static UNIQUE: Lazy<Regex> =
    Lazy::new(|| re(r"^count\(distinct-values\([^)]*@(?P<a>[\w:.-]+)\)\)\s*=\s*count\([^)]*\)$"));

static RELATIONSHIP_TYPE: Lazy<Regex> = Lazy::new(|| {
    re(r#"^document\([^)]*\)//r:Relationship\[@Id\s*=\s*current\(\)/@(?P<a>[\w:.-]+)\s+and\s+@Type\s*=\s*'(?P<ty>[^']+)'\]$"#)
});

static ELEMENT_REFERENCE: Lazy<Regex> = Lazy::new(|| re(r"(?i)^index-of\(document\("));

static NOT_EQUAL: Lazy<Regex> = Lazy::new(|| re(r"^@(?P<a>[\w:.-]+)\s*!=\s*'?(?P<v>[^']*)'?$"));
static EQUAL: Lazy<Regex> = Lazy::new(|| re(r"^@(?P<a>[\w:.-]+)\s*=\s*'?(?P<v>[^']*)'?$"));

static ATTR_COMPARISON: Lazy<Regex> = Lazy::new(|| re(r"^@(?P<l>[\w:.-]+)\s*(?P<op><=|>=|<|>)\s*@(?P<r>[\w:.-]+)$"));

static SINGLE_ATTR: Lazy<Regex> = Lazy::new(|| re(r"^@(?P<a>[\w:.-]+)$"));
static ATTR_REF: Lazy<Regex> = Lazy::new(|| re(r"^@[\w:.-]+$"));

static CROSS_PART_COUNT: Lazy<Regex> = Lazy::new(|| {
    re(r"^@(?P<a>[\w:.-]+)\s*<\s*count\(document\('Part:(?P<part>[^']+)'\)(?P<xpath>[^)]*)\)\s*\+\s*(?P<k>-?\d+)$")
})
;

/// Splits `s` on a top-level ` or `/` and ` boundary (not inside parens).
/// Returns `None` if the token never occurs at depth 0.
fn split_top_level<'a>(s: &'a str, token: &str) -> Option<Vec<&'a str>> {
    let bytes = s.as_bytes();
    let tok = token.as_bytes();
    let mut depth = 0i32;
    let mut parts = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => depth -= 1,
            _ => {}
        }
        if depth == 0 && i + tok.len() <= bytes.len() && &bytes[i..i + tok.len()] == tok {
            parts.push(s[start..i].trim());
            start = i + tok.len();
            i += tok.len();
            continue;
        }
        i += 1;
    }
    if parts.is_empty() {
        None
    } else {
        parts.push(s[start..].trim());
        Some(parts)
    }
}

fn parse_num(s: &str) -> Option<f64> {
    s.trim_end_matches('f').parse().ok()
}

/// Classifies a Schematron `test` string per the ordered rules in §4.4.
pub fn classify(test: &str) -> RuleKind {
    let test = test.trim();

    if let Some(c) = RANGE_GE_LE.captures(test) {
        if &c["a1"] == &c["a2"] {
            return RuleKind::AttributeValueRange {
                attribute: c["a1"].to_string(),
                min: parse_num(&c["min"]),
                max: parse_num(&c["max"]),
            };
        }
    }
    if let Some(c) = RANGE_LE_GE.captures(test) {
        if &c["a1"] == &c["a2"] {
            return RuleKind::AttributeValueRange {
                attribute: c["a1"].to_string(),
                min: parse_num(&c["min"]),
                max: parse_num(&c["max"]),
            };
        }
    }
    if let Some(c) = RANGE_LE_ONLY.captures(test) {
        return RuleKind::AttributeValueRange {
            attribute: c["a"].to_string(),
            min: None,
            max: parse_num(&c["max"]),
        };
    }
    if let Some(c) = RANGE_GE_ONLY.captures(test) {
        return RuleKind::AttributeValueRange {
            attribute: c["a"].to_string(),
            min: parse_num(&c["min"]),
            max: None,
        };
    }
    if let Some(c) = STRLEN_BOTH.captures(test) {
        if &c["a1"] == &c["a2"] {
            return RuleKind::AttributeValueLength {
                attribute: c["a1"].to_string(),
                min: c["min"].parse().ok(),
                max: c["max"].parse().ok(),
            };
        }
    }
    if let Some(c) = STRLEN_MIN_ONLY.captures(test) {
        return RuleKind::AttributeValueLength {
            attribute: c["a"].to_string(),
            min: c["min"].parse().ok(),
            max: None,
        };
    }
    if let Some(c) = STRLEN_MAX_ONLY.captures(test) {
        return RuleKind::AttributeValueLength {
            attribute: c["a"].to_string(),
            min: None,
            max: c["max"].parse().ok(),
        };
    }
    if let Some(c) = MATCHES.captures(test) {
        return RuleKind::AttributeValuePattern {
            attribute: c["a"].to_string(),
            pattern: c["pat"].to_string(),
        };
    }
    if let Some(c) = UNIQUE.captures(test) {
        return RuleKind::UniqueAttribute { attribute: c["a"].to_string() };
    }
    if let Some(c) = RELATIONSHIP_TYPE.captures(test) {
        return RuleKind::RelationshipType {
            attribute: c["a"].to_string(),
            expected_type: c["ty"].to_string(),
        };
    }
    if ELEMENT_REFERENCE.is_match(test) {
        return RuleKind::ElementReference;
    }
    if let Some(c) = CROSS_PART_COUNT.captures(test) {
        return RuleKind::CrossPartCount {
            attribute: c["a"].to_string(),
            part_path: c["part"].to_string(),
            xpath: c["xpath"].trim().to_string(),
            offset: c["k"].parse().unwrap_or(0),
        };
    }
    if let Some(c) = NOT_EQUAL.captures(test) {
        return RuleKind::AttributeNotEqual {
            attribute: c["a"].to_string(),
            value: c["v"].to_string(),
        };
    }
    if let Some(c) = EQUAL.captures(test) {
        return RuleKind::AttributeEquals {
            attribute: c["a"].to_string(),
            value: c["v"].to_string(),
        };
    }
    if let Some(c) = ATTR_COMPARISON.captures(test) {
        let op = match &c["op"] {
            "<" => ComparisonOp::Lt,
            "<=" => ComparisonOp::Le,
            ">" => ComparisonOp::Gt,
            _ => ComparisonOp::Ge,
        };
        return RuleKind::AttributeComparison {
            left: c["l"].to_string(),
            right: c["r"].to_string(),
            op,
        };
    }
    if let Some(branches) = split_top_level(test, " or ") {
        return RuleKind::OrCondition { branches: branches.into_iter().map(classify).collect() };
    }
    if let Some(conjuncts) = split_top_level(test, " and ") {
        if conjuncts.iter().all(|c| NOT_EQUAL.is_match(c)) {
            return RuleKind::AndCondition { conjuncts: conjuncts.into_iter().map(classify).collect() };
        }
        if conjuncts.iter().all(|c| ATTR_REF.is_match(c)) {
            return RuleKind::AttributesPresent {
                attributes: conjuncts.iter().map(|c| c.trim_start_matches('@').to_string()).collect(),
                all_required: true,
            };
        }
        if let Some(first) = conjuncts.first() {
            if ATTR_REF.is_match(first) {
                let rest = conjuncts[1..].join(" and ");
                return RuleKind::ConditionalValue {
                    condition_attribute: first.trim_start_matches('@').to_string(),
                    then: Box::new(classify(&rest)),
                };
            }
        }
    }
    if let Some(c) = SINGLE_ATTR.captures(test) {
        return RuleKind::AttributesPresent {
            attributes: vec![c["a"].to_string()],
            all_required: true,
        };
    }
    RuleKind::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_two_sided_range_regardless_of_order() {
        match classify("@val >= 0 and @val <= 100") {
            RuleKind::AttributeValueRange { attribute, min, max } => {
                assert_eq!(attribute, "val");
                assert_eq!(min, Some(0.0));
                assert_eq!(max, Some(100.0));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn classifies_single_sided_bounds() {
        assert!(matches!(classify("@w:val <= 31680"), RuleKind::AttributeValueRange { min: None, .. }));
        assert!(matches!(classify("@w:val >= 0"), RuleKind::AttributeValueRange { max: None, .. }));
    }

    #[test]
    fn classifies_string_length() {
        assert!(matches!(classify("string-length(@val) >= 1 and string-length(@val) <= 255"), RuleKind::AttributeValueLength { .. }));
    }

    #[test]
    fn classifies_pattern_match() {
        match classify("matches(@ns, '^[A-Za-z_][\\w.-]*$')") {
            RuleKind::AttributeValuePattern { attribute, pattern } => {
                assert_eq!(attribute, "ns");
                assert!(pattern.starts_with('^'));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn classifies_not_equal_and_equal() {
        assert!(matches!(classify("@val != '0'"), RuleKind::AttributeNotEqual { .. }));
        assert!(matches!(classify("@val = 'single'"), RuleKind::AttributeEquals { .. }));
    }

    #[test]
    fn classifies_top_level_or_before_and() {
        match classify("@a or @b and @c") {
            RuleKind::OrCondition { branches } => assert_eq!(branches.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn classifies_attributes_present_conjunction() {
        match classify("@a and @b and @c") {
            RuleKind::AttributesPresent { attributes, all_required } => {
                assert_eq!(attributes, vec!["a", "b", "c"]);
                assert!(all_required);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn classifies_single_attribute_presence() {
        assert!(matches!(classify("@r:id"), RuleKind::AttributesPresent { .. }));
    }

    #[test]
    fn classifies_cross_part_count() {
        match classify("@val < count(document('Part:PresentationPart')//p:sldId) + 1") {
            RuleKind::CrossPartCount { attribute, part_path, offset, .. } => {
                assert_eq!(attribute, "val");
                assert_eq!(part_path, "PresentationPart");
                assert_eq!(offset, 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unrecognized_test_becomes_unknown() {
        assert!(matches!(classify("not(ancestor::foo)"), RuleKind::Unknown));
    }
}
