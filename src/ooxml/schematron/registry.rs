//! Loads Schematron rule records (§6 "Schematron JSON") and classifies each
//! one into a [`SchematronRule`], indexed by context element for lookup
//! during semantic validation.

use std::collections::HashMap;

use serde::Deserialize;

use crate::ooxml::error::{OoxmlError, Result};
use super::classify::classify;
use super::rule::{Application, SchematronRule};

#[derive(Debug, Deserialize)]
struct SchematronRuleJson {
    #[serde(rename = "Context")]
    context: String,
    #[serde(rename = "Test")]
    test: String,
    #[serde(rename = "App", default)]
    app: Option<String>,
}

/// Every Schematron rule the validator knows about, indexed by context
/// element local-name for O(1) lookup while walking a part.
#[derive(Debug, Default)]
pub struct SchematronRegistry {
    by_context: HashMap<String, Vec<SchematronRule>>,
}

impl SchematronRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON array of `{Context, Test, App}` records and indexes
    /// each by its context's local name (the part before the last `/`, or
    /// the whole string if unqualified).
    pub fn load_json(&mut self, json: &str) -> Result<()> {
        let records: Vec<SchematronRuleJson> = serde_json::from_str(json).map_err(|e| OoxmlError::Xml(e.to_string()))?;
        for record in records {
            let kind = classify(&record.test);
            let app = record.app.as_deref().map(Application::from_str).unwrap_or(Application::All);
            let key = context_key(&record.context);
            let rule = SchematronRule {
                context: record.context,
                test: record.test,
                app,
                kind,
            };
            self.by_context.entry(key).or_default().push(rule);
        }
        Ok(())
    }

    /// Rules whose context matches the given element local-name.
    pub fn rules_for(&self, local_name: &str) -> &[SchematronRule] {
        self.by_context.get(local_name).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.by_context.is_empty()
    }
}

fn context_key(context: &str) -> String {
    let last_step = context.rsplit('/').next().unwrap_or(context);
    last_step.rsplit(':').next().unwrap_or(last_step).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_and_classifies_a_minimal_rule_set() {
        let json = r#"[
            {"Context": "w:body", "Test": "@w:val >= 0 and @w:val <= 100"},
            {"Context": "p:sldId", "Test": "@id != '0'", "App": "PowerPoint"}
        ]"#;
        let mut registry = SchematronRegistry::new();
        registry.load_json(json).unwrap();
        assert_eq!(registry.rules_for("body").len(), 1);
        assert_eq!(registry.rules_for("sldId").len(), 1);
        assert!(registry.rules_for("nonexistent").is_empty());
    }
}
