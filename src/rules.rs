//! Rule sets: named media-query expressions.
//!
//! A [`RuleSet`] names the query expressions a watcher subscribes to. It is
//! immutable after construction and validated on the way in: keys are unique
//! and neither keys nor expressions may be blank. Expressions themselves are
//! opaque to this crate; whether they parse is the query service's business.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// An immutable, ordered mapping of rule keys to media-query expressions.
///
/// Keys are caller-chosen names (`"small"`, `"landscape"`); values are the
/// query expressions handed verbatim to the media-query service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, String>",
    into = "BTreeMap<String, String>"
)]
pub struct RuleSet {
    rules: BTreeMap<String, String>,
}

impl RuleSet {
    /// Builds a rule set from key/expression pairs.
    ///
    /// # Errors
    /// - [`ValidationError::EmptyRuleKey`] for a blank key
    /// - [`ValidationError::EmptyQueryExpression`] for a blank expression
    /// - [`ValidationError::DuplicateRuleKey`] when a key repeats
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut rules = BTreeMap::new();
        for (key, expression) in pairs {
            let key = key.into();
            let expression = expression.into();

            if key.trim().is_empty() {
                return Err(ValidationError::EmptyRuleKey);
            }
            if expression.trim().is_empty() {
                return Err(ValidationError::EmptyQueryExpression { key });
            }
            if rules.insert(key.clone(), expression).is_some() {
                return Err(ValidationError::DuplicateRuleKey { key });
            }
        }

        Ok(Self { rules })
    }

    /// Parses the grouped JSON definition format: an array of
    /// key-to-expression maps.
    ///
    /// ```json
    /// [
    ///   { "small": "(max-width:575px)", "medium": "(min-width:576px)" },
    ///   { "landscape": "all and (orientation: landscape)" }
    /// ]
    /// ```
    ///
    /// Grouping carries no semantics here; keys must be unique across all
    /// groups.
    ///
    /// # Errors
    /// [`ValidationError::InvalidRuleDefinition`] when the document does not
    /// parse, plus the pair-level errors of [`RuleSet::from_pairs`].
    pub fn from_json_groups(json: &str) -> Result<Self, ValidationError> {
        let groups: Vec<BTreeMap<String, String>> = serde_json::from_str(json)
            .map_err(|e| ValidationError::InvalidRuleDefinition {
                reason: e.to_string(),
            })?;

        Self::from_pairs(groups.into_iter().flatten())
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True when the set holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// True when `key` names a rule in this set.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.rules.contains_key(key)
    }

    /// The query expression registered for `key`, if any.
    #[must_use]
    pub fn expression(&self, key: &str) -> Option<&str> {
        self.rules.get(key).map(String::as_str)
    }

    /// Iterates rule keys in key order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.rules.keys().map(String::as_str)
    }

    /// Iterates (key, expression) pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.rules.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl TryFrom<BTreeMap<String, String>> for RuleSet {
    type Error = ValidationError;

    fn try_from(map: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        Self::from_pairs(map)
    }
}

impl From<RuleSet> for BTreeMap<String, String> {
    fn from(rules: RuleSet) -> Self {
        rules.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_pairs_preserves_expressions() {
        let rules = RuleSet::from_pairs([
            ("small", "(max-width:575px)"),
            ("large", "(min-width:576px)"),
        ])
        .unwrap();

        assert_eq!(rules.len(), 2);
        assert_eq!(rules.expression("small"), Some("(max-width:575px)"));
        assert_eq!(rules.expression("large"), Some("(min-width:576px)"));
        assert!(rules.contains_key("small"));
        assert!(!rules.contains_key("medium"));
    }

    #[test]
    fn from_pairs_rejects_blank_key() {
        let err = RuleSet::from_pairs([("  ", "(max-width:575px)")]).unwrap_err();
        assert_eq!(err, ValidationError::EmptyRuleKey);
    }

    #[test]
    fn from_pairs_rejects_blank_expression() {
        let err = RuleSet::from_pairs([("small", "")]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::EmptyQueryExpression {
                key: "small".to_string()
            }
        );
    }

    #[test]
    fn from_pairs_rejects_duplicate_key() {
        let err = RuleSet::from_pairs([
            ("small", "(max-width:575px)"),
            ("small", "(max-width:640px)"),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::DuplicateRuleKey {
                key: "small".to_string()
            }
        );
    }

    #[test]
    fn json_groups_flatten_into_one_set() {
        let rules = RuleSet::from_json_groups(
            r#"[
                { "small": "(max-width:575px)", "medium": "(min-width:576px) and (max-width:767px)" },
                { "landscape": "all and (orientation: landscape)" }
            ]"#,
        )
        .unwrap();

        assert_eq!(rules.len(), 3);
        assert_eq!(
            rules.expression("landscape"),
            Some("all and (orientation: landscape)")
        );
    }

    #[test]
    fn json_groups_reject_cross_group_duplicates() {
        let err = RuleSet::from_json_groups(
            r#"[
                { "small": "(max-width:575px)" },
                { "small": "(max-width:640px)" }
            ]"#,
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateRuleKey { .. }));
    }

    #[test]
    fn json_groups_reject_malformed_document() {
        let err = RuleSet::from_json_groups("{ not json").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidRuleDefinition { .. }));
    }

    #[test]
    fn serde_round_trip_validates_on_deserialize() {
        let rules = RuleSet::from_pairs([("small", "(max-width:575px)")]).unwrap();
        let json = serde_json::to_string(&rules).unwrap();
        let back: RuleSet = serde_json::from_str(&json).unwrap();
        assert_eq!(rules, back);

        let err = serde_json::from_str::<RuleSet>(r#"{ "small": "" }"#).unwrap_err();
        assert!(err.to_string().contains("empty query expression")
            || err.to_string().contains("empty"));
    }

    #[test]
    fn iteration_is_key_ordered() {
        let rules = RuleSet::from_pairs([
            ("c", "(min-width:3px)"),
            ("a", "(min-width:1px)"),
            ("b", "(min-width:2px)"),
        ])
        .unwrap();
        let keys: Vec<&str> = rules.keys().collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }
}
