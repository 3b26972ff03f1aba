//! Per-listener match state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::rules::RuleSet;

/// Current match result for every rule in a [`RuleSet`].
///
/// Each listener registration owns exactly one `MatchState`; the dispatch
/// worker mutates it in place as change events arrive and hands callbacks a
/// snapshot (clone) per invocation. Its key set always equals the rule set's
/// key set: [`MatchState::set`] refuses unknown keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    matches: BTreeMap<String, bool>,
}

impl MatchState {
    /// State with every rule of `rules` present and unmatched.
    pub(crate) fn unmatched(rules: &RuleSet) -> Self {
        Self {
            matches: rules.keys().map(|key| (key.to_string(), false)).collect(),
        }
    }

    /// Records the match result for `key`.
    ///
    /// Returns false (and changes nothing) when `key` is not part of the
    /// rule set this state was built from.
    pub(crate) fn set(&mut self, key: &str, matched: bool) -> bool {
        match self.matches.get_mut(key) {
            Some(slot) => {
                *slot = matched;
                true
            }
            None => false,
        }
    }

    /// The recorded result for `key`, if `key` is part of the rule set.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<bool> {
        self.matches.get(key).copied()
    }

    /// True when `key` currently matches. Unknown keys never match.
    #[must_use]
    pub fn is_match(&self, key: &str) -> bool {
        self.get(key).unwrap_or(false)
    }

    /// Number of rules tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// True when no rules are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Iterates (key, matched) pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> + '_ {
        self.matches.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Iterates the keys that currently match, in key order.
    pub fn matched_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.matches
            .iter()
            .filter(|(_, matched)| **matched)
            .map(|(key, _)| key.as_str())
    }
}
