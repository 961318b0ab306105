//! Ordered rule registry with first-match selection.

use std::path::Path;
use std::sync::Arc;

use crate::rule::{NameMatch, Rule};

/// Append-only, ordered collection of rules.
///
/// Registration order is priority order: a project-specific rule registered
/// before a generic one wins for files both could match. Rules are
/// deduplicated by name.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    /// Registered rules in priority order.
    rules: Vec<Arc<dyn Rule>>,
}

impl RuleRegistry {
    /// Append a rule unless one with the same name is registered.
    /// Returns whether the rule was added.
    pub fn add(&mut self, rule: Arc<dyn Rule>) -> bool {
        if self.contains(rule.name()) {
            return false;
        }
        self.rules.push(rule);
        return true;
    }

    /// Whether a rule with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        return self.rules.iter().any(|r| return r.name() == name);
    }

    /// Whether no rules are registered.
    pub const fn is_empty(&self) -> bool {
        return self.rules.is_empty();
    }

    /// Rules in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Rule>> {
        return self.rules.iter();
    }

    /// Number of registered rules.
    pub const fn len(&self) -> usize {
        return self.rules.len();
    }

    /// Append every rule of `other` not already present, keeping order.
    pub fn merge(&mut self, other: &Self) {
        for rule in &other.rules {
            self.add(Arc::clone(rule));
        }
    }

    /// Names of registered rules in priority order.
    pub fn names(&self) -> Vec<&str> {
        return self.rules.iter().map(|r| return r.name()).collect();
    }

    /// First rule, in registration order, whose name predicates match `path`.
    pub fn select(&self, path: &Path) -> Option<(Arc<dyn Rule>, NameMatch)> {
        return self
            .rules
            .iter()
            .find_map(|rule| return rule.matches(path).map(|m| return (Arc::clone(rule), m)));
    }
}
