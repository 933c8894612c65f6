//! # Rule System
//!
//! Rules drive the Cascades search:
//!
//! - **Transformation rules** rewrite a logical expression into an equivalent
//!   logical expression in the same group (join commutativity, for example).
//! - **Implementation rules** map a logical expression to physical alternatives
//!   that the cost model scores (a join to hash or nested-loop joins, a star scan
//!   to the infinitely priced placeholder).
//!
//! Every rule has a fingerprint (`rule_hash`); the memo remembers which rules were
//! applied to which expression so no rule fires twice on the same input.
//!
//! The [`RuleRegistry`] holds the base rules plus optional per-source rule sets,
//! such as rules a materialized-view substitution component contributes.

use crate::catalog::Catalog;
use crate::expr::Operator;
use crate::memo::{GroupId, Memo, MemoExpr};
use crate::pattern::Pattern;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleType {
    /// Logical to logical.
    Transformation,
    /// Logical to physical.
    Implementation,
}

/// Context passed to rules during application.
pub struct OptContext<'a> {
    pub catalog: &'a dyn Catalog,
}

/// A rule transforms or implements expressions.
pub trait Rule: Send + Sync {
    fn name(&self) -> &str;

    fn rule_type(&self) -> RuleType;

    fn pattern(&self) -> Pattern;

    /// Produce new `(operator, children)` alternatives for a matching expression.
    fn apply(&self, expr: &MemoExpr, memo: &Memo, ctx: &OptContext) -> Vec<(Operator, Vec<GroupId>)>;

    fn rule_hash(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.name().hash(&mut hasher);
        hasher.finish()
    }
}

/// A named set of rules, activated per source.
pub struct RuleSet {
    pub name: String,
    pub rules: Vec<Box<dyn Rule>>,
}

pub struct RuleRegistry {
    pub base_rules: Vec<Box<dyn Rule>>,
    pub source_rules: HashMap<String, RuleSet>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self {
            base_rules: Vec::new(),
            source_rules: HashMap::new(),
        }
    }

    pub fn add_rule(&mut self, rule: Box<dyn Rule>) {
        self.base_rules.push(rule);
    }

    pub fn add_source_rule_set(&mut self, name: impl Into<String>, rule_set: RuleSet) {
        self.source_rules.insert(name.into(), rule_set);
    }

    /// Base rules plus the rule set registered for `source`, if any.
    pub fn active_rules(&self, source: Option<&str>) -> Vec<&dyn Rule> {
        let mut rules: Vec<&dyn Rule> = self.base_rules.iter().map(|r| r.as_ref()).collect();
        if let Some(rs) = source.and_then(|s| self.source_rules.get(s)) {
            rules.extend(rs.rules.iter().map(|r| r.as_ref()));
        }
        rules
    }

    pub fn rules_of_type(&self, rule_type: RuleType, source: Option<&str>) -> Vec<&dyn Rule> {
        self.active_rules(source)
            .into_iter()
            .filter(|r| r.rule_type() == rule_type)
            .collect()
    }

    pub fn transformation_rules(&self, source: Option<&str>) -> Vec<&dyn Rule> {
        self.rules_of_type(RuleType::Transformation, source)
    }

    pub fn implementation_rules(&self, source: Option<&str>) -> Vec<&dyn Rule> {
        self.rules_of_type(RuleType::Implementation, source)
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
