// Fact Base
//
// Immutable per-request snapshot of pricing inputs, read by condition
// evaluation and event-parameter resolution. Blocks may publish derived
// facts mid-run; caller-supplied facts are never mutated.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A typed fact value
///
/// Closed set of value shapes a fact can take. `Absent` is the sentinel
/// returned for missing facts or failed path traversals; it never raises
/// an error on its own. Untagged serde keeps strategy files readable:
/// JSON null, booleans, integers, decimals, strings, and objects map
/// directly onto the variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    /// Missing fact or missing path segment
    Absent,

    /// Boolean flag (e.g. `isExactMatch`)
    Bool(bool),

    /// Whole-number value (e.g. `unusedDays`)
    Int(i64),

    /// Fixed-precision monetary or rate value; also parsed from numeric
    /// strings, which is how decimals serialize
    Decimal(Decimal),

    /// Textual value (e.g. `country`)
    Text(String),

    /// Structured value with named fields (e.g. `selectedBundle`)
    Map(BTreeMap<String, FactValue>),
}

impl Default for FactValue {
    fn default() -> Self {
        FactValue::Absent
    }
}

impl FactValue {
    /// Whether this value is the absent sentinel
    pub fn is_absent(&self) -> bool {
        matches!(self, FactValue::Absent)
    }

    /// Numeric view of the value, coercing integers to decimals
    ///
    /// Returns `None` for non-numeric variants so callers can decide
    /// whether that is a mismatch or simply a failed match.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            FactValue::Int(n) => Some(Decimal::from(*n)),
            FactValue::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Traverse a dotted path into a structured value
    ///
    /// Any missing segment or traversal into a non-map resolves to
    /// `Absent`, never an error.
    pub fn resolve_path(&self, path: &str) -> FactValue {
        let mut current = self;
        for segment in path.split('.') {
            match current {
                FactValue::Map(fields) => match fields.get(segment) {
                    Some(value) => current = value,
                    None => return FactValue::Absent,
                },
                _ => return FactValue::Absent,
            }
        }
        current.clone()
    }

    /// Value equality with numeric coercion
    ///
    /// `Int(3)` equals `Decimal(3)`; all other variants compare exactly.
    pub fn loosely_equals(&self, other: &FactValue) -> bool {
        match (self.as_decimal(), other.as_decimal()) {
            (Some(a), Some(b)) => a == b,
            _ => self == other,
        }
    }
}

impl From<bool> for FactValue {
    fn from(value: bool) -> Self {
        FactValue::Bool(value)
    }
}

impl From<i64> for FactValue {
    fn from(value: i64) -> Self {
        FactValue::Int(value)
    }
}

impl From<Decimal> for FactValue {
    fn from(value: Decimal) -> Self {
        FactValue::Decimal(value)
    }
}

impl From<&str> for FactValue {
    fn from(value: &str) -> Self {
        FactValue::Text(value.to_string())
    }
}

/// Fact Base
///
/// Named facts for one pricing run. Constructed once from the caller's
/// request; the engine may publish additional derived facts between
/// block evaluations.
#[derive(Debug, Clone, Default)]
pub struct FactBase {
    facts: HashMap<String, FactValue>,
}

impl FactBase {
    /// Create an empty FactBase
    pub fn new() -> Self {
        Self {
            facts: HashMap::new(),
        }
    }

    /// Insert or replace a fact
    pub fn insert(&mut self, name: impl Into<String>, value: FactValue) {
        self.facts.insert(name.into(), value);
    }

    /// Publish a derived fact produced by a block mid-run
    pub fn publish(&mut self, name: impl Into<String>, value: FactValue) {
        let name = name.into();
        tracing::debug!(fact = %name, "publishing derived fact");
        self.facts.insert(name, value);
    }

    /// Look up a fact, resolving missing names to `Absent`
    pub fn get(&self, name: &str) -> FactValue {
        self.facts.get(name).cloned().unwrap_or(FactValue::Absent)
    }

    /// Number of facts currently held
    pub fn len(&self) -> usize {
        self.facts.len()
    }

    /// Whether the fact base holds no facts
    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }
}

/// Read view over a fact base with a per-binding override layer
///
/// Strategy bindings can re-parameterize a shared block through config
/// overrides; those overrides shadow base facts only while that binding
/// evaluates.
#[derive(Debug, Clone, Copy)]
pub struct FactView<'a> {
    base: &'a FactBase,
    overlay: &'a BTreeMap<String, FactValue>,
}

impl<'a> FactView<'a> {
    /// Create a view with an override layer
    pub fn new(base: &'a FactBase, overlay: &'a BTreeMap<String, FactValue>) -> Self {
        Self { base, overlay }
    }

    /// Resolve a fact by name and optional dotted path
    ///
    /// Overrides win over base facts; missing names and failed path
    /// traversals resolve to `Absent`.
    pub fn resolve(&self, fact: &str, path: Option<&str>) -> FactValue {
        let value = match self.overlay.get(fact) {
            Some(value) => value.clone(),
            None => self.base.get(fact),
        };

        match path {
            Some(path) if !path.is_empty() => value.resolve_path(path),
            _ => value,
        }
    }
}
