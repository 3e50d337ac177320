// Pricing Block
//
// A named, independently-evaluable rule: a boolean condition tree over
// facts plus an event template describing the price transformation to
// apply when the conditions hold.

use crate::pricing::{
    facts::{FactValue, FactView},
    types::ComparisonOperator,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Boolean condition tree over facts
///
/// A closed AST: leaf comparisons combined with `all` (AND) and `any`
/// (OR) groups. Group evaluation short-circuits; an empty `all` group is
/// vacuously true, which is the intended way to express unconditional
/// blocks such as a global rounding step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConditionNode {
    /// AND group: every child must hold; empty groups hold vacuously
    All { conditions: Vec<ConditionNode> },

    /// OR group: at least one child must hold; empty groups never hold
    Any { conditions: Vec<ConditionNode> },

    /// Leaf comparison of one fact against a reference value
    Compare {
        fact: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
        op: ComparisonOperator,
        #[serde(default)]
        value: FactValue,
    },
}

impl ConditionNode {
    /// Convenience constructor for an unconditional (always firing) tree
    pub fn always() -> Self {
        ConditionNode::All { conditions: Vec::new() }
    }

    /// Convenience constructor for a leaf comparison without a path
    pub fn compare(fact: &str, op: ComparisonOperator, value: FactValue) -> Self {
        ConditionNode::Compare {
            fact: fact.to_string(),
            path: None,
            op,
            value,
        }
    }

    /// Convenience constructor for a path-qualified leaf comparison
    pub fn compare_path(fact: &str, path: &str, op: ComparisonOperator, value: FactValue) -> Self {
        ConditionNode::Compare {
            fact: fact.to_string(),
            path: Some(path.to_string()),
            op,
            value,
        }
    }

    /// Evaluate the tree against a fact view
    ///
    /// Short-circuits: AND chains stop at the first false child, OR
    /// chains at the first true child. Comparisons over absent facts are
    /// false unless the operator is an explicit absence check. An
    /// ordering comparison over non-numeric operands is an evaluation
    /// error (reported, never swallowed).
    pub fn evaluate(&self, facts: &FactView<'_>) -> Result<bool, String> {
        match self {
            ConditionNode::All { conditions } => {
                for condition in conditions {
                    if !condition.evaluate(facts)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            ConditionNode::Any { conditions } => {
                for condition in conditions {
                    if condition.evaluate(facts)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            ConditionNode::Compare { fact, path, op, value } => {
                let actual = facts.resolve(fact, path.as_deref());
                evaluate_comparison(fact, &actual, *op, value)
            }
        }
    }
}

/// Evaluate one leaf comparison
fn evaluate_comparison(
    fact: &str,
    actual: &FactValue,
    op: ComparisonOperator,
    reference: &FactValue,
) -> Result<bool, String> {
    // Presence checks inspect the fact itself and ignore the reference
    match op {
        ComparisonOperator::IsPresent => return Ok(!actual.is_absent()),
        ComparisonOperator::IsAbsent => return Ok(actual.is_absent()),
        _ => {}
    }

    // Absent facts never satisfy a value comparison
    if actual.is_absent() {
        return Ok(false);
    }

    match op {
        ComparisonOperator::Equal => Ok(actual.loosely_equals(reference)),
        ComparisonOperator::NotEqual => Ok(!actual.loosely_equals(reference)),
        ComparisonOperator::GreaterThan
        | ComparisonOperator::GreaterThanOrEqual
        | ComparisonOperator::LessThan
        | ComparisonOperator::LessThanOrEqual => {
            let left = actual.as_decimal().ok_or_else(|| {
                format!("fact '{}' is not numeric, cannot apply {}", fact, op)
            })?;
            let right = reference.as_decimal().ok_or_else(|| {
                format!("reference value for fact '{}' is not numeric", fact)
            })?;

            Ok(match op {
                ComparisonOperator::GreaterThan => left > right,
                ComparisonOperator::GreaterThanOrEqual => left >= right,
                ComparisonOperator::LessThan => left < right,
                ComparisonOperator::LessThanOrEqual => left <= right,
                _ => unreachable!(),
            })
        }
        ComparisonOperator::IsPresent | ComparisonOperator::IsAbsent => unreachable!(),
    }
}

/// Event parameter: a literal value or a reference to a fact
///
/// Fact references are resolved against the current fact base at
/// emission time, so a parameter can pick up facts published by
/// earlier-priority blocks in the same run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Reference to a fact, with optional dotted path into its value
    FactRef {
        fact: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    },

    /// Inline literal value
    Literal(FactValue),
}

impl ParamValue {
    /// Convenience constructor for a literal decimal parameter
    pub fn literal(value: Decimal) -> Self {
        ParamValue::Literal(FactValue::Decimal(value))
    }

    /// Convenience constructor for a fact reference
    pub fn fact(fact: &str) -> Self {
        ParamValue::FactRef {
            fact: fact.to_string(),
            path: None,
        }
    }

    /// Convenience constructor for a path-qualified fact reference
    pub fn fact_path(fact: &str, path: &str) -> Self {
        ParamValue::FactRef {
            fact: fact.to_string(),
            path: Some(path.to_string()),
        }
    }

    /// Resolve to a plain fact value
    pub fn resolve(&self, facts: &FactView<'_>) -> FactValue {
        match self {
            ParamValue::Literal(value) => value.clone(),
            ParamValue::FactRef { fact, path } => facts.resolve(fact, path.as_deref()),
        }
    }

    /// Resolve to a decimal, erroring on absent or non-numeric values
    pub fn resolve_decimal(&self, facts: &FactView<'_>) -> Result<Decimal, String> {
        let value = self.resolve(facts);
        value.as_decimal().ok_or_else(|| match self {
            ParamValue::Literal(_) => "literal parameter is not numeric".to_string(),
            ParamValue::FactRef { fact, path } => match path {
                Some(path) => format!("fact '{}.{}' is absent or not numeric", fact, path),
                None => format!("fact '{}' is absent or not numeric", fact),
            },
        })
    }
}

/// Price transformation emitted by a satisfied block
///
/// Closed set of event variants, each with an explicit parameter schema,
/// interpreted by a single dispatch function in the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PriceEvent {
    /// Replace the running price with an absolute value
    SetPrice { value: ParamValue },

    /// Add a signed delta to the running price
    AddDelta { value: ParamValue },

    /// Subtract `rate * units` from the running price
    SubtractPerUnit { rate: ParamValue, units: ParamValue },

    /// Multiply the running price by a factor
    Multiply { factor: ParamValue },

    /// Clamp the running price to optional bounds
    Clamp {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<ParamValue>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<ParamValue>,
    },

    /// Snap the running price to a `.99`-style ending: the smallest
    /// whole amount plus suffix that is not below the current price
    RoundToSuffix { suffix: ParamValue },

    /// Publish a derived fact for later-priority blocks; price unchanged
    PublishFact { name: String, value: ParamValue },
}

impl PriceEvent {
    /// Short machine-readable label used in audit step metadata
    pub fn kind(&self) -> &'static str {
        match self {
            PriceEvent::SetPrice { .. } => "set_price",
            PriceEvent::AddDelta { .. } => "add_delta",
            PriceEvent::SubtractPerUnit { .. } => "subtract_per_unit",
            PriceEvent::Multiply { .. } => "multiply",
            PriceEvent::Clamp { .. } => "clamp",
            PriceEvent::RoundToSuffix { .. } => "round_to_suffix",
            PriceEvent::PublishFact { .. } => "publish_fact",
        }
    }
}

/// Pricing Block
///
/// Block identity (`id`) is stable across strategy versions; `priority`
/// orders evaluation (higher first) unless a strategy binding overrides
/// it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingBlock {
    pub id: Uuid,
    pub name: String,
    pub priority: u32,
    pub conditions: ConditionNode,
    pub event: PriceEvent,
}
