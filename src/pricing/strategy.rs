// Pricing Strategy
//
// An ordered, configurable binding of pricing blocks identified by a
// strategy code. Bindings can override a block's priority, disable it,
// or re-parameterize it without mutating the shared block definition.

use crate::pricing::{
    block::{ConditionNode, ParamValue, PriceEvent, PricingBlock},
    facts::FactValue,
    types::ComparisonOperator,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::{uuid, Uuid};

/// Strategy code used when the caller does not name one
pub const DEFAULT_STRATEGY_CODE: &str = "default-pricing";

/// Stable identities for the built-in blocks
const BASE_COST_BLOCK_ID: Uuid = uuid!("7b1c9a02-4f4e-4a7e-9d1a-0d6a53a1c001");
const FIXED_PRICE_BLOCK_ID: Uuid = uuid!("7b1c9a02-4f4e-4a7e-9d1a-0d6a53a1c002");
const MARKUP_BLOCK_ID: Uuid = uuid!("7b1c9a02-4f4e-4a7e-9d1a-0d6a53a1c003");
const UNUSED_DAYS_BLOCK_ID: Uuid = uuid!("7b1c9a02-4f4e-4a7e-9d1a-0d6a53a1c004");
const ROUNDING_BLOCK_ID: Uuid = uuid!("7b1c9a02-4f4e-4a7e-9d1a-0d6a53a1c005");

fn default_true() -> bool {
    true
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Strategy Block Binding
///
/// Binds a block into a strategy with optional overrides. Effective
/// priority = binding priority if present, else the block's own.
/// `config_overrides` shadow facts only while this binding evaluates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockBinding {
    pub block: PricingBlock,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,

    #[serde(default = "default_true")]
    pub is_enabled: bool,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config_overrides: BTreeMap<String, FactValue>,
}

impl BlockBinding {
    /// Bind a block with no overrides
    pub fn new(block: PricingBlock) -> Self {
        Self {
            block,
            priority: None,
            is_enabled: true,
            config_overrides: BTreeMap::new(),
        }
    }

    /// Override the block's priority for this strategy
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Disable the binding without removing it from the strategy
    pub fn disabled(mut self) -> Self {
        self.is_enabled = false;
        self
    }

    /// Shadow a fact while this binding evaluates
    pub fn with_override(mut self, fact: &str, value: FactValue) -> Self {
        self.config_overrides.insert(fact.to_string(), value);
        self
    }

    /// Priority used for ordering: binding override, else block priority
    pub fn effective_priority(&self) -> u32 {
        self.priority.unwrap_or(self.block.priority)
    }
}

/// Pricing Strategy
///
/// Loaded once per pricing request by code, read-only during
/// evaluation. Binding order is significant: it breaks priority ties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingStrategy {
    pub code: String,

    #[serde(default = "default_currency")]
    pub currency: String,

    pub bindings: Vec<BlockBinding>,
}

impl PricingStrategy {
    /// Create an empty strategy with the given code
    pub fn new(code: &str) -> Self {
        Self {
            code: code.to_string(),
            currency: default_currency(),
            bindings: Vec::new(),
        }
    }

    /// Append a binding, preserving declaration order
    pub fn with_binding(mut self, binding: BlockBinding) -> Self {
        self.bindings.push(binding);
        self
    }

    /// Enabled bindings in declaration order
    pub fn enabled_bindings(&self) -> Vec<&BlockBinding> {
        self.bindings.iter().filter(|b| b.is_enabled).collect()
    }
}

/// Initializes the base price from the selected bundle's source cost,
/// but only when a bundle was selected and its cost is positive
pub fn base_cost_block() -> PricingBlock {
    PricingBlock {
        id: BASE_COST_BLOCK_ID,
        name: "base-cost-initialization".to_string(),
        priority: 100,
        conditions: ConditionNode::All {
            conditions: vec![
                ConditionNode::compare(
                    "selectedBundle",
                    ComparisonOperator::IsPresent,
                    FactValue::Absent,
                ),
                ConditionNode::compare_path(
                    "selectedBundle",
                    "cost",
                    ComparisonOperator::GreaterThan,
                    FactValue::Int(0),
                ),
            ],
        },
        event: PriceEvent::SetPrice {
            value: ParamValue::fact_path("selectedBundle", "cost"),
        },
    }
}

/// Replaces the price outright for one destination, regardless of what
/// earlier same-tier blocks computed
pub fn destination_fixed_price_block(country: &str, price: Decimal) -> PricingBlock {
    PricingBlock {
        id: FIXED_PRICE_BLOCK_ID,
        name: format!("destination-fixed-price-{}", country.to_lowercase()),
        priority: 100,
        conditions: ConditionNode::compare(
            "country",
            ComparisonOperator::Equal,
            FactValue::from(country),
        ),
        event: PriceEvent::SetPrice {
            value: ParamValue::literal(price),
        },
    }
}

/// Unconditional retail markup; the rate comes from the `markupRate`
/// fact so bindings can re-parameterize it per strategy
pub fn duration_markup_block() -> PricingBlock {
    PricingBlock {
        id: MARKUP_BLOCK_ID,
        name: "duration-markup".to_string(),
        priority: 90,
        conditions: ConditionNode::always(),
        event: PriceEvent::Multiply {
            factor: ParamValue::fact("markupRate"),
        },
    }
}

/// Compensates travelers whose requested duration fell between bundle
/// durations: subtracts `unusedDays * discountPerDay` when the match
/// was inexact. `discountPerDay` is supplied upstream as a fact.
pub fn unused_days_discount_block() -> PricingBlock {
    PricingBlock {
        id: UNUSED_DAYS_BLOCK_ID,
        name: "unused-days-discount".to_string(),
        priority: 85,
        conditions: ConditionNode::All {
            conditions: vec![
                ConditionNode::compare(
                    "isExactMatch",
                    ComparisonOperator::Equal,
                    FactValue::Bool(false),
                ),
                ConditionNode::compare(
                    "unusedDays",
                    ComparisonOperator::GreaterThan,
                    FactValue::Int(0),
                ),
            ],
        },
        event: PriceEvent::SubtractPerUnit {
            rate: ParamValue::fact("discountPerDay"),
            units: ParamValue::fact("unusedDays"),
        },
    }
}

/// Unconditionally snaps the price to a `.99` ending
pub fn price_ending_rounding_block() -> PricingBlock {
    PricingBlock {
        id: ROUNDING_BLOCK_ID,
        name: "price-ending-rounding".to_string(),
        priority: 100,
        conditions: ConditionNode::always(),
        event: PriceEvent::RoundToSuffix {
            suffix: ParamValue::literal(Decimal::new(99, 2)),
        },
    }
}

/// The built-in `default-pricing` strategy
///
/// Binding order within the 100 tier matters: the fixed-price override
/// must observe (and replace) the base cost. The rounding block carries
/// its own priority of 100 but is bound here with an override of 10 so
/// it runs after every markup and discount step.
pub fn default_strategy() -> PricingStrategy {
    PricingStrategy::new(DEFAULT_STRATEGY_CODE)
        .with_binding(BlockBinding::new(base_cost_block()))
        .with_binding(BlockBinding::new(destination_fixed_price_block(
            "UA",
            Decimal::from(88),
        )))
        .with_binding(
            BlockBinding::new(duration_markup_block())
                .with_override("markupRate", FactValue::Decimal(Decimal::new(12, 1))),
        )
        .with_binding(BlockBinding::new(unused_days_discount_block()))
        .with_binding(BlockBinding::new(price_ending_rounding_block()).with_priority(10))
}

/// All built-in strategies, keyed by code
pub fn builtin_strategies() -> Vec<PricingStrategy> {
    vec![default_strategy()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_priority_prefers_binding_override() {
        let binding = BlockBinding::new(price_ending_rounding_block());
        assert_eq!(binding.effective_priority(), 100);

        let binding = binding.with_priority(10);
        assert_eq!(binding.effective_priority(), 10);
    }

    #[test]
    fn test_disabled_binding_is_filtered() {
        let strategy = PricingStrategy::new("test")
            .with_binding(BlockBinding::new(base_cost_block()))
            .with_binding(BlockBinding::new(duration_markup_block()).disabled());

        let enabled = strategy.enabled_bindings();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].block.name, "base-cost-initialization");
    }

    #[test]
    fn test_default_strategy_shape() {
        let strategy = default_strategy();
        assert_eq!(strategy.code, DEFAULT_STRATEGY_CODE);
        assert_eq!(strategy.currency, "USD");
        assert_eq!(strategy.bindings.len(), 5);

        // The rounding binding must sort below the discount tier
        let rounding = strategy
            .bindings
            .iter()
            .find(|b| b.block.name == "price-ending-rounding")
            .expect("rounding binding present");
        assert_eq!(rounding.block.priority, 100);
        assert_eq!(rounding.effective_priority(), 10);
    }

    #[test]
    fn test_block_identity_is_stable() {
        // Two materializations of the same block definition share an id
        assert_eq!(base_cost_block().id, base_cost_block().id);
        assert_eq!(
            unused_days_discount_block().id,
            unused_days_discount_block().id
        );
        assert_ne!(base_cost_block().id, unused_days_discount_block().id);
    }

    #[test]
    fn test_strategy_round_trips_through_json() {
        let strategy = default_strategy();
        let json = serde_json::to_string(&strategy).unwrap();
        let parsed: PricingStrategy = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.code, strategy.code);
        assert_eq!(parsed.bindings.len(), strategy.bindings.len());
        for (a, b) in parsed.bindings.iter().zip(strategy.bindings.iter()) {
            assert_eq!(a.block.id, b.block.id);
            assert_eq!(a.effective_priority(), b.effective_priority());
            assert_eq!(a.is_enabled, b.is_enabled);
        }
    }

    #[test]
    fn test_binding_deserialization_defaults() {
        let json = r#"
        {
            "block": {
                "id": "7b1c9a02-4f4e-4a7e-9d1a-0d6a53a1c003",
                "name": "duration-markup",
                "priority": 90,
                "conditions": {"type": "all", "conditions": []},
                "event": {"type": "multiply", "factor": {"fact": "markupRate"}}
            }
        }
        "#;
        let binding: BlockBinding = serde_json::from_str(json).unwrap();
        assert!(binding.is_enabled);
        assert!(binding.priority.is_none());
        assert!(binding.config_overrides.is_empty());
        assert_eq!(binding.effective_priority(), 90);
    }
}
