// Rule Engine
//
// Evaluates all enabled blocks of a strategy against a fact base in
// priority order and applies each satisfied block's event to a running
// pricing context. This is cascading application, not first-match
// dispatch: every satisfied block fires, and later blocks observe the
// price state left by earlier ones.

use crate::pricing::{
    block::{PriceEvent, PricingBlock},
    context::{PriceQuote, PricingContext},
    error::{PricingError, PricingResult},
    facts::{FactBase, FactValue, FactView},
    strategy::{BlockBinding, PricingStrategy},
};
use rust_decimal::Decimal;
use serde_json::{json, Value as JsonValue};

/// Upper bound for a computed price; anything above is a calculation
/// failure rather than a plausible traveler-facing amount
const MAX_SUPPORTED_PRICE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Outcome of applying one event to the running price
struct EventApplication {
    new_price: Decimal,
    metadata: JsonValue,
    published: Option<(String, FactValue)>,
}

/// Rule Engine
///
/// Pure and synchronous: one call evaluates one strategy against one
/// fact base with no I/O, no shared state, and no retries.
pub struct RuleEngine;

impl RuleEngine {
    /// Run one pricing evaluation
    ///
    /// Bindings are sorted descending by effective priority with a
    /// stable sort, so priority ties keep the strategy's declared
    /// binding order. The seed (e.g. a previously fetched provider
    /// cost) becomes the starting price; it defaults to zero.
    pub fn evaluate(
        strategy: &PricingStrategy,
        mut facts: FactBase,
        seed: Option<Decimal>,
    ) -> PricingResult<PriceQuote> {
        let seed = seed.unwrap_or(Decimal::ZERO);
        if seed < Decimal::ZERO {
            return Err(PricingError::InvalidInput(format!(
                "seed price must be non-negative, got {}",
                seed
            )));
        }

        let mut bindings: Vec<&BlockBinding> = strategy.enabled_bindings();
        if bindings.is_empty() {
            return Err(PricingError::NoRulesConfigured {
                strategy: strategy.code.clone(),
            });
        }
        bindings.sort_by(|a, b| b.effective_priority().cmp(&a.effective_priority()));

        let mut ctx = PricingContext::new(seed, &strategy.currency);

        for binding in bindings {
            let block = &binding.block;

            let application = {
                let view = FactView::new(&facts, &binding.config_overrides);

                let satisfied = block.conditions.evaluate(&view).map_err(|reason| {
                    PricingError::CalculationFailed {
                        block: block.id,
                        reason,
                    }
                })?;
                if !satisfied {
                    tracing::trace!(rule = %block.name, "conditions not satisfied, skipping");
                    continue;
                }

                Self::apply_event(block, &view, ctx.price())?
            };

            Self::check_bounds(block, application.new_price)?;

            let mut metadata = application.metadata;
            metadata["event"] = json!(block.event.kind());
            metadata["priority"] = json!(binding.effective_priority());

            ctx.record(&block.name, block.id, application.new_price, metadata);

            if let Some((name, value)) = application.published {
                facts.publish(name, value);
            }
        }

        Ok(ctx.into_quote())
    }

    /// Single dispatch point for every event variant
    fn apply_event(
        block: &PricingBlock,
        facts: &FactView<'_>,
        price: Decimal,
    ) -> PricingResult<EventApplication> {
        let failed = |reason: String| PricingError::CalculationFailed {
            block: block.id,
            reason,
        };

        match &block.event {
            PriceEvent::SetPrice { value } => {
                let value = value.resolve_decimal(facts).map_err(&failed)?;
                Ok(EventApplication {
                    new_price: value,
                    metadata: json!({ "value": value }),
                    published: None,
                })
            }
            PriceEvent::AddDelta { value } => {
                let delta = value.resolve_decimal(facts).map_err(&failed)?;
                let new_price = price
                    .checked_add(delta)
                    .ok_or_else(|| failed("price addition overflowed".to_string()))?;
                Ok(EventApplication {
                    new_price,
                    metadata: json!({ "delta": delta }),
                    published: None,
                })
            }
            PriceEvent::SubtractPerUnit { rate, units } => {
                let rate = rate.resolve_decimal(facts).map_err(&failed)?;
                let units = units.resolve_decimal(facts).map_err(&failed)?;
                let reduction = rate
                    .checked_mul(units)
                    .ok_or_else(|| failed("per-unit reduction overflowed".to_string()))?;
                let new_price = price
                    .checked_sub(reduction)
                    .ok_or_else(|| failed("price subtraction overflowed".to_string()))?;
                Ok(EventApplication {
                    new_price,
                    metadata: json!({ "rate": rate, "units": units }),
                    published: None,
                })
            }
            PriceEvent::Multiply { factor } => {
                let factor = factor.resolve_decimal(facts).map_err(&failed)?;
                let new_price = price
                    .checked_mul(factor)
                    .ok_or_else(|| failed("price multiplication overflowed".to_string()))?;
                Ok(EventApplication {
                    new_price,
                    metadata: json!({ "factor": factor }),
                    published: None,
                })
            }
            PriceEvent::Clamp { min, max } => {
                let min = min
                    .as_ref()
                    .map(|p| p.resolve_decimal(facts))
                    .transpose()
                    .map_err(&failed)?;
                let max = max
                    .as_ref()
                    .map(|p| p.resolve_decimal(facts))
                    .transpose()
                    .map_err(&failed)?;

                if let (Some(min), Some(max)) = (min, max) {
                    if min > max {
                        return Err(failed(format!(
                            "clamp bounds are inverted: min {} > max {}",
                            min, max
                        )));
                    }
                }

                let mut new_price = price;
                if let Some(min) = min {
                    new_price = new_price.max(min);
                }
                if let Some(max) = max {
                    new_price = new_price.min(max);
                }
                Ok(EventApplication {
                    new_price,
                    metadata: json!({ "min": min, "max": max }),
                    published: None,
                })
            }
            PriceEvent::RoundToSuffix { suffix } => {
                let suffix = suffix.resolve_decimal(facts).map_err(&failed)?;
                let new_price = round_to_suffix(price, suffix).map_err(&failed)?;
                Ok(EventApplication {
                    new_price,
                    metadata: json!({ "suffix": suffix }),
                    published: None,
                })
            }
            PriceEvent::PublishFact { name, value } => Ok(EventApplication {
                new_price: price,
                metadata: json!({ "fact": name }),
                published: Some((name.clone(), value.resolve(facts))),
            }),
        }
    }

    /// Reject out-of-bounds prices, attributing them to the block
    fn check_bounds(block: &PricingBlock, price: Decimal) -> PricingResult<()> {
        if price < Decimal::ZERO {
            return Err(PricingError::CalculationFailed {
                block: block.id,
                reason: format!("resulting price {} is negative", price),
            });
        }
        if price > MAX_SUPPORTED_PRICE {
            return Err(PricingError::CalculationFailed {
                block: block.id,
                reason: format!("resulting price {} exceeds the supported ceiling", price),
            });
        }
        Ok(())
    }
}

/// Snap a price to a fractional suffix ending
///
/// Produces the smallest `n + suffix` (whole `n`) that is not below the
/// current price, e.g. 19.42 with suffix 0.99 becomes 19.99.
fn round_to_suffix(price: Decimal, suffix: Decimal) -> Result<Decimal, String> {
    if suffix < Decimal::ZERO || suffix >= Decimal::ONE {
        return Err(format!(
            "rounding suffix must be within [0, 1), got {}",
            suffix
        ));
    }

    let mut candidate = price.trunc() + suffix;
    if candidate < price {
        candidate += Decimal::ONE;
    }
    Ok(candidate)
}
