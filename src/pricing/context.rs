// Pricing Context and Audit Trail
//
// Mutable accumulator for one pricing run: the running price, its
// currency, and an append-only list of audit steps recording every
// transformation a block applied.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;

/// One audit record of a block's effect on the price
///
/// `order` is the execution index within the run (monotonic, ties in
/// priority broken by binding order), not the block's priority value.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PricingStep {
    pub order: u32,
    pub name: String,
    pub price_before: Decimal,
    pub price_after: Decimal,
    pub impact: Decimal,
    pub rule_id: Uuid,
    #[schema(value_type = Object)]
    pub metadata: JsonValue,
    pub timestamp: DateTime<Utc>,
}

impl PricingStep {
    /// Step values without the timestamp, for determinism comparisons
    pub fn fingerprint(&self) -> (u32, &str, Decimal, Decimal, Decimal, Uuid) {
        (
            self.order,
            self.name.as_str(),
            self.price_before,
            self.price_after,
            self.impact,
            self.rule_id,
        )
    }
}

/// One discount-producing step, surfaced to the customer
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CustomerDiscount {
    pub name: String,
    pub rule_id: Uuid,
    pub amount: Decimal,
}

/// The externally visible artifact of one pricing run
///
/// Owned solely by the run that produced it; nothing is persisted.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PriceQuote {
    pub final_price: Decimal,
    pub currency: String,
    pub steps: Vec<PricingStep>,
    pub savings_amount: Decimal,
    pub savings_percentage: Decimal,
    pub customer_discounts: Vec<CustomerDiscount>,
}

/// Pricing Context
///
/// Private to one engine run. Blocks mutate the price through the
/// engine's event dispatch; every mutation appends exactly one step.
#[derive(Debug, Clone)]
pub struct PricingContext {
    price: Decimal,
    currency: String,
    steps: Vec<PricingStep>,
}

impl PricingContext {
    /// Create a context seeded with a starting price
    pub fn new(seed: Decimal, currency: &str) -> Self {
        Self {
            price: seed,
            currency: currency.to_string(),
            steps: Vec::new(),
        }
    }

    /// Current running price
    pub fn price(&self) -> Decimal {
        self.price
    }

    /// Steps recorded so far
    pub fn steps(&self) -> &[PricingStep] {
        &self.steps
    }

    /// Apply a price mutation and record its audit step
    pub fn record(&mut self, name: &str, rule_id: Uuid, new_price: Decimal, metadata: JsonValue) {
        let price_before = self.price;
        let impact = new_price - price_before;
        let order = self.steps.len() as u32;

        tracing::debug!(
            step = order,
            rule = name,
            %price_before,
            price_after = %new_price,
            %impact,
            "applied pricing step"
        );

        self.steps.push(PricingStep {
            order,
            name: name.to_string(),
            price_before,
            price_after: new_price,
            impact,
            rule_id,
            metadata,
            timestamp: Utc::now(),
        });
        self.price = new_price;
    }

    /// Finalize the run into a customer-facing quote
    ///
    /// Savings are the combined magnitude of the discount-producing
    /// (negative-impact) steps, i.e. the gap between the unconstrained
    /// price the non-discount blocks established and the final price.
    /// The percentage is normalized against that unconstrained price
    /// and quantized to two places for display.
    pub fn into_quote(self) -> PriceQuote {
        let savings_amount: Decimal = self
            .steps
            .iter()
            .filter(|step| step.impact < Decimal::ZERO)
            .map(|step| -step.impact)
            .sum();

        let customer_discounts = self
            .steps
            .iter()
            .filter(|step| step.impact < Decimal::ZERO)
            .map(|step| CustomerDiscount {
                name: step.name.clone(),
                rule_id: step.rule_id,
                amount: -step.impact,
            })
            .collect();

        let undiscounted = self.price + savings_amount;
        let savings_percentage = if undiscounted > Decimal::ZERO && savings_amount > Decimal::ZERO {
            (savings_amount * Decimal::from(100) / undiscounted).round_dp(2)
        } else {
            Decimal::ZERO
        };

        PriceQuote {
            final_price: self.price,
            currency: self.currency,
            steps: self.steps,
            savings_amount,
            savings_percentage,
            customer_discounts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_steps_record_execution_order() {
        let mut ctx = PricingContext::new(Decimal::ZERO, "USD");
        let rule = Uuid::new_v4();

        ctx.record("base", rule, dec!(12.50), json!({}));
        ctx.record("markup", rule, dec!(15.00), json!({}));
        ctx.record("discount", rule, dec!(13.50), json!({}));

        let orders: Vec<u32> = ctx.steps().iter().map(|s| s.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn test_impact_is_signed_delta() {
        let mut ctx = PricingContext::new(Decimal::ZERO, "USD");
        let rule = Uuid::new_v4();

        ctx.record("base", rule, dec!(10.00), json!({}));
        ctx.record("discount", rule, dec!(8.50), json!({}));

        assert_eq!(ctx.steps()[0].impact, dec!(10.00));
        assert_eq!(ctx.steps()[1].impact, dec!(-1.50));
        assert_eq!(ctx.steps()[1].price_before, dec!(10.00));
        assert_eq!(ctx.steps()[1].price_after, dec!(8.50));
    }

    #[test]
    fn test_quote_with_no_steps() {
        let ctx = PricingContext::new(dec!(5.00), "USD");
        let quote = ctx.into_quote();

        assert_eq!(quote.final_price, dec!(5.00));
        assert!(quote.steps.is_empty());
        assert_eq!(quote.savings_amount, Decimal::ZERO);
        assert_eq!(quote.savings_percentage, Decimal::ZERO);
        assert!(quote.customer_discounts.is_empty());
    }

    #[test]
    fn test_savings_aggregate_discount_steps() {
        let mut ctx = PricingContext::new(Decimal::ZERO, "USD");
        let rule = Uuid::new_v4();

        ctx.record("base", rule, dec!(20.00), json!({}));
        ctx.record("promo", rule, dec!(18.00), json!({}));
        ctx.record("seasonal", rule, dec!(16.00), json!({}));

        let quote = ctx.into_quote();
        assert_eq!(quote.savings_amount, dec!(4.00));
        assert_eq!(quote.customer_discounts.len(), 2);
        assert_eq!(quote.customer_discounts[0].amount, dec!(2.00));
        // 4 / 20 = 20%
        assert_eq!(quote.savings_percentage, dec!(20.00));
    }

    #[test]
    fn test_price_increases_are_not_discounts() {
        let mut ctx = PricingContext::new(Decimal::ZERO, "USD");
        let rule = Uuid::new_v4();

        ctx.record("base", rule, dec!(10.00), json!({}));
        ctx.record("markup", rule, dec!(12.00), json!({}));

        let quote = ctx.into_quote();
        assert_eq!(quote.savings_amount, Decimal::ZERO);
        assert!(quote.customer_discounts.is_empty());
    }

    #[test]
    fn test_fingerprint_excludes_timestamp() {
        let mut a = PricingContext::new(Decimal::ZERO, "USD");
        let mut b = PricingContext::new(Decimal::ZERO, "USD");
        let rule = Uuid::new_v4();

        a.record("base", rule, dec!(10.00), json!({}));
        b.record("base", rule, dec!(10.00), json!({}));

        assert_eq!(a.steps()[0].fingerprint(), b.steps()[0].fingerprint());
    }
}
