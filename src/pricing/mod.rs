// Pricing System Module
//
// Rule-driven pricing for traveler connectivity bundles. The system
// evaluates an ordered set of declarative blocks against a per-request
// fact base and records every price transformation as an auditable step:
// - Fact base: immutable snapshot of the request inputs
// - Blocks: condition trees plus price-mutation events
// - Strategies: ordered, configurable block bindings loaded by code
// - Engine: cascading evaluation with a full audit trail
// - Coordinator: fans out batch requests and streams results
//
// Strategies are data, not code: they can be reconfigured through the
// strategy file without a deployment.

pub mod error;
pub mod types;
pub mod facts;
pub mod block;
pub mod strategy;
pub mod store;
pub mod context;
pub mod engine;
pub mod coordinator;
pub mod handlers;
pub mod metrics;

// Re-export commonly used types for convenience
pub use error::{PricingError, PricingResult};
pub use types::ComparisonOperator;
pub use facts::{FactBase, FactValue, FactView};
pub use block::{ConditionNode, ParamValue, PriceEvent, PricingBlock};
pub use strategy::{
    default_strategy,
    BlockBinding,
    PricingStrategy,
    DEFAULT_STRATEGY_CODE,
};
pub use store::StrategyStore;
pub use context::{CustomerDiscount, PriceQuote, PricingContext, PricingStep};
pub use engine::RuleEngine;
pub use coordinator::{BatchCoordinator, BatchItem, QuoteOutcome};
pub use metrics::PerformanceMetrics;

// Pricing Service - Orchestrator
//
// Coordinates catalog selection, fact base construction, and engine
// evaluation behind a single interface.

use crate::catalog::CatalogStore;
use crate::models::{BundleSelection, BundleSummary, Country};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;

/// Supported duration bounds for a pricing request, in days
pub const MIN_DURATION_DAYS: i64 = 1;
pub const MAX_DURATION_DAYS: i64 = 365;

/// Fallback per-day compensation rate when the caller supplies none
///
/// The rate itself comes from upstream analysis of markup differences
/// between bundle durations; the engine only consumes it as a fact.
const DEFAULT_DISCOUNT_PER_DAY: Decimal = Decimal::from_parts(50, 0, 0, false, 2);

/// One pricing request: a destination and a requested duration
#[derive(Debug, Clone)]
pub struct QuoteInput {
    pub country: String,
    pub requested_days: i64,
    /// Optional starting price, e.g. a previously fetched provider cost
    pub seed_price: Option<Decimal>,
    /// Optional per-day compensation rate override
    pub discount_per_day: Option<Decimal>,
}

impl QuoteInput {
    /// Build an input with just a destination and duration
    pub fn new(country: &str, requested_days: i64) -> Self {
        Self {
            country: country.to_string(),
            requested_days,
            seed_price: None,
            discount_per_day: None,
        }
    }
}

/// The complete customer-facing pricing artifact for one input
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PricedOffer {
    pub final_price: Decimal,
    pub currency: String,
    /// Price before the discount-producing steps ran
    pub total_cost: Decimal,
    pub discount_value: Decimal,
    /// Duration of the selected bundle, in days
    pub duration: i64,
    pub bundle: BundleSummary,
    pub country: Country,
    pub savings_amount: Decimal,
    pub savings_percentage: Decimal,
    pub customer_discounts: Vec<CustomerDiscount>,
    pub pricing_steps: Vec<PricingStep>,
}

/// Pricing Service
///
/// Resolves the catalog and strategy collaborators up front so that the
/// engine itself runs as a pure, synchronous computation.
pub struct PricingService {
    catalog: Arc<CatalogStore>,
    strategies: Arc<StrategyStore>,
    metrics: Arc<PerformanceMetrics>,
    default_discount_per_day: Decimal,
}

impl PricingService {
    /// Create a new PricingService
    pub fn new(catalog: Arc<CatalogStore>, strategies: Arc<StrategyStore>) -> Self {
        Self {
            catalog,
            strategies,
            metrics: Arc::new(PerformanceMetrics::new()),
            default_discount_per_day: DEFAULT_DISCOUNT_PER_DAY,
        }
    }

    /// Share a metrics instance with other components
    pub fn with_metrics(mut self, metrics: Arc<PerformanceMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Override the fallback per-day compensation rate
    pub fn with_default_discount_per_day(mut self, rate: Decimal) -> Self {
        self.default_discount_per_day = rate;
        self
    }

    /// Get performance metrics
    pub fn metrics(&self) -> &Arc<PerformanceMetrics> {
        &self.metrics
    }

    /// Strategy collaborator, exposed for inspection endpoints
    pub fn strategies(&self) -> &Arc<StrategyStore> {
        &self.strategies
    }

    /// Catalog collaborator
    pub fn catalog(&self) -> &Arc<CatalogStore> {
        &self.catalog
    }

    /// Load a strategy by code
    pub async fn load_strategy(&self, code: &str) -> PricingResult<PricingStrategy> {
        self.strategies.load(code).await
    }

    /// Price a single input, loading the strategy by code
    ///
    /// The non-streaming variant for callers that need one number.
    pub async fn quote(&self, input: &QuoteInput, strategy_code: &str) -> PricingResult<PricedOffer> {
        let strategy = self.strategies.load(strategy_code).await?;
        self.price_with_strategy(&strategy, input)
    }

    /// Price a single input against an already-loaded strategy
    ///
    /// Pure and synchronous: every upstream lookup has happened by the
    /// time this runs.
    pub fn price_with_strategy(
        &self,
        strategy: &PricingStrategy,
        input: &QuoteInput,
    ) -> PricingResult<PricedOffer> {
        let _timer = self.metrics.start_quote_evaluation();

        let result = self.price_inner(strategy, input);
        if result.is_err() {
            self.metrics.record_failed_evaluation();
        }
        result
    }

    fn price_inner(
        &self,
        strategy: &PricingStrategy,
        input: &QuoteInput,
    ) -> PricingResult<PricedOffer> {
        if input.requested_days < MIN_DURATION_DAYS || input.requested_days > MAX_DURATION_DAYS {
            return Err(PricingError::InvalidDuration {
                days: input.requested_days,
                min: MIN_DURATION_DAYS,
                max: MAX_DURATION_DAYS,
            });
        }

        if let Some(rate) = input.discount_per_day {
            if rate < Decimal::ZERO {
                return Err(PricingError::InvalidInput(format!(
                    "discount_per_day must be non-negative, got {}",
                    rate
                )));
            }
        }

        let country = self
            .catalog
            .country(&input.country)
            .cloned()
            .ok_or_else(|| PricingError::NoBundlesAvailable {
                country: input.country.clone(),
            })?;

        let selection = self
            .catalog
            .select_bundle(&input.country, input.requested_days)
            .ok_or_else(|| PricingError::NoBundlesAvailable {
                country: input.country.clone(),
            })?;

        let facts = self.build_fact_base(&selection, input);
        let quote = RuleEngine::evaluate(strategy, facts, input.seed_price)?;

        tracing::info!(
            country = %country.iso,
            bundle = %selection.bundle.id,
            final_price = %quote.final_price,
            steps = quote.steps.len(),
            "priced bundle"
        );

        Ok(PricedOffer {
            total_cost: quote.final_price + quote.savings_amount,
            discount_value: quote.savings_amount,
            duration: selection.bundle.duration_days,
            bundle: BundleSummary::from(&selection.bundle),
            country,
            final_price: quote.final_price,
            currency: quote.currency,
            savings_amount: quote.savings_amount,
            savings_percentage: quote.savings_percentage,
            customer_discounts: quote.customer_discounts,
            pricing_steps: quote.steps,
        })
    }

    /// Assemble the per-request fact snapshot
    fn build_fact_base(&self, selection: &BundleSelection, input: &QuoteInput) -> FactBase {
        let mut facts = FactBase::new();

        facts.insert("country", FactValue::from(input.country.as_str()));
        facts.insert("numOfDays", FactValue::from(input.requested_days));
        facts.insert("isExactMatch", FactValue::from(selection.is_exact_match));
        facts.insert("unusedDays", FactValue::from(selection.unused_days));
        facts.insert(
            "discountPerDay",
            FactValue::from(
                input
                    .discount_per_day
                    .unwrap_or(self.default_discount_per_day),
            ),
        );

        let mut bundle = BTreeMap::new();
        bundle.insert(
            "name".to_string(),
            FactValue::from(selection.bundle.name.as_str()),
        );
        bundle.insert("cost".to_string(), FactValue::from(selection.bundle.cost));
        bundle.insert(
            "duration".to_string(),
            FactValue::from(selection.bundle.duration_days),
        );
        bundle.insert(
            "currency".to_string(),
            FactValue::from(selection.bundle.currency.as_str()),
        );
        if let Some(data_amount_mb) = selection.bundle.data_amount_mb {
            bundle.insert("dataAmountMb".to_string(), FactValue::from(data_amount_mb));
        }
        facts.insert("selectedBundle", FactValue::Map(bundle));

        facts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn service() -> PricingService {
        PricingService::new(
            Arc::new(CatalogStore::demo()),
            Arc::new(StrategyStore::new()),
        )
    }

    #[tokio::test]
    async fn test_quote_exact_match() {
        let offer = service()
            .quote(&QuoteInput::new("FR", 7), DEFAULT_STRATEGY_CODE)
            .await
            .unwrap();

        // cost 12.50, markup x1.2 = 15.00, rounding 15.99
        assert_eq!(offer.final_price, dec!(15.99));
        assert_eq!(offer.currency, "USD");
        assert_eq!(offer.duration, 7);
        assert_eq!(offer.bundle.id, "esim-eu-7d-5gb");
        assert_eq!(offer.country.iso, "FR");
        assert!(offer.customer_discounts.is_empty());
        assert_eq!(offer.total_cost, offer.final_price);
    }

    #[tokio::test]
    async fn test_quote_inexact_match_applies_discount() {
        let offer = service()
            .quote(&QuoteInput::new("FR", 5), DEFAULT_STRATEGY_CODE)
            .await
            .unwrap();

        // 7-day bundle selected for a 5-day request: two unused days at
        // 0.50/day, applied between markup and rounding
        // 12.50 -> 15.00 -> 14.00 -> 14.99
        assert_eq!(offer.duration, 7);
        assert_eq!(offer.final_price, dec!(14.99));
        assert_eq!(offer.savings_amount, dec!(1.00));
        assert_eq!(offer.discount_value, dec!(1.00));
        assert_eq!(offer.total_cost, dec!(15.99));
        assert_eq!(offer.customer_discounts.len(), 1);
    }

    #[tokio::test]
    async fn test_quote_fixed_price_destination() {
        let offer = service()
            .quote(&QuoteInput::new("UA", 7), DEFAULT_STRATEGY_CODE)
            .await
            .unwrap();

        let fixed = offer
            .pricing_steps
            .iter()
            .find(|s| s.name.starts_with("destination-fixed-price"))
            .expect("fixed price step present");
        assert_eq!(fixed.price_after, dec!(88));
    }

    #[tokio::test]
    async fn test_quote_unknown_country() {
        let result = service()
            .quote(&QuoteInput::new("XX", 7), DEFAULT_STRATEGY_CODE)
            .await;
        assert!(matches!(
            result,
            Err(PricingError::NoBundlesAvailable { country }) if country == "XX"
        ));
    }

    #[tokio::test]
    async fn test_quote_duration_out_of_bounds() {
        let result = service()
            .quote(&QuoteInput::new("FR", 0), DEFAULT_STRATEGY_CODE)
            .await;
        assert!(matches!(result, Err(PricingError::InvalidDuration { .. })));

        let result = service()
            .quote(&QuoteInput::new("FR", 366), DEFAULT_STRATEGY_CODE)
            .await;
        assert!(matches!(result, Err(PricingError::InvalidDuration { .. })));
    }

    #[tokio::test]
    async fn test_quote_duration_beyond_catalog() {
        let result = service()
            .quote(&QuoteInput::new("FR", 90), DEFAULT_STRATEGY_CODE)
            .await;
        assert!(matches!(
            result,
            Err(PricingError::NoBundlesAvailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_quote_unknown_strategy() {
        let result = service().quote(&QuoteInput::new("FR", 7), "flash-sale").await;
        assert!(matches!(
            result,
            Err(PricingError::StrategyNotFound(code)) if code == "flash-sale"
        ));
    }

    #[tokio::test]
    async fn test_discount_per_day_override() {
        let mut input = QuoteInput::new("FR", 5);
        input.discount_per_day = Some(dec!(1.00));

        let offer = service().quote(&input, DEFAULT_STRATEGY_CODE).await.unwrap();
        // 12.50 -> 15.00 -> 13.00 -> 13.99
        assert_eq!(offer.final_price, dec!(13.99));
        assert_eq!(offer.savings_amount, dec!(2.00));
    }

    #[tokio::test]
    async fn test_negative_discount_rate_rejected() {
        let mut input = QuoteInput::new("FR", 5);
        input.discount_per_day = Some(dec!(-0.10));

        let result = service().quote(&input, DEFAULT_STRATEGY_CODE).await;
        assert!(matches!(result, Err(PricingError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_failed_quotes_counted() {
        let service = service();
        let _ = service
            .quote(&QuoteInput::new("XX", 7), DEFAULT_STRATEGY_CODE)
            .await;

        assert_eq!(service.metrics().summary().failed_evaluations, 1);
    }
}
