// Batch/Stream Coordinator
//
// Runs the engine independently for each element of an input batch and
// publishes results onto a bounded channel as they complete, rather
// than waiting for the whole batch. One failing input yields one
// error-tagged item; siblings are unaffected.

use crate::pricing::{
    error::{PricingError, PricingResult},
    PricedOffer, PricingService, QuoteInput,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use utoipa::ToSchema;

/// Bound on the result channel; applies backpressure to the per-input
/// tasks when the consumer is slow
pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;

/// Per-input outcome carried by the result stream
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QuoteOutcome {
    /// The input priced successfully
    Ok { offer: PricedOffer },

    /// The input failed; the batch keeps going
    Error { code: String, message: String },
}

impl From<PricingResult<PricedOffer>> for QuoteOutcome {
    fn from(result: PricingResult<PricedOffer>) -> Self {
        match result {
            Ok(offer) => QuoteOutcome::Ok { offer },
            Err(error) => QuoteOutcome::Error {
                code: error.error_code().to_string(),
                message: error.to_string(),
            },
        }
    }
}

/// One completed batch element
///
/// `index` ties the result back to its submission position; delivery
/// order is completion order, not submission order.
#[derive(Debug, Serialize, ToSchema)]
pub struct BatchItem {
    pub index: usize,
    pub country: String,
    pub requested_days: i64,
    #[serde(flatten)]
    pub outcome: QuoteOutcome,
}

/// Batch/Stream Coordinator
///
/// Fans out independent pricing runs. The only synchronization point is
/// the output channel; the runs themselves share nothing mutable.
pub struct BatchCoordinator {
    service: Arc<PricingService>,
    channel_capacity: usize,
}

impl BatchCoordinator {
    /// Create a coordinator with the default channel capacity
    pub fn new(service: Arc<PricingService>) -> Self {
        Self {
            service,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Override the result channel capacity
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Launch one pricing run per input and return the result channel
    ///
    /// The strategy is loaded once up front; a load failure is fatal
    /// for the whole batch and surfaces here, not per-input. Dropping
    /// the receiver cancels the batch: tasks publishing into the closed
    /// channel simply discard their results, which is safe because
    /// individual runs have no side effects.
    pub async fn run(
        &self,
        strategy_code: &str,
        inputs: Vec<QuoteInput>,
    ) -> PricingResult<mpsc::Receiver<BatchItem>> {
        if inputs.is_empty() {
            return Err(PricingError::InvalidInput(
                "batch contains no inputs".to_string(),
            ));
        }

        let strategy = self.service.load_strategy(strategy_code).await?;
        self.service.metrics().record_batch_run(inputs.len());

        tracing::info!(
            strategy = %strategy.code,
            inputs = inputs.len(),
            "starting batch pricing run"
        );

        let (tx, rx) = mpsc::channel(self.channel_capacity);

        for (index, input) in inputs.into_iter().enumerate() {
            let service = Arc::clone(&self.service);
            let strategy = strategy.clone();
            let tx = tx.clone();

            tokio::spawn(async move {
                let outcome = QuoteOutcome::from(service.price_with_strategy(&strategy, &input));
                let item = BatchItem {
                    index,
                    country: input.country,
                    requested_days: input.requested_days,
                    outcome,
                };

                if tx.send(item).await.is_err() {
                    tracing::debug!(index, "batch consumer gone, discarding result");
                }
            });
        }

        Ok(rx)
    }
}
