// HTTP handlers for the pricing endpoints

use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use futures::StreamExt;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::convert::Infallible;
use utoipa::ToSchema;
use validator::Validate;

use crate::pricing::{
    PricedOffer, PricingError, PricingStrategy, QuoteInput, DEFAULT_STRATEGY_CODE,
};

/// Request DTO for a single pricing query
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct QuoteRequest {
    /// Destination country, ISO 3166-1 alpha-2
    #[validate(custom = "crate::validation::validate_country_code")]
    #[schema(example = "UA")]
    pub country: String,

    #[validate(range(min = 1, max = 365))]
    #[schema(example = 7)]
    pub requested_days: i64,

    /// Optional starting price, e.g. a previously fetched provider cost
    pub seed_price: Option<Decimal>,

    /// Optional per-day compensation rate override
    pub discount_per_day: Option<Decimal>,

    /// Strategy code; defaults to the standard pricing strategy
    #[validate(custom = "crate::validation::validate_strategy_code")]
    #[schema(example = "default-pricing")]
    pub strategy: Option<String>,
}

/// One element of a batch pricing request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BatchQuoteItem {
    #[validate(custom = "crate::validation::validate_country_code")]
    #[schema(example = "FR")]
    pub country: String,

    /// Per-item duration; falls back to the batch-level value
    pub requested_days: Option<i64>,
}

/// Request DTO for the batch pricing stream
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BatchQuoteRequest {
    #[validate]
    pub items: Vec<BatchQuoteItem>,

    /// Duration applied to items that carry none of their own
    #[schema(example = 7)]
    pub requested_days: Option<i64>,

    /// Strategy code; defaults to the standard pricing strategy
    #[validate(custom = "crate::validation::validate_strategy_code")]
    pub strategy: Option<String>,
}

impl BatchQuoteRequest {
    /// Expand the request into per-input engine arguments
    ///
    /// An item with no duration anywhere resolves to zero days, which
    /// the pricing run rejects as an invalid duration for that item
    /// alone; the batch itself proceeds.
    fn inputs(&self) -> Vec<QuoteInput> {
        self.items
            .iter()
            .map(|item| QuoteInput {
                country: item.country.clone(),
                requested_days: item.requested_days.or(self.requested_days).unwrap_or(0),
                seed_price: None,
                discount_per_day: None,
            })
            .collect()
    }
}

/// Handler for POST /api/pricing/quote
/// Prices a single destination/duration input synchronously
#[utoipa::path(
    post,
    path = "/api/pricing/quote",
    request_body = QuoteRequest,
    responses(
        (status = 200, description = "Priced offer with full audit trail", body = PricedOffer),
        (status = 400, description = "Invalid input or duration"),
        (status = 404, description = "Unknown destination or strategy"),
    ),
    tag = "pricing"
)]
pub async fn quote_handler(
    State(state): State<crate::AppState>,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<PricedOffer>, PricingError> {
    request.validate()?;

    let input = QuoteInput {
        country: request.country,
        requested_days: request.requested_days,
        seed_price: request.seed_price,
        discount_per_day: request.discount_per_day,
    };
    let code = request.strategy.as_deref().unwrap_or(DEFAULT_STRATEGY_CODE);

    let offer = state.pricing.quote(&input, code).await?;
    Ok(Json(offer))
}

/// Handler for POST /api/pricing/batch
/// Streams one NDJSON line per input, in completion order
#[utoipa::path(
    post,
    path = "/api/pricing/batch",
    request_body = BatchQuoteRequest,
    responses(
        (status = 200, description = "NDJSON stream of batch items, one per input"),
        (status = 400, description = "Invalid batch request"),
        (status = 404, description = "Unknown strategy"),
    ),
    tag = "pricing"
)]
pub async fn batch_quote_handler(
    State(state): State<crate::AppState>,
    Json(request): Json<BatchQuoteRequest>,
) -> Result<Response, PricingError> {
    request.validate()?;

    let code = request.strategy.as_deref().unwrap_or(DEFAULT_STRATEGY_CODE);
    let rx = state.coordinator.run(code, request.inputs()).await?;

    let lines = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    })
    .map(|item| {
        let mut line = serde_json::to_string(&item).unwrap_or_else(|e| {
            tracing::error!("failed to serialize batch item: {}", e);
            "{}".to_string()
        });
        line.push('\n');
        Ok::<String, Infallible>(line)
    });

    let response = (
        [(header::CONTENT_TYPE, "application/x-ndjson")],
        Body::from_stream(lines),
    );
    Ok(response.into_response())
}

/// Handler for GET /api/pricing/strategies
/// Lists the codes of every known strategy
#[utoipa::path(
    get,
    path = "/api/pricing/strategies",
    responses(
        (status = 200, description = "Known strategy codes", body = Vec<String>),
    ),
    tag = "pricing"
)]
pub async fn list_strategies_handler(
    State(state): State<crate::AppState>,
) -> Result<Json<Vec<String>>, PricingError> {
    let codes = state.pricing.strategies().strategy_codes().await?;
    Ok(Json(codes))
}

/// Handler for GET /api/pricing/strategies/:code
/// Returns one strategy definition for inspection
#[utoipa::path(
    get,
    path = "/api/pricing/strategies/{code}",
    params(
        ("code" = String, Path, description = "Strategy code")
    ),
    responses(
        (status = 200, description = "Strategy definition"),
        (status = 404, description = "Strategy not found"),
    ),
    tag = "pricing"
)]
pub async fn get_strategy_handler(
    State(state): State<crate::AppState>,
    Path(code): Path<String>,
) -> Result<Json<PricingStrategy>, PricingError> {
    let strategy = state.pricing.strategies().load(&code).await?;
    Ok(Json(strategy))
}

/// Handler for GET /api/pricing/metrics
/// Reports performance counters for the pricing system
#[utoipa::path(
    get,
    path = "/api/pricing/metrics",
    responses(
        (status = 200, description = "Performance metrics summary"),
    ),
    tag = "pricing"
)]
pub async fn metrics_handler(
    State(state): State<crate::AppState>,
) -> Result<Json<serde_json::Value>, PricingError> {
    let summary = state.pricing.metrics().summary();

    Ok(Json(serde_json::json!({
        "strategy_cache": {
            "hit_rate": format!("{:.1}%", summary.cache_hit_rate * 100.0),
            "hits": summary.cache_hits,
            "misses": summary.cache_misses,
        },
        "quotes": {
            "evaluations": summary.quote_evaluations,
            "failed": summary.failed_evaluations,
            "avg_time_ms": format!("{:.2}", summary.avg_quote_time_ms),
            "slow_evaluations": summary.slow_quote_evaluations,
        },
        "batches": {
            "runs": summary.batch_runs,
            "items": summary.batch_items,
        },
    })))
}
