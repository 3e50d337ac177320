mod catalog;
mod error;
mod models;
mod pricing;
mod validation;

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use catalog::CatalogStore;
use error::ApiError;
use models::{Bundle, Country};
use pricing::{BatchCoordinator, PerformanceMetrics, PricingService, StrategyStore};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        list_countries,
        get_country,
        list_bundles,
        pricing::handlers::quote_handler,
        pricing::handlers::batch_quote_handler,
        pricing::handlers::list_strategies_handler,
        pricing::handlers::get_strategy_handler,
        pricing::handlers::metrics_handler,
    ),
    components(
        schemas(
            Country,
            Bundle,
            models::BundleSummary,
            pricing::PricedOffer,
            pricing::PricingStep,
            pricing::CustomerDiscount,
            pricing::handlers::QuoteRequest,
            pricing::handlers::BatchQuoteRequest,
            pricing::handlers::BatchQuoteItem,
        )
    ),
    tags(
        (name = "catalog", description = "Read-only views of the bundle/country catalog"),
        (name = "pricing", description = "Rule-driven bundle pricing endpoints")
    ),
    info(
        title = "Bundle Pricing API",
        version = "1.0.0",
        description = "Rule-driven pricing for traveler connectivity bundles",
        contact(
            name = "API Support",
            email = "support@esimpricing.dev"
        )
    )
)]
struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    catalog: Arc<CatalogStore>,
    pricing: Arc<PricingService>,
    coordinator: Arc<BatchCoordinator>,
}

/// Handler for GET /api/catalog/countries
/// Lists every destination the catalog knows about
#[utoipa::path(
    get,
    path = "/api/catalog/countries",
    responses(
        (status = 200, description = "All known destinations", body = Vec<Country>),
    ),
    tag = "catalog"
)]
async fn list_countries(State(state): State<AppState>) -> Result<Json<Vec<Country>>, ApiError> {
    tracing::debug!("Listing catalog countries");

    let countries = state.catalog.countries().into_iter().cloned().collect();
    Ok(Json(countries))
}

/// Handler for GET /api/catalog/countries/:iso
/// Retrieves one destination by ISO code
#[utoipa::path(
    get,
    path = "/api/catalog/countries/{iso}",
    params(
        ("iso" = String, Path, description = "ISO 3166-1 alpha-2 code")
    ),
    responses(
        (status = 200, description = "Destination found", body = Country),
        (status = 404, description = "Destination not known to the catalog"),
    ),
    tag = "catalog"
)]
async fn get_country(
    State(state): State<AppState>,
    Path(iso): Path<String>,
) -> Result<Json<Country>, ApiError> {
    tracing::debug!("Fetching country {}", iso);

    let country = state.catalog.country(&iso).cloned().ok_or_else(|| {
        ApiError::NotFound {
            resource: "Country".to_string(),
            id: iso.clone(),
        }
    })?;

    Ok(Json(country))
}

/// Query parameters for bundle listing
#[derive(Debug, Deserialize)]
struct BundleQuery {
    country: Option<String>,
}

/// Handler for GET /api/catalog/bundles
/// Lists bundles, optionally narrowed to one destination
#[utoipa::path(
    get,
    path = "/api/catalog/bundles",
    responses(
        (status = 200, description = "Matching bundles", body = Vec<Bundle>),
        (status = 404, description = "Filter country not known to the catalog"),
    ),
    tag = "catalog"
)]
async fn list_bundles(
    Query(params): Query<BundleQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Bundle>>, ApiError> {
    tracing::debug!("Listing bundles with filter: {:?}", params);

    match params.country {
        Some(iso) => {
            if state.catalog.country(&iso).is_none() {
                return Err(ApiError::NotFound {
                    resource: "Country".to_string(),
                    id: iso,
                });
            }
            let bundles = state.catalog.bundles_for(&iso).into_iter().cloned().collect();
            Ok(Json(bundles))
        }
        None => Ok(Json(state.catalog.bundles().to_vec())),
    }
}

/// Wire the shared components into application state
fn build_state(
    catalog: CatalogStore,
    strategies: StrategyStore,
    default_discount_per_day: Option<Decimal>,
) -> AppState {
    let metrics = Arc::new(PerformanceMetrics::new());
    let catalog = Arc::new(catalog);
    let strategies = Arc::new(strategies.with_metrics(metrics.clone()));

    let mut service =
        PricingService::new(catalog.clone(), strategies).with_metrics(metrics);
    if let Some(rate) = default_discount_per_day {
        service = service.with_default_discount_per_day(rate);
    }
    let pricing = Arc::new(service);
    let coordinator = Arc::new(BatchCoordinator::new(pricing.clone()));

    AppState {
        catalog,
        pricing,
        coordinator,
    }
}

/// Creates and configures the application router
/// Maps all API endpoints to their handlers and adds CORS middleware
fn create_router(state: AppState) -> Router {
    use tower_http::cors::{Any, CorsLayer};

    // Configure CORS to allow all origins, methods, and headers
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Catalog routes
        .route("/api/catalog/countries", get(list_countries))
        .route("/api/catalog/countries/:iso", get(get_country))
        .route("/api/catalog/bundles", get(list_bundles))
        // Pricing routes
        .route("/api/pricing/quote", post(pricing::handlers::quote_handler))
        .route("/api/pricing/batch", post(pricing::handlers::batch_quote_handler))
        .route("/api/pricing/strategies", get(pricing::handlers::list_strategies_handler))
        .route("/api/pricing/strategies/:code", get(pricing::handlers::get_strategy_handler))
        .route("/api/pricing/metrics", get(pricing::handlers::metrics_handler))
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("Bundle Pricing API - Starting...");

    // Get configuration from environment variables
    let host = std::env::var("HOST")
        .unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string());

    // The catalog collaborator supplies normalized records; without a
    // configured snapshot the built-in demo catalog keeps the service
    // bootable
    let catalog = match std::env::var("CATALOG_FILE") {
        Ok(path) => {
            tracing::info!("Loading catalog snapshot from {}", path);
            CatalogStore::load_from_file(&path).expect("Failed to load catalog file")
        }
        Err(_) => {
            tracing::info!("CATALOG_FILE not set, using the built-in demo catalog");
            CatalogStore::demo()
        }
    };

    let strategies = match std::env::var("STRATEGY_FILE") {
        Ok(path) => {
            tracing::info!("Serving strategies from {}", path);
            StrategyStore::with_file(path)
        }
        Err(_) => {
            tracing::info!("STRATEGY_FILE not set, serving built-in strategies only");
            StrategyStore::new()
        }
    };

    let default_discount_per_day = std::env::var("DISCOUNT_PER_DAY").ok().map(|value| {
        value
            .parse::<Decimal>()
            .expect("DISCOUNT_PER_DAY must be a decimal value")
    });

    let state = build_state(catalog, strategies, default_discount_per_day);

    // Pre-load strategy definitions to fail fast on bad configuration
    state
        .pricing
        .strategies()
        .warm()
        .await
        .expect("Failed to load pricing strategies");

    // Create the application router
    let app = create_router(state);

    // Start the Axum server
    let addr = format!("{}:{}", host, port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Bundle Pricing API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
