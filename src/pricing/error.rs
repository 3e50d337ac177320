// Error types for the Pricing System
// Provides comprehensive error handling for strategy loading and rule evaluation

use thiserror::Error;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

/// Main error type for the Pricing System
///
/// This enum represents all possible error types that can occur while
/// loading pricing strategies, building fact bases, and evaluating rules.
#[derive(Debug, Error)]
pub enum PricingError {
    /// Malformed or missing required input
    /// Contains a descriptive message about what was invalid
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No candidate bundle could be selected for the requested destination
    #[error("No bundles available for destination {country}")]
    NoBundlesAvailable {
        country: String,
    },

    /// A strategy resolved to zero enabled block bindings
    #[error("Strategy '{strategy}' has no enabled pricing rules configured")]
    NoRulesConfigured {
        strategy: String,
    },

    /// Requested duration outside the supported bounds
    #[error("Invalid duration: {days} days (supported range is {min}-{max})")]
    InvalidDuration {
        days: i64,
        min: i64,
        max: i64,
    },

    /// A block's event mutation or condition evaluation produced an
    /// unusable value, attributed to the offending block
    #[error("Calculation failed in block {block}: {reason}")]
    CalculationFailed {
        block: Uuid,
        reason: String,
    },

    /// No strategy row matched the requested code
    #[error("Pricing strategy not found: {0}")]
    StrategyNotFound(String),

    /// A loaded strategy failed structural validation
    #[error("Invalid strategy configuration: {0}")]
    InvalidStrategyConfig(String),

    /// JSON serialization/deserialization errors
    /// Occurs when parsing strategy definitions from configuration files
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for Pricing System operations
///
/// Instead of writing `Result<T, PricingError>`, you can write `PricingResult<T>`.
pub type PricingResult<T> = Result<T, PricingError>;

impl From<validator::ValidationErrors> for PricingError {
    fn from(err: validator::ValidationErrors) -> Self {
        PricingError::InvalidInput(err.to_string())
    }
}

impl PricingError {
    /// Machine-readable error code, used in batch stream items and
    /// error response bodies
    pub fn error_code(&self) -> &'static str {
        match self {
            PricingError::InvalidInput(_) => "INVALID_INPUT",
            PricingError::NoBundlesAvailable { .. } => "NO_BUNDLES_AVAILABLE",
            PricingError::NoRulesConfigured { .. } => "NO_RULES_CONFIGURED",
            PricingError::InvalidDuration { .. } => "INVALID_DURATION",
            PricingError::CalculationFailed { .. } => "CALCULATION_FAILED",
            PricingError::StrategyNotFound(_) => "STRATEGY_NOT_FOUND",
            PricingError::InvalidStrategyConfig(_) => "INVALID_STRATEGY_CONFIG",
            PricingError::JsonError(_) => "JSON_ERROR",
        }
    }

    /// HTTP status code this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            PricingError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            PricingError::NoBundlesAvailable { .. } => StatusCode::NOT_FOUND,
            PricingError::NoRulesConfigured { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            PricingError::InvalidDuration { .. } => StatusCode::BAD_REQUEST,
            PricingError::CalculationFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            PricingError::StrategyNotFound(_) => StatusCode::NOT_FOUND,
            PricingError::InvalidStrategyConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PricingError::JsonError(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for PricingError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("Pricing error: {}", self);
        }

        let body = Json(json!({
            "error": self.error_code(),
            "details": self.to_string(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = PricingError::InvalidInput("negative seed price".to_string());
        assert_eq!(error.to_string(), "Invalid input: negative seed price");

        let error = PricingError::NoBundlesAvailable {
            country: "XX".to_string(),
        };
        assert_eq!(error.to_string(), "No bundles available for destination XX");

        let error = PricingError::StrategyNotFound("summer-sale".to_string());
        assert_eq!(error.to_string(), "Pricing strategy not found: summer-sale");
    }

    #[test]
    fn test_strategy_not_found_embeds_code() {
        // The strategy code must survive verbatim into the message
        let error = PricingError::StrategyNotFound("default-pricing".to_string());
        assert!(error.to_string().contains("default-pricing"));
    }

    #[test]
    fn test_calculation_failed_names_block() {
        let block = Uuid::new_v4();
        let error = PricingError::CalculationFailed {
            block,
            reason: "price overflow".to_string(),
        };
        assert!(error.to_string().contains(&block.to_string()));
        assert!(error.to_string().contains("price overflow"));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            PricingError::InvalidDuration { days: 0, min: 1, max: 365 }.error_code(),
            "INVALID_DURATION"
        );
        assert_eq!(
            PricingError::NoRulesConfigured { strategy: "x".to_string() }.error_code(),
            "NO_RULES_CONFIGURED"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            PricingError::StrategyNotFound("x".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            PricingError::InvalidInput("x".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PricingError::CalculationFailed {
                block: Uuid::new_v4(),
                reason: "x".to_string(),
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_from_json() {
        let json_str = "{invalid json}";
        let json_result: Result<serde_json::Value, _> = serde_json::from_str(json_str);

        if let Err(json_error) = json_result {
            let error: PricingError = json_error.into();
            assert!(matches!(error, PricingError::JsonError(_)));
        }
    }
}
