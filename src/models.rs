use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A destination country known to the catalog
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Country {
    /// ISO 3166-1 alpha-2 code
    #[schema(example = "UA")]
    pub iso: String,
    #[schema(example = "Ukraine")]
    pub name: String,
    #[schema(example = "Europe")]
    pub region: String,
}

/// A connectivity bundle supplied by the catalog collaborator
///
/// Records arrive already normalized; this service never talks to the
/// upstream providers itself.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Bundle {
    /// Provider SKU, unique within the catalog
    #[schema(example = "esim-eu-7d-5gb")]
    pub id: String,
    #[schema(example = "Europe 7 Days 5GB")]
    pub name: String,
    /// ISO codes of the destinations this bundle covers
    pub countries: Vec<String>,
    #[schema(example = 7)]
    pub duration_days: i64,
    /// Provider source cost, before any markup
    #[schema(example = "12.50")]
    pub cost: Decimal,
    #[schema(example = "USD")]
    pub currency: String,
    /// Included data allowance; absent means unlimited
    #[schema(example = 5120)]
    pub data_amount_mb: Option<i64>,
}

/// Result of matching a requested duration against the catalog
///
/// `is_exact_match` is false when the traveler got a longer bundle than
/// requested; `unused_days` is the surplus they paid for.
#[derive(Debug, Clone)]
pub struct BundleSelection {
    pub bundle: Bundle,
    pub is_exact_match: bool,
    pub unused_days: i64,
}

/// Compact bundle view embedded in pricing responses
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BundleSummary {
    pub id: String,
    pub name: String,
    pub duration_days: i64,
    pub data_amount_mb: Option<i64>,
}

impl From<&Bundle> for BundleSummary {
    fn from(bundle: &Bundle) -> Self {
        Self {
            id: bundle.id.clone(),
            name: bundle.name.clone(),
            duration_days: bundle.duration_days,
            data_amount_mb: bundle.data_amount_mb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bundle_fixture() -> Bundle {
        Bundle {
            id: "esim-eu-7d-5gb".to_string(),
            name: "Europe 7 Days 5GB".to_string(),
            countries: vec!["FR".to_string(), "DE".to_string()],
            duration_days: 7,
            cost: dec!(12.50),
            currency: "USD".to_string(),
            data_amount_mb: Some(5120),
        }
    }

    #[test]
    fn test_bundle_serialization_round_trip() {
        let bundle = bundle_fixture();
        let json = serde_json::to_string(&bundle).unwrap();
        let parsed: Bundle = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.id, bundle.id);
        assert_eq!(parsed.cost, bundle.cost);
        assert_eq!(parsed.duration_days, 7);
    }

    #[test]
    fn test_bundle_summary_from_bundle() {
        let bundle = bundle_fixture();
        let summary = BundleSummary::from(&bundle);

        assert_eq!(summary.id, bundle.id);
        assert_eq!(summary.duration_days, bundle.duration_days);
        assert_eq!(summary.data_amount_mb, Some(5120));
    }

    #[test]
    fn test_bundle_deserializes_numeric_cost() {
        let json = r#"
        {
            "id": "x",
            "name": "X",
            "countries": ["US"],
            "duration_days": 3,
            "cost": 9.99,
            "currency": "USD",
            "data_amount_mb": null
        }
        "#;
        let bundle: Bundle = serde_json::from_str(json).unwrap();
        assert_eq!(bundle.cost, dec!(9.99));
        assert!(bundle.data_amount_mb.is_none());
    }
}
