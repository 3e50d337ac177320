// Catalog Store
//
// Process-scoped, read-only lookup table over the bundle/country
// catalog supplied by the ingestion collaborator. Constructed once at
// startup and passed into the pricing layer explicitly; there is no
// module-level singleton.

use crate::models::{Bundle, BundleSelection, Country};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Serialized catalog shape, as produced by the ingestion pipeline
#[derive(Debug, Deserialize)]
struct CatalogFile {
    countries: Vec<Country>,
    bundles: Vec<Bundle>,
}

/// Catalog Store
///
/// Owns normalized country and bundle records and answers the one
/// question pricing needs: which bundle covers a destination for a
/// requested number of days.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    countries: HashMap<String, Country>,
    bundles: Vec<Bundle>,
}

impl CatalogStore {
    /// Build a store from already-normalized records
    pub fn from_records(countries: Vec<Country>, bundles: Vec<Bundle>) -> Self {
        let countries = countries
            .into_iter()
            .map(|country| (country.iso.clone(), country))
            .collect();
        Self { countries, bundles }
    }

    /// Load a catalog snapshot from a JSON file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read catalog file {}: {}", path.display(), e))?;
        let file: CatalogFile = serde_json::from_str(&contents)
            .map_err(|e| format!("cannot parse catalog file {}: {}", path.display(), e))?;
        Ok(Self::from_records(file.countries, file.bundles))
    }

    /// Look up a country by ISO code
    pub fn country(&self, iso: &str) -> Option<&Country> {
        self.countries.get(iso)
    }

    /// All known countries, sorted by ISO code
    pub fn countries(&self) -> Vec<&Country> {
        let mut countries: Vec<&Country> = self.countries.values().collect();
        countries.sort_by(|a, b| a.iso.cmp(&b.iso));
        countries
    }

    /// Bundles covering a destination
    pub fn bundles_for(&self, iso: &str) -> Vec<&Bundle> {
        self.bundles
            .iter()
            .filter(|bundle| bundle.countries.iter().any(|c| c == iso))
            .collect()
    }

    /// All bundles in the catalog
    pub fn bundles(&self) -> &[Bundle] {
        &self.bundles
    }

    /// Select the bundle to price for a destination and duration
    ///
    /// Picks the shortest bundle that still covers the requested
    /// duration, breaking ties on cost. Returns `None` when no covering
    /// bundle lasts long enough.
    pub fn select_bundle(&self, iso: &str, requested_days: i64) -> Option<BundleSelection> {
        let candidate = self
            .bundles_for(iso)
            .into_iter()
            .filter(|bundle| bundle.duration_days >= requested_days)
            .min_by(|a, b| {
                a.duration_days
                    .cmp(&b.duration_days)
                    .then(a.cost.cmp(&b.cost))
            })?;

        let unused_days = candidate.duration_days - requested_days;
        Some(BundleSelection {
            bundle: candidate.clone(),
            is_exact_match: unused_days == 0,
            unused_days,
        })
    }

    /// Small built-in catalog used when no catalog file is configured
    ///
    /// Keeps the service bootable in development without the ingestion
    /// pipeline running.
    pub fn demo() -> Self {
        let countries = vec![
            country("DE", "Germany", "Europe"),
            country("FR", "France", "Europe"),
            country("JP", "Japan", "Asia"),
            country("TR", "Turkey", "Europe"),
            country("UA", "Ukraine", "Europe"),
            country("US", "United States", "Americas"),
        ];

        let bundles = vec![
            bundle("esim-eu-3d-1gb", "Europe 3 Days 1GB", &["FR", "DE", "TR", "UA"], 3, "4.20", Some(1024)),
            bundle("esim-eu-7d-5gb", "Europe 7 Days 5GB", &["FR", "DE", "TR", "UA"], 7, "12.50", Some(5120)),
            bundle("esim-eu-15d-10gb", "Europe 15 Days 10GB", &["FR", "DE", "TR", "UA"], 15, "21.80", Some(10240)),
            bundle("esim-eu-30d-20gb", "Europe 30 Days 20GB", &["FR", "DE", "TR", "UA"], 30, "34.00", Some(20480)),
            bundle("esim-jp-7d-3gb", "Japan 7 Days 3GB", &["JP"], 7, "14.10", Some(3072)),
            bundle("esim-jp-15d-ul", "Japan 15 Days Unlimited", &["JP"], 15, "28.90", None),
            bundle("esim-us-7d-5gb", "USA 7 Days 5GB", &["US"], 7, "11.30", Some(5120)),
            bundle("esim-us-30d-20gb", "USA 30 Days 20GB", &["US"], 30, "29.60", Some(20480)),
        ];

        Self::from_records(countries, bundles)
    }
}

fn country(iso: &str, name: &str, region: &str) -> Country {
    Country {
        iso: iso.to_string(),
        name: name.to_string(),
        region: region.to_string(),
    }
}

fn bundle(
    id: &str,
    name: &str,
    countries: &[&str],
    duration_days: i64,
    cost: &str,
    data_amount_mb: Option<i64>,
) -> Bundle {
    Bundle {
        id: id.to_string(),
        name: name.to_string(),
        countries: countries.iter().map(|c| c.to_string()).collect(),
        duration_days,
        cost: cost.parse::<Decimal>().unwrap_or(Decimal::ZERO),
        currency: "USD".to_string(),
        data_amount_mb,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_country_lookup() {
        let catalog = CatalogStore::demo();
        assert_eq!(catalog.country("UA").unwrap().name, "Ukraine");
        assert!(catalog.country("XX").is_none());
    }

    #[test]
    fn test_countries_sorted_by_iso() {
        let catalog = CatalogStore::demo();
        let isos: Vec<&str> = catalog.countries().iter().map(|c| c.iso.as_str()).collect();

        let mut sorted = isos.clone();
        sorted.sort();
        assert_eq!(isos, sorted);
    }

    #[test]
    fn test_bundles_for_destination() {
        let catalog = CatalogStore::demo();

        let france = catalog.bundles_for("FR");
        assert!(!france.is_empty());
        assert!(france.iter().all(|b| b.countries.iter().any(|c| c == "FR")));

        assert!(catalog.bundles_for("XX").is_empty());
    }

    #[test]
    fn test_exact_duration_match() {
        let catalog = CatalogStore::demo();
        let selection = catalog.select_bundle("FR", 7).unwrap();

        assert_eq!(selection.bundle.duration_days, 7);
        assert!(selection.is_exact_match);
        assert_eq!(selection.unused_days, 0);
    }

    #[test]
    fn test_inexact_match_reports_unused_days() {
        let catalog = CatalogStore::demo();
        let selection = catalog.select_bundle("FR", 5).unwrap();

        // Shortest covering bundle is the 7-day one
        assert_eq!(selection.bundle.duration_days, 7);
        assert!(!selection.is_exact_match);
        assert_eq!(selection.unused_days, 2);
    }

    #[test]
    fn test_no_bundle_long_enough() {
        let catalog = CatalogStore::demo();
        assert!(catalog.select_bundle("JP", 60).is_none());
        assert!(catalog.select_bundle("XX", 7).is_none());
    }

    #[test]
    fn test_selection_prefers_cheaper_on_duration_tie() {
        let countries = vec![country("US", "United States", "Americas")];
        let bundles = vec![
            bundle("pricey", "Pricey 7d", &["US"], 7, "15.00", None),
            bundle("cheap", "Cheap 7d", &["US"], 7, "9.00", None),
        ];
        let catalog = CatalogStore::from_records(countries, bundles);

        let selection = catalog.select_bundle("US", 7).unwrap();
        assert_eq!(selection.bundle.id, "cheap");
        assert_eq!(selection.bundle.cost, dec!(9.00));
    }

    #[test]
    fn test_load_from_file() {
        let json = r#"
        {
            "countries": [{"iso": "US", "name": "United States", "region": "Americas"}],
            "bundles": [{
                "id": "b1",
                "name": "Test",
                "countries": ["US"],
                "duration_days": 7,
                "cost": 10.00,
                "currency": "USD",
                "data_amount_mb": 1024
            }]
        }
        "#;
        let path = std::env::temp_dir().join(format!("catalog-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, json).unwrap();

        let catalog = CatalogStore::load_from_file(&path).unwrap();
        assert_eq!(catalog.bundles().len(), 1);
        assert!(catalog.country("US").is_some());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_from_missing_file_errors() {
        assert!(CatalogStore::load_from_file("/nonexistent/catalog.json").is_err());
    }
}
