// Strategy Store
//
// Manages loading, caching, and validation of pricing strategy
// definitions. Strategies come from the built-in defaults plus an
// optional JSON file; file contents are cached with a 60-second TTL so
// configuration edits show up without a restart.

use crate::pricing::{
    error::{PricingError, PricingResult},
    metrics::PerformanceMetrics,
    strategy::{builtin_strategies, PricingStrategy},
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Time-to-live for cached strategy definitions (60 seconds)
const CACHE_TTL: Duration = Duration::from_secs(60);

/// In-memory cache of strategy definitions keyed by code
#[derive(Debug)]
struct StrategyCache {
    strategies: HashMap<String, PricingStrategy>,
    loaded_at: Option<Instant>,
}

impl StrategyCache {
    fn from_builtins() -> Self {
        let mut strategies = HashMap::new();
        for strategy in builtin_strategies() {
            strategies.insert(strategy.code.clone(), strategy);
        }
        Self {
            strategies,
            loaded_at: None,
        }
    }

    fn is_stale(&self, ttl: Duration) -> bool {
        match self.loaded_at {
            Some(loaded_at) => loaded_at.elapsed() > ttl,
            None => true, // Never loaded from the source, so it's stale
        }
    }
}

/// Strategy Store
///
/// Serves read-only strategy definitions to the engine. The built-in
/// strategies are always available; a configured JSON file can add new
/// strategies or override built-in codes.
pub struct StrategyStore {
    source: Option<PathBuf>,
    cache: RwLock<StrategyCache>,
    cache_ttl: Duration,
    metrics: Option<Arc<PerformanceMetrics>>,
}

impl StrategyStore {
    /// Create a store serving only the built-in strategies
    pub fn new() -> Self {
        Self {
            source: None,
            cache: RwLock::new(StrategyCache::from_builtins()),
            cache_ttl: CACHE_TTL,
            metrics: None,
        }
    }

    /// Create a store backed by a strategy definition file
    pub fn with_file(path: impl AsRef<Path>) -> Self {
        Self {
            source: Some(path.as_ref().to_path_buf()),
            cache: RwLock::new(StrategyCache::from_builtins()),
            cache_ttl: CACHE_TTL,
            metrics: None,
        }
    }

    /// Attach metrics tracking for cache hits and misses
    pub fn with_metrics(mut self, metrics: Arc<PerformanceMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    fn record_cache_hit(&self) {
        if let Some(ref metrics) = self.metrics {
            metrics.record_cache_hit();
        }
    }

    fn record_cache_miss(&self) {
        if let Some(ref metrics) = self.metrics {
            metrics.record_cache_miss();
        }
    }

    /// Load a strategy by code
    ///
    /// Fails with `StrategyNotFound` (carrying the code verbatim) when
    /// neither the file nor the built-ins define it.
    pub async fn load(&self, code: &str) -> PricingResult<PricingStrategy> {
        self.refresh_if_stale().await?;

        let cache = self.cache.read().await;
        cache
            .strategies
            .get(code)
            .cloned()
            .ok_or_else(|| PricingError::StrategyNotFound(code.to_string()))
    }

    /// Codes of every known strategy, sorted for stable output
    pub async fn strategy_codes(&self) -> PricingResult<Vec<String>> {
        self.refresh_if_stale().await?;

        let cache = self.cache.read().await;
        let mut codes: Vec<String> = cache.strategies.keys().cloned().collect();
        codes.sort();
        Ok(codes)
    }

    /// Pre-load the strategy file on startup to avoid cold-start latency
    pub async fn warm(&self) -> PricingResult<usize> {
        self.refresh_if_stale().await?;

        let cache = self.cache.read().await;
        tracing::info!(
            strategies = cache.strategies.len(),
            "strategy store warmed"
        );
        Ok(cache.strategies.len())
    }

    /// Force the next access to reload from the source file
    pub async fn invalidate(&self) {
        let mut cache = self.cache.write().await;
        cache.loaded_at = None;
    }

    /// Refresh the cache from the source file if the TTL has expired
    async fn refresh_if_stale(&self) -> PricingResult<()> {
        let source = match &self.source {
            Some(source) => source,
            // Built-ins never go stale
            None => return Ok(()),
        };

        // Fast path with a read lock
        {
            let cache = self.cache.read().await;
            if !cache.is_stale(self.cache_ttl) {
                self.record_cache_hit();
                return Ok(());
            }
        }

        self.record_cache_miss();

        let mut cache = self.cache.write().await;

        // Double-check after acquiring the write lock (another task may
        // have refreshed in between)
        if !cache.is_stale(self.cache_ttl) {
            return Ok(());
        }

        let loaded = Self::load_from_file(source).await?;

        let mut strategies = StrategyCache::from_builtins().strategies;
        for strategy in loaded {
            strategies.insert(strategy.code.clone(), strategy);
        }

        tracing::debug!(
            file = %source.display(),
            strategies = strategies.len(),
            "reloaded strategy definitions"
        );

        cache.strategies = strategies;
        cache.loaded_at = Some(Instant::now());

        Ok(())
    }

    /// Read and validate strategy definitions from a JSON file
    async fn load_from_file(path: &Path) -> PricingResult<Vec<PricingStrategy>> {
        let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
            PricingError::InvalidStrategyConfig(format!(
                "cannot read strategy file {}: {}",
                path.display(),
                e
            ))
        })?;

        let strategies: Vec<PricingStrategy> = serde_json::from_str(&contents)?;

        for strategy in &strategies {
            validate_strategy(strategy)?;
        }

        Ok(strategies)
    }
}

impl Default for StrategyStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Structural validation of a loaded strategy
///
/// The engine separately rejects strategies whose enabled bindings are
/// empty at evaluation time; this catches definitions that could never
/// be meaningful.
fn validate_strategy(strategy: &PricingStrategy) -> PricingResult<()> {
    if strategy.code.trim().is_empty() {
        return Err(PricingError::InvalidStrategyConfig(
            "strategy code must not be empty".to_string(),
        ));
    }
    if strategy.currency.trim().is_empty() {
        return Err(PricingError::InvalidStrategyConfig(format!(
            "strategy '{}' has an empty currency",
            strategy.code
        )));
    }
    if strategy.bindings.is_empty() {
        return Err(PricingError::InvalidStrategyConfig(format!(
            "strategy '{}' has no block bindings",
            strategy.code
        )));
    }
    for binding in &strategy.bindings {
        if binding.block.name.trim().is_empty() {
            return Err(PricingError::InvalidStrategyConfig(format!(
                "strategy '{}' binds a block with an empty name",
                strategy.code
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::strategy::{default_strategy, DEFAULT_STRATEGY_CODE};

    #[tokio::test]
    async fn test_builtin_default_strategy_loads() {
        let store = StrategyStore::new();
        let strategy = store.load(DEFAULT_STRATEGY_CODE).await.unwrap();
        assert_eq!(strategy.code, DEFAULT_STRATEGY_CODE);
        assert!(!strategy.bindings.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_code_is_strategy_not_found() {
        let store = StrategyStore::new();
        let result = store.load("black-friday").await;
        assert!(matches!(
            result,
            Err(PricingError::StrategyNotFound(code)) if code == "black-friday"
        ));
    }

    #[tokio::test]
    async fn test_strategy_codes_sorted() {
        let store = StrategyStore::new();
        let codes = store.strategy_codes().await.unwrap();
        assert!(codes.contains(&DEFAULT_STRATEGY_CODE.to_string()));

        let mut sorted = codes.clone();
        sorted.sort();
        assert_eq!(codes, sorted);
    }

    #[tokio::test]
    async fn test_file_strategies_merge_over_builtins() {
        let mut extra = default_strategy();
        extra.code = "promo-pricing".to_string();

        let path = std::env::temp_dir().join(format!("strategies-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, serde_json::to_string(&vec![extra]).unwrap()).unwrap();

        let store = StrategyStore::with_file(&path);
        let strategy = store.load("promo-pricing").await.unwrap();
        assert_eq!(strategy.code, "promo-pricing");

        // Built-ins remain available alongside the file contents
        assert!(store.load(DEFAULT_STRATEGY_CODE).await.is_ok());

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_missing_file_is_config_error() {
        let store = StrategyStore::with_file("/nonexistent/strategies.json");
        let result = store.load(DEFAULT_STRATEGY_CODE).await;
        assert!(matches!(
            result,
            Err(PricingError::InvalidStrategyConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_warm_reports_count() {
        let store = StrategyStore::new();
        let count = store.warm().await.unwrap();
        assert!(count >= 1);
    }

    #[test]
    fn test_validation_rejects_empty_bindings() {
        let strategy = PricingStrategy::new("empty");
        let result = validate_strategy(&strategy);
        assert!(matches!(
            result,
            Err(PricingError::InvalidStrategyConfig(_))
        ));
    }

    #[test]
    fn test_validation_accepts_default() {
        assert!(validate_strategy(&default_strategy()).is_ok());
    }

    #[test]
    fn test_cache_staleness() {
        let cache = StrategyCache::from_builtins();
        assert!(cache.is_stale(Duration::from_secs(60)));

        let cache = StrategyCache {
            strategies: HashMap::new(),
            loaded_at: Some(Instant::now()),
        };
        assert!(!cache.is_stale(Duration::from_secs(60)));
        assert!(cache.is_stale(Duration::from_secs(0)));
    }
}
