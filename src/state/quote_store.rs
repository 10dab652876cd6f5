use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{info, warn};

use crate::engine::value;
use crate::error::Result;
use crate::loader::{self, LoadStats};
use crate::types::{Quote, ValueBetResult};

/// Owns the normalized quote set and the value-bet table behind read-through
/// caches. Loading goes through [`loader`]; everything downstream only ever
/// sees already-materialized in-memory record sets.
///
/// Concurrent first reads may race the populate and both load; that is fine —
/// the computation is deterministic and side-effect-free, so the last writer
/// overwrites with an equivalent value. [`invalidate`] clears both caches so
/// the next read reloads from source.
///
/// [`invalidate`]: QuoteStore::invalidate
pub struct QuoteStore {
    raw_source: String,
    top_bets_source: String,
    quotes: RwLock<Option<Arc<Vec<Quote>>>>,
    value_bets: RwLock<Option<Arc<Vec<ValueBetResult>>>>,
    last_stats: RwLock<Option<LoadStats>>,
    /// True when the cached value-bet table came from the precomputed source
    /// rather than the raw-quote fallback.
    precomputed: AtomicBool,
}

impl QuoteStore {
    pub fn new(raw_source: String, top_bets_source: String) -> Arc<Self> {
        Arc::new(Self {
            raw_source,
            top_bets_source,
            quotes: RwLock::new(None),
            value_bets: RwLock::new(None),
            last_stats: RwLock::new(None),
            precomputed: AtomicBool::new(false),
        })
    }

    /// The normalized quote set; loads from source on first access.
    pub async fn quotes(&self) -> Result<Arc<Vec<Quote>>> {
        if let Some(cached) = read_cache(&self.quotes) {
            return Ok(cached);
        }

        let (quotes, stats) = loader::load_quotes(&self.raw_source).await?;
        info!(
            "Loaded {} quotes from {} CSV rows ({})",
            stats.qualified, stats.csv_total, self.raw_source,
        );
        info!(
            "[LOADER] rejected: malformed={} missing_field={} bad_point={} bad_price={} label={}",
            stats.rejected_malformed,
            stats.rejected_missing_field,
            stats.rejected_bad_point,
            stats.rejected_bad_price,
            stats.rejected_label,
        );

        let quotes = Arc::new(quotes);
        write_cache(&self.quotes, quotes.clone());
        *self.last_stats.write().unwrap_or_else(PoisonError::into_inner) = Some(stats);
        Ok(quotes)
    }

    /// The ranked value-bet table.
    ///
    /// Serves the precomputed source when it loads and is non-empty; a
    /// missing or unreadable table falls back to deriving the same ranking
    /// from raw quotes — recoverable by design, logged at warn only.
    pub async fn value_bets(&self) -> Result<Arc<Vec<ValueBetResult>>> {
        if let Some(cached) = read_cache(&self.value_bets) {
            return Ok(cached);
        }

        let (results, precomputed) = match loader::load_top_bets(&self.top_bets_source).await {
            Ok(rows) if !rows.is_empty() => {
                info!(
                    "Loaded {} precomputed value bets from {}",
                    rows.len(),
                    self.top_bets_source,
                );
                (rows, true)
            }
            Ok(_) => {
                warn!(
                    "Precomputed table {} is empty — computing value bets from raw quotes",
                    self.top_bets_source,
                );
                (value::top_value_bets(&self.quotes().await?), false)
            }
            Err(e) => {
                warn!(
                    "Precomputed table {} unavailable ({e}) — computing value bets from raw quotes",
                    self.top_bets_source,
                );
                (value::top_value_bets(&self.quotes().await?), false)
            }
        };

        let results = Arc::new(results);
        write_cache(&self.value_bets, results.clone());
        self.precomputed.store(precomputed, Ordering::Relaxed);
        Ok(results)
    }

    /// Clear both caches; the next access reloads from source.
    pub fn invalidate(&self) {
        *self.quotes.write().unwrap_or_else(PoisonError::into_inner) = None;
        *self.value_bets.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.precomputed.store(false, Ordering::Relaxed);
    }

    /// Quote count without triggering a load. None when nothing is cached.
    pub fn cached_quote_count(&self) -> Option<usize> {
        read_cache(&self.quotes).map(|q| q.len())
    }

    pub fn precomputed_loaded(&self) -> bool {
        self.precomputed.load(Ordering::Relaxed)
    }

    pub fn last_load_stats(&self) -> Option<LoadStats> {
        self.last_stats
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn read_cache<T>(lock: &RwLock<Option<Arc<T>>>) -> Option<Arc<T>> {
    lock.read().unwrap_or_else(PoisonError::into_inner).clone()
}

fn write_cache<T>(lock: &RwLock<Option<Arc<T>>>, value: Arc<T>) {
    *lock.write().unwrap_or_else(PoisonError::into_inner) = Some(value);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp_csv(dir: &std::path::Path, name: &str, contents: &str) -> String {
        let path = dir.join(name);
        std::fs::write(&path, contents).expect("write temp csv");
        path.to_string_lossy().into_owned()
    }

    fn raw_csv() -> String {
        let header = "home_team,away_team,description,market,label,point,bookmaker,price\n";
        let mut rows = String::from(header);
        // One cohort of 10: nine at 1.5 and one outlier at 5.0.
        for i in 0..9 {
            rows.push_str(&format!(
                "Lakers,Celtics,LeBron James,player_points,Over,25.5,book{i},1.5\n"
            ));
        }
        rows.push_str("Lakers,Celtics,LeBron James,player_points,Over,25.5,book9,5.0\n");
        rows
    }

    #[tokio::test]
    async fn quotes_are_cached_until_invalidated() {
        let dir = std::env::temp_dir().join("fairodds_store_cache_test");
        std::fs::create_dir_all(&dir).expect("temp dir");
        let raw = write_temp_csv(&dir, "raw_cache.csv", &raw_csv());
        let store = QuoteStore::new(raw.clone(), "missing_top_bets.csv".to_string());

        assert_eq!(store.cached_quote_count(), None);
        let first = store.quotes().await.expect("load");
        assert_eq!(first.len(), 10);
        assert_eq!(store.cached_quote_count(), Some(10));

        // Second read hits the cache even after the file disappears.
        std::fs::remove_file(&raw).expect("remove raw csv");
        let second = store.quotes().await.expect("cached read");
        assert!(Arc::ptr_eq(&first, &second));

        store.invalidate();
        assert_eq!(store.cached_quote_count(), None);
        assert!(store.quotes().await.is_err(), "reload after invalidate hits the source");
    }

    #[tokio::test]
    async fn missing_precomputed_table_falls_back_to_raw_quotes() {
        let dir = std::env::temp_dir().join("fairodds_store_fallback_test");
        std::fs::create_dir_all(&dir).expect("temp dir");
        let raw = write_temp_csv(&dir, "raw_fallback.csv", &raw_csv());
        let store = QuoteStore::new(raw, format!("{}/does_not_exist.csv", dir.display()));

        let bets = store.value_bets().await.expect("fallback path");
        assert_eq!(bets.len(), 1);
        assert_eq!(bets[0].bookmaker, "book9");
        assert!(!store.precomputed_loaded());
    }

    #[tokio::test]
    async fn precomputed_table_is_preferred_and_consistent_with_raw_path() {
        let dir = std::env::temp_dir().join("fairodds_store_precomputed_test");
        std::fs::create_dir_all(&dir).expect("temp dir");
        let raw = write_temp_csv(&dir, "raw_pre.csv", &raw_csv());

        // Precompute the table from the same data via the raw path first.
        let fallback_store = QuoteStore::new(raw.clone(), "missing.csv".to_string());
        let expected = fallback_store.value_bets().await.expect("raw path");

        let r = &expected[0];
        let top_csv = format!(
            "Bet,max_price,bookmaker,mean_price,threshold,sample_size,above_threshold,consensus_prob,implied_prob,prob_diff\n\
             {},{},{},{},{},{},{},{},{},{}\n",
            r.bet, r.max_price, r.bookmaker, r.mean_price, r.threshold, r.sample_size,
            r.above_threshold, r.consensus_prob, r.implied_prob, r.prob_diff,
        );
        let top = write_temp_csv(&dir, "top_pre.csv", &top_csv);

        let store = QuoteStore::new(raw, top);
        let bets = store.value_bets().await.expect("precomputed path");
        assert!(store.precomputed_loaded());
        assert_eq!(bets.as_ref(), expected.as_ref());
    }
}
