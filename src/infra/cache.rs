//! Persistent on-disk cache for the last good exchange-rate snapshot.

use std::{
    fs,
    path::{Path, PathBuf},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::exchange_rate::ExchangeRates;

const CACHE_DIR: &str = "export-logistics-quoter";
const CACHE_FILENAME: &str = "exchange_rate_cache.json";

/// How long a fetched snapshot counts as current, in memory and on disk.
pub const RATE_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateCache {
    /// Provider label of the cached snapshot.
    pub source: String,
    /// Unix timestamp (seconds) of the fetch.
    pub cached_at: u64,
    pub rates: ExchangeRates,
}

impl RateCache {
    pub fn new(source: impl Into<String>, rates: ExchangeRates) -> Self {
        let cached_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            source: source.into(),
            cached_at,
            rates,
        }
    }

    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.age() >= ttl
    }

    pub fn age(&self) -> Duration {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Duration::from_secs(now.saturating_sub(self.cached_at))
    }

    pub fn fetched_at(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(self.cached_at)
    }

    /// Human-readable age string.
    pub fn age_string(&self) -> String {
        let secs = self.age().as_secs();
        if secs < 60 {
            format!("{secs}s")
        } else if secs < 3600 {
            format!("{}m", secs / 60)
        } else if secs < 86400 {
            format!("{}h", secs / 3600)
        } else {
            format!("{}d", secs / 86400)
        }
    }
}

/// Default cache file under the user's local data directory.
pub fn default_cache_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CACHE_DIR)
        .join(CACHE_FILENAME)
}

/// Returns `None` when the file is missing or unreadable; a broken cache is never fatal.
pub fn load_rate_cache(path: &Path) -> Option<RateCache> {
    if !path.exists() {
        debug!(path = %path.display(), "no exchange-rate cache on disk");
        return None;
    }

    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<RateCache>(&content) {
            Ok(cache) => {
                debug!(
                    path = %path.display(),
                    source = %cache.source,
                    age = %cache.age_string(),
                    "loaded exchange-rate cache"
                );
                Some(cache)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to parse exchange-rate cache");
                None
            }
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read exchange-rate cache");
            None
        }
    }
}

pub fn save_rate_cache(path: &Path, cache: &RateCache) -> Result<(), CacheError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(cache)?;
    fs::write(path, content)?;
    info!(
        path = %path.display(),
        source = %cache.source,
        "saved exchange-rate cache"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rates() -> ExchangeRates {
        ExchangeRates {
            usd: 1385.5,
            eur: 1502.1,
            jpy_100: 921.4,
            cny: 191.2,
        }
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CACHE_FILENAME);
        let cache = RateCache::new("open-er-api", rates());

        save_rate_cache(&path, &cache).unwrap();
        let loaded = load_rate_cache(&path).unwrap();

        assert_eq!(loaded, cache);
        assert!(!loaded.is_expired(RATE_CACHE_TTL));
    }

    #[test]
    fn missing_or_corrupt_file_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CACHE_FILENAME);
        assert!(load_rate_cache(&path).is_none());

        fs::write(&path, "{ not json").unwrap();
        assert!(load_rate_cache(&path).is_none());
    }

    #[test]
    fn old_snapshot_is_expired() {
        let mut cache = RateCache::new("fawazahmed0", rates());
        cache.cached_at -= 2 * 60 * 60;
        assert!(cache.is_expired(RATE_CACHE_TTL));
        assert!(!cache.is_expired(Duration::from_secs(3 * 60 * 60)));
        assert_eq!(cache.age_string(), "2h");
    }
}
