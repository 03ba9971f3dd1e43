//! Asynchronous client for the public USD exchange-rate feeds.
//!
//! - Tries each provider in priority order, each bounded by a timeout.
//! - Keeps the last good snapshot in memory (1 hour TTL) and on disk.
//! - Never fails: when everything is down it answers with fixed fallback rates.

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::Arc,
    time::{Duration, SystemTime},
};

use reqwest::{Client, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime};
use tokio::{sync::Mutex, task::JoinSet};
use tracing::{debug, info, warn};

use crate::infra::cache::{
    default_cache_path, load_rate_cache, save_rate_cache, RateCache, RATE_CACHE_TTL,
};
use crate::util::version::user_agent;

const CURRENCY_API_URL: &str =
    "https://cdn.jsdelivr.net/npm/@fawazahmed0/currency-api@latest/v1/currencies/usd.json";
const CURRENCY_API_MIRROR_URL: &str = "https://latest.currency-api.pages.dev/v1/currencies/usd.json";
const OPEN_ER_API_URL: &str = "https://open.er-api.com/v6/latest/USD";
const HISTORY_URL_TEMPLATE: &str =
    "https://cdn.jsdelivr.net/npm/@fawazahmed0/currency-api@{date}/v1/currencies/usd.json";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_HISTORY_DAYS: u32 = 30;
/// Longer requests are cut to one year of daily points.
pub const MAX_HISTORY_DAYS: u32 = 365;

pub const FALLBACK_SOURCE: &str = "fallback";
pub const FALLBACK_RATES: ExchangeRates = ExchangeRates {
    usd: 1450.0,
    eur: 1550.0,
    jpy_100: 950.0,
    cny: 198.0,
};

#[derive(Debug, Error)]
pub enum ExchangeRateError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("payload is missing the {0} quote")]
    MissingCurrency(&'static str),
    #[error("{currency} quote must be positive, got {value}")]
    InvalidRate { currency: &'static str, value: f64 },
}

/// Local-currency (KRW) units per one unit of each foreign currency.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRates {
    #[serde(rename = "USD")]
    pub usd: f64,
    #[serde(rename = "EUR")]
    pub eur: f64,
    /// Quoted per 100 yen.
    #[serde(rename = "JPY")]
    pub jpy_100: f64,
    #[serde(rename = "CNY")]
    pub cny: f64,
}

impl ExchangeRates {
    /// Cross rates from a USD-based quote table (`1 USD = x KRW`, `1 USD = y EUR`, ...).
    pub fn from_usd_quotes(
        krw: Option<f64>,
        eur: Option<f64>,
        jpy: Option<f64>,
        cny: Option<f64>,
    ) -> Result<Self, ExchangeRateError> {
        let krw = positive("KRW", krw)?;
        let eur = positive("EUR", eur)?;
        let jpy = positive("JPY", jpy)?;
        let cny = positive("CNY", cny)?;

        Ok(Self {
            usd: round2(krw),
            eur: round2(krw / eur),
            jpy_100: round2(krw / jpy * 100.0),
            cny: round2(krw / cny),
        })
    }
}

fn positive(currency: &'static str, value: Option<f64>) -> Result<f64, ExchangeRateError> {
    let value = value.ok_or(ExchangeRateError::MissingCurrency(currency))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ExchangeRateError::InvalidRate { currency, value })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// JSON layout a provider answers with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadShape {
    /// `{ "usd": { "krw": .., "eur": .. } }`
    CurrencyApi,
    /// `{ "rates": { "KRW": .., "EUR": .. } }`
    OpenErApi,
}

#[derive(Clone, Debug)]
pub struct RateProvider {
    pub label: String,
    pub url: Url,
    pub shape: PayloadShape,
}

impl RateProvider {
    pub fn new(label: &str, url: &str, shape: PayloadShape) -> Result<Self, ExchangeRateError> {
        Ok(Self {
            label: label.to_string(),
            url: Url::parse(url)?,
            shape,
        })
    }

    /// Public feeds in priority order.
    pub fn defaults() -> Result<Vec<Self>, ExchangeRateError> {
        Ok(vec![
            Self::new("fawazahmed0", CURRENCY_API_URL, PayloadShape::CurrencyApi)?,
            Self::new(
                "fawazahmed0-fallback",
                CURRENCY_API_MIRROR_URL,
                PayloadShape::CurrencyApi,
            )?,
            Self::new("open-er-api", OPEN_ER_API_URL, PayloadShape::OpenErApi)?,
        ])
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    Fresh,
    Cached,
    Stale,
    Fallback,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RateSnapshot {
    pub rates: ExchangeRates,
    pub source: String,
    pub fetched_at: SystemTime,
    pub status: CacheStatus,
}

impl RateSnapshot {
    fn fallback() -> Self {
        Self {
            rates: FALLBACK_RATES,
            source: FALLBACK_SOURCE.to_string(),
            fetched_at: SystemTime::now(),
            status: CacheStatus::Fallback,
        }
    }

    pub fn timestamp(&self) -> String {
        OffsetDateTime::from(self.fetched_at)
            .format(&Rfc3339)
            .unwrap_or_default()
    }
}

/// One day of the rate history.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistoryPoint {
    pub date: String,
    #[serde(flatten)]
    pub rates: ExchangeRates,
}

struct Cached {
    rates: ExchangeRates,
    source: String,
    fetched_at: SystemTime,
}

impl Cached {
    fn if_fresh(&self, ttl: Duration) -> Option<RateSnapshot> {
        if self
            .fetched_at
            .elapsed()
            .map(|elapsed| elapsed < ttl)
            .unwrap_or(false)
        {
            Some(self.snapshot(CacheStatus::Cached))
        } else {
            None
        }
    }

    fn snapshot(&self, status: CacheStatus) -> RateSnapshot {
        RateSnapshot {
            rates: self.rates,
            source: self.source.clone(),
            fetched_at: self.fetched_at,
            status,
        }
    }
}

#[derive(Clone)]
pub struct ExchangeRateClient {
    http: Client,
    providers: Vec<RateProvider>,
    history_url: String,
    cache: Arc<Mutex<Option<Cached>>>,
    ttl: Duration,
    timeout: Duration,
    disk_cache: Option<PathBuf>,
}

impl ExchangeRateClient {
    pub fn new() -> Result<Self, ExchangeRateError> {
        Self::with_providers(RateProvider::defaults()?)
    }

    pub fn with_providers(providers: Vec<RateProvider>) -> Result<Self, ExchangeRateError> {
        let http = Client::builder().user_agent(user_agent()).build()?;
        Ok(Self {
            http,
            providers,
            history_url: HISTORY_URL_TEMPLATE.to_string(),
            cache: Arc::new(Mutex::new(None)),
            ttl: RATE_CACHE_TTL,
            timeout: DEFAULT_TIMEOUT,
            disk_cache: Some(default_cache_path()),
        })
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `None` disables the on-disk snapshot entirely.
    pub fn with_disk_cache(mut self, path: Option<PathBuf>) -> Self {
        self.disk_cache = path;
        self
    }

    /// Day-pinned feed URL; `{date}` is replaced with `YYYY-MM-DD`.
    pub fn with_history_url(mut self, template: impl Into<String>) -> Self {
        self.history_url = template.into();
        self
    }

    /// Latest rates from the first provider that answers.
    pub async fn latest(&self) -> RateSnapshot {
        if let Some(snapshot) = self.cached_fresh().await {
            debug!(source = %snapshot.source, "serving cached exchange rates");
            return snapshot;
        }

        for provider in &self.providers {
            match self.fetch_provider(provider).await {
                Ok(rates) => {
                    info!(source = %provider.label, usd = rates.usd, "fetched exchange rates");
                    return self.store(&provider.label, rates).await;
                }
                Err(error) => {
                    warn!(
                        source = %provider.label,
                        url = %provider.url,
                        %error,
                        "exchange-rate provider failed, trying next"
                    );
                }
            }
        }

        if let Some(stale) = self.cached_stale().await {
            warn!(source = %stale.source, "all providers failed, serving stale in-memory rates");
            return stale;
        }

        if let Some(disk) = self.load_disk_cache().await {
            let status = if disk.is_expired(self.ttl) {
                CacheStatus::Stale
            } else {
                CacheStatus::Cached
            };
            warn!(
                source = %disk.source,
                age = %disk.age_string(),
                ?status,
                "all providers failed, serving rates cached on disk"
            );
            return RateSnapshot {
                rates: disk.rates,
                source: disk.source.clone(),
                fetched_at: disk.fetched_at(),
                status,
            };
        }

        warn!("all providers failed, using fixed fallback rates");
        RateSnapshot::fallback()
    }

    /// Rates for each of the last `days` days (ending yesterday, UTC), oldest first.
    /// Days the feed has no data for are skipped. At most [`MAX_HISTORY_DAYS`] are fetched.
    pub async fn history(&self, days: u32) -> Vec<HistoryPoint> {
        let days = days.min(MAX_HISTORY_DAYS);
        let today = OffsetDateTime::now_utc().date();
        let mut tasks = JoinSet::new();

        for offset in 1..=i64::from(days) {
            let Some(date) = today.checked_sub(time::Duration::days(offset)) else {
                continue;
            };
            let label = format_date(date);
            let url = self.history_url.replace("{date}", &label);
            let request = self.http.get(url).timeout(self.timeout);
            tasks.spawn(async move {
                let result = fetch_json::<CurrencyApiBody>(request)
                    .await
                    .and_then(CurrencyApiBody::into_rates);
                (label, result)
            });
        }

        let mut history = Vec::with_capacity(days as usize);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((date, Ok(rates))) => history.push(HistoryPoint { date, rates }),
                Ok((date, Err(error))) => debug!(%date, %error, "no history for day"),
                Err(error) => warn!(%error, "history task aborted"),
            }
        }

        history.sort_by(|a, b| a.date.cmp(&b.date));
        history
    }

    async fn fetch_provider(&self, provider: &RateProvider) -> Result<ExchangeRates, ExchangeRateError> {
        let request = self.http.get(provider.url.clone()).timeout(self.timeout);
        match provider.shape {
            PayloadShape::CurrencyApi => fetch_json::<CurrencyApiBody>(request).await?.into_rates(),
            PayloadShape::OpenErApi => fetch_json::<OpenErApiBody>(request).await?.into_rates(),
        }
    }

    async fn cached_fresh(&self) -> Option<RateSnapshot> {
        let cache = self.cache.lock().await;
        cache.as_ref().and_then(|entry| entry.if_fresh(self.ttl))
    }

    async fn cached_stale(&self) -> Option<RateSnapshot> {
        let cache = self.cache.lock().await;
        cache.as_ref().map(|entry| entry.snapshot(CacheStatus::Stale))
    }

    async fn store(&self, source: &str, rates: ExchangeRates) -> RateSnapshot {
        let entry = Cached {
            rates,
            source: source.to_string(),
            fetched_at: SystemTime::now(),
        };
        let snapshot = entry.snapshot(CacheStatus::Fresh);
        *self.cache.lock().await = Some(entry);

        if let Some(path) = self.disk_cache.clone() {
            let cache = RateCache::new(source, rates);
            let written = tokio::task::spawn_blocking(move || {
                if let Err(error) = save_rate_cache(&path, &cache) {
                    warn!(path = %path.display(), %error, "failed to save exchange-rate cache");
                }
            })
            .await;
            if let Err(error) = written {
                warn!(%error, "exchange-rate cache writer aborted");
            }
        }

        snapshot
    }

    async fn load_disk_cache(&self) -> Option<RateCache> {
        let path = self.disk_cache.clone()?;
        match tokio::task::spawn_blocking(move || load_rate_cache(&path)).await {
            Ok(cache) => cache,
            Err(error) => {
                warn!(%error, "exchange-rate cache reader aborted");
                None
            }
        }
    }
}

async fn fetch_json<T>(request: reqwest::RequestBuilder) -> Result<T, ExchangeRateError>
where
    T: DeserializeOwned,
{
    let response = request.send().await?.error_for_status()?;
    Ok(response.json().await?)
}

fn format_date(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string())
}

#[derive(Debug, Deserialize)]
struct CurrencyApiBody {
    usd: CurrencyApiQuotes,
}

#[derive(Debug, Deserialize)]
struct CurrencyApiQuotes {
    #[serde(default)]
    krw: Option<f64>,
    #[serde(default)]
    eur: Option<f64>,
    #[serde(default)]
    jpy: Option<f64>,
    #[serde(default)]
    cny: Option<f64>,
}

impl CurrencyApiBody {
    fn into_rates(self) -> Result<ExchangeRates, ExchangeRateError> {
        let q = self.usd;
        ExchangeRates::from_usd_quotes(q.krw, q.eur, q.jpy, q.cny)
    }
}

#[derive(Debug, Deserialize)]
struct OpenErApiBody {
    rates: HashMap<String, f64>,
}

impl OpenErApiBody {
    fn into_rates(self) -> Result<ExchangeRates, ExchangeRateError> {
        let quote = |code: &str| self.rates.get(code).copied();
        ExchangeRates::from_usd_quotes(quote("KRW"), quote("EUR"), quote("JPY"), quote("CNY"))
    }
}
