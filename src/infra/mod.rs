//! Network and disk collaborators that feed the calculator.

pub mod cache;
pub mod exchange_rate;

pub use exchange_rate::{
    CacheStatus, ExchangeRateClient, ExchangeRateError, ExchangeRates, HistoryPoint, PayloadShape,
    RateProvider, RateSnapshot, DEFAULT_HISTORY_DAYS, FALLBACK_RATES, FALLBACK_SOURCE, MAX_HISTORY_DAYS,
};
