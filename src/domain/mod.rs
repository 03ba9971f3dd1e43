//! Quote domain: rate tables, the calculator and its value types.

pub mod calculator;
pub mod entities;
pub mod error;
pub mod money;
pub mod rate_tables;
pub mod summary;

pub use calculator::{
    compute_quote, normalize, revenue_tons, validate, LogisticsCalculator, NormalizedRequest,
    ValidatedRates,
};
pub use entities::{
    ChargeLine, ContainerType, CurrencyValue, DualAmount, Incoterms, LocalAmount, LogisticsQuote,
    PortChargeItem, PortCharges, ShipmentQuoteRequest, DEFAULT_MARGIN_PERCENT,
};
pub use error::QuoteError;
pub use money::{format_local, format_usd, LocalCurrency};
pub use rate_tables::{PortChargeRate, RateTables, DEFAULT_EXCHANGE_RATE};
pub use summary::render_quotation;
