//! Itemized export logistics quotes.
//!
//! The [`domain`] layer is pure: rate tables go in, a [`LogisticsQuote`] or a
//! [`QuoteError`] comes out. The [`infra`] layer supplies the exchange rate the
//! calculator consumes.

pub mod domain;
pub mod infra;
pub mod util;

pub use domain::{
    compute_quote, render_quotation, ContainerType, Incoterms, LogisticsCalculator,
    LogisticsQuote, QuoteError, RateTables, ShipmentQuoteRequest,
};
