use thiserror::Error;

use super::entities::ContainerType;

/// Reasons a quote cannot be produced. None of them is retryable.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum QuoteError {
    #[error("LCL requires CBM or weight")]
    InvalidCargoSpec,
    #[error("CIF requires cargo value")]
    MissingCargoValue,
    #[error("unsupported lane: {departure_port} -> {destination_port} ({container_type})")]
    UnsupportedLane {
        departure_port: String,
        destination_port: String,
        container_type: ContainerType,
    },
    #[error("no inland transport rate from {departure_city} to {departure_port}")]
    UnsupportedInlandRoute {
        departure_city: String,
        departure_port: String,
    },
}

impl QuoteError {
    /// Stable variant name for machine-readable output.
    pub fn kind(&self) -> &'static str {
        match self {
            QuoteError::InvalidCargoSpec => "InvalidCargoSpec",
            QuoteError::MissingCargoValue => "MissingCargoValue",
            QuoteError::UnsupportedLane { .. } => "UnsupportedLane",
            QuoteError::UnsupportedInlandRoute { .. } => "UnsupportedInlandRoute",
        }
    }
}
