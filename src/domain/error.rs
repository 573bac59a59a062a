use thiserror::Error;

/// Rejected calculation inputs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalculationError {
    #[error("invalid dimension {field}: {value} (must be a positive number)")]
    InvalidDimensions { field: &'static str, value: f64 },
    #[error("invalid selling price: {0} (must be a positive number)")]
    InvalidPrice(f64),
    #[error("invalid product cost: {0} (must be zero or positive)")]
    InvalidCost(f64),
    #[error("invalid {field}: {value} (must be zero or positive)")]
    InvalidQuantity { field: &'static str, value: f64 },
    #[error(
        "target margin {target_margin} plus assumed fee rate {assumed_fee_rate} leaves no room for cost"
    )]
    InvalidTargetMargin {
        target_margin: f64,
        assumed_fee_rate: f64,
    },
}

/// A fee schedule that cannot be used for calculations.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("invalid effective date \"{value}\": {source}")]
    InvalidDate {
        value: String,
        #[source]
        source: time::error::Parse,
    },
    #[error("{table}: rate for \"{key}\" is {value}, expected a fraction in [0, 1)")]
    InvalidRate {
        table: &'static str,
        key: String,
        value: f64,
    },
    #[error("{table}: amount for \"{key}\" is {value}, expected a non-negative number")]
    InvalidAmount {
        table: &'static str,
        key: String,
        value: f64,
    },
    #[error("{0}: table is empty")]
    EmptyTable(&'static str),
    #[error("{0}: band thresholds must be strictly increasing")]
    UnorderedBands(&'static str),
    #[error("{0}: last band must be open-ended")]
    MissingOpenBand(&'static str),
    #[error("peak month {0} is outside 1..=12")]
    InvalidPeakMonth(u8),
    #[error("dimensional weight divisor must be positive, got {0}")]
    InvalidDivisor(f64),
    #[error("category insights need a \"default\" entry")]
    MissingDefaultInsight,
    #[error(transparent)]
    Pricing(#[from] CalculationError),
}
