//! Amazon FBA fee and profitability calculator.
//!
//! The fee schedule is plain data ([`domain::FeeSchedule`]) loaded from the
//! embedded 2024 table or a JSON file; [`domain::FeeCalculator`] borrows it and
//! turns pricing inputs into fee breakdowns and profit projections.

pub mod domain;
pub mod infra;
pub mod util;

pub use domain::{
    break_even_price, category_insights, is_oversized, recommended_price, BreakEvenAnalysis,
    BreakEvenPoint, CalculationError, CalculationOptions, CalculationWarning, CategoryInsight,
    FbaCalculation, FeeBreakdown, FeeCalculator, FeeSchedule, MonthlyFeeEstimate,
    PricingInput, ProductDimensions, ScheduleError,
};
pub use infra::{load_default_schedule, load_schedule_file, ScheduleLoadError, ScheduleSource};
