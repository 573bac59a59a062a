//! Fee and profitability logic lives here.

pub mod classifier;
pub mod entities;
pub mod error;
pub mod fees;
pub mod profitability;
pub mod schedule;
pub mod settings;

pub use classifier::is_oversized;
pub use entities::{
    BreakEvenAnalysis, BreakEvenPoint, CalculationOptions, CalculationWarning, CategoryInsight,
    FbaCalculation, FeeBreakdown, MonthlyFeeEstimate, PricingInput, ProductDimensions,
};
pub use error::{CalculationError, ScheduleError};
pub use fees::{current_month, round_cents, FeeCalculator};
pub use profitability::{break_even_price, category_insights, recommended_price};
pub use schedule::FeeSchedule;
pub use settings::CalculatorSettings;
