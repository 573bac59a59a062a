use std::fmt;

use serde::{Deserialize, Serialize};
use time::Month;

use super::error::CalculationError;

/// Cubic inches per cubic foot.
pub const CUBIC_INCHES_PER_FOOT: f64 = 1728.0;

/// Package dimensions in inches and weight in pounds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductDimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub weight: f64,
}

impl ProductDimensions {
    pub fn new(length: f64, width: f64, height: f64, weight: f64) -> Self {
        Self {
            length,
            width,
            height,
            weight,
        }
    }

    /// Package volume in cubic inches.
    pub fn volume(&self) -> f64 {
        self.length * self.width * self.height
    }

    pub fn cubic_feet(&self) -> f64 {
        self.volume() / CUBIC_INCHES_PER_FOOT
    }

    /// Every field must be finite and strictly positive.
    pub fn validate(&self) -> Result<(), CalculationError> {
        let fields = [
            ("length", self.length),
            ("width", self.width),
            ("height", self.height),
            ("weight", self.weight),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(CalculationError::InvalidDimensions { field, value });
            }
        }
        Ok(())
    }
}

/// Everything a caller knows about a listing before fees are applied.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricingInput {
    pub selling_price: f64,
    pub product_cost: f64,
    pub category: String,
    pub dimensions: ProductDimensions,
}

impl PricingInput {
    pub fn new(
        selling_price: f64,
        product_cost: f64,
        category: impl Into<String>,
        dimensions: ProductDimensions,
    ) -> Self {
        Self {
            selling_price,
            product_cost,
            category: category.into(),
            dimensions,
        }
    }

    pub fn validate(&self) -> Result<(), CalculationError> {
        if !self.selling_price.is_finite() || self.selling_price <= 0.0 {
            return Err(CalculationError::InvalidPrice(self.selling_price));
        }
        if !self.product_cost.is_finite() || self.product_cost < 0.0 {
            return Err(CalculationError::InvalidCost(self.product_cost));
        }
        self.dimensions.validate()
    }
}

/// Per-call switches. `month` defaults to the current UTC month.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CalculationOptions {
    pub month: Option<Month>,
    /// Forces the oversized tables even when the dimensions fit standard size.
    pub is_oversized: bool,
    /// Adds the surcharge for inventory stored beyond 365 days.
    pub long_term_storage: bool,
    pub include_returns: bool,
    /// Overrides the schedule's target margin for the recommended price.
    pub target_margin: Option<f64>,
}

impl Default for CalculationOptions {
    fn default() -> Self {
        Self {
            month: None,
            is_oversized: false,
            long_term_storage: false,
            include_returns: true,
            target_margin: None,
        }
    }
}

impl CalculationOptions {
    pub fn for_month(month: Month) -> Self {
        Self {
            month: Some(month),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeeBreakdown {
    pub referral_fee: f64,
    pub fulfillment_fee: f64,
    pub storage_fee: f64,
    pub long_term_storage_fee: f64,
    pub return_processing_fee: f64,
    pub inbound_defect_fee: f64,
    pub total_fees: f64,
    pub fee_percentage: f64,
    pub net_profit: f64,
}

/// A fallback the calculator applied instead of failing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalculationWarning {
    /// The category has no referral rate; default referral and return rates were used.
    UnknownCategory { category: String },
}

impl fmt::Display for CalculationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCategory { category } => {
                write!(f, "unknown category \"{category}\", default rates applied")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FbaCalculation {
    pub selling_price: f64,
    pub product_cost: f64,
    pub fees: FeeBreakdown,
    pub profit_margin: f64,
    /// `None` when the product cost is zero.
    pub roi: Option<f64>,
    pub break_even_price: f64,
    pub recommended_price: f64,
    /// Effective size tier used for fulfillment and storage.
    pub oversized: bool,
    pub warnings: Vec<CalculationWarning>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryInsight {
    /// Percent of units returned.
    pub average_return_rate: f64,
    /// Typical margin percent sellers in the category run at.
    pub competitive_margin: f64,
    pub seasonal_factors: Vec<String>,
    pub pricing_tips: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MonthlyFeeEstimate {
    pub total_monthly_fees: f64,
    pub per_unit_fees: f64,
    pub storage_fees: f64,
    pub fulfillment_fees: f64,
    /// `None` when there is no inventory on hand.
    pub inventory_turnover: Option<f64>,
    /// `None` when there is no inventory on hand.
    pub carrying_cost: Option<f64>,
    pub warnings: Vec<CalculationWarning>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BreakEvenPoint {
    pub price: f64,
    pub margin: f64,
    pub net_profit: f64,
    /// `None` when the price point never recoups the fixed costs.
    pub units_to_break_even: Option<u64>,
    pub monthly_break_even: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BreakEvenAnalysis {
    pub price_points: Vec<BreakEvenPoint>,
    pub warnings: Vec<CalculationWarning>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_and_cubic_feet() {
        let dims = ProductDimensions::new(12.0, 12.0, 12.0, 1.0);
        assert_eq!(dims.volume(), 1728.0);
        assert_eq!(dims.cubic_feet(), 1.0);
    }

    #[test]
    fn rejects_non_positive_dimensions() {
        let dims = ProductDimensions::new(6.0, 0.0, 3.0, 0.5);
        assert_eq!(
            dims.validate(),
            Err(CalculationError::InvalidDimensions {
                field: "width",
                value: 0.0
            })
        );

        let dims = ProductDimensions::new(6.0, 4.0, 3.0, -1.0);
        assert!(matches!(
            dims.validate(),
            Err(CalculationError::InvalidDimensions { field: "weight", .. })
        ));
    }

    #[test]
    fn rejects_nan_dimensions() {
        let dims = ProductDimensions::new(f64::NAN, 4.0, 3.0, 1.0);
        assert!(dims.validate().is_err());
    }

    #[test]
    fn pricing_input_validation() {
        let dims = ProductDimensions::new(6.0, 4.0, 3.0, 0.5);
        assert!(PricingInput::new(19.99, 0.0, "Beauty", dims).validate().is_ok());
        assert_eq!(
            PricingInput::new(0.0, 5.0, "Beauty", dims).validate(),
            Err(CalculationError::InvalidPrice(0.0))
        );
        assert_eq!(
            PricingInput::new(10.0, -1.0, "Beauty", dims).validate(),
            Err(CalculationError::InvalidCost(-1.0))
        );
    }

    #[test]
    fn default_options_include_returns() {
        let options = CalculationOptions::default();
        assert!(options.include_returns);
        assert!(!options.long_term_storage);
        assert!(!options.is_oversized);
        assert_eq!(options.month, None);
    }

    #[test]
    fn warning_serializes_with_kind_tag() {
        let warning = CalculationWarning::UnknownCategory {
            category: "Widgets".to_string(),
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["kind"], "unknown_category");
        assert_eq!(json["category"], "Widgets");
    }
}
