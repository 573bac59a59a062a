//! Profit projections built on top of the fee engine.

use time::Month;

use super::entities::{
    BreakEvenAnalysis, BreakEvenPoint, CalculationOptions, CategoryInsight, MonthlyFeeEstimate,
    PricingInput, ProductDimensions,
};
use super::error::CalculationError;
use super::fees::{current_month, round_cents, FeeCalculator};
use super::schedule::FeeSchedule;

/// Multiples of product cost tried by [`FeeCalculator::break_even_analysis`].
pub const BREAK_EVEN_MULTIPLIERS: [f64; 5] = [2.0, 2.5, 3.0, 3.5, 4.0];

const MONTHS_PER_YEAR: f64 = 12.0;

pub fn break_even_price(product_cost: f64, total_fees: f64) -> f64 {
    product_cost + total_fees
}

/// Share of the price left for cost and fees once margin and the assumed fee
/// rate are taken out.
pub(crate) fn price_denominator(
    target_margin: f64,
    assumed_fee_rate: f64,
) -> Result<f64, CalculationError> {
    let denominator = 1.0 - target_margin - assumed_fee_rate;
    if target_margin.is_finite() && assumed_fee_rate.is_finite() && denominator > 0.0 {
        Ok(denominator)
    } else {
        Err(CalculationError::InvalidTargetMargin {
            target_margin,
            assumed_fee_rate,
        })
    }
}

/// Price that would hit `target_margin` if fees were a flat
/// `assumed_fee_rate` of the price.
///
/// This is an approximation: real fees are not a fixed share of the price
/// (referral scales with it, fulfillment does not), and no attempt is made to
/// solve against the actual fee curve.
pub fn recommended_price(
    product_cost: f64,
    total_fees: f64,
    target_margin: f64,
    assumed_fee_rate: f64,
) -> Result<f64, CalculationError> {
    let denominator = price_denominator(target_margin, assumed_fee_rate)?;
    Ok(round_cents((product_cost + total_fees) / denominator))
}

pub fn category_insights<'s>(schedule: &'s FeeSchedule, category: &str) -> Option<&'s CategoryInsight> {
    schedule.insight(category)
}

impl FeeCalculator<'_> {
    /// Storage for the whole inventory plus fulfillment for a month of sales.
    ///
    /// Turnover and carrying cost are left empty when `inventory` is zero.
    pub fn estimate_monthly_fees(
        &self,
        inventory: u32,
        dimensions: &ProductDimensions,
        average_sales: f64,
        selling_price: f64,
        category: &str,
        month: Option<Month>,
    ) -> Result<MonthlyFeeEstimate, CalculationError> {
        if !average_sales.is_finite() || average_sales < 0.0 {
            return Err(CalculationError::InvalidQuantity {
                field: "average_sales",
                value: average_sales,
            });
        }

        let month = month.unwrap_or_else(current_month);
        let oversized = self.is_oversized(dimensions);
        let options = CalculationOptions {
            month: Some(month),
            is_oversized: oversized,
            ..CalculationOptions::default()
        };
        let per_unit = self.calculate_fees(selling_price, 0.0, category, dimensions, &options)?;

        let storage_fees = f64::from(inventory) * self.storage_fee(dimensions, month, oversized);
        let fulfillment_fees = average_sales * self.fulfillment_fee(dimensions, oversized);

        let (inventory_turnover, carrying_cost) = if inventory == 0 {
            (None, None)
        } else {
            let units = f64::from(inventory);
            (
                Some(average_sales / units),
                Some(storage_fees / units * selling_price),
            )
        };

        Ok(MonthlyFeeEstimate {
            total_monthly_fees: storage_fees + fulfillment_fees,
            per_unit_fees: per_unit.fees.total_fees,
            storage_fees,
            fulfillment_fees,
            inventory_turnover,
            carrying_cost,
            warnings: per_unit.warnings,
        })
    }

    /// Units needed to recoup `fixed_costs` at 2x to 4x the product cost.
    pub fn break_even_analysis(
        &self,
        product_cost: f64,
        category: &str,
        dimensions: &ProductDimensions,
        fixed_costs: f64,
        options: &CalculationOptions,
    ) -> Result<BreakEvenAnalysis, CalculationError> {
        if !product_cost.is_finite() || product_cost <= 0.0 {
            return Err(CalculationError::InvalidCost(product_cost));
        }
        if !fixed_costs.is_finite() || fixed_costs < 0.0 {
            return Err(CalculationError::InvalidQuantity {
                field: "fixed_costs",
                value: fixed_costs,
            });
        }

        dimensions.validate()?;
        let warnings = self.category_warnings(category);
        let mut price_points = Vec::with_capacity(BREAK_EVEN_MULTIPLIERS.len());

        for multiplier in BREAK_EVEN_MULTIPLIERS {
            let input =
                PricingInput::new(product_cost * multiplier, product_cost, category, *dimensions);
            input.validate()?;
            let price = input.selling_price;
            let calculation = self.calculate_with_warnings(&input, options, Vec::new())?;
            let net_profit = calculation.fees.net_profit;

            let (units_to_break_even, monthly_break_even) = if net_profit > 0.0 {
                let units = fixed_costs / net_profit;
                (
                    Some(units.ceil() as u64),
                    Some((units / MONTHS_PER_YEAR).ceil() as u64),
                )
            } else {
                (None, None)
            };

            price_points.push(BreakEvenPoint {
                price,
                margin: calculation.profit_margin,
                net_profit,
                units_to_break_even,
                monthly_break_even,
            });
        }

        Ok(BreakEvenAnalysis {
            price_points,
            warnings,
        })
    }
}
