//! Fee computation over a borrowed [`FeeSchedule`].

use time::{Month, OffsetDateTime};
use tracing::{debug, warn};

use super::classifier;
use super::entities::{
    CalculationOptions, CalculationWarning, FbaCalculation, FeeBreakdown, PricingInput,
    ProductDimensions,
};
use super::error::CalculationError;
use super::profitability::{break_even_price, recommended_price};
use super::schedule::FeeSchedule;

/// Rounds a dollar amount to cents, half away from zero.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

pub fn current_month() -> Month {
    OffsetDateTime::now_utc().month()
}

/// Stateless calculator; share it freely, it only reads the schedule.
#[derive(Clone, Copy, Debug)]
pub struct FeeCalculator<'a> {
    schedule: &'a FeeSchedule,
}

impl<'a> FeeCalculator<'a> {
    pub fn new(schedule: &'a FeeSchedule) -> Self {
        Self { schedule }
    }

    pub fn schedule(&self) -> &'a FeeSchedule {
        self.schedule
    }

    pub fn calculate_fees(
        &self,
        selling_price: f64,
        product_cost: f64,
        category: &str,
        dimensions: &ProductDimensions,
        options: &CalculationOptions,
    ) -> Result<FbaCalculation, CalculationError> {
        let input = PricingInput::new(selling_price, product_cost, category, *dimensions);
        self.calculate(&input, options)
    }

    pub fn calculate(
        &self,
        input: &PricingInput,
        options: &CalculationOptions,
    ) -> Result<FbaCalculation, CalculationError> {
        input.validate()?;
        let warnings = self.category_warnings(&input.category);
        self.calculate_with_warnings(input, options, warnings)
    }

    /// Checks the category against the referral table, logging the fallback.
    pub(crate) fn category_warnings(&self, category: &str) -> Vec<CalculationWarning> {
        if self.schedule.referral.is_known(category) {
            return Vec::new();
        }
        warn!(category, "unknown category, using default referral and return rates");
        vec![CalculationWarning::UnknownCategory {
            category: category.to_string(),
        }]
    }

    /// Expects `input` to be validated already.
    pub(crate) fn calculate_with_warnings(
        &self,
        input: &PricingInput,
        options: &CalculationOptions,
        warnings: Vec<CalculationWarning>,
    ) -> Result<FbaCalculation, CalculationError> {
        let pricing = &self.schedule.pricing;
        let target_margin = options.target_margin.unwrap_or(pricing.target_margin);
        let month = options.month.unwrap_or_else(current_month);
        let price = input.selling_price;
        let cost = input.product_cost;
        let category = input.category.as_str();
        let dimensions = &input.dimensions;

        let oversized = options.is_oversized || self.is_oversized(dimensions);

        let referral_fee = self.referral_fee(price, category);
        let fulfillment_fee = self.fulfillment_fee(dimensions, oversized);
        // Storage tiers follow the caller's flag only; the classifier drives fulfillment.
        let storage_fee = self.storage_fee(dimensions, month, options.is_oversized);
        let long_term_storage_fee = if options.long_term_storage {
            self.long_term_storage_fee(dimensions)
        } else {
            0.0
        };
        let return_processing_fee = if options.include_returns {
            self.return_processing_fee(price, category)
        } else {
            0.0
        };
        let inbound_defect_fee = self.inbound_defect_fee(price);

        let total_fees = referral_fee
            + fulfillment_fee
            + storage_fee
            + long_term_storage_fee
            + return_processing_fee
            + inbound_defect_fee;
        let fee_percentage = total_fees / price * 100.0;
        let net_profit = price - cost - total_fees;
        let profit_margin = net_profit / price * 100.0;
        let roi = (cost > 0.0).then(|| net_profit / cost * 100.0);

        let recommended_price =
            recommended_price(cost, total_fees, target_margin, pricing.assumed_fee_rate)?;

        debug!(
            category,
            price,
            cost,
            oversized,
            month = u8::from(month),
            total_fees,
            net_profit,
            "calculated fba fees"
        );

        Ok(FbaCalculation {
            selling_price: price,
            product_cost: cost,
            fees: FeeBreakdown {
                referral_fee,
                fulfillment_fee,
                storage_fee,
                long_term_storage_fee,
                return_processing_fee,
                inbound_defect_fee,
                total_fees,
                fee_percentage,
                net_profit,
            },
            profit_margin,
            roi,
            break_even_price: break_even_price(cost, total_fees),
            recommended_price,
            oversized,
            warnings,
        })
    }

    pub fn is_oversized(&self, dimensions: &ProductDimensions) -> bool {
        classifier::is_oversized(dimensions, &self.schedule.size_limits)
    }

    /// Price times the category rate, clamped to the category's floor/ceiling.
    pub fn referral_fee(&self, selling_price: f64, category: &str) -> f64 {
        let referral = &self.schedule.referral;
        let fee = selling_price * referral.rate(category);
        let fee = referral
            .limit(category)
            .map_or(fee, |limit| limit.apply(fee));
        round_cents(fee)
    }

    pub fn fulfillment_fee(&self, dimensions: &ProductDimensions, oversized: bool) -> f64 {
        let tables = &self.schedule.fulfillment;
        let volume = dimensions.volume();
        if oversized {
            tables.oversized.fee(dimensions.weight, volume)
        } else {
            tables.standard.fee(dimensions.weight, volume)
        }
    }

    /// Monthly storage for one unit.
    pub fn storage_fee(&self, dimensions: &ProductDimensions, month: Month, oversized: bool) -> f64 {
        let rate = self.schedule.storage.rate(oversized, month);
        round_cents(dimensions.cubic_feet() * rate)
    }

    pub fn long_term_storage_fee(&self, dimensions: &ProductDimensions) -> f64 {
        round_cents(dimensions.cubic_feet() * self.schedule.storage.long_term_rate)
    }

    /// Expected return cost per unit sold.
    pub fn return_processing_fee(&self, selling_price: f64, category: &str) -> f64 {
        let returns = &self.schedule.returns;
        round_cents(returns.rate(category) * returns.cost_per_return(selling_price))
    }

    pub fn inbound_defect_fee(&self, selling_price: f64) -> f64 {
        let policy = &self.schedule.inbound_defect;
        let cost = (selling_price * policy.cost_share).min(policy.cost_cap);
        round_cents(policy.defect_rate * cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::load_default_schedule;

    fn small() -> ProductDimensions {
        ProductDimensions::new(6.0, 4.0, 3.0, 0.5)
    }

    #[test]
    fn round_cents_half_up() {
        assert_eq!(round_cents(2.3992), 2.40);
        assert_eq!(round_cents(0.03625), 0.04);
        assert_eq!(round_cents(0.125), 0.13);
        assert_eq!(round_cents(0.0), 0.0);
    }

    #[test]
    fn referral_fee_by_category() {
        let schedule = load_default_schedule().unwrap();
        let calc = FeeCalculator::new(&schedule);
        assert_eq!(calc.referral_fee(29.99, "Health & Personal Care"), 2.40);
        assert_eq!(calc.referral_fee(50.0, "Jewelry"), 10.0);
        assert_eq!(calc.referral_fee(50.0, "Clothing & Accessories"), 8.5);
        assert_eq!(calc.referral_fee(50.0, "Watches"), 8.0);
        assert_eq!(calc.referral_fee(50.0, "Unlisted"), 7.5);
    }

    #[test]
    fn books_referral_floor() {
        let schedule = load_default_schedule().unwrap();
        let calc = FeeCalculator::new(&schedule);
        assert_eq!(calc.referral_fee(4.99, "Books"), 1.80);
        assert_eq!(calc.referral_fee(0.01, "Books"), 1.80);
        assert_eq!(calc.referral_fee(20.0, "Books"), 3.0);
    }

    #[test]
    fn electronics_referral_ceiling() {
        let schedule = load_default_schedule().unwrap();
        let calc = FeeCalculator::new(&schedule);
        for category in [
            "Electronics",
            "Consumer Electronics",
            "Computers",
            "Cell Phones & Accessories",
        ] {
            assert_eq!(calc.referral_fee(5_000.0, category), 100.0);
        }
        assert_eq!(calc.referral_fee(500.0, "Electronics"), 40.0);
        assert_eq!(calc.referral_fee(5_000.0, "Camera & Photo"), 400.0);
    }

    #[test]
    fn fulfillment_switches_tables() {
        let schedule = load_default_schedule().unwrap();
        let calc = FeeCalculator::new(&schedule);
        assert_eq!(calc.fulfillment_fee(&small(), false), 3.77);
        assert_eq!(calc.fulfillment_fee(&small(), true), 8.58);
    }

    #[test]
    fn fulfillment_keeps_per_pound_fractions() {
        let schedule = load_default_schedule().unwrap();
        let calc = FeeCalculator::new(&schedule);
        let heavy = ProductDimensions::new(30.0, 20.0, 10.0, 73.3);
        // 63.98 + 3.3 * 0.83
        assert!((calc.fulfillment_fee(&heavy, true) - 66.719).abs() < 1e-9);
    }

    #[test]
    fn storage_fee_peak_and_off_peak() {
        let schedule = load_default_schedule().unwrap();
        let calc = FeeCalculator::new(&schedule);
        let cube = ProductDimensions::new(12.0, 12.0, 12.0, 5.0);
        assert_eq!(calc.storage_fee(&cube, Month::June, false), 0.87);
        assert_eq!(calc.storage_fee(&cube, Month::November, false), 2.40);
        assert_eq!(calc.storage_fee(&cube, Month::March, true), 0.56);
        assert_eq!(calc.long_term_storage_fee(&cube), 6.90);
    }

    #[test]
    fn return_fee_uses_capped_cost() {
        let schedule = load_default_schedule().unwrap();
        let calc = FeeCalculator::new(&schedule);
        // 0.25 * min(10 * 0.2, 5) = 0.5
        assert_eq!(calc.return_processing_fee(10.0, "Shoes"), 0.5);
        // 0.25 * 5
        assert_eq!(calc.return_processing_fee(100.0, "Shoes"), 1.25);
        assert_eq!(calc.return_processing_fee(100.0, "Toys & Games"), 0.5);
    }

    #[test]
    fn inbound_defect_fee_caps() {
        let schedule = load_default_schedule().unwrap();
        let calc = FeeCalculator::new(&schedule);
        assert_eq!(calc.inbound_defect_fee(29.99), 0.03);
        assert_eq!(calc.inbound_defect_fee(1_000.0), 0.05);
    }

    #[test]
    fn end_to_end_health_and_personal_care() {
        let schedule = load_default_schedule().unwrap();
        let calc = FeeCalculator::new(&schedule);
        let result = calc
            .calculate_fees(
                29.99,
                8.0,
                "Health & Personal Care",
                &small(),
                &CalculationOptions::for_month(Month::June),
            )
            .unwrap();

        let fees = &result.fees;
        assert_eq!(fees.referral_fee, 2.40);
        assert_eq!(fees.fulfillment_fee, 3.77);
        assert_eq!(fees.storage_fee, 0.04);
        assert_eq!(fees.long_term_storage_fee, 0.0);
        assert_eq!(fees.return_processing_fee, 0.50);
        assert_eq!(fees.inbound_defect_fee, 0.03);
        assert_eq!(
            fees.total_fees,
            fees.referral_fee
                + fees.fulfillment_fee
                + fees.storage_fee
                + fees.long_term_storage_fee
                + fees.return_processing_fee
                + fees.inbound_defect_fee
        );
        assert_eq!(fees.net_profit, 29.99 - 8.0 - fees.total_fees);
        assert_eq!(result.break_even_price, 8.0 + fees.total_fees);
        assert!(!result.oversized);
        assert!(result.warnings.is_empty());
        assert!((fees.total_fees - 6.74).abs() < 1e-9);
        assert!(result.roi.is_some());
    }

    #[test]
    fn optional_fees_follow_options() {
        let schedule = load_default_schedule().unwrap();
        let calc = FeeCalculator::new(&schedule);
        let options = CalculationOptions {
            month: Some(Month::June),
            long_term_storage: true,
            include_returns: false,
            ..CalculationOptions::default()
        };
        let result = calc
            .calculate_fees(29.99, 8.0, "Beauty", &small(), &options)
            .unwrap();
        // 72 / 1728 * 6.90 = 0.2875
        assert_eq!(result.fees.long_term_storage_fee, 0.29);
        assert_eq!(result.fees.return_processing_fee, 0.0);
    }

    #[test]
    fn oversized_override_changes_storage_table() {
        let schedule = load_default_schedule().unwrap();
        let calc = FeeCalculator::new(&schedule);
        let options = CalculationOptions {
            month: Some(Month::June),
            is_oversized: true,
            ..CalculationOptions::default()
        };
        let cube = ProductDimensions::new(12.0, 12.0, 6.0, 2.0);
        let result = calc
            .calculate_fees(40.0, 10.0, "Toys & Games", &cube, &options)
            .unwrap();
        assert!(result.oversized);
        assert_eq!(result.fees.storage_fee, 0.28);
        // 864 in³ / 139 = 6.2 lb dimensional weight
        assert_eq!(result.fees.fulfillment_fee, 18.41);
    }

    #[test]
    fn classifier_oversize_keeps_standard_storage() {
        let schedule = load_default_schedule().unwrap();
        let calc = FeeCalculator::new(&schedule);
        // 20 in exceeds the 18 in length limit
        let long_box = ProductDimensions::new(20.0, 10.0, 5.0, 2.0);
        let result = calc
            .calculate_fees(
                40.0,
                10.0,
                "Toys & Games",
                &long_box,
                &CalculationOptions::for_month(Month::June),
            )
            .unwrap();
        assert!(result.oversized);
        // 1000 / 1728 * 0.87 = 0.5035
        assert_eq!(result.fees.storage_fee, 0.50);
        // 1000 in³ / 139 = 7.19 lb dimensional weight
        assert_eq!(result.fees.fulfillment_fee, 18.41);
    }

    #[test]
    fn zero_cost_has_no_roi() {
        let schedule = load_default_schedule().unwrap();
        let calc = FeeCalculator::new(&schedule);
        let result = calc
            .calculate_fees(
                19.99,
                0.0,
                "Beauty",
                &small(),
                &CalculationOptions::for_month(Month::May),
            )
            .unwrap();
        assert_eq!(result.roi, None);
        assert!(result.profit_margin.is_finite());
    }

    #[test]
    fn unknown_category_is_reported() {
        let schedule = load_default_schedule().unwrap();
        let calc = FeeCalculator::new(&schedule);
        let result = calc
            .calculate_fees(
                20.0,
                5.0,
                "Widgets",
                &small(),
                &CalculationOptions::for_month(Month::May),
            )
            .unwrap();
        assert_eq!(result.fees.referral_fee, 3.0);
        assert_eq!(
            result.warnings,
            vec![CalculationWarning::UnknownCategory {
                category: "Widgets".to_string()
            }]
        );
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let schedule = load_default_schedule().unwrap();
        let calc = FeeCalculator::new(&schedule);
        let options = CalculationOptions::default();
        assert_eq!(
            calc.calculate_fees(0.0, 5.0, "Beauty", &small(), &options),
            Err(CalculationError::InvalidPrice(0.0))
        );
        assert_eq!(
            calc.calculate_fees(10.0, -2.0, "Beauty", &small(), &options),
            Err(CalculationError::InvalidCost(-2.0))
        );
        let flat = ProductDimensions::new(6.0, 4.0, 0.0, 0.5);
        assert!(matches!(
            calc.calculate_fees(10.0, 2.0, "Beauty", &flat, &options),
            Err(CalculationError::InvalidDimensions { field: "height", .. })
        ));
        let options = CalculationOptions {
            target_margin: Some(0.8),
            ..CalculationOptions::default()
        };
        assert!(matches!(
            calc.calculate_fees(10.0, 2.0, "Beauty", &small(), &options),
            Err(CalculationError::InvalidTargetMargin { .. })
        ));
    }
}
