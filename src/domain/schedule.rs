//! Fee schedule data.
//!
//! Amazon republishes its fee tables every year, so every rate, band and cap
//! the calculator uses lives here as deserializable data rather than in the
//! computation code.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::{macros::format_description, Date, Month};

use super::entities::CategoryInsight;
use super::error::ScheduleError;

/// Key of the fallback entry in the insight table.
pub const DEFAULT_INSIGHT_KEY: &str = "default";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub name: String,
    /// ISO date (`YYYY-MM-DD`) the schedule took effect.
    pub effective_from: String,
    pub referral: ReferralTable,
    pub size_limits: SizeLimits,
    pub fulfillment: FulfillmentTables,
    pub storage: StorageRates,
    pub returns: ReturnPolicy,
    pub inbound_defect: InboundDefectPolicy,
    pub pricing: PricingHeuristic,
    pub insights: BTreeMap<String, CategoryInsight>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferralTable {
    pub default_rate: f64,
    pub rates: BTreeMap<String, f64>,
    /// Per-category floor/ceiling applied after the rate.
    #[serde(default)]
    pub limits: BTreeMap<String, FeeLimit>,
}

impl ReferralTable {
    pub fn is_known(&self, category: &str) -> bool {
        self.rates.contains_key(category)
    }

    pub fn rate(&self, category: &str) -> f64 {
        self.rates
            .get(category)
            .copied()
            .unwrap_or(self.default_rate)
    }

    pub fn limit(&self, category: &str) -> Option<&FeeLimit> {
        self.limits.get(category)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FeeLimit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
}

impl FeeLimit {
    pub fn apply(&self, fee: f64) -> f64 {
        let fee = self.minimum.map_or(fee, |min| fee.max(min));
        self.maximum.map_or(fee, |max| fee.min(max))
    }
}

/// Largest package that still counts as standard size.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SizeLimits {
    pub max_weight: f64,
    pub max_length: f64,
    pub max_width: f64,
    pub max_height: f64,
    /// Cubic inches.
    pub max_volume: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FulfillmentTables {
    pub standard: StandardFulfillment,
    pub oversized: OversizedFulfillment,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandardFulfillment {
    /// Ordered by `max_weight`; the first band the weight fits in wins.
    pub bands: Vec<WeightBand>,
    /// Applies above the heaviest band, charged per started pound.
    pub overflow: PerPoundOverflow,
}

impl StandardFulfillment {
    pub fn fee(&self, weight: f64, volume: f64) -> f64 {
        if let Some(band) = self.bands.iter().find(|band| weight <= band.max_weight) {
            return band.fee(volume);
        }

        let heaviest = self.bands.last().map_or(0.0, |band| band.max_weight);
        let extra_pounds = (weight - heaviest).ceil();
        self.overflow.base_fee + extra_pounds * self.overflow.per_pound
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeightBand {
    pub max_weight: f64,
    /// Ordered by `max_volume`; the last tier is open-ended.
    pub volume_tiers: Vec<VolumeTier>,
}

impl WeightBand {
    fn fee(&self, volume: f64) -> f64 {
        self.volume_tiers
            .iter()
            .find(|tier| tier.max_volume.map_or(true, |max| volume <= max))
            .or(self.volume_tiers.last())
            .map_or(0.0, |tier| tier.fee)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VolumeTier {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_volume: Option<f64>,
    pub fee: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerPoundOverflow {
    pub base_fee: f64,
    pub per_pound: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OversizedFulfillment {
    /// Cubic inches per pound of dimensional weight.
    pub dimensional_divisor: f64,
    pub flat_bands: Vec<FlatBand>,
    /// Checked after the flat bands; the last band is open-ended.
    pub linear_bands: Vec<LinearBand>,
}

impl OversizedFulfillment {
    /// Billable weight: the larger of actual and dimensional weight.
    pub fn effective_weight(&self, weight: f64, volume: f64) -> f64 {
        weight.max(volume / self.dimensional_divisor)
    }

    pub fn fee(&self, weight: f64, volume: f64) -> f64 {
        let effective = self.effective_weight(weight, volume);

        if let Some(band) = self.flat_bands.iter().find(|band| effective <= band.max_weight) {
            return band.fee;
        }

        self.linear_bands
            .iter()
            .find(|band| band.max_weight.map_or(true, |max| effective <= max))
            .or(self.linear_bands.last())
            .map_or(0.0, |band| {
                band.base_fee + (effective - band.from_weight) * band.per_pound
            })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlatBand {
    pub max_weight: f64,
    pub fee: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearBand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_weight: Option<f64>,
    pub from_weight: f64,
    pub base_fee: f64,
    pub per_pound: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StorageRates {
    pub standard: SeasonalRate,
    pub oversized: SeasonalRate,
    pub peak_months: Vec<u8>,
    /// Per cubic foot, for units stored longer than 365 days.
    pub long_term_rate: f64,
}

impl StorageRates {
    pub fn is_peak(&self, month: Month) -> bool {
        self.peak_months.contains(&u8::from(month))
    }

    /// Monthly rate per cubic foot.
    pub fn rate(&self, oversized: bool, month: Month) -> f64 {
        let seasonal = if oversized {
            &self.oversized
        } else {
            &self.standard
        };
        if self.is_peak(month) {
            seasonal.peak
        } else {
            seasonal.off_peak
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeasonalRate {
    pub off_peak: f64,
    pub peak: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReturnPolicy {
    pub default_rate: f64,
    pub rates: BTreeMap<String, f64>,
    /// Share of the selling price one return costs, capped at `cost_cap`.
    pub cost_share: f64,
    pub cost_cap: f64,
}

impl ReturnPolicy {
    pub fn rate(&self, category: &str) -> f64 {
        self.rates
            .get(category)
            .copied()
            .unwrap_or(self.default_rate)
    }

    pub fn cost_per_return(&self, selling_price: f64) -> f64 {
        (selling_price * self.cost_share).min(self.cost_cap)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct InboundDefectPolicy {
    pub defect_rate: f64,
    pub cost_share: f64,
    pub cost_cap: f64,
}

/// Inputs to the recommended-price heuristic.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricingHeuristic {
    pub target_margin: f64,
    pub assumed_fee_rate: f64,
}

impl FeeSchedule {
    pub fn effective_date(&self) -> Result<Date, ScheduleError> {
        Date::parse(&self.effective_from, format_description!("[year]-[month]-[day]")).map_err(
            |source| ScheduleError::InvalidDate {
                value: self.effective_from.clone(),
                source,
            },
        )
    }

    /// Insight for `category`, falling back to the `default` entry.
    pub fn insight(&self, category: &str) -> Option<&CategoryInsight> {
        self.insights
            .get(category)
            .or_else(|| self.insights.get(DEFAULT_INSIGHT_KEY))
    }

    pub fn validate(&self) -> Result<(), ScheduleError> {
        self.effective_date()?;

        check_rate("referral", "default", self.referral.default_rate)?;
        for (category, rate) in &self.referral.rates {
            check_rate("referral", category, *rate)?;
        }
        for (category, limit) in &self.referral.limits {
            for value in [limit.minimum, limit.maximum].into_iter().flatten() {
                check_amount("referral limits", category, value)?;
            }
        }

        self.validate_standard_fulfillment()?;
        self.validate_oversized_fulfillment()?;

        for month in &self.storage.peak_months {
            if !(1..=12).contains(month) {
                return Err(ScheduleError::InvalidPeakMonth(*month));
            }
        }
        for (key, value) in [
            ("standard off-peak", self.storage.standard.off_peak),
            ("standard peak", self.storage.standard.peak),
            ("oversized off-peak", self.storage.oversized.off_peak),
            ("oversized peak", self.storage.oversized.peak),
            ("long-term", self.storage.long_term_rate),
        ] {
            check_amount("storage", key, value)?;
        }

        check_rate("returns", "default", self.returns.default_rate)?;
        for (category, rate) in &self.returns.rates {
            check_rate("returns", category, *rate)?;
        }
        check_rate("returns", "cost_share", self.returns.cost_share)?;
        check_amount("returns", "cost_cap", self.returns.cost_cap)?;

        check_rate("inbound defect", "defect_rate", self.inbound_defect.defect_rate)?;
        check_rate("inbound defect", "cost_share", self.inbound_defect.cost_share)?;
        check_amount("inbound defect", "cost_cap", self.inbound_defect.cost_cap)?;

        super::profitability::price_denominator(
            self.pricing.target_margin,
            self.pricing.assumed_fee_rate,
        )?;

        if !self.insights.contains_key(DEFAULT_INSIGHT_KEY) {
            return Err(ScheduleError::MissingDefaultInsight);
        }

        Ok(())
    }

    fn validate_standard_fulfillment(&self) -> Result<(), ScheduleError> {
        const TABLE: &str = "standard fulfillment";
        let standard = &self.fulfillment.standard;
        if standard.bands.is_empty() {
            return Err(ScheduleError::EmptyTable(TABLE));
        }
        if !strictly_increasing(standard.bands.iter().map(|band| band.max_weight)) {
            return Err(ScheduleError::UnorderedBands(TABLE));
        }
        for band in &standard.bands {
            let Some(last) = band.volume_tiers.last() else {
                return Err(ScheduleError::EmptyTable(TABLE));
            };
            if last.max_volume.is_some() {
                return Err(ScheduleError::MissingOpenBand(TABLE));
            }
            let bounded = band.volume_tiers.iter().filter_map(|tier| tier.max_volume);
            if !strictly_increasing(bounded) {
                return Err(ScheduleError::UnorderedBands(TABLE));
            }
            for tier in &band.volume_tiers {
                check_amount(TABLE, &band.max_weight.to_string(), tier.fee)?;
            }
        }
        check_amount(TABLE, "overflow base", standard.overflow.base_fee)?;
        check_amount(TABLE, "overflow per pound", standard.overflow.per_pound)?;
        Ok(())
    }

    fn validate_oversized_fulfillment(&self) -> Result<(), ScheduleError> {
        const TABLE: &str = "oversized fulfillment";
        let oversized = &self.fulfillment.oversized;
        if !(oversized.dimensional_divisor.is_finite() && oversized.dimensional_divisor > 0.0) {
            return Err(ScheduleError::InvalidDivisor(oversized.dimensional_divisor));
        }
        let Some(last) = oversized.linear_bands.last() else {
            return Err(ScheduleError::EmptyTable(TABLE));
        };
        if last.max_weight.is_some() {
            return Err(ScheduleError::MissingOpenBand(TABLE));
        }
        let thresholds = oversized
            .flat_bands
            .iter()
            .map(|band| band.max_weight)
            .chain(oversized.linear_bands.iter().filter_map(|band| band.max_weight));
        if !strictly_increasing(thresholds) {
            return Err(ScheduleError::UnorderedBands(TABLE));
        }
        for band in &oversized.flat_bands {
            check_amount(TABLE, &band.max_weight.to_string(), band.fee)?;
        }
        for band in &oversized.linear_bands {
            check_amount(TABLE, &band.from_weight.to_string(), band.base_fee)?;
            check_amount(TABLE, &band.from_weight.to_string(), band.per_pound)?;
        }
        Ok(())
    }
}

fn check_rate(table: &'static str, key: &str, value: f64) -> Result<(), ScheduleError> {
    if value.is_finite() && (0.0..1.0).contains(&value) {
        Ok(())
    } else {
        Err(ScheduleError::InvalidRate {
            table,
            key: key.to_string(),
            value,
        })
    }
}

fn check_amount(table: &'static str, key: &str, value: f64) -> Result<(), ScheduleError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ScheduleError::InvalidAmount {
            table,
            key: key.to_string(),
            value,
        })
    }
}

fn strictly_increasing(values: impl Iterator<Item = f64>) -> bool {
    let mut previous: Option<f64> = None;
    for value in values {
        if !value.is_finite() || previous.is_some_and(|prev| value <= prev) {
            return false;
        }
        previous = Some(value);
    }
    true
}
