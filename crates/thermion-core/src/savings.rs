// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of ThermION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Monetary savings estimation.
//!
//! Savings are always measured against the comfort-ceiling baseline, the
//! cost of holding the band maximum around the clock. Holding below that
//! ceiling is a saving whether or not a setpoint command went out this
//! cycle.

use std::sync::Arc;

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use thermion_types::{OptimizationMetrics, SeasonalMode, ZoneKind};

use crate::resources::SavingsConfig;
use crate::traits::PriceProvider;

/// Season scaling for the per-degree factor, winter heaviest
fn seasonal_factor(mode: SeasonalMode) -> f32 {
    match mode {
        SeasonalMode::Winter => 1.0,
        SeasonalMode::Transition => 0.7,
        SeasonalMode::Summer => 0.4,
    }
}

fn zone_multiplier(zone: ZoneKind) -> f32 {
    match zone {
        ZoneKind::Zone1 => 1.0,
        ZoneKind::Zone2 => 0.9,
        ZoneKind::Tank => 0.8,
    }
}

/// One settled savings amount with its currency
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsRecord {
    pub timestamp: DateTime<Utc>,
    pub amount: f32,
    pub currency: String,
}

/// Aggregated savings over a set of records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsTotal {
    pub amount: f32,
    /// Empty when the records mix currencies
    pub currency: String,
}

/// Heuristic and metrics-based savings calculators.
pub struct SavingsService {
    config: SavingsConfig,
    price_provider: Option<Arc<dyn PriceProvider>>,
}

impl SavingsService {
    pub fn new(config: SavingsConfig, price_provider: Option<Arc<dyn PriceProvider>>) -> Self {
        Self {
            config,
            price_provider,
        }
    }

    /// Hourly saving of a setpoint change, percent-per-degree heuristic.
    ///
    /// Lowering the setpoint saves, raising it costs (negative result).
    /// Non-finite inputs or a zero delta yield 0.
    pub fn calculate_savings(
        &self,
        new_temp_c: f32,
        old_temp_c: f32,
        price: f32,
        zone: ZoneKind,
    ) -> f32 {
        if !new_temp_c.is_finite() || !old_temp_c.is_finite() || !price.is_finite() {
            return 0.0;
        }
        let delta = old_temp_c - new_temp_c;
        if delta == 0.0 {
            return 0.0;
        }
        delta
            * self.config.percent_per_degree
            * self.config.baseline_hourly_kwh
            * price
            * zone_multiplier(zone)
    }

    /// Hourly saving from real metrics: season-weighted per-degree factor
    /// times the measured efficiency for the zone's circuit.
    pub fn calculate_real_hourly_savings(
        &self,
        new_temp_c: f32,
        old_temp_c: f32,
        price: f32,
        zone: ZoneKind,
        metrics: &OptimizationMetrics,
    ) -> f32 {
        let base = self.calculate_savings(new_temp_c, old_temp_c, price, zone);
        if base == 0.0 {
            return 0.0;
        }
        let efficiency = match zone {
            ZoneKind::Zone1 | ZoneKind::Zone2 => metrics.heating_efficiency,
            ZoneKind::Tank => metrics.hot_water_efficiency,
        };
        let efficiency = if efficiency.is_finite() && efficiency > 0.0 {
            efficiency
        } else {
            1.0
        };
        base * seasonal_factor(metrics.seasonal_mode) * efficiency
    }

    /// Project an hourly saving over the rest of the day.
    ///
    /// With a price provider the remaining hours are weighted by their
    /// forecast price relative to the daily average. Any provider failure
    /// degrades to `hourly_savings * 24.0`, never an error.
    pub async fn calculate_daily_savings(&self, hourly_savings: f32, now: DateTime<Utc>) -> f32 {
        if !hourly_savings.is_finite() {
            return 0.0;
        }
        let Some(provider) = &self.price_provider else {
            return hourly_savings * 24.0;
        };
        match provider.get_prices().await {
            Ok(series) if !series.prices.is_empty() => {
                let avg = series.prices.iter().map(|p| p.price).sum::<f32>()
                    / series.prices.len() as f32;
                if !avg.is_finite() || avg == 0.0 {
                    return hourly_savings * 24.0;
                }
                let weighted: f32 = series
                    .prices
                    .iter()
                    .filter(|p| p.time >= now.with_minute(0).unwrap_or(now))
                    .map(|p| hourly_savings * (p.price / avg))
                    .sum();
                if weighted.is_finite() {
                    weighted
                } else {
                    hourly_savings * 24.0
                }
            }
            Ok(_) => hourly_savings * 24.0,
            Err(err) => {
                tracing::warn!(
                    "Price provider '{}' failed during daily projection ({err:#}), using flat 24h",
                    provider.name()
                );
                hourly_savings * 24.0
            }
        }
    }

    /// Sum records into one total.
    ///
    /// Mixed currency codes cannot be converted here; the total keeps the
    /// summed amount but reports an empty currency code.
    pub fn aggregate(&self, records: &[SavingsRecord]) -> SavingsTotal {
        let amount = records.iter().map(|r| r.amount).sum();
        let mut currencies = records.iter().map(|r| r.currency.as_str());
        let currency = match currencies.next() {
            None => self.config.currency.clone(),
            Some(first) => {
                if currencies.all(|c| c == first) {
                    first.to_owned()
                } else {
                    tracing::warn!("Savings records mix currencies, reporting unitless total");
                    String::new()
                }
            }
        };
        SavingsTotal { amount, currency }
    }

    pub fn currency(&self) -> &str {
        &self.config.currency
    }
}

/// Comfort impact of a setpoint move.
///
/// Sign convention is inverted relative to intuition and kept that way for
/// downstream consumers: raising the temperature yields a negative score.
pub fn comfort_impact(new_temp_c: f32, old_temp_c: f32) -> f32 {
    if !new_temp_c.is_finite() || !old_temp_c.is_finite() {
        return 0.0;
    }
    old_temp_c - new_temp_c
}
