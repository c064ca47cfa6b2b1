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

//! Price scenario definitions for engine simulation.
//!
//! Pre-defined hourly price patterns representing typical day-ahead
//! market conditions:
//!
//! - **Usual Day**: cheap overnight, elevated day, noon dip, evening peak
//! - **Elevated Day**: cheap only at night, high prices throughout the day
//! - **Volatile**: large price swings with shifting opportunities
//! - **Negative Prices**: negative midday periods (renewable surplus)

use chrono::{NaiveDate, TimeZone, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thermion_types::PricePoint;

/// Price scenario types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PriceScenario {
    /// Cheap overnight, elevated day, noon dip, evening peak
    UsualDay,

    /// Cheap only at night, uniformly high during the day
    ElevatedDay,

    /// Large swings between 0.5 and 8.0 EUR-cent equivalents
    Volatile,

    /// Contains negative price periods around midday
    NegativePrices,

    /// Custom curve with explicit hourly prices
    Custom {
        /// 24 prices, one per hour
        prices: Vec<f32>,
    },
}

impl PriceScenario {
    pub fn name(&self) -> &str {
        match self {
            Self::UsualDay => "Usual Day",
            Self::ElevatedDay => "Elevated Day",
            Self::Volatile => "Volatile Prices",
            Self::NegativePrices => "Negative Prices",
            Self::Custom { .. } => "Custom",
        }
    }

    /// Resolve a CLI scenario id to a preset scenario.
    pub fn from_id(id: &str) -> Option<Self> {
        SCENARIO_PRESETS
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.scenario.clone())
    }

    /// Generate 24 hourly price points for a day
    pub fn generate_prices(&self, date: NaiveDate) -> Vec<PricePoint> {
        match self {
            Self::UsualDay => generate_usual_day(date),
            Self::ElevatedDay => generate_elevated_day(date),
            Self::Volatile => generate_volatile(date),
            Self::NegativePrices => generate_negative(date),
            Self::Custom { prices } => prices_to_points(date, prices),
        }
    }
}

/// Price scenario preset with metadata
#[derive(Debug, Clone)]
pub struct ScenarioPreset {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub scenario: PriceScenario,
}

/// Available price scenario presets
pub const SCENARIO_PRESETS: &[ScenarioPreset] = &[
    ScenarioPreset {
        id: "usual_day",
        name: "Usual Day",
        description: "Cheap overnight (0-6), elevated day, noon dip (12-14), evening peak (17-20)",
        scenario: PriceScenario::UsualDay,
    },
    ScenarioPreset {
        id: "elevated_day",
        name: "Elevated Day",
        description: "Cheap only at night (0-6), uniformly high during day",
        scenario: PriceScenario::ElevatedDay,
    },
    ScenarioPreset {
        id: "volatile",
        name: "Volatile",
        description: "Large price swings throughout the day",
        scenario: PriceScenario::Volatile,
    },
    ScenarioPreset {
        id: "negative",
        name: "Negative Prices",
        description: "Includes negative price periods during midday (high renewable generation)",
        scenario: PriceScenario::NegativePrices,
    },
];

fn prices_to_points(date: NaiveDate, prices: &[f32]) -> Vec<PricePoint> {
    let base_time = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    let base_dt = Utc.from_utc_datetime(&base_time);

    prices
        .iter()
        .enumerate()
        .map(|(i, &price)| PricePoint {
            time: base_dt + chrono::Duration::hours(i as i64),
            price,
        })
        .collect()
}

/// Pattern:
/// - 00:00-06:00: 1.50 (cheap overnight)
/// - 06:00-12:00: 3.50 (morning elevated)
/// - 12:00-14:00: 2.80 (noon dip - solar surplus)
/// - 14:00-17:00: 3.20 (afternoon)
/// - 17:00-20:00: 4.50 (evening peak)
/// - 20:00-24:00: 2.50 (late evening decline)
fn generate_usual_day(date: NaiveDate) -> Vec<PricePoint> {
    let mut rng = rand::thread_rng();
    let hourly: Vec<f32> = (0..24)
        .map(|hour| {
            let base_price = match hour {
                0..=5 => 1.50,
                6..=11 => 3.50,
                12..=13 => 2.80,
                14..=16 => 3.20,
                17..=19 => 4.50,
                _ => 2.50,
            };
            // Small random noise (+/- 10%)
            let noise: f32 = rng.gen_range(-0.10..0.10);
            base_price * (1.0 + noise)
        })
        .collect();
    prices_to_points(date, &hourly)
}

fn generate_elevated_day(date: NaiveDate) -> Vec<PricePoint> {
    let mut rng = rand::thread_rng();
    let hourly: Vec<f32> = (0..24)
        .map(|hour| {
            let base_price = if hour < 6 { 1.50 } else { 4.50 };
            let noise: f32 = rng.gen_range(-0.10..0.10);
            base_price * (1.0 + noise)
        })
        .collect();
    prices_to_points(date, &hourly)
}

/// Large swings from 0.5 to 8.0, several peaks and valleys per day
fn generate_volatile(date: NaiveDate) -> Vec<PricePoint> {
    let mut rng = rand::thread_rng();
    // (start_hour, end_hour inclusive, low, high)
    let pattern: [(u32, u32, f32, f32); 7] = [
        (0, 3, 0.5, 1.0),
        (4, 6, 2.0, 4.0),
        (7, 9, 6.0, 8.0),
        (10, 13, 0.8, 1.5),
        (14, 16, 4.0, 6.0),
        (17, 20, 6.5, 8.0),
        (21, 23, 1.0, 2.5),
    ];
    let hourly: Vec<f32> = (0..24)
        .map(|hour| {
            let (_, _, low, high) = pattern
                .iter()
                .copied()
                .find(|(start, end, _, _)| (*start..=*end).contains(&hour))
                .unwrap_or((0, 23, 1.0, 3.0));
            rng.gen_range(low..high)
        })
        .collect();
    prices_to_points(date, &hourly)
}

/// Negative prices 11:00-15:00, otherwise a usual shape
fn generate_negative(date: NaiveDate) -> Vec<PricePoint> {
    let mut rng = rand::thread_rng();
    let hourly: Vec<f32> = (0..24)
        .map(|hour| match hour {
            11..=14 => rng.gen_range(-1.0..-0.1_f32),
            0..=5 => rng.gen_range(1.0..1.8),
            17..=20 => rng.gen_range(3.5..5.0),
            _ => rng.gen_range(2.0..3.2),
        })
        .collect();
    prices_to_points(date, &hourly)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 20).unwrap()
    }

    #[test]
    fn test_every_preset_generates_24_hours() {
        for preset in SCENARIO_PRESETS {
            let prices = preset.scenario.generate_prices(date());
            assert_eq!(prices.len(), 24, "{}", preset.id);
            assert!(prices.iter().all(|p| p.price.is_finite()));
        }
    }

    #[test]
    fn test_usual_day_night_is_cheaper_than_evening_peak() {
        let prices = PriceScenario::UsualDay.generate_prices(date());
        let night: f32 = prices[0..6].iter().map(|p| p.price).sum::<f32>() / 6.0;
        let peak: f32 = prices[17..20].iter().map(|p| p.price).sum::<f32>() / 3.0;
        assert!(night < peak);
    }

    #[test]
    fn test_negative_scenario_contains_negative_prices() {
        let prices = PriceScenario::NegativePrices.generate_prices(date());
        assert!(prices.iter().any(|p| p.price < 0.0));
    }

    #[test]
    fn test_from_id_resolves_presets() {
        assert!(PriceScenario::from_id("volatile").is_some());
        assert!(PriceScenario::from_id("nonsense").is_none());
    }
}
