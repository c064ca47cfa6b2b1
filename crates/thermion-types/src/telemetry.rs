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

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of the heat-pump state as reported by the device cloud
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceState {
    pub indoor_temp_c: f32,
    pub outdoor_temp_c: f32,
    pub tank_temp_c: f32,

    /// Second heating zone, present only on dual-zone installations
    pub zone2_temp_c: Option<f32>,

    /// Currently commanded setpoints
    pub target_temp_c: f32,
    pub zone2_target_c: Option<f32>,
    pub tank_target_c: Option<f32>,

    pub heating_active: bool,
    pub timestamp: DateTime<Utc>,
}

/// Weather observation used to enrich the thermal model
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature_c: f32,
    pub wind_speed_ms: f32,
    pub humidity_percent: f32,
    pub cloud_cover_percent: f32,
    pub precipitation_mm: f32,
}

/// Which hemisphere the installation is in; flips the summer months
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hemisphere {
    #[default]
    Northern,
    Southern,
}

/// Coarse season classification driving which COP dominates the decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalMode {
    Summer,
    Winter,
    Transition,
}

impl SeasonalMode {
    /// Classify a date by calendar month.
    ///
    /// Northern hemisphere: Jun-Aug summer, Dec-Feb winter, rest transition.
    /// Southern hemisphere shifts by six months.
    #[must_use]
    pub fn from_date(date: DateTime<Utc>, hemisphere: Hemisphere) -> Self {
        let month = match hemisphere {
            Hemisphere::Northern => date.month(),
            Hemisphere::Southern => (date.month() + 6 - 1) % 12 + 1,
        };
        match month {
            6..=8 => Self::Summer,
            12 | 1 | 2 => Self::Winter,
            _ => Self::Transition,
        }
    }

    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Summer => "summer",
            Self::Winter => "winter",
            Self::Transition => "transition",
        }
    }
}

/// What the metrics collaborator says the optimization should favor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationFocus {
    Heating,
    #[serde(rename = "hotwater")]
    HotWater,
    Both,
}

/// Real efficiency metrics supplied per cycle by an external collaborator.
///
/// The whole struct is optional to the engine: when absent, every consumer
/// degrades to price-only behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationMetrics {
    pub real_heating_cop: f32,
    pub real_hot_water_cop: f32,
    pub seasonal_mode: SeasonalMode,
    pub optimization_focus: OptimizationFocus,
    pub daily_energy_consumption_kwh: f32,
    pub heating_efficiency: f32,
    pub hot_water_efficiency: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at_month(month: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, month, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_northern_seasons() {
        assert_eq!(
            SeasonalMode::from_date(at_month(7), Hemisphere::Northern),
            SeasonalMode::Summer
        );
        assert_eq!(
            SeasonalMode::from_date(at_month(1), Hemisphere::Northern),
            SeasonalMode::Winter
        );
        assert_eq!(
            SeasonalMode::from_date(at_month(4), Hemisphere::Northern),
            SeasonalMode::Transition
        );
        assert_eq!(
            SeasonalMode::from_date(at_month(10), Hemisphere::Northern),
            SeasonalMode::Transition
        );
    }

    #[test]
    fn test_southern_seasons_shift_by_six_months() {
        assert_eq!(
            SeasonalMode::from_date(at_month(1), Hemisphere::Southern),
            SeasonalMode::Summer
        );
        assert_eq!(
            SeasonalMode::from_date(at_month(7), Hemisphere::Southern),
            SeasonalMode::Winter
        );
    }
}
