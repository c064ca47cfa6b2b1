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

use serde::{Deserialize, Serialize};
use thermion_types::{ComfortBand, Hemisphere};
use thiserror::Error;

use crate::pricing::ClassifierOptions;

/// Configuration rejected at validation time.
///
/// Always synchronous and descriptive; the previous configuration stays in
/// effect when validation fails.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("invalid comfort band: min {min} must be below max {max}")]
    ComfortBandInverted { min: f32, max: f32 },

    #[error("comfort bound {value} outside supported range [{low}, {high}]")]
    ComfortBoundOutOfRange { value: f32, low: f32, high: f32 },

    #[error("{name} must be within [{low}, {high}], got {value}")]
    OutOfRange {
        name: &'static str,
        value: f32,
        low: f32,
        high: f32,
    },

    #[error("COP thresholds must satisfy 0 <= minimum < good < excellent <= 1, got {minimum}/{good}/{excellent}")]
    CopThresholdOrder {
        minimum: f32,
        good: f32,
        excellent: f32,
    },
}

/// Central configuration for the optimization engine
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub comfort: ComfortConfig,
    #[serde(default)]
    pub constraints: ConstraintConfig,
    #[serde(default)]
    pub cop: CopConfig,
    #[serde(default)]
    pub classifier: ClassifierOptions,
    #[serde(default)]
    pub thermal: ThermalConfig,
    #[serde(default)]
    pub hot_water: HotWaterConfig,
    #[serde(default)]
    pub savings: SavingsConfig,
}

impl EngineConfig {
    /// Validate the whole tree; first violation wins.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.comfort.validate()?;
        self.constraints.validate()?;
        self.cop.validate()?;
        self.hot_water.validate()?;
        Ok(())
    }
}

/// Comfort band per zone
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComfortConfig {
    #[serde(default = "default_min_temp")]
    pub min_temp_c: f32,
    #[serde(default = "default_max_temp")]
    pub max_temp_c: f32,

    /// Band for the second zone; `None` on single-zone installations
    #[serde(default)]
    pub zone2: Option<ZoneComfortConfig>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ZoneComfortConfig {
    pub min_temp_c: f32,
    pub max_temp_c: f32,
}

impl ComfortConfig {
    #[must_use]
    pub fn band(&self) -> ComfortBand {
        ComfortBand::new(self.min_temp_c, self.max_temp_c)
    }

    #[must_use]
    pub fn zone2_band(&self) -> Option<ComfortBand> {
        self.zone2
            .map(|z| ComfortBand::new(z.min_temp_c, z.max_temp_c))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (min, max) in std::iter::once((self.min_temp_c, self.max_temp_c))
            .chain(self.zone2.map(|z| (z.min_temp_c, z.max_temp_c)))
        {
            if min >= max {
                return Err(ConfigError::ComfortBandInverted { min, max });
            }
            for value in [min, max] {
                if !(5.0..=30.0).contains(&value) {
                    return Err(ConfigError::ComfortBoundOutOfRange {
                        value,
                        low: 5.0,
                        high: 30.0,
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for ComfortConfig {
    fn default() -> Self {
        Self {
            min_temp_c: default_min_temp(),
            max_temp_c: default_max_temp(),
            zone2: None,
        }
    }
}

/// Setpoint change limits, enforced independently per zone/tank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintConfig {
    /// Configured minimum meaningful delta; the effective deadband is
    /// `max(min_setpoint_delta_c, step)` per zone
    #[serde(default = "default_min_delta")]
    pub min_setpoint_delta_c: f32,

    /// Setpoint resolution of the heating zones
    #[serde(default = "default_temp_step")]
    pub temp_step_c: f32,

    /// Setpoint resolution of the tank
    #[serde(default = "default_tank_step")]
    pub tank_step_c: f32,

    /// Largest change a single cycle may command
    #[serde(default = "default_max_step")]
    pub max_step_per_cycle_c: f32,

    #[serde(default = "default_min_interval")]
    pub min_change_interval_minutes: i64,
}

impl ConstraintConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value, low, high) in [
            ("min_setpoint_delta_c", self.min_setpoint_delta_c, 0.1, 5.0),
            ("temp_step_c", self.temp_step_c, 0.1, 2.0),
            ("tank_step_c", self.tank_step_c, 0.1, 5.0),
            ("max_step_per_cycle_c", self.max_step_per_cycle_c, 0.1, 10.0),
        ] {
            if !(low..=high).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    name,
                    value,
                    low,
                    high,
                });
            }
        }
        if !(0..=1440).contains(&self.min_change_interval_minutes) {
            return Err(ConfigError::OutOfRange {
                name: "min_change_interval_minutes",
                value: self.min_change_interval_minutes as f32,
                low: 0.0,
                high: 1440.0,
            });
        }
        Ok(())
    }
}

impl Default for ConstraintConfig {
    fn default() -> Self {
        Self {
            min_setpoint_delta_c: default_min_delta(),
            temp_step_c: default_temp_step(),
            tank_step_c: default_tank_step(),
            max_step_per_cycle_c: default_max_step(),
            min_change_interval_minutes: default_min_interval(),
        }
    }
}

/// COP weighting and season handling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopConfig {
    /// 0 disables the COP correction entirely
    #[serde(default = "default_cop_weight")]
    pub cop_weight: f32,

    #[serde(default)]
    pub hemisphere: Hemisphere,

    /// When false, summer mode is never auto-detected
    #[serde(default = "default_true")]
    pub auto_seasonal: bool,

    /// Force summer mode regardless of the calendar
    #[serde(default)]
    pub force_summer_mode: bool,

    /// Fixed reduction applied to the target while summer mode is active
    #[serde(default = "default_summer_reduction")]
    pub summer_reduction_c: f32,
}

impl CopConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.cop_weight) {
            return Err(ConfigError::OutOfRange {
                name: "cop_weight",
                value: self.cop_weight,
                low: 0.0,
                high: 1.0,
            });
        }
        if !(0.0..=3.0).contains(&self.summer_reduction_c) {
            return Err(ConfigError::OutOfRange {
                name: "summer_reduction_c",
                value: self.summer_reduction_c,
                low: 0.0,
                high: 3.0,
            });
        }
        Ok(())
    }
}

impl Default for CopConfig {
    fn default() -> Self {
        Self {
            cop_weight: default_cop_weight(),
            hemisphere: Hemisphere::Northern,
            auto_seasonal: true,
            force_summer_mode: false,
            summer_reduction_c: default_summer_reduction(),
        }
    }
}

/// Thermal model data retention and fit thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThermalConfig {
    #[serde(default = "default_max_raw_points")]
    pub max_raw_points: usize,
    #[serde(default = "default_retention_hours")]
    pub retention_hours: i64,
    #[serde(default = "default_max_summary_days")]
    pub max_summary_days: usize,
    #[serde(default = "default_min_data_points")]
    pub min_data_points: usize,
}

impl Default for ThermalConfig {
    fn default() -> Self {
        Self {
            max_raw_points: default_max_raw_points(),
            retention_hours: default_retention_hours(),
            max_summary_days: default_max_summary_days(),
            min_data_points: default_min_data_points(),
        }
    }
}

/// Tank limits and usage-pattern defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotWaterConfig {
    /// Below this the tank heats immediately, schedule regardless
    #[serde(default = "default_tank_min")]
    pub min_tank_temp_c: f32,

    /// Above this the tank is forced off
    #[serde(default = "default_tank_max")]
    pub max_tank_temp_c: f32,

    /// Peak usage hours assumed until learned data overrides them
    #[serde(default = "default_peak_hours")]
    pub default_peak_hours: Vec<u32>,

    /// Learned-data threshold: per-hour confidence required before learned
    /// peaks replace the configured defaults
    #[serde(default = "default_peak_confidence")]
    pub peak_override_confidence: f32,
}

impl HotWaterConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.min_tank_temp_c >= self.max_tank_temp_c {
            return Err(ConfigError::ComfortBandInverted {
                min: self.min_tank_temp_c,
                max: self.max_tank_temp_c,
            });
        }
        for (name, value, low, high) in [
            ("min_tank_temp_c", self.min_tank_temp_c, 20.0, 70.0),
            ("max_tank_temp_c", self.max_tank_temp_c, 20.0, 70.0),
            (
                "peak_override_confidence",
                self.peak_override_confidence,
                0.0,
                1.0,
            ),
        ] {
            if !(low..=high).contains(&value) {
                return Err(ConfigError::OutOfRange {
                    name,
                    value,
                    low,
                    high,
                });
            }
        }
        Ok(())
    }
}

impl Default for HotWaterConfig {
    fn default() -> Self {
        Self {
            min_tank_temp_c: default_tank_min(),
            max_tank_temp_c: default_tank_max(),
            default_peak_hours: default_peak_hours(),
            peak_override_confidence: default_peak_confidence(),
        }
    }
}

/// Baselines for the savings heuristics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsConfig {
    /// Hourly energy baseline the %-per-degree heuristic scales (kWh)
    #[serde(default = "default_hourly_baseline")]
    pub baseline_hourly_kwh: f32,

    /// Consumption change per degree of setpoint change
    #[serde(default = "default_percent_per_degree")]
    pub percent_per_degree: f32,

    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for SavingsConfig {
    fn default() -> Self {
        Self {
            baseline_hourly_kwh: default_hourly_baseline(),
            percent_per_degree: default_percent_per_degree(),
            currency: default_currency(),
        }
    }
}

// Default value functions for serde
fn default_min_temp() -> f32 {
    19.0
}
fn default_max_temp() -> f32 {
    23.0
}
fn default_min_delta() -> f32 {
    0.5
}
fn default_temp_step() -> f32 {
    0.5
}
fn default_tank_step() -> f32 {
    1.0
}
fn default_max_step() -> f32 {
    1.0
}
fn default_min_interval() -> i64 {
    15
}
fn default_cop_weight() -> f32 {
    0.3
}
fn default_summer_reduction() -> f32 {
    0.5
}
fn default_true() -> bool {
    true
}
fn default_max_raw_points() -> usize {
    672 // one week of 15-minute samples
}
fn default_retention_hours() -> i64 {
    48
}
fn default_max_summary_days() -> usize {
    30
}
fn default_min_data_points() -> usize {
    24
}
fn default_tank_min() -> f32 {
    41.0
}
fn default_tank_max() -> f32 {
    50.0
}
fn default_peak_hours() -> Vec<u32> {
    vec![7, 18, 21]
}
fn default_peak_confidence() -> f32 {
    0.5
}
fn default_hourly_baseline() -> f32 {
    1.5
}
fn default_percent_per_degree() -> f32 {
    0.05
}
fn default_currency() -> String {
    "EUR".to_owned()
}
