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

//! Linear thermal-response model.
//!
//! Fits building characteristics from consecutive sample pairs:
//! heating/cooling rates from indoor temperature slopes, outdoor and wind
//! impact from regression of the cooling slope against the indoor/outdoor
//! delta and wind speed. Deliberately simple - one decision per hour does
//! not justify anything heavier, and the confidence score keeps low-data
//! fits from steering the optimizer.

use anyhow::{Result, ensure};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::collector::{DailyThermalSummary, ThermalDataPoint};

/// Fitted thermal-response coefficients.
///
/// Owned exclusively by the analyzer and replaced atomically on each
/// successful `update_model`; never partially updated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThermalCharacteristics {
    /// Indoor warm-up slope with heating active (degC per hour)
    pub heating_rate_c_per_hour: f32,
    /// Indoor cool-down slope with heating idle (degC per hour, positive)
    pub cooling_rate_c_per_hour: f32,
    /// Cooling acceleration per degree of indoor/outdoor delta
    pub outdoor_temp_impact: f32,
    /// Cooling acceleration per m/s of wind
    pub wind_impact: f32,
    /// 0..1, higher means the building holds heat longer
    pub thermal_mass: f32,
    /// 0..1, grows with sample count
    pub model_confidence: f32,
    pub last_updated: DateTime<Utc>,
}

impl ThermalCharacteristics {
    /// Zero-confidence placeholder used before the first successful fit and
    /// as the fallback when a fit fails.
    #[must_use]
    pub fn zeroed(now: DateTime<Utc>) -> Self {
        Self {
            heating_rate_c_per_hour: 0.0,
            cooling_rate_c_per_hour: 0.0,
            outdoor_temp_impact: 0.0,
            wind_impact: 0.0,
            thermal_mass: 0.0,
            model_confidence: 0.0,
            last_updated: now,
        }
    }
}

/// Sample pairs further apart than this carry no slope information
const MAX_PAIR_GAP_HOURS: f32 = 3.0;
/// Sample pairs closer than this are dominated by sensor noise
const MIN_PAIR_GAP_HOURS: f32 = 0.1;
/// Sample count at which confidence saturates at 1.0
const CONFIDENCE_SATURATION: f32 = 96.0;

#[derive(Debug, Clone)]
pub struct ThermalAnalyzer {
    characteristics: ThermalCharacteristics,
    min_data_points: usize,
}

impl ThermalAnalyzer {
    #[must_use]
    pub fn new(min_data_points: usize, now: DateTime<Utc>) -> Self {
        Self {
            characteristics: ThermalCharacteristics::zeroed(now),
            min_data_points: min_data_points.max(2),
        }
    }

    /// Refit the model from collected samples.
    ///
    /// With fewer than the minimum combined data points the last-known
    /// characteristics are kept and "not enough data" is logged - that is a
    /// normal cold-start condition, not an error. A failed fit falls back to
    /// the zeroed default; this method never returns an error to the caller.
    pub fn update_model(
        &mut self,
        raw: &[ThermalDataPoint],
        summaries: &[DailyThermalSummary],
        now: DateTime<Utc>,
    ) -> ThermalCharacteristics {
        let combined = raw.len()
            + summaries
                .iter()
                .map(|s| s.sample_count as usize)
                .sum::<usize>();

        if combined < self.min_data_points {
            tracing::info!(
                "Thermal model: not enough data ({} of {} points), keeping previous fit",
                combined,
                self.min_data_points
            );
            return self.characteristics;
        }

        match Self::fit(raw, combined, now) {
            Ok(fitted) => {
                self.characteristics = fitted;
                tracing::debug!(
                    "Thermal model refit: heating {:.2} C/h, cooling {:.2} C/h, confidence {:.2}",
                    fitted.heating_rate_c_per_hour,
                    fitted.cooling_rate_c_per_hour,
                    fitted.model_confidence
                );
            }
            Err(err) => {
                tracing::warn!("Thermal model fit failed, using zeroed fallback: {err:#}");
                self.characteristics = ThermalCharacteristics::zeroed(now);
            }
        }
        self.characteristics
    }

    fn fit(
        raw: &[ThermalDataPoint],
        combined_count: usize,
        now: DateTime<Utc>,
    ) -> Result<ThermalCharacteristics> {
        let mut heating_slopes: Vec<f32> = Vec::new();
        // (slope, indoor-outdoor delta, wind)
        let mut cooling_obs: Vec<(f32, f32, f32)> = Vec::new();

        for pair in raw.windows(2) {
            let dt_hours =
                (pair[1].timestamp - pair[0].timestamp).num_seconds() as f32 / 3600.0;
            if !(MIN_PAIR_GAP_HOURS..=MAX_PAIR_GAP_HOURS).contains(&dt_hours) {
                continue;
            }

            let slope = (pair[1].indoor_temp_c - pair[0].indoor_temp_c) / dt_hours;
            ensure!(slope.is_finite(), "non-finite slope in sample pair");

            if pair[0].heating_active {
                if slope > 0.0 {
                    heating_slopes.push(slope);
                }
            } else if slope < 0.0 {
                let delta = pair[0].indoor_temp_c - pair[0].outdoor_temp_c;
                cooling_obs.push((-slope, delta, pair[0].weather.wind_speed_ms));
            }
        }

        let heating_rate = mean(&heating_slopes).unwrap_or(0.0);
        let cooling_rate = mean(
            &cooling_obs.iter().map(|o| o.0).collect::<Vec<_>>(),
        )
        .unwrap_or(0.0);

        // Least-squares slope through the origin: rate_i = k * delta_i
        let outdoor_impact = regression_slope(
            cooling_obs.iter().map(|o| (o.1, o.0)),
        )
        .clamp(0.0, 1.0);
        let wind_impact = regression_slope(
            cooling_obs.iter().map(|o| (o.2, o.0)),
        )
        .clamp(0.0, 1.0);

        // Slow coolers hold heat: map cooling rate into a 0..1 mass score
        let thermal_mass = (1.0 / (1.0 + cooling_rate.max(0.0))).clamp(0.0, 1.0);

        let model_confidence =
            (combined_count as f32 / CONFIDENCE_SATURATION).clamp(0.0, 1.0);

        Ok(ThermalCharacteristics {
            heating_rate_c_per_hour: heating_rate,
            cooling_rate_c_per_hour: cooling_rate,
            outdoor_temp_impact: outdoor_impact,
            wind_impact,
            thermal_mass,
            model_confidence,
            last_updated: now,
        })
    }

    /// Last fitted characteristics; idempotent between `update_model` calls
    #[must_use]
    pub fn characteristics(&self) -> ThermalCharacteristics {
        self.characteristics
    }

    /// Predict indoor temperature after `hours`, using the fitted rates plus
    /// an outdoor-impact correction. Confidence is the last fit's figure,
    /// unchanged - prediction does not recompute it.
    #[must_use]
    pub fn predict_temperature(
        &self,
        current_c: f32,
        target_c: f32,
        outdoor_c: f32,
        hours: f32,
    ) -> f32 {
        let c = &self.characteristics;
        let loss = c.outdoor_temp_impact * (current_c - outdoor_c).max(0.0);

        if target_c > current_c {
            let predicted = current_c + (c.heating_rate_c_per_hour - loss).max(0.0) * hours;
            predicted.min(target_c)
        } else {
            let predicted = current_c - (c.cooling_rate_c_per_hour + loss).max(0.0) * hours;
            predicted.max(target_c)
        }
    }

    /// Hours to reach `target_c`, or `None` when the fitted rates cannot get
    /// there (rate at or below noise level).
    #[must_use]
    pub fn calculate_time_to_target(
        &self,
        current_c: f32,
        target_c: f32,
        outdoor_c: f32,
    ) -> Option<f32> {
        let c = &self.characteristics;
        let delta = target_c - current_c;
        if delta.abs() < 0.05 {
            return Some(0.0);
        }

        let loss = c.outdoor_temp_impact * (current_c - outdoor_c).max(0.0);
        let rate = if delta > 0.0 {
            c.heating_rate_c_per_hour - loss
        } else {
            c.cooling_rate_c_per_hour + loss
        };

        if rate <= 0.05 {
            return None;
        }
        Some(delta.abs() / rate)
    }
}

fn mean(values: &[f32]) -> Option<f32> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f32>() / values.len() as f32)
    }
}

/// Least-squares slope through the origin for (x, y) observations
fn regression_slope(observations: impl Iterator<Item = (f32, f32)>) -> f32 {
    let mut xy = 0.0_f32;
    let mut xx = 0.0_f32;
    for (x, y) in observations {
        xy += x * y;
        xx += x * x;
    }
    if xx <= f32::EPSILON { 0.0 } else { xy / xx }
}
