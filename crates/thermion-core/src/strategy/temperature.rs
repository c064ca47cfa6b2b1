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

//! Target temperature scoring.
//!
//! The baseline interpolates inside the comfort band from the price position
//! (expensive lowers the target, cheap raises it). On top of that: a
//! four-band COP correction, a fixed summer-mode reduction, and - when real
//! metrics are available - seasonal branches that favor the COP figure that
//! matters for the season. Every path re-clamps into the comfort band as the
//! final step; no branch and no error may skip it.

use anyhow::{Result, ensure};
use chrono::{DateTime, Utc};
use thermion_types::{
    ComfortBand, OptimizationFocus, OptimizationMetrics, PriceStats, SeasonalMode,
};

use crate::adaptive::AdaptiveParameters;
use crate::cop::{CopHelper, CopNormalizer};
use crate::resources::CopConfig;

/// Per-cycle inputs for target computation
#[derive(Debug, Clone, Copy)]
pub struct TargetContext<'a> {
    pub stats: &'a PriceStats,
    pub current_temp_c: f32,
    pub band: ComfortBand,
    pub now: DateTime<Utc>,
    pub cop_helper: &'a CopHelper,
    pub cop_normalizer: &'a CopNormalizer,
}

/// Computed target plus the reason chain used in explanations and telemetry
#[derive(Debug, Clone)]
pub struct TargetComputation {
    pub target_c: f32,
    pub reasons: Vec<String>,
}

/// Outdoor reference around which the winter correction pivots
const WINTER_OUTDOOR_REF_C: f32 = 0.0;
/// Degrees of target raise per degree of outdoor cold below the reference
const WINTER_OUTDOOR_GAIN: f32 = 0.03;
/// Cap on the winter outdoor correction
const WINTER_OUTDOOR_MAX_C: f32 = 1.0;

#[derive(Debug, Clone)]
pub struct TemperatureOptimizer {
    cop_config: CopConfig,
    params: AdaptiveParameters,
}

impl TemperatureOptimizer {
    #[must_use]
    pub fn new(cop_config: CopConfig, params: AdaptiveParameters) -> Self {
        Self { cop_config, params }
    }

    /// Refresh thresholds from the learner; called once per cycle.
    pub fn set_parameters(&mut self, params: AdaptiveParameters) {
        self.params = params;
    }

    /// Refresh the COP configuration, picking up runtime overrides such as
    /// a stored COP weight.
    pub fn set_cop_config(&mut self, cop_config: CopConfig) {
        self.cop_config = cop_config;
    }

    fn summer_active(&self, ctx: &TargetContext<'_>) -> bool {
        self.cop_config.force_summer_mode
            || (self.cop_config.auto_seasonal && ctx.cop_helper.is_summer_season(ctx.now))
    }

    /// Price-only target with COP correction and summer reduction.
    #[must_use]
    pub fn calculate_optimal_temperature(&self, ctx: &TargetContext<'_>) -> TargetComputation {
        let mut reasons = Vec::new();
        let mut target = self.price_baseline(ctx, &mut reasons);

        if self.cop_config.cop_weight > 0.0 {
            target += self.cop_correction(ctx, &mut reasons);
        }

        if self.summer_active(ctx) {
            target -= self.cop_config.summer_reduction_c;
            reasons.push(format!(
                "summer mode active: reducing target by {:.1}C",
                self.cop_config.summer_reduction_c
            ));
        }

        TargetComputation {
            target_c: ctx.band.clamp(target),
            reasons,
        }
    }

    /// Metrics-aware target. Falls back to the price-only calculation when
    /// metrics are absent or a branch errors; the comfort-band clamp is the
    /// final operation on every path.
    #[must_use]
    pub fn calculate_optimal_temperature_with_real_data(
        &self,
        ctx: &TargetContext<'_>,
        outdoor_temp_c: f32,
        metrics: Option<&OptimizationMetrics>,
    ) -> TargetComputation {
        let Some(metrics) = metrics else {
            return self.calculate_optimal_temperature(ctx);
        };

        match self.real_data_target(ctx, outdoor_temp_c, metrics) {
            Ok(mut computation) => {
                computation.target_c = ctx.band.clamp(computation.target_c);
                computation
            }
            Err(err) => {
                tracing::warn!(
                    "Metrics-aware target failed ({err:#}), falling back to price-only"
                );
                self.calculate_optimal_temperature(ctx)
            }
        }
    }

    fn real_data_target(
        &self,
        ctx: &TargetContext<'_>,
        outdoor_temp_c: f32,
        metrics: &OptimizationMetrics,
    ) -> Result<TargetComputation> {
        ensure!(
            metrics.real_heating_cop.is_finite() && metrics.real_hot_water_cop.is_finite(),
            "non-finite COP in metrics"
        );
        ensure!(outdoor_temp_c.is_finite(), "non-finite outdoor temperature");

        let mut reasons = Vec::new();
        let mut target = self.price_baseline(ctx, &mut reasons);

        let focus_scale = match metrics.optimization_focus {
            OptimizationFocus::Both => 0.7,
            OptimizationFocus::Heating | OptimizationFocus::HotWater => 1.0,
        };

        match metrics.seasonal_mode {
            SeasonalMode::Summer => {
                // Space heating is idle; the tank dominates. Good hot-water
                // COP earns a bonus so cheap-and-efficient hours bank heat.
                let normalized = ctx.cop_normalizer.normalize(metrics.real_hot_water_cop);
                target += self.band_correction(normalized, focus_scale, "hot-water", &mut reasons);
                target -= self.cop_config.summer_reduction_c;
                reasons.push("summer metrics branch: hot-water COP priority".to_owned());
            }
            SeasonalMode::Winter => {
                let normalized = ctx.cop_normalizer.normalize(metrics.real_heating_cop);
                target += self.band_correction(normalized, focus_scale, "heating", &mut reasons);

                // Pre-compensate heat loss: colder outside raises the target
                let correction = ((WINTER_OUTDOOR_REF_C - outdoor_temp_c) * WINTER_OUTDOOR_GAIN)
                    .clamp(0.0, WINTER_OUTDOOR_MAX_C);
                if correction > 0.0 {
                    target += correction;
                    reasons.push(format!(
                        "outdoor {outdoor_temp_c:.1}C: +{correction:.2}C heat-loss compensation"
                    ));
                }
            }
            SeasonalMode::Transition => {
                let blended =
                    (metrics.real_heating_cop + metrics.real_hot_water_cop) / 2.0;
                let normalized = ctx.cop_normalizer.normalize(blended);
                target += self.band_correction(normalized, focus_scale, "blended", &mut reasons);
            }
        }

        Ok(TargetComputation {
            target_c: target,
            reasons,
        })
    }

    /// Linear interpolation inside the comfort band from the price position.
    /// Degenerate price range lands on the band midpoint.
    fn price_baseline(&self, ctx: &TargetContext<'_>, reasons: &mut Vec<String>) -> f32 {
        let stats = ctx.stats;
        let season = if self.summer_active(ctx) {
            SeasonalMode::Summer
        } else {
            ctx.cop_helper.seasonal_mode(ctx.now)
        };
        let weight = self.params.price_weight(season);

        if stats.is_degenerate() {
            reasons.push("flat price range: holding band midpoint".to_owned());
            return ctx.band.midpoint();
        }

        let position =
            ((stats.current_price - stats.avg_price) / stats.span()).clamp(-1.0, 1.0);
        let target = ctx.band.midpoint() - position * weight * (ctx.band.width() / 2.0);
        reasons.push(format!(
            "price position {position:.2} (current {:.3} vs avg {:.3})",
            stats.current_price, stats.avg_price
        ));
        target
    }

    /// Four discrete COP bands against the learned thresholds; each band
    /// logs the human-readable reason used in explanations.
    fn cop_correction(&self, ctx: &TargetContext<'_>, reasons: &mut Vec<String>) -> f32 {
        let Some(seasonal_cop) = ctx.cop_helper.get_seasonal_cop(ctx.now) else {
            tracing::debug!("No seasonal COP data; COP correction disabled this cycle");
            return 0.0;
        };
        let normalized = ctx.cop_normalizer.normalize(seasonal_cop);
        self.band_correction(normalized, 1.0, "seasonal", reasons)
    }

    fn band_correction(
        &self,
        normalized: f32,
        scale: f32,
        label: &str,
        reasons: &mut Vec<String>,
    ) -> f32 {
        let weight = self.cop_config.cop_weight.max(0.0);
        let p = &self.params;

        let (correction, reason) = if normalized > p.cop_excellent_threshold {
            (
                1.0 * weight * scale,
                format!("{label} COP excellent ({normalized:.2}): allowing temperature boost"),
            )
        } else if normalized > p.cop_good_threshold {
            (
                0.5 * weight * scale,
                format!("{label} COP good ({normalized:.2}): small boost"),
            )
        } else if normalized < p.cop_minimum_threshold {
            (
                -1.0 * weight * scale,
                format!("{label} COP poor ({normalized:.2}): applying penalty"),
            )
        } else {
            (
                -0.5 * weight * scale,
                format!("{label} COP below good ({normalized:.2}): small penalty"),
            )
        };

        tracing::debug!("{}", reason);
        reasons.push(reason);
        correction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cop::{CopSnapshot, CopTimeframe};
    use chrono::TimeZone;
    use thermion_types::Hemisphere;

    fn winter_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap()
    }

    fn stats(current: f32, avg: f32, min: f32, max: f32) -> PriceStats {
        PriceStats {
            current_price: current,
            avg_price: avg,
            min_price: min,
            max_price: max,
        }
    }

    fn optimizer() -> TemperatureOptimizer {
        TemperatureOptimizer::new(CopConfig::default(), AdaptiveParameters::default())
    }

    fn ctx<'a>(
        stats: &'a PriceStats,
        helper: &'a CopHelper,
        normalizer: &'a CopNormalizer,
        now: DateTime<Utc>,
    ) -> TargetContext<'a> {
        TargetContext {
            stats,
            current_temp_c: 21.0,
            band: ComfortBand::new(19.0, 23.0),
            now,
            cop_helper: helper,
            cop_normalizer: normalizer,
        }
    }

    #[test]
    fn test_expensive_price_lowers_target() {
        let helper = CopHelper::new(Hemisphere::Northern);
        let normalizer = CopNormalizer::new();
        let s = stats(2.0, 1.0, 0.5, 2.0);
        let result = optimizer().calculate_optimal_temperature(&ctx(
            &s,
            &helper,
            &normalizer,
            winter_now(),
        ));
        assert!(result.target_c <= 21.0);
        assert!(result.target_c >= 19.0);
    }

    #[test]
    fn test_cheap_price_raises_target() {
        let helper = CopHelper::new(Hemisphere::Northern);
        let normalizer = CopNormalizer::new();
        let s = stats(0.5, 1.0, 0.5, 2.0);
        let result = optimizer().calculate_optimal_temperature(&ctx(
            &s,
            &helper,
            &normalizer,
            winter_now(),
        ));
        assert!(result.target_c >= 21.0);
        assert!(result.target_c <= 23.0);
    }

    #[test]
    fn test_price_monotonicity() {
        let helper = CopHelper::new(Hemisphere::Northern);
        let normalizer = CopNormalizer::new();
        let opt = optimizer();

        let mut previous = f32::INFINITY;
        for current in [0.5_f32, 0.8, 1.0, 1.4, 2.0] {
            let s = stats(current, 1.0, 0.5, 2.0);
            let result =
                opt.calculate_optimal_temperature(&ctx(&s, &helper, &normalizer, winter_now()));
            assert!(
                result.target_c <= previous,
                "target must not increase as price rises"
            );
            previous = result.target_c;
        }
    }

    #[test]
    fn test_degenerate_range_holds_midpoint() {
        let helper = CopHelper::new(Hemisphere::Northern);
        let normalizer = CopNormalizer::new();
        let s = stats(1.0, 1.0, 1.0, 1.0);
        let result = optimizer().calculate_optimal_temperature(&ctx(
            &s,
            &helper,
            &normalizer,
            winter_now(),
        ));
        assert_eq!(result.target_c, 21.0);
    }

    #[test]
    fn test_result_always_inside_band() {
        let mut helper = CopHelper::new(Hemisphere::Northern);
        let mut normalizer = CopNormalizer::new();
        helper.record(
            CopTimeframe::Daily,
            CopSnapshot {
                timestamp: winter_now(),
                heating_cop: 4.8,
                hot_water_cop: 2.2,
            },
        );
        normalizer.update_range(1.0);
        normalizer.update_range(5.0);

        let opt = optimizer();
        for current in [-3.0_f32, 0.0, 1.0, 5.0, 50.0] {
            let s = stats(current, 1.0, 0.5, 2.0);
            let result =
                opt.calculate_optimal_temperature(&ctx(&s, &helper, &normalizer, winter_now()));
            assert!((19.0..=23.0).contains(&result.target_c));
        }
    }

    #[test]
    fn test_excellent_cop_grants_boost() {
        let mut helper = CopHelper::new(Hemisphere::Northern);
        let mut normalizer = CopNormalizer::new();
        helper.record(
            CopTimeframe::Daily,
            CopSnapshot {
                timestamp: winter_now(),
                heating_cop: 4.9,
                hot_water_cop: 2.0,
            },
        );
        normalizer.update_range(1.0);
        normalizer.update_range(5.0);

        let s = stats(1.0, 1.0, 0.5, 2.0);
        let with_cop = optimizer().calculate_optimal_temperature(&ctx(
            &s,
            &helper,
            &normalizer,
            winter_now(),
        ));

        let cold_helper = CopHelper::new(Hemisphere::Northern);
        let without_cop = optimizer().calculate_optimal_temperature(&ctx(
            &s,
            &cold_helper,
            &normalizer,
            winter_now(),
        ));
        assert!(with_cop.target_c > without_cop.target_c);
        assert!(with_cop.reasons.iter().any(|r| r.contains("excellent")));
    }

    #[test]
    fn test_summer_mode_reduction_applied() {
        let helper = CopHelper::new(Hemisphere::Northern);
        let normalizer = CopNormalizer::new();
        let summer = Utc.with_ymd_and_hms(2025, 7, 15, 10, 0, 0).unwrap();

        let s = stats(1.0, 1.0, 1.0, 1.0);
        let result =
            optimizer().calculate_optimal_temperature(&ctx(&s, &helper, &normalizer, summer));
        // Midpoint 21.0 minus the default 0.5 reduction
        assert!((result.target_c - 20.5).abs() < 1e-6);
    }

    #[test]
    fn test_missing_metrics_falls_back_to_basic() {
        let helper = CopHelper::new(Hemisphere::Northern);
        let normalizer = CopNormalizer::new();
        let s = stats(1.5, 1.0, 0.5, 2.0);
        let c = ctx(&s, &helper, &normalizer, winter_now());

        let basic = optimizer().calculate_optimal_temperature(&c);
        let with_none = optimizer().calculate_optimal_temperature_with_real_data(&c, 5.0, None);
        assert_eq!(basic.target_c, with_none.target_c);
    }

    #[test]
    fn test_winter_branch_outdoor_compensation_is_monotonic() {
        let helper = CopHelper::new(Hemisphere::Northern);
        let mut normalizer = CopNormalizer::new();
        normalizer.update_range(1.0);
        normalizer.update_range(5.0);
        let s = stats(1.0, 1.0, 0.5, 2.0);
        let c = ctx(&s, &helper, &normalizer, winter_now());

        let metrics = OptimizationMetrics {
            real_heating_cop: 3.0,
            real_hot_water_cop: 2.0,
            seasonal_mode: SeasonalMode::Winter,
            optimization_focus: OptimizationFocus::Heating,
            daily_energy_consumption_kwh: 20.0,
            heating_efficiency: 0.8,
            hot_water_efficiency: 0.7,
        };

        let mild = optimizer().calculate_optimal_temperature_with_real_data(&c, 5.0, Some(&metrics));
        let cold =
            optimizer().calculate_optimal_temperature_with_real_data(&c, -10.0, Some(&metrics));
        assert!(cold.target_c >= mild.target_c);
        assert!((19.0..=23.0).contains(&cold.target_c));
    }

    #[test]
    fn test_non_finite_metrics_fall_back_to_price_only() {
        let helper = CopHelper::new(Hemisphere::Northern);
        let normalizer = CopNormalizer::new();
        let s = stats(1.5, 1.0, 0.5, 2.0);
        let c = ctx(&s, &helper, &normalizer, winter_now());

        let metrics = OptimizationMetrics {
            real_heating_cop: f32::NAN,
            real_hot_water_cop: 2.0,
            seasonal_mode: SeasonalMode::Winter,
            optimization_focus: OptimizationFocus::Heating,
            daily_energy_consumption_kwh: 20.0,
            heating_efficiency: 0.8,
            hot_water_efficiency: 0.7,
        };

        let basic = optimizer().calculate_optimal_temperature(&c);
        let fallen_back =
            optimizer().calculate_optimal_temperature_with_real_data(&c, 5.0, Some(&metrics));
        assert_eq!(basic.target_c, fallen_back.target_c);
    }
}
