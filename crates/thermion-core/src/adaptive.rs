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

//! Tunable strategy thresholds, slowly adjusted from observed outcomes.
//!
//! When no learner is wired in, the hardcoded defaults below apply. Learning
//! is deliberately conservative: one bounded nudge per recorded cycle, hard
//! clamps on every parameter, and validation that rejects out-of-domain
//! reconfiguration without touching the current values.

use serde::{Deserialize, Serialize};
use thermion_types::SeasonalMode;

use crate::resources::ConfigError;

const LEARNING_RATE: f32 = 0.02;

/// Strategy thresholds consumed by the temperature optimizer
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AdaptiveParameters {
    /// How strongly the price position steers the target, per season
    pub price_weight_winter: f32,
    pub price_weight_summer: f32,
    pub price_weight_transition: f32,

    /// Normalized-COP band edges
    pub cop_excellent_threshold: f32,
    pub cop_good_threshold: f32,
    pub cop_minimum_threshold: f32,

    /// Scales the preheat/boost raise above the nominal target, 0..1
    pub aggressiveness: f32,
}

impl Default for AdaptiveParameters {
    fn default() -> Self {
        Self {
            price_weight_winter: 0.7,
            price_weight_summer: 0.4,
            price_weight_transition: 0.55,
            cop_excellent_threshold: 0.8,
            cop_good_threshold: 0.5,
            cop_minimum_threshold: 0.2,
            aggressiveness: 0.5,
        }
    }
}

impl AdaptiveParameters {
    #[must_use]
    pub fn price_weight(&self, season: SeasonalMode) -> f32 {
        match season {
            SeasonalMode::Winter => self.price_weight_winter,
            SeasonalMode::Summer => self.price_weight_summer,
            SeasonalMode::Transition => self.price_weight_transition,
        }
    }
}

/// Outcome of one completed cycle, fed back into the learner
#[derive(Debug, Clone, Copy)]
pub struct CycleOutcome {
    pub season: SeasonalMode,
    /// Projected saving of the cycle (negative on a cost increase)
    pub projected_saving: f32,
    /// How far below the comfort minimum the zone actually drifted, in
    /// degrees; 0 when comfort held
    pub comfort_deficit_c: f32,
}

/// Holds the parameters and adjusts them from historical outcomes
#[derive(Debug, Clone, Default)]
pub struct AdaptiveLearner {
    params: AdaptiveParameters,
    recorded: u64,
}

impl AdaptiveLearner {
    #[must_use]
    pub fn new(params: AdaptiveParameters) -> Self {
        Self {
            params,
            recorded: 0,
        }
    }

    #[must_use]
    pub fn parameters(&self) -> AdaptiveParameters {
        self.params
    }

    /// Replace the COP band thresholds, validating the ordering invariant.
    /// On error the current thresholds are left unchanged.
    pub fn set_cop_thresholds(
        &mut self,
        minimum: f32,
        good: f32,
        excellent: f32,
    ) -> Result<(), ConfigError> {
        let ordered = 0.0 <= minimum && minimum < good && good < excellent && excellent <= 1.0;
        if !ordered {
            return Err(ConfigError::CopThresholdOrder {
                minimum,
                good,
                excellent,
            });
        }
        self.params.cop_minimum_threshold = minimum;
        self.params.cop_good_threshold = good;
        self.params.cop_excellent_threshold = excellent;
        Ok(())
    }

    /// One bounded adjustment step from a finished cycle.
    ///
    /// Savings without comfort loss push aggressiveness and the seasonal
    /// price weight up; a comfort deficit pushes both down twice as hard.
    pub fn record_outcome(&mut self, outcome: CycleOutcome) {
        self.recorded += 1;

        let direction = if outcome.comfort_deficit_c > 0.0 {
            -2.0
        } else if outcome.projected_saving > 0.0 {
            1.0
        } else {
            0.0
        };
        if direction == 0.0 {
            return;
        }

        let step = LEARNING_RATE * direction;
        self.params.aggressiveness = (self.params.aggressiveness + step).clamp(0.1, 0.9);

        let weight = match outcome.season {
            SeasonalMode::Winter => &mut self.params.price_weight_winter,
            SeasonalMode::Summer => &mut self.params.price_weight_summer,
            SeasonalMode::Transition => &mut self.params.price_weight_transition,
        };
        *weight = (*weight + step).clamp(0.1, 1.0);
    }

    #[must_use]
    pub fn recorded_outcomes(&self) -> u64 {
        self.recorded
    }
}
