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

//! Setpoint change constraints.
//!
//! Heat pumps dislike rapid setpoint churn: compressors short-cycle, valves
//! hunt, and the COP suffers. The [`ConstraintManager`] sits between the
//! optimizer and the device and suppresses changes that are too small, too
//! frequent or too large, independently per zone and tank.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use thermion_types::ZoneKind;

use crate::resources::ConstraintConfig;

/// Verdict for one proposed setpoint change
#[derive(Debug, Clone, PartialEq)]
pub enum ConstraintVerdict {
    /// Change accepted as proposed or clamped to the per-cycle ramp limit
    Apply { value_c: f32, clamped: bool },
    /// Change suppressed, current setpoint kept
    Reject { reason: String },
}

impl ConstraintVerdict {
    pub fn applied_value(&self) -> Option<f32> {
        match self {
            Self::Apply { value_c, .. } => Some(*value_c),
            Self::Reject { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ZoneState {
    last_change: DateTime<Utc>,
    last_applied_c: f32,
}

/// Per-zone setpoint change gate.
///
/// Tracks the last applied change per [`ZoneKind`] and enforces the minimum
/// change interval, the deadband and the maximum per-cycle step.
#[derive(Debug, Clone)]
pub struct ConstraintManager {
    config: ConstraintConfig,
    zones: HashMap<ZoneKind, ZoneState>,
}

impl ConstraintManager {
    pub fn new(config: ConstraintConfig) -> Self {
        Self {
            config,
            zones: HashMap::new(),
        }
    }

    fn step_for(&self, zone: ZoneKind) -> f32 {
        match zone {
            ZoneKind::Zone1 | ZoneKind::Zone2 => self.config.temp_step_c,
            ZoneKind::Tank => self.config.tank_step_c,
        }
    }

    /// Effective deadband for a zone. Never smaller than one step, so a
    /// change below device resolution is always suppressed.
    pub fn deadband_for(&self, zone: ZoneKind) -> f32 {
        self.config.min_setpoint_delta_c.max(self.step_for(zone))
    }

    /// Evaluate a proposed setpoint change against all constraints.
    ///
    /// On acceptance the change is recorded as the zone's last applied
    /// change; rejection leaves the recorded state untouched.
    pub fn evaluate(
        &mut self,
        zone: ZoneKind,
        current_c: f32,
        proposed_c: f32,
        now: DateTime<Utc>,
    ) -> ConstraintVerdict {
        let min_interval = Duration::minutes(self.config.min_change_interval_minutes);
        if let Some(state) = self.zones.get(&zone) {
            let elapsed = now - state.last_change;
            if elapsed < min_interval {
                let remaining = (min_interval - elapsed).num_minutes().max(0) + 1;
                let reason = format!(
                    "{}: change interval not elapsed, {remaining} min remaining",
                    zone.display_name()
                );
                tracing::debug!("{reason}");
                return ConstraintVerdict::Reject { reason };
            }
        }

        let delta = proposed_c - current_c;
        let deadband = self.deadband_for(zone);
        if delta.abs() < deadband {
            let reason = format!(
                "{}: delta {:.2}C below deadband {:.2}C",
                zone.display_name(),
                delta.abs(),
                deadband
            );
            tracing::debug!("{reason}");
            return ConstraintVerdict::Reject { reason };
        }

        let max_step = self.config.max_step_per_cycle_c;
        let step = self.step_for(zone);
        let (value_c, clamped) = if delta.abs() > max_step {
            let limited = current_c + max_step.copysign(delta);
            (round_to_step(limited, step), true)
        } else {
            (round_to_step(proposed_c, step), false)
        };

        if clamped {
            tracing::info!(
                "{}: ramp limiting {:.1}C -> {:.1}C (max step {:.1}C)",
                zone.display_name(),
                proposed_c,
                value_c,
                max_step
            );
        }

        self.zones.insert(
            zone,
            ZoneState {
                last_change: now,
                last_applied_c: value_c,
            },
        );
        ConstraintVerdict::Apply { value_c, clamped }
    }

    /// Last setpoint this manager accepted for a zone, if any.
    pub fn last_applied(&self, zone: ZoneKind) -> Option<f32> {
        self.zones.get(&zone).map(|s| s.last_applied_c)
    }

    pub fn last_change(&self, zone: ZoneKind) -> Option<DateTime<Utc>> {
        self.zones.get(&zone).map(|s| s.last_change)
    }
}

fn round_to_step(value_c: f32, step: f32) -> f32 {
    if step <= 0.0 {
        return value_c;
    }
    (value_c / step).round() * step
}
