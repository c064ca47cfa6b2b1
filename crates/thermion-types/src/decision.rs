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

use crate::telemetry::OptimizationMetrics;
use serde::{Deserialize, Serialize};

/// Controlled setpoints, tracked independently by the constraint manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneKind {
    Zone1,
    Zone2,
    Tank,
}

impl ZoneKind {
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Zone1 => "zone1",
            Self::Zone2 => "zone2",
            Self::Tank => "tank",
        }
    }
}

/// Thermal-mass strategy selected for this cycle.
///
/// Recomputed from current inputs each cycle; this is not a persistent state
/// machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThermalStrategy {
    /// Bank heat while price and COP are favorable
    Preheat,
    /// Hold the computed target unchanged
    Maintain,
    /// Let stored heat carry through an expensive window
    Coast,
    /// Aggressively close a temperature deficit during very cheap power
    Boost,
}

impl ThermalStrategy {
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Preheat => "preheat",
            Self::Maintain => "maintain",
            Self::Coast => "coast",
            Self::Boost => "boost",
        }
    }
}

/// Whether a cycle produced a setpoint command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    NoChange,
    TemperatureAdjusted,
}

/// Outcome for one controlled zone or the tank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneChange {
    pub zone: ZoneKind,
    pub from_temp_c: f32,
    pub to_temp_c: f32,
    /// True when the constraint manager let the change through
    pub applied: bool,
    pub reason: String,
}

/// Immutable result of one optimization cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationDecision {
    pub action: DecisionAction,
    pub from_temp_c: f32,
    pub to_temp_c: f32,
    pub strategy: ThermalStrategy,
    pub reason: String,

    /// Present on dual-zone installations
    pub zone2: Option<ZoneChange>,
    /// Present when a tank setpoint was evaluated this cycle
    pub tank: Option<ZoneChange>,

    /// Projected saving for this cycle versus the comfort-ceiling baseline
    pub savings_estimate: f32,

    /// Metrics the decision was based on, if the collaborator supplied any
    pub metrics: Option<OptimizationMetrics>,
}
