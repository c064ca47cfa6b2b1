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

//! Test bench for the ThermION decision engine.
//!
//! Runs the real optimizer against a synthetic building and synthetic
//! price days, hour by hour, and reports what it decided and what it
//! would have cost.

pub mod cli;
pub mod plant;
pub mod runner;
pub mod scenarios;

pub use cli::{Cli, Commands, CompareArgs, RunArgs};
pub use plant::{SimPlant, SimProviders};
pub use runner::{HourRecord, SimulationResult, run_simulation};
pub use scenarios::{PriceScenario, SCENARIO_PRESETS, ScenarioPreset};
