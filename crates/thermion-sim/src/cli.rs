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

//! CLI argument definitions and table output.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use comfy_table::{Attribute, Cell, Color, Table, presets::UTF8_FULL};
use thermion_core::EngineConfig;
use thermion_types::ThermalStrategy;

use crate::runner::SimulationResult;
use crate::scenarios::SCENARIO_PRESETS;

#[derive(Parser)]
#[command(name = "thermion-sim")]
#[command(author, version, about = "ThermION Decision Engine Test Bench")]
#[command(
    long_about = "Runs the heat-pump decision engine against a synthetic building and\n\
    synthetic day-ahead price days, hour by hour.\n\
    \nExamples:\n  \
    thermion-sim run                          # Quick test with the usual-day scenario\n  \
    thermion-sim run --scenario volatile      # Stress thermal-mass strategies\n  \
    thermion-sim compare                      # All scenarios side by side"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Simulate one price scenario and print the hourly decision log
    Run(RunArgs),

    /// Run every scenario and compare savings side by side
    Compare(CompareArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// Price scenario (usual_day, elevated_day, volatile, negative)
    #[arg(long, default_value = "usual_day")]
    pub scenario: String,

    /// Simulated day, YYYY-MM-DD
    #[arg(long, default_value = "2025-01-20")]
    pub date: NaiveDate,

    /// Simulated hours
    #[arg(long, default_value_t = 24)]
    pub hours: u32,

    /// Mean outdoor temperature in degrees Celsius
    #[arg(long, default_value_t = -2.0)]
    pub outdoor: f32,

    /// Engine configuration file (TOML); defaults apply when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the full hourly decision log, not just the summary
    #[arg(long, default_value_t = false)]
    pub verbose: bool,

    /// Emit the full result as JSON instead of tables
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Parser)]
pub struct CompareArgs {
    /// Simulated day, YYYY-MM-DD
    #[arg(long, default_value = "2025-01-20")]
    pub date: NaiveDate,

    /// Mean outdoor temperature in degrees Celsius
    #[arg(long, default_value_t = -2.0)]
    pub outdoor: f32,

    /// Engine configuration file (TOML); defaults apply when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Load the engine configuration, falling back to defaults.
pub fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: EngineConfig =
        toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

fn strategy_cell(strategy: ThermalStrategy) -> Cell {
    let name = strategy.display_name();
    match strategy {
        ThermalStrategy::Preheat | ThermalStrategy::Boost => Cell::new(name).fg(Color::Green),
        ThermalStrategy::Coast => Cell::new(name).fg(Color::Yellow),
        ThermalStrategy::Maintain => Cell::new(name),
    }
}

/// Hourly decision log as a pretty table
pub fn format_hourly(result: &SimulationResult) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Hour").add_attribute(Attribute::Bold),
        Cell::new("Price").add_attribute(Attribute::Bold),
        Cell::new("Indoor\n(C)").add_attribute(Attribute::Bold),
        Cell::new("Target\n(C)").add_attribute(Attribute::Bold),
        Cell::new("Strategy").add_attribute(Attribute::Bold),
        Cell::new("Applied").add_attribute(Attribute::Bold),
    ]);

    for record in &result.records {
        table.add_row(vec![
            Cell::new(format!("{:02}:00", record.hour)),
            Cell::new(format!("{:.2}", record.price)),
            Cell::new(format!("{:.1}", record.indoor_temp_c)),
            Cell::new(format!("{:.1}", record.target_temp_c)),
            strategy_cell(record.strategy),
            Cell::new(if record.applied { "yes" } else { "-" }),
        ]);
    }
    table.to_string()
}

/// One-scenario summary block
pub fn format_summary(result: &SimulationResult) -> String {
    format!(
        "Scenario: {}\n\
         Cost: {:.2}  Baseline: {:.2}  Savings: {:.2} ({:.1}%)\n\
         Energy: {:.1} kWh  Comfort violations: {}\n\
         Cycles: {}  Cache hit rate: {:.0}%  Avg cycle: {:.2} ms",
        result.scenario_name,
        result.cost,
        result.baseline_cost,
        result.savings(),
        result.savings_percent(),
        result.consumed_kwh,
        result.comfort_violations,
        result.stats.cycles,
        result.stats.cache_hit_rate * 100.0,
        result.stats.avg_processing_ms,
    )
}

/// Cross-scenario comparison table
pub fn format_comparison(results: &[SimulationResult]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Scenario").add_attribute(Attribute::Bold),
        Cell::new("Cost").add_attribute(Attribute::Bold),
        Cell::new("Baseline").add_attribute(Attribute::Bold),
        Cell::new("Savings").add_attribute(Attribute::Bold),
        Cell::new("Energy\n(kWh)").add_attribute(Attribute::Bold),
        Cell::new("Violations").add_attribute(Attribute::Bold),
    ]);

    let best = results
        .iter()
        .map(SimulationResult::savings_percent)
        .fold(f32::MIN, f32::max);

    for result in results {
        let name_cell = if (result.savings_percent() - best).abs() < f32::EPSILON {
            Cell::new(&result.scenario_name)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold)
        } else {
            Cell::new(&result.scenario_name)
        };
        table.add_row(vec![
            name_cell,
            Cell::new(format!("{:.2}", result.cost)),
            Cell::new(format!("{:.2}", result.baseline_cost)),
            Cell::new(format!("{:.2} ({:.1}%)", result.savings(), result.savings_percent())),
            Cell::new(format!("{:.1}", result.consumed_kwh)),
            Cell::new(result.comfort_violations.to_string()),
        ]);
    }
    table.to_string()
}

/// Known scenario ids for error messages
pub fn scenario_ids() -> Vec<&'static str> {
    SCENARIO_PRESETS.iter().map(|p| p.id).collect()
}
