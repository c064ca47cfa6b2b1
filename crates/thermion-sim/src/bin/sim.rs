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

use anyhow::{Result, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use thermion_sim::cli::{
    Cli, Commands, CompareArgs, RunArgs, format_comparison, format_hourly, format_summary,
    load_config, scenario_ids,
};
use thermion_sim::runner::run_simulation;
use thermion_sim::scenarios::{PriceScenario, SCENARIO_PRESETS};

// The whole bench is sequential; one decision cycle at a time
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::Compare(args) => compare(args).await,
    }
}

async fn run(args: RunArgs) -> Result<()> {
    let Some(scenario) = PriceScenario::from_id(&args.scenario) else {
        bail!(
            "unknown scenario '{}', expected one of: {}",
            args.scenario,
            scenario_ids().join(", ")
        );
    };
    let config = load_config(args.config.as_ref())?;

    let result = run_simulation(&scenario, config, args.date, args.hours, args.outdoor).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }
    if args.verbose {
        println!("{}", format_hourly(&result));
    }
    println!("{}", format_summary(&result));
    Ok(())
}

async fn compare(args: CompareArgs) -> Result<()> {
    let config = load_config(args.config.as_ref())?;
    let mut results = Vec::with_capacity(SCENARIO_PRESETS.len());
    for preset in SCENARIO_PRESETS {
        let result = run_simulation(
            &preset.scenario,
            config.clone(),
            args.date,
            24,
            args.outdoor,
        )
        .await?;
        results.push(result);
    }
    println!("{}", format_comparison(&results));
    Ok(())
}
