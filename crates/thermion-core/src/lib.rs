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

pub mod adaptive;
pub mod constraints;
pub mod cop;
pub mod hotwater;
pub mod optimizer;
pub mod pricing;
pub mod resources;
pub mod savings;
pub mod strategy;
pub mod thermal;
pub mod traits;

pub use adaptive::{AdaptiveLearner, AdaptiveParameters, CycleOutcome};
pub use constraints::{ConstraintManager, ConstraintVerdict};
pub use cop::{CopHelper, CopKind, CopNormalizer, CopSnapshot, CopTimeframe};
pub use hotwater::{
    HotWaterAction, HotWaterInput, HotWaterPlan, HotWaterService, ScheduleEntry, UsageEvent,
    UsagePattern,
};
pub use optimizer::{Optimizer, OptimizerStats};
pub use pricing::{ClassifierOptions, classify, classify_values};
pub use resources::{
    ComfortConfig, ConfigError, ConstraintConfig, CopConfig, EngineConfig, HotWaterConfig,
    SavingsConfig, ThermalConfig,
};
pub use savings::{SavingsRecord, SavingsService, SavingsTotal, comfort_impact};
pub use strategy::{
    StrategyDecision, TargetComputation, TargetContext, TemperatureOptimizer, ThermalMassInput,
    select_strategy,
};
pub use thermal::{
    DailyThermalSummary, ThermalAnalyzer, ThermalCharacteristics, ThermalDataCollector,
    ThermalDataPoint,
};
pub use traits::{
    Clock, DeviceProvider, MetricsProvider, PriceProvider, PriceSeries, SettingsStore,
    SystemClock, WeatherProvider, get_f64_in,
};
