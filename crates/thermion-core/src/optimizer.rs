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

//! Decision-cycle orchestrator.
//!
//! The [`Optimizer`] owns one cycle end to end: fetch inputs through the
//! collaborator traits, classify the price, compute a target, pick a
//! thermal-mass strategy, gate everything through the constraint manager
//! and command the device. Price or device fetch failure aborts the cycle
//! with a structured [`CycleError`]; weather and metrics failures only
//! degrade the calculation.
//!
//! Initialization is the one place needing concurrency discipline: any
//! number of concurrent `initialize()` callers share a single execution
//! and settle together. A failed initialization re-arms on the next call.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use thermion_types::{
    CycleError, DecisionAction, DeviceState, OptimizationDecision, OptimizationMetrics,
    PriceClassification, PricePoint, PriceStats, WeatherSnapshot, ZoneChange, ZoneKind,
};
use tokio::sync::watch;

use crate::adaptive::{AdaptiveLearner, CycleOutcome};
use crate::constraints::{ConstraintManager, ConstraintVerdict};
use crate::cop::{CopHelper, CopNormalizer, CopSnapshot, CopTimeframe};
use crate::hotwater::{HotWaterAction, HotWaterInput, HotWaterService};
use crate::pricing::classify;
use crate::resources::{ConfigError, EngineConfig};
use crate::savings::SavingsService;
use crate::strategy::{TargetContext, TemperatureOptimizer, ThermalMassInput, select_strategy};
use crate::thermal::{ThermalAnalyzer, ThermalCharacteristics, ThermalDataCollector, ThermalDataPoint};
use crate::traits::{
    Clock, DeviceProvider, MetricsProvider, PriceProvider, SettingsStore, SystemClock,
    WeatherProvider, get_f64_in,
};

type InitResult = Result<(), String>;

/// Guarded asynchronous initialization state
enum InitState {
    NotStarted,
    /// Leader is running setup; followers wait on this channel
    InProgress(watch::Receiver<Option<InitResult>>),
    Ready,
    Failed(String),
}

/// Classification cache key: a cycle within the same price window and the
/// same (rounded) reference price reuses the previous classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CacheKey {
    latest: Option<DateTime<Utc>>,
    len: usize,
    reference_scaled: i64,
}

impl CacheKey {
    fn new(prices: &[PricePoint], reference: f32) -> Self {
        Self {
            latest: prices.last().map(|p| p.time),
            len: prices.len(),
            reference_scaled: (f64::from(reference) * 1e4).round() as i64,
        }
    }
}

/// Observability snapshot for the presentation layer
#[derive(Debug, Clone, Default, Serialize)]
pub struct OptimizerStats {
    pub cycles: u64,
    pub changes_applied: u64,
    pub changes_suppressed: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_hit_rate: f32,
    pub avg_processing_ms: f32,
    pub last_processing_ms: f32,
}

#[derive(Default)]
struct StatsInner {
    cycles: u64,
    changes_applied: u64,
    changes_suppressed: u64,
    cache_hits: u64,
    cache_misses: u64,
    total_processing_ms: f64,
    last_processing_ms: f32,
}

impl StatsInner {
    fn snapshot(&self) -> OptimizerStats {
        let lookups = self.cache_hits + self.cache_misses;
        OptimizerStats {
            cycles: self.cycles,
            changes_applied: self.changes_applied,
            changes_suppressed: self.changes_suppressed,
            cache_hits: self.cache_hits,
            cache_misses: self.cache_misses,
            cache_hit_rate: if lookups == 0 {
                0.0
            } else {
                self.cache_hits as f32 / lookups as f32
            },
            avg_processing_ms: if self.cycles == 0 {
                0.0
            } else {
                (self.total_processing_ms / self.cycles as f64) as f32
            },
            last_processing_ms: self.last_processing_ms,
        }
    }
}

/// Mutable engine internals, locked only for synchronous computation,
/// never across an await point.
struct EngineState {
    cop_helper: CopHelper,
    cop_normalizer: CopNormalizer,
    collector: ThermalDataCollector,
    analyzer: ThermalAnalyzer,
    learner: AdaptiveLearner,
    temperature: TemperatureOptimizer,
    constraints: ConstraintManager,
    hot_water: HotWaterService,
    classification_cache: Option<(CacheKey, PriceClassification)>,
}

/// Everything a cycle needs, fetched up front
struct CycleInputs {
    series_current: PricePoint,
    prices: Vec<PricePoint>,
    device: DeviceState,
    weather: Option<WeatherSnapshot>,
    metrics: Option<OptimizationMetrics>,
}

/// Setpoint command queued while the engine lock is held
struct PendingCommand {
    zone: ZoneKind,
    value_c: f32,
}

/// One-cycle decision engine over the collaborator providers.
pub struct Optimizer {
    device: Arc<dyn DeviceProvider>,
    prices: Arc<dyn PriceProvider>,
    weather: Option<Arc<dyn WeatherProvider>>,
    metrics: Option<Arc<dyn MetricsProvider>>,
    config: EngineConfig,
    savings: SavingsService,
    clock: Arc<dyn Clock>,
    settings: Option<Arc<dyn SettingsStore>>,
    init: Mutex<InitState>,
    engine: Mutex<EngineState>,
    stats: Mutex<StatsInner>,
}

impl Optimizer {
    /// Build an engine from validated configuration and its collaborators.
    pub fn new(
        config: EngineConfig,
        device: Arc<dyn DeviceProvider>,
        prices: Arc<dyn PriceProvider>,
        weather: Option<Arc<dyn WeatherProvider>>,
        metrics: Option<Arc<dyn MetricsProvider>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let now = clock.now();
        let learner = AdaptiveLearner::default();
        let engine = EngineState {
            cop_helper: CopHelper::new(config.cop.hemisphere),
            cop_normalizer: CopNormalizer::new(),
            collector: ThermalDataCollector::new(
                config.thermal.max_raw_points,
                config.thermal.retention_hours,
                config.thermal.max_summary_days,
            ),
            analyzer: ThermalAnalyzer::new(config.thermal.min_data_points, now),
            temperature: TemperatureOptimizer::new(config.cop.clone(), learner.parameters()),
            learner,
            constraints: ConstraintManager::new(config.constraints.clone()),
            hot_water: HotWaterService::new(config.hot_water.clone()),
            classification_cache: None,
        };
        let savings = SavingsService::new(config.savings.clone(), Some(prices.clone()));
        Ok(Self {
            device,
            prices,
            weather,
            metrics,
            config,
            savings,
            clock,
            settings: None,
            init: Mutex::new(InitState::NotStarted),
            engine: Mutex::new(engine),
            stats: Mutex::new(StatsInner::default()),
        })
    }

    /// Replace the time source; the simulator injects plant time here.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Attach a settings store. Runtime-tunable values (comfort bounds,
    /// COP weight, percentile thresholds) are re-read through it every
    /// cycle, each validated against its range with the configured value
    /// as fallback.
    #[must_use]
    pub fn with_settings(mut self, settings: Arc<dyn SettingsStore>) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Run the guarded one-time setup.
    ///
    /// Concurrent callers share one execution: the first caller becomes the
    /// leader, everyone else waits on the settle channel and resolves with
    /// the leader's result. After a failure the next call starts over.
    pub async fn initialize(&self) -> Result<(), CycleError> {
        // Lead(tx): this caller runs setup; Follow(rx): wait on the leader.
        // The await happens outside this block so the lock guard is not
        // captured across a suspension point (keeps the future `Send`).
        enum Role {
            Lead(watch::Sender<Option<InitResult>>),
            Follow(watch::Receiver<Option<InitResult>>),
        }
        let role = {
            let mut state = self.init.lock();
            match &*state {
                InitState::Ready => return Ok(()),
                InitState::InProgress(rx) => {
                    if rx.has_changed().is_ok() {
                        Role::Follow(rx.clone())
                    } else {
                        // The leader's future was dropped before settling,
                        // leaving a closed channel behind; take over
                        tracing::warn!("Initialization aborted mid-flight, restarting");
                        let (tx, rx) = watch::channel(None);
                        *state = InitState::InProgress(rx);
                        Role::Lead(tx)
                    }
                }
                InitState::NotStarted => {
                    let (tx, rx) = watch::channel(None);
                    *state = InitState::InProgress(rx);
                    Role::Lead(tx)
                }
                InitState::Failed(msg) => {
                    tracing::info!("Retrying initialization after earlier failure: {msg}");
                    let (tx, rx) = watch::channel(None);
                    *state = InitState::InProgress(rx);
                    Role::Lead(tx)
                }
            }
        };
        let tx = match role {
            Role::Lead(tx) => tx,
            Role::Follow(rx) => return Self::await_settle(rx).await,
        };

        let result = self.run_initialization().await;
        {
            let mut state = self.init.lock();
            *state = match &result {
                Ok(()) => InitState::Ready,
                Err(msg) => InitState::Failed(msg.clone()),
            };
        }
        let _ = tx.send(Some(result.clone()));
        result.map_err(CycleError::DeviceUnavailable)
    }

    async fn await_settle(
        mut rx: watch::Receiver<Option<InitResult>>,
    ) -> Result<(), CycleError> {
        loop {
            let settled = rx.borrow_and_update().clone();
            if let Some(result) = settled {
                return result.map_err(CycleError::DeviceUnavailable);
            }
            if rx.changed().await.is_err() {
                return Err(CycleError::NotInitialized(
                    "initialization aborted before settling".to_owned(),
                ));
            }
        }
    }

    async fn run_initialization(&self) -> InitResult {
        tracing::info!("Initializing optimizer against '{}'", self.device.name());
        let state = self
            .device
            .get_device_state()
            .await
            .map_err(|e| format!("{e:#}"))?;
        let now = self.clock.now();

        let mut engine = self.engine.lock();
        engine
            .collector
            .add_sample(sample_from(&state, None), now);
        let raw = engine.collector.raw_points();
        let summaries = engine.collector.summaries().to_vec();
        // Cold start: keeps the zeroed fit until enough samples arrive
        let _ = engine.analyzer.update_model(&raw, &summaries, now);
        tracing::info!("Optimizer initialized");
        Ok(())
    }

    /// Whether `initialize()` has completed successfully.
    pub fn is_ready(&self) -> bool {
        matches!(&*self.init.lock(), InitState::Ready)
    }

    /// Execute one full decision cycle.
    pub async fn run_cycle(&self) -> Result<OptimizationDecision, CycleError> {
        if !self.is_ready() {
            return Err(CycleError::NotInitialized(
                "run_cycle called before initialize()".to_owned(),
            ));
        }
        let started = Instant::now();
        let inputs = self.fetch_inputs().await?;
        let now = self.clock.now();
        let config = self.cycle_config();

        let (mut decision, pending, hourly_savings) = {
            let mut engine = self.engine.lock();
            self.decide(&mut engine, &inputs, &config, now)
        };

        decision.savings_estimate = self.savings.calculate_daily_savings(hourly_savings, now).await;
        self.dispatch(&mut decision, pending).await;
        self.finish_stats(&decision, started);
        Ok(decision)
    }

    /// Background maintenance: thermal aggregation, model refit and COP
    /// snapshotting. Runs off the decision path; every failure is logged
    /// and swallowed.
    pub async fn maintain(&self) {
        let metrics = match &self.metrics {
            Some(provider) => match provider.get_metrics().await {
                Ok(m) => Some(m),
                Err(err) => {
                    tracing::warn!(
                        "Metrics provider '{}' failed during maintenance: {err:#}",
                        provider.name()
                    );
                    None
                }
            },
            None => None,
        };

        let now = self.clock.now();
        let mut engine = self.engine.lock();
        engine.collector.aggregate(now);
        let raw = engine.collector.raw_points();
        let summaries = engine.collector.summaries().to_vec();
        let _ = engine.analyzer.update_model(&raw, &summaries, now);

        if let Some(m) = metrics {
            engine.cop_normalizer.update_range(m.real_heating_cop);
            engine.cop_normalizer.update_range(m.real_hot_water_cop);
            engine.cop_helper.record(
                CopTimeframe::Daily,
                CopSnapshot {
                    timestamp: now,
                    heating_cop: m.real_heating_cop,
                    hot_water_cop: m.real_hot_water_cop,
                },
            );
        }
    }

    /// Current fitted thermal characteristics.
    pub fn thermal_characteristics(&self) -> ThermalCharacteristics {
        self.engine.lock().analyzer.characteristics()
    }

    pub fn stats(&self) -> OptimizerStats {
        self.stats.lock().snapshot()
    }

    async fn fetch_inputs(&self) -> Result<CycleInputs, CycleError> {
        let series = self
            .prices
            .get_prices()
            .await
            .map_err(|e| CycleError::PriceUnavailable(format!("{e:#}")))?;
        let device = self
            .device
            .get_device_state()
            .await
            .map_err(|e| CycleError::DeviceUnavailable(format!("{e:#}")))?;

        let weather = match &self.weather {
            Some(provider) => match provider.get_current_weather().await {
                Ok(snapshot) => Some(snapshot),
                Err(err) => {
                    tracing::warn!(
                        "Weather provider '{}' failed, thermal samples lose wind data: {err:#}",
                        provider.name()
                    );
                    None
                }
            },
            None => None,
        };
        let metrics = match &self.metrics {
            Some(provider) => match provider.get_metrics().await {
                Ok(m) => Some(m),
                Err(err) => {
                    tracing::warn!(
                        "Metrics provider '{}' failed, falling back to price-only: {err:#}",
                        provider.name()
                    );
                    None
                }
            },
            None => None,
        };

        Ok(CycleInputs {
            series_current: series.current,
            prices: series.prices,
            device,
            weather,
            metrics,
        })
    }

    /// Per-cycle configuration view: the validated base config with any
    /// runtime overrides read from the settings store. Every stored value
    /// is range-checked by [`get_f64_in`] and falls back to the configured
    /// one; an inverted stored band reverts as a pair.
    fn cycle_config(&self) -> EngineConfig {
        let mut config = self.config.clone();
        let Some(store) = &self.settings else {
            return config;
        };
        let store = store.as_ref();

        let comfort = &mut config.comfort;
        comfort.min_temp_c =
            get_f64_in(store, "comfort_min_temp_c", 5.0, 30.0, f64::from(comfort.min_temp_c))
                as f32;
        comfort.max_temp_c =
            get_f64_in(store, "comfort_max_temp_c", 5.0, 30.0, f64::from(comfort.max_temp_c))
                as f32;
        if comfort.min_temp_c >= comfort.max_temp_c {
            tracing::warn!(
                "Stored comfort bounds [{:.1}, {:.1}] invert the band, keeping configured values",
                comfort.min_temp_c,
                comfort.max_temp_c
            );
            comfort.min_temp_c = self.config.comfort.min_temp_c;
            comfort.max_temp_c = self.config.comfort.max_temp_c;
        }

        config.cop.cop_weight =
            get_f64_in(store, "cop_weight", 0.0, 1.0, f64::from(config.cop.cop_weight)) as f32;
        config.classifier.cheap_percentile = get_f64_in(
            store,
            "cheap_percentile",
            0.0,
            100.0,
            f64::from(config.classifier.cheap_percentile),
        ) as f32;
        config.classifier.expensive_percentile = get_f64_in(
            store,
            "expensive_percentile",
            0.0,
            100.0,
            f64::from(config.classifier.expensive_percentile),
        ) as f32;
        config
    }

    /// Synchronous decision core; the engine lock is held for the duration.
    fn decide(
        &self,
        engine: &mut EngineState,
        inputs: &CycleInputs,
        config: &EngineConfig,
        now: DateTime<Utc>,
    ) -> (OptimizationDecision, Vec<PendingCommand>, f32) {
        let device = &inputs.device;
        let current_price = inputs.series_current.price;

        let classification = engine.classify_cached(
            &inputs.prices,
            current_price,
            &config.classifier,
            &self.stats,
        );
        let stats = PriceStats::from_series(&inputs.prices, current_price);

        if let Some(m) = &inputs.metrics {
            engine.cop_normalizer.update_range(m.real_heating_cop);
            engine.cop_normalizer.update_range(m.real_hot_water_cop);
        }
        engine
            .collector
            .add_sample(sample_from(device, inputs.weather), now);

        engine.temperature.set_parameters(engine.learner.parameters());
        engine.temperature.set_cop_config(config.cop.clone());
        let band = config.comfort.band();
        let ctx = TargetContext {
            stats: &stats,
            current_temp_c: device.indoor_temp_c,
            band,
            now,
            cop_helper: &engine.cop_helper,
            cop_normalizer: &engine.cop_normalizer,
        };
        let computation = engine.temperature.calculate_optimal_temperature_with_real_data(
            &ctx,
            device.outdoor_temp_c,
            inputs.metrics.as_ref(),
        );

        let cop_normalized = engine.seasonal_cop_normalized(now, inputs.metrics.as_ref());
        let window = forward_window(&inputs.prices, now);
        let strategy_decision = select_strategy(&ThermalMassInput {
            current_temp_c: device.indoor_temp_c,
            target_temp_c: computation.target_c,
            band,
            current_price,
            price_window: &window,
            cop_normalized,
            params: engine.learner.parameters(),
        });

        let mut pending = Vec::new();

        // Zone 1
        let zone1_from = device.target_temp_c;
        let zone1_verdict =
            engine
                .constraints
                .evaluate(ZoneKind::Zone1, zone1_from, strategy_decision.target_c, now);
        let zone1_to = zone1_verdict.applied_value().unwrap_or(zone1_from);
        let zone1_applied = zone1_verdict.applied_value().is_some();
        if zone1_applied {
            pending.push(PendingCommand {
                zone: ZoneKind::Zone1,
                value_c: zone1_to,
            });
        }

        // Zone 2 follows the same nominal target inside its own band
        let zone2 = match (device.zone2_temp_c, config.comfort.zone2_band()) {
            (Some(_), Some(z2_band)) => {
                let from = device.zone2_target_c.unwrap_or(z2_band.midpoint());
                let proposed = z2_band.clamp(strategy_decision.target_c);
                let verdict = engine.constraints.evaluate(ZoneKind::Zone2, from, proposed, now);
                let applied = verdict.applied_value().is_some();
                let to = verdict.applied_value().unwrap_or(from);
                if applied {
                    pending.push(PendingCommand {
                        zone: ZoneKind::Zone2,
                        value_c: to,
                    });
                }
                Some(ZoneChange {
                    zone: ZoneKind::Zone2,
                    from_temp_c: from,
                    to_temp_c: to,
                    applied,
                    reason: verdict_reason(&verdict, "following zone1 target"),
                })
            }
            _ => None,
        };

        // Tank via the hot-water schedule
        let plan = engine.hot_water.optimize_schedule(&HotWaterInput {
            tank_temp_c: device.tank_temp_c,
            current_price,
            prices: &inputs.prices,
            cop_normalized,
            now,
        });
        let tank_from = device.tank_target_c.unwrap_or(device.tank_temp_c);
        let tank_proposed = match plan.immediate_action {
            HotWaterAction::Heat | HotWaterAction::Preheat => config.hot_water.max_tank_temp_c,
            HotWaterAction::Off => config.hot_water.min_tank_temp_c,
        };
        let tank_verdict = engine
            .constraints
            .evaluate(ZoneKind::Tank, tank_from, tank_proposed, now);
        let tank_applied = tank_verdict.applied_value().is_some();
        let tank_to = tank_verdict.applied_value().unwrap_or(tank_from);
        if tank_applied {
            pending.push(PendingCommand {
                zone: ZoneKind::Tank,
                value_c: tank_to,
            });
        }
        let tank = Some(ZoneChange {
            zone: ZoneKind::Tank,
            from_temp_c: tank_from,
            to_temp_c: tank_to,
            applied: tank_applied,
            reason: verdict_reason(
                &tank_verdict,
                plan.immediate_action.display_name(),
            ),
        });

        // Savings against the comfort ceiling. A suppressed change still
        // credits holding below the ceiling.
        let effective_target = if zone1_applied { zone1_to } else { zone1_from };
        let hourly_savings = match &inputs.metrics {
            Some(m) => self.savings.calculate_real_hourly_savings(
                effective_target,
                band.max_temp_c,
                current_price,
                ZoneKind::Zone1,
                m,
            ),
            None => self.savings.calculate_savings(
                effective_target,
                band.max_temp_c,
                current_price,
                ZoneKind::Zone1,
            ),
        };

        let season = engine.cop_helper.seasonal_mode(now);
        engine.learner.record_outcome(CycleOutcome {
            season,
            projected_saving: hourly_savings,
            comfort_deficit_c: (band.min_temp_c - device.indoor_temp_c).max(0.0),
        });

        let mut reasons = computation.reasons;
        reasons.push(format!(
            "price {} (percentile {:.0})",
            classification.level.display_name(),
            classification.percentile
        ));
        reasons.push(strategy_decision.reason.clone());
        if !zone1_applied {
            if let ConstraintVerdict::Reject { reason } = &zone1_verdict {
                reasons.push(reason.clone());
            }
        }

        let decision = OptimizationDecision {
            action: if zone1_applied || zone2.as_ref().is_some_and(|z| z.applied) || tank_applied {
                DecisionAction::TemperatureAdjusted
            } else {
                DecisionAction::NoChange
            },
            from_temp_c: zone1_from,
            to_temp_c: zone1_to,
            strategy: strategy_decision.strategy,
            reason: reasons.join("; "),
            zone2,
            tank,
            savings_estimate: hourly_savings,
            metrics: inputs.metrics.clone(),
        };
        (decision, pending, hourly_savings)
    }

    /// Send queued setpoints. A refused or failed command downgrades the
    /// corresponding change to not-applied; the cycle itself still succeeds.
    async fn dispatch(&self, decision: &mut OptimizationDecision, pending: Vec<PendingCommand>) {
        for command in pending {
            let accepted = match self
                .device
                .set_temperature(command.zone, command.value_c)
                .await
            {
                Ok(accepted) => accepted,
                Err(err) => {
                    tracing::warn!(
                        "Device '{}' rejected {} setpoint {:.1}C: {err:#}",
                        self.device.name(),
                        command.zone.display_name(),
                        command.value_c
                    );
                    false
                }
            };
            if accepted {
                continue;
            }
            match command.zone {
                ZoneKind::Zone1 => {
                    decision.to_temp_c = decision.from_temp_c;
                }
                ZoneKind::Zone2 => {
                    if let Some(z) = decision.zone2.as_mut() {
                        z.applied = false;
                        z.to_temp_c = z.from_temp_c;
                    }
                }
                ZoneKind::Tank => {
                    if let Some(t) = decision.tank.as_mut() {
                        t.applied = false;
                        t.to_temp_c = t.from_temp_c;
                    }
                }
            }
        }
    }

    fn finish_stats(&self, decision: &OptimizationDecision, started: Instant) {
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        let mut stats = self.stats.lock();
        stats.cycles += 1;
        if decision.action == DecisionAction::TemperatureAdjusted {
            stats.changes_applied += 1;
        } else {
            stats.changes_suppressed += 1;
        }
        stats.total_processing_ms += elapsed_ms;
        stats.last_processing_ms = elapsed_ms as f32;
    }
}

impl EngineState {
    fn classify_cached(
        &mut self,
        prices: &[PricePoint],
        reference: f32,
        options: &crate::pricing::ClassifierOptions,
        stats: &Mutex<StatsInner>,
    ) -> PriceClassification {
        let key = CacheKey::new(prices, reference);
        if let Some((cached_key, cached)) = &self.classification_cache {
            if *cached_key == key {
                stats.lock().cache_hits += 1;
                return cached.clone();
            }
        }
        stats.lock().cache_misses += 1;
        let classification = classify(prices, reference, options);
        self.classification_cache = Some((key, classification.clone()));
        classification
    }

    /// Normalized COP for strategy selection: real metrics win, then the
    /// helper's seasonal average, then a neutral 0.5.
    fn seasonal_cop_normalized(
        &self,
        now: DateTime<Utc>,
        metrics: Option<&OptimizationMetrics>,
    ) -> f32 {
        let raw = match metrics {
            Some(m) => match self.cop_helper.seasonal_mode(now) {
                thermion_types::SeasonalMode::Summer => Some(m.real_hot_water_cop),
                _ => Some(m.real_heating_cop),
            },
            None => self.cop_helper.get_seasonal_cop(now),
        };
        match raw {
            Some(cop) if cop.is_finite() && cop > 0.0 => self.cop_normalizer.normalize(cop),
            _ => 0.5,
        }
    }
}

fn verdict_reason(verdict: &ConstraintVerdict, applied_reason: &str) -> String {
    match verdict {
        ConstraintVerdict::Apply { clamped: true, .. } => {
            format!("{applied_reason} (ramp limited)")
        }
        ConstraintVerdict::Apply { clamped: false, .. } => applied_reason.to_owned(),
        ConstraintVerdict::Reject { reason } => reason.clone(),
    }
}

fn sample_from(state: &DeviceState, weather: Option<WeatherSnapshot>) -> ThermalDataPoint {
    ThermalDataPoint {
        timestamp: state.timestamp,
        indoor_temp_c: state.indoor_temp_c,
        outdoor_temp_c: state.outdoor_temp_c,
        target_temp_c: state.target_temp_c,
        heating_active: state.heating_active,
        weather: weather.unwrap_or_default(),
    }
}

/// Forward-looking slice of the price window, current hour included.
fn forward_window(prices: &[PricePoint], now: DateTime<Utc>) -> Vec<PricePoint> {
    let cutoff = now - Duration::hours(1);
    let window: Vec<PricePoint> = prices.iter().filter(|p| p.time >= cutoff).cloned().collect();
    if window.is_empty() {
        prices.to_vec()
    } else {
        window
    }
}
