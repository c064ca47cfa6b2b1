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

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thermion_types::{DeviceState, OptimizationMetrics, PricePoint, WeatherSnapshot, ZoneKind};

/// Time source for the engine.
///
/// Production runs on the host clock; the test bench substitutes simulated
/// time so the interval gates, the forward price window and the seasonal
/// logic all follow the replayed day instead of the wall clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Host wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Current spot quote plus the forecast window, as returned by the provider
#[derive(Debug, Clone)]
pub struct PriceSeries {
    /// Quote covering the current hour
    pub current: PricePoint,

    /// Forecast window, typically today plus day-ahead once published.
    /// May be empty; the classifier tolerates a cold start.
    pub prices: Vec<PricePoint>,
}

/// Generic data source for reading device telemetry and writing setpoints.
/// Business logic uses this trait, never knows about cloud API details.
#[async_trait]
pub trait DeviceProvider: Send + Sync {
    /// Read current device telemetry
    async fn get_device_state(&self) -> Result<DeviceState>;

    /// Command a new setpoint for a zone or the tank.
    /// Returns `false` when the device acknowledged but refused the change.
    async fn set_temperature(&self, zone: ZoneKind, value_c: f32) -> Result<bool>;

    /// Get data source name for logging
    fn name(&self) -> &str;
}

/// Generic data source for reading electricity price data
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Read the current quote and forecast window
    async fn get_prices(&self) -> Result<PriceSeries>;

    /// Get data source name for logging
    fn name(&self) -> &str;
}

/// Optional weather observation source
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn get_current_weather(&self) -> Result<WeatherSnapshot>;

    /// Get data source name for logging
    fn name(&self) -> &str;
}

/// Optional source of real per-cycle efficiency metrics.
/// Absence or failure degrades the engine to price-only behavior.
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    async fn get_metrics(&self) -> Result<OptimizationMetrics>;

    /// Get data source name for logging
    fn name(&self) -> &str;
}

/// Synchronous store of named scalar settings (comfort bounds, step sizes,
/// COP weight, percentile thresholds).
///
/// Values are untrusted: callers validate through [`get_f64_in`] and fall
/// back to a documented default on a missing or out-of-range value.
pub trait SettingsStore: Send + Sync {
    fn get_f64(&self, key: &str) -> Option<f64>;
    fn set_f64(&self, key: &str, value: f64);
}

/// Range-validated read with fallback; the single path through which the
/// engine consumes stored settings.
pub fn get_f64_in(
    store: &dyn SettingsStore,
    key: &str,
    min: f64,
    max: f64,
    default: f64,
) -> f64 {
    match store.get_f64(key) {
        Some(v) if v.is_finite() && v >= min && v <= max => v,
        Some(v) => {
            tracing::warn!(
                "Setting '{}' = {} outside [{}, {}], using default {}",
                key,
                v,
                min,
                max,
                default
            );
            default
        }
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    struct MapStore(Mutex<HashMap<String, f64>>);

    impl SettingsStore for MapStore {
        fn get_f64(&self, key: &str) -> Option<f64> {
            self.0.lock().get(key).copied()
        }
        fn set_f64(&self, key: &str, value: f64) {
            self.0.lock().insert(key.to_owned(), value);
        }
    }

    #[test]
    fn test_get_f64_in_validates_range() {
        let store = MapStore(Mutex::new(HashMap::new()));
        store.set_f64("cop_weight", 0.3);
        assert_eq!(get_f64_in(&store, "cop_weight", 0.0, 1.0, 0.1), 0.3);

        store.set_f64("cop_weight", 4.2);
        assert_eq!(get_f64_in(&store, "cop_weight", 0.0, 1.0, 0.1), 0.1);

        assert_eq!(get_f64_in(&store, "missing", 0.0, 1.0, 0.5), 0.5);
    }
}
