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

//! Synthetic building and collaborator providers.
//!
//! A deliberately simple first-order plant: indoor temperature relaxes
//! toward outdoor and is pulled up by the heat pump while the setpoint is
//! above it. Good enough to exercise every engine branch, not a building
//! simulator.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Timelike, Utc};
use parking_lot::Mutex;
use thermion_core::traits::{
    Clock, DeviceProvider, MetricsProvider, PriceProvider, PriceSeries, WeatherProvider,
};
use thermion_types::{
    DeviceState, Hemisphere, OptimizationFocus, OptimizationMetrics, PricePoint, SeasonalMode,
    WeatherSnapshot, ZoneKind,
};

/// Heating pull toward the setpoint, degrees per hour
const HEATING_RATE_C_PER_H: f32 = 1.5;
/// Fraction of the indoor/outdoor gap lost per hour
const LOSS_COEFFICIENT: f32 = 0.02;
const TANK_HEAT_RATE_C_PER_H: f32 = 6.0;
const TANK_STANDING_LOSS_C_PER_H: f32 = 0.4;
/// Electrical draw while the heat pump runs space heating
const HEATING_DRAW_KW: f32 = 1.5;
const TANK_DRAW_KW: f32 = 2.0;

struct PlantState {
    now: DateTime<Utc>,
    indoor_temp_c: f32,
    tank_temp_c: f32,
    target_temp_c: f32,
    tank_target_c: f32,
    outdoor_base_c: f32,
    prices: Vec<PricePoint>,
    consumed_kwh: f32,
    cost: f32,
    baseline_cost: f32,
    comfort_ceiling_c: f32,
    set_temperature_calls: u32,
}

impl PlantState {
    fn outdoor_temp(&self) -> f32 {
        // Coldest at 04:00, warmest at 16:00
        let hour = self.now.hour() as f32 + self.now.minute() as f32 / 60.0;
        let phase = (hour - 16.0) / 24.0 * std::f32::consts::TAU;
        self.outdoor_base_c + 4.0 * phase.cos()
    }

    fn current_price(&self) -> f32 {
        let hour = self.now.hour();
        self.prices
            .iter()
            .find(|p| p.time.hour() == hour)
            .map_or(0.0, |p| p.price)
    }
}

/// Shared synthetic plant the providers read from and the runner advances.
#[derive(Clone)]
pub struct SimPlant {
    state: Arc<Mutex<PlantState>>,
}

impl SimPlant {
    pub fn new(
        start: DateTime<Utc>,
        prices: Vec<PricePoint>,
        outdoor_base_c: f32,
        comfort_ceiling_c: f32,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(PlantState {
                now: start,
                indoor_temp_c: 20.5,
                tank_temp_c: 44.0,
                target_temp_c: 21.0,
                tank_target_c: 45.0,
                outdoor_base_c,
                prices,
                consumed_kwh: 0.0,
                cost: 0.0,
                baseline_cost: 0.0,
                comfort_ceiling_c,
                set_temperature_calls: 0,
            })),
        }
    }

    /// Advance the plant by `hours` of simulated time.
    ///
    /// Energy is accounted by heat-pump duty cycle: delivering half the
    /// rated heating rate costs half the rated draw.
    pub fn step(&self, hours: f32) {
        let mut s = self.state.lock();
        let outdoor = s.outdoor_temp();
        let price = s.current_price();

        // Space heating: relax toward outdoor, then pull back to setpoint
        let loss = (s.indoor_temp_c - outdoor) * LOSS_COEFFICIENT * hours;
        s.indoor_temp_c -= loss;
        if s.indoor_temp_c < s.target_temp_c {
            let capacity = HEATING_RATE_C_PER_H * hours;
            let gain = capacity.min(s.target_temp_c - s.indoor_temp_c);
            s.indoor_temp_c += gain;
            let kwh = HEATING_DRAW_KW * hours * (gain / capacity).clamp(0.0, 1.0);
            s.consumed_kwh += kwh;
            s.cost += kwh * price;
        }

        // Tank: burst heating toward its target, standing loss otherwise
        if s.tank_temp_c < s.tank_target_c {
            let capacity = TANK_HEAT_RATE_C_PER_H * hours;
            let gain = capacity.min(s.tank_target_c - s.tank_temp_c);
            s.tank_temp_c += gain;
            let kwh = TANK_DRAW_KW * hours * (gain / capacity).clamp(0.0, 1.0);
            s.consumed_kwh += kwh;
            s.cost += kwh * price;
        } else {
            s.tank_temp_c -= TANK_STANDING_LOSS_C_PER_H * hours;
        }

        // Baseline: hold the comfort ceiling and a warm tank at every price
        let ceiling_loss = (s.comfort_ceiling_c - outdoor).max(0.0) * LOSS_COEFFICIENT;
        let baseline_duty = (ceiling_loss / HEATING_RATE_C_PER_H).clamp(0.0, 1.0);
        let baseline_kwh =
            (HEATING_DRAW_KW * baseline_duty + TANK_DRAW_KW * 0.15) * hours;
        s.baseline_cost += baseline_kwh * price.max(0.0);

        s.now += chrono::Duration::minutes((hours * 60.0) as i64);
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.state.lock().now
    }

    pub fn indoor_temp(&self) -> f32 {
        self.state.lock().indoor_temp_c
    }

    pub fn consumed_kwh(&self) -> f32 {
        self.state.lock().consumed_kwh
    }

    pub fn cost(&self) -> f32 {
        self.state.lock().cost
    }

    pub fn baseline_cost(&self) -> f32 {
        self.state.lock().baseline_cost
    }

    pub fn set_temperature_calls(&self) -> u32 {
        self.state.lock().set_temperature_calls
    }

    /// Provider handles backed by this plant.
    pub fn providers(&self) -> SimProviders {
        SimProviders {
            device: Arc::new(SimDevice {
                plant: self.clone(),
            }),
            prices: Arc::new(SimPrices {
                plant: self.clone(),
            }),
            weather: Arc::new(SimWeather {
                plant: self.clone(),
            }),
            metrics: Arc::new(SimMetrics {
                plant: self.clone(),
            }),
            clock: Arc::new(SimClock {
                plant: self.clone(),
            }),
        }
    }
}

/// Bundle of provider handles over one [`SimPlant`]
#[derive(Clone)]
pub struct SimProviders {
    pub device: Arc<dyn DeviceProvider>,
    pub prices: Arc<dyn PriceProvider>,
    pub weather: Arc<dyn WeatherProvider>,
    pub metrics: Arc<dyn MetricsProvider>,
    pub clock: Arc<dyn Clock>,
}

/// Simulated time source; the engine follows the plant's clock
pub struct SimClock {
    plant: SimPlant,
}

impl Clock for SimClock {
    fn now(&self) -> DateTime<Utc> {
        self.plant.state.lock().now
    }
}

pub struct SimDevice {
    plant: SimPlant,
}

#[async_trait]
impl DeviceProvider for SimDevice {
    async fn get_device_state(&self) -> anyhow::Result<DeviceState> {
        let s = self.plant.state.lock();
        Ok(DeviceState {
            indoor_temp_c: s.indoor_temp_c,
            outdoor_temp_c: s.outdoor_temp(),
            tank_temp_c: s.tank_temp_c,
            zone2_temp_c: None,
            target_temp_c: s.target_temp_c,
            zone2_target_c: None,
            tank_target_c: Some(s.tank_target_c),
            heating_active: s.indoor_temp_c < s.target_temp_c,
            timestamp: s.now,
        })
    }

    async fn set_temperature(&self, zone: ZoneKind, value_c: f32) -> anyhow::Result<bool> {
        let mut s = self.plant.state.lock();
        s.set_temperature_calls += 1;
        match zone {
            ZoneKind::Zone1 => s.target_temp_c = value_c,
            ZoneKind::Zone2 => return Ok(false),
            ZoneKind::Tank => s.tank_target_c = value_c,
        }
        Ok(true)
    }

    fn name(&self) -> &str {
        "sim-plant"
    }
}

pub struct SimPrices {
    plant: SimPlant,
}

#[async_trait]
impl PriceProvider for SimPrices {
    async fn get_prices(&self) -> anyhow::Result<PriceSeries> {
        let s = self.plant.state.lock();
        let hour = s.now.hour();
        let current = s
            .prices
            .iter()
            .find(|p| p.time.hour() == hour)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("no quote for hour {hour}"))?;
        Ok(PriceSeries {
            current,
            prices: s.prices.clone(),
        })
    }

    fn name(&self) -> &str {
        "sim-prices"
    }
}

pub struct SimWeather {
    plant: SimPlant,
}

#[async_trait]
impl WeatherProvider for SimWeather {
    async fn get_current_weather(&self) -> anyhow::Result<WeatherSnapshot> {
        let s = self.plant.state.lock();
        Ok(WeatherSnapshot {
            temperature_c: s.outdoor_temp(),
            wind_speed_ms: 3.0,
            humidity_percent: 70.0,
            cloud_cover_percent: 50.0,
            precipitation_mm: 0.0,
        })
    }

    fn name(&self) -> &str {
        "sim-weather"
    }
}

pub struct SimMetrics {
    plant: SimPlant,
}

#[async_trait]
impl MetricsProvider for SimMetrics {
    async fn get_metrics(&self) -> anyhow::Result<OptimizationMetrics> {
        let s = self.plant.state.lock();
        let outdoor = s.outdoor_temp();
        // Air-source COP improves roughly linearly with outdoor temperature
        let heating_cop = (2.2 + 0.07 * (outdoor + 10.0)).clamp(1.5, 5.0);
        let hot_water_cop = (heating_cop - 0.6).max(1.2);
        Ok(OptimizationMetrics {
            real_heating_cop: heating_cop,
            real_hot_water_cop: hot_water_cop,
            seasonal_mode: SeasonalMode::from_date(s.now, Hemisphere::Northern),
            optimization_focus: OptimizationFocus::Both,
            daily_energy_consumption_kwh: s.consumed_kwh,
            heating_efficiency: 0.9,
            hot_water_efficiency: 0.85,
        })
    }

    fn name(&self) -> &str {
        "sim-metrics"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn plant() -> SimPlant {
        let start = Utc.with_ymd_and_hms(2025, 1, 20, 0, 0, 0).unwrap();
        let prices: Vec<PricePoint> = (0..24)
            .map(|i| PricePoint {
                time: start + chrono::Duration::hours(i),
                price: 2.0,
            })
            .collect();
        SimPlant::new(start, prices, -2.0, 23.0)
    }

    #[test]
    fn test_step_advances_clock_and_accrues_cost() {
        let p = plant();
        let before = p.now();
        p.step(1.0);
        assert_eq!(p.now() - before, chrono::Duration::hours(1));
        assert!(p.cost() > 0.0);
        assert!(p.baseline_cost() > 0.0);
    }

    #[tokio::test]
    async fn test_device_roundtrip() {
        let p = plant();
        let providers = p.providers();
        let accepted = providers
            .device
            .set_temperature(ZoneKind::Zone1, 20.0)
            .await
            .unwrap();
        assert!(accepted);
        let state = providers.device.get_device_state().await.unwrap();
        assert!((state.target_temp_c - 20.0).abs() < f32::EPSILON);
        assert_eq!(p.set_temperature_calls(), 1);
    }

    #[tokio::test]
    async fn test_prices_cover_current_hour() {
        let p = plant();
        let series = p.providers().prices.get_prices().await.unwrap();
        assert_eq!(series.prices.len(), 24);
        assert!((series.current.price - 2.0).abs() < f32::EPSILON);
    }
}
