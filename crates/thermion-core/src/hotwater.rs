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

//! Hot-water tank scheduling.
//!
//! The tank is the cheapest thermal battery in the house. This service
//! learns when hot water is actually drawn, then lays out a 24-hour plan
//! that heats during cheap, efficient hours and ahead of the learned peak
//! draws. Absolute tank limits always win over the schedule.

use std::collections::VecDeque;

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use thermion_types::PricePoint;

use crate::resources::HotWaterConfig;

/// One week of hourly schedule entries
const SCHEDULE_HISTORY_CAP: usize = 168;
/// Four weeks of hourly draw events, oldest discarded first
const USAGE_EVENT_CAP: usize = 672;
/// Draw samples per hour slot for full learning confidence
const FULL_CONFIDENCE_SAMPLES: f32 = 7.0;
/// Price percentile below which an hour is forced to preheat
const FORCE_PREHEAT_PERCENTILE: f32 = 10.0;
/// Price percentile above which an hour is forced off outside peaks
const FORCE_OFF_PERCENTILE: f32 = 90.0;
const CHEAP_PERCENTILE: f32 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HotWaterAction {
    /// Heat now, tank demand overrides price
    Heat,
    /// Heat opportunistically while power is cheap
    Preheat,
    Off,
}

impl HotWaterAction {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Heat => "heat",
            Self::Preheat => "preheat",
            Self::Off => "off",
        }
    }
}

/// One hour of the generated plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub hour: u32,
    pub action: HotWaterAction,
    /// 0..1, higher runs first when runtime must be rationed
    pub priority: f32,
    pub reason: String,
}

/// A single observed hot-water draw
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UsageEvent {
    pub timestamp: DateTime<Utc>,
    pub volume_l: f32,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct HourlyUsage {
    pub total_volume_l: f32,
    pub sample_count: u32,
    /// 0..1, proportional to sample count
    pub confidence: f32,
}

/// Learned draw pattern over the day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsagePattern {
    pub hourly: [HourlyUsage; 24],
    /// Learned peaks, or the configured defaults while confidence is low
    pub peak_hours: Vec<u32>,
    pub learned: bool,
}

/// Inputs for one scheduling pass
#[derive(Debug, Clone)]
pub struct HotWaterInput<'a> {
    pub tank_temp_c: f32,
    pub current_price: f32,
    /// Forward price window, ideally 24 hourly points
    pub prices: &'a [PricePoint],
    /// Normalized hot-water COP, 0..1
    pub cop_normalized: f32,
    pub now: DateTime<Utc>,
}

/// Result of one scheduling pass
#[derive(Debug, Clone)]
pub struct HotWaterPlan {
    /// Action the tank needs right now, before consulting the schedule
    pub immediate_action: HotWaterAction,
    pub schedule: Vec<ScheduleEntry>,
    pub usage_pattern: UsagePattern,
    /// Rough saving of the plan versus always-on heating, price units per day
    pub projected_savings: f32,
    pub recommendations: Vec<String>,
}

/// Hot-water schedule generator with usage learning.
pub struct HotWaterService {
    config: HotWaterConfig,
    usage_events: VecDeque<UsageEvent>,
    schedule_history: VecDeque<ScheduleEntry>,
}

impl HotWaterService {
    pub fn new(config: HotWaterConfig) -> Self {
        Self {
            config,
            usage_events: VecDeque::with_capacity(USAGE_EVENT_CAP),
            schedule_history: VecDeque::with_capacity(SCHEDULE_HISTORY_CAP),
        }
    }

    /// Record an observed hot-water draw for pattern learning. The history
    /// is a rolling window; once full, the oldest draw makes room.
    pub fn record_usage(&mut self, event: UsageEvent) {
        if !event.volume_l.is_finite() || event.volume_l <= 0.0 {
            return;
        }
        if self.usage_events.len() == USAGE_EVENT_CAP {
            let _ = self.usage_events.pop_front();
        }
        self.usage_events.push_back(event);
    }

    /// Group recorded draws by hour of day and derive peak hours.
    ///
    /// Configured default peaks stay in force until at least one learned
    /// hour reaches the configured confidence threshold.
    pub fn learn_usage_pattern(&self) -> UsagePattern {
        let mut hourly = [HourlyUsage::default(); 24];
        for event in &self.usage_events {
            let slot = &mut hourly[event.timestamp.hour() as usize];
            slot.total_volume_l += event.volume_l;
            slot.sample_count += 1;
        }
        for slot in &mut hourly {
            slot.confidence = (slot.sample_count as f32 / FULL_CONFIDENCE_SAMPLES).min(1.0);
        }

        let confident: Vec<(u32, &HourlyUsage)> = hourly
            .iter()
            .enumerate()
            .map(|(h, u)| (h as u32, u))
            .filter(|(_, u)| u.confidence >= self.config.peak_override_confidence)
            .collect();

        if confident.is_empty() {
            return UsagePattern {
                hourly,
                peak_hours: self.config.default_peak_hours.clone(),
                learned: false,
            };
        }

        // Learned peaks: the confident hours with the heaviest draw, capped
        // at the size of the default list
        let mut ranked = confident;
        ranked.sort_by(|a, b| {
            b.1.total_volume_l
                .partial_cmp(&a.1.total_volume_l)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let mut peak_hours: Vec<u32> = ranked
            .into_iter()
            .take(self.config.default_peak_hours.len().max(1))
            .map(|(h, _)| h)
            .collect();
        peak_hours.sort_unstable();

        UsagePattern {
            hourly,
            peak_hours,
            learned: true,
        }
    }

    /// Build the 24-hour plan.
    pub fn optimize_schedule(&mut self, input: &HotWaterInput<'_>) -> HotWaterPlan {
        let pattern = self.learn_usage_pattern();
        let schedule = self.build_schedule(input, &pattern);
        let immediate_action = self.immediate_action(input, &schedule);
        let projected_savings = estimate_daily_savings(&schedule, input.prices);
        let recommendations = self.recommendations(input, &pattern);

        for entry in &schedule {
            if self.schedule_history.len() == SCHEDULE_HISTORY_CAP {
                let _ = self.schedule_history.pop_front();
            }
            self.schedule_history.push_back(entry.clone());
        }

        HotWaterPlan {
            immediate_action,
            schedule,
            usage_pattern: pattern,
            projected_savings,
            recommendations,
        }
    }

    pub fn schedule_history(&self) -> &VecDeque<ScheduleEntry> {
        &self.schedule_history
    }

    fn immediate_action(
        &self,
        input: &HotWaterInput<'_>,
        schedule: &[ScheduleEntry],
    ) -> HotWaterAction {
        if input.tank_temp_c < self.config.min_tank_temp_c {
            tracing::info!(
                "Tank {:.1}C below minimum {:.1}C, heating immediately",
                input.tank_temp_c,
                self.config.min_tank_temp_c
            );
            return HotWaterAction::Heat;
        }
        if input.tank_temp_c > self.config.max_tank_temp_c {
            return HotWaterAction::Off;
        }
        // Between the limits the hourly schedule decides
        let hour = input.now.hour();
        schedule
            .iter()
            .find(|e| e.hour == hour)
            .map_or(HotWaterAction::Off, |e| e.action)
    }

    fn build_schedule(
        &self,
        input: &HotWaterInput<'_>,
        pattern: &UsagePattern,
    ) -> Vec<ScheduleEntry> {
        let mut schedule = Vec::with_capacity(24);
        for hour in 0..24 {
            schedule.push(self.score_hour(hour, input, pattern));
        }
        schedule
    }

    fn score_hour(
        &self,
        hour: u32,
        input: &HotWaterInput<'_>,
        pattern: &UsagePattern,
    ) -> ScheduleEntry {
        let is_peak = pattern.peak_hours.contains(&hour);
        let percentile = price_percentile_for_hour(input.prices, hour);

        let Some(percentile) = percentile else {
            // No price data for this hour: heat peaks, leave the rest off
            return if is_peak {
                ScheduleEntry {
                    hour,
                    action: HotWaterAction::Heat,
                    priority: 0.8,
                    reason: "peak usage hour, no price data".to_owned(),
                }
            } else {
                ScheduleEntry {
                    hour,
                    action: HotWaterAction::Off,
                    priority: 0.0,
                    reason: "no price data".to_owned(),
                }
            };
        };

        let cheapness = 1.0 - percentile / 100.0;
        let cop_bonus = input.cop_normalized * 0.3;
        let peak_bonus = if is_peak { 0.4 } else { 0.0 };
        let priority = (cheapness * 0.6 + cop_bonus + peak_bonus).clamp(0.0, 1.0);

        if percentile <= FORCE_PREHEAT_PERCENTILE {
            return ScheduleEntry {
                hour,
                action: HotWaterAction::Preheat,
                priority: priority.max(0.7),
                reason: format!("price in cheapest {FORCE_PREHEAT_PERCENTILE:.0}%"),
            };
        }
        if percentile >= FORCE_OFF_PERCENTILE && !is_peak {
            return ScheduleEntry {
                hour,
                action: HotWaterAction::Off,
                priority: 0.0,
                reason: format!("price in most expensive {:.0}%", 100.0 - FORCE_OFF_PERCENTILE),
            };
        }
        if is_peak {
            return ScheduleEntry {
                hour,
                action: HotWaterAction::Heat,
                priority,
                reason: "peak usage hour".to_owned(),
            };
        }
        if percentile <= CHEAP_PERCENTILE {
            return ScheduleEntry {
                hour,
                action: HotWaterAction::Preheat,
                priority,
                reason: format!("cheap hour, percentile {percentile:.0}"),
            };
        }
        ScheduleEntry {
            hour,
            action: HotWaterAction::Off,
            priority: 0.0,
            reason: format!("unfavorable price, percentile {percentile:.0}"),
        }
    }

    fn recommendations(&self, input: &HotWaterInput<'_>, pattern: &UsagePattern) -> Vec<String> {
        let mut out = Vec::new();
        if !pattern.learned {
            out.push(
                "Usage pattern not yet learned, scheduling around configured default peak hours"
                    .to_owned(),
            );
        }
        if input.cop_normalized < 0.2 {
            out.push(
                "Hot-water COP is poor, consider shifting heating into warmer daytime hours"
                    .to_owned(),
            );
        }
        if input.tank_temp_c < self.config.min_tank_temp_c + 2.0 {
            out.push(format!(
                "Tank at {:.1}C is close to the {:.1}C minimum",
                input.tank_temp_c, self.config.min_tank_temp_c
            ));
        }
        out
    }
}

/// Percentile rank of the price scheduled for `hour` within the window.
fn price_percentile_for_hour(prices: &[PricePoint], hour: u32) -> Option<f32> {
    if prices.is_empty() {
        return None;
    }
    let price = prices
        .iter()
        .find(|p| p.time.hour() == hour)
        .map(|p| p.price)?;
    if !price.is_finite() {
        return None;
    }
    let below = prices.iter().filter(|p| p.price <= price).count();
    Some((below as f32 / prices.len() as f32) * 100.0)
}

/// Savings of running only the planned heat/preheat hours at their prices
/// versus heating every hour at the average price.
fn estimate_daily_savings(schedule: &[ScheduleEntry], prices: &[PricePoint]) -> f32 {
    if prices.is_empty() {
        return 0.0;
    }
    let avg = prices.iter().map(|p| p.price).sum::<f32>() / prices.len() as f32;
    let mut saving = 0.0_f32;
    for entry in schedule {
        if entry.action == HotWaterAction::Off {
            continue;
        }
        if let Some(p) = prices.iter().find(|p| p.time.hour() == entry.hour) {
            saving += avg - p.price;
        }
    }
    if saving.is_finite() { saving.max(0.0) } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn hourly_prices(start_hour: u32, prices: &[f32]) -> Vec<PricePoint> {
        let base = Utc
            .with_ymd_and_hms(2025, 3, 10, start_hour, 0, 0)
            .unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &price)| PricePoint {
                time: base + Duration::hours(i as i64),
                price,
            })
            .collect()
    }

    fn service() -> HotWaterService {
        HotWaterService::new(HotWaterConfig::default())
    }

    fn input<'a>(tank_temp_c: f32, prices: &'a [PricePoint]) -> HotWaterInput<'a> {
        HotWaterInput {
            tank_temp_c,
            current_price: prices.first().map_or(1.0, |p| p.price),
            prices,
            cop_normalized: 0.6,
            now: Utc.with_ymd_and_hms(2025, 3, 10, 0, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_cold_tank_heats_immediately() {
        let prices = hourly_prices(0, &[1.0; 24]);
        let mut svc = service();
        let plan = svc.optimize_schedule(&input(38.0, &prices));
        assert_eq!(plan.immediate_action, HotWaterAction::Heat);
    }

    #[test]
    fn test_hot_tank_forced_off() {
        let prices = hourly_prices(0, &[0.1; 24]);
        let mut svc = service();
        let plan = svc.optimize_schedule(&input(52.0, &prices));
        assert_eq!(plan.immediate_action, HotWaterAction::Off);
    }

    #[test]
    fn test_schedule_has_24_entries() {
        let prices = hourly_prices(0, &[1.0; 24]);
        let mut svc = service();
        let plan = svc.optimize_schedule(&input(45.0, &prices));
        assert_eq!(plan.schedule.len(), 24);
    }

    #[test]
    fn test_cheapest_hour_preheats_and_expensive_hour_is_off() {
        let mut prices_vec = vec![2.0_f32; 24];
        prices_vec[3] = 0.1;
        prices_vec[12] = 9.0;
        let prices = hourly_prices(0, &prices_vec);

        let mut svc = service();
        let plan = svc.optimize_schedule(&input(45.0, &prices));
        assert_eq!(plan.schedule[3].action, HotWaterAction::Preheat);
        assert_eq!(plan.schedule[12].action, HotWaterAction::Off);
    }

    #[test]
    fn test_peak_hour_heats_even_when_expensive() {
        // Hour 18 is a default peak hour
        let mut prices_vec = vec![1.0_f32; 24];
        prices_vec[18] = 9.0;
        let prices = hourly_prices(0, &prices_vec);

        let mut svc = service();
        let plan = svc.optimize_schedule(&input(45.0, &prices));
        assert_eq!(plan.schedule[18].action, HotWaterAction::Heat);
        assert!(plan.schedule[18].priority > 0.0);
    }

    #[test]
    fn test_empty_history_uses_default_peaks_with_zero_confidence() {
        let svc = service();
        let pattern = svc.learn_usage_pattern();
        assert_eq!(pattern.peak_hours, vec![7, 18, 21]);
        assert!(!pattern.learned);
        assert!(pattern.hourly.iter().all(|h| h.confidence == 0.0));
    }

    #[test]
    fn test_learned_peaks_override_defaults_once_confident() {
        let mut svc = service();
        // Seven mornings of heavy draw at 06:00
        for day in 1..=7 {
            svc.record_usage(UsageEvent {
                timestamp: Utc.with_ymd_and_hms(2025, 3, day, 6, 15, 0).unwrap(),
                volume_l: 60.0,
            });
        }
        let pattern = svc.learn_usage_pattern();
        assert!(pattern.learned);
        assert!(pattern.peak_hours.contains(&6));
        assert!((pattern.hourly[6].confidence - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_invalid_usage_events_ignored() {
        let mut svc = service();
        svc.record_usage(UsageEvent {
            timestamp: Utc::now(),
            volume_l: f32::NAN,
        });
        svc.record_usage(UsageEvent {
            timestamp: Utc::now(),
            volume_l: -3.0,
        });
        assert!(!svc.learn_usage_pattern().learned);
    }

    #[test]
    fn test_usage_history_is_a_rolling_window() {
        let mut svc = service();
        let base = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        for i in 0..(USAGE_EVENT_CAP + 48) {
            svc.record_usage(UsageEvent {
                timestamp: base + Duration::hours(i as i64),
                volume_l: 10.0,
            });
        }
        assert_eq!(svc.usage_events.len(), USAGE_EVENT_CAP);
        // Oldest draws were evicted, the remaining window still learns
        let oldest = svc.usage_events.front().unwrap().timestamp;
        assert_eq!(oldest, base + Duration::hours(48));
        assert!(svc.learn_usage_pattern().learned);
    }

    #[test]
    fn test_schedule_history_capped_at_one_week() {
        let prices = hourly_prices(0, &[1.0; 24]);
        let mut svc = service();
        for _ in 0..10 {
            let _ = svc.optimize_schedule(&input(45.0, &prices));
        }
        assert_eq!(svc.schedule_history().len(), SCHEDULE_HISTORY_CAP);
    }
}
