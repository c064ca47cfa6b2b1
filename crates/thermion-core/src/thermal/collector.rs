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

//! Bounded collection of indoor/outdoor temperature samples.
//!
//! Raw samples live in a ring buffer sized by configuration. Samples older
//! than the retention window are folded into daily summaries by the
//! maintenance pass; a full buffer folds its oldest sample instead of
//! dropping it, so raw data is never discarded unaggregated.

use chrono::{DateTime, Datelike, Duration, Utc};
use ringbuffer::{AllocRingBuffer, RingBuffer};
use serde::{Deserialize, Serialize};
use thermion_types::WeatherSnapshot;

/// One telemetry sample fed to the thermal model
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThermalDataPoint {
    pub timestamp: DateTime<Utc>,
    pub indoor_temp_c: f32,
    pub outdoor_temp_c: f32,
    pub target_temp_c: f32,
    pub heating_active: bool,
    pub weather: WeatherSnapshot,
}

/// Aggregate of one day's raw samples
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DailyThermalSummary {
    /// Midnight UTC of the summarized day
    pub date: DateTime<Utc>,
    pub sample_count: u32,
    pub avg_indoor_c: f32,
    pub avg_outdoor_c: f32,
    pub avg_wind_ms: f32,
    /// Fraction of samples with heating active
    pub heating_fraction: f32,
}

/// Bounded sample store with periodic daily aggregation
#[derive(Debug)]
pub struct ThermalDataCollector {
    raw: AllocRingBuffer<ThermalDataPoint>,
    /// Oldest samples displaced from a full buffer, awaiting aggregation
    pending: Vec<ThermalDataPoint>,
    summaries: Vec<DailyThermalSummary>,
    retention: Duration,
    max_summary_days: usize,
    dropped_invalid: u64,
}

/// Physically plausible sample bounds; anything outside is sensor garbage
const INDOOR_RANGE_C: (f32, f32) = (-10.0, 45.0);
const OUTDOOR_RANGE_C: (f32, f32) = (-60.0, 60.0);

impl ThermalDataCollector {
    #[must_use]
    pub fn new(max_raw_points: usize, retention_hours: i64, max_summary_days: usize) -> Self {
        Self {
            raw: AllocRingBuffer::new(max_raw_points.max(1)),
            pending: Vec::new(),
            summaries: Vec::new(),
            retention: Duration::hours(retention_hours.max(1)),
            max_summary_days: max_summary_days.max(1),
            dropped_invalid: 0,
        }
    }

    /// Validate and store a sample. Invalid samples are silently dropped
    /// (counted, logged at debug) - they are not queued or retried.
    pub fn add_sample(&mut self, point: ThermalDataPoint, now: DateTime<Utc>) {
        if !Self::is_valid(&point, now) {
            self.dropped_invalid += 1;
            tracing::debug!(
                "Dropping invalid thermal sample at {}: indoor={} outdoor={}",
                point.timestamp,
                point.indoor_temp_c,
                point.outdoor_temp_c
            );
            return;
        }

        if self.raw.is_full() {
            // Displace the oldest sample into the aggregation queue rather
            // than letting the ring buffer overwrite it.
            if let Some(oldest) = self.raw.dequeue() {
                self.pending.push(oldest);
            }
        }
        let _ = self.raw.enqueue(point);
    }

    fn is_valid(point: &ThermalDataPoint, now: DateTime<Utc>) -> bool {
        point.timestamp <= now
            && point.indoor_temp_c.is_finite()
            && point.outdoor_temp_c.is_finite()
            && (INDOOR_RANGE_C.0..=INDOOR_RANGE_C.1).contains(&point.indoor_temp_c)
            && (OUTDOOR_RANGE_C.0..=OUTDOOR_RANGE_C.1).contains(&point.outdoor_temp_c)
    }

    /// Maintenance pass: fold samples older than the retention window (plus
    /// anything displaced from a full buffer) into daily summaries, then
    /// evict the oldest summaries beyond the configured day cap.
    pub fn aggregate(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.retention;

        let mut to_fold = std::mem::take(&mut self.pending);
        while let Some(front) = self.raw.peek() {
            if front.timestamp < cutoff {
                if let Some(p) = self.raw.dequeue() {
                    to_fold.push(p);
                }
            } else {
                break;
            }
        }

        if to_fold.is_empty() {
            return;
        }

        for point in &to_fold {
            self.fold_into_summary(point);
        }
        tracing::debug!(
            "Aggregated {} thermal samples into {} daily summaries",
            to_fold.len(),
            self.summaries.len()
        );

        while self.summaries.len() > self.max_summary_days {
            self.summaries.remove(0);
        }
    }

    fn fold_into_summary(&mut self, point: &ThermalDataPoint) {
        let day = point
            .timestamp
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|d| d.and_utc())
            .unwrap_or(point.timestamp);

        let heating = if point.heating_active { 1.0 } else { 0.0 };
        match self
            .summaries
            .iter_mut()
            .find(|s| s.date.ordinal() == day.ordinal() && s.date.year() == day.year())
        {
            Some(summary) => {
                let n = summary.sample_count as f32;
                summary.avg_indoor_c = (summary.avg_indoor_c * n + point.indoor_temp_c) / (n + 1.0);
                summary.avg_outdoor_c =
                    (summary.avg_outdoor_c * n + point.outdoor_temp_c) / (n + 1.0);
                summary.avg_wind_ms =
                    (summary.avg_wind_ms * n + point.weather.wind_speed_ms) / (n + 1.0);
                summary.heating_fraction = (summary.heating_fraction * n + heating) / (n + 1.0);
                summary.sample_count += 1;
            }
            None => self.summaries.push(DailyThermalSummary {
                date: day,
                sample_count: 1,
                avg_indoor_c: point.indoor_temp_c,
                avg_outdoor_c: point.outdoor_temp_c,
                avg_wind_ms: point.weather.wind_speed_ms,
                heating_fraction: heating,
            }),
        }
    }

    /// Raw samples, oldest first
    #[must_use]
    pub fn raw_points(&self) -> Vec<ThermalDataPoint> {
        self.raw.iter().copied().collect()
    }

    #[must_use]
    pub fn summaries(&self) -> &[DailyThermalSummary] {
        &self.summaries
    }

    /// Combined detailed + aggregated sample count, the figure the analyzer
    /// checks against its minimum before fitting.
    #[must_use]
    pub fn combined_count(&self) -> usize {
        self.raw.len()
            + self.pending.len()
            + self
                .summaries
                .iter()
                .map(|s| s.sample_count as usize)
                .sum::<usize>()
    }

    #[must_use]
    pub fn dropped_invalid(&self) -> u64 {
        self.dropped_invalid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(ts: DateTime<Utc>, indoor: f32, outdoor: f32, heating: bool) -> ThermalDataPoint {
        ThermalDataPoint {
            timestamp: ts,
            indoor_temp_c: indoor,
            outdoor_temp_c: outdoor,
            target_temp_c: 21.0,
            heating_active: heating,
            weather: WeatherSnapshot::default(),
        }
    }

    #[test]
    fn test_invalid_samples_silently_dropped() {
        let now = Utc::now();
        let mut collector = ThermalDataCollector::new(100, 48, 30);

        collector.add_sample(point(now + Duration::hours(1), 21.0, 5.0, true), now);
        collector.add_sample(point(now, 99.0, 5.0, true), now);
        collector.add_sample(point(now, f32::NAN, 5.0, true), now);
        collector.add_sample(point(now, 21.0, -80.0, true), now);

        assert_eq!(collector.combined_count(), 0);
        assert_eq!(collector.dropped_invalid(), 4);

        collector.add_sample(point(now, 21.0, 5.0, true), now);
        assert_eq!(collector.combined_count(), 1);
    }

    #[test]
    fn test_full_buffer_folds_oldest_instead_of_dropping() {
        let now = Utc::now();
        let mut collector = ThermalDataCollector::new(4, 48, 30);

        for i in 0..6 {
            collector.add_sample(
                point(now - Duration::minutes(60 - i * 10), 20.0, 5.0, false),
                now,
            );
        }

        // 4 in the ring, 2 displaced but still counted
        assert_eq!(collector.combined_count(), 6);

        collector.aggregate(now);
        // Displaced samples are folded; recent ones stay raw
        assert_eq!(collector.raw_points().len(), 4);
        assert_eq!(collector.combined_count(), 6);
        assert!(!collector.summaries().is_empty());
    }

    #[test]
    fn test_aggregate_folds_samples_past_retention() {
        let now = Utc::now();
        let mut collector = ThermalDataCollector::new(100, 24, 30);

        for hour in 0..30 {
            collector.add_sample(
                point(now - Duration::hours(48 - hour), 20.5, 3.0, hour % 2 == 0),
                now,
            );
        }
        collector.aggregate(now);

        let folded: u32 = collector.summaries().iter().map(|s| s.sample_count).sum();
        assert!(folded > 0);
        // Nothing lost: raw + aggregated still account for every sample
        assert_eq!(collector.combined_count(), 30);
    }

    #[test]
    fn test_summary_day_cap_evicts_oldest() {
        let now = Utc::now();
        let mut collector = ThermalDataCollector::new(500, 1, 3);

        for day in 0..6 {
            collector.add_sample(
                point(now - Duration::days(5 - day) - Duration::hours(2), 20.0, 4.0, true),
                now,
            );
        }
        collector.aggregate(now);
        assert!(collector.summaries().len() <= 3);
    }
}
