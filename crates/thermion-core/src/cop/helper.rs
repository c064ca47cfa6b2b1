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

//! Seasonal COP retrieval.
//!
//! Keeps rolling daily/weekly/monthly COP snapshots and answers "which COP
//! matters right now": hot-water COP in summer (space heating is idle),
//! heating COP otherwise. A snapshot COP of zero is the device's "no data"
//! sentinel and is excluded from averages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thermion_types::{Hemisphere, SeasonalMode};

/// Rolling snapshot cap per timeframe; oldest evicted first
const SNAPSHOT_CAP: usize = 30;

/// Rolling aggregation window a snapshot belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopTimeframe {
    Daily,
    Weekly,
    Monthly,
}

/// Which COP figure to average
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopKind {
    Heating,
    HotWater,
}

/// One recorded COP observation
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CopSnapshot {
    pub timestamp: DateTime<Utc>,
    pub heating_cop: f32,
    pub hot_water_cop: f32,
}

/// Wraps seasonal COP retrieval and season detection
#[derive(Debug, Clone)]
pub struct CopHelper {
    hemisphere: Hemisphere,
    daily: Vec<CopSnapshot>,
    weekly: Vec<CopSnapshot>,
    monthly: Vec<CopSnapshot>,
}

impl CopHelper {
    #[must_use]
    pub fn new(hemisphere: Hemisphere) -> Self {
        Self {
            hemisphere,
            daily: Vec::new(),
            weekly: Vec::new(),
            monthly: Vec::new(),
        }
    }

    /// Calendar-month season check for this installation's hemisphere
    #[must_use]
    pub fn is_summer_season(&self, now: DateTime<Utc>) -> bool {
        SeasonalMode::from_date(now, self.hemisphere) == SeasonalMode::Summer
    }

    #[must_use]
    pub fn seasonal_mode(&self, now: DateTime<Utc>) -> SeasonalMode {
        SeasonalMode::from_date(now, self.hemisphere)
    }

    /// Record a snapshot into the given timeframe, evicting the oldest once
    /// the rolling cap is reached.
    pub fn record(&mut self, timeframe: CopTimeframe, snapshot: CopSnapshot) {
        let bucket = self.bucket_mut(timeframe);
        if bucket.len() == SNAPSHOT_CAP {
            bucket.remove(0);
        }
        bucket.push(snapshot);
    }

    /// Average COP over a timeframe, excluding zero-COP sentinel snapshots.
    /// Returns `None` when no usable snapshot exists.
    #[must_use]
    pub fn get_average_cop(&self, timeframe: CopTimeframe, kind: CopKind) -> Option<f32> {
        let values: Vec<f32> = self
            .bucket(timeframe)
            .iter()
            .map(|s| match kind {
                CopKind::Heating => s.heating_cop,
                CopKind::HotWater => s.hot_water_cop,
            })
            .filter(|&v| v > 0.0 && v.is_finite())
            .collect();

        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f32>() / values.len() as f32)
        }
    }

    /// COP that dominates the current season: hot water in summer, heating
    /// otherwise. Prefers the daily window, widening to weekly then monthly
    /// when the narrower window has no usable data. Returns `None` on a
    /// completely cold start.
    #[must_use]
    pub fn get_seasonal_cop(&self, now: DateTime<Utc>) -> Option<f32> {
        let kind = if self.is_summer_season(now) {
            CopKind::HotWater
        } else {
            CopKind::Heating
        };

        [CopTimeframe::Daily, CopTimeframe::Weekly, CopTimeframe::Monthly]
            .into_iter()
            .find_map(|tf| self.get_average_cop(tf, kind))
    }

    fn bucket(&self, timeframe: CopTimeframe) -> &Vec<CopSnapshot> {
        match timeframe {
            CopTimeframe::Daily => &self.daily,
            CopTimeframe::Weekly => &self.weekly,
            CopTimeframe::Monthly => &self.monthly,
        }
    }

    fn bucket_mut(&mut self, timeframe: CopTimeframe) -> &mut Vec<CopSnapshot> {
        match timeframe {
            CopTimeframe::Daily => &mut self.daily,
            CopTimeframe::Weekly => &mut self.weekly,
            CopTimeframe::Monthly => &mut self.monthly,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn snap(heating: f32, hot_water: f32) -> CopSnapshot {
        CopSnapshot {
            timestamp: Utc::now(),
            heating_cop: heating,
            hot_water_cop: hot_water,
        }
    }

    #[test]
    fn test_zero_cop_excluded_from_average() {
        let mut helper = CopHelper::new(Hemisphere::Northern);
        helper.record(CopTimeframe::Daily, snap(3.0, 0.0));
        helper.record(CopTimeframe::Daily, snap(0.0, 0.0));
        helper.record(CopTimeframe::Daily, snap(4.0, 0.0));

        let avg = helper
            .get_average_cop(CopTimeframe::Daily, CopKind::Heating)
            .unwrap();
        assert!((avg - 3.5).abs() < 1e-6);
        assert!(
            helper
                .get_average_cop(CopTimeframe::Daily, CopKind::HotWater)
                .is_none()
        );
    }

    #[test]
    fn test_snapshot_cap_evicts_oldest() {
        let mut helper = CopHelper::new(Hemisphere::Northern);
        for i in 0..35 {
            helper.record(CopTimeframe::Daily, snap(i as f32 + 1.0, 2.0));
        }
        // Only the last 30 remain: values 6..=35, average 20.5
        let avg = helper
            .get_average_cop(CopTimeframe::Daily, CopKind::Heating)
            .unwrap();
        assert!((avg - 20.5).abs() < 1e-4);
    }

    #[test]
    fn test_seasonal_cop_picks_hot_water_in_summer() {
        let mut helper = CopHelper::new(Hemisphere::Northern);
        helper.record(CopTimeframe::Daily, snap(3.0, 2.0));

        let summer = Utc.with_ymd_and_hms(2025, 7, 1, 12, 0, 0).unwrap();
        let winter = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(helper.get_seasonal_cop(summer), Some(2.0));
        assert_eq!(helper.get_seasonal_cop(winter), Some(3.0));
    }

    #[test]
    fn test_seasonal_cop_widens_to_weekly() {
        let mut helper = CopHelper::new(Hemisphere::Northern);
        helper.record(CopTimeframe::Weekly, snap(3.2, 2.4));

        let winter = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(helper.get_seasonal_cop(winter), Some(3.2));
    }

    #[test]
    fn test_cold_start_has_no_seasonal_cop() {
        let helper = CopHelper::new(Hemisphere::Northern);
        assert!(helper.get_seasonal_cop(Utc::now()).is_none());
    }
}
