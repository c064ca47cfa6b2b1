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

//! Percentile-rank price classification.
//!
//! Pure functions: a quote series plus a reference price in, a percentile
//! rank and a discrete label out. No persisted state, no provider access.

use serde::{Deserialize, Serialize};
use thermion_types::{PriceClassification, PriceLevel, PricePoint, PriceThresholds};

/// Percentile thresholds for labeling.
///
/// Each threshold is accepted either as a 0-1 fraction or a 0-100
/// percentage; values are normalized to the 0-100 scale before use.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClassifierOptions {
    /// Percentile at or below which a price counts as cheap
    pub cheap_percentile: f32,

    /// Scales the cheap threshold down to define the very-cheap band
    pub very_cheap_multiplier: f32,

    /// Percentile of the expensive band, measured from the top
    pub expensive_percentile: f32,

    /// Percentile of the very-expensive band, measured from the top
    pub very_expensive_percentile: f32,
}

impl Default for ClassifierOptions {
    fn default() -> Self {
        Self {
            cheap_percentile: 25.0,
            very_cheap_multiplier: 0.5,
            expensive_percentile: 25.0,
            very_expensive_percentile: 10.0,
        }
    }
}

impl ClassifierOptions {
    /// Normalize a threshold given as either 0-1 fraction or 0-100 percentage
    fn as_percent(value: f32) -> f32 {
        if value <= 1.0 { value * 100.0 } else { value }.clamp(0.0, 100.0)
    }

    fn thresholds(&self) -> PriceThresholds {
        let cheap = Self::as_percent(self.cheap_percentile);
        PriceThresholds {
            cheap,
            very_cheap: cheap * self.very_cheap_multiplier.clamp(0.0, 1.0),
            expensive: Self::as_percent(self.expensive_percentile),
            very_expensive: Self::as_percent(self.very_expensive_percentile),
        }
    }
}

/// Classify a reference price against a quote series.
///
/// An empty series returns `Normal` with `normalized = 0.5` so that a cold
/// start (prices not yet fetched) never aborts a cycle.
#[must_use]
pub fn classify(
    prices: &[PricePoint],
    reference_price: f32,
    options: &ClassifierOptions,
) -> PriceClassification {
    let values: Vec<f32> = prices.iter().map(|p| p.price).collect();
    classify_values(&values, reference_price, options)
}

/// Classify against raw numeric observations; any set of numbers works.
#[must_use]
pub fn classify_values(
    values: &[f32],
    reference_price: f32,
    options: &ClassifierOptions,
) -> PriceClassification {
    let thresholds = options.thresholds();

    if values.is_empty() {
        return PriceClassification {
            level: PriceLevel::Normal,
            percentile: 50.0,
            normalized: 0.5,
            thresholds,
        };
    }

    // Ties counted inclusively: fraction of observations <= reference
    let at_or_below = values.iter().filter(|&&v| v <= reference_price).count();
    let percentile = (at_or_below as f32 / values.len() as f32) * 100.0;

    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &v in values {
        min = min.min(v);
        max = max.max(v);
    }

    let normalized = if (max - min).abs() <= f32::EPSILON {
        0.5
    } else {
        ((reference_price - min) / (max - min)).clamp(0.0, 1.0)
    };

    // First-match precedence: very-cheap, cheap, very-expensive, expensive
    let level = if percentile <= thresholds.very_cheap {
        PriceLevel::VeryCheap
    } else if percentile <= thresholds.cheap {
        PriceLevel::Cheap
    } else if percentile >= 100.0 - thresholds.very_expensive {
        PriceLevel::VeryExpensive
    } else if percentile >= 100.0 - thresholds.expensive {
        PriceLevel::Expensive
    } else {
        PriceLevel::Normal
    };

    PriceClassification {
        level,
        percentile,
        normalized,
        thresholds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> ClassifierOptions {
        ClassifierOptions::default()
    }

    #[test]
    fn test_empty_series_is_normal_midpoint() {
        let c = classify_values(&[], 1.3, &opts());
        assert_eq!(c.level, PriceLevel::Normal);
        assert_eq!(c.normalized, 0.5);
        assert_eq!(c.percentile, 50.0);
    }

    #[test]
    fn test_percentile_counts_ties_inclusively() {
        let c = classify_values(&[1.0, 2.0, 2.0, 3.0], 2.0, &opts());
        // 3 of 4 observations are <= 2.0
        assert!((c.percentile - 75.0).abs() < 1e-4);
    }

    #[test]
    fn test_cheapest_price_is_very_cheap() {
        let values: Vec<f32> = (1..=100).map(|i| i as f32).collect();
        let c = classify_values(&values, 1.0, &opts());
        assert_eq!(c.level, PriceLevel::VeryCheap);
    }

    #[test]
    fn test_most_expensive_price_is_very_expensive() {
        let values: Vec<f32> = (1..=100).map(|i| i as f32).collect();
        let c = classify_values(&values, 100.0, &opts());
        assert_eq!(c.level, PriceLevel::VeryExpensive);
    }

    #[test]
    fn test_middle_price_is_normal() {
        let values: Vec<f32> = (1..=100).map(|i| i as f32).collect();
        let c = classify_values(&values, 50.0, &opts());
        assert_eq!(c.level, PriceLevel::Normal);
    }

    #[test]
    fn test_fractional_thresholds_accepted() {
        let fractional = ClassifierOptions {
            cheap_percentile: 0.25,
            very_cheap_multiplier: 0.5,
            expensive_percentile: 0.25,
            very_expensive_percentile: 0.10,
        };
        let values: Vec<f32> = (1..=100).map(|i| i as f32).collect();
        let c = classify_values(&values, 20.0, &fractional);
        assert_eq!(c.thresholds.cheap, 25.0);
        assert_eq!(c.level, PriceLevel::Cheap);
    }

    #[test]
    fn test_percentile_and_normalized_bounds() {
        let values = vec![0.5, 1.0, 1.5, 2.0];
        for reference in [-1.0_f32, 0.5, 1.2, 2.0, 9.0] {
            let c = classify_values(&values, reference, &opts());
            assert!((0.0..=100.0).contains(&c.percentile));
            assert!((0.0..=1.0).contains(&c.normalized));
        }
    }

    #[test]
    fn test_flat_series_normalizes_to_half() {
        let c = classify_values(&[1.0, 1.0, 1.0], 1.0, &opts());
        assert_eq!(c.normalized, 0.5);
    }
}
