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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single electricity price quote for one hour
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Start of the hour this quote covers
    pub time: DateTime<Utc>,

    /// Spot price per kWh in the provider's currency.
    /// Some providers label this field `value` instead of `price`.
    #[serde(alias = "value")]
    pub price: f32,
}

/// Per-cycle price summary derived from the raw quote series
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceStats {
    pub current_price: f32,
    pub avg_price: f32,
    pub min_price: f32,
    pub max_price: f32,
}

impl PriceStats {
    /// Summarize a quote series around a reference (current) price.
    ///
    /// An empty series collapses to min = avg = max = `current`, which keeps
    /// downstream interpolation on its degenerate (midpoint) path instead of
    /// failing on cold start.
    #[must_use]
    pub fn from_series(prices: &[PricePoint], current: f32) -> Self {
        if prices.is_empty() {
            return Self {
                current_price: current,
                avg_price: current,
                min_price: current,
                max_price: current,
            };
        }

        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut sum = 0.0_f32;
        for p in prices {
            min = min.min(p.price);
            max = max.max(p.price);
            sum += p.price;
        }

        Self {
            current_price: current,
            avg_price: sum / prices.len() as f32,
            min_price: min,
            max_price: max,
        }
    }

    /// Width of the observed price range
    #[must_use]
    pub fn span(&self) -> f32 {
        self.max_price - self.min_price
    }

    /// True when the series carries no usable spread (flat or single quote)
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.span() <= f32::EPSILON
    }
}

/// Discrete price level relative to the rest of the quote series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PriceLevel {
    VeryCheap,
    Cheap,
    Normal,
    Expensive,
    VeryExpensive,
}

impl PriceLevel {
    /// Get human-readable name for the price level
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::VeryCheap => "very cheap",
            Self::Cheap => "cheap",
            Self::Normal => "normal",
            Self::Expensive => "expensive",
            Self::VeryExpensive => "very expensive",
        }
    }

    /// True for the two cheap bands
    #[must_use]
    pub fn is_cheap(&self) -> bool {
        matches!(self, Self::VeryCheap | Self::Cheap)
    }

    /// True for the two expensive bands
    #[must_use]
    pub fn is_expensive(&self) -> bool {
        matches!(self, Self::Expensive | Self::VeryExpensive)
    }
}

/// Percentile thresholds used for labeling, always stored on the 0-100 scale
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceThresholds {
    pub cheap: f32,
    pub very_cheap: f32,
    pub expensive: f32,
    pub very_expensive: f32,
}

/// Result of classifying a reference price against a quote series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceClassification {
    pub level: PriceLevel,

    /// Fraction of quotes at or below the reference, on the 0-100 scale
    pub percentile: f32,

    /// Reference position inside the observed [min, max] range, 0..1
    pub normalized: f32,

    /// Thresholds that produced the label
    pub thresholds: PriceThresholds,
}
