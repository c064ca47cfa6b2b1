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

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

const HISTORY_CAP: usize = 100;

/// Maps raw COP readings onto a 0..1 efficiency score using the observed
/// [min, max] range of this installation.
///
/// The range only widens; a narrowing reading never shrinks it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopNormalizer {
    min_observed: f32,
    max_observed: f32,
    update_count: u32,
    history: VecDeque<f32>,
}

impl Default for CopNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl CopNormalizer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            min_observed: f32::INFINITY,
            max_observed: f32::NEG_INFINITY,
            update_count: 0,
            history: VecDeque::with_capacity(HISTORY_CAP),
        }
    }

    /// Widen the observed range with a new reading.
    /// Non-finite and non-positive readings are ignored.
    pub fn update_range(&mut self, cop: f32) {
        if !cop.is_finite() || cop <= 0.0 {
            tracing::debug!("Ignoring implausible COP reading: {}", cop);
            return;
        }

        self.min_observed = self.min_observed.min(cop);
        self.max_observed = self.max_observed.max(cop);
        self.update_count += 1;

        if self.history.len() == HISTORY_CAP {
            self.history.pop_front();
        }
        self.history.push_back(cop);
    }

    /// Normalize a raw COP to [0, 1] inside the observed range.
    /// A zero-width (or empty) range yields the neutral 0.5.
    #[must_use]
    pub fn normalize(&self, cop: f32) -> f32 {
        let span = self.max_observed - self.min_observed;
        if !span.is_finite() || span <= f32::EPSILON {
            return 0.5;
        }
        ((cop - self.min_observed) / span).clamp(0.0, 1.0)
    }

    #[must_use]
    pub fn update_count(&self) -> u32 {
        self.update_count
    }

    #[must_use]
    pub fn observed_range(&self) -> Option<(f32, f32)> {
        if self.update_count == 0 {
            None
        } else {
            Some((self.min_observed, self.max_observed))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_widens_monotonically() {
        let mut n = CopNormalizer::new();
        n.update_range(3.0);
        n.update_range(2.0);
        n.update_range(4.5);
        n.update_range(2.5); // inside range, no narrowing
        assert_eq!(n.observed_range(), Some((2.0, 4.5)));
        assert_eq!(n.update_count(), 4);
    }

    #[test]
    fn test_implausible_readings_ignored() {
        let mut n = CopNormalizer::new();
        n.update_range(f32::NAN);
        n.update_range(f32::INFINITY);
        n.update_range(-1.0);
        n.update_range(0.0);
        assert_eq!(n.update_count(), 0);
        assert_eq!(n.normalize(3.0), 0.5);
    }

    #[test]
    fn test_normalize_clamps() {
        let mut n = CopNormalizer::new();
        n.update_range(2.0);
        n.update_range(4.0);
        assert_eq!(n.normalize(3.0), 0.5);
        assert_eq!(n.normalize(1.0), 0.0);
        assert_eq!(n.normalize(9.0), 1.0);
    }

    #[test]
    fn test_zero_width_range_is_neutral() {
        let mut n = CopNormalizer::new();
        n.update_range(3.0);
        assert_eq!(n.normalize(3.0), 0.5);
    }
}
