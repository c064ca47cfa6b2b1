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

/// The [min, max] temperature range the user has declared acceptable.
///
/// Every temperature the engine emits is clamped into this band as the final
/// operation; no error branch may skip it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComfortBand {
    pub min_temp_c: f32,
    pub max_temp_c: f32,
}

impl ComfortBand {
    #[must_use]
    pub fn new(min_temp_c: f32, max_temp_c: f32) -> Self {
        Self {
            min_temp_c,
            max_temp_c,
        }
    }

    /// Clamp a candidate target into the band
    #[must_use]
    pub fn clamp(&self, temp_c: f32) -> f32 {
        temp_c.clamp(self.min_temp_c, self.max_temp_c)
    }

    #[must_use]
    pub fn midpoint(&self) -> f32 {
        (self.min_temp_c + self.max_temp_c) / 2.0
    }

    #[must_use]
    pub fn width(&self) -> f32 {
        self.max_temp_c - self.min_temp_c
    }

    #[must_use]
    pub fn contains(&self, temp_c: f32) -> bool {
        temp_c >= self.min_temp_c && temp_c <= self.max_temp_c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_inside_and_outside() {
        let band = ComfortBand::new(19.0, 23.0);
        assert_eq!(band.clamp(21.0), 21.0);
        assert_eq!(band.clamp(18.0), 19.0);
        assert_eq!(band.clamp(25.0), 23.0);
    }

    #[test]
    fn test_midpoint_and_width() {
        let band = ComfortBand::new(19.0, 23.0);
        assert_eq!(band.midpoint(), 21.0);
        assert_eq!(band.width(), 4.0);
    }
}
