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
use thiserror::Error;

/// Structured failure of a full optimization cycle.
///
/// Only input-unavailable conditions abort a cycle; model gaps and scoring
/// errors are resolved to conservative fallbacks inside the pipeline and
/// never reach the caller as an error.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum CycleError {
    #[error("price data unavailable: {0}")]
    PriceUnavailable(String),

    #[error("device state unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("optimizer not initialized: {0}")]
    NotInitialized(String),
}

impl CycleError {
    /// Stable machine-readable code carried to the presentation layer
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::PriceUnavailable(_) => "price_unavailable",
            Self::DeviceUnavailable(_) => "device_unavailable",
            Self::NotInitialized(_) => "not_initialized",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(
            CycleError::PriceUnavailable("timeout".into()).code(),
            "price_unavailable"
        );
        assert_eq!(
            CycleError::DeviceUnavailable("offline".into()).code(),
            "device_unavailable"
        );
    }
}
