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

//! Thermal-mass strategy selection.
//!
//! The building itself is a battery: during cheap, efficient hours it can
//! bank heat above the nominal target (preheat/boost) and coast back down
//! through expensive windows. Selection is by first-matching-rule precedence
//! preheat -> coast -> boost -> maintain, recomputed from current inputs
//! every cycle. Any internal error forces maintain with the safe target.

use anyhow::{Result, ensure};
use thermion_types::{ComfortBand, PricePoint, ThermalStrategy};

use crate::adaptive::AdaptiveParameters;

/// Cheapest fraction of the lookahead window that justifies preheating
const PREHEAT_PERCENTILE: f32 = 25.0;
/// Most expensive fraction that justifies coasting
const COAST_PERCENTILE: f32 = 75.0;
/// Very-cheap fraction that justifies boosting
const BOOST_PERCENTILE: f32 = 10.0;
/// Headroom above target a preheat may still start within
const PREHEAT_MARGIN_C: f32 = 0.5;
/// Deficit below target that turns a preheat opportunity into a boost
const BOOST_DEFICIT_C: f32 = 1.0;

/// Inputs for one strategy selection
#[derive(Debug, Clone, Copy)]
pub struct ThermalMassInput<'a> {
    pub current_temp_c: f32,
    /// Nominal target from the temperature optimizer
    pub target_temp_c: f32,
    pub band: ComfortBand,
    pub current_price: f32,
    /// Forward-looking price window (current hour onward)
    pub price_window: &'a [PricePoint],
    /// Normalized COP, 0..1
    pub cop_normalized: f32,
    pub params: AdaptiveParameters,
}

/// Selected strategy with the (possibly shifted) target
#[derive(Debug, Clone)]
pub struct StrategyDecision {
    pub strategy: ThermalStrategy,
    pub target_c: f32,
    pub reason: String,
}

/// Select the thermal-mass strategy for this cycle.
///
/// A malformed price window (empty, non-finite prices) is not an error the
/// caller sees: selection degrades to `Maintain` at the already-computed
/// safe target.
#[must_use]
pub fn select_strategy(input: &ThermalMassInput<'_>) -> StrategyDecision {
    match try_select(input) {
        Ok(decision) => decision,
        Err(err) => {
            tracing::warn!("Thermal-mass selection failed ({err:#}), forcing maintain");
            StrategyDecision {
                strategy: ThermalStrategy::Maintain,
                target_c: input.band.clamp(input.target_temp_c),
                reason: "maintain (selection fallback)".to_owned(),
            }
        }
    }
}

fn try_select(input: &ThermalMassInput<'_>) -> Result<StrategyDecision> {
    ensure!(!input.price_window.is_empty(), "empty price window");
    ensure!(
        input.current_price.is_finite()
            && input.price_window.iter().all(|p| p.price.is_finite()),
        "non-finite price in window"
    );

    let below = input
        .price_window
        .iter()
        .filter(|p| p.price <= input.current_price)
        .count();
    let percentile = (below as f32 / input.price_window.len() as f32) * 100.0;

    let p = &input.params;
    let cop_excellent = input.cop_normalized >= p.cop_excellent_threshold;
    let raise = p.aggressiveness * 1.0;

    // First-matching-rule precedence: preheat, coast, boost, maintain.
    // Preheat only applies near the target; deep deficits fall through to
    // boost, which recovers more aggressively.
    if percentile <= PREHEAT_PERCENTILE
        && cop_excellent
        && input.current_temp_c < input.target_temp_c + PREHEAT_MARGIN_C
        && input.current_temp_c >= input.target_temp_c - BOOST_DEFICIT_C
    {
        let target = input.band.clamp(input.target_temp_c + raise);
        return Ok(StrategyDecision {
            strategy: ThermalStrategy::Preheat,
            target_c: target,
            reason: format!(
                "preheat: price in cheapest {PREHEAT_PERCENTILE:.0}% and COP excellent, banking heat at {target:.1}C"
            ),
        });
    }

    if percentile >= COAST_PERCENTILE && input.current_temp_c >= input.target_temp_c {
        let target = input.band.clamp(input.target_temp_c - raise);
        return Ok(StrategyDecision {
            strategy: ThermalStrategy::Coast,
            target_c: target,
            reason: format!(
                "coast: price in most expensive {:.0}%, riding thermal mass down to {target:.1}C",
                100.0 - COAST_PERCENTILE
            ),
        });
    }

    if percentile <= BOOST_PERCENTILE
        && cop_excellent
        && input.current_temp_c < input.target_temp_c - BOOST_DEFICIT_C
    {
        let target = input.band.clamp(input.target_temp_c + raise * 1.5);
        return Ok(StrategyDecision {
            strategy: ThermalStrategy::Boost,
            target_c: target,
            reason: format!(
                "boost: very cheap power, excellent COP and {:.1}C deficit, raising to {target:.1}C",
                input.target_temp_c - input.current_temp_c
            ),
        });
    }

    Ok(StrategyDecision {
        strategy: ThermalStrategy::Maintain,
        target_c: input.band.clamp(input.target_temp_c),
        reason: format!("maintain: price percentile {percentile:.0}, holding target"),
    })
}
