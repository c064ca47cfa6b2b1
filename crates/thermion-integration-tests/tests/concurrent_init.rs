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

//! Guarded initialization under concurrent callers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use thermion_core::traits::{DeviceProvider, PriceProvider, PriceSeries};
use thermion_core::{EngineConfig, Optimizer};
use thermion_types::{DeviceState, PricePoint, ZoneKind};

/// Device whose state fetch is slow enough that concurrent initializers
/// overlap, and which counts every fetch.
struct SlowDevice {
    state_calls: AtomicU32,
    fail: AtomicBool,
}

impl SlowDevice {
    fn new(fail: bool) -> Self {
        Self {
            state_calls: AtomicU32::new(0),
            fail: AtomicBool::new(fail),
        }
    }
}

#[async_trait]
impl DeviceProvider for SlowDevice {
    async fn get_device_state(&self) -> anyhow::Result<DeviceState> {
        self.state_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("cloud unreachable");
        }
        Ok(DeviceState {
            indoor_temp_c: 20.5,
            outdoor_temp_c: 1.0,
            tank_temp_c: 45.0,
            zone2_temp_c: None,
            target_temp_c: 21.0,
            zone2_target_c: None,
            tank_target_c: Some(45.0),
            heating_active: true,
            timestamp: Utc::now(),
        })
    }

    async fn set_temperature(&self, _zone: ZoneKind, _value_c: f32) -> anyhow::Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "slow-device"
    }
}

struct FlatPrices;

#[async_trait]
impl PriceProvider for FlatPrices {
    async fn get_prices(&self) -> anyhow::Result<PriceSeries> {
        let now = Utc::now();
        let prices: Vec<PricePoint> = (0..24)
            .map(|i| PricePoint {
                time: now + chrono::Duration::hours(i),
                price: 2.0,
            })
            .collect();
        Ok(PriceSeries {
            current: prices[0],
            prices,
        })
    }

    fn name(&self) -> &str {
        "flat-prices"
    }
}

fn optimizer(device: Arc<SlowDevice>) -> Arc<Optimizer> {
    Arc::new(
        Optimizer::new(
            EngineConfig::default(),
            device,
            Arc::new(FlatPrices),
            None,
            None,
        )
        .expect("default config is valid"),
    )
}

#[tokio::test]
async fn three_concurrent_initializers_share_one_execution() {
    let device = Arc::new(SlowDevice::new(false));
    let opt = optimizer(device.clone());

    let (a, b, c) = tokio::join!(opt.initialize(), opt.initialize(), opt.initialize());
    assert!(a.is_ok() && b.is_ok() && c.is_ok());
    assert_eq!(device.state_calls.load(Ordering::SeqCst), 1);
    assert!(opt.is_ready());
}

#[tokio::test]
async fn concurrent_initializers_fail_together() {
    let device = Arc::new(SlowDevice::new(true));
    let opt = optimizer(device.clone());

    let (a, b, c) = tokio::join!(opt.initialize(), opt.initialize(), opt.initialize());
    assert!(a.is_err() && b.is_err() && c.is_err());
    assert_eq!(device.state_calls.load(Ordering::SeqCst), 1);
    assert!(!opt.is_ready());
}

#[tokio::test]
async fn failed_initialization_is_retryable() {
    let device = Arc::new(SlowDevice::new(true));
    let opt = optimizer(device.clone());

    assert!(opt.initialize().await.is_err());
    assert_eq!(device.state_calls.load(Ordering::SeqCst), 1);

    // The failure re-arms the guard; a later call runs setup again
    device.fail.store(false, Ordering::SeqCst);
    assert!(opt.initialize().await.is_ok());
    assert_eq!(device.state_calls.load(Ordering::SeqCst), 2);
    assert!(opt.is_ready());
}

#[tokio::test]
async fn aborted_initialization_rearms() {
    let device = Arc::new(SlowDevice::new(false));
    let opt = optimizer(device.clone());

    // Drop the leader's future while the slow device fetch is in flight
    let leader = tokio::spawn({
        let opt = opt.clone();
        async move { opt.initialize().await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    leader.abort();
    let _ = leader.await;
    assert!(!opt.is_ready());

    // A later caller detects the orphaned attempt and starts over
    opt.initialize().await.expect("re-armed initialize");
    assert!(opt.is_ready());
    assert_eq!(device.state_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn ready_state_short_circuits() {
    let device = Arc::new(SlowDevice::new(false));
    let opt = optimizer(device.clone());

    opt.initialize().await.expect("first initialize");
    opt.initialize().await.expect("second initialize");
    opt.initialize().await.expect("third initialize");
    assert_eq!(device.state_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn cycle_without_initialization_reports_code() {
    let device = Arc::new(SlowDevice::new(false));
    let opt = optimizer(device);

    let err = opt.run_cycle().await.expect_err("must be rejected");
    assert_eq!(err.code(), "not_initialized");
}
