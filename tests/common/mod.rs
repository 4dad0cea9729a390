//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod vk_api;

use chrono::{DateTime, TimeZone, Utc};

pub const TEST_TOKEN: &str = "test-token";

/// Fixed clock used where tests seed rows with known timestamps.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}
