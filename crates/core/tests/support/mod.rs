//! Shared test helpers for `aura-core` integration tests.
//!
//! In-memory port doubles and scripted collaborators so scenario tests can
//! focus on behaviour instead of boilerplate.

#![allow(dead_code)]

pub mod classifiers;
pub mod repositories;

use chrono::{NaiveDate, NaiveDateTime};

/// Wall-clock time on 2024-06-03 (a Monday).
pub fn at(hour: u32, minute: u32) -> NaiveDateTime {
    day(3).and_hms_opt(hour, minute, 0).unwrap()
}

pub fn day(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
}
