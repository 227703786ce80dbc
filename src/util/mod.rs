//! Utility functions module
//!
//! Contains formatting helpers used by reports.

pub mod units;

pub use units::{format_bytes, format_duration, format_rate};
