//! Common types and utilities shared across the climate map services.

pub mod bbox;
pub mod error;
pub mod time;
pub mod units;

pub use bbox::BoundingBox;
pub use error::{ClimateError, ClimateResult};
pub use time::{format_iso8601, parse_timestamp, CfTimeUnits};
pub use units::{kelvin_to_celsius, round_to, KELVIN_OFFSET};
