//! Conversion of subset tables into wire records.

use climate_common::format_iso8601;

use crate::types::{DataRecord, SubsetTable};

/// Render every row as a `{lat, lon, value, time}` record.
pub fn to_records(table: &SubsetTable) -> Vec<DataRecord> {
    table
        .iter()
        .map(|row| DataRecord {
            lat: row.lat,
            lon: row.lon,
            value: row.value,
            time: format_iso8601(&row.time),
        })
        .collect()
}
