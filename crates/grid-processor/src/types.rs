//! Core types for subset tables and wire records.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One grid point of a subset, value in degrees Celsius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubsetRow {
    pub lat: f64,
    pub lon: f64,
    pub time: NaiveDateTime,
    pub value: f64,
}

/// Ordered rows produced by a single extraction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubsetTable {
    rows: Vec<SubsetRow>,
}

impl SubsetTable {
    pub fn new(rows: Vec<SubsetRow>) -> Self {
        Self { rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[SubsetRow] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SubsetRow> {
        self.rows.iter()
    }

    pub fn into_rows(self) -> Vec<SubsetRow> {
        self.rows
    }
}

impl FromIterator<SubsetRow> for SubsetTable {
    fn from_iter<I: IntoIterator<Item = SubsetRow>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a SubsetTable {
    type Item = &'a SubsetRow;
    type IntoIter = std::slice::Iter<'a, SubsetRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// A point record as sent to the map front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRecord {
    pub lat: f64,
    pub lon: f64,
    pub value: f64,
    /// ISO-8601 timestamp without timezone.
    pub time: String,
}
