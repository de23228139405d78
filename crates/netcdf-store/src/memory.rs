//! In-memory gridded datasets.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{StoreError, StoreResult};
use crate::{DatasetOpener, GridAxes, GridBlock, GridWindow, GriddedDataset};

/// A gridded dataset held entirely in memory.
///
/// Values are laid out as `(time, [height,] lat, lon)` in row-major order,
/// the same layout a NetCDF variable with those dimensions would have.
#[derive(Debug, Clone, PartialEq)]
pub struct InMemoryDataset {
    variable: String,
    units: Option<String>,
    axes: GridAxes,
    values: Vec<f32>,
}

impl InMemoryDataset {
    pub fn new(variable: impl Into<String>, axes: GridAxes, values: Vec<f32>) -> StoreResult<Self> {
        let (nt, ny, nx) = axes.shape();
        let expected = nt * axes.num_levels() * ny * nx;
        if values.len() != expected {
            return Err(StoreError::InvalidFormat(format!(
                "expected {} values for axes {:?} x {} levels, got {}",
                expected,
                axes.shape(),
                axes.num_levels(),
                values.len()
            )));
        }
        Ok(Self {
            variable: variable.into(),
            units: Some("K".to_string()),
            axes,
            values,
        })
    }

    /// Override the units attribute.
    pub fn with_units(mut self, units: Option<&str>) -> Self {
        self.units = units.map(str::to_string);
        self
    }

    fn index(&self, t: usize, level: usize, i: usize, j: usize) -> usize {
        let (_, ny, nx) = self.axes.shape();
        let nz = self.axes.num_levels();
        ((t * nz + level) * ny + i) * nx + j
    }
}

impl GriddedDataset for InMemoryDataset {
    fn variable(&self) -> &str {
        &self.variable
    }

    fn units(&self) -> Option<&str> {
        self.units.as_deref()
    }

    fn axes(&self) -> &GridAxes {
        &self.axes
    }

    fn read_block(&self, window: &GridWindow) -> StoreResult<GridBlock> {
        self.axes.check_window(window)?;
        let level = window.height.unwrap_or(0);

        let mut values = Vec::with_capacity(window.num_cells());
        for t in window.time.clone() {
            for i in window.lat.clone() {
                for j in window.lon.clone() {
                    values.push(self.values[self.index(t, level, i, j)]);
                }
            }
        }

        GridBlock::new(
            values,
            self.axes.time[window.time.clone()].to_vec(),
            self.axes.lat[window.lat.clone()].to_vec(),
            self.axes.lon[window.lon.clone()].to_vec(),
        )
    }
}

/// Opener backed by a swappable in-memory dataset.
///
/// Removing the dataset makes subsequent opens fail with `NotFound`, which
/// mirrors a backing file disappearing from disk.
#[derive(Debug, Default)]
pub struct MemoryOpener {
    dataset: RwLock<Option<InMemoryDataset>>,
    opens: AtomicUsize,
}

impl MemoryOpener {
    pub fn new(dataset: InMemoryDataset) -> Self {
        Self {
            dataset: RwLock::new(Some(dataset)),
            opens: AtomicUsize::new(0),
        }
    }

    /// An opener with no dataset behind it.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Swap in a new dataset for subsequent opens.
    pub fn replace(&self, dataset: InMemoryDataset) {
        *self.dataset.write().unwrap_or_else(PoisonError::into_inner) = Some(dataset);
    }

    /// Remove the dataset so subsequent opens fail.
    pub fn remove(&self) {
        *self.dataset.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Number of successful opens so far.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl DatasetOpener for MemoryOpener {
    fn open(&self) -> StoreResult<Arc<dyn GriddedDataset>> {
        let guard = self.dataset.read().unwrap_or_else(PoisonError::into_inner);
        let dataset = guard
            .clone()
            .ok_or_else(|| StoreError::NotFound(self.source()))?;
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(dataset))
    }

    fn source(&self) -> String {
        "memory://dataset".to_string()
    }
}
