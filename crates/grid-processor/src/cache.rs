//! Process-wide handle to the backing dataset.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use netcdf_store::{DatasetOpener, GriddedDataset};
use tracing::info;

use crate::error::{GridProcessorError, Result};

/// Lazily opened, explicitly invalidated dataset handle.
///
/// ```text
/// Closed --get_dataset()--> Open --clear_cache()--> Closed
/// ```
///
/// The open runs while holding the lock, so concurrent first callers
/// trigger a single open and all receive the same handle. Clearing drops
/// only the cache's reference; requests already holding the handle finish
/// on it and the file closes when the last one releases it.
pub struct DatasetCache {
    opener: Arc<dyn DatasetOpener>,
    slot: Mutex<Option<Arc<dyn GriddedDataset>>>,
    opens: AtomicU64,
}

impl DatasetCache {
    pub fn new(opener: Arc<dyn DatasetOpener>) -> Self {
        Self {
            opener,
            slot: Mutex::new(None),
            opens: AtomicU64::new(0),
        }
    }

    /// Return the open dataset, opening it on first use.
    ///
    /// A failed open leaves the cache closed so the next call retries.
    pub fn get_dataset(&self) -> Result<Arc<dyn GriddedDataset>> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(ds) = slot.as_ref() {
            return Ok(Arc::clone(ds));
        }

        let ds = self
            .opener
            .open()
            .map_err(GridProcessorError::OpenFailed)?;
        self.opens.fetch_add(1, Ordering::Relaxed);
        info!(
            source = %self.opener.source(),
            summary = %ds.summary(),
            "Dataset opened"
        );
        *slot = Some(Arc::clone(&ds));
        Ok(ds)
    }

    /// Drop the cached handle. Returns whether a dataset was open.
    pub fn clear_cache(&self) -> bool {
        let previous = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let was_open = previous.is_some();
        if was_open {
            info!(source = %self.opener.source(), "Dataset cache cleared");
        }
        was_open
    }

    pub fn is_open(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Number of successful opens since startup.
    pub fn open_count(&self) -> u64 {
        self.opens.load(Ordering::Relaxed)
    }

    /// Location of the backing dataset.
    pub fn source(&self) -> String {
        self.opener.source()
    }
}

impl std::fmt::Debug for DatasetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetCache")
            .field("source", &self.opener.source())
            .field("open", &self.is_open())
            .field("opens", &self.open_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netcdf_store::{GridAxes, InMemoryDataset, MemoryOpener};
    use std::thread;

    fn opener() -> Arc<MemoryOpener> {
        let t = chrono::NaiveDate::from_ymd_opt(2024, 5, 31)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let axes = GridAxes {
            time: vec![t],
            lat: vec![30.0],
            lon: vec![-100.0],
            height: None,
        };
        Arc::new(MemoryOpener::new(
            InMemoryDataset::new("TMP", axes, vec![290.0]).unwrap(),
        ))
    }

    #[test]
    fn test_get_dataset_reuses_handle() {
        let opener = opener();
        let cache = DatasetCache::new(opener.clone());
        assert!(!cache.is_open());

        let a = cache.get_dataset().unwrap();
        let b = cache.get_dataset().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(opener.open_count(), 1);
        assert!(cache.is_open());
    }

    #[test]
    fn test_clear_cache_forces_reopen() {
        let opener = opener();
        let cache = DatasetCache::new(opener.clone());
        let a = cache.get_dataset().unwrap();

        assert!(cache.clear_cache());
        assert!(!cache.is_open());
        assert!(!cache.clear_cache());

        let b = cache.get_dataset().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.open_count(), 2);
    }

    #[test]
    fn test_open_failure_leaves_cache_closed() {
        let opener = opener();
        opener.remove();
        let cache = DatasetCache::new(opener.clone());
        assert!(matches!(
            cache.get_dataset(),
            Err(GridProcessorError::OpenFailed(_))
        ));
        assert!(!cache.is_open());

        opener.replace(
            InMemoryDataset::new(
                "TMP",
                GridAxes {
                    time: vec![],
                    lat: vec![],
                    lon: vec![],
                    height: None,
                },
                vec![],
            )
            .unwrap(),
        );
        assert!(cache.get_dataset().is_ok());
    }

    #[test]
    fn test_concurrent_first_access_opens_once() {
        let opener = opener();
        let cache = Arc::new(DatasetCache::new(opener.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.get_dataset().unwrap())
            })
            .collect();
        let datasets: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(opener.open_count(), 1);
        assert!(datasets.iter().all(|d| Arc::ptr_eq(d, &datasets[0])));
    }
}
