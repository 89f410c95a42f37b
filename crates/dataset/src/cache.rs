//! Dataset and Classification Caches

use crate::loader::load_csv;
use crate::DatasetError;
use chrono::FixedOffset;
use data_validator::{
    Classification, Classifier, DateRange, NormalizationStats, Normalizer, ParkingEvent,
    RawParkingEvent,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Identity of one loaded dataset; a reload gets a fresh id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatasetId(u64);

impl DatasetId {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// A normalized dataset
#[derive(Debug, Clone)]
pub struct Dataset {
    pub id: DatasetId,
    pub path: PathBuf,
    /// Offset the derived date/hour fields were computed in
    pub offset: FixedOffset,
    pub events: Vec<ParkingEvent>,
    pub stats: NormalizationStats,
}

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> Result<MutexGuard<'a, T>, DatasetError> {
    mutex
        .lock()
        .map_err(|e| DatasetError::Lock(format!("{}: {}", name, e)))
}

/// Normalized datasets keyed by source path
pub struct DatasetCache {
    datasets: Mutex<HashMap<PathBuf, Arc<Dataset>>>,
    next_id: AtomicU64,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self {
            datasets: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn build(
        &self,
        path: &Path,
        raws: &[RawParkingEvent],
        normalizer: &Normalizer,
    ) -> Arc<Dataset> {
        let (events, stats) = normalizer.normalize_batch(raws);
        if stats.degraded() > 0 {
            warn!(
                "{} values in {} could not be parsed and were set to null",
                stats.degraded(),
                path.display()
            );
        }
        Arc::new(Dataset {
            id: DatasetId(self.next_id.fetch_add(1, Ordering::Relaxed)),
            path: path.to_path_buf(),
            offset: normalizer.offset(),
            events,
            stats,
        })
    }

    /// Return the cached dataset for `path`, loading and normalizing it on a
    /// miss. A cached entry normalized under a different offset is reloaded.
    pub fn get_or_load(
        &self,
        path: &Path,
        normalizer: &Normalizer,
    ) -> Result<Arc<Dataset>, DatasetError> {
        if let Some(dataset) = lock(&self.datasets, "datasets")?.get(path) {
            if dataset.offset == normalizer.offset() {
                debug!("Dataset cache hit for {}", path.display());
                return Ok(Arc::clone(dataset));
            }
        }

        // Load outside the lock
        let raws = load_csv(path)?;
        let dataset = self.build(path, &raws, normalizer);
        info!(
            "Normalized {} rows from {} as dataset {}",
            dataset.events.len(),
            path.display(),
            dataset.id.get()
        );

        lock(&self.datasets, "datasets")?.insert(path.to_path_buf(), Arc::clone(&dataset));
        Ok(dataset)
    }

    /// Store already-read rows under `path`, replacing any previous entry
    pub fn insert(
        &self,
        path: &Path,
        raws: &[RawParkingEvent],
        normalizer: &Normalizer,
    ) -> Result<Arc<Dataset>, DatasetError> {
        let dataset = self.build(path, raws, normalizer);
        lock(&self.datasets, "datasets")?.insert(path.to_path_buf(), Arc::clone(&dataset));
        Ok(dataset)
    }

    /// Drop the entry for `path`, returning it if present
    pub fn invalidate(&self, path: &Path) -> Result<Option<Arc<Dataset>>, DatasetError> {
        Ok(lock(&self.datasets, "datasets")?.remove(path))
    }

    pub fn clear(&self) -> Result<(), DatasetError> {
        lock(&self.datasets, "datasets")?.clear();
        Ok(())
    }

    pub fn len(&self) -> Result<usize, DatasetError> {
        Ok(lock(&self.datasets, "datasets")?.len())
    }

    pub fn is_empty(&self) -> Result<bool, DatasetError> {
        Ok(self.len()? == 0)
    }
}

impl Default for DatasetCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of classifying one date window of a dataset
#[derive(Debug, Clone)]
pub struct ClassifiedRun {
    /// Events inside the window, in source order
    pub filtered: Vec<ParkingEvent>,
    pub classification: Classification,
}

/// Bit patterns of everything in a classifier that shapes the fences:
/// `k`, then the latitude and longitude fallback domains
type FenceParams = [u64; 5];

type RunKey = (DatasetId, Option<DateRange>, FenceParams);

fn fence_params(classifier: &Classifier) -> FenceParams {
    let domains = classifier.domains();
    [
        classifier.multiplier().to_bits(),
        domains.latitude.low.to_bits(),
        domains.latitude.high.to_bits(),
        domains.longitude.low.to_bits(),
        domains.longitude.high.to_bits(),
    ]
}

/// Classification runs keyed by dataset, date window, and fence parameters.
///
/// Entries live until dropped with [`ClassificationCache::invalidate_dataset`]
/// or [`ClassificationCache::clear`]; a long-lived owner should invalidate a
/// dataset's runs when it reloads or evicts that dataset.
pub struct ClassificationCache {
    runs: Mutex<HashMap<RunKey, Arc<ClassifiedRun>>>,
}

impl ClassificationCache {
    pub fn new() -> Self {
        Self {
            runs: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached run, classifying on a miss. `None` classifies the
    /// whole dataset.
    pub fn get_or_classify(
        &self,
        dataset: &Dataset,
        range: Option<DateRange>,
        classifier: &Classifier,
    ) -> Result<Arc<ClassifiedRun>, DatasetError> {
        let key = (dataset.id, range, fence_params(classifier));
        if let Some(run) = lock(&self.runs, "runs")?.get(&key) {
            debug!("Classification cache hit for dataset {}", dataset.id.get());
            return Ok(Arc::clone(run));
        }

        let filtered = match &range {
            Some(range) => range.apply(&dataset.events),
            None => dataset.events.clone(),
        };
        let classification = classifier.classify(&filtered);
        let run = Arc::new(ClassifiedRun {
            filtered,
            classification,
        });

        lock(&self.runs, "runs")?.insert(key, Arc::clone(&run));
        Ok(run)
    }

    /// Drop every run computed from dataset `id`
    pub fn invalidate_dataset(&self, id: DatasetId) -> Result<usize, DatasetError> {
        let mut runs = lock(&self.runs, "runs")?;
        let before = runs.len();
        runs.retain(|(dataset, _, _), _| *dataset != id);
        Ok(before - runs.len())
    }

    pub fn clear(&self) -> Result<(), DatasetError> {
        lock(&self.runs, "runs")?.clear();
        Ok(())
    }

    pub fn len(&self) -> Result<usize, DatasetError> {
        Ok(lock(&self.runs, "runs")?.len())
    }
}

impl Default for ClassificationCache {
    fn default() -> Self {
        Self::new()
    }
}
