use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::error::LoadResult;
use super::loader::load_file;
use super::model::StudentDataset;

// ---------------------------------------------------------------------------
// Process-lifetime dataset cache
// ---------------------------------------------------------------------------

/// Memoizes the loaded dataset for the lifetime of the process.
///
/// [`DatasetCache::load`] re-reads the source only when the path changes or
/// after an explicit [`DatasetCache::invalidate`]; repeated calls for the same
/// path return the same shared `Arc` without touching the file again.  The
/// cached dataset is read-only, so handing out clones of the `Arc` is safe
/// across sessions.
#[derive(Default)]
pub struct DatasetCache {
    slot: Mutex<Option<(PathBuf, Arc<StudentDataset>)>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the dataset at `path`, memoized.
    pub fn load(&self, path: &Path) -> LoadResult<Arc<StudentDataset>> {
        let mut slot = self.slot.lock().expect("dataset cache lock poisoned");
        if let Some((cached_path, dataset)) = slot.as_ref() {
            if cached_path == path {
                return Ok(Arc::clone(dataset));
            }
        }

        let dataset = Arc::new(load_file(path)?);
        *slot = Some((path.to_path_buf(), Arc::clone(&dataset)));
        Ok(dataset)
    }

    /// Drop the memoized dataset so the next [`load`](Self::load) re-reads
    /// the source.
    pub fn invalidate(&self) {
        let mut slot = self.slot.lock().expect("dataset cache lock poisoned");
        *slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "Gender,Scholarship holder,Marital status,Nacionality,International,\
Age at enrollment,Curricular units 2nd sem (grade),Curricular units 2nd sem (credited),\
Mother's occupation,Father's occupation,Target";

    fn sample_file(rows: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .unwrap();
        writeln!(file, "{HEADER}").unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn repeated_loads_share_one_dataset() {
        let file = sample_file(&["Female,1,1,1,0,19,13.5,2,5,7,0"]);
        let cache = DatasetCache::new();

        let first = cache.load(file.path()).unwrap();
        let second = cache.load(file.path()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn memoized_load_ignores_source_edits_until_invalidated() {
        let mut file = sample_file(&["Female,1,1,1,0,19,13.5,2,5,7,0"]);
        let cache = DatasetCache::new();

        let before = cache.load(file.path()).unwrap();
        assert_eq!(before.len(), 1);

        // Append a second record behind the cache's back.
        writeln!(file, "Male,0,2,1,1,24,11.0,0,9,9,1").unwrap();
        file.flush().unwrap();

        let still_cached = cache.load(file.path()).unwrap();
        assert_eq!(still_cached.len(), 1);

        cache.invalidate();
        let reloaded = cache.load(file.path()).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert!(!Arc::ptr_eq(&before, &reloaded));
    }

    #[test]
    fn load_errors_leave_the_cache_empty() {
        let cache = DatasetCache::new();
        assert!(cache.load(Path::new("/no/such/records.csv")).is_err());

        let file = sample_file(&["Female,1,1,1,0,19,13.5,2,5,7,0"]);
        assert_eq!(cache.load(file.path()).unwrap().len(), 1);
    }
}
