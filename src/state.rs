use std::path::PathBuf;
use std::sync::Arc;

use crate::charts::Tab;
use crate::data::cache::DatasetCache;
use crate::data::filter::{apply_filter, FilterSpec, FilteredView, ScholarshipFilter};
use crate::data::model::{columns, FieldValue, StudentDataset};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Process-lifetime memoized loader.
    pub cache: DatasetCache,

    /// Path of the currently loaded source file (None until a load succeeds).
    pub source_path: Option<PathBuf>,

    /// Loaded dataset, shared read-only.
    pub dataset: Option<Arc<StudentDataset>>,

    /// The active filter predicates, replaced wholesale on each change.
    pub spec: FilterSpec,

    /// Indices of records passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Which dashboard tab is shown.
    pub active_tab: Tab,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            cache: DatasetCache::new(),
            source_path: None,
            dataset: None,
            spec: FilterSpec::default(),
            visible_indices: Vec::new(),
            active_tab: Tab::default(),
            status_message: None,
        }
    }
}

impl AppState {
    /// Ingest a newly loaded dataset and reset the filters to "show all".
    pub fn set_dataset(&mut self, path: PathBuf, dataset: Arc<StudentDataset>) {
        self.spec = FilterSpec::all_of(&dataset);
        self.visible_indices = (0..dataset.len()).collect();
        self.source_path = Some(path);
        self.dataset = Some(dataset);
        self.status_message = None;
    }

    /// Recompute `visible_indices` after a filter change.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.dataset {
            if let Err(err) = self.spec.validate(ds) {
                log::warn!("filter outside dataset domain: {err}");
            }
            self.visible_indices = apply_filter(ds, &self.spec).into_indices();
        }
    }

    /// The user-filtered view for the current frame.
    pub fn filtered_view(&self) -> Option<FilteredView<'_>> {
        self.dataset
            .as_ref()
            .map(|ds| FilteredView::from_indices(ds, self.visible_indices.clone()))
    }

    /// Toggle a single gender value in the filter.
    pub fn toggle_gender(&mut self, value: &FieldValue) {
        if self.spec.genders.contains(value) {
            self.spec.genders.remove(value);
        } else {
            self.spec.genders.insert(value.clone());
        }
        self.refilter();
    }

    /// Select every observed gender value.
    pub fn select_all_genders(&mut self) {
        if let Some(ds) = &self.dataset {
            self.spec.genders = ds.distinct(columns::GENDER);
            self.refilter();
        }
    }

    /// Deselect every gender value (matches nothing).
    pub fn select_no_genders(&mut self) {
        self.spec.genders.clear();
        self.refilter();
    }

    /// Replace the scholarship restriction.
    pub fn set_scholarship(&mut self, filter: ScholarshipFilter) {
        self.spec.scholarship = filter;
        self.refilter();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::StudentRecord;
    use std::collections::BTreeMap;

    fn dataset() -> Arc<StudentDataset> {
        let genders = ["Male", "Female", "Female", "Male"];
        let records = genders
            .iter()
            .enumerate()
            .map(|(i, g)| {
                let mut fields = BTreeMap::new();
                fields.insert(
                    columns::GENDER.to_string(),
                    FieldValue::String(g.to_string()),
                );
                fields.insert(columns::SCHOLARSHIP.to_string(), FieldValue::Integer((i % 2) as i64));
                fields.insert(
                    columns::TARGET.to_string(),
                    FieldValue::String("Graduate".to_string()),
                );
                StudentRecord::new(fields)
            })
            .collect();
        Arc::new(StudentDataset::from_records(records))
    }

    #[test]
    fn loading_a_dataset_selects_everything() {
        let mut state = AppState::default();
        state.set_dataset(PathBuf::from("records.csv"), dataset());

        assert_eq!(state.visible_indices, vec![0, 1, 2, 3]);
        assert_eq!(state.spec.genders.len(), 2);
        assert_eq!(state.spec.scholarship, ScholarshipFilter::All);
    }

    #[test]
    fn toggling_a_gender_refilters_immediately() {
        let mut state = AppState::default();
        state.set_dataset(PathBuf::from("records.csv"), dataset());

        state.toggle_gender(&FieldValue::String("Male".into()));
        assert_eq!(state.visible_indices, vec![1, 2]);

        state.toggle_gender(&FieldValue::String("Male".into()));
        assert_eq!(state.visible_indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn scholarship_selection_composes_with_gender() {
        let mut state = AppState::default();
        state.set_dataset(PathBuf::from("records.csv"), dataset());

        state.set_scholarship(ScholarshipFilter::Only(FieldValue::Integer(1)));
        assert_eq!(state.visible_indices, vec![1, 3]);

        state.toggle_gender(&FieldValue::String("Male".into()));
        assert_eq!(state.visible_indices, vec![1]);
    }

    #[test]
    fn select_none_empties_the_view() {
        let mut state = AppState::default();
        state.set_dataset(PathBuf::from("records.csv"), dataset());

        state.select_no_genders();
        assert!(state.visible_indices.is_empty());
        assert_eq!(state.filtered_view().unwrap().len(), 0);

        state.select_all_genders();
        assert_eq!(state.visible_indices.len(), 4);
    }
}
