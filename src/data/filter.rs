use std::collections::BTreeSet;

use super::error::FilterDomainError;
use super::model::{columns, FieldValue, Outcome, StudentDataset, StudentRecord};

// ---------------------------------------------------------------------------
// FilterSpec – the active filter predicates
// ---------------------------------------------------------------------------

/// Scholarship restriction: one selected value, or no restriction at all.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScholarshipFilter {
    /// The explicit "All" sentinel offered by the UI.
    #[default]
    All,
    Only(FieldValue),
}

/// Snapshot of the user-selected filter predicates.  Replaced wholesale on
/// every filter change; never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterSpec {
    /// Acceptable Gender values.  The full distinct set means no restriction;
    /// an empty set matches nothing.
    pub genders: BTreeSet<FieldValue>,
    pub scholarship: ScholarshipFilter,
}

impl FilterSpec {
    /// The no-restriction spec for a dataset: every observed gender selected,
    /// scholarship "All".
    pub fn all_of(dataset: &StudentDataset) -> Self {
        FilterSpec {
            genders: dataset.distinct(columns::GENDER),
            scholarship: ScholarshipFilter::All,
        }
    }

    /// Check every selected value against the dataset's observed domain.
    ///
    /// Out-of-domain values are not fatal — filtering simply matches nothing
    /// for them — but callers may want to log the condition.
    pub fn validate(&self, dataset: &StudentDataset) -> Result<(), FilterDomainError> {
        let known_genders = dataset.distinct(columns::GENDER);
        for g in &self.genders {
            if !known_genders.contains(g) {
                return Err(FilterDomainError::UnknownGender(g.to_string()));
            }
        }
        if let ScholarshipFilter::Only(v) = &self.scholarship {
            if !dataset.distinct(columns::SCHOLARSHIP).contains(v) {
                return Err(FilterDomainError::UnknownScholarship(v.to_string()));
            }
        }
        Ok(())
    }

    fn matches(&self, rec: &StudentRecord) -> bool {
        let gender_ok = match rec.get(columns::GENDER) {
            Some(g) => self.genders.contains(g),
            None => false,
        };
        let scholarship_ok = match &self.scholarship {
            ScholarshipFilter::All => true,
            ScholarshipFilter::Only(v) => rec.get(columns::SCHOLARSHIP) == Some(v),
        };
        gender_ok && scholarship_ok
    }
}

// ---------------------------------------------------------------------------
// FilteredView – an order-preserving row subset of the dataset
// ---------------------------------------------------------------------------

/// The dataset restricted to rows matching some predicate chain.  Holds row
/// indices in ascending source order; rows are borrowed, never copied or
/// modified.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    dataset: &'a StudentDataset,
    indices: Vec<usize>,
}

impl<'a> FilteredView<'a> {
    /// The unrestricted view: every row of the dataset.
    pub fn full(dataset: &'a StudentDataset) -> Self {
        FilteredView {
            dataset,
            indices: (0..dataset.len()).collect(),
        }
    }

    /// Rebuild a view from previously computed indices (ascending row order).
    pub fn from_indices(dataset: &'a StudentDataset, indices: Vec<usize>) -> Self {
        debug_assert!(indices.windows(2).all(|w| w[0] < w[1]));
        debug_assert!(indices.iter().all(|&i| i < dataset.len()));
        FilteredView { dataset, indices }
    }

    /// Derive a narrower view by keeping only rows matching `pred`.  Every
    /// narrower view (e.g. dropouts-only) goes through here, so the
    /// order-preservation and strict-subset guarantees hold uniformly.
    pub fn restrict(&self, pred: impl Fn(&StudentRecord) -> bool) -> FilteredView<'a> {
        FilteredView {
            dataset: self.dataset,
            indices: self
                .indices
                .iter()
                .copied()
                .filter(|&i| pred(self.dataset.record(i)))
                .collect(),
        }
    }

    pub fn dataset(&self) -> &'a StudentDataset {
        self.dataset
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn into_indices(self) -> Vec<usize> {
        self.indices
    }

    /// Rows of the view in original dataset order.
    pub fn records(&self) -> impl Iterator<Item = &'a StudentRecord> + '_ {
        self.indices.iter().map(|&i| self.dataset.record(i))
    }
}

// ---------------------------------------------------------------------------
// Filtering entry-points
// ---------------------------------------------------------------------------

/// Apply the user's filter predicates to the full dataset.
///
/// A row is kept iff its Gender is among the selected values and its
/// scholarship status matches the selection (or the selection is "All").
/// Out-of-domain spec values produce an empty view, never an error.
pub fn apply_filter<'a>(dataset: &'a StudentDataset, spec: &FilterSpec) -> FilteredView<'a> {
    FilteredView::full(dataset).restrict(|rec| spec.matches(rec))
}

/// Narrow a view down to students whose outcome is Dropout.
pub fn dropouts_only<'a>(view: &FilteredView<'a>) -> FilteredView<'a> {
    let label = FieldValue::String(Outcome::Dropout.label().to_string());
    view.restrict(move |rec| rec.get(columns::TARGET) == Some(&label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn gender(s: &str) -> FieldValue {
        FieldValue::String(s.to_string())
    }

    /// Six records mirroring the layout the dashboard sees after load:
    /// Target already remapped to labels, alternating genders.
    fn toy_dataset() -> StudentDataset {
        let genders = ["Male", "Female", "Female", "Male", "Female", "Male"];
        let scholarships = [0, 1, 0, 1, 0, 1];
        let targets = ["Dropout", "Graduate", "Enrolled", "Dropout", "Graduate", "Enrolled"];

        let records = (0..6)
            .map(|i| {
                let mut fields = BTreeMap::new();
                fields.insert(columns::GENDER.to_string(), gender(genders[i]));
                fields.insert(
                    columns::SCHOLARSHIP.to_string(),
                    FieldValue::Integer(scholarships[i]),
                );
                fields.insert(
                    columns::TARGET.to_string(),
                    FieldValue::String(targets[i].to_string()),
                );
                fields.insert(columns::AGE_AT_ENROLLMENT.to_string(), FieldValue::Integer(18 + i as i64));
                StudentRecord::new(fields)
            })
            .collect();
        StudentDataset::from_records(records)
    }

    #[test]
    fn no_restriction_spec_returns_the_whole_dataset_in_order() {
        let ds = toy_dataset();
        let view = apply_filter(&ds, &FilterSpec::all_of(&ds));
        assert_eq!(view.indices(), &[0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn apply_filter_is_idempotent() {
        let ds = toy_dataset();
        let spec = FilterSpec {
            genders: [gender("Female")].into(),
            scholarship: ScholarshipFilter::Only(FieldValue::Integer(0)),
        };
        let once = apply_filter(&ds, &spec);
        let twice = apply_filter(&ds, &spec);
        assert_eq!(once.indices(), twice.indices());
    }

    #[test]
    fn female_selection_keeps_exactly_the_female_rows() {
        let ds = toy_dataset();
        let spec = FilterSpec {
            genders: [gender("Female")].into(),
            scholarship: ScholarshipFilter::All,
        };
        let view = apply_filter(&ds, &spec);

        assert_eq!(view.indices(), &[1, 2, 4]);
        assert!(view
            .records()
            .all(|r| r.get(columns::GENDER) == Some(&gender("Female"))));
    }

    #[test]
    fn every_kept_row_satisfies_both_predicates() {
        let ds = toy_dataset();
        let spec = FilterSpec {
            genders: [gender("Male")].into(),
            scholarship: ScholarshipFilter::Only(FieldValue::Integer(1)),
        };
        let view = apply_filter(&ds, &spec);

        assert!(view.len() <= ds.len());
        assert_eq!(view.indices(), &[3, 5]);
        for rec in view.records() {
            assert_eq!(rec.get(columns::GENDER), Some(&gender("Male")));
            assert_eq!(rec.get(columns::SCHOLARSHIP), Some(&FieldValue::Integer(1)));
        }
    }

    #[test]
    fn empty_gender_selection_yields_an_empty_view() {
        let ds = toy_dataset();
        let spec = FilterSpec {
            genders: BTreeSet::new(),
            scholarship: ScholarshipFilter::All,
        };
        let view = apply_filter(&ds, &spec);
        assert!(view.is_empty());
    }

    #[test]
    fn out_of_domain_values_produce_an_empty_view_not_an_error() {
        let ds = toy_dataset();
        let spec = FilterSpec {
            genders: [gender("Other")].into(),
            scholarship: ScholarshipFilter::All,
        };
        assert!(apply_filter(&ds, &spec).is_empty());
        assert_eq!(
            spec.validate(&ds),
            Err(FilterDomainError::UnknownGender("Other".into()))
        );
    }

    #[test]
    fn in_domain_spec_validates_cleanly() {
        let ds = toy_dataset();
        assert_eq!(FilterSpec::all_of(&ds).validate(&ds), Ok(()));
    }

    #[test]
    fn dropouts_only_is_a_further_restriction_of_the_view() {
        let ds = toy_dataset();
        let spec = FilterSpec {
            genders: [gender("Male")].into(),
            scholarship: ScholarshipFilter::All,
        };
        let view = apply_filter(&ds, &spec);
        let dropouts = dropouts_only(&view);

        assert_eq!(dropouts.indices(), &[0, 3]);
        assert!(dropouts.len() <= view.len());
    }
}
