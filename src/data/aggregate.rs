use std::collections::BTreeMap;

use super::error::UndefinedCorrelation;
use super::filter::FilteredView;
use super::model::FieldValue;

// ---------------------------------------------------------------------------
// Grouped counts
// ---------------------------------------------------------------------------

/// Counts per distinct combination of group-key values.  Only observed
/// combinations appear; ordering is lexicographic by key values so repeated
/// runs over the same view are reproducible.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedCounts {
    /// The group keys, in the order they were requested.
    pub keys: Vec<String>,
    /// One row per observed combination: (key values, count).
    pub rows: Vec<(Vec<FieldValue>, usize)>,
}

impl GroupedCounts {
    /// Sum of all counts; always equals the length of the source view.
    pub fn total(&self) -> usize {
        self.rows.iter().map(|(_, n)| n).sum()
    }

    /// The distinct values observed at key position `idx`, in order.
    pub fn distinct_at(&self, idx: usize) -> Vec<FieldValue> {
        let mut seen = Vec::new();
        for (vals, _) in &self.rows {
            if !seen.contains(&vals[idx]) {
                seen.push(vals[idx].clone());
            }
        }
        seen.sort();
        seen
    }

    /// Look up the count for an exact key combination (0 when unobserved).
    pub fn count_for(&self, key: &[FieldValue]) -> usize {
        self.rows
            .iter()
            .find(|(vals, _)| vals == key)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}

/// Count view rows per distinct combination of `keys` values.  Rows missing a
/// key column count under `Null` for that position, so the totals always add
/// up to the view length.
pub fn group_counts(view: &FilteredView, keys: &[&str]) -> GroupedCounts {
    let mut counts: BTreeMap<Vec<FieldValue>, usize> = BTreeMap::new();
    for rec in view.records() {
        let combo: Vec<FieldValue> = keys.iter().map(|k| rec.value(k)).collect();
        *counts.entry(combo).or_insert(0) += 1;
    }
    GroupedCounts {
        keys: keys.iter().map(|k| k.to_string()).collect(),
        rows: counts.into_iter().collect(),
    }
}

/// Distribution of a single column.
pub fn value_counts(view: &FilteredView, column: &str) -> GroupedCounts {
    group_counts(view, &[column])
}

// ---------------------------------------------------------------------------
// Numeric summaries (box / violin input)
// ---------------------------------------------------------------------------

/// Five-number summary of a numeric column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericSummary {
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl NumericSummary {
    /// Summarize a set of values.  Returns `None` when no numeric values are
    /// present.  Quartiles use linear interpolation between order statistics.
    pub fn from_values(mut values: Vec<f64>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        values.sort_by(f64::total_cmp);
        Some(NumericSummary {
            count: values.len(),
            min: values[0],
            q1: quantile(&values, 0.25),
            median: quantile(&values, 0.5),
            q3: quantile(&values, 0.75),
            max: values[values.len() - 1],
        })
    }
}

/// Linear-interpolation quantile over sorted values.
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

/// Numeric values of one column across the view.
fn column_values(view: &FilteredView, column: &str) -> Vec<f64> {
    view.records()
        .filter_map(|rec| rec.get(column).and_then(FieldValue::as_f64))
        .collect()
}

/// Five-number summary of one column over the whole view.
pub fn numeric_summary(view: &FilteredView, column: &str) -> Option<NumericSummary> {
    NumericSummary::from_values(column_values(view, column))
}

/// Per-group five-number summaries of `value_column`, grouped by the values of
/// `group_column` in sorted order.  Groups with no numeric values are skipped.
pub fn grouped_numeric_summaries(
    view: &FilteredView,
    value_column: &str,
    group_column: &str,
) -> Vec<(FieldValue, NumericSummary)> {
    let mut groups: BTreeMap<FieldValue, Vec<f64>> = BTreeMap::new();
    for rec in view.records() {
        if let Some(v) = rec.get(value_column).and_then(FieldValue::as_f64) {
            groups.entry(rec.value(group_column)).or_default().push(v);
        }
    }
    groups
        .into_iter()
        .filter_map(|(key, vals)| NumericSummary::from_values(vals).map(|s| (key, s)))
        .collect()
}

// ---------------------------------------------------------------------------
// Histograms
// ---------------------------------------------------------------------------

/// Equal-width histogram of a numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Bin boundaries, `counts.len() + 1` entries.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Midpoint of bin `i`, for bar placement.
    pub fn center(&self, i: usize) -> f64 {
        (self.edges[i] + self.edges[i + 1]) / 2.0
    }

    pub fn bin_width(&self) -> f64 {
        self.edges[1] - self.edges[0]
    }
}

/// Bin the column's values into `bins` equal-width bins spanning the observed
/// range.  The maximum value lands in the last bin.  Returns `None` when the
/// view holds no numeric values for the column.
pub fn histogram(view: &FilteredView, column: &str, bins: usize) -> Option<Histogram> {
    let values = column_values(view, column);
    histogram_of(&values, bins)
}

/// Same as [`histogram`] but over pre-extracted values, so overlaid series
/// can share a common set of bin edges.
pub fn histogram_of(values: &[f64], bins: usize) -> Option<Histogram> {
    if values.is_empty() || bins == 0 {
        return None;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    // Degenerate single-valued column: one unit-width bin.
    if span == 0.0 {
        return Some(Histogram {
            edges: vec![min - 0.5, min + 0.5],
            counts: vec![values.len()],
        });
    }

    let edges: Vec<f64> = (0..=bins)
        .map(|i| min + span * i as f64 / bins as f64)
        .collect();
    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - min) / span) * bins as f64) as usize;
        counts[idx.min(bins - 1)] += 1;
    }
    Some(Histogram { edges, counts })
}

/// Histogram of `column` restricted to rows whose `split_column` equals
/// `split_value`, over a shared set of `edges`-compatible bins.
pub fn histogram_for_split(
    view: &FilteredView,
    column: &str,
    split_column: &str,
    split_value: &FieldValue,
    edges: &[f64],
) -> Vec<usize> {
    let bins = edges.len() - 1;
    let min = edges[0];
    let span = edges[bins] - min;
    let mut counts = vec![0usize; bins];
    for rec in view.records() {
        if rec.value(split_column) != *split_value {
            continue;
        }
        if let Some(v) = rec.get(column).and_then(FieldValue::as_f64) {
            if v < min || v > edges[bins] || span == 0.0 {
                continue;
            }
            let idx = (((v - min) / span) * bins as f64) as usize;
            counts[idx.min(bins - 1)] += 1;
        }
    }
    counts
}

// ---------------------------------------------------------------------------
// Scatter input
// ---------------------------------------------------------------------------

/// (x, y) pairs for rows where both columns are numeric, in view order.
pub fn numeric_pairs(view: &FilteredView, x_column: &str, y_column: &str) -> Vec<[f64; 2]> {
    view.records()
        .filter_map(|rec| {
            let x = rec.get(x_column).and_then(FieldValue::as_f64)?;
            let y = rec.get(y_column).and_then(FieldValue::as_f64)?;
            Some([x, y])
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Correlation matrix
// ---------------------------------------------------------------------------

/// Pairwise Pearson correlations over the numeric columns of a view.
///
/// Cells are carried individually: a degenerate pair (too few rows, zero
/// variance) is marked [`UndefinedCorrelation`] without affecting its
/// neighbors.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub fields: Vec<String>,
    cells: Vec<Vec<Result<f64, UndefinedCorrelation>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, i: usize, j: usize) -> &Result<f64, UndefinedCorrelation> {
        &self.cells[i][j]
    }

    pub fn size(&self) -> usize {
        self.fields.len()
    }
}

/// Compute the symmetric correlation matrix of the view's numeric columns.
/// Each pair uses its complete observations (rows where both cells are
/// numeric).  Defined diagonal entries are exactly 1.0.
pub fn correlation_matrix(view: &FilteredView) -> CorrelationMatrix {
    let fields: Vec<String> = view.dataset().numeric_columns().to_vec();
    let columns: Vec<Vec<Option<f64>>> = fields
        .iter()
        .map(|f| {
            view.records()
                .map(|rec| rec.get(f).and_then(FieldValue::as_f64))
                .collect()
        })
        .collect();

    let n = fields.len();
    let mut cells =
        vec![vec![Err(UndefinedCorrelation::TooFewRows(0)); n]; n];
    for i in 0..n {
        for j in i..n {
            let cell = pairwise_pearson(&columns[i], &columns[j], &fields[i], &fields[j]);
            // A defined self-correlation is 1.0 by definition; don't let
            // floating-point round-off leak onto the diagonal.
            let cell = if i == j { cell.map(|_| 1.0) } else { cell };
            cells[i][j] = cell.clone();
            cells[j][i] = cell;
        }
    }

    CorrelationMatrix { fields, cells }
}

fn pairwise_pearson(
    xs: &[Option<f64>],
    ys: &[Option<f64>],
    x_field: &str,
    y_field: &str,
) -> Result<f64, UndefinedCorrelation> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys.iter())
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();

    let n = pairs.len();
    if n < 2 {
        return Err(UndefinedCorrelation::TooFewRows(n));
    }

    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n as f64;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n as f64;

    let mut var_x = 0.0;
    let mut var_y = 0.0;
    let mut cov = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        var_x += dx * dx;
        var_y += dy * dy;
        cov += dx * dy;
    }

    if var_x == 0.0 {
        return Err(UndefinedCorrelation::ZeroVariance(x_field.to_string()));
    }
    if var_y == 0.0 {
        return Err(UndefinedCorrelation::ZeroVariance(y_field.to_string()));
    }

    Ok((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{apply_filter, FilterSpec};
    use crate::data::model::{columns, StudentDataset, StudentRecord};
    use approx::assert_abs_diff_eq;

    fn record(pairs: &[(&str, FieldValue)]) -> StudentRecord {
        StudentRecord::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    fn toy_dataset() -> StudentDataset {
        let genders = ["Male", "Female", "Female", "Male", "Female", "Male"];
        let targets = ["Dropout", "Graduate", "Enrolled", "Dropout", "Graduate", "Enrolled"];
        let grades = [10.0, 13.5, 12.0, 9.5, 14.0, 11.0];

        let records = (0..6)
            .map(|i| {
                record(&[
                    (columns::GENDER, FieldValue::String(genders[i].into())),
                    (columns::SCHOLARSHIP, FieldValue::Integer((i % 2) as i64)),
                    (columns::TARGET, FieldValue::String(targets[i].into())),
                    (columns::SECOND_SEM_GRADE, FieldValue::Float(grades[i])),
                ])
            })
            .collect();
        StudentDataset::from_records(records)
    }

    fn full_view(ds: &StudentDataset) -> FilteredView<'_> {
        apply_filter(ds, &FilterSpec::all_of(ds))
    }

    #[test]
    fn group_counts_sum_to_the_view_length() {
        let ds = toy_dataset();
        let view = full_view(&ds);
        let counts = group_counts(&view, &[columns::GENDER, columns::TARGET]);
        assert_eq!(counts.total(), view.len());
    }

    #[test]
    fn group_counts_omit_unobserved_combinations() {
        let ds = toy_dataset();
        let view = full_view(&ds);
        let counts = group_counts(&view, &[columns::GENDER, columns::TARGET]);

        // No female dropout in the toy data.
        assert_eq!(
            counts.count_for(&[
                FieldValue::String("Female".into()),
                FieldValue::String("Dropout".into())
            ]),
            0
        );
        assert!(counts.rows.iter().all(|(_, n)| *n > 0));
    }

    #[test]
    fn group_counts_ordering_is_deterministic() {
        let ds = toy_dataset();
        let view = full_view(&ds);
        let a = group_counts(&view, &[columns::TARGET]);
        let b = group_counts(&view, &[columns::TARGET]);
        assert_eq!(a, b);

        let labels: Vec<String> = a.rows.iter().map(|(k, _)| k[0].to_string()).collect();
        assert_eq!(labels, vec!["Dropout", "Enrolled", "Graduate"]);
    }

    #[test]
    fn female_subset_counts_cover_the_subset_exactly() {
        let ds = toy_dataset();
        let spec = FilterSpec {
            genders: [FieldValue::String("Female".into())].into(),
            ..FilterSpec::all_of(&ds)
        };
        let view = apply_filter(&ds, &spec);
        assert_eq!(view.len(), 3);

        let by_target = value_counts(&view, columns::TARGET);
        assert_eq!(by_target.total(), 3);
    }

    #[test]
    fn aggregates_over_an_empty_view_are_empty_not_errors() {
        let ds = toy_dataset();
        let spec = FilterSpec {
            genders: std::collections::BTreeSet::new(),
            ..FilterSpec::all_of(&ds)
        };
        let view = apply_filter(&ds, &spec);

        assert!(group_counts(&view, &[columns::TARGET]).rows.is_empty());
        assert!(numeric_summary(&view, columns::SECOND_SEM_GRADE).is_none());
        assert!(histogram(&view, columns::SECOND_SEM_GRADE, 10).is_none());
        assert!(numeric_pairs(&view, columns::SECOND_SEM_GRADE, columns::SCHOLARSHIP).is_empty());

        // Correlation is the one aggregate that must say *why* it is empty.
        let corr = correlation_matrix(&view);
        for i in 0..corr.size() {
            for j in 0..corr.size() {
                assert_eq!(
                    corr.get(i, j),
                    &Err(UndefinedCorrelation::TooFewRows(0))
                );
            }
        }
    }

    #[test]
    fn summary_quartiles_interpolate_linearly() {
        let s = NumericSummary::from_values(vec![4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(s.count, 4);
        assert_abs_diff_eq!(s.min, 1.0);
        assert_abs_diff_eq!(s.q1, 1.75);
        assert_abs_diff_eq!(s.median, 2.5);
        assert_abs_diff_eq!(s.q3, 3.25);
        assert_abs_diff_eq!(s.max, 4.0);
    }

    #[test]
    fn grouped_summaries_follow_group_order() {
        let ds = toy_dataset();
        let view = full_view(&ds);
        let groups = grouped_numeric_summaries(&view, columns::SECOND_SEM_GRADE, columns::TARGET);

        let labels: Vec<String> = groups.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(labels, vec!["Dropout", "Enrolled", "Graduate"]);
        let dropout = &groups[0].1;
        assert_eq!(dropout.count, 2);
        assert_abs_diff_eq!(dropout.min, 9.5);
        assert_abs_diff_eq!(dropout.max, 10.0);
    }

    #[test]
    fn histogram_counts_cover_every_value_once() {
        let ds = toy_dataset();
        let view = full_view(&ds);
        let hist = histogram(&view, columns::SECOND_SEM_GRADE, 4).unwrap();

        assert_eq!(hist.counts.len(), 4);
        assert_eq!(hist.edges.len(), 5);
        assert_eq!(hist.total(), 6);
        // Max value lands in the last bin rather than overflowing.
        assert!(hist.counts[3] >= 1);
    }

    #[test]
    fn single_valued_column_collapses_to_one_bin() {
        let hist = histogram_of(&[7.0, 7.0, 7.0], 10).unwrap();
        assert_eq!(hist.counts, vec![3]);
    }

    #[test]
    fn correlation_matrix_is_symmetric_with_unit_diagonal() {
        let ds = toy_dataset();
        let view = full_view(&ds);
        let corr = correlation_matrix(&view);

        assert!(corr.size() >= 2);
        for i in 0..corr.size() {
            assert_eq!(corr.get(i, i), &Ok(1.0));
            for j in 0..corr.size() {
                assert_eq!(corr.get(i, j), corr.get(j, i));
            }
        }
    }

    #[test]
    fn perfectly_linear_columns_correlate_to_one() {
        let records = (0..5)
            .map(|i| {
                record(&[
                    ("a", FieldValue::Float(i as f64)),
                    ("b", FieldValue::Float(2.0 * i as f64 + 1.0)),
                    ("c", FieldValue::Float(-(i as f64))),
                ])
            })
            .collect();
        let ds = StudentDataset::from_records(records);
        let view = FilteredView::full(&ds);
        let corr = correlation_matrix(&view);

        let a = corr.fields.iter().position(|f| f == "a").unwrap();
        let b = corr.fields.iter().position(|f| f == "b").unwrap();
        let c = corr.fields.iter().position(|f| f == "c").unwrap();
        assert_abs_diff_eq!(corr.get(a, b).clone().unwrap(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(corr.get(a, c).clone().unwrap(), -1.0, epsilon = 1e-12);
    }

    #[test]
    fn zero_variance_column_is_marked_undefined_only_where_involved() {
        let records = (0..4)
            .map(|i| {
                record(&[
                    ("flat", FieldValue::Integer(3)),
                    ("a", FieldValue::Float(i as f64)),
                    ("b", FieldValue::Float((i * i) as f64)),
                ])
            })
            .collect();
        let ds = StudentDataset::from_records(records);
        let view = FilteredView::full(&ds);
        let corr = correlation_matrix(&view);

        let flat = corr.fields.iter().position(|f| f == "flat").unwrap();
        let a = corr.fields.iter().position(|f| f == "a").unwrap();
        let b = corr.fields.iter().position(|f| f == "b").unwrap();

        assert_eq!(
            corr.get(flat, a),
            &Err(UndefinedCorrelation::ZeroVariance("flat".into()))
        );
        // The rest of the matrix stays usable.
        assert!(corr.get(a, b).is_ok());
    }

    #[test]
    fn split_histograms_share_edges_and_partition_the_total() {
        let ds = toy_dataset();
        let view = full_view(&ds);
        let hist = histogram(&view, columns::SECOND_SEM_GRADE, 4).unwrap();

        let mut split_total = 0usize;
        for gender in ds.distinct(columns::GENDER) {
            let counts = histogram_for_split(
                &view,
                columns::SECOND_SEM_GRADE,
                columns::GENDER,
                &gender,
                &hist.edges,
            );
            split_total += counts.iter().sum::<usize>();
        }
        assert_eq!(split_total, hist.total());
    }

    #[test]
    fn numeric_pairs_keep_view_order() {
        let records = vec![
            record(&[("x", FieldValue::Integer(1)), ("y", FieldValue::Integer(10))]),
            record(&[("x", FieldValue::String("n/a".into())), ("y", FieldValue::Integer(20))]),
            record(&[("x", FieldValue::Integer(3)), ("y", FieldValue::Integer(30))]),
        ];
        let ds = StudentDataset::from_records(records);
        let view = FilteredView::full(&ds);
        assert_eq!(
            numeric_pairs(&view, "x", "y"),
            vec![[1.0, 10.0], [3.0, 30.0]]
        );
    }
}
