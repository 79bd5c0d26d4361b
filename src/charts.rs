use crate::data::model::columns;

// ---------------------------------------------------------------------------
// Dashboard tabs
// ---------------------------------------------------------------------------

/// The five thematic tabs of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Overview,
    Demographics,
    Academics,
    Dropouts,
    Correlations,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Tab::Overview,
        Tab::Demographics,
        Tab::Academics,
        Tab::Dropouts,
        Tab::Correlations,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Tab::Overview => "Overview",
            Tab::Demographics => "Demographics",
            Tab::Academics => "Academics",
            Tab::Dropouts => "Dropouts",
            Tab::Correlations => "Correlations",
        }
    }
}

// ---------------------------------------------------------------------------
// Declarative chart catalog
// ---------------------------------------------------------------------------

/// Which derived view a chart reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewSelector {
    /// The user-filtered view.
    Filtered,
    /// The filtered view further restricted to Target == Dropout.
    DropoutsOnly,
}

/// What to compute and how to draw it.  The renderer consumes these; it never
/// hard-codes column names, so charts can be added or retired in one place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChartKind {
    /// First rows of the view, all columns.
    Preview { rows: usize },
    /// Bar chart of counts per category, optionally split into one bar series
    /// per value of `split_by` (grouped side by side).
    CategoryCounts {
        field: &'static str,
        split_by: Option<&'static str>,
    },
    /// Like `CategoryCounts` with a split, but series stacked on one bar.
    StackedCounts {
        field: &'static str,
        split_by: &'static str,
    },
    /// Share of each category value, drawn as a pie.
    Pie { field: &'static str },
    /// Equal-width histogram of a numeric field, optionally one series per
    /// `split_by` value over shared bins.
    NumericHistogram {
        field: &'static str,
        bins: usize,
        split_by: Option<&'static str>,
    },
    /// Five-number box per value of `group_by`.
    BoxByGroup {
        value: &'static str,
        group_by: &'static str,
    },
    /// Scatter of two numeric fields, points colored by a category field.
    Scatter {
        x: &'static str,
        y: &'static str,
        color_by: &'static str,
    },
    /// Annotated Pearson correlation heatmap over all numeric fields.
    CorrelationHeatmap,
}

/// One chart of the dashboard: placement, data derivation, and rendering
/// hints in a single row of the catalog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartSpec {
    pub id: &'static str,
    pub title: &'static str,
    pub caption: Option<&'static str>,
    pub tab: Tab,
    pub view: ViewSelector,
    pub kind: ChartKind,
}

/// The full dashboard, one entry per chart, grouped by tab.
pub const CATALOG: &[ChartSpec] = &[
    // ---- Overview ----
    ChartSpec {
        id: "overview/preview",
        title: "Dataset Preview",
        caption: None,
        tab: Tab::Overview,
        view: ViewSelector::Filtered,
        kind: ChartKind::Preview { rows: 5 },
    },
    ChartSpec {
        id: "overview/target-distribution",
        title: "Target Variable Distribution",
        caption: Some("Distribution of students by their academic status."),
        tab: Tab::Overview,
        view: ViewSelector::Filtered,
        kind: ChartKind::CategoryCounts {
            field: columns::TARGET,
            split_by: None,
        },
    },
    // ---- Demographics ----
    ChartSpec {
        id: "demographics/gender-by-outcome",
        title: "Gender Distribution by Outcome",
        caption: Some("Distribution of student status across gender."),
        tab: Tab::Demographics,
        view: ViewSelector::Filtered,
        kind: ChartKind::CategoryCounts {
            field: columns::GENDER,
            split_by: Some(columns::TARGET),
        },
    },
    ChartSpec {
        id: "demographics/marital-status",
        title: "Marital Status",
        caption: Some("Share of students per marital status."),
        tab: Tab::Demographics,
        view: ViewSelector::Filtered,
        kind: ChartKind::Pie {
            field: columns::MARITAL_STATUS,
        },
    },
    ChartSpec {
        id: "demographics/nationality",
        title: "Nationality Distribution",
        caption: Some("Nationality vs Target status."),
        tab: Tab::Demographics,
        view: ViewSelector::Filtered,
        kind: ChartKind::CategoryCounts {
            field: columns::NATIONALITY,
            split_by: Some(columns::TARGET),
        },
    },
    ChartSpec {
        id: "demographics/international",
        title: "International Students vs Target",
        caption: Some("Comparison of international vs local students by academic outcome."),
        tab: Tab::Demographics,
        view: ViewSelector::Filtered,
        kind: ChartKind::CategoryCounts {
            field: columns::INTERNATIONAL,
            split_by: Some(columns::TARGET),
        },
    },
    // ---- Academics ----
    ChartSpec {
        id: "academics/age-at-enrollment",
        title: "Age at Enrollment",
        caption: Some("Age distribution across target outcomes."),
        tab: Tab::Academics,
        view: ViewSelector::Filtered,
        kind: ChartKind::BoxByGroup {
            value: columns::AGE_AT_ENROLLMENT,
            group_by: columns::TARGET,
        },
    },
    ChartSpec {
        id: "academics/scholarship-by-outcome",
        title: "Scholarship Holder vs Target",
        caption: Some("Scholarship status compared to academic outcomes."),
        tab: Tab::Academics,
        view: ViewSelector::Filtered,
        kind: ChartKind::CategoryCounts {
            field: columns::SCHOLARSHIP,
            split_by: Some(columns::TARGET),
        },
    },
    ChartSpec {
        id: "academics/second-sem-grades",
        title: "2nd Semester Grades Distribution",
        caption: Some("Grade spread for each academic status."),
        tab: Tab::Academics,
        view: ViewSelector::Filtered,
        kind: ChartKind::BoxByGroup {
            value: columns::SECOND_SEM_GRADE,
            group_by: columns::TARGET,
        },
    },
    ChartSpec {
        id: "academics/credited-units",
        title: "Curricular Units Credited vs Status",
        caption: Some("Distribution of credited units for different student outcomes."),
        tab: Tab::Academics,
        view: ViewSelector::Filtered,
        kind: ChartKind::BoxByGroup {
            value: columns::SECOND_SEM_CREDITED,
            group_by: columns::TARGET,
        },
    },
    ChartSpec {
        id: "academics/mothers-occupation",
        title: "Mother's Occupation vs Target",
        caption: None,
        tab: Tab::Academics,
        view: ViewSelector::Filtered,
        kind: ChartKind::CategoryCounts {
            field: columns::MOTHERS_OCCUPATION,
            split_by: Some(columns::TARGET),
        },
    },
    ChartSpec {
        id: "academics/fathers-occupation",
        title: "Father's Occupation vs Target",
        caption: None,
        tab: Tab::Academics,
        view: ViewSelector::Filtered,
        kind: ChartKind::CategoryCounts {
            field: columns::FATHERS_OCCUPATION,
            split_by: Some(columns::TARGET),
        },
    },
    // ---- Dropouts ----
    ChartSpec {
        id: "dropouts/by-gender",
        title: "Dropouts by Gender",
        caption: None,
        tab: Tab::Dropouts,
        view: ViewSelector::DropoutsOnly,
        kind: ChartKind::Pie {
            field: columns::GENDER,
        },
    },
    ChartSpec {
        id: "dropouts/by-age",
        title: "Dropouts by Age",
        caption: None,
        tab: Tab::Dropouts,
        view: ViewSelector::DropoutsOnly,
        kind: ChartKind::NumericHistogram {
            field: columns::AGE_AT_ENROLLMENT,
            bins: 10,
            split_by: None,
        },
    },
    ChartSpec {
        id: "dropouts/by-scholarship",
        title: "Dropouts by Scholarship",
        caption: None,
        tab: Tab::Dropouts,
        view: ViewSelector::DropoutsOnly,
        kind: ChartKind::CategoryCounts {
            field: columns::SCHOLARSHIP,
            split_by: Some(columns::GENDER),
        },
    },
    ChartSpec {
        id: "dropouts/credited-vs-grades",
        title: "Dropouts: Credited vs Grades",
        caption: None,
        tab: Tab::Dropouts,
        view: ViewSelector::DropoutsOnly,
        kind: ChartKind::Scatter {
            x: columns::SECOND_SEM_CREDITED,
            y: columns::SECOND_SEM_GRADE,
            color_by: columns::GENDER,
        },
    },
    // ---- Correlations ----
    ChartSpec {
        id: "correlations/heatmap",
        title: "Correlation Heatmap",
        caption: Some("Correlation of numeric features to detect relationships."),
        tab: Tab::Correlations,
        view: ViewSelector::Filtered,
        kind: ChartKind::CorrelationHeatmap,
    },
    ChartSpec {
        id: "correlations/credited-vs-grades",
        title: "Feature Pairwise Scatter",
        caption: Some("Visualizes curricular units credited vs grades."),
        tab: Tab::Correlations,
        view: ViewSelector::Filtered,
        kind: ChartKind::Scatter {
            x: columns::SECOND_SEM_CREDITED,
            y: columns::SECOND_SEM_GRADE,
            color_by: columns::TARGET,
        },
    },
    ChartSpec {
        id: "correlations/gender-stacked",
        title: "Stacked Bar Chart by Gender and Status",
        caption: None,
        tab: Tab::Correlations,
        view: ViewSelector::Filtered,
        kind: ChartKind::StackedCounts {
            field: columns::GENDER,
            split_by: columns::TARGET,
        },
    },
    ChartSpec {
        id: "correlations/age-histogram",
        title: "Histogram: Age at Enrollment",
        caption: None,
        tab: Tab::Correlations,
        view: ViewSelector::Filtered,
        kind: ChartKind::NumericHistogram {
            field: columns::AGE_AT_ENROLLMENT,
            bins: 20,
            split_by: Some(columns::TARGET),
        },
    },
    ChartSpec {
        id: "correlations/evaluated-histogram",
        title: "Histogram: Curricular Units 2nd Sem (2)",
        caption: None,
        tab: Tab::Correlations,
        view: ViewSelector::Filtered,
        kind: ChartKind::NumericHistogram {
            field: columns::SECOND_SEM_EVALUATED,
            bins: 20,
            split_by: Some(columns::TARGET),
        },
    },
    ChartSpec {
        id: "correlations/grade-histogram",
        title: "Histogram: 2nd Semester Grade",
        caption: None,
        tab: Tab::Correlations,
        view: ViewSelector::Filtered,
        kind: ChartKind::NumericHistogram {
            field: columns::SECOND_SEM_GRADE,
            bins: 20,
            split_by: Some(columns::TARGET),
        },
    },
];

/// Charts of one tab, in catalog order.
pub fn charts_for(tab: Tab) -> impl Iterator<Item = &'static ChartSpec> {
    CATALOG.iter().filter(move |spec| spec.tab == tab)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tab_has_charts() {
        for tab in Tab::ALL {
            assert!(charts_for(tab).count() > 0, "tab {tab:?} is empty");
        }
    }

    #[test]
    fn chart_ids_are_unique() {
        let mut ids: Vec<&str> = CATALOG.iter().map(|s| s.id).collect();
        ids.sort();
        let before = ids.len();
        ids.dedup();
        assert_eq!(ids.len(), before);
    }

    #[test]
    fn dropout_charts_read_the_narrowed_view() {
        assert!(charts_for(Tab::Dropouts).all(|s| s.view == ViewSelector::DropoutsOnly));
        assert!(charts_for(Tab::Overview).all(|s| s.view == ViewSelector::Filtered));
    }
}
