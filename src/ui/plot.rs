use eframe::egui::{self, Color32, FontId, Pos2, RichText, Sense, Stroke, Ui, Vec2};
use egui_plot::{Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Legend, Plot, Points};

use crate::charts::{charts_for, ChartKind, ChartSpec, ViewSelector};
use crate::color::{diverging, ColorMap};
use crate::data::aggregate::{
    correlation_matrix, group_counts, grouped_numeric_summaries, histogram, histogram_for_split,
    numeric_pairs, value_counts, GroupedCounts,
};
use crate::data::filter::{dropouts_only, FilteredView};
use crate::data::model::FieldValue;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Central panel – the active tab's chart column
// ---------------------------------------------------------------------------

/// Render the central panel for the active tab.
pub fn central_panel(ui: &mut Ui, state: &AppState) {
    let view = match state.filtered_view() {
        Some(v) => v,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open a student records file to begin  (File → Open…)");
            });
            return;
        }
    };
    let dropouts = dropouts_only(&view);

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for spec in charts_for(state.active_tab) {
                let chart_view = match spec.view {
                    ViewSelector::Filtered => &view,
                    ViewSelector::DropoutsOnly => &dropouts,
                };
                render_chart(ui, spec, chart_view);
                ui.add_space(12.0);
            }
        });
}

fn render_chart(ui: &mut Ui, spec: &ChartSpec, view: &FilteredView) {
    ui.push_id(spec.id, |ui: &mut Ui| {
        ui.heading(spec.title);
        if let Some(caption) = spec.caption {
            ui.label(caption);
        }

        match spec.kind {
            ChartKind::Preview { rows } => preview_table(ui, view, rows),
            ChartKind::CategoryCounts { field, split_by } => match split_by {
                Some(split) => grouped_bars(ui, spec.id, view, field, split, false),
                None => simple_bars(ui, spec.id, view, field),
            },
            ChartKind::StackedCounts { field, split_by } => {
                grouped_bars(ui, spec.id, view, field, split_by, true)
            }
            ChartKind::Pie { field } => pie_chart(ui, view, field),
            ChartKind::NumericHistogram {
                field,
                bins,
                split_by,
            } => numeric_histogram(ui, spec.id, view, field, bins, split_by),
            ChartKind::BoxByGroup { value, group_by } => {
                box_by_group(ui, spec.id, view, value, group_by)
            }
            ChartKind::Scatter { x, y, color_by } => scatter(ui, spec.id, view, x, y, color_by),
            ChartKind::CorrelationHeatmap => correlation_heatmap(ui, view),
        }
    });
}

fn no_rows(ui: &mut Ui) {
    ui.label(RichText::new("No rows match the current filters.").italics());
}

/// A colour map anchored on the whole dataset, so a category keeps its colour
/// no matter how the view is filtered.
fn split_colors(view: &FilteredView, column: &str) -> ColorMap {
    ColorMap::new(&view.dataset().distinct(column))
}

/// Axis formatter mapping integer positions back onto category labels.
fn category_axis(
    labels: Vec<String>,
) -> impl Fn(egui_plot::GridMark, &std::ops::RangeInclusive<f64>) -> String {
    move |mark, _range| {
        let rounded = mark.value.round();
        if (mark.value - rounded).abs() > 0.01 || rounded < 0.0 {
            return String::new();
        }
        labels.get(rounded as usize).cloned().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Dataset preview
// ---------------------------------------------------------------------------

fn preview_table(ui: &mut Ui, view: &FilteredView, rows: usize) {
    if view.is_empty() {
        no_rows(ui);
        return;
    }
    let columns = view.dataset().column_names();

    egui_extras::TableBuilder::new(ui)
        .striped(true)
        .columns(egui_extras::Column::auto().resizable(true), columns.len())
        .header(20.0, |mut header| {
            for col in columns {
                header.col(|ui| {
                    ui.strong(col);
                });
            }
        })
        .body(|mut body| {
            for rec in view.records().take(rows) {
                body.row(18.0, |mut row| {
                    for col in columns {
                        row.col(|ui| {
                            ui.label(rec.value(col).to_string());
                        });
                    }
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Bar charts (plain, grouped, stacked)
// ---------------------------------------------------------------------------

fn simple_bars(ui: &mut Ui, id: &str, view: &FilteredView, field: &str) {
    let counts = value_counts(view, field);
    if counts.rows.is_empty() {
        no_rows(ui);
        return;
    }
    let colors = split_colors(view, field);

    let charts: Vec<BarChart> = counts
        .rows
        .iter()
        .enumerate()
        .map(|(i, (key, n))| {
            let bar = Bar::new(i as f64, *n as f64).width(0.7);
            BarChart::new(vec![bar])
                .color(colors.color_for(&key[0]))
                .name(key[0].to_string())
        })
        .collect();
    let labels: Vec<String> = counts.rows.iter().map(|(k, _)| k[0].to_string()).collect();

    Plot::new(id)
        .height(260.0)
        .legend(Legend::default())
        .x_axis_formatter(category_axis(labels))
        .y_axis_label("Count")
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });
}

fn grouped_bars(
    ui: &mut Ui,
    id: &str,
    view: &FilteredView,
    field: &str,
    split: &str,
    stacked: bool,
) {
    let counts = group_counts(view, &[field, split]);
    if counts.rows.is_empty() {
        no_rows(ui);
        return;
    }
    let categories = counts.distinct_at(0);
    let splits = counts.distinct_at(1);
    let colors = split_colors(view, split);

    let series_width = if stacked {
        0.7
    } else {
        0.8 / splits.len() as f64
    };

    let mut charts = Vec::with_capacity(splits.len());
    let mut stack_base = vec![0.0f64; categories.len()];
    for (s_idx, split_val) in splits.iter().enumerate() {
        let mut bars = Vec::with_capacity(categories.len());
        for (c_idx, cat) in categories.iter().enumerate() {
            let n = counts.count_for(&[cat.clone(), split_val.clone()]);
            if n == 0 {
                continue;
            }
            let x = if stacked {
                c_idx as f64
            } else {
                c_idx as f64 + series_width * (s_idx as f64 - (splits.len() as f64 - 1.0) / 2.0)
            };
            let mut bar = Bar::new(x, n as f64).width(series_width * 0.95);
            if stacked {
                bar = bar.base_offset(stack_base[c_idx]);
                stack_base[c_idx] += n as f64;
            }
            bars.push(bar);
        }
        charts.push(
            BarChart::new(bars)
                .color(colors.color_for(split_val))
                .name(split_val.to_string()),
        );
    }
    let labels: Vec<String> = categories.iter().map(|c| c.to_string()).collect();

    Plot::new(id)
        .height(260.0)
        .legend(Legend::default())
        .x_axis_formatter(category_axis(labels))
        .y_axis_label("Count")
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });
}

// ---------------------------------------------------------------------------
// Pie chart
// ---------------------------------------------------------------------------

fn pie_chart(ui: &mut Ui, view: &FilteredView, field: &str) {
    let counts = value_counts(view, field);
    let total = counts.total();
    if total == 0 {
        no_rows(ui);
        return;
    }
    let colors = split_colors(view, field);

    ui.horizontal(|ui: &mut Ui| {
        let size = 220.0;
        let (response, painter) = ui.allocate_painter(Vec2::splat(size), Sense::hover());
        let center = response.rect.center();
        let radius = size * 0.45;

        let mut start = -std::f32::consts::FRAC_PI_2;
        for (key, n) in &counts.rows {
            let sweep = std::f32::consts::TAU * *n as f32 / total as f32;
            draw_wedge(&painter, center, radius, start, sweep, colors.color_for(&key[0]));
            start += sweep;
        }

        pie_legend(ui, &counts, &colors, total);
    });
}

/// Draw one pie sector, split into convex sub-sectors of at most 90 degrees.
fn draw_wedge(
    painter: &egui::Painter,
    center: Pos2,
    radius: f32,
    start: f32,
    sweep: f32,
    color: Color32,
) {
    let mut a0 = start;
    let mut remaining = sweep;
    while remaining > 1e-4 {
        let seg = remaining.min(std::f32::consts::FRAC_PI_2);
        let steps = 16;
        let mut points = vec![center];
        for s in 0..=steps {
            let a = a0 + seg * s as f32 / steps as f32;
            points.push(center + radius * Vec2::new(a.cos(), a.sin()));
        }
        painter.add(egui::Shape::convex_polygon(points, color, Stroke::NONE));
        a0 += seg;
        remaining -= seg;
    }
}

fn pie_legend(ui: &mut Ui, counts: &GroupedCounts, colors: &ColorMap, total: usize) {
    ui.vertical(|ui: &mut Ui| {
        for (key, n) in &counts.rows {
            ui.horizontal(|ui: &mut Ui| {
                let (response, painter) =
                    ui.allocate_painter(Vec2::new(12.0, 12.0), Sense::hover());
                painter.rect_filled(response.rect, 2.0, colors.color_for(&key[0]));
                let pct = 100.0 * *n as f64 / total as f64;
                ui.label(format!("{}: {} ({:.1}%)", key[0], n, pct));
            });
        }
    });
}

// ---------------------------------------------------------------------------
// Numeric histograms
// ---------------------------------------------------------------------------

fn numeric_histogram(
    ui: &mut Ui,
    id: &str,
    view: &FilteredView,
    field: &str,
    bins: usize,
    split_by: Option<&str>,
) {
    let Some(hist) = histogram(view, field, bins) else {
        no_rows(ui);
        return;
    };

    let charts: Vec<BarChart> = match split_by {
        None => {
            let bars: Vec<Bar> = hist
                .counts
                .iter()
                .enumerate()
                .map(|(i, &n)| Bar::new(hist.center(i), n as f64).width(hist.bin_width() * 0.95))
                .collect();
            vec![BarChart::new(bars).color(Color32::LIGHT_BLUE)]
        }
        Some(split) => {
            let splits: Vec<FieldValue> = view.dataset().distinct(split).into_iter().collect();
            let colors = split_colors(view, split);
            let series_width = hist.bin_width() / splits.len() as f64;
            splits
                .iter()
                .enumerate()
                .map(|(s_idx, split_val)| {
                    let counts =
                        histogram_for_split(view, field, split, split_val, &hist.edges);
                    let bars: Vec<Bar> = counts
                        .iter()
                        .enumerate()
                        .filter(|(_, &n)| n > 0)
                        .map(|(i, &n)| {
                            let x = hist.edges[i]
                                + series_width * (s_idx as f64 + 0.5);
                            Bar::new(x, n as f64).width(series_width * 0.95)
                        })
                        .collect();
                    BarChart::new(bars)
                        .color(colors.color_for(split_val))
                        .name(split_val.to_string())
                })
                .collect()
        }
    };

    Plot::new(id)
        .height(260.0)
        .legend(Legend::default())
        .x_axis_label(field.to_string())
        .y_axis_label("Count")
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });
}

// ---------------------------------------------------------------------------
// Box plots
// ---------------------------------------------------------------------------

fn box_by_group(ui: &mut Ui, id: &str, view: &FilteredView, value: &str, group_by: &str) {
    let groups = grouped_numeric_summaries(view, value, group_by);
    if groups.is_empty() {
        no_rows(ui);
        return;
    }
    let colors = split_colors(view, group_by);

    let boxes: Vec<BoxPlot> = groups
        .iter()
        .enumerate()
        .map(|(i, (key, s))| {
            let elem = BoxElem::new(
                i as f64,
                BoxSpread::new(s.min, s.q1, s.median, s.q3, s.max),
            )
            .box_width(0.5)
            .fill(colors.color_for(key).gamma_multiply(0.6))
            .stroke(Stroke::new(1.5, colors.color_for(key)));
            BoxPlot::new(vec![elem]).name(key.to_string())
        })
        .collect();
    let labels: Vec<String> = groups.iter().map(|(k, _)| k.to_string()).collect();

    Plot::new(id)
        .height(280.0)
        .legend(Legend::default())
        .x_axis_formatter(category_axis(labels))
        .y_axis_label(value.to_string())
        .show(ui, |plot_ui| {
            for b in boxes {
                plot_ui.box_plot(b);
            }
        });
}

// ---------------------------------------------------------------------------
// Scatter plots
// ---------------------------------------------------------------------------

fn scatter(ui: &mut Ui, id: &str, view: &FilteredView, x: &str, y: &str, color_by: &str) {
    if view.is_empty() {
        no_rows(ui);
        return;
    }
    let colors = split_colors(view, color_by);
    let groups: Vec<FieldValue> = view.dataset().distinct(color_by).into_iter().collect();

    Plot::new(id)
        .height(280.0)
        .legend(Legend::default())
        .x_axis_label(x.to_string())
        .y_axis_label(y.to_string())
        .show(ui, |plot_ui| {
            for value in &groups {
                let sub = view.restrict(|rec| rec.value(color_by) == *value);
                let pairs = numeric_pairs(&sub, x, y);
                if pairs.is_empty() {
                    continue;
                }
                plot_ui.points(
                    Points::new(pairs)
                        .radius(2.5)
                        .color(colors.color_for(value))
                        .name(value.to_string()),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Correlation heatmap
// ---------------------------------------------------------------------------

fn correlation_heatmap(ui: &mut Ui, view: &FilteredView) {
    let corr = correlation_matrix(view);
    let n = corr.size();
    if n == 0 {
        no_rows(ui);
        return;
    }

    let label_width = 180.0;
    let label_height = 120.0;
    let cell = ((ui.available_width() - label_width) / n as f32).clamp(18.0, 40.0);
    let desired = Vec2::new(
        label_width + cell * n as f32,
        cell * n as f32 + label_height,
    );
    let (response, painter) = ui.allocate_painter(desired, Sense::hover());
    let origin = response.rect.min + Vec2::new(label_width, 0.0);

    let font = FontId::proportional(10.0);
    let label_color = ui.visuals().text_color();

    for (i, field) in corr.fields.iter().enumerate() {
        // Row label, right-aligned against the matrix.
        painter.text(
            Pos2::new(origin.x - 6.0, origin.y + (i as f32 + 0.5) * cell),
            egui::Align2::RIGHT_CENTER,
            field,
            font.clone(),
            label_color,
        );

        // Column label, slanted under the matrix.
        let galley = painter.layout_no_wrap(field.clone(), font.clone(), label_color);
        let pos = Pos2::new(
            origin.x + (i as f32 + 0.5) * cell,
            origin.y + n as f32 * cell + 6.0,
        );
        let mut shape = egui::epaint::TextShape::new(pos, galley, label_color);
        shape.angle = std::f32::consts::FRAC_PI_4;
        painter.add(shape);
    }

    for i in 0..n {
        for j in 0..n {
            let rect = egui::Rect::from_min_size(
                Pos2::new(origin.x + j as f32 * cell, origin.y + i as f32 * cell),
                Vec2::splat(cell),
            );
            match corr.get(i, j) {
                Ok(r) => {
                    let fill = diverging(*r as f32);
                    painter.rect_filled(rect.shrink(0.5), 0.0, fill);
                    let text_color = if r.abs() > 0.55 {
                        Color32::WHITE
                    } else {
                        Color32::BLACK
                    };
                    painter.text(
                        rect.center(),
                        egui::Align2::CENTER_CENTER,
                        format!("{r:.2}"),
                        FontId::proportional((cell * 0.32).min(11.0)),
                        text_color,
                    );
                }
                Err(_) => {
                    // Undefined cell: greyed out, siblings stay usable.
                    painter.rect_filled(rect.shrink(0.5), 0.0, Color32::from_gray(90));
                    painter.text(
                        rect.center(),
                        egui::Align2::CENTER_CENTER,
                        "n/a",
                        FontId::proportional((cell * 0.32).min(11.0)),
                        Color32::from_gray(200),
                    );
                }
            }
        }
    }
}
