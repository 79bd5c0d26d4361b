use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::charts::Tab;
use crate::data::filter::ScholarshipFilter;
use crate::data::model::columns;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel: gender multi-select and scholarship combo.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filter Options");
    ui.separator();

    let dataset = match &state.dataset {
        Some(ds) => ds.clone(),
        None => {
            ui.label("No dataset loaded.");
            return;
        }
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Gender multi-select ----
            let genders = dataset.distinct(columns::GENDER);
            let header = format!(
                "Gender  ({}/{})",
                state.spec.genders.len(),
                genders.len()
            );
            egui::CollapsingHeader::new(RichText::new(header).strong())
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    ui.horizontal(|ui: &mut Ui| {
                        if ui.small_button("All").clicked() {
                            state.select_all_genders();
                        }
                        if ui.small_button("None").clicked() {
                            state.select_no_genders();
                        }
                    });

                    for value in &genders {
                        let mut checked = state.spec.genders.contains(value);
                        if ui.checkbox(&mut checked, value.to_string()).changed() {
                            state.toggle_gender(value);
                        }
                    }
                });

            ui.separator();

            // ---- Scholarship single-select with explicit "All" sentinel ----
            ui.strong("Scholarship Holder");
            let selected_text = match &state.spec.scholarship {
                ScholarshipFilter::All => "All".to_string(),
                ScholarshipFilter::Only(v) => v.to_string(),
            };
            egui::ComboBox::from_id_salt("scholarship_filter")
                .selected_text(selected_text)
                .show_ui(ui, |ui: &mut Ui| {
                    let is_all = state.spec.scholarship == ScholarshipFilter::All;
                    if ui.selectable_label(is_all, "All").clicked() {
                        state.set_scholarship(ScholarshipFilter::All);
                    }
                    for value in dataset.distinct(columns::SCHOLARSHIP) {
                        let is_selected =
                            state.spec.scholarship == ScholarshipFilter::Only(value.clone());
                        if ui
                            .selectable_label(is_selected, value.to_string())
                            .clicked()
                        {
                            state.set_scholarship(ScholarshipFilter::Only(value.clone()));
                        }
                    }
                });
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu, the tab strip, and the status line.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let can_reload = state.source_path.is_some();
            if ui
                .add_enabled(can_reload, egui::Button::new("Reload"))
                .clicked()
            {
                reload_current(state);
                ui.close_menu();
            }
        });

        ui.separator();

        for tab in Tab::ALL {
            ui.selectable_value(&mut state.active_tab, tab, tab.label());
        }

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} students loaded, {} matching",
                ds.len(),
                state.visible_indices.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File loading
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open student records")
        .add_filter("Supported files", &["parquet", "pq", "json", "csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        load_into_state(state, path);
    }
}

fn reload_current(state: &mut AppState) {
    if let Some(path) = state.source_path.clone() {
        state.cache.invalidate();
        load_into_state(state, path);
    }
}

fn load_into_state(state: &mut AppState, path: std::path::PathBuf) {
    match state.cache.load(&path) {
        Ok(dataset) => {
            log::info!(
                "Loaded {} student records with columns {:?}",
                dataset.len(),
                dataset.column_names()
            );
            state.set_dataset(path, dataset);
        }
        Err(e) => {
            // Load-time errors abort the whole session view; keep whatever
            // dataset was previously shown rather than a half-loaded one.
            log::error!("Failed to load file: {e}");
            state.status_message = Some(format!("Error: {e}"));
        }
    }
}
