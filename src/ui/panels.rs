use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::config::{SAMPLE_SIZE_MAX, SAMPLE_SIZE_MIN, SAMPLE_SIZE_STEP};
use crate::data::filter::{FilterState, PeriodFilter};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("🔍 全域篩選器");
    ui.separator();

    // Clone what we need so we can mutate state inside the loop.
    let Some(table) = state.table.clone() else {
        ui.label("尚未載入資料。");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Cities ----
            let header = format!("選擇縣市  ({}/{})", state.filters.cities.len(), table.cities.len());
            egui::CollapsingHeader::new(RichText::new(header).strong())
                .id_salt("cities")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    if ui.small_button("全選 / 重設").clicked() {
                        state.toggle_all_cities();
                    }
                    for city in &table.cities {
                        let mut checked = state.filters.cities.contains(city);
                        let mut text = RichText::new(city);
                        if let Some(c) = state.city_colors.get(city) {
                            text = text.color(*c);
                        }
                        if ui.checkbox(&mut checked, text).changed() {
                            FilterState::toggle(&mut state.filters.cities, city);
                        }
                    }
                });
            ui.separator();

            // ---- Month range ----
            ui.strong("選擇月份範圍");
            let (mut lo, mut hi) = state.filters.month_range;
            let lo_changed = ui.add(egui::Slider::new(&mut lo, 1..=12).text("起")).changed();
            let hi_changed = ui.add(egui::Slider::new(&mut hi, 1..=12).text("迄")).changed();
            if lo_changed || hi_changed {
                // Dragging one handle past the other drags both.
                if lo_changed && lo > hi {
                    hi = lo;
                }
                if hi_changed && hi < lo {
                    lo = hi;
                }
                state.filters.set_month_range(lo, hi);
            }
            ui.separator();

            // ---- Weather ----
            let header = format!("天候狀況  ({}/{})", state.filters.weather.len(), table.weathers.len());
            egui::CollapsingHeader::new(RichText::new(header).strong())
                .id_salt("weather")
                .default_open(false)
                .show(ui, |ui: &mut Ui| {
                    if ui.small_button("全選 / 全不選").clicked() {
                        state.toggle_all_weather();
                    }
                    for weather in &table.weathers {
                        let mut checked = state.filters.weather.contains(weather);
                        if ui.checkbox(&mut checked, weather.as_str()).changed() {
                            FilterState::toggle(&mut state.filters.weather, weather);
                        }
                    }
                });
            ui.separator();

            // ---- Period ----
            ui.strong("選擇時段 (平日/週末)");
            for period in PeriodFilter::ALL {
                ui.radio_value(&mut state.filters.period, period, period.label());
            }
            ui.separator();

            // ---- Map sample size ----
            ui.strong("地圖抽樣點數");
            ui.add(
                egui::Slider::new(&mut state.filters.sample_size, SAMPLE_SIZE_MIN..=SAMPLE_SIZE_MAX)
                    .step_by(SAMPLE_SIZE_STEP as f64),
            );
            ui.separator();

            if !state.empty_result {
                ui.label(RichText::new(format!("篩選出 {} 筆資料", state.visible_indices.len())).strong());
            }
        });

    // Recompute views after any widget changes.
    state.sync_filters();
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                state.load_snapshot();
                ui.close_menu();
            }
        });

        ui.separator();
        ui.label(RichText::new("🏍 113年度機車事故").strong());
        ui.separator();

        if let Some(table) = &state.table {
            ui.label(format!(
                "{}: {} 筆機車事故, {} 筆符合篩選",
                state.snapshot_path.display(),
                table.len(),
                state.visible_indices.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open accident snapshot")
        .add_filter("Supported files", &["parquet", "pq", "json", "csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        log::info!("Opening snapshot {}", path.display());
        state.status_message = None;
        state.open_snapshot(path);
    }
}
