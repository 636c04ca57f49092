use eframe::egui::{Color32, RichText, ScrollArea, Ui};

use crate::color::HeatScale;
use crate::data::aggregate::DashboardViews;
use crate::state::{AppState, Tab};
use crate::ui::plot;

// ---------------------------------------------------------------------------
// Central panel – tab strip and tab bodies
// ---------------------------------------------------------------------------

/// Render the tab strip and the active tab.
pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        for tab in Tab::ALL {
            ui.selectable_value(&mut state.active_tab, tab, tab.label());
        }
    });
    ui.separator();

    let state: &AppState = state;
    if state.empty_result {
        ui.label(RichText::new("⚠ 在目前的篩選條件下，找不到任何資料！").color(Color32::from_rgb(230, 160, 0)));
        return;
    }
    let Some(views) = &state.views else {
        return;
    };

    let period = state.filters.period.label();
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| match state.active_tab {
            Tab::Trends => trends(ui, views, period),
            Tab::Geography => geography(ui, state, views, period),
            Tab::Demographics => demographics(ui, views, period),
            Tab::Causes => causes(ui, views, period),
            Tab::CrossTab => cross_tabs(ui, views, period),
        });
}

fn trends(ui: &mut Ui, views: &DashboardViews, period: &str) {
    ui.heading(format!("事故趨勢分析 ({period})"));
    ui.columns(2, |cols| {
        plot::series_chart(&mut cols[0], &views.monthly, None);
        plot::series_chart(&mut cols[1], &views.weekday, None);
    });
    ui.add_space(8.0);
    plot::series_chart(ui, &views.hourly, None);
}

fn geography(ui: &mut Ui, state: &AppState, views: &DashboardViews, period: &str) {
    ui.heading(format!("地理分布分析 ({period})"));
    ui.strong(format!(
        "事故熱點地圖 (隨機抽樣 {} 點, 顯示 {} 點)",
        state.filters.sample_size,
        state.map_points.len()
    ));
    plot::accident_map(ui, &state.map_points);
    ui.add_space(8.0);

    ui.columns(2, |cols| {
        if let Some(city) = &views.city {
            plot::series_chart(&mut cols[0], city, Some(&state.city_colors));
        }
        plot::series_chart(&mut cols[1], &views.locations, None);
    });
}

fn demographics(ui: &mut Ui, views: &DashboardViews, period: &str) {
    ui.heading(format!("人口統計分析 ({period})"));
    ui.columns(2, |cols| {
        plot::series_chart(&mut cols[0], &views.age_bands, None);
        plot::series_chart(&mut cols[1], &views.gender, None);
    });
    ui.separator();
    plot::series_chart(ui, &views.helmet, None);
}

fn causes(ui: &mut Ui, views: &DashboardViews, period: &str) {
    ui.heading(format!("肇事原因與事故型態 ({period})"));
    ui.columns(2, |cols| {
        plot::series_chart(&mut cols[0], &views.accident_major, None);
        plot::series_chart(&mut cols[1], &views.accident_minor, None);
    });
    ui.separator();
    ui.columns(2, |cols| {
        plot::series_chart(&mut cols[0], &views.signal, None);
        plot::series_chart(&mut cols[1], &views.weather, None);
    });
}

fn cross_tabs(ui: &mut Ui, views: &DashboardViews, period: &str) {
    let scale = HeatScale::default();
    ui.heading(format!("🔥 交叉分析 ({period})"));

    ui.label(RichText::new("在特定年齡層中，各種肇事原因所佔的「件數」。").italics());
    plot::heatmap(ui, &views.age_by_cause, &scale);
    ui.separator();

    ui.label(RichText::new("在一週的哪一天，哪些肇事原因特別多。").italics());
    plot::heatmap(ui, &views.weekday_by_cause, &scale);
}

// ---------------------------------------------------------------------------
// Fatal screen
// ---------------------------------------------------------------------------

/// Shown instead of everything else when the snapshot cannot be loaded.
pub fn fatal_screen(ui: &mut Ui, message: &str) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.add_space(ui.available_height() * 0.3);
        ui.heading(RichText::new("錯誤").color(Color32::RED));
        ui.label(RichText::new(message).color(Color32::RED));
        ui.add_space(8.0);
        ui.label("File → Open… 可選擇其他資料檔。");
    });
}
