use std::collections::BTreeMap;

use eframe::egui::{self, Align2, Color32, FontId, RichText, Sense, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoints, Points};

use crate::color::HeatScale;
use crate::data::aggregate::{ChartKind, Count, CrossTab, Series};

const CHART_HEIGHT: f32 = 260.0;
const BAR_COLOR: Color32 = Color32::from_rgb(76, 120, 168);

// ---------------------------------------------------------------------------
// Series charts
// ---------------------------------------------------------------------------

/// Draw a summary series the way its chart spec asks for.
pub fn series_chart(ui: &mut Ui, series: &Series, colors: Option<&BTreeMap<String, Color32>>) {
    ui.strong(series.spec.title.as_str());
    match series.spec.kind {
        ChartKind::Line => line_chart(ui, series),
        ChartKind::Bar => bar_chart(ui, series, colors, false),
        ChartKind::HorizontalBar => bar_chart(ui, series, colors, true),
        ChartKind::Table => count_table(ui, series),
        ChartKind::Heatmap => {
            log::warn!("'{}' is a cross-tab, not a series", series.spec.title);
        }
    }
}

/// Tooltip for one point of a series.
fn point_hover(series: &Series, point: &Count) -> String {
    let count = point.count.to_string();
    series.spec.hover_text(&[point.label.as_str(), count.as_str()])
}

fn line_chart(ui: &mut Ui, series: &Series) {
    let points: Vec<[f64; 2]> = series
        .points
        .iter()
        .map(|p| [p.position, p.count as f64])
        .collect();
    let hover: Vec<(f64, String)> = series
        .points
        .iter()
        .map(|p| (p.position, point_hover(series, p)))
        .collect();

    Plot::new(&series.spec.title)
        .height(CHART_HEIGHT)
        .x_axis_label(series.spec.x_title.as_str())
        .y_axis_label(series.spec.y_title.as_str())
        .include_y(0.0)
        .allow_scroll(false)
        .allow_drag(false)
        .label_formatter(move |_name, value| {
            hover
                .iter()
                .find(|(x, _)| (x - value.x).abs() < 0.5)
                .map(|(_, text)| text.clone())
                .unwrap_or_default()
        })
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(PlotPoints::from(points.clone()))
                    .name(series.spec.y_title.as_str())
                    .color(BAR_COLOR)
                    .width(2.0),
            );
            plot_ui.points(Points::new(PlotPoints::from(points)).radius(3.0).color(BAR_COLOR));
        });
}

/// Axis labels: the fixed category order when the spec has one, else the
/// labels in data order.
fn axis_labels(series: &Series) -> Vec<String> {
    match &series.spec.category_order {
        Some(order) => order.clone(),
        None => series.points.iter().map(|p| p.label.clone()).collect(),
    }
}

fn category_formatter(labels: Vec<String>) -> impl Fn(GridMark, &std::ops::RangeInclusive<f64>) -> String + 'static {
    move |mark, _range| {
        let v = mark.value;
        if (v - v.round()).abs() > 1e-6 || v < 0.0 {
            return String::new();
        }
        labels.get(v.round() as usize).cloned().unwrap_or_default()
    }
}

fn bar_chart(ui: &mut Ui, series: &Series, colors: Option<&BTreeMap<String, Color32>>, horizontal: bool) {
    let bars: Vec<Bar> = series
        .points
        .iter()
        .map(|p| {
            let fill = colors
                .and_then(|c| c.get(&p.label))
                .copied()
                .unwrap_or(BAR_COLOR);
            Bar::new(p.position, p.count as f64)
                .name(point_hover(series, p))
                .fill(fill)
                .width(0.7)
        })
        .collect();

    let mut chart = BarChart::new(bars);
    if horizontal {
        chart = chart.horizontal();
    }

    let labels = axis_labels(series);
    let mut plot = Plot::new(&series.spec.title)
        .height(CHART_HEIGHT)
        .legend(Legend::default().text_style(egui::TextStyle::Small))
        .allow_scroll(false)
        .allow_drag(false)
        .show_grid([!horizontal, horizontal]);

    plot = if horizontal {
        plot.y_axis_formatter(category_formatter(labels))
            .x_axis_label(series.spec.y_title.as_str())
            .include_x(0.0)
    } else {
        plot.x_axis_formatter(category_formatter(labels))
            .x_axis_label(series.spec.x_title.as_str())
            .y_axis_label(series.spec.y_title.as_str())
            .include_y(0.0)
    };

    plot.show(ui, |plot_ui| plot_ui.bar_chart(chart));
}

fn count_table(ui: &mut Ui, series: &Series) {
    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .column(Column::auto().at_least(24.0))
        .column(Column::remainder().at_least(120.0))
        .column(Column::auto().at_least(48.0))
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("#");
            });
            header.col(|ui| {
                ui.strong(series.spec.x_title.as_str());
            });
            header.col(|ui| {
                ui.strong(series.spec.y_title.as_str());
            });
        })
        .body(|mut body| {
            for (rank, p) in series.points.iter().enumerate() {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label((rank + 1).to_string());
                    });
                    row.col(|ui| {
                        ui.label(p.label.as_str());
                    });
                    row.col(|ui| {
                        ui.label(p.count.to_string());
                    });
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Heatmap
// ---------------------------------------------------------------------------

/// Cross-tab as a grid of coloured cells: x categories across, causes down.
pub fn heatmap(ui: &mut Ui, tab: &CrossTab, scale: &HeatScale) {
    ui.strong(tab.spec.title.as_str());
    if tab.columns.is_empty() {
        ui.label("—");
        return;
    }

    let max = tab.max_count();
    let cell = egui::vec2(72.0, 28.0);
    let x_labels = tab.spec.category_order.as_ref().unwrap_or(&tab.rows);

    egui::Grid::new(&tab.spec.title)
        .spacing([2.0, 2.0])
        .show(ui, |ui: &mut Ui| {
            ui.label(RichText::new(&tab.spec.y_title).small());
            for label in x_labels {
                ui.label(RichText::new(label).strong());
            }
            ui.end_row();

            for (c, cause) in tab.columns.iter().enumerate() {
                ui.label(cause.as_str());
                for (r, row_label) in tab.rows.iter().enumerate() {
                    let count = tab.counts[r][c];
                    let (rect, response) = ui.allocate_exact_size(cell, Sense::hover());
                    ui.painter().rect_filled(rect, 2.0, scale.color_for(count, max));
                    ui.painter().text(
                        rect.center(),
                        Align2::CENTER_CENTER,
                        count.to_string(),
                        FontId::proportional(13.0),
                        scale.text_color_for(count, max),
                    );
                    let count_text = count.to_string();
                    response.on_hover_text(tab.spec.hover_text(&[
                        row_label.as_str(),
                        cause.as_str(),
                        count_text.as_str(),
                    ]));
                }
                ui.end_row();
            }
        });
    ui.label(RichText::new(&tab.spec.x_title).small());
}

// ---------------------------------------------------------------------------
// Map
// ---------------------------------------------------------------------------

/// Scatter of sampled accident coordinates (longitude across, latitude up).
pub fn accident_map(ui: &mut Ui, points: &[[f64; 2]]) {
    Plot::new("accident_map")
        .height(420.0)
        .data_aspect(1.0)
        .x_axis_label("經度")
        .y_axis_label("緯度")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(false)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            plot_ui.points(
                Points::new(PlotPoints::from(points.to_vec()))
                    .radius(1.5)
                    .color(Color32::from_rgba_unmultiplied(214, 39, 40, 160)),
            );
        });
}
