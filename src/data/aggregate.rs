//! Per-view summaries of the filtered accidents, each paired with a
//! declarative chart description for the rendering layer.

use std::collections::{BTreeMap, HashMap};

use super::model::{weekday_label, Accident, AccidentTable, AgeBand, WEEKDAY_LABELS};

// ---------------------------------------------------------------------------
// Chart descriptions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Line,
    Bar,
    HorizontalBar,
    Heatmap,
    Table,
}

/// How a summary should be drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub kind: ChartKind,
    pub x_title: String,
    pub y_title: String,
    /// Fixed category order for the x axis. `None` keeps the data order.
    pub category_order: Option<Vec<String>>,
    /// Fields shown when hovering a mark.
    pub tooltip: Vec<String>,
}

impl ChartSpec {
    fn new(title: &str, kind: ChartKind, x_title: &str, y_title: &str) -> Self {
        ChartSpec {
            title: title.to_string(),
            kind,
            x_title: x_title.to_string(),
            y_title: y_title.to_string(),
            category_order: None,
            tooltip: vec![x_title.to_string(), y_title.to_string()],
        }
    }

    fn ordered(mut self, order: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.category_order = Some(order.into_iter().map(Into::into).collect());
        self
    }

    fn tooltip(mut self, fields: &[&str]) -> Self {
        self.tooltip = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Hover text pairing each tooltip field with the value in the same slot.
    pub fn hover_text(&self, values: &[&str]) -> String {
        self.tooltip
            .iter()
            .zip(values)
            .map(|(field, value)| format!("{field}: {value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ---------------------------------------------------------------------------
// Summary tables
// ---------------------------------------------------------------------------

/// One bar / line vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Count {
    pub label: String,
    /// Position on the category axis, or the numeric key for line charts.
    pub position: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub spec: ChartSpec,
    pub points: Vec<Count>,
}

/// Two-dimensional count table driving a heatmap.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossTab {
    pub spec: ChartSpec,
    /// X-axis categories, in display order.
    pub rows: Vec<String>,
    /// Y-axis categories (causes), most frequent first.
    pub columns: Vec<String>,
    /// `counts[row][column]`.
    pub counts: Vec<Vec<usize>>,
}

impl CrossTab {
    pub fn max_count(&self) -> usize {
        self.counts.iter().flatten().copied().max().unwrap_or(0)
    }
}

/// Everything the tabs draw for one filter selection.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardViews {
    pub total: usize,
    pub monthly: Series,
    pub weekday: Series,
    pub hourly: Series,
    /// Only built when more than one city is selected.
    pub city: Option<Series>,
    pub locations: Series,
    pub age_bands: Series,
    pub gender: Series,
    pub helmet: Series,
    pub accident_major: Series,
    pub accident_minor: Series,
    pub signal: Series,
    pub weather: Series,
    pub age_by_cause: CrossTab,
    pub weekday_by_cause: CrossTab,
}

/// Sizes of the top-N views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewLimits {
    pub locations: usize,
    pub categories: usize,
}

impl Default for ViewLimits {
    fn default() -> Self {
        Self {
            locations: 10,
            categories: 5,
        }
    }
}

// ---------------------------------------------------------------------------
// Counting helpers
// ---------------------------------------------------------------------------

/// Most frequent values, count descending then label ascending.
pub fn top_n<'a>(values: impl Iterator<Item = &'a str>, n: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for v in values {
        *counts.entry(v).or_default() += 1;
    }
    let mut ranked: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(label, count)| (label.to_string(), count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(n);
    ranked
}

fn counts_by<K: Ord>(rows: &[&Accident], key: impl Fn(&Accident) -> K) -> BTreeMap<K, usize> {
    let mut counts = BTreeMap::new();
    for a in rows {
        *counts.entry(key(*a)).or_default() += 1;
    }
    counts
}

fn ranked_series(spec: ChartSpec, ranked: Vec<(String, usize)>) -> Series {
    let points = ranked
        .into_iter()
        .enumerate()
        .map(|(i, (label, count))| Count {
            label,
            position: i as f64,
            count,
        })
        .collect();
    Series { spec, points }
}

fn helmet_like(helmet: &str) -> bool {
    helmet.contains('帽') || helmet == "未戴"
}

// ---------------------------------------------------------------------------
// View builders
// ---------------------------------------------------------------------------

/// Build every view for the rows at `indices`.
pub fn build_views(table: &AccidentTable, indices: &[usize], limits: ViewLimits, multiple_cities: bool) -> DashboardViews {
    let rows: Vec<&Accident> = indices.iter().map(|&i| &table.accidents[i]).collect();
    let top_causes: Vec<String> = top_n(rows.iter().map(|a| a.cause.as_str()), limits.categories)
        .into_iter()
        .map(|(cause, _)| cause)
        .collect();

    DashboardViews {
        total: rows.len(),
        monthly: monthly_counts(&rows),
        weekday: weekday_counts(&rows),
        hourly: hourly_counts(&rows),
        city: multiple_cities.then(|| city_counts(&rows)),
        locations: ranked_series(
            ChartSpec::new("最常發生事故路段", ChartKind::Table, "發生地點", "件數"),
            top_n(rows.iter().map(|a| a.location.as_str()), limits.locations),
        ),
        age_bands: age_band_counts(&rows),
        gender: gender_counts(&rows),
        helmet: ranked_series(
            ChartSpec::new("保護裝備 (安全帽) 分析", ChartKind::HorizontalBar, "安全帽", "件數"),
            top_n(
                rows.iter().map(|a| a.helmet.as_str()).filter(|h| helmet_like(h)),
                limits.categories,
            ),
        ),
        accident_major: ranked_series(
            ChartSpec::new("事故碰撞對象 (大類別)", ChartKind::HorizontalBar, "事故型態(大類別)", "件數"),
            top_n(rows.iter().map(|a| a.accident_type_major.as_str()), limits.categories),
        ),
        accident_minor: ranked_series(
            ChartSpec::new("事故型態 (怎麼撞的？)", ChartKind::HorizontalBar, "事故型態(子類別)", "件數"),
            top_n(rows.iter().map(|a| a.accident_type_minor.as_str()), limits.categories),
        ),
        signal: ranked_series(
            ChartSpec::new("號誌種類分析", ChartKind::HorizontalBar, "號誌種類", "件數"),
            top_n(rows.iter().map(|a| a.signal_type.as_str()), limits.categories),
        ),
        weather: ranked_series(
            ChartSpec::new("天候狀況分析", ChartKind::HorizontalBar, "天候", "件數"),
            top_n(rows.iter().map(|a| a.weather.as_str()), limits.categories),
        ),
        age_by_cause: age_by_cause(&rows, &top_causes),
        weekday_by_cause: weekday_by_cause(&rows, &top_causes),
    }
}

fn monthly_counts(rows: &[&Accident]) -> Series {
    let points = counts_by(rows, |a| a.month)
        .into_iter()
        .map(|(month, count)| Count {
            label: month.to_string(),
            position: month as f64,
            count,
        })
        .collect();
    Series {
        spec: ChartSpec::new("每月事故統計", ChartKind::Line, "發生月份", "件數"),
        points,
    }
}

fn hourly_counts(rows: &[&Accident]) -> Series {
    let points = counts_by(rows, |a| a.hour)
        .into_iter()
        .map(|(hour, count)| Count {
            label: hour.to_string(),
            position: hour as f64,
            count,
        })
        .collect();
    Series {
        spec: ChartSpec::new("事故發生時段分析 (0-23點)", ChartKind::Line, "發生小時", "件數"),
        points,
    }
}

fn weekday_counts(rows: &[&Accident]) -> Series {
    let points = counts_by(rows, |a| a.weekday)
        .into_iter()
        .map(|(weekday, count)| Count {
            label: weekday_label(weekday).to_string(),
            position: weekday.saturating_sub(1) as f64,
            count,
        })
        .collect();
    Series {
        spec: ChartSpec::new("每週事故分布", ChartKind::Bar, "星期", "件數")
            .ordered(WEEKDAY_LABELS)
            .tooltip(&["星期標籤", "件數"]),
        points,
    }
}

fn city_counts(rows: &[&Accident]) -> Series {
    ranked_series(
        ChartSpec::new("各縣市事故件數", ChartKind::Bar, "縣市", "件數"),
        top_n(rows.iter().map(|a| a.city.as_str()), usize::MAX),
    )
}

fn age_band_counts(rows: &[&Accident]) -> Series {
    let points = counts_by(rows, |a| a.age_band)
        .into_iter()
        .map(|(band, count)| Count {
            label: band.label().to_string(),
            position: band as usize as f64,
            count,
        })
        .collect();
    Series {
        spec: ChartSpec::new("年齡層分布", ChartKind::Bar, "年齡層", "件數")
            .ordered(AgeBand::ALL.iter().map(|b| b.label())),
        points,
    }
}

fn gender_counts(rows: &[&Accident]) -> Series {
    let points = counts_by(rows, |a| a.gender.clone())
        .into_iter()
        .enumerate()
        .map(|(i, (gender, count))| Count {
            label: gender,
            position: i as f64,
            count,
        })
        .collect();
    Series {
        spec: ChartSpec::new("性別分布", ChartKind::Bar, "性別", "件數"),
        points,
    }
}

fn cross_tab<K: Copy>(
    rows: &[&Accident],
    causes: &[String],
    categories: &[K],
    key: impl Fn(&Accident) -> K,
    same: impl Fn(K, K) -> bool,
) -> Vec<Vec<usize>> {
    let mut counts = vec![vec![0; causes.len()]; categories.len()];
    for a in rows {
        let Some(col) = causes.iter().position(|c| *c == a.cause) else {
            continue;
        };
        if let Some(row) = categories.iter().position(|k| same(*k, key(*a))) {
            counts[row][col] += 1;
        }
    }
    counts
}

fn age_by_cause(rows: &[&Accident], causes: &[String]) -> CrossTab {
    let labels: Vec<String> = AgeBand::ALL.iter().map(|b| b.label().to_string()).collect();
    CrossTab {
        spec: ChartSpec::new("肇事原因 vs 年齡層 (熱力圖)", ChartKind::Heatmap, "年齡層", "肇事原因")
            .ordered(labels.clone())
            .tooltip(&["年齡層", "肇因", "件數"]),
        counts: cross_tab(rows, causes, &AgeBand::ALL, |a| a.age_band, |x, y| x == y),
        rows: labels,
        columns: causes.to_vec(),
    }
}

fn weekday_by_cause(rows: &[&Accident], causes: &[String]) -> CrossTab {
    let days: Vec<u32> = (1..=7).collect();
    CrossTab {
        spec: ChartSpec::new("肇事原因 vs 星期 (熱力圖)", ChartKind::Heatmap, "星期", "肇事原因")
            .ordered(WEEKDAY_LABELS)
            .tooltip(&["發生星期", "肇因", "件數"]),
        counts: cross_tab(rows, causes, &days, |a| a.weekday, |x, y| x == y),
        rows: WEEKDAY_LABELS.iter().map(|d| d.to_string()).collect(),
        columns: causes.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::tests::accident;

    fn table() -> AccidentTable {
        let mut rows = Vec::new();
        // Wednesday accidents in March, caused by speeding.
        for _ in 0..3 {
            let mut a = accident("臺北市政府警察局", 3, 3, "晴");
            a.cause = "超速".into();
            a.hour = 18;
            rows.push(a);
        }
        // Sunday accidents in July, older riders, no helmet.
        for _ in 0..2 {
            let mut a = accident("新北市政府警察局", 7, 7, "雨");
            a.age = 70.0;
            a.age_band = AgeBand::Over64;
            a.helmet = "未戴".into();
            a.location = "中正路".into();
            rows.push(a);
        }
        let mut odd = accident("新北市政府警察局", 1, 1, "陰");
        odd.helmet = "其他".into();
        odd.cause = "酒駕".into();
        rows.push(odd);
        AccidentTable::from_accidents(rows)
    }

    fn all(table: &AccidentTable) -> Vec<usize> {
        (0..table.len()).collect()
    }

    #[test]
    fn top_n_orders_by_count_then_label() {
        let values = ["b", "a", "c", "b", "a", "d"];
        let top = top_n(values.iter().copied(), 3);
        assert_eq!(
            top,
            vec![("a".to_string(), 2), ("b".to_string(), 2), ("c".to_string(), 1)]
        );
    }

    #[test]
    fn time_series_are_keyed_numerically() {
        let table = table();
        let views = build_views(&table, &all(&table), ViewLimits::default(), false);
        let months: Vec<(f64, usize)> = views.monthly.points.iter().map(|p| (p.position, p.count)).collect();
        assert_eq!(months, vec![(1.0, 1), (3.0, 3), (7.0, 2)]);
        assert_eq!(views.hourly.points.len(), 2);
        assert_eq!(views.total, 6);
        assert!(views.city.is_none());
    }

    #[test]
    fn weekday_view_keeps_monday_first_order() {
        let table = table();
        let views = build_views(&table, &all(&table), ViewLimits::default(), true);
        let labels: Vec<&str> = views.weekday.points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["一", "三", "日"]);
        assert_eq!(
            views.weekday.spec.category_order.as_deref(),
            Some(&WEEKDAY_LABELS.map(String::from)[..])
        );
        assert_eq!(views.weekday.points[2].position, 6.0);
    }

    #[test]
    fn hover_text_follows_tooltip_fields() {
        let table = table();
        let views = build_views(&table, &all(&table), ViewLimits::default(), false);
        assert_eq!(views.weekday.spec.hover_text(&["三", "3"]), "星期標籤: 三\n件數: 3");
        assert_eq!(views.monthly.spec.hover_text(&["3", "3"]), "發生月份: 3\n件數: 3");
        assert_eq!(
            views.age_by_cause.spec.hover_text(&["65+歲", "超速", "0"]),
            "年齡層: 65+歲\n肇因: 超速\n件數: 0"
        );
    }

    #[test]
    fn out_of_range_weekday_does_not_panic() {
        let table = AccidentTable::from_accidents(vec![accident("臺北市政府警察局", 3, 0, "晴")]);
        let views = build_views(&table, &all(&table), ViewLimits::default(), false);
        assert_eq!(views.weekday.points[0].label, "?");
        assert_eq!(views.weekday.points[0].position, 0.0);
    }

    #[test]
    fn age_bands_use_fixed_order() {
        let table = table();
        let views = build_views(&table, &all(&table), ViewLimits::default(), false);
        let order = views.age_bands.spec.category_order.clone().unwrap();
        assert_eq!(order.first().map(String::as_str), Some("0-17歲"));
        assert_eq!(order.last().map(String::as_str), Some("65+歲"));
        let labels: Vec<&str> = views.age_bands.points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["25-34歲", "65+歲"]);
    }

    #[test]
    fn city_and_helmet_views() {
        let table = table();
        let views = build_views(&table, &all(&table), ViewLimits::default(), true);
        let city = views.city.unwrap();
        // 3 each; ties break on the label.
        assert_eq!(city.points[0].label, "新北市政府警察局");
        assert_eq!(city.points[1].label, "臺北市政府警察局");
        assert_eq!(city.points[1].count, 3);

        let helmets: Vec<(&str, usize)> = views.helmet.points.iter().map(|p| (p.label.as_str(), p.count)).collect();
        assert_eq!(helmets, vec![("戴安全帽", 3), ("未戴", 2)]);
        assert_eq!(views.locations.points[0].label, "中山路");
    }

    #[test]
    fn cross_tabs_cover_every_cell() {
        let table = table();
        let limits = ViewLimits { locations: 10, categories: 2 };
        let views = build_views(&table, &all(&table), limits, false);

        let age = &views.age_by_cause;
        assert_eq!(age.columns, vec!["超速".to_string(), "未注意車前狀態".to_string()]);
        assert_eq!(age.rows.len(), 7);
        assert!(age.counts.iter().all(|row| row.len() == 2));
        // The drunk 25-34 rider's cause is third-ranked and left out.
        assert_eq!(age.counts[2], vec![3, 0]);
        assert_eq!(age.counts[6], vec![0, 2]);
        assert_eq!(age.max_count(), 3);

        let weekday = &views.weekday_by_cause;
        assert_eq!(weekday.rows.len(), 7);
        assert_eq!(weekday.counts[2], vec![3, 0]);
        assert_eq!(weekday.counts[6], vec![0, 2]);
        assert_eq!(weekday.counts[0], vec![0, 0]);
    }
}
