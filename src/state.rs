use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use eframe::egui::Color32;

use crate::color::generate_palette;
use crate::config::DashboardConfig;
use crate::data::aggregate::{build_views, DashboardViews, ViewLimits};
use crate::data::cache::SnapshotCache;
use crate::data::filter::{apply_filters, FilterState};
use crate::data::model::AccidentTable;
use crate::data::sample::sample_indices;
use crate::error::DashboardError;

// ---------------------------------------------------------------------------
// Tabs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Trends,
    Geography,
    Demographics,
    Causes,
    CrossTab,
}

impl Tab {
    pub const ALL: [Tab; 5] = [Tab::Trends, Tab::Geography, Tab::Demographics, Tab::Causes, Tab::CrossTab];

    pub fn label(self) -> &'static str {
        match self {
            Tab::Trends => "📊 事故趨勢",
            Tab::Geography => "🗺 地理分布",
            Tab::Demographics => "👥 人口統計",
            Tab::Causes => "🔍 肇事分析",
            Tab::CrossTab => "🔥 交叉分析",
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Snapshot currently shown.
    pub snapshot_path: PathBuf,

    cache: SnapshotCache,

    /// Cleaned accidents (None until a snapshot loaded successfully).
    pub table: Option<Arc<AccidentTable>>,

    /// Sidebar selection being edited.
    pub filters: FilterState,

    /// Selection the cached results below were computed from.
    applied_filters: Option<FilterState>,

    /// Indices of accidents passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Summaries for the tabs; None when nothing matches.
    pub views: Option<DashboardViews>,

    /// Sampled `[lon, lat]` points for the map.
    pub map_points: Vec<[f64; 2]>,

    /// One colour per city, stable for the loaded snapshot.
    pub city_colors: BTreeMap<String, Color32>,

    /// Load failure that ends the session.
    pub fatal: Option<DashboardError>,

    /// The current selection matches nothing.
    pub empty_result: bool,

    pub active_tab: Tab,

    /// Non-fatal status / error message shown in the top bar.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        let sample_size = config.default_sample_size;
        Self {
            snapshot_path: config.snapshot_path.clone(),
            config,
            cache: SnapshotCache::new(),
            table: None,
            filters: FilterState {
                cities: Default::default(),
                month_range: (1, 12),
                weather: Default::default(),
                period: Default::default(),
                sample_size,
            },
            applied_filters: None,
            visible_indices: Vec::new(),
            views: None,
            map_points: Vec::new(),
            city_colors: BTreeMap::new(),
            fatal: None,
            empty_result: false,
            active_tab: Tab::default(),
            status_message: None,
        }
    }

    /// Load (or fetch from cache) the snapshot at `snapshot_path`.
    pub fn load_snapshot(&mut self) {
        match self.cache.get_or_load(&self.snapshot_path, &self.config.pipeline) {
            Ok(table) => {
                log::info!("資料載入完成！共分析了 {} 筆機車事故。", table.len());
                self.fatal = None;
                self.set_table(table);
            }
            Err(e) => {
                log::error!("Failed to load snapshot: {e}");
                self.table = None;
                self.views = None;
                self.fatal = Some(e);
            }
        }
    }

    /// Switch to another snapshot file.
    pub fn open_snapshot(&mut self, path: PathBuf) {
        self.snapshot_path = path;
        self.load_snapshot();
    }

    /// Ingest a cleaned table; a new table resets the filters.
    pub fn set_table(&mut self, table: Arc<AccidentTable>) {
        let same = self
            .table
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, &table));
        if same {
            return;
        }

        self.filters = FilterState::initial(
            &table,
            &self.config.default_city,
            self.filters.sample_size,
        );
        self.city_colors = table
            .cities
            .iter()
            .cloned()
            .zip(generate_palette(table.cities.len()))
            .collect();
        self.table = Some(table);
        self.applied_filters = None;
        self.sync_filters();
    }

    /// Recompute whatever the last filter edit invalidated.
    pub fn sync_filters(&mut self) {
        let (unchanged, only_sample_size) = match &self.applied_filters {
            Some(applied) => (
                *applied == self.filters,
                applied.cities == self.filters.cities
                    && applied.month_range == self.filters.month_range
                    && applied.weather == self.filters.weather
                    && applied.period == self.filters.period,
            ),
            None => (false, false),
        };

        if unchanged {
            return;
        }
        if only_sample_size {
            self.resample();
        } else {
            self.refilter();
        }
        self.applied_filters = Some(self.filters.clone());
    }

    /// Recompute `visible_indices`, the views and the map sample.
    fn refilter(&mut self) {
        let Some(table) = self.table.clone() else {
            return;
        };

        match apply_filters(&table, &self.filters) {
            Ok(indices) => {
                let limits = ViewLimits {
                    locations: self.config.location_top_n,
                    categories: self.config.category_top_n,
                };
                self.views = Some(build_views(
                    &table,
                    &indices,
                    limits,
                    self.filters.cities.len() > 1,
                ));
                self.visible_indices = indices;
                self.empty_result = false;
                self.resample();
            }
            Err(e) if e.is_fatal() => {
                log::error!("{e}");
                self.visible_indices.clear();
                self.views = None;
                self.map_points.clear();
                self.fatal = Some(e);
            }
            Err(e) => {
                log::warn!("{e}");
                self.visible_indices.clear();
                self.views = None;
                self.map_points.clear();
                self.empty_result = true;
            }
        }
    }

    /// Redraw the map sample from the visible rows.
    fn resample(&mut self) {
        let Some(table) = &self.table else {
            return;
        };
        let picked = sample_indices(
            &self.visible_indices,
            self.filters.sample_size,
            &mut rand::rng(),
        );
        self.map_points = picked
            .into_iter()
            .map(|i| {
                let a = &table.accidents[i];
                [a.lon, a.lat]
            })
            .collect();
    }

    /// Select every city, or only the first one if all are selected.
    pub fn toggle_all_cities(&mut self) {
        if let Some(table) = &self.table {
            if self.filters.cities.len() == table.cities.len() {
                self.filters.cities = table.cities.iter().take(1).cloned().collect();
            } else {
                self.filters.cities = table.cities.clone();
            }
        }
    }

    /// Select every weather value, or none if all are selected.
    pub fn toggle_all_weather(&mut self) {
        if let Some(table) = &self.table {
            if self.filters.weather.len() == table.weathers.len() {
                self.filters.weather.clear();
            } else {
                self.filters.weather = table.weathers.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::data::filter::PeriodFilter;
    use crate::data::model::RawColumn;

    const ROWS: &str = "
機車,2024-03-15,1430,30,,晴,單路部分,男,臺北市政府警察局,中山路,無號誌,戴安全帽,側撞,車與車,25.03,121.54
機車,2024-03-16,0830,45,超速,雨,交岔路,女,臺北市政府警察局,民生路,行車管制號誌,未戴,追撞,車與車,25.05,121.52
機車,2024-07-01,2210,19,酒駕,晴,單路部分,男,新北市政府警察局,板橋路,無號誌,戴安全帽,自撞,車輛本身,25.01,121.46
小客車,2024-07-01,2210,19,酒駕,晴,單路部分,男,新北市政府警察局,板橋路,無號誌,,自撞,車輛本身,25.01,121.46
";

    fn write_snapshot(path: &Path) {
        std::fs::write(path, format!("{}{ROWS}", RawColumn::csv_header())).unwrap();
    }

    fn state_for(path: &Path) -> AppState {
        let config = DashboardConfig {
            snapshot_path: path.to_path_buf(),
            ..DashboardConfig::default()
        };
        let mut state = AppState::new(config);
        state.load_snapshot();
        state
    }

    #[test]
    fn missing_snapshot_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(&dir.path().join("all_accidents_data.parquet"));
        assert!(matches!(state.fatal, Some(DashboardError::MissingArtifact { .. })));
        assert!(state.views.is_none());
    }

    #[test]
    fn loading_selects_default_city_and_builds_views() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.csv");
        write_snapshot(&path);

        let state = state_for(&path);
        assert!(state.fatal.is_none());
        assert_eq!(state.table.as_ref().unwrap().len(), 3);
        assert_eq!(state.visible_indices, vec![0, 1]);
        assert_eq!(state.views.as_ref().unwrap().total, 2);
        assert_eq!(state.map_points.len(), 2);
        assert_eq!(state.city_colors.len(), 2);
    }

    #[test]
    fn empty_selection_sets_warning_and_clears_views() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.csv");
        write_snapshot(&path);

        let mut state = state_for(&path);
        state.filters.period = PeriodFilter::Weekend;
        state.filters.set_month_range(7, 12);
        state.sync_filters();
        assert!(state.empty_result);
        assert!(state.views.is_none());
        assert!(state.map_points.is_empty());

        state.toggle_all_cities();
        state.sync_filters();
        assert!(state.empty_result);

        state.filters.period = PeriodFilter::Any;
        state.sync_filters();
        assert!(!state.empty_result);
        assert_eq!(state.visible_indices, vec![2]);
    }

    #[test]
    fn reloading_unchanged_snapshot_keeps_selection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.csv");
        write_snapshot(&path);

        let mut state = state_for(&path);
        state.toggle_all_weather();
        state.sync_filters();
        assert!(state.empty_result);

        state.load_snapshot();
        assert!(state.filters.weather.is_empty());
        assert!(state.empty_result);
    }
}
