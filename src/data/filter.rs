use std::collections::BTreeSet;

use super::model::{AccidentTable, Period};
use crate::config::clamp_sample_size;
use crate::error::{DashboardError, Result};

// ---------------------------------------------------------------------------
// Filter state
// ---------------------------------------------------------------------------

/// Weekday/weekend selector; `Any` disables the constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeriodFilter {
    #[default]
    Any,
    Weekday,
    Weekend,
}

impl PeriodFilter {
    pub const ALL: [PeriodFilter; 3] = [PeriodFilter::Any, PeriodFilter::Weekday, PeriodFilter::Weekend];

    pub fn label(self) -> &'static str {
        match self {
            PeriodFilter::Any => "全部",
            PeriodFilter::Weekday => Period::Weekday.label(),
            PeriodFilter::Weekend => Period::Weekend.label(),
        }
    }

    pub fn matches(self, period: Period) -> bool {
        match self {
            PeriodFilter::Any => true,
            PeriodFilter::Weekday => period == Period::Weekday,
            PeriodFilter::Weekend => period == Period::Weekend,
        }
    }
}

/// Everything the sidebar lets the user choose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub cities: BTreeSet<String>,
    /// Inclusive month bounds, `lo <= hi`, both in 1..=12.
    pub month_range: (u32, u32),
    pub weather: BTreeSet<String>,
    pub period: PeriodFilter,
    /// Maximum number of points drawn on the map.
    pub sample_size: usize,
}

impl FilterState {
    /// Opening selection: the preferred city (or the first one), every
    /// month, every weather value, both periods.
    pub fn initial(table: &AccidentTable, preferred_city: &str, sample_size: usize) -> Self {
        let city = if table.cities.contains(preferred_city) {
            Some(preferred_city.to_string())
        } else {
            table.cities.iter().next().cloned()
        };
        FilterState {
            cities: city.into_iter().collect(),
            month_range: (1, 12),
            weather: table.weathers.clone(),
            period: PeriodFilter::Any,
            sample_size: clamp_sample_size(sample_size),
        }
    }

    /// Set the month bounds, keeping them ordered and in range.
    pub fn set_month_range(&mut self, lo: u32, hi: u32) {
        let lo = lo.clamp(1, 12);
        let hi = hi.clamp(1, 12);
        self.month_range = (lo.min(hi), lo.max(hi));
    }

    /// Toggle one value in a multi-select set.
    pub fn toggle(set: &mut BTreeSet<String>, value: &str) {
        if !set.remove(value) {
            set.insert(value.to_string());
        }
    }
}

// ---------------------------------------------------------------------------
// Applying the filter
// ---------------------------------------------------------------------------

/// Return indices of accidents that pass all filters.
///
/// An accident passes when its city and weather are selected, its month
/// lies in the range and its period matches. No matches at all is
/// [`DashboardError::EmptyFilterResult`].
pub fn apply_filters(table: &AccidentTable, filters: &FilterState) -> Result<Vec<usize>> {
    let (lo, hi) = filters.month_range;
    let indices: Vec<usize> = table
        .accidents
        .iter()
        .enumerate()
        .filter(|(_, a)| {
            filters.cities.contains(&a.city)
                && (lo..=hi).contains(&a.month)
                && filters.weather.contains(&a.weather)
                && filters.period.matches(a.period)
        })
        .map(|(i, _)| i)
        .collect();

    log::debug!("Filter kept {} of {} accidents", indices.len(), table.len());

    if indices.is_empty() {
        return Err(DashboardError::EmptyFilterResult);
    }
    Ok(indices)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::model::{Accident, AgeBand};

    pub(crate) fn accident(city: &str, month: u32, weekday: u32, weather: &str) -> Accident {
        Accident {
            hour: 8,
            month,
            weekday,
            period: Period::from_weekday(weekday),
            age: 30.0,
            age_band: AgeBand::From25To34,
            cause: "未注意車前狀態".into(),
            weather: weather.into(),
            road_type: "單路部分".into(),
            gender: "男".into(),
            city: city.into(),
            location: "中山路".into(),
            signal_type: "無號誌".into(),
            helmet: "戴安全帽".into(),
            accident_type_major: "車與車".into(),
            accident_type_minor: "側撞".into(),
            lat: 25.0,
            lon: 121.5,
        }
    }

    fn table() -> AccidentTable {
        AccidentTable::from_accidents(vec![
            accident("臺北市政府警察局", 1, 1, "晴"),
            accident("臺北市政府警察局", 6, 6, "雨"),
            accident("新北市政府警察局", 3, 3, "晴"),
            accident("高雄市政府警察局", 12, 7, "陰"),
        ])
    }

    fn everything(table: &AccidentTable) -> FilterState {
        FilterState {
            cities: table.cities.clone(),
            month_range: (1, 12),
            weather: table.weathers.clone(),
            period: PeriodFilter::Any,
            sample_size: 5000,
        }
    }

    #[test]
    fn full_selection_reproduces_table() {
        let table = table();
        let indices = apply_filters(&table, &everything(&table)).unwrap();
        assert_eq!(indices, (0..table.len()).collect::<Vec<_>>());
    }

    #[test]
    fn each_constraint_narrows() {
        let table = table();

        let mut f = everything(&table);
        f.cities = ["臺北市政府警察局".to_string()].into();
        assert_eq!(apply_filters(&table, &f).unwrap(), vec![0, 1]);

        let mut f = everything(&table);
        f.set_month_range(2, 6);
        assert_eq!(apply_filters(&table, &f).unwrap(), vec![1, 2]);

        let mut f = everything(&table);
        f.weather = ["晴".to_string()].into();
        assert_eq!(apply_filters(&table, &f).unwrap(), vec![0, 2]);

        let mut f = everything(&table);
        f.period = PeriodFilter::Weekend;
        assert_eq!(apply_filters(&table, &f).unwrap(), vec![1, 3]);
        f.period = PeriodFilter::Weekday;
        assert_eq!(apply_filters(&table, &f).unwrap(), vec![0, 2]);
    }

    #[test]
    fn no_match_is_empty_filter_result() {
        let table = table();
        let mut f = everything(&table);
        f.cities.clear();
        let err = apply_filters(&table, &f).unwrap_err();
        assert!(matches!(err, DashboardError::EmptyFilterResult));
        assert!(!err.is_fatal());
    }

    #[test]
    fn initial_state_prefers_configured_city() {
        let table = table();
        let f = FilterState::initial(&table, "臺北市政府警察局", 5000);
        assert_eq!(f.cities.len(), 1);
        assert!(f.cities.contains("臺北市政府警察局"));
        assert_eq!(f.weather, table.weathers);
        assert_eq!(f.month_range, (1, 12));

        let f = FilterState::initial(&table, "不存在", 42);
        assert_eq!(f.cities.iter().next(), table.cities.iter().next());
        assert_eq!(f.sample_size, 1000);
    }

    #[test]
    fn month_range_stays_ordered() {
        let mut f = everything(&table());
        f.set_month_range(9, 4);
        assert_eq!(f.month_range, (4, 9));
        f.set_month_range(0, 13);
        assert_eq!(f.month_range, (1, 12));
    }

    #[test]
    fn toggle_adds_and_removes() {
        let mut set = BTreeSet::new();
        FilterState::toggle(&mut set, "晴");
        assert!(set.contains("晴"));
        FilterState::toggle(&mut set, "晴");
        assert!(set.is_empty());
    }
}
