use std::collections::BTreeSet;
use std::fmt;

// ---------------------------------------------------------------------------
// Cell – a single loosely-typed value as read from the snapshot
// ---------------------------------------------------------------------------

/// A dynamically-typed cell as read from any snapshot format.
///
/// Cells only live at the file boundary: the loader packs them into a
/// [`RawRecord`] and the pipeline turns that into a typed [`Accident`].
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl Cell {
    /// Numeric interpretation, like `pd.to_numeric(errors="coerce")`.
    /// NaN and unparseable text yield `None`.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            Cell::Integer(i) => *i as f64,
            Cell::Float(f) => *f,
            Cell::Text(s) => s.trim().parse::<f64>().ok()?,
            Cell::Bool(_) | Cell::Null => return None,
        };
        if v.is_nan() {
            None
        } else {
            Some(v)
        }
    }

    /// Textual interpretation. Null, NaN and blank text count as missing.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Float(f) if f.is_nan() => None,
            Cell::Text(s) if s.trim().is_empty() => None,
            Cell::Text(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => write!(f, "{s}"),
            Cell::Integer(i) => write!(f, "{i}"),
            Cell::Float(v) => write!(f, "{v}"),
            Cell::Bool(b) => write!(f, "{b}"),
            Cell::Null => write!(f, "<null>"),
        }
    }
}

// ---------------------------------------------------------------------------
// RawColumn – the fixed snapshot schema
// ---------------------------------------------------------------------------

/// Columns the snapshot must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RawColumn {
    VehicleCategory,
    Date,
    Time,
    Age,
    Cause,
    Weather,
    RoadType,
    Gender,
    City,
    Location,
    SignalType,
    ProtectiveEquipment,
    AccidentTypeMinor,
    AccidentTypeMajor,
    Latitude,
    Longitude,
}

impl RawColumn {
    pub const ALL: [RawColumn; 16] = [
        RawColumn::VehicleCategory,
        RawColumn::Date,
        RawColumn::Time,
        RawColumn::Age,
        RawColumn::Cause,
        RawColumn::Weather,
        RawColumn::RoadType,
        RawColumn::Gender,
        RawColumn::City,
        RawColumn::Location,
        RawColumn::SignalType,
        RawColumn::ProtectiveEquipment,
        RawColumn::AccidentTypeMinor,
        RawColumn::AccidentTypeMajor,
        RawColumn::Latitude,
        RawColumn::Longitude,
    ];

    /// Header row with every column, as a CSV snapshot would start.
    #[cfg(test)]
    pub(crate) fn csv_header() -> String {
        RawColumn::ALL.map(RawColumn::name).join(",")
    }

    /// Column name as written by the conversion step.
    pub fn name(self) -> &'static str {
        match self {
            RawColumn::VehicleCategory => "當事者區分-類別-大類別名稱-車種",
            RawColumn::Date => "發生日期",
            RawColumn::Time => "發生時間",
            RawColumn::Age => "當事者事故發生時年齡",
            RawColumn::Cause => "肇因研判子類別名稱-主要",
            RawColumn::Weather => "天候名稱",
            RawColumn::RoadType => "道路型態大類別名稱",
            RawColumn::Gender => "當事者屬-性-別名稱",
            RawColumn::City => "處理單位名稱警局層",
            RawColumn::Location => "發生地點",
            RawColumn::SignalType => "號誌-號誌種類名稱",
            RawColumn::ProtectiveEquipment => "保護裝備名稱",
            RawColumn::AccidentTypeMinor => "事故類型及型態子類別名稱",
            RawColumn::AccidentTypeMajor => "事故類型及型態大類別名稱",
            RawColumn::Latitude => "緯度",
            RawColumn::Longitude => "經度",
        }
    }
}

// ---------------------------------------------------------------------------
// RawRecord / RawTable – loader output
// ---------------------------------------------------------------------------

/// One row of the snapshot (one involved party), fields named per column.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub vehicle_category: Cell,
    pub date: Cell,
    pub time: Cell,
    pub age: Cell,
    pub cause: Cell,
    pub weather: Cell,
    pub road_type: Cell,
    pub gender: Cell,
    pub city: Cell,
    pub location: Cell,
    pub signal_type: Cell,
    pub protective_equipment: Cell,
    pub accident_type_minor: Cell,
    pub accident_type_major: Cell,
    pub latitude: Cell,
    pub longitude: Cell,
}

impl RawRecord {
    /// Build a record by asking `cell_for` for every column.
    pub fn from_cells(mut cell_for: impl FnMut(RawColumn) -> Cell) -> Self {
        RawRecord {
            vehicle_category: cell_for(RawColumn::VehicleCategory),
            date: cell_for(RawColumn::Date),
            time: cell_for(RawColumn::Time),
            age: cell_for(RawColumn::Age),
            cause: cell_for(RawColumn::Cause),
            weather: cell_for(RawColumn::Weather),
            road_type: cell_for(RawColumn::RoadType),
            gender: cell_for(RawColumn::Gender),
            city: cell_for(RawColumn::City),
            location: cell_for(RawColumn::Location),
            signal_type: cell_for(RawColumn::SignalType),
            protective_equipment: cell_for(RawColumn::ProtectiveEquipment),
            accident_type_minor: cell_for(RawColumn::AccidentTypeMinor),
            accident_type_major: cell_for(RawColumn::AccidentTypeMajor),
            latitude: cell_for(RawColumn::Latitude),
            longitude: cell_for(RawColumn::Longitude),
        }
    }

    pub fn cell(&self, column: RawColumn) -> &Cell {
        match column {
            RawColumn::VehicleCategory => &self.vehicle_category,
            RawColumn::Date => &self.date,
            RawColumn::Time => &self.time,
            RawColumn::Age => &self.age,
            RawColumn::Cause => &self.cause,
            RawColumn::Weather => &self.weather,
            RawColumn::RoadType => &self.road_type,
            RawColumn::Gender => &self.gender,
            RawColumn::City => &self.city,
            RawColumn::Location => &self.location,
            RawColumn::SignalType => &self.signal_type,
            RawColumn::ProtectiveEquipment => &self.protective_equipment,
            RawColumn::AccidentTypeMinor => &self.accident_type_minor,
            RawColumn::AccidentTypeMajor => &self.accident_type_major,
            RawColumn::Latitude => &self.latitude,
            RawColumn::Longitude => &self.longitude,
        }
    }
}

/// The snapshot as loaded, before any derivation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub records: Vec<RawRecord>,
}

impl RawTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Derived categories
// ---------------------------------------------------------------------------

/// Weekday labels, Monday first. Index with `weekday - 1`.
pub const WEEKDAY_LABELS: [&str; 7] = ["一", "二", "三", "四", "五", "六", "日"];

/// Label for an ISO weekday number (1 = Monday).
pub fn weekday_label(weekday: u32) -> &'static str {
    WEEKDAY_LABELS
        .get(weekday.wrapping_sub(1) as usize)
        .copied()
        .unwrap_or("?")
}

/// Weekday/weekend classification of an accident date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Period {
    Weekday,
    Weekend,
}

impl Period {
    /// Weekend iff Saturday or Sunday.
    pub fn from_weekday(weekday: u32) -> Self {
        if weekday >= 6 {
            Period::Weekend
        } else {
            Period::Weekday
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Period::Weekday => "平日 (一至五)",
            Period::Weekend => "週末 (六/日)",
        }
    }
}

/// Seven fixed, right-inclusive age ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgeBand {
    Under18,
    From18To24,
    From25To34,
    From35To44,
    From45To54,
    From55To64,
    Over64,
}

impl AgeBand {
    /// Display order; never sort these alphabetically.
    pub const ALL: [AgeBand; 7] = [
        AgeBand::Under18,
        AgeBand::From18To24,
        AgeBand::From25To34,
        AgeBand::From35To44,
        AgeBand::From45To54,
        AgeBand::From55To64,
        AgeBand::Over64,
    ];

    /// Band containing `age`, or `None` outside [0, 99].
    pub fn from_age(age: f64) -> Option<Self> {
        if !(0.0..=99.0).contains(&age) {
            return None;
        }
        let band = if age <= 17.0 {
            AgeBand::Under18
        } else if age <= 24.0 {
            AgeBand::From18To24
        } else if age <= 34.0 {
            AgeBand::From25To34
        } else if age <= 44.0 {
            AgeBand::From35To44
        } else if age <= 54.0 {
            AgeBand::From45To54
        } else if age <= 64.0 {
            AgeBand::From55To64
        } else {
            AgeBand::Over64
        };
        Some(band)
    }

    pub fn label(self) -> &'static str {
        match self {
            AgeBand::Under18 => "0-17歲",
            AgeBand::From18To24 => "18-24歲",
            AgeBand::From25To34 => "25-34歲",
            AgeBand::From35To44 => "35-44歲",
            AgeBand::From45To54 => "45-54歲",
            AgeBand::From55To64 => "55-64歲",
            AgeBand::Over64 => "65+歲",
        }
    }
}

// ---------------------------------------------------------------------------
// Accident – one cleaned row
// ---------------------------------------------------------------------------

/// A raw record after category filtering and field derivation.
#[derive(Debug, Clone, PartialEq)]
pub struct Accident {
    /// Hour of day, 0–23.
    pub hour: u32,
    /// Month, 1–12.
    pub month: u32,
    /// ISO weekday, 1 = Monday .. 7 = Sunday.
    pub weekday: u32,
    pub period: Period,
    pub age: f64,
    pub age_band: AgeBand,
    pub cause: String,
    pub weather: String,
    pub road_type: String,
    pub gender: String,
    pub city: String,
    pub location: String,
    pub signal_type: String,
    pub helmet: String,
    pub accident_type_major: String,
    pub accident_type_minor: String,
    pub lat: f64,
    pub lon: f64,
}

// ---------------------------------------------------------------------------
// AccidentTable – pipeline output
// ---------------------------------------------------------------------------

/// The cleaned dataset with the value sets the filter widgets offer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccidentTable {
    pub accidents: Vec<Accident>,
    /// Sorted unique city values.
    pub cities: BTreeSet<String>,
    /// Sorted unique weather values.
    pub weathers: BTreeSet<String>,
}

impl AccidentTable {
    /// Build the filter value sets from the cleaned rows.
    pub fn from_accidents(accidents: Vec<Accident>) -> Self {
        let cities = accidents.iter().map(|a| a.city.clone()).collect();
        let weathers = accidents.iter().map(|a| a.weather.clone()).collect();
        AccidentTable {
            accidents,
            cities,
            weathers,
        }
    }

    pub fn len(&self) -> usize {
        self.accidents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accidents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_band_edges_are_right_inclusive() {
        assert_eq!(AgeBand::from_age(0.0), Some(AgeBand::Under18));
        assert_eq!(AgeBand::from_age(17.0), Some(AgeBand::Under18));
        assert_eq!(AgeBand::from_age(17.5), Some(AgeBand::From18To24));
        assert_eq!(AgeBand::from_age(24.0), Some(AgeBand::From18To24));
        assert_eq!(AgeBand::from_age(30.0), Some(AgeBand::From25To34));
        assert_eq!(AgeBand::from_age(64.0), Some(AgeBand::From55To64));
        assert_eq!(AgeBand::from_age(65.0), Some(AgeBand::Over64));
        assert_eq!(AgeBand::from_age(99.0), Some(AgeBand::Over64));
        assert_eq!(AgeBand::from_age(99.5), None);
        assert_eq!(AgeBand::from_age(-1.0), None);
    }

    #[test]
    fn weekend_is_saturday_and_sunday() {
        let weekend: Vec<u32> = (1..=7)
            .filter(|d| Period::from_weekday(*d) == Period::Weekend)
            .collect();
        assert_eq!(weekend, vec![6, 7]);
        assert_eq!(weekday_label(1), "一");
        assert_eq!(weekday_label(7), "日");
    }

    #[test]
    fn cell_coercions() {
        assert_eq!(Cell::Text(" 1430 ".into()).as_f64(), Some(1430.0));
        assert_eq!(Cell::Text("abc".into()).as_f64(), None);
        assert_eq!(Cell::Float(f64::NAN).as_f64(), None);
        assert_eq!(Cell::Integer(7).as_text().as_deref(), Some("7"));
        assert_eq!(Cell::Text("   ".into()).as_text(), None);
        assert_eq!(Cell::Null.as_text(), None);
    }
}
