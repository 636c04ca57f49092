use chrono::{Datelike, NaiveDate};

use super::model::{
    Accident, AccidentTable, AgeBand, Cell, Period, RawColumn, RawRecord, RawTable,
};
use crate::config::PipelineConfig;

// ---------------------------------------------------------------------------
// Fixed vocabularies
// ---------------------------------------------------------------------------

/// Cause substituted when the cause column is empty.
pub const CAUSE_DEFAULT: &str = "未知";

/// Causes that say nothing about the rider; such rows are excluded.
pub const UNINFORMATIVE_CAUSES: [&str; 2] = ["無(非車輛駕駛人因素)", "尚未發現肇事因素"];

/// Categorical fields copied from the snapshot with a default fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoricalField {
    Weather,
    RoadType,
    Gender,
    City,
    Location,
    SignalType,
    Helmet,
    AccidentTypeMinor,
    AccidentTypeMajor,
}

impl CategoricalField {
    pub fn source(self) -> RawColumn {
        match self {
            CategoricalField::Weather => RawColumn::Weather,
            CategoricalField::RoadType => RawColumn::RoadType,
            CategoricalField::Gender => RawColumn::Gender,
            CategoricalField::City => RawColumn::City,
            CategoricalField::Location => RawColumn::Location,
            CategoricalField::SignalType => RawColumn::SignalType,
            CategoricalField::Helmet => RawColumn::ProtectiveEquipment,
            CategoricalField::AccidentTypeMinor => RawColumn::AccidentTypeMinor,
            CategoricalField::AccidentTypeMajor => RawColumn::AccidentTypeMajor,
        }
    }
}

/// Value used when a categorical cell is missing. The per-field
/// defaults differ and are kept exactly as the dataset owners chose them.
pub const DEFAULT_FILLS: [(CategoricalField, &str); 9] = [
    (CategoricalField::Weather, "其他"),
    (CategoricalField::RoadType, "其他"),
    (CategoricalField::Gender, "未知"),
    (CategoricalField::City, "未知"),
    (CategoricalField::Location, "未知"),
    (CategoricalField::SignalType, "未知"),
    (CategoricalField::Helmet, "未知或無"),
    (CategoricalField::AccidentTypeMinor, "未知"),
    (CategoricalField::AccidentTypeMajor, "未知"),
];

fn filled(record: &RawRecord, field: CategoricalField) -> String {
    record.cell(field.source()).as_text().unwrap_or_else(|| {
        DEFAULT_FILLS
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, default)| (*default).to_string())
            .unwrap_or_default()
    })
}

// ---------------------------------------------------------------------------
// Drop bookkeeping
// ---------------------------------------------------------------------------

/// Why a raw record did not make it into the cleaned table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    NotVehicleCategory,
    BadTime,
    BadDate,
    BadAge,
    UninformativeCause,
    BadCoordinates,
}

/// Row counts per pipeline step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub input: usize,
    pub not_vehicle_category: usize,
    pub bad_time: usize,
    pub bad_date: usize,
    pub bad_age: usize,
    pub uninformative_cause: usize,
    pub bad_coordinates: usize,
    pub kept: usize,
}

impl PipelineReport {
    fn record(&mut self, reason: DropReason) {
        match reason {
            DropReason::NotVehicleCategory => self.not_vehicle_category += 1,
            DropReason::BadTime => self.bad_time += 1,
            DropReason::BadDate => self.bad_date += 1,
            DropReason::BadAge => self.bad_age += 1,
            DropReason::UninformativeCause => self.uninformative_cause += 1,
            DropReason::BadCoordinates => self.bad_coordinates += 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Turn the raw snapshot into the cleaned accident table.
///
/// Pure and order-preserving: the same input always yields the same table.
pub fn derive(raw: &RawTable, config: &PipelineConfig) -> AccidentTable {
    derive_with_report(raw, config).0
}

/// [`derive`], also returning how many rows each step discarded.
pub fn derive_with_report(raw: &RawTable, config: &PipelineConfig) -> (AccidentTable, PipelineReport) {
    let mut report = PipelineReport {
        input: raw.len(),
        ..Default::default()
    };

    let mut accidents = Vec::new();
    for record in &raw.records {
        match derive_record(record, config) {
            Ok(accident) => accidents.push(accident),
            Err(reason) => report.record(reason),
        }
    }
    report.kept = accidents.len();

    log::info!(
        "Pipeline kept {} of {} rows (category {}, time {}, date {}, age {}, cause {}, coords {})",
        report.kept,
        report.input,
        report.not_vehicle_category,
        report.bad_time,
        report.bad_date,
        report.bad_age,
        report.uninformative_cause,
        report.bad_coordinates,
    );

    (AccidentTable::from_accidents(accidents), report)
}

/// Derive one cleaned row, applying the steps in dependency order.
pub fn derive_record(record: &RawRecord, config: &PipelineConfig) -> Result<Accident, DropReason> {
    // 1. vehicle category
    let keyword = config.vehicle_keyword.to_lowercase();
    let is_vehicle = record
        .vehicle_category
        .as_text()
        .is_some_and(|category| category.to_lowercase().contains(keyword.as_str()));
    if !is_vehicle {
        return Err(DropReason::NotVehicleCategory);
    }

    // 2. time of day
    let hour = parse_hour(&record.time, config.time_encoding.hour_divisor())
        .ok_or(DropReason::BadTime)?;

    // 3. date
    let date = parse_date(&record.date).ok_or(DropReason::BadDate)?;
    let month = date.month();
    let weekday = date.weekday().number_from_monday();
    let period = Period::from_weekday(weekday);

    // 4. age
    let age = record.age.as_f64().ok_or(DropReason::BadAge)?;
    let age_band = AgeBand::from_age(age).ok_or(DropReason::BadAge)?;

    // 5. cause
    let cause = record
        .cause
        .as_text()
        .unwrap_or_else(|| CAUSE_DEFAULT.to_string());
    if UNINFORMATIVE_CAUSES.contains(&cause.as_str()) {
        return Err(DropReason::UninformativeCause);
    }

    // 6. categorical fills
    let weather = filled(record, CategoricalField::Weather);
    let road_type = filled(record, CategoricalField::RoadType);
    let gender = filled(record, CategoricalField::Gender);
    let city = filled(record, CategoricalField::City);
    let location = filled(record, CategoricalField::Location);
    let signal_type = filled(record, CategoricalField::SignalType);
    let helmet = filled(record, CategoricalField::Helmet);
    let accident_type_minor = filled(record, CategoricalField::AccidentTypeMinor);
    let accident_type_major = filled(record, CategoricalField::AccidentTypeMajor);

    // 7. coordinates
    let lat = parse_coordinate(&record.latitude).ok_or(DropReason::BadCoordinates)?;
    let lon = parse_coordinate(&record.longitude).ok_or(DropReason::BadCoordinates)?;

    Ok(Accident {
        hour,
        month,
        weekday,
        period,
        age,
        age_band,
        cause,
        weather,
        road_type,
        gender,
        city,
        location,
        signal_type,
        helmet,
        accident_type_major,
        accident_type_minor,
        lat,
        lon,
    })
}

// ---------------------------------------------------------------------------
// Field parsers
// ---------------------------------------------------------------------------

/// Hour from a numeric clock value, `None` unless it lands in 0–23.
fn parse_hour(cell: &Cell, divisor: i64) -> Option<u32> {
    let time = cell.as_f64()?;
    let hour = (time / divisor as f64).floor();
    if (0.0..24.0).contains(&hour) {
        Some(hour as u32)
    } else {
        None
    }
}

/// Parse an occurrence date.
///
/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD` and `YYYYMMDD`, optionally followed
/// by a time component after a space or `T`. Integers are read as
/// `YYYYMMDD`.
pub fn parse_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Integer(i) => parse_compact_date(&i.to_string()),
        Cell::Float(f) if f.fract() == 0.0 => parse_compact_date(&format!("{f:.0}")),
        Cell::Text(s) => {
            let s = s.trim();
            let date_part = s
                .split(|c: char| c == ' ' || c == 'T')
                .next()
                .unwrap_or(s);
            ["%Y-%m-%d", "%Y/%m/%d"]
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
                .or_else(|| parse_compact_date(date_part))
        }
        _ => None,
    }
}

/// `YYYYMMDD` with exactly eight digits.
fn parse_compact_date(s: &str) -> Option<NaiveDate> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year = s[0..4].parse().ok()?;
    let month = s[4..6].parse().ok()?;
    let day = s[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_coordinate(cell: &Cell) -> Option<f64> {
    cell.as_f64().filter(|v| v.is_finite())
}
