use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

const ROWS: usize = 60_000;

/// (police jurisdiction, centre latitude, centre longitude)
const CITIES: [(&str, f64, f64); 6] = [
    ("臺北市政府警察局", 25.04, 121.55),
    ("新北市政府警察局", 25.01, 121.46),
    ("桃園市政府警察局", 24.99, 121.30),
    ("臺中市政府警察局", 24.15, 120.67),
    ("臺南市政府警察局", 22.99, 120.21),
    ("高雄市政府警察局", 22.63, 120.30),
];

const VEHICLES: [&str; 4] = ["機車", "機車", "小客車", "大貨車"];
const CAUSES: [&str; 8] = [
    "未注意車前狀態",
    "未依規定讓車",
    "違反號誌管制或指揮",
    "左轉彎未依規定",
    "酒醉(後)駕駛",
    "變換車道不當",
    "無(非車輛駕駛人因素)",
    "尚未發現肇事因素",
];
const WEATHER: [&str; 4] = ["晴", "陰", "雨", "暴雨"];
const ROAD_TYPES: [&str; 3] = ["單路部分", "交岔路", "其他"];
const GENDERS: [&str; 3] = ["男", "女", "無或物(動物、堆置物)"];
const STREETS: [&str; 8] = ["中山路", "中正路", "民生路", "復興路", "建國路", "光復路", "忠孝東路", "文化路"];
const SIGNALS: [&str; 3] = ["行車管制號誌", "閃光號誌", "無號誌"];
const EQUIPMENT: [&str; 4] = ["戴安全帽", "未戴安全帽", "未戴", "不明"];
const TYPES: [(&str, &str); 5] = [
    ("車與車", "側撞"),
    ("車與車", "追撞"),
    ("車與車", "路口交岔撞"),
    ("車輛本身", "自撞"),
    ("人與車", "穿越道路中"),
];

/// Pick from `values`, or null with probability `null_rate`.
fn maybe<'a>(rng: &mut StdRng, values: &[&'a str], null_rate: f64) -> Option<&'a str> {
    if rng.random_bool(null_rate) {
        None
    } else {
        values.choose(rng).copied()
    }
}

fn main() -> anyhow::Result<()> {
    let mut rng = StdRng::seed_from_u64(113);

    let mut vehicle = Vec::with_capacity(ROWS);
    let mut date = Vec::with_capacity(ROWS);
    let mut time = Vec::with_capacity(ROWS);
    let mut age = Vec::with_capacity(ROWS);
    let mut cause = Vec::with_capacity(ROWS);
    let mut weather = Vec::with_capacity(ROWS);
    let mut road = Vec::with_capacity(ROWS);
    let mut gender = Vec::with_capacity(ROWS);
    let mut city = Vec::with_capacity(ROWS);
    let mut location = Vec::with_capacity(ROWS);
    let mut signal = Vec::with_capacity(ROWS);
    let mut equipment = Vec::with_capacity(ROWS);
    let mut minor = Vec::with_capacity(ROWS);
    let mut major = Vec::with_capacity(ROWS);
    let mut lat = Vec::with_capacity(ROWS);
    let mut lon = Vec::with_capacity(ROWS);

    for _ in 0..ROWS {
        let (city_name, clat, clon) = CITIES[rng.random_range(0..CITIES.len())];
        let (type_major, type_minor) = TYPES[rng.random_range(0..TYPES.len())];

        vehicle.push(maybe(&mut rng, &VEHICLES, 0.01));
        // A few malformed dates and times, as in the real extracts.
        date.push(if rng.random_bool(0.005) {
            "不詳".to_string()
        } else {
            format!("2024-{:02}-{:02}", rng.random_range(1..=12), rng.random_range(1..=28))
        });
        time.push(if rng.random_bool(0.005) {
            None
        } else {
            // Rush hours are busier.
            let hour = if rng.random_bool(0.4) {
                *[7_i64, 8, 17, 18].choose(&mut rng).unwrap_or(&8)
            } else {
                rng.random_range(0..24)
            };
            Some(hour * 100 + rng.random_range(0..60))
        });
        age.push(if rng.random_bool(0.01) { None } else { Some(rng.random_range(14..=105_i64)) });
        cause.push(maybe(&mut rng, &CAUSES, 0.05));
        weather.push(maybe(&mut rng, &WEATHER, 0.02));
        road.push(maybe(&mut rng, &ROAD_TYPES, 0.02));
        gender.push(maybe(&mut rng, &GENDERS, 0.01));
        city.push(Some(city_name));
        location.push(maybe(&mut rng, &STREETS, 0.02).map(|s| format!("{}{s}", city_name.chars().take(3).collect::<String>())));
        signal.push(maybe(&mut rng, &SIGNALS, 0.02));
        equipment.push(maybe(&mut rng, &EQUIPMENT, 0.05));
        minor.push(Some(type_minor));
        major.push(Some(type_major));
        if rng.random_bool(0.005) {
            lat.push(None);
            lon.push(None);
        } else {
            lat.push(Some(clat + rng.random_range(-0.08..0.08)));
            lon.push(Some(clon + rng.random_range(-0.08..0.08)));
        }
    }

    let columns: Vec<(&str, ArrayRef)> = vec![
        ("當事者區分-類別-大類別名稱-車種", Arc::new(StringArray::from(vehicle)) as ArrayRef),
        ("發生日期", Arc::new(StringArray::from(date)) as ArrayRef),
        ("發生時間", Arc::new(Int64Array::from(time)) as ArrayRef),
        ("當事者事故發生時年齡", Arc::new(Int64Array::from(age)) as ArrayRef),
        ("肇因研判子類別名稱-主要", Arc::new(StringArray::from(cause)) as ArrayRef),
        ("天候名稱", Arc::new(StringArray::from(weather)) as ArrayRef),
        ("道路型態大類別名稱", Arc::new(StringArray::from(road)) as ArrayRef),
        ("當事者屬-性-別名稱", Arc::new(StringArray::from(gender)) as ArrayRef),
        ("處理單位名稱警局層", Arc::new(StringArray::from(city)) as ArrayRef),
        ("發生地點", Arc::new(StringArray::from(location)) as ArrayRef),
        ("號誌-號誌種類名稱", Arc::new(StringArray::from(signal)) as ArrayRef),
        ("保護裝備名稱", Arc::new(StringArray::from(equipment)) as ArrayRef),
        ("事故類型及型態子類別名稱", Arc::new(StringArray::from(minor)) as ArrayRef),
        ("事故類型及型態大類別名稱", Arc::new(StringArray::from(major)) as ArrayRef),
        ("緯度", Arc::new(Float64Array::from(lat)) as ArrayRef),
        ("經度", Arc::new(Float64Array::from(lon)) as ArrayRef),
    ];

    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .map(|(name, array)| Field::new(*name, array.data_type().clone(), true))
            .collect::<Vec<_>>(),
    ));
    let batch = RecordBatch::try_new(
        schema.clone(),
        columns.into_iter().map(|(_, array)| array).collect(),
    )?;

    // Write Parquet
    let output_path = "all_accidents_data.parquet";
    let file = std::fs::File::create(output_path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;

    println!("Wrote {ROWS} accident rows to {output_path}");
    Ok(())
}
