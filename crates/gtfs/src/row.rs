//! CSV row shapes for the handful of GTFS files this importer reads.
//! Field names follow <https://gtfs.org/schedule/reference/>; only the
//! columns the matrix/store pipeline actually needs are kept.

use chrono::NaiveDate;
use serde::Deserialize;
use utility::serde::date_time::deserialize_yyyymmdd;

#[derive(Debug, Clone, Deserialize)]
pub struct RouteRow {
    pub route_id: String,
    #[serde(default)]
    pub route_short_name: Option<String>,
    #[serde(default)]
    pub route_long_name: Option<String>,
}

impl RouteRow {
    pub fn line_name(&self) -> String {
        self.route_short_name
            .clone()
            .or_else(|| self.route_long_name.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TripRow {
    pub route_id: String,
    pub service_id: String,
    pub trip_id: String,
    #[serde(default)]
    pub trip_headsign: Option<String>,
    #[serde(default)]
    pub direction_id: Option<u8>,
    #[serde(default)]
    pub block_id: Option<String>,
    #[serde(default)]
    pub shape_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StopRow {
    pub stop_id: String,
    #[serde(default)]
    pub stop_code: Option<String>,
    #[serde(default)]
    pub stop_name: Option<String>,
    #[serde(default)]
    pub stop_lat: Option<f64>,
    #[serde(default)]
    pub stop_lon: Option<f64>,
}

fn default_pickup_type() -> u8 {
    0
}

#[derive(Debug, Clone, Deserialize)]
pub struct StopTimeRow {
    pub trip_id: String,
    #[serde(default)]
    pub arrival_time: Option<String>,
    #[serde(default)]
    pub departure_time: Option<String>,
    pub stop_id: String,
    pub stop_sequence: i32,
    #[serde(default = "default_pickup_type")]
    pub pickup_type: u8,
    #[serde(default = "default_pickup_type")]
    pub drop_off_type: u8,
    #[serde(default)]
    pub timepoint: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarRow {
    pub service_id: String,
    pub monday: u8,
    pub tuesday: u8,
    pub wednesday: u8,
    pub thursday: u8,
    pub friday: u8,
    pub saturday: u8,
    pub sunday: u8,
    #[serde(deserialize_with = "deserialize_yyyymmdd")]
    pub start_date: NaiveDate,
    #[serde(deserialize_with = "deserialize_yyyymmdd")]
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarDateRow {
    pub service_id: String,
    #[serde(deserialize_with = "deserialize_yyyymmdd")]
    pub date: NaiveDate,
    pub exception_type: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShapePointRow {
    pub shape_id: String,
    pub shape_pt_lat: f64,
    pub shape_pt_lon: f64,
    pub shape_pt_sequence: u32,
}
