//! Parses a GTFS zip archive into the shared intermediate schedule model.
//!
//! Route and trip matching, calendar compilation, and stop upserts all
//! follow the same shapes the TransXChange and ATCO-CIF parsers produce, so
//! the ingestion coordinator (`ingest`) can treat all three uniformly.

pub mod error;
pub mod row;

use std::{
    collections::HashMap,
    io::{Read, Seek},
};

use chrono::{Duration, LocalResult, NaiveDate, Offset, TimeZone};
use model::{stop::Stop, trip::TimingStatus};
use schedule_ir::{
    CalendarDateRule, CalendarRule, IntermediateRoute, IntermediateStopTime, IntermediateTrip,
    StopActivity,
};
use utility::serde::duration::parse_duration;

pub use error::{GtfsError, Result};
use row::{CalendarDateRow, CalendarRow, RouteRow, ShapePointRow, StopRow, StopTimeRow, TripRow};

/// Caller-supplied knobs that vary per feed rather than per row.
#[derive(Debug, Clone, Default)]
pub struct GtfsOptions {
    /// Only routes whose `route_id` starts with this are imported. `None`
    /// imports every route in the feed.
    pub route_id_prefix: Option<String>,
    /// The feed publishes times in UTC rather than local time. Each trip is
    /// shifted by its calendar's local offset, sampled once at midday on the
    /// calendar's start date; a feed spanning a DST change is therefore an
    /// hour off for part of its life, which callers accept.
    pub utc: bool,
}

/// The local UTC offset in force at midday on `date`.
pub fn local_offset_at_midday(date: NaiveDate) -> Duration {
    let midday = date.and_hms_opt(12, 0, 0).expect("midday is a valid time");
    let offset = match chrono::Local.offset_from_local_datetime(&midday) {
        LocalResult::Single(offset) | LocalResult::Ambiguous(offset, _) => offset,
        LocalResult::None => chrono::Local.offset_from_utc_datetime(&midday),
    };
    Duration::seconds(i64::from(offset.fix().local_minus_utc()))
}

#[derive(Debug, Clone, Default)]
pub struct GtfsImport {
    pub routes: Vec<IntermediateRoute>,
    pub stops: Vec<Stop>,
    /// WKT `LINESTRING` geometry per route id, for routes whose trips all
    /// reference a single shape. Not consumed by the store; kept for callers
    /// that want to attach geometry to a route.
    pub shapes: HashMap<String, String>,
}

fn read_csv<T, R>(archive: &mut zip::ZipArchive<R>, name: &'static str) -> Result<Vec<T>>
where
    T: serde::de::DeserializeOwned,
    R: Read + Seek,
{
    let file = archive
        .by_name(name)
        .map_err(|_| GtfsError::MissingFile(name))?;
    let mut reader = csv::Reader::from_reader(file);
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record.map_err(|source| GtfsError::Row { file: name, source })?);
    }
    Ok(rows)
}

fn read_csv_optional<T, R>(archive: &mut zip::ZipArchive<R>, name: &'static str) -> Result<Vec<T>>
where
    T: serde::de::DeserializeOwned,
    R: Read + Seek,
{
    match read_csv(archive, name) {
        Ok(rows) => Ok(rows),
        Err(GtfsError::MissingFile(_)) => Ok(Vec::new()),
        Err(err) => Err(err),
    }
}

fn build_calendars(
    calendars: &[CalendarRow],
    calendar_dates: &[CalendarDateRow],
) -> HashMap<String, CalendarRule> {
    let mut by_service: HashMap<String, CalendarRule> = calendars
        .iter()
        .map(|row| {
            let rule = CalendarRule {
                mon: row.monday == 1,
                tue: row.tuesday == 1,
                wed: row.wednesday == 1,
                thu: row.thursday == 1,
                fri: row.friday == 1,
                sat: row.saturday == 1,
                sun: row.sunday == 1,
                start_date: row.start_date,
                end_date: Some(row.end_date),
                summary: String::new(),
                dates: Vec::new(),
                bank_holidays: Vec::new(),
            };
            (row.service_id.clone(), rule)
        })
        .collect();

    for exception in calendar_dates {
        let rule = by_service
            .entry(exception.service_id.clone())
            .or_insert_with(|| CalendarRule {
                mon: false,
                tue: false,
                wed: false,
                thu: false,
                fri: false,
                sat: false,
                sun: false,
                start_date: exception.date,
                end_date: None,
                summary: String::new(),
                dates: Vec::new(),
                bank_holidays: Vec::new(),
            });
        let (operation, special) = match exception.exception_type {
            1 => (true, true),
            2 => (false, false),
            _ => continue,
        };
        rule.dates.push(CalendarDateRule {
            start_date: exception.date,
            end_date: exception.date,
            operation,
            special,
            summary: None,
        });
    }

    by_service
}

fn activity_for(pickup_type: u8, drop_off_type: u8) -> StopActivity {
    let pickup_allowed = pickup_type != 1;
    let drop_off_allowed = drop_off_type != 1;
    match (pickup_allowed, drop_off_allowed) {
        (true, true) => StopActivity::Normal,
        (true, false) => StopActivity::PickUp,
        (false, true) => StopActivity::SetDown,
        (false, false) => StopActivity::Pass,
    }
}

fn timing_status_for(timepoint: Option<u8>) -> TimingStatus {
    match timepoint {
        Some(0) => TimingStatus::Other,
        _ => TimingStatus::Principal,
    }
}

fn shape_to_wkt(points: &mut [ShapePointRow]) -> String {
    points.sort_by_key(|p| p.shape_pt_sequence);
    let coords: Vec<String> = points
        .iter()
        .map(|p| format!("{} {}", p.shape_pt_lon, p.shape_pt_lat))
        .collect();
    format!("LINESTRING({})", coords.join(", "))
}

/// Parses a whole GTFS archive into routes, trips, and stops.
pub fn parse_archive<R: Read + Seek>(reader: R, options: &GtfsOptions) -> Result<GtfsImport> {
    let mut archive = zip::ZipArchive::new(reader)?;

    let route_rows = read_csv::<RouteRow, _>(&mut archive, "routes.txt")?;
    let trip_rows = read_csv::<TripRow, _>(&mut archive, "trips.txt")?;
    let stop_rows = read_csv::<StopRow, _>(&mut archive, "stops.txt")?;
    let stop_time_rows = read_csv::<StopTimeRow, _>(&mut archive, "stop_times.txt")?;
    let calendar_rows = read_csv_optional::<CalendarRow, _>(&mut archive, "calendar.txt")?;
    let calendar_date_rows =
        read_csv_optional::<CalendarDateRow, _>(&mut archive, "calendar_dates.txt")?;
    let mut shape_rows = read_csv_optional::<ShapePointRow, _>(&mut archive, "shapes.txt")?;

    let calendars = build_calendars(&calendar_rows, &calendar_date_rows);

    let mut shapes_by_id: HashMap<String, Vec<ShapePointRow>> = HashMap::new();
    for row in shape_rows.drain(..) {
        shapes_by_id.entry(row.shape_id.clone()).or_default().push(row);
    }
    let shape_wkt: HashMap<String, String> = shapes_by_id
        .into_iter()
        .map(|(id, mut points)| (id, shape_to_wkt(&mut points)))
        .collect();

    let mut stop_times_by_trip: HashMap<String, Vec<StopTimeRow>> = HashMap::new();
    for row in stop_time_rows {
        stop_times_by_trip
            .entry(row.trip_id.clone())
            .or_default()
            .push(row);
    }
    for rows in stop_times_by_trip.values_mut() {
        rows.sort_by_key(|r| r.stop_sequence);
    }

    let mut trips_by_route: HashMap<String, Vec<TripRow>> = HashMap::new();
    for row in trip_rows {
        trips_by_route.entry(row.route_id.clone()).or_default().push(row);
    }

    let routes = route_rows
        .into_iter()
        .filter(|route| {
            options
                .route_id_prefix
                .as_deref()
                .is_none_or(|prefix| route.route_id.starts_with(prefix))
        })
        .filter_map(|route| build_route(&route, &trips_by_route, &stop_times_by_trip, &calendars, options))
        .collect();

    let mut route_shapes: HashMap<String, String> = HashMap::new();
    for route in &route_rows_shape_hint(&trips_by_route) {
        if let Some(wkt) = shape_wkt.get(&route.1) {
            route_shapes.insert(route.0.clone(), wkt.clone());
        }
    }

    let stops = stop_rows
        .into_iter()
        .map(|row| Stop {
            atco_code: row.stop_id,
            common_name: row.stop_name,
            latlong: match (row.stop_lat, row.stop_lon) {
                (Some(lat), Some(lon)) => Some((lat, lon)),
                _ => None,
            },
            active: true,
        })
        .collect();

    Ok(GtfsImport {
        routes,
        stops,
        shapes: route_shapes,
    })
}

/// Routes whose trips all reference exactly one `shape_id`, paired with that id.
fn route_rows_shape_hint(trips_by_route: &HashMap<String, Vec<TripRow>>) -> Vec<(String, String)> {
    trips_by_route
        .iter()
        .filter_map(|(route_id, trips)| {
            let mut shape_ids = trips.iter().filter_map(|t| t.shape_id.clone());
            let first = shape_ids.next()?;
            if shape_ids.all(|id| id == first) {
                Some((route_id.clone(), first))
            } else {
                None
            }
        })
        .collect()
}

fn build_route(
    route: &RouteRow,
    trips_by_route: &HashMap<String, Vec<TripRow>>,
    stop_times_by_trip: &HashMap<String, Vec<StopTimeRow>>,
    calendars: &HashMap<String, CalendarRule>,
    options: &GtfsOptions,
) -> Option<IntermediateRoute> {
    let trip_rows = trips_by_route.get(&route.route_id)?;

    let trips: Vec<IntermediateTrip> = trip_rows
        .iter()
        .filter_map(|trip_row| build_trip(trip_row, stop_times_by_trip, calendars, options))
        .collect();

    if trips.is_empty() {
        return None;
    }

    let start_date = trips
        .iter()
        .map(|t| t.calendar.start_date)
        .min()
        .unwrap_or_else(default_epoch);
    let end_date = trips.iter().filter_map(|t| t.calendar.end_date).max();

    Some(IntermediateRoute {
        code: route.route_id.clone(),
        service_code: None,
        line_name: route.line_name(),
        line_brand: None,
        revision_number: None,
        start_date,
        end_date,
        outbound_description: None,
        inbound_description: None,
        unique_service_code: None,
        trips,
    })
}

fn default_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()
}

fn build_trip(
    trip_row: &TripRow,
    stop_times_by_trip: &HashMap<String, Vec<StopTimeRow>>,
    calendars: &HashMap<String, CalendarRule>,
    options: &GtfsOptions,
) -> Option<IntermediateTrip> {
    let stop_time_rows = stop_times_by_trip.get(&trip_row.trip_id)?;
    let calendar = calendars.get(&trip_row.service_id)?.clone();

    let offset = options
        .utc
        .then(|| local_offset_at_midday(calendar.start_date));

    let stops: Vec<IntermediateStopTime> = stop_time_rows
        .iter()
        .map(|row| {
            let mut arrival = row.arrival_time.as_deref().and_then(parse_duration);
            let mut departure = row.departure_time.as_deref().and_then(parse_duration);
            if let Some(offset) = offset {
                arrival = arrival.map(|d| d + offset);
                departure = departure.map(|d| d + offset);
            }
            IntermediateStopTime {
                sequence: row.stop_sequence,
                stop_ref: row.stop_id.clone(),
                arrival,
                departure,
                timing_status: timing_status_for(row.timepoint),
                pick_up: matches!(
                    activity_for(row.pickup_type, row.drop_off_type),
                    StopActivity::Normal | StopActivity::PickUp
                ),
                set_down: matches!(
                    activity_for(row.pickup_type, row.drop_off_type),
                    StopActivity::Normal | StopActivity::SetDown
                ),
            }
        })
        .collect();

    let mut trip = IntermediateTrip {
        inbound: trip_row.direction_id == Some(1),
        start: Duration::zero(),
        end: Duration::zero(),
        destination_ref: stops.last().map(|s| s.stop_ref.clone()),
        ticket_machine_code: None,
        vehicle_journey_code: Some(trip_row.trip_id.clone()),
        block_code: trip_row.block_id.clone(),
        vehicle_type_code: None,
        garage_code: None,
        operator_ref: None,
        journey_pattern: trip_row.shape_id.clone(),
        calendar,
        stops,
        notes: Vec::new(),
    };
    trip.recompute_extent();
    Some(trip)
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use zip::write::FileOptions;

    use super::*;

    fn build_archive(files: &[(&str, &str)]) -> Cursor<Vec<u8>> {
        let mut buf = Vec::new();
        {
            let mut writer = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options = FileOptions::default();
            for (name, contents) in files {
                writer.start_file(*name, options).unwrap();
                writer.write_all(contents.as_bytes()).unwrap();
            }
            writer.finish().unwrap();
        }
        Cursor::new(buf)
    }

    fn sample_feed() -> Cursor<Vec<u8>> {
        build_archive(&[
            ("routes.txt", "route_id,route_short_name\n1,X1\n"),
            (
                "trips.txt",
                "route_id,service_id,trip_id,direction_id\n1,WD,T1,0\n",
            ),
            (
                "stops.txt",
                "stop_id,stop_name,stop_lat,stop_lon\nA,Stop A,51.5,-0.1\nB,Stop B,51.6,-0.2\n",
            ),
            (
                "stop_times.txt",
                "trip_id,arrival_time,departure_time,stop_id,stop_sequence\n\
                 T1,08:00:00,08:00:00,A,0\nT1,08:10:00,08:10:00,B,1\n",
            ),
            (
                "calendar.txt",
                "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\n\
                 WD,1,1,1,1,1,0,0,20240101,20241231\n",
            ),
        ])
    }

    #[test]
    fn parses_a_minimal_feed_into_one_route_one_trip() {
        let import = parse_archive(sample_feed(), &GtfsOptions::default()).unwrap();
        assert_eq!(import.routes.len(), 1);
        let route = &import.routes[0];
        assert_eq!(route.line_name, "X1");
        assert_eq!(route.trips.len(), 1);
        assert_eq!(route.trips[0].stops.len(), 2);
        assert_eq!(import.stops.len(), 2);
    }

    #[test]
    fn route_prefix_filters_out_non_matching_routes() {
        let options = GtfsOptions {
            route_id_prefix: Some("9".to_owned()),
            ..Default::default()
        };
        let import = parse_archive(sample_feed(), &options).unwrap();
        assert!(import.routes.is_empty());
    }

    #[test]
    fn utc_feed_shifts_every_stop_time_by_the_calendar_offset() {
        let options = GtfsOptions {
            utc: true,
            ..Default::default()
        };
        let import = parse_archive(sample_feed(), &options).unwrap();
        let trip = &import.routes[0].trips[0];
        let offset = local_offset_at_midday(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(trip.stops[0].departure.unwrap(), Duration::hours(8) + offset);
        assert_eq!(trip.stops[1].arrival.unwrap(), Duration::hours(8) + Duration::minutes(10) + offset);
    }

    #[test]
    fn pickup_and_drop_off_flags_follow_gtfs_codes() {
        assert_eq!(activity_for(0, 0), StopActivity::Normal);
        assert_eq!(activity_for(1, 0), StopActivity::SetDown);
        assert_eq!(activity_for(0, 1), StopActivity::PickUp);
        assert_eq!(activity_for(1, 1), StopActivity::Pass);
    }
}
