//! Parses ATCO-CIF fixed-width timetable text (as published by several UK
//! metropolitan operators, bundled inside a zip archive) into the shared
//! intermediate schedule model.
//!
//! Unlike TransXChange and GTFS, ATCO-CIF has no separate header/body
//! split: each line's first two bytes name a record type and the parser is
//! a small state machine over the stream: `QD` opens a route, `QS` opens a
//! trip within it, `QO`/`QI`/`QT` emit stop times, `QE` attaches calendar
//! exceptions to the open trip, and `QN` annotates whichever record came
//! immediately before it.

pub mod error;

use std::io::{Read, Seek};

use chrono::NaiveDate;
use indexmap::IndexMap;
use model::trip::TimingStatus;
use schedule_ir::{CalendarDateRule, CalendarRule, IntermediateRoute, IntermediateStopTime, IntermediateTrip};
use utility::fixed_width::{field, field_str, parse_date, parse_hhmm};
use utility::text::title_case;

pub use error::{AtcoCifError, Result};

/// `ulb` anywhere in the archive's filename (case-insensitively) names the
/// ULB source; anything else is lumped under MET.
pub fn source_name(archive_filename: &str) -> &'static str {
    if archive_filename.to_ascii_lowercase().contains("ulb") {
        "ULB"
    } else {
        "MET"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LastRecord {
    None,
    Qs,
    Qi,
    Other,
}

struct TripBuilder {
    calendar: CalendarRule,
    inbound: bool,
    stops: Vec<IntermediateStopTime>,
    notes: Vec<(String, String)>,
}

struct RouteBuilder {
    route: IntermediateRoute,
    operator_code: String,
}

/// Parses every `.cif`-style entry in a zip archive, returning one route
/// per distinct `LINE_OPERATOR` key encountered across the whole archive.
pub fn parse_archive<R: Read + Seek>(reader: R) -> Result<Vec<IntermediateRoute>> {
    let mut archive = zip::ZipArchive::new(reader)?;
    let mut routes: IndexMap<String, RouteBuilder> = IndexMap::new();

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }
        let mut contents = Vec::new();
        entry.read_to_end(&mut contents)?;
        parse_lines(&contents, &mut routes);
    }

    Ok(routes.into_values().map(|builder| builder.route).collect())
}

fn parse_lines(contents: &[u8], routes: &mut IndexMap<String, RouteBuilder>) {
    let mut current_route_key: Option<String> = None;
    let mut current_trip: Option<TripBuilder> = None;
    let mut last_record = LastRecord::None;

    for raw_line in contents.split(|&byte| byte == b'\n') {
        let line = trim_cr(raw_line);
        if line.len() < 2 {
            continue;
        }
        let record_type = &line[0..2];

        match record_type {
            b"QD" => {
                flush_trip(&mut current_trip, &current_route_key, routes);
                let operator_code = field_str(line, 3, 7);
                let line_name = field_str(line, 7, 11);
                // descriptions arrive ALL CAPS in MET data
                let description = title_case(&field_str(line, 12, line.len()));
                let key = format!("{}_{}", line_name, operator_code).to_ascii_uppercase();
                routes.entry(key.clone()).or_insert_with(|| RouteBuilder {
                    route: IntermediateRoute {
                        code: key.clone(),
                        service_code: None,
                        line_name: line_name.clone(),
                        line_brand: None,
                        revision_number: None,
                        start_date: default_epoch(),
                        end_date: None,
                        outbound_description: Some(description.clone()),
                        inbound_description: None,
                        unique_service_code: None,
                        trips: Vec::new(),
                    },
                    operator_code: operator_code.clone(),
                });
                current_route_key = Some(key);
                last_record = LastRecord::Other;
            }
            b"QS" => {
                flush_trip(&mut current_trip, &current_route_key, routes);
                let mask = field(line, 29, 36);
                let mon = mask.first() == Some(&b'1');
                let tue = mask.get(1) == Some(&b'1');
                let wed = mask.get(2) == Some(&b'1');
                let thu = mask.get(3) == Some(&b'1');
                let fri = mask.get(4) == Some(&b'1');
                let sat = mask.get(5) == Some(&b'1');
                let sun = mask.get(6) == Some(&b'1');
                let start_date = parse_date(field(line, 13, 21)).unwrap_or_else(default_epoch);
                let end_date = parse_date(field(line, 21, 29));
                let direction = field(line, 64, 65).first().copied();
                current_trip = Some(TripBuilder {
                    calendar: CalendarRule {
                        mon,
                        tue,
                        wed,
                        thu,
                        fri,
                        sat,
                        sun,
                        start_date,
                        end_date,
                        summary: String::new(),
                        dates: Vec::new(),
                        bank_holidays: Vec::new(),
                    },
                    inbound: direction == Some(b'I'),
                    stops: Vec::new(),
                    notes: Vec::new(),
                });
                last_record = LastRecord::Qs;
            }
            b"QE" => {
                if let Some(trip) = current_trip.as_mut() {
                    if let (Some(start), Some(end)) = (
                        parse_date(field(line, 2, 10)),
                        parse_date(field(line, 10, 18)),
                    ) {
                        let operates = field(line, 18, 19).first() == Some(&b'1');
                        trip.calendar.dates.push(CalendarDateRule {
                            start_date: start,
                            end_date: end,
                            operation: operates,
                            special: operates,
                            summary: None,
                        });
                    }
                }
                last_record = LastRecord::Other;
            }
            b"QO" => {
                if let Some(trip) = current_trip.as_mut() {
                    let stop_ref = field_str(line, 2, 14);
                    let time = parse_hhmm(field(line, 14, 18));
                    trip.stops.push(IntermediateStopTime {
                        sequence: 0,
                        stop_ref,
                        arrival: time,
                        departure: time,
                        timing_status: TimingStatus::Principal,
                        pick_up: true,
                        set_down: true,
                    });
                }
                last_record = LastRecord::Other;
            }
            b"QI" => {
                if let Some(trip) = current_trip.as_mut() {
                    let stop_ref = field_str(line, 2, 14);
                    let arrival = parse_hhmm(field(line, 14, 18));
                    let departure = parse_hhmm(field(line, 18, 22));
                    let timing_status = match field(line, 26, 28) {
                        b"T1" => TimingStatus::Principal,
                        b"T0" => TimingStatus::Other,
                        _ => TimingStatus::Other,
                    };
                    let sequence = trip.stops.len() as i32;
                    trip.stops.push(IntermediateStopTime {
                        sequence,
                        stop_ref,
                        arrival,
                        departure,
                        timing_status,
                        pick_up: true,
                        set_down: true,
                    });
                }
                last_record = LastRecord::Qi;
            }
            b"QT" => {
                if let Some(trip) = current_trip.as_mut() {
                    let stop_ref = field_str(line, 2, 14);
                    let arrival = parse_hhmm(field(line, 14, 18));
                    let sequence = trip.stops.len() as i32;
                    trip.stops.push(IntermediateStopTime {
                        sequence,
                        stop_ref,
                        arrival,
                        departure: None,
                        timing_status: TimingStatus::Principal,
                        pick_up: true,
                        set_down: true,
                    });
                }
                flush_trip(&mut current_trip, &current_route_key, routes);
                last_record = LastRecord::Other;
            }
            b"QN" => {
                apply_note(line, last_record, current_trip.as_mut());
                last_record = LastRecord::Other;
            }
            _ => {
                last_record = LastRecord::Other;
            }
        }
    }

    flush_trip(&mut current_trip, &current_route_key, routes);
}

fn apply_note(line: &[u8], last_record: LastRecord, trip: Option<&mut TripBuilder>) {
    let Some(trip) = trip else { return };
    match last_record {
        LastRecord::Qi => {
            let text = field_str(line, 2, line.len());
            let normalised = normalise_note(&text);
            if let Some(stop) = trip.stops.last_mut() {
                match normalised.as_str() {
                    "pick up only" => {
                        stop.set_down = false;
                    }
                    "set down only" => {
                        stop.pick_up = false;
                    }
                    other => {
                        log::warn!("unrecognised ATCO-CIF stop note {:?}; keeping stop time unmodified", other);
                    }
                }
            }
        }
        LastRecord::Qs => {
            let code = field_str(line, 2, 7);
            let text = field_str(line, 7, line.len());
            trip.notes.push((code, text));
        }
        _ => {}
    }
}

/// Lower-cases and collapses internal whitespace so `"pick up  only"` and
/// the leading-dot `".set down only"` variants both match.
fn normalise_note(text: &str) -> String {
    let trimmed = text.trim().trim_start_matches('.');
    trimmed
        .to_ascii_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn flush_trip(
    current_trip: &mut Option<TripBuilder>,
    current_route_key: &Option<String>,
    routes: &mut IndexMap<String, RouteBuilder>,
) {
    let Some(trip) = current_trip.take() else { return };
    let Some(key) = current_route_key else { return };
    let Some(builder) = routes.get_mut(key) else { return };

    if trip.stops.is_empty() {
        return;
    }

    let destination_ref = trip.stops.last().map(|s| s.stop_ref.clone());
    let mut intermediate = IntermediateTrip {
        inbound: trip.inbound,
        start: chrono::Duration::zero(),
        end: chrono::Duration::zero(),
        destination_ref,
        ticket_machine_code: None,
        vehicle_journey_code: None,
        block_code: None,
        vehicle_type_code: None,
        garage_code: None,
        operator_ref: (!builder.operator_code.is_empty()).then(|| builder.operator_code.clone()),
        journey_pattern: None,
        calendar: trip.calendar,
        stops: trip.stops,
        notes: trip.notes,
    };
    intermediate.recompute_extent();

    if builder.route.start_date == default_epoch() || intermediate.calendar.start_date < builder.route.start_date {
        builder.route.start_date = intermediate.calendar.start_date;
    }
    if let Some(end) = intermediate.calendar.end_date {
        builder.route.end_date = Some(builder.route.end_date.map_or(end, |current| current.max(end)));
    }

    builder.route.trips.push(intermediate);
}

fn trim_cr(line: &[u8]) -> &[u8] {
    if line.last() == Some(&b'\r') {
        &line[..line.len() - 1]
    } else {
        line
    }
}

fn default_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use zip::write::FileOptions;

    use super::*;

    fn build_archive(files: &[(&str, &[u8])]) -> Cursor<Vec<u8>> {
        let mut buf = Vec::new();
        {
            let mut writer = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options = FileOptions::default();
            for (name, contents) in files {
                writer.start_file(*name, options).unwrap();
                writer.write_all(contents).unwrap();
            }
            writer.finish().unwrap();
        }
        Cursor::new(buf)
    }

    fn pad(mut line: String, width: usize) -> String {
        while line.len() < width {
            line.push(' ');
        }
        line
    }

    fn sample_lines() -> Vec<u8> {
        let mut qd = pad("QD".to_owned(), 12);
        qd.replace_range(3..7, "OPER");
        qd.replace_range(7..11, "X1  ");
        qd.push_str("Sample route");

        let mut qs = pad("QS".to_owned(), 65);
        qs.replace_range(13..21, "20240101");
        qs.replace_range(21..29, "20241231");
        qs.replace_range(29..36, "1111100");
        qs.replace_range(64..65, "O");

        let mut qo = pad("QO".to_owned(), 18);
        qo.replace_range(2..14, "410000001   ");
        qo.replace_range(14..18, "0800");

        let mut qi = pad("QI".to_owned(), 28);
        qi.replace_range(2..14, "410000002   ");
        qi.replace_range(14..18, "0805");
        qi.replace_range(18..22, "0806");
        qi.replace_range(26..28, "T1");

        let qn = format!("QN{}", "pick up only");

        let mut qt = pad("QT".to_owned(), 18);
        qt.replace_range(2..14, "410000003   ");
        qt.replace_range(14..18, "0815");

        [qd, qs, qo, qi, qn, qt].join("\n").into_bytes()
    }

    #[test]
    fn parses_one_route_one_trip_with_three_stops() {
        let archive = build_archive(&[("sample.cif", &sample_lines())]);
        let routes = parse_archive(archive).unwrap();
        assert_eq!(routes.len(), 1);
        let route = &routes[0];
        assert_eq!(route.trips.len(), 1);
        let trip = &route.trips[0];
        assert_eq!(trip.stops.len(), 3);
        assert!(trip.calendar.mon && !trip.calendar.sat);
    }

    #[test]
    fn pick_up_only_note_clears_set_down() {
        let archive = build_archive(&[("sample.cif", &sample_lines())]);
        let routes = parse_archive(archive).unwrap();
        let trip = &routes[0].trips[0];
        assert!(!trip.stops[1].set_down);
        assert!(trip.stops[1].pick_up);
    }

    #[test]
    fn source_name_detects_ulb_case_insensitively() {
        assert_eq!(source_name("Some_ULB_Feed.zip"), "ULB");
        assert_eq!(source_name("metrobus.zip"), "MET");
    }

    #[test]
    fn normalises_note_text_whitespace_and_leading_dot() {
        assert_eq!(normalise_note(".set down  only"), "set down only");
        assert_eq!(normalise_note("  Pick Up Only "), "pick up only");
    }
}
