//! Parses a TransXChange document into the shared intermediate schedule
//! model. TransXChange is the most indirect of the three formats this crate
//! family reads: stop times come from walking timing links rather than
//! reading a flat table, journeys can reference each other's journey
//! pattern instead of naming their own, and a day's operation is the
//! union of a weekday mask, explicit date ranges, named bank holidays, and
//! references to externally-declared serviced-organisation calendars.

pub mod duration;
pub mod error;
pub mod profile;
pub mod xml;

use std::collections::{HashMap, HashSet};

use chrono::{Duration, NaiveDate};
use model::trip::TimingStatus;
use regex::Regex;
use schedule_ir::{IntermediateRoute, IntermediateStopTime, IntermediateTrip, StopActivity};

pub use error::{Result, TransxchangeError};
use profile::ServicedOrganisations;
use xml::{Document, JourneyPattern, JourneyPatternTimingLink, Service, StopUsageXml, VehicleJourney};

fn unique_service_code_pattern() -> &'static Regex {
    static PATTERN: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^P[BCDFGHKM]\d+:\d+").unwrap())
}

fn default_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()
}

fn activity_for(activity: Option<&str>) -> StopActivity {
    match activity {
        Some(value) if value.eq_ignore_ascii_case("pickUp") => StopActivity::PickUp,
        Some(value) if value.eq_ignore_ascii_case("setDown") => StopActivity::SetDown,
        Some(value) if value.eq_ignore_ascii_case("pass") => StopActivity::Pass,
        _ => StopActivity::Normal,
    }
}

fn timing_status_for(status: Option<&str>) -> TimingStatus {
    match status {
        Some(value) if value.to_ascii_lowercase().contains("principal") => TimingStatus::Principal,
        Some(_) => TimingStatus::Other,
        None => TimingStatus::Principal,
    }
}

fn parse_clock(text: &str) -> Duration {
    let mut parts = text.trim().splitn(3, ':');
    let hours: i64 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let minutes: i64 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let seconds: i64 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    Duration::hours(hours) + Duration::minutes(minutes) + Duration::seconds(seconds)
}

/// All of a `JourneyPattern`'s timing links, in order, resolved through its
/// section refs.
fn links_for<'a>(
    pattern: &JourneyPattern,
    sections: &HashMap<&'a str, &'a xml::JourneyPatternSection>,
) -> Vec<&'a JourneyPatternTimingLink> {
    pattern
        .section_refs
        .iter()
        .filter_map(|id| {
            let section = sections.get(id.as_str());
            if section.is_none() {
                log::warn!("journey pattern {} references undeclared section {id}", pattern.id);
            }
            section
        })
        .flat_map(|section| section.timing_links.iter())
        .collect()
}

/// `JourneyPatternRef` is sometimes only declared on another VehicleJourney,
/// chained to by `VehicleJourneyRef`; follow that chain, bounded against
/// cycles.
fn resolve_journey_pattern_ref<'a>(
    vehicle_journey: &'a VehicleJourney,
    by_code: &HashMap<&'a str, &'a VehicleJourney>,
) -> Option<&'a str> {
    let mut current = vehicle_journey;
    let mut seen = HashSet::new();
    loop {
        if let Some(journey_pattern_ref) = &current.journey_pattern_ref {
            return Some(journey_pattern_ref.as_str());
        }
        let next_code = current.vehicle_journey_ref.as_ref()?;
        if !seen.insert(next_code.as_str()) {
            return None;
        }
        current = by_code.get(next_code.as_str())?;
    }
}

/// Resolves the operator identifier a trip should be stored against,
/// preferring the National Operator Code; the ingestion coordinator uses
/// whatever is returned here to drive its own lookup ladder against
/// already-known operators.
fn resolve_operator_ref(
    vehicle_journey_operator_ref: Option<&str>,
    registered_operator_ref: Option<&str>,
    operators: &HashMap<&str, &xml::Operator>,
) -> Option<String> {
    let id = vehicle_journey_operator_ref.or(registered_operator_ref)?;
    let operator = operators.get(id)?;
    operator
        .national_operator_code
        .clone()
        .or_else(|| operator.licence_number.clone())
        .or_else(|| operator.operator_short_name.clone())
        .or_else(|| operator.trading_name.clone())
        .or_else(|| Some(operator.id.clone()))
}

struct LinkVisit {
    stop: StopUsageXml,
    arrival: Option<Duration>,
    departure: Option<Duration>,
}

/// Walks a journey pattern's timing links, applying wait-times and run-times
/// in sequence, and suppresses emission while inside a dead run. A start
/// dead run covers everything up to and including the named link's `from`
/// stop, so its `to` stop is the first one emitted; an end dead run covers
/// the named link's `to` stop onwards. `run_time_overrides` carries a
/// journey's own per-link run times, which beat the pattern's.
fn walk_timing_links(
    links: &[&JourneyPatternTimingLink],
    departure_time: Duration,
    start_dead_run_link: Option<&str>,
    end_dead_run_link: Option<&str>,
    run_time_overrides: &HashMap<&str, Duration>,
) -> Vec<LinkVisit> {
    let mut clock = departure_time;
    let mut suppressed = start_dead_run_link.is_some();
    let mut visits = Vec::new();

    for (index, link) in links.iter().enumerate() {
        if let Some(end_ref) = end_dead_run_link {
            if link.id == end_ref {
                suppressed = true;
            }
        }

        if index == 0 {
            let from_wait = link
                .from
                .wait_time
                .as_deref()
                .and_then(duration::parse_iso8601)
                .unwrap_or_else(Duration::zero);
            clock = clock + from_wait;
            if !suppressed {
                visits.push(LinkVisit {
                    stop: link.from.clone(),
                    arrival: None,
                    departure: Some(clock),
                });
            }
        }

        if let Some(start_ref) = start_dead_run_link {
            if link.id == start_ref {
                suppressed = false;
            }
        }

        let run_time = run_time_overrides
            .get(link.id.as_str())
            .copied()
            .or_else(|| duration::parse_iso8601(&link.run_time))
            .unwrap_or_else(Duration::zero);
        clock = clock + run_time;
        let arrival = clock;
        let to_wait = link
            .to
            .wait_time
            .as_deref()
            .and_then(duration::parse_iso8601)
            .unwrap_or_else(Duration::zero);
        let is_last = index + 1 == links.len();
        let departure = if is_last { None } else { Some(arrival + to_wait) };

        if !suppressed {
            visits.push(LinkVisit {
                stop: link.to.clone(),
                arrival: Some(arrival),
                departure,
            });
        }

        clock = departure.unwrap_or(arrival);
    }

    visits
}

fn build_stop_times(visits: Vec<LinkVisit>) -> Vec<IntermediateStopTime> {
    visits
        .into_iter()
        .enumerate()
        .map(|(sequence, visit)| {
            let activity = activity_for(visit.stop.activity.as_deref());
            IntermediateStopTime {
                sequence: sequence as i32,
                stop_ref: visit.stop.stop_point_ref,
                arrival: visit.arrival,
                departure: visit.departure,
                timing_status: timing_status_for(visit.stop.timing_status.as_deref()),
                pick_up: matches!(activity, StopActivity::Normal | StopActivity::PickUp),
                set_down: matches!(activity, StopActivity::Normal | StopActivity::SetDown),
            }
        })
        .collect()
}

struct BuildContext<'a> {
    sections: HashMap<&'a str, &'a xml::JourneyPatternSection>,
    journey_patterns: HashMap<&'a str, &'a JourneyPattern>,
    vehicle_journeys: HashMap<&'a str, &'a VehicleJourney>,
    /// Document order; trip order must be stable across re-imports so the
    /// store can preserve trip identity.
    vehicle_journey_order: &'a [VehicleJourney],
    operators: HashMap<&'a str, &'a xml::Operator>,
    serviced_organisations: ServicedOrganisations<'a>,
}

fn build_trip(
    vehicle_journey: &VehicleJourney,
    service: &Service,
    context: &BuildContext,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
) -> Option<IntermediateTrip> {
    let Some(journey_pattern_ref) =
        resolve_journey_pattern_ref(vehicle_journey, &context.vehicle_journeys)
    else {
        log::warn!(
            "vehicle journey {} has no resolvable journey pattern; skipping",
            vehicle_journey.vehicle_journey_code
        );
        return None;
    };
    let Some(journey_pattern) = context.journey_patterns.get(journey_pattern_ref) else {
        log::warn!(
            "vehicle journey {} references unknown journey pattern {journey_pattern_ref}; skipping",
            vehicle_journey.vehicle_journey_code
        );
        return None;
    };
    let links = links_for(journey_pattern, &context.sections);
    if links.is_empty() {
        return None;
    }

    let departure_time = parse_clock(&vehicle_journey.departure_time);
    let start_dead_run_link = vehicle_journey
        .start_dead_run
        .as_ref()
        .and_then(|dead_run| dead_run.short_working.as_ref())
        .map(|short_working| short_working.journey_pattern_timing_link_ref.as_str());
    let end_dead_run_link = vehicle_journey
        .end_dead_run
        .as_ref()
        .and_then(|dead_run| dead_run.short_working.as_ref())
        .map(|short_working| short_working.journey_pattern_timing_link_ref.as_str());

    let run_time_overrides: HashMap<&str, Duration> = vehicle_journey
        .timing_links
        .iter()
        .filter_map(|timing_link| {
            let run_time = duration::parse_iso8601(timing_link.run_time.as_deref()?)?;
            Some((timing_link.journey_pattern_timing_link_ref.as_str(), run_time))
        })
        .collect();

    let visits = walk_timing_links(
        &links,
        departure_time,
        start_dead_run_link,
        end_dead_run_link,
        &run_time_overrides,
    );
    if visits.is_empty() {
        return None;
    }
    let stops = build_stop_times(visits);

    let profile = vehicle_journey
        .operating_profile
        .as_ref()
        .or(service.operating_profile.as_ref());
    let calendar = profile::build_calendar(
        profile,
        &context.serviced_organisations,
        start_date,
        end_date,
    );

    let operator_ref = resolve_operator_ref(
        vehicle_journey.operator_ref.as_deref(),
        service.registered_operator_ref.as_deref(),
        &context.operators,
    );

    let mut trip = IntermediateTrip {
        inbound: journey_pattern
            .direction_code
            .as_deref()
            .is_some_and(|code| code.eq_ignore_ascii_case("inbound")),
        start: Duration::zero(),
        end: Duration::zero(),
        destination_ref: stops.last().map(|stop| stop.stop_ref.clone()),
        ticket_machine_code: vehicle_journey
            .operational
            .as_ref()
            .and_then(|operational| operational.ticket_machine.as_ref())
            .and_then(|ticket_machine| ticket_machine.journey_code.clone()),
        vehicle_journey_code: Some(vehicle_journey.vehicle_journey_code.clone()),
        block_code: vehicle_journey.block_number.clone(),
        vehicle_type_code: vehicle_journey
            .operational
            .as_ref()
            .and_then(|operational| operational.vehicle_type.as_ref())
            .and_then(|vehicle_type| vehicle_type.description.clone()),
        garage_code: vehicle_journey
            .garage
            .as_ref()
            .and_then(|garage| garage.garage_code.clone()),
        operator_ref,
        journey_pattern: Some(journey_pattern.id.clone()),
        calendar,
        stops,
        notes: vehicle_journey
            .notes
            .iter()
            .map(|note| {
                (
                    note.note_code.clone().unwrap_or_default(),
                    note.note_text.clone().unwrap_or_default(),
                )
            })
            .collect(),
    };
    trip.recompute_extent();
    Some(trip)
}

fn build_route(service: &Service, line: &xml::Line, context: &BuildContext) -> Option<IntermediateRoute> {
    let start_date = service
        .operating_period
        .as_ref()
        .and_then(|period| profile::parse_date(&period.start_date))
        .unwrap_or_else(default_epoch);
    let end_date = service
        .operating_period
        .as_ref()
        .and_then(|period| period.end_date.as_deref())
        .and_then(profile::parse_date);

    let trips: Vec<IntermediateTrip> = context
        .vehicle_journey_order
        .iter()
        .filter(|vj| {
            vj.service_ref
                .as_deref()
                .is_none_or(|service_ref| service_ref == service.service_code)
                && vj
                    .line_ref
                    .as_deref()
                    .is_none_or(|line_ref| line_ref == line.line_name)
        })
        .filter_map(|vj| build_trip(vj, service, context, start_date, end_date))
        .collect();

    if trips.is_empty() {
        return None;
    }

    let unique_service_code = unique_service_code_pattern()
        .is_match(&service.service_code)
        .then(|| service.service_code.clone());

    Some(IntermediateRoute {
        code: format!("{}:{}", service.service_code, line.line_name),
        service_code: Some(service.service_code.clone()),
        line_name: line.line_name.clone(),
        line_brand: None,
        revision_number: None,
        start_date,
        end_date,
        outbound_description: line
            .outbound_description
            .as_ref()
            .and_then(|description| description.description.clone()),
        inbound_description: line
            .inbound_description
            .as_ref()
            .and_then(|description| description.description.clone()),
        unique_service_code,
        trips,
    })
}

/// Parses a whole TransXChange document into routes, one per declared Line.
pub fn parse_document(xml_text: &str) -> Result<Vec<IntermediateRoute>> {
    let document: Document = serde_xml_rs::from_str(xml_text)?;
    Ok(build_routes(&document))
}

fn build_routes(document: &Document) -> Vec<IntermediateRoute> {
    let sections: HashMap<&str, &xml::JourneyPatternSection> = document
        .journey_pattern_sections
        .sections
        .iter()
        .map(|section| (section.id.as_str(), section))
        .collect();

    let journey_patterns: HashMap<&str, &JourneyPattern> = document
        .services
        .services
        .iter()
        .flat_map(|service| {
            service
                .standard_service
                .iter()
                .flat_map(|standard| standard.journey_patterns.iter())
        })
        .map(|pattern| (pattern.id.as_str(), pattern))
        .collect();

    let vehicle_journeys: HashMap<&str, &VehicleJourney> = document
        .vehicle_journeys
        .vehicle_journeys
        .iter()
        .map(|vj| (vj.vehicle_journey_code.as_str(), vj))
        .collect();

    let operators: HashMap<&str, &xml::Operator> = document
        .operators
        .operators
        .iter()
        .map(|operator| (operator.id.as_str(), operator))
        .collect();

    let serviced_organisations = ServicedOrganisations::new(&document.serviced_organisations.organisations);

    let context = BuildContext {
        sections,
        journey_patterns,
        vehicle_journeys,
        vehicle_journey_order: &document.vehicle_journeys.vehicle_journeys,
        operators,
        serviced_organisations,
    };

    document
        .services
        .services
        .iter()
        .flat_map(|service| {
            service
                .lines
                .lines
                .iter()
                .filter_map(|line| build_route(service, line, &context))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL_DOCUMENT: &str = r#"<?xml version="1.0"?>
<TransXChange>
  <JourneyPatternSections>
    <JourneyPatternSection id="JPS1">
      <JourneyPatternTimingLink id="JPTL1">
        <From>
          <StopPointRef>410000001</StopPointRef>
          <Activity>pickUp</Activity>
        </From>
        <To>
          <StopPointRef>410000002</StopPointRef>
          <Activity>setDown</Activity>
        </To>
        <RunTime>PT10M</RunTime>
      </JourneyPatternTimingLink>
    </JourneyPatternSection>
  </JourneyPatternSections>
  <Operators>
    <Operator id="OP1">
      <NationalOperatorCode>ABCD</NationalOperatorCode>
    </Operator>
  </Operators>
  <Services>
    <Service>
      <ServiceCode>PB0000001:1</ServiceCode>
      <Lines>
        <Line>
          <LineName>1</LineName>
        </Line>
      </Lines>
      <OperatingPeriod>
        <StartDate>2024-01-01</StartDate>
      </OperatingPeriod>
      <RegisteredOperatorRef>OP1</RegisteredOperatorRef>
      <StandardService>
        <JourneyPattern id="JP1">
          <DirectionCode>outbound</DirectionCode>
          <JourneyPatternSectionRefs>JPS1</JourneyPatternSectionRefs>
        </JourneyPattern>
      </StandardService>
      <OperatingProfile>
        <RegularDayType>
          <DaysOfWeek>
            <Monday/>
            <Tuesday/>
          </DaysOfWeek>
        </RegularDayType>
      </OperatingProfile>
    </Service>
  </Services>
  <VehicleJourneys>
    <VehicleJourney>
      <VehicleJourneyCode>VJ1</VehicleJourneyCode>
      <ServiceRef>PB0000001:1</ServiceRef>
      <LineRef>1</LineRef>
      <JourneyPatternRef>JP1</JourneyPatternRef>
      <DepartureTime>08:00:00</DepartureTime>
    </VehicleJourney>
  </VehicleJourneys>
</TransXChange>
"#;

    #[test]
    fn parses_a_minimal_document_into_one_route_one_trip() {
        let routes = parse_document(MINIMAL_DOCUMENT).unwrap();
        assert_eq!(routes.len(), 1);
        let route = &routes[0];
        assert_eq!(route.line_name, "1");
        assert_eq!(route.unique_service_code.as_deref(), Some("PB0000001:1"));
        assert_eq!(route.trips.len(), 1);
        let trip = &route.trips[0];
        assert_eq!(trip.stops.len(), 2);
        assert_eq!(trip.operator_ref.as_deref(), Some("ABCD"));
        assert!(trip.calendar.mon && trip.calendar.tue && !trip.calendar.wed);
    }

    #[test]
    fn run_time_accumulates_onto_the_departure_clock() {
        let routes = parse_document(MINIMAL_DOCUMENT).unwrap();
        let trip = &routes[0].trips[0];
        assert_eq!(trip.stops[0].departure, Some(Duration::hours(8)));
        assert_eq!(trip.stops[1].arrival, Some(Duration::hours(8) + Duration::minutes(10)));
    }

    fn link(id: &str, from: &str, to: &str) -> JourneyPatternTimingLink {
        let usage = |stop: &str| StopUsageXml {
            stop_point_ref: stop.to_owned(),
            timing_status: None,
            activity: None,
            wait_time: None,
        };
        JourneyPatternTimingLink {
            id: id.to_owned(),
            from: usage(from),
            to: usage(to),
            run_time: "PT5M".to_owned(),
        }
    }

    #[test]
    fn start_dead_run_suppresses_stops_up_to_the_named_links_from() {
        let l1 = link("L1", "a", "b");
        let l2 = link("L2", "b", "c");
        let l3 = link("L3", "c", "d");
        let links = vec![&l1, &l2, &l3];

        let visits = walk_timing_links(&links, Duration::hours(9), Some("L2"), None, &HashMap::new());
        let stops: Vec<_> = visits.iter().map(|v| v.stop.stop_point_ref.as_str()).collect();
        assert_eq!(stops, vec!["c", "d"]);
        assert_eq!(visits[0].arrival, Some(Duration::hours(9) + Duration::minutes(10)));
    }

    #[test]
    fn end_dead_run_suppresses_the_named_link_onwards() {
        let l1 = link("L1", "a", "b");
        let l2 = link("L2", "b", "c");
        let l3 = link("L3", "c", "d");
        let links = vec![&l1, &l2, &l3];

        let visits = walk_timing_links(&links, Duration::hours(9), None, Some("L3"), &HashMap::new());
        let stops: Vec<_> = visits.iter().map(|v| v.stop.stop_point_ref.as_str()).collect();
        assert_eq!(stops, vec!["a", "b", "c"]);
    }

    #[test]
    fn a_journeys_own_run_time_beats_the_patterns() {
        let l1 = link("L1", "a", "b");
        let links = vec![&l1];
        let overrides = HashMap::from([("L1", Duration::minutes(12))]);

        let visits = walk_timing_links(&links, Duration::hours(9), None, None, &overrides);
        assert_eq!(visits[1].arrival, Some(Duration::hours(9) + Duration::minutes(12)));
    }
}
