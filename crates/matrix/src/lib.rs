//! The matrix timetable builder: turns a set of Trips active on one date
//! into a two-dimensional grid, one row per stop and one column per
//! displayed journey, the way a printed bus timetable lays them out.
//!
//! A [`Leg`] is one Route's Trip plus the handful of Route-level fields the
//! builder needs but which only live on `Route`/`Service`, not `Trip`
//! itself. Callers assemble these from whatever they already fetched from
//! the store; this crate has no dependency on it.

pub mod columns;
pub mod headway;
pub mod merge;
pub mod notes;
pub mod rows;

use model::{
    note::Note,
    operator::Operator,
    route::Route,
    stop::Stop,
    trip::{StopTime, Trip},
};
use utility::id::Id;

/// The identity of a matrix row: a stop, or (for fixed-width feeds that
/// reference a stop NaPTAN hasn't caught up with) its free-text fallback.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StopRef {
    pub stop_id: Option<Id<Stop>>,
    pub stop_code: Option<String>,
}

impl From<&StopTime> for StopRef {
    fn from(stop_time: &StopTime) -> Self {
        StopRef {
            stop_id: stop_time.stop_id.clone(),
            stop_code: stop_time.stop_code.clone(),
        }
    }
}

/// One Route's Trip, carrying the Route-level fields the builder compares
/// trips by (`line_name`, operator, which Route it belongs to) without
/// needing the whole `Route` record kept alongside it.
#[derive(Debug, Clone)]
pub struct Leg {
    pub route_id: Id<Route>,
    pub line_name: String,
    pub operator_id: Option<Id<Operator>>,
    pub trip: Trip,
    /// Footnotes attached to this trip, surfaced by [`notes::feet`].
    pub notes: Vec<Note>,
}

/// The finished matrix for one direction (outbound or inbound) of one set
/// of Routes active on a date: a stop order for the rows, and a column
/// order with split journeys merged and repeating headways collapsed.
#[derive(Debug, Clone)]
pub struct Grouping {
    pub rows: Vec<StopRef>,
    pub columns: Vec<headway::ColumnSpan>,
}

/// Builds a [`Grouping`] from the Trips active on one date, applying row
/// ordering, column ordering, split-journey merging, and headway
/// abbreviation in that order.
pub fn build_grouping(legs: Vec<Leg>) -> Grouping {
    let trips: Vec<Trip> = legs.iter().map(|leg| leg.trip.clone()).collect();
    let rows = rows::order(&trips);

    let column_order = columns::order(&trips, &rows);
    let ordered_legs: Vec<Leg> = column_order
        .into_iter()
        .map(|index| legs[index].clone())
        .collect();

    let merged = merge::merge_consecutive(ordered_legs);
    let columns = headway::abbreviate(merged);

    Grouping { rows, columns }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use model::trip::TimingStatus;

    use super::*;

    pub(crate) fn stop(code: &str, arrival: Option<i64>, departure: Option<i64>) -> StopTime {
        StopTime {
            sequence: 0,
            stop_id: None,
            stop_code: Some(code.to_owned()),
            arrival: arrival.map(Duration::minutes),
            departure: departure.map(Duration::minutes),
            timing_status: TimingStatus::Principal,
            pick_up: true,
            set_down: true,
        }
    }

    pub(crate) fn trip(stops: Vec<StopTime>) -> Trip {
        let mut trip = Trip {
            route_id: Id::new(1),
            calendar_id: Id::new(1),
            inbound: false,
            start: Duration::zero(),
            end: Duration::zero(),
            destination_id: None,
            ticket_machine_code: None,
            vehicle_journey_code: None,
            block_id: None,
            vehicle_type_id: None,
            garage_id: None,
            operator_id: None,
            journey_pattern: None,
            stops,
        };
        trip.recompute_extent();
        trip
    }

    pub(crate) fn leg(route_id: i32, trip: Trip) -> Leg {
        Leg {
            route_id: Id::new(route_id),
            line_name: "1".to_owned(),
            operator_id: Some(Id::new("OP".to_owned())),
            trip,
            notes: vec![],
        }
    }

    #[test]
    fn build_grouping_orders_rows_and_columns_for_two_non_overlapping_trips() {
        let early = leg(
            1,
            trip(vec![
                stop("a", None, Some(0)),
                stop("b", Some(10), None),
            ]),
        );
        let late = leg(
            1,
            trip(vec![
                stop("a", None, Some(60)),
                stop("b", Some(70), None),
            ]),
        );

        let grouping = build_grouping(vec![late.clone(), early.clone()]);
        assert_eq!(grouping.rows.len(), 2);
        assert_eq!(grouping.columns.len(), 2);
    }
}
