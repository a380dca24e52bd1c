use chrono::Duration;
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use utility::{
    id::{HasId, Id},
    serde::duration,
};

use crate::{
    block::{Block, Garage, VehicleType},
    calendar::Calendar,
    operator::Operator,
    route::Route,
    stop::Stop,
};

/// A single scheduled journey.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    #[serde(skip)]
    pub route_id: Id<Route>,
    #[serde(skip)]
    pub calendar_id: Id<Calendar>,
    pub inbound: bool,
    #[serde(serialize_with = "duration::serialize", deserialize_with = "duration::deserialize")]
    pub start: Duration,
    #[serde(serialize_with = "duration::serialize", deserialize_with = "duration::deserialize")]
    pub end: Duration,
    #[serde(skip)]
    pub destination_id: Option<Id<Stop>>,
    pub ticket_machine_code: Option<String>,
    pub vehicle_journey_code: Option<String>,
    #[serde(skip)]
    pub block_id: Option<Id<Block>>,
    #[serde(skip)]
    pub vehicle_type_id: Option<Id<VehicleType>>,
    #[serde(skip)]
    pub garage_id: Option<Id<Garage>>,
    #[serde(skip)]
    pub operator_id: Option<Id<Operator>>,
    /// An opaque key shared by trips generated from the same
    /// JourneyPattern/section; the matrix builder uses this to recognise
    /// repeating patterns without comparing stop lists.
    pub journey_pattern: Option<String>,
    pub stops: Vec<StopTime>,
}

impl HasId for Trip {
    type IdType = i32;
}

impl Trip {
    /// Derives `start`/`end` from the stop list: `start` is the first stop's
    /// departure-or-arrival, `end` is the last stop's arrival-or-departure.
    pub fn recompute_extent(&mut self) {
        if let Some(first) = self.stops.first() {
            self.start = first.departure.or(first.arrival).unwrap_or_default();
        }
        if let Some(last) = self.stops.last() {
            self.end = last.arrival.or(last.departure).unwrap_or_default();
        }
    }

    /// Validates the ordering invariant: within each stop, `arrival <=
    /// departure`, and across stops `departure` is non-decreasing.
    pub fn stop_times_are_ordered(&self) -> bool {
        let mut last_departure: Option<Duration> = None;
        for stop in &self.stops {
            if let (Some(arrival), Some(departure)) = (stop.arrival, stop.departure) {
                if arrival > departure {
                    return false;
                }
            }
            let current = stop.departure.or(stop.arrival);
            if let (Some(last), Some(current)) = (last_departure, current) {
                if current < last {
                    return false;
                }
            }
            if current.is_some() {
                last_departure = current;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum TimingStatus {
    Principal = 0,
    Other = 1,
    Info = 2,
}

/// One stop on a trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopTime {
    pub sequence: i32,
    #[serde(skip)]
    pub stop_id: Option<Id<Stop>>,
    /// Free-text fallback for a stop not yet present in the master list
    /// (common with fixed-width ATCO-CIF feeds that reference stops the
    /// NaPTAN import hasn't caught up with).
    pub stop_code: Option<String>,
    #[serde(serialize_with = "duration::serialize_option", deserialize_with = "duration::deserialize_option")]
    pub arrival: Option<Duration>,
    #[serde(serialize_with = "duration::serialize_option", deserialize_with = "duration::deserialize_option")]
    pub departure: Option<Duration>,
    pub timing_status: TimingStatus,
    pub pick_up: bool,
    pub set_down: bool,
}

impl StopTime {
    pub fn is_first(&self) -> bool {
        self.arrival.is_none() && self.departure.is_some()
    }

    pub fn is_last(&self) -> bool {
        self.departure.is_none() && self.arrival.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(sequence: i32, arrival: Option<i64>, departure: Option<i64>) -> StopTime {
        StopTime {
            sequence,
            stop_id: None,
            stop_code: Some(format!("stop-{sequence}")),
            arrival: arrival.map(Duration::minutes),
            departure: departure.map(Duration::minutes),
            timing_status: TimingStatus::Principal,
            pick_up: true,
            set_down: true,
        }
    }

    fn trip_with_stops(stops: Vec<StopTime>) -> Trip {
        Trip {
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
        }
    }

    #[test]
    fn recompute_extent_uses_first_departure_and_last_arrival() {
        let mut trip = trip_with_stops(vec![
            stop(1, None, Some(480)),
            stop(2, Some(485), Some(485)),
            stop(3, Some(500), None),
        ]);
        trip.recompute_extent();
        assert_eq!(trip.start, Duration::minutes(480));
        assert_eq!(trip.end, Duration::minutes(500));
    }

    #[test]
    fn detects_out_of_order_departures() {
        let trip = trip_with_stops(vec![
            stop(1, None, Some(480)),
            stop(2, Some(470), Some(470)),
        ]);
        assert!(!trip.stop_times_are_ordered());
    }

    #[test]
    fn accepts_non_decreasing_departures() {
        let trip = trip_with_stops(vec![
            stop(1, None, Some(480)),
            stop(2, Some(485), Some(485)),
            stop(3, Some(500), None),
        ]);
        assert!(trip.stop_times_are_ordered());
    }
}
