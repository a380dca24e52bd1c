//! Split-journey merging: two consecutive displayed trips that are
//! really one through journey split across two Routes (a common TransXChange
//! pattern at depot or interchange boundaries) get folded back into one
//! column.

use chrono::Duration;

use crate::{Leg, StopRef};

/// Whether `first` and `second` (already adjacent in column order) should be
/// displayed as a single merged journey.
pub fn should_merge(first: &Leg, second: &Leg) -> bool {
    if first.line_name != second.line_name {
        return false;
    }
    if first.operator_id != second.operator_id {
        return false;
    }

    let (Some(first_origin), Some(first_destination)) =
        (first.trip.stops.first(), first.trip.stops.last())
    else {
        return false;
    };
    let (Some(second_origin), Some(second_destination)) =
        (second.trip.stops.first(), second.trip.stops.last())
    else {
        return false;
    };

    if StopRef::from(first_destination) != StopRef::from(second_origin) {
        return false;
    }
    // circular guard: a through journey's destination must differ from its origin
    if StopRef::from(first_origin) == StopRef::from(second_destination) {
        return false;
    }

    let gap = second.trip.start - first.trip.end;
    if gap < Duration::zero() || gap > Duration::minutes(15) {
        return false;
    }

    let same_route = first.route_id == second.route_id;
    let same_ticket_machine = matches!(
        (&first.trip.ticket_machine_code, &second.trip.ticket_machine_code),
        (Some(a), Some(b)) if a == b
    );
    same_route || same_ticket_machine
}

/// Concatenates `second`'s stops onto `first`'s, dropping the duplicated
/// handover stop but transferring its pick-up flag first, since that flag
/// governs whether passengers may board for the continuing leg.
pub fn merge_trips(mut first: Leg, second: Leg) -> Leg {
    let pick_up_at_handover = second
        .trip
        .stops
        .first()
        .map(|stop| stop.pick_up)
        .unwrap_or(true);
    if let Some(last) = first.trip.stops.last_mut() {
        last.pick_up = pick_up_at_handover;
    }

    let continuing_stops = second.trip.stops.into_iter().skip(1);
    first.trip.stops.extend(continuing_stops);
    for (index, stop) in first.trip.stops.iter_mut().enumerate() {
        stop.sequence = index as i32;
    }

    first.trip.end = second.trip.end;
    if first.trip.ticket_machine_code.is_none() {
        first.trip.ticket_machine_code = second.trip.ticket_machine_code;
    }
    for note in second.notes {
        if !first.notes.contains(&note) {
            first.notes.push(note);
        }
    }
    first
}

/// Walks `legs` in display order, merging each adjacent pair that qualifies.
pub fn merge_consecutive(legs: Vec<Leg>) -> Vec<Leg> {
    let mut result: Vec<Leg> = Vec::with_capacity(legs.len());
    for leg in legs {
        if let Some(last) = result.last() {
            if should_merge(last, &leg) {
                let previous = result.pop().expect("just checked result.last()");
                result.push(merge_trips(previous, leg));
                continue;
            }
        }
        result.push(leg);
    }
    result
}

#[cfg(test)]
mod tests {
    use crate::tests::{leg, stop, trip};

    use super::*;

    #[test]
    fn merges_a_through_journey_split_across_two_routes() {
        let first = leg(1, trip(vec![stop("a", None, Some(0)), stop("b", Some(10), Some(10))]));
        let mut second = leg(1, trip(vec![stop("b", None, Some(15)), stop("c", Some(25), None)]));
        second.route_id = utility::id::Id::new(2);
        second.trip.ticket_machine_code = Some("TM1".to_owned());
        let mut first = first;
        first.trip.ticket_machine_code = Some("TM1".to_owned());

        assert!(should_merge(&first, &second));
        let merged = merge_trips(first, second);
        let codes: Vec<_> = merged
            .trip
            .stops
            .iter()
            .map(|s| s.stop_code.clone().unwrap())
            .collect();
        assert_eq!(codes, vec!["a", "b", "c"]);
        assert_eq!(merged.trip.end, Duration::minutes(25));
    }

    #[test]
    fn does_not_merge_when_the_gap_exceeds_fifteen_minutes() {
        let first = leg(1, trip(vec![stop("a", None, Some(0)), stop("b", Some(10), Some(10))]));
        let second = leg(1, trip(vec![stop("b", None, Some(40)), stop("c", Some(50), None)]));
        assert!(!should_merge(&first, &second));
    }

    #[test]
    fn does_not_merge_a_circular_pair() {
        let first = leg(1, trip(vec![stop("a", None, Some(0)), stop("b", Some(10), Some(10))]));
        let second = leg(1, trip(vec![stop("b", None, Some(15)), stop("a", Some(25), None)]));
        assert!(!should_merge(&first, &second));
    }
}
