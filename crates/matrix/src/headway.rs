//! Headway abbreviation: once columns are in their final order, a
//! long run of trips that are really "the same journey, repeated on a
//! regular interval" collapses into a single spanning cell rather than one
//! column per trip.

use chrono::Duration;

use crate::{Leg, StopRef};

/// One displayed column, or a collapsed run of them.
#[derive(Debug, Clone)]
pub enum ColumnSpan {
    Single(Leg),
    /// A collapsed run of `count` middle trips sharing a headway of `delta`.
    /// The run's first and last trips are emitted as their own `Single`
    /// columns either side of this one.
    Repetition { count: usize, delta: Duration },
}

fn pattern_key(leg: &Leg) -> (utility::id::Id<model::route::Route>, Option<String>, Option<StopRef>, Duration) {
    let destination = leg.trip.stops.last().map(StopRef::from);
    (
        leg.route_id,
        leg.trip.journey_pattern.clone(),
        destination,
        leg.trip.end - leg.trip.start,
    )
}

fn is_valid_headway(delta: Duration) -> bool {
    delta == Duration::minutes(60) || (delta >= Duration::zero() && delta <= Duration::minutes(30))
}

/// Collapses maximal runs of three or more trips sharing a journey pattern
/// and a constant headway into [`ColumnSpan::Repetition`] cells.
pub fn abbreviate(legs: Vec<Leg>) -> Vec<ColumnSpan> {
    let mut output = Vec::new();
    let mut index = 0;

    while index < legs.len() {
        let mut run_end = index;
        let mut delta: Option<Duration> = None;

        while run_end + 1 < legs.len() {
            let a = &legs[run_end];
            let b = &legs[run_end + 1];
            if pattern_key(a) != pattern_key(b) {
                break;
            }
            let candidate = b.trip.start - a.trip.start;
            if !is_valid_headway(candidate) {
                break;
            }
            if delta.is_some_and(|existing| existing != candidate) {
                break;
            }
            delta = Some(candidate);
            run_end += 1;
        }

        let run_len = run_end - index + 1;
        if run_len >= 3 {
            output.push(ColumnSpan::Single(legs[index].clone()));
            output.push(ColumnSpan::Repetition {
                count: run_len - 2,
                delta: delta.expect("a run of >= 2 steps always set delta"),
            });
            output.push(ColumnSpan::Single(legs[run_end].clone()));
            index = run_end + 1;
        } else {
            output.push(ColumnSpan::Single(legs[index].clone()));
            index += 1;
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use crate::tests::{leg, stop, trip};

    fn at(minutes_past_start: i64) -> model::trip::StopTime {
        stop("a", None, Some(minutes_past_start))
    }

    use super::*;

    fn hourly_leg(hour: i64) -> Leg {
        let mut l = leg(1, trip(vec![at(hour * 60), stop("b", Some(hour * 60 + 20), None)]));
        l.trip.journey_pattern = Some("JP1".to_owned());
        l
    }

    #[test]
    fn collapses_a_run_of_four_hourly_trips() {
        let legs = vec![hourly_leg(8), hourly_leg(9), hourly_leg(10), hourly_leg(11)];
        let spans = abbreviate(legs);
        assert_eq!(spans.len(), 3);
        assert!(matches!(spans[0], ColumnSpan::Single(_)));
        assert!(matches!(spans[2], ColumnSpan::Single(_)));
        match &spans[1] {
            ColumnSpan::Repetition { count, delta } => {
                assert_eq!(*count, 2);
                assert_eq!(*delta, Duration::minutes(60));
            }
            _ => panic!("expected a repetition cell"),
        }
    }

    #[test]
    fn six_trips_twenty_minutes_apart_collapse_to_first_cell_last() {
        let legs: Vec<Leg> = (0..6)
            .map(|i| {
                let start = 9 * 60 + i * 20;
                let mut l = leg(1, trip(vec![at(start), stop("b", Some(start + 20), None)]));
                l.trip.journey_pattern = Some("JP1".to_owned());
                l
            })
            .collect();
        let spans = abbreviate(legs);
        assert_eq!(spans.len(), 3);
        match &spans[0] {
            ColumnSpan::Single(first) => assert_eq!(first.trip.start, Duration::minutes(9 * 60)),
            _ => panic!("expected the 09:00 trip as a plain column"),
        }
        match &spans[1] {
            ColumnSpan::Repetition { count, delta } => {
                assert_eq!(*count, 4);
                assert_eq!(*delta, Duration::minutes(20));
            }
            _ => panic!("expected a repetition cell"),
        }
        match &spans[2] {
            ColumnSpan::Single(last) => {
                assert_eq!(last.trip.start, Duration::minutes(10 * 60 + 40));
            }
            _ => panic!("expected the 10:40 trip as a plain column"),
        }
    }

    #[test]
    fn leaves_two_trips_uncollapsed() {
        let legs = vec![hourly_leg(8), hourly_leg(9)];
        let spans = abbreviate(legs);
        assert_eq!(spans.len(), 2);
        assert!(spans.iter().all(|span| matches!(span, ColumnSpan::Single(_))));
    }

    #[test]
    fn does_not_collapse_a_ninety_minute_gap() {
        let legs = vec![hourly_leg(8), hourly_leg(9)]
            .into_iter()
            .chain(std::iter::once({
                let mut l = hourly_leg(11);
                l.trip.stops.iter_mut().for_each(|s| {
                    if let Some(a) = s.arrival.as_mut() {
                        *a += Duration::minutes(30);
                    }
                    if let Some(d) = s.departure.as_mut() {
                        *d += Duration::minutes(30);
                    }
                });
                l.trip.recompute_extent();
                l
            }))
            .collect::<Vec<_>>();
        let spans = abbreviate(legs);
        assert_eq!(spans.len(), 3);
        assert!(spans.iter().all(|span| matches!(span, ColumnSpan::Single(_))));
    }
}
