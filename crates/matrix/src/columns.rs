//! Column ordering: decides which trip is displayed left of which,
//! by comparing arrival times at any row two trips share, and falling back
//! to row position for trips that never overlap. Falls back further, on a
//! cycle, to a plain comparator sort.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::Duration;
use model::trip::Trip;

use crate::StopRef;

/// Returns the display order of `trips` (as indices into the slice), given
/// the row order already chosen for their stops.
pub fn order(trips: &[Trip], rows: &[StopRef]) -> Vec<usize> {
    let position: HashMap<&StopRef, usize> = rows.iter().enumerate().map(|(i, r)| (r, i)).collect();
    let visits: Vec<Vec<(usize, Duration)>> = trips
        .iter()
        .map(|trip| {
            trip.stops
                .iter()
                .filter_map(|stop| {
                    let row = *position.get(&StopRef::from(stop))?;
                    let time = stop.arrival.or(stop.departure)?;
                    Some((row, time))
                })
                .collect()
        })
        .collect();

    let n = trips.len();
    let mut indegree = vec![0usize; n];
    let mut edges: Vec<Vec<usize>> = vec![Vec::new(); n];

    for i in 0..n {
        for j in (i + 1)..n {
            match pairwise_order(&visits[i], &visits[j]) {
                Some(Ordering::Less) => {
                    edges[i].push(j);
                    indegree[j] += 1;
                }
                Some(Ordering::Greater) => {
                    edges[j].push(i);
                    indegree[i] += 1;
                }
                Some(Ordering::Equal) | None => {}
            }
        }
    }

    topological_sort(n, &edges, indegree).unwrap_or_else(|| comparator_sort(trips, &visits))
}

/// Orders trip `a` against trip `b`: by arrival time at the first row they
/// both visit. A tie there, or no shared row at all, falls back to whether
/// one trip's bottom row precedes (or is) the other's top, so a trip that
/// ends where the next one begins still sorts ahead of it.
fn pairwise_order(a: &[(usize, Duration)], b: &[(usize, Duration)]) -> Option<Ordering> {
    let shared = a.iter().find_map(|(row_a, time_a)| {
        b.iter()
            .find(|(row_b, _)| row_b == row_a)
            .map(|(_, time_b)| time_a.cmp(time_b))
    });
    match shared {
        Some(Ordering::Less) | Some(Ordering::Greater) => return shared,
        Some(Ordering::Equal) | None => {}
    }

    let a_top = a.iter().map(|(row, _)| *row).min();
    let a_bottom = a.iter().map(|(row, _)| *row).max();
    let b_top = b.iter().map(|(row, _)| *row).min();
    let b_bottom = b.iter().map(|(row, _)| *row).max();
    if let (Some(a_top), Some(a_bottom), Some(b_top), Some(b_bottom)) =
        (a_top, a_bottom, b_top, b_bottom)
    {
        let a_above = a_bottom <= b_top;
        let b_above = b_bottom <= a_top;
        if a_above && !b_above {
            return Some(Ordering::Less);
        }
        if b_above && !a_above {
            return Some(Ordering::Greater);
        }
    }

    shared
}

fn topological_sort(n: usize, edges: &[Vec<usize>], mut indegree: Vec<usize>) -> Option<Vec<usize>> {
    let mut queue: Vec<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    let mut cursor = 0;

    while cursor < queue.len() {
        let node = queue[cursor];
        cursor += 1;
        order.push(node);

        let mut next_nodes = edges[node].clone();
        next_nodes.sort_unstable();
        for next in next_nodes {
            indegree[next] -= 1;
            if indegree[next] == 0 {
                queue.push(next);
            }
        }
    }

    (order.len() == n).then_some(order)
}

fn comparator_sort(trips: &[Trip], visits: &[Vec<(usize, Duration)>]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..trips.len()).collect();
    order.sort_by(|&i, &j| {
        pairwise_order(&visits[i], &visits[j])
            .unwrap_or_else(|| trips[i].start.cmp(&trips[j].start).then(trips[i].end.cmp(&trips[j].end)))
    });
    order
}

#[cfg(test)]
mod tests {
    use crate::tests::{stop, trip};

    use super::*;

    #[test]
    fn orders_two_overlapping_trips_by_arrival_time() {
        let rows = vec![
            StopRef { stop_id: None, stop_code: Some("a".to_owned()) },
            StopRef { stop_id: None, stop_code: Some("b".to_owned()) },
        ];
        let early = trip(vec![stop("a", None, Some(0)), stop("b", Some(10), None)]);
        let late = trip(vec![stop("a", None, Some(60)), stop("b", Some(70), None)]);

        assert_eq!(order(&[late, early], &rows), vec![1, 0]);
    }

    #[test]
    fn an_equal_time_at_a_handover_row_breaks_toward_the_trip_ending_there() {
        let rows = vec![
            StopRef { stop_id: None, stop_code: Some("a".to_owned()) },
            StopRef { stop_id: None, stop_code: Some("b".to_owned()) },
            StopRef { stop_id: None, stop_code: Some("c".to_owned()) },
        ];
        // the first trip arrives at b exactly when the second departs it
        let ending = trip(vec![stop("a", None, Some(0)), stop("b", Some(10), None)]);
        let continuing = trip(vec![stop("b", None, Some(10)), stop("c", Some(20), None)]);

        assert_eq!(order(&[continuing.clone(), ending.clone()], &rows), vec![1, 0]);
        assert_eq!(order(&[ending, continuing], &rows), vec![0, 1]);
    }

    #[test]
    fn orders_non_overlapping_trips_by_row_position() {
        let rows = vec![
            StopRef { stop_id: None, stop_code: Some("a".to_owned()) },
            StopRef { stop_id: None, stop_code: Some("b".to_owned()) },
        ];
        let first = trip(vec![stop("a", None, Some(0))]);
        let second = trip(vec![stop("b", Some(600), None)]);

        assert_eq!(order(&[second, first], &rows), vec![1, 0]);
    }
}
