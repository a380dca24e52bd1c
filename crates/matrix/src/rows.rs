//! Row ordering: one row per distinct stop appearance across a
//! Grouping's trips, topologically sorted by the order trips actually visit
//! them. Falls back to a longest-common-subsequence splice when a stop
//! appears twice within one trip (a loop), since that makes the visit graph
//! cyclic and a topological sort impossible.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexSet;
use model::trip::Trip;
use utility::diff::lcs_diff;

use crate::StopRef;

pub fn order(trips: &[Trip]) -> Vec<StopRef> {
    let mut nodes: IndexSet<StopRef> = IndexSet::new();
    let mut edges: HashMap<StopRef, HashSet<StopRef>> = HashMap::new();
    let mut indegree: HashMap<StopRef, usize> = HashMap::new();

    for trip in trips {
        let visits: Vec<StopRef> = trip.stops.iter().map(StopRef::from).collect();
        for visit in &visits {
            nodes.insert(visit.clone());
            indegree.entry(visit.clone()).or_insert(0);
        }
        for pair in visits.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if prev == next {
                continue;
            }
            let is_new_edge = edges.entry(prev.clone()).or_default().insert(next.clone());
            if is_new_edge {
                *indegree.entry(next.clone()).or_insert(0) += 1;
            }
        }
    }

    topological_sort(&nodes, &edges, &indegree).unwrap_or_else(|| splice_by_lcs(trips))
}

fn topological_sort(
    nodes: &IndexSet<StopRef>,
    edges: &HashMap<StopRef, HashSet<StopRef>>,
    indegree: &HashMap<StopRef, usize>,
) -> Option<Vec<StopRef>> {
    let mut indegree = indegree.clone();
    let mut queue: VecDeque<StopRef> = nodes
        .iter()
        .filter(|node| indegree[*node] == 0)
        .cloned()
        .collect();
    let mut order = Vec::with_capacity(nodes.len());

    while let Some(node) = queue.pop_front() {
        order.push(node.clone());
        if let Some(next_nodes) = edges.get(&node) {
            for next in next_nodes {
                let remaining = indegree.get_mut(next).expect("every node has an indegree entry");
                *remaining -= 1;
                if *remaining == 0 {
                    queue.push_back(next.clone());
                }
            }
        }
    }

    (order.len() == nodes.len()).then_some(order)
}

/// Longest-trip-first diff splice: walk trips from most stops to fewest,
/// aligning each one's visit list against the row list built so far and
/// inserting any stop not already in it at the position the diff implies.
fn splice_by_lcs(trips: &[Trip]) -> Vec<StopRef> {
    let mut by_length: Vec<&Trip> = trips.iter().collect();
    by_length.sort_by_key(|trip| std::cmp::Reverse(trip.stops.len()));

    let mut row: Vec<StopRef> = Vec::new();
    for trip in by_length {
        let visits: Vec<StopRef> = trip.stops.iter().map(StopRef::from).collect();
        row = lcs_diff(&row, &visits)
            .into_iter()
            .map(|(_, stop)| stop)
            .collect();
    }
    row
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::tests::{stop, trip};

    use super::*;

    #[test]
    fn orders_rows_by_the_order_trips_visit_them() {
        let a = trip(vec![stop("x", None, Some(0)), stop("y", Some(10), None)]);
        let b = trip(vec![
            stop("x", None, Some(0)),
            stop("y", Some(5), Some(5)),
            stop("z", Some(15), None),
        ]);
        let rows = order(&[a, b]);
        let codes: Vec<_> = rows.iter().map(|r| r.stop_code.clone().unwrap()).collect();
        assert_eq!(codes, vec!["x", "y", "z"]);
    }

    #[test]
    fn falls_back_to_lcs_splice_when_a_trip_loops() {
        let looped = trip(vec![
            stop("x", None, Some(0)),
            stop("y", Some(10), Some(10)),
            stop("x", Some(20), None),
        ]);
        let conflicting = trip(vec![stop("y", None, Some(0)), stop("x", Some(10), None)]);
        let rows = order(&[looped, conflicting]);
        // both stops still appear; no panic despite the cyclic visit graph
        let codes: HashSet<_> = rows.iter().map(|r| r.stop_code.clone().unwrap()).collect();
        assert!(codes.contains("x"));
        assert!(codes.contains("y"));
    }
}
