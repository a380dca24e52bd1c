//! Column headings and footers. Heads identify each column's Route when a
//! grouping mixes several; feet group consecutive columns sharing a Note
//! into one spanning annotation, with empty spans filling the gaps.

use model::{note::Note, route::Route};
use utility::id::Id;

use crate::headway::ColumnSpan;

/// A cell spanning `columns` adjacent columns above or below the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span<T> {
    pub columns: usize,
    pub value: Option<T>,
}

/// The route displayed over each column, or `None` in a span-wide cell. A
/// repetition cell belongs to the same journey pattern as the columns either
/// side of it, so it inherits the preceding column's route.
fn route_per_column(columns: &[ColumnSpan]) -> Vec<Option<Id<Route>>> {
    let mut out = Vec::with_capacity(columns.len());
    let mut previous = None;
    for span in columns {
        let route_id = match span {
            ColumnSpan::Single(leg) => Some(leg.route_id),
            ColumnSpan::Repetition { .. } => previous,
        };
        previous = route_id;
        out.push(route_id);
    }
    out
}

/// Column headings. A grouping whose columns all come from one Route gets a
/// single empty span (there is nothing to distinguish); a mixed grouping
/// gets one head per run of consecutive same-Route columns.
pub fn heads(columns: &[ColumnSpan]) -> Vec<Span<Id<Route>>> {
    let routes = route_per_column(columns);
    let distinct: std::collections::HashSet<_> = routes.iter().flatten().collect();
    if distinct.len() <= 1 {
        return vec![Span {
            columns: columns.len(),
            value: None,
        }];
    }
    group_consecutive(routes)
}

/// Column footers: consecutive columns sharing a footnote collapse into one
/// spanning foot carrying that Note; columns without one become empty spans.
pub fn feet(columns: &[ColumnSpan]) -> Vec<Span<Note>> {
    let mut notes = Vec::with_capacity(columns.len());
    let mut previous: Option<Note> = None;
    for span in columns {
        let note = match span {
            ColumnSpan::Single(leg) => leg.notes.first().cloned(),
            ColumnSpan::Repetition { .. } => previous.clone(),
        };
        previous = note.clone();
        notes.push(note);
    }
    group_consecutive(notes)
}

fn group_consecutive<T: Clone + PartialEq>(values: Vec<Option<T>>) -> Vec<Span<T>> {
    let mut out: Vec<Span<T>> = Vec::new();
    for value in values {
        match out.last_mut() {
            Some(last) if last.value == value => last.columns += 1,
            _ => out.push(Span { columns: 1, value }),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use crate::tests::{leg, stop, trip};

    use super::*;

    fn column(route_id: i32, note: Option<Note>) -> ColumnSpan {
        let mut leg = leg(route_id, trip(vec![stop("a", None, Some(0))]));
        leg.notes.extend(note);
        ColumnSpan::Single(leg)
    }

    fn note(code: &str) -> Note {
        Note {
            code: code.to_owned(),
            text: format!("footnote {code}"),
        }
    }

    #[test]
    fn homogeneous_routes_collapse_to_a_single_empty_head() {
        let columns = vec![column(1, None), column(1, None), column(1, None)];
        assert_eq!(
            heads(&columns),
            vec![Span {
                columns: 3,
                value: None
            }]
        );
    }

    #[test]
    fn mixed_routes_get_one_head_per_run() {
        let columns = vec![column(1, None), column(1, None), column(2, None)];
        let heads = heads(&columns);
        assert_eq!(heads.len(), 2);
        assert_eq!(heads[0].columns, 2);
        assert_eq!(heads[0].value, Some(Id::new(1)));
        assert_eq!(heads[1].value, Some(Id::new(2)));
    }

    #[test]
    fn consecutive_columns_sharing_a_note_span_one_foot() {
        let columns = vec![
            column(1, Some(note("NS"))),
            column(1, Some(note("NS"))),
            column(1, None),
        ];
        let feet = feet(&columns);
        assert_eq!(feet.len(), 2);
        assert_eq!(feet[0].columns, 2);
        assert_eq!(feet[0].value, Some(note("NS")));
        assert_eq!(feet[1], Span { columns: 1, value: None });
    }

    #[test]
    fn a_repetition_cell_inherits_the_preceding_columns_foot() {
        let columns = vec![
            column(1, Some(note("NS"))),
            ColumnSpan::Repetition {
                count: 2,
                delta: chrono::Duration::minutes(20),
            },
            column(1, Some(note("NS"))),
        ];
        let feet = feet(&columns);
        assert_eq!(feet.len(), 1);
        assert_eq!(feet[0].columns, 3);
        assert_eq!(feet[0].value, Some(note("NS")));
    }
}
