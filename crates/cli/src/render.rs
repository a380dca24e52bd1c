//! Plain-text rendering of a [`Grouping`]: stop rows down the side, one
//! column per displayed journey, a repetition cell spelled out as "then
//! every N mins", and note codes footed under the columns they apply to.

use chrono::Duration;
use matrix::{headway::ColumnSpan, notes, Grouping, StopRef};
use model::note::Note;

fn clock(duration: Duration) -> String {
    let minutes = duration.num_minutes();
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

fn row_label(row: &StopRef) -> String {
    row.stop_id
        .as_ref()
        .map(|id| id.raw())
        .or_else(|| row.stop_code.clone())
        .unwrap_or_default()
}

fn time_at(span: &ColumnSpan, row: &StopRef, is_top_row: bool) -> String {
    match span {
        ColumnSpan::Single(leg) => leg
            .trip
            .stops
            .iter()
            .find(|stop| &StopRef::from(*stop) == row)
            .and_then(|stop| stop.departure.or(stop.arrival))
            .map(clock)
            .unwrap_or_default(),
        ColumnSpan::Repetition { delta, .. } if is_top_row => {
            format!("then every {} mins", delta.num_minutes())
        }
        ColumnSpan::Repetition { .. } => String::new(),
    }
}

/// The per-column line names, when the grouping mixes more than one route.
fn head_row(grouping: &Grouping) -> Option<Vec<String>> {
    if notes::heads(&grouping.columns).len() <= 1 {
        return None;
    }
    let mut previous = String::new();
    Some(
        grouping
            .columns
            .iter()
            .map(|span| {
                if let ColumnSpan::Single(leg) = span {
                    previous = leg.line_name.clone();
                }
                previous.clone()
            })
            .collect(),
    )
}

/// Per-column note codes plus the legend of notes they stand for.
fn foot_row(grouping: &Grouping) -> (Vec<String>, Vec<Note>) {
    let mut cells = Vec::with_capacity(grouping.columns.len());
    let mut legend: Vec<Note> = Vec::new();
    for span in notes::feet(&grouping.columns) {
        let code = match &span.value {
            Some(note) => {
                if !legend.contains(note) {
                    legend.push(note.clone());
                }
                note.code.clone()
            }
            None => String::new(),
        };
        cells.extend(std::iter::repeat(code).take(span.columns));
    }
    (cells, legend)
}

pub fn render(grouping: &Grouping) -> String {
    let labels: Vec<String> = grouping.rows.iter().map(row_label).collect();
    let mut table: Vec<Vec<String>> = Vec::new();

    if let Some(heads) = head_row(grouping) {
        let mut row = vec![String::new()];
        row.extend(heads);
        table.push(row);
    }

    for (index, stop_row) in grouping.rows.iter().enumerate() {
        let mut row = vec![labels[index].clone()];
        for span in &grouping.columns {
            row.push(time_at(span, stop_row, index == 0));
        }
        table.push(row);
    }

    let (feet, legend) = foot_row(grouping);
    if feet.iter().any(|cell| !cell.is_empty()) {
        let mut row = vec![String::new()];
        row.extend(feet);
        table.push(row);
    }

    let columns = table.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|column| {
            table
                .iter()
                .filter_map(|row| row.get(column))
                .map(String::len)
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    for row in &table {
        let line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(column, cell)| format!("{cell:>width$}", width = widths[column]))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    for note in legend {
        out.push_str(&format!("{}  {}\n", note.code, note.text));
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use matrix::{build_grouping, Leg};
    use model::trip::{StopTime, TimingStatus, Trip};
    use utility::id::Id;

    use super::*;

    fn stop(code: &str, arrival: Option<i64>, departure: Option<i64>) -> StopTime {
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

    fn leg(start_minutes: i64) -> Leg {
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
            stops: vec![
                stop("alpha", None, Some(start_minutes)),
                stop("beta", Some(start_minutes + 15), None),
            ],
        };
        trip.recompute_extent();
        Leg {
            route_id: Id::new(1),
            line_name: "1".to_owned(),
            operator_id: None,
            trip,
            notes: vec![],
        }
    }

    #[test]
    fn renders_one_row_per_stop_with_times_in_columns() {
        let grouping = build_grouping(vec![leg(8 * 60), leg(9 * 60)]);
        let text = render(&grouping);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("alpha"));
        assert!(lines[0].contains("08:00"));
        assert!(lines[0].contains("09:00"));
        assert!(lines[1].contains("beta"));
        assert!(lines[1].contains("08:15"));
    }
}
