use model::{note::Note, route::Route, trip::Trip};
use sqlx::{Acquire, Executor, Postgres};
use utility::id::Id;

use crate::{
    error::{convert_error, Result},
    row::{NoteRow, StopTimeRow, TripRow},
};

pub async fn notes_for_trip<'c, E>(executor: E, trip_id: Id<Trip>) -> Result<Vec<Note>>
where
    E: Executor<'c, Database = Postgres>,
{
    let rows = sqlx::query_as::<_, NoteRow>(
        "
        SELECT notes.id, notes.code, notes.text
        FROM notes JOIN trip_notes ON trip_notes.note_id = notes.id
        WHERE trip_notes.trip_id = $1
        ORDER BY notes.code;
        ",
    )
    .bind(trip_id.raw())
    .fetch_all(executor)
    .await
    .map_err(convert_error)?;

    Ok(rows.iter().map(NoteRow::to_model).collect())
}

pub async fn for_route<'c, A>(executor: A, route_id: Id<Route>) -> Result<Vec<(Id<Trip>, Trip)>>
where
    A: Acquire<'c, Database = Postgres> + Send,
{
    let mut conn = executor.acquire().await.map_err(convert_error)?;

    let trip_rows = sqlx::query_as::<_, TripRow>(
        "
        SELECT id, route_id, calendar_id, inbound, start_seconds, end_seconds, destination_stop,
               ticket_machine_code, vehicle_journey_code, block_id, vehicle_type_id, garage_id,
               operator_code, journey_pattern
        FROM trips WHERE route_id = $1 ORDER BY id;
        ",
    )
    .bind(route_id.raw())
    .fetch_all(&mut *conn)
    .await
    .map_err(convert_error)?;

    let mut out = Vec::with_capacity(trip_rows.len());
    for row in trip_rows {
        let stop_rows = sqlx::query_as::<_, StopTimeRow>(
            "
            SELECT trip_id, sequence, stop_id, stop_code, arrival_seconds, departure_seconds,
                   timing_status, pick_up, set_down
            FROM stop_times WHERE trip_id = $1 ORDER BY sequence;
            ",
        )
        .bind(row.id)
        .fetch_all(&mut *conn)
        .await
        .map_err(convert_error)?;

        let stops = stop_rows.iter().map(StopTimeRow::to_model).collect();
        out.push((Id::new(row.id), row.to_model(stops)));
    }

    Ok(out)
}
