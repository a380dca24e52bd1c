use chrono::NaiveDate;
use model::{route::Route, service::Service, source::Source, trip::TimingStatus};
use schedule_ir::{IntermediateRoute, IntermediateTrip};
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use utility::id::Id;

use crate::{
    bulk,
    error::{convert_error, Result},
    queries::{calendar, reference},
    row::RouteRow,
};

pub async fn by_source_and_code<'c, E>(
    executor: E,
    source_id: Id<Source>,
    code: &str,
) -> Result<Option<Route>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, RouteRow>(
        "
        SELECT id, source_id, service_id, code, line_name, line_brand, revision_number,
               start_date, end_date, outbound_description, inbound_description
        FROM routes WHERE source_id = $1 AND code = $2 AND NOT deleted;
        ",
    )
    .bind(source_id.raw())
    .bind(code)
    .fetch_optional(executor)
    .await
    .map_err(convert_error)
    .map(|row| row.map(|r| r.to_model()))
}

pub async fn by_id<'c, E>(executor: E, route_id: Id<Route>) -> Result<Option<Route>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, RouteRow>(
        "
        SELECT id, source_id, service_id, code, line_name, line_brand, revision_number,
               start_date, end_date, outbound_description, inbound_description
        FROM routes WHERE id = $1 AND NOT deleted;
        ",
    )
    .bind(route_id.raw())
    .fetch_optional(executor)
    .await
    .map_err(convert_error)
    .map(|row| row.map(|r| r.to_model()))
}

pub async fn for_source_on_date<'c, E>(
    executor: E,
    source_id: Id<Source>,
    on_date: NaiveDate,
) -> Result<Vec<(Id<Route>, Route)>>
where
    E: Executor<'c, Database = Postgres>,
{
    let rows = sqlx::query_as::<_, RouteRow>(
        "
        SELECT id, source_id, service_id, code, line_name, line_brand, revision_number,
               start_date, end_date, outbound_description, inbound_description
        FROM routes
        WHERE source_id = $1 AND NOT deleted
          AND start_date <= $2 AND (end_date IS NULL OR end_date >= $2);
        ",
    )
    .bind(source_id.raw())
    .bind(on_date)
    .fetch_all(executor)
    .await
    .map_err(convert_error)?;

    Ok(rows
        .into_iter()
        .map(|row| (Id::new(row.id), row.to_model()))
        .collect())
}

fn timing_status_code(status: TimingStatus) -> i16 {
    match status {
        TimingStatus::Principal => 0,
        TimingStatus::Other => 1,
        TimingStatus::Info => 2,
    }
}

/// Replaces a route's trips, keeping trip identity where possible: if the
/// route already exists with the same trip count and the same ordered
/// `start` offsets, the existing trip rows are updated in place; otherwise
/// they're deleted and reinserted.
pub async fn replace<'c, A>(
    executor: A,
    source_id: Id<Source>,
    service_id: Id<Service>,
    route: IntermediateRoute,
) -> Result<Id<Route>>
where
    A: Acquire<'c, Database = Postgres> + Send,
{
    let mut conn = executor.acquire().await.map_err(convert_error)?;

    let existing = sqlx::query_as::<_, (i32,)>(
        "SELECT id FROM routes WHERE source_id = $1 AND code = $2;",
    )
    .bind(source_id.raw())
    .bind(&route.code)
    .fetch_optional(&mut *conn)
    .await
    .map_err(convert_error)?;

    let route_id = if let Some((id,)) = existing {
        sqlx::query(
            "
            UPDATE routes
            SET service_id = $1, line_name = $2, line_brand = $3, revision_number = $4,
                start_date = $5, end_date = $6, outbound_description = $7,
                inbound_description = $8, deleted = FALSE
            WHERE id = $9;
            ",
        )
        .bind(service_id.raw())
        .bind(&route.line_name)
        .bind(&route.line_brand)
        .bind(route.revision_number)
        .bind(route.start_date)
        .bind(route.end_date)
        .bind(&route.outbound_description)
        .bind(&route.inbound_description)
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(convert_error)?;
        id
    } else {
        let (id,) = sqlx::query_as::<_, (i32,)>(
            "
            INSERT INTO routes
                (source_id, service_id, code, line_name, line_brand, revision_number,
                 start_date, end_date, outbound_description, inbound_description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id;
            ",
        )
        .bind(source_id.raw())
        .bind(service_id.raw())
        .bind(&route.code)
        .bind(&route.line_name)
        .bind(&route.line_brand)
        .bind(route.revision_number)
        .bind(route.start_date)
        .bind(route.end_date)
        .bind(&route.outbound_description)
        .bind(&route.inbound_description)
        .fetch_one(&mut *conn)
        .await
        .map_err(convert_error)?;
        id
    };

    let existing_starts: Vec<i64> = sqlx::query_as::<_, (i64,)>(
        "SELECT start_seconds FROM trips WHERE route_id = $1 ORDER BY id;",
    )
    .bind(route_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(convert_error)?
    .into_iter()
    .map(|(s,)| s)
    .collect();

    let new_starts: Vec<i64> = route.trips.iter().map(|t| t.start.num_seconds()).collect();

    let preserve_identity = existing_starts.len() == new_starts.len() && existing_starts == new_starts;

    if preserve_identity {
        let ids: Vec<i32> = sqlx::query_as::<_, (i32,)>(
            "SELECT id FROM trips WHERE route_id = $1 ORDER BY id;",
        )
        .bind(route_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(convert_error)?
        .into_iter()
        .map(|(id,)| id)
        .collect();

        for (trip_id, trip) in ids.into_iter().zip(route.trips.into_iter()) {
            let calendar_id =
                calendar::get_or_create(&mut *conn, trip.calendar.content_hash(), &trip.calendar.to_model())
                    .await?;
            let working = resolve_workings(&mut conn, &trip).await?;

            sqlx::query(
                "
                UPDATE trips
                SET calendar_id = $1, inbound = $2, start_seconds = $3, end_seconds = $4,
                    destination_stop = $5, ticket_machine_code = $6, vehicle_journey_code = $7,
                    journey_pattern = $8, block_id = $9, vehicle_type_id = $10, garage_id = $11,
                    operator_code = $12
                WHERE id = $13;
                ",
            )
            .bind(calendar_id.raw())
            .bind(trip.inbound)
            .bind(trip.start.num_seconds())
            .bind(trip.end.num_seconds())
            .bind(&trip.destination_ref)
            .bind(&trip.ticket_machine_code)
            .bind(&trip.vehicle_journey_code)
            .bind(&trip.journey_pattern)
            .bind(working.block_id)
            .bind(working.vehicle_type_id)
            .bind(working.garage_id)
            .bind(&trip.operator_ref)
            .bind(trip_id)
            .execute(&mut *conn)
            .await
            .map_err(convert_error)?;

            sqlx::query("DELETE FROM stop_times WHERE trip_id = $1;")
                .bind(trip_id)
                .execute(&mut *conn)
                .await
                .map_err(convert_error)?;

            insert_stop_times(&mut conn, trip_id, &trip).await?;
            replace_trip_notes(&mut conn, trip_id, &trip).await?;
        }
    } else {
        sqlx::query("DELETE FROM trips WHERE route_id = $1;")
            .bind(route_id)
            .execute(&mut *conn)
            .await
            .map_err(convert_error)?;

        for trip in route.trips {
            let calendar_id =
                calendar::get_or_create(&mut *conn, trip.calendar.content_hash(), &trip.calendar.to_model())
                    .await?;
            let working = resolve_workings(&mut conn, &trip).await?;

            let (trip_id,) = sqlx::query_as::<_, (i32,)>(
                "
                INSERT INTO trips
                    (route_id, calendar_id, inbound, start_seconds, end_seconds, destination_stop,
                     ticket_machine_code, vehicle_journey_code, journey_pattern, block_id,
                     vehicle_type_id, garage_id, operator_code)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
                RETURNING id;
                ",
            )
            .bind(route_id)
            .bind(calendar_id.raw())
            .bind(trip.inbound)
            .bind(trip.start.num_seconds())
            .bind(trip.end.num_seconds())
            .bind(&trip.destination_ref)
            .bind(&trip.ticket_machine_code)
            .bind(&trip.vehicle_journey_code)
            .bind(&trip.journey_pattern)
            .bind(working.block_id)
            .bind(working.vehicle_type_id)
            .bind(working.garage_id)
            .bind(&trip.operator_ref)
            .fetch_one(&mut *conn)
            .await
            .map_err(convert_error)?;

            insert_stop_times(&mut conn, trip_id, &trip).await?;
            replace_trip_notes(&mut conn, trip_id, &trip).await?;
        }
    }

    Ok(Id::new(route_id))
}

struct Workings {
    block_id: Option<i32>,
    vehicle_type_id: Option<i32>,
    garage_id: Option<i32>,
}

/// Resolves a trip's block/vehicle-type/garage codes to rows, creating them
/// on first sight.
async fn resolve_workings(conn: &mut PgConnection, trip: &IntermediateTrip) -> Result<Workings> {
    let mut workings = Workings {
        block_id: None,
        vehicle_type_id: None,
        garage_id: None,
    };
    if let Some(code) = trip.block_code.as_deref().filter(|code| !code.is_empty()) {
        workings.block_id = Some(reference::get_or_create_block(&mut *conn, code).await?.raw());
    }
    if let Some(code) = trip.vehicle_type_code.as_deref().filter(|code| !code.is_empty()) {
        workings.vehicle_type_id =
            Some(reference::get_or_create_vehicle_type(&mut *conn, code).await?.raw());
    }
    if let Some(code) = trip.garage_code.as_deref().filter(|code| !code.is_empty()) {
        workings.garage_id = Some(reference::get_or_create_garage(&mut *conn, code).await?.raw());
    }
    Ok(workings)
}

async fn insert_stop_times(conn: &mut PgConnection, trip_id: i32, trip: &IntermediateTrip) -> Result<()> {
    bulk::insert_all(
        &mut *conn,
        "stop_times",
        &[
            "trip_id",
            "sequence",
            "stop_id",
            "stop_code",
            "arrival_seconds",
            "departure_seconds",
            "timing_status",
            "pick_up",
            "set_down",
        ],
        &trip.stops,
        |query, stop| {
            query
                .bind(trip_id)
                .bind(stop.sequence)
                .bind(stop.stop_ref.clone())
                .bind(None::<String>)
                .bind(stop.arrival.map(|d| d.num_seconds()))
                .bind(stop.departure.map(|d| d.num_seconds()))
                .bind(timing_status_code(stop.timing_status))
                .bind(stop.pick_up)
                .bind(stop.set_down)
        },
    )
    .await
}

async fn replace_trip_notes(conn: &mut PgConnection, trip_id: i32, trip: &IntermediateTrip) -> Result<()> {
    sqlx::query("DELETE FROM trip_notes WHERE trip_id = $1;")
        .bind(trip_id)
        .execute(&mut *conn)
        .await
        .map_err(convert_error)?;

    for (code, text) in &trip.notes {
        let note_id = reference::get_or_create_note(&mut *conn, code, text).await?;
        sqlx::query(
            "INSERT INTO trip_notes (trip_id, note_id) VALUES ($1, $2) ON CONFLICT DO NOTHING;",
        )
        .bind(trip_id)
        .bind(note_id.raw())
        .execute(&mut *conn)
        .await
        .map_err(convert_error)?;
    }
    Ok(())
}

pub async fn delete_untouched<'c, E>(
    executor: E,
    source_id: Id<Source>,
    touched_codes: &[String],
) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query("UPDATE routes SET deleted = TRUE WHERE source_id = $1 AND NOT (code = ANY($2));")
        .bind(source_id.raw())
        .bind(touched_codes)
        .execute(executor)
        .await
        .map_err(convert_error)?;
    Ok(())
}
