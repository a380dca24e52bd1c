use model::stop::Stop;
use sqlx::{Acquire, Executor, Postgres};
use utility::id::Id;

use crate::{
    error::{convert_error, Result},
    row::StopRow,
};

pub async fn by_atco_code<'c, E>(executor: E, atco_code: &str) -> Result<Option<Id<Stop>>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, (String,)>("SELECT atco_code FROM stops WHERE atco_code = $1;")
        .bind(atco_code)
        .fetch_optional(executor)
        .await
        .map_err(convert_error)
        .map(|row| row.map(|(code,)| Id::new(code)))
}

pub async fn upsert_many<'c, A>(executor: A, stops: &[Stop]) -> Result<()>
where
    A: Acquire<'c, Database = Postgres> + Send,
{
    let mut conn = executor.acquire().await.map_err(convert_error)?;
    for stop in stops {
        let row = StopRow::from_model(stop);
        sqlx::query(
            "
            INSERT INTO stops (atco_code, common_name, latitude, longitude, active)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (atco_code) DO UPDATE SET
                common_name = COALESCE(EXCLUDED.common_name, stops.common_name),
                latitude = COALESCE(EXCLUDED.latitude, stops.latitude),
                longitude = COALESCE(EXCLUDED.longitude, stops.longitude);
            ",
        )
        .bind(&row.atco_code)
        .bind(&row.common_name)
        .bind(row.latitude)
        .bind(row.longitude)
        .bind(row.active)
        .execute(&mut *conn)
        .await
        .map_err(convert_error)?;
    }
    Ok(())
}

pub async fn reactivate_referenced<'c, E>(executor: E) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query(
        "
        UPDATE stops
        SET active = TRUE
        WHERE atco_code IN (
            SELECT DISTINCT stop_id FROM stop_times
            JOIN trips ON trips.id = stop_times.trip_id
            JOIN routes ON routes.id = trips.route_id
            WHERE NOT routes.deleted AND stop_times.stop_id IS NOT NULL
        );
        ",
    )
    .execute(executor)
    .await
    .map_err(convert_error)?;
    Ok(())
}
