use model::{
    block::{Block, Garage, VehicleType},
    note::Note,
};
use sqlx::{Acquire, Postgres};
use utility::id::Id;

use crate::error::{convert_error, Result};

macro_rules! get_or_create_by_code {
    ($name:ident, $table:literal, $model:ty) => {
        pub async fn $name<'c, A>(executor: A, code: &str) -> Result<Id<$model>>
        where
            A: Acquire<'c, Database = Postgres> + Send,
        {
            let mut conn = executor.acquire().await.map_err(convert_error)?;

            if let Some((id,)) = sqlx::query_as::<_, (i32,)>(
                concat!("SELECT id FROM ", $table, " WHERE code = $1;"),
            )
            .bind(code)
            .fetch_optional(&mut *conn)
            .await
            .map_err(convert_error)?
            {
                return Ok(Id::new(id));
            }

            let (id,) = sqlx::query_as::<_, (i32,)>(concat!(
                "INSERT INTO ",
                $table,
                " (code) VALUES ($1) ON CONFLICT (code) DO UPDATE SET code = EXCLUDED.code RETURNING id;"
            ))
            .bind(code)
            .fetch_one(&mut *conn)
            .await
            .map_err(convert_error)?;

            Ok(Id::new(id))
        }
    };
}

get_or_create_by_code!(get_or_create_block, "blocks", Block);
get_or_create_by_code!(get_or_create_garage, "garages", Garage);
get_or_create_by_code!(get_or_create_vehicle_type, "vehicle_types", VehicleType);

pub async fn get_or_create_note<'c, A>(executor: A, code: &str, text: &str) -> Result<Id<Note>>
where
    A: Acquire<'c, Database = Postgres> + Send,
{
    let mut conn = executor.acquire().await.map_err(convert_error)?;

    if let Some((id,)) = sqlx::query_as::<_, (i32,)>(
        "SELECT id FROM notes WHERE code = $1 AND text = $2;",
    )
    .bind(code)
    .bind(text)
    .fetch_optional(&mut *conn)
    .await
    .map_err(convert_error)?
    {
        return Ok(Id::new(id));
    }

    let (id,) = sqlx::query_as::<_, (i32,)>(
        "
        INSERT INTO notes (code, text) VALUES ($1, $2)
        ON CONFLICT (code, text) DO UPDATE SET code = EXCLUDED.code
        RETURNING id;
        ",
    )
    .bind(code)
    .bind(text)
    .fetch_one(&mut *conn)
    .await
    .map_err(convert_error)?;

    Ok(Id::new(id))
}
