use model::source::Source;
use sqlx::{Acquire, Executor, Postgres};
use utility::id::Id;

use crate::{
    error::{convert_error, Result},
    row::SourceRow,
};

pub async fn get_or_create<'c, A>(executor: A, name: &str) -> Result<(Id<Source>, Source)>
where
    A: Acquire<'c, Database = Postgres> + Send,
{
    let mut conn = executor.acquire().await.map_err(convert_error)?;

    if let Some(row) = sqlx::query_as::<_, SourceRow>(
        "SELECT id, name, url, datetime, sha1, settings, complete FROM sources WHERE name = $1;",
    )
    .bind(name)
    .fetch_optional(&mut *conn)
    .await
    .map_err(convert_error)?
    {
        return Ok((Id::new(row.id), row.to_model()));
    }

    let row = sqlx::query_as::<_, SourceRow>(
        "
        INSERT INTO sources (name, datetime, complete)
        VALUES ($1, now(), FALSE)
        RETURNING id, name, url, datetime, sha1, settings, complete;
        ",
    )
    .bind(name)
    .fetch_one(&mut *conn)
    .await
    .map_err(convert_error)?;

    Ok((Id::new(row.id), row.to_model()))
}

/// The Source (other than `excluding`) that already ingested an archive
/// with this content hash, if any.
pub async fn by_sha1<'c, E>(
    executor: E,
    sha1: &str,
    excluding: Id<Source>,
) -> Result<Option<(Id<Source>, String)>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, (i32, String)>(
        "SELECT id, name FROM sources WHERE sha1 = $1 AND id <> $2;",
    )
    .bind(sha1)
    .bind(excluding.raw())
    .fetch_optional(executor)
    .await
    .map_err(convert_error)
    .map(|row| row.map(|(id, name)| (Id::new(id), name)))
}

/// Whether a *complete* Source other than `excluding` currently claims a
/// Route with this line name.
pub async fn complete_claims_line<'c, E>(
    executor: E,
    excluding: Id<Source>,
    line_name: &str,
) -> Result<bool>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, (bool,)>(
        "
        SELECT EXISTS (
            SELECT 1 FROM routes
            JOIN sources ON sources.id = routes.source_id
            WHERE sources.complete AND sources.id <> $1
              AND routes.line_name = $2 AND NOT routes.deleted
        );
        ",
    )
    .bind(excluding.raw())
    .bind(line_name)
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .map(|(exists,)| exists)
}

pub async fn update<'c, E>(executor: E, id: Id<Source>, source: &Source) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query(
        "
        UPDATE sources
        SET url = $1, datetime = $2, sha1 = $3, settings = $4, complete = $5
        WHERE id = $6;
        ",
    )
    .bind(&source.url)
    .bind(source.datetime)
    .bind(&source.sha1)
    .bind(
        source
            .settings
            .as_ref()
            .and_then(|settings| serde_json::to_value(settings).ok()),
    )
    .bind(source.complete)
    .bind(id.raw())
    .execute(executor)
    .await
    .map_err(convert_error)?;
    Ok(())
}
