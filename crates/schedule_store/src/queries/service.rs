use model::{operator::Operator, service::Service};
use sqlx::{Acquire, Executor, Postgres};
use utility::id::Id;

use crate::error::{convert_error, Result};

pub async fn get_or_create<'c, A>(
    executor: A,
    line_name: &str,
    operator_id: Option<Id<Operator>>,
    unique_service_code: Option<&str>,
) -> Result<Id<Service>>
where
    A: Acquire<'c, Database = Postgres> + Send,
{
    let mut conn = executor.acquire().await.map_err(convert_error)?;
    let operator_code = operator_id.map(|id| id.raw());

    if let Some(code) = unique_service_code {
        if let Some((id,)) = sqlx::query_as::<_, (i32,)>(
            "SELECT id FROM services WHERE unique_service_code = $1;",
        )
        .bind(code)
        .fetch_optional(&mut *conn)
        .await
        .map_err(convert_error)?
        {
            return Ok(Id::new(id));
        }
    }

    let (id,) = sqlx::query_as::<_, (i32,)>(
        "
        INSERT INTO services (line_name, operator_code, current, unique_service_code)
        VALUES ($1, $2, TRUE, $3)
        RETURNING id;
        ",
    )
    .bind(line_name)
    .bind(&operator_code)
    .bind(unique_service_code)
    .fetch_one(&mut *conn)
    .await
    .map_err(convert_error)?;

    Ok(Id::new(id))
}

pub async fn mark_without_current_routes_as_not_current<'c, E>(executor: E) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query(
        "
        UPDATE services
        SET current = FALSE
        WHERE id NOT IN (
            SELECT DISTINCT service_id FROM routes WHERE NOT deleted
        );
        ",
    )
    .execute(executor)
    .await
    .map_err(convert_error)?;
    Ok(())
}
