use model::operator::{Operator, OperatorCode};
use sqlx::{Executor, Postgres};

use crate::{
    error::{convert_error, Result},
    row::{OperatorCodeRow, OperatorRow},
};

pub async fn by_code<'c, E>(executor: E, code: &str) -> Result<Option<Operator>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, OperatorRow>(
        "SELECT code, name, licence_number FROM operators WHERE code = $1;",
    )
    .bind(code)
    .fetch_optional(executor)
    .await
    .map_err(convert_error)
    .map(|row| row.map(OperatorRow::to_model))
}

pub async fn by_licence_number<'c, E>(executor: E, licence_number: &str) -> Result<Option<Operator>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, OperatorRow>(
        "SELECT code, name, licence_number FROM operators WHERE licence_number = $1;",
    )
    .bind(licence_number)
    .fetch_optional(executor)
    .await
    .map_err(convert_error)
    .map(|row| row.map(OperatorRow::to_model))
}

pub async fn by_name<'c, E>(executor: E, name: &str) -> Result<Option<Operator>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, OperatorRow>(
        "SELECT code, name, licence_number FROM operators WHERE lower(name) = lower($1);",
    )
    .bind(name)
    .fetch_optional(executor)
    .await
    .map_err(convert_error)
    .map(|row| row.map(OperatorRow::to_model))
}

/// The region-local alias entry for `code`, if one is on record.
pub async fn code_mapping<'c, E>(executor: E, code: &str) -> Result<Option<OperatorCode>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as::<_, OperatorCodeRow>(
        "SELECT code, operator_code FROM operator_codes WHERE code = $1;",
    )
    .bind(code)
    .fetch_optional(executor)
    .await
    .map_err(convert_error)
    .map(|row| row.map(OperatorCodeRow::to_model))
}

pub async fn upsert<'c, E>(executor: E, operator: &Operator) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query(
        "
        INSERT INTO operators (code, name, licence_number)
        VALUES ($1, $2, $3)
        ON CONFLICT (code) DO UPDATE SET
            name = COALESCE(EXCLUDED.name, operators.name),
            licence_number = COALESCE(EXCLUDED.licence_number, operators.licence_number);
        ",
    )
    .bind(&operator.code)
    .bind(&operator.name)
    .bind(&operator.licence_number)
    .execute(executor)
    .await
    .map_err(convert_error)?;
    Ok(())
}
