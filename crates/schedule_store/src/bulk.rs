//! Chunked multi-row INSERT, the way the realtime store in this codebase
//! avoids exceeding Postgres's bind-parameter limit on a single statement.

use std::fmt::Write as _;

use sqlx::{postgres::PgArguments, query::Query, Acquire, Postgres};

use crate::error::{convert_error, Result};

pub const BULK_INSERT_MAX: usize = 999;

/// Inserts `values` into `table`, chunked so that no single statement binds
/// more than [`BULK_INSERT_MAX`] parameters. `bind` appends one row's worth
/// of values to the statement.
pub async fn insert_all<'c, A, T, B>(
    executor: A,
    table: &str,
    columns: &[&str],
    values: &[T],
    bind: B,
) -> Result<()>
where
    A: Acquire<'c, Database = Postgres> + Send,
    for<'a> B: Fn(Query<'a, Postgres, PgArguments>, &T) -> Query<'a, Postgres, PgArguments>,
{
    let mut conn = executor.acquire().await.map_err(convert_error)?;
    let rows_per_chunk = (BULK_INSERT_MAX / columns.len().max(1)).max(1);

    for chunk in values.chunks(rows_per_chunk) {
        let mut sql = format!("INSERT INTO {table} ({}) VALUES ", columns.join(", "));
        let mut placeholder = 1;
        for (i, _) in chunk.iter().enumerate() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push('(');
            for j in 0..columns.len() {
                if j > 0 {
                    sql.push_str(", ");
                }
                write!(&mut sql, "${placeholder}").unwrap();
                placeholder += 1;
            }
            sql.push(')');
        }
        sql.push(';');

        let mut statement = sqlx::query::<Postgres>(&sql);
        for value in chunk {
            statement = bind(statement, value);
        }
        statement.execute(&mut *conn).await.map_err(convert_error)?;
    }
    Ok(())
}
