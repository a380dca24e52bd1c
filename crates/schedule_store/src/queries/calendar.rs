use model::calendar::Calendar;
use sqlx::{Acquire, Postgres};
use utility::id::Id;

use crate::{
    error::{convert_error, Result},
    row::{bank_holiday_column, CalendarBankHolidayRow, CalendarDateRow, CalendarRow},
};

pub async fn by_id<'c, A>(executor: A, id: Id<Calendar>) -> Result<Option<Calendar>>
where
    A: Acquire<'c, Database = Postgres> + Send,
{
    let mut conn = executor.acquire().await.map_err(convert_error)?;

    let Some(row) = sqlx::query_as::<_, CalendarRow>(
        "
        SELECT id, content_hash, mon, tue, wed, thu, fri, sat, sun, start_date, end_date, summary
        FROM calendars WHERE id = $1;
        ",
    )
    .bind(id.raw())
    .fetch_optional(&mut *conn)
    .await
    .map_err(convert_error)?
    else {
        return Ok(None);
    };

    let dates = sqlx::query_as::<_, CalendarDateRow>(
        "
        SELECT start_date, end_date, operation, special, summary
        FROM calendar_dates WHERE calendar_id = $1;
        ",
    )
    .bind(id.raw())
    .fetch_all(&mut *conn)
    .await
    .map_err(convert_error)?
    .iter()
    .map(CalendarDateRow::to_model)
    .collect();

    let bank_holidays = sqlx::query_as::<_, CalendarBankHolidayRow>(
        "SELECT bank_holiday, operation FROM calendar_bank_holidays WHERE calendar_id = $1;",
    )
    .bind(id.raw())
    .fetch_all(&mut *conn)
    .await
    .map_err(convert_error)?
    .iter()
    .filter_map(CalendarBankHolidayRow::to_model)
    .collect();

    Ok(Some(row.to_model(dates, bank_holidays)))
}

pub async fn get_or_create<'c, A>(
    executor: A,
    content_hash: u64,
    calendar: &Calendar,
) -> Result<Id<Calendar>>
where
    A: Acquire<'c, Database = Postgres> + Send,
{
    let mut conn = executor.acquire().await.map_err(convert_error)?;
    let content_hash = content_hash as i64;

    if let Some((id,)) = sqlx::query_as::<_, (i32,)>(
        "SELECT id FROM calendars WHERE content_hash = $1;",
    )
    .bind(content_hash)
    .fetch_optional(&mut *conn)
    .await
    .map_err(convert_error)?
    {
        return Ok(Id::new(id));
    }

    let (id,) = sqlx::query_as::<_, (i32,)>(
        "
        INSERT INTO calendars
            (content_hash, mon, tue, wed, thu, fri, sat, sun, start_date, end_date, summary)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING id;
        ",
    )
    .bind(content_hash)
    .bind(calendar.mon)
    .bind(calendar.tue)
    .bind(calendar.wed)
    .bind(calendar.thu)
    .bind(calendar.fri)
    .bind(calendar.sat)
    .bind(calendar.sun)
    .bind(calendar.start_date)
    .bind(calendar.end_date)
    .bind(calendar.summary_text())
    .fetch_one(&mut *conn)
    .await
    .map_err(convert_error)?;

    for date in &calendar.dates {
        sqlx::query(
            "
            INSERT INTO calendar_dates (calendar_id, start_date, end_date, operation, special, summary)
            VALUES ($1, $2, $3, $4, $5, $6);
            ",
        )
        .bind(id)
        .bind(date.start_date)
        .bind(date.end_date)
        .bind(date.operation)
        .bind(date.special)
        .bind(&date.summary)
        .execute(&mut *conn)
        .await
        .map_err(convert_error)?;
    }

    for bank_holiday in &calendar.bank_holidays {
        sqlx::query(
            "
            INSERT INTO calendar_bank_holidays (calendar_id, bank_holiday, operation)
            VALUES ($1, $2, $3);
            ",
        )
        .bind(id)
        .bind(bank_holiday_column(bank_holiday.bank_holiday))
        .bind(bank_holiday.operation)
        .execute(&mut *conn)
        .await
        .map_err(convert_error)?;
    }

    Ok(Id::new(id))
}
