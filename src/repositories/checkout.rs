use deadpool_postgres::Pool;

use crate::{
    error::Result,
    models::checkout::{CheckoutRecord, HistoryFilter, NewCheckout},
};

/// Inserts a checkout and returns the identifier assigned by the database.
///
/// The checkout log is append-only; this module never updates or deletes rows.
pub async fn create(pool: &Pool, checkout: &NewCheckout) -> Result<i64> {
    let client = pool.get().await?;
    let statement = client
        .prepare_cached(
            r#"
            INSERT INTO checkout_records
                (student_name, guardian_name, checkout_at, attendant_name, notes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .await?;

    let row = client
        .query_one(
            &statement,
            &[
                &checkout.student_name,
                &checkout.guardian_name,
                &checkout.checkout_at,
                &checkout.attendant_name,
                &checkout.notes,
            ],
        )
        .await?;

    Ok(row.get("id"))
}

/// Lists checkouts matching `filter`, most recent first.
pub async fn query(pool: &Pool, filter: &HistoryFilter) -> Result<Vec<CheckoutRecord>> {
    let client = pool.get().await?;
    let statement = client
        .prepare_cached(
            r#"
            SELECT id, student_name, guardian_name, checkout_at, attendant_name,
                   notes, recorded_at
            FROM checkout_records
            WHERE ($1::TEXT IS NULL OR strpos(lower(student_name), lower($1::TEXT)) > 0)
              AND ($2::DATE IS NULL OR checkout_at::DATE = $2::DATE)
            ORDER BY checkout_at DESC, id DESC
            "#,
        )
        .await?;

    let rows = client
        .query(&statement, &[&filter.student_name, &filter.date])
        .await?;

    Ok(rows.iter().map(CheckoutRecord::from).collect())
}

/// Counts every recorded checkout.
pub async fn count(pool: &Pool) -> Result<i64> {
    let client = pool.get().await?;
    let row = client
        .query_one("SELECT COUNT(*) AS total FROM checkout_records", &[])
        .await?;
    Ok(row.get("total"))
}
