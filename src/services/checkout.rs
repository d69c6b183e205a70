use deadpool_postgres::Pool;

use crate::{
    error::Result,
    models::checkout::{CheckoutRecord, NewCheckout},
    repositories::checkout as checkout_repo,
    validation::checkout::{validate_checkout, validate_history_query, CheckoutRequest, HistoryQuery},
};

/// Validates and records a checkout.
///
/// Nothing touches the database unless validation passes.
///
/// # Returns
///
/// A `Result` containing the stored checkout and its new identifier.
pub async fn record_checkout(db: &Pool, request: CheckoutRequest) -> Result<(i64, NewCheckout)> {
    let checkout = validate_checkout(request)?;
    let id = checkout_repo::create(db, &checkout).await?;

    tracing::info!(
        "✅ Checkout {} recorded: {} with {} (by {})",
        id,
        checkout.student_name,
        checkout.guardian_name,
        checkout.attendant_name
    );

    Ok((id, checkout))
}

/// Lists the checkout history matching the raw query parameters.
pub async fn history(db: &Pool, query: HistoryQuery) -> Result<Vec<CheckoutRecord>> {
    let filter = validate_history_query(query)?;
    tracing::debug!("📜 History lookup: {:?}", filter);
    checkout_repo::query(db, &filter).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::repositories::checkout::test_support;
    use axum::response::IntoResponse;

    fn request(attendant: Option<&str>) -> CheckoutRequest {
        CheckoutRequest {
            student_name: Some("Ana Silva".to_string()),
            guardian_name: Some("Joana Silva".to_string()),
            checkout_at: Some("2024-05-01T14:30".to_string()),
            attendant_name: attendant.map(str::to_string),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_invalid_checkout_never_reaches_the_database() {
        // Nothing listens here; any database access would surface as a pool error.
        let pool = crate::db::create_pool("postgres://desk@127.0.0.1:1/pickup").unwrap();

        let result = record_checkout(&pool, request(None)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));

        let result = history(
            &pool,
            HistoryQuery {
                student_name: None,
                date: Some("not-a-date".to_string()),
            },
        )
        .await;
        assert!(matches!(result, Err(AppError::Parse(_))));
    }

    #[tokio::test]
    async fn test_oversized_attendant_is_a_bad_request() {
        let pool = crate::db::create_pool("postgres://desk@127.0.0.1:1/pickup").unwrap();
        let attendant = "R".repeat(101);

        let err = record_checkout(&pool, request(Some(&attendant)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(
            err.into_response().status(),
            axum::http::StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_missing_attendant_leaves_row_count_unchanged() {
        let Some((pool, _guard)) = test_support::pool().await else {
            eprintln!("TEST_DATABASE_URL not set; skipping");
            return;
        };

        record_checkout(&pool, request(Some("Rosa"))).await.unwrap();
        let before = checkout_repo::count(&pool).await.unwrap();

        let result = record_checkout(&pool, request(Some("  "))).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(checkout_repo::count(&pool).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_recorded_checkout_appears_in_history() {
        let Some((pool, _guard)) = test_support::pool().await else {
            eprintln!("TEST_DATABASE_URL not set; skipping");
            return;
        };

        let (id, stored) = record_checkout(&pool, request(Some("Rosa"))).await.unwrap();
        let records = history(&pool, HistoryQuery::default()).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, id);
        assert_eq!(records[0].checkout_at, stored.checkout_at);
        assert_eq!(records[0].attendant_name, "Rosa");
    }
}
