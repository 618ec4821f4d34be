use async_trait::async_trait;

use crate::auth::UserId;
use crate::db::{classify, PgStore, Violation};
use crate::error::{ServiceError, ServiceResult};
use crate::history::repo_types::{IndicatorQuery, NewIndicatorQuery};

/// Append-only log of indicator lookups.
#[async_trait]
pub trait HistoryLedger: Send + Sync {
    /// Appends one row. `ForeignKeyViolation` if `retrieved_by` is not a user.
    async fn record(&self, query: NewIndicatorQuery) -> ServiceResult<IndicatorQuery>;

    /// All rows for `user_id`, most recent first. Empty when there are none.
    async fn list_for_user(&self, user_id: UserId) -> ServiceResult<Vec<IndicatorQuery>>;
}

#[async_trait]
impl HistoryLedger for PgStore {
    async fn record(&self, query: NewIndicatorQuery) -> ServiceResult<IndicatorQuery> {
        let result = sqlx::query_as::<_, IndicatorQuery>(
            r#"
            INSERT INTO indicator_history
                (indicator_name, value, value_date, source, retrieved_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, indicator_name, value, value_date, source, retrieved_by, retrieved_at
            "#,
        )
        .bind(query.indicator.as_str())
        .bind(query.value)
        .bind(query.value_date)
        .bind(&query.source)
        .bind(query.retrieved_by)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(row),
            Err(e) => match classify(&e) {
                Violation::ForeignKey => Err(ServiceError::ForeignKeyViolation(query.retrieved_by)),
                _ => Err(e.into()),
            },
        }
    }

    async fn list_for_user(&self, user_id: UserId) -> ServiceResult<Vec<IndicatorQuery>> {
        let rows = sqlx::query_as::<_, IndicatorQuery>(
            r#"
            SELECT id, indicator_name, value, value_date, source, retrieved_by, retrieved_at
            FROM indicator_history
            WHERE retrieved_by = $1
            ORDER BY retrieved_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
