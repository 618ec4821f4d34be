//! In-process store with the same constraint behaviour as the PostgreSQL schema.

use std::collections::BTreeMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::debug;

use crate::auth::{NewUser, User, UserId, UserRepo};
use crate::error::{ServiceError, ServiceResult};
use crate::history::{HistoryLedger, IndicatorQuery, NewIndicatorQuery};

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    history: Vec<IndicatorQuery>,
    next_history_id: i64,
}

/// Users and history kept in memory behind a single lock.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn create(&self, user: NewUser) -> ServiceResult<User> {
        let mut tables = self.inner.lock().await;
        if tables.users.contains_key(&user.id) {
            return Err(ServiceError::DuplicateId(user.id));
        }
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(ServiceError::DuplicateUsername(user.username));
        }

        let created = User {
            id: user.id,
            username: user.username,
            password_hash: user.password_hash,
            created_at: OffsetDateTime::now_utc(),
        };
        tables.users.insert(created.id, created.clone());
        debug!(user_id = created.id, "memory store: user inserted");
        Ok(created)
    }

    async fn find_by_username(&self, username: &str) -> ServiceResult<Option<User>> {
        let tables = self.inner.lock().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> ServiceResult<Option<User>> {
        let tables = self.inner.lock().await;
        Ok(tables.users.get(&id).cloned())
    }
}

#[async_trait]
impl HistoryLedger for MemoryStore {
    async fn record(&self, query: NewIndicatorQuery) -> ServiceResult<IndicatorQuery> {
        let mut tables = self.inner.lock().await;
        if !tables.users.contains_key(&query.retrieved_by) {
            return Err(ServiceError::ForeignKeyViolation(query.retrieved_by));
        }

        tables.next_history_id += 1;
        let row = IndicatorQuery {
            id: tables.next_history_id,
            indicator_name: query.indicator.as_str().to_string(),
            value: query.value,
            value_date: query.value_date,
            source: query.source,
            retrieved_by: query.retrieved_by,
            retrieved_at: OffsetDateTime::now_utc(),
        };
        tables.history.push(row.clone());
        debug!(id = row.id, user_id = row.retrieved_by, "memory store: history row inserted");
        Ok(row)
    }

    async fn list_for_user(&self, user_id: UserId) -> ServiceResult<Vec<IndicatorQuery>> {
        let tables = self.inner.lock().await;
        // rows are appended in time order, so reverse insertion order is newest first
        Ok(tables
            .history
            .iter()
            .rev()
            .filter(|row| row.retrieved_by == user_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{Indicator, SOURCE_NAME};
    use rust_decimal::Decimal;
    use time::macros::date;

    fn new_user(id: UserId, username: &str) -> NewUser {
        NewUser {
            id,
            username: username.into(),
            password_hash: "$argon2id$stub".into(),
        }
    }

    fn query(user: UserId, indicator: Indicator, value: i64) -> NewIndicatorQuery {
        NewIndicatorQuery {
            indicator,
            value: Decimal::from(value),
            value_date: date!(2024 - 03 - 01),
            source: SOURCE_NAME.into(),
            retrieved_by: user,
        }
    }

    #[tokio::test]
    async fn enforces_unique_id_and_username() {
        let store = MemoryStore::new();
        store.create(new_user(1, "ana")).await.unwrap();

        assert!(matches!(
            store.create(new_user(1, "bea")).await,
            Err(ServiceError::DuplicateId(1))
        ));
        assert!(matches!(
            store.create(new_user(2, "ana")).await,
            Err(ServiceError::DuplicateUsername(_))
        ));
        assert!(store.find_by_id(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn history_requires_existing_user() {
        let store = MemoryStore::new();
        let err = store.record(query(9, Indicator::Uf, 1)).await.unwrap_err();
        assert!(matches!(err, ServiceError::ForeignKeyViolation(9)));
    }

    #[tokio::test]
    async fn history_is_per_user_and_newest_first() {
        let store = MemoryStore::new();
        store.create(new_user(1, "ana")).await.unwrap();
        store.create(new_user(2, "bea")).await.unwrap();

        store.record(query(1, Indicator::Dolar, 900)).await.unwrap();
        store.record(query(2, Indicator::Euro, 1000)).await.unwrap();
        store.record(query(1, Indicator::Utm, 65000)).await.unwrap();

        let rows = store.list_for_user(1).await.unwrap();
        let names: Vec<_> = rows.iter().map(|r| r.indicator_name.as_str()).collect();
        assert_eq!(names, vec!["utm", "dolar"]);
        assert!(rows.iter().all(|r| r.retrieved_by == 1));

        assert!(store.list_for_user(3).await.unwrap().is_empty());
    }
}
