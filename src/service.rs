//! The consumer-facing API: credentials, indicator lookups and history in one place.

use std::sync::Arc;

use rust_decimal::Decimal;
use time::Date;
use tracing::{info, instrument, warn};

use crate::auth::{CredentialStore, UserId, UserRepo};
use crate::config::{AppConfig, ProviderConfig};
use crate::dates::{parse_user_date, Clock, SystemClock};
use crate::db::PgStore;
use crate::error::{ServiceError, ServiceResult};
use crate::history::{HistoryLedger, IndicatorQuery, NewIndicatorQuery};
use crate::indicators::{Indicator, IndicatorClient, IndicatorSource, MindicadorSource, SOURCE_NAME};

#[derive(Clone)]
pub struct IndicatorService {
    credentials: CredentialStore,
    indicators: IndicatorClient,
    history: Arc<dyn HistoryLedger>,
    clock: Arc<dyn Clock>,
}

impl IndicatorService {
    pub fn from_parts(
        users: Arc<dyn UserRepo>,
        history: Arc<dyn HistoryLedger>,
        source: Arc<dyn IndicatorSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            credentials: CredentialStore::new(users),
            indicators: IndicatorClient::new(source, clock.clone()),
            history,
            clock,
        }
    }

    /// PostgreSQL store plus the live mindicador.cl client.
    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let store = Arc::new(PgStore::connect(&config.db).await?);
        store.create_all_tables().await?;
        let source = Arc::new(mindicador_source(&config.provider)?);
        Ok(Self::from_parts(
            store.clone(),
            store,
            source,
            Arc::new(SystemClock),
        ))
    }

    pub async fn register(&self, id: UserId, username: &str, password: &str) -> ServiceResult<()> {
        self.credentials.register(id, username, password).await
    }

    pub async fn login(&self, username: &str, password: &str) -> ServiceResult<Option<UserId>> {
        self.credentials.login(username, password).await
    }

    /// Raw lookup without recording anything. `date_text` is `DD-MM-YYYY`.
    pub async fn get_indicator(
        &self,
        name: &str,
        date_text: Option<&str>,
    ) -> ServiceResult<Option<Decimal>> {
        Ok(self.indicators.get_indicator(name, date_text).await?)
    }

    pub async fn insert_history(&self, query: NewIndicatorQuery) -> ServiceResult<IndicatorQuery> {
        self.history.record(query).await
    }

    pub async fn get_history(&self, user_id: UserId) -> ServiceResult<Vec<IndicatorQuery>> {
        self.history.list_for_user(user_id).await
    }

    /// Blank means today; anything else must be a real `DD-MM-YYYY` date.
    pub fn normalize_date(&self, date_text: &str) -> ServiceResult<Date> {
        let text = date_text.trim();
        if text.is_empty() {
            return Ok(self.clock.today());
        }
        parse_user_date(text).ok_or_else(|| ServiceError::InvalidDateFormat(text.to_string()))
    }

    /// Looks up an indicator for `user_id` and records it when a value comes back.
    ///
    /// `Ok(None)` means the provider has no value for that date; nothing is recorded.
    #[instrument(skip(self))]
    pub async fn query_and_record(
        &self,
        user_id: UserId,
        indicator: &str,
        date_text: &str,
    ) -> ServiceResult<Option<Decimal>> {
        if indicator.trim().is_empty() {
            return Err(ServiceError::MissingIndicator);
        }
        let indicator: Indicator = indicator.parse()?;
        let value_date = self.normalize_date(date_text)?;

        // monthly series drop the date inside the client; value_date is still stored
        let value = match self.indicators.fetch(indicator, Some(value_date)).await {
            Ok(Some(value)) => value,
            Ok(None) => {
                info!(%indicator, %value_date, "no value published for date");
                return Ok(None);
            }
            Err(e) => {
                warn!(%indicator, error = %e, "indicator lookup failed");
                return Err(e.into());
            }
        };

        self.history
            .record(NewIndicatorQuery {
                indicator,
                value,
                value_date,
                source: SOURCE_NAME.to_string(),
                retrieved_by: user_id,
            })
            .await?;

        info!(%indicator, %value_date, %value, user_id, "indicator recorded");
        Ok(Some(value))
    }
}

pub fn mindicador_source(config: &ProviderConfig) -> anyhow::Result<MindicadorSource> {
    Ok(MindicadorSource::new(
        &config.base_url,
        config.timeout,
        config.retry,
    )?)
}
