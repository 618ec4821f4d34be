use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;
use time::Date;
use tracing::{debug, error, warn};

use super::retry::{with_retry, Attempt, RetryPolicy};
use super::{Indicator, IndicatorError, IndicatorSource};
use crate::dates::provider_date;

/// Provenance label stored with every history row.
pub const SOURCE_NAME: &str = "mindicador.cl";

#[derive(Debug, Deserialize)]
struct MindicadorResponse {
    #[serde(default)]
    serie: Vec<SerieEntry>,
}

#[derive(Debug, Deserialize)]
struct SerieEntry {
    valor: Decimal,
}

/// HTTP client for the public mindicador.cl API.
#[derive(Clone)]
pub struct MindicadorSource {
    base_url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl MindicadorSource {
    pub fn new(base_url: &str, timeout: Duration, retry: RetryPolicy) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("ecotech/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            retry,
        })
    }

    fn url(&self, indicator: Indicator, date: Option<Date>) -> String {
        match date {
            Some(date) => format!("{}/api/{}/{}", self.base_url, indicator, provider_date(date)),
            None => format!("{}/api/{}", self.base_url, indicator),
        }
    }

    async fn get_once(&self, url: &str) -> Result<String, Attempt<String>> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() || e.is_request() {
                Attempt::Transient(e.to_string())
            } else {
                Attempt::Fatal(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Attempt::Transient(format!("HTTP {status}")));
        }
        if !status.is_success() {
            return Err(Attempt::Fatal(format!("HTTP {status}")));
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                Attempt::Transient(e.to_string())
            } else {
                Attempt::Fatal(e.to_string())
            }
        })
    }
}

#[async_trait]
impl IndicatorSource for MindicadorSource {
    async fn fetch(
        &self,
        indicator: Indicator,
        date: Option<Date>,
    ) -> Result<Option<Decimal>, IndicatorError> {
        let url = self.url(indicator, date);
        debug!("Requesting indicator data from {}", url);

        let body = with_retry(|| self.get_once(&url), self.retry)
            .await
            .map_err(|reason| {
                warn!(%indicator, %reason, "indicator request failed");
                IndicatorError::ProviderUnavailable(reason)
            })?;

        let parsed: MindicadorResponse = match serde_json::from_str(&body) {
            Ok(data) => data,
            Err(e) => {
                error!(
                    error = ?e,
                    response = %body,
                    "Failed to parse indicator response"
                );
                return Err(IndicatorError::ProviderUnavailable(format!(
                    "malformed response: {e}"
                )));
            }
        };

        let value = parsed.serie.first().map(|entry| entry.valor);
        debug!(%indicator, ?date, ?value, "indicator fetched");
        Ok(value)
    }
}
