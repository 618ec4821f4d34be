//! Chilean macroeconomic indicators and the client that fetches them.

mod mindicador;
mod retry;

pub use mindicador::{MindicadorSource, SOURCE_NAME};
pub use retry::RetryPolicy;

use std::{fmt, str::FromStr, sync::Arc};

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::Date;
use tracing::debug;

use crate::dates::{parse_user_date, Clock};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndicatorError {
    #[error("unknown indicator {0:?}")]
    UnknownIndicator(String),

    #[error("invalid date {0:?}, expected DD-MM-YYYY")]
    InvalidDateFormat(String),

    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Indicator {
    Dolar,
    Euro,
    Uf,
    Ipc,
    Utm,
}

impl Indicator {
    pub const ALL: [Indicator; 5] = [
        Indicator::Dolar,
        Indicator::Euro,
        Indicator::Uf,
        Indicator::Ipc,
        Indicator::Utm,
    ];

    /// Series code used by the provider and stored in history rows.
    pub fn as_str(&self) -> &'static str {
        match self {
            Indicator::Dolar => "dolar",
            Indicator::Euro => "euro",
            Indicator::Uf => "uf",
            Indicator::Ipc => "ipc",
            Indicator::Utm => "utm",
        }
    }

    /// Monthly series are published once a month and are queried without a day.
    pub fn is_monthly(&self) -> bool {
        matches!(self, Indicator::Ipc)
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the series codes (`dolar`, `euro`, `uf`, `ipc`, `utm`) ignoring
/// surrounding whitespace and ASCII case, so `" UF "` parses as [`Indicator::Uf`].
/// Anything else is `UnknownIndicator`.
impl FromStr for Indicator {
    type Err = IndicatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Indicator::ALL
            .into_iter()
            .find(|i| i.as_str() == wanted)
            .ok_or_else(|| IndicatorError::UnknownIndicator(s.trim().to_string()))
    }
}

/// Something that can return the value of a series on a day (or its latest value).
#[async_trait]
pub trait IndicatorSource: Send + Sync {
    /// `Ok(None)` means the provider answered but has no value for that date.
    async fn fetch(
        &self,
        indicator: Indicator,
        date: Option<Date>,
    ) -> Result<Option<Decimal>, IndicatorError>;
}

/// Applies the per-indicator date rules in front of an [`IndicatorSource`].
#[derive(Clone)]
pub struct IndicatorClient {
    source: Arc<dyn IndicatorSource>,
    clock: Arc<dyn Clock>,
}

impl IndicatorClient {
    pub fn new(source: Arc<dyn IndicatorSource>, clock: Arc<dyn Clock>) -> Self {
        Self { source, clock }
    }

    /// Looks up `name` on the date given as `DD-MM-YYYY` text, or today when absent.
    ///
    /// Name and date are validated before any request goes out.
    pub async fn get_indicator(
        &self,
        name: &str,
        date_text: Option<&str>,
    ) -> Result<Option<Decimal>, IndicatorError> {
        let indicator: Indicator = name.parse()?;
        let date = match date_text.map(str::trim).filter(|t| !t.is_empty()) {
            Some(text) => Some(
                parse_user_date(text)
                    .ok_or_else(|| IndicatorError::InvalidDateFormat(text.to_string()))?,
            ),
            None => None,
        };
        self.fetch(indicator, date).await
    }

    /// Typed lookup. Monthly series ignore `date`; the rest default to today.
    pub async fn fetch(
        &self,
        indicator: Indicator,
        date: Option<Date>,
    ) -> Result<Option<Decimal>, IndicatorError> {
        let date = if indicator.is_monthly() {
            None
        } else {
            Some(date.unwrap_or_else(|| self.clock.today()))
        };
        debug!(%indicator, ?date, "fetching indicator");
        self.source.fetch(indicator, date).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records every call and answers with a canned result.
    pub struct RecordingSource {
        pub calls: Mutex<Vec<(Indicator, Option<Date>)>>,
        pub answer: Result<Option<Decimal>, IndicatorError>,
    }

    impl RecordingSource {
        pub fn answering(answer: Result<Option<Decimal>, IndicatorError>) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                answer,
            }
        }

        pub fn calls(&self) -> Vec<(Indicator, Option<Date>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl IndicatorSource for RecordingSource {
        async fn fetch(
            &self,
            indicator: Indicator,
            date: Option<Date>,
        ) -> Result<Option<Decimal>, IndicatorError> {
            self.calls.lock().unwrap().push((indicator, date));
            self.answer.clone()
        }
    }
}
