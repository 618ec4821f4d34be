use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use time::{Date, OffsetDateTime};

use crate::auth::UserId;
use crate::indicators::Indicator;

/// One recorded indicator lookup.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct IndicatorQuery {
    pub id: i64,
    pub indicator_name: String,
    pub value: Decimal,
    #[serde(with = "iso_date")]
    pub value_date: Date,
    pub source: String,
    pub retrieved_by: UserId,
    #[serde(with = "time::serde::rfc3339")]
    pub retrieved_at: OffsetDateTime,
}

/// Payload for [`HistoryLedger::record`](super::HistoryLedger::record).
#[derive(Debug, Clone, PartialEq)]
pub struct NewIndicatorQuery {
    pub indicator: Indicator,
    pub value: Decimal,
    pub value_date: Date,
    pub source: String,
    pub retrieved_by: UserId,
}

mod iso_date {
    use serde::Serializer;
    use time::Date;

    pub fn serialize<S: Serializer>(date: &Date, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(date)
    }
}
