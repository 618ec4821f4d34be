//! Calendar helpers shared by the indicator client and the session facade.

use time::{format_description::FormatItem, macros::format_description, Date, OffsetDateTime};

/// Format users type dates in. Day and month may drop the leading zero.
const USER_DATE: &[FormatItem<'static>] =
    format_description!("[day padding:none]-[month padding:none]-[year]");

/// Format mindicador.cl expects in request paths.
const PROVIDER_DATE: &[FormatItem<'static>] = format_description!("[day]-[month]-[year]");

/// Source of "today" for date defaults.
pub trait Clock: Send + Sync {
    fn today(&self) -> Date;
}

/// Local calendar date, falling back to UTC when the local offset is unknown.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> Date {
        OffsetDateTime::now_local()
            .unwrap_or_else(|_| OffsetDateTime::now_utc())
            .date()
    }
}

/// Always reports the same day.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Date);

impl Clock for FixedClock {
    fn today(&self) -> Date {
        self.0
    }
}

/// Parses `DD-MM-YYYY`. Returns `None` for anything that is not a real date.
pub fn parse_user_date(text: &str) -> Option<Date> {
    Date::parse(text.trim(), USER_DATE).ok()
}

/// Renders a date the way the provider path segment expects it.
pub fn provider_date(date: Date) -> String {
    // The description only holds day, month and year, which every Date has.
    date.format(PROVIDER_DATE)
        .unwrap_or_else(|_| format!("{:02}-{:02}-{}", date.day(), u8::from(date.month()), date.year()))
}
