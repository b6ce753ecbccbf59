use chrono::{DateTime, FixedOffset, Utc};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Named fixed-offset zone used to decide which day "today" is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportingZone {
    name: String,
    offset: FixedOffset,
}

impl ReportingZone {
    /// Returns `None` when the offset is a day or more away from UTC.
    pub fn new(name: impl Into<String>, offset_seconds: i32) -> Option<Self> {
        FixedOffset::east_opt(offset_seconds).map(|offset| Self {
            name: name.into(),
            offset,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

/// Format `now` as `YYYY-MM-DD`, shifted into `zone` when one is given.
pub fn reporting_date(now: DateTime<Utc>, zone: Option<&ReportingZone>) -> String {
    match zone {
        Some(zone) => now.with_timezone(&zone.offset).format(DATE_FORMAT).to_string(),
        None => now.format(DATE_FORMAT).to_string(),
    }
}
