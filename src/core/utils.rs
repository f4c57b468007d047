use chrono::{
    DateTime,
    Local,
    NaiveDate,
    SecondsFormat,
    Utc,
};

pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// `YYYY-MM-DD` bucket key for the daily log.
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, DATE_KEY_FORMAT).ok()
}

/// ISO-8601 with millisecond precision and a `Z` suffix.
pub fn iso_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim()).ok().map(|dt| dt.with_timezone(&Utc))
}

/// Source of "today" and "now". Day buckets follow the local calendar.
pub trait Clock {
    fn today(&self) -> NaiveDate;
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to one instant, for tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    pub today: NaiveDate,
    pub now: DateTime<Utc>,
}

impl FixedClock {
    pub fn on(today: NaiveDate) -> Self {
        let now = today.and_hms_opt(12, 0, 0).map(|dt| dt.and_utc()).unwrap_or_default();
        Self { today, now }
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.today
    }

    fn now(&self) -> DateTime<Utc> {
        self.now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_key_is_zero_padded() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(date_key(date), "2024-01-05");
        assert_eq!(parse_date_key("2024-01-05"), Some(date));
        assert_eq!(parse_date_key("2024-1-5x"), None);
    }

    #[test]
    fn test_timestamps() {
        let clock = FixedClock::on(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        let stamp = iso_timestamp(clock.now());
        assert_eq!(stamp, "2024-03-09T12:00:00.000Z");
        assert_eq!(parse_timestamp(&stamp), Some(clock.now()));
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
