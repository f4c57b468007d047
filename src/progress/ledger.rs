use std::{
    collections::BTreeMap,
    ops::Range,
};

use chrono::{
    Days,
    NaiveDate,
};
use serde::{
    Deserialize,
    Deserializer,
};

use super::ProgressStore;
use crate::core::utils::date_key;

pub const DEFAULT_CHART_DAYS: u32 = 30;
pub const DEFAULT_VISIBLE_BARS: usize = 14;

impl ProgressStore {
    /// Seeds a zero bucket for `today`. Returns true when one was created.
    pub fn ensure_today_bucket(&mut self, today: NaiveDate) -> bool {
        let key = date_key(today);
        if self.daily_log.contains_key(&key) {
            return false;
        }
        self.daily_log.insert(key, 0);
        true
    }

    /// Credits `delta` points to today. Returns the new total for the day.
    pub fn add_points(&mut self, today: NaiveDate, delta: u32) -> u32 {
        let bucket = self.daily_log.entry(date_key(today)).or_insert(0);
        if delta > 0 {
            *bucket = bucket.saturating_add(delta);
        }
        *bucket
    }

    pub fn points_on(&self, date: NaiveDate) -> u32 {
        self.daily_log.get(&date_key(date)).copied().unwrap_or(0)
    }

    pub fn total_points(&self) -> u64 {
        self.daily_log.values().map(|&v| v as u64).sum()
    }

    pub fn daily_series(&self, end: NaiveDate, window_days: u32) -> DailySeries<'_> {
        DailySeries::new(&self.daily_log, end, window_days)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub count: u32,
}

/// Trailing `window_days` calendar days ending at `end`, oldest first.
/// Days without a log entry count as zero. Clone to restart.
#[derive(Debug, Clone)]
pub struct DailySeries<'a> {
    log: &'a BTreeMap<String, u32>,
    end: NaiveDate,
    len: u32,
    pos: u32,
}

impl<'a> DailySeries<'a> {
    pub fn new(log: &'a BTreeMap<String, u32>, end: NaiveDate, window_days: u32) -> Self {
        Self { log, end, len: window_days, pos: 0 }
    }
}

impl Iterator for DailySeries<'_> {
    type Item = DailyPoint;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.len {
            return None;
        }
        let back = (self.len - 1 - self.pos) as u64;
        self.pos += 1;

        // Dates before the calendar's minimum end the series early
        let date = self.end.checked_sub_days(Days::new(back))?;
        let count = self.log.get(&date_key(date)).copied().unwrap_or(0);
        Some(DailyPoint { date, count })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.len - self.pos) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for DailySeries<'_> {}

/// Visible slice of the chart. `offset` counts days scrolled back from today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartWindow {
    pub visible: usize,
    pub offset: usize,
}

impl ChartWindow {
    pub fn new(visible: usize, offset: i64) -> Self {
        Self { visible: visible.max(1), offset: offset.max(0) as usize }
    }

    pub fn max_offset(&self, series_len: usize) -> usize {
        series_len.saturating_sub(self.visible)
    }

    pub fn clamped(self, series_len: usize) -> Self {
        Self { visible: self.visible, offset: self.offset.min(self.max_offset(series_len)) }
    }

    /// Index range into an oldest-first series of `series_len` points.
    pub fn range(&self, series_len: usize) -> Range<usize> {
        let window = self.clamped(series_len);
        let end = series_len - window.offset;
        let start = end.saturating_sub(window.visible);
        start..end
    }

    pub fn scroll(self, delta: i64, series_len: usize) -> Self {
        let offset = (self.offset as i64).saturating_add(delta).max(0);
        Self::new(self.visible, offset).clamped(series_len)
    }
}

const BAR_WIDTH: usize = 40;

/// Plain-text bar chart, one line per day.
pub fn render_bars(points: &[DailyPoint], today: NaiveDate) -> String {
    let peak = points.iter().map(|p| p.count).max().unwrap_or(0).max(1);
    let mut out = String::new();
    for point in points {
        let width = (point.count as usize * BAR_WIDTH).div_ceil(peak as usize);
        let marker = if point.date == today { " <- today" } else { "" };
        out.push_str(&format!(
            "{} {:>4} {}{}\n",
            date_key(point.date),
            point.count,
            "#".repeat(width),
            marker
        ));
    }
    out
}

/// Accepts numbers or numeric strings for a day's count; anything else is zero.
pub(crate) fn lenient_count(value: &serde_json::Value) -> u32 {
    match value {
        serde_json::Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                v.min(u32::MAX as u64) as u32
            } else if let Some(v) = n.as_f64() {
                if v > 0.0 {
                    v.trunc().min(u32::MAX as f64) as u32
                } else {
                    0
                }
            } else {
                0
            }
        }
        serde_json::Value::String(s) => {
            let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse::<u64>().map(|v| v.min(u32::MAX as u64) as u32).unwrap_or(0)
        }
        _ => 0,
    }
}

pub(crate) fn deserialize_lenient_counts<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, serde_json::Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(date, value)| {
            let count = lenient_count(&value);
            (date, count)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_ensure_today_bucket_is_idempotent() {
        let today = day(2024, 5, 1);
        let mut store = ProgressStore::default();

        assert!(store.ensure_today_bucket(today));
        let once = store.clone();
        assert!(!store.ensure_today_bucket(today));
        assert_eq!(store, once);
        assert_eq!(store.daily_log.get("2024-05-01"), Some(&0));

        // Never overwrites an existing value
        store.add_points(today, 4);
        assert!(!store.ensure_today_bucket(today));
        assert_eq!(store.points_on(today), 4);
    }

    #[test]
    fn test_add_points() {
        let today = day(2024, 5, 1);
        let mut store = ProgressStore::default();
        assert_eq!(store.add_points(today, 0), 0);
        assert_eq!(store.add_points(today, 2), 2);
        assert_eq!(store.add_points(today, 1), 3);
        assert_eq!(store.add_points(day(2024, 5, 2), 5), 5);
        assert_eq!(store.total_points(), 8);
    }

    #[test]
    fn test_daily_series_fills_gaps_and_restarts() {
        let mut store = ProgressStore::default();
        store.add_points(day(2024, 2, 28), 3);
        store.add_points(day(2024, 3, 1), 7);

        let series = store.daily_series(day(2024, 3, 1), 4);
        assert_eq!(series.len(), 4);

        let points: Vec<DailyPoint> = series.clone().collect();
        let dates: Vec<NaiveDate> = points.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![day(2024, 2, 27), day(2024, 2, 28), day(2024, 2, 29), day(2024, 3, 1)]);
        let counts: Vec<u32> = points.iter().map(|p| p.count).collect();
        assert_eq!(counts, vec![0, 3, 0, 7]);

        // The original is untouched by consuming a clone
        assert_eq!(series.count(), 4);
        assert_eq!(store.daily_series(day(2024, 3, 1), 0).count(), 0);
    }

    #[test]
    fn test_chart_window_clamps_offset() {
        let window = ChartWindow::new(7, 0);
        assert_eq!(window.range(30), 23..30);

        let scrolled = window.scroll(5, 30);
        assert_eq!(scrolled.offset, 5);
        assert_eq!(scrolled.range(30), 18..25);

        let far = window.scroll(100, 30);
        assert_eq!(far.offset, 23);
        assert_eq!(far.range(30), 0..7);

        assert_eq!(far.scroll(-500, 30).offset, 0);

        // Fewer points than bars
        assert_eq!(ChartWindow::new(14, 3).range(5), 0..5);
        assert_eq!(ChartWindow::new(14, -3).offset, 0);
    }

    #[test]
    fn test_render_bars_marks_today() {
        let points = vec![
            DailyPoint { date: day(2024, 1, 1), count: 0 },
            DailyPoint { date: day(2024, 1, 2), count: 4 },
        ];
        let text = render_bars(&points, day(2024, 1, 2));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("2024-01-01    0"));
        assert!(!lines[0].contains('#'));
        assert!(lines[1].ends_with("<- today"));
        assert!(lines[1].contains(&"#".repeat(BAR_WIDTH)));
    }

    #[test]
    fn test_lenient_counts() {
        assert_eq!(lenient_count(&serde_json::json!(5)), 5);
        assert_eq!(lenient_count(&serde_json::json!("12")), 12);
        assert_eq!(lenient_count(&serde_json::json!("7 points")), 7);
        assert_eq!(lenient_count(&serde_json::json!("abc")), 0);
        assert_eq!(lenient_count(&serde_json::json!(-4)), 0);
        assert_eq!(lenient_count(&serde_json::json!(2.9)), 2);
        assert_eq!(lenient_count(&serde_json::json!(null)), 0);
    }
}
