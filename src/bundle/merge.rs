use std::collections::BTreeMap;

use chrono::{
    DateTime,
    Utc,
};

use crate::core::{
    utils::parse_timestamp,
    Ranked,
};

/// Higher rank wins; ties and equal ranks keep the current value.
pub fn merge_ranked<T: Ranked + Clone>(
    base: &BTreeMap<String, T>,
    incoming: &BTreeMap<String, T>,
) -> BTreeMap<String, T> {
    let mut merged = base.clone();
    for (key, value) in incoming {
        match base.get(key) {
            Some(current) if value.rank() <= current.rank() => {}
            _ => {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    merged
}

/// Sums counts per date. Importing the same export twice double counts.
pub fn merge_daily_log(
    base: &BTreeMap<String, u32>,
    incoming: &BTreeMap<String, u32>,
) -> BTreeMap<String, u32> {
    let mut merged = base.clone();
    for (date, count) in incoming {
        let bucket = merged.entry(date.clone()).or_insert(0);
        *bucket = bucket.saturating_add(*count);
    }
    merged
}

pub fn merge_favorites(
    base: &BTreeMap<String, bool>,
    incoming: &BTreeMap<String, bool>,
) -> BTreeMap<String, bool> {
    let mut merged = base.clone();
    for (key, _) in incoming.iter().filter(|(_, favorite)| **favorite) {
        merged.insert(key.clone(), true);
    }
    merged
}

/// Shallow union; incoming overwrites on collision.
pub fn merge_badges(
    base: &BTreeMap<String, serde_json::Value>,
    incoming: &BTreeMap<String, serde_json::Value>,
) -> BTreeMap<String, serde_json::Value> {
    let mut merged = base.clone();
    merged.extend(incoming.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

// Unparseable timestamps sort after every real one
fn exposure_instant(value: &str) -> Option<DateTime<Utc>> {
    parse_timestamp(value)
}

fn is_earlier(candidate: &str, current: &str) -> bool {
    match (exposure_instant(candidate), exposure_instant(current)) {
        (Some(a), Some(b)) => a < b,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Keeps the older exposure per key.
pub fn merge_exposure(
    base: &BTreeMap<String, String>,
    incoming: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut merged = base.clone();
    for (key, stamp) in incoming {
        match base.get(key) {
            Some(current) if !is_earlier(stamp, current) => {}
            _ => {
                merged.insert(key.clone(), stamp.clone());
            }
        }
    }
    merged
}
