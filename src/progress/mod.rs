use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{
    de::DeserializeOwned,
    Deserialize,
    Deserializer,
    Serialize,
};

use crate::{
    core::{
        utils::parse_timestamp,
        FamiliarityLevel,
        FluencyError,
        MinigameTier,
        Ranked,
    },
    persistence::{
        Storage,
        StorageKey,
    },
};

pub mod ledger;

pub use ledger::{
    ChartWindow,
    DailyPoint,
    DailySeries,
};

/// Every persisted progress map, keyed by word key or by date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressStore {
    pub familiarity: BTreeMap<String, FamiliarityLevel>,
    pub highest: BTreeMap<String, FamiliarityLevel>,
    pub daily_log: BTreeMap<String, u32>,
    pub favorites: BTreeMap<String, bool>,
    pub exposed_at: BTreeMap<String, String>,
    pub minigame_highest: BTreeMap<String, MinigameTier>,
    pub badges: BTreeMap<String, serde_json::Value>,
    pub chart_offset: i64,
}

/// Outcome of a familiarity click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FamiliarityChange {
    pub previous: FamiliarityLevel,
    pub current: FamiliarityLevel,
    pub highest: FamiliarityLevel,
    pub points_awarded: u32,
}

impl FamiliarityChange {
    pub fn raised_watermark(&self) -> bool {
        self.points_awarded > 0
    }
}

fn read_blob<T: DeserializeOwned + Default>(storage: &dyn Storage, key: StorageKey) -> T {
    let raw = match storage.get_item(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return T::default(),
        Err(e) => {
            log::warn!("Could not read {}: {}. Starting empty.", key.as_str(), e);
            return T::default();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Discarding malformed {}: {}", key.as_str(), e);
            T::default()
        }
    }
}

/// Keeps every entry whose value parses as `T`. A bad value only costs its
/// own key, so one stray level cannot wipe a whole watermark map.
pub(crate) fn lenient_entries<T: DeserializeOwned>(
    raw: BTreeMap<String, serde_json::Value>,
    source: &str,
) -> BTreeMap<String, T> {
    raw.into_iter()
        .filter_map(|(key, value)| match serde_json::from_value(value) {
            Ok(parsed) => Some((key, parsed)),
            Err(e) => {
                log::warn!("Dropping {} entry {}: {}", source, key, e);
                None
            }
        })
        .collect()
}

pub(crate) fn deserialize_lenient_entries<'de, D, T>(
    deserializer: D,
) -> Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<BTreeMap<String, serde_json::Value>>::deserialize(deserializer)?;
    Ok(lenient_entries(raw.unwrap_or_default(), "imported"))
}

fn read_entries<T: DeserializeOwned>(storage: &dyn Storage, key: StorageKey) -> BTreeMap<String, T> {
    lenient_entries(read_blob(storage, key), key.as_str())
}

fn write_blob<T: Serialize>(
    storage: &mut dyn Storage,
    key: StorageKey,
    value: &T,
) -> Result<(), FluencyError> {
    let json = serde_json::to_string(value)?;
    storage.set_item(key, &json)
}

impl ProgressStore {
    /// Reads every blob. Missing or malformed blobs come back empty.
    pub fn load(storage: &dyn Storage) -> Self {
        let daily_log = {
            let raw: BTreeMap<String, serde_json::Value> = read_blob(storage, StorageKey::DailyLog);
            raw.iter().map(|(date, value)| (date.clone(), ledger::lenient_count(value))).collect()
        };
        let chart_offset = read_blob::<serde_json::Value>(storage, StorageKey::ChartOffset)
            .as_i64()
            .unwrap_or(0);

        Self {
            familiarity: read_entries(storage, StorageKey::Progress),
            highest: read_entries(storage, StorageKey::Highest),
            daily_log,
            favorites: read_entries(storage, StorageKey::Favorites),
            exposed_at: read_entries(storage, StorageKey::Exposure),
            minigame_highest: read_entries(storage, StorageKey::MinigameHighest),
            badges: read_blob(storage, StorageKey::MinigameBadges),
            chart_offset,
        }
    }

    pub fn persist(&self, storage: &mut dyn Storage, key: StorageKey) -> Result<(), FluencyError> {
        match key {
            StorageKey::Progress => write_blob(storage, key, &self.familiarity),
            StorageKey::DailyLog => write_blob(storage, key, &self.daily_log),
            StorageKey::Highest => write_blob(storage, key, &self.highest),
            StorageKey::Favorites => write_blob(storage, key, &self.favorites),
            StorageKey::Exposure => write_blob(storage, key, &self.exposed_at),
            StorageKey::MinigameHighest => write_blob(storage, key, &self.minigame_highest),
            StorageKey::MinigameBadges => write_blob(storage, key, &self.badges),
            StorageKey::ChartOffset => write_blob(storage, key, &self.chart_offset),
        }
    }

    pub fn persist_all(&self, storage: &mut dyn Storage) -> Result<(), FluencyError> {
        for key in StorageKey::ALL {
            self.persist(storage, key)?;
        }
        Ok(())
    }

    /// Clears every map and removes every blob, then reseeds today's bucket.
    pub fn reset(&mut self, storage: &mut dyn Storage, today: NaiveDate) -> Result<(), FluencyError> {
        for key in StorageKey::ALL {
            storage.remove_item(key)?;
        }
        *self = Self::default();
        self.ensure_today_bucket(today);
        self.persist(storage, StorageKey::DailyLog)
    }

    pub fn familiarity_of(&self, key: &str) -> FamiliarityLevel {
        self.familiarity.get(key).copied().unwrap_or_default()
    }

    pub fn highest_of(&self, key: &str) -> FamiliarityLevel {
        self.highest.get(key).copied().unwrap_or_default()
    }

    /// Moves a word to `level`. Points are only credited when the watermark
    /// rises, so oscillating between levels earns nothing.
    pub fn apply_familiarity(
        &mut self,
        key: &str,
        level: FamiliarityLevel,
        today: NaiveDate,
    ) -> FamiliarityChange {
        let previous = self.familiarity_of(key);
        let prev_high = self.highest_of(key);

        let mut points_awarded = 0;
        if level.rank() > prev_high.rank() {
            points_awarded = (level.rank() - prev_high.rank()) as u32;
            self.add_points(today, points_awarded);
            self.highest.insert(key.to_string(), level);
        }
        self.familiarity.insert(key.to_string(), level);

        FamiliarityChange { previous, current: level, highest: self.highest_of(key), points_awarded }
    }

    pub fn is_favorite(&self, key: &str) -> bool {
        self.favorites.get(key).copied().unwrap_or(false)
    }

    /// Flips a favorite. Returns the new state.
    pub fn toggle_favorite(&mut self, key: &str) -> bool {
        if self.is_favorite(key) {
            self.favorites.remove(key);
            false
        } else {
            self.favorites.insert(key.to_string(), true);
            true
        }
    }

    /// Records the first exposure only. Returns true when a timestamp was set.
    pub fn mark_exposed(&mut self, key: &str, timestamp: String) -> bool {
        if let Some(existing) = self.exposed_at.get(key) {
            if parse_timestamp(existing).is_some() {
                return false;
            }
        }
        self.exposed_at.insert(key.to_string(), timestamp);
        true
    }

    pub fn minigame_best(&self, key: &str) -> MinigameTier {
        self.minigame_highest.get(key).copied().unwrap_or_default()
    }

    /// Raises the minigame watermark. Returns true when it moved.
    pub fn record_minigame(&mut self, key: &str, tier: MinigameTier) -> bool {
        if tier.rank() > self.minigame_best(key).rank() {
            self.minigame_highest.insert(key.to_string(), tier);
            true
        } else {
            false
        }
    }

    pub fn award_badge(&mut self, key: &str, value: serde_json::Value) {
        self.badges.insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;

    const CAT: &str = "猫|ねこ|cat";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_watermark_scenario() {
        let mut store = ProgressStore::default();

        let change = store.apply_familiarity(CAT, FamiliarityLevel::Known, today());
        assert_eq!(change.points_awarded, 2);
        assert_eq!(store.highest_of(CAT), FamiliarityLevel::Known);
        assert_eq!(store.points_on(today()), 2);

        let change = store.apply_familiarity(CAT, FamiliarityLevel::Explored, today());
        assert_eq!(change.points_awarded, 0);
        assert_eq!(change.previous, FamiliarityLevel::Known);
        assert_eq!(store.familiarity_of(CAT), FamiliarityLevel::Explored);
        assert_eq!(store.highest_of(CAT), FamiliarityLevel::Known);
        assert_eq!(store.points_on(today()), 2);

        let change = store.apply_familiarity(CAT, FamiliarityLevel::WellKnown, today());
        assert_eq!(change.points_awarded, 1);
        assert!(change.raised_watermark());
        assert_eq!(store.highest_of(CAT), FamiliarityLevel::WellKnown);
        assert_eq!(store.points_on(today()), 3);
    }

    #[test]
    fn test_watermark_monotonic_and_points_conserved() {
        use FamiliarityLevel::*;
        let mut store = ProgressStore::default();
        let sequence =
            [Explored, Unknown, Known, Explored, WellKnown, Unknown, Known, WellKnown, Unknown];

        let mut last_high = 0;
        let mut awarded = 0u64;
        for level in sequence {
            let change = store.apply_familiarity(CAT, level, today());
            awarded += change.points_awarded as u64;
            let high = store.highest_of(CAT).rank();
            assert!(high >= last_high);
            last_high = high;
        }

        assert_eq!(awarded, 3);
        assert_eq!(store.total_points(), awarded);
        assert_eq!(store.familiarity_of(CAT), Unknown);
    }

    #[test]
    fn test_load_recovers_from_malformed_blobs() {
        let mut storage = MemoryStorage::new();
        storage.set_item(StorageKey::Progress, "{ broken").unwrap();
        storage.set_item(StorageKey::Highest, "{\"猫|ねこ|cat\":\"known\"}").unwrap();
        storage.set_item(StorageKey::DailyLog, "{\"2024-06-01\":\"4\",\"2024-05-31\":2}").unwrap();
        storage.set_item(StorageKey::ChartOffset, "\"three\"").unwrap();

        let store = ProgressStore::load(&storage);
        assert!(store.familiarity.is_empty());
        assert_eq!(store.highest_of(CAT), FamiliarityLevel::Known);
        assert_eq!(store.points_on(today()), 4);
        assert_eq!(store.total_points(), 6);
        assert_eq!(store.chart_offset, 0);
    }

    #[test]
    fn test_unrecognised_level_only_drops_its_own_entry() {
        let mut storage = MemoryStorage::new();
        storage
            .set_item(StorageKey::Highest, r#"{"猫|ねこ|cat":"well_known","犬|いぬ|dog":"mastered"}"#)
            .unwrap();
        storage.set_item(StorageKey::MinigameHighest, r#"{"猫|ねこ|cat":"hard","犬|いぬ|dog":7}"#).unwrap();

        let mut store = ProgressStore::load(&storage);
        assert_eq!(store.highest.len(), 1);
        assert_eq!(store.highest_of(CAT), FamiliarityLevel::WellKnown);
        assert_eq!(store.minigame_best(CAT), MinigameTier::Hard);
        assert!(!store.minigame_highest.contains_key("犬|いぬ|dog"));

        let change = store.apply_familiarity(CAT, FamiliarityLevel::WellKnown, today());
        assert_eq!(change.points_awarded, 0);
        assert_eq!(store.points_on(today()), 0);
    }

    #[test]
    fn test_persist_all_then_load() {
        let mut storage = MemoryStorage::new();
        let mut store = ProgressStore::default();
        store.apply_familiarity(CAT, FamiliarityLevel::Known, today());
        store.toggle_favorite(CAT);
        store.mark_exposed(CAT, "2024-06-01T08:00:00.000Z".to_string());
        store.record_minigame(CAT, MinigameTier::Medium);
        store.award_badge(CAT, serde_json::json!({ "streak": 3 }));
        store.chart_offset = 6;

        store.persist_all(&mut storage).unwrap();
        assert_eq!(storage.len(), StorageKey::ALL.len());
        assert_eq!(ProgressStore::load(&storage), store);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut storage = MemoryStorage::new();
        let mut store = ProgressStore::default();
        store.apply_familiarity(CAT, FamiliarityLevel::WellKnown, today());
        store.toggle_favorite(CAT);
        store.chart_offset = 2;
        store.persist_all(&mut storage).unwrap();

        store.reset(&mut storage, today()).unwrap();
        assert!(store.familiarity.is_empty());
        assert!(store.highest.is_empty());
        assert!(store.favorites.is_empty());
        assert_eq!(store.chart_offset, 0);
        assert_eq!(store.daily_log.len(), 1);
        assert_eq!(store.points_on(today()), 0);

        assert_eq!(ProgressStore::load(&storage), store);
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_favorites_exposure_and_minigame() {
        let mut store = ProgressStore::default();
        assert!(store.toggle_favorite(CAT));
        assert!(store.is_favorite(CAT));
        assert!(!store.toggle_favorite(CAT));
        assert!(!store.favorites.contains_key(CAT));

        assert!(store.mark_exposed(CAT, "2024-06-01T08:00:00.000Z".to_string()));
        assert!(!store.mark_exposed(CAT, "2024-06-02T08:00:00.000Z".to_string()));
        assert_eq!(store.exposed_at.get(CAT).map(String::as_str), Some("2024-06-01T08:00:00.000Z"));

        assert!(store.record_minigame(CAT, MinigameTier::Medium));
        assert!(!store.record_minigame(CAT, MinigameTier::Easy));
        assert_eq!(store.minigame_best(CAT), MinigameTier::Medium);
    }
}
