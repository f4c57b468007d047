use std::collections::BTreeMap;

use chrono::{
    DateTime,
    NaiveDate,
    Utc,
};
use serde::{
    Deserialize,
    Deserializer,
    Serialize,
};

use crate::{
    core::{
        utils::iso_timestamp,
        FamiliarityLevel,
        FluencyError,
        MinigameTier,
    },
    progress::{
        deserialize_lenient_entries,
        ledger::deserialize_lenient_counts,
        ProgressStore,
    },
};

pub mod merge;

pub const SCHEMA_NAMESPACE: &str = "fluencyflow";
pub const CURRENT_SCHEMA: &str = "fluencyflow.v4";
pub const ACCEPTED_SCHEMAS: [&str; 4] =
    ["fluencyflow.v1", "fluencyflow.v2", "fluencyflow.v3", "fluencyflow.v4"];

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Only integer offsets are applied
fn integer_offset<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| value.as_i64()))
}

/// Export envelope shared by every schema version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<D> {
    #[serde(rename = "exportedAt", default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<String>,
    #[serde(default)]
    pub data: D,
}

/// v1 and v2: familiarity, daily log, watermark and chart offset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataV1 {
    #[serde(default, deserialize_with = "deserialize_lenient_entries")]
    pub vocab_progress: BTreeMap<String, FamiliarityLevel>,
    #[serde(default, deserialize_with = "deserialize_lenient_counts")]
    pub vocab_progress_daily: BTreeMap<String, u32>,
    #[serde(default, deserialize_with = "deserialize_lenient_entries")]
    pub vocab_highest: BTreeMap<String, FamiliarityLevel>,
    #[serde(default, deserialize_with = "integer_offset", skip_serializing_if = "Option::is_none")]
    pub daily_offset: Option<i64>,
}

/// v3 adds favorites and first-exposure timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataV3 {
    #[serde(default, deserialize_with = "deserialize_lenient_entries")]
    pub vocab_progress: BTreeMap<String, FamiliarityLevel>,
    #[serde(default, deserialize_with = "deserialize_lenient_counts")]
    pub vocab_progress_daily: BTreeMap<String, u32>,
    #[serde(default, deserialize_with = "deserialize_lenient_entries")]
    pub vocab_highest: BTreeMap<String, FamiliarityLevel>,
    #[serde(default, deserialize_with = "integer_offset", skip_serializing_if = "Option::is_none")]
    pub daily_offset: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_lenient_entries")]
    pub vocab_favorites: BTreeMap<String, bool>,
    #[serde(default, deserialize_with = "deserialize_lenient_entries")]
    pub vocab_exposure: BTreeMap<String, String>,
}

/// v4, the canonical shape every older version upgrades into.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleData {
    #[serde(default, deserialize_with = "deserialize_lenient_entries")]
    pub vocab_progress: BTreeMap<String, FamiliarityLevel>,
    #[serde(default, deserialize_with = "deserialize_lenient_counts")]
    pub vocab_progress_daily: BTreeMap<String, u32>,
    #[serde(default, deserialize_with = "deserialize_lenient_entries")]
    pub vocab_highest: BTreeMap<String, FamiliarityLevel>,
    #[serde(default, deserialize_with = "integer_offset", skip_serializing_if = "Option::is_none")]
    pub daily_offset: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_lenient_entries")]
    pub vocab_favorites: BTreeMap<String, bool>,
    #[serde(default, deserialize_with = "deserialize_lenient_entries")]
    pub vocab_exposure: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "deserialize_lenient_entries")]
    pub minigame_highest: BTreeMap<String, MinigameTier>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub minigame_badges: BTreeMap<String, serde_json::Value>,
}

impl From<DataV1> for BundleData {
    fn from(data: DataV1) -> Self {
        Self {
            vocab_progress: data.vocab_progress,
            vocab_progress_daily: data.vocab_progress_daily,
            vocab_highest: data.vocab_highest,
            daily_offset: data.daily_offset,
            ..Default::default()
        }
    }
}

impl From<DataV3> for BundleData {
    fn from(data: DataV3) -> Self {
        Self {
            vocab_progress: data.vocab_progress,
            vocab_progress_daily: data.vocab_progress_daily,
            vocab_highest: data.vocab_highest,
            daily_offset: data.daily_offset,
            vocab_favorites: data.vocab_favorites,
            vocab_exposure: data.vocab_exposure,
            ..Default::default()
        }
    }
}

impl BundleData {
    pub fn from_store(store: &ProgressStore) -> Self {
        Self {
            vocab_progress: store.familiarity.clone(),
            vocab_progress_daily: store.daily_log.clone(),
            vocab_highest: store.highest.clone(),
            daily_offset: Some(store.chart_offset),
            vocab_favorites: store.favorites.clone(),
            vocab_exposure: store.exposed_at.clone(),
            minigame_highest: store.minigame_highest.clone(),
            minigame_badges: store.badges.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "schema")]
pub enum Bundle {
    #[serde(rename = "fluencyflow.v1")]
    V1(Envelope<DataV1>),
    // v2 changed presentation only
    #[serde(rename = "fluencyflow.v2")]
    V2(Envelope<DataV1>),
    #[serde(rename = "fluencyflow.v3")]
    V3(Envelope<DataV3>),
    #[serde(rename = "fluencyflow.v4")]
    V4(Envelope<BundleData>),
}

impl Bundle {
    /// Snapshot of the whole store in the current schema.
    pub fn export(store: &ProgressStore, now: DateTime<Utc>) -> Self {
        Bundle::V4(Envelope {
            exported_at: Some(iso_timestamp(now)),
            data: BundleData::from_store(store),
        })
    }

    pub fn schema(&self) -> &'static str {
        match self {
            Bundle::V1(_) => ACCEPTED_SCHEMAS[0],
            Bundle::V2(_) => ACCEPTED_SCHEMAS[1],
            Bundle::V3(_) => ACCEPTED_SCHEMAS[2],
            Bundle::V4(_) => ACCEPTED_SCHEMAS[3],
        }
    }

    pub fn exported_at(&self) -> Option<&str> {
        match self {
            Bundle::V1(env) | Bundle::V2(env) => env.exported_at.as_deref(),
            Bundle::V3(env) => env.exported_at.as_deref(),
            Bundle::V4(env) => env.exported_at.as_deref(),
        }
    }

    /// Converges every version on the canonical shape; absent fields are empty.
    pub fn upgrade(self) -> BundleData {
        match self {
            Bundle::V1(env) | Bundle::V2(env) => env.data.into(),
            Bundle::V3(env) => env.data.into(),
            Bundle::V4(env) => env.data,
        }
    }

    pub fn to_json(&self) -> Result<String, FluencyError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Validates the schema tag before decoding so the caller can tell a
/// foreign file from a corrupt one.
pub fn parse_bundle(text: &str) -> Result<Bundle, FluencyError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| FluencyError::InvalidImport(e.to_string()))?;

    let schema = match value.get("schema") {
        None | Some(serde_json::Value::Null) => return Err(FluencyError::MissingSchema),
        Some(serde_json::Value::String(schema)) => schema.clone(),
        Some(other) => return Err(FluencyError::UnsupportedSchema(other.to_string())),
    };
    if !ACCEPTED_SCHEMAS.contains(&schema.as_str()) {
        return Err(FluencyError::UnsupportedSchema(schema));
    }

    serde_json::from_value(value).map_err(|e| FluencyError::InvalidImport(e.to_string()))
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("{}_progress_{}.json", SCHEMA_NAMESPACE, date.format("%Y%m%d"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    Merge,
    Replace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub schema: &'static str,
    pub mode: ImportMode,
    pub tracked_words: usize,
    pub imported_points: u64,
}

/// Computes the store that results from importing `data`. Pure; the caller
/// persists the result.
pub fn reconcile(store: &ProgressStore, data: &BundleData, mode: ImportMode) -> ProgressStore {
    let chart_offset = data.daily_offset.unwrap_or(store.chart_offset);

    match mode {
        ImportMode::Replace => ProgressStore {
            familiarity: data.vocab_progress.clone(),
            highest: data.vocab_highest.clone(),
            daily_log: data.vocab_progress_daily.clone(),
            favorites: data.vocab_favorites.clone(),
            exposed_at: data.vocab_exposure.clone(),
            minigame_highest: data.minigame_highest.clone(),
            badges: data.minigame_badges.clone(),
            chart_offset,
        },
        ImportMode::Merge => ProgressStore {
            familiarity: merge::merge_ranked(&store.familiarity, &data.vocab_progress),
            highest: merge::merge_ranked(&store.highest, &data.vocab_highest),
            daily_log: merge::merge_daily_log(&store.daily_log, &data.vocab_progress_daily),
            favorites: merge::merge_favorites(&store.favorites, &data.vocab_favorites),
            exposed_at: merge::merge_exposure(&store.exposed_at, &data.vocab_exposure),
            minigame_highest: merge::merge_ranked(&store.minigame_highest, &data.minigame_highest),
            badges: merge::merge_badges(&store.badges, &data.minigame_badges),
            chart_offset,
        },
    }
}
