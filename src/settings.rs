use std::path::{
    Path,
    PathBuf,
};

use serde::{
    Deserialize,
    Serialize,
};

use crate::{
    browse::DEFAULT_PAGE_SIZE,
    core::FluencyError,
    minigame::DEFAULT_TARGET,
    persistence::{
        load_json_or_default,
        save_json,
    },
    progress::ledger::{
        DEFAULT_CHART_DAYS,
        DEFAULT_VISIBLE_BARS,
    },
};

pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub catalog_path: PathBuf,
    pub page_size: usize,
    pub chart_days: u32,
    pub visible_bars: usize,
    pub minigame_target: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog_path: PathBuf::from("jlpt_vocab.csv"),
            page_size: DEFAULT_PAGE_SIZE,
            chart_days: DEFAULT_CHART_DAYS,
            visible_bars: DEFAULT_VISIBLE_BARS,
            minigame_target: DEFAULT_TARGET.to_string(),
        }
    }
}

impl Settings {
    pub fn path_in(data_dir: &Path) -> PathBuf {
        data_dir.join(SETTINGS_FILE)
    }

    /// Missing or malformed settings fall back to defaults.
    pub fn load(data_dir: &Path) -> Self {
        load_json_or_default(&Self::path_in(data_dir))
    }

    pub fn save(&self, data_dir: &Path) -> Result<(), FluencyError> {
        save_json(self, &Self::path_in(data_dir))
    }

    /// Loads settings, writing the defaults out on first run so they can be edited.
    pub fn load_or_init(data_dir: &Path) -> Self {
        if Self::path_in(data_dir).exists() {
            return Self::load(data_dir);
        }
        let settings = Self::default();
        if let Err(e) = settings.save(data_dir) {
            log::warn!("Could not write default settings: {}", e);
        }
        settings
    }
}
