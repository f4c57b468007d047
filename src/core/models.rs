use std::{
    fmt,
    str::FromStr,
};

use serde::{
    Deserialize,
    Serialize,
};
use wana_kana::ConvertJapanese;

use super::FluencyError;

/// Anything with a position in a fixed rank order. Merges and watermarks
/// compare through this.
pub trait Ranked {
    fn rank(&self) -> u8;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FamiliarityLevel {
    #[default]
    Unknown,
    Explored,
    Known,
    WellKnown,
}

impl FamiliarityLevel {
    /// Display order of the card buttons, best first.
    pub const ALL: [FamiliarityLevel; 4] = [
        FamiliarityLevel::WellKnown,
        FamiliarityLevel::Known,
        FamiliarityLevel::Explored,
        FamiliarityLevel::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FamiliarityLevel::Unknown => "unknown",
            FamiliarityLevel::Explored => "explored",
            FamiliarityLevel::Known => "known",
            FamiliarityLevel::WellKnown => "well_known",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FamiliarityLevel::Unknown => "unknown",
            FamiliarityLevel::Explored => "explored",
            FamiliarityLevel::Known => "known",
            FamiliarityLevel::WellKnown => "well known",
        }
    }
}

impl Ranked for FamiliarityLevel {
    fn rank(&self) -> u8 {
        match self {
            FamiliarityLevel::Unknown => 0,
            FamiliarityLevel::Explored => 1,
            FamiliarityLevel::Known => 2,
            FamiliarityLevel::WellKnown => 3,
        }
    }
}

impl fmt::Display for FamiliarityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FamiliarityLevel {
    type Err = FluencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "unknown" => Ok(FamiliarityLevel::Unknown),
            "explored" => Ok(FamiliarityLevel::Explored),
            "known" => Ok(FamiliarityLevel::Known),
            "well_known" => Ok(FamiliarityLevel::WellKnown),
            other => Err(FluencyError::Custom(format!("Unknown familiarity level: {}", other))),
        }
    }
}

/// Best difficulty cleared in the companion minigame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinigameTier {
    #[default]
    None,
    Easy,
    Medium,
    Hard,
}

impl MinigameTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            MinigameTier::None => "none",
            MinigameTier::Easy => "easy",
            MinigameTier::Medium => "medium",
            MinigameTier::Hard => "hard",
        }
    }
}

impl Ranked for MinigameTier {
    fn rank(&self) -> u8 {
        match self {
            MinigameTier::None => 0,
            MinigameTier::Easy => 1,
            MinigameTier::Medium => 2,
            MinigameTier::Hard => 3,
        }
    }
}

impl fmt::Display for MinigameTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MinigameTier {
    type Err = FluencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(MinigameTier::None),
            "easy" => Ok(MinigameTier::Easy),
            "medium" => Ok(MinigameTier::Medium),
            "hard" => Ok(MinigameTier::Hard),
            other => Err(FluencyError::Custom(format!("Unknown minigame tier: {}", other))),
        }
    }
}

pub const KEY_SEPARATOR: char = '|';

pub fn word_key(original: &str, reading: &str, translation: &str) -> String {
    format!("{original}{KEY_SEPARATOR}{reading}{KEY_SEPARATOR}{translation}")
}

#[derive(Debug, Clone, PartialEq)]
pub struct WordRecord {
    pub original: String,    // Written form, usually with kanji
    pub reading: String,     // Furigana
    pub translation: String, // English gloss
    pub level: String,       // Uppercased JLPT code, e.g. "N5"
    pub key: String,
    pub romaji: String,

    pub familiarity: FamiliarityLevel,
    pub is_favorite: bool,
    pub exposed_at: Option<String>,
    pub minigame_best: MinigameTier,
}

impl WordRecord {
    pub fn new(original: &str, reading: &str, translation: &str, level: &str) -> Self {
        let original = original.trim().to_string();
        let reading = reading.trim().to_string();
        let translation = translation.trim().to_string();
        let level = level.trim().to_uppercase();
        let key = word_key(&original, &reading, &translation);
        let romaji = reading.as_str().to_romaji();

        Self {
            original,
            reading,
            translation,
            level,
            key,
            romaji,
            familiarity: FamiliarityLevel::Unknown,
            is_favorite: false,
            exposed_at: None,
            minigame_best: MinigameTier::None,
        }
    }
}
