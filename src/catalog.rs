use std::{
    fs,
    path::Path,
};

use csv::{
    ReaderBuilder,
    StringRecord,
};

use crate::{
    core::{
        FluencyError,
        WordRecord,
    },
    progress::ProgressStore,
};

pub const COLUMN_ORIGINAL: &str = "Original";
pub const COLUMN_READING: &str = "Furigana";
pub const COLUMN_TRANSLATION: &str = "English";
pub const COLUMN_LEVEL: &str = "JLPT Level";

const BOM: char = '\u{FEFF}';

struct ColumnIndex {
    original: Option<usize>,
    reading: Option<usize>,
    translation: Option<usize>,
    level: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Self {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        Self {
            original: find(COLUMN_ORIGINAL),
            reading: find(COLUMN_READING),
            translation: find(COLUMN_TRANSLATION),
            level: find(COLUMN_LEVEL),
        }
    }

    fn field<'r>(record: &'r StringRecord, idx: Option<usize>) -> &'r str {
        idx.and_then(|i| record.get(i)).unwrap_or("")
    }

    fn word(&self, record: &StringRecord) -> WordRecord {
        WordRecord::new(
            Self::field(record, self.original),
            Self::field(record, self.reading),
            Self::field(record, self.translation),
            Self::field(record, self.level),
        )
    }
}

/// Parses the word list and overlays persisted progress. Missing columns
/// yield empty fields; rows are never rejected for content.
pub fn parse_catalog(text: &str, store: &ProgressStore) -> Result<Vec<WordRecord>, FluencyError> {
    let text = text.strip_prefix(BOM).unwrap_or(text);

    let mut reader = ReaderBuilder::new().has_headers(true).flexible(true).from_reader(text.as_bytes());
    let columns = ColumnIndex::from_headers(reader.headers()?);

    let mut words = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        words.push(columns.word(&record));
    }

    rehydrate(&mut words, store);
    log::info!("Loaded {} words", words.len());
    Ok(words)
}

pub fn load_catalog_file(path: &Path, store: &ProgressStore) -> Result<Vec<WordRecord>, FluencyError> {
    let text = fs::read_to_string(path).map_err(|e| {
        FluencyError::Custom(format!("Failed to read word list {}: {}", path.display(), e))
    })?;
    parse_catalog(&text, store)
}

/// Re-applies every per-key overlay from the store.
pub fn rehydrate(words: &mut [WordRecord], store: &ProgressStore) {
    for word in words.iter_mut() {
        word.familiarity = store.familiarity_of(&word.key);
        word.is_favorite = store.is_favorite(&word.key);
        word.exposed_at = store.exposed_at.get(&word.key).cloned();
        word.minigame_best = store.minigame_best(&word.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        FamiliarityLevel,
        MinigameTier,
    };

    const SAMPLE: &str = "\u{FEFF}Original,Furigana,English,JLPT Level\n\
        猫,ねこ,cat,n5\n\
        \n\
        \u{0020}食べる , たべる ,to eat,N5\n\
        勉強,べんきょう,study\n";

    #[test]
    fn test_parse_catalog_strips_bom_and_trims() {
        let words = parse_catalog(SAMPLE, &ProgressStore::default()).unwrap();
        assert_eq!(words.len(), 3);

        assert_eq!(words[0].original, "猫");
        assert_eq!(words[0].key, "猫|ねこ|cat");
        assert_eq!(words[0].level, "N5");

        assert_eq!(words[1].original, "食べる");
        assert_eq!(words[1].reading, "たべる");
        assert_eq!(words[1].romaji, "taberu");

        // Ragged row: level column missing
        assert_eq!(words[2].level, "");
        assert!(words.iter().all(|w| w.familiarity == FamiliarityLevel::Unknown));
    }

    #[test]
    fn test_parse_catalog_joins_progress() {
        let mut store = ProgressStore::default();
        store.familiarity.insert("猫|ねこ|cat".to_string(), FamiliarityLevel::Known);
        store.favorites.insert("猫|ねこ|cat".to_string(), true);
        store.exposed_at.insert("猫|ねこ|cat".to_string(), "2024-01-01T00:00:00.000Z".to_string());
        store.minigame_highest.insert("猫|ねこ|cat".to_string(), MinigameTier::Hard);

        let words = parse_catalog(SAMPLE, &store).unwrap();
        let cat = &words[0];
        assert_eq!(cat.familiarity, FamiliarityLevel::Known);
        assert!(cat.is_favorite);
        assert_eq!(cat.exposed_at.as_deref(), Some("2024-01-01T00:00:00.000Z"));
        assert_eq!(cat.minigame_best, MinigameTier::Hard);

        let eat = &words[1];
        assert_eq!(eat.familiarity, FamiliarityLevel::Unknown);
        assert!(!eat.is_favorite);
        assert_eq!(eat.exposed_at, None);
        assert_eq!(eat.minigame_best, MinigameTier::None);
    }

    #[test]
    fn test_missing_columns_produce_degenerate_records() {
        let words = parse_catalog("Word,Meaning\n猫,cat\n", &ProgressStore::default()).unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].key, "||");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_catalog_file(&dir.path().join("missing.csv"), &ProgressStore::default());
        assert!(result.is_err());
    }
}
