use std::{
    collections::BTreeMap,
    fs,
    io,
    path::{
        Path,
        PathBuf,
    },
};

use crate::core::FluencyError;

/// Fixed names of the persisted progress blobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Progress,
    DailyLog,
    Highest,
    Favorites,
    Exposure,
    MinigameHighest,
    MinigameBadges,
    ChartOffset,
}

impl StorageKey {
    pub const ALL: [StorageKey; 8] = [
        StorageKey::Progress,
        StorageKey::DailyLog,
        StorageKey::Highest,
        StorageKey::Favorites,
        StorageKey::Exposure,
        StorageKey::MinigameHighest,
        StorageKey::MinigameBadges,
        StorageKey::ChartOffset,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::Progress => "vocabProgress",
            StorageKey::DailyLog => "vocabProgressDaily",
            StorageKey::Highest => "vocabHighest",
            StorageKey::Favorites => "vocabFavorites",
            StorageKey::Exposure => "vocabExposure",
            StorageKey::MinigameHighest => "minigameHighest",
            StorageKey::MinigameBadges => "minigameBadges",
            StorageKey::ChartOffset => "dailyOffset",
        }
    }
}

/// String key-value store in the shape of browser local storage.
pub trait Storage {
    fn get_item(&self, key: StorageKey) -> Result<Option<String>, FluencyError>;
    fn set_item(&mut self, key: StorageKey, value: &str) -> Result<(), FluencyError>;
    fn remove_item(&mut self, key: StorageKey) -> Result<(), FluencyError>;
}

/// One `<key>.json` file per blob under a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn open(dir: &Path) -> Result<Self, FluencyError> {
        fs::create_dir_all(dir)?;
        Ok(Self { dir: dir.to_path_buf() })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn item_path(&self, key: StorageKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: StorageKey) -> Result<Option<String>, FluencyError> {
        match fs::read_to_string(self.item_path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&mut self, key: StorageKey, value: &str) -> Result<(), FluencyError> {
        let path = self.item_path(key);
        fs::write(&path, value)?;
        log::debug!("Wrote {}", path.display());
        Ok(())
    }

    fn remove_item(&mut self, key: StorageKey) -> Result<(), FluencyError> {
        let path = self.item_path(key);
        if path.exists() {
            fs::remove_file(&path)?;
            log::debug!("Deleted: {}", path.display());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: BTreeMap<&'static str, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: StorageKey) -> Result<Option<String>, FluencyError> {
        Ok(self.items.get(key.as_str()).cloned())
    }

    fn set_item(&mut self, key: StorageKey, value: &str) -> Result<(), FluencyError> {
        self.items.insert(key.as_str(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: StorageKey) -> Result<(), FluencyError> {
        self.items.remove(key.as_str());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::open(dir.path()).unwrap();

        assert_eq!(storage.get_item(StorageKey::DailyLog).unwrap(), None);
        storage.set_item(StorageKey::DailyLog, "{\"2024-01-01\":3}").unwrap();
        assert!(dir.path().join("vocabProgressDaily.json").exists());
        assert_eq!(
            storage.get_item(StorageKey::DailyLog).unwrap().as_deref(),
            Some("{\"2024-01-01\":3}")
        );

        storage.remove_item(StorageKey::DailyLog).unwrap();
        assert_eq!(storage.get_item(StorageKey::DailyLog).unwrap(), None);
        // Removing twice is fine
        storage.remove_item(StorageKey::DailyLog).unwrap();
    }

    #[test]
    fn test_memory_storage() {
        let mut storage = MemoryStorage::new();
        storage.set_item(StorageKey::ChartOffset, "4").unwrap();
        assert_eq!(storage.len(), 1);
        assert_eq!(storage.get_item(StorageKey::ChartOffset).unwrap().as_deref(), Some("4"));
        storage.remove_item(StorageKey::ChartOffset).unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn test_storage_key_names_are_distinct() {
        let mut names: Vec<&str> = StorageKey::ALL.iter().map(|k| k.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), StorageKey::ALL.len());
    }
}
