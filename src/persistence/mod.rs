use std::{
    env,
    fs,
    path::{
        Path,
        PathBuf,
    },
};

use serde::{
    Deserialize,
    Serialize,
};

use crate::core::FluencyError;

pub mod storage;

pub use storage::{
    FileStorage,
    MemoryStorage,
    Storage,
    StorageKey,
};

const APP_NAME: &str = "fluencyflow";
pub const DATA_DIR_ENV: &str = "FLUENCYFLOW_DATA_DIR";

/// Resolves the data directory: explicit override, then the environment,
/// then the platform's local data dir.
pub fn get_app_data_dir(override_dir: Option<&Path>) -> PathBuf {
    let app_dir = if let Some(dir) = override_dir {
        dir.to_path_buf()
    } else if let Some(dir) = env::var_os(DATA_DIR_ENV) {
        PathBuf::from(dir)
    } else if let Some(data_dir) = dirs::data_local_dir() {
        data_dir.join(APP_NAME)
    } else {
        PathBuf::from(".")
    };
    let _ = fs::create_dir_all(&app_dir);
    app_dir
}

pub fn save_json<T: Serialize>(data: &T, path: &Path) -> Result<(), FluencyError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(data)?;
    fs::write(path, json)?;
    log::debug!("Data saved to: {}", path.display());
    Ok(())
}

pub fn load_json<T: for<'de> Deserialize<'de> + Default>(path: &Path) -> Result<T, FluencyError> {
    if !path.exists() {
        return Ok(T::default());
    }

    let json = fs::read_to_string(path)?;
    let data: T = serde_json::from_str(&json)?;
    log::debug!("Data loaded from: {}", path.display());
    Ok(data)
}

pub fn load_json_or_default<T: for<'de> Deserialize<'de> + Default>(path: &Path) -> T {
    match load_json::<T>(path) {
        Ok(data) => data,
        Err(e) => {
            log::warn!("Failed to load {}: {}. Using defaults.", path.display(), e);
            T::default()
        }
    }
}
