pub mod browse;
pub mod bundle;
pub mod catalog;
pub mod core;
pub mod minigame;
pub mod persistence;
pub mod progress;
pub mod settings;
pub mod stats;
pub mod tracker;

pub use crate::core::{
    FamiliarityLevel,
    FluencyError,
    MinigameTier,
    WordRecord,
};
pub use bundle::{
    Bundle,
    ImportMode,
};
pub use progress::ProgressStore;
pub use tracker::Tracker;
