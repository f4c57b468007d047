pub mod errors;
pub mod models;
pub mod utils;

pub use errors::FluencyError;
pub use models::{
    FamiliarityLevel,
    MinigameTier,
    Ranked,
    WordRecord,
};
pub use utils::{
    Clock,
    FixedClock,
    SystemClock,
};
