use crate::browse::WordFilter;

pub const DEFAULT_TARGET: &str = "game.html";

/// How the minigame should pick its words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayBy {
    Familiarity(String),
    Jlpt(String),
    Level(u32),
}

impl PlayBy {
    /// The familiarity filter is the most specific and wins over the level filter.
    pub fn from_filter(filter: &WordFilter) -> Self {
        if let Some(familiarity) = filter.familiarity {
            PlayBy::Familiarity(familiarity.as_str().to_string())
        } else if let Some(level) = &filter.level {
            PlayBy::Jlpt(level.to_uppercase())
        } else {
            PlayBy::Level(1)
        }
    }

    pub fn query(&self) -> String {
        match self {
            PlayBy::Familiarity(fam) => format!("playBy=familiarity&fam={}", fam),
            PlayBy::Jlpt(jlpt) => format!("playBy=jlpt&jlpt={}", jlpt),
            PlayBy::Level(level) => format!("playBy=level&level={}", level),
        }
    }
}

pub fn play_link(target: &str, filter: &WordFilter) -> String {
    format!("{}?{}", target, PlayBy::from_filter(filter).query())
}
