use std::{
    collections::BTreeMap,
    sync::OnceLock,
};

use chrono::NaiveDate;
use regex::Regex;

use crate::{
    core::{
        FamiliarityLevel,
        WordRecord,
    },
    progress::ProgressStore,
};

fn jlpt_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^N[1-5]$").expect("valid JLPT pattern"))
}

pub fn is_jlpt_level(level: &str) -> bool {
    jlpt_pattern().is_match(level)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelCounts {
    pub total: usize,
    pub well_known: usize,
    pub known: usize,
    pub explored: usize,
    pub unknown: usize,
}

impl LevelCounts {
    fn add(&mut self, familiarity: FamiliarityLevel) {
        self.total += 1;
        match familiarity {
            FamiliarityLevel::WellKnown => self.well_known += 1,
            FamiliarityLevel::Known => self.known += 1,
            FamiliarityLevel::Explored => self.explored += 1,
            FamiliarityLevel::Unknown => self.unknown += 1,
        }
    }

    fn absorb(&mut self, other: &LevelCounts) {
        self.total += other.total;
        self.well_known += other.well_known;
        self.known += other.known;
        self.explored += other.explored;
        self.unknown += other.unknown;
    }

    /// Words marked anything above unknown.
    pub fn touched(&self) -> usize {
        self.well_known + self.known + self.explored
    }

    pub fn percent_touched(&self) -> f64 {
        self.touched() as f64 / self.total.max(1) as f64 * 100.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressStats {
    pub by_level: BTreeMap<String, LevelCounts>,
    pub totals: LevelCounts,
    pub total_points: u64,
    pub today_points: u32,
    pub favorites: usize,
}

impl ProgressStats {
    /// Words without a recognised JLPT level are left out of the counts.
    pub fn collect(words: &[WordRecord], store: &ProgressStore, today: NaiveDate) -> Self {
        let mut by_level: BTreeMap<String, LevelCounts> = BTreeMap::new();
        for word in words.iter().filter(|w| is_jlpt_level(&w.level)) {
            by_level.entry(word.level.clone()).or_default().add(word.familiarity);
        }

        let mut totals = LevelCounts::default();
        for counts in by_level.values() {
            totals.absorb(counts);
        }

        Self {
            by_level,
            totals,
            total_points: store.total_points(),
            today_points: store.points_on(today),
            favorites: words.iter().filter(|w| w.is_favorite).count(),
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{} / {} words ({:.1}%), {} total progress points",
            self.totals.touched(),
            self.totals.total,
            self.totals.percent_touched(),
            self.total_points
        )
    }
}
