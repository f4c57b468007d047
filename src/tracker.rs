use std::path::Path;

use chrono::NaiveDate;

use crate::{
    browse::{
        paginate,
        Page,
        WordFilter,
    },
    bundle::{
        parse_bundle,
        reconcile,
        Bundle,
        ImportMode,
        ImportSummary,
    },
    catalog,
    core::{
        utils::iso_timestamp,
        Clock,
        FamiliarityLevel,
        FluencyError,
        MinigameTier,
        WordRecord,
    },
    persistence::{
        Storage,
        StorageKey,
    },
    progress::{
        ledger::render_bars,
        ChartWindow,
        DailyPoint,
        DailySeries,
        FamiliarityChange,
        ProgressStore,
    },
    stats::ProgressStats,
};

/// Application root: owns the word list, the progress store and the
/// storage it is persisted to. Every user action is one method call that
/// finishes its read-modify-write before returning.
pub struct Tracker<S: Storage> {
    storage: S,
    clock: Box<dyn Clock>,
    store: ProgressStore,
    words: Vec<WordRecord>,
}

impl<S: Storage> Tracker<S> {
    pub fn open(mut storage: S, clock: Box<dyn Clock>) -> Result<Self, FluencyError> {
        let mut store = ProgressStore::load(&storage);
        if store.ensure_today_bucket(clock.today()) {
            store.persist(&mut storage, StorageKey::DailyLog)?;
        }
        Ok(Self { storage, clock, store, words: Vec::new() })
    }

    pub fn load_catalog(&mut self, text: &str) -> Result<usize, FluencyError> {
        self.words = catalog::parse_catalog(text, &self.store)?;
        Ok(self.words.len())
    }

    pub fn load_catalog_file(&mut self, path: &Path) -> Result<usize, FluencyError> {
        self.words = catalog::load_catalog_file(path, &self.store)?;
        Ok(self.words.len())
    }

    pub fn words(&self) -> &[WordRecord] {
        &self.words
    }

    pub fn find_word(&self, key: &str) -> Option<&WordRecord> {
        self.words.iter().find(|w| w.key == key)
    }

    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    // Duplicate catalog rows share a key and must move together
    fn words_with_key<'a>(&'a mut self, key: &'a str) -> impl Iterator<Item = &'a mut WordRecord> + 'a {
        self.words.iter_mut().filter(move |w| w.key == key)
    }

    /// Returns `None` when no loaded word has this key.
    pub fn set_familiarity(
        &mut self,
        key: &str,
        level: FamiliarityLevel,
    ) -> Result<Option<FamiliarityChange>, FluencyError> {
        if self.find_word(key).is_none() {
            return Ok(None);
        }
        let today = self.clock.today();
        for word in self.words_with_key(key) {
            word.familiarity = level;
        }

        let change = self.store.apply_familiarity(key, level, today);
        if change.raised_watermark() {
            self.store.persist(&mut self.storage, StorageKey::DailyLog)?;
            self.store.persist(&mut self.storage, StorageKey::Highest)?;
        }

        // The familiarity blob mirrors the loaded word list
        self.store.familiarity =
            self.words.iter().map(|w| (w.key.clone(), w.familiarity)).collect();
        self.store.persist(&mut self.storage, StorageKey::Progress)?;

        log::debug!("{} -> {} (+{} points)", key, level, change.points_awarded);
        Ok(Some(change))
    }

    pub fn toggle_favorite(&mut self, key: &str) -> Result<Option<bool>, FluencyError> {
        if self.find_word(key).is_none() {
            return Ok(None);
        }
        let favorite = self.store.toggle_favorite(key);
        for word in self.words_with_key(key) {
            word.is_favorite = favorite;
        }
        self.store.persist(&mut self.storage, StorageKey::Favorites)?;
        Ok(Some(favorite))
    }

    /// Stamps the first time a word is shown. Later calls keep the first stamp.
    pub fn mark_exposed(&mut self, key: &str) -> Result<Option<String>, FluencyError> {
        if self.find_word(key).is_none() {
            return Ok(None);
        }
        if self.store.mark_exposed(key, iso_timestamp(self.clock.now())) {
            self.store.persist(&mut self.storage, StorageKey::Exposure)?;
        }
        let stamp = self.store.exposed_at.get(key).cloned();
        for word in self.words_with_key(key) {
            word.exposed_at = stamp.clone();
        }
        Ok(stamp)
    }

    pub fn record_minigame(
        &mut self,
        key: &str,
        tier: MinigameTier,
    ) -> Result<Option<MinigameTier>, FluencyError> {
        if self.find_word(key).is_none() {
            return Ok(None);
        }
        if self.store.record_minigame(key, tier) {
            self.store.persist(&mut self.storage, StorageKey::MinigameHighest)?;
        }
        let best = self.store.minigame_best(key);
        for word in self.words_with_key(key) {
            word.minigame_best = best;
        }
        Ok(Some(best))
    }

    pub fn award_badge(&mut self, key: &str, value: serde_json::Value) -> Result<(), FluencyError> {
        self.store.award_badge(key, value);
        self.store.persist(&mut self.storage, StorageKey::MinigameBadges)
    }

    pub fn today_points(&self) -> u32 {
        self.store.points_on(self.clock.today())
    }

    pub fn daily_series(&self, window_days: u32) -> DailySeries<'_> {
        self.store.daily_series(self.clock.today(), window_days)
    }

    pub fn chart_window(&self, visible: usize) -> ChartWindow {
        ChartWindow::new(visible, self.store.chart_offset)
    }

    /// Moves the chart by `delta` days (positive scrolls into the past).
    pub fn scroll_chart(
        &mut self,
        delta: i64,
        window_days: u32,
        visible: usize,
    ) -> Result<ChartWindow, FluencyError> {
        let window = self.chart_window(visible).scroll(delta, window_days as usize);
        self.store.chart_offset = window.offset as i64;
        self.store.persist(&mut self.storage, StorageKey::ChartOffset)?;
        Ok(window)
    }

    pub fn visible_points(&self, window_days: u32, visible: usize) -> Vec<DailyPoint> {
        let points: Vec<DailyPoint> = self.daily_series(window_days).collect();
        let range = self.chart_window(visible).range(points.len());
        points[range].to_vec()
    }

    pub fn render_chart(&self, window_days: u32, visible: usize) -> String {
        render_bars(&self.visible_points(window_days, visible), self.clock.today())
    }

    pub fn export_bundle(&self) -> Bundle {
        Bundle::export(&self.store, self.clock.now())
    }

    pub fn import_text(&mut self, text: &str, mode: ImportMode) -> Result<ImportSummary, FluencyError> {
        let bundle = parse_bundle(text)?;
        self.import_bundle(bundle, mode)
    }

    /// Nothing is written until the whole bundle has been reconciled.
    pub fn import_bundle(&mut self, bundle: Bundle, mode: ImportMode) -> Result<ImportSummary, FluencyError> {
        let schema = bundle.schema();
        let data = bundle.upgrade();
        let imported_points: u64 = data.vocab_progress_daily.values().map(|&v| v as u64).sum();
        let tracked_words = data.vocab_progress.len();

        let mut next = reconcile(&self.store, &data, mode);
        next.ensure_today_bucket(self.clock.today());
        next.persist_all(&mut self.storage)?;
        self.store = next;
        catalog::rehydrate(&mut self.words, &self.store);

        log::info!("Imported {} ({:?}): {} words, {} points", schema, mode, tracked_words, imported_points);
        Ok(ImportSummary { schema, mode, tracked_words, imported_points })
    }

    pub fn reset(&mut self) -> Result<(), FluencyError> {
        let today = self.clock.today();
        self.store.reset(&mut self.storage, today)?;
        catalog::rehydrate(&mut self.words, &self.store);
        log::info!("Progress fully reset");
        Ok(())
    }

    pub fn stats(&self) -> ProgressStats {
        ProgressStats::collect(&self.words, &self.store, self.clock.today())
    }

    pub fn browse(&self, filter: &WordFilter, page: usize, per_page: usize) -> Page<'_> {
        let matching: Vec<&WordRecord> = self.words.iter().filter(|w| filter.matches(w)).collect();
        paginate(matching, page, per_page)
    }
}
