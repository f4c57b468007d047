use crate::core::{
    FamiliarityLevel,
    WordRecord,
};

pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Active list filters. `None` means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordFilter {
    pub level: Option<String>,
    pub familiarity: Option<FamiliarityLevel>,
    pub favorites_only: bool,
}

impl WordFilter {
    pub fn matches(&self, word: &WordRecord) -> bool {
        let level_ok = match &self.level {
            Some(level) => word.level.eq_ignore_ascii_case(level),
            None => true,
        };
        let familiarity_ok = self.familiarity.map_or(true, |f| word.familiarity == f);
        let favorite_ok = !self.favorites_only || word.is_favorite;

        level_ok && familiarity_ok && favorite_ok
    }
}

#[derive(Debug, Clone)]
pub struct Page<'a> {
    pub items: Vec<&'a WordRecord>,
    pub page: usize, // 1-based, after clamping
    pub total_pages: usize,
    pub total_items: usize,
}

impl Page<'_> {
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.total_pages > 0 && self.page < self.total_pages
    }

    pub fn label(&self) -> String {
        format!("Page {} / {}", self.page, self.total_pages.max(1))
    }
}

/// Slices `items` to the requested page, pulling out-of-range pages back
/// to the last one.
pub fn paginate<'a>(items: Vec<&'a WordRecord>, page: usize, per_page: usize) -> Page<'a> {
    let per_page = per_page.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page);
    let page = page.clamp(1, total_pages.max(1));

    let items = items.into_iter().skip((page - 1) * per_page).take(per_page).collect();
    Page { items, page, total_pages, total_items }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words() -> Vec<WordRecord> {
        let mut words: Vec<WordRecord> = (0..5)
            .map(|i| WordRecord::new(&format!("語{i}"), "ご", &format!("word {i}"), if i < 3 { "N5" } else { "N4" }))
            .collect();
        words[1].familiarity = FamiliarityLevel::Known;
        words[4].familiarity = FamiliarityLevel::Known;
        words[4].is_favorite = true;
        words
    }

    #[test]
    fn test_filter_combinations() {
        let words = words();
        let count = |filter: &WordFilter| words.iter().filter(|w| filter.matches(w)).count();

        assert_eq!(count(&WordFilter::default()), 5);
        assert_eq!(count(&WordFilter { level: Some("n5".to_string()), ..Default::default() }), 3);
        assert_eq!(
            count(&WordFilter { familiarity: Some(FamiliarityLevel::Known), ..Default::default() }),
            2
        );
        assert_eq!(
            count(&WordFilter {
                level: Some("N4".to_string()),
                familiarity: Some(FamiliarityLevel::Known),
                favorites_only: true,
            }),
            1
        );
    }

    #[test]
    fn test_paginate_clamps() {
        let words = words();
        let all: Vec<&WordRecord> = words.iter().collect();

        let first = paginate(all.clone(), 1, 2);
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.total_pages, 3);
        assert!(!first.has_prev());
        assert!(first.has_next());

        let last = paginate(all.clone(), 7, 2);
        assert_eq!(last.page, 3);
        assert_eq!(last.items.len(), 1);
        assert!(!last.has_next());
        assert_eq!(last.label(), "Page 3 / 3");

        let empty = paginate(Vec::new(), 4, 100);
        assert_eq!(empty.page, 1);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_prev() && !empty.has_next());
        assert_eq!(empty.label(), "Page 1 / 1");
    }
}
