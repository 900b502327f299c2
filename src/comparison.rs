//! Country comparison state.
//!
//! Tracks which countries are overlaid on the selected one in the trend view.

use std::collections::BTreeSet;

/// Countries marked for comparison, by ISO3 code
#[derive(Debug, Default)]
pub struct ComparisonState {
    /// Ordered so overlay colors stay stable between frames
    marked: BTreeSet<String>,
}

impl ComparisonState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle a country's comparison status. Returns true if it is now marked.
    pub fn toggle(&mut self, code: &str) -> bool {
        if self.marked.remove(code) {
            false
        } else {
            self.marked.insert(code.to_string());
            true
        }
    }

    pub fn is_marked(&self, code: &str) -> bool {
        self.marked.contains(code)
    }

    pub fn clear(&mut self) {
        self.marked.clear();
    }

    pub fn len(&self) -> usize {
        self.marked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marked.is_empty()
    }

    /// Marked countries to overlay, excluding the one already selected
    pub fn overlay_codes<'a>(&'a self, selected: Option<&'a str>) -> impl Iterator<Item = &'a str> {
        self.marked
            .iter()
            .map(String::as_str)
            .filter(move |code| Some(*code) != selected)
    }

    /// Forget countries that no longer exist, e.g. after a dataset reload
    pub fn retain_known<'a>(&mut self, known: impl IntoIterator<Item = &'a str>) {
        let known: BTreeSet<&str> = known.into_iter().collect();
        self.marked.retain(|code| known.contains(code.as_str()));
    }
}
