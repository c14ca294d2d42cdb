/// Label of the "no selection" entry at index 0 of every selector.
pub const PLACEHOLDER_LABEL: &str = "---------";

pub trait Labeled {
    fn label(&self) -> &str;
}

/// A drop-down: index 0 is always the placeholder, options follow in order.
#[derive(Debug, Clone)]
pub struct Selector<T> {
    options: Vec<T>,
    selected: usize,
}

impl<T: Labeled> Selector<T> {
    pub fn new(options: Vec<T>) -> Self {
        Self {
            options,
            selected: 0,
        }
    }

    /// Number of entries including the placeholder.
    fn entry_count(&self) -> usize {
        self.options.len() + 1
    }

    pub fn has_options(&self) -> bool {
        !self.options.is_empty()
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// Out-of-range indices are clamped to the last entry.
    pub fn select(&mut self, index: usize) {
        self.selected = index.min(self.entry_count() - 1);
    }

    pub fn selected(&self) -> Option<&T> {
        self.get(self.selected)
    }

    /// Option at a selector index; `None` for the placeholder.
    pub fn get(&self, index: usize) -> Option<&T> {
        index.checked_sub(1).and_then(|i| self.options.get(i))
    }

    pub fn label_at(&self, index: usize) -> &str {
        self.get(index).map_or(PLACEHOLDER_LABEL, |o| o.label())
    }

    pub fn selected_label(&self) -> &str {
        self.label_at(self.selected)
    }

    pub fn position(&self, predicate: impl Fn(&T) -> bool) -> Option<usize> {
        self.options.iter().position(predicate).map(|i| i + 1)
    }

    pub fn next_index(&self) -> usize {
        (self.selected + 1) % self.entry_count()
    }

    pub fn prev_index(&self) -> usize {
        if self.selected == 0 {
            self.entry_count() - 1
        } else {
            self.selected - 1
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextField {
    pub value: String,
    pub enabled: bool,
}

impl TextField {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            enabled: true,
        }
    }
}

impl Default for TextField {
    fn default() -> Self {
        Self::new("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    impl Labeled for &'static str {
        fn label(&self) -> &str {
            self
        }
    }

    #[test]
    fn placeholder_is_index_zero() {
        let selector = Selector::new(vec!["a", "b"]);
        assert_eq!(selector.entry_count(), 3);
        assert_eq!(selector.selected_index(), 0);
        assert_eq!(selector.selected_label(), PLACEHOLDER_LABEL);
        assert!(selector.selected().is_none());
        assert_eq!(selector.label_at(2), "b");
    }

    #[test]
    fn cycling_wraps_through_placeholder() {
        let mut selector = Selector::new(vec!["a", "b"]);
        assert_eq!(selector.prev_index(), 2);
        selector.select(selector.next_index());
        selector.select(selector.next_index());
        assert_eq!(selector.selected_label(), "b");
        assert_eq!(selector.next_index(), 0);
    }

    #[test]
    fn select_clamps() {
        let mut selector = Selector::new(vec!["a"]);
        selector.select(9);
        assert_eq!(selector.selected_index(), 1);

        let mut empty: Selector<&str> = Selector::new(vec![]);
        empty.select(3);
        assert_eq!(empty.selected_index(), 0);
        assert!(!empty.has_options());
    }
}
