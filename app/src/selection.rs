use std::collections::HashSet;

/// Tri-state of the "check all" box over the visible rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    None,
    Partial,
    All,
}

/// Invoice ids checked for bulk actions. Order is irrelevant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: HashSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: &str) {
        self.ids.insert(id.to_string());
    }

    pub fn remove(&mut self, id: &str) {
        self.ids.remove(id);
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected ids that are also visible, in visible order. Bulk actions use
    /// only this, so a record hidden by the filter is never touched.
    pub fn selected_within_visible<'a, I>(&self, visible_ids: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        visible_ids
            .into_iter()
            .filter(|id| self.ids.contains(*id))
            .map(str::to_string)
            .collect()
    }

    pub fn select_all<'a, I>(&mut self, visible_ids: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for id in visible_ids {
            self.add(id);
        }
    }

    pub fn deselect_all<'a, I>(&mut self, visible_ids: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for id in visible_ids {
            self.remove(id);
        }
    }

    pub fn check_state<'a, I>(&self, visible_ids: I) -> CheckState
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = 0usize;
        let mut checked = 0usize;
        for id in visible_ids {
            seen += 1;
            if self.contains(id) {
                checked += 1;
            }
        }
        match checked {
            0 => CheckState::None,
            n if n == seen => CheckState::All,
            _ => CheckState::Partial,
        }
    }

    /// Drops ids that no longer exist in the collection.
    pub fn retain_existing<'a, I>(&mut self, existing_ids: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let existing: HashSet<&str> = existing_ids.into_iter().collect();
        self.ids.retain(|id| existing.contains(id.as_str()));
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operations_are_idempotent() {
        let mut sel = SelectionSet::new();
        sel.add("a");
        sel.add("a");
        assert_eq!(sel.len(), 1);
        sel.remove("b");
        sel.remove("a");
        sel.remove("a");
        assert!(sel.is_empty());
    }

    #[test]
    fn only_visible_selections_are_acted_on() {
        let mut sel = SelectionSet::new();
        sel.add("hidden");
        sel.add("b");
        sel.add("a");
        let visible = ["a", "c", "b"];
        assert_eq!(sel.selected_within_visible(visible), vec!["a", "b"]);
    }

    #[test]
    fn check_state_tracks_visible_rows() {
        let mut sel = SelectionSet::new();
        let visible = ["a", "b"];
        assert_eq!(sel.check_state(visible), CheckState::None);
        sel.add("a");
        assert_eq!(sel.check_state(visible), CheckState::Partial);
        sel.select_all(visible);
        assert_eq!(sel.check_state(visible), CheckState::All);
        sel.deselect_all(["b"]);
        assert_eq!(sel.check_state(visible), CheckState::Partial);
        assert_eq!(sel.check_state([]), CheckState::None);
    }

    #[test]
    fn retain_existing_prunes_dangling_ids() {
        let mut sel = SelectionSet::new();
        sel.select_all(["a", "b", "c"]);
        sel.retain_existing(["b", "z"]);
        assert!(sel.contains("b"));
        assert!(!sel.contains("a"));
        assert_eq!(sel.len(), 1);
    }
}
