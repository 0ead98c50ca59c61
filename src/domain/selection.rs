use super::{Asset, AssetId};
use std::collections::HashSet;

/// Ids the user intends to delete during one review session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: HashSet<AssetId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &HashSet<AssetId> {
        &self.ids
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

    /// Replaces the selection with every displayed asset
    pub fn select_all(&mut self, displayed: &[Asset]) {
        self.ids = displayed.iter().map(|a| a.id.clone()).collect();
    }

    pub fn deselect_all(&mut self) {
        self.ids.clear();
    }

    /// Flips membership of `id`, returning whether it is selected afterwards.
    ///
    /// The id is not checked against any display list.
    pub fn toggle(&mut self, id: &AssetId) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.clone());
            true
        }
    }

    /// Drops selected ids that are not in `displayed`, returning how many were dropped
    pub fn retain_displayed(&mut self, displayed: &[Asset]) -> usize {
        let shown: HashSet<&AssetId> = displayed.iter().map(|a| &a.id).collect();
        let before = self.ids.len();
        self.ids.retain(|id| shown.contains(id));
        before - self.ids.len()
    }

    /// Displayed assets that are selected, in display order
    pub fn selected_in<'a>(&'a self, displayed: &'a [Asset]) -> impl Iterator<Item = &'a Asset> + 'a {
        displayed.iter().filter(move |a| self.ids.contains(&a.id))
    }

    /// Sum of `size_of` over displayed assets that are selected.
    ///
    /// Recomputed on every call; ids outside `displayed` contribute nothing.
    pub fn total_bytes<F>(&self, displayed: &[Asset], mut size_of: F) -> u64
    where
        F: FnMut(&Asset) -> u64,
    {
        self.selected_in(displayed)
            .fold(0u64, |total, asset| total.saturating_add(size_of(asset)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn displayed() -> Vec<Asset> {
        vec![Asset::new("a", None), Asset::new("b", None), Asset::new("c", None)]
    }

    fn sizes() -> HashMap<&'static str, u64> {
        [("a", 100), ("b", 250), ("c", 4)].into()
    }

    #[test]
    fn test_select_all_totals_every_displayed_asset() {
        let shown = displayed();
        let sizes = sizes();
        let mut selection = SelectionSet::new();

        selection.select_all(&shown);

        assert_eq!(selection.len(), 3);
        assert_eq!(selection.total_bytes(&shown, |a| sizes[a.id.as_str()]), 354);
    }

    #[test]
    fn test_select_all_replaces_previous_selection() {
        let mut selection = SelectionSet::new();
        selection.toggle(&AssetId::from("stale"));

        selection.select_all(&displayed());

        assert!(!selection.contains("stale"));
        assert_eq!(selection.len(), 3);
    }

    #[test]
    fn test_deselect_all_zeroes_total() {
        let shown = displayed();
        let mut selection = SelectionSet::new();
        selection.select_all(&shown);

        selection.deselect_all();

        assert!(selection.is_empty());
        assert_eq!(selection.total_bytes(&shown, |_| 1_000), 0);
    }

    #[test]
    fn test_toggle_flips_membership() {
        let mut selection = SelectionSet::new();
        let id = AssetId::from("b");

        assert!(selection.toggle(&id));
        assert!(selection.contains("b"));
        assert!(!selection.toggle(&id));
        assert!(!selection.contains("b"));
    }

    #[test]
    fn test_toggle_unknown_id_is_retained_but_not_counted() {
        let shown = displayed();
        let sizes = sizes();
        let mut selection = SelectionSet::new();

        selection.toggle(&AssetId::from("elsewhere"));
        selection.toggle(&AssetId::from("b"));

        assert!(selection.contains("elsewhere"));
        assert_eq!(
            selection.total_bytes(&shown, |a| sizes[a.id.as_str()]),
            250
        );
    }

    #[test]
    fn test_retain_displayed_prunes_foreign_ids() {
        let mut selection = SelectionSet::new();
        selection.toggle(&AssetId::from("elsewhere"));
        selection.toggle(&AssetId::from("a"));

        assert_eq!(selection.retain_displayed(&displayed()), 1);
        assert!(selection.contains("a"));
        assert!(!selection.contains("elsewhere"));
    }

    #[test]
    fn test_selected_in_follows_display_order() {
        let shown = displayed();
        let mut selection = SelectionSet::new();
        selection.toggle(&AssetId::from("c"));
        selection.toggle(&AssetId::from("a"));

        let ids: Vec<_> = selection.selected_in(&shown).map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }
}
