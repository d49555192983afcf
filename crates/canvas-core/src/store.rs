//! Ordered element store.
//!
//! Insertion order is z-order (first = back). Elements are kept as
//! `Arc<Element>` values: readers clone the `Arc` and keep a consistent
//! snapshot no matter what the gateway does afterwards. Deleted elements
//! stay in the store as tombstones until [`ElementStore::purge_deleted`].

use crate::id::ElementId;
use crate::model::Element;
use indexmap::IndexMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct ElementStore {
    elements: IndexMap<ElementId, Arc<Element>>,
}

impl ElementStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append on top of the z-order. An element with the same id is
    /// replaced in place.
    pub(crate) fn insert(&mut self, element: Arc<Element>) {
        self.elements.insert(element.id, element);
    }

    /// Swap in the next value of an existing element, keeping its z-index.
    pub(crate) fn replace(&mut self, element: Arc<Element>) {
        if let Some(slot) = self.elements.get_mut(&element.id) {
            *slot = element;
        }
    }

    /// Look up any element, tombstones included.
    pub fn get(&self, id: ElementId) -> Option<&Arc<Element>> {
        self.elements.get(&id)
    }

    /// Look up a live (non-deleted) element.
    pub fn get_live(&self, id: ElementId) -> Option<&Arc<Element>> {
        self.elements.get(&id).filter(|e| e.is_live())
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    /// All elements back to front, tombstones included.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Arc<Element>> {
        self.elements.values()
    }

    /// Live elements back to front.
    pub fn iter_live(&self) -> impl DoubleEndedIterator<Item = &Arc<Element>> {
        self.elements.values().filter(|e| e.is_live())
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.iter_live().count()
    }

    pub fn z_index(&self, id: ElementId) -> Option<usize> {
        self.elements.get_index_of(&id)
    }

    /// Move an element one step backward in z-order.
    /// Returns true if the z-order changed.
    pub fn send_backward(&mut self, id: ElementId) -> bool {
        match self.z_index(id) {
            Some(pos) if pos > 0 => {
                self.elements.swap_indices(pos, pos - 1);
                true
            }
            _ => false,
        }
    }

    /// Move an element one step forward in z-order.
    pub fn bring_forward(&mut self, id: ElementId) -> bool {
        match self.z_index(id) {
            Some(pos) if pos + 1 < self.elements.len() => {
                self.elements.swap_indices(pos, pos + 1);
                true
            }
            _ => false,
        }
    }

    /// Move an element to the back of the z-order.
    pub fn send_to_back(&mut self, id: ElementId) -> bool {
        match self.z_index(id) {
            Some(pos) if pos > 0 => {
                self.elements.move_index(pos, 0);
                true
            }
            _ => false,
        }
    }

    /// Move an element to the front of the z-order.
    pub fn bring_to_front(&mut self, id: ElementId) -> bool {
        let last = self.elements.len().saturating_sub(1);
        match self.z_index(id) {
            Some(pos) if pos < last => {
                self.elements.move_index(pos, last);
                true
            }
            _ => false,
        }
    }

    /// Reorder to follow `order`; ids not listed keep their relative order
    /// after the listed ones.
    pub(crate) fn reorder(&mut self, order: &[ElementId]) {
        let mut target = 0;
        for id in order {
            if let Some(pos) = self.elements.get_index_of(id) {
                self.elements.move_index(pos, target);
                target += 1;
            }
        }
    }

    /// Physically remove tombstones last updated before `before_ms`.
    /// Returns the purged ids so caches can release their entries.
    pub fn purge_deleted(&mut self, before_ms: i64) -> Vec<ElementId> {
        let purged: Vec<ElementId> = self
            .elements
            .values()
            .filter(|e| e.is_deleted && e.updated < before_ms)
            .map(|e| e.id)
            .collect();
        for id in &purged {
            self.elements.shift_remove(id);
        }
        if !purged.is_empty() {
            log::debug!("purged {} tombstoned elements", purged.len());
        }
        purged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_of(n: usize) -> (ElementStore, Vec<ElementId>) {
        let mut store = ElementStore::new();
        let mut ids = Vec::new();
        for i in 0..n {
            let el = Element::rectangle(i as f64 * 10.0, 0.0, 5.0, 5.0);
            ids.push(el.id);
            store.insert(Arc::new(el));
        }
        (store, ids)
    }

    fn order(store: &ElementStore) -> Vec<ElementId> {
        store.iter().map(|e| e.id).collect()
    }

    #[test]
    fn z_order_moves() {
        let (mut store, ids) = store_of(3);
        assert!(store.bring_forward(ids[0]));
        assert_eq!(order(&store), vec![ids[1], ids[0], ids[2]]);

        assert!(store.bring_to_front(ids[1]));
        assert_eq!(order(&store), vec![ids[0], ids[2], ids[1]]);

        assert!(store.send_to_back(ids[1]));
        assert_eq!(order(&store), vec![ids[1], ids[0], ids[2]]);

        assert!(!store.send_backward(ids[1]), "already at back");
        assert!(!store.bring_forward(ids[2]), "already at front");
    }

    #[test]
    fn tombstones_hidden_from_live_iteration() {
        let (mut store, ids) = store_of(2);
        let mut dead = (**store.get(ids[0]).unwrap()).clone();
        dead.is_deleted = true;
        dead.updated = 10;
        store.replace(Arc::new(dead));

        assert!(store.get(ids[0]).is_some());
        assert!(store.get_live(ids[0]).is_none());
        assert_eq!(store.live_count(), 1);

        assert!(store.purge_deleted(5).is_empty());
        assert_eq!(store.purge_deleted(11), vec![ids[0]]);
        assert!(!store.contains(ids[0]));
    }
}
