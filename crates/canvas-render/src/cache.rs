//! Shape cache keyed by element id and version.
//!
//! An entry is valid for exactly one element version. The change journal
//! drained from the scene tells the cache which entries to drop: a
//! shape-dirty change invalidates, a placement-only change re-tags the
//! entry with the new version so the shape is reused as is.

use crate::shape::{Shape, ShapeConfig, generate_shape};
use canvas_core::id::ElementId;
use canvas_core::model::Element;
use canvas_core::mutate::ChangeRecord;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct Entry {
    /// Element version the shape was generated for. `None` once a
    /// shape-dirty change came through; the shape is kept as a fallback.
    valid_for: Option<u32>,
    shape: Arc<Shape>,
}

/// Counters for tests and diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub generated: u64,
    pub failures: u64,
}

#[derive(Debug, Default)]
pub struct ShapeCache {
    entries: HashMap<ElementId, Entry>,
    config: ShapeConfig,
    stats: CacheStats,
}

impl ShapeCache {
    pub fn new(config: ShapeConfig) -> Self {
        Self {
            entries: HashMap::new(),
            config,
            stats: CacheStats::default(),
        }
    }

    pub fn config(&self) -> &ShapeConfig {
        &self.config
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached shape for `el`, generating it when missing or stale.
    ///
    /// Generation failures fall back to the last valid shape for the
    /// element, or an empty shape when there never was one.
    pub fn get_shape(&mut self, el: &Element) -> Arc<Shape> {
        if let Some(entry) = self.entries.get(&el.id)
            && entry.valid_for == Some(el.version)
        {
            self.stats.hits += 1;
            return entry.shape.clone();
        }

        log::trace!("generating shape for {} v{}", el.id, el.version);
        let shape = match generate_shape(el, &self.config) {
            Ok(shape) => {
                self.stats.generated += 1;
                Arc::new(shape)
            }
            Err(e) => {
                self.stats.failures += 1;
                log::debug!("shape generation failed: {e}");
                self.entries
                    .get(&el.id)
                    .map(|entry| entry.shape.clone())
                    .unwrap_or_else(|| Arc::new(Shape::empty()))
            }
        };
        self.entries.insert(
            el.id,
            Entry {
                valid_for: Some(el.version),
                shape: shape.clone(),
            },
        );
        shape
    }

    /// Drop the entry for `id` entirely.
    pub fn invalidate(&mut self, id: ElementId) {
        self.entries.remove(&id);
    }

    /// Apply journal records in order.
    pub fn apply_changes(&mut self, changes: &[ChangeRecord]) {
        for change in changes {
            let Some(entry) = self.entries.get_mut(&change.id) else {
                continue;
            };
            match entry.valid_for {
                // Record predates the cached shape.
                Some(v) if change.version <= v => {}
                Some(_) if change.shape_dirty => entry.valid_for = None,
                Some(_) => entry.valid_for = Some(change.version),
                None => {}
            }
        }
    }

    /// Forget entries for elements that no longer exist.
    pub fn release(&mut self, ids: &[ElementId]) {
        for id in ids {
            self.entries.remove(id);
        }
    }

    /// Keep only entries whose id satisfies `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(ElementId) -> bool) {
        self.entries.retain(|id, _| keep(*id));
    }
}
