use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global string interner for element IDs.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Counter behind every generated ID. Never rewinds, so IDs are never reused,
/// not even after their element has been tombstoned and purged.
static COUNTER: AtomicU64 = AtomicU64::new(0);

/// A stable, interned identifier for scene elements.
/// Internally a 4-byte `Spur` index.
///
/// Ordering follows interning order, which is only meaningful as a
/// deterministic tie-break (e.g. graph node ordering), not as z-order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(Spur);

impl ElementId {
    /// Intern a string as an ElementId, or return the existing one.
    pub fn intern(s: &str) -> Self {
        ElementId(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Generate a fresh ID with a kind prefix (e.g. `rectangle_1`, `arrow_2`).
    pub fn fresh(prefix: &str) -> Self {
        loop {
            let n = COUNTER.fetch_add(1, Ordering::Relaxed);
            let candidate = format!("{prefix}_{n}");
            // An embedder may have interned the same text by hand; skip it.
            if INTERNER.get(&candidate).is_none() {
                return Self::intern(&candidate);
            }
        }
    }
}

impl fmt::Debug for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ElementId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ElementId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ElementId::intern(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_roundtrip() {
        let a = ElementId::intern("process_box");
        let b = ElementId::intern("process_box");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "process_box");
    }

    #[test]
    fn fresh_ids_are_unique() {
        let a = ElementId::fresh("rectangle");
        let b = ElementId::fresh("rectangle");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("rectangle_"));
    }

    #[test]
    fn fresh_skips_hand_interned_names() {
        // Reserve a bunch of names that the counter could hand out next.
        let n = COUNTER.load(Ordering::Relaxed);
        for i in n..n + 4 {
            ElementId::intern(&format!("taken_{i}"));
        }
        let id = ElementId::fresh("taken");
        let suffix: u64 = id.as_str()["taken_".len()..].parse().unwrap();
        assert!(suffix >= n + 4 || suffix < n);
    }
}
