//! String interning for class paths and method names.
//!
//! Class paths (`Foo::Bar::Baz`) and method names recur constantly across an
//! IR graph built from a real project; interning them keeps node and type
//! values small and cheap to compare.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::{Arc, Mutex};

/// An interned string. Cheap to clone and compare; compares by pointer
/// identity of the underlying `Arc`, not by content, so two `Atom`s from
/// different interners are never equal even if their text matches.
#[derive(Clone)]
pub struct Atom(Arc<str>);

impl Atom {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Atom {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || *self.0 == *other.0
    }
}
impl Eq for Atom {}

impl std::hash::Hash for Atom {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl PartialOrd for Atom {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Atom {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}
impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Atom {
    fn from(s: &str) -> Self {
        Atom(Arc::from(s))
    }
}
impl From<String> for Atom {
    fn from(s: String) -> Self {
        Atom(Arc::from(s.as_str()))
    }
}

/// Serializes as its plain text. Deserializing produces a standalone `Atom`
/// outside any `Interner`, so it compares equal to an interned one with the
/// same text (see the content-fallback in `PartialEq`) but isn't deduplicated
/// against it.
impl Serialize for Atom {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Atom {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Atom::from(s))
    }
}

/// A thread-safe string interner. Shared by the lowering pass and the
/// registries so that class paths and method names are deduplicated across
/// an entire project.
#[derive(Default)]
pub struct Interner {
    table: Mutex<FxHashMap<Arc<str>, Atom>>,
}

impl Interner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&self, s: &str) -> Atom {
        let mut table = self.table.lock().expect("interner mutex poisoned");
        if let Some(existing) = table.get(s) {
            return existing.clone();
        }
        let arc: Arc<str> = Arc::from(s);
        let atom = Atom(arc.clone());
        table.insert(arc, atom.clone());
        atom
    }
}

impl fmt::Debug for Interner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self.table.lock().map(|t| t.len()).unwrap_or(0);
        f.debug_struct("Interner").field("len", &len).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_deduplicates() {
        let interner = Interner::new();
        let a = interner.intern("Foo::Bar");
        let b = interner.intern("Foo::Bar");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "Foo::Bar");
    }

    #[test]
    fn distinct_strings_are_not_equal() {
        let interner = Interner::new();
        let a = interner.intern("Foo");
        let b = interner.intern("Bar");
        assert_ne!(a, b);
    }

    #[test]
    fn round_trips_through_json_as_plain_text() {
        let atom: Atom = "Foo::Bar".into();
        let json = serde_json::to_string(&atom).unwrap();
        assert_eq!(json, "\"Foo::Bar\"");
        let back: Atom = serde_json::from_str(&json).unwrap();
        assert_eq!(atom, back);
    }
}
