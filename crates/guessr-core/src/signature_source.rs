//! The shape a library-signature-file collaborator hands the facade at
//! `finalize` time (spec 6, "Library-signature records"). The core never
//! parses a signature file itself — it only consumes already-decoded
//! records like this one and folds them into a [`guessr_sig::SignatureRegistry`].

use guessr_common::Atom;
use guessr_sig::{MethodEntry, Overload, SignatureRegistry};

/// One pre-decoded `(class, method)` entry: every overload the bundled
/// signature store declares for it, plus whether it binds on the class
/// object (`singleton = true`, e.g. `File.exist?`) or on instances.
#[derive(Debug, Clone)]
pub struct SignatureRecord {
    pub class: Atom,
    pub method: Atom,
    pub singleton: bool,
    pub overloads: Vec<Overload>,
}

impl SignatureRecord {
    #[must_use]
    pub fn new(class: impl Into<Atom>, method: impl Into<Atom>, singleton: bool, overloads: Vec<Overload>) -> Self {
        Self {
            class: class.into(),
            method: method.into(),
            singleton,
            overloads,
        }
    }
}

/// Folds every record into a fresh registry (spec 4.4: "Preloads, at
/// startup, every method signature from a bundled library-signature store
/// into hash tables").
pub fn build_registry(records: impl IntoIterator<Item = SignatureRecord>) -> SignatureRegistry {
    let mut registry = SignatureRegistry::new();
    for record in records {
        let entry = MethodEntry::new(record.overloads);
        if record.singleton {
            registry.insert_singleton(record.class, record.method, entry);
        } else {
            registry.insert_instance(record.class, record.method, entry);
        }
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use guessr_types::Type;

    #[test]
    fn folds_instance_and_singleton_records_separately() {
        let records = vec![
            SignatureRecord::new("String", "upcase", false, vec![Overload::new(vec![], Type::class_instance("String"))]),
            SignatureRecord::new("File", "exist?", true, vec![Overload::new(vec![], Type::class_instance("TrueClass"))]),
        ];
        let registry = build_registry(records);
        assert!(registry.lookup_instance(&"String".into(), &"upcase".into()).is_some());
        assert!(registry.lookup_singleton(&"File".into(), &"exist?".into()).is_some());
        assert!(registry.lookup_instance(&"File".into(), &"exist?".into()).is_none());
    }
}
