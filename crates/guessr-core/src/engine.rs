//! `Engine`: the facade type itself (spec 4.11).

use std::sync::{Arc, Mutex};

use once_cell::sync::OnceCell;
use rayon::prelude::*;

use guessr_common::Atom;
use guessr_ir::{AncestryOracle, NodeId, NodeKey};
use guessr_lower::{lower_program, AstArena, Context, Program};
use guessr_resolve::{build_signature, Inference, Resolver};
use guessr_sig::SignatureRegistry;
use guessr_types::Type;

use crate::signature_source::{build_registry, SignatureRecord};
use crate::state::State;

/// One project's worth of engine state. Cheap to construct, expensive to
/// hold more than one of (spec 4.11: "a single mutex protects all of: key
/// index, registries, resolver cache").
pub struct Engine {
    interner: guessr_common::Interner,
    oracle: Arc<dyn AncestryOracle>,
    sigs: OnceCell<SignatureRegistry>,
    state: Mutex<State>,
}

impl Engine {
    /// `oracle` is the editor bridge's class-hierarchy view (spec 6,
    /// "Ancestry oracle"); it must be read-safe from multiple threads,
    /// which `Arc<dyn AncestryOracle>`'s `Send + Sync` bound guarantees.
    #[must_use]
    pub fn new(oracle: Arc<dyn AncestryOracle>) -> Self {
        Self {
            interner: guessr_common::Interner::new(),
            oracle,
            sigs: OnceCell::new(),
            state: Mutex::new(State::new()),
        }
    }

    #[must_use]
    pub fn interner(&self) -> &guessr_common::Interner {
        &self.interner
    }

    /// Lowers `program`'s AST into the graph, replacing any prior entries
    /// for `file` first so no query ever observes a mix of old and new
    /// nodes (spec 5, "Ordering guarantees": "Re-ingest of a file removes
    /// the prior entries before installing new ones").
    #[tracing::instrument(level = "debug", skip(self, ast, program), fields(file))]
    pub fn ingest(&self, file: &str, ast: &AstArena, program: &Program) {
        let file_atom = self.interner.intern(file);
        let mut state = self.state.lock().expect("facade mutex poisoned");
        state.remove_file(&file_atom);

        let mut ctx = Context::new(
            file_atom,
            &self.interner,
            &mut state.arena,
            &mut state.key_index,
            &mut state.methods,
            &mut state.ivars,
            &mut state.cvars,
        );
        lower_program(&mut ctx, &program.arena, program);

        // A resolved type anywhere can depend on any file's definitions
        // through duck typing or ancestry, so re-ingest invalidates the
        // whole cache rather than attempting narrower tracking (spec 4.8,
        // mirrored in `guessr_resolve::ResolverCache::clear`'s doc comment).
        state.cache.clear();
    }

    /// Ingests a whole project's worth of already-parsed files. Parsing is
    /// the caller's job and may already have happened concurrently; this
    /// only fans the lowering+install step out across a bounded pool of
    /// worker threads (spec 5, "parallel background threads for initial
    /// project walk, one worker per file, bounded pool"). Each worker
    /// still serializes on the facade mutex for its own install, so the
    /// ordering guarantees above hold per file.
    pub fn ingest_project(&self, files: Vec<(String, Program)>) {
        files.into_par_iter().for_each(|(file, program)| {
            self.ingest(&file, &program.arena, &program);
        });
    }

    /// Marks the initial project walk complete and preloads the
    /// library-signature registry (spec 4.11). Idempotent: a second call
    /// is a no-op (and logged), since the registry is read-only once set.
    #[tracing::instrument(level = "debug", skip(self, records))]
    pub fn finalize(&self, records: impl IntoIterator<Item = SignatureRecord>) {
        let registry = build_registry(records);
        if self.sigs.set(registry).is_err() {
            tracing::warn!("finalize called more than once; ignoring the second preload");
        }
        self.state.lock().expect("facade mutex poisoned").cache.clear();
    }

    /// Removes a file's contributions without replacing them, for when the
    /// editor bridge observes a deletion rather than an edit.
    pub fn remove_file(&self, file: &str) {
        let file_atom = self.interner.intern(file);
        let mut state = self.state.lock().expect("facade mutex poisoned");
        state.remove_file(&file_atom);
        state.cache.clear();
    }

    /// Synchronized key lookup (spec 4.5, 4.11).
    #[must_use]
    pub fn find(&self, key: &NodeKey) -> Option<NodeId> {
        self.state.lock().expect("facade mutex poisoned").key_index.find_by_key(key)
    }

    #[must_use]
    pub fn nodes_for_file(&self, file: &str) -> Vec<NodeId> {
        let file_atom = self.interner.intern(file);
        self.state.lock().expect("facade mutex poisoned").key_index.nodes_for_file(&file_atom)
    }

    /// Synchronized resolver invocation (spec 4.6, 4.11). Builds a fresh,
    /// all-borrowed `Resolver` under the lock — cheap, since the resolver
    /// itself owns nothing but the cache it mutates in place.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn infer(&self, node: NodeId) -> Inference {
        let empty_sigs = SignatureRegistry::new();
        let sigs = self.sigs.get().unwrap_or(&empty_sigs);
        let mut guard = self.state.lock().expect("facade mutex poisoned");
        let state = &mut *guard;
        let mut resolver = Resolver::new(
            &state.arena,
            &state.methods,
            &state.ivars,
            &state.cvars,
            sigs,
            self.oracle.as_ref(),
            &mut state.cache,
        );
        resolver.infer(node)
    }

    /// Builds the displayable `MethodSignature` for a `Def` node (spec
    /// 4.10), by the same locked path as `infer`.
    #[must_use]
    pub fn signature_for(&self, def: NodeId) -> Type {
        let empty_sigs = SignatureRegistry::new();
        let sigs = self.sigs.get().unwrap_or(&empty_sigs);
        let mut guard = self.state.lock().expect("facade mutex poisoned");
        let state = &mut *guard;
        let mut resolver = Resolver::new(
            &state.arena,
            &state.methods,
            &state.ivars,
            &state.cvars,
            sigs,
            self.oracle.as_ref(),
            &mut state.cache,
        );
        build_signature(&mut resolver, def)
    }

    /// Debug-UI introspection (spec 4.3, 4.11).
    #[must_use]
    pub fn methods_for_class(&self, class_path: &str) -> Vec<Atom> {
        let class_atom = self.interner.intern(class_path);
        self.state.lock().expect("facade mutex poisoned").methods.methods_for_class(&class_atom)
    }

    #[must_use]
    pub fn search(&self, prefix: &str) -> Vec<(Atom, Atom)> {
        self.state.lock().expect("facade mutex poisoned").methods.search(prefix)
    }
}
