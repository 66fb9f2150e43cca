//! The runtime facade (spec 2 component 11, spec 4.11): the single object
//! an editor bridge holds a handle to. It owns every mutable piece of
//! engine state — the IR arena, the key index, the project registries,
//! the resolver cache — behind one mutex, and the read-only
//! library-signature registry behind a once-initialized cell that needs
//! no locking after `finalize` (spec 4.11, spec 5 "Shared resources").
//!
//! Concurrency model (spec 5): the initial project walk parses files on a
//! bounded pool of background threads; each worker hands its parsed AST to
//! [`Engine::ingest`], which takes the facade's mutex only for the cheap
//! "install into indices" step. Readers (`find`, `infer`) take the same
//! mutex, so a query never observes a file mid-install (spec 5, "Ordering
//! guarantees").

mod engine;
mod signature_source;
mod state;

pub use engine::Engine;
pub use signature_source::SignatureRecord;

#[cfg(test)]
mod tests;
