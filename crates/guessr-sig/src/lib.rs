//! The library-signature registry: pre-indexed method signatures with
//! overload resolution, generic substitution, and block-parameter lookup
//! (spec 2 component 6, spec 4.4).

pub mod entry;
pub use entry::{MethodEntry, Overload};

pub mod substitute;
pub use substitute::{substitute, Bindings};

pub mod registry;
pub use registry::SignatureRegistry;
