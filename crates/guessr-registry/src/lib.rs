//! Registries and the location/key index: the addressable, incremental
//! bookkeeping that sits between the lowering pass and the resolver
//! (spec 2 components 5 and 7).

pub mod key_index;
pub use key_index::KeyIndex;

pub mod method_registry;
pub use method_registry::MethodRegistry;

pub mod variable_registry;
pub use variable_registry::{ClassVariableRegistry, InstanceVariableRegistry};
