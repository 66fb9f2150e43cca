//! The IR node set and the node-key addressing scheme (spec 2 components
//! 2 and 3).

pub mod node;
pub use node::{CalledMethod, LiteralValue, Node, NodeId, NodeKind};

pub mod arena;
pub use arena::Arena;

pub mod key;
pub use key::{discriminator, NodeKey, Scope};

pub mod oracle;
pub use oracle::{AncestryOracle, ConstantKind};
