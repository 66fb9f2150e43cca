//! The type algebra: canonical type values, union normalization, and
//! surface-syntax display (spec 3.1, 4.1).

pub mod ty;
pub use ty::{Param, ParamKind, Type};

pub mod union;
pub use union::{equal, union};

mod display;
