//! Centralized tuning constants.
//!
//! The spec deliberately leaves open whether the duck-typing candidate cap
//! and the union display cap should be the same constant (Open Question,
//! see `DESIGN.md`); we keep them as two named constants so a future change
//! to one doesn't silently affect the other.

/// Maximum number of candidate classes a duck-typing guess may return as a
/// `Union` before giving up and returning `Unknown` ("too ambiguous").
pub const DUCK_TYPING_CANDIDATE_CAP: usize = 3;

/// Maximum number of members a displayed union may have before the
/// simplifier collapses it to `Unknown` to avoid noisy hovers.
pub const UNION_DISPLAY_CAP: usize = 3;

/// Tuple positions beyond this arity widen to `ArrayType(Union(elements))`.
pub const MAX_TUPLE_ARITY: usize = 8;
