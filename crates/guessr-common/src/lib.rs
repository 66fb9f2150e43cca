//! Common types and utilities for the type-guessr inference engine.
//!
//! This crate provides foundational pieces shared by every other crate in the
//! workspace:
//! - String interning (`Atom`, `Interner`) for class paths and method names
//! - `Loc`, the source-location record every IR node carries
//! - Tuning constants used by the duck-typing resolver and the simplifier

pub mod atom;
pub use atom::{Atom, Interner};

pub mod loc;
pub use loc::Loc;

pub mod limits;
