//! A single pre-decoded library method entry: one or more overloads
//! (spec 4.4).

use guessr_common::Atom;
use guessr_types::{Param, Type};

/// One declared overload of a library method.
#[derive(Debug, Clone)]
pub struct Overload {
    /// Generic type parameters declared on the method or its class.
    pub generics: Vec<Atom>,
    /// Required / optional / rest positional parameters, in order.
    pub positional: Vec<Param>,
    /// Keyword-required / keyword-optional / keyword-rest parameters.
    pub keyword: Vec<Param>,
    /// The block parameters the method yields, if it takes a block.
    pub block: Option<Vec<Param>>,
    pub return_type: Type,
}

impl Overload {
    #[must_use]
    pub fn new(positional: Vec<Param>, return_type: Type) -> Self {
        Self {
            generics: Vec::new(),
            positional,
            keyword: Vec::new(),
            block: None,
            return_type,
        }
    }

    #[must_use]
    pub fn with_generics(mut self, generics: Vec<Atom>) -> Self {
        self.generics = generics;
        self
    }

    #[must_use]
    pub fn with_block(mut self, block: Vec<Param>) -> Self {
        self.block = Some(block);
        self
    }

    /// Minimum number of positional arguments this overload accepts.
    #[must_use]
    pub fn min_arity(&self) -> usize {
        self.positional
            .iter()
            .filter(|p| p.kind == guessr_types::ParamKind::Required)
            .count()
    }

    /// Maximum number of positional arguments, or `None` if unbounded
    /// (a rest parameter is present).
    #[must_use]
    pub fn max_arity(&self) -> Option<usize> {
        if self
            .positional
            .iter()
            .any(|p| p.kind == guessr_types::ParamKind::Rest)
        {
            None
        } else {
            Some(self.positional.len())
        }
    }

    #[must_use]
    pub fn accepts_arity(&self, n: usize) -> bool {
        n >= self.min_arity() && self.max_arity().map_or(true, |max| n <= max)
    }
}

/// One or more overloads of the same method name.
#[derive(Debug, Clone, Default)]
pub struct MethodEntry {
    pub overloads: Vec<Overload>,
}

impl MethodEntry {
    #[must_use]
    pub fn single(overload: Overload) -> Self {
        Self {
            overloads: vec![overload],
        }
    }

    #[must_use]
    pub fn new(overloads: Vec<Overload>) -> Self {
        Self { overloads }
    }
}
