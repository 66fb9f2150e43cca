//! Stable node addressing (spec 3.3).
//!
//! A node key is the single source of truth shared between the lowering
//! (writer) and the editor bridge (reader): `<scope>:<tag>:<discriminator>:<offset>`.

use crate::node::NodeKind;
use guessr_common::Atom;
use std::fmt;

/// `"ClassPath#MethodName"`, `"ClassPath"`, or `""` (top level).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    TopLevel,
    Class(Atom),
    Method(Atom, Atom),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::TopLevel => Ok(()),
            Scope::Class(c) => write!(f, "{c}"),
            Scope::Method(c, m) => write!(f, "{c}#{m}"),
        }
    }
}

/// The stable string identifier of an IR node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeKey(String);

impl NodeKey {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build a key for a node of the given `scope`, `tag`/`discriminator`
    /// pair, anchored at `offset`.
    #[must_use]
    pub fn build(scope: &Scope, tag: &str, discriminator: &str, offset: u32) -> Self {
        NodeKey(format!("{scope}:{tag}:{discriminator}:{offset}"))
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The discriminator portion of a key for a given node kind: variable
/// name / method name / class name / block-param index / literal type
/// name (spec 3.3).
#[must_use]
pub fn discriminator(kind: &NodeKind) -> String {
    match kind {
        NodeKind::Literal { ty, .. } => ty.to_string(),
        NodeKind::LocalWrite { name, .. } | NodeKind::LocalRead { name, .. } => name.to_string(),
        NodeKind::InstanceVarWrite { name, .. } | NodeKind::InstanceVarRead { name, .. } => {
            name.to_string()
        }
        NodeKind::ClassVarWrite { name, .. } | NodeKind::ClassVarRead { name, .. } => {
            name.to_string()
        }
        NodeKind::Param { name, .. } => name.to_string(),
        NodeKind::Call { method, .. } => method.to_string(),
        NodeKind::BlockParamSlot { index, .. } => index.to_string(),
        NodeKind::Def { name, .. } => name.to_string(),
        NodeKind::ClassModule { name, .. } => name.to_string(),
        NodeKind::Constant { name, .. } => name.to_string(),
        NodeKind::SelfNode { class_name, .. } => class_name.to_string(),
        NodeKind::Return { .. } => String::new(),
        NodeKind::Merge { .. } => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_display_matches_spec_grammar() {
        assert_eq!(Scope::TopLevel.to_string(), "");
        assert_eq!(Scope::Class(Atom::from("User")).to_string(), "User");
        assert_eq!(
            Scope::Method(Atom::from("User"), Atom::from("save")).to_string(),
            "User#save"
        );
    }

    #[test]
    fn key_equality_is_structural() {
        let a = NodeKey::build(&Scope::TopLevel, "local_write", "x", 10);
        let b = NodeKey::build(&Scope::TopLevel, "local_write", "x", 10);
        assert_eq!(a, b);
        let c = NodeKey::build(&Scope::TopLevel, "local_write", "x", 11);
        assert_ne!(a, c);
    }
}
