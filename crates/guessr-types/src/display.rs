//! Conventional surface syntax for `Type` (spec 4.1 `display(t)`).

use crate::ty::{ParamKind, Type};
use std::fmt;

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Unknown => write!(f, "untyped"),
            Type::Unguessed => write!(f, "unguessed"),
            Type::ClassInstance(name) => write!(f, "{name}"),
            Type::Singleton(name) => write!(f, "singleton({name})"),
            Type::ArrayType(elem) => write!(f, "Array[{elem}]"),
            Type::TupleType(elems) => {
                write!(f, "[")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{e}")?;
                }
                write!(f, "]")
            }
            Type::HashType(k, v) => write!(f, "Hash[{k}, {v}]"),
            Type::HashShape(fields) => {
                write!(f, "{{ ")?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, " }}")
            }
            Type::RangeType(elem) => write!(f, "Range[{elem}]"),
            Type::Union(members) => {
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{m}")?;
                }
                Ok(())
            }
            Type::TypeVariable(name) => write!(f, "{name}"),
            Type::SelfType => write!(f, "self"),
            Type::ForwardingArgs => write!(f, "..."),
            Type::MethodSignature(params, ret) => {
                write!(f, "(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match p.kind {
                        ParamKind::KeywordRequired => write!(f, "{}: {}", p.name, p.ty)?,
                        ParamKind::KeywordOptional => write!(f, "{}: {}{}", p.name, param_prefix(p.kind), p.ty)?,
                        ParamKind::Forwarding => write!(f, "...")?,
                        _ => write!(f, "{}{} {}", param_prefix(p.kind), p.ty, p.name)?,
                    }
                }
                write!(f, ") -> {ret}")
            }
        }
    }
}

/// The leading prefix glyph for a parameter kind (spec 4.10).
fn param_prefix(kind: ParamKind) -> &'static str {
    match kind {
        ParamKind::Required => "",
        ParamKind::Optional => "?",
        ParamKind::Rest => "*",
        ParamKind::KeywordRequired => "",
        ParamKind::KeywordOptional => "?",
        ParamKind::KeywordRest => "**",
        ParamKind::Block => "&",
        ParamKind::Forwarding => "",
    }
}
