//! Type references, generic parameters and `where` clauses.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A reference to a type as written in a signature.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    /// A possibly qualified name with generic arguments: `Swift.Array<Int>`.
    Named {
        /// Dotted name, e.g. `Int` or `Foundation.Data`.
        name: String,
        /// Generic arguments, empty if none.
        args: Vec<TypeRef>,
    },
    /// `T?`
    Optional(Box<TypeRef>),
    /// `[T]`
    Array(Box<TypeRef>),
    /// `(A, B)`; the empty tuple is `()`.
    Tuple(Vec<TypeRef>),
}

impl TypeRef {
    /// A plain named type without arguments.
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// A named type with generic arguments.
    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        TypeRef::Named {
            name: name.into(),
            args,
        }
    }

    /// Wraps this type in an optional.
    pub fn optional(self) -> Self {
        TypeRef::Optional(Box::new(self))
    }

    /// Wraps this type in an array.
    pub fn array(self) -> Self {
        TypeRef::Array(Box::new(self))
    }

    /// The empty tuple.
    pub fn unit() -> Self {
        TypeRef::Tuple(Vec::new())
    }

    /// Calls `f` with every name referenced by this type, outermost first.
    pub fn visit_names<'a>(&'a self, f: &mut impl FnMut(&'a str)) {
        match self {
            TypeRef::Named { name, args } => {
                f(name);
                for arg in args {
                    arg.visit_names(f);
                }
            }
            TypeRef::Optional(inner) | TypeRef::Array(inner) => inner.visit_names(f),
            TypeRef::Tuple(elems) => {
                for elem in elems {
                    elem.visit_names(f);
                }
            }
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named { name, args } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    write_list(f, args)?;
                    f.write_str(">")?;
                }
                Ok(())
            }
            TypeRef::Optional(inner) => write!(f, "{inner}?"),
            TypeRef::Array(inner) => write!(f, "[{inner}]"),
            TypeRef::Tuple(elems) => {
                f.write_str("(")?;
                write_list(f, elems)?;
                f.write_str(")")
            }
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[TypeRef]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// A generic parameter with inline bounds: `T: Hashable & Codable`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenericParam {
    /// Parameter name.
    pub name: String,
    /// Protocol bounds, in source order.
    pub bounds: Vec<String>,
}

impl GenericParam {
    /// An unconstrained parameter.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bounds: Vec::new(),
        }
    }

    /// A parameter with bounds.
    pub fn bounded(name: impl Into<String>, bounds: &[&str]) -> Self {
        Self {
            name: name.into(),
            bounds: bounds.iter().map(|b| b.to_string()).collect(),
        }
    }
}

/// The requirement part of a `where` clause entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// `T: P & Q`
    Conforms(Vec<String>),
    /// `T.Element == Int`
    SameType(TypeRef),
}

/// One entry of a `where` clause.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constraint {
    /// Constrained type, possibly a dotted associated type (`T.Element`).
    pub subject: String,
    /// What is required of the subject.
    pub kind: ConstraintKind,
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ConstraintKind::Conforms(protocols) => {
                write!(f, "{}: {}", self.subject, protocols.join(" & "))
            }
            ConstraintKind::SameType(ty) => write!(f, "{} == {ty}", self.subject),
        }
    }
}

/// Generic parameters plus `where` clause of a declaration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Generics {
    /// Parameters in angle brackets.
    pub params: Vec<GenericParam>,
    /// `where` clause entries.
    pub where_clause: Vec<Constraint>,
}

impl Generics {
    /// Returns `true` if there are neither parameters nor constraints.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && self.where_clause.is_empty()
    }

    /// Returns `true` if `name` is one of the generic parameters.
    pub fn declares(&self, name: &str) -> bool {
        self.params.iter().any(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_nested() {
        let ty = TypeRef::generic(
            "Dictionary",
            vec![TypeRef::named("String"), TypeRef::named("Int").array()],
        )
        .optional();
        assert_eq!(ty.to_string(), "Dictionary<String, [Int]>?");
    }

    #[test]
    fn display_tuples() {
        assert_eq!(TypeRef::unit().to_string(), "()");
        let pair = TypeRef::Tuple(vec![TypeRef::named("Int"), TypeRef::named("Bool")]);
        assert_eq!(pair.to_string(), "(Int, Bool)");
    }

    #[test]
    fn visit_names_collects_all() {
        let ty = TypeRef::generic("Result", vec![TypeRef::named("Point"), TypeRef::named("Err")]);
        let mut names = Vec::new();
        ty.visit_names(&mut |n| names.push(n));
        assert_eq!(names, vec!["Result", "Point", "Err"]);
    }

    #[test]
    fn constraint_display() {
        let conforms = Constraint {
            subject: "T".to_string(),
            kind: ConstraintKind::Conforms(vec!["Hashable".to_string(), "Codable".to_string()]),
        };
        assert_eq!(conforms.to_string(), "T: Hashable & Codable");
        let same = Constraint {
            subject: "T.Element".to_string(),
            kind: ConstraintKind::SameType(TypeRef::named("Int")),
        };
        assert_eq!(same.to_string(), "T.Element == Int");
    }

    #[test]
    fn generics_declares() {
        let g = Generics {
            params: vec![GenericParam::bounded("T", &["Numeric"])],
            where_clause: vec![],
        };
        assert!(g.declares("T"));
        assert!(!g.declares("U"));
        assert!(!g.is_empty());
    }
}
