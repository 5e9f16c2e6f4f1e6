//! Declarations and their attributes.

use crate::types::{Generics, TypeRef};
use serde::{Deserialize, Serialize};

/// Access level of a declaration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Visibility {
    /// `private`
    Private,
    /// `internal` (the default when no modifier is written)
    Internal,
    /// `public`
    Public,
    /// `open`
    Open,
}

impl Visibility {
    /// The source keyword.
    pub fn keyword(self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Internal => "internal",
            Visibility::Public => "public",
            Visibility::Open => "open",
        }
    }

    /// Parses a source keyword.
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "private" | "fileprivate" => Some(Visibility::Private),
            "internal" => Some(Visibility::Internal),
            "public" => Some(Visibility::Public),
            "open" => Some(Visibility::Open),
            _ => None,
        }
    }
}

/// A declaration attribute such as `@inlinable`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribute {
    /// `@inlinable`: the body is part of the interface.
    Inlinable,
    /// `@usableFromInline`: an internal declaration visible to inlinable code.
    UsableFromInline,
    /// `@frozen`
    Frozen,
    /// `@discardableResult`
    DiscardableResult,
    /// Any other attribute, by name without the `@`.
    Other(String),
}

impl Attribute {
    /// Parses an attribute name without the leading `@`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "inlinable" => Attribute::Inlinable,
            "usableFromInline" => Attribute::UsableFromInline,
            "frozen" => Attribute::Frozen,
            "discardableResult" => Attribute::DiscardableResult,
            other => Attribute::Other(other.to_string()),
        }
    }

    /// The attribute name without the leading `@`.
    pub fn name(&self) -> &str {
        match self {
            Attribute::Inlinable => "inlinable",
            Attribute::UsableFromInline => "usableFromInline",
            Attribute::Frozen => "frozen",
            Attribute::DiscardableResult => "discardableResult",
            Attribute::Other(name) => name,
        }
    }
}

/// A stored property of a struct.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    /// Property name.
    pub name: String,
    /// Access level.
    pub visibility: Visibility,
    /// `var` when true, `let` otherwise.
    pub mutable: bool,
    /// Declared type.
    pub ty: TypeRef,
}

/// A `struct` declaration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructDecl {
    /// Generic parameters and constraints.
    pub generics: Generics,
    /// Stored properties in declaration order.
    pub fields: Vec<Field>,
}

/// One `case` of an enum.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnumCase {
    /// Case name.
    pub name: String,
    /// Associated value types, empty for a bare case.
    pub payload: Vec<TypeRef>,
}

/// An `enum` declaration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnumDecl {
    /// Generic parameters and constraints.
    pub generics: Generics,
    /// Cases in declaration order.
    pub cases: Vec<EnumCase>,
}

/// A function parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Param {
    /// Argument label; `None` is written `_`.
    pub label: Option<String>,
    /// Parameter name used inside the body.
    pub name: String,
    /// Parameter type.
    pub ty: TypeRef,
}

impl Param {
    /// A parameter whose label equals its name.
    pub fn labeled(name: impl Into<String>, ty: TypeRef) -> Self {
        let name = name.into();
        Self {
            label: Some(name.clone()),
            name,
            ty,
        }
    }

    /// A parameter without an argument label.
    pub fn unlabeled(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            label: None,
            name: name.into(),
            ty,
        }
    }
}

/// Everything about a function except its name and body.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FuncSignature {
    /// Generic parameters and constraints.
    pub generics: Generics,
    /// Parameters in order.
    pub params: Vec<Param>,
    /// Whether the function `throws`.
    pub throws: bool,
    /// Return type; `None` means no `->` clause.
    pub result: Option<TypeRef>,
}

impl FuncSignature {
    /// Calls `f` with every type name in parameters and result.
    pub fn visit_names<'a>(&'a self, f: &mut impl FnMut(&'a str)) {
        for param in &self.params {
            param.ty.visit_names(f);
        }
        if let Some(result) = &self.result {
            result.visit_names(f);
        }
        for constraint in &self.generics.where_clause {
            if let crate::types::ConstraintKind::SameType(ty) = &constraint.kind {
                ty.visit_names(f);
            }
        }
    }
}

/// The body of a function, stored as normalized lines.
///
/// Normalization removes the common leading indentation, trailing
/// whitespace, and blank lines at either end, so rendering a body and
/// reading it back yields the same lines.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FuncBody {
    /// Body lines without indentation relative to the enclosing braces.
    pub lines: Vec<String>,
}

impl FuncBody {
    /// Builds a normalized body from source text found between braces.
    pub fn from_source(text: &str) -> Self {
        let trimmed: Vec<&str> = text.lines().map(str::trim_end).collect();
        let first = trimmed.iter().position(|l| !l.is_empty());
        let last = trimmed.iter().rposition(|l| !l.is_empty());
        let (Some(first), Some(last)) = (first, last) else {
            return Self::default();
        };
        let window = &trimmed[first..=last];
        // Only ASCII blanks count as indentation, so the cut is always a char boundary.
        let indent = window
            .iter()
            .filter(|l| !l.is_empty())
            .map(|l| l.bytes().take_while(|b| *b == b' ' || *b == b'\t').count())
            .min()
            .unwrap_or(0);
        let lines = window
            .iter()
            .map(|l| if l.is_empty() { String::new() } else { l[indent..].to_string() })
            .collect();
        Self { lines }
    }

    /// Returns `true` if the body has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// A function declaration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FuncDecl {
    /// Parameters, result and generics.
    pub signature: FuncSignature,
    /// Body, if known. Only inlinable bodies appear in interfaces.
    pub body: Option<FuncBody>,
}

/// A protocol function requirement.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Requirement {
    /// Requirement name.
    pub name: String,
    /// Requirement signature.
    pub signature: FuncSignature,
}

/// A `protocol` declaration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProtocolDecl {
    /// Inherited protocols.
    pub inherits: Vec<String>,
    /// Function requirements in declaration order.
    pub requirements: Vec<Requirement>,
}

/// What kind of entity a declaration introduces.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeclKind {
    /// `struct`
    Struct(StructDecl),
    /// `enum`
    Enum(EnumDecl),
    /// `protocol`
    Protocol(ProtocolDecl),
    /// `typealias Name = Target`
    TypeAlias(TypeRef),
    /// `func`
    Func(FuncDecl),
}

impl DeclKind {
    /// The introducing keyword.
    pub fn keyword(&self) -> &'static str {
        match self {
            DeclKind::Struct(_) => "struct",
            DeclKind::Enum(_) => "enum",
            DeclKind::Protocol(_) => "protocol",
            DeclKind::TypeAlias(_) => "typealias",
            DeclKind::Func(_) => "func",
        }
    }

    /// Returns `true` for declarations that introduce a type name.
    pub fn declares_type(&self) -> bool {
        !matches!(self, DeclKind::Func(_))
    }
}

/// A top-level declaration.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Decl {
    /// Declared name.
    pub name: String,
    /// Access level.
    pub visibility: Visibility,
    /// Attributes in source order.
    pub attributes: Vec<Attribute>,
    /// The declaration itself.
    pub kind: DeclKind,
}

impl Decl {
    /// A public declaration without attributes.
    pub fn public(name: impl Into<String>, kind: DeclKind) -> Self {
        Self {
            name: name.into(),
            visibility: Visibility::Public,
            attributes: Vec::new(),
            kind,
        }
    }

    /// Sets the visibility.
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Appends an attribute.
    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Returns `true` if the attribute is present.
    pub fn has_attribute(&self, attribute: &Attribute) -> bool {
        self.attributes.contains(attribute)
    }

    /// Returns `true` if this declaration belongs in the module's interface:
    /// it is public or open, or internal and `@usableFromInline`.
    pub fn is_exported(&self) -> bool {
        self.visibility >= Visibility::Public
            || (self.visibility == Visibility::Internal
                && self.has_attribute(&Attribute::UsableFromInline))
    }

    /// The part of this declaration that a textual interface records.
    ///
    /// Function bodies survive only on `@inlinable` functions, and stored
    /// properties below `public` only on `@frozen` structs.
    pub fn surface(&self) -> Decl {
        let mut decl = self.clone();
        let inlinable = self.has_attribute(&Attribute::Inlinable);
        let frozen = self.has_attribute(&Attribute::Frozen);
        match &mut decl.kind {
            DeclKind::Func(func) if !inlinable => func.body = None,
            DeclKind::Struct(s) if !frozen => {
                s.fields.retain(|f| f.visibility >= Visibility::Public)
            }
            _ => {}
        }
        decl
    }
}
