//! In-memory representation of a compiled module's declarations.
//!
//! This is the query surface the interface emitter walks and the form a
//! binary module artifact decodes back into. It models only what the
//! textual interface format can express: type declarations, function
//! signatures with generic constraints, and the bodies of inlinable functions.

#![warn(missing_docs)]

pub mod decl;
pub mod module;
pub mod types;

pub use decl::{
    Attribute, Decl, DeclKind, EnumCase, EnumDecl, Field, FuncBody, FuncDecl, FuncSignature, Param,
    ProtocolDecl, Requirement, StructDecl, Visibility,
};
pub use module::ModuleDecl;
pub use types::{Constraint, ConstraintKind, GenericParam, Generics, TypeRef};
