//! The interface emitter.
//!
//! Renders the exported surface of a [`ModuleDecl`] in the canonical textual
//! form. The output depends only on the module, the options and the tool
//! version, so emitting twice gives identical bytes, and parsing the output
//! and emitting again reproduces it exactly.

use crate::header::{MODULE_FLAGS_KEY, TOOLS_VERSION_KEY};
use crate::options::TextualInterfaceOptions;
use crate::token::lookup_keyword;
use std::collections::HashSet;
use std::io::Write;
use stele_common::ToolVersion;
use stele_diagnostics::{codes, Diagnostic};
use stele_ir::{
    Attribute, ConstraintKind, Decl, DeclKind, FuncSignature, Generics, ModuleDecl, Param,
    TypeRef,
};
use stele_source::Span;
use thiserror::Error;

const INDENT: &str = "  ";

/// Errors that prevent a module from being emitted.
#[derive(Debug, Error)]
pub enum EmitError {
    /// A declaration cannot be expressed in the stable interface subset.
    #[error("cannot emit '{decl}' in a stable interface: {reason}")]
    UnsupportedDeclaration {
        /// Name of the offending declaration.
        decl: String,
        /// What makes it unsupported.
        reason: String,
    },

    /// The flags string would not read back verbatim from the module-flags line.
    #[error("module flags must be a single line without surrounding whitespace")]
    InvalidFlags,

    /// Writing to the output sink failed.
    #[error("failed to write interface: {0}")]
    Io(#[from] std::io::Error),
}

impl EmitError {
    /// Converts this error into an E201 diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(codes::UNSUPPORTED_DECLARATION, self.to_string(), Span::DUMMY)
    }
}

/// Emits `module` as a textual interface into `out`.
///
/// Nothing is written unless the whole module renders successfully.
pub fn emit(
    module: &ModuleDecl,
    options: &TextualInterfaceOptions,
    tool_version: &ToolVersion,
    out: &mut dyn Write,
) -> Result<(), EmitError> {
    let text = emit_to_string(module, options, tool_version)?;
    out.write_all(text.as_bytes())?;
    out.flush()?;
    Ok(())
}

/// Renders `module` as a textual interface.
pub fn emit_to_string(
    module: &ModuleDecl,
    options: &TextualInterfaceOptions,
    tool_version: &ToolVersion,
) -> Result<String, EmitError> {
    let flags = options.flags();
    if flags.contains(['\n', '\r']) || flags.trim() != flags {
        return Err(EmitError::InvalidFlags);
    }

    let checker = SurfaceChecker::new(module);
    let mut sections = Vec::new();

    let mut imports: Vec<&str> = module.imports.iter().map(String::as_str).collect();
    imports.sort_unstable();
    imports.dedup();
    if !imports.is_empty() {
        let mut block = String::new();
        for import in imports {
            if !is_dotted_identifier(import) {
                return Err(unsupported(&module.name, format!("invalid import '{import}'")));
            }
            block.push_str(&format!("import {import}\n"));
        }
        sections.push(block);
    }

    for decl in module.exported_decls() {
        let decl = decl.surface();
        checker.check(&decl)?;
        sections.push(render_decl(&decl));
    }

    let mut out = format!("// {TOOLS_VERSION_KEY}: {tool_version}\n");
    if options.flags().is_empty() {
        out.push_str(&format!("// {MODULE_FLAGS_KEY}:\n"));
    } else {
        out.push_str(&format!("// {MODULE_FLAGS_KEY}: {}\n", options.flags()));
    }
    for section in sections {
        out.push('\n');
        out.push_str(&section);
    }
    Ok(out)
}

fn unsupported(decl: &str, reason: impl Into<String>) -> EmitError {
    EmitError::UnsupportedDeclaration {
        decl: decl.to_string(),
        reason: reason.into(),
    }
}

fn is_identifier(s: &str) -> bool {
    let mut bytes = s.bytes();
    match bytes.next() {
        Some(b) if b.is_ascii_alphabetic() || b == b'_' => {}
        _ => return false,
    }
    bytes.all(|b| b.is_ascii_alphanumeric() || b == b'_') && lookup_keyword(s).is_none()
}

fn is_dotted_identifier(s: &str) -> bool {
    s.split('.').all(is_identifier)
}

// ============================================================================
// Validation
// ============================================================================

/// Decides whether an exported declaration can be rendered.
struct SurfaceChecker<'m> {
    module_name: &'m str,
    local_types: HashSet<&'m str>,
    exported_types: HashSet<&'m str>,
}

impl<'m> SurfaceChecker<'m> {
    fn new(module: &'m ModuleDecl) -> Self {
        let local_types = module
            .decls
            .iter()
            .filter(|d| d.kind.declares_type())
            .map(|d| d.name.as_str())
            .collect();
        let exported_types = module
            .exported_decls()
            .filter(|d| d.kind.declares_type())
            .map(|d| d.name.as_str())
            .collect();
        Self {
            module_name: &module.name,
            local_types,
            exported_types,
        }
    }

    fn check(&self, decl: &Decl) -> Result<(), EmitError> {
        let fail = |reason: String| Err(unsupported(&decl.name, reason));

        if !is_identifier(&decl.name) {
            return fail(format!("'{}' is not a valid identifier", decl.name));
        }
        for attribute in &decl.attributes {
            if let Attribute::Other(name) = attribute {
                return fail(format!("attribute '@{name}' is outside the stable subset"));
            }
        }
        if decl.has_attribute(&Attribute::Inlinable) {
            match &decl.kind {
                DeclKind::Func(func) if func.body.is_none() => {
                    return fail("@inlinable function has no body".to_string());
                }
                DeclKind::Func(_) => {}
                _ => return fail("@inlinable applies only to functions".to_string()),
            }
        }

        let mut names = Vec::new();
        let mut referenced = Vec::new();
        let mut scope: Vec<&str> = Vec::new();
        match &decl.kind {
            DeclKind::Struct(s) => {
                collect_generics(&s.generics, &mut names, &mut referenced, &mut scope);
                for field in &s.fields {
                    names.push(field.name.as_str());
                    field.ty.visit_names(&mut |n| referenced.push(n));
                }
            }
            DeclKind::Enum(e) => {
                collect_generics(&e.generics, &mut names, &mut referenced, &mut scope);
                for case in &e.cases {
                    names.push(case.name.as_str());
                    for ty in &case.payload {
                        ty.visit_names(&mut |n| referenced.push(n));
                    }
                }
            }
            DeclKind::Protocol(p) => {
                referenced.extend(p.inherits.iter().map(String::as_str));
                for req in &p.requirements {
                    names.push(req.name.as_str());
                    collect_signature(&req.signature, &mut names, &mut referenced, &mut scope);
                }
            }
            DeclKind::TypeAlias(target) => target.visit_names(&mut |n| referenced.push(n)),
            DeclKind::Func(func) => {
                collect_signature(&func.signature, &mut names, &mut referenced, &mut scope);
            }
        }

        if let Some(bad) = names.iter().find(|n| !is_identifier(n)) {
            return fail(format!("'{bad}' is not a valid identifier"));
        }
        for name in referenced {
            if !is_dotted_identifier(name) {
                return fail(format!("'{name}' is not a valid type name"));
            }
            let root = name.split('.').next().unwrap_or(name);
            if scope.contains(&root) {
                continue;
            }
            let local = name
                .strip_prefix(self.module_name)
                .and_then(|rest| rest.strip_prefix('.'))
                .unwrap_or(name);
            if self.local_types.contains(local) && !self.exported_types.contains(local) {
                return fail(format!(
                    "signature references '{local}', which is not part of the interface"
                ));
            }
        }
        Ok(())
    }
}

fn collect_generics<'a>(
    generics: &'a Generics,
    names: &mut Vec<&'a str>,
    referenced: &mut Vec<&'a str>,
    scope: &mut Vec<&'a str>,
) {
    for param in &generics.params {
        names.push(&param.name);
        scope.push(&param.name);
        referenced.extend(param.bounds.iter().map(String::as_str));
    }
    for constraint in &generics.where_clause {
        referenced.push(&constraint.subject);
        match &constraint.kind {
            ConstraintKind::Conforms(protocols) => {
                referenced.extend(protocols.iter().map(String::as_str))
            }
            ConstraintKind::SameType(ty) => ty.visit_names(&mut |n| referenced.push(n)),
        }
    }
}

fn collect_signature<'a>(
    signature: &'a FuncSignature,
    names: &mut Vec<&'a str>,
    referenced: &mut Vec<&'a str>,
    scope: &mut Vec<&'a str>,
) {
    collect_generics(&signature.generics, names, referenced, scope);
    for param in &signature.params {
        if let Some(label) = &param.label {
            names.push(label);
        }
        names.push(&param.name);
        param.ty.visit_names(&mut |n| referenced.push(n));
    }
    if let Some(result) = &signature.result {
        result.visit_names(&mut |n| referenced.push(n));
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn render_decl(decl: &Decl) -> String {
    let mut prefix = String::new();
    for attribute in &decl.attributes {
        prefix.push('@');
        prefix.push_str(attribute.name());
        prefix.push(' ');
    }
    prefix.push_str(decl.visibility.keyword());

    let mut out = String::new();
    match &decl.kind {
        DeclKind::Struct(s) => {
            out.push_str(&format!(
                "{prefix} struct {}{} {{\n",
                decl.name,
                render_generics(&s.generics)
            ));
            for field in &s.fields {
                let binding = if field.mutable { "var" } else { "let" };
                out.push_str(&format!(
                    "{INDENT}{} {binding} {}: {}\n",
                    field.visibility.keyword(),
                    field.name,
                    field.ty
                ));
            }
            out.push_str("}\n");
        }
        DeclKind::Enum(e) => {
            out.push_str(&format!(
                "{prefix} enum {}{} {{\n",
                decl.name,
                render_generics(&e.generics)
            ));
            for case in &e.cases {
                out.push_str(&format!("{INDENT}case {}", case.name));
                if !case.payload.is_empty() {
                    out.push_str(&format!("({})", join_types(&case.payload)));
                }
                out.push('\n');
            }
            out.push_str("}\n");
        }
        DeclKind::Protocol(p) => {
            out.push_str(&format!("{prefix} protocol {}", decl.name));
            if !p.inherits.is_empty() {
                out.push_str(&format!(": {}", p.inherits.join(", ")));
            }
            out.push_str(" {\n");
            for req in &p.requirements {
                out.push_str(&format!(
                    "{INDENT}func {}{}\n",
                    req.name,
                    render_signature(&req.signature)
                ));
            }
            out.push_str("}\n");
        }
        DeclKind::TypeAlias(target) => {
            out.push_str(&format!("{prefix} typealias {} = {target}\n", decl.name));
        }
        DeclKind::Func(func) => {
            out.push_str(&format!(
                "{prefix} func {}{}",
                decl.name,
                render_signature(&func.signature)
            ));
            match &func.body {
                Some(body) => {
                    out.push_str(" {\n");
                    for line in &body.lines {
                        if !line.is_empty() {
                            out.push_str(INDENT);
                            out.push_str(line);
                        }
                        out.push('\n');
                    }
                    out.push_str("}\n");
                }
                None => out.push('\n'),
            }
        }
    }
    out
}

/// `<T: A & B, U>` followed by ` where ...`, or the empty string.
fn render_generics(generics: &Generics) -> String {
    let mut out = render_generic_params(generics);
    out.push_str(&render_where(generics));
    out
}

fn render_generic_params(generics: &Generics) -> String {
    if generics.params.is_empty() {
        return String::new();
    }
    let params: Vec<String> = generics
        .params
        .iter()
        .map(|p| {
            if p.bounds.is_empty() {
                p.name.clone()
            } else {
                format!("{}: {}", p.name, p.bounds.join(" & "))
            }
        })
        .collect();
    format!("<{}>", params.join(", "))
}

fn render_where(generics: &Generics) -> String {
    if generics.where_clause.is_empty() {
        return String::new();
    }
    let constraints: Vec<String> = generics.where_clause.iter().map(|c| c.to_string()).collect();
    format!(" where {}", constraints.join(", "))
}

fn render_signature(signature: &FuncSignature) -> String {
    let mut out = render_generic_params(&signature.generics);
    let params: Vec<String> = signature.params.iter().map(render_param).collect();
    out.push_str(&format!("({})", params.join(", ")));
    if signature.throws {
        out.push_str(" throws");
    }
    if let Some(result) = &signature.result {
        out.push_str(&format!(" -> {result}"));
    }
    out.push_str(&render_where(&signature.generics));
    out
}

fn render_param(param: &Param) -> String {
    match &param.label {
        None => format!("_ {}: {}", param.name, param.ty),
        Some(label) if *label == param.name => format!("{}: {}", param.name, param.ty),
        Some(label) => format!("{label} {}: {}", param.name, param.ty),
    }
}

fn join_types(types: &[TypeRef]) -> String {
    types
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_interface;
    use stele_diagnostics::DiagnosticSink;
    use stele_ir::{
        EnumCase, EnumDecl, Field, FuncBody, FuncDecl, GenericParam, StructDecl, Visibility,
    };
    use stele_source::FileId;

    fn version() -> ToolVersion {
        "5.0".parse().unwrap()
    }

    fn func(params: Vec<Param>, result: Option<TypeRef>, body: Option<&str>) -> DeclKind {
        DeclKind::Func(FuncDecl {
            signature: FuncSignature {
                generics: Generics::default(),
                params,
                throws: false,
                result,
            },
            body: body.map(FuncBody::from_source),
        })
    }

    fn geometry() -> ModuleDecl {
        ModuleDecl::new("Geometry")
            .with_import("Swift")
            .with_import("Foundation")
            .with_decl(Decl::public(
                "Point",
                DeclKind::Struct(StructDecl {
                    generics: Generics {
                        params: vec![GenericParam::new("T")],
                        where_clause: vec![stele_ir::Constraint {
                            subject: "T".to_string(),
                            kind: ConstraintKind::Conforms(vec!["Numeric".to_string()]),
                        }],
                    },
                    fields: vec![
                        Field {
                            name: "x".to_string(),
                            visibility: Visibility::Public,
                            mutable: true,
                            ty: TypeRef::named("T"),
                        },
                        Field {
                            name: "cache".to_string(),
                            visibility: Visibility::Private,
                            mutable: true,
                            ty: TypeRef::named("Int"),
                        },
                    ],
                }),
            ))
            .with_decl(Decl::public(
                "Shape",
                DeclKind::Enum(EnumDecl {
                    generics: Generics::default(),
                    cases: vec![
                        EnumCase {
                            name: "circle".to_string(),
                            payload: vec![TypeRef::named("Double")],
                        },
                        EnumCase {
                            name: "empty".to_string(),
                            payload: vec![],
                        },
                    ],
                }),
            ))
            .with_decl(
                Decl::public(
                    "square",
                    func(
                        vec![Param::unlabeled("x", TypeRef::named("Int"))],
                        Some(TypeRef::named("Int")),
                        Some("    return x * x\n"),
                    ),
                )
                .with_attribute(Attribute::Inlinable),
            )
            .with_decl(Decl::public(
                "area",
                func(
                    vec![Param {
                        label: Some("of".to_string()),
                        name: "shape".to_string(),
                        ty: TypeRef::named("Shape"),
                    }],
                    Some(TypeRef::named("Double")),
                    Some("return 0"),
                ),
            ))
            .with_decl(
                Decl::public("hidden", func(vec![], None, None)).with_visibility(Visibility::Private),
            )
    }

    #[test]
    fn canonical_output() {
        let text = emit_to_string(
            &geometry(),
            &TextualInterfaceOptions::new("-module-name Geometry -O"),
            &version(),
        )
        .unwrap();
        let expected = "\
// swift-tools-version: 5.0
// swift-module-flags: -module-name Geometry -O

import Foundation
import Swift

public struct Point<T> where T: Numeric {
  public var x: T
}

public enum Shape {
  case circle(Double)
  case empty
}

@inlinable public func square(_ x: Int) -> Int {
  return x * x
}

public func area(of shape: Shape) -> Double
";
        assert_eq!(text, expected);
    }

    #[test]
    fn emit_parse_emit_is_fixpoint() {
        let options = TextualInterfaceOptions::new("-O");
        let first = emit_to_string(&geometry(), &options, &version()).unwrap();
        let sink = DiagnosticSink::new();
        let parsed = parse_interface("Geometry", &first, FileId::from_raw(0), &sink);
        assert!(!sink.has_errors(), "{:?}", sink.diagnostics());
        assert_eq!(parsed.module, geometry().exported_surface());
        let second = emit_to_string(&parsed.module, &options, &version()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_flags_line() {
        let text = emit_to_string(
            &ModuleDecl::new("M"),
            &TextualInterfaceOptions::default(),
            &version(),
        )
        .unwrap();
        assert_eq!(text, "// swift-tools-version: 5.0\n// swift-module-flags:\n");
    }

    #[test]
    fn unknown_attribute_is_unsupported() {
        let module = ModuleDecl::new("M").with_decl(
            Decl::public("f", func(vec![], None, None))
                .with_attribute(Attribute::Other("objc".to_string())),
        );
        let err = emit_to_string(&module, &TextualInterfaceOptions::default(), &version())
            .unwrap_err();
        assert!(matches!(err, EmitError::UnsupportedDeclaration { ref decl, .. } if decl == "f"));
        assert_eq!(err.to_diagnostic().code, codes::UNSUPPORTED_DECLARATION);
    }

    #[test]
    fn inlinable_without_body_is_unsupported() {
        let module = ModuleDecl::new("M").with_decl(
            Decl::public("f", func(vec![], None, None)).with_attribute(Attribute::Inlinable),
        );
        assert!(emit_to_string(&module, &TextualInterfaceOptions::default(), &version()).is_err());
    }

    #[test]
    fn leaking_internal_type_is_unsupported() {
        let module = ModuleDecl::new("M")
            .with_decl(
                Decl::public("Secret", DeclKind::Struct(StructDecl::default()))
                    .with_visibility(Visibility::Internal),
            )
            .with_decl(Decl::public(
                "reveal",
                func(vec![], Some(TypeRef::named("M.Secret").optional()), None),
            ));
        let err = emit_to_string(&module, &TextualInterfaceOptions::default(), &version())
            .unwrap_err();
        assert!(err.to_string().contains("Secret"));
    }

    #[test]
    fn generic_params_shadow_local_types() {
        let module = ModuleDecl::new("M")
            .with_decl(
                Decl::public("T", DeclKind::Struct(StructDecl::default()))
                    .with_visibility(Visibility::Internal),
            )
            .with_decl(Decl::public(
                "id",
                DeclKind::Func(FuncDecl {
                    signature: FuncSignature {
                        generics: Generics {
                            params: vec![GenericParam::new("T")],
                            where_clause: vec![],
                        },
                        params: vec![Param::unlabeled("x", TypeRef::named("T"))],
                        throws: false,
                        result: Some(TypeRef::named("T")),
                    },
                    body: None,
                }),
            ));
        assert!(emit_to_string(&module, &TextualInterfaceOptions::default(), &version()).is_ok());
    }

    #[test]
    fn invalid_identifier_is_unsupported() {
        let module = ModuleDecl::new("M").with_decl(Decl::public("where", func(vec![], None, None)));
        assert!(emit_to_string(&module, &TextualInterfaceOptions::default(), &version()).is_err());
    }

    #[test]
    fn multiline_flags_are_rejected() {
        let err = emit_to_string(
            &ModuleDecl::new("M"),
            &TextualInterfaceOptions::new("-a\n-b"),
            &version(),
        )
        .unwrap_err();
        assert!(matches!(err, EmitError::InvalidFlags));
    }

    #[test]
    fn flags_with_surrounding_whitespace_are_rejected() {
        for flags in ["-O ", " -O", "\t-O"] {
            let err = emit_to_string(
                &ModuleDecl::new("M"),
                &TextualInterfaceOptions::new(flags),
                &version(),
            )
            .unwrap_err();
            assert!(matches!(err, EmitError::InvalidFlags), "{flags:?}");
        }
    }

    #[test]
    fn flags_read_back_verbatim() {
        let flags = "-O  -D X";
        let text = emit_to_string(
            &ModuleDecl::new("M"),
            &TextualInterfaceOptions::new(flags),
            &version(),
        )
        .unwrap();
        assert_eq!(
            crate::header::scan_header(&text).header.module_flags.as_deref(),
            Some(flags)
        );
    }

    #[test]
    fn failed_emit_writes_nothing() {
        let module = ModuleDecl::new("M")
            .with_decl(Decl::public("ok", func(vec![], None, None)))
            .with_decl(
                Decl::public("bad", func(vec![], None, None)).with_attribute(Attribute::Inlinable),
            );
        let mut out = Vec::new();
        assert!(emit(&module, &TextualInterfaceOptions::default(), &version(), &mut out).is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn deterministic() {
        let options = TextualInterfaceOptions::new("-O");
        let a = emit_to_string(&geometry(), &options, &version()).unwrap();
        let b = emit_to_string(&geometry(), &options, &version()).unwrap();
        assert_eq!(a, b);
    }
}
