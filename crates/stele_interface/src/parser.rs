//! Recursive descent parser for interface bodies.
//!
//! [`parse_interface`] scans the header, lexes the body and builds a
//! [`ModuleDecl`]. Syntax errors are reported to the [`DiagnosticSink`] as
//! E102; the parser then skips to the next top-level item so one bad
//! declaration does not hide problems in the rest of the file.

use crate::header::{scan_header, HeaderScan};
use crate::lexer::lex;
use crate::token::{SwiftToken, Token};
use stele_diagnostics::{codes, Diagnostic, DiagnosticSink};
use stele_ir::{
    Attribute, Constraint, ConstraintKind, Decl, DeclKind, EnumCase, EnumDecl, Field, FuncBody,
    FuncDecl, FuncSignature, GenericParam, Generics, ModuleDecl, Param, ProtocolDecl, Requirement,
    StructDecl, TypeRef, Visibility,
};
use stele_source::{FileId, Span};

/// A parsed textual interface.
#[derive(Clone, Debug)]
pub struct ParsedInterface {
    /// Header markers and anomalies.
    pub header: HeaderScan,
    /// The declarations of the body.
    pub module: ModuleDecl,
}

/// Parses a complete textual interface for the module `module_name`.
///
/// Header anomalies are recorded in the returned [`HeaderScan`] but not
/// reported; callers decide whether to pass them to
/// [`report_header`](crate::header::report_header).
pub fn parse_interface(
    module_name: &str,
    source: &str,
    file: FileId,
    sink: &DiagnosticSink,
) -> ParsedInterface {
    let header = scan_header(source);
    let tokens = lex(source, header.body_offset, file, sink);
    let mut parser = InterfaceParser::new(tokens, source, sink);
    let module = parser.parse_module(module_name);
    ParsedInterface { header, module }
}

/// A recursive descent parser over a token stream produced by [`lex`].
///
/// Parse methods return `None` after reporting an error; the caller
/// recovers at item granularity.
pub struct InterfaceParser<'src> {
    tokens: Vec<Token>,
    pos: usize,
    source: &'src str,
    sink: &'src DiagnosticSink,
}

impl<'src> InterfaceParser<'src> {
    /// Creates a parser. `tokens` must have been lexed from `source` and end with `Eof`.
    pub fn new(tokens: Vec<Token>, source: &'src str, sink: &'src DiagnosticSink) -> Self {
        Self {
            tokens,
            pos: 0,
            source,
            sink,
        }
    }

    // ========================================================================
    // Primitive operations
    // ========================================================================

    fn current(&self) -> SwiftToken {
        self.tokens.get(self.pos).map_or(SwiftToken::Eof, |t| t.kind)
    }

    fn current_span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(Span::DUMMY, |t| t.span)
    }

    fn current_text(&self) -> &'src str {
        let span = self.current_span();
        self.source
            .get(span.start as usize..span.end as usize)
            .unwrap_or("")
    }

    fn at(&self, kind: SwiftToken) -> bool {
        self.current() == kind
    }

    fn at_eof(&self) -> bool {
        self.at(SwiftToken::Eof)
    }

    fn advance(&mut self) {
        if !self.at_eof() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: SwiftToken) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: SwiftToken) -> Option<()> {
        if self.eat(kind) {
            Some(())
        } else {
            self.expected(kind.describe())
        }
    }

    fn expect_ident(&mut self) -> Option<String> {
        if self.at(SwiftToken::Identifier) {
            let text = self.current_text().to_string();
            self.advance();
            Some(text)
        } else {
            self.expected("identifier")
        }
    }

    // ========================================================================
    // Error handling and recovery
    // ========================================================================

    fn error<T>(&self, msg: impl Into<String>) -> Option<T> {
        self.sink.emit(Diagnostic::error(
            codes::SYNTAX_ERROR,
            msg,
            self.current_span(),
        ));
        None
    }

    fn expected<T>(&self, what: &str) -> Option<T> {
        self.error(format!(
            "expected {what}, found {}",
            self.current().describe()
        ))
    }

    /// Skips past the `}` that closes the innermost open brace.
    fn skip_to_close_brace(&mut self) {
        let mut depth = 0usize;
        while !self.at_eof() {
            match self.current() {
                SwiftToken::LeftBrace => depth += 1,
                SwiftToken::RightBrace => {
                    if depth == 0 {
                        self.advance();
                        return;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.advance();
        }
    }

    /// Skips to the next token that can start a top-level item, outside braces.
    fn recover_to_item(&mut self, start: usize) {
        if self.pos == start {
            self.advance();
        }
        let mut depth = 0usize;
        while !self.at_eof() {
            match self.current() {
                SwiftToken::LeftBrace => depth += 1,
                SwiftToken::RightBrace => depth = depth.saturating_sub(1),
                kind if depth == 0 && kind.starts_item() => return,
                _ => {}
            }
            self.advance();
        }
    }

    // ========================================================================
    // Items
    // ========================================================================

    /// Parses every item up to end of file.
    pub fn parse_module(&mut self, name: &str) -> ModuleDecl {
        let mut module = ModuleDecl::new(name);
        while !self.at_eof() {
            let start = self.pos;
            if self.parse_item(&mut module).is_none() {
                self.recover_to_item(start);
            }
        }
        module
    }

    fn parse_item(&mut self, module: &mut ModuleDecl) -> Option<()> {
        if self.eat(SwiftToken::Import) {
            let name = self.parse_dotted_name()?;
            module.imports.push(name);
            return Some(());
        }
        let decl = self.parse_decl()?;
        module.decls.push(decl);
        Some(())
    }

    fn parse_attributes(&mut self, attributes: &mut Vec<Attribute>) -> Option<()> {
        while self.eat(SwiftToken::At) {
            let name = self.expect_ident()?;
            if self.at(SwiftToken::LeftParen) {
                self.skip_balanced_parens();
            }
            attributes.push(Attribute::from_name(&name));
        }
        Some(())
    }

    fn skip_balanced_parens(&mut self) {
        let mut depth = 0usize;
        while !self.at_eof() {
            match self.current() {
                SwiftToken::LeftParen => depth += 1,
                SwiftToken::RightParen => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        return;
                    }
                }
                _ => {}
            }
            self.advance();
        }
    }

    fn parse_decl(&mut self) -> Option<Decl> {
        let mut attributes = Vec::new();
        self.parse_attributes(&mut attributes)?;
        let mut visibility = Visibility::Internal;
        if self.current().is_visibility() {
            visibility = Visibility::from_keyword(self.current_text()).unwrap_or(Visibility::Internal);
            self.advance();
            self.parse_attributes(&mut attributes)?;
        }

        let (name, kind) = match self.current() {
            SwiftToken::Struct => self.parse_struct()?,
            SwiftToken::Enum => self.parse_enum()?,
            SwiftToken::Protocol => self.parse_protocol()?,
            SwiftToken::Typealias => self.parse_typealias()?,
            SwiftToken::Func => self.parse_func()?,
            _ => return self.expected("declaration"),
        };

        Some(Decl {
            name,
            visibility,
            attributes,
            kind,
        })
    }

    fn parse_struct(&mut self) -> Option<(String, DeclKind)> {
        self.expect(SwiftToken::Struct)?;
        let name = self.expect_ident()?;
        let generics = self.parse_generics()?;
        self.expect(SwiftToken::LeftBrace)?;
        let mut fields = Vec::new();
        while !self.at(SwiftToken::RightBrace) && !self.at_eof() {
            match self.parse_field() {
                Some(field) => fields.push(field),
                None => {
                    self.skip_to_close_brace();
                    return None;
                }
            }
        }
        self.expect(SwiftToken::RightBrace)?;
        Some((name, DeclKind::Struct(StructDecl { generics, fields })))
    }

    fn parse_field(&mut self) -> Option<Field> {
        let mut visibility = Visibility::Internal;
        if self.current().is_visibility() {
            visibility = Visibility::from_keyword(self.current_text()).unwrap_or(Visibility::Internal);
            self.advance();
        }
        let mutable = match self.current() {
            SwiftToken::Var => true,
            SwiftToken::Let => false,
            _ => return self.expected("'var' or 'let'"),
        };
        self.advance();
        let name = self.expect_ident()?;
        self.expect(SwiftToken::Colon)?;
        let ty = self.parse_type()?;
        self.eat(SwiftToken::Semicolon);
        Some(Field {
            name,
            visibility,
            mutable,
            ty,
        })
    }

    fn parse_enum(&mut self) -> Option<(String, DeclKind)> {
        self.expect(SwiftToken::Enum)?;
        let name = self.expect_ident()?;
        let generics = self.parse_generics()?;
        self.expect(SwiftToken::LeftBrace)?;
        let mut cases = Vec::new();
        while !self.at(SwiftToken::RightBrace) && !self.at_eof() {
            if self.parse_case_line(&mut cases).is_none() {
                self.skip_to_close_brace();
                return None;
            }
        }
        self.expect(SwiftToken::RightBrace)?;
        Some((name, DeclKind::Enum(EnumDecl { generics, cases })))
    }

    fn parse_case_line(&mut self, cases: &mut Vec<EnumCase>) -> Option<()> {
        self.expect(SwiftToken::Case)?;
        loop {
            let name = self.expect_ident()?;
            let payload = if self.at(SwiftToken::LeftParen) {
                self.parse_type_list(SwiftToken::LeftParen, SwiftToken::RightParen)?
            } else {
                Vec::new()
            };
            cases.push(EnumCase { name, payload });
            if !self.eat(SwiftToken::Comma) {
                break;
            }
        }
        self.eat(SwiftToken::Semicolon);
        Some(())
    }

    fn parse_protocol(&mut self) -> Option<(String, DeclKind)> {
        self.expect(SwiftToken::Protocol)?;
        let name = self.expect_ident()?;
        let mut inherits = Vec::new();
        if self.eat(SwiftToken::Colon) {
            loop {
                inherits.push(self.parse_dotted_name()?);
                if !self.eat(SwiftToken::Comma) {
                    break;
                }
            }
        }
        self.expect(SwiftToken::LeftBrace)?;
        let mut requirements = Vec::new();
        while !self.at(SwiftToken::RightBrace) && !self.at_eof() {
            match self.parse_requirement() {
                Some(req) => requirements.push(req),
                None => {
                    self.skip_to_close_brace();
                    return None;
                }
            }
        }
        self.expect(SwiftToken::RightBrace)?;
        Some((
            name,
            DeclKind::Protocol(ProtocolDecl {
                inherits,
                requirements,
            }),
        ))
    }

    fn parse_requirement(&mut self) -> Option<Requirement> {
        self.expect(SwiftToken::Func)?;
        let name = self.expect_ident()?;
        let signature = self.parse_signature()?;
        self.eat(SwiftToken::Semicolon);
        Some(Requirement { name, signature })
    }

    fn parse_typealias(&mut self) -> Option<(String, DeclKind)> {
        self.expect(SwiftToken::Typealias)?;
        let name = self.expect_ident()?;
        self.expect(SwiftToken::Equal)?;
        let target = self.parse_type()?;
        Some((name, DeclKind::TypeAlias(target)))
    }

    fn parse_func(&mut self) -> Option<(String, DeclKind)> {
        self.expect(SwiftToken::Func)?;
        let name = self.expect_ident()?;
        let signature = self.parse_signature()?;
        let body = if self.at(SwiftToken::LeftBrace) {
            Some(self.parse_body()?)
        } else {
            None
        };
        Some((name, DeclKind::Func(FuncDecl { signature, body })))
    }

    /// Parses `<generics>(params) throws -> Result where ...`.
    fn parse_signature(&mut self) -> Option<FuncSignature> {
        let params_generics = self.parse_generic_params()?;
        let params = self.parse_params()?;
        let throws = self.eat(SwiftToken::Throws);
        let result = if self.eat(SwiftToken::Arrow) {
            Some(self.parse_type()?)
        } else {
            None
        };
        let where_clause = self.parse_where_clause()?;
        Some(FuncSignature {
            generics: Generics {
                params: params_generics,
                where_clause,
            },
            params,
            throws,
            result,
        })
    }

    /// Captures the source text between a body's braces.
    fn parse_body(&mut self) -> Option<FuncBody> {
        let open = self.current_span();
        self.expect(SwiftToken::LeftBrace)?;
        let mut depth = 0usize;
        loop {
            match self.current() {
                SwiftToken::Eof => return self.error("unterminated function body"),
                SwiftToken::LeftBrace => depth += 1,
                SwiftToken::RightBrace if depth == 0 => break,
                SwiftToken::RightBrace => depth -= 1,
                _ => {}
            }
            self.advance();
        }
        let close = self.current_span();
        self.advance();
        let text = self
            .source
            .get(open.end as usize..close.start as usize)
            .unwrap_or("");
        Some(FuncBody::from_source(text))
    }

    // ========================================================================
    // Generics
    // ========================================================================

    /// Parses optional generic parameters followed by an optional `where` clause.
    fn parse_generics(&mut self) -> Option<Generics> {
        let params = self.parse_generic_params()?;
        let where_clause = self.parse_where_clause()?;
        Some(Generics {
            params,
            where_clause,
        })
    }

    fn parse_generic_params(&mut self) -> Option<Vec<GenericParam>> {
        let mut params = Vec::new();
        if !self.eat(SwiftToken::LeftAngle) {
            return Some(params);
        }
        loop {
            let name = self.expect_ident()?;
            let bounds = if self.eat(SwiftToken::Colon) {
                self.parse_protocol_composition()?
            } else {
                Vec::new()
            };
            params.push(GenericParam { name, bounds });
            if !self.eat(SwiftToken::Comma) {
                break;
            }
        }
        self.expect(SwiftToken::RightAngle)?;
        Some(params)
    }

    fn parse_where_clause(&mut self) -> Option<Vec<Constraint>> {
        let mut constraints = Vec::new();
        if !self.eat(SwiftToken::Where) {
            return Some(constraints);
        }
        loop {
            let subject = self.parse_dotted_name()?;
            let kind = if self.eat(SwiftToken::Colon) {
                ConstraintKind::Conforms(self.parse_protocol_composition()?)
            } else if self.eat(SwiftToken::EqualEqual) {
                ConstraintKind::SameType(self.parse_type()?)
            } else {
                return self.expected("':' or '=='");
            };
            constraints.push(Constraint { subject, kind });
            if !self.eat(SwiftToken::Comma) {
                break;
            }
        }
        Some(constraints)
    }

    fn parse_protocol_composition(&mut self) -> Option<Vec<String>> {
        let mut names = vec![self.parse_dotted_name()?];
        while self.eat(SwiftToken::Ampersand) {
            names.push(self.parse_dotted_name()?);
        }
        Some(names)
    }

    // ========================================================================
    // Parameters and types
    // ========================================================================

    fn parse_params(&mut self) -> Option<Vec<Param>> {
        self.expect(SwiftToken::LeftParen)?;
        let mut params = Vec::new();
        if self.eat(SwiftToken::RightParen) {
            return Some(params);
        }
        loop {
            params.push(self.parse_param()?);
            if !self.eat(SwiftToken::Comma) {
                break;
            }
        }
        self.expect(SwiftToken::RightParen)?;
        Some(params)
    }

    fn parse_param(&mut self) -> Option<Param> {
        let (label, name) = if self.eat(SwiftToken::Underscore) {
            (None, self.expect_ident()?)
        } else {
            let first = self.expect_ident()?;
            if self.at(SwiftToken::Identifier) {
                (Some(first), self.expect_ident()?)
            } else {
                (Some(first.clone()), first)
            }
        };
        self.expect(SwiftToken::Colon)?;
        let ty = self.parse_type()?;
        Some(Param { label, name, ty })
    }

    fn parse_type(&mut self) -> Option<TypeRef> {
        let mut ty = match self.current() {
            SwiftToken::LeftBracket => {
                self.advance();
                let element = self.parse_type()?;
                self.expect(SwiftToken::RightBracket)?;
                element.array()
            }
            SwiftToken::LeftParen => {
                TypeRef::Tuple(self.parse_type_list(SwiftToken::LeftParen, SwiftToken::RightParen)?)
            }
            SwiftToken::Identifier => {
                let name = self.parse_dotted_name()?;
                let args = if self.at(SwiftToken::LeftAngle) {
                    self.parse_type_list(SwiftToken::LeftAngle, SwiftToken::RightAngle)?
                } else {
                    Vec::new()
                };
                TypeRef::Named { name, args }
            }
            _ => return self.expected("type"),
        };
        while self.eat(SwiftToken::Question) {
            ty = ty.optional();
        }
        Some(ty)
    }

    /// Parses `open type, type, ... close`, allowing an empty list.
    fn parse_type_list(&mut self, open: SwiftToken, close: SwiftToken) -> Option<Vec<TypeRef>> {
        self.expect(open)?;
        let mut types = Vec::new();
        if self.eat(close) {
            return Some(types);
        }
        loop {
            types.push(self.parse_type()?);
            if !self.eat(SwiftToken::Comma) {
                break;
            }
        }
        self.expect(close)?;
        Some(types)
    }

    fn parse_dotted_name(&mut self) -> Option<String> {
        let mut name = self.expect_ident()?;
        while self.at(SwiftToken::Dot) {
            self.advance();
            name.push('.');
            name.push_str(&self.expect_ident()?);
        }
        Some(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> (ModuleDecl, DiagnosticSink) {
        let sink = DiagnosticSink::new();
        let parsed = parse_interface("Geometry", src, FileId::from_raw(0), &sink);
        (parsed.module, sink)
    }

    #[test]
    fn parses_full_example() {
        let src = "\
// swift-tools-version: 5.0
// swift-module-flags: -module-name Geometry -O

import Foundation

public struct Point<T> where T: Numeric {
  public var x: T
  public let y: T
}

public enum Shape {
  case circle(Double)
  case empty
}

public protocol Drawable {
  func draw(into canvas: Canvas) -> Bool
}

public typealias Coord = Point<Double>

public func distance<T: Numeric>(from a: Point<T>, to b: Point<T>) throws -> T

@inlinable public func square(_ x: Int) -> Int {
  return x * x
}
";
        let (module, sink) = parse(src);
        assert!(!sink.has_errors(), "{:?}", sink.diagnostics());
        assert_eq!(module.imports, vec!["Foundation"]);
        assert_eq!(module.decls.len(), 6);

        let DeclKind::Struct(point) = &module.find("Point").unwrap().kind else {
            panic!("Point is not a struct");
        };
        assert_eq!(point.fields.len(), 2);
        assert!(point.fields[0].mutable);
        assert!(!point.fields[1].mutable);
        assert_eq!(point.generics.where_clause[0].to_string(), "T: Numeric");

        let DeclKind::Func(distance) = &module.find("distance").unwrap().kind else {
            panic!("distance is not a func");
        };
        assert!(distance.signature.throws);
        assert_eq!(distance.signature.params[0].label.as_deref(), Some("from"));
        assert_eq!(distance.signature.params[0].name, "a");
        assert!(distance.body.is_none());

        let square = module.find("square").unwrap();
        assert!(square.has_attribute(&Attribute::Inlinable));
        let DeclKind::Func(square) = &square.kind else {
            panic!("square is not a func");
        };
        assert_eq!(square.signature.params[0].label, None);
        assert_eq!(square.body.as_ref().unwrap().lines, vec!["return x * x"]);
    }

    #[test]
    fn default_visibility_is_internal() {
        let (module, _) = parse("@usableFromInline func helper()\n");
        let helper = module.find("helper").unwrap();
        assert_eq!(helper.visibility, Visibility::Internal);
        assert!(helper.is_exported());
    }

    #[test]
    fn nested_braces_and_strings_in_body() {
        let src = "@inlinable public func f(_ b: Bool) -> String {\n  if b {\n    return \"}\"\n  }\n  return \"{\"\n}\npublic func g()\n";
        let (module, sink) = parse(src);
        assert!(!sink.has_errors());
        let DeclKind::Func(f) = &module.find("f").unwrap().kind else {
            panic!("f is not a func");
        };
        assert_eq!(
            f.body.as_ref().unwrap().lines,
            vec!["if b {", "  return \"}\"", "}", "return \"{\""]
        );
        assert!(module.find("g").is_some());
    }

    #[test]
    fn where_clause_same_type() {
        let (module, sink) = parse("public func sum<S: Sequence>(_ s: S) -> Int where S.Element == Int\n");
        assert!(!sink.has_errors());
        let DeclKind::Func(sum) = &module.find("sum").unwrap().kind else {
            panic!("sum is not a func");
        };
        assert_eq!(sum.signature.generics.params[0].bounds, vec!["Sequence"]);
        assert_eq!(sum.signature.generics.where_clause[0].to_string(), "S.Element == Int");
    }

    #[test]
    fn complex_types() {
        let (module, sink) =
            parse("public func f(x: [Swift.Int]?, y: (Int, Bool), z: Dictionary<String, [Int]>) -> ()\n");
        assert!(!sink.has_errors());
        let DeclKind::Func(f) = &module.find("f").unwrap().kind else {
            panic!("f is not a func");
        };
        let rendered: Vec<String> = f.signature.params.iter().map(|p| p.ty.to_string()).collect();
        assert_eq!(rendered, vec!["[Swift.Int]?", "(Int, Bool)", "Dictionary<String, [Int]>"]);
        assert_eq!(f.signature.result, Some(TypeRef::unit()));
    }

    #[test]
    fn recovers_after_syntax_error() {
        let src = "public func broken(x Int)\npublic struct S {\n  public var a: Int\n}\n";
        let (module, sink) = parse(src);
        assert_eq!(sink.count_code(codes::SYNTAX_ERROR), 1);
        assert!(module.find("broken").is_none());
        assert!(module.find("S").is_some());
    }

    #[test]
    fn bad_member_skips_whole_struct() {
        let src = "public struct S {\n  public func nope()\n  public var a: Int\n}\npublic func after()\n";
        let (module, sink) = parse(src);
        assert_eq!(sink.count_code(codes::SYNTAX_ERROR), 1);
        assert!(module.find("S").is_none());
        assert!(module.find("after").is_some());
    }

    #[test]
    fn unterminated_body_is_an_error() {
        let (module, sink) = parse("@inlinable public func f() {\n  return\n");
        assert!(sink.has_errors());
        assert!(module.decls.is_empty());
    }

    #[test]
    fn unicode_indentation_in_body_is_a_lex_error_not_a_crash() {
        let src = "@inlinable public func f() {\n  a\n\u{3000}b\n}\npublic func g()\n";
        let (module, sink) = parse(src);
        assert_eq!(sink.count_code(codes::LEX_ERROR), 1);
        assert!(module.find("g").is_some());
    }

    #[test]
    fn malformed_header_still_parses_body() {
        let src = "// swift-tools-version: 5.0\n// swift-module-flags -foo\npublic func f()\n";
        let sink = DiagnosticSink::new();
        let parsed = parse_interface("M", src, FileId::from_raw(0), &sink);
        assert!(!sink.has_errors());
        assert!(parsed.header.header.module_flags.is_none());
        assert_eq!(parsed.header.anomalies.len(), 1);
        assert!(parsed.module.find("f").is_some());
    }

    #[test]
    fn enum_case_lists_and_attributes_with_arguments() {
        let src = "@frozen public enum E {\n  case a, b(Int, String)\n}\n@available(macOS 10.15, *) public func f()\n";
        let (module, sink) = parse(src);
        assert!(!sink.has_errors());
        let DeclKind::Enum(e) = &module.find("E").unwrap().kind else {
            panic!("E is not an enum");
        };
        assert_eq!(e.cases.len(), 2);
        assert_eq!(e.cases[1].payload.len(), 2);
        let f = module.find("f").unwrap();
        assert_eq!(f.attributes, vec![Attribute::Other("available".to_string())]);
    }
}
