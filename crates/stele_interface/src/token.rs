//! Token types for the interface body lexer.

use stele_source::Span;

/// A token kind. Text is recovered from the source through the token's span.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SwiftToken {
    // === Keywords ===
    /// `case`
    Case,
    /// `enum`
    Enum,
    /// `fileprivate`
    Fileprivate,
    /// `func`
    Func,
    /// `import`
    Import,
    /// `internal`
    Internal,
    /// `let`
    Let,
    /// `open`
    Open,
    /// `private`
    Private,
    /// `protocol`
    Protocol,
    /// `public`
    Public,
    /// `struct`
    Struct,
    /// `throws`
    Throws,
    /// `typealias`
    Typealias,
    /// `var`
    Var,
    /// `where`
    Where,

    // === Names and literals ===
    /// An identifier.
    Identifier,
    /// `_`
    Underscore,
    /// A numeric literal.
    Number,
    /// A string literal, including its quotes.
    StringLiteral,

    // === Punctuation ===
    /// `@`
    At,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `<`
    LeftAngle,
    /// `>`
    RightAngle,
    /// `:`
    Colon,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `?`
    Question,
    /// `->`
    Arrow,
    /// `&`
    Ampersand,
    /// `==`
    EqualEqual,
    /// `=`
    Equal,
    /// `;`
    Semicolon,
    /// Any other operator character run.
    Operator,

    // === Special ===
    /// A character the lexer could not make sense of.
    Error,
    /// End of input.
    Eof,
}

impl SwiftToken {
    /// Returns `true` for access-level keywords.
    pub fn is_visibility(self) -> bool {
        matches!(
            self,
            SwiftToken::Public
                | SwiftToken::Open
                | SwiftToken::Internal
                | SwiftToken::Private
                | SwiftToken::Fileprivate
        )
    }

    /// Returns `true` for tokens that can start a top-level item.
    pub fn starts_item(self) -> bool {
        self.is_visibility()
            || matches!(
                self,
                SwiftToken::At
                    | SwiftToken::Import
                    | SwiftToken::Struct
                    | SwiftToken::Enum
                    | SwiftToken::Protocol
                    | SwiftToken::Typealias
                    | SwiftToken::Func
            )
    }

    /// A short human-readable description for error messages.
    pub fn describe(self) -> &'static str {
        match self {
            SwiftToken::Identifier => "identifier",
            SwiftToken::Underscore => "'_'",
            SwiftToken::Number => "number",
            SwiftToken::StringLiteral => "string literal",
            SwiftToken::At => "'@'",
            SwiftToken::LeftBrace => "'{'",
            SwiftToken::RightBrace => "'}'",
            SwiftToken::LeftParen => "'('",
            SwiftToken::RightParen => "')'",
            SwiftToken::LeftBracket => "'['",
            SwiftToken::RightBracket => "']'",
            SwiftToken::LeftAngle => "'<'",
            SwiftToken::RightAngle => "'>'",
            SwiftToken::Colon => "':'",
            SwiftToken::Comma => "','",
            SwiftToken::Dot => "'.'",
            SwiftToken::Question => "'?'",
            SwiftToken::Arrow => "'->'",
            SwiftToken::Ampersand => "'&'",
            SwiftToken::EqualEqual => "'=='",
            SwiftToken::Equal => "'='",
            SwiftToken::Semicolon => "';'",
            SwiftToken::Operator => "operator",
            SwiftToken::Error => "invalid token",
            SwiftToken::Eof => "end of file",
            SwiftToken::Case => "'case'",
            SwiftToken::Enum => "'enum'",
            SwiftToken::Fileprivate => "'fileprivate'",
            SwiftToken::Func => "'func'",
            SwiftToken::Import => "'import'",
            SwiftToken::Internal => "'internal'",
            SwiftToken::Let => "'let'",
            SwiftToken::Open => "'open'",
            SwiftToken::Private => "'private'",
            SwiftToken::Protocol => "'protocol'",
            SwiftToken::Public => "'public'",
            SwiftToken::Struct => "'struct'",
            SwiftToken::Throws => "'throws'",
            SwiftToken::Typealias => "'typealias'",
            SwiftToken::Var => "'var'",
            SwiftToken::Where => "'where'",
        }
    }
}

/// A token with its source location.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Token {
    /// The kind of this token.
    pub kind: SwiftToken,
    /// The source span covering this token's text.
    pub span: Span,
}

/// Looks up a keyword. Returns `None` for ordinary identifiers.
pub fn lookup_keyword(s: &str) -> Option<SwiftToken> {
    match s {
        "case" => Some(SwiftToken::Case),
        "enum" => Some(SwiftToken::Enum),
        "fileprivate" => Some(SwiftToken::Fileprivate),
        "func" => Some(SwiftToken::Func),
        "import" => Some(SwiftToken::Import),
        "internal" => Some(SwiftToken::Internal),
        "let" => Some(SwiftToken::Let),
        "open" => Some(SwiftToken::Open),
        "private" => Some(SwiftToken::Private),
        "protocol" => Some(SwiftToken::Protocol),
        "public" => Some(SwiftToken::Public),
        "struct" => Some(SwiftToken::Struct),
        "throws" => Some(SwiftToken::Throws),
        "typealias" => Some(SwiftToken::Typealias),
        "var" => Some(SwiftToken::Var),
        "where" => Some(SwiftToken::Where),
        "_" => Some(SwiftToken::Underscore),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords() {
        assert_eq!(lookup_keyword("func"), Some(SwiftToken::Func));
        assert_eq!(lookup_keyword("_"), Some(SwiftToken::Underscore));
        assert_eq!(lookup_keyword("Func"), None);
        assert_eq!(lookup_keyword("square"), None);
    }

    #[test]
    fn item_starters() {
        assert!(SwiftToken::At.starts_item());
        assert!(SwiftToken::Fileprivate.starts_item());
        assert!(!SwiftToken::Case.starts_item());
    }
}
