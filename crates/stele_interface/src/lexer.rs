//! Lexical analyzer for interface bodies.
//!
//! Converts the body of a textual interface into [`Token`]s. Line comments and
//! nesting block comments are skipped, string literals (including `"""`
//! multi-line strings) become single tokens so braces inside them never count
//! toward body nesting. Errors are reported to the [`DiagnosticSink`] as E101
//! and produce [`SwiftToken::Error`] tokens.

use crate::token::{lookup_keyword, SwiftToken, Token};
use stele_diagnostics::{codes, Diagnostic, DiagnosticSink};
use stele_source::{FileId, Span};

/// Lexes `source` starting at byte offset `start`.
///
/// Spans are absolute offsets into `source`, so they resolve against the whole
/// file. The returned vector always ends with a [`SwiftToken::Eof`] token.
pub fn lex(source: &str, start: usize, file: FileId, sink: &DiagnosticSink) -> Vec<Token> {
    let mut lexer = Lexer {
        source,
        bytes: source.as_bytes(),
        pos: start.min(source.len()),
        file,
        sink,
    };
    lexer.lex_all()
}

struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    file: FileId,
    sink: &'a DiagnosticSink,
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

fn is_operator_char(b: u8) -> bool {
    matches!(
        b,
        b'+' | b'-' | b'*' | b'/' | b'%' | b'!' | b'|' | b'^' | b'~' | b'#' | b'\\' | b'`'
    )
}

impl Lexer<'_> {
    fn lex_all(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments();
            if self.pos >= self.bytes.len() {
                tokens.push(Token {
                    kind: SwiftToken::Eof,
                    span: Span::new(self.file, self.pos as u32, self.pos as u32),
                });
                break;
            }
            tokens.push(self.next_token());
        }
        tokens
    }

    fn peek(&self) -> u8 {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> u8 {
        self.bytes.get(self.pos + offset).copied().unwrap_or(0)
    }

    fn span_from(&self, start: usize) -> Span {
        Span::new(self.file, start as u32, self.pos as u32)
    }

    fn error(&self, msg: &str, span: Span) {
        self.sink
            .emit(Diagnostic::error(codes::LEX_ERROR, msg, span));
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }
            if self.peek() == b'/' && self.peek_at(1) == b'/' {
                while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                    self.pos += 1;
                }
                continue;
            }
            if self.peek() == b'/' && self.peek_at(1) == b'*' {
                let start = self.pos;
                self.pos += 2;
                let mut depth = 1;
                while depth > 0 {
                    if self.pos >= self.bytes.len() {
                        self.error("unterminated block comment", self.span_from(start));
                        return;
                    }
                    if self.peek() == b'/' && self.peek_at(1) == b'*' {
                        depth += 1;
                        self.pos += 2;
                    } else if self.peek() == b'*' && self.peek_at(1) == b'/' {
                        depth -= 1;
                        self.pos += 2;
                    } else {
                        self.pos += 1;
                    }
                }
                continue;
            }
            break;
        }
    }

    fn next_token(&mut self) -> Token {
        let start = self.pos;
        let b = self.peek();

        let kind = if is_ident_start(b) {
            while self.pos < self.bytes.len() && is_ident_continue(self.bytes[self.pos]) {
                self.pos += 1;
            }
            lookup_keyword(&self.source[start..self.pos]).unwrap_or(SwiftToken::Identifier)
        } else if b.is_ascii_digit() {
            self.lex_number()
        } else if b == b'"' {
            self.lex_string(start)
        } else {
            self.lex_punct(start)
        };

        Token {
            kind,
            span: self.span_from(start),
        }
    }

    fn lex_number(&mut self) -> SwiftToken {
        while self.pos < self.bytes.len() {
            let c = self.bytes[self.pos];
            if c.is_ascii_alphanumeric() || c == b'_' {
                self.pos += 1;
            } else if c == b'.' && self.peek_at(1).is_ascii_digit() {
                self.pos += 1;
            } else {
                break;
            }
        }
        SwiftToken::Number
    }

    fn lex_string(&mut self, start: usize) -> SwiftToken {
        if self.peek_at(1) == b'"' && self.peek_at(2) == b'"' {
            self.pos += 3;
            loop {
                if self.pos >= self.bytes.len() {
                    self.error("unterminated multi-line string literal", self.span_from(start));
                    return SwiftToken::Error;
                }
                if self.peek() == b'\\' {
                    self.pos += 2;
                    continue;
                }
                if self.peek() == b'"' && self.peek_at(1) == b'"' && self.peek_at(2) == b'"' {
                    self.pos += 3;
                    return SwiftToken::StringLiteral;
                }
                self.pos += 1;
            }
        }

        self.pos += 1;
        loop {
            match self.peek() {
                0 if self.pos >= self.bytes.len() => {
                    self.error("unterminated string literal", self.span_from(start));
                    return SwiftToken::Error;
                }
                b'\n' => {
                    self.error("unterminated string literal", self.span_from(start));
                    return SwiftToken::Error;
                }
                b'\\' => self.pos = (self.pos + 2).min(self.bytes.len()),
                b'"' => {
                    self.pos += 1;
                    return SwiftToken::StringLiteral;
                }
                _ => self.pos += 1,
            }
        }
    }

    fn lex_punct(&mut self, start: usize) -> SwiftToken {
        let b = self.peek();
        self.pos += 1;
        match b {
            b'@' => SwiftToken::At,
            b'{' => SwiftToken::LeftBrace,
            b'}' => SwiftToken::RightBrace,
            b'(' => SwiftToken::LeftParen,
            b')' => SwiftToken::RightParen,
            b'[' => SwiftToken::LeftBracket,
            b']' => SwiftToken::RightBracket,
            b'<' => SwiftToken::LeftAngle,
            b'>' => SwiftToken::RightAngle,
            b':' => SwiftToken::Colon,
            b',' => SwiftToken::Comma,
            b'.' => SwiftToken::Dot,
            b'?' => SwiftToken::Question,
            b'&' => SwiftToken::Ampersand,
            b';' => SwiftToken::Semicolon,
            b'=' => {
                if self.peek() == b'=' {
                    self.pos += 1;
                    SwiftToken::EqualEqual
                } else {
                    SwiftToken::Equal
                }
            }
            b'-' if self.peek() == b'>' => {
                self.pos += 1;
                SwiftToken::Arrow
            }
            c if is_operator_char(c) => {
                while self.pos < self.bytes.len()
                    && is_operator_char(self.bytes[self.pos])
                    && !(self.peek() == b'/' && matches!(self.peek_at(1), b'/' | b'*'))
                {
                    self.pos += 1;
                }
                SwiftToken::Operator
            }
            _ => {
                // Step over the whole character so spans stay on char boundaries.
                let width = self.source[start..].chars().next().map_or(1, char::len_utf8);
                self.pos = start + width;
                let ch = &self.source[start..self.pos];
                self.error(
                    &format!("unexpected character '{}'", ch.escape_default()),
                    self.span_from(start),
                );
                SwiftToken::Error
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<SwiftToken> {
        let sink = DiagnosticSink::new();
        lex(src, 0, FileId::from_raw(0), &sink)
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn signature_tokens() {
        use SwiftToken::*;
        assert_eq!(
            kinds("public func f<T: A & B>(_ x: [T]?) throws -> T where T.E == Int"),
            vec![
                Public, Func, Identifier, LeftAngle, Identifier, Colon, Identifier, Ampersand,
                Identifier, RightAngle, LeftParen, Underscore, Identifier, Colon, LeftBracket,
                Identifier, RightBracket, Question, RightParen, Throws, Arrow, Identifier, Where,
                Identifier, Dot, Identifier, EqualEqual, Identifier, Eof
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        use SwiftToken::*;
        assert_eq!(
            kinds("// line\nfunc /* a /* nested */ b */ f"),
            vec![Func, Identifier, Eof]
        );
    }

    #[test]
    fn strings_hide_braces() {
        use SwiftToken::*;
        assert_eq!(
            kinds(r#"{ "}\"}" }"#),
            vec![LeftBrace, StringLiteral, RightBrace, Eof]
        );
        assert_eq!(
            kinds("{ \"\"\"\n}\n\"\"\" }"),
            vec![LeftBrace, StringLiteral, RightBrace, Eof]
        );
    }

    #[test]
    fn operators_in_bodies() {
        use SwiftToken::*;
        assert_eq!(
            kinds("x * y + 1.5 >= -z"),
            vec![Identifier, Operator, Identifier, Operator, Number, RightAngle, Equal, Operator, Identifier, Eof]
        );
    }

    #[test]
    fn spans_are_absolute() {
        let sink = DiagnosticSink::new();
        let src = "// header\nfunc f";
        let tokens = lex(src, 10, FileId::from_raw(0), &sink);
        assert_eq!(tokens[0].span.start, 10);
        assert_eq!(tokens[1].span.start, 15);
    }

    #[test]
    fn unterminated_string_is_reported() {
        let sink = DiagnosticSink::new();
        let tokens = lex("\"abc\nfunc", 0, FileId::from_raw(0), &sink);
        assert_eq!(tokens[0].kind, SwiftToken::Error);
        assert_eq!(tokens[1].kind, SwiftToken::Func);
        assert_eq!(sink.count_code(codes::LEX_ERROR), 1);
    }

    #[test]
    fn unexpected_unicode_character() {
        let sink = DiagnosticSink::new();
        let tokens = lex("func \u{00e9}", 0, FileId::from_raw(0), &sink);
        assert_eq!(tokens[1].kind, SwiftToken::Error);
        assert_eq!(tokens[1].span.len(), 2);
        assert!(sink.has_errors());
    }
}
