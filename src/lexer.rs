//! Hand-rolled lexer. Byte-indexed cursor, matches
//! `original_source/frontend/lexer.go` control flow exactly.

use crate::span::report::{Level, Reporter, Sink};
use crate::span::{Position, SourceFile, Span};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TokenKind {
    // Literals
    NumberLiteral,
    True,
    False,
    StringLiteral,
    Identifier,
    RawIdentifier,
    Broken,
    // Parens
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    OpenBrace,
    CloseBrace,
    // Other symbols
    Comma,
    Semi,
    Colon,
    Assign,
    DeclareAssign,
    // Operators
    OpAdd,
    OpSub,
    OpMul,
    OpDiv,
    OpEqu,
    OpNeq,
    OpLes,
    OpGes,
    OpLte,
    OpGte,
    OpAnd,
    OpOr,
    OpNot,
    OpMember,
    // Keywords
    KeywordFor,
    KeywordVar,
    KeywordReturn,
    KeywordIf,
    KeywordElse,
    KeywordTarget,
    KeywordFunc,
    KeywordStruct,
    // Types
    TypeString,
    TypeNumber,
    TypeBool,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            TokenKind::NumberLiteral => "number literal",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::StringLiteral => "string literal",
            TokenKind::Identifier => "identifier",
            TokenKind::RawIdentifier => "raw identifier",
            TokenKind::Broken => "(broken)",
            TokenKind::OpenParen => "(",
            TokenKind::CloseParen => ")",
            TokenKind::OpenBracket => "[",
            TokenKind::CloseBracket => "]",
            TokenKind::OpenBrace => "{",
            TokenKind::CloseBrace => "}",
            TokenKind::Comma => "[,]",
            TokenKind::Semi => "[;]",
            TokenKind::Colon => "[:]",
            TokenKind::Assign => "[=]",
            TokenKind::DeclareAssign => "[:=]",
            TokenKind::OpAdd => "operator [+]",
            TokenKind::OpSub => "operator [-]",
            TokenKind::OpMul => "operator [*]",
            TokenKind::OpDiv => "operator [/]",
            TokenKind::OpEqu => "operator [==]",
            TokenKind::OpNeq => "operator [!=]",
            TokenKind::OpLes => "operator [<]",
            TokenKind::OpGes => "operator [>]",
            TokenKind::OpLte => "operator [<=]",
            TokenKind::OpGte => "operator [>=]",
            TokenKind::OpAnd => "operator [&&]",
            TokenKind::OpOr => "operator [||]",
            TokenKind::OpNot => "operator [!]",
            TokenKind::OpMember => "operator [.]",
            TokenKind::KeywordFor => "keyword for",
            TokenKind::KeywordVar => "keyword var",
            TokenKind::KeywordReturn => "keyword return",
            TokenKind::KeywordIf => "keyword if",
            TokenKind::KeywordElse => "keyword else",
            TokenKind::KeywordTarget => "keyword target",
            TokenKind::KeywordFunc => "keyword func",
            TokenKind::KeywordStruct => "keyword struct",
            TokenKind::TypeString => "type string",
            TokenKind::TypeNumber => "type number",
            TokenKind::TypeBool => "type bool",
        };
        write!(f, "{}", text)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub span: Span<'a>,
}

#[derive(Clone, Copy)]
struct Cursor {
    lineno: usize,
    index: usize,
    line_index: usize,
}

pub struct Lexer<'a> {
    file: &'a SourceFile,
    bytes: &'a [u8],
    current: Cursor,
    mark: Cursor,
}

fn is_numeric(byte: u8) -> bool {
    byte.is_ascii_digit()
}

fn is_alpha(byte: u8) -> bool {
    byte.is_ascii_alphabetic()
}

fn is_identifier_leading(byte: u8) -> bool {
    is_alpha(byte) || byte == b'_'
}

fn is_identifier_following(byte: u8) -> bool {
    is_numeric(byte) || is_alpha(byte) || byte == b'_'
}

impl<'a> Lexer<'a> {
    pub fn new(file: &'a SourceFile) -> Self {
        let start = Cursor {
            lineno: 0,
            index: 0,
            line_index: 0,
        };
        Lexer {
            file,
            bytes: file.source.as_bytes(),
            current: start,
            mark: start,
        }
    }

    fn span(&self) -> Span<'a> {
        Span {
            from: Position {
                index: self.mark.index,
                line_index: self.mark.line_index,
                lineno: self.mark.lineno,
            },
            to: Position {
                index: self.current.index,
                line_index: self.current.line_index,
                lineno: self.current.lineno,
            },
            file: self.file,
        }
    }

    fn token(&self, kind: TokenKind) -> Token<'a> {
        Token {
            kind,
            span: self.span(),
        }
    }

    fn set_mark(&mut self) {
        self.mark = self.current;
    }

    fn consume(&mut self) -> u8 {
        if self.current.index >= self.bytes.len() {
            return 0;
        }
        let byte = self.bytes[self.current.index];
        if byte == b'\n' {
            self.current.lineno += 1;
            self.current.line_index = 0;
        } else {
            self.current.line_index += 1;
        }
        self.current.index += 1;
        byte
    }

    fn peek(&self) -> u8 {
        if self.current.index >= self.bytes.len() {
            return 0;
        }
        self.bytes[self.current.index]
    }

    /// Returns `None` at EOF, `Some(Err(()))` on a reported lex error
    /// (already reported through `sink`/`reporter`).
    pub fn next_token(
        &mut self,
        reporter: &mut Reporter,
        sink: &mut dyn Sink,
    ) -> Option<Token<'a>> {
        self.set_mark();
        let mut current = self.consume();
        while current == b'\n' || current == b' ' || current == b'\t' {
            self.set_mark();
            current = self.consume();
        }

        match current {
            0 => None,
            b'(' => Some(self.token(TokenKind::OpenParen)),
            b'[' => Some(self.token(TokenKind::OpenBracket)),
            b'{' => Some(self.token(TokenKind::OpenBrace)),
            b')' => Some(self.token(TokenKind::CloseParen)),
            b']' => Some(self.token(TokenKind::CloseBracket)),
            b'}' => Some(self.token(TokenKind::CloseBrace)),
            b'.' => Some(self.token(TokenKind::OpMember)),
            b',' => Some(self.token(TokenKind::Comma)),
            b';' => Some(self.token(TokenKind::Semi)),
            b'+' => Some(self.token(TokenKind::OpAdd)),
            b'*' => Some(self.token(TokenKind::OpMul)),
            b'/' => Some(self.token(TokenKind::OpDiv)),
            b':' => {
                if self.peek() == b'=' {
                    self.consume();
                    Some(self.token(TokenKind::DeclareAssign))
                } else {
                    Some(self.token(TokenKind::Colon))
                }
            }
            b'=' => {
                if self.peek() == b'=' {
                    self.consume();
                    Some(self.token(TokenKind::OpEqu))
                } else {
                    Some(self.token(TokenKind::Assign))
                }
            }
            b'>' => {
                if self.peek() == b'=' {
                    self.consume();
                    Some(self.token(TokenKind::OpGte))
                } else {
                    Some(self.token(TokenKind::OpGes))
                }
            }
            b'<' => {
                if self.peek() == b'=' {
                    self.consume();
                    Some(self.token(TokenKind::OpLte))
                } else {
                    Some(self.token(TokenKind::OpLes))
                }
            }
            b'!' => {
                if self.peek() == b'=' {
                    self.consume();
                    Some(self.token(TokenKind::OpNeq))
                } else {
                    Some(self.token(TokenKind::OpNot))
                }
            }
            b'&' => {
                if self.peek() == b'&' {
                    self.consume();
                    Some(self.token(TokenKind::OpAnd))
                } else {
                    reporter.report(
                        sink,
                        self.span(),
                        Level::Error,
                        "operator bit-wise and [&] is not allowed",
                    );
                    Some(self.token(TokenKind::Broken))
                }
            }
            b'|' => {
                if self.peek() == b'|' {
                    self.consume();
                    Some(self.token(TokenKind::OpOr))
                } else {
                    reporter.report(
                        sink,
                        self.span(),
                        Level::Error,
                        "operator bit-wise or [|] is not allowed",
                    );
                    Some(self.token(TokenKind::Broken))
                }
            }
            b'"' => {
                loop {
                    match self.consume() {
                        b'\\' => {
                            self.consume();
                        }
                        b'"' => break,
                        0 => break,
                        _ => {}
                    }
                }
                Some(self.token(TokenKind::StringLiteral))
            }
            b'#' => {
                if self.consume() != b'"' {
                    return Some(self.token(TokenKind::Broken));
                }
                loop {
                    match self.consume() {
                        b'\\' => {
                            self.consume();
                        }
                        b'"' => break,
                        0 => break,
                        _ => {}
                    }
                }
                Some(self.token(TokenKind::RawIdentifier))
            }
            b'-' => {
                if is_numeric(self.peek()) {
                    self.consume();
                    Some(self.lex_number())
                } else {
                    Some(self.token(TokenKind::OpSub))
                }
            }
            _ => {
                if is_numeric(current) {
                    Some(self.lex_number())
                } else if is_identifier_leading(current) {
                    Some(self.lex_identifier())
                } else {
                    reporter.report(
                        sink,
                        self.span(),
                        Level::Error,
                        &format!("unexpected char {}", current as char),
                    );
                    None
                }
            }
        }
    }

    fn lex_number(&mut self) -> Token<'a> {
        while is_numeric(self.peek()) {
            self.consume();
            if self.peek() == b'.' {
                self.consume();
            }
        }
        self.token(TokenKind::NumberLiteral)
    }

    fn lex_identifier(&mut self) -> Token<'a> {
        while is_identifier_following(self.peek()) {
            self.consume();
        }
        let token = self.token(TokenKind::Identifier);
        match token.span.string() {
            "func" => self.token(TokenKind::KeywordFunc),
            "for" => self.token(TokenKind::KeywordFor),
            "if" => self.token(TokenKind::KeywordIf),
            "else" => self.token(TokenKind::KeywordElse),
            "return" => self.token(TokenKind::KeywordReturn),
            "var" => self.token(TokenKind::KeywordVar),
            "target" => self.token(TokenKind::KeywordTarget),
            "number" => self.token(TokenKind::TypeNumber),
            "string" => self.token(TokenKind::TypeString),
            "bool" => self.token(TokenKind::TypeBool),
            "struct" => self.token(TokenKind::KeywordStruct),
            "true" => self.token(TokenKind::True),
            "false" => self.token(TokenKind::False),
            _ => token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::report::TermSink;

    struct NullSink;
    impl Sink for NullSink {
        fn write(&mut self, _text: &str) {}
        fn set_color(&mut self, _level: Level) {}
        fn bold(&mut self) {}
        fn reset(&mut self) {}
    }

    fn lex_all(source: &str) -> Vec<TokenKind> {
        let file = SourceFile::new("test.yum", source);
        let mut reporter = Reporter::new();
        let mut sink = NullSink;
        let mut lexer = Lexer::new(&file);
        let mut kinds = Vec::new();
        while let Some(token) = lexer.next_token(&mut reporter, &mut sink) {
            kinds.push(token.kind);
        }
        kinds
    }

    #[test]
    fn lexes_punctuation_and_operators() {
        let kinds = lex_all(":= == != <= >= && ||");
        assert_eq!(
            kinds,
            vec![
                TokenKind::DeclareAssign,
                TokenKind::OpEqu,
                TokenKind::OpNeq,
                TokenKind::OpLte,
                TokenKind::OpGte,
                TokenKind::OpAnd,
                TokenKind::OpOr,
            ]
        );
    }

    #[test]
    fn lexes_decimal_number_literal() {
        let file = SourceFile::new("test.yum", "314.15");
        let mut reporter = Reporter::new();
        let mut sink = NullSink;
        let mut lexer = Lexer::new(&file);
        let token = lexer.next_token(&mut reporter, &mut sink).unwrap();
        assert_eq!(token.kind, TokenKind::NumberLiteral);
        assert_eq!(token.span.string(), "314.15");
        assert!(lexer.next_token(&mut reporter, &mut sink).is_none());
    }

    #[test]
    fn lexes_negative_number_as_single_token() {
        let kinds = lex_all("-42");
        assert_eq!(kinds, vec![TokenKind::NumberLiteral]);
    }

    #[test]
    fn minus_before_identifier_is_subtraction() {
        let kinds = lex_all("-x");
        assert_eq!(kinds, vec![TokenKind::OpSub, TokenKind::Identifier]);
    }

    #[test]
    fn recognizes_keywords() {
        let kinds = lex_all("func for if else return var target struct");
        assert_eq!(
            kinds,
            vec![
                TokenKind::KeywordFunc,
                TokenKind::KeywordFor,
                TokenKind::KeywordIf,
                TokenKind::KeywordElse,
                TokenKind::KeywordReturn,
                TokenKind::KeywordVar,
                TokenKind::KeywordTarget,
                TokenKind::KeywordStruct,
            ]
        );
    }

    #[test]
    fn lexes_string_literal_with_escape() {
        let kinds = lex_all(r#""a\"b""#);
        assert_eq!(kinds, vec![TokenKind::StringLiteral]);
    }

    #[test]
    fn bitwise_and_or_are_reported_broken() {
        let kinds = lex_all("& |");
        assert_eq!(kinds, vec![TokenKind::Broken, TokenKind::Broken]);
    }

    #[test]
    fn term_sink_constructs_without_panicking() {
        let _sink = TermSink::new();
    }
}
