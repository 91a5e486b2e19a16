//! AST and recursive-descent parser. Matches
//! `original_source/frontend/{ast,parser}.go`.

use crate::lexer::{Lexer, Token, TokenKind};
use crate::span::report::{Level, Reporter, Sink};
use crate::span::Span;

pub struct Program<'a> {
    pub target: Token<'a>,
    pub declarations: Vec<Declaration<'a>>,
    pub span: Span<'a>,
}

pub enum Declaration<'a> {
    Function(FunctionDeclaration<'a>),
}

pub struct FunctionDeclaration<'a> {
    pub name: Token<'a>,
    pub body: Block<'a>,
    pub span: Span<'a>,
}

pub struct Block<'a> {
    pub statements: Vec<()>,
    pub span: Span<'a>,
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    peeked: Option<Option<Token<'a>>>,
}

impl<'a> Parser<'a> {
    pub fn new(lexer: Lexer<'a>) -> Self {
        Parser {
            lexer,
            peeked: None,
        }
    }

    fn peek(&mut self, reporter: &mut Reporter, sink: &mut dyn Sink) -> Option<Token<'a>> {
        if self.peeked.is_none() {
            self.peeked = Some(self.lexer.next_token(reporter, sink));
        }
        *self.peeked.as_ref().unwrap()
    }

    fn consume(&mut self, reporter: &mut Reporter, sink: &mut dyn Sink) -> Option<Token<'a>> {
        if let Some(token) = self.peeked.take() {
            return token;
        }
        self.lexer.next_token(reporter, sink)
    }

    fn expect(
        &mut self,
        reporter: &mut Reporter,
        sink: &mut dyn Sink,
        kinds: &[TokenKind],
    ) -> (Option<Token<'a>>, bool) {
        let next = self.peek(reporter, sink);
        match next {
            Some(token) if kinds.contains(&token.kind) => {
                self.consume(reporter, sink);
                (Some(token), true)
            }
            _ => (next, false),
        }
    }

    fn report_expect(
        &self,
        reporter: &mut Reporter,
        sink: &mut dyn Sink,
        token: Option<Token<'a>>,
        expects: &[TokenKind],
    ) {
        let list = format_expect_list(expects);
        match token {
            None => reporter.report_no_span(
                sink,
                Level::Error,
                &format!("expected {}, found EOF", list),
            ),
            Some(token) => reporter.report(
                sink,
                token.span,
                Level::Error,
                &format!("expected {}, found {}", list, token.kind),
            ),
        }
    }

    fn restore_from_error(&mut self, reporter: &mut Reporter, sink: &mut dyn Sink) {
        loop {
            match self.peek(reporter, sink) {
                None => return,
                Some(token) if token.kind == TokenKind::KeywordFunc => return,
                Some(_) => {
                    self.consume(reporter, sink);
                }
            }
        }
    }

    pub fn parse_program(
        &mut self,
        reporter: &mut Reporter,
        sink: &mut dyn Sink,
    ) -> Option<Program<'a>> {
        let (token_target, ok) = self.expect(reporter, sink, &[TokenKind::KeywordTarget]);
        if !ok {
            self.report_expect(reporter, sink, token_target, &[TokenKind::KeywordTarget]);
            return None;
        }
        let token_target = token_target.unwrap();

        let (target, ok) = self.expect(
            reporter,
            sink,
            &[TokenKind::Identifier, TokenKind::RawIdentifier],
        );
        if !ok {
            if target.map(|t| t.kind) == Some(TokenKind::StringLiteral) {
                reporter.report_no_span(
                    sink,
                    Level::Info,
                    "use raw identifiers instead of strings",
                );
            } else {
                self.report_expect(
                    reporter,
                    sink,
                    target,
                    &[TokenKind::Identifier, TokenKind::RawIdentifier],
                );
            }
            return None;
        }
        let target = target.unwrap();

        // Each declaration recovers independently (spec §7): a broken
        // declaration is skipped up to the next `func` keyword, but parsing
        // continues and the program is still returned with whatever
        // declarations succeeded. The reporter's error count, not this
        // return value, is what ultimately fails the compile.
        let mut declarations = Vec::new();
        while self.peek(reporter, sink).is_some() {
            match self.parse_declaration(reporter, sink) {
                Some(declaration) => declarations.push(declaration),
                None => self.restore_from_error(reporter, sink),
            }
        }

        Some(Program {
            target,
            declarations,
            span: token_target.span,
        })
    }

    fn parse_declaration(
        &mut self,
        reporter: &mut Reporter,
        sink: &mut dyn Sink,
    ) -> Option<Declaration<'a>> {
        let token = self.consume(reporter, sink);
        let token = match token {
            Some(token) => token,
            None => {
                reporter.report_no_span(sink, Level::Error, "unexpected EOF");
                return None;
            }
        };

        match token.kind {
            TokenKind::KeywordFunc => {
                let (name, ok) = self.expect(
                    reporter,
                    sink,
                    &[TokenKind::Identifier, TokenKind::RawIdentifier],
                );
                if !ok {
                    self.report_expect(
                        reporter,
                        sink,
                        name,
                        &[TokenKind::Identifier, TokenKind::RawIdentifier],
                    );
                    return None;
                }
                let name = name.unwrap();

                let (open_paren, ok) = self.expect(reporter, sink, &[TokenKind::OpenParen]);
                if !ok {
                    self.report_expect(reporter, sink, open_paren, &[TokenKind::OpenParen]);
                    return None;
                }
                let (close_paren, ok) = self.expect(reporter, sink, &[TokenKind::CloseParen]);
                if !ok {
                    self.report_expect(reporter, sink, close_paren, &[TokenKind::CloseParen]);
                    return None;
                }

                let body = self.parse_block(reporter, sink)?;
                let span = token.span.merge(body.span);
                Some(Declaration::Function(FunctionDeclaration { name, body, span }))
            }
            TokenKind::KeywordVar => {
                reporter.report(sink, token.span, Level::Error, "not implemented yet");
                None
            }
            _ => {
                self.report_expect(
                    reporter,
                    sink,
                    Some(token),
                    &[TokenKind::KeywordFunc, TokenKind::KeywordVar],
                );
                None
            }
        }
    }

    fn parse_block(&mut self, reporter: &mut Reporter, sink: &mut dyn Sink) -> Option<Block<'a>> {
        let (open_brace, ok) = self.expect(reporter, sink, &[TokenKind::OpenBrace]);
        if !ok {
            self.report_expect(reporter, sink, open_brace, &[TokenKind::OpenBrace]);
            return None;
        }
        let open_brace = open_brace.unwrap();

        let (close_brace, ok) = self.expect(reporter, sink, &[TokenKind::CloseBrace]);
        if !ok {
            self.report_expect(reporter, sink, close_brace, &[TokenKind::CloseBrace]);
            return None;
        }
        let close_brace = close_brace.unwrap();

        Some(Block {
            statements: Vec::new(),
            span: open_brace.span.merge(close_brace.span),
        })
    }
}

fn format_expect_list(items: &[TokenKind]) -> String {
    match items.len() {
        0 => "nothing".to_string(),
        1 => items[0].to_string(),
        _ => {
            let (last, rest) = items.split_last().unwrap();
            let mut result = rest
                .iter()
                .map(|item| item.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            result.push_str(" or ");
            result.push_str(&last.to_string());
            result
        }
    }
}
