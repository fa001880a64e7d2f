//! Purpose: Producer entry point: decode input, lex, rewrite, parse and aggregate.
//! Exports: `Parser`, `parse`, `TokenStream`.
//! Role: Builds the `ParserResult` that crosses the boundary.
//! Invariants: A failed decode returns `InputError` and builds nothing else.
//! Invariants: End-of-input is never offered to the rewriter and never recorded.
use std::collections::VecDeque;

use crate::core::bytes::{ByteList, StringPtr};
use crate::core::diagnostic::Diagnostic;
use crate::core::options::{ParserOptions, debug_level};
use crate::core::result::ParserResult;
use crate::core::rewriter::{LexStateAction, TokenRewriter};
use crate::core::source::{DecodedInput, InputError, MaybeDecoder, decode_input};
use crate::core::token::Token;

pub mod grammar;
pub mod lexer;
pub mod magic;

use grammar::Grammar;
use lexer::Lexer;

/// Lexer output after the rewriter, with lookahead for the grammar.
pub struct TokenStream<'a> {
    lexer: Lexer<'a>,
    rewriter: Option<TokenRewriter>,
    record_tokens: bool,
    recorded: Vec<Token>,
    lookahead: VecDeque<Token>,
    debug: bool,
}

impl<'a> TokenStream<'a> {
    pub fn new(
        lexer: Lexer<'a>,
        rewriter: Option<TokenRewriter>,
        record_tokens: bool,
        debug: bool,
    ) -> Self {
        Self {
            lexer,
            rewriter,
            record_tokens,
            recorded: Vec::new(),
            lookahead: VecDeque::new(),
            debug,
        }
    }

    fn fetch(&mut self) -> Token {
        loop {
            let token = self.lexer.next_token();
            if token.is_end_of_input() {
                return token;
            }
            let Some(rewriter) = self.rewriter else {
                return self.record(token);
            };

            let (token, lex_state_action) = rewriter.call(Box::new(token)).into_internal();
            if self.debug {
                tracing::debug!(
                    kept = token.is_some(),
                    lex_state = ?lex_state_action,
                    "rewriter action"
                );
            }
            let Some(mut token) = token else {
                if let LexStateAction::Set(state) = lex_state_action {
                    self.lexer.set_lex_state(state);
                }
                continue;
            };
            if let LexStateAction::Set(state) = lex_state_action {
                self.lexer.set_lex_state(state);
                token.set_lex_state_after(state);
            }
            return self.record(*token);
        }
    }

    fn record(&mut self, token: Token) -> Token {
        if self.record_tokens {
            self.recorded.push(token.clone());
        }
        token
    }

    /// Token `offset` positions ahead without consuming it.
    pub fn peek(&mut self, offset: usize) -> &Token {
        while self.lookahead.len() <= offset {
            let token = self.fetch();
            self.lookahead.push_back(token);
        }
        &self.lookahead[offset]
    }

    pub fn next(&mut self) -> Token {
        match self.lookahead.pop_front() {
            Some(token) => token,
            None => self.fetch(),
        }
    }

    pub fn into_parts(self) -> (Vec<Token>, Lexer<'a>) {
        (self.recorded, self.lexer)
    }
}

pub struct Parser {
    input: Vec<u8>,
    options: ParserOptions,
}

impl Parser {
    pub fn new(input: impl Into<Vec<u8>>, options: ParserOptions) -> Self {
        Self {
            input: input.into(),
            options,
        }
    }

    pub fn do_parse(self) -> Result<ParserResult, InputError> {
        let ParserOptions {
            buffer_name,
            debug,
            decoder,
            token_rewriter,
            record_tokens,
        } = self.options;
        let debug_buffer = debug & debug_level::BUFFER != 0;

        let bytes = decode(self.input, &decoder)?;
        let input = DecodedInput::new(buffer_name, bytes);
        if debug_buffer {
            tracing::debug!(
                name = %input.name.to_string_lossy(),
                bytes = input.len(),
                lines = input.lines.len(),
                "decoded input"
            );
        }

        let lexer = Lexer::new(input.as_bytes(), debug & debug_level::LEXER != 0);
        let stream = TokenStream::new(
            lexer,
            token_rewriter.into_option(),
            record_tokens,
            debug & debug_level::LEXER != 0,
        );
        let mut grammar = Grammar::new(stream, debug & debug_level::PARSER != 0);
        let ast = grammar.parse_program(input.len());
        let (grammar_diagnostics, stream) = grammar.into_parts();
        let (tokens, lexer) = stream.into_parts();

        let mut diagnostics = lexer.diagnostics;
        diagnostics.extend(grammar_diagnostics);
        let diagnostics = order_diagnostics(diagnostics);
        let comments = lexer.comments;
        let magic_comments = lexer.magic_comments;

        Ok(ParserResult::new(
            ast,
            tokens,
            diagnostics,
            comments,
            magic_comments,
            input,
        ))
    }
}

/// Parses `input` with `options`.
pub fn parse(input: impl Into<Vec<u8>>, options: ParserOptions) -> Result<ParserResult, InputError> {
    Parser::new(input, options).do_parse()
}

// A declared foreign encoding always goes through the decoder. Undeclared input that is
// not UTF-8 goes through it only when one is configured.
fn decode(input: Vec<u8>, decoder: &MaybeDecoder) -> Result<Vec<u8>, InputError> {
    if let Some(encoding) = magic::prescan_encoding(&input) {
        let decoded = decode_input(ByteList::from(input), StringPtr::from(encoding), decoder);
        return decoded.into_result().map(ByteList::into_vec);
    }
    match decoder.as_ref() {
        Some(decoder) if std::str::from_utf8(&input).is_err() => decoder
            .call(StringPtr::from("UTF-8"), ByteList::from(input))
            .into_result()
            .map(ByteList::into_vec),
        _ => Ok(input),
    }
}

// Stable order by start offset; exact repeats are dropped. Repeats share a start
// offset, so each diagnostic is only compared within its own group.
fn order_diagnostics(mut diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
    diagnostics.sort_by_key(|diagnostic| diagnostic.loc().begin);
    let mut ordered: Vec<Diagnostic> = Vec::with_capacity(diagnostics.len());
    let mut group_start = 0;
    for diagnostic in diagnostics {
        if ordered
            .last()
            .is_some_and(|last| last.loc().begin != diagnostic.loc().begin)
        {
            group_start = ordered.len();
        }
        if !ordered[group_start..].contains(&diagnostic) {
            ordered.push(diagnostic);
        }
    }
    ordered
}
