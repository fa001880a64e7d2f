//! Purpose: Byte-level lexer for the producer's Ruby-like language.
//! Exports: `Lexer`.
//! Role: Feeds tokens to `parse::TokenStream`; collects comments, magic comments
//! and lexer diagnostics on the side.
//! Invariants: Token locations are strictly increasing and never overlap.
//! Invariants: After input is exhausted (or `__END__`), every call returns end-of-input.
use crate::core::bytes::Bytes;
use crate::core::comment::{Comment, CommentType, MagicComment, MagicCommentKind};
use crate::core::diagnostic::{Diagnostic, DiagnosticMessage};
use crate::core::loc::Loc;
use crate::core::token::{Token, lex_state, token_type};
use crate::parse::magic::parse_magic_comment;

pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
    state: u32,
    seen_token: bool,
    finished: bool,
    debug: bool,
    pub comments: Vec<Comment>,
    pub magic_comments: Vec<MagicComment>,
    pub diagnostics: Vec<Diagnostic>,
}

fn is_ident_start(byte: u8) -> bool {
    byte.is_ascii_lowercase() || byte == b'_' || byte >= 0x80
}

fn is_ident_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte >= 0x80
}

fn keyword(ident: &[u8]) -> Option<u32> {
    match ident {
        b"def" => Some(token_type::K_DEF),
        b"end" => Some(token_type::K_END),
        b"nil" => Some(token_type::K_NIL),
        b"true" => Some(token_type::K_TRUE),
        b"false" => Some(token_type::K_FALSE),
        b"self" => Some(token_type::K_SELF),
        _ => None,
    }
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a [u8], debug: bool) -> Self {
        Self {
            input,
            pos: 0,
            state: lex_state::EXPR_BEG,
            seen_token: false,
            finished: false,
            debug,
            comments: Vec::new(),
            magic_comments: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn lex_state(&self) -> u32 {
        self.state
    }

    pub fn set_lex_state(&mut self, state: u32) {
        self.state = state;
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn at_line_start(&self) -> bool {
        self.pos == 0 || self.input.get(self.pos - 1) == Some(&b'\n')
    }

    fn starts_with_word(&self, at: usize, word: &[u8]) -> bool {
        let rest = &self.input[at.min(self.input.len())..];
        rest.starts_with(word)
            && rest
                .get(word.len())
                .is_none_or(|byte| byte.is_ascii_whitespace())
    }

    fn line_end_from(&self, from: usize) -> usize {
        self.input[from..]
            .iter()
            .position(|byte| *byte == b'\n')
            .map_or(self.input.len(), |offset| from + offset)
    }

    fn end_of_input(&self) -> Token {
        let end = self.input.len();
        Token::new(
            token_type::END_OF_INPUT,
            Bytes::empty(),
            Loc::new(end, end),
            self.state,
            self.state,
        )
    }

    fn emit(&mut self, kind: u32, value: Vec<u8>, begin: usize, after: u32) -> Token {
        let before = self.state;
        self.state = after;
        self.seen_token = true;
        let token = Token::new(kind, Bytes::new(value), Loc::new(begin, self.pos), before, after);
        if self.debug {
            tracing::debug!(token = ?token, state_before = before, state_after = after, "lexed");
        }
        token
    }

    fn emit_source(&mut self, kind: u32, begin: usize, after: u32) -> Token {
        let value = self.input[begin..self.pos].to_vec();
        self.emit(kind, value, begin, after)
    }

    /// Next token; end-of-input once the buffer is exhausted.
    pub fn next_token(&mut self) -> Token {
        loop {
            if self.finished {
                return self.end_of_input();
            }
            if self.at_line_start() && self.line_prologue() {
                continue;
            }
            let Some(byte) = self.peek(0) else {
                self.finished = true;
                return self.end_of_input();
            };
            let begin = self.pos;
            match byte {
                b' ' | b'\t' | b'\r' | b'\x0b' | b'\x0c' => self.pos += 1,
                b'\\' if self.peek(1) == Some(b'\n') => self.pos += 2,
                b'#' => self.lex_comment(),
                b'\n' => {
                    self.pos += 1;
                    let skip = lex_state::EXPR_BEG | lex_state::EXPR_DOT | lex_state::EXPR_FNAME;
                    if self.state & skip == 0 {
                        return self.emit(token_type::T_NL, b"\n".to_vec(), begin, lex_state::EXPR_BEG);
                    }
                }
                b'0'..=b'9' => return self.lex_integer(begin),
                b'"' | b'\'' => return self.lex_string(begin, byte),
                b'A'..=b'Z' => {
                    self.consume_ident_bytes();
                    return self.emit_source(token_type::T_CONSTANT, begin, lex_state::EXPR_ARG);
                }
                _ if is_ident_start(byte) => return self.lex_identifier(begin),
                _ => {
                    if let Some(token) = self.lex_operator(begin, byte) {
                        return token;
                    }
                }
            }
        }
    }

    // Handles `=begin` documents and `__END__` at the start of a line.
    // Returns true when it consumed input.
    fn line_prologue(&mut self) -> bool {
        if self.starts_with_word(self.pos, b"__END__") {
            self.finished = true;
            return true;
        }
        if !self.starts_with_word(self.pos, b"=begin") {
            return false;
        }

        let begin = self.pos;
        let mut line_begin = self.line_end_from(begin) + 1;
        while line_begin < self.input.len() {
            let line_end = self.line_end_from(line_begin);
            if self.starts_with_word(line_begin, b"=end") {
                let end = (line_end + 1).min(self.input.len());
                self.comments.push(Comment::make(Loc::new(begin, end), CommentType::Document));
                self.pos = end;
                return true;
            }
            line_begin = line_end + 1;
        }

        self.diagnostics.push(Diagnostic::error(
            DiagnosticMessage::EmbeddedDocumentMeetsEof,
            Loc::new(begin, begin + b"=begin".len()),
        ));
        self.pos = self.input.len();
        self.finished = true;
        true
    }

    fn lex_comment(&mut self) {
        let begin = self.pos;
        let end = self.line_end_from(begin);
        self.pos = end;
        self.comments.push(Comment::make(Loc::new(begin, end), CommentType::Inline));

        let line_begin = self.input[..begin]
            .iter()
            .rposition(|byte| *byte == b'\n')
            .map_or(0, |offset| offset + 1);
        let alone = self.input[line_begin..begin]
            .iter()
            .all(|byte| matches!(byte, b' ' | b'\t'));
        if !alone {
            return;
        }

        for magic in parse_magic_comment(self.input, begin + 1, end) {
            match magic.kind {
                MagicCommentKind::Encoding if self.seen_token => {}
                MagicCommentKind::FrozenStringLiteral if self.seen_token => {
                    self.diagnostics.push(Diagnostic::warning(
                        DiagnosticMessage::MagicCommentIgnored {
                            name: MagicCommentKind::FrozenStringLiteral.as_str().to_string(),
                        },
                        magic.key_l,
                    ));
                }
                _ => self.magic_comments.push(magic),
            }
        }
    }

    fn consume_ident_bytes(&mut self) {
        while self.peek(0).is_some_and(is_ident_byte) {
            self.pos += 1;
        }
    }

    fn lex_identifier(&mut self, begin: usize) -> Token {
        self.consume_ident_bytes();
        if matches!(self.peek(0), Some(b'?' | b'!')) && self.peek(1) != Some(b'=') {
            self.pos += 1;
        }

        let after_dot = self.state & lex_state::EXPR_DOT != 0;
        let keyword = if after_dot {
            None
        } else {
            keyword(&self.input[begin..self.pos])
        };
        if let Some(kind) = keyword {
            let after = match kind {
                token_type::K_DEF => lex_state::EXPR_FNAME,
                _ => lex_state::EXPR_END,
            };
            return self.emit_source(kind, begin, after);
        }

        let after = if self.state & lex_state::EXPR_FNAME != 0 {
            lex_state::EXPR_ENDFN
        } else {
            lex_state::EXPR_ARG
        };
        self.emit_source(token_type::T_IDENTIFIER, begin, after)
    }

    fn lex_integer(&mut self, begin: usize) -> Token {
        while self
            .peek(0)
            .is_some_and(|byte| byte.is_ascii_digit() || byte == b'_')
        {
            self.pos += 1;
        }
        self.emit_source(token_type::T_INTEGER, begin, lex_state::EXPR_END)
    }

    fn lex_string(&mut self, begin: usize, quote: u8) -> Token {
        self.pos += 1;
        let mut value = Vec::new();
        loop {
            let Some(byte) = self.peek(0) else {
                self.diagnostics.push(Diagnostic::error(
                    DiagnosticMessage::UnterminatedString,
                    Loc::new(begin, self.pos),
                ));
                break;
            };
            self.pos += 1;
            if byte == quote {
                break;
            }
            if byte != b'\\' {
                value.push(byte);
                continue;
            }
            let Some(escaped) = self.peek(0) else {
                value.push(byte);
                continue;
            };
            self.pos += 1;
            if quote == b'\'' {
                if escaped != b'\'' && escaped != b'\\' {
                    value.push(b'\\');
                }
                value.push(escaped);
                continue;
            }
            match escaped {
                b'n' => value.push(b'\n'),
                b't' => value.push(b'\t'),
                b'r' => value.push(b'\r'),
                b's' => value.push(b' '),
                b'0' => value.push(0),
                b'e' => value.push(0x1b),
                b'\n' => {}
                other => value.push(other),
            }
        }
        self.emit(token_type::T_STRING, value, begin, lex_state::EXPR_END)
    }

    fn lex_operator(&mut self, begin: usize, byte: u8) -> Option<Token> {
        let (kind, after) = match byte {
            b'=' => (token_type::T_EQL, lex_state::EXPR_BEG),
            b'+' => (token_type::T_PLUS, lex_state::EXPR_BEG),
            b'-' => {
                let spaced_arg = self.state & lex_state::EXPR_ARG != 0
                    && begin > 0
                    && matches!(self.input[begin - 1], b' ' | b'\t')
                    && !matches!(self.peek(1), Some(b' ' | b'\t' | b'\n') | None);
                if self.state & lex_state::EXPR_BEG != 0 || spaced_arg {
                    (token_type::T_UMINUS, lex_state::EXPR_BEG)
                } else {
                    (token_type::T_MINUS, lex_state::EXPR_BEG)
                }
            }
            b'*' => (token_type::T_STAR, lex_state::EXPR_BEG),
            b'/' => (token_type::T_DIVIDE, lex_state::EXPR_BEG),
            b'(' => (token_type::T_LPAREN, lex_state::EXPR_BEG),
            b')' => (token_type::T_RPAREN, lex_state::EXPR_ENDFN),
            b',' => (token_type::T_COMMA, lex_state::EXPR_BEG),
            b'.' => (token_type::T_DOT, lex_state::EXPR_DOT),
            b';' => (token_type::T_SEMI, lex_state::EXPR_BEG),
            _ => {
                self.pos += 1;
                self.diagnostics.push(Diagnostic::error(
                    DiagnosticMessage::InvalidCharacter { byte },
                    Loc::new(begin, self.pos),
                ));
                return None;
            }
        };
        self.pos += 1;
        Some(self.emit_source(kind, begin, after))
    }
}
