//! Purpose: Token records produced by the lexer, with their type and lexer-state codes.
//! Exports: `Token`, `token_type`, `lex_state`, `token_name`.
//! Role: Element type of `ParserResult::tokens` and the unit passed to token rewriters.
//! Invariants: A token owns its value bytes; type and lex-state codes are plain `u32`s.
use std::fmt;

use crate::core::bytes::Bytes;
use crate::core::list::List;
use crate::core::loc::Loc;

pub mod token_type {
    pub const END_OF_INPUT: u32 = 0;

    pub const K_DEF: u32 = 258;
    pub const K_END: u32 = 259;
    pub const K_NIL: u32 = 260;
    pub const K_TRUE: u32 = 261;
    pub const K_FALSE: u32 = 262;
    pub const K_SELF: u32 = 263;

    pub const T_IDENTIFIER: u32 = 300;
    pub const T_CONSTANT: u32 = 301;
    pub const T_INTEGER: u32 = 302;
    pub const T_STRING: u32 = 303;

    pub const T_NL: u32 = 320;
    pub const T_SEMI: u32 = 321;
    pub const T_EQL: u32 = 322;
    pub const T_PLUS: u32 = 323;
    pub const T_MINUS: u32 = 324;
    pub const T_UMINUS: u32 = 325;
    pub const T_STAR: u32 = 326;
    pub const T_DIVIDE: u32 = 327;
    pub const T_LPAREN: u32 = 328;
    pub const T_RPAREN: u32 = 329;
    pub const T_COMMA: u32 = 330;
    pub const T_DOT: u32 = 331;
}

/// Lexer state bits. Rewriters may set arbitrary codes; these are the ones the lexer itself uses.
pub mod lex_state {
    pub const EXPR_BEG: u32 = 1;
    pub const EXPR_END: u32 = 1 << 1;
    pub const EXPR_ARG: u32 = 1 << 2;
    pub const EXPR_FNAME: u32 = 1 << 3;
    pub const EXPR_DOT: u32 = 1 << 4;
    pub const EXPR_ENDFN: u32 = 1 << 5;
}

pub fn token_name(token_type: u32) -> &'static str {
    use token_type::*;
    match token_type {
        END_OF_INPUT => "END_OF_INPUT",
        K_DEF => "kDEF",
        K_END => "kEND",
        K_NIL => "kNIL",
        K_TRUE => "kTRUE",
        K_FALSE => "kFALSE",
        K_SELF => "kSELF",
        T_IDENTIFIER => "tIDENTIFIER",
        T_CONSTANT => "tCONSTANT",
        T_INTEGER => "tINTEGER",
        T_STRING => "tSTRING",
        T_NL => "tNL",
        T_SEMI => "tSEMI",
        T_EQL => "tEQL",
        T_PLUS => "tPLUS",
        T_MINUS => "tMINUS",
        T_UMINUS => "tUMINUS",
        T_STAR => "tSTAR",
        T_DIVIDE => "tDIVIDE",
        T_LPAREN => "tLPAREN",
        T_RPAREN => "tRPAREN",
        T_COMMA => "tCOMMA",
        T_DOT => "tDOT",
        _ => "UNKNOWN",
    }
}

#[repr(C)]
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    token_type: u32,
    token_value: Bytes,
    loc: Loc,
    lex_state_before: u32,
    lex_state_after: u32,
}

pub type TokenList = List<Token>;

impl Token {
    pub fn new(
        token_type: u32,
        token_value: Bytes,
        loc: Loc,
        lex_state_before: u32,
        lex_state_after: u32,
    ) -> Self {
        Self {
            token_type,
            token_value,
            loc,
            lex_state_before,
            lex_state_after,
        }
    }

    pub fn token_type(&self) -> u32 {
        self.token_type
    }

    pub fn token_name(&self) -> &'static str {
        token_name(self.token_type)
    }

    pub fn token_value(&self) -> &Bytes {
        &self.token_value
    }

    pub fn set_token_value(&mut self, token_value: Bytes) {
        self.token_value = token_value;
    }

    pub fn into_token_value(self) -> Bytes {
        self.token_value
    }

    pub fn loc(&self) -> &Loc {
        &self.loc
    }

    pub fn lex_state_before(&self) -> u32 {
        self.lex_state_before
    }

    pub fn lex_state_after(&self) -> u32 {
        self.lex_state_after
    }

    pub fn set_lex_state_after(&mut self, lex_state: u32) {
        self.lex_state_after = lex_state;
    }

    pub fn to_string_lossy(&self) -> String {
        self.token_value.to_string_lossy()
    }

    pub fn is_end_of_input(&self) -> bool {
        self.token_type == token_type::END_OF_INPUT
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {:?}, {:?}]",
            self.token_name(),
            self.token_value,
            self.loc
        )
    }
}
