// Parser configuration passed by value into a parse call.
use crate::core::bytes::StringPtr;
use crate::core::maybe::Maybe;
use crate::core::rewriter::{MaybeTokenRewriter, TokenRewriter};
use crate::core::source::{Decoder, MaybeDecoder};

/// Bits of `ParserOptions::debug`.
pub mod debug_level {
    pub const NONE: u8 = 0;
    pub const PARSER: u8 = 1;
    pub const LEXER: u8 = 1 << 1;
    pub const BUFFER: u8 = 1 << 2;

    pub fn from_name(name: &str) -> Option<u8> {
        match name.trim().to_ascii_lowercase().as_str() {
            "none" => Some(NONE),
            "parser" => Some(PARSER),
            "lexer" => Some(LEXER),
            "buffer" => Some(BUFFER),
            _ => None,
        }
    }
}

#[repr(C)]
#[derive(Debug)]
pub struct ParserOptions {
    /// Name used in rendered diagnostics.
    pub buffer_name: StringPtr,
    pub debug: u8,
    pub decoder: MaybeDecoder,
    pub token_rewriter: MaybeTokenRewriter,
    /// When false, `ParserResult::tokens` stays empty.
    pub record_tokens: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            buffer_name: StringPtr::from("(eval)"),
            debug: debug_level::NONE,
            decoder: Maybe::none(),
            token_rewriter: Maybe::none(),
            record_tokens: true,
        }
    }
}

impl ParserOptions {
    pub fn with_buffer_name(mut self, name: impl Into<StringPtr>) -> Self {
        self.buffer_name = name.into();
        self
    }

    pub fn with_debug(mut self, debug: u8) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_decoder(mut self, decoder: Decoder) -> Self {
        self.decoder = Maybe::some(decoder);
        self
    }

    pub fn with_token_rewriter(mut self, rewriter: TokenRewriter) -> Self {
        self.token_rewriter = Maybe::some(rewriter);
        self
    }

    pub fn with_record_tokens(mut self, record_tokens: bool) -> Self {
        self.record_tokens = record_tokens;
        self
    }

    pub fn debug_enabled(&self, level: u8) -> bool {
        self.debug & level != 0
    }
}
