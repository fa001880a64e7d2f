//! Purpose: Callback contract for consumers that rewrite tokens as they are lexed.
//! Exports: `TokenRewriter`, `TokenRewriterResult`, `TokenAction`, `LexStateAction`,
//! `RewriteTokenFn`, `BuildNewTokenFn`, `MaybeTokenRewriter`.
//! Role: Optional hook on `ParserOptions`; invoked once per produced token.
//! Invariants: The callee owns the token it receives and must return it, drop it,
//! or drop it and return a replacement. End-of-input is never offered.
use std::fmt;

use crate::core::bytes::Bytes;
use crate::core::loc::Loc;
use crate::core::maybe::Maybe;
use crate::core::token::Token;

/// Producer-supplied factory for fresh tokens the rewriter can fill in.
pub type BuildNewTokenFn = extern "C" fn() -> Box<Token>;

pub type RewriteTokenFn =
    extern "C" fn(token: Box<Token>, build_new_token: BuildNewTokenFn) -> TokenRewriterResult;

#[repr(C, u8)]
#[derive(Debug, PartialEq, Eq)]
pub enum TokenAction {
    Keep(Box<Token>),
    Drop,
    Replace(Box<Token>),
}

#[repr(C, u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LexStateAction {
    Set(u32),
    Keep,
}

#[repr(C)]
#[derive(Debug, PartialEq, Eq)]
pub struct TokenRewriterResult {
    pub token_action: TokenAction,
    pub lex_state_action: LexStateAction,
}

impl TokenRewriterResult {
    pub fn new(token_action: TokenAction, lex_state_action: LexStateAction) -> Self {
        Self {
            token_action,
            lex_state_action,
        }
    }

    /// Splits into the token to emit (if any) and the lex-state action.
    pub fn into_internal(self) -> (Option<Box<Token>>, LexStateAction) {
        let token = match self.token_action {
            TokenAction::Keep(token) | TokenAction::Replace(token) => Some(token),
            TokenAction::Drop => None,
        };
        (token, self.lex_state_action)
    }
}

#[repr(C)]
#[derive(Clone, Copy)]
pub struct TokenRewriter {
    rewrite_f: RewriteTokenFn,
    build_new_token_f: BuildNewTokenFn,
}

pub type MaybeTokenRewriter = Maybe<TokenRewriter>;

impl TokenRewriter {
    pub fn new(rewrite_f: RewriteTokenFn, build_new_token_f: BuildNewTokenFn) -> Self {
        Self {
            rewrite_f,
            build_new_token_f,
        }
    }

    /// Uses the crate's own token factory.
    pub fn with_default_factory(rewrite_f: RewriteTokenFn) -> Self {
        Self::new(rewrite_f, build_new_token)
    }

    pub fn call(&self, token: Box<Token>) -> TokenRewriterResult {
        (self.rewrite_f)(token, self.build_new_token_f)
    }
}

impl fmt::Debug for TokenRewriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRewriter").finish_non_exhaustive()
    }
}

/// Empty token (type 0, empty value, `0...0`) for rewriters to populate.
pub extern "C" fn build_new_token() -> Box<Token> {
    Box::new(Token::new(0, Bytes::empty(), Loc::new(0, 0), 0, 0))
}

#[cfg(test)]
mod tests {
    use super::{
        BuildNewTokenFn, LexStateAction, TokenAction, TokenRewriter, TokenRewriterResult,
        build_new_token,
    };
    use crate::core::bytes::Bytes;
    use crate::core::loc::Loc;
    use crate::core::token::{Token, token_type};

    extern "C" fn replace_with_fresh(token: Box<Token>, build: BuildNewTokenFn) -> TokenRewriterResult {
        let mut fresh = build();
        fresh.set_token_value(Bytes::from("new"));
        drop(token);
        TokenRewriterResult::new(TokenAction::Replace(fresh), LexStateAction::Set(3))
    }

    extern "C" fn drop_all(token: Box<Token>, _build: BuildNewTokenFn) -> TokenRewriterResult {
        drop(token);
        TokenRewriterResult::new(TokenAction::Drop, LexStateAction::Keep)
    }

    fn token() -> Box<Token> {
        Box::new(Token::new(
            token_type::T_IDENTIFIER,
            Bytes::from("old"),
            Loc::new(0, 3),
            1,
            2,
        ))
    }

    #[test]
    fn replace_hands_back_the_fresh_token() {
        let rewriter = TokenRewriter::with_default_factory(replace_with_fresh);
        let (emitted, lex_state) = rewriter.call(token()).into_internal();
        assert_eq!(emitted.expect("token").to_string_lossy(), "new");
        assert_eq!(lex_state, LexStateAction::Set(3));
    }

    #[test]
    fn drop_emits_nothing() {
        let rewriter = TokenRewriter::new(drop_all, build_new_token);
        let (emitted, lex_state) = rewriter.call(token()).into_internal();
        assert!(emitted.is_none());
        assert_eq!(lex_state, LexStateAction::Keep);
    }

    #[test]
    fn factory_tokens_are_blank() {
        let token = build_new_token();
        assert_eq!(token.token_type(), 0);
        assert!(token.token_value().is_empty());
        assert_eq!(token.loc(), &Loc::new(0, 0));
    }
}
