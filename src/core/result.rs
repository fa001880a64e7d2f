//! Purpose: The single aggregate handed from producer to consumer after a parse.
//! Exports: `ParserResult`.
//! Role: Owns the AST, tokens, diagnostics, comments, magic comments and decoded input.
//! Invariants: Releasing a `ParserResult` releases every field exactly once.
use std::fmt;

use crate::core::comment::{Comment, CommentList, MagicComment, MagicCommentList};
use crate::core::diagnostic::{Diagnostic, DiagnosticList};
use crate::core::node::Node;
use crate::core::source::DecodedInput;
use crate::core::token::{Token, TokenList};

#[repr(C)]
pub struct ParserResult {
    pub ast: Node,
    pub tokens: TokenList,
    pub diagnostics: DiagnosticList,
    pub comments: CommentList,
    pub magic_comments: MagicCommentList,
    pub input: DecodedInput,
}

impl ParserResult {
    pub fn new(
        ast: Node,
        tokens: Vec<Token>,
        diagnostics: Vec<Diagnostic>,
        comments: Vec<Comment>,
        magic_comments: Vec<MagicComment>,
        input: DecodedInput,
    ) -> Self {
        Self {
            ast,
            tokens: TokenList::from(tokens),
            diagnostics: DiagnosticList::from(diagnostics),
            comments: CommentList::from(comments),
            magic_comments: MagicCommentList::from(magic_comments),
            input,
        }
    }

    pub fn ast(&self) -> &Node {
        &self.ast
    }

    pub fn tokens(&self) -> &[Token] {
        self.tokens.as_slice()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diagnostics.as_slice()
    }

    pub fn comments(&self) -> &[Comment] {
        self.comments.as_slice()
    }

    pub fn magic_comments(&self) -> &[MagicComment] {
        self.magic_comments.as_slice()
    }

    pub fn input(&self) -> &DecodedInput {
        &self.input
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Diagnostics rendered against the input, one block per diagnostic.
    pub fn render_diagnostics(&self) -> Vec<String> {
        self.diagnostics
            .iter()
            .filter_map(|diagnostic| diagnostic.render(&self.input))
            .collect()
    }

    pub fn release(self) {
        drop(self)
    }
}

impl fmt::Debug for ParserResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserResult")
            .field("ast", &self.ast)
            .field("tokens", &self.tokens)
            .field("diagnostics", &self.diagnostics)
            .field("comments", &self.comments)
            .field("magic_comments", &self.magic_comments)
            .field("input", &self.input)
            .finish()
    }
}
