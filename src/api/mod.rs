//! Purpose: Define the public Rust API boundary for handoff.
//! Exports: Boundary containers, parse records, options, and the parse entry points.
//! Role: Stable path for the CLI, the C ABI and downstream crates.
//! Invariants: Everything that crosses the C boundary is reachable from here.

mod input;

pub use crate::core::blob::Blob;
pub use crate::core::bytes::{ByteList, Bytes, SharedByteList, StringPtr};
pub use crate::core::comment::{
    Comment, CommentList, CommentType, MagicComment, MagicCommentKind, MagicCommentList,
};
pub use crate::core::diagnostic::{Diagnostic, DiagnosticList, DiagnosticMessage, ErrorLevel};
#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::list::{List, SharedList};
pub use crate::core::loc::{Loc, MaybeLoc};
pub use crate::core::maybe::{Maybe, TaggedResult};
pub use crate::core::node::{Node, NodeKind, NodeList};
pub use crate::core::options::{ParserOptions, debug_level};
pub use crate::core::result::ParserResult;
pub use crate::core::rewriter::{
    BuildNewTokenFn, LexStateAction, MaybeTokenRewriter, RewriteTokenFn, TokenAction,
    TokenRewriter, TokenRewriterResult, build_new_token,
};
pub use crate::core::source::{
    DecodeFn, DecodedInput, Decoder, DecoderResult, InputError, MaybeDecoder, SourceLine,
    decode_input,
};
pub use crate::core::token::{Token, TokenList, lex_state, token_name, token_type};
pub use crate::parse::{Parser, parse};
pub use input::{SourceRef, parse_source, read_source};

/// Result of a parse handed across the C boundary.
pub type ParseOutcome = TaggedResult<Box<ParserResult>, InputError>;
