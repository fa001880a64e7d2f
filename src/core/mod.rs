// Core modules: boundary-safe containers, parse records, and error modeling.
pub mod blob;
pub mod bytes;
pub mod comment;
pub mod diagnostic;
pub mod error;
pub mod list;
pub mod loc;
pub mod maybe;
pub mod node;
pub mod options;
pub mod result;
pub mod rewriter;
pub mod source;
pub mod token;
