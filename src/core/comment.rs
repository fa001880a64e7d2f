// Comment and magic-comment records collected by the lexer.
use crate::core::list::List;
use crate::core::loc::Loc;
use crate::core::source::DecodedInput;

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommentType {
    /// `=begin` ... `=end`
    Document,
    /// `# ...`
    Inline,
    /// Location or input did not match either form.
    Unknown,
}

impl CommentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentType::Document => "document",
            CommentType::Inline => "inline",
            CommentType::Unknown => "unknown",
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Comment {
    pub location: Loc,
    pub kind: CommentType,
}

pub type CommentList = List<Comment>;

impl Comment {
    /// Classifies the comment by the source text under `location`.
    pub fn new(location: Loc, input: &DecodedInput) -> Self {
        let kind = match input.substr_at(location.begin(), location.end()) {
            Some(source) if source.starts_with(b"#") => CommentType::Inline,
            Some(source) if source.starts_with(b"=begin") => CommentType::Document,
            _ => CommentType::Unknown,
        };
        Self { location, kind }
    }

    pub fn make(location: Loc, kind: CommentType) -> Self {
        Self { location, kind }
    }
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MagicCommentKind {
    Encoding,
    FrozenStringLiteral,
    WarnIndent,
    ShareableConstantValue,
}

impl MagicCommentKind {
    /// Matches a normalised key (`-` already folded to `_`, any case).
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.to_ascii_lowercase();
        match key.as_str() {
            "coding" | "encoding" => Some(MagicCommentKind::Encoding),
            "frozen_string_literal" => Some(MagicCommentKind::FrozenStringLiteral),
            "warn_indent" => Some(MagicCommentKind::WarnIndent),
            "shareable_constant_value" => Some(MagicCommentKind::ShareableConstantValue),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MagicCommentKind::Encoding => "encoding",
            MagicCommentKind::FrozenStringLiteral => "frozen_string_literal",
            MagicCommentKind::WarnIndent => "warn_indent",
            MagicCommentKind::ShareableConstantValue => "shareable_constant_value",
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MagicComment {
    pub kind: MagicCommentKind,
    pub key_l: Loc,
    pub value_l: Loc,
}

pub type MagicCommentList = List<MagicComment>;

impl MagicComment {
    pub fn new(kind: MagicCommentKind, key_l: Loc, value_l: Loc) -> Self {
        Self {
            kind,
            key_l,
            value_l,
        }
    }
}
