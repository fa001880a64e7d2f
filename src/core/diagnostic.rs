//! Purpose: Non-fatal parse problems with a level, an opaque message and a location.
//! Exports: `ErrorLevel`, `DiagnosticMessage`, `Diagnostic`, `DiagnosticList`.
//! Role: Collected by the lexer and grammar; never aborts a parse.
//! Invariants: `message` crosses the boundary as a `Blob`; readers go through `message()`.
use std::fmt;

use crate::core::blob::Blob;
use crate::core::list::List;
use crate::core::loc::Loc;
use crate::core::source::DecodedInput;

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorLevel {
    Warning,
    Error,
}

impl ErrorLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorLevel::Warning => "warning",
            ErrorLevel::Error => "error",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticMessage {
    UnexpectedToken { token_name: String },
    MissingMethodName,
    ExpectedToken { expected: String, found: String },
    UnterminatedString,
    EmbeddedDocumentMeetsEof,
    InvalidCharacter { byte: u8 },
    NestingTooDeep,
    MagicCommentIgnored { name: String },
}

impl DiagnosticMessage {
    pub fn render(&self) -> String {
        match self {
            DiagnosticMessage::UnexpectedToken { token_name } => {
                format!("unexpected {token_name}")
            }
            DiagnosticMessage::MissingMethodName => "expected a method name".to_string(),
            DiagnosticMessage::ExpectedToken { expected, found } => {
                format!("expected {expected}, got {found}")
            }
            DiagnosticMessage::UnterminatedString => "unterminated string meets end of file".to_string(),
            DiagnosticMessage::EmbeddedDocumentMeetsEof => {
                "embedded document meets end of file".to_string()
            }
            DiagnosticMessage::InvalidCharacter { byte } => {
                format!("invalid character 0x{byte:02X} in expression")
            }
            DiagnosticMessage::NestingTooDeep => "expression nesting is too deep".to_string(),
            DiagnosticMessage::MagicCommentIgnored { name } => {
                format!("`{name}' is ignored after any tokens")
            }
        }
    }

    /// Stable identifier used by JSON output.
    pub fn name(&self) -> &'static str {
        match self {
            DiagnosticMessage::UnexpectedToken { .. } => "UnexpectedToken",
            DiagnosticMessage::MissingMethodName => "MissingMethodName",
            DiagnosticMessage::ExpectedToken { .. } => "ExpectedToken",
            DiagnosticMessage::UnterminatedString => "UnterminatedString",
            DiagnosticMessage::EmbeddedDocumentMeetsEof => "EmbeddedDocumentMeetsEof",
            DiagnosticMessage::InvalidCharacter { .. } => "InvalidCharacter",
            DiagnosticMessage::NestingTooDeep => "NestingTooDeep",
            DiagnosticMessage::MagicCommentIgnored { .. } => "MagicCommentIgnored",
        }
    }
}

#[repr(C)]
#[derive(Clone, PartialEq, Eq)]
pub struct Diagnostic {
    level: ErrorLevel,
    message: Blob<DiagnosticMessage>,
    loc: Loc,
}

pub type DiagnosticList = List<Diagnostic>;

impl Diagnostic {
    pub fn new(level: ErrorLevel, message: DiagnosticMessage, loc: Loc) -> Self {
        Self {
            level,
            message: Blob::pack(message),
            loc,
        }
    }

    pub fn error(message: DiagnosticMessage, loc: Loc) -> Self {
        Self::new(ErrorLevel::Error, message, loc)
    }

    pub fn warning(message: DiagnosticMessage, loc: Loc) -> Self {
        Self::new(ErrorLevel::Warning, message, loc)
    }

    pub fn level(&self) -> ErrorLevel {
        self.level
    }

    pub fn message(&self) -> &DiagnosticMessage {
        self.message.get()
    }

    pub fn loc(&self) -> &Loc {
        &self.loc
    }

    pub fn is_error(&self) -> bool {
        self.level == ErrorLevel::Error
    }

    /// `name:line:col: level: message`, then the offending line with a `^~~` marker.
    ///
    /// Lines and columns are 1-based. Returns `None` when `loc` lies outside `input`.
    pub fn render(&self, input: &DecodedInput) -> Option<String> {
        let (line_no, col) = self.loc.begin_line_col(input)?;
        let mut out = format!(
            "{}:{}:{}: {}: {}",
            input.name.to_string_lossy(),
            line_no + 1,
            col + 1,
            self.level.as_str(),
            self.message().render()
        );
        let Some((_, line_loc)) = self.loc.expand_to_line(input) else {
            return Some(out);
        };
        let source = line_loc.source(input)?;
        let prefix = format!("{}:{}", input.name.to_string_lossy(), line_no + 1);

        let highlight_end = self.loc.end().min(line_loc.end()).max(self.loc.begin());
        let width = highlight_end - self.loc.begin();
        let mut marker = " ".repeat(col);
        marker.push('^');
        if width > 1 {
            marker.push_str(&"~".repeat(width - 1));
        }

        out.push('\n');
        out.push_str(&format!("{prefix}: {source}\n"));
        out.push_str(&format!("{prefix}: {marker}"));
        Some(out)
    }
}

impl fmt::Debug for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} at {:?}",
            self.level.as_str(),
            self.message().render(),
            self.loc
        )
    }
}
