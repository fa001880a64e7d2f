// Operational errors for the CLI and the C ABI (usage, io, decoding).
// Parse-level problems are data (`Diagnostic`, `InputError`) and never flow through here.
use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

use crate::core::source::InputError;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Usage,
    NotFound,
    Io,
    Decode,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    path: Option<PathBuf>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            path: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<InputError> for Error {
    fn from(err: InputError) -> Self {
        let message = match &err {
            InputError::UnsupportedEncoding(name) => {
                format!("unsupported encoding: {}", name.to_string_lossy())
            }
            InputError::DecodingError(reason) => {
                format!("decoding failed: {}", reason.to_string_lossy())
            }
        };
        Error::new(ErrorKind::Decode).with_message(message)
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::NotFound => 3,
        ErrorKind::Io => 4,
        ErrorKind::Decode => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind, to_exit_code};
    use crate::core::source::InputError;

    #[test]
    fn exit_code_mapping_is_stable() {
        let cases = [
            (ErrorKind::Internal, 1),
            (ErrorKind::Usage, 2),
            (ErrorKind::NotFound, 3),
            (ErrorKind::Io, 4),
            (ErrorKind::Decode, 5),
        ];

        for (kind, code) in cases {
            assert_eq!(to_exit_code(kind), code);
        }
    }

    #[test]
    fn input_error_maps_to_decode_kind() {
        let err = Error::from(InputError::UnsupportedEncoding("shift_jis".into()));
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(err.message(), Some("unsupported encoding: shift_jis"));
        assert_eq!(err.to_string(), "Decode: unsupported encoding: shift_jis");
    }

    #[test]
    fn display_includes_path() {
        let err = Error::new(ErrorKind::NotFound)
            .with_message("input file missing")
            .with_path("/tmp/nope.rb");
        assert_eq!(
            err.to_string(),
            "NotFound: input file missing (path: /tmp/nope.rb)"
        );
    }
}
