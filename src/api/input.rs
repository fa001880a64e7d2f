//! Purpose: Load source bytes from files or stdin and parse them.
//! Exports: `SourceRef`, `read_source`, `parse_source`.
//! Role: Shared by the CLI and the `hnd_parse_file` ABI entry point.
//! Invariants: I/O failures map to `ErrorKind::NotFound` or `ErrorKind::Io`;
//! decoder failures map to `ErrorKind::Decode`.
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use libc::{EACCES, ENOENT, ENOTDIR, EPERM};

use crate::core::error::{Error, ErrorKind};
use crate::core::options::ParserOptions;
use crate::core::result::ParserResult;
use crate::parse::parse;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceRef {
    Stdin,
    Path(PathBuf),
}

impl SourceRef {
    /// `-` names stdin; anything else is a path.
    pub fn parse(input: &str) -> Self {
        if input == "-" {
            SourceRef::Stdin
        } else {
            SourceRef::Path(PathBuf::from(input))
        }
    }

    /// Buffer name used in diagnostics.
    pub fn display_name(&self) -> String {
        match self {
            SourceRef::Stdin => "-".to_string(),
            SourceRef::Path(path) => path.display().to_string(),
        }
    }
}

fn read_error_kind(err: &io::Error) -> ErrorKind {
    let errno = err.raw_os_error().unwrap_or_default();
    if errno == ENOENT || errno == ENOTDIR {
        return ErrorKind::NotFound;
    }
    match err.kind() {
        io::ErrorKind::NotFound => ErrorKind::NotFound,
        _ => ErrorKind::Io,
    }
}

fn read_error_message(err: &io::Error) -> &'static str {
    let errno = err.raw_os_error().unwrap_or_default();
    if errno == EACCES || errno == EPERM {
        return "permission denied reading input";
    }
    "failed to read input"
}

fn io_error(err: io::Error, path: Option<&Path>) -> Error {
    let mut error = Error::new(read_error_kind(&err)).with_message(read_error_message(&err));
    if let Some(path) = path {
        error = error.with_path(path);
    }
    error.with_source(err)
}

pub fn read_source(source: &SourceRef) -> Result<Vec<u8>, Error> {
    match source {
        SourceRef::Stdin => {
            let mut bytes = Vec::new();
            io::stdin()
                .read_to_end(&mut bytes)
                .map_err(|err| io_error(err, None))?;
            Ok(bytes)
        }
        SourceRef::Path(path) => std::fs::read(path).map_err(|err| io_error(err, Some(path))),
    }
}

/// Reads `source` and parses it. `options.buffer_name` is kept as given.
pub fn parse_source(source: &SourceRef, options: ParserOptions) -> Result<ParserResult, Error> {
    let bytes = read_source(source)?;
    parse(bytes, options).map_err(|err| {
        let error = Error::from(err);
        match source {
            SourceRef::Path(path) => error.with_path(path),
            SourceRef::Stdin => error,
        }
    })
}
