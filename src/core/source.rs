//! Purpose: Decoded source buffer, its line table, and the pluggable decoder contract.
//! Exports: `SourceLine`, `DecodedInput`, `InputError`, `DecoderResult`, `Decoder`, `MaybeDecoder`, `decode_input`.
//! Role: The `input` member of a `ParserResult` plus the decode step that runs before lexing.
//! Invariants: `lines` partitions `bytes` with no gaps or overlaps, in order.
//! Invariants: A decoder callee owns both arguments it receives and hands back exactly one owned result.
use std::fmt;

use crate::core::bytes::{ByteList, SharedByteList, StringPtr};
use crate::core::list::List;
use crate::core::loc::Loc;
use crate::core::maybe::{Maybe, TaggedResult};

/// One line of input as a half-open byte range. The range includes the trailing `\n`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SourceLine {
    pub start: u64,
    pub end: u64,
    pub ends_with_eof: bool,
}

impl SourceLine {
    pub fn new(start: usize, end: usize, ends_with_eof: bool) -> Self {
        Self {
            start: start as u64,
            end: end as u64,
            ends_with_eof,
        }
    }

    pub fn start(&self) -> usize {
        self.start as usize
    }

    pub fn end(&self) -> usize {
        self.end as usize
    }

    pub fn len(&self) -> usize {
        self.end() - self.start()
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Input after decoding: buffer name, line table and bytes.
#[repr(C)]
#[derive(Clone, Default, PartialEq, Eq)]
pub struct DecodedInput {
    pub name: StringPtr,
    pub lines: List<SourceLine>,
    pub bytes: ByteList,
}

impl DecodedInput {
    pub fn new(name: impl Into<StringPtr>, bytes: Vec<u8>) -> Self {
        let mut input = Self::named(name);
        input.set_bytes(bytes);
        input
    }

    pub fn named(name: impl Into<StringPtr>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Replaces the bytes and rebuilds the line table from them.
    pub fn set_bytes(&mut self, bytes: Vec<u8>) {
        self.lines = List::from(split_lines(&bytes));
        self.bytes = ByteList::from(bytes);
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.bytes.as_slice()
    }

    pub fn as_shared_bytes(&self) -> SharedByteList<'_> {
        self.bytes.as_shared()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn substr_at(&self, start: usize, end: usize) -> Option<&[u8]> {
        if start <= end && end <= self.len() {
            Some(&self.as_bytes()[start..end])
        } else {
            None
        }
    }

    pub fn source(&self, loc: &Loc) -> Option<String> {
        loc.source(self)
    }

    /// Zero-based `(line, column)` for a byte offset, or `None` past the end.
    ///
    /// The end-of-input offset maps to the end of the last line when it lacks a
    /// terminator, and to column 0 of the following (virtual) line otherwise.
    pub fn line_col_for_pos(&self, pos: usize) -> Option<(usize, usize)> {
        if pos > self.len() {
            return None;
        }
        for (line_no, line) in self.lines.iter().enumerate() {
            if pos < line.end() {
                return Some((line_no, pos - line.start()));
            }
        }
        match self.lines.last() {
            Some(last) if last.ends_with_eof => Some((self.lines.len() - 1, last.len())),
            _ => Some((self.lines.len(), 0)),
        }
    }
}

impl fmt::Debug for DecodedInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedInput")
            .field("name", &self.name)
            .field("lines", &self.lines)
            .field("bytes", &self.bytes)
            .finish()
    }
}

fn split_lines(bytes: &[u8]) -> Vec<SourceLine> {
    let mut lines = Vec::new();
    let mut start = 0;
    for (idx, byte) in bytes.iter().enumerate() {
        if *byte == b'\n' {
            lines.push(SourceLine::new(start, idx + 1, false));
            start = idx + 1;
        }
    }
    if start < bytes.len() {
        lines.push(SourceLine::new(start, bytes.len(), true));
    }
    lines
}

/// Unrecoverable decoding failure; aborts the parse.
#[repr(C, u8)]
#[derive(Clone, PartialEq, Eq)]
pub enum InputError {
    UnsupportedEncoding(StringPtr),
    DecodingError(StringPtr),
}

impl InputError {
    pub fn unsupported_encoding(name: impl Into<StringPtr>) -> Self {
        InputError::UnsupportedEncoding(name.into())
    }

    pub fn decoding_error(reason: impl Into<StringPtr>) -> Self {
        InputError::DecodingError(reason.into())
    }

    /// The descriptive string carried by either variant.
    pub fn message(&self) -> &StringPtr {
        match self {
            InputError::UnsupportedEncoding(message) | InputError::DecodingError(message) => {
                message
            }
        }
    }
}

impl fmt::Debug for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::UnsupportedEncoding(name) => {
                f.debug_tuple("UnsupportedEncoding").field(name).finish()
            }
            InputError::DecodingError(reason) => {
                f.debug_tuple("DecodingError").field(reason).finish()
            }
        }
    }
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::UnsupportedEncoding(name) => {
                write!(f, "unsupported encoding {}", name.to_string_lossy())
            }
            InputError::DecodingError(reason) => {
                write!(f, "decoding error: {}", reason.to_string_lossy())
            }
        }
    }
}

impl std::error::Error for InputError {}

pub type DecoderResult = TaggedResult<ByteList, InputError>;

/// Decode callback. Receives ownership of the encoding name and the raw bytes.
pub type DecodeFn = extern "C" fn(encoding: StringPtr, input: ByteList) -> DecoderResult;

/// Consumer-supplied re-encoder for inputs in encodings the lexer does not handle natively.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct Decoder {
    f: DecodeFn,
}

pub type MaybeDecoder = Maybe<Decoder>;

impl Decoder {
    pub fn new(f: DecodeFn) -> Self {
        Self { f }
    }

    pub fn call(&self, encoding: StringPtr, input: ByteList) -> DecoderResult {
        (self.f)(encoding, input)
    }
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoder").finish_non_exhaustive()
    }
}

const NATIVE_ENCODINGS: [&str; 3] = ["UTF-8", "ASCII-8BIT", "BINARY"];

pub fn is_native_encoding(encoding: &[u8]) -> bool {
    NATIVE_ENCODINGS
        .iter()
        .any(|native| native.as_bytes().eq_ignore_ascii_case(encoding))
}

/// Routes `input` through `decoder` unless `encoding` is handled natively.
pub fn decode_input(input: ByteList, encoding: StringPtr, decoder: &MaybeDecoder) -> DecoderResult {
    if is_native_encoding(encoding.as_bytes()) {
        return DecoderResult::ok(input);
    }
    match decoder.as_ref() {
        Some(decoder) => decoder.call(encoding, input),
        None => DecoderResult::err(InputError::UnsupportedEncoding(encoding)),
    }
}
