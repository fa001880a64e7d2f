// Byte-offset spans into a `DecodedInput`.
use std::fmt;

use crate::core::maybe::Maybe;
use crate::core::source::DecodedInput;

/// Half-open byte range `begin..end`.
#[repr(C)]
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Loc {
    pub begin: u64,
    pub end: u64,
}

pub type MaybeLoc = Maybe<Loc>;

impl Loc {
    pub fn new(begin: usize, end: usize) -> Self {
        debug_assert!(begin <= end, "loc begin {begin} > end {end}");
        Self {
            begin: begin as u64,
            end: end as u64,
        }
    }

    pub fn begin(&self) -> usize {
        self.begin as usize
    }

    pub fn end(&self) -> usize {
        self.end as usize
    }

    pub fn size(&self) -> usize {
        self.end() - self.begin()
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    /// Smallest span covering both.
    pub fn join(&self, other: &Loc) -> Self {
        Self::new(
            self.begin().min(other.begin()),
            self.end().max(other.end()),
        )
    }

    pub fn source(&self, input: &DecodedInput) -> Option<String> {
        let bytes = input.substr_at(self.begin(), self.end())?;
        Some(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Zero-based `(line, column)` of `begin`.
    pub fn begin_line_col(&self, input: &DecodedInput) -> Option<(usize, usize)> {
        input.line_col_for_pos(self.begin())
    }

    /// The line containing `begin`, without its terminator, and that line's index.
    pub fn expand_to_line(&self, input: &DecodedInput) -> Option<(usize, Loc)> {
        let (line_no, _) = self.begin_line_col(input)?;
        let line = input.lines.get(line_no)?;
        let mut end = line.end();
        if !line.ends_with_eof && end > line.start() {
            end -= 1;
        }
        Some((line_no, Loc::new(line.start(), end)))
    }
}

impl fmt::Debug for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}...{}", self.begin, self.end)
    }
}
