//! Purpose: Recognise magic comments (`# key: value`, `# -*- k: v; k: v -*-`).
//! Exports: `parse_magic_comment`, `prescan_encoding`.
//! Role: Called by the lexer for every comment alone on its line, and once before
//! lexing to find the declared source encoding.
//! Invariants: Returned locations are absolute byte offsets; `value_l` never includes quotes.
use crate::core::comment::{MagicComment, MagicCommentKind};
use crate::core::loc::Loc;

const EMACS_MARKER: &[u8] = b"-*-";

fn is_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\x0b' | b'\x0c')
}

fn is_key_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-'
}

fn skip_spaces(input: &[u8], mut pos: usize, end: usize) -> usize {
    while pos < end && is_space(input[pos]) {
        pos += 1;
    }
    pos
}

fn find_marker(input: &[u8], from: usize, end: usize) -> Option<usize> {
    input[from..end]
        .windows(EMACS_MARKER.len())
        .position(|window| window == EMACS_MARKER)
        .map(|offset| from + offset)
}

/// Parses `key: value` inside `begin..end`. Returns the key and value spans plus the
/// offset just past the value.
fn parse_pair(input: &[u8], begin: usize, end: usize) -> Option<(Loc, Loc, usize)> {
    let key_begin = skip_spaces(input, begin, end);
    let mut pos = key_begin;
    while pos < end && is_key_byte(input[pos]) {
        pos += 1;
    }
    if pos == key_begin {
        return None;
    }
    let key_l = Loc::new(key_begin, pos);

    pos = skip_spaces(input, pos, end);
    if pos >= end || input[pos] != b':' {
        return None;
    }
    pos = skip_spaces(input, pos + 1, end);
    if pos >= end {
        return None;
    }

    let value_l = match input[pos] {
        quote @ (b'"' | b'\'') => {
            let value_begin = pos + 1;
            let mut cursor = value_begin;
            while cursor < end && input[cursor] != quote {
                if input[cursor] == b'\\' {
                    cursor += 1;
                }
                cursor += 1;
            }
            let value_end = cursor.min(end);
            pos = (value_end + 1).min(end);
            Loc::new(value_begin, value_end)
        }
        _ => {
            let value_begin = pos;
            while pos < end && !is_space(input[pos]) && !matches!(input[pos], b';' | b'"' | b'\'') {
                pos += 1;
            }
            Loc::new(value_begin, pos)
        }
    };
    Some((key_l, value_l, pos))
}

fn known_kind(input: &[u8], key_l: &Loc) -> Option<MagicCommentKind> {
    let key = String::from_utf8_lossy(&input[key_l.begin()..key_l.end()]).replace('-', "_");
    MagicCommentKind::from_key(&key)
}

/// Magic comments found in the comment body `begin..end` (the text after `#`).
///
/// Unknown keys are skipped. The plain form must consist of a single pair and
/// nothing else; the emacs form may hold several pairs separated by `;`.
pub fn parse_magic_comment(input: &[u8], begin: usize, end: usize) -> Vec<MagicComment> {
    let end = end.min(input.len());
    if begin >= end {
        return Vec::new();
    }

    let mut found = Vec::new();
    if let Some(open) = find_marker(input, begin, end) {
        let inner_begin = open + EMACS_MARKER.len();
        let Some(close) = find_marker(input, inner_begin, end) else {
            return found;
        };
        let mut pos = inner_begin;
        while pos < close {
            let Some((key_l, value_l, after)) = parse_pair(input, pos, close) else {
                break;
            };
            if let Some(kind) = known_kind(input, &key_l) {
                found.push(MagicComment::new(kind, key_l, value_l));
            }
            pos = skip_spaces(input, after, close);
            while pos < close && input[pos] == b';' {
                pos = skip_spaces(input, pos + 1, close);
            }
        }
        return found;
    }

    let Some((key_l, value_l, after)) = parse_pair(input, begin, end) else {
        return found;
    };
    if skip_spaces(input, after, end) != end {
        return found;
    }
    if let Some(kind) = known_kind(input, &key_l) {
        found.push(MagicComment::new(kind, key_l, value_l));
    }
    found
}

/// Encoding declared by a magic comment among the leading comment and blank lines.
pub fn prescan_encoding(input: &[u8]) -> Option<String> {
    let mut line_begin = 0;
    while line_begin < input.len() {
        let line_end = input[line_begin..]
            .iter()
            .position(|byte| *byte == b'\n')
            .map_or(input.len(), |offset| line_begin + offset);
        let first = skip_spaces(input, line_begin, line_end);
        if first < line_end {
            if input[first] != b'#' {
                return None;
            }
            let encoding = parse_magic_comment(input, first + 1, line_end)
                .into_iter()
                .find(|magic| magic.kind == MagicCommentKind::Encoding);
            if let Some(magic) = encoding {
                let value = &input[magic.value_l.begin()..magic.value_l.end()];
                return Some(String::from_utf8_lossy(value).into_owned());
            }
        }
        line_begin = line_end + 1;
    }
    None
}
