//! Purpose: C ABI bridge for consumers of parser results (libhandoff).
//! Exports: `hnd_parse*`, release functions for every owned type, constructors and accessors.
//! Role: The only place where ownership crosses into foreign code.
//! Invariants: Owned values move exactly once; each has exactly one release entry point.
//! Invariants: `*_drop` functions release a value in place and leave the memory dead;
//! `*_free` functions release a value and the box that holds it.
//! Invariants: Null pointers are tolerated everywhere: frees ignore them, accessors
//! return null, zero, or an empty view.
#![allow(non_camel_case_types, improper_ctypes_definitions)]
#![allow(clippy::not_unsafe_ptr_arg_deref)]

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::PathBuf;
use std::ptr;

use crate::api::{
    ByteList, Bytes, CommentList, DecodedInput, Diagnostic, DiagnosticList, DecoderResult,
    Error, ErrorKind, InputError, Loc, MagicCommentList, Maybe, MaybeLoc, Node, ParseOutcome,
    ParserOptions, ParserResult, SharedByteList, SharedList, SourceRef, StringPtr, Token,
    TokenList, TokenRewriterResult, parse, parse_source,
};

#[repr(C)]
pub struct hnd_error {
    kind: i32,
    message: *mut c_char,
    path: *mut c_char,
}

/// Sizes of the boundary types, for consumers that mirror the layouts.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct hnd_layout {
    pub node: u64,
    pub token: u64,
    pub diagnostic: u64,
    pub comment: u64,
    pub magic_comment: u64,
    pub decoded_input: u64,
    pub parser_options: u64,
    pub parser_result: u64,
    pub parse_outcome: u64,
}

fn bytes_from_raw(ptr: *const u8, len: u64) -> Vec<u8> {
    if ptr.is_null() || len == 0 {
        return Vec::new();
    }
    unsafe { std::slice::from_raw_parts(ptr, len as usize) }.to_vec()
}

// Parsing

#[unsafe(no_mangle)]
pub extern "C" fn hnd_parse(input: SharedByteList<'_>, options: ParserOptions) -> ParseOutcome {
    parse(input.as_slice(), options).map(Box::new).into()
}

#[unsafe(no_mangle)]
pub extern "C" fn hnd_parse_file(
    path: *const c_char,
    options: ParserOptions,
    out_result: *mut *mut ParserResult,
    out_err: *mut *mut hnd_error,
) -> i32 {
    if out_result.is_null() {
        return fail(
            out_err,
            Error::new(ErrorKind::Usage).with_message("out_result is null"),
        );
    }
    if path.is_null() {
        return fail(
            out_err,
            Error::new(ErrorKind::Usage).with_message("path is null"),
        );
    }
    let path = match unsafe { CStr::from_ptr(path) }.to_str() {
        Ok(path) => PathBuf::from(path),
        Err(_) => {
            return fail(
                out_err,
                Error::new(ErrorKind::Usage).with_message("path is not valid UTF-8"),
            );
        }
    };
    match parse_source(&SourceRef::Path(path), options) {
        Ok(result) => {
            unsafe {
                *out_result = Box::into_raw(Box::new(result));
            }
            0
        }
        Err(err) => fail(out_err, err),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn hnd_parser_options_default() -> ParserOptions {
    ParserOptions::default()
}

#[unsafe(no_mangle)]
pub extern "C" fn hnd_layout_sizes() -> hnd_layout {
    use std::mem::size_of;
    hnd_layout {
        node: size_of::<Node>() as u64,
        token: size_of::<Token>() as u64,
        diagnostic: size_of::<Diagnostic>() as u64,
        comment: size_of::<crate::api::Comment>() as u64,
        magic_comment: size_of::<crate::api::MagicComment>() as u64,
        decoded_input: size_of::<DecodedInput>() as u64,
        parser_options: size_of::<ParserOptions>() as u64,
        parser_result: size_of::<ParserResult>() as u64,
        parse_outcome: size_of::<ParseOutcome>() as u64,
    }
}

// Boxed releases

#[unsafe(no_mangle)]
pub extern "C" fn hnd_parser_result_free(result: *mut ParserResult) {
    if result.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(result));
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn hnd_token_free(token: *mut Token) {
    if token.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(token));
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn hnd_error_free(err: *mut hnd_error) {
    if err.is_null() {
        return;
    }
    unsafe {
        let err = Box::from_raw(err);
        if !err.message.is_null() {
            drop(CString::from_raw(err.message));
        }
        if !err.path.is_null() {
            drop(CString::from_raw(err.path));
        }
    }
}

// In-place releases

macro_rules! in_place_drop {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            #[unsafe(no_mangle)]
            pub extern "C" fn $name(value: *mut $ty) {
                if value.is_null() {
                    return;
                }
                unsafe { ptr::drop_in_place(value) }
            }
        )*
    };
}

in_place_drop! {
    hnd_parse_outcome_drop => ParseOutcome,
    hnd_parser_options_drop => ParserOptions,
    hnd_string_ptr_drop => StringPtr,
    hnd_byte_list_drop => ByteList,
    hnd_bytes_drop => Bytes,
    hnd_maybe_loc_drop => MaybeLoc,
    hnd_token_drop => Token,
    hnd_token_list_drop => TokenList,
    hnd_diagnostic_drop => Diagnostic,
    hnd_diagnostic_list_drop => DiagnosticList,
    hnd_comment_list_drop => CommentList,
    hnd_magic_comment_list_drop => MagicCommentList,
    hnd_node_drop => Node,
    hnd_decoded_input_drop => DecodedInput,
    hnd_input_error_drop => InputError,
    hnd_decoder_result_drop => DecoderResult,
    hnd_token_rewriter_result_drop => TokenRewriterResult,
}

// Constructors

#[unsafe(no_mangle)]
pub extern "C" fn hnd_string_ptr_new(ptr: *const u8, len: u64) -> StringPtr {
    StringPtr::from(bytes_from_raw(ptr, len))
}

#[unsafe(no_mangle)]
pub extern "C" fn hnd_byte_list_new(ptr: *const u8, len: u64) -> ByteList {
    ByteList::from(bytes_from_raw(ptr, len))
}

#[unsafe(no_mangle)]
pub extern "C" fn hnd_bytes_new(ptr: *const u8, len: u64) -> Bytes {
    Bytes::new(bytes_from_raw(ptr, len))
}

#[unsafe(no_mangle)]
pub extern "C" fn hnd_token_new(
    token_type: u32,
    value: Bytes,
    begin: u64,
    end: u64,
    lex_state_before: u32,
    lex_state_after: u32,
) -> Box<Token> {
    let loc = Loc::new(begin as usize, (end as usize).max(begin as usize));
    Box::new(Token::new(
        token_type,
        value,
        loc,
        lex_state_before,
        lex_state_after,
    ))
}

#[unsafe(no_mangle)]
pub extern "C" fn hnd_input_error_unsupported_encoding(name: StringPtr) -> InputError {
    InputError::UnsupportedEncoding(name)
}

#[unsafe(no_mangle)]
pub extern "C" fn hnd_input_error_decoding_error(reason: StringPtr) -> InputError {
    InputError::DecodingError(reason)
}

#[unsafe(no_mangle)]
pub extern "C" fn hnd_decoder_result_ok(output: ByteList) -> DecoderResult {
    DecoderResult::ok(output)
}

#[unsafe(no_mangle)]
pub extern "C" fn hnd_decoder_result_err(error: InputError) -> DecoderResult {
    DecoderResult::err(error)
}

// Accessors

fn borrow<'a, T>(value: *const T) -> Option<&'a T> {
    if value.is_null() {
        return None;
    }
    unsafe { Some(&*value) }
}

fn list_get<T>(list: *const crate::api::List<T>, index: u64) -> *const T {
    borrow(list)
        .and_then(|list| list.get(index as usize))
        .map_or(ptr::null(), |item| item as *const T)
}

#[unsafe(no_mangle)]
pub extern "C" fn hnd_parser_result_ast(result: *const ParserResult) -> *const Node {
    borrow(result).map_or(ptr::null(), |result| &result.ast as *const Node)
}

#[unsafe(no_mangle)]
pub extern "C" fn hnd_parser_result_input(result: *const ParserResult) -> *const DecodedInput {
    borrow(result).map_or(ptr::null(), |result| &result.input as *const DecodedInput)
}

#[unsafe(no_mangle)]
pub extern "C" fn hnd_decoded_input_bytes(input: *const DecodedInput) -> SharedByteList<'static> {
    match borrow::<'static, DecodedInput>(input) {
        Some(input) => input.as_shared_bytes(),
        None => SharedList::empty(),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn hnd_token_list_len(list: *const TokenList) -> u64 {
    borrow(list).map_or(0, |list| list.len() as u64)
}

#[unsafe(no_mangle)]
pub extern "C" fn hnd_token_list_get(list: *const TokenList, index: u64) -> *const Token {
    list_get(list, index)
}

#[unsafe(no_mangle)]
pub extern "C" fn hnd_diagnostic_list_len(list: *const DiagnosticList) -> u64 {
    borrow(list).map_or(0, |list| list.len() as u64)
}

#[unsafe(no_mangle)]
pub extern "C" fn hnd_diagnostic_list_get(
    list: *const DiagnosticList,
    index: u64,
) -> *const Diagnostic {
    list_get(list, index)
}

#[unsafe(no_mangle)]
pub extern "C" fn hnd_comment_list_len(list: *const CommentList) -> u64 {
    borrow(list).map_or(0, |list| list.len() as u64)
}

#[unsafe(no_mangle)]
pub extern "C" fn hnd_token_name(token: *const Token) -> SharedByteList<'static> {
    borrow(token).map_or(SharedList::empty(), |token| {
        SharedByteList::from(token.token_name().as_bytes())
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn hnd_token_value(token: *const Token) -> SharedByteList<'static> {
    match borrow::<'static, Token>(token) {
        Some(token) => token.token_value().as_shared(),
        None => SharedList::empty(),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn hnd_bytes_as_shared(bytes: *const Bytes) -> SharedByteList<'static> {
    match borrow::<'static, Bytes>(bytes) {
        Some(bytes) => bytes.as_shared(),
        None => SharedList::empty(),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn hnd_node_type(node: *const Node) -> SharedByteList<'static> {
    borrow(node).map_or(SharedList::empty(), |node| {
        SharedByteList::from(node.str_type().as_bytes())
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn hnd_node_loc(node: *const Node) -> MaybeLoc {
    borrow(node).map_or(Maybe::none(), |node| Maybe::some(*node.loc()))
}

#[unsafe(no_mangle)]
pub extern "C" fn hnd_node_children(node: *const Node) -> SharedList<'static, Node> {
    match borrow::<'static, Node>(node) {
        Some(node) => node.children().as_shared(),
        None => SharedList::empty(),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn hnd_node_inspect(node: *const Node) -> StringPtr {
    borrow(node).map_or(StringPtr::default(), |node| StringPtr::from(node.inspect()))
}

#[unsafe(no_mangle)]
pub extern "C" fn hnd_diagnostic_message(diagnostic: *const Diagnostic) -> StringPtr {
    borrow(diagnostic).map_or(StringPtr::default(), |diagnostic| {
        StringPtr::from(diagnostic.message().render())
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn hnd_diagnostic_render(
    diagnostic: *const Diagnostic,
    input: *const DecodedInput,
) -> Maybe<StringPtr> {
    match (borrow(diagnostic), borrow(input)) {
        (Some(diagnostic), Some(input)) => diagnostic.render(input).map(StringPtr::from).into(),
        _ => Maybe::none(),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn hnd_line_col_for_pos(
    input: *const DecodedInput,
    pos: u64,
    out_line: *mut u64,
    out_col: *mut u64,
) -> bool {
    let Some((line, col)) = borrow(input).and_then(|input| input.line_col_for_pos(pos as usize))
    else {
        return false;
    };
    unsafe {
        if !out_line.is_null() {
            *out_line = line as u64;
        }
        if !out_col.is_null() {
            *out_col = col as u64;
        }
    }
    true
}

fn fail(out_err: *mut *mut hnd_error, err: Error) -> i32 {
    if out_err.is_null() {
        return -1;
    }
    let error = Box::new(hnd_error {
        kind: error_kind_code(err.kind()),
        message: to_c_string(err.message().unwrap_or("")),
        path: err
            .path()
            .map(|path| to_c_string(path.to_string_lossy().as_ref()))
            .unwrap_or(ptr::null_mut()),
    });
    unsafe {
        *out_err = Box::into_raw(error);
    }
    -1
}

fn to_c_string(input: &str) -> *mut c_char {
    CString::new(input)
        .map(|s| s.into_raw())
        .unwrap_or(ptr::null_mut())
}

fn error_kind_code(kind: ErrorKind) -> i32 {
    crate::api::to_exit_code(kind)
}
