// Exercises the C entry points the way a foreign consumer would: by value in, pointers out.
use std::mem::MaybeUninit;
use std::ptr;

use handoff::abi::{
    hnd_bytes_as_shared, hnd_bytes_drop, hnd_bytes_new, hnd_byte_list_drop, hnd_byte_list_new,
    hnd_comment_list_len, hnd_decoded_input_bytes, hnd_decoder_result_drop,
    hnd_decoder_result_err, hnd_decoder_result_ok,
    hnd_diagnostic_list_get, hnd_diagnostic_list_len, hnd_diagnostic_message,
    hnd_diagnostic_render, hnd_input_error_decoding_error, hnd_input_error_drop,
    hnd_input_error_unsupported_encoding, hnd_layout_sizes, hnd_line_col_for_pos,
    hnd_node_children, hnd_node_inspect, hnd_node_loc, hnd_node_type, hnd_parse,
    hnd_parse_outcome_drop, hnd_parser_options_default, hnd_parser_result_ast,
    hnd_parser_result_free, hnd_parser_result_input, hnd_string_ptr_drop, hnd_string_ptr_new,
    hnd_token_free, hnd_token_list_get, hnd_token_list_len, hnd_token_name, hnd_token_new,
    hnd_token_value,
};
use handoff::api::{
    InputError, Loc, ParseOutcome, ParserOptions, ParserResult, SharedByteList, token_type,
};

fn parse_ok(source: &[u8]) -> *mut ParserResult {
    let outcome = hnd_parse(SharedByteList::from(source), hnd_parser_options_default());
    match outcome.into_result() {
        Ok(result) => Box::into_raw(result),
        Err(err) => panic!("parse failed: {err}"),
    }
}

#[test]
fn parse_and_walk_the_result() {
    let result = parse_ok(b"x = 1 # one\n");

    let ast = hnd_parser_result_ast(result);
    assert_eq!(hnd_node_type(ast).as_slice(), b"begin");
    assert_eq!(hnd_node_loc(ast).into_option(), Some(Loc::new(0, 12)));
    let children = hnd_node_children(ast);
    assert_eq!(children.len(), 1);
    let assignment = children.get(0).expect("child");
    assert_eq!(hnd_node_type(assignment).as_slice(), b"lvasgn");

    let inspected = hnd_node_inspect(ast);
    assert_eq!(inspected, "(begin\n  (lvasgn :x\n    (int 1)))");

    let tokens = unsafe { &(*result).tokens };
    assert_eq!(hnd_token_list_len(tokens), 4);
    let first = hnd_token_list_get(tokens, 0);
    assert_eq!(hnd_token_name(first).as_slice(), b"tIDENTIFIER");
    assert_eq!(hnd_token_value(first).as_slice(), b"x");
    assert!(hnd_token_list_get(tokens, 4).is_null());

    let comments = unsafe { &(*result).comments };
    assert_eq!(hnd_comment_list_len(comments), 1);

    hnd_parser_result_free(result);
}

#[test]
fn diagnostics_are_reachable_and_renderable() {
    let result = parse_ok(b"def\nend");
    let diagnostics = unsafe { &(*result).diagnostics };
    assert_eq!(hnd_diagnostic_list_len(diagnostics), 1);
    let diagnostic = hnd_diagnostic_list_get(diagnostics, 0);
    assert_eq!(hnd_diagnostic_message(diagnostic), "expected a method name");

    let input = hnd_parser_result_input(result);
    assert_eq!(hnd_decoded_input_bytes(input).as_slice(), b"def\nend");
    let rendered = hnd_diagnostic_render(diagnostic, input).into_option().expect("rendered");
    assert_eq!(
        rendered,
        "(eval):2:1: error: expected a method name\n(eval):2: end\n(eval):2: ^~~"
    );

    let (mut line, mut col) = (0u64, 0u64);
    assert!(hnd_line_col_for_pos(input, 5, &mut line, &mut col));
    assert_eq!((line, col), (1, 1));
    assert!(!hnd_line_col_for_pos(input, 99, &mut line, &mut col));

    hnd_parser_result_free(result);
}

#[test]
fn parse_outcome_drops_in_place() {
    let mut slot = MaybeUninit::new(hnd_parse(
        SharedByteList::from(&b"1 + 2"[..]),
        ParserOptions::default(),
    ));
    assert!(unsafe { slot.assume_init_ref() }.is_ok());
    hnd_parse_outcome_drop(slot.as_mut_ptr());
}

#[test]
fn failed_parse_outcome_carries_the_error() {
    let options = ParserOptions::default();
    let outcome: ParseOutcome = hnd_parse(SharedByteList::from(&b"# coding: koi8-r\n"[..]), options);
    let err = outcome.into_result().expect_err("unsupported");
    assert_eq!(err, InputError::unsupported_encoding("koi8-r"));
}

#[test]
fn constructors_and_drops_pair_up() {
    let bytes = b"abc";
    let mut string = MaybeUninit::new(hnd_string_ptr_new(bytes.as_ptr(), 3));
    assert_eq!(unsafe { slot_ref(&string) }.as_bytes(), b"abc");
    hnd_string_ptr_drop(string.as_mut_ptr());

    let mut list = MaybeUninit::new(hnd_byte_list_new(bytes.as_ptr(), 2));
    assert_eq!(unsafe { slot_ref(&list) }.as_slice(), b"ab");
    hnd_byte_list_drop(list.as_mut_ptr());

    let mut value = MaybeUninit::new(hnd_bytes_new(bytes.as_ptr(), 3));
    assert_eq!(hnd_bytes_as_shared(value.as_ptr()).as_slice(), b"abc");
    hnd_bytes_drop(value.as_mut_ptr());

    let token = hnd_token_new(
        token_type::T_IDENTIFIER,
        hnd_bytes_new(bytes.as_ptr(), 3),
        4,
        7,
        1,
        4,
    );
    assert_eq!(token.loc(), &Loc::new(4, 7));
    hnd_token_free(Box::into_raw(token));

    let mut error = MaybeUninit::new(hnd_input_error_decoding_error("bad byte".into()));
    hnd_input_error_drop(error.as_mut_ptr());

    let mut ok = MaybeUninit::new(hnd_decoder_result_ok(hnd_byte_list_new(bytes.as_ptr(), 3)));
    hnd_decoder_result_drop(ok.as_mut_ptr());
    let mut err = MaybeUninit::new(hnd_decoder_result_err(
        hnd_input_error_unsupported_encoding("EUC-JP".into()),
    ));
    hnd_decoder_result_drop(err.as_mut_ptr());
}

unsafe fn slot_ref<T>(slot: &MaybeUninit<T>) -> &T {
    unsafe { slot.assume_init_ref() }
}

#[test]
fn null_pointers_are_tolerated() {
    hnd_parser_result_free(ptr::null_mut());
    hnd_token_free(ptr::null_mut());
    hnd_parse_outcome_drop(ptr::null_mut());
    hnd_string_ptr_drop(ptr::null_mut());
    assert!(hnd_parser_result_ast(ptr::null()).is_null());
    assert_eq!(hnd_token_list_len(ptr::null()), 0);
    assert!(hnd_token_list_get(ptr::null(), 0).is_null());
    assert!(hnd_token_value(ptr::null()).is_empty());
    assert!(hnd_node_children(ptr::null()).is_empty());
    assert!(hnd_decoded_input_bytes(ptr::null()).is_empty());
    assert!(hnd_node_loc(ptr::null()).is_none());
    assert!(hnd_node_inspect(ptr::null()).is_empty());
    assert!(hnd_diagnostic_render(ptr::null(), ptr::null()).is_none());
    assert!(!hnd_line_col_for_pos(ptr::null(), 0, ptr::null_mut(), ptr::null_mut()));
    let empty = hnd_string_ptr_new(ptr::null(), 10);
    assert!(empty.is_empty());
}

#[test]
fn layout_sizes_match_rust_view() {
    let layout = hnd_layout_sizes();
    assert_eq!(layout.node, std::mem::size_of::<handoff::api::Node>() as u64);
    assert_eq!(layout.parser_result, std::mem::size_of::<ParserResult>() as u64);
    assert!(layout.parse_outcome > std::mem::size_of::<usize>() as u64);
    assert_eq!(layout.comment, 24);
    assert_eq!(layout.magic_comment, 40);
}
