// End-to-end parse scenarios: rewriters, decoders, comments and error recovery.
use std::sync::atomic::{AtomicUsize, Ordering};

use handoff::api::{
    BuildNewTokenFn, ByteList, Bytes, CommentType, Decoder, DecoderResult, DiagnosticMessage,
    ErrorLevel, InputError, LexStateAction, Loc, MagicCommentKind, Node, NodeKind, ParserOptions,
    StringPtr, Token, TokenAction, TokenRewriter, TokenRewriterResult, parse, token_type,
};

extern "C" fn drop_every_token(token: Box<Token>, _build: BuildNewTokenFn) -> TokenRewriterResult {
    drop(token);
    TokenRewriterResult::new(TokenAction::Drop, LexStateAction::Keep)
}

extern "C" fn keep_and_set_seven(token: Box<Token>, _build: BuildNewTokenFn) -> TokenRewriterResult {
    TokenRewriterResult::new(TokenAction::Keep(token), LexStateAction::Set(7))
}

// Rewrites every `foo` identifier into `bar`.
extern "C" fn rename_foo(token: Box<Token>, build: BuildNewTokenFn) -> TokenRewriterResult {
    if token.token_value().as_raw() != b"foo" {
        return TokenRewriterResult::new(TokenAction::Keep(token), LexStateAction::Keep);
    }
    let mut fresh = build();
    *fresh = Token::new(
        token.token_type(),
        Bytes::from("bar"),
        *token.loc(),
        token.lex_state_before(),
        token.lex_state_after(),
    );
    drop(token);
    TokenRewriterResult::new(TokenAction::Replace(fresh), LexStateAction::Keep)
}

// Replaces every `y` with a factory token that keeps the factory's `0...0` location.
extern "C" fn y_to_unplaced_z(token: Box<Token>, build: BuildNewTokenFn) -> TokenRewriterResult {
    if token.token_value().as_raw() != b"y" {
        return TokenRewriterResult::new(TokenAction::Keep(token), LexStateAction::Keep);
    }
    let mut fresh = build();
    *fresh = Token::new(
        token_type::T_IDENTIFIER,
        Bytes::from("z"),
        *fresh.loc(),
        token.lex_state_before(),
        token.lex_state_after(),
    );
    drop(token);
    TokenRewriterResult::new(TokenAction::Replace(fresh), LexStateAction::Keep)
}

static SEEN_TOKENS: AtomicUsize = AtomicUsize::new(0);

extern "C" fn count_tokens(token: Box<Token>, _build: BuildNewTokenFn) -> TokenRewriterResult {
    assert!(!token.is_end_of_input());
    SEEN_TOKENS.fetch_add(1, Ordering::SeqCst);
    TokenRewriterResult::new(TokenAction::Keep(token), LexStateAction::Keep)
}

extern "C" fn reject_as_shift_jis(_encoding: StringPtr, _input: ByteList) -> DecoderResult {
    DecoderResult::err(InputError::unsupported_encoding("shift_jis"))
}

static DECODER_CALLS: AtomicUsize = AtomicUsize::new(0);

extern "C" fn upcase_decoder(encoding: StringPtr, input: ByteList) -> DecoderResult {
    DECODER_CALLS.fetch_add(1, Ordering::SeqCst);
    assert_eq!(encoding, "US-ASCII");
    DecoderResult::ok(input.iter().map(|byte| byte.to_ascii_lowercase()).collect())
}

#[test]
fn rewriter_that_drops_everything_leaves_no_tokens() {
    let options = ParserOptions::default()
        .with_token_rewriter(TokenRewriter::with_default_factory(drop_every_token));
    let result = parse("foo = 1\nbar(2, 3)\n", options).expect("parse");
    assert!(result.tokens.is_empty());
    assert!(result.ast.children().is_empty());
    assert!(result.diagnostics.is_empty());
}

#[test]
fn rewriter_set_action_updates_lex_state_after() {
    let options = ParserOptions::default()
        .with_token_rewriter(TokenRewriter::with_default_factory(keep_and_set_seven));
    let result = parse("foo = 1\nbar baz\n", options).expect("parse");
    assert!(!result.tokens.is_empty());
    assert!(result.tokens.iter().all(|token| token.lex_state_after() == 7));
}

#[test]
fn rewriter_replacement_reaches_the_tree() {
    let options =
        ParserOptions::default().with_token_rewriter(TokenRewriter::with_default_factory(rename_foo));
    let result = parse("foo = 1\n", options).expect("parse");
    assert_eq!(result.tokens[0].to_string_lossy(), "bar");
    assert_eq!(
        result.ast.children()[0].kind(),
        &NodeKind::Lvasgn {
            name: "bar".to_string()
        }
    );
}

fn assert_spans_ordered(root: &Node) -> usize {
    let mut stack = vec![root];
    let mut seen = 0;
    while let Some(node) = stack.pop() {
        let loc = node.loc();
        assert!(loc.begin <= loc.end, "{} has {:?}", node.str_type(), loc);
        seen += 1;
        stack.extend(node.children().iter());
    }
    seen
}

#[test]
fn replaced_token_with_factory_location_keeps_spans_ordered() {
    let options = ParserOptions::default()
        .with_token_rewriter(TokenRewriter::with_default_factory(y_to_unplaced_z));
    let source = "1\nputs y\nx = 1\nx.y\ndef f\n  y\nend\n(y\n";
    let result = parse(source, options).expect("parse");

    assert!(assert_spans_ordered(&result.ast) > 8);
    let statements = result.ast.children();
    assert_eq!(
        statements[1].inspect(),
        "(send nil :puts\n  (send nil :z))"
    );
    assert_eq!(statements[1].loc(), &Loc::new(2, 6));
    assert_eq!(statements[3].loc(), &Loc::new(15, 16));
    assert_eq!(statements[5].str_type(), "begin");
    assert_eq!(statements[5].loc(), &Loc::new(33, 34));
    assert!(result.tokens.iter().any(|token| token.loc() == &Loc::new(0, 0)));
    assert_eq!(result.render_diagnostics().len(), result.diagnostics.len());
}

#[test]
fn rewriter_never_sees_end_of_input() {
    let options =
        ParserOptions::default().with_token_rewriter(TokenRewriter::with_default_factory(count_tokens));
    let result = parse("a + b", options).expect("parse");
    assert_eq!(SEEN_TOKENS.load(Ordering::SeqCst), 3);
    assert_eq!(result.tokens.len(), 3);
}

#[test]
fn decoder_error_aborts_the_parse() {
    let options = ParserOptions::default().with_decoder(Decoder::new(reject_as_shift_jis));
    let err = parse(vec![0xFF, 0xFE], options).expect_err("decoder error");
    match err {
        InputError::UnsupportedEncoding(name) => assert_eq!(name, "shift_jis"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn declared_encoding_goes_through_decoder() {
    let options = ParserOptions::default().with_decoder(Decoder::new(upcase_decoder));
    let result = parse("# coding: US-ASCII\nFOO\n", options).expect("parse");
    assert_eq!(DECODER_CALLS.load(Ordering::SeqCst), 1);
    assert_eq!(result.input.as_bytes(), b"# coding: us-ascii\nfoo\n");
    assert_eq!(result.magic_comments.len(), 1);
    assert_eq!(result.magic_comments[0].kind, MagicCommentKind::Encoding);
}

#[test]
fn declared_encoding_without_decoder_is_unsupported() {
    let err = parse("# encoding: euc-jp\n1\n", ParserOptions::default()).expect_err("error");
    assert_eq!(err, InputError::unsupported_encoding("euc-jp"));
}

#[test]
fn invalid_utf8_without_decoder_is_lexed_as_is() {
    let result = parse(vec![b'x', 0xE9, b'\n'], ParserOptions::default()).expect("parse");
    assert_eq!(result.tokens[0].token_value().as_raw(), &[b'x', 0xE9]);
}

#[test]
fn inline_comment_location() {
    let result = parse("a # comment\n", ParserOptions::default()).expect("parse");
    assert_eq!(result.comments.len(), 1);
    assert_eq!(result.comments[0].location, Loc::new(2, 11));
    assert_eq!(result.comments[0].kind, CommentType::Inline);
}

#[test]
fn encoding_magic_comment_locations() {
    let result = parse("# encoding: utf-8\n", ParserOptions::default()).expect("parse");
    assert_eq!(result.magic_comments.len(), 1);
    let magic = &result.magic_comments[0];
    assert_eq!(magic.kind, MagicCommentKind::Encoding);
    assert_eq!(magic.key_l, Loc::new(2, 10));
    assert_eq!(magic.value_l, Loc::new(12, 17));
}

#[test]
fn def_without_name_is_diagnosed_and_well_formed() {
    let result = parse("def\nend", ParserOptions::default()).expect("parse");
    let errors: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|diagnostic| diagnostic.level() == ErrorLevel::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message(), &DiagnosticMessage::MissingMethodName);

    let def = &result.ast.children()[0];
    assert_eq!(def.kind(), &NodeKind::Def { name: None });
    assert_eq!(def.loc(), &Loc::new(0, 7));
    assert_eq!(result.ast.inspect(), "(begin\n  (def nil\n    (args)))");
}

#[test]
fn def_with_params_and_body() {
    let source = "def add(a, b)\n  a + b\nend\nadd 1, 2\n";
    let result = parse(source, ParserOptions::default()).expect("parse");
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    assert_eq!(
        result.ast.inspect(),
        "(begin\n  (def :add\n    (args\n      (arg :a)\n      (arg :b))\n    (send\n      (lvar :a) :+\n      (lvar :b)))\n  (send nil :add\n    (int 1)\n    (int 2)))"
    );
}

#[test]
fn locals_do_not_leak_out_of_def() {
    let result = parse("def f(x)\n  x\nend\nx\n", ParserOptions::default()).expect("parse");
    let last = &result.ast.children()[1];
    assert_eq!(
        last.kind(),
        &NodeKind::Send {
            method: "x".to_string(),
            has_receiver: false
        }
    );
}

#[test]
fn operators_follow_precedence() {
    let result = parse("x = 1 + 2 * -3", ParserOptions::default()).expect("parse");
    assert_eq!(
        result.ast.inspect(),
        "(begin\n  (lvasgn :x\n    (send\n      (int 1) :+\n      (send\n        (int 2) :*\n        (int -3)))))"
    );
}

#[test]
fn method_chain_with_receiver() {
    let result = parse("Foo.new(1).bar", ParserOptions::default()).expect("parse");
    assert_eq!(
        result.ast.inspect(),
        "(begin\n  (send\n    (send\n      (const nil :Foo) :new\n      (int 1)) :bar))"
    );
    assert_eq!(result.ast.children()[0].loc(), &Loc::new(0, 14));
}

#[test]
fn recovery_continues_after_bad_statement() {
    let result = parse("x = )\ny = 2\n", ParserOptions::default()).expect("parse");
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(
        result.diagnostics[0].message(),
        &DiagnosticMessage::UnexpectedToken {
            token_name: "tRPAREN".to_string()
        }
    );
    let kinds: Vec<&str> = result.ast.children().iter().map(|node| node.str_type()).collect();
    assert_eq!(kinds, vec!["lvasgn", "lvasgn"]);
}

#[test]
fn missing_end_is_expected_token() {
    let result = parse("def f\n  1\n", ParserOptions::default()).expect("parse");
    assert_eq!(
        result.diagnostics[0].message(),
        &DiagnosticMessage::ExpectedToken {
            expected: "kEND".to_string(),
            found: "END_OF_INPUT".to_string()
        }
    );
}

#[test]
fn diagnostics_are_ordered_by_location() {
    let result = parse("a $ b\n\"open", ParserOptions::default()).expect("parse");
    let begins: Vec<u64> = result
        .diagnostics
        .iter()
        .map(|diagnostic| diagnostic.loc().begin)
        .collect();
    let mut sorted = begins.clone();
    sorted.sort();
    assert_eq!(begins, sorted);
    assert!(result.diagnostics.len() >= 2);
}

#[test]
fn rendered_diagnostic_uses_buffer_name() {
    let options = ParserOptions::default().with_buffer_name("demo.rb");
    let result = parse("def\nend", options).expect("parse");
    let rendered = result.render_diagnostics();
    assert_eq!(
        rendered,
        vec!["demo.rb:2:1: error: expected a method name\ndemo.rb:2: end\ndemo.rb:2: ^~~".to_string()]
    );
}

#[test]
fn nesting_too_deep_is_reported_once() {
    let handle = std::thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(|| {
            let source = format!("{}1{}", "(".repeat(400), ")".repeat(400));
            let result = parse(source, ParserOptions::default()).expect("parse");
            let messages: Vec<DiagnosticMessage> = result
                .diagnostics
                .iter()
                .map(|diagnostic| diagnostic.message().clone())
                .collect();
            assert_eq!(messages, vec![DiagnosticMessage::NestingTooDeep]);
            assert_eq!(result.ast.str_type(), "begin");
        })
        .expect("spawn");
    handle.join().expect("join");
}

#[test]
fn token_types_cover_the_statement() {
    let result = parse("puts 'hi'; nil", ParserOptions::default()).expect("parse");
    let kinds: Vec<u32> = result.tokens.iter().map(Token::token_type).collect();
    assert_eq!(
        kinds,
        vec![
            token_type::T_IDENTIFIER,
            token_type::T_STRING,
            token_type::T_SEMI,
            token_type::K_NIL,
        ]
    );
    assert_eq!(format!("{:?}", result.tokens[1]), "[tSTRING, \"hi\", 5...9]");
}
