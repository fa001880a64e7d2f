// Heap accounting around a full parse: one release must return every byte the parse allocated.
use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;

use handoff::abi::{hnd_parse, hnd_parser_options_default, hnd_parser_result_free};
use handoff::api::{
    DiagnosticMessage, ErrorLevel, ParserOptions, ParserResult, SharedByteList, parse,
};

struct CountingAlloc;

thread_local! {
    static LIVE_BYTES: Cell<isize> = const { Cell::new(0) };
    static LIVE_BLOCKS: Cell<isize> = const { Cell::new(0) };
}

fn track(bytes: isize, blocks: isize) {
    let _ = LIVE_BYTES.try_with(|live| live.set(live.get() + bytes));
    let _ = LIVE_BLOCKS.try_with(|live| live.set(live.get() + blocks));
}

// Counts only the calling thread, so parallel tests do not disturb each other.
unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            track(layout.size() as isize, 1);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        track(-(layout.size() as isize), -1);
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            track(new_size as isize - layout.size() as isize, 0);
        }
        new_ptr
    }
}

#[global_allocator]
static GLOBAL: CountingAlloc = CountingAlloc;

fn live() -> (isize, isize) {
    (
        LIVE_BYTES.with(Cell::get),
        LIVE_BLOCKS.with(Cell::get),
    )
}

// Exercises token values, comments, magic comments, the line table and
// diagnostics whose messages own strings.
const SOURCE: &str = "# frozen_string_literal: true\n\
def greet(name)\n  name + 'hi' # trailing\nend\n\
=begin\ndoc\n=end\n\
x = )\ngreet x\n\"open";

fn check_contents(result: &ParserResult) {
    assert!(result.tokens.len() > 10);
    assert!(result.input.lines.len() > 5);
    assert_eq!(result.comments.len(), 3);
    assert_eq!(result.magic_comments.len(), 1);
    assert!(result.diagnostics.iter().any(|diagnostic| matches!(
        diagnostic.message(),
        DiagnosticMessage::UnexpectedToken { .. }
    )));
    assert!(
        result
            .diagnostics
            .iter()
            .all(|diagnostic| diagnostic.level() == ErrorLevel::Error)
    );
}

fn warm_up() {
    parse(SOURCE, ParserOptions::default())
        .expect("parse")
        .release();
}

#[test]
fn parser_result_release_returns_every_allocation() {
    warm_up();
    let baseline = live();

    let result = parse(SOURCE, ParserOptions::default()).expect("parse");
    check_contents(&result);
    let (bytes, blocks) = live();
    assert!(bytes > baseline.0 && blocks > baseline.1);

    result.release();
    assert_eq!(live(), baseline);
}

#[test]
fn boxed_result_freed_through_c_returns_every_allocation() {
    warm_up();
    let baseline = live();

    let outcome = hnd_parse(
        SharedByteList::from(SOURCE.as_bytes()),
        hnd_parser_options_default(),
    );
    let result = Box::into_raw(outcome.into_result().expect("parse"));
    check_contents(unsafe { &*result });
    assert!(live().0 > baseline.0);

    hnd_parser_result_free(result);
    assert_eq!(live(), baseline);
}

#[test]
fn releasing_fields_separately_also_balances() {
    warm_up();
    let baseline = live();

    let ParserResult {
        ast,
        tokens,
        diagnostics,
        comments,
        magic_comments,
        input,
    } = parse(SOURCE, ParserOptions::default()).expect("parse");
    assert!(ast.release() > 5);
    assert!(tokens.release() > 10);
    assert!(diagnostics.release() >= 2);
    comments.release();
    magic_comments.release();
    drop(input);
    assert_eq!(live(), baseline);
}
