// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn collect(framer: &mut LineFramer) -> Vec<String> {
    framer.lines().collect()
}

#[test]
fn line_is_not_emitted_before_its_terminator() {
    let mut framer = LineFramer::new();
    framer.push(b"{\"event\":\"log\"");
    assert_eq!(framer.next_line(), None);
    assert!(!framer.has_complete_line());

    framer.push(b",\"data\":{}}\n");
    assert_eq!(framer.next_line().as_deref(), Some("{\"event\":\"log\",\"data\":{}}"));
    assert_eq!(framer.next_line(), None);
}

#[test]
fn multiple_lines_in_one_chunk() {
    let mut framer = LineFramer::new();
    framer.push(b"a\nb\nc");
    assert_eq!(collect(&mut framer), vec!["a", "b"]);

    framer.push(b"\n");
    assert_eq!(collect(&mut framer), vec!["c"]);
}

#[test]
fn trailing_whitespace_is_trimmed_and_blank_lines_skipped() {
    let mut framer = LineFramer::new();
    framer.push(b"one \r\n\n   \r\n two\t\n");
    assert_eq!(collect(&mut framer), vec!["one", " two"]);
}

#[test]
fn oversized_complete_line_is_dropped_and_next_line_survives() {
    let mut framer = LineFramer::with_max_line(8);
    framer.push(b"0123456789\nok\n");
    assert_eq!(collect(&mut framer), vec!["ok"]);
    assert_eq!(framer.stats().oversized, 1);
    assert_eq!(framer.stats().lines, 1);
}

#[test]
fn line_at_the_bound_is_kept() {
    let mut framer = LineFramer::with_max_line(8);
    framer.push(b"01234567\n");
    assert_eq!(collect(&mut framer), vec!["01234567"]);
}

#[test]
fn oversized_tail_is_discarded_before_its_terminator() {
    let mut framer = LineFramer::with_max_line(8);
    framer.push(b"keep\n0123456789");
    // The complete line stays, the runaway tail is gone already.
    assert!(framer.buffered() <= "keep\n".len());

    framer.push(b"more garbage without newline");
    assert!(framer.buffered() <= "keep\n".len());

    framer.push(b"end\nnext\n");
    assert_eq!(collect(&mut framer), vec!["keep", "next"]);
    assert_eq!(framer.stats().oversized, 1);
}

#[test]
fn buffer_stays_bounded_under_endless_line() {
    let mut framer = LineFramer::with_max_line(1024);
    let chunk = vec![b'x'; 512];
    for _ in 0..100 {
        framer.push(&chunk);
        assert!(framer.buffered() <= 1024 + 512);
    }
    assert_eq!(framer.next_line(), None);
}

#[test]
fn invalid_utf8_line_is_dropped() {
    let mut framer = LineFramer::new();
    framer.push(b"\xff\xfe\nfine\n");
    assert_eq!(collect(&mut framer), vec!["fine"]);
    assert_eq!(framer.stats().invalid_utf8, 1);
}

#[test]
fn lines_iterator_is_restartable() {
    let mut framer = LineFramer::new();
    framer.push(b"1\n2\n3\n");

    let first: Vec<String> = framer.lines().take(2).collect();
    assert_eq!(first, vec!["1", "2"]);
    assert!(framer.has_complete_line());

    assert_eq!(collect(&mut framer), vec!["3"]);
    assert!(!framer.has_complete_line());
}

#[test]
fn reset_forgets_partial_input() {
    let mut framer = LineFramer::new();
    framer.push(b"half a line");
    framer.reset();
    framer.push(b"fresh\n");
    assert_eq!(collect(&mut framer), vec!["fresh"]);
}

#[test]
fn consumed_bytes_are_reclaimed_on_next_push() {
    let mut framer = LineFramer::new();
    framer.push(b"aaaa\nbb");
    assert_eq!(collect(&mut framer), vec!["aaaa"]);
    framer.push(b"b\n");
    assert_eq!(framer.buffered(), "bbb\n".len());
}
