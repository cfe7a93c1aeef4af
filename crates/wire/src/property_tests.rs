// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Property tests: framing is independent of chunk boundaries, and decoding
//! never panics on arbitrary input.

use proptest::prelude::*;

use super::*;

const MAX: usize = 24;

fn frame(chunks: &[&[u8]]) -> (Vec<String>, FramerStats) {
    let mut framer = LineFramer::with_max_line(MAX);
    let mut out = Vec::new();
    for chunk in chunks {
        framer.push(chunk);
        out.extend(framer.lines());
    }
    (out, framer.stats())
}

fn stream() -> impl Strategy<Value = Vec<u8>> {
    // Mix of short lines, blank lines, and lines well past the bound.
    let line = prop_oneof![
        "[a-z{}\":,0-9 ]{0,20}",
        Just(String::new()),
        "[a-z]{30,60}",
        Just("{\"event\":\"log\",\"data\":{}}".to_string()),
    ];
    proptest::collection::vec(line, 0..20).prop_map(|lines| {
        let mut bytes = Vec::new();
        for line in lines {
            bytes.extend_from_slice(line.as_bytes());
            bytes.push(b'\n');
        }
        bytes
    })
}

proptest! {
    #[test]
    fn framing_is_chunk_boundary_independent(
        bytes in stream(),
        cuts in proptest::collection::vec(any::<prop::sample::Index>(), 0..12),
    ) {
        let whole = frame(&[bytes.as_slice()]);

        let mut points: Vec<usize> = cuts.iter().map(|i| i.index(bytes.len() + 1)).collect();
        points.sort_unstable();
        points.dedup();
        let mut chunks: Vec<&[u8]> = Vec::new();
        let mut last = 0;
        for p in points {
            chunks.push(&bytes[last..p]);
            last = p;
        }
        chunks.push(&bytes[last..]);

        prop_assert_eq!(frame(&chunks), whole);
    }

    #[test]
    fn byte_at_a_time_matches_whole(bytes in stream()) {
        let singles: Vec<&[u8]> = bytes.chunks(1).collect();
        prop_assert_eq!(frame(&singles), frame(&[bytes.as_slice()]));
    }

    #[test]
    fn decode_never_panics(line in "\\PC{0,80}") {
        let _ = decode(&line);
    }
}
