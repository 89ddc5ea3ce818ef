// SPDX-License-Identifier: Apache-2.0

use byteflow::{AnyOf, Buffer, BufferOptions};

fn small() -> Buffer { Buffer::with_options(BufferOptions::small(4)) }

#[test]
fn byte_search_crosses_several_segments() {
	let mut buf = small();
	buf.write_slice(b"aaaaaaaaaaaaZ");
	assert_eq!(buf.index_of(b'Z', 0), Some(12));
}

#[test]
fn needle_search_crosses_a_segment_boundary() {
	let mut buf = small();
	buf.write_slice(b"aaabbbcccSPLITxyz");
	assert_eq!(buf.index_of(b"SPLIT".as_slice(), 0), Some(9));
}

#[test]
fn needle_search_respects_start_offset() {
	let mut buf = small();
	buf.write_slice(b"xx--xx--xx");
	assert_eq!(buf.index_of(b"--".as_slice(), 5), Some(6));
}

#[test]
fn candidate_set_finds_whichever_delimiter_comes_first() {
	let mut buf = small();
	buf.write_slice(b"key=value;next=other");
	let delimiters: &[&[u8]] = &[b"=".as_slice(), b";".as_slice()];
	assert_eq!(buf.index_of(AnyOf(delimiters), 0), Some(3));
	assert_eq!(buf.index_of(AnyOf(delimiters), 4), Some(9));
}

#[test]
fn no_match_returns_none() {
	let mut buf = small();
	buf.write_slice(b"abcdefghijklmnop");
	assert_eq!(buf.index_of(b"zzz".as_slice(), 0), None);
}
