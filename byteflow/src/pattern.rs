// SPDX-License-Identifier: Apache-2.0

//! A small [`Pattern`] trait unifying single-byte and multi-byte searches
//! behind one [`Buffer::index_of`] entry point, instead of two unrelated
//! methods for "find a byte" and "find a needle".

use itertools::FoldWhile::{Continue, Done};
use itertools::Itertools;

use crate::buffer::Buffer;

/// Something [`Buffer::index_of`] knows how to search for.
pub trait Pattern {
	/// Returns the first absolute offset at or after `start` where this pattern
	/// matches, or `None`.
	fn find_in(&self, buf: &Buffer, start: usize) -> Option<usize>;
}

impl Pattern for u8 {
	fn find_in(&self, buf: &Buffer, start: usize) -> Option<usize> {
		buf.index_of_byte(*self, start, None)
	}
}

impl Pattern for &[u8] {
	fn find_in(&self, buf: &Buffer, start: usize) -> Option<usize> {
		buf.index_of_bytes(self, start)
	}
}

impl<const N: usize> Pattern for &[u8; N] {
	fn find_in(&self, buf: &Buffer, start: usize) -> Option<usize> {
		buf.index_of_bytes(self.as_slice(), start)
	}
}

/// A set of candidate patterns: matches at the earliest offset any one of them
/// matches, short-circuiting as soon as a candidate hits `start` itself (no
/// later-scanned candidate could beat that).
pub struct AnyOf<'a, P>(pub &'a [P]);

impl<P: Pattern> Pattern for AnyOf<'_, P> {
	fn find_in(&self, buf: &Buffer, start: usize) -> Option<usize> {
		self.0.iter()
			.filter_map(|p| p.find_in(buf, start))
			.fold_while(None, |best: Option<usize>, idx| {
				let next = Some(best.map_or(idx, |b| b.min(idx)));
				if next == Some(start) { Done(next) } else { Continue(next) }
			})
			.into_inner()
	}
}

impl Buffer {
	/// Finds the first occurrence of `pattern` at or after `start`.
	///
	/// ```ignore
	/// buf.index_of(b'\n', 0);
	/// buf.index_of(b"\r\n".as_slice(), 0);
	/// ```
	pub fn index_of<P: Pattern>(&self, pattern: P, start: usize) -> Option<usize> {
		pattern.find_in(self, start)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::buffer::BufferOptions;

	#[test]
	fn byte_pattern() {
		let mut b = Buffer::with_options(BufferOptions::small(4));
		b.write_slice(b"abc\ndef");
		assert_eq!(b.index_of(b'\n', 0), Some(3));
	}

	#[test]
	fn slice_pattern() {
		let mut b = Buffer::with_options(BufferOptions::small(4));
		b.write_slice(b"abc\r\ndef");
		assert_eq!(b.index_of(b"\r\n".as_slice(), 0), Some(3));
	}

	#[test]
	fn array_pattern_no_match() {
		let mut b = Buffer::with_options(BufferOptions::small(4));
		b.write_slice(b"abcdef");
		assert_eq!(b.index_of(b"zz", 0), None);
	}

	#[test]
	fn candidate_set_matches_earliest_pattern() {
		let mut b = Buffer::with_options(BufferOptions::small(4));
		b.write_slice(b"abc,def;ghi");
		let candidates: &[&[u8]] = &[b",".as_slice(), b";".as_slice()];
		assert_eq!(b.index_of(AnyOf(candidates), 0), Some(3));
	}
}
