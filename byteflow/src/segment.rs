// SPDX-License-Identifier: Apache-2.0

//! Fixed-capacity, reference-counted byte chunks — the atomic unit of a
//! [`Buffer`](crate::Buffer)'s storage.
//!
//! A segment's backing array lives behind an `Rc<RefCell<_>>` rather than an
//! intrusive, hand-rolled ref count: the crate never crosses a thread boundary
//! with a single segment (buffers are not `Send`), so there's nothing to gain
//! from `Arc`, and `RefCell` gives us borrow checking for the one invariant that
//! actually matters here (a shared segment's owner may still extend it while a
//! non-owner reads) for free.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use all_asserts::assert_le;

/// The default segment capacity, 8 KiB. Production pools and buffers use this
/// unless configured otherwise; tests use much smaller sizes to exercise
/// cross-segment behavior cheaply (see `tests/buffer.rs`).
pub const SEGMENT_SIZE: usize = 8192;

/// The default minimum byte count at which [`Segment::split`] prefers an O(1)
/// shared copy over an O(n) copy into a fresh segment.
pub const SHARE_MINIMUM: usize = SEGMENT_SIZE / 8;

type Backing = Rc<RefCell<Box<[u8]>>>;

/// A fixed-capacity byte chunk with independent read (`pos`) and write (`limit`)
/// cursors.
///
/// Multiple `Segment` instances may reference the same backing array (see
/// [`Segment::shared_copy`]); only the designated *owner* instance may extend
/// `limit` to append new bytes. `pos` is always per-instance, since advancing a
/// read cursor never mutates shared data.
pub struct Segment {
	data: Backing,
	pos: usize,
	limit: usize,
	shared: bool,
	owner: bool,
}

impl Segment {
	/// Creates a fresh, owned, empty segment with the given capacity.
	pub(crate) fn new(capacity: usize) -> Self {
		Self {
			data: Rc::new(RefCell::new(vec![0; capacity].into_boxed_slice())),
			pos: 0,
			limit: 0,
			shared: false,
			owner: true,
		}
	}

	pub fn capacity(&self) -> usize { self.data.borrow().len() }
	pub fn pos(&self) -> usize { self.pos }
	pub fn limit(&self) -> usize { self.limit }
	/// The number of readable bytes, `limit - pos`.
	pub fn size(&self) -> usize { self.limit - self.pos }
	pub fn is_empty(&self) -> bool { self.pos == self.limit }
	/// The number of bytes the owner may still append.
	pub fn remaining_capacity(&self) -> usize { self.capacity() - self.limit }
	pub fn is_full(&self) -> bool { self.remaining_capacity() == 0 }
	pub fn is_shared(&self) -> bool { self.shared }
	pub fn is_owner(&self) -> bool { self.owner }

	/// Returns a read-only view of the bytes backing this instance specifically —
	/// not the whole underlying array, only `[pos, limit)`.
	pub fn readable(&self) -> Ref<'_, [u8]> {
		Ref::map(self.data.borrow(), |d| &d[self.pos..self.limit])
	}

	/// Returns the byte at position `i` relative to `pos`. Panics if `i >= size()`.
	pub fn get(&self, i: usize) -> u8 {
		assert!(i < self.size(), "segment index {i} out of bounds (size {})", self.size());
		self.data.borrow()[self.pos + i]
	}

	/// Discards `n` bytes from the front of the readable region. Valid for any
	/// holder, shared or not — advancing one's own `pos` never mutates the
	/// backing array.
	pub fn consume(&mut self, n: usize) {
		assert_le!(n, self.size());
		self.pos += n;
	}

	/// Returns a new segment sharing this instance's backing array: `shared =
	/// true`, `owner = false`, with its own copy of the current `pos`/`limit`.
	/// Marks `self` shared too, since the array now has more than one holder.
	///
	/// The `shared` flag is one-way by design: even after the returned copy
	/// is dropped, `self` stays marked shared. This trades a small amount of
	/// permanently-forgone sharing-only-in-hindsight for never having to reason
	/// about whether some other dropped handle might still be observing the array.
	pub fn shared_copy(&mut self) -> Self {
		self.shared = true;
		Self {
			data: Rc::clone(&self.data),
			pos: self.pos,
			limit: self.limit,
			shared: true,
			owner: false,
		}
	}

	/// Returns a new segment with a freshly copied backing array: `owner = true`,
	/// `shared = false`.
	pub fn unshared_copy(&self) -> Self {
		let data = self.data.borrow();
		Self {
			data: Rc::new(RefCell::new(data.clone())),
			pos: self.pos,
			limit: self.limit,
			shared: false,
			owner: true,
		}
	}

	/// Removes the first `n` bytes of readable data into a new segment, leaving
	/// the rest in `self`. Requires `self` to be the owner and `0 < n <= size()`.
	/// Prefers an O(1) shared copy when `n` is large enough to be worth avoiding
	/// the copy; otherwise copies into a segment taken from `take_empty`.
	pub fn split(&mut self, n: usize, share_minimum: usize, take_empty: impl FnOnce() -> Self) -> Self {
		assert!(self.owner, "only the owning segment may be split");
		all_asserts::assert_range!(1..=self.size(), n);

		if n >= share_minimum {
			let mut prefix = self.shared_copy();
			prefix.limit = prefix.pos + n;
			self.pos += n;
			prefix
		} else {
			let mut prefix = take_empty();
			let written = prefix.push_slice(&self.readable()[..n]);
			debug_assert_eq!(written, n, "a freshly taken segment should fit the split prefix");
			self.pos += n;
			prefix
		}
	}

	/// If `self` is the owner and has room for `prev`'s bytes after an optional
	/// in-place compaction, moves `self`'s bytes onto `prev`'s tail and returns
	/// the count moved (leaving `self` empty so it can be recycled). Returns `0`
	/// and changes nothing if the move isn't possible.
	pub fn compact_into(&mut self, prev: &mut Segment) -> usize {
		if !prev.owner { return 0 }
		let n = self.size();
		if n == 0 { return 0 }

		let free = if prev.shared {
			prev.remaining_capacity()
		} else {
			prev.capacity() - prev.size()
		};
		if n > free { return 0 }

		if !prev.shared && prev.pos > 0 {
			prev.shift_to_front();
		}

		{
			let src = self.data.borrow();
			let mut dst = prev.data.borrow_mut();
			dst[prev.limit..prev.limit + n].copy_from_slice(&src[self.pos..self.limit]);
		}
		prev.limit += n;
		self.pos = self.limit;
		n
	}

	/// Moves the readable region to the front of the backing array (`pos = 0`),
	/// reclaiming already-read space. Only safe on a non-shared segment: shifting
	/// would silently corrupt the view of any other holder of the same array.
	fn shift_to_front(&mut self) {
		debug_assert!(!self.shared, "cannot shift a shared segment's backing array");
		if self.pos == 0 { return }
		let n = self.size();
		self.data.borrow_mut().copy_within(self.pos..self.limit, 0);
		self.pos = 0;
		self.limit = n;
	}

	/// Appends `n` bytes from `self`'s readable region onto `other`'s tail,
	/// shifting `other` first if needed and possible. `other` must be the owner.
	/// Advances `self.pos` and `other.limit` by `n`.
	pub fn write_to(&mut self, other: &mut Segment, n: usize) {
		assert!(other.owner, "only the owning segment may be written to");
		assert_le!(n, self.size());

		if other.remaining_capacity() < n {
			assert!(!other.shared, "shared segment has no room to grow");
			other.shift_to_front();
			assert_le!(n, other.remaining_capacity());
		}

		{
			let src = self.data.borrow();
			let mut dst = other.data.borrow_mut();
			dst[other.limit..other.limit + n].copy_from_slice(&src[self.pos..self.pos + n]);
		}
		self.pos += n;
		other.limit += n;
	}

	/// Appends as many bytes of `bytes` as fit in the remaining capacity, without
	/// requiring the full slice to fit. Returns the number of bytes written.
	/// Caller must be the owner.
	pub fn push_slice(&mut self, bytes: &[u8]) -> usize {
		assert!(self.owner, "only the owning segment may be written to");
		let n = bytes.len().min(self.remaining_capacity());
		self.data.borrow_mut()[self.limit..self.limit + n].copy_from_slice(&bytes[..n]);
		self.limit += n;
		n
	}

	/// Appends the entire slice. Panics if it doesn't fit; callers are expected to
	/// have checked `remaining_capacity` first (used by the primitive codec's
	/// fixed-width fast path).
	pub fn push_slice_exact(&mut self, bytes: &[u8]) {
		let n = self.push_slice(bytes);
		assert_eq!(n, bytes.len(), "segment had insufficient capacity for an exact write");
	}

	/// Reads as many bytes into `dst` as are available, returning the count.
	pub fn pop_into_slice(&mut self, dst: &mut [u8]) -> usize {
		let n = dst.len().min(self.size());
		dst[..n].copy_from_slice(&self.data.borrow()[self.pos..self.pos + n]);
		self.pos += n;
		n
	}

	pub fn read_u8(&mut self) -> u8 {
		let b = self.get(0);
		self.pos += 1;
		b
	}

	pub fn write_u8(&mut self, value: u8) { self.push_slice_exact(&[value]); }

	/// Resets this segment to the empty, owned state expected when taken fresh
	/// from a pool: `pos = limit = 0`, `owner = true`. Does not clear `shared` —
	/// recycling a shared segment is refused by the pool before this ever runs.
	pub(crate) fn reset_for_pool(&mut self) {
		self.pos = 0;
		self.limit = 0;
		self.owner = true;
	}
}

impl fmt::Debug for Segment {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Segment")
			.field("pos", &self.pos)
			.field("limit", &self.limit)
			.field("capacity", &self.capacity())
			.field("shared", &self.shared)
			.field("owner", &self.owner)
			.finish()
	}
}

macro_rules! gen_int_rw {
    ($($read:ident $write:ident -> $ty:ident, $read_le:ident $write_le:ident)+) => {
		impl Segment {
			$(
			#[doc = concat!(" Reads a big-endian `", stringify!($ty), "` at `pos`, advancing it.")]
			pub fn $read(&mut self) -> $ty {
				let width = std::mem::size_of::<$ty>();
				let bytes: [u8; std::mem::size_of::<$ty>()] =
					self.readable()[..width].try_into().unwrap();
				self.pos += width;
				$ty::from_be_bytes(bytes)
			}

			#[doc = concat!(" Reads a little-endian `", stringify!($ty), "` at `pos`, advancing it.")]
			pub fn $read_le(&mut self) -> $ty {
				let width = std::mem::size_of::<$ty>();
				let bytes: [u8; std::mem::size_of::<$ty>()] =
					self.readable()[..width].try_into().unwrap();
				self.pos += width;
				$ty::from_le_bytes(bytes)
			}

			#[doc = concat!(" Writes a big-endian `", stringify!($ty), "` at `limit`, advancing it.")]
			pub fn $write(&mut self, value: $ty) {
				self.push_slice_exact(&value.to_be_bytes());
			}

			#[doc = concat!(" Writes a little-endian `", stringify!($ty), "` at `limit`, advancing it.")]
			pub fn $write_le(&mut self, value: $ty) {
				self.push_slice_exact(&value.to_le_bytes());
			}
			)+
		}
	};
}

gen_int_rw! {
	read_u16 write_u16 -> u16, read_u16_le write_u16_le
	read_i16 write_i16 -> i16, read_i16_le write_i16_le
	read_u32 write_u32 -> u32, read_u32_le write_u32_le
	read_i32 write_i32 -> i32, read_i32_le write_i32_le
	read_u64 write_u64 -> u64, read_u64_le write_u64_le
	read_i64 write_i64 -> i64, read_i64_le write_i64_le
}

impl Segment {
	pub fn read_f32(&mut self) -> f32 { f32::from_bits(self.read_u32()) }
	pub fn read_f32_le(&mut self) -> f32 { f32::from_bits(self.read_u32_le()) }
	pub fn write_f32(&mut self, value: f32) { self.write_u32(value.to_bits()) }
	pub fn write_f32_le(&mut self, value: f32) { self.write_u32_le(value.to_bits()) }

	pub fn read_f64(&mut self) -> f64 { f64::from_bits(self.read_u64()) }
	pub fn read_f64_le(&mut self) -> f64 { f64::from_bits(self.read_u64_le()) }
	pub fn write_f64(&mut self, value: f64) { self.write_u64(value.to_bits()) }
	pub fn write_f64_le(&mut self, value: f64) { self.write_u64_le(value.to_bits()) }
}

#[allow(dead_code)]
fn assert_send_sync_not_implemented() {
	// Segments are intentionally !Send and !Sync (Rc<RefCell<_>>); this is a
	// documentation anchor, not a real check.
}
