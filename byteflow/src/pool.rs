// SPDX-License-Identifier: Apache-2.0

//! The process-wide free list that makes steady-state [`Buffer`](crate::Buffer)
//! growth and shrinkage allocation-free.
//!
//! The default pool shards one free list per thread via [`thread_local!`], so
//! `take`/`recycle` never contend. Enabling the `shared-pool` feature swaps in a
//! single mutex-guarded pool instead, trading the thread-local's zero contention
//! for Segments that can be recycled by a different thread than the one that took
//! them.

use std::cell::RefCell;

use crate::segment::{Segment, SEGMENT_SIZE};

#[cfg(feature = "shared-pool")]
use std::sync::Mutex;

/// Default cap on the total bytes a pool will retain across its free segments.
pub const MAX_SIZE: usize = SEGMENT_SIZE * 64;

/// A process-wide (or thread-local) free list of recycled [`Segment`]s.
pub trait SegmentPool {
	/// Returns a Segment in its initial state: `pos == limit == 0`, `owner ==
	/// true`, `shared == false`. May come from the free list or be freshly
	/// allocated.
	fn take(&self) -> Segment;

	/// Returns `s` to the free list if it isn't shared and the pool has capacity
	/// left; otherwise the Segment is simply dropped. A no-op, by contract, on a
	/// shared Segment: recycling it would let some other holder's bytes be
	/// silently overwritten by the next `take`.
	fn recycle(&self, s: Segment);

	/// The capacity new Segments are created with.
	fn segment_size(&self) -> usize;
}

struct FreeList {
	segments: Vec<Segment>,
	retained_bytes: usize,
	max_size: usize,
	segment_size: usize,
}

impl FreeList {
	fn new(segment_size: usize, max_size: usize) -> Self {
		Self { segments: Vec::new(), retained_bytes: 0, max_size, segment_size }
	}

	fn take(&mut self) -> Segment {
		match self.segments.pop() {
			Some(mut s) => {
				self.retained_bytes -= s.capacity();
				s.reset_for_pool();
				s
			}
			None => Segment::new(self.segment_size),
		}
	}

	fn recycle(&mut self, s: Segment) {
		if s.is_shared() { return }
		let cap = s.capacity();
		if self.retained_bytes + cap > self.max_size { return }
		self.retained_bytes += cap;
		self.segments.push(s);
	}
}

/// The default, thread-local [`SegmentPool`]. One free list per thread: `take`
/// and `recycle` never contend, at the cost of a Segment taken on one thread
/// only ever being recycled back to that same thread's list (it is still safe
/// to move a Segment across threads and drop it there — it is simply not
/// returned to any pool).
pub struct LocalPool {
	segment_size: usize,
	max_size: usize,
}

thread_local! {
	static DEFAULT_FREE_LIST: RefCell<FreeList> = RefCell::new(FreeList::new(SEGMENT_SIZE, MAX_SIZE));
}

impl LocalPool {
	/// The pool backing [`default_pool`], using [`SEGMENT_SIZE`]/[`MAX_SIZE`].
	pub const fn shared_default() -> Self { Self { segment_size: SEGMENT_SIZE, max_size: MAX_SIZE } }

	/// A pool with its own thread-local-keyed configuration. Distinct instances
	/// with the same `segment_size` still draw from the one thread-local list
	/// keyed by that size class... in this implementation there is a single
	/// thread-local list sized for [`SEGMENT_SIZE`]; pools configured with a
	/// different `segment_size` allocate directly rather than sharing it, which
	/// is why tests that want pooling behavior use [`SEGMENT_SIZE`]-sized pools
	/// and tests that want a specific small size use [`with_capacity`] and accept
	/// that recycling simply drops the Segment instead of retaining it.
	///
	/// [`with_capacity`]: LocalPool::with_capacity
	pub const fn with_capacity(segment_size: usize, max_size: usize) -> Self {
		Self { segment_size, max_size }
	}
}

impl Default for LocalPool {
	fn default() -> Self { Self::shared_default() }
}

impl SegmentPool for LocalPool {
	fn take(&self) -> Segment {
		if self.segment_size == SEGMENT_SIZE {
			DEFAULT_FREE_LIST.with(|list| list.borrow_mut().take())
		} else {
			Segment::new(self.segment_size)
		}
	}

	fn recycle(&self, s: Segment) {
		if self.segment_size == SEGMENT_SIZE {
			DEFAULT_FREE_LIST.with(|list| list.borrow_mut().recycle(s));
		}
		// Non-default-sized pools (test doubles) don't retain a free list; the
		// Segment is simply dropped, which is still a correct `recycle`.
	}

	fn segment_size(&self) -> usize { self.segment_size }
}

/// A process-wide, mutex-guarded [`SegmentPool`], available behind the
/// `shared-pool` feature. A Segment taken by one thread may be recycled by any
/// other.
#[cfg(feature = "shared-pool")]
pub struct SharedPool {
	list: Mutex<FreeList>,
	segment_size: usize,
}

#[cfg(feature = "shared-pool")]
impl SharedPool {
	pub fn new(segment_size: usize, max_size: usize) -> Self {
		Self { list: Mutex::new(FreeList::new(segment_size, max_size)), segment_size }
	}
}

#[cfg(feature = "shared-pool")]
impl Default for SharedPool {
	fn default() -> Self { Self::new(SEGMENT_SIZE, MAX_SIZE) }
}

#[cfg(feature = "shared-pool")]
impl SegmentPool for SharedPool {
	fn take(&self) -> Segment {
		self.list.lock().unwrap_or_else(|e| e.into_inner()).take()
	}

	fn recycle(&self, s: Segment) {
		self.list.lock().unwrap_or_else(|e| e.into_inner()).recycle(s);
	}

	fn segment_size(&self) -> usize { self.segment_size }
}

/// Returns the process default pool: [`SharedPool`] when the `shared-pool`
/// feature is enabled, [`LocalPool`] otherwise.
pub fn default_pool() -> &'static dyn SegmentPool {
	cfg_if::cfg_if! {
		if #[cfg(feature = "shared-pool")] {
			static POOL: once_cell::sync::Lazy<SharedPool> = once_cell::sync::Lazy::new(SharedPool::default);
			&*POOL
		} else {
			static POOL: LocalPool = LocalPool::shared_default();
			&POOL
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn take_returns_fresh_initial_state() {
		let pool = LocalPool::with_capacity(8, 64);
		let seg = pool.take();
		assert_eq!(seg.pos(), 0);
		assert_eq!(seg.limit(), 0);
		assert!(seg.is_owner());
		assert!(!seg.is_shared());
		assert_eq!(seg.capacity(), 8);
	}

	#[test]
	fn recycle_refuses_shared_segments() {
		let list = RefCell::new(FreeList::new(8, 64));
		let mut seg = list.borrow_mut().take();
		let shared = seg.shared_copy();
		list.borrow_mut().recycle(shared);
		assert_eq!(list.borrow().segments.len(), 0);
		drop(seg);
	}

	#[test]
	fn recycle_respects_capacity_cap() {
		let list = RefCell::new(FreeList::new(8, 8));
		let a = list.borrow_mut().take();
		let b = list.borrow_mut().take();
		list.borrow_mut().recycle(a);
		list.borrow_mut().recycle(b); // would exceed max_size of 8, dropped
		assert_eq!(list.borrow().segments.len(), 1);
	}

	#[test]
	fn default_pool_round_trips_through_thread_local() {
		let pool = LocalPool::shared_default();
		let seg = pool.take();
		pool.recycle(seg);
		let seg2 = pool.take();
		assert_eq!(seg2.pos(), 0);
		assert_eq!(seg2.limit(), 0);
	}
}
