// SPDX-License-Identifier: Apache-2.0

//! A segmented, memory-recycling byte-I/O core.
//!
//! The pieces, roughly bottom-up:
//!
//! - [`segment`] — fixed-capacity, reference-counted byte chunks.
//! - [`pool`] — the free list that makes segment churn allocation-free.
//! - [`buffer`] — [`Buffer`], the FIFO byte queue built from a segment chain.
//! - [`utf8`] — a UTF-8 codec that spans segment boundaries.
//! - [`pattern`] — byte/slice search unified behind [`Buffer::index_of`].
//! - [`byte_str`] — immutable byte sequences, owned and borrowed.
//! - [`streams`] — [`RawSource`](streams::RawSource)/[`RawSink`](streams::RawSink)
//!   boundary contracts and their buffered adapters.
//! - [`transform`] — streaming transformation and observation hooks.
//! - [`std_io`] — adapters to and from [`std::io::Read`]/[`std::io::Write`].
//!
//! A [`Buffer`] and everything built on it is single-threaded; the
//! [`pool::SegmentPool`] is the one thread-safe seam, by design (see
//! `DESIGN.md`).

pub mod buffer;
pub mod byte_str;
pub mod error;
pub mod pattern;
pub mod pool;
pub mod segment;
pub mod std_io;
pub mod streams;
pub mod transform;
pub mod utf8;

pub use buffer::{Buffer, BufferOptions};
pub use byte_str::{ByteStr, ByteString};
pub use error::{Error, ErrorKind, OperationKind, Result};
pub use pattern::{AnyOf, Pattern};
pub use pool::{LocalPool, SegmentPool};
pub use segment::Segment;
pub use streams::{BufferedSink, BufferedSource, RawSink, RawSource, VoidSink, VoidSource};
pub use transform::{Processor, Transform};
