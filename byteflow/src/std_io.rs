// SPDX-License-Identifier: Apache-2.0

//! Concrete adapters bridging [`std::io::Read`]/[`std::io::Write`] to this
//! crate's [`RawSource`]/[`RawSink`] traits.
//!
//! These are plain wrapper structs rather than a blanket `impl<T: io::Read>
//! RawSource for T`: a blanket impl here would need specialization to avoid
//! conflicting with other `RawSource` implementations callers might write for
//! their own `io::Read` types, and specialization isn't stable. A one-line
//! `IoSource::new(reader)` at the call site costs nothing in practice.

use std::io;

use crate::buffer::Buffer;
use crate::error::{Error, OperationKind, Result};
use crate::streams::{RawSink, RawSource};

/// Adapts any [`std::io::Read`] into a [`RawSource`].
pub struct IoSource<R: io::Read> {
	inner: R,
	scratch: Vec<u8>,
}

impl<R: io::Read> IoSource<R> {
	pub fn new(inner: R) -> Self { Self { inner, scratch: Vec::new() } }

	pub fn into_inner(self) -> R { self.inner }
}

impl<R: io::Read> RawSource for IoSource<R> {
	fn read(&mut self, sink: &mut Buffer, byte_count: usize) -> Result<Option<usize>> {
		if byte_count == 0 {
			return Ok(Some(0));
		}
		if self.scratch.len() < byte_count {
			self.scratch.resize(byte_count, 0);
		}
		match self.inner.read(&mut self.scratch[..byte_count]) {
			Ok(0) => Ok(None),
			Ok(n) => {
				sink.write_slice(&self.scratch[..n]);
				Ok(Some(n))
			}
			Err(e) => Err(Error::io(OperationKind::BufRead, e)),
		}
	}

	fn close_source(&mut self) -> Result<()> { Ok(()) }
}

/// Adapts any [`std::io::Write`] into a [`RawSink`].
pub struct IoSink<W: io::Write> {
	inner: W,
	scratch: Vec<u8>,
}

impl<W: io::Write> IoSink<W> {
	pub fn new(inner: W) -> Self { Self { inner, scratch: Vec::new() } }

	pub fn into_inner(self) -> W { self.inner }
}

impl<W: io::Write> RawSink for IoSink<W> {
	fn write(&mut self, source: &mut Buffer, byte_count: usize) -> Result<()> {
		self.scratch.clear();
		self.scratch.resize(byte_count, 0);
		source.read_exact_slice(&mut self.scratch)?;
		self.inner.write_all(&self.scratch).map_err(|e| Error::io(OperationKind::BufWrite, e))
	}

	fn flush_sink(&mut self) -> Result<()> {
		self.inner.flush().map_err(|e| Error::io(OperationKind::BufFlush, e))
	}

	fn close_sink(&mut self) -> Result<()> { self.flush_sink() }
}

/// Adapts a [`crate::streams::BufferedSource`] into [`std::io::Read`], for
/// interop with APIs that only know about the standard library's traits.
pub struct ReadAdapter<S: RawSource> {
	source: crate::streams::BufferedSource<S>,
}

impl<S: RawSource> ReadAdapter<S> {
	pub fn new(source: crate::streams::BufferedSource<S>) -> Self { Self { source } }
}

impl<S: RawSource> io::Read for ReadAdapter<S> {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		let mut sink = Buffer::new();
		let read = self.source.read_at_most_to(&mut sink, buf.len()).map_err(Error::into_io)?;
		match read {
			Some(n) => {
				sink.read_exact_slice(&mut buf[..n]).map_err(Error::into_io)?;
				Ok(n)
			}
			None => Ok(0),
		}
	}
}
