// SPDX-License-Identifier: Apache-2.0

//! Streaming transformation and observation hooks layered over [`RawSource`]/
//! [`RawSink`]: filters that rewrite bytes in flight, and processors that
//! watch them pass by unchanged.

use crate::buffer::Buffer;
use crate::error::Result;
use crate::streams::{RawSink, RawSource};

/// A streaming byte transformation, such as a compressor or a cipher.
pub trait Transform {
	/// Consumes up to `byte_count` bytes from `source`, appending transformed
	/// output to `sink`. Returns the number of input bytes consumed; `0` means
	/// the transformation needs more input than is currently available.
	fn transform_at_most_to(&mut self, source: &mut Buffer, sink: &mut Buffer, byte_count: usize) -> Result<usize>;

	/// Flushes any trailing output (e.g. a compressor's final block) once the
	/// upstream source is exhausted. Called at most once.
	fn finalize(&mut self, sink: &mut Buffer) -> Result<()>;
}

/// An observer that is shown every byte flowing through a stream without
/// consuming or altering any of it, such as a running checksum.
pub trait Processor {
	type Output;

	fn process(&mut self, window: &Buffer, byte_count: usize) -> Result<()>;
	fn compute(&self) -> Self::Output;
}

/// A [`RawSink`] that runs every write through a [`Transform`] before passing
/// it downstream, and runs [`Transform::finalize`] on close.
pub struct TransformSink<T: Transform, K: RawSink> {
	transform: T,
	downstream: K,
	finalized: bool,
}

impl<T: Transform, K: RawSink> TransformSink<T, K> {
	pub fn new(transform: T, downstream: K) -> Self { Self { transform, downstream, finalized: false } }
}

impl<T: Transform, K: RawSink> RawSink for TransformSink<T, K> {
	fn write(&mut self, source: &mut Buffer, byte_count: usize) -> Result<()> {
		let mut remaining = byte_count;
		let mut out = Buffer::new();
		while remaining > 0 {
			let consumed = self.transform.transform_at_most_to(source, &mut out, remaining)?;
			if consumed == 0 { break }
			remaining -= consumed;
		}
		let n = out.size();
		self.downstream.write(&mut out, n)
	}

	fn flush_sink(&mut self) -> Result<()> { self.downstream.flush_sink() }

	fn close_sink(&mut self) -> Result<()> {
		if self.finalized {
			return self.downstream.close_sink();
		}
		self.finalized = true;
		let mut out = Buffer::new();
		let finalize_result = self.transform.finalize(&mut out);
		let n = out.size();
		let write_result = if n > 0 { self.downstream.write(&mut out, n) } else { Ok(()) };
		let close_result = self.downstream.close_sink();
		finalize_result.and(write_result).and(close_result)
	}
}

/// A [`RawSource`] that pumps an upstream [`RawSource`] through a [`Transform`]
/// on demand, buffering an input window internally. Once upstream is
/// exhausted, [`Transform::finalize`] output is drained before reporting EOF.
pub struct TransformSource<T: Transform, S: RawSource> {
	transform: T,
	upstream: S,
	input: Buffer,
	upstream_done: bool,
	finalized: bool,
}

impl<T: Transform, S: RawSource> TransformSource<T, S> {
	pub fn new(transform: T, upstream: S) -> Self {
		Self { transform, upstream, input: Buffer::new(), upstream_done: false, finalized: false }
	}
}

impl<T: Transform, S: RawSource> RawSource for TransformSource<T, S> {
	fn read(&mut self, sink: &mut Buffer, byte_count: usize) -> Result<Option<usize>> {
		loop {
			let before = sink.size();
			if self.input.is_empty() && !self.upstream_done {
				match self.upstream.read(&mut self.input, byte_count.max(1))? {
					Some(_) => {}
					None => self.upstream_done = true,
				}
			}

			if self.upstream_done && self.input.is_empty() {
				if self.finalized {
					return Ok(None);
				}
				self.finalized = true;
				self.transform.finalize(sink)?;
				let produced = sink.size() - before;
				return if produced > 0 { Ok(Some(produced)) } else { Ok(None) };
			}

			let consumed = self.transform.transform_at_most_to(&mut self.input, sink, byte_count)?;
			let produced = sink.size() - before;
			if produced > 0 {
				return Ok(Some(produced));
			}
			if consumed == 0 && !self.upstream_done {
				// Transform needs more input than is buffered; loop to pull more.
				continue;
			}
			if consumed == 0 {
				return Ok(None);
			}
		}
	}

	fn close_source(&mut self) -> Result<()> { self.upstream.close_source() }
}

/// A [`RawSource`] that tees every byte read from an upstream source through a
/// [`Processor`], leaving the data itself unchanged.
pub struct ProcessorSource<P: Processor, S: RawSource> {
	processor: P,
	upstream: S,
}

impl<P: Processor, S: RawSource> ProcessorSource<P, S> {
	pub fn new(processor: P, upstream: S) -> Self { Self { processor, upstream } }

	pub fn compute(&self) -> P::Output { self.processor.compute() }
}

impl<P: Processor, S: RawSource> RawSource for ProcessorSource<P, S> {
	fn read(&mut self, sink: &mut Buffer, byte_count: usize) -> Result<Option<usize>> {
		let before = sink.size();
		match self.upstream.read(sink, byte_count)? {
			Some(n) => {
				let produced = sink.size() - before;
				let mut window = Buffer::new();
				sink.copy_to(&mut window, before, produced)?;
				self.processor.process(&window, produced)?;
				Ok(Some(n))
			}
			None => Ok(None),
		}
	}

	fn close_source(&mut self) -> Result<()> { self.upstream.close_source() }
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::streams::VoidSource;

	/// A transform that uppercases ASCII letters, one byte at a time.
	struct UppercaseTransform;

	impl Transform for UppercaseTransform {
		fn transform_at_most_to(&mut self, source: &mut Buffer, sink: &mut Buffer, byte_count: usize) -> Result<usize> {
			let n = byte_count.min(source.size());
			let mut bytes = vec![0u8; n];
			source.read_exact_slice(&mut bytes)?;
			for b in &mut bytes {
				*b = b.to_ascii_uppercase();
			}
			sink.write_slice(&bytes);
			Ok(n)
		}

		fn finalize(&mut self, _sink: &mut Buffer) -> Result<()> { Ok(()) }
	}

	/// A source yielding fixed bytes in one shot.
	struct OnceSource(Option<Vec<u8>>);

	impl RawSource for OnceSource {
		fn read(&mut self, sink: &mut Buffer, _byte_count: usize) -> Result<Option<usize>> {
			match self.0.take() {
				Some(bytes) => {
					let n = bytes.len();
					sink.write_slice(&bytes);
					Ok(Some(n))
				}
				None => Ok(None),
			}
		}
	}

	struct CollectSink(Vec<u8>);

	impl RawSink for CollectSink {
		fn write(&mut self, source: &mut Buffer, byte_count: usize) -> Result<()> {
			let mut tmp = vec![0u8; byte_count];
			source.read_exact_slice(&mut tmp)?;
			self.0.extend_from_slice(&tmp);
			Ok(())
		}
	}

	/// A processor summing every byte seen.
	struct ByteSum(u64);

	impl Processor for ByteSum {
		type Output = u64;

		fn process(&mut self, window: &Buffer, byte_count: usize) -> Result<()> {
			for i in 0..byte_count {
				self.0 += window.get(i).unwrap() as u64;
			}
			Ok(())
		}

		fn compute(&self) -> u64 { self.0 }
	}

	#[test]
	fn transform_sink_rewrites_bytes() {
		let mut sink = TransformSink::new(UppercaseTransform, CollectSink(Vec::new()));
		let mut src = Buffer::new();
		src.write_slice(b"hello");
		sink.write(&mut src, 5).unwrap();
		sink.close_sink().unwrap();
		assert_eq!(sink.downstream.0, b"HELLO".to_vec());
	}

	#[test]
	fn transform_source_rewrites_and_reports_eof() {
		let mut source = TransformSource::new(UppercaseTransform, OnceSource(Some(b"world".to_vec())));
		let mut out = Buffer::new();
		let n = source.read(&mut out, 64).unwrap();
		assert_eq!(n, Some(5));
		let mut collected = vec![0u8; 5];
		out.read_exact_slice(&mut collected).unwrap();
		assert_eq!(&collected, b"WORLD");
		assert_eq!(source.read(&mut out, 64).unwrap(), None);
	}

	#[test]
	fn processor_source_observes_without_altering() {
		let mut source = ProcessorSource::new(ByteSum(0), OnceSource(Some(vec![1, 2, 3])));
		let mut out = Buffer::new();
		source.read(&mut out, 64).unwrap();
		let mut collected = vec![0u8; 3];
		out.read_exact_slice(&mut collected).unwrap();
		assert_eq!(collected, vec![1, 2, 3]);
		assert_eq!(source.compute(), 6);
	}

	#[test]
	fn void_source_terminates_transform_source_immediately() {
		let mut source = TransformSource::new(UppercaseTransform, VoidSource);
		let mut out = Buffer::new();
		assert_eq!(source.read(&mut out, 64).unwrap(), None);
	}
}
