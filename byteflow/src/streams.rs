// SPDX-License-Identifier: Apache-2.0

//! Pluggable source/sink boundary contracts and the buffered adapters built on
//! top of them.
//!
//! A [`RawSource`]/[`RawSink`] is the crate's seam to the outside world — a
//! socket, a file, an in-memory test double. [`BufferedSource`]/
//! [`BufferedSink`] wrap one of each with a private [`Buffer`] to give callers
//! `require`/`request`/`peek`-style ergonomics without every caller
//! reimplementing the buffering.

use crate::buffer::{Buffer, BufferOptions};
use crate::error::{Error, OperationKind, Result};
use crate::utf8;

/// A pull source: reads at least 1 and at most `byte_count` bytes into `sink`.
/// Implementations must never return `Ok(Some(0))` for a nonzero `byte_count`.
pub trait RawSource {
	fn read(&mut self, sink: &mut Buffer, byte_count: usize) -> Result<Option<usize>>;
	fn close_source(&mut self) -> Result<()> { Ok(()) }
}

/// A push sink: removes exactly `byte_count` bytes from `source` and appends
/// them to the underlying destination.
pub trait RawSink {
	fn write(&mut self, source: &mut Buffer, byte_count: usize) -> Result<()>;
	fn flush_sink(&mut self) -> Result<()> { Ok(()) }
	fn close_sink(&mut self) -> Result<()> { Ok(()) }
}

/// A source that is always at EOF. Useful as a terminator for transformation
/// chains and in tests.
pub struct VoidSource;

impl RawSource for VoidSource {
	fn read(&mut self, _sink: &mut Buffer, _byte_count: usize) -> Result<Option<usize>> { Ok(None) }
}

/// A sink that discards everything written to it.
pub struct VoidSink;

impl RawSink for VoidSink {
	fn write(&mut self, source: &mut Buffer, byte_count: usize) -> Result<()> {
		source.skip(byte_count).map_err(|e| e.with_operation(OperationKind::BufWrite))
	}
}

/// Wraps a [`RawSource`] with a private [`Buffer`] and `require`/`request`
/// ergonomics.
pub struct BufferedSource<S: RawSource> {
	buf: Buffer,
	upstream: S,
	closed: bool,
	generation: u64,
}

impl<S: RawSource> BufferedSource<S> {
	pub fn new(upstream: S) -> Self { Self::with_options(upstream, BufferOptions::default()) }

	pub fn with_options(upstream: S, options: BufferOptions) -> Self {
		Self { buf: Buffer::with_options(options), upstream, closed: false, generation: 0 }
	}

	fn ensure_open(&self) -> Result<()> {
		if self.closed { Err(Error::closed(OperationKind::BufRead)) } else { Ok(()) }
	}

	/// Attempts to make `n` bytes available in the internal buffer, reading
	/// from upstream as needed. Returns `false` at EOF instead of raising.
	pub fn request(&mut self, n: usize) -> Result<bool> {
		self.ensure_open()?;
		while self.buf.size() < n {
			let chunk = (n - self.buf.size()).max(self.buf.options().segment_size);
			match self.upstream.read(&mut self.buf, chunk)? {
				Some(_) => {}
				None => return Ok(false),
			}
		}
		Ok(true)
	}

	/// As [`Self::request`], but raises an end-of-stream error on EOF.
	pub fn require(&mut self, n: usize) -> Result<()> {
		if self.request(n)? { Ok(()) } else { Err(Error::eos(OperationKind::BufRead)) }
	}

	pub fn exhausted(&mut self) -> Result<bool> { Ok(!self.request(1)?) }

	pub fn buffer(&self) -> &Buffer { &self.buf }

	pub fn read_byte(&mut self) -> Result<u8> {
		self.require(1)?;
		let v = self.buf.read_u8()?;
		self.generation += 1;
		Ok(v)
	}

	/// Reads up to `n` bytes into `sink`, returning `None` only if upstream is
	/// already exhausted and nothing was available to read.
	pub fn read_at_most_to(&mut self, sink: &mut Buffer, n: usize) -> Result<Option<usize>> {
		self.ensure_open()?;
		if self.buf.is_empty() {
			let chunk = n.max(self.buf.options().segment_size);
			if self.upstream.read(&mut self.buf, chunk)?.is_none() {
				return Ok(None);
			}
		}
		let take = n.min(self.buf.size());
		sink.write_from(&mut self.buf, take)?;
		self.generation += 1;
		Ok(Some(take))
	}

	/// Reads exactly `n` bytes into `sink`. Bytes already read are transferred
	/// to `sink` even if upstream exhausts before completing.
	pub fn read_to(&mut self, sink: &mut Buffer, n: usize) -> Result<()> {
		self.require(n)?;
		sink.write_from(&mut self.buf, n)?;
		self.generation += 1;
		Ok(())
	}

	/// Drains upstream entirely into `sink`, returning the total bytes moved.
	pub fn transfer_to(&mut self, sink: &mut Buffer) -> Result<usize> {
		self.ensure_open()?;
		let mut total = 0usize;
		loop {
			if self.buf.is_empty() {
				let chunk = self.buf.options().segment_size;
				if self.upstream.read(&mut self.buf, chunk)?.is_none() {
					break;
				}
			}
			let n = self.buf.size();
			sink.write_from(&mut self.buf, n)?;
			total += n;
			self.generation += 1;
		}
		Ok(total)
	}

	/// Discards `n` bytes, raising an end-of-stream error (recording how many
	/// were actually discarded) if upstream exhausts first.
	pub fn skip(&mut self, n: usize) -> Result<()> {
		self.ensure_open()?;
		let mut remaining = n;
		while remaining > 0 {
			if self.buf.is_empty() {
				let chunk = remaining.max(self.buf.options().segment_size);
				if self.upstream.read(&mut self.buf, chunk)?.is_none() {
					self.generation += 1;
					return Err(Error::eos_partial(OperationKind::Skip, n - remaining));
				}
			}
			let take = remaining.min(self.buf.size());
			self.buf.skip(take)?;
			remaining -= take;
		}
		self.generation += 1;
		Ok(())
	}

	/// Returns a view whose reads advance independently of `self`, filling
	/// from the same upstream on demand. Any subsequent consuming operation on
	/// `self` invalidates outstanding peeks.
	pub fn peek(&mut self) -> Peek<'_, S> {
		let buf = self.buf.copy();
		let parent_generation = self.generation;
		Peek { parent: self, buf, parent_generation }
	}

	pub fn close(&mut self) -> Result<()> {
		if self.closed { return Ok(()) }
		self.closed = true;
		self.buf.clear();
		self.upstream.close_source()
	}

	pub fn index_of(&mut self, byte: u8) -> Result<Option<usize>> {
		loop {
			if let Some(idx) = self.buf.index_of_byte(byte, 0, None) {
				return Ok(Some(idx));
			}
			let grown = self.request(self.buf.size() + 1)?;
			if !grown { return Ok(None) }
		}
	}

	/// Reads a line terminated by `\n` or `\r\n` (terminator not included). In
	/// lenient mode, an unterminated final line is still returned; `None`
	/// means upstream was already exhausted.
	pub fn read_utf8_line_lenient(&mut self) -> Result<Option<String>> {
		loop {
			if let Some(idx) = self.buf.index_of_byte(b'\n', 0, None) {
				return self.finish_line(idx).map(Some);
			}
			if !self.request(self.buf.size() + 1)? {
				if self.buf.is_empty() { return Ok(None) }
				let n = self.buf.size();
				let s = utf8::read_utf8_string(&mut self.buf, n)?;
				self.generation += 1;
				return Ok(Some(s));
			}
		}
	}

	/// As [`Self::read_utf8_line_lenient`], but a missing terminator (or a line
	/// longer than `limit`, if given) raises an end-of-stream error without
	/// discarding bytes.
	pub fn read_utf8_line_strict(&mut self, limit: Option<usize>) -> Result<String> {
		loop {
			if let Some(idx) = self.buf.index_of_byte(b'\n', 0, None) {
				if let Some(limit) = limit {
					if idx > limit { return Err(Error::eos(OperationKind::BufRead)) }
				}
				return self.finish_line(idx);
			}
			if let Some(limit) = limit {
				if self.buf.size() > limit { return Err(Error::eos(OperationKind::BufRead)) }
			}
			if !self.request(self.buf.size() + 1)? {
				return Err(Error::eos(OperationKind::BufRead));
			}
		}
	}

	fn finish_line(&mut self, newline_idx: usize) -> Result<String> {
		let (line_len, total_len) = if newline_idx > 0 && self.buf.get(newline_idx - 1) == Some(b'\r') {
			(newline_idx - 1, newline_idx + 1)
		} else {
			(newline_idx, newline_idx + 1)
		};
		let s = utf8::read_utf8_string(&mut self.buf, line_len)?;
		self.buf.skip(total_len - line_len)?;
		self.generation += 1;
		Ok(s)
	}

	/// Reads an optionally `-`-prefixed run of ASCII decimal digits directly
	/// from buffered bytes. Already-consumed digits stay consumed even if the
	/// value overflows `i64`.
	pub fn read_decimal_long(&mut self) -> Result<i64> {
		self.ensure_open()?;
		let mut negative = false;
		if self.request(1)? && self.buf.get(0) == Some(b'-') {
			self.buf.skip(1)?;
			self.generation += 1;
			negative = true;
		}
		let mut value: i64 = 0;
		let mut digits = 0u32;
		loop {
			if !self.request(1)? { break }
			let b = self.buf.get(0).expect("requested byte is present");
			if !b.is_ascii_digit() { break }
			self.buf.skip(1)?;
			self.generation += 1;
			digits += 1;
			let d = (b - b'0') as i64;
			value = value
				.checked_mul(10)
				.and_then(|v| if negative { v.checked_sub(d) } else { v.checked_add(d) })
				.ok_or_else(|| Error::number_format(OperationKind::ParseNumber, "decimal value overflowed i64"))?;
		}
		if digits == 0 {
			return Err(Error::number_format(OperationKind::ParseNumber, "no decimal digits present"));
		}
		Ok(value)
	}

	/// Reads a run of ASCII hexadecimal digits directly from buffered bytes.
	pub fn read_hex_unsigned_long(&mut self) -> Result<u64> { self.read_unsigned_radix(16) }

	/// Reads a run of ASCII digits in the given `radix` into any unsigned
	/// integer type, generalizing [`Self::read_hex_unsigned_long`] the way a
	/// single parser backs every integer width rather than one copy per type.
	pub fn read_unsigned_radix<T>(&mut self, radix: u32) -> Result<T>
	where
		T: num_traits::CheckedMul + num_traits::CheckedAdd + num_traits::NumCast + num_traits::Zero + Copy,
	{
		self.ensure_open()?;
		let base: T = num_traits::NumCast::from(radix).expect("radix fits target integer type");
		let mut value = T::zero();
		let mut digits = 0u32;
		loop {
			if !self.request(1)? { break }
			let b = self.buf.get(0).expect("requested byte is present");
			let Some(d) = (b as char).to_digit(radix) else { break };
			self.buf.skip(1)?;
			self.generation += 1;
			digits += 1;
			let d: T = num_traits::NumCast::from(d).expect("digit fits target integer type");
			value = value
				.checked_mul(&base)
				.and_then(|v| v.checked_add(&d))
				.ok_or_else(|| Error::number_format(OperationKind::ParseNumber, "value overflowed target integer type"))?;
		}
		if digits == 0 {
			return Err(Error::number_format(OperationKind::ParseNumber, "no digits present"));
		}
		Ok(value)
	}
}

macro_rules! gen_buffered_source_primitive {
	($read:ident $read_le:ident -> $ty:ident) => {
		impl<S: RawSource> BufferedSource<S> {
			pub fn $read(&mut self) -> Result<$ty> {
				self.require(std::mem::size_of::<$ty>())?;
				let v = self.buf.$read()?;
				self.generation += 1;
				Ok(v)
			}

			pub fn $read_le(&mut self) -> Result<$ty> {
				self.require(std::mem::size_of::<$ty>())?;
				let v = self.buf.$read_le()?;
				self.generation += 1;
				Ok(v)
			}
		}
	};
}

gen_buffered_source_primitive!(read_u16 read_u16_le -> u16);
gen_buffered_source_primitive!(read_i16 read_i16_le -> i16);
gen_buffered_source_primitive!(read_u32 read_u32_le -> u32);
gen_buffered_source_primitive!(read_i32 read_i32_le -> i32);
gen_buffered_source_primitive!(read_u64 read_u64_le -> u64);
gen_buffered_source_primitive!(read_i64 read_i64_le -> i64);
gen_buffered_source_primitive!(read_f32 read_f32_le -> f32);
gen_buffered_source_primitive!(read_f64 read_f64_le -> f64);

/// A read-only view into a [`BufferedSource`] that does not advance the
/// parent's own position. Invalidated by the parent's next consuming
/// operation.
pub struct Peek<'a, S: RawSource> {
	parent: &'a mut BufferedSource<S>,
	buf: Buffer,
	parent_generation: u64,
}

impl<'a, S: RawSource> Peek<'a, S> {
	fn check_valid(&self) -> Result<()> {
		if self.parent.generation != self.parent_generation {
			Err(Error::illegal_state(OperationKind::Peek, "parent source was read after this peek was created"))
		} else {
			Ok(())
		}
	}

	pub fn request(&mut self, n: usize) -> Result<bool> {
		self.check_valid()?;
		if self.buf.size() >= n { return Ok(true) }
		let ok = self.parent.request(n)?;
		self.check_valid()?;
		self.buf = self.parent.buf.copy();
		Ok(ok)
	}

	pub fn require(&mut self, n: usize) -> Result<()> {
		if self.request(n)? { Ok(()) } else { Err(Error::eos(OperationKind::Peek)) }
	}

	pub fn read_byte(&mut self) -> Result<u8> {
		self.require(1)?;
		self.buf.read_u8()
	}

	pub fn buffer(&self) -> &Buffer { &self.buf }
}

/// Wraps a [`RawSink`] with a private [`Buffer`] and emit-policy helpers.
pub struct BufferedSink<K: RawSink> {
	buf: Buffer,
	upstream: K,
	closed: bool,
}

impl<K: RawSink> BufferedSink<K> {
	pub fn new(upstream: K) -> Self { Self::with_options(upstream, BufferOptions::default()) }

	pub fn with_options(upstream: K, options: BufferOptions) -> Self {
		Self { buf: Buffer::with_options(options), upstream, closed: false }
	}

	fn ensure_open(&self) -> Result<()> {
		if self.closed { Err(Error::closed(OperationKind::BufWrite)) } else { Ok(()) }
	}

	pub fn write_slice(&mut self, bytes: &[u8]) -> Result<()> {
		self.ensure_open()?;
		self.buf.write_slice(bytes);
		self.hint_emit()
	}

	pub fn write_buffer(&mut self, source: &mut Buffer, n: usize) -> Result<()> {
		self.ensure_open()?;
		self.buf.write_from(source, n)?;
		self.hint_emit()
	}

	pub fn write_byte(&mut self, value: u8) -> Result<()> {
		self.ensure_open()?;
		self.buf.write_u8(value);
		self.hint_emit()
	}

	/// Flushes `complete_segment_byte_count()` bytes: everything except a tail
	/// segment that still has room to grow.
	pub fn hint_emit(&mut self) -> Result<()> {
		let n = self.buf.complete_segment_byte_count();
		if n > 0 { self.upstream.write(&mut self.buf, n) } else { Ok(()) }
	}

	/// Flushes every buffered byte to upstream, without calling `flush` there.
	pub fn emit(&mut self) -> Result<()> {
		self.ensure_open()?;
		let n = self.buf.size();
		self.upstream.write(&mut self.buf, n)
	}

	pub fn flush(&mut self) -> Result<()> {
		self.emit()?;
		self.upstream.flush_sink()
	}

	pub fn close(&mut self) -> Result<()> {
		if self.closed { return Ok(()) }
		self.closed = true;
		let emit_result = self.emit();
		let close_result = self.upstream.close_sink();
		emit_result.and(close_result)
	}
}

macro_rules! gen_buffered_sink_primitive {
	($write:ident $write_le:ident -> $ty:ident) => {
		impl<K: RawSink> BufferedSink<K> {
			pub fn $write(&mut self, value: $ty) -> Result<()> {
				self.ensure_open()?;
				self.buf.$write(value);
				self.hint_emit()
			}

			pub fn $write_le(&mut self, value: $ty) -> Result<()> {
				self.ensure_open()?;
				self.buf.$write_le(value);
				self.hint_emit()
			}
		}
	};
}

gen_buffered_sink_primitive!(write_u16 write_u16_le -> u16);
gen_buffered_sink_primitive!(write_i16 write_i16_le -> i16);
gen_buffered_sink_primitive!(write_u32 write_u32_le -> u32);
gen_buffered_sink_primitive!(write_i32 write_i32_le -> i32);
gen_buffered_sink_primitive!(write_u64 write_u64_le -> u64);
gen_buffered_sink_primitive!(write_i64 write_i64_le -> i64);
gen_buffered_sink_primitive!(write_f32 write_f32_le -> f32);
gen_buffered_sink_primitive!(write_f64 write_f64_le -> f64);

#[cfg(test)]
mod tests {
	use super::*;

	/// A raw source that yields a fixed sequence of bytes in small chunks, to
	/// exercise request/require growth across multiple upstream reads.
	struct ChunkedSource {
		data: Vec<u8>,
		pos: usize,
		chunk: usize,
	}

	impl RawSource for ChunkedSource {
		fn read(&mut self, sink: &mut Buffer, byte_count: usize) -> Result<Option<usize>> {
			if self.pos >= self.data.len() { return Ok(None) }
			let n = byte_count.min(self.chunk).min(self.data.len() - self.pos);
			let n = n.max(1);
			sink.write_slice(&self.data[self.pos..self.pos + n]);
			self.pos += n;
			Ok(Some(n))
		}
	}

	struct VecSink(Vec<u8>);

	impl RawSink for VecSink {
		fn write(&mut self, source: &mut Buffer, byte_count: usize) -> Result<()> {
			let mut tmp = vec![0u8; byte_count];
			source.read_exact_slice(&mut tmp)?;
			self.0.extend_from_slice(&tmp);
			Ok(())
		}
	}

	#[test]
	fn require_pulls_from_upstream_across_chunks() {
		let mut src = BufferedSource::new(ChunkedSource { data: b"0123456789".to_vec(), pos: 0, chunk: 3 });
		src.require(10).unwrap();
		assert_eq!(src.read_byte().unwrap(), b'0');
	}

	#[test]
	fn skip_reports_partial_count_at_eof() {
		let mut src = BufferedSource::new(ChunkedSource { data: b"abc".to_vec(), pos: 0, chunk: 3 });
		let err = src.skip(10).unwrap_err();
		assert_eq!(err.partial_count(), Some(3));
	}

	#[test]
	fn peek_does_not_advance_parent() {
		let mut src = BufferedSource::new(ChunkedSource { data: b"hello".to_vec(), pos: 0, chunk: 5 });
		{
			let mut p = src.peek();
			assert_eq!(p.read_byte().unwrap(), b'h');
			assert_eq!(p.read_byte().unwrap(), b'e');
		}
		assert_eq!(src.read_byte().unwrap(), b'h');
	}

	#[test]
	fn peek_invalidated_by_parent_read() {
		let mut src = BufferedSource::new(ChunkedSource { data: b"hello".to_vec(), pos: 0, chunk: 5 });
		let mut p = src.peek();
		src.read_byte().unwrap();
		assert!(p.read_byte().is_err());
	}

	#[test]
	fn read_utf8_line_lenient_handles_crlf_and_final_line() {
		let mut src = BufferedSource::new(ChunkedSource { data: b"a\r\nb\nc".to_vec(), pos: 0, chunk: 100 });
		assert_eq!(src.read_utf8_line_lenient().unwrap(), Some("a".to_string()));
		assert_eq!(src.read_utf8_line_lenient().unwrap(), Some("b".to_string()));
		assert_eq!(src.read_utf8_line_lenient().unwrap(), Some("c".to_string()));
		assert_eq!(src.read_utf8_line_lenient().unwrap(), None);
	}

	#[test]
	fn read_decimal_long_parses_negative_values() {
		let mut src = BufferedSource::new(ChunkedSource { data: b"-42rest".to_vec(), pos: 0, chunk: 100 });
		assert_eq!(src.read_decimal_long().unwrap(), -42);
		assert_eq!(src.read_byte().unwrap(), b'r');
	}

	#[test]
	fn read_decimal_long_rejects_no_digits() {
		let mut src = BufferedSource::new(ChunkedSource { data: b"xyz".to_vec(), pos: 0, chunk: 100 });
		assert!(src.read_decimal_long().is_err());
	}

	#[test]
	fn read_hex_unsigned_long_parses_value() {
		let mut src = BufferedSource::new(ChunkedSource { data: b"1A2Bz".to_vec(), pos: 0, chunk: 100 });
		assert_eq!(src.read_hex_unsigned_long().unwrap(), 0x1A2B);
	}

	#[test]
	fn read_unsigned_radix_generalizes_over_integer_width() {
		let mut src = BufferedSource::new(ChunkedSource { data: b"377z".to_vec(), pos: 0, chunk: 100 });
		let value: u16 = src.read_unsigned_radix(8).unwrap();
		assert_eq!(value, 0o377);
	}

	#[test]
	fn buffered_sink_hint_emit_holds_back_writable_tail() {
		let mut sink = BufferedSink::new(VecSink(Vec::new()));
		sink.write_slice(b"x").unwrap();
		assert_eq!(sink.upstream.0, Vec::<u8>::new());
		sink.emit().unwrap();
		assert_eq!(sink.upstream.0, b"x".to_vec());
	}

	#[test]
	fn buffered_sink_close_emits_and_closes() {
		let mut sink = BufferedSink::new(VecSink(Vec::new()));
		sink.write_slice(b"abc").unwrap();
		sink.close().unwrap();
		assert_eq!(sink.upstream.0, b"abc".to_vec());
		assert!(sink.write_slice(b"x").is_err());
	}

	#[test]
	fn void_source_is_always_at_eof() {
		let mut src = BufferedSource::new(VoidSource);
		assert!(src.exhausted().unwrap());
	}

	#[test]
	fn void_sink_discards_everything() {
		let mut sink = BufferedSink::new(VoidSink);
		sink.write_slice(b"whatever").unwrap();
		sink.flush().unwrap();
	}
}
