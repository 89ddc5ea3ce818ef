// SPDX-License-Identifier: Apache-2.0

//! Immutable byte sequences: an owned, compact [`ByteString`] and a borrowed,
//! segment-backed [`ByteStr`] for inspecting a buffer's current contents
//! without snapshotting them first.

use arrayvec::ArrayVec;
use base64::Engine;

use crate::buffer::Buffer;
use crate::error::{Error, OperationKind, Result, Utf8Error, Utf8ErrorKind};

/// An immutable, append-free byte sequence with a stable size, byte-wise
/// equality, and content-derived hashing.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct ByteString {
	data: Box<[u8]>,
}

impl ByteString {
	pub fn new(bytes: impl Into<Box<[u8]>>) -> Self { Self { data: bytes.into() } }

	/// Copies every readable byte of `buf` into a compact, independent array.
	/// Uses a `copy()` (segment sharing, no byte copy) internally so the
	/// snapshot never disturbs `buf`'s own read position.
	pub fn snapshot(buf: &mut Buffer) -> Self {
		let mut copy = buf.copy();
		let mut data = vec![0u8; copy.size()];
		copy.read_slice(&mut data);
		Self { data: data.into_boxed_slice() }
	}

	pub fn size(&self) -> usize { self.data.len() }
	pub fn is_empty(&self) -> bool { self.data.is_empty() }
	pub fn as_bytes(&self) -> &[u8] { &self.data }
	pub fn get(&self, i: usize) -> Option<u8> { self.data.get(i).copied() }

	/// First occurrence of `needle` at or after `start`.
	pub fn index_of(&self, needle: &[u8], start: usize) -> Option<usize> {
		if needle.is_empty() {
			return Some(start.min(self.data.len()));
		}
		if start >= self.data.len() || needle.len() > self.data.len() - start {
			return None;
		}
		self.data[start..].windows(needle.len()).position(|w| w == needle).map(|i| i + start)
	}

	pub fn hex_lower(&self) -> String { base16ct::lower::encode_string(&self.data) }
	pub fn hex_upper(&self) -> String { base16ct::upper::encode_string(&self.data) }
	pub fn base64(&self) -> String { base64::engine::general_purpose::STANDARD.encode(&self.data) }
	pub fn base64_url(&self) -> String {
		base64::engine::general_purpose::URL_SAFE.encode(&self.data)
	}

	/// Strictly decodes the entire content as UTF-8, surfacing the same
	/// offset-carrying [`Utf8Error`] the streaming codec uses rather than
	/// substituting replacement characters.
	pub fn utf8(&self) -> Result<String> {
		std::str::from_utf8(&self.data).map(str::to_owned).map_err(|e| {
			let valid_up_to = e.valid_up_to();
			let remaining = self.data.len() - valid_up_to;
			let (count, kind) = match e.error_len() {
				Some(n) => (n.min(4), Utf8ErrorKind::InvalidSequence),
				None => (remaining.min(4), Utf8ErrorKind::IncompleteChar),
			};
			let bytes = ArrayVec::try_from(&self.data[valid_up_to..valid_up_to + count])
				.expect("at most 4 bytes");
			Error::invalid_utf8(OperationKind::Utf8Decode, Utf8Error { valid_up_to, bytes, kind })
		})
	}
}

impl std::fmt::Debug for ByteString {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "ByteString({})", self.hex_lower())
	}
}

impl From<Vec<u8>> for ByteString {
	fn from(value: Vec<u8>) -> Self { Self::new(value) }
}

impl From<&[u8]> for ByteString {
	fn from(value: &[u8]) -> Self { Self::new(value.to_vec()) }
}

#[cfg(feature = "hash")]
fn digest_bytes<D: digest::Digest>(data: &[u8]) -> Vec<u8> {
	let mut hasher = D::new();
	digest::Digest::update(&mut hasher, data);
	hasher.finalize().to_vec()
}

impl ByteString {
	#[cfg(feature = "sha2")]
	pub fn sha256(&self) -> Vec<u8> { digest_bytes::<sha2::Sha256>(&self.data) }
	#[cfg(feature = "sha2")]
	pub fn sha512(&self) -> Vec<u8> { digest_bytes::<sha2::Sha512>(&self.data) }
	#[cfg(feature = "sha3")]
	pub fn sha3_256(&self) -> Vec<u8> { digest_bytes::<sha3::Sha3_256>(&self.data) }
	#[cfg(feature = "md5")]
	pub fn md5(&self) -> Vec<u8> { digest_bytes::<md5::Md5>(&self.data) }
	#[cfg(feature = "sha1")]
	pub fn sha1(&self) -> Vec<u8> { digest_bytes::<sha1::Sha1>(&self.data) }
}

/// A borrowed, segment-backed view over a range of a [`Buffer`]'s current
/// contents. Lets a caller inspect, search, or encode bytes that are still
/// sitting in the buffer's own segments without paying for a [`ByteString`]
/// snapshot unless they ask for one.
pub struct ByteStr<'a> {
	buf: &'a Buffer,
	start: usize,
	len: usize,
}

impl<'a> ByteStr<'a> {
	pub fn whole(buf: &'a Buffer) -> Self { Self { buf, start: 0, len: buf.size() } }

	pub fn range(buf: &'a Buffer, start: usize, len: usize) -> Self {
		assert!(start + len <= buf.size(), "ByteStr range out of bounds");
		Self { buf, start, len }
	}

	pub fn len(&self) -> usize { self.len }
	pub fn is_empty(&self) -> bool { self.len == 0 }

	pub fn get(&self, i: usize) -> Option<u8> {
		if i >= self.len { return None }
		self.buf.get(self.start + i)
	}

	fn collect(&self) -> Vec<u8> { (0..self.len).map(|i| self.get(i).unwrap()).collect() }

	pub fn to_byte_string(&self) -> ByteString { ByteString::new(self.collect()) }

	pub fn index_of(&self, needle: &[u8]) -> Option<usize> {
		self.buf.index_of_bytes(needle, self.start).and_then(|pos| {
			let rel = pos - self.start;
			(rel + needle.len() <= self.len).then_some(rel)
		})
	}

	pub fn hex_lower(&self) -> String { self.to_byte_string().hex_lower() }
	pub fn hex_upper(&self) -> String { self.to_byte_string().hex_upper() }
	pub fn base64(&self) -> String { self.to_byte_string().base64() }
	pub fn utf8(&self) -> Result<String> { self.to_byte_string().utf8() }
}
