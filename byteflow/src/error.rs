// SPDX-License-Identifier: Apache-2.0

//! The crate-wide error type.
//!
//! Every fallible operation returns [`Error`], a small struct pairing an
//! [`OperationKind`] (what the caller was attempting) with an [`ErrorKind`] (what
//! went wrong) and, where one exists, the underlying cause. Pairing the two
//! separately, rather than one flat enum per subsystem, lets a single `ErrorKind`
//! like [`ErrorKind::Eos`] surface from any operation without multiplying variants,
//! while `op` still gives callers and logs enough context to act on the failure.

use std::error::Error as StdError;
use std::fmt;
use std::io;
use amplify_derive::Display;
use arrayvec::ArrayVec;
use thiserror::Error as ThisError;

/// What the caller was attempting when an [`Error`] occurred.
#[derive(Copy, Clone, Debug, Default, Display, Eq, PartialEq)]
pub enum OperationKind {
	#[default]
	#[display("an operation")]
	Unknown,
	#[display("reading from a buffer")]
	BufRead,
	#[display("writing to a buffer")]
	BufWrite,
	#[display("copying a buffer")]
	BufCopy,
	#[display("clearing a buffer")]
	BufClear,
	#[display("flushing a buffered sink")]
	BufFlush,
	#[display("compacting a buffer")]
	BufCompact,
	#[display("skipping buffered bytes")]
	Skip,
	#[display("decoding UTF-8")]
	Utf8Decode,
	#[display("encoding UTF-8")]
	Utf8Encode,
	#[display("parsing a number")]
	ParseNumber,
	#[display("searching for a pattern")]
	Find,
	#[display("peeking a source")]
	Peek,
	#[display("transforming a stream")]
	Transform,
	#[display("{0}")]
	Other(&'static str),
}

/// What went wrong.
#[derive(Copy, Clone, Debug, Display, Eq, PartialEq)]
pub enum ErrorKind {
	/// Input was exhausted before a required read completed.
	#[display("premature end of stream")]
	Eos,
	/// An I/O error was reported by the underlying raw source or sink.
	#[display("I/O error")]
	Io,
	/// A byte sequence could not be interpreted as UTF-8.
	#[display("invalid UTF-8")]
	InvalidUtf8,
	/// The stream has already been closed.
	#[display("stream is closed")]
	Closed,
	/// The segment pool could not satisfy a request.
	#[display("segment pool error")]
	Pool,
	/// A numeric literal overflowed or had no valid digits.
	#[display("malformed number")]
	NumberFormat,
	/// An argument violated a documented precondition.
	#[display("invalid argument")]
	IllegalArgument,
	/// The operation is not valid in the current state.
	#[display("illegal state")]
	IllegalState,
	#[display("{0}")]
	Other(&'static str),
}

/// A [`Result`](std::result::Result) using [`Error`] as its error type.
pub type Result<T = ()> = std::result::Result<T, Error>;

/// The crate-wide error type: an [`OperationKind`], an [`ErrorKind`], and an
/// optional cause.
#[derive(Debug)]
pub struct Error {
	op: OperationKind,
	kind: ErrorKind,
	source: Option<Box<dyn StdError + Send + Sync + 'static>>,
	/// For [`ErrorKind::Eos`] raised by `skip`, the number of bytes actually
	/// skipped before the stream was exhausted.
	partial_count: Option<usize>,
}

impl Error {
	pub fn new(op: OperationKind, kind: ErrorKind) -> Self {
		Self { op, kind, source: None, partial_count: None }
	}

	pub fn with_source(
		op: OperationKind,
		kind: ErrorKind,
		source: impl StdError + Send + Sync + 'static,
	) -> Self {
		Self { op, kind, source: Some(Box::new(source)), partial_count: None }
	}

	pub fn eos(op: OperationKind) -> Self { Self::new(op, ErrorKind::Eos) }

	/// An end-of-stream error from a `skip` that could not skip the full count,
	/// recording how many bytes it did manage to skip.
	pub fn eos_partial(op: OperationKind, skipped: usize) -> Self {
		Self { partial_count: Some(skipped), ..Self::eos(op) }
	}

	pub fn io(op: OperationKind, source: io::Error) -> Self {
		Self::with_source(op, ErrorKind::Io, source)
	}

	pub fn closed(op: OperationKind) -> Self { Self::new(op, ErrorKind::Closed) }

	pub fn pool(op: OperationKind, source: impl StdError + Send + Sync + 'static) -> Self {
		Self::with_source(op, ErrorKind::Pool, source)
	}

	pub fn invalid_utf8(op: OperationKind, source: Utf8Error) -> Self {
		Self::with_source(op, ErrorKind::InvalidUtf8, source)
	}

	pub fn number_format(op: OperationKind, message: &'static str) -> Self {
		Self::new(op, ErrorKind::NumberFormat).with_message(message)
	}

	pub fn illegal_argument(op: OperationKind, message: &'static str) -> Self {
		Self::new(op, ErrorKind::IllegalArgument).with_message(message)
	}

	pub fn illegal_state(op: OperationKind, message: &'static str) -> Self {
		Self::new(op, ErrorKind::IllegalState).with_message(message)
	}

	fn with_message(self, message: &'static str) -> Self {
		Self::with_source(self.op, self.kind, MessageError(message))
	}

	pub fn kind(&self) -> ErrorKind { self.kind }
	pub fn operation(&self) -> OperationKind { self.op }

	/// For an [`ErrorKind::Eos`] raised by `skip`, the number of bytes actually
	/// skipped before the stream was exhausted.
	pub fn partial_count(&self) -> Option<usize> { self.partial_count }

	/// Returns the source downcast into an [`io::Error`], if this was an I/O
	/// error.
	pub fn io_source(&self) -> Option<&io::Error> {
		self.source.as_ref()?.downcast_ref()
	}

	/// Re-tags the operation this error occurred during, preserving the kind and
	/// cause. Used to attach call-site context as an error propagates up through
	/// layers (buffer -> buffered stream -> transformation).
	pub fn with_operation(mut self, op: OperationKind) -> Self {
		self.op = op;
		self
	}

	pub(crate) fn into_io(self) -> io::Error {
		match self.kind {
			ErrorKind::Eos => io::Error::new(io::ErrorKind::UnexpectedEof, self),
			ErrorKind::Io => {
				let Some(kind) = self.io_source().map(io::Error::kind) else {
					return io::Error::other(self)
				};
				io::Error::new(kind, self)
			}
			_ => io::Error::other(self),
		}
	}
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "error {} ({})", self.op, self.kind)
	}
}

impl StdError for Error {
	fn source(&self) -> Option<&(dyn StdError + 'static)> {
		self.source.as_ref().map(|e| e.as_ref() as &(dyn StdError + 'static))
	}
}

impl From<io::Error> for Error {
	fn from(value: io::Error) -> Self {
		if value.kind() == io::ErrorKind::UnexpectedEof {
			Self::eos(OperationKind::Unknown)
		} else {
			Self::io(OperationKind::Unknown, value)
		}
	}
}

#[derive(Debug)]
struct MessageError(&'static str);

impl fmt::Display for MessageError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.0) }
}

impl StdError for MessageError {}

/// A UTF-8 decode error raised by an explicit code-point decoding function.
///
/// Stream decoding never raises this: malformed bytes are replaced with
/// `U+FFFD`. It is reserved for APIs that decode a single, fully
/// buffered code point and have nothing sensible to substitute.
#[derive(Clone, Debug, ThisError)]
#[error("{kind} UTF-8 byte sequence ({bytes:X?}) from index {valid_up_to}", bytes = self.bytes())]
pub struct Utf8Error {
	pub valid_up_to: usize,
	pub bytes: ArrayVec<u8, 4>,
	pub kind: Utf8ErrorKind,
}

#[derive(Copy, Clone, Debug, Display, Eq, PartialEq)]
pub enum Utf8ErrorKind {
	#[display("invalid")]
	InvalidSequence,
	#[display("incomplete")]
	IncompleteChar,
}

impl Utf8Error {
	pub fn invalid_seq(valid_up_to: usize, bytes: ArrayVec<u8, 4>) -> Self {
		Self { valid_up_to, bytes, kind: Utf8ErrorKind::InvalidSequence }
	}

	pub fn incomplete_char(valid_up_to: usize, bytes: ArrayVec<u8, 4>) -> Self {
		Self { valid_up_to, bytes, kind: Utf8ErrorKind::IncompleteChar }
	}

	pub fn bytes(&self) -> &[u8] { &self.bytes }
}
