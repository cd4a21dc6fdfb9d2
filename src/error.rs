// Copyright 2024 - Strixpyrr
// SPDX-License-Identifier: Apache-2.0

use core::fmt::{Display, Formatter, Result as FmtResult};
use simdutf8::compat::Utf8Error;
use crate::format::ValueType;

/// A MessagePack decode/encode error.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
	/// An I/O error occurred while filling the working buffer from a source.
	#[cfg(feature = "std")]
	IoRead(std::io::Error),
	/// An I/O error occurred while flushing the working buffer to a sink.
	#[cfg(feature = "std")]
	IoWrite(std::io::Error),
	/// An I/O error occurred while closing a source or sink.
	#[cfg(feature = "std")]
	IoClose(std::io::Error),
	/// The source ended before the required number of bytes could be read.
	PrematureEof {
		/// The number of bytes required to complete the read.
		expected: usize,
		/// The number of bytes actually read before the source ended.
		actual_read: usize,
	},
	/// A sink's [`write`](crate::sink::Sink::write) returned `0` before all
	/// bytes were written, the short-write condition
	/// `std::io::Write::write_all` reports as `ErrorKind::WriteZero`.
	WriteZero {
		/// The number of bytes that were never accepted by the sink.
		remaining: usize,
	},
	/// The observed tag is not a valid encoding of the requested logical type.
	WrongType {
		/// The tag byte actually observed on the wire.
		tag: u8,
		/// The logical type the caller requested.
		requested: ValueType,
	},
	/// A decoded integer does not fit the requested target width.
	IntegerOverflow {
		/// The decoded value, widened to fit any target.
		value: i128,
		/// The tag the value was encoded with.
		tag: u8,
		/// The name of the target type the value didn't fit.
		target: &'static str,
	},
	/// A 32-bit length field decoded to a value outside `[0, 2^31 - 1]`.
	LengthTooLarge {
		/// The decoded length.
		length: u32,
		/// The value type the length header belongs to.
		value_type: ValueType,
	},
	/// An allocator request exceeded its configured maximum capacity.
	CapacityExceeded {
		/// The requested capacity.
		requested: usize,
		/// The allocator's configured maximum.
		max: usize,
	},
	/// A string payload was not valid UTF-8.
	InvalidUtf8(Utf8Error),
	/// A working buffer was configured below the 9-byte minimum.
	BufferTooSmall {
		/// The configured capacity.
		capacity: usize,
	},
	/// A `ReaderBuilder` was finalized without a source.
	SourceRequired,
	/// A `WriterBuilder` was finalized without a sink.
	SinkRequired,
	/// An operation was attempted on a reader or writer that was already closed.
	Closed,
}

#[cfg(feature = "std")]
impl std::error::Error for Error {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::IoRead(error) | Self::IoWrite(error) | Self::IoClose(error) => Some(error),
			Self::InvalidUtf8(error) => Some(error),
			Self::PrematureEof { .. } |
			Self::WriteZero { .. } |
			Self::WrongType { .. } |
			Self::IntegerOverflow { .. } |
			Self::LengthTooLarge { .. } |
			Self::CapacityExceeded { .. } |
			Self::BufferTooSmall { .. } |
			Self::SourceRequired |
			Self::SinkRequired |
			Self::Closed => None,
		}
	}
}

impl Display for Error {
	fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
		match self {
			#[cfg(feature = "std")]
			Self::IoRead(error) => write!(f, "I/O error while reading: {error}"),
			#[cfg(feature = "std")]
			Self::IoWrite(error) => write!(f, "I/O error while writing: {error}"),
			#[cfg(feature = "std")]
			Self::IoClose(error) => write!(f, "I/O error while closing: {error}"),
			Self::PrematureEof { expected, actual_read } => write!(
				f,
				"premature end-of-stream: expected {expected} bytes, got {actual_read}"
			),
			Self::WriteZero { remaining } => write!(
				f,
				"write returned 0 before {remaining} bytes were written"
			),
			Self::WrongType { tag, requested } => write!(
				f,
				"tag {tag:#04x} is not a valid encoding of {requested}"
			),
			Self::IntegerOverflow { value, tag, target } => write!(
				f,
				"value {value} (tag {tag:#04x}) does not fit in {target}"
			),
			Self::LengthTooLarge { length, value_type } => write!(
				f,
				"length {length} for {value_type} exceeds the maximum representable length"
			),
			Self::CapacityExceeded { requested, max } => write!(
				f,
				"requested buffer capacity {requested} exceeds allocator maximum {max}"
			),
			Self::InvalidUtf8(error) => Display::fmt(error, f),
			Self::BufferTooSmall { capacity } => write!(
				f,
				"working buffer capacity {capacity} is below the 9-byte minimum"
			),
			Self::SourceRequired => write!(f, "reader builder is missing a source"),
			Self::SinkRequired => write!(f, "writer builder is missing a sink"),
			Self::Closed => write!(f, "operation attempted after close"),
		}
	}
}

#[cfg(feature = "std")]
impl From<std::io::Error> for Error {
	#[inline]
	fn from(value: std::io::Error) -> Self {
		Self::IoRead(value)
	}
}

impl From<Utf8Error> for Error {
	#[inline]
	fn from(value: Utf8Error) -> Self {
		Self::InvalidUtf8(value)
	}
}

/// The result type used throughout this crate.
pub type Result<T = (), E = Error> = core::result::Result<T, E>;
