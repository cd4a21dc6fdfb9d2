// Copyright 2024 - Strixpyrr
// SPDX-License-Identifier: Apache-2.0

//! Source adapters: pull raw bytes from a channel, stream, or fixed buffer
//! into a caller-supplied buffer.

use crate::Result;

/// A source of raw bytes for a [`Reader`](crate::Reader) to decode.
///
/// Implementations are small and capability-based rather than an inheritance
/// hierarchy: a readable channel, a fixed in-memory buffer, and the empty
/// source are sibling types, each implementing this trait directly.
pub trait Source {
	/// Fills `buf` from the current position, returning the number of bytes
	/// actually placed, or `0` at end-of-stream. `min_hint` is a lower bound
	/// the caller would like to see; the adapter is free to return fewer
	/// bytes than `min_hint` (and even than `buf.len()`) but must not block
	/// beyond what's necessary to produce at least one byte or detect EOF.
	fn read(&mut self, buf: &mut [u8], min_hint: usize) -> Result<usize>;

	/// Discards up to `count` bytes, returning the number actually skipped.
	/// Returns `0` at end-of-stream.
	fn skip(&mut self, count: usize) -> Result<usize>;

	/// Releases this source. Further reads after `close` are unspecified;
	/// callers should not reuse a closed source.
	fn close(&mut self) -> Result;
}

/// A source with no data, always immediately at end-of-stream.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptySource;

impl Source for EmptySource {
	#[inline]
	fn read(&mut self, _buf: &mut [u8], _min_hint: usize) -> Result<usize> {
		Ok(0)
	}

	#[inline]
	fn skip(&mut self, _count: usize) -> Result<usize> {
		Ok(0)
	}

	#[inline]
	fn close(&mut self) -> Result {
		Ok(())
	}
}

/// A fixed in-memory buffer read as a source. Bytes are consumed from the
/// front as they're read.
impl Source for &[u8] {
	fn read(&mut self, buf: &mut [u8], _min_hint: usize) -> Result<usize> {
		let count = buf.len().min(self.len());
		buf[..count].copy_from_slice(&self[..count]);
		*self = &self[count..];
		Ok(count)
	}

	fn skip(&mut self, count: usize) -> Result<usize> {
		let count = count.min(self.len());
		*self = &self[count..];
		Ok(count)
	}

	fn close(&mut self) -> Result {
		*self = &[];
		Ok(())
	}
}

#[cfg(feature = "std")]
mod std_io {
	use std::io::{ErrorKind, Read};
	use crate::{Error, Result};
	use super::Source;

	/// Adapts a [`std::io::Read`] channel or stream into a [`Source`].
	///
	/// `min_hint` is not forwarded to the underlying reader: `std::io::Read`
	/// has no equivalent of a "try to fill at least this many bytes" request,
	/// so a single `read` call is issued and its result returned directly,
	/// matching [`Read::read`]'s own at-least-one-byte-or-EOF contract.
	pub struct ReadSource<R> {
		inner: R,
	}

	impl<R: Read> ReadSource<R> {
		/// Wraps a readable channel or stream.
		#[inline]
		pub fn new(inner: R) -> Self {
			Self { inner }
		}

		/// Unwraps the adapter, returning the underlying reader.
		#[inline]
		pub fn into_inner(self) -> R {
			self.inner
		}
	}

	impl<R: Read> Source for ReadSource<R> {
		fn read(&mut self, buf: &mut [u8], _min_hint: usize) -> Result<usize> {
			loop {
				match self.inner.read(buf) {
					Ok(count) => break Ok(count),
					Err(error) if error.kind() == ErrorKind::Interrupted => { }
					Err(error) => break Err(Error::IoRead(error)),
				}
			}
		}

		fn skip(&mut self, count: usize) -> Result<usize> {
			let mut remaining = count;
			let mut scratch = [0u8; 256];
			while remaining > 0 {
				let want = remaining.min(scratch.len());
				let read = self.read(&mut scratch[..want], want)?;
				if read == 0 {
					break;
				}
				remaining -= read;
			}
			Ok(count - remaining)
		}

		fn close(&mut self) -> Result {
			Ok(())
		}
	}
}

#[cfg(feature = "std")]
pub use std_io::ReadSource;
