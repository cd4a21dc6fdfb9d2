// Copyright 2024 - Strixpyrr
// SPDX-License-Identifier: Apache-2.0

//! Sink adapters: push raw bytes from a caller-supplied buffer into a
//! channel, stream, or discard target.

extern crate alloc as core_alloc;

use core_alloc::vec::Vec;
use crate::{Error, Result};

/// A destination for raw bytes written by a [`Writer`](crate::Writer).
pub trait Sink {
	/// Writes as many bytes from `buf` as the sink will accept, returning the
	/// count actually written.
	fn write(&mut self, buf: &[u8]) -> Result<usize>;

	/// Writes every byte across `bufs`, in order.
	///
	/// The default implementation loops over `bufs` calling
	/// [`write`](Self::write). A [`write`](Self::write) call that returns `0`
	/// before `remaining` is exhausted is a short write; rather than silently
	/// truncating the output, this is reported as [`Error::WriteZero`], the
	/// same condition [`std::io::Write::write_all`] surfaces as
	/// `ErrorKind::WriteZero`.
	fn write_all(&mut self, bufs: &[&[u8]]) -> Result {
		for buf in bufs {
			let mut remaining = *buf;
			while !remaining.is_empty() {
				let count = self.write(remaining)?;
				if count == 0 {
					return Err(Error::WriteZero { remaining: remaining.len() });
				}
				remaining = &remaining[count..];
			}
		}
		Ok(())
	}

	/// Flushes any buffered bytes to the underlying destination.
	fn flush(&mut self) -> Result;

	/// Releases this sink. Implementations should flush before releasing.
	fn close(&mut self) -> Result;
}

/// A sink that discards every byte written to it.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardSink;

impl Sink for DiscardSink {
	#[inline]
	fn write(&mut self, buf: &[u8]) -> Result<usize> {
		Ok(buf.len())
	}

	#[inline]
	fn flush(&mut self) -> Result {
		Ok(())
	}

	#[inline]
	fn close(&mut self) -> Result {
		Ok(())
	}
}

/// An in-memory sink collecting every byte written to it.
impl Sink for Vec<u8> {
	fn write(&mut self, buf: &[u8]) -> Result<usize> {
		self.extend_from_slice(buf);
		Ok(buf.len())
	}

	fn flush(&mut self) -> Result {
		Ok(())
	}

	fn close(&mut self) -> Result {
		Ok(())
	}
}

#[cfg(feature = "std")]
mod std_io {
	use std::io::Write;
	use crate::{Error, Result};
	use super::Sink;

	/// Adapts a [`std::io::Write`] channel or stream into a [`Sink`].
	pub struct WriteSink<W> {
		inner: W,
	}

	impl<W: Write> WriteSink<W> {
		/// Wraps a writable channel or stream.
		#[inline]
		pub fn new(inner: W) -> Self {
			Self { inner }
		}

		/// Unwraps the adapter, returning the underlying writer.
		#[inline]
		pub fn into_inner(self) -> W {
			self.inner
		}
	}

	impl<W: Write> Sink for WriteSink<W> {
		fn write(&mut self, buf: &[u8]) -> Result<usize> {
			self.inner.write(buf).map_err(Error::IoWrite)
		}

		fn write_all(&mut self, bufs: &[&[u8]]) -> Result {
			for buf in bufs {
				self.inner.write_all(buf).map_err(Error::IoWrite)?;
			}
			Ok(())
		}

		fn flush(&mut self) -> Result {
			self.inner.flush().map_err(Error::IoWrite)
		}

		fn close(&mut self) -> Result {
			self.inner.flush().map_err(Error::IoClose)
		}
	}
}

#[cfg(feature = "std")]
pub use std_io::WriteSink;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn discard_accepts_everything() {
		let mut sink = DiscardSink;
		assert_eq!(sink.write(b"hello").unwrap(), 5);
		sink.flush().unwrap();
		sink.close().unwrap();
	}

	#[test]
	fn vec_sink_collects_bytes() {
		let mut sink: Vec<u8> = Vec::new();
		sink.write(b"hello, ").unwrap();
		sink.write(b"world").unwrap();
		assert_eq!(sink, b"hello, world");
	}

	#[test]
	fn write_all_collects_multiple_buffers() {
		let mut sink: Vec<u8> = Vec::new();
		sink.write_all(&[b"a", b"bc", b"def"]).unwrap();
		assert_eq!(sink, b"abcdef");
	}

	struct ShortWriteSink {
		accepted: usize,
		written: Vec<u8>,
	}

	impl Sink for ShortWriteSink {
		fn write(&mut self, buf: &[u8]) -> Result<usize> {
			let count = buf.len().min(self.accepted);
			self.written.extend_from_slice(&buf[..count]);
			self.accepted -= count;
			Ok(count)
		}

		fn flush(&mut self) -> Result {
			Ok(())
		}

		fn close(&mut self) -> Result {
			Ok(())
		}
	}

	#[test]
	fn write_all_reports_write_zero_on_short_write() {
		let mut sink = ShortWriteSink { accepted: 2, written: Vec::new() };
		match sink.write_all(&[b"abcd"]) {
			Err(Error::WriteZero { remaining }) => assert_eq!(remaining, 2),
			other => panic!("expected write zero, got {other:?}"),
		}
		assert_eq!(sink.written, b"ab");
	}

	#[cfg(feature = "std")]
	#[test]
	fn write_sink_wraps_std_write() {
		let mut buf = Vec::new();
		let mut sink = WriteSink::new(&mut buf);
		sink.write(b"hi").unwrap();
		sink.flush().unwrap();
		assert_eq!(buf, b"hi");
	}
}
