// Copyright 2024 - Strixpyrr
// SPDX-License-Identifier: Apache-2.0

//! The streaming MessagePack encoder.

extern crate alloc as core_alloc;

use core_alloc::vec;
use core_alloc::vec::Vec;
use crate::alloc::{AuxGuard, BufferAllocator, UnpooledAllocator, DEFAULT_MAX_CAPACITY};
use crate::format;
use crate::sink::Sink;
use crate::{Error, Result};

/// The smallest working buffer capacity a [`Writer`] will accept.
pub const MIN_BUFFER_CAPACITY: usize = 9;

/// The working buffer capacity used by [`Writer::new`].
pub const DEFAULT_BUFFER_CAPACITY: usize = 8192;

/// Encodes MessagePack values onto a [`Sink`].
///
/// A writer owns a fixed-capacity working buffer and always chooses the
/// smallest tag that faithfully represents the value written. Build one with
/// [`Writer::new`] or a [`WriterBuilder`](crate::options::WriterBuilder) for
/// more control.
pub struct Writer<S, A = UnpooledAllocator> {
	sink: S,
	allocator: A,
	buf: Vec<u8>,
	position: usize,
	closed: bool,
}

impl<S: Sink> Writer<S, UnpooledAllocator> {
	/// Creates a writer with the default working buffer capacity and an
	/// unpooled allocator.
	pub fn new(sink: S) -> Self {
		Self::with_capacity(sink, DEFAULT_BUFFER_CAPACITY)
	}

	/// Creates a writer with the given working buffer capacity, clamped up
	/// to [`MIN_BUFFER_CAPACITY`] if necessary.
	pub fn with_capacity(sink: S, capacity: usize) -> Self {
		let capacity = capacity.max(MIN_BUFFER_CAPACITY);
		Self::from_parts(sink, UnpooledAllocator::new(DEFAULT_MAX_CAPACITY), vec![0; capacity])
	}
}

impl<S: Sink, A: BufferAllocator> Writer<S, A> {
	/// Assembles a writer from already-validated parts. Callers (the
	/// convenience constructors above and
	/// [`WriterBuilder`](crate::options::WriterBuilder)) are responsible for
	/// ensuring `buf.len() >= MIN_BUFFER_CAPACITY`.
	pub(crate) fn from_parts(sink: S, allocator: A, buf: Vec<u8>) -> Self {
		Self { sink, allocator, buf, position: 0, closed: false }
	}

	/// Unwraps the writer, returning the underlying sink. Any buffered bytes
	/// not yet flushed are discarded; call [`flush`](Self::flush) first if
	/// that matters.
	pub fn into_sink(self) -> S {
		self.sink
	}

	/// Flushes the working buffer to the sink, whenever a new primitive
	/// would not fit and on explicit [`flush`](Self::flush)/[`close`](Self::close).
	fn flush_buffer(&mut self) -> Result {
		if self.position == 0 {
			return Ok(());
		}
		self.sink.write_all(&[&self.buf[..self.position]])?;
		self.position = 0;
		Ok(())
	}

	fn ensure_capacity(&mut self, n: usize) -> Result {
		if self.closed {
			return Err(Error::Closed);
		}
		if n > self.buf.len() {
			return Err(Error::BufferTooSmall { capacity: self.buf.len() });
		}
		if self.buf.len() - self.position < n {
			self.flush_buffer()?;
		}
		Ok(())
	}

	fn put(&mut self, bytes: &[u8]) {
		self.buf[self.position..self.position + bytes.len()].copy_from_slice(bytes);
		self.position += bytes.len();
	}

	fn put_tag(&mut self, tag: u8) -> Result {
		self.ensure_capacity(1)?;
		self.put(&[tag]);
		Ok(())
	}

	fn put_tagged<const N: usize>(&mut self, tag: u8, bytes: [u8; N]) -> Result {
		self.ensure_capacity(1 + N)?;
		self.put(&[tag]);
		self.put(&bytes);
		Ok(())
	}

	/// Writes a nil value.
	pub fn write_nil(&mut self) -> Result {
		self.put_tag(format::NIL)
	}

	/// Writes a boolean value.
	pub fn write_bool(&mut self, value: bool) -> Result {
		self.put_tag(if value { format::TRUE } else { format::FALSE })
	}

	/// Writes an unsigned integer, choosing the smallest faithful tag.
	pub fn write_u64(&mut self, value: u64) -> Result {
		if value < 128 {
			self.put_tag(value as u8)
		} else if value < 256 {
			self.put_tagged(format::UINT8, [value as u8])
		} else if value < 65536 {
			self.put_tagged(format::UINT16, (value as u16).to_be_bytes())
		} else if value < (1u64 << 32) {
			self.put_tagged(format::UINT32, (value as u32).to_be_bytes())
		} else {
			self.put_tagged(format::UINT64, value.to_be_bytes())
		}
	}

	/// Writes an unsigned 8-bit integer.
	pub fn write_u8(&mut self, value: u8) -> Result {
		self.write_u64(value as u64)
	}

	/// Writes an unsigned 16-bit integer.
	pub fn write_u16(&mut self, value: u16) -> Result {
		self.write_u64(value as u64)
	}

	/// Writes an unsigned 32-bit integer.
	pub fn write_u32(&mut self, value: u32) -> Result {
		self.write_u64(value as u64)
	}

	/// Writes a signed integer, choosing the smallest faithful tag.
	pub fn write_i64(&mut self, value: i64) -> Result {
		if value >= 0 {
			return self.write_u64(value as u64);
		}
		if value >= -32 {
			self.put_tag(value as i8 as u8)
		} else if value >= i8::MIN as i64 {
			self.put_tagged(format::INT8, [(value as i8) as u8])
		} else if value >= i16::MIN as i64 {
			self.put_tagged(format::INT16, (value as i16).to_be_bytes())
		} else if value >= i32::MIN as i64 {
			self.put_tagged(format::INT32, (value as i32).to_be_bytes())
		} else {
			self.put_tagged(format::INT64, value.to_be_bytes())
		}
	}

	/// Writes a signed 8-bit integer.
	pub fn write_i8(&mut self, value: i8) -> Result {
		self.write_i64(value as i64)
	}

	/// Writes a signed 16-bit integer.
	pub fn write_i16(&mut self, value: i16) -> Result {
		self.write_i64(value as i64)
	}

	/// Writes a signed 32-bit integer.
	pub fn write_i32(&mut self, value: i32) -> Result {
		self.write_i64(value as i64)
	}

	/// Writes a 32-bit float.
	pub fn write_f32(&mut self, value: f32) -> Result {
		self.put_tagged(format::FLOAT32, value.to_be_bytes())
	}

	/// Writes a 64-bit float.
	pub fn write_f64(&mut self, value: f64) -> Result {
		self.put_tagged(format::FLOAT64, value.to_be_bytes())
	}

	/// Writes an array header for `count` upcoming elements. The caller must
	/// follow with exactly `count` writes before writing a sibling value.
	pub fn write_array_header(&mut self, count: u32) -> Result {
		if count <= 15 {
			self.put_tag(0x90 | count as u8)
		} else if count <= 65535 {
			self.put_tagged(format::ARRAY16, (count as u16).to_be_bytes())
		} else {
			self.put_tagged(format::ARRAY32, count.to_be_bytes())
		}
	}

	/// Writes a map header for `count` upcoming key/value pairs. The caller
	/// must follow with exactly `2 * count` writes before writing a sibling
	/// value.
	pub fn write_map_header(&mut self, count: u32) -> Result {
		if count <= 15 {
			self.put_tag(0x80 | count as u8)
		} else if count <= 65535 {
			self.put_tagged(format::MAP16, (count as u16).to_be_bytes())
		} else {
			self.put_tagged(format::MAP32, count.to_be_bytes())
		}
	}

	/// Writes a binary header for a `length`-byte payload. Follow with
	/// [`write_payload`](Self::write_payload) to write the bytes.
	pub fn write_bin_header(&mut self, length: u32) -> Result {
		if length < 256 {
			self.put_tagged(format::BIN8, [length as u8])
		} else if length < 65536 {
			self.put_tagged(format::BIN16, (length as u16).to_be_bytes())
		} else {
			self.put_tagged(format::BIN32, length.to_be_bytes())
		}
	}

	/// Writes a string header for a `length`-byte UTF-8 payload. Most
	/// callers want [`write_str`](Self::write_str) instead.
	pub fn write_str_header(&mut self, length: u32) -> Result {
		if length < 32 {
			self.put_tag(0xa0 | length as u8)
		} else if length < 256 {
			self.put_tagged(format::STR8, [length as u8])
		} else if length < 65536 {
			self.put_tagged(format::STR16, (length as u16).to_be_bytes())
		} else {
			self.put_tagged(format::STR32, length.to_be_bytes())
		}
	}

	/// Writes an extension header: a byte length and application type code.
	pub fn write_ext_header(&mut self, length: u32, kind: i8) -> Result {
		match length {
			1 => return self.put_tagged(format::FIXEXT1, [kind as u8]),
			2 => return self.put_tagged(format::FIXEXT2, [kind as u8]),
			4 => return self.put_tagged(format::FIXEXT4, [kind as u8]),
			8 => return self.put_tagged(format::FIXEXT8, [kind as u8]),
			16 => return self.put_tagged(format::FIXEXT16, [kind as u8]),
			_ => {}
		}
		if length < 256 {
			self.put_tagged(format::EXT8, [length as u8])?;
		} else if length < 65536 {
			self.put_tagged(format::EXT16, (length as u16).to_be_bytes())?;
		} else {
			self.put_tagged(format::EXT32, length.to_be_bytes())?;
		}
		self.ensure_capacity(1)?;
		self.put(&[kind as u8]);
		Ok(())
	}

	/// Writes a payload directly, bypassing the working buffer for chunks
	/// larger than its capacity.
	///
	/// A payload that doesn't fit the working buffer is streamed through an
	/// auxiliary buffer acquired from the allocator, one working-buffer-sized
	/// chunk at a time, rather than handed to the sink in one unbounded
	/// write. A restrictively configured allocator therefore still bounds the
	/// size of writes that reach the sink, surfacing
	/// [`Error::CapacityExceeded`] instead of silently writing through.
	pub fn write_payload(&mut self, buf: &[u8]) -> Result {
		if self.closed {
			return Err(Error::Closed);
		}
		if buf.len() <= self.buf.len() {
			self.ensure_capacity(buf.len())?;
			self.put(buf);
			Ok(())
		} else {
			self.flush_buffer()?;
			self.write_chunked(buf)
		}
	}

	/// Streams `buf` to the sink in chunks no larger than the working
	/// buffer's capacity, copying each chunk through an auxiliary buffer
	/// acquired from the allocator and released on every exit path.
	fn write_chunked(&mut self, buf: &[u8]) -> Result {
		let Self { sink, allocator, buf: working, .. } = self;
		let chunk_capacity = working.len();
		let aux = allocator.byte_buffer(chunk_capacity)?;
		let mut guard = AuxGuard { allocator: &*allocator, buffer: Some(aux) };
		let mut remaining = buf;
		while !remaining.is_empty() {
			let take = remaining.len().min(chunk_capacity);
			let chunk = guard.buffer.as_mut().expect("guard just initialized");
			chunk.clear();
			chunk.extend_from_slice(&remaining[..take]);
			sink.write_all(&[chunk.as_slice()])?;
			remaining = &remaining[take..];
		}
		Ok(())
	}

	/// Writes a binary value: header followed by payload.
	pub fn write_bin(&mut self, buf: &[u8]) -> Result {
		self.write_bin_header(buf.len() as u32)?;
		self.write_payload(buf)
	}

	/// Writes an extension value: header followed by payload.
	pub fn write_ext(&mut self, kind: i8, buf: &[u8]) -> Result {
		self.write_ext_header(buf.len() as u32, kind)?;
		self.write_payload(buf)
	}

	/// Writes a string value: header followed by its UTF-8 payload.
	///
	/// If the encoded bytes fit the remaining working buffer capacity
	/// they're copied in; otherwise the header is written eagerly and the
	/// payload spilled to the sink directly.
	pub fn write_str(&mut self, value: &str) -> Result {
		let bytes = value.as_bytes();
		self.write_str_header(bytes.len() as u32)?;
		self.write_payload(bytes)
	}

	/// Flushes the working buffer to the sink.
	pub fn flush(&mut self) -> Result {
		if self.closed {
			return Err(Error::Closed);
		}
		self.flush_buffer()?;
		self.sink.flush()
	}

	/// Flushes then closes the sink. Idempotent: closing an already-closed
	/// writer is a no-op success.
	pub fn close(&mut self) -> Result {
		if self.closed {
			return Ok(());
		}
		self.flush_buffer()?;
		self.closed = true;
		self.sink.close()
	}
}
