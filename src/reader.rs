// Copyright 2024 - Strixpyrr
// SPDX-License-Identifier: Apache-2.0

//! The streaming MessagePack decoder.

extern crate alloc as core_alloc;

use core_alloc::string::{String, ToString};
use core_alloc::vec::Vec;
use core_alloc::vec;
use crate::alloc::{AuxGuard, BufferAllocator, UnpooledAllocator, DEFAULT_MAX_CAPACITY};
use crate::format::{self, ExtensionHeader, ValueType};
use crate::source::Source;
use crate::utf8;
use crate::{Error, Result};

/// The smallest working buffer capacity a [`Reader`] will accept: a tag byte
/// plus the widest primitive header (8 bytes).
pub const MIN_BUFFER_CAPACITY: usize = 9;

/// The working buffer capacity used by [`Reader::new`].
pub const DEFAULT_BUFFER_CAPACITY: usize = 8192;

/// Decodes MessagePack values from a [`Source`].
///
/// A reader owns a fixed-capacity working buffer and an allocator for
/// payloads too large for it. It is bound to exactly one source for its
/// lifetime; build one with [`Reader::new`] or a
/// [`ReaderBuilder`](crate::options::ReaderBuilder) for more control.
pub struct Reader<S, A = UnpooledAllocator> {
	source: S,
	allocator: A,
	buf: Vec<u8>,
	position: usize,
	limit: usize,
	closed: bool,
}

impl<S: Source> Reader<S, UnpooledAllocator> {
	/// Creates a reader with the default working buffer capacity and an
	/// unpooled allocator.
	pub fn new(source: S) -> Self {
		Self::with_capacity(source, DEFAULT_BUFFER_CAPACITY)
	}

	/// Creates a reader with the given working buffer capacity, clamped up
	/// to [`MIN_BUFFER_CAPACITY`] if necessary.
	pub fn with_capacity(source: S, capacity: usize) -> Self {
		let capacity = capacity.max(MIN_BUFFER_CAPACITY);
		Self::from_parts(source, UnpooledAllocator::new(DEFAULT_MAX_CAPACITY), vec![0; capacity])
	}
}

impl<S: Source, A: BufferAllocator> Reader<S, A> {
	/// Assembles a reader from already-validated parts. Callers (the
	/// convenience constructors above and
	/// [`ReaderBuilder`](crate::options::ReaderBuilder)) are responsible for
	/// ensuring `buf.len() >= MIN_BUFFER_CAPACITY`.
	pub(crate) fn from_parts(source: S, allocator: A, buf: Vec<u8>) -> Self {
		Self { source, allocator, buf, position: 0, limit: 0, closed: false }
	}

	fn ensure_remaining(&mut self, n: usize) -> Result {
		if self.closed {
			return Err(Error::Closed);
		}
		if self.limit - self.position >= n {
			return Ok(());
		}
		if n > self.buf.len() {
			return Err(Error::BufferTooSmall { capacity: self.buf.len() });
		}
		self.buf.copy_within(self.position..self.limit, 0);
		self.limit -= self.position;
		self.position = 0;
		while self.limit - self.position < n {
			let want = n - (self.limit - self.position);
			let read = self.source.read(&mut self.buf[self.limit..], want)?;
			if read == 0 {
				return Err(Error::PrematureEof {
					expected: n,
					actual_read: self.limit - self.position,
				});
			}
			self.limit += read;
		}
		Ok(())
	}

	fn fill_array<const N: usize>(&mut self) -> Result<[u8; N]> {
		self.ensure_remaining(N)?;
		let mut array = [0u8; N];
		array.copy_from_slice(&self.buf[self.position..self.position + N]);
		self.position += N;
		Ok(array)
	}

	fn peek_tag(&mut self) -> Result<u8> {
		self.ensure_remaining(1)?;
		Ok(self.buf[self.position])
	}

	fn read_tag(&mut self) -> Result<u8> {
		let [tag] = self.fill_array::<1>()?;
		Ok(tag)
	}

	/// Returns the logical type of the next value without consuming it.
	///
	/// # Errors
	///
	/// Fails with [`Error::WrongType`] if the next tag is the reserved byte
	/// `0xc1`.
	pub fn next_type(&mut self) -> Result<ValueType> {
		let tag = self.peek_tag()?;
		let value_type = format::value_type(tag);
		if value_type == ValueType::Reserved {
			return Err(Error::WrongType { tag, requested: ValueType::Reserved });
		}
		Ok(value_type)
	}

	/// Reads a nil value.
	pub fn read_nil(&mut self) -> Result {
		let tag = self.read_tag()?;
		if tag == format::NIL {
			Ok(())
		} else {
			Err(Error::WrongType { tag, requested: ValueType::Nil })
		}
	}

	/// Reads a boolean value.
	pub fn read_bool(&mut self) -> Result<bool> {
		let tag = self.read_tag()?;
		match tag {
			format::TRUE => Ok(true),
			format::FALSE => Ok(false),
			_ => Err(Error::WrongType { tag, requested: ValueType::Boolean }),
		}
	}

	fn decode_int_wide(&mut self) -> Result<(i128, u8)> {
		let tag = self.read_tag()?;
		let value: i128 = if format::is_pos_fixint(tag) {
			tag as i128
		} else if format::is_neg_fixint(tag) {
			(tag as i8) as i128
		} else {
			match tag {
				format::UINT8 => {
					let [b] = self.fill_array::<1>()?;
					b as i128
				}
				format::UINT16 => u16::from_be_bytes(self.fill_array::<2>()?) as i128,
				format::UINT32 => u32::from_be_bytes(self.fill_array::<4>()?) as i128,
				format::UINT64 => u64::from_be_bytes(self.fill_array::<8>()?) as i128,
				format::INT8 => {
					let [b] = self.fill_array::<1>()?;
					(b as i8) as i128
				}
				format::INT16 => i16::from_be_bytes(self.fill_array::<2>()?) as i128,
				format::INT32 => i32::from_be_bytes(self.fill_array::<4>()?) as i128,
				format::INT64 => i64::from_be_bytes(self.fill_array::<8>()?) as i128,
				_ => return Err(Error::WrongType { tag, requested: ValueType::Integer }),
			}
		};
		Ok((value, tag))
	}

	fn narrow<T>(
		value: i128,
		tag: u8,
		target: &'static str,
		min: i128,
		max: i128,
		convert: fn(i128) -> T,
	) -> Result<T> {
		if value < min || value > max {
			Err(Error::IntegerOverflow { value, tag, target })
		} else {
			Ok(convert(value))
		}
	}

	/// Reads an integer, narrowing to `u8`.
	pub fn read_u8(&mut self) -> Result<u8> {
		let (value, tag) = self.decode_int_wide()?;
		Self::narrow(value, tag, "u8", 0, u8::MAX as i128, |v| v as u8)
	}

	/// Reads an integer, narrowing to `u16`.
	pub fn read_u16(&mut self) -> Result<u16> {
		let (value, tag) = self.decode_int_wide()?;
		Self::narrow(value, tag, "u16", 0, u16::MAX as i128, |v| v as u16)
	}

	/// Reads an integer, narrowing to `u32`.
	pub fn read_u32(&mut self) -> Result<u32> {
		let (value, tag) = self.decode_int_wide()?;
		Self::narrow(value, tag, "u32", 0, u32::MAX as i128, |v| v as u32)
	}

	/// Reads an integer, narrowing to `u64`.
	pub fn read_u64(&mut self) -> Result<u64> {
		let (value, tag) = self.decode_int_wide()?;
		Self::narrow(value, tag, "u64", 0, u64::MAX as i128, |v| v as u64)
	}

	/// Reads an integer, narrowing to `i8`.
	pub fn read_i8(&mut self) -> Result<i8> {
		let (value, tag) = self.decode_int_wide()?;
		Self::narrow(value, tag, "i8", i8::MIN as i128, i8::MAX as i128, |v| v as i8)
	}

	/// Reads an integer, narrowing to `i16`.
	pub fn read_i16(&mut self) -> Result<i16> {
		let (value, tag) = self.decode_int_wide()?;
		Self::narrow(value, tag, "i16", i16::MIN as i128, i16::MAX as i128, |v| v as i16)
	}

	/// Reads an integer, narrowing to `i32`.
	pub fn read_i32(&mut self) -> Result<i32> {
		let (value, tag) = self.decode_int_wide()?;
		Self::narrow(value, tag, "i32", i32::MIN as i128, i32::MAX as i128, |v| v as i32)
	}

	/// Reads an integer, narrowing to `i64`.
	pub fn read_i64(&mut self) -> Result<i64> {
		let (value, tag) = self.decode_int_wide()?;
		Self::narrow(value, tag, "i64", i64::MIN as i128, i64::MAX as i128, |v| v as i64)
	}

	/// Reads a 32-bit float.
	pub fn read_f32(&mut self) -> Result<f32> {
		let tag = self.read_tag()?;
		if tag != format::FLOAT32 {
			return Err(Error::WrongType { tag, requested: ValueType::Float });
		}
		Ok(f32::from_be_bytes(self.fill_array::<4>()?))
	}

	/// Reads a 64-bit float.
	pub fn read_f64(&mut self) -> Result<f64> {
		let tag = self.read_tag()?;
		if tag != format::FLOAT64 {
			return Err(Error::WrongType { tag, requested: ValueType::Float });
		}
		Ok(f64::from_be_bytes(self.fill_array::<8>()?))
	}

	fn check_length(length: u32, value_type: ValueType) -> Result<u32> {
		if length > i32::MAX as u32 {
			Err(Error::LengthTooLarge { length, value_type })
		} else {
			Ok(length)
		}
	}

	/// Reads an array header, returning the element count. The caller must
	/// follow with exactly that many reads before reading a sibling value.
	pub fn read_array_header(&mut self) -> Result<u32> {
		let tag = self.read_tag()?;
		if format::is_fixarray(tag) {
			return Ok(format::fixarray_len(tag) as u32);
		}
		match tag {
			format::ARRAY16 => Ok(u16::from_be_bytes(self.fill_array::<2>()?) as u32),
			format::ARRAY32 => {
				let length = u32::from_be_bytes(self.fill_array::<4>()?);
				Self::check_length(length, ValueType::Array)
			}
			_ => Err(Error::WrongType { tag, requested: ValueType::Array }),
		}
	}

	/// Reads a map header, returning the key/value pair count. The caller
	/// must follow with exactly `2 * count` reads before reading a sibling
	/// value.
	pub fn read_map_header(&mut self) -> Result<u32> {
		let tag = self.read_tag()?;
		if format::is_fixmap(tag) {
			return Ok(format::fixmap_len(tag) as u32);
		}
		match tag {
			format::MAP16 => Ok(u16::from_be_bytes(self.fill_array::<2>()?) as u32),
			format::MAP32 => {
				let length = u32::from_be_bytes(self.fill_array::<4>()?);
				Self::check_length(length, ValueType::Map)
			}
			_ => Err(Error::WrongType { tag, requested: ValueType::Map }),
		}
	}

	/// Reads a binary header, returning the payload byte length. Follow with
	/// [`read_payload`](Self::read_payload) to consume the bytes.
	pub fn read_bin_header(&mut self) -> Result<u32> {
		let tag = self.read_tag()?;
		match tag {
			format::BIN8 => {
				let [b] = self.fill_array::<1>()?;
				Ok(b as u32)
			}
			format::BIN16 => Ok(u16::from_be_bytes(self.fill_array::<2>()?) as u32),
			format::BIN32 => {
				let length = u32::from_be_bytes(self.fill_array::<4>()?);
				Self::check_length(length, ValueType::Binary)
			}
			_ => Err(Error::WrongType { tag, requested: ValueType::Binary }),
		}
	}

	/// Reads a string header, returning the UTF-8 byte length. Most callers
	/// want [`read_str`](Self::read_str) instead.
	pub fn read_str_header(&mut self) -> Result<u32> {
		let tag = self.read_tag()?;
		if format::is_fixstr(tag) {
			return Ok(format::fixstr_len(tag) as u32);
		}
		match tag {
			format::STR8 => {
				let [b] = self.fill_array::<1>()?;
				Ok(b as u32)
			}
			format::STR16 => Ok(u16::from_be_bytes(self.fill_array::<2>()?) as u32),
			format::STR32 => {
				let length = u32::from_be_bytes(self.fill_array::<4>()?);
				Self::check_length(length, ValueType::String)
			}
			_ => Err(Error::WrongType { tag, requested: ValueType::String }),
		}
	}

	/// Reads an extension header: a byte length and application type code.
	pub fn read_ext_header(&mut self) -> Result<ExtensionHeader> {
		let tag = self.read_tag()?;
		let length = match tag {
			format::FIXEXT1 => 1,
			format::FIXEXT2 => 2,
			format::FIXEXT4 => 4,
			format::FIXEXT8 => 8,
			format::FIXEXT16 => 16,
			format::EXT8 => {
				let [b] = self.fill_array::<1>()?;
				b as u32
			}
			format::EXT16 => u16::from_be_bytes(self.fill_array::<2>()?) as u32,
			format::EXT32 => {
				let length = u32::from_be_bytes(self.fill_array::<4>()?);
				Self::check_length(length, ValueType::Extension)?
			}
			_ => return Err(Error::WrongType { tag, requested: ValueType::Extension }),
		};
		let [kind] = self.fill_array::<1>()?;
		Ok(ExtensionHeader { length, kind: kind as i8 })
	}

	/// Reads exactly `buf.len()` payload bytes, bypassing the working buffer
	/// for requests larger than its capacity.
	pub fn read_payload(&mut self, buf: &mut [u8]) -> Result {
		if self.closed {
			return Err(Error::Closed);
		}
		let available = (self.limit - self.position).min(buf.len());
		buf[..available].copy_from_slice(&self.buf[self.position..self.position + available]);
		self.position += available;
		let mut filled = available;
		while filled < buf.len() {
			let read = self.source.read(&mut buf[filled..], buf.len() - filled)?;
			if read == 0 {
				return Err(Error::PrematureEof { expected: buf.len(), actual_read: filled });
			}
			filled += read;
		}
		Ok(())
	}

	/// Reads a string, decoding its UTF-8 payload.
	///
	/// If the payload fits the working buffer, it's decoded in place;
	/// otherwise an auxiliary buffer is acquired from the allocator, filled
	/// from any already-buffered prefix plus the source, decoded, and
	/// released back to the allocator before returning.
	pub fn read_str(&mut self) -> Result<String> {
		let length = self.read_str_header()? as usize;
		if length <= self.buf.len() {
			self.ensure_remaining(length)?;
			let text = utf8::decode_str(&self.buf[self.position..self.position + length])?
				.to_string();
			self.position += length;
			Ok(text)
		} else {
			let available = (self.limit - self.position).min(length);
			let prefix = self.buf[self.position..self.position + available].to_vec();
			self.position += available;
			Self::fill_aux_and_decode(&mut self.source, &self.allocator, &prefix, length)
		}
	}

	fn fill_aux_and_decode(
		source: &mut S,
		allocator: &A,
		prefix: &[u8],
		length: usize,
	) -> Result<String> {
		let mut aux = allocator.byte_buffer(length)?;
		aux.resize(length, 0);
		let mut guard = AuxGuard { allocator, buffer: Some(aux) };
		let buffer = guard.buffer.as_mut().expect("guard just initialized");
		buffer[..prefix.len()].copy_from_slice(prefix);
		let mut filled = prefix.len();
		while filled < length {
			let buffer = guard.buffer.as_mut().expect("guard just initialized");
			let read = source.read(&mut buffer[filled..], length - filled)?;
			if read == 0 {
				return Err(Error::PrematureEof { expected: length, actual_read: filled });
			}
			filled += read;
		}
		let buffer = guard.buffer.as_ref().expect("guard just initialized");
		Ok(utf8::decode_str(buffer)?.to_string())
	}

	/// Closes the source. Subsequent operations fail with [`Error::Closed`].
	/// Idempotent: closing an already-closed reader is a no-op success.
	pub fn close(&mut self) -> Result {
		if self.closed {
			return Ok(());
		}
		self.closed = true;
		self.source.close()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn reader_over(data: &[u8]) -> Reader<&[u8], UnpooledAllocator> {
		Reader::new(data)
	}

	#[test]
	fn reads_nil_and_bool() {
		let mut r = reader_over(&[0xc0, 0xc2, 0xc3]);
		r.read_nil().unwrap();
		assert_eq!(r.read_bool().unwrap(), false);
		assert_eq!(r.read_bool().unwrap(), true);
	}

	#[test]
	fn reads_fixint() {
		let mut r = reader_over(&[0x2a]);
		assert_eq!(r.read_i32().unwrap(), 42);
	}

	#[test]
	fn hello_and_42_scenario() {
		let bytes = [
			0xae, 0x48, 0x65, 0x6c, 0x6c, 0x6f, 0x2c, 0x20, 0x4d, 0x78, 0x50, 0x61, 0x63, 0x6b,
			0x21, 0x2a,
		];
		let mut r = reader_over(&bytes);
		assert_eq!(r.read_str().unwrap(), "Hello, MxPack!");
		assert_eq!(r.read_i32().unwrap(), 42);
	}

	#[test]
	fn integer_width_scenario() {
		let bytes = [0xd2, 0xff, 0xff, 0x7f, 0xff];
		let mut r = reader_over(&bytes);
		match r.read_i16() {
			Err(Error::IntegerOverflow { value, target, .. }) => {
				assert_eq!(value, -32769);
				assert_eq!(target, "i16");
			}
			other => panic!("expected overflow, got {other:?}"),
		}
		let mut r = reader_over(&bytes);
		assert_eq!(r.read_i32().unwrap(), -32769);
	}

	#[test]
	fn array_header_and_children_scenario() {
		let bytes = [0x93, 0x01, 0xa1, 0x61, 0xc3];
		let mut r = reader_over(&bytes);
		assert_eq!(r.read_array_header().unwrap(), 3);
		assert_eq!(r.read_i32().unwrap(), 1);
		assert_eq!(r.read_str().unwrap(), "a");
		assert_eq!(r.read_bool().unwrap(), true);
	}

	#[test]
	fn large_string_scenario() {
		let text = "a".repeat(1_048_576);
		let mut bytes = Vec::with_capacity(5 + text.len());
		bytes.push(format::STR32);
		bytes.extend_from_slice(&(text.len() as u32).to_be_bytes());
		bytes.extend_from_slice(text.as_bytes());
		let mut r = Reader::with_capacity(&bytes[..], 1024);
		assert_eq!(r.read_str().unwrap(), text);
	}

	#[test]
	fn premature_eof_scenario() {
		let bytes = [0xd2, 0x00, 0x00];
		let mut r = reader_over(&bytes);
		match r.read_i32() {
			Err(Error::PrematureEof { expected, actual_read }) => {
				assert_eq!(expected, 4);
				assert_eq!(actual_read, 2);
			}
			other => panic!("expected premature eof, got {other:?}"),
		}
	}

	#[test]
	fn reserved_tag_scenario() {
		let bytes = [0xc1];
		let mut r = reader_over(&bytes);
		match r.next_type() {
			Err(Error::WrongType { tag, .. }) => assert_eq!(tag, 0xc1),
			other => panic!("expected wrong type, got {other:?}"),
		}
	}

	#[test]
	fn array_header_mismatch_reports_array_not_map() {
		let bytes = [0xc0]; // nil, not an array
		let mut r = reader_over(&bytes);
		match r.read_array_header() {
			Err(Error::WrongType { requested, .. }) => assert_eq!(requested, ValueType::Array),
			other => panic!("expected wrong type, got {other:?}"),
		}
	}

	#[test]
	fn closed_reader_rejects_further_reads() {
		let mut r = reader_over(&[0xc0]);
		r.close().unwrap();
		assert!(matches!(r.read_nil(), Err(Error::Closed)));
		r.close().unwrap();
	}

	#[test]
	fn one_byte_at_a_time_source_still_succeeds() {
		struct OneByte<'a>(&'a [u8]);
		impl<'a> Source for OneByte<'a> {
			fn read(&mut self, buf: &mut [u8], _min_hint: usize) -> Result<usize> {
				if self.0.is_empty() || buf.is_empty() {
					return Ok(0);
				}
				buf[0] = self.0[0];
				self.0 = &self.0[1..];
				Ok(1)
			}

			fn skip(&mut self, count: usize) -> Result<usize> {
				let count = count.min(self.0.len());
				self.0 = &self.0[count..];
				Ok(count)
			}

			fn close(&mut self) -> Result {
				Ok(())
			}
		}

		let bytes = [0xd2, 0x00, 0x01, 0x02, 0x03];
		let mut r = Reader::new(OneByte(&bytes));
		assert_eq!(r.read_i32().unwrap(), 0x0001_0203);
	}
}
