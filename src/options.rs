// Copyright 2024 - Strixpyrr
// SPDX-License-Identifier: Apache-2.0

//! Builders for configuring a [`Reader`]/[`Writer`] beyond the defaults used
//! by their `new` constructors.

extern crate alloc as core_alloc;

use core_alloc::vec;
use core_alloc::vec::Vec;
use crate::alloc::{BufferAllocator, UnpooledAllocator, DEFAULT_MAX_CAPACITY};
use crate::reader::{Reader, MIN_BUFFER_CAPACITY as READER_MIN_CAPACITY, DEFAULT_BUFFER_CAPACITY as READER_DEFAULT_CAPACITY};
use crate::writer::{Writer, MIN_BUFFER_CAPACITY as WRITER_MIN_CAPACITY, DEFAULT_BUFFER_CAPACITY as WRITER_DEFAULT_CAPACITY};
use crate::sink::Sink;
use crate::source::Source;
use crate::{Error, Result};

/// Builds a [`Reader`] from an explicit source plus optional knobs.
///
/// The allocator is always present in the builder's type state — it starts
/// as an [`UnpooledAllocator`] and [`allocator`](Self::allocator) swaps it
/// for a different implementation, changing the builder's (and the
/// resulting reader's) second type parameter.
pub struct ReaderBuilder<S, A = UnpooledAllocator> {
	source: Option<S>,
	allocator: A,
	buffer: Option<Vec<u8>>,
	read_buffer_capacity: usize,
}

impl<S> ReaderBuilder<S, UnpooledAllocator> {
	/// Creates a builder with no source and every knob at its documented
	/// default.
	pub fn new() -> Self {
		Self {
			source: None,
			allocator: UnpooledAllocator::new(DEFAULT_MAX_CAPACITY),
			buffer: None,
			read_buffer_capacity: READER_DEFAULT_CAPACITY,
		}
	}

	/// Sets the maximum capacity of the default [`UnpooledAllocator`].
	/// Defaults to 1 MiB. Has no effect once a custom allocator has been
	/// supplied via [`allocator`](Self::allocator).
	pub fn max_allocator_capacity(mut self, max: usize) -> Self {
		self.allocator = UnpooledAllocator::new(max);
		self
	}
}

impl<S> Default for ReaderBuilder<S, UnpooledAllocator> {
	fn default() -> Self {
		Self::new()
	}
}

impl<S: Source, A: BufferAllocator> ReaderBuilder<S, A> {
	/// Sets the source the reader will decode from. Required.
	pub fn source(mut self, source: S) -> Self {
		self.source = Some(source);
		self
	}

	/// Replaces the allocator used for payloads too large for the working
	/// buffer.
	pub fn allocator<A2: BufferAllocator>(self, allocator: A2) -> ReaderBuilder<S, A2> {
		ReaderBuilder {
			source: self.source,
			allocator,
			buffer: self.buffer,
			read_buffer_capacity: self.read_buffer_capacity,
		}
	}

	/// Supplies a pre-sized working buffer directly, overriding
	/// [`read_buffer_capacity`](Self::read_buffer_capacity).
	pub fn buffer(mut self, buffer: Vec<u8>) -> Self {
		self.buffer = Some(buffer);
		self
	}

	/// Sets the working buffer capacity, when no explicit
	/// [`buffer`](Self::buffer) was supplied. Defaults to 8192; the minimum
	/// is 9 bytes.
	pub fn read_buffer_capacity(mut self, capacity: usize) -> Self {
		self.read_buffer_capacity = capacity;
		self
	}

	/// Finalizes the builder into a [`Reader`].
	///
	/// # Errors
	///
	/// Returns [`Error::SourceRequired`] if no source was supplied, or
	/// [`Error::BufferTooSmall`] if the resolved working buffer capacity is
	/// below 9 bytes.
	pub fn build(self) -> Result<Reader<S, A>> {
		let source = self.source.ok_or(Error::SourceRequired)?;
		let buffer = match self.buffer {
			Some(buffer) => buffer,
			None => vec![0; self.read_buffer_capacity],
		};
		if buffer.len() < READER_MIN_CAPACITY {
			return Err(Error::BufferTooSmall { capacity: buffer.len() });
		}
		Ok(Reader::from_parts(source, self.allocator, buffer))
	}
}

/// Builds a [`Writer`] from an explicit sink plus optional knobs.
///
/// See [`ReaderBuilder`] for the allocator type-state convention this
/// mirrors.
pub struct WriterBuilder<S, A = UnpooledAllocator> {
	sink: Option<S>,
	allocator: A,
	buffer: Option<Vec<u8>>,
	write_buffer_capacity: usize,
}

impl<S> WriterBuilder<S, UnpooledAllocator> {
	/// Creates a builder with no sink and every knob at its documented
	/// default.
	pub fn new() -> Self {
		Self {
			sink: None,
			allocator: UnpooledAllocator::new(DEFAULT_MAX_CAPACITY),
			buffer: None,
			write_buffer_capacity: WRITER_DEFAULT_CAPACITY,
		}
	}

	/// Sets the maximum capacity of the default [`UnpooledAllocator`].
	/// Defaults to 1 MiB. Has no effect once a custom allocator has been
	/// supplied via [`allocator`](Self::allocator).
	pub fn max_allocator_capacity(mut self, max: usize) -> Self {
		self.allocator = UnpooledAllocator::new(max);
		self
	}
}

impl<S> Default for WriterBuilder<S, UnpooledAllocator> {
	fn default() -> Self {
		Self::new()
	}
}

impl<S: Sink, A: BufferAllocator> WriterBuilder<S, A> {
	/// Sets the sink the writer will encode onto. Required.
	pub fn sink(mut self, sink: S) -> Self {
		self.sink = Some(sink);
		self
	}

	/// Replaces the allocator used for payloads too large for the working
	/// buffer.
	pub fn allocator<A2: BufferAllocator>(self, allocator: A2) -> WriterBuilder<S, A2> {
		WriterBuilder {
			sink: self.sink,
			allocator,
			buffer: self.buffer,
			write_buffer_capacity: self.write_buffer_capacity,
		}
	}

	/// Supplies a pre-sized working buffer directly, overriding
	/// [`write_buffer_capacity`](Self::write_buffer_capacity).
	pub fn buffer(mut self, buffer: Vec<u8>) -> Self {
		self.buffer = Some(buffer);
		self
	}

	/// Sets the working buffer capacity, when no explicit
	/// [`buffer`](Self::buffer) was supplied. Defaults to 8192; the minimum
	/// is 9 bytes.
	pub fn write_buffer_capacity(mut self, capacity: usize) -> Self {
		self.write_buffer_capacity = capacity;
		self
	}

	/// Finalizes the builder into a [`Writer`].
	///
	/// # Errors
	///
	/// Returns [`Error::SinkRequired`] if no sink was supplied, or
	/// [`Error::BufferTooSmall`] if the resolved working buffer capacity is
	/// below 9 bytes.
	pub fn build(self) -> Result<Writer<S, A>> {
		let sink = self.sink.ok_or(Error::SinkRequired)?;
		let buffer = match self.buffer {
			Some(buffer) => buffer,
			None => vec![0; self.write_buffer_capacity],
		};
		if buffer.len() < WRITER_MIN_CAPACITY {
			return Err(Error::BufferTooSmall { capacity: buffer.len() });
		}
		Ok(Writer::from_parts(sink, self.allocator, buffer))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::Result;

	#[test]
	fn reader_build_requires_source() {
		let builder: ReaderBuilder<&[u8]> = ReaderBuilder::new();
		assert!(matches!(builder.build(), Err(Error::SourceRequired)));
	}

	#[test]
	fn reader_build_rejects_tiny_buffer() {
		let data = [0u8; 4];
		let builder = ReaderBuilder::new().source(&data[..]).read_buffer_capacity(4);
		assert!(matches!(builder.build(), Err(Error::BufferTooSmall { capacity: 4 })));
	}

	#[test]
	fn reader_builds_and_reads() -> Result {
		let data = [0xc0];
		let mut reader = ReaderBuilder::new().source(&data[..]).build()?;
		reader.read_nil()?;
		Ok(())
	}

	#[test]
	fn writer_build_requires_sink() {
		let builder: WriterBuilder<Vec<u8>> = WriterBuilder::new();
		assert!(matches!(builder.build(), Err(Error::SinkRequired)));
	}

	#[test]
	fn writer_builds_and_writes() -> Result {
		let mut writer = WriterBuilder::new().sink(Vec::new()).build()?;
		writer.write_nil()?;
		writer.close()?;
		Ok(())
	}

	#[test]
	fn writer_custom_allocator_bounds_oversized_payloads() -> Result {
		let mut writer = WriterBuilder::new()
			.sink(Vec::new())
			.write_buffer_capacity(64)
			.allocator(UnpooledAllocator::new(16))
			.build()?;
		let data = [7u8; 128];
		match writer.write_bin(&data) {
			Err(Error::CapacityExceeded { requested: 64, max: 16 }) => Ok(()),
			other => panic!("expected capacity exceeded, got {other:?}"),
		}
	}
}
