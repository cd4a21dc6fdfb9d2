// Copyright 2024 - Strixpyrr
// SPDX-License-Identifier: Apache-2.0

//! Buffer allocators for auxiliary reads and writes that don't fit a reader's
//! or writer's working buffer.

extern crate alloc as core_alloc;

use core_alloc::vec::Vec;
use crate::{Error, Result};

/// The default maximum capacity an allocator will hand out, in bytes (1 MiB).
pub const DEFAULT_MAX_CAPACITY: usize = 1024 * 1024;

/// Hands out and reclaims byte buffers with a bounded maximum capacity.
///
/// Implementations document whether they're safe to share across threads.
/// [`UnpooledAllocator`] is stateless and trivially so; [`PooledAllocator`]
/// synchronizes its free list internally.
pub trait BufferAllocator {
	/// Returns the largest capacity this allocator will hand out.
	fn max_capacity(&self) -> usize;

	/// Acquires a byte buffer with at least `min_capacity` bytes of capacity.
	///
	/// # Errors
	///
	/// Returns [`Error::CapacityExceeded`] if `min_capacity` exceeds
	/// [`max_capacity`](Self::max_capacity).
	fn byte_buffer(&self, min_capacity: usize) -> Result<Vec<u8>>;

	/// Returns a buffer to the allocator. Pooled allocators may recycle it;
	/// unpooled allocators drop it immediately.
	fn release(&self, buffer: Vec<u8>);

	/// Releases resources the allocator itself holds, independent of any
	/// buffer it's handed out — for [`PooledAllocator`], this drains the free
	/// list, dropping every pooled buffer; [`UnpooledAllocator`] has no such
	/// state and treats this as a no-op.
	///
	/// This is for a caller that owns a standalone allocator instance and
	/// wants to release its pooled memory explicitly. Neither [`Reader`](crate::Reader)
	/// nor [`Writer`](crate::Writer) call this from their own `close`: an
	/// allocator may be shared between a reader and a writer (or across
	/// several of either), so closing one owner's reader/writer must not
	/// drain a free list the other owner is still drawing from. The allocator
	/// remains usable after `close`; a pooled allocator simply resumes from
	/// an empty free list.
	fn close(&self);
}

/// An allocator where every request returns a freshly allocated buffer, and
/// release is a no-op. Stateless, zero-sized, and always `Send + Sync`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnpooledAllocator {
	max_capacity: usize,
}

impl UnpooledAllocator {
	/// Creates an unpooled allocator with the given maximum capacity.
	#[inline]
	pub const fn new(max_capacity: usize) -> Self {
		Self { max_capacity }
	}
}

impl BufferAllocator for UnpooledAllocator {
	#[inline]
	fn max_capacity(&self) -> usize {
		self.max_capacity
	}

	fn byte_buffer(&self, min_capacity: usize) -> Result<Vec<u8>> {
		if min_capacity > self.max_capacity {
			return Err(Error::CapacityExceeded {
				requested: min_capacity,
				max: self.max_capacity,
			});
		}
		Ok(Vec::with_capacity(min_capacity))
	}

	fn release(&self, _buffer: Vec<u8>) { }

	#[inline]
	fn close(&self) { }
}

#[cfg(feature = "std")]
mod pooled {
	use std::sync::Mutex;
	use super::*;

	/// An allocator that recycles released buffers via a size-segregated free
	/// list, bucketed by the next power of two at or above the requested
	/// capacity.
	///
	/// The free list is guarded by a [`Mutex`], so this allocator is
	/// `Send + Sync` and may be shared between a reader and a writer (or
	/// across threads driving distinct reader/writer instances), even though
	/// no single reader or writer is itself safe for concurrent use.
	pub struct PooledAllocator {
		max_capacity: usize,
		// Free lists bucketed by capacity class (index = log2 of the bucket's
		// minimum capacity). Each bucket holds buffers whose capacity is in
		// `[2^i, 2^(i+1))`.
		buckets: Mutex<Vec<Vec<Vec<u8>>>>,
	}

	impl PooledAllocator {
		/// Creates a pooled allocator with the given maximum capacity.
		pub fn new(max_capacity: usize) -> Self {
			Self {
				max_capacity,
				buckets: Mutex::new(Vec::new()),
			}
		}

		fn bucket_index(capacity: usize) -> usize {
			// capacity.max(1) avoids taking log2 of zero.
			usize::BITS as usize - capacity.max(1).leading_zeros() as usize
		}
	}

	impl BufferAllocator for PooledAllocator {
		fn max_capacity(&self) -> usize {
			self.max_capacity
		}

		fn byte_buffer(&self, min_capacity: usize) -> Result<Vec<u8>> {
			if min_capacity > self.max_capacity {
				return Err(Error::CapacityExceeded {
					requested: min_capacity,
					max: self.max_capacity,
				});
			}

			let index = Self::bucket_index(min_capacity);
			let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());
			if let Some(bucket) = buckets.get_mut(index) {
				if let Some(mut buffer) = bucket.pop() {
					buffer.clear();
					return Ok(buffer);
				}
			}
			Ok(Vec::with_capacity(min_capacity))
		}

		fn release(&self, buffer: Vec<u8>) {
			if buffer.capacity() == 0 {
				return;
			}
			let index = Self::bucket_index(buffer.capacity());
			let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());
			if buckets.len() <= index {
				buckets.resize_with(index + 1, Vec::new);
			}
			buckets[index].push(buffer);
		}

		fn close(&self) {
			let mut buckets = self.buckets.lock().unwrap_or_else(|e| e.into_inner());
			buckets.clear();
		}
	}

	#[cfg(test)]
	mod tests {
		use super::*;

		#[test]
		fn recycles_released_buffers() {
			let allocator = PooledAllocator::new(DEFAULT_MAX_CAPACITY);
			let buf = allocator.byte_buffer(64).unwrap();
			let ptr = buf.as_ptr();
			allocator.release(buf);
			let buf2 = allocator.byte_buffer(64).unwrap();
			assert_eq!(buf2.as_ptr(), ptr);
		}

		#[test]
		fn rejects_over_capacity() {
			let allocator = PooledAllocator::new(16);
			assert!(matches!(
				allocator.byte_buffer(17),
				Err(Error::CapacityExceeded { requested: 17, max: 16 })
			));
		}

		#[test]
		fn close_drains_the_free_list() {
			let allocator = PooledAllocator::new(DEFAULT_MAX_CAPACITY);
			let buf = allocator.byte_buffer(64).unwrap();
			let ptr = buf.as_ptr();
			allocator.release(buf);
			allocator.close();
			let buf2 = allocator.byte_buffer(64).unwrap();
			assert_ne!(buf2.as_ptr(), ptr);
			// The allocator remains usable after close.
			allocator.release(buf2);
			assert!(allocator.byte_buffer(64).is_ok());
		}
	}
}

#[cfg(feature = "std")]
pub use pooled::PooledAllocator;

/// Releases an allocator-provided auxiliary buffer when dropped, covering
/// every early-return path (including `?`) in callers that borrow a buffer
/// from a [`BufferAllocator`] for longer than a single call.
pub(crate) struct AuxGuard<'a, A: BufferAllocator> {
	pub(crate) allocator: &'a A,
	pub(crate) buffer: Option<Vec<u8>>,
}

impl<'a, A: BufferAllocator> Drop for AuxGuard<'a, A> {
	fn drop(&mut self) {
		if let Some(buffer) = self.buffer.take() {
			self.allocator.release(buffer);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unpooled_always_allocates_fresh() {
		let allocator = UnpooledAllocator::new(DEFAULT_MAX_CAPACITY);
		let buf = allocator.byte_buffer(32).unwrap();
		assert!(buf.capacity() >= 32);
		allocator.release(buf);
	}

	#[test]
	fn unpooled_rejects_over_capacity() {
		let allocator = UnpooledAllocator::new(16);
		assert!(matches!(
			allocator.byte_buffer(17),
			Err(Error::CapacityExceeded { requested: 17, max: 16 })
		));
	}
}
