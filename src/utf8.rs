// Copyright 2024 - Strixpyrr
// SPDX-License-Identifier: Apache-2.0

//! UTF-8 validation, shared by the reader's string decode path.

use simdutf8::compat::from_utf8;
use crate::Result;

/// Validates `bytes` as UTF-8 and returns the borrowed `str`.
///
/// # Errors
///
/// Returns [`Error::InvalidUtf8`](crate::Error::InvalidUtf8) if `bytes` is
/// not valid UTF-8.
#[inline]
pub fn decode_str(bytes: &[u8]) -> Result<&str> {
	Ok(from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::Error;

	#[test]
	fn decodes_ascii() {
		assert_eq!(decode_str(b"hello").unwrap(), "hello");
	}

	#[test]
	fn decodes_multibyte() {
		let bytes = "héllo, 世界".as_bytes();
		assert_eq!(decode_str(bytes).unwrap(), "héllo, 世界");
	}

	#[test]
	fn rejects_invalid_sequences() {
		let bytes = [0xff, 0xfe, 0xfd];
		assert!(matches!(decode_str(&bytes), Err(Error::InvalidUtf8(_))));
	}

	#[test]
	fn empty_string_is_valid() {
		assert_eq!(decode_str(b"").unwrap(), "");
	}
}
