// Copyright 2024 - Strixpyrr
// SPDX-License-Identifier: Apache-2.0

//! Format tag constants and classifiers for the MessagePack wire format. See
//! <https://github.com/msgpack/msgpack/blob/master/spec.md>.

use core::fmt::{Display, Formatter, Result as FmtResult};

/// A MessagePack value type, as seen by a caller of [`Reader`](crate::Reader).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValueType {
	Nil,
	Boolean,
	Integer,
	Float,
	String,
	Binary,
	Array,
	Map,
	Extension,
	/// The reserved tag `0xc1`, which must never appear on the wire.
	Reserved,
}

impl Display for ValueType {
	fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
		f.write_str(match self {
			Self::Nil => "nil",
			Self::Boolean => "boolean",
			Self::Integer => "integer",
			Self::Float => "float",
			Self::String => "string",
			Self::Binary => "binary",
			Self::Array => "array",
			Self::Map => "map",
			Self::Extension => "extension",
			Self::Reserved => "reserved",
		})
	}
}

/// An extension type header: a byte length and an application-defined type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionHeader {
	/// The byte length of the extension payload.
	pub length: u32,
	/// The extension type code. `[0, 127]` are application extensions;
	/// `[-128, -1]` are reserved for future MessagePack extensions.
	pub kind: i8,
}

// Named tag bytes, per the MessagePack spec.
pub const NIL: u8 = 0xc0;
pub const NEVER_USED: u8 = 0xc1;
pub const FALSE: u8 = 0xc2;
pub const TRUE: u8 = 0xc3;
pub const BIN8: u8 = 0xc4;
pub const BIN16: u8 = 0xc5;
pub const BIN32: u8 = 0xc6;
pub const EXT8: u8 = 0xc7;
pub const EXT16: u8 = 0xc8;
pub const EXT32: u8 = 0xc9;
pub const FLOAT32: u8 = 0xca;
pub const FLOAT64: u8 = 0xcb;
pub const UINT8: u8 = 0xcc;
pub const UINT16: u8 = 0xcd;
pub const UINT32: u8 = 0xce;
pub const UINT64: u8 = 0xcf;
pub const INT8: u8 = 0xd0;
pub const INT16: u8 = 0xd1;
pub const INT32: u8 = 0xd2;
pub const INT64: u8 = 0xd3;
pub const FIXEXT1: u8 = 0xd4;
pub const FIXEXT2: u8 = 0xd5;
pub const FIXEXT4: u8 = 0xd6;
pub const FIXEXT8: u8 = 0xd7;
pub const FIXEXT16: u8 = 0xd8;
pub const STR8: u8 = 0xd9;
pub const STR16: u8 = 0xda;
pub const STR32: u8 = 0xdb;
pub const ARRAY16: u8 = 0xdc;
pub const ARRAY32: u8 = 0xdd;
pub const MAP16: u8 = 0xde;
pub const MAP32: u8 = 0xdf;

/// Returns `true` if `tag` is a positive or negative fixint.
#[inline]
pub const fn is_fixint(tag: u8) -> bool {
	tag < 0x80 || tag >= 0xe0
}

/// Returns `true` if `tag` is a positive fixint (`0x00..=0x7f`).
#[inline]
pub const fn is_pos_fixint(tag: u8) -> bool {
	tag < 0x80
}

/// Returns `true` if `tag` is a negative fixint (`0xe0..=0xff`).
#[inline]
pub const fn is_neg_fixint(tag: u8) -> bool {
	tag >= 0xe0
}

/// Returns `true` if `tag` encodes a fixmap header (`0x80..=0x8f`).
#[inline]
pub const fn is_fixmap(tag: u8) -> bool {
	tag & 0xf0 == 0x80
}

/// Returns `true` if `tag` encodes a fixarray header (`0x90..=0x9f`).
#[inline]
pub const fn is_fixarray(tag: u8) -> bool {
	tag & 0xf0 == 0x90
}

/// Returns `true` if `tag` encodes a fixstr header (`0xa0..=0xbf`).
#[inline]
pub const fn is_fixstr(tag: u8) -> bool {
	tag & 0xe0 == 0xa0
}

/// Extracts the length encoded in a fixmap tag's low nibble.
#[inline]
pub const fn fixmap_len(tag: u8) -> u8 {
	tag & 0x0f
}

/// Extracts the length encoded in a fixarray tag's low nibble.
#[inline]
pub const fn fixarray_len(tag: u8) -> u8 {
	tag & 0x0f
}

/// Extracts the length encoded in a fixstr tag's low 5 bits.
#[inline]
pub const fn fixstr_len(tag: u8) -> u8 {
	tag & 0x1f
}

/// Maps a tag byte to its logical [`ValueType`].
pub const fn value_type(tag: u8) -> ValueType {
	if is_fixint(tag) {
		return ValueType::Integer;
	}
	if is_fixmap(tag) {
		return ValueType::Map;
	}
	if is_fixarray(tag) {
		return ValueType::Array;
	}
	if is_fixstr(tag) {
		return ValueType::String;
	}
	match tag {
		NIL => ValueType::Nil,
		NEVER_USED => ValueType::Reserved,
		FALSE | TRUE => ValueType::Boolean,
		BIN8 | BIN16 | BIN32 => ValueType::Binary,
		EXT8 | EXT16 | EXT32 |
		FIXEXT1 | FIXEXT2 | FIXEXT4 | FIXEXT8 | FIXEXT16 => ValueType::Extension,
		FLOAT32 | FLOAT64 => ValueType::Float,
		UINT8 | UINT16 | UINT32 | UINT64 |
		INT8 | INT16 | INT32 | INT64 => ValueType::Integer,
		STR8 | STR16 | STR32 => ValueType::String,
		ARRAY16 | ARRAY32 => ValueType::Array,
		MAP16 | MAP32 => ValueType::Map,
		// Every u8 value is covered by the ranges and arms above; this is
		// unreachable, but a const fn can't use unreachable!() portably, so
		// fall back to Reserved, matching the semantics of 0xc1.
		_ => ValueType::Reserved,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn every_byte_classifies() {
		for tag in 0..=u8::MAX {
			let _ = value_type(tag);
		}
	}

	#[test]
	fn reserved_tag_is_reserved() {
		assert_eq!(value_type(NEVER_USED), ValueType::Reserved);
	}

	#[test]
	fn fix_ranges() {
		assert!(is_pos_fixint(0x00));
		assert!(is_pos_fixint(0x7f));
		assert!(!is_pos_fixint(0x80));
		assert!(is_neg_fixint(0xe0));
		assert!(is_neg_fixint(0xff));
		assert!(!is_neg_fixint(0xdf));
		assert!(is_fixmap(0x80));
		assert!(is_fixmap(0x8f));
		assert!(is_fixarray(0x90));
		assert!(is_fixarray(0x9f));
		assert!(is_fixstr(0xa0));
		assert!(is_fixstr(0xbf));
	}

	#[test]
	fn fix_length_extraction() {
		assert_eq!(fixmap_len(0x8a), 0x0a);
		assert_eq!(fixarray_len(0x9f), 0x0f);
		assert_eq!(fixstr_len(0xbf), 0x1f);
	}

	#[test]
	fn named_tags_classify_correctly() {
		assert_eq!(value_type(NIL), ValueType::Nil);
		assert_eq!(value_type(TRUE), ValueType::Boolean);
		assert_eq!(value_type(FALSE), ValueType::Boolean);
		assert_eq!(value_type(UINT64), ValueType::Integer);
		assert_eq!(value_type(INT8), ValueType::Integer);
		assert_eq!(value_type(FLOAT32), ValueType::Float);
		assert_eq!(value_type(FLOAT64), ValueType::Float);
		assert_eq!(value_type(BIN32), ValueType::Binary);
		assert_eq!(value_type(STR32), ValueType::String);
		assert_eq!(value_type(ARRAY32), ValueType::Array);
		assert_eq!(value_type(MAP32), ValueType::Map);
		assert_eq!(value_type(FIXEXT16), ValueType::Extension);
		assert_eq!(value_type(EXT32), ValueType::Extension);
	}
}
