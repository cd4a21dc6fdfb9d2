// Copyright 2024 - Strixpyrr
// SPDX-License-Identifier: Apache-2.0

//! Round-trip and buffer-discipline properties spanning the whole
//! reader/writer pair, as opposed to the single-module proptests in
//! `src/reader.rs`/`src/writer.rs`.

use mxpack::source::Source;
use mxpack::{Reader, Result, Writer};
use proptest::collection::vec as collection_vec;
use proptest::prelude::*;

/// A source that hands back at most one byte per `read` call, forcing the
/// reader to compact and refill its working buffer on every multi-byte
/// primitive.
struct OneByteAtATime<'a>(&'a [u8]);

impl<'a> Source for OneByteAtATime<'a> {
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

proptest! {
	#[test]
	fn i64_round_trips_through_writer_and_reader(value: i64) {
		let mut writer = Writer::new(Vec::new());
		writer.write_i64(value).unwrap();
		writer.close().unwrap();
		let bytes = writer.into_sink();

		let mut reader = Reader::new(&bytes[..]);
		prop_assert_eq!(reader.read_i64().unwrap(), value);

		let mut reader = Reader::new(OneByteAtATime(&bytes));
		prop_assert_eq!(reader.read_i64().unwrap(), value);
	}

	#[test]
	fn u64_round_trips_through_writer_and_reader(value: u64) {
		let mut writer = Writer::new(Vec::new());
		writer.write_u64(value).unwrap();
		writer.close().unwrap();
		let bytes = writer.into_sink();

		let mut reader = Reader::new(&bytes[..]);
		prop_assert_eq!(reader.read_u64().unwrap(), value);
	}

	#[test]
	fn f64_round_trips_bit_identical(value: f64) {
		let mut writer = Writer::new(Vec::new());
		writer.write_f64(value).unwrap();
		writer.close().unwrap();
		let bytes = writer.into_sink();

		let mut reader = Reader::new(&bytes[..]);
		prop_assert_eq!(reader.read_f64().unwrap().to_bits(), value.to_bits());
	}

	#[test]
	fn string_round_trips_through_one_byte_source(text in "\\PC*") {
		let mut writer = Writer::new(Vec::new());
		writer.write_str(&text).unwrap();
		writer.close().unwrap();
		let bytes = writer.into_sink();

		let mut reader = Reader::new(OneByteAtATime(&bytes));
		prop_assert_eq!(reader.read_str().unwrap(), text);
	}

	#[test]
	fn array_of_ints_round_trips(values in collection_vec(any::<i32>(), 0..64)) {
		let mut writer = Writer::new(Vec::new());
		writer.write_array_header(values.len() as u32).unwrap();
		for v in &values {
			writer.write_i32(*v).unwrap();
		}
		writer.close().unwrap();
		let bytes = writer.into_sink();

		let mut reader = Reader::new(&bytes[..]);
		let count = reader.read_array_header().unwrap();
		prop_assert_eq!(count as usize, values.len());
		for v in &values {
			prop_assert_eq!(reader.read_i32().unwrap(), *v);
		}
	}

	#[test]
	fn binary_payload_round_trips(payload in collection_vec(any::<u8>(), 0..4096)) {
		let mut writer = Writer::new(Vec::new());
		writer.write_bin(&payload).unwrap();
		writer.close().unwrap();
		let bytes = writer.into_sink();

		let mut reader = Reader::new(&bytes[..]);
		let len = reader.read_bin_header().unwrap();
		let mut buf = vec![0u8; len as usize];
		reader.read_payload(&mut buf).unwrap();
		prop_assert_eq!(buf, payload);
	}
}

#[test]
fn boundary_array_and_map_counts_pick_the_right_tag() {
	for count in [0u32, 15, 16, 65535, 65536] {
		let mut writer = Writer::new(Vec::new());
		writer.write_array_header(count).unwrap();
		writer.close().unwrap();
		let bytes = writer.into_sink();
		let mut reader = Reader::new(&bytes[..]);
		assert_eq!(reader.read_array_header().unwrap(), count);

		let mut writer = Writer::new(Vec::new());
		writer.write_map_header(count).unwrap();
		writer.close().unwrap();
		let bytes = writer.into_sink();
		let mut reader = Reader::new(&bytes[..]);
		assert_eq!(reader.read_map_header().unwrap(), count);
	}
}

#[test]
fn boundary_string_lengths_round_trip() {
	for len in [0usize, 1, 31, 32, 255, 256, 65535, 65536] {
		let text = "x".repeat(len);
		let mut writer = Writer::new(Vec::new());
		writer.write_str(&text).unwrap();
		writer.close().unwrap();
		let bytes = writer.into_sink();
		let mut reader = Reader::new(&bytes[..]);
		assert_eq!(reader.read_str().unwrap(), text);
	}
}
