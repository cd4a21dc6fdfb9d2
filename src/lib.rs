// Copyright 2024 - Strixpyrr
// SPDX-License-Identifier: Apache-2.0

//! A streaming reader and writer for the MessagePack binary serialization
//! format (<https://github.com/msgpack/msgpack/blob/master/spec.md>).
//!
//! [`Reader`] decodes values from a [`Source`]; [`Writer`] encodes values
//! onto a [`Sink`]. Both maintain a fixed-capacity working buffer and fall
//! back to a [`BufferAllocator`] only for payloads too large to fit it.
//!
//! ```
//! use mxpack::{Reader, Writer};
//!
//! let mut writer = Writer::new(Vec::new());
//! writer.write_str("Hello, MxPack!").unwrap();
//! writer.write_i32(42).unwrap();
//! writer.close().unwrap();
//!
//! let bytes = writer.into_sink();
//! let mut reader = Reader::new(&bytes[..]);
//! assert_eq!(reader.read_str().unwrap(), "Hello, MxPack!");
//! assert_eq!(reader.read_i32().unwrap(), 42);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod alloc;
pub mod error;
pub mod format;
pub mod options;
pub mod reader;
pub mod sink;
pub mod source;
pub mod utf8;
pub mod writer;

pub use error::{Error, Result};
pub use format::{ExtensionHeader, ValueType};
pub use options::{ReaderBuilder, WriterBuilder};
pub use reader::Reader;
pub use sink::{DiscardSink, Sink};
pub use source::{EmptySource, Source};
pub use writer::Writer;

#[cfg(feature = "std")]
pub use sink::WriteSink;
#[cfg(feature = "std")]
pub use source::ReadSource;

pub use alloc::{BufferAllocator, UnpooledAllocator};
#[cfg(feature = "std")]
pub use alloc::PooledAllocator;
