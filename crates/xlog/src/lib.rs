//! Streaming reader for Tarantool snapshot (`.snap`) and write-ahead-log (`.xlog`) files.
//!
//! Both file kinds share one on-disk framing: a short textual prologue, then a sequence of
//! marker-delimited records, terminated by an end-of-file marker. [`XlogReader`] parses the
//! prologue once and then acts as a fallible iterator over `(header, body)` MessagePack pairs,
//! one per logical record, decompressing `0.13`-format frames on the fly.
//!
//! ```no_run
//! use xlog::XlogReader;
//!
//! let mut reader = XlogReader::open("00000000000000000000.xlog")?;
//! for record in &mut reader {
//!     let record = record?;
//!     println!("header: {} bytes, body: {} bytes", record.header.len(), record.body.len());
//! }
//! # Ok::<(), xlog::XlogError>(())
//! ```

#![warn(clippy::unwrap_used, missing_docs)]
#![deny(rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod constants;
pub mod error;
mod fixheader;
mod marker;
mod msgpack;
mod prologue;
mod reader;
mod source;
mod zstd_stage;

pub use crate::{
	constants::FileVersion,
	error::XlogError,
	reader::{Record, XlogReader},
};

pub(crate) fn map_zstd_error(code: usize) -> std::io::Error {
	let msg = zstd_safe::get_error_name(code);
	std::io::Error::other(msg)
}
