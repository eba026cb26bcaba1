//! Error types for [`XlogReader`](crate::XlogReader).

use std::borrow::Cow;

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

/// Convenience return type.
pub type Result<T> = std::result::Result<T, XlogError>;

/// Combined error type for opening and iterating a [`XlogReader`](crate::XlogReader).
#[derive(Error, Diagnostic, Debug)]
pub enum XlogError {
	/// I/O error from the underlying file.
	#[error(transparent)]
	Io(#[from] std::io::Error),

	/// Error without a meaningful byte offset to point at.
	#[error(transparent)]
	#[diagnostic(transparent)]
	Simple(#[from] SimpleError),

	/// Error anchored to a specific byte offset in the file.
	#[error(transparent)]
	#[diagnostic(transparent)]
	Source(#[from] SourceError),
}

/// An xlog reader error that's just a message, with no useful byte-offset context.
#[derive(Error, Diagnostic, Debug)]
#[error("xlog: {message}")]
pub struct SimpleError {
	/// Error kind.
	pub kind: ErrorKind,

	/// Error message.
	pub message: Cow<'static, str>,
}

/// An xlog reader error anchored to an offset in the file, with a byte snippet for context.
#[derive(Error, Diagnostic, Debug)]
#[error("xlog: {message}")]
pub struct SourceError {
	/// Error kind.
	pub kind: ErrorKind,

	/// Error message.
	pub message: Cow<'static, str>,

	/// Byte offset the error occurred at.
	pub offset: u64,

	/// Location of the error within the snippet.
	#[label("here")]
	pub at: SourceSpan,

	/// Hex dump of the bytes surrounding `offset`.
	#[source_code]
	pub snippet: String,
}

impl SimpleError {
	/// New error without an offset.
	pub fn new(kind: ErrorKind) -> Self {
		Self {
			message: kind.default_message(),
			kind,
		}
	}

	/// Change the error message.
	pub fn with_message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
		self.message = message.into();
		self
	}
}

impl SourceError {
	/// New error with a snippet computed around `offset` from `source`.
	pub fn new(kind: ErrorKind, offset: u64, source: &[u8], context: usize) -> Self {
		let at_byte = source.len().min(context);
		let start = at_byte.saturating_sub(context);
		let end = at_byte.saturating_add(context).min(source.len());
		let snippet = &source[start..end];
		Self {
			message: kind.default_message(),
			kind,
			offset,
			snippet: format!("{snippet:02x?}"),
			at: SourceSpan::from((
				(at_byte - start) * 2 + 1, // to account for leading `[`
				2,                         // always 2 hex digits
			)),
		}
	}

	/// Change the error message.
	pub fn with_message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
		self.message = message.into();
		self
	}
}

/// Error kind, shared between [`SimpleError`] and [`SourceError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// Could not open the file for reading.
	Open,
	/// Could not read the file-type or version prologue lines.
	HeaderRead,
	/// First prologue line wasn't `SNAP` or `XLOG`.
	UnknownFileType,
	/// Second prologue line wasn't a recognised version.
	UnknownVersion,
	/// A free-form header line could not be read before EOF.
	HeaderLineRead,
	/// Could not initialise the zstd decompression stream.
	ZstdInit,
	/// Decompression failed.
	Zstd,
	/// EOF encountered while scanning for a marker, or while reading the fixed header.
	TruncatedStream,
	/// EOF encountered while reading a record's declared-length payload.
	TruncatedRow,
	/// A `ZROW` payload declared a length shorter than the minimum zstd frame.
	TruncatedCompressedHeader,
	/// The fixed header contained a non-uint MessagePack tag.
	BadRowHeader,
	/// The declared record length exceeds the body-length limit.
	RowTooBig,
	/// The record splitter found a non-map MessagePack tag where a map was required.
	ExpectedMap,
	/// A MessagePack object in the decompressed window extended past its end.
	BufferOverrun,
	/// A buffer could not be grown.
	OutOfMemory,
}

impl ErrorKind {
	/// The default message for this error kind.
	pub fn default_message(self) -> Cow<'static, str> {
		match self {
			ErrorKind::Open => Cow::Borrowed("can't open for reading"),
			ErrorKind::HeaderRead => Cow::Borrowed("error reading file header"),
			ErrorKind::UnknownFileType => {
				Cow::Borrowed("unknown file header: expected SNAP or XLOG")
			}
			ErrorKind::UnknownVersion => Cow::Borrowed("unknown header version"),
			ErrorKind::HeaderLineRead => Cow::Borrowed("can't read header line"),
			ErrorKind::ZstdInit => Cow::Borrowed("can't create zstd stream"),
			ErrorKind::Zstd => Cow::Borrowed("zstd error"),
			ErrorKind::TruncatedStream => Cow::Borrowed("truncated stream"),
			ErrorKind::TruncatedRow => Cow::Borrowed("truncated row"),
			ErrorKind::TruncatedCompressedHeader => {
				Cow::Borrowed("truncated compressed row header")
			}
			ErrorKind::BadRowHeader => Cow::Borrowed("failed to read or parse row header"),
			ErrorKind::RowTooBig => Cow::Borrowed("row is too big"),
			ErrorKind::ExpectedMap => Cow::Borrowed("expected msgpack map, got something else"),
			ErrorKind::BufferOverrun => Cow::Borrowed("msgpack buffer overrun"),
			ErrorKind::OutOfMemory => Cow::Borrowed("out of memory"),
		}
	}
}

impl From<ErrorKind> for SimpleError {
	fn from(kind: ErrorKind) -> Self {
		Self::new(kind)
	}
}

impl From<ErrorKind> for XlogError {
	fn from(kind: ErrorKind) -> Self {
		Self::Simple(kind.into())
	}
}
