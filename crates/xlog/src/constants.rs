//! Wire constants for the xlog/snapshot framing.

/// A 4-byte magic word, as it appears on the wire (big-endian).
pub(crate) type LogMagic = u32;

/// Marker preceding an uncompressed record frame.
pub(crate) const ROW_MARKER: LogMagic = 0xd5ba_0bab;

/// Marker preceding a zstd-compressed record frame. Only recognised in [`FileVersion::V13`].
pub(crate) const ZROW_MARKER: LogMagic = 0xd5ba_0bba;

/// Marker indicating the logical end of the record stream.
pub(crate) const EOF_MARKER: LogMagic = 0xd510_aded;

/// Size in bytes of the fixed header following a row/zrow marker: three MessagePack uints
/// encoding the payload length and two CRC32 values.
pub(crate) const FIXHEADER_SIZE: usize = 15;

/// Maximum permitted record body length (2 GiB), matching `IPROTO_BODY_LEN_MAX`.
pub(crate) const BODY_LEN_MAX: u64 = 1 << 31;

/// How much consumed stream may pass between `posix_fadvise(DONTNEED)` hints.
pub(crate) const FADVISE_WINDOW: u64 = 10 * 1024 * 1024;

/// Maximum length of the file-type and version prologue lines.
pub(crate) const PROLOGUE_SHORT_LINE_MAX: usize = 31;

/// Maximum length of a free-form header line.
pub(crate) const PROLOGUE_HEADER_LINE_MAX: usize = 255;

/// On-disk format version, determined from the prologue's version line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileVersion {
	/// Legacy format: record payloads are always uncompressed, and only the [`ROW_MARKER`] is
	/// recognised (a `ZROW_MARKER` byte sequence is just more junk to resynchronize past).
	V12,
	/// Current format: record payloads may be zstd-compressed, introduced by [`ZROW_MARKER`].
	V13,
}

impl FileVersion {
	pub(crate) fn recognises_zrow(self) -> bool {
		matches!(self, FileVersion::V13)
	}
}

impl std::fmt::Display for FileVersion {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			FileVersion::V12 => "0.12",
			FileVersion::V13 => "0.13",
		})
	}
}
