//! Marker resynchronization: locate the next recognised row marker in the stream.

use tracing::{instrument, trace};

use crate::{
	constants::{FileVersion, EOF_MARKER, ROW_MARKER, ZROW_MARKER},
	error::{ErrorKind, Result, SimpleError},
	source::{ByteSource, ReadExact},
};

/// Which marker was found at the current read position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Marker {
	/// An uncompressed record follows.
	Row,
	/// A zstd-compressed record follows.
	Zrow,
	/// The logical end of the record stream.
	Eof,
}

/// Scan forward for the next recognised marker, skipping one byte at a time past anything that
/// doesn't form one.
///
/// A well-formed file always ends on the explicit [`EOF_MARKER`]; hitting the end of the file
/// before one turns up — whether on the very first 4-byte read or mid-resync — means the file was
/// truncated, and is always an error. There is no silent-EOF path except an explicit match on
/// [`EOF_MARKER`], which the caller sees as [`Marker::Eof`].
#[instrument(level = "trace", skip(source))]
pub(crate) fn scan_marker(source: &mut ByteSource, version: FileVersion) -> Result<Marker> {
	let mut window: u32 = match source.read_exact(4)? {
		ReadExact::Full(bytes) => u32::from_be_bytes(bytes.try_into().unwrap()),
		ReadExact::Eof | ReadExact::Short => {
			return Err(SimpleError::new(ErrorKind::TruncatedStream).into());
		}
	};

	loop {
		if let Some(marker) = classify(window, version) {
			return Ok(marker);
		}

		let Some(byte) = source.read_byte()? else {
			return Err(SimpleError::new(ErrorKind::TruncatedStream).into());
		};
		window = (window << 8) | u32::from(byte);
		trace!(window = format!("{window:#010x}"), "resynchronizing past garbage");
	}
}

fn classify(window: u32, version: FileVersion) -> Option<Marker> {
	if window == ROW_MARKER {
		Some(Marker::Row)
	} else if window == ZROW_MARKER && version.recognises_zrow() {
		Some(Marker::Zrow)
	} else if window == EOF_MARKER {
		Some(Marker::Eof)
	} else {
		None
	}
}

#[cfg(test)]
mod tests {
	use std::io::Write;

	use super::*;

	fn source_from(bytes: &[u8]) -> (tempfile::NamedTempFile, ByteSource) {
		let mut file = tempfile::NamedTempFile::new().expect("tempfile");
		file.write_all(bytes).unwrap();
		file.flush().unwrap();
		let source = ByteSource::open(file.path()).unwrap();
		(file, source)
	}

	#[test]
	fn finds_row_marker_immediately() {
		let (_guard, mut source) = source_from(&ROW_MARKER.to_be_bytes());
		assert_eq!(
			scan_marker(&mut source, FileVersion::V13).unwrap(),
			Marker::Row
		);
	}

	#[test]
	fn skips_garbage_to_find_eof_marker() {
		let mut bytes = vec![0xffu8; 7];
		bytes.extend_from_slice(&EOF_MARKER.to_be_bytes());
		let (_guard, mut source) = source_from(&bytes);
		assert_eq!(
			scan_marker(&mut source, FileVersion::V13).unwrap(),
			Marker::Eof
		);
	}

	#[test]
	fn zrow_is_garbage_under_v12() {
		let mut bytes = ZROW_MARKER.to_be_bytes().to_vec();
		bytes.extend_from_slice(&EOF_MARKER.to_be_bytes());
		let (_guard, mut source) = source_from(&bytes);
		assert_eq!(
			scan_marker(&mut source, FileVersion::V12).unwrap(),
			Marker::Eof
		);
	}

	#[test]
	fn clean_eof_with_nothing_left_is_truncated_stream() {
		let (_guard, mut source) = source_from(b"");
		let err = scan_marker(&mut source, FileVersion::V13).unwrap_err();
		assert!(format!("{err}").contains("truncated stream"));
	}

	#[test]
	fn truncated_mid_resync_is_an_error() {
		let (_guard, mut source) = source_from(&[0xff, 0xff, 0xff, 0xff, 0xff]);
		assert!(scan_marker(&mut source, FileVersion::V13).is_err());
	}
}
