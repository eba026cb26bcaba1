//! Textual file-header (prologue) parsing: file type, version, and free-form header lines.

use tracing::{debug, instrument};

use crate::{
	constants::{FileVersion, PROLOGUE_HEADER_LINE_MAX, PROLOGUE_SHORT_LINE_MAX},
	error::{ErrorKind, Result, SimpleError},
	source::ByteSource,
};

/// Parse the prologue, leaving `source` positioned just past the empty-line terminator.
///
/// Returns the detected format version.
#[instrument(level = "debug", skip(source))]
pub(crate) fn read_prologue(source: &mut ByteSource) -> Result<FileVersion> {
	let filetype = read_short_line(source, ErrorKind::HeaderRead)?;
	if !(filetype.starts_with(b"SNAP") || filetype.starts_with(b"XLOG")) {
		return Err(SimpleError::new(ErrorKind::UnknownFileType).into());
	}

	let version_line = read_short_line(source, ErrorKind::HeaderRead)?;
	let version = match version_line.as_slice() {
		b"0.12\n" => FileVersion::V12,
		b"0.13\n" => FileVersion::V13,
		other => {
			let shown = String::from_utf8_lossy(other);
			return Err(SimpleError::new(ErrorKind::UnknownVersion)
				.with_message(format!("unknown header version: {shown}"))
				.into());
		}
	};
	debug!(%version, "detected file version");

	loop {
		let line = source
			.read_line(PROLOGUE_HEADER_LINE_MAX)?
			.ok_or_else(|| SimpleError::new(ErrorKind::HeaderLineRead))?;
		if line == b"\n" {
			break;
		}
	}

	Ok(version)
}

fn read_short_line(source: &mut ByteSource, on_eof: ErrorKind) -> Result<Vec<u8>> {
	source
		.read_line(PROLOGUE_SHORT_LINE_MAX)?
		.ok_or_else(|| SimpleError::new(on_eof).into())
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
	fn accepts_v12_snap() {
		let (_guard, mut source) = source_from(b"SNAP\n0.12\n\n");
		assert_eq!(read_prologue(&mut source).unwrap(), FileVersion::V12);
	}

	#[test]
	fn accepts_v13_xlog_with_header_lines() {
		let (_guard, mut source) = source_from(b"XLOG\n0.13\nServer: test\nVClock: {}\n\n");
		assert_eq!(read_prologue(&mut source).unwrap(), FileVersion::V13);
	}

	#[test]
	fn rejects_unknown_filetype() {
		let (_guard, mut source) = source_from(b"NOPE\n0.12\n\n");
		let err = read_prologue(&mut source).unwrap_err();
		assert!(format!("{err}").contains("unknown file header"));
	}

	#[test]
	fn rejects_unknown_version() {
		let (_guard, mut source) = source_from(b"SNAP\n0.14\n\n");
		let err = read_prologue(&mut source).unwrap_err();
		assert!(format!("{err}").contains("unknown header version"));
	}

	#[test]
	fn rejects_missing_terminator() {
		let (_guard, mut source) = source_from(b"SNAP\n0.12\nunterminated");
		let err = read_prologue(&mut source).unwrap_err();
		assert!(format!("{err}").contains("can't read header line"));
	}
}
