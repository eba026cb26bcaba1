//! Fixed header decoding: three MessagePack-encoded uints following a row marker.

use std::io::Cursor;

use crate::{
	constants::{BODY_LEN_MAX, FIXHEADER_SIZE},
	error::{ErrorKind, Result, SimpleError, SourceError},
	source::{ByteSource, ReadExact},
};

/// The fixed header following a `ROW`/`ZROW` marker: declared payload length and two CRC32s.
///
/// The CRC32 values are decoded but never validated: checksum verification isn't implemented.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FixHeader {
	pub(crate) len: u64,
	#[allow(dead_code)]
	pub(crate) prev_crc32: u32,
	#[allow(dead_code)]
	pub(crate) cur_crc32: u32,
}

pub(crate) fn read_fixheader(source: &mut ByteSource) -> Result<FixHeader> {
	let header_offset = source.offset();
	let bytes = match source.read_exact(FIXHEADER_SIZE)? {
		ReadExact::Full(bytes) => bytes,
		ReadExact::Eof | ReadExact::Short => {
			return Err(SimpleError::new(ErrorKind::TruncatedStream).into());
		}
	};

	decode_fields(&bytes)
		.map(|(len, prev_crc32, cur_crc32)| FixHeader {
			len,
			prev_crc32,
			cur_crc32,
		})
		.ok_or_else(|| {
			SourceError::new(ErrorKind::BadRowHeader, header_offset, &bytes, bytes.len())
				.with_message(format!(
					"{} at offset {header_offset}",
					ErrorKind::BadRowHeader.default_message()
				))
				.into()
		})
		.and_then(|header| {
			if header.len > BODY_LEN_MAX {
				Err(SourceError::new(ErrorKind::RowTooBig, header_offset, &bytes, bytes.len())
					.with_message(format!(
						"{} at offset {header_offset}",
						ErrorKind::RowTooBig.default_message()
					))
					.into())
			} else {
				Ok(header)
			}
		})
}

fn decode_fields(bytes: &[u8]) -> Option<(u64, u32, u32)> {
	let mut cursor = Cursor::new(bytes);
	let len = rmp::decode::read_int::<u64, _>(&mut cursor).ok()?;
	let prev_crc32 = rmp::decode::read_int::<u32, _>(&mut cursor).ok()?;
	let cur_crc32 = rmp::decode::read_int::<u32, _>(&mut cursor).ok()?;
	Some((len, prev_crc32, cur_crc32))
}
