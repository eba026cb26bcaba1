//! Splits a decompressed record window into its two top-level MessagePack map objects.
//!
//! Every xlog/snapshot record is exactly two consecutive MessagePack objects: a header map
//! followed by a body map. Neither is interpreted here; this just finds where the first one ends
//! so the second can be sliced out, by walking the object tree structurally.

use rmp::Marker;

use crate::error::{ErrorKind, Result, SimpleError};

/// Borrowed header/body split of one decompressed record.
pub(crate) struct Record<'a> {
	pub(crate) header: &'a [u8],
	pub(crate) body: &'a [u8],
}

/// Split `bytes` into its header map and body map, erroring if either isn't a map, or if either
/// runs past the end of `bytes`.
pub(crate) fn split_record(bytes: &[u8]) -> Result<Record<'_>> {
	let header_end = expect_map(bytes, 0)?;
	let body_end = expect_map(bytes, header_end)?;
	Ok(Record {
		header: &bytes[0..header_end],
		body: &bytes[header_end..body_end],
	})
}

fn expect_map(bytes: &[u8], start: usize) -> Result<usize> {
	let marker_byte = *bytes
		.get(start)
		.ok_or_else(|| SimpleError::new(ErrorKind::BufferOverrun))?;
	match Marker::from_u8(marker_byte) {
		Marker::FixMap(_) | Marker::Map16 | Marker::Map32 => skip_object(bytes, start),
		_ => Err(SimpleError::new(ErrorKind::ExpectedMap).into()),
	}
}

/// Walk one complete MessagePack object starting at `pos`, returning the offset just past it.
fn skip_object(bytes: &[u8], pos: usize) -> Result<usize> {
	let marker_byte = *bytes
		.get(pos)
		.ok_or_else(|| SimpleError::new(ErrorKind::BufferOverrun))?;
	let marker = Marker::from_u8(marker_byte);
	let mut pos = pos + 1;

	macro_rules! skip_bytes {
		($n:expr) => {{
			let end = pos
				.checked_add($n)
				.filter(|&e| e <= bytes.len())
				.ok_or_else(|| SimpleError::new(ErrorKind::BufferOverrun))?;
			pos = end;
		}};
	}

	macro_rules! read_len {
		($n:expr) => {{
			let (len, end) = read_be(bytes, pos, $n)?;
			pos = end;
			len
		}};
	}

	match marker {
		Marker::Null | Marker::True | Marker::False => {}
		Marker::FixPos(_) | Marker::FixNeg(_) => {}
		Marker::U8 | Marker::I8 => skip_bytes!(1),
		Marker::U16 | Marker::I16 => skip_bytes!(2),
		Marker::U32 | Marker::I32 | Marker::F32 => skip_bytes!(4),
		Marker::U64 | Marker::I64 | Marker::F64 => skip_bytes!(8),
		Marker::FixStr(len) => skip_bytes!(len as usize),
		Marker::Str8 | Marker::Bin8 => {
			let len = read_len!(1);
			skip_bytes!(len as usize);
		}
		Marker::Str16 | Marker::Bin16 => {
			let len = read_len!(2);
			skip_bytes!(len as usize);
		}
		Marker::Str32 | Marker::Bin32 => {
			let len = read_len!(4);
			skip_bytes!(len as usize);
		}
		Marker::FixArray(len) => {
			for _ in 0..len {
				pos = skip_object(bytes, pos)?;
			}
		}
		Marker::Array16 => {
			let len = read_len!(2);
			for _ in 0..len {
				pos = skip_object(bytes, pos)?;
			}
		}
		Marker::Array32 => {
			let len = read_len!(4);
			for _ in 0..len {
				pos = skip_object(bytes, pos)?;
			}
		}
		Marker::FixMap(len) => {
			for _ in 0..(u32::from(len) * 2) {
				pos = skip_object(bytes, pos)?;
			}
		}
		Marker::Map16 => {
			let len = read_len!(2);
			for _ in 0..(len * 2) {
				pos = skip_object(bytes, pos)?;
			}
		}
		Marker::Map32 => {
			let len = read_len!(4);
			for _ in 0..(len * 2) {
				pos = skip_object(bytes, pos)?;
			}
		}
		Marker::FixExt1 => skip_bytes!(1 + 1),
		Marker::FixExt2 => skip_bytes!(1 + 2),
		Marker::FixExt4 => skip_bytes!(1 + 4),
		Marker::FixExt8 => skip_bytes!(1 + 8),
		Marker::FixExt16 => skip_bytes!(1 + 16),
		Marker::Ext8 => {
			let len = read_len!(1);
			skip_bytes!(1 + len as usize);
		}
		Marker::Ext16 => {
			let len = read_len!(2);
			skip_bytes!(1 + len as usize);
		}
		Marker::Ext32 => {
			let len = read_len!(4);
			skip_bytes!(1 + len as usize);
		}
		Marker::Reserved => return Err(SimpleError::new(ErrorKind::BufferOverrun).into()),
	}

	Ok(pos)
}

fn read_be(bytes: &[u8], at: usize, n: usize) -> Result<(u64, usize)> {
	let end = at
		.checked_add(n)
		.filter(|&e| e <= bytes.len())
		.ok_or_else(|| SimpleError::new(ErrorKind::BufferOverrun))?;
	let mut value = 0u64;
	for &b in &bytes[at..end] {
		value = (value << 8) | u64::from(b);
	}
	Ok((value, end))
}
