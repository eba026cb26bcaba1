//! Zstandard decompression of a single in-memory `ZROW` payload.
//!
//! Unlike a general-purpose frame reader, an xlog record's compressed payload is always fully
//! buffered before decompression starts (its length comes straight out of the fixed header), so
//! this is a one-shot call rather than a lazy iterator: there's no reader to come back to.

use tracing::{instrument, trace};
use zstd_safe::{DCtx, InBuffer, OutBuffer};

use crate::error::{ErrorKind, Result, SimpleError};

/// Minimum size of a zstd frame: the 4-byte magic number. Anything shorter can't possibly be
/// valid, and isn't worth handing to zstd-safe to reject.
const MIN_ZSTD_FRAME: usize = 4;

/// Decompress a complete zstd frame read from a `ZROW` record into an owned buffer.
///
/// `offset` is the file offset the compressed payload started at; it's only recorded in the
/// trace span, since none of this stage's errors are offset-anchored.
#[instrument(level = "trace", skip(compressed))]
pub(crate) fn inflate(compressed: &[u8], offset: u64) -> Result<Vec<u8>> {
	if compressed.len() < MIN_ZSTD_FRAME {
		return Err(SimpleError::new(ErrorKind::TruncatedCompressedHeader).into());
	}

	let mut zstd = DCtx::try_create().ok_or_else(|| SimpleError::new(ErrorKind::ZstdInit))?;
	let mut input = InBuffer {
		src: compressed,
		pos: 0,
	};

	let output_size = DCtx::out_size().max(compressed.len());
	let mut output_buf: Vec<u8> = Vec::new();
	output_buf
		.try_reserve_exact(output_size)
		.map_err(|_| SimpleError::new(ErrorKind::OutOfMemory))?;
	let mut output = OutBuffer::around(&mut output_buf);

	let mut input_hint = zstd
		.decompress_stream(&mut output, &mut input)
		.map_err(zstd_error)?;
	trace!(
		%input_hint,
		input_pos = input.pos,
		input_size = input.src.len(),
		output_pos = output.pos(),
		"decompressed first step"
	);

	// zstd's streaming API doesn't guarantee a single call drains all buffered input, even
	// when the output buffer isn't full; keep calling until the input is fully consumed (or
	// zstd stops making progress on it), growing the output buffer whenever it fills up.
	while input.pos < input.src.len() || (input_hint != 0 && output.pos() == output.capacity()) {
		let grow_by = DCtx::out_size().max(1024);
		output_buf
			.try_reserve(grow_by)
			.map_err(|_| SimpleError::new(ErrorKind::OutOfMemory))?;
		output = OutBuffer::around(&mut output_buf);

		input_hint = zstd
			.decompress_stream(&mut output, &mut input)
			.map_err(zstd_error)?;
		trace!(
			%input_hint,
			input_pos = input.pos,
			input_size = input.src.len(),
			output_pos = output.pos(),
			"decompressed again"
		);
	}

	let output_written = output.as_slice().len();

	#[allow(clippy::drop_non_drop)]
	drop(output);

	if output_written != output_buf.len() {
		output_buf.truncate(output_written);
	}

	if input.pos < input.src.len() || input_hint != 0 {
		return Err(SimpleError::new(ErrorKind::TruncatedRow).into());
	}

	Ok(output_buf)
}

fn zstd_error(code: usize) -> crate::error::XlogError {
	let io_err = crate::map_zstd_error(code);
	SimpleError::new(ErrorKind::Zstd)
		.with_message(format!("zstd error: {io_err}"))
		.into()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn rejects_undersized_frame() {
		let err = inflate(&[0, 1, 2], 0).unwrap_err();
		assert!(format!("{err}").contains("truncated compressed"));
	}

	#[test]
	fn roundtrips_a_small_frame() {
		let plain = b"hello from the write-ahead log";
		let mut compressed = vec![0u8; zstd_safe::compress_bound(plain.len())];
		let written =
			zstd_safe::compress(&mut compressed, plain, 3).expect("compress");
		compressed.truncate(written);
		let decompressed = inflate(&compressed, 0).unwrap();
		assert_eq!(decompressed, plain);
	}

	/// Large and varied enough (several times `DCtx::out_size()`, low-redundancy content) that a
	/// single `decompress_stream` call can't drain it: exercises the loop that keeps feeding
	/// leftover input even when the output buffer isn't yet full.
	#[test]
	fn roundtrips_a_multi_block_frame() {
		let mut plain = Vec::with_capacity(1_500_000);
		let mut state: u32 = 0x2545f491;
		for _ in 0..1_500_000 {
			state = state.wrapping_mul(1103515245).wrapping_add(12345);
			plain.push((state >> 16) as u8);
		}

		let mut compressed = vec![0u8; zstd_safe::compress_bound(plain.len())];
		let written = zstd_safe::compress(&mut compressed, &plain, 3).expect("compress");
		compressed.truncate(written);

		let decompressed = inflate(&compressed, 0).unwrap();
		assert_eq!(decompressed, plain);
	}
}
