//! The public streaming reader and its pull-driven record iterator.

use std::path::Path;

use tracing::{debug, instrument, trace};

use crate::{
	constants::FileVersion,
	error::{ErrorKind, Result, SimpleError},
	fixheader::read_fixheader,
	marker::{scan_marker, Marker},
	msgpack::split_record,
	prologue::read_prologue,
	source::{ByteSource, ReadExact},
	zstd_stage::inflate,
};

/// One decoded record: a header map and a body map, each raw, undecoded MessagePack bytes.
#[derive(Debug, Clone)]
pub struct Record {
	/// The record's header map.
	pub header: Vec<u8>,
	/// The record's body map.
	pub body: Vec<u8>,
}

/// Streaming, pull-driven reader over a Tarantool `.snap`/`.xlog` file.
///
/// Construct with [`XlogReader::open`], then iterate. Opening fails eagerly if the file can't be
/// read or its prologue doesn't parse; there's no point handing back a reader that's already
/// known to be unusable. Iteration errors are returned one at a time, and the reader stops
/// producing records after the first one: a framing error means the rest of the stream can no
/// longer be trusted to resynchronize sensibly.
pub struct XlogReader {
	source: ByteSource,
	version: FileVersion,
	state: DriverState,
	pending: Option<Pending>,
}

/// A decompressed (or aliased-uncompressed) record window not yet fully consumed by the
/// splitter. One frame can yield more than one (header, body) pair: a `ZROW`'s decompressed
/// output commonly holds several records back-to-back, so this is drained pair by pair across
/// several [`XlogReader::next`] calls before the driver goes back to the marker scanner.
struct Pending {
	bytes: Vec<u8>,
	pos: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DriverState {
	/// Ready to scan for the next marker.
	Ready,
	/// The EOF marker was seen, or the file ended cleanly with no marker at all.
	Done,
	/// A previous call returned an error.
	Poisoned,
}

impl XlogReader {
	/// Open a file and parse its prologue, detecting the format version.
	#[instrument(level = "debug", skip(path))]
	pub fn open(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		debug!(path = %path.display(), "opening xlog/snapshot file");
		let mut source = ByteSource::open(path).map_err(|_| SimpleError::new(ErrorKind::Open))?;
		let version = read_prologue(&mut source)?;
		debug!(%version, "detected file version");
		Ok(Self {
			source,
			version,
			state: DriverState::Ready,
			pending: None,
		})
	}

	/// The detected format version.
	pub fn version(&self) -> FileVersion {
		self.version
	}

	#[instrument(level = "debug", skip(self))]
	fn read_next(&mut self) -> Result<Option<Record>> {
		loop {
			if let Some(pending) = &mut self.pending {
				if pending.pos < pending.bytes.len() {
					let split = split_record(&pending.bytes[pending.pos..])?;
					let record = Record {
						header: split.header.to_vec(),
						body: split.body.to_vec(),
					};
					pending.pos += split.header.len() + split.body.len();
					trace!(pos = pending.pos, "yielded record from pending window");
					return Ok(Some(record));
				}
				self.pending = None;
			}

			let frame_offset = self.source.offset();
			let marker = match scan_marker(&mut self.source, self.version)? {
				Marker::Eof => {
					self.state = DriverState::Done;
					return Ok(None);
				}
				marker => marker,
			};

			let fixheader = read_fixheader(&mut self.source)?;
			let payload_offset = self.source.offset();
			let payload = match self.source.read_exact(fixheader.len as usize)? {
				ReadExact::Full(bytes) => bytes,
				ReadExact::Eof | ReadExact::Short => {
					return Err(SimpleError::new(ErrorKind::TruncatedRow).into());
				}
			};

			let plain = match marker {
				Marker::Row => payload,
				Marker::Zrow => inflate(&payload, payload_offset)?,
				Marker::Eof => unreachable!("EOF is handled above, before reading a fixheader"),
			};

			self.source.advise_if_due();
			trace!(frame_offset, "buffered frame, draining into records");
			self.pending = Some(Pending { bytes: plain, pos: 0 });
		}
	}
}

impl Iterator for XlogReader {
	type Item = Result<Record>;

	fn next(&mut self) -> Option<Self::Item> {
		match self.state {
			DriverState::Done | DriverState::Poisoned => None,
			DriverState::Ready => match self.read_next() {
				Ok(Some(record)) => Some(Ok(record)),
				Ok(None) => None,
				Err(err) => {
					self.state = DriverState::Poisoned;
					Some(Err(err))
				}
			},
		}
	}
}

impl Drop for XlogReader {
	fn drop(&mut self) {
		self.source.advise_whole_file();
	}
}

#[cfg(test)]
mod tests {
	use std::io::Write;

	use rmp::encode;

	use super::*;
	use crate::constants::{EOF_MARKER, ROW_MARKER};

	fn write_row(buf: &mut Vec<u8>, header: &[u8], body: &[u8]) {
		buf.extend_from_slice(&ROW_MARKER.to_be_bytes());
		let mut payload = Vec::new();
		payload.extend_from_slice(header);
		payload.extend_from_slice(body);
		encode::write_u32(buf, payload.len() as u32).unwrap();
		encode::write_u32(buf, 0).unwrap();
		encode::write_u32(buf, 0).unwrap();
		buf.extend_from_slice(&payload);
	}

	fn encode_map_pair() -> (Vec<u8>, Vec<u8>) {
		let mut header = Vec::new();
		encode::write_map_len(&mut header, 1).unwrap();
		encode::write_str(&mut header, "type").unwrap();
		encode::write_str(&mut header, "insert").unwrap();

		let mut body = Vec::new();
		encode::write_map_len(&mut body, 1).unwrap();
		encode::write_str(&mut body, "space_id").unwrap();
		encode::write_uint(&mut body, 512).unwrap();

		(header, body)
	}

	fn write_file(records: usize) -> tempfile::NamedTempFile {
		let mut file = tempfile::NamedTempFile::new().expect("tempfile");
		let mut bytes = Vec::new();
		bytes.extend_from_slice(b"SNAP\n0.12\n\n");
		let (header, body) = encode_map_pair();
		for _ in 0..records {
			write_row(&mut bytes, &header, &body);
		}
		bytes.extend_from_slice(&EOF_MARKER.to_be_bytes());
		file.write_all(&bytes).unwrap();
		file.flush().unwrap();
		file
	}

	#[test]
	fn reads_all_records_then_stops() {
		let file = write_file(3);
		let reader = XlogReader::open(file.path()).unwrap();
		let records: Vec<_> = reader.collect::<Result<_>>().unwrap();
		assert_eq!(records.len(), 3);
	}

	#[test]
	fn zero_records_before_eof_marker_yields_nothing() {
		let file = write_file(0);
		let reader = XlogReader::open(file.path()).unwrap();
		let records: Vec<_> = reader.collect::<Result<_>>().unwrap();
		assert!(records.is_empty());
	}

	#[test]
	fn empty_file_after_prologue_is_a_truncated_stream_error() {
		let mut file = tempfile::NamedTempFile::new().expect("tempfile");
		file.write_all(b"SNAP\n0.12\n\n").unwrap();
		file.flush().unwrap();

		let mut reader = XlogReader::open(file.path()).unwrap();
		let err = reader.next().expect("one error").unwrap_err();
		assert!(format!("{err}").contains("truncated stream"));
	}

	#[test]
	fn rejects_unopenable_path() {
		assert!(XlogReader::open("/nonexistent/path/to/nowhere.xlog").is_err());
	}

	fn write_zrow(buf: &mut Vec<u8>, pairs: &[(Vec<u8>, Vec<u8>)]) {
		let mut plain = Vec::new();
		for (header, body) in pairs {
			plain.extend_from_slice(header);
			plain.extend_from_slice(body);
		}
		let mut compressed = vec![0u8; zstd_safe::compress_bound(plain.len())];
		let written = zstd_safe::compress(&mut compressed, &plain, 3).expect("compress");
		compressed.truncate(written);

		buf.extend_from_slice(&crate::constants::ZROW_MARKER.to_be_bytes());
		encode::write_u32(buf, compressed.len() as u32).unwrap();
		encode::write_u32(buf, 0).unwrap();
		encode::write_u32(buf, 0).unwrap();
		buf.extend_from_slice(&compressed);
	}

	#[test]
	fn single_zrow_frame_yields_multiple_pairs() {
		let mut bytes = Vec::new();
		bytes.extend_from_slice(b"XLOG\n0.13\n\n");
		let pair_a = encode_map_pair();
		let pair_b = encode_map_pair();
		write_zrow(&mut bytes, &[pair_a, pair_b]);
		bytes.extend_from_slice(&EOF_MARKER.to_be_bytes());

		let mut file = tempfile::NamedTempFile::new().expect("tempfile");
		file.write_all(&bytes).unwrap();
		file.flush().unwrap();

		let reader = XlogReader::open(file.path()).unwrap();
		let records: Vec<_> = reader.collect::<Result<_>>().unwrap();
		assert_eq!(records.len(), 2);
	}

	#[test]
	fn junk_between_frames_does_not_prevent_resync() {
		let mut bytes = Vec::new();
		bytes.extend_from_slice(b"SNAP\n0.12\n\n");
		let (header, body) = encode_map_pair();
		write_row(&mut bytes, &header, &body);
		bytes.extend_from_slice(&[0xaa; 64]);
		write_row(&mut bytes, &header, &body);
		bytes.extend_from_slice(&EOF_MARKER.to_be_bytes());

		let mut file = tempfile::NamedTempFile::new().expect("tempfile");
		file.write_all(&bytes).unwrap();
		file.flush().unwrap();

		let reader = XlogReader::open(file.path()).unwrap();
		let records: Vec<_> = reader.collect::<Result<_>>().unwrap();
		assert_eq!(records.len(), 2);
	}

	#[test]
	fn missing_eof_marker_is_a_truncated_stream_error() {
		let mut bytes = Vec::new();
		bytes.extend_from_slice(b"SNAP\n0.12\n\n");
		let mut file = tempfile::NamedTempFile::new().expect("tempfile");
		file.write_all(&bytes).unwrap();
		file.flush().unwrap();

		let mut reader = XlogReader::open(file.path()).unwrap();
		let err = reader.next().expect("one error").unwrap_err();
		assert!(format!("{err}").contains("truncated stream"));

		bytes.push(0xaa);
		let mut file = tempfile::NamedTempFile::new().expect("tempfile");
		file.write_all(&bytes).unwrap();
		file.flush().unwrap();
		let mut reader = XlogReader::open(file.path()).unwrap();
		let err = reader.next().expect("one error").unwrap_err();
		assert!(format!("{err}").contains("truncated stream"));
	}
}
