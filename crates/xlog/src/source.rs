//! Buffered sequential byte source over a file, with offset tracking and a cache-eviction hint.

use std::{
	fs::File,
	io::{self, BufReader, Read},
	path::Path,
};

use tracing::trace;

use crate::{
	constants::FADVISE_WINDOW,
	error::{ErrorKind, Result, SimpleError},
};

/// Outcome of a fixed-size read.
pub(crate) enum ReadExact {
	/// Got exactly the requested number of bytes.
	Full(Vec<u8>),
	/// Hit EOF before any byte was read.
	Eof,
	/// Hit EOF after some, but not all, of the requested bytes were read.
	Short,
}

/// A buffered, offset-tracking reader over one file, plus a best-effort page-cache eviction hint.
///
/// This is deliberately sequential-only: xlog/snapshot files are read front to back exactly once,
/// so there's no seeking API here, unlike a random-access byte source would need.
pub(crate) struct ByteSource {
	reader: BufReader<File>,
	offset: u64,
	last_advised: u64,
	fd: RawFdHint,
}

// Kept as a distinct newtype so the unix-only field doesn't need `#[cfg]` at every use site.
#[cfg(unix)]
struct RawFdHint(std::os::unix::io::RawFd);
#[cfg(not(unix))]
struct RawFdHint;

impl ByteSource {
	pub(crate) fn open(path: &Path) -> io::Result<Self> {
		let file = File::open(path)?;

		#[cfg(unix)]
		let fd = {
			use std::os::unix::io::AsRawFd;
			RawFdHint(file.as_raw_fd())
		};
		#[cfg(not(unix))]
		let fd = RawFdHint;

		Ok(Self {
			reader: BufReader::new(file),
			offset: 0,
			last_advised: 0,
			fd,
		})
	}

	/// Current offset into the file, i.e. how many bytes have been logically consumed so far.
	pub(crate) fn offset(&self) -> u64 {
		self.offset
	}

	/// Read exactly `n` bytes, distinguishing a clean EOF (no bytes at all) from a short read.
	///
	/// `n` comes straight from a record's declared length, which an attacker or a corrupted file
	/// can set as high as the body-length cap (2 GiB); the allocation is fallible so a hostile
	/// length reports `"out of memory"` instead of aborting the process.
	pub(crate) fn read_exact(&mut self, n: usize) -> Result<ReadExact> {
		let mut buf = Vec::new();
		buf.try_reserve_exact(n)
			.map_err(|_| SimpleError::new(ErrorKind::OutOfMemory))?;
		buf.resize(n, 0);
		let mut filled = 0;
		while filled < n {
			match self.reader.read(&mut buf[filled..]) {
				Ok(0) => {
					return Ok(if filled == 0 {
						ReadExact::Eof
					} else {
						ReadExact::Short
					});
				}
				Ok(read) => filled += read,
				Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
				Err(e) => return Err(e.into()),
			}
		}
		self.offset += n as u64;
		Ok(ReadExact::Full(buf))
	}

	/// Read a single byte, returning `None` on EOF.
	pub(crate) fn read_byte(&mut self) -> io::Result<Option<u8>> {
		let mut byte = [0u8; 1];
		loop {
			match self.reader.read(&mut byte) {
				Ok(0) => return Ok(None),
				Ok(_) => {
					self.offset += 1;
					return Ok(Some(byte[0]));
				}
				Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
				Err(e) => return Err(e),
			}
		}
	}

	/// Read one line (up to and including the trailing `\n`), capped at `max_len` bytes.
	///
	/// Returns `None` on EOF before any byte is read. A line longer than `max_len`, or one that
	/// hits EOF without a trailing newline, is still returned as-is; callers validate content.
	pub(crate) fn read_line(&mut self, max_len: usize) -> io::Result<Option<Vec<u8>>> {
		let mut line = Vec::new();
		loop {
			let Some(byte) = self.read_byte()? else {
				return Ok(if line.is_empty() { None } else { Some(line) });
			};
			line.push(byte);
			if byte == b'\n' || line.len() >= max_len {
				return Ok(Some(line));
			}
		}
	}

	/// Advise the OS that the byte range already consumed can be evicted from the page cache,
	/// if the current offset has advanced far enough past the last hint.
	pub(crate) fn advise_if_due(&mut self) {
		if self.offset >= self.last_advised + FADVISE_WINDOW {
			self.advise_dontneed(self.last_advised, self.offset);
			self.last_advised = self.offset;
		}
	}

	/// Unconditionally advise eviction of the whole file, used on drop.
	pub(crate) fn advise_whole_file(&mut self) {
		self.advise_dontneed(0, self.offset);
	}

	#[cfg(unix)]
	fn advise_dontneed(&self, from: u64, to: u64) {
		use nix::fcntl::{posix_fadvise, PosixFadviseAdvice};
		let len = to.saturating_sub(from);
		trace!(from, to, "advise POSIX_FADV_DONTNEED");
		// Best-effort: a failure here has no effect on correctness.
		let _ = posix_fadvise(
			self.fd.0,
			from as i64,
			len as i64,
			PosixFadviseAdvice::POSIX_FADV_DONTNEED,
		);
	}

	#[cfg(not(unix))]
	fn advise_dontneed(&self, _from: u64, _to: u64) {
		// No-op: posix_fadvise has no equivalent on this platform.
	}
}
