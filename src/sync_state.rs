use thiserror::Error;

use crate::Page;
use crate::crc::Crc32;
use crate::page::{ HEADER_CHECKSUM, HEADER_SEGMENTS, HEADER_SIZE_MIN };

/// The `SyncState` is responsible for decoding and syncing [Pages](Page).
///
/// Raw bytes of a physical Ogg stream go in; framed, checksummed
/// pages come out. Corrupt or truncated spans are skipped by hunting
/// for the next capture pattern whose checksum verifies.
///
/// ## Usage
///
/// Use [submit_bytes](SyncState::submit_bytes) to write bytes of a
/// physical Ogg stream, and get back [Pages](Page) from it if any
/// could be assembled:
///
/// ```rust
/// # use ogg_framing::SyncState;
/// # let bytes = vec![0; 28];
/// let mut sync_state = SyncState::new();
/// // `&bytes` is a `&[u8]`, replace it with your input bytes
/// match sync_state.submit_bytes(&bytes) {
/// 	Some(pages) => {
/// 		for page in pages {
/// 			println!("version: {}", page.version());
/// 			println!("begins a logical stream: {}", page.begins_logical_stream());
/// 			println!("ends a logical stream: {}", page.ends_logical_stream());
/// 			println!("granule position: {}", page.absgp());
/// 		}
/// # 		panic!("zeroed bytes produced a page")
/// 	},
/// 	None => println!("no pages could be assembled from these bytes yet")
/// }
/// ```
///
/// The lower-level [buffer](SyncState::buffer) /
/// [wrote](SyncState::wrote) / [page_out](SyncState::page_out) calls
/// expose the same machinery one step at a time, which is useful when
/// reading from a file or socket directly into the sync buffer.
pub struct SyncState {
	data: Vec<u8>,
	/// Bytes of `data` holding submitted input.
	fill: usize,
	/// Bytes of `data` already consumed by returned pages or skips.
	returned: usize,
	unsynced: bool,
	/// Header length of the page candidate being parsed, 0 when no
	/// candidate has been sized yet.
	headerbytes: usize,
	bodybytes: usize
}

/// The outcome of one [page_seek](SyncState::page_seek) step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageSeek {
	/// A page was framed, checksummed and consumed.
	Page (Page),
	/// More data is needed before the candidate at the front of the
	/// buffer can be framed or rejected.
	Incomplete,
	/// This many bytes were skipped hunting for a capture pattern
	/// after a mismatch or a failed checksum.
	Skipped (usize)
}

impl SyncState {
	/// Return an initialized `SyncState`.
	pub fn new() -> Self {
		Self {
			data: Vec::new(),
			fill: 0,
			returned: 0,
			unsynced: false,
			headerbytes: 0,
			bodybytes: 0
		}
	}

	/// Reset this `SyncState` to a new state, discarding any
	/// buffered bytes.
	pub fn reset(&mut self) {
		self.fill = 0;
		self.returned = 0;
		self.unsynced = false;
		self.headerbytes = 0;
		self.bodybytes = 0;
	}

	/// Check whether this `SyncState` is currently in sync.
	pub fn is_synced(&self) -> bool {
		!self.unsynced
	}

	/// Expose a writable region of at least `size` bytes at the fill
	/// cursor, compacting already-consumed bytes to the front first.
	///
	/// Commit what was actually written with [wrote](SyncState::wrote).
	pub fn buffer(&mut self, size: usize) -> &mut [u8] {
		if self.returned > 0 {
			self.data.copy_within(self.returned..self.fill, 0);
			self.fill -= self.returned;
			self.returned = 0;
		}
		if self.data.len() < self.fill + size {
			self.data.resize(self.fill + size, 0);
		}
		&mut self.data[self.fill..self.fill + size]
	}

	/// Tell the `SyncState` how many bytes were written into the
	/// region [buffer](SyncState::buffer) exposed.
	pub fn wrote(&mut self, bytes: usize) -> Result<(), WroteError> {
		if self.fill + bytes > self.data.len() {
			return Err(WroteError {
				committed: bytes,
				available: self.data.len() - self.fill
			})
		}
		self.fill += bytes;
		Ok(())
	}

	/// Verify the page candidate at the front of the buffer.
	///
	/// Checks the capture pattern, sizes the header from the segment
	/// table, and recomputes the checksum once the whole candidate is
	/// buffered. A verified page is consumed and returned; a mismatch
	/// of either the capture pattern or the checksum skips forward to
	/// the next possible capture byte and reports how far.
	pub fn page_seek(&mut self) -> PageSeek {
		let bytes = self.fill - self.returned;

		if self.headerbytes == 0 {
			if bytes < HEADER_SIZE_MIN {
				return PageSeek::Incomplete
			}
			let candidate = &self.data[self.returned..self.fill];
			if &candidate[..4] != b"OggS" {
				return self.seek_failed()
			}
			let headerbytes = HEADER_SIZE_MIN + candidate[HEADER_SEGMENTS] as usize;
			if bytes < headerbytes {
				return PageSeek::Incomplete
			}
			self.bodybytes = candidate[HEADER_SIZE_MIN..headerbytes]
				.iter()
				.map(|&value| value as usize)
				.sum();
			self.headerbytes = headerbytes;
		}

		if self.headerbytes + self.bodybytes > bytes {
			return PageSeek::Incomplete
		}

		let candidate = &self.data[self.returned..self.returned + self.headerbytes + self.bodybytes];
		let mut crc = Crc32::new();
		crc.update(&candidate[..HEADER_CHECKSUM]);
		crc.update(&[0; 4]);
		crc.update(&candidate[HEADER_CHECKSUM + 4..]);
		if candidate[HEADER_CHECKSUM..HEADER_CHECKSUM + 4] != crc.finish().to_le_bytes()[..] {
			// corrupt page, or a miscapture that was never a page
			return self.seek_failed()
		}

		let header = candidate[..self.headerbytes].to_vec();
		let body = candidate[self.headerbytes..].to_vec();
		self.returned += self.headerbytes + self.bodybytes;
		self.unsynced = false;
		self.headerbytes = 0;
		self.bodybytes = 0;
		PageSeek::Page(Page::from_parts(header, body))
	}

	/// Skip to the next possible capture pattern and report how many
	/// bytes the hunt consumed.
	fn seek_failed(&mut self) -> PageSeek {
		self.headerbytes = 0;
		self.bodybytes = 0;

		let skipped = match self.data[self.returned + 1..self.fill]
			.iter()
			.position(|&byte| byte == b'O')
		{
			Some(offset) => 1 + offset,
			None => self.fill - self.returned
		};
		self.returned += skipped;
		PageSeek::Skipped(skipped)
	}

	/// Export the next `Page` from the buffered bytes.
	///
	/// Skipped spans are reported as
	/// [OutOfSync](PageWriteError::OutOfSync) once per contiguous run
	/// of unparsable bytes; calling again resumes the hunt.
	pub fn page_out(&mut self) -> Result<Page, PageWriteError> {
		loop {
			match self.page_seek() {
				PageSeek::Page(page) => return Ok(page),
				PageSeek::Incomplete => return Err(PageWriteError::Incomplete),
				PageSeek::Skipped(_) => {
					if !self.unsynced {
						self.unsynced = true;
						return Err(PageWriteError::OutOfSync)
					}
				}
			}
		}
	}

	/// Write bytes to the `SyncState` and return all [Pages](Page),
	/// if any, that were completed by the input bytes.
	///
	/// Corrupt spans are skipped silently; check
	/// [is_synced](SyncState::is_synced) to tell whether the tail of
	/// the input was still being skipped when the bytes ran out.
	pub fn submit_bytes(&mut self, bytes: &[u8]) -> Option<Vec<Page>> {
		if !bytes.is_empty() {
			self.buffer(bytes.len()).copy_from_slice(bytes);
			self.fill += bytes.len();
		}

		let mut collected = vec![];
		loop {
			match self.page_out() {
				Ok(page) => collected.push(page),
				Err(PageWriteError::OutOfSync) => continue,
				Err(PageWriteError::Incomplete) => break
			}
		}
		if collected.is_empty() {
			None
		} else {
			Some(collected)
		}
	}
}

impl Default for SyncState {
	fn default() -> Self {
		Self::new()
	}
}

/// An error returned while writing out a page.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageWriteError {
	#[error("stream has not captured sync, bytes were skipped")]
	OutOfSync,
	#[error("not enough data has been submitted to complete a page")]
	Incomplete
}

/// An error returned when a write commits more bytes than the
/// exposed buffer region holds.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
#[error("committing {committed} bytes overflows the {available} byte write region")]
pub struct WroteError {
	pub committed: usize,
	pub available: usize
}
