use std::num::NonZeroUsize;

use thiserror::Error;

use crate::{ Packet, Page };
use crate::page::{ HEADER_SEGMENTS, HEADER_SIZE_MIN };

/// A page never carries more than this many segment table entries.
const MAX_PAGE_SEGMENTS: usize = 255;

/// Body bytes on a page before the non-forced flush heuristic starts
/// looking for a packet boundary to break at.
const DEFAULT_PAGE_FILL: usize = 4096;

/// One segment table entry, tagged with the bookkeeping the packet
/// queue needs: whether a packet begins here, whether the logical
/// stream ends here, whether this entry stands in for a lost page,
/// and the granule position known at this point (`-1` when none is).
#[derive(Clone, Copy, Debug)]
struct Lacing {
	size: u16,
	begin: bool,
	end: bool,
	gap: bool,
	absgp: i64
}

impl Lacing {
	fn segment(size: u16, absgp: i64) -> Self {
		Self { size, begin: false, end: false, gap: false, absgp }
	}

	fn gap_marker() -> Self {
		Self { size: 0, begin: false, end: false, gap: true, absgp: -1 }
	}
}

/// This struct is responsible for managing the current encode and
/// decode state of a logical stream.
///
/// For decoding Ogg streams, see the relevant methods
/// [page_in](Stream::page_in) and [packet_out](Stream::packet_out).
///
/// For encoding Ogg streams, see the relevant methods
/// [packet_in](Stream::packet_in) and [page_out](Stream::page_out).
pub struct Stream {
	/// Packet payload bytes, complete packets first.
	body: Vec<u8>,
	/// Body bytes already handed out by `packet_out`, reclaimed on
	/// the next `packet_in`/`page_in`.
	body_returned: usize,
	lacing: Vec<Lacing>,
	/// Entries up to here form whole packets (or gap markers).
	lacing_packet: usize,
	/// Entries up to here were already consumed by `packet_out`.
	lacing_returned: usize,
	serial: u32,
	/// The next page sequence number, `None` until a page has been
	/// produced or accepted.
	pageno: Option<u32>,
	packetno: i64,
	granulepos: i64,
	b_o_s: bool,
	e_o_s: bool
}

impl Stream {
	/// Return an initialized `Stream` for the given serial number.
	pub fn new(serial: u32) -> Self {
		Self {
			body: Vec::new(),
			body_returned: 0,
			lacing: Vec::new(),
			lacing_packet: 0,
			lacing_returned: 0,
			serial,
			pageno: None,
			packetno: 0,
			granulepos: 0,
			b_o_s: false,
			e_o_s: false
		}
	}

	/// Return the serial number of this logical stream.
	pub fn serial(&self) -> u32 {
		self.serial
	}

	/// Reset this `Stream` back to an initial state.
	pub fn reset(&mut self) {
		self.body.clear();
		self.body_returned = 0;
		self.lacing.clear();
		self.lacing_packet = 0;
		self.lacing_returned = 0;
		self.pageno = None;
		self.packetno = 0;
		self.granulepos = 0;
		self.b_o_s = false;
		self.e_o_s = false;
	}

	/// Reset this `Stream` and bind it to a new serial number.
	///
	/// Useful when reusing the stream after a seek, or to decode a
	/// chained logical stream with the same object.
	pub fn reset_serial(&mut self, serial: u32) {
		self.reset();
		self.serial = serial;
	}

	/// Check if the `Stream` has ended.
	///
	/// On the decode side this is true once a page flagged as the
	/// last of the stream has been accepted and every packet on the
	/// queue has been drained.
	pub fn end_of_stream(&self) -> bool {
		self.e_o_s && self.lacing_returned == self.lacing.len()
	}

	/// Reclaim body bytes already handed out to the caller.
	fn reclaim_returned(&mut self) {
		if self.body_returned > 0 {
			self.body.drain(..self.body_returned);
			self.body_returned = 0;
		}
		if self.lacing_returned > 0 {
			self.lacing.drain(..self.lacing_returned);
			self.lacing_packet -= self.lacing_returned;
			self.lacing_returned = 0;
		}
	}

	/// Add a `Packet` to the `Stream`.
	///
	/// The payload is copied into the stream's buffers and broken
	/// into segments; call [page_out](Stream::page_out) or
	/// [page_flush](Stream::page_flush) to get the framed pages back
	/// out.
	pub fn packet_in(&mut self, packet: &Packet) {
		self.reclaim_returned();

		let bytes = packet.data().len();
		self.body.extend_from_slice(packet.data());

		// one 255 entry per whole segment, recording the granule
		// position of the previous packet, then the terminal entry
		// (even when its size is 0) carrying this packet's own
		let first = self.lacing.len();
		for _ in 0..bytes / 255 {
			self.lacing.push(Lacing::segment(255, self.granulepos));
		}
		self.lacing.push(Lacing::segment((bytes % 255) as u16, packet.absgp()));
		self.granulepos = packet.absgp();
		self.lacing[first].begin = true;

		self.packetno += 1;
		if packet.ends_logical_stream() {
			self.e_o_s = true;
		}
	}

	/// Select a prefix of the pending segments and frame it as one
	/// page.
	fn flush_page(&mut self, mut force: bool, nfill: usize) -> Option<Page> {
		let maxvals = self.lacing.len().min(MAX_PAGE_SEGMENTS);
		if maxvals == 0 {
			return None
		}

		let mut vals = 0;
		let mut granule_pos: i64 = -1;

		if !self.b_o_s {
			// the first page carries the first packet and nothing
			// else, so codecs can demand a minimal identifier page
			granule_pos = 0;
			while vals < maxvals {
				let terminal = self.lacing[vals].size < 255;
				vals += 1;
				if terminal {
					break
				}
			}
		} else {
			// don't span pages needlessly, and don't flush a page
			// with fewer than four packets on it unless asked to
			let mut accumulated = 0;
			let mut packets_done = 0;
			let mut packet_just_done = 0;
			while vals < maxvals {
				if accumulated > nfill && packet_just_done >= 4 {
					force = true;
					break
				}
				accumulated += self.lacing[vals].size as usize;
				if self.lacing[vals].size < 255 {
					granule_pos = self.lacing[vals].absgp;
					packets_done += 1;
					packet_just_done = packets_done;
				} else {
					packet_just_done = 0;
				}
				vals += 1;
			}
			if vals == MAX_PAGE_SEGMENTS {
				force = true;
			}
		}

		if !force {
			return None
		}

		let mut header = Vec::with_capacity(HEADER_SIZE_MIN + vals);
		header.extend_from_slice(b"OggS");

		// stream structure version
		header.push(0);

		let mut flags = 0u8;
		if !self.lacing[0].begin {
			flags |= 0x01;
		}
		if !self.b_o_s {
			flags |= 0x02;
		}
		if self.e_o_s && self.lacing.len() == vals {
			flags |= 0x04;
		}
		header.push(flags);
		self.b_o_s = true;

		header.extend_from_slice(&granule_pos.to_le_bytes());
		header.extend_from_slice(&self.serial.to_le_bytes());

		let pageno = self.pageno.unwrap_or(0);
		self.pageno = Some(pageno.wrapping_add(1));
		header.extend_from_slice(&pageno.to_le_bytes());

		// zero for computation; filled in below
		header.extend_from_slice(&[0; 4]);

		header.push(vals as u8);
		let mut bytes = 0;
		for lacing in &self.lacing[..vals] {
			header.push(lacing.size as u8);
			bytes += lacing.size as usize;
		}

		debug_assert_eq!(header.len(), HEADER_SIZE_MIN + vals);

		let body = self.body[self.body_returned..self.body_returned + bytes].to_vec();
		self.body_returned += bytes;
		self.lacing.drain(..vals);

		let mut page = Page::from_parts(header, body);
		page.set_crc_checksum();
		Some(page)
	}

	/// Export a `Page` from the `Stream`, if enough packet data has
	/// accumulated.
	///
	/// Returns `None` while the pending segments are below the
	/// nominal page size; [page_flush](Stream::page_flush) forces an
	/// undersized page out instead.
	pub fn page_out(&mut self) -> Option<Page> {
		self.flush_page(false, DEFAULT_PAGE_FILL)
	}

	/// Export a `Page` from the `Stream`, using the given nominal
	/// body size instead of the default.
	pub fn page_out_with_max_size(&mut self, size: NonZeroUsize) -> Option<Page> {
		self.flush_page(false, size.get())
	}

	/// Flush remaining packets in the `Stream` into a `Page`.
	///
	/// This will force create a page, even if it is undersized. This
	/// is how the trailing page of a stream is emitted, and how an
	/// encoder keeps its header packets on pages of their own.
	///
	/// Returns `None` only when no packet data is pending at all.
	pub fn page_flush(&mut self) -> Option<Page> {
		self.flush_page(true, DEFAULT_PAGE_FILL)
	}

	/// Flush remaining packets in the `Stream` into a `Page` with at
	/// most the given nominal body size.
	pub fn page_flush_with_max_size(&mut self, size: NonZeroUsize) -> Option<Page> {
		self.flush_page(true, size.get())
	}

	/// Add a `Page` to the `Stream`.
	///
	/// The page must carry this stream's serial number; pages of an
	/// interleaved physical stream are routed by checking
	/// [stream_serial](Page::stream_serial) first. A skipped page
	/// sequence number drops the unfinished packet and records a gap
	/// that [packet_out](Stream::packet_out) will report once.
	pub fn page_in(&mut self, page: &Page) -> Result<(), PageInError> {
		if page.stream_serial() != self.serial {
			return Err(PageInError::WrongSerial {
				expected: self.serial,
				actual: page.stream_serial()
			})
		}
		if page.version() != 0 {
			return Err(PageInError::UnsupportedVersion(page.version()))
		}

		self.reclaim_returned();

		let header = page.header();
		let segments = header[HEADER_SEGMENTS] as usize;
		let segment_table = &header[HEADER_SIZE_MIN..HEADER_SIZE_MIN + segments];
		let continued = page.continues_packet();
		let mut bos = page.begins_logical_stream();
		let eos = page.ends_logical_stream();

		if self.pageno != Some(page.index()) {
			// unroll the unfinished packet from the missing page
			let trailing: usize = self.lacing[self.lacing_packet..]
				.iter()
				.map(|lacing| lacing.size as usize)
				.sum();
			self.body.truncate(self.body.len() - trailing);
			self.lacing.truncate(self.lacing_packet);

			// note the loss, except on the very first page accepted
			if self.pageno.is_some() {
				self.lacing.push(Lacing::gap_marker());
				self.lacing_packet = self.lacing.len();
			}
		}

		let mut segptr = 0;
		let mut body = page.data();
		if continued {
			let resumes = match self.lacing.last() {
				Some(last) => !last.gap && last.size == 255,
				None => false
			};
			if !resumes {
				// an orphaned continuation; skip the carried-over
				// segments rather than glue them to the wrong packet
				bos = false;
				while segptr < segments {
					let value = segment_table[segptr] as usize;
					body = &body[value..];
					segptr += 1;
					if value < 255 {
						break
					}
				}
			}
		}

		self.body.extend_from_slice(body);

		let mut saved = None;
		while segptr < segments {
			let value = segment_table[segptr] as u16;
			let mut lacing = Lacing::segment(value, -1);
			if bos {
				lacing.begin = true;
				bos = false;
			}
			self.lacing.push(lacing);
			segptr += 1;
			if value < 255 {
				saved = Some(self.lacing.len() - 1);
				self.lacing_packet = self.lacing.len();
			}
		}

		// the page granule position belongs to the segment that
		// completes its last whole packet
		if let Some(index) = saved {
			self.lacing[index].absgp = page.absgp();
		}

		if eos {
			self.e_o_s = true;
			if let Some(last) = self.lacing.last_mut() {
				last.end = true;
			}
		}

		self.pageno = Some(page.index().wrapping_add(1));
		Ok(())
	}

	fn take_packet(&mut self, advance: bool) -> Result<Packet, PacketOutError> {
		let mut pointer = self.lacing_returned;
		if self.lacing_packet <= pointer {
			return Err(PacketOutError::Incomplete)
		}

		if self.lacing[pointer].gap {
			// a page went missing; the codec needs to hear about the
			// gap before it sees the data on the far side of it
			self.lacing_returned += 1;
			self.packetno += 1;
			return Err(PacketOutError::OutOfSync)
		}

		let mut size = self.lacing[pointer].size;
		let mut bytes = size as usize;
		let begins = self.lacing[pointer].begin;
		let mut ends = self.lacing[pointer].end;

		while size == 255 {
			pointer += 1;
			size = self.lacing[pointer].size;
			if self.lacing[pointer].end {
				ends = true;
			}
			bytes += size as usize;
		}

		let packet = Packet::from_parts(
			self.body[self.body_returned..self.body_returned + bytes].to_vec(),
			begins,
			ends,
			self.lacing[pointer].absgp,
			self.packetno
		);

		if advance {
			self.body_returned += bytes;
			self.lacing_returned = pointer + 1;
			self.packetno += 1;
		}

		Ok(packet)
	}

	/// Export a packet from the `Stream`.
	///
	/// This should be run *after* submitting at least one `Page` to
	/// the stream. Returns [Incomplete](PacketOutError::Incomplete)
	/// once every whole packet has been drained, and
	/// [OutOfSync](PacketOutError::OutOfSync) exactly once where a
	/// lost or corrupt page left a gap.
	pub fn packet_out(&mut self) -> Result<Packet, PacketOutError> {
		self.take_packet(true)
	}

	/// Peek the next `Packet` in the `Stream` without advancing
	/// decoding.
	///
	/// The returned packet is identical to what the next call to
	/// [packet_out](Stream::packet_out) would return.
	pub fn packet_peek(&mut self) -> Result<Packet, PacketOutError> {
		self.take_packet(false)
	}
}

/// An error returned while adding a page to the stream.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageInError {
	/// Stream was given a page with a mis-matched serial number.
	#[error("page serial number {actual} does not match this stream serial {expected}")]
	WrongSerial { expected: u32, actual: u32 },
	/// The page stream structure version is unknown.
	#[error("page stream structure version is {0} (should be 0)")]
	UnsupportedVersion (u8)
}

/// An error returned while taking a packet from the stream.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacketOutError {
	#[error("stream fell out of sync, a page was lost or corrupt")]
	OutOfSync,
	#[error("not enough data has been submitted to complete a packet")]
	Incomplete
}
