use thiserror::Error;

use crate::crc::Crc32;

pub const HEADER_VERSION: usize = 4;
pub const HEADER_TYPE: usize = 5;
pub const HEADER_GRANULE_POSITION: usize = 6;
pub const HEADER_PAGE_SERIAL_NUMBER: usize = 14;
pub const HEADER_SEQUENCE_NUMBER: usize = 18;
pub const HEADER_CHECKSUM: usize = 22;
pub const HEADER_SEGMENTS: usize = 26;
pub const HEADER_SIZE_MIN: usize = 27;

const CONTINUED_FLAG: u8 = 0x01;
const BOS_FLAG: u8 = 0x02;
const EOS_FLAG: u8 = 0x04;

/// A checksummed, self-delimiting framed unit carrying one or more
/// (possibly partial) packets for one logical stream.
///
/// A `Page` owns its header and body bytes, so it stays valid however
/// long the caller keeps it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
	header: Vec<u8>,
	body: Vec<u8>
}

impl Page {
	/// Try to create a [Page] from raw header and body bytes.
	///
	/// Will fail if the header does not validate or if the body
	/// length disagrees with the segment table.
	pub fn new(header: Vec<u8>, body: Vec<u8>) -> Result<Self, InvalidPage> {
		validate_header(&header)?;
		let expected: usize = header[HEADER_SEGMENTS + 1..].iter().map(|&v| v as usize).sum();
		if body.len() != expected {
			return Err(InvalidPage::BadBodyLength { expected, actual: body.len() })
		}
		Ok(Self { header, body })
	}

	/// Build a page from parts already known to be consistent.
	pub(crate) fn from_parts(header: Vec<u8>, body: Vec<u8>) -> Self {
		Self { header, body }
	}

	/// Return a reference to the data for this `Page`.
	pub fn data(&self) -> &[u8] {
		&self.body
	}

	/// Return a reference to the raw header for this `Page`.
	pub fn header(&self) -> &[u8] {
		&self.header
	}

	/// Returns the `Page` version.
	///
	/// In the current version of Ogg, this should always be zero.
	/// Any other value means there is an error in the page.
	pub fn version(&self) -> u8 {
		self.header[HEADER_VERSION]
	}

	/// Returns the `Page` header type.
	///
	/// This signals the following combined values:
	/// - **1**: Page contains a packet which continues from a previous page.
	/// - **2**: Page is the first page of its stream.
	/// - **4**: Page is the last page of its stream.
	pub fn header_type(&self) -> u8 {
		self.header[HEADER_TYPE]
	}

	/// Check whether this `Page` contains packet data that continues
	/// from the last `Page`.
	pub fn continues_packet(&self) -> bool {
		self.header_type() & CONTINUED_FLAG != 0
	}

	/// Check whether this page begins a logical stream.
	pub fn begins_logical_stream(&self) -> bool {
		self.header_type() & BOS_FLAG != 0
	}

	/// Check whether this `Page` ends a logical [Stream](crate::Stream).
	pub fn ends_logical_stream(&self) -> bool {
		self.header_type() & EOS_FLAG != 0
	}

	/// Return the absolute granule position of the packet data at the
	/// end of this `Page`, or `-1` if no packet completes on it.
	pub fn absgp(&self) -> i64 {
		i64::from_le_bytes(
			self.header[HEADER_GRANULE_POSITION..HEADER_GRANULE_POSITION + 8]
				.try_into()
				.unwrap()
		)
	}

	/// Return the serial number of the logical stream that this
	/// `Page` is associated with.
	pub fn stream_serial(&self) -> u32 {
		u32::from_le_bytes(
			self.header[HEADER_PAGE_SERIAL_NUMBER..HEADER_PAGE_SERIAL_NUMBER + 4]
				.try_into()
				.unwrap()
		)
	}

	/// Return the sequential number for this `Page`.
	///
	/// This can be used for ordering pages or detecting pages that
	/// have been lost.
	pub fn index(&self) -> u32 {
		u32::from_le_bytes(
			self.header[HEADER_SEQUENCE_NUMBER..HEADER_SEQUENCE_NUMBER + 4]
				.try_into()
				.unwrap()
		)
	}

	/// Return the CRC checksum stored in this `Page`.
	pub fn crc_checksum(&self) -> u32 {
		u32::from_le_bytes(
			self.header[HEADER_CHECKSUM..HEADER_CHECKSUM + 4].try_into().unwrap()
		)
	}

	/// Return the number of entries in the segment table.
	pub fn segments(&self) -> u8 {
		self.header[HEADER_SEGMENTS]
	}

	/// Return the number of packets that completed on this `Page`.
	/// This *includes* packets that begin on a previous `Page`.
	///
	/// This is not necessarily a non-zero value. If a packet happens
	/// to begin on a previous page and span to a future page, in the
	/// case of a packet that spans three or more pages, the return
	/// value of this method would be 0.
	pub fn finished_packets(&self) -> u8 {
		self.header[HEADER_SEGMENTS + 1..]
			.iter()
			.filter(|&&value| value < 255)
			.count() as u8
	}

	/// Recompute the CRC checksum of this `Page` and store it in the
	/// header.
	///
	/// The checksum covers the header, with the checksum field itself
	/// held at zero, followed by the body.
	pub fn set_crc_checksum(&mut self) {
		let mut crc = Crc32::new();
		crc.update(&self.header[..HEADER_CHECKSUM]);
		crc.update(&[0; 4]);
		crc.update(&self.header[HEADER_CHECKSUM + 4..]);
		crc.update(&self.body);
		let checksum = crc.finish();
		self.header[HEADER_CHECKSUM..HEADER_CHECKSUM + 4]
			.copy_from_slice(&checksum.to_le_bytes());
	}
}

/// Check that a page header is well formed: capture pattern, version
/// and length against the segment count.
pub fn validate_header(header: &[u8]) -> Result<(), InvalidPageHeader> {
	if header.len() < HEADER_SIZE_MIN {
		return Err(InvalidPageHeader::TooShort)
	}
	if &header[0..4] != b"OggS" {
		return Err(InvalidPageHeader::NoMagicString)
	}
	if header[HEADER_VERSION] != 0 {
		return Err(InvalidPageHeader::BadVersion(header[HEADER_VERSION]))
	}
	let expected = HEADER_SIZE_MIN + header[HEADER_SEGMENTS] as usize;
	if header.len() != expected {
		return Err(InvalidPageHeader::BadLength { expected, actual: header.len() })
	}
	Ok(())
}

/// Error validating a whole page.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvalidPage {
	/// The header did not validate.
	#[error("invalid header: {0}")]
	InvalidHeader (#[from] InvalidPageHeader),
	/// The body length disagrees with the segment table.
	#[error("body is {actual} bytes but the segment table calls for {expected}")]
	BadBodyLength { expected: usize, actual: usize }
}

/// Error validating the page header.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvalidPageHeader {
	/// The first four bytes were not 'OggS'.
	#[error("header has an invalid magic string (should be 'OggS')")]
	NoMagicString,
	/// The header version was wrong.
	#[error("version number is {0} (should be 0)")]
	BadVersion (u8),
	/// The header was too short.
	#[error("page header is too short")]
	TooShort,
	/// The header length disagrees with the segment count.
	#[error("header is {actual} bytes but the segment count calls for {expected}")]
	BadLength { expected: usize, actual: usize }
}
