/// One logical payload unit, before or after physical framing.
///
/// The framing layer never interprets the payload bytes; it only
/// carries them, together with the position and boundary metadata the
/// codec layers care about.
///
/// Packets handed out by [packet_out](crate::Stream::packet_out) are
/// owned copies, so they stay valid however long the caller keeps
/// them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Packet {
	data: Vec<u8>,
	begins_logical_stream: bool,
	ends_logical_stream: bool,
	absgp: i64,
	index: i64
}

impl Packet {
	/// Create a new empty `Packet`.
	pub fn new() -> Self {
		Self {
			data: Vec::new(),
			begins_logical_stream: false,
			ends_logical_stream: false,
			absgp: 0,
			index: 0
		}
	}

	pub(crate) fn from_parts(
		data: Vec<u8>,
		begins_logical_stream: bool,
		ends_logical_stream: bool,
		absgp: i64,
		index: i64
	) -> Self {
		Self { data, begins_logical_stream, ends_logical_stream, absgp, index }
	}

	/// Return a reference to the data of this `Packet`.
	pub fn data(&self) -> &[u8] {
		&self.data
	}

	/// Set the data of this `Packet`.
	pub fn set_data(&mut self, data: Vec<u8>) {
		self.data = data;
	}

	/// Check whether this packet begins a logical stream.
	pub fn begins_logical_stream(&self) -> bool {
		self.begins_logical_stream
	}

	/// Set whether this packet begins a logical stream.
	pub fn set_begins_logical_stream(&mut self, begins_logical_stream: bool) {
		self.begins_logical_stream = begins_logical_stream;
	}

	/// Check whether this packet ends a logical stream.
	pub fn ends_logical_stream(&self) -> bool {
		self.ends_logical_stream
	}

	/// Set whether this packet ends a logical stream.
	pub fn set_ends_logical_stream(&mut self, ends_logical_stream: bool) {
		self.ends_logical_stream = ends_logical_stream;
	}

	/// Return the absolute granule position of this packet.
	///
	/// The granule position is a codec-defined position marker, for
	/// example a cumulative sample count. `-1` means the position is
	/// not known; on the decode side only the packet that completes a
	/// page carries that page's position.
	pub fn absgp(&self) -> i64 {
		self.absgp
	}

	/// Set the absolute granule position of this packet.
	pub fn set_absgp(&mut self, absgp: i64) {
		self.absgp = absgp;
	}

	/// Return the sequential number of this packet in the stream.
	///
	/// Assigned by the decode side; a lost page consumes one number,
	/// so downstream sequence accounting stays correct across a gap.
	pub fn index(&self) -> i64 {
		self.index
	}

	/// Set the sequential number of this packet in the stream.
	pub fn set_index(&mut self, index: i64) {
		self.index = index;
	}
}
