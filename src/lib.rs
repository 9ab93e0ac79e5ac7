//! # ogg_framing
//!
//! This crate is a native implementation of the
//! [Ogg](https://xiph.org/ogg/) container's framing and multiplexing
//! layer: the part that turns opaque codec packets into a
//! self-delimiting, checksummed, resync-able byte stream of pages,
//! and back.
//!
//! This crate does *not* provide any function for decoding the
//! data in an Ogg stream. After you get packets, you'll need
//! to use another library for decoding them.
//!
//! ## Usage
//!
//! The basic structure you need to know looks like this:
//!
//! ```text
//!             Ogg, the physical file or stream
//!                             V
//! Ogg pages, including metadata for assembling logical streams
//!                             V
//!          Ogg packets, the actual underlying data
//! ```
//!
//! For decoding, you can start with a [SyncState] and submit bytes
//! to it to get [Pages](Page) out:
//!
//! ```rust
//! # use ogg_framing::{ SyncState, Page };
//! # let bytes = vec![0; 28];
//! let mut sync_state = SyncState::new();
//! // `&bytes` is a `&[u8]`.
//! let pages: Option<Vec<Page>> = sync_state.submit_bytes(&bytes);
//! ```
//!
//! Then feed each page to the [Stream] whose serial number matches,
//! and take [Packets](Packet) out of it:
//!
//! ```rust
//! # use ogg_framing::{ Stream, PacketOutError };
//! # let pages: Vec<ogg_framing::Page> = vec![];
//! # let mut stream = Stream::new(0);
//! for page in &pages {
//! 	stream.page_in(page).expect("page belongs to this stream");
//! }
//! loop {
//! 	match stream.packet_out() {
//! 		Ok(packet) => println!("a packet of {} bytes", packet.data().len()),
//! 		// a page was lost; the next call keeps going after the gap
//! 		Err(PacketOutError::OutOfSync) => continue,
//! 		Err(PacketOutError::Incomplete) => break
//! 	}
//! }
//! ```
//!
//! Encoding runs the other way around: submit packets to a [Stream]
//! with [packet_in](Stream::packet_in), and take framed pages out
//! with [page_out](Stream::page_out) (or [page_flush](Stream::page_flush)
//! to force undersized pages, which is also how the first header
//! packet gets a page of its own):
//!
//! ```rust
//! # use ogg_framing::{ Packet, Stream };
//! let mut stream = Stream::new(0x1234_5678);
//! let mut packet = Packet::new();
//! packet.set_data(b"an opaque codec packet".to_vec());
//! stream.packet_in(&packet);
//!
//! let page = stream.page_flush().expect("one packet is pending");
//! assert!(page.begins_logical_stream());
//! ```
//!
//! See the tests module for more examples.

// Forget you, Clippy.
#![allow(clippy::tabs_in_doc_comments)]
#![forbid(unsafe_code)]

mod bitpack;
mod crc;
mod packet;
mod page;
mod stream_state;
mod sync_state;

pub use bitpack::{ BitOrder, BitReader, BitReadError, BitWriter, BitWriteError };
pub use crc::{ crc32, Crc32 };
pub use packet::Packet;
pub use page::{ Page, InvalidPage, InvalidPageHeader, validate_header };
pub use stream_state::{ Stream, PageInError, PacketOutError };
pub use sync_state::{ SyncState, PageSeek, PageWriteError, WroteError };
