//! The frame transport: length-framed messages on a single full-duplex byte
//! stream, with a two-phase version handshake and a per-connection state
//! machine.
//!
//! Each wire message is a `(metadata, payload)` pair laid out as
//!
//! ```text
//! int16  metadata_length      (little-endian)
//! bytes  metadata
//! int32  payload_length       (little-endian)
//! bytes  payload              (omitted when 0)
//! ```
//!
//! The transport deals in opaque byte segments; typing the metadata and
//! payload is the job of [`crate::message`].

pub mod connection;
pub mod frame;
pub mod handshake;

pub use connection::{Connection, ConnectionEvent, ConnectionState, FrameSender};
pub use frame::MAX_PAYLOAD_LENGTH;
pub use handshake::{CLIENT_HANDSHAKE, SERVICE_HANDSHAKE};
