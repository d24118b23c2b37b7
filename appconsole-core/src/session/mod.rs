//! The session layer: a thin dispatcher on top of the frame transport.
//!
//! The service accepts connections, assigns each a stable identity, and
//! routes inbound messages to the catalog and the command handler. The
//! client maintains at most one connection to a named service and drives
//! the connect-time message ordering. Unknown message types are ignored on
//! both sides.

pub mod client;
pub mod service;

pub use client::{ClientEvent, ClientSession, ExecuteError};
pub use service::{CommandHandler, ConsoleService, Responder, ServiceConfig, ServiceHandle};

use crate::error::Result;
use crate::message::Message;
use crate::transport::FrameSender;

/// Cloneable sending half of an established connection, speaking typed
/// messages instead of raw frames.
#[derive(Clone)]
pub struct MessageSender {
    frames: FrameSender,
}

impl MessageSender {
    pub(crate) fn new(frames: FrameSender) -> MessageSender {
        MessageSender { frames }
    }

    pub async fn send(&self, message: &Message) -> Result<()> {
        let (metadata, payload) = message.encode()?;
        self.frames.send(metadata, payload).await
    }
}
