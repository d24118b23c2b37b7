//! Core library for appconsole: a two-party remote-control console for an
//! in-app command runtime.
//!
//! A host application embeds a [`session::ConsoleService`] that advertises a
//! command catalog and executes invocations dispatched from the interactive
//! terminal client ([`session::ClientSession`]). Three layers make up the
//! protocol stack:
//!
//! - [`transport`] -- the length-framed message transport over TCP, including
//!   the two-phase version handshake and the per-connection state machine.
//! - [`catalog`] -- the recursive, self-describing command catalog that
//!   travels over the wire as a versioned document.
//! - [`parser`] -- the tokenizer and state machine that evaluate a human
//!   command line against a catalog, producing a typed [`invocation::Invocation`]
//!   or a precise diagnostic.
//!
//! [`message`] and [`session`] glue the layers together: typed message
//! envelopes, dispatch, and the client/service session orchestration.

pub mod catalog;
pub mod discovery;
mod encoding;
pub mod error;
pub mod host;
pub mod invocation;
pub mod message;
pub mod parser;
pub mod session;
pub mod transport;

pub use error::{ConsoleError, Result};
