use std::fmt;
use std::net::SocketAddr;

use tracing::{debug, warn};

use crate::catalog::CommandsSpecification;
use crate::error::{ConsoleError, Result};
use crate::host::HostInfo;
use crate::invocation::Invocation;
use crate::message::{FileTransfer, Message};
use crate::parser::{self, ParseError};
use crate::session::MessageSender;
use crate::transport::{Connection, ConnectionEvent};

/// User-relevant events surfaced by a client session.
#[derive(Debug)]
pub enum ClientEvent {
    /// The service introduced itself; the catalog has been requested.
    Connected(HostInfo),
    /// The catalog arrived; lines can be parsed once the service is ready.
    CatalogReceived,
    /// The service is ready for the next command line.
    ReadyForCommand,
    /// Human-readable text streamed by the running command.
    ConsoleOutput(String),
    /// Raw image bytes streamed by the running command.
    Screenshot(Vec<u8>),
    /// A file pushed by the running command.
    FileReceived(FileTransfer),
    /// The session is over. Construct a fresh session to reconnect.
    Ended(ConsoleError),
}

/// Why a command line could not be dispatched.
#[derive(Debug)]
pub enum ExecuteError {
    /// The line did not parse; render the diagnostic and read another line.
    Parse(ParseError),
    /// No catalog has been received yet.
    NotReady,
    /// The session failed; reconnect with a fresh session.
    Session(ConsoleError),
}

impl fmt::Display for ExecuteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecuteError::Parse(err) => err.fmt(f),
            ExecuteError::NotReady => write!(f, "the command catalog has not been received yet"),
            ExecuteError::Session(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for ExecuteError {}

/// The client side of one session: a single connection to a named service,
/// the catalog received from it, and the connect-time message ordering.
///
/// Sessions are single-use, like the connections beneath them: after
/// [`ClientEvent::Ended`] the caller reconnects by constructing a new
/// session.
pub struct ClientSession {
    connection: Connection,
    sender: MessageSender,
    catalog: Option<CommandsSpecification>,
    ended: bool,
}

impl ClientSession {
    /// Connect to a resolved service address and handshake.
    pub async fn connect(addr: SocketAddr) -> Result<ClientSession> {
        let connection = Connection::connect(addr).await?;
        let sender = MessageSender::new(connection.sender());
        Ok(ClientSession {
            connection,
            sender,
            catalog: None,
            ended: false,
        })
    }

    /// The catalog, once `commandsSpecification` has arrived.
    pub fn catalog(&self) -> Option<&CommandsSpecification> {
        self.catalog.as_ref()
    }

    /// Pump the session. Drives the expected ordering (`generalInfo` →
    /// `listCommands` → `commandsSpecification` → `readyForCommand`) and
    /// returns the next user-relevant event. `None` once the session has
    /// delivered [`ClientEvent::Ended`].
    pub async fn next_event(&mut self) -> Option<ClientEvent> {
        if self.ended {
            return None;
        }
        loop {
            let Some(event) = self.connection.next_event().await else {
                self.ended = true;
                return None;
            };
            match event {
                ConnectionEvent::Closed(err) => {
                    self.ended = true;
                    return Some(ClientEvent::Ended(err));
                }
                ConnectionEvent::Frame { metadata, payload } => {
                    match Message::decode(&metadata, &payload) {
                        Ok(Some(Message::GeneralInfo(info))) => {
                            if let Err(err) = self.sender.send(&Message::ListCommands).await {
                                self.ended = true;
                                return Some(ClientEvent::Ended(err));
                            }
                            return Some(ClientEvent::Connected(info));
                        }
                        Ok(Some(Message::CommandsSpecification(spec))) => {
                            self.catalog = Some(spec);
                            return Some(ClientEvent::CatalogReceived);
                        }
                        Ok(Some(Message::ReadyForCommand)) => {
                            return Some(ClientEvent::ReadyForCommand)
                        }
                        Ok(Some(Message::ConsoleOutput(text))) => {
                            return Some(ClientEvent::ConsoleOutput(text))
                        }
                        Ok(Some(Message::Screenshot(bytes))) => {
                            return Some(ClientEvent::Screenshot(bytes))
                        }
                        Ok(Some(Message::File(file))) => {
                            return Some(ClientEvent::FileReceived(file))
                        }
                        Ok(Some(other)) => {
                            debug!(kind = %other.message_type(), "ignoring message not addressed to the client");
                        }
                        Ok(None) => debug!("ignoring unknown message type"),
                        // document errors are fatal to the message, not the session
                        Err(ConsoleError::Encoding(err)) => {
                            warn!(%err, "discarding undecodable message")
                        }
                        Err(ConsoleError::IncorrectCommandSpecificationVersion { found }) => {
                            warn!(found, "discarding document with unsupported version")
                        }
                        Err(err) => {
                            self.ended = true;
                            self.connection.cancel();
                            return Some(ClientEvent::Ended(err));
                        }
                    }
                }
            }
        }
    }

    /// Parse one line against the received catalog and dispatch the
    /// resulting invocation. The service answers with interleaved output
    /// messages followed by `readyForCommand`.
    pub async fn execute(&mut self, command_line: &str) -> std::result::Result<(), ExecuteError> {
        let catalog = self.catalog.as_ref().ok_or(ExecuteError::NotReady)?;
        let invocation = parser::evaluate(command_line, &catalog.commands)
            .map_err(ExecuteError::Parse)?;
        self.dispatch(invocation).await.map_err(ExecuteError::Session)
    }

    /// Dispatch an already-parsed invocation.
    pub async fn dispatch(&self, invocation: Invocation) -> Result<()> {
        self.sender.send(&Message::ExecuteCommand(invocation)).await
    }

    /// Tear the session down.
    pub fn cancel(&mut self) {
        self.ended = true;
        self.connection.cancel();
    }
}
