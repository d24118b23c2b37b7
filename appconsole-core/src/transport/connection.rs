use std::fmt;
use std::net::SocketAddr;

use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{ConsoleError, Result};
use crate::transport::{frame, handshake};

/// Lifecycle of a single connection, both roles.
///
/// `Waiting` is recoverable (no viable network yet); `Failed` is terminal
/// prior to `Cancelled`. Connections are single-use: a client reconnects by
/// constructing a fresh [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Setup,
    Preparing,
    Ready,
    Waiting,
    Handshaking,
    Established,
    Failed,
    Cancelled,
}

impl ConnectionState {
    fn can_advance_to(self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        match (self, next) {
            (Setup, Preparing) => true,
            (Preparing, Ready) | (Preparing, Waiting) => true,
            (Ready, Handshaking) | (Ready, Waiting) => true,
            (Waiting, Ready) => true,
            (Handshaking, Established) => true,
            (Cancelled, _) => false,
            (Failed, Cancelled) => true,
            (Failed, _) => false,
            (_, Failed) | (_, Cancelled) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Setup => "setup",
            ConnectionState::Preparing => "preparing",
            ConnectionState::Ready => "ready",
            ConnectionState::Waiting => "waiting",
            ConnectionState::Handshaking => "handshaking",
            ConnectionState::Established => "established",
            ConnectionState::Failed => "failed",
            ConnectionState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Shared handle on the connection's state, guarded by the transition table.
#[derive(Clone, Debug)]
struct StateCell {
    id: u64,
    tx: watch::Sender<ConnectionState>,
}

impl StateCell {
    fn new(id: u64) -> (StateCell, watch::Receiver<ConnectionState>) {
        let (tx, rx) = watch::channel(ConnectionState::Setup);
        (StateCell { id, tx }, rx)
    }

    fn current(&self) -> ConnectionState {
        *self.tx.borrow()
    }

    fn advance(&self, next: ConnectionState) {
        let current = self.current();
        if current == next {
            return;
        }
        if current.can_advance_to(next) {
            debug!(id = self.id, from = %current, to = %next, "connection state");
            let _ = self.tx.send(next);
        } else {
            warn!(id = self.id, from = %current, to = %next, "illegal connection state transition ignored");
        }
    }

    /// Mark the connection failed and drain it to `Cancelled`.
    fn fail(&self) {
        self.advance(ConnectionState::Failed);
        self.advance(ConnectionState::Cancelled);
    }
}

/// One inbound event from the transport.
#[derive(Debug)]
pub enum ConnectionEvent {
    /// One completed frame, delivered in wire order.
    Frame { metadata: Vec<u8>, payload: Vec<u8> },
    /// The connection ended; no further events follow.
    Closed(ConsoleError),
}

struct OutboundFrame {
    metadata: Vec<u8>,
    payload: Vec<u8>,
}

/// Cloneable sending half of a connection. Frames are queued FIFO and
/// written by a single task, so each frame's four segments land on the wire
/// back to back.
#[derive(Clone)]
pub struct FrameSender {
    tx: mpsc::Sender<OutboundFrame>,
}

impl FrameSender {
    /// Queue one frame for writing. Fails with [`ConsoleError::NoConnection`]
    /// once the connection is gone.
    pub async fn send(&self, metadata: Vec<u8>, payload: Vec<u8>) -> Result<()> {
        self.tx
            .send(OutboundFrame { metadata, payload })
            .await
            .map_err(|_| ConsoleError::NoConnection)
    }
}

/// An established, handshaked connection.
///
/// Owns a reader task (emitting [`ConnectionEvent`]s) and a writer task
/// (draining the send queue). Dropping the connection aborts both.
#[derive(Debug)]
pub struct Connection {
    id: u64,
    outbound: mpsc::Sender<OutboundFrame>,
    events: mpsc::Receiver<ConnectionEvent>,
    state: watch::Receiver<ConnectionState>,
    cell: StateCell,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl Connection {
    /// Connect to a resolved service address and handshake as the client.
    pub async fn connect(addr: SocketAddr) -> Result<Connection> {
        let (cell, state_rx) = StateCell::new(0);
        cell.advance(ConnectionState::Preparing);
        let mut stream = match TcpStream::connect(addr).await {
            Ok(stream) => stream,
            Err(err) => {
                cell.advance(ConnectionState::Waiting);
                cell.fail();
                return Err(ConsoleError::Io(err));
            }
        };
        cell.advance(ConnectionState::Ready);
        cell.advance(ConnectionState::Handshaking);
        if let Err(err) = handshake::connect_as_client(&mut stream).await {
            cell.fail();
            return Err(err);
        }
        cell.advance(ConnectionState::Established);
        Ok(Self::spawn(stream, cell, state_rx))
    }

    /// Take ownership of an accepted stream and handshake as the service.
    pub async fn accept(mut stream: TcpStream, id: u64) -> Result<Connection> {
        let (cell, state_rx) = StateCell::new(id);
        cell.advance(ConnectionState::Preparing);
        cell.advance(ConnectionState::Ready);
        cell.advance(ConnectionState::Handshaking);
        if let Err(err) = handshake::accept_as_service(&mut stream).await {
            cell.fail();
            return Err(err);
        }
        cell.advance(ConnectionState::Established);
        Ok(Self::spawn(stream, cell, state_rx))
    }

    fn spawn(
        stream: TcpStream,
        cell: StateCell,
        state_rx: watch::Receiver<ConnectionState>,
    ) -> Connection {
        let id = cell.id;
        let (read_half, write_half) = stream.into_split();
        let (outbound_tx, outbound_rx) = mpsc::channel::<OutboundFrame>(32);
        let (events_tx, events_rx) = mpsc::channel::<ConnectionEvent>(32);

        let writer = tokio::spawn(write_loop(write_half, outbound_rx, cell.clone()));
        let reader = tokio::spawn(read_loop(read_half, events_tx, cell.clone()));

        Connection {
            id,
            outbound: outbound_tx,
            events: events_rx,
            state: state_rx,
            cell,
            reader,
            writer,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// A cloneable handle for queueing outbound frames.
    pub fn sender(&self) -> FrameSender {
        FrameSender {
            tx: self.outbound.clone(),
        }
    }

    /// Queue one frame for writing.
    pub async fn send(&self, metadata: Vec<u8>, payload: Vec<u8>) -> Result<()> {
        self.sender().send(metadata, payload).await
    }

    /// Next inbound event, in wire order. Returns `None` after the final
    /// [`ConnectionEvent::Closed`] has been consumed.
    pub async fn next_event(&mut self) -> Option<ConnectionEvent> {
        self.events.recv().await
    }

    /// Tear the connection down. Pending reads and writes complete with
    /// errors that the session observes as end-of-session.
    pub fn cancel(&self) {
        self.cell.advance(ConnectionState::Cancelled);
        self.reader.abort();
        self.writer.abort();
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn write_loop(
    mut write_half: tokio::net::tcp::OwnedWriteHalf,
    mut outbound: mpsc::Receiver<OutboundFrame>,
    cell: StateCell,
) {
    while let Some(frame) = outbound.recv().await {
        if let Err(err) = frame::write_frame(&mut write_half, &frame.metadata, &frame.payload).await
        {
            debug!(id = cell.id, %err, "write failed");
            cell.fail();
            return;
        }
    }
}

async fn read_loop(
    mut read_half: tokio::net::tcp::OwnedReadHalf,
    events: mpsc::Sender<ConnectionEvent>,
    cell: StateCell,
) {
    loop {
        match frame::read_frame(&mut read_half).await {
            Ok((metadata, payload)) => {
                if events
                    .send(ConnectionEvent::Frame { metadata, payload })
                    .await
                    .is_err()
                {
                    // receiver dropped, nobody is listening anymore
                    cell.advance(ConnectionState::Cancelled);
                    return;
                }
            }
            Err(err) => {
                cell.fail();
                let _ = events.send(ConnectionEvent::Closed(err)).await;
                return;
            }
        }
    }
}
