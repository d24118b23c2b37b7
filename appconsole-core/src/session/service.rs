use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::catalog::CommandsSpecification;
use crate::discovery::{Advertiser, NullAdvertiser};
use crate::error::{ConsoleError, Result};
use crate::host::HostInfo;
use crate::invocation::Invocation;
use crate::message::Message;
use crate::session::MessageSender;
use crate::transport::{Connection, ConnectionEvent};

/// Configuration for a console service.
///
/// Decoupled from any CLI framework: the hosting binary builds a
/// `ServiceConfig` from whatever arguments it parses and passes it in.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Instance name to advertise through the discovery collaborator.
    pub instance_name: String,

    /// Port to listen on. 0 asks the OS for an ephemeral port.
    pub port: u16,
}

impl Default for ServiceConfig {
    fn default() -> ServiceConfig {
        ServiceConfig {
            instance_name: "appconsole".to_string(),
            port: 0,
        }
    }
}

/// Executes parsed invocations on the host application.
///
/// Intermediate output (console text, screenshots, files) goes through the
/// [`Responder`]; the service sends `readyForCommand` after the handler
/// returns. A handler error is reported to the client as console output and
/// does not end the session.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(
        &self,
        invocation: Invocation,
        responder: &Responder,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Handle for streaming typed responses to the client while a command runs.
#[derive(Clone)]
pub struct Responder {
    sender: MessageSender,
}

impl Responder {
    pub async fn console_output(&self, text: impl Into<String>) -> Result<()> {
        self.sender.send(&Message::ConsoleOutput(text.into())).await
    }

    pub async fn screenshot(&self, image: Vec<u8>) -> Result<()> {
        self.sender.send(&Message::Screenshot(image)).await
    }

    pub async fn file(&self, filename: impl Into<String>, filedata: Vec<u8>) -> Result<()> {
        self.sender
            .send(&Message::File(crate::message::FileTransfer {
                filename: filename.into(),
                filedata,
            }))
            .await
    }
}

/// Everything a connection task needs, shared by reference.
struct Shared {
    host_info: HostInfo,
    catalog: CommandsSpecification,
    handler: Arc<dyn CommandHandler>,
}

/// The service side of the console: owns the listener, accepts and tracks
/// connections, and dispatches inbound messages.
pub struct ConsoleService {
    config: ServiceConfig,
    host_info: HostInfo,
    catalog: CommandsSpecification,
    handler: Arc<dyn CommandHandler>,
    advertiser: Arc<dyn Advertiser>,
}

impl ConsoleService {
    pub fn new(
        config: ServiceConfig,
        host_info: HostInfo,
        catalog: CommandsSpecification,
        handler: Arc<dyn CommandHandler>,
    ) -> ConsoleService {
        ConsoleService {
            config,
            host_info,
            catalog,
            handler,
            advertiser: Arc::new(NullAdvertiser),
        }
    }

    /// Replace the discovery collaborator (constructor-injected, no global
    /// registry).
    pub fn with_advertiser(mut self, advertiser: Arc<dyn Advertiser>) -> ConsoleService {
        self.advertiser = advertiser;
        self
    }

    /// Bind the listener, advertise the instance, and serve in a background
    /// task until the returned handle shuts the service down.
    pub async fn start(self) -> Result<ServiceHandle> {
        let listener = TcpListener::bind(("0.0.0.0", self.config.port)).await?;
        let local_addr = listener.local_addr()?;
        self.advertiser
            .advertise(&self.config.instance_name, local_addr.port())
            .await?;
        info!(instance = %self.config.instance_name, %local_addr, "console service listening");

        let shared = Arc::new(Shared {
            host_info: self.host_info,
            catalog: self.catalog,
            handler: self.handler,
        });
        let (control_tx, control_rx) = mpsc::channel(4);
        let task = tokio::spawn(accept_loop(listener, shared, control_rx));

        Ok(ServiceHandle {
            control: control_tx,
            local_addr,
            task,
        })
    }
}

enum Control {
    Shutdown,
    /// Cancel the listener and bind a fresh one on the same address (the
    /// resign-active / become-active collaborator contract).
    Rebuild,
}

/// Handle on a running service.
pub struct ServiceHandle {
    control: mpsc::Sender<Control>,
    local_addr: SocketAddr,
    task: JoinHandle<()>,
}

impl ServiceHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Tear the listener down and rebuild it.
    pub async fn rebuild(&self) -> Result<()> {
        self.control
            .send(Control::Rebuild)
            .await
            .map_err(|_| ConsoleError::NoConnection)
    }

    /// Stop accepting, drop all connections, and wait for the accept loop
    /// to finish.
    pub async fn shutdown(self) {
        let _ = self.control.send(Control::Shutdown).await;
        let _ = self.task.await;
    }
}

/// The accept loop owns the connection table; connection tasks report
/// completion over a channel rather than touching the table themselves.
async fn accept_loop(
    mut listener: TcpListener,
    shared: Arc<Shared>,
    mut control: mpsc::Receiver<Control>,
) {
    let local_addr = match listener.local_addr() {
        Ok(addr) => addr,
        Err(err) => {
            warn!(%err, "listener has no local address");
            return;
        }
    };
    let mut connections: HashMap<u64, JoinHandle<()>> = HashMap::new();
    let (done_tx, mut done_rx) = mpsc::channel::<u64>(16);
    let mut next_id: u64 = 1;

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let id = next_id;
                    next_id += 1;
                    info!(id, %peer, "connection accepted");
                    let task = tokio::spawn(serve_connection(
                        stream,
                        id,
                        shared.clone(),
                        done_tx.clone(),
                    ));
                    connections.insert(id, task);
                }
                Err(err) => warn!(%err, "accept failed"),
            },
            Some(id) = done_rx.recv() => {
                connections.remove(&id);
                debug!(id, "connection forgotten");
            }
            command = control.recv() => match command {
                Some(Control::Rebuild) => {
                    drop(listener);
                    match TcpListener::bind(local_addr).await {
                        Ok(fresh) => {
                            info!(%local_addr, "listener rebuilt");
                            listener = fresh;
                        }
                        Err(err) => {
                            warn!(%err, "failed to rebuild listener");
                            break;
                        }
                    }
                }
                Some(Control::Shutdown) | None => break,
            },
        }
    }

    for (_, task) in connections.drain() {
        task.abort();
    }
}

async fn serve_connection(stream: TcpStream, id: u64, shared: Arc<Shared>, done: mpsc::Sender<u64>) {
    if let Err(err) = drive_connection(stream, id, &shared).await {
        debug!(id, %err, "session ended with error");
    }
    let _ = done.send(id).await;
}

/// One connection's dispatch loop: handshake, unsolicited `generalInfo`,
/// then route inbound messages until the connection closes.
async fn drive_connection(stream: TcpStream, id: u64, shared: &Shared) -> Result<()> {
    let mut connection = Connection::accept(stream, id).await?;
    let sender = MessageSender::new(connection.sender());
    sender
        .send(&Message::GeneralInfo(shared.host_info.clone()))
        .await?;

    while let Some(event) = connection.next_event().await {
        match event {
            ConnectionEvent::Frame { metadata, payload } => {
                match Message::decode(&metadata, &payload) {
                    Ok(Some(message)) => dispatch(message, id, &sender, shared).await?,
                    Ok(None) => debug!(id, "ignoring unknown message type"),
                    // document errors are fatal to the message, not the session
                    Err(ConsoleError::Encoding(err)) => {
                        warn!(id, %err, "discarding undecodable message")
                    }
                    Err(ConsoleError::IncorrectCommandSpecificationVersion { found }) => {
                        warn!(id, found, "discarding document with unsupported version")
                    }
                    Err(err) => return Err(err),
                }
            }
            ConnectionEvent::Closed(err) => {
                debug!(id, %err, "connection closed");
                break;
            }
        }
    }
    Ok(())
}

async fn dispatch(message: Message, id: u64, sender: &MessageSender, shared: &Shared) -> Result<()> {
    match message {
        Message::ListCommands => {
            sender
                .send(&Message::CommandsSpecification(shared.catalog.clone()))
                .await?;
            sender.send(&Message::ReadyForCommand).await?;
        }
        Message::ExecuteCommand(invocation) => {
            debug!(id, command = %invocation.command_path(), "executing");
            let responder = Responder {
                sender: sender.clone(),
            };
            if let Err(err) = shared.handler.handle(invocation, &responder).await {
                responder.console_output(format!("error: {err}")).await?;
            }
            sender.send(&Message::ReadyForCommand).await?;
        }
        other => {
            debug!(id, kind = %other.message_type(), "ignoring message not addressed to the service");
        }
    }
    Ok(())
}
