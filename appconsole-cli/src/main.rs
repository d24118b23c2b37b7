mod cli;
mod repl;

use std::process;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::debug;

use appconsole_core::discovery::{Resolver, StaticResolver};
use appconsole_core::session::{ClientEvent, ClientSession, ExecuteError};

use cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let Some(instance_name) = cli.instance_name else {
        eprintln!("No service instance name specified.");
        eprintln!("Try 'appconsole --help' for more details.");
        process::exit(1);
    };

    init_logging(cli.verbose);

    let lines = repl::spawn_line_reader();
    let result = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            println!();
            Ok(())
        }
        result = run(&instance_name, lines) => result,
    };

    if let Err(err) = result {
        eprintln!("{err}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "appconsole=debug,appconsole_core=debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Outcome of one session, deciding whether the client reconnects.
enum SessionEnd {
    /// The service went away; reconnect.
    Reconnect,
    /// The user is done (stdin closed).
    Quit,
}

/// Maintain at most one connection to the named service, reconnecting when
/// a session ends.
async fn run(
    instance_name: &str,
    mut lines: mpsc::Receiver<String>,
) -> appconsole_core::Result<()> {
    let resolver = StaticResolver;
    let mut first_attempt = true;

    loop {
        let addr = resolver.resolve(instance_name).await?;
        let session = match ClientSession::connect(addr).await {
            Ok(session) => session,
            // surface the very first failure; later ones mean the service
            // went away and we keep trying
            Err(err) if first_attempt => return Err(err),
            Err(err) => {
                debug!(%err, "reconnect attempt failed");
                tokio::time::sleep(Duration::from_secs(1)).await;
                continue;
            }
        };
        first_attempt = false;

        match drive_session(session, &mut lines).await {
            SessionEnd::Quit => return Ok(()),
            SessionEnd::Reconnect => {
                eprintln!("Reconnecting to {instance_name}...");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}

/// Drive one session: render events, prompt on `readyForCommand`, parse and
/// dispatch lines. Parser diagnostics are printed and the user types again;
/// only transport failures end the session.
async fn drive_session(mut session: ClientSession, lines: &mut mpsc::Receiver<String>) -> SessionEnd {
    let mut screenshots: u32 = 0;

    loop {
        let Some(event) = session.next_event().await else {
            return SessionEnd::Reconnect;
        };
        match event {
            ClientEvent::Connected(info) => {
                println!(
                    "Connected to {} {} ({} on {})",
                    info.app_name, info.app_version, info.platform, info.host_name
                );
            }
            ClientEvent::CatalogReceived => {
                debug!("command catalog received");
            }
            ClientEvent::ReadyForCommand => {
                match read_and_execute(&mut session, lines).await {
                    Some(end) => return end,
                    None => {}
                }
            }
            ClientEvent::ConsoleOutput(text) => println!("{text}"),
            ClientEvent::Screenshot(bytes) => {
                screenshots += 1;
                let path = std::env::temp_dir().join(format!("appconsole-screenshot-{screenshots}.png"));
                match std::fs::write(&path, &bytes) {
                    Ok(()) => println!("Saved screenshot to {}", path.display()),
                    Err(err) => eprintln!("Failed to save screenshot: {err}"),
                }
            }
            ClientEvent::FileReceived(file) => {
                let path = std::env::temp_dir().join(&file.filename);
                match std::fs::write(&path, &file.filedata) {
                    Ok(()) => println!("Saved file to {}", path.display()),
                    Err(err) => eprintln!("Failed to save file '{}': {err}", file.filename),
                }
            }
            ClientEvent::Ended(err) => {
                eprintln!("Session ended: {err}");
                return SessionEnd::Reconnect;
            }
        }
    }
}

/// Prompt until a line is dispatched. Returns `Some` when the session or
/// the terminal is done.
async fn read_and_execute(
    session: &mut ClientSession,
    lines: &mut mpsc::Receiver<String>,
) -> Option<SessionEnd> {
    loop {
        repl::prompt();
        let Some(line) = lines.recv().await else {
            return Some(SessionEnd::Quit);
        };
        if line.trim().is_empty() {
            continue;
        }
        match session.execute(&line).await {
            Ok(()) => return None,
            Err(ExecuteError::Parse(err)) => {
                // usage requests render the usage block; both cases the
                // user just types another line
                println!("{err}");
            }
            Err(ExecuteError::NotReady) => {
                eprintln!("The command catalog has not been received yet.");
            }
            Err(ExecuteError::Session(err)) => {
                eprintln!("Session ended: {err}");
                return Some(SessionEnd::Reconnect);
            }
        }
    }
}
