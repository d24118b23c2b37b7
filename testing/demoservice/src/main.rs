mod catalog;

use std::sync::Arc;

use clap::Parser;

use appconsole_core::host::HostInfo;
use appconsole_core::session::{ConsoleService, ServiceConfig};

#[derive(Parser, Debug)]
#[command(name = "demoservice", about = "Demo host service for appconsole verification")]
struct Cli {
    /// Port to listen on (0 for ephemeral)
    #[arg(short = 'p', long = "port", default_value_t = 4020)]
    port: u16,

    /// Instance name to advertise
    #[arg(short = 'n', long = "name", default_value = "demoservice")]
    name: String,

    /// Suppress logging
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if !cli.quiet {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let service = ConsoleService::new(
        ServiceConfig {
            instance_name: cli.name,
            port: cli.port,
        },
        HostInfo::new("demoservice", env!("CARGO_PKG_VERSION")),
        catalog::demo_catalog(),
        Arc::new(catalog::DemoHandler),
    );

    let handle = service.start().await?;
    println!("Listening on {}", handle.local_addr());

    tokio::signal::ctrl_c().await?;
    handle.shutdown().await;
    Ok(())
}
