use clap::Parser;

/// Interactive remote console for appconsole services.
///
/// Connects to the named service instance, fetches its command catalog, and
/// reads command lines from the terminal. Parsed invocations are executed on
/// the service; text, screenshots, and files it streams back are rendered
/// locally.
#[derive(Parser, Debug)]
#[command(
    name = "appconsole",
    version,
    after_help = "Example usage:\n  \
        appconsole 192.168.1.20:4020\n  \
        appconsole -v game-host:4020"
)]
pub struct Cli {
    /// Enable verbose logging.
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Name of the service instance to connect to. The built-in resolver
    /// accepts plain host:port instance names.
    pub instance_name: Option<String>,
}
