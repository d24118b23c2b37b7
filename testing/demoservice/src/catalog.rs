use async_trait::async_trait;

use appconsole_core::catalog::{
    ArgumentDataType, Command, CommandsSpecification, Flag, Input, OptionArg,
};
use appconsole_core::invocation::Invocation;
use appconsole_core::session::{CommandHandler, Responder};

/// A tiny valid PNG (1x1 transparent pixel) for the screenshot command.
const PIXEL_PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f,
    0x15, 0xc4, 0x89, 0x00, 0x00, 0x00, 0x0a, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0d, 0x0a, 0x2d, 0xb4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

/// The demo catalog: enough commands to exercise every argument kind and
/// every response message type.
pub fn demo_catalog() -> CommandsSpecification {
    let commands = vec![
        Command::with_subcommands(
            "stuff",
            "Things to do with stuff.",
            vec![
                Command::with_arguments(
                    "process",
                    "Process a text file.",
                    vec![Flag::new("verbose", Some('v'), "Print each pass.")],
                    vec![OptionArg::new(
                        "passes",
                        Some('p'),
                        ArgumentDataType::Int,
                        "Number of passes over the file.",
                    )
                    .validated_by(r"^\d+$")],
                    vec![Input::new(
                        "textFile",
                        ArgumentDataType::File,
                        "The text file to process.",
                    )],
                    false,
                ),
                Command::with_arguments(
                    "count",
                    "Count the words given.",
                    Vec::new(),
                    Vec::new(),
                    vec![Input::new("word", ArgumentDataType::String, "Words to count.")],
                    true,
                ),
            ],
        ),
        Command::with_arguments(
            "echo",
            "Echo a message back.",
            Vec::new(),
            Vec::new(),
            vec![Input::new("message", ArgumentDataType::String, "What to say.").optional()],
            false,
        ),
        Command::with_arguments(
            "screenshot",
            "Capture a screenshot of the host.",
            Vec::new(),
            Vec::new(),
            Vec::new(),
            false,
        ),
        Command::with_arguments(
            "sendfile",
            "Push a demo file to the client.",
            Vec::new(),
            Vec::new(),
            vec![Input::new("filename", ArgumentDataType::String, "Name for the file.").optional()],
            false,
        ),
    ];

    CommandsSpecification::new(commands).expect("demo catalog is well formed")
}

/// Executes the demo catalog's commands.
#[derive(Default)]
pub struct DemoHandler;

#[async_trait]
impl CommandHandler for DemoHandler {
    async fn handle(
        &self,
        invocation: Invocation,
        responder: &Responder,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        match invocation.command_path().as_str() {
            "stuff process" => {
                let (name, data) = invocation
                    .argument("textFile")
                    .and_then(|v| v.as_file())
                    .ok_or("missing textFile input")?;
                let passes = invocation
                    .argument("passes")
                    .and_then(|v| v.as_int())
                    .unwrap_or(1);
                let verbose = invocation
                    .argument("verbose")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false);
                for pass in 1..=passes {
                    if verbose {
                        responder
                            .console_output(format!("pass {pass} of {passes}"))
                            .await?;
                    }
                }
                responder
                    .console_output(format!("processed {name} ({} bytes) in {passes} passes", data.len()))
                    .await?;
            }
            "stuff count" => {
                // the variadic input keeps the last word; report it
                let word = invocation
                    .argument("word")
                    .and_then(|v| v.as_str())
                    .unwrap_or("");
                responder
                    .console_output(format!("last word: {word}"))
                    .await?;
            }
            "echo" => {
                let message = invocation
                    .argument("message")
                    .and_then(|v| v.as_str())
                    .unwrap_or("");
                responder.console_output(message).await?;
            }
            "screenshot" => {
                responder.screenshot(PIXEL_PNG.to_vec()).await?;
            }
            "sendfile" => {
                let filename = invocation
                    .argument("filename")
                    .and_then(|v| v.as_str())
                    .unwrap_or("demo.txt");
                responder
                    .file(filename, b"hello from the demo service\n".to_vec())
                    .await?;
            }
            other => return Err(format!("unhandled command '{other}'").into()),
        }
        Ok(())
    }
}
