use serde::{Deserialize, Serialize};

use crate::catalog::{Command, InvalidCatalog};
use crate::error::{ConsoleError, Result};
use crate::invocation::Invocation;
use crate::parser::{self, ParseError};

/// Version advertised by catalog and invocation documents. The single
/// protocol version this implementation speaks.
pub const SPECIFICATION_VERSION: u32 = 1;

/// The complete command schema a service advertises, as it travels on the
/// wire in a `commandsSpecification` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandsSpecification {
    pub version: u32,
    pub commands: Vec<Command>,
}

impl CommandsSpecification {
    /// Assemble a catalog, checking the namespace invariants of every
    /// command tree. Help entries are synthesized by the [`Command`]
    /// constructors and are part of the encoded document.
    pub fn new(commands: Vec<Command>) -> std::result::Result<CommandsSpecification, InvalidCatalog> {
        let mut names = std::collections::HashSet::new();
        for command in &commands {
            if !names.insert(command.name.as_str()) {
                return Err(InvalidCatalog(format!(
                    "duplicate root command '{}'",
                    command.name
                )));
            }
            command.validate()?;
        }
        Ok(CommandsSpecification {
            version: SPECIFICATION_VERSION,
            commands,
        })
    }

    /// Encode for the wire.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode from the wire, rejecting any version other than
    /// [`SPECIFICATION_VERSION`]. Help entries are re-synthesized so the
    /// injection invariant holds even for documents produced elsewhere;
    /// on our own documents this is a no-op.
    pub fn from_bytes(bytes: &[u8]) -> Result<CommandsSpecification> {
        let mut spec: CommandsSpecification = serde_json::from_slice(bytes)?;
        if spec.version != SPECIFICATION_VERSION {
            return Err(ConsoleError::IncorrectCommandSpecificationVersion {
                found: spec.version,
            });
        }
        for command in &mut spec.commands {
            command.inject_help();
        }
        Ok(spec)
    }

    /// Find a root command by name.
    pub fn command(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.name == name)
    }

    /// Evaluate one command line against this catalog.
    pub fn evaluate(&self, command_line: &str) -> std::result::Result<Invocation, ParseError> {
        parser::evaluate(command_line, &self.commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ArgumentDataType, Flag, Input, OptionArg, HELP_NAME};

    fn sample() -> CommandsSpecification {
        CommandsSpecification::new(vec![Command::with_subcommands(
            "stuff",
            "Things to do with stuff.",
            vec![Command::with_arguments(
                "process",
                "Process a text file.",
                vec![Flag::new("verbose", Some('v'), "Print more.")],
                vec![OptionArg::new(
                    "passes",
                    Some('p'),
                    ArgumentDataType::Int,
                    "Number of passes.",
                )
                .validated_by(r"^\d+$")],
                vec![Input::new(
                    "textFile",
                    ArgumentDataType::File,
                    "The file to process.",
                )],
                false,
            )],
        )])
        .unwrap()
    }

    #[test]
    fn round_trip_preserves_structure_and_help_entries() {
        let spec = sample();
        let bytes = spec.to_bytes().unwrap();
        let back = CommandsSpecification::from_bytes(&bytes).unwrap();
        assert_eq!(back, spec);

        let stuff = back.command("stuff").unwrap();
        assert!(stuff.subcommand(HELP_NAME).is_some());
        let process = stuff.subcommand("process").unwrap();
        assert!(process.flags().iter().any(|f| f.name == HELP_NAME));
    }

    #[test]
    fn version_mismatch_is_a_distinct_error() {
        let mut spec = sample();
        spec.version = 2;
        let bytes = serde_json::to_vec(&spec).unwrap();
        let err = CommandsSpecification::from_bytes(&bytes).unwrap_err();
        assert!(matches!(
            err,
            ConsoleError::IncorrectCommandSpecificationVersion { found: 2 }
        ));
    }

    #[test]
    fn decode_injects_help_into_foreign_documents() {
        let json = r#"{
            "version": 1,
            "commands": [{
                "name": "run",
                "description": "Run.",
                "flags": [],
                "options": [],
                "inputs": [],
                "isLastInputVariadic": false
            }]
        }"#;
        let spec = CommandsSpecification::from_bytes(json.as_bytes()).unwrap();
        let run = spec.command("run").unwrap();
        assert!(run.flags().iter().any(|f| f.name == HELP_NAME));
    }

    #[test]
    fn duplicate_root_commands_are_rejected() {
        let a = Command::with_subcommands("same", "One.", Vec::new());
        let b = Command::with_subcommands("same", "Two.", Vec::new());
        assert!(CommandsSpecification::new(vec![a, b]).is_err());
    }
}
