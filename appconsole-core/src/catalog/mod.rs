//! The command-catalog data model: a recursive, self-describing schema of
//! commands, subcommands, flags, options, and inputs that travels over the
//! wire as a versioned document.
//!
//! The catalog defines what the parser accepts; [`crate::parser`] walks a
//! borrowed command tree during a single parse pass and builds an owned
//! [`crate::invocation::Invocation`].

mod spec;
mod value;

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use spec::{CommandsSpecification, SPECIFICATION_VERSION};
pub use value::{ArgumentDataType, ArgumentValue, NotConvertible};

/// Name of the synthesized help entries.
pub const HELP_NAME: &str = "help";

/// A named boolean argument. Presence means `true`, absence means `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,
    pub description: String,
}

impl Flag {
    pub fn new(name: impl Into<String>, short: Option<char>, description: impl Into<String>) -> Flag {
        Flag {
            name: name.into(),
            short,
            description: description.into(),
        }
    }

    /// Whether a `-s` / `--name` token refers to this flag.
    pub fn matches(&self, token: &str) -> bool {
        matches_dashed_token(token, &self.name, self.short)
    }
}

/// A named argument carrying one value of `data_type` per occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionArg {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,
    pub data_type: ArgumentDataType,
    pub is_multiple_allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_regex: Option<String>,
    pub description: String,
}

impl OptionArg {
    pub fn new(
        name: impl Into<String>,
        short: Option<char>,
        data_type: ArgumentDataType,
        description: impl Into<String>,
    ) -> OptionArg {
        OptionArg {
            name: name.into(),
            short,
            data_type,
            is_multiple_allowed: false,
            validation_regex: None,
            description: description.into(),
        }
    }

    pub fn multiple(mut self) -> OptionArg {
        self.is_multiple_allowed = true;
        self
    }

    pub fn validated_by(mut self, pattern: impl Into<String>) -> OptionArg {
        self.validation_regex = Some(pattern.into());
        self
    }

    /// Whether a `-s` / `--name` token refers to this option.
    pub fn matches(&self, token: &str) -> bool {
        matches_dashed_token(token, &self.name, self.short)
    }
}

/// A positional argument, bound left to right.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Input {
    pub name: String,
    pub data_type: ArgumentDataType,
    pub is_optional: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_regex: Option<String>,
    pub description: String,
}

impl Input {
    pub fn new(
        name: impl Into<String>,
        data_type: ArgumentDataType,
        description: impl Into<String>,
    ) -> Input {
        Input {
            name: name.into(),
            data_type,
            is_optional: false,
            validation_regex: None,
            description: description.into(),
        }
    }

    pub fn optional(mut self) -> Input {
        self.is_optional = true;
        self
    }

    pub fn validated_by(mut self, pattern: impl Into<String>) -> Input {
        self.validation_regex = Some(pattern.into());
        self
    }
}

fn matches_dashed_token(token: &str, name: &str, short: Option<char>) -> bool {
    if let Some(long) = token.strip_prefix("--") {
        return long == name;
    }
    if let Some(rest) = token.strip_prefix('-') {
        let mut chars = rest.chars();
        return match (chars.next(), chars.next(), short) {
            (Some(c), None, Some(s)) => c == s,
            _ => false,
        };
    }
    false
}

/// What a command does when invoked: open an inner menu of subcommands, or
/// accept arguments.
///
/// The two variants distinguish themselves at decode time by the presence of
/// a `subcommands` field vs. the argument fields; no explicit tag travels on
/// the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandContext {
    Subcommands {
        subcommands: Vec<Command>,
    },
    #[serde(rename_all = "camelCase")]
    Arguments {
        flags: Vec<Flag>,
        options: Vec<OptionArg>,
        inputs: Vec<Input>,
        is_last_input_variadic: bool,
    },
}

/// One command in the catalog: a name, a human description, and a context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub name: String,
    pub description: String,
    #[serde(flatten)]
    pub context: CommandContext,
}

impl Command {
    /// A command that opens an inner menu. A `help` subcommand is
    /// synthesized unless one is already present.
    pub fn with_subcommands(
        name: impl Into<String>,
        description: impl Into<String>,
        subcommands: Vec<Command>,
    ) -> Command {
        let mut command = Command {
            name: name.into(),
            description: description.into(),
            context: CommandContext::Subcommands { subcommands },
        };
        command.inject_help();
        command
    }

    /// A command that accepts arguments. A `-h/--help` flag is synthesized
    /// unless a `help` flag is already present.
    pub fn with_arguments(
        name: impl Into<String>,
        description: impl Into<String>,
        flags: Vec<Flag>,
        options: Vec<OptionArg>,
        inputs: Vec<Input>,
        is_last_input_variadic: bool,
    ) -> Command {
        let mut command = Command {
            name: name.into(),
            description: description.into(),
            context: CommandContext::Arguments {
                flags,
                options,
                inputs,
                is_last_input_variadic,
            },
        };
        command.inject_help();
        command
    }

    /// Synthesize the `help` entries throughout the tree. Idempotent, so
    /// a document that already carries them round-trips unchanged.
    pub fn inject_help(&mut self) {
        match &mut self.context {
            CommandContext::Subcommands { subcommands } => {
                for subcommand in subcommands.iter_mut() {
                    subcommand.inject_help();
                }
                if !subcommands.iter().any(|c| c.name == HELP_NAME) {
                    subcommands.push(synthesized_help_subcommand());
                }
            }
            CommandContext::Arguments { flags, .. } => {
                if !flags.iter().any(|f| f.name == HELP_NAME) {
                    flags.push(synthesized_help_flag());
                }
            }
        }
    }

    /// The inner menu, when this command has one.
    pub fn subcommand_list(&self) -> Option<&[Command]> {
        match &self.context {
            CommandContext::Subcommands { subcommands } => Some(subcommands),
            CommandContext::Arguments { .. } => None,
        }
    }

    /// Find an immediate subcommand by name.
    pub fn subcommand(&self, name: &str) -> Option<&Command> {
        self.subcommand_list()?.iter().find(|c| c.name == name)
    }

    pub fn flags(&self) -> &[Flag] {
        match &self.context {
            CommandContext::Arguments { flags, .. } => flags,
            CommandContext::Subcommands { .. } => &[],
        }
    }

    pub fn options(&self) -> &[OptionArg] {
        match &self.context {
            CommandContext::Arguments { options, .. } => options,
            CommandContext::Subcommands { .. } => &[],
        }
    }

    /// Positional inputs in binding order.
    pub fn inputs(&self) -> &[Input] {
        match &self.context {
            CommandContext::Arguments { inputs, .. } => inputs,
            CommandContext::Subcommands { .. } => &[],
        }
    }

    pub fn is_last_input_variadic(&self) -> bool {
        match &self.context {
            CommandContext::Arguments {
                is_last_input_variadic,
                ..
            } => *is_last_input_variadic,
            CommandContext::Subcommands { .. } => false,
        }
    }

    /// Find a flag by its `-s` / `--name` spelling.
    pub fn flag(&self, token: &str) -> Option<&Flag> {
        self.flags().iter().find(|f| f.matches(token))
    }

    /// Find an option by its `-s` / `--name` spelling.
    pub fn option(&self, token: &str) -> Option<&OptionArg> {
        self.options().iter().find(|o| o.matches(token))
    }

    /// Check the namespace invariants: sibling subcommand names are unique,
    /// names are unique among flags, options, and inputs, and shorts are
    /// unique among flags and among options.
    pub fn validate(&self) -> Result<(), InvalidCatalog> {
        match &self.context {
            CommandContext::Subcommands { subcommands } => {
                let mut names = HashSet::new();
                for subcommand in subcommands {
                    if !names.insert(subcommand.name.as_str()) {
                        return Err(InvalidCatalog(format!(
                            "duplicate subcommand '{}' under '{}'",
                            subcommand.name, self.name
                        )));
                    }
                    subcommand.validate()?;
                }
                Ok(())
            }
            CommandContext::Arguments {
                flags,
                options,
                inputs,
                ..
            } => {
                let mut names = HashSet::new();
                for name in flags
                    .iter()
                    .map(|f| f.name.as_str())
                    .chain(options.iter().map(|o| o.name.as_str()))
                    .chain(inputs.iter().map(|i| i.name.as_str()))
                {
                    if !names.insert(name) {
                        return Err(InvalidCatalog(format!(
                            "duplicate argument name '{name}' in command '{}'",
                            self.name
                        )));
                    }
                }

                let mut flag_shorts = HashSet::new();
                for short in flags.iter().filter_map(|f| f.short) {
                    if !flag_shorts.insert(short) {
                        return Err(InvalidCatalog(format!(
                            "duplicate flag short '-{short}' in command '{}'",
                            self.name
                        )));
                    }
                }
                let mut option_shorts = HashSet::new();
                for short in options.iter().filter_map(|o| o.short) {
                    if !option_shorts.insert(short) {
                        return Err(InvalidCatalog(format!(
                            "duplicate option short '-{short}' in command '{}'",
                            self.name
                        )));
                    }
                }
                Ok(())
            }
        }
    }
}

fn synthesized_help_flag() -> Flag {
    Flag::new(HELP_NAME, Some('h'), "Show help for this command.")
}

fn synthesized_help_subcommand() -> Command {
    Command::with_arguments(
        HELP_NAME,
        "Show help for a command.",
        Vec::new(),
        Vec::new(),
        vec![Input::new(
            "subcommand",
            ArgumentDataType::String,
            "Subcommand to show help for.",
        )
        .optional()],
        false,
    )
}

/// A catalog violated a namespace invariant while being assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidCatalog(pub String);

impl fmt::Display for InvalidCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid catalog: {}", self.0)
    }
}

impl std::error::Error for InvalidCatalog {}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str) -> Command {
        Command::with_arguments(name, "A leaf.", Vec::new(), Vec::new(), Vec::new(), false)
    }

    #[test]
    fn arguments_context_gets_a_help_flag() {
        let command = leaf("run");
        let help = command.flag("--help").expect("synthesized help flag");
        assert_eq!(help.short, Some('h'));
        assert!(command.flag("-h").is_some());
    }

    #[test]
    fn subcommands_context_gets_a_help_subcommand() {
        let command = Command::with_subcommands("stuff", "A menu.", vec![leaf("process")]);
        let help = command.subcommand(HELP_NAME).expect("synthesized help");
        let input = &help.inputs()[0];
        assert_eq!(input.name, "subcommand");
        assert!(input.is_optional);
    }

    #[test]
    fn help_injection_is_idempotent() {
        let mut command = Command::with_subcommands("stuff", "A menu.", vec![leaf("process")]);
        let once = command.clone();
        command.inject_help();
        assert_eq!(command, once);
    }

    #[test]
    fn dashed_token_matching() {
        let flag = Flag::new("verbose", Some('v'), "More output.");
        assert!(flag.matches("--verbose"));
        assert!(flag.matches("-v"));
        assert!(!flag.matches("-verbose"));
        assert!(!flag.matches("--v"));
        assert!(!flag.matches("verbose"));
        assert!(!flag.matches("-vv"));

        let bare = Flag::new("quiet", None, "Less output.");
        assert!(bare.matches("--quiet"));
        assert!(!bare.matches("-q"));
    }

    #[test]
    fn lookup_queries() {
        let command = Command::with_arguments(
            "process",
            "Process a file.",
            vec![Flag::new("verbose", Some('v'), "More output.")],
            vec![OptionArg::new(
                "passes",
                Some('p'),
                ArgumentDataType::Int,
                "Number of passes.",
            )],
            vec![Input::new(
                "textFile",
                ArgumentDataType::File,
                "File to process.",
            )],
            false,
        );

        assert_eq!(command.flag("-v").unwrap().name, "verbose");
        assert_eq!(command.option("--passes").unwrap().name, "passes");
        assert!(command.option("-x").is_none());
        assert_eq!(command.inputs().len(), 1);
        assert!(command.subcommand("anything").is_none());
    }

    #[test]
    fn duplicate_sibling_names_are_invalid() {
        let command = Command {
            name: "stuff".into(),
            description: String::new(),
            context: CommandContext::Subcommands {
                subcommands: vec![leaf("a"), leaf("a")],
            },
        };
        assert!(command.validate().is_err());
    }

    #[test]
    fn duplicate_argument_names_are_invalid() {
        let command = Command {
            name: "run".into(),
            description: String::new(),
            context: CommandContext::Arguments {
                flags: vec![Flag::new("x", None, "")],
                options: vec![OptionArg::new("x", None, ArgumentDataType::Int, "")],
                inputs: Vec::new(),
                is_last_input_variadic: false,
            },
        };
        assert!(command.validate().is_err());
    }

    #[test]
    fn duplicate_shorts_are_invalid() {
        let command = Command {
            name: "run".into(),
            description: String::new(),
            context: CommandContext::Arguments {
                flags: vec![
                    Flag::new("verbose", Some('v'), ""),
                    Flag::new("version", Some('v'), ""),
                ],
                options: Vec::new(),
                inputs: Vec::new(),
                is_last_input_variadic: false,
            },
        };
        assert!(command.validate().is_err());
    }

    #[test]
    fn context_is_distinguished_by_field_presence() {
        let menu = Command::with_subcommands("stuff", "A menu.", vec![leaf("process")]);
        let json = serde_json::to_string(&menu).unwrap();
        assert!(json.contains("\"subcommands\""));
        let back: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(back, menu);

        let leaf = leaf("run");
        let json = serde_json::to_string(&leaf).unwrap();
        assert!(json.contains("\"isLastInputVariadic\""));
        assert!(!json.contains("\"subcommands\""));
        let back: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(back, leaf);
    }
}
