//! The command-line parser: tokenize a free-form human line, drive a state
//! machine over the tokens against a catalog command, and produce a typed
//! [`Invocation`] or a precise diagnostic.
//!
//! Parser errors are never fatal; the client renders them and reads the
//! next line. [`ParseError::UsageRequested`] is an error in form but a
//! successful outcome in intent: displaying it renders the usage block.

mod context;
mod machine;
mod tokenizer;
mod usage;

use std::fmt;

use crate::catalog::{ArgumentDataType, Command, HELP_NAME};
use crate::invocation::Invocation;

use context::ParseContext;
use machine::{classify, transition, ParserEvent, ParserState};

pub use tokenizer::{quote, tokenize};
pub use usage::render as render_usage;

/// A request for the usage block of `target`, raised from within `root`'s
/// command tree.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageRequest {
    pub root: Command,
    pub target: Command,
}

/// Diagnostics produced while evaluating a command line.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// An internal inconsistency; not expected during normal parsing.
    Unexpected(String),
    /// A dashed token that is neither a flag nor an option of the current
    /// command.
    InvalidFlagOrOption(String),
    /// A positional token with nothing left to bind it to.
    UnexpectedArgument(String),
    /// An option was named but its value never followed.
    MissingOptionValue(String),
    /// A required positional input was never bound.
    MissingInputArgument(String),
    /// An option value did not match the option's validation regex.
    InvalidOptionValueFormat(String),
    /// An input value did not match the input's validation regex.
    InvalidInputValueFormat(String),
    /// The user asked for help; render the usage block for the target.
    UsageRequested(Box<UsageRequest>),
    /// The first token named no root command in the catalog.
    NoSuchCommand(String),
    /// A token named no subcommand of the current inner menu.
    NoSuchSubcommand(String),
    /// A value failed the native parse for its declared data type.
    ArgumentValueNotConvertible {
        argument: String,
        value: String,
        data_type: ArgumentDataType,
    },
    /// The line could not be split into tokens.
    FailedToTokenize(String),
}

impl ParseError {
    /// Whether displaying this error renders a usage block rather than a
    /// diagnostic (exit code 0 in scripting contexts).
    pub fn is_usage(&self) -> bool {
        matches!(self, ParseError::UsageRequested(_))
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Unexpected(message) => write!(f, "unexpected error: {message}"),
            ParseError::InvalidFlagOrOption(token) => {
                write!(f, "'{token}' is not a flag or option of this command")
            }
            ParseError::UnexpectedArgument(token) => write!(f, "unexpected argument '{token}'"),
            ParseError::MissingOptionValue(option) => {
                write!(f, "missing value for option '--{option}'")
            }
            ParseError::MissingInputArgument(input) => {
                write!(f, "missing required input '<{input}>'")
            }
            ParseError::InvalidOptionValueFormat(option) => {
                write!(f, "value for option '--{option}' has an invalid format")
            }
            ParseError::InvalidInputValueFormat(input) => {
                write!(f, "value for input '<{input}>' has an invalid format")
            }
            ParseError::UsageRequested(request) => {
                f.write_str(&usage::render(&request.root, &request.target))
            }
            ParseError::NoSuchCommand(name) => write!(f, "no such command '{name}'"),
            ParseError::NoSuchSubcommand(name) => write!(f, "no such subcommand '{name}'"),
            ParseError::ArgumentValueNotConvertible {
                argument,
                value,
                data_type,
            } => write!(
                f,
                "cannot convert '{value}' to {data_type} for argument '{argument}'"
            ),
            ParseError::FailedToTokenize(line) => {
                write!(f, "failed to tokenize command line: {line}")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Evaluate one command line against the root commands of a catalog.
///
/// The first token selects the root command; the remaining tokens are fed
/// through the state machine. The parser terminates on every input, either
/// with an [`Invocation`] or with a specific [`ParseError`].
pub fn evaluate(command_line: &str, commands: &[Command]) -> Result<Invocation, ParseError> {
    let tokens = tokenize(command_line)?;
    let Some((first, rest)) = tokens.split_first() else {
        return Err(ParseError::Unexpected("empty command line".to_string()));
    };
    let root = commands
        .iter()
        .find(|c| c.name == *first)
        .ok_or_else(|| ParseError::NoSuchCommand(first.clone()))?;
    parse_tokens(root, rest, commands)
}

/// Drive the state machine over the tokens of one command, then resolve any
/// help request that survived into the parse result.
fn parse_tokens<'c>(
    root: &'c Command,
    tokens: &[String],
    roots: &'c [Command],
) -> Result<Invocation, ParseError> {
    let mut context = ParseContext::new(root);
    let mut state = ParserState::Command;
    let mut tokens = tokens.iter();

    loop {
        state = match state {
            ParserState::Failure(err) => return Err(err),
            ParserState::Success => break,
            state => {
                let event = match tokens.next() {
                    Some(token) => classify(&context, &state, token),
                    None => ParserEvent::NoMoreArguments,
                };
                transition(state, event, &mut context)
            }
        };
    }

    resolve_help(context, roots)
}

/// A parse that succeeded but contains the `help` flag or a `help`
/// subcommand chain is re-raised as a usage request. The target is the last
/// non-help command in the chain, or, when the help subcommand's optional
/// `subcommand` input was supplied, the command of that name at root level
/// or in the sibling namespace. An unknown name silently yields help for
/// the containing command.
fn resolve_help<'c>(
    context: ParseContext<'c>,
    roots: &'c [Command],
) -> Result<Invocation, ParseError> {
    let help_flag = context
        .arguments()
        .get(HELP_NAME)
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    let used_help_subcommand = context.chain().iter().any(|c| c.name == HELP_NAME);
    if !help_flag && !used_help_subcommand {
        return Ok(context.into_invocation());
    }

    let root = context.root();
    let containing = context
        .chain()
        .iter()
        .rev()
        .find(|c| c.name != HELP_NAME)
        .copied()
        .unwrap_or(root);
    let mut target = containing;
    if used_help_subcommand {
        if let Some(name) = context.arguments().get("subcommand").and_then(|v| v.as_str()) {
            target = roots
                .iter()
                .find(|c| c.name == name)
                .or_else(|| containing.subcommand(name))
                .unwrap_or(containing);
        }
    }

    Err(ParseError::UsageRequested(Box::new(UsageRequest {
        root: root.clone(),
        target: target.clone(),
    })))
}
