use crate::catalog::{Command, CommandContext, Flag, Input, OptionArg, HELP_NAME};
use crate::parser::context::ParseContext;
use crate::parser::{ParseError, UsageRequest};

/// States of the command-line parser. `Success` and `Failure` are terminal.
#[derive(Debug)]
pub(crate) enum ParserState<'c> {
    Command,
    ParsedSubcommand(&'c Command),
    ParsedFlag(&'c Flag),
    ParsedOption(&'c OptionArg),
    ParsedOptionValue(&'c OptionArg),
    ParsedInput(&'c Input),
    Success,
    Failure(ParseError),
}

/// Events fed to the state machine, one per scanned token plus the final
/// `NoMoreArguments`.
#[derive(Debug)]
pub(crate) enum ParserEvent<'c> {
    ScannedSubcommand(&'c Command),
    ScannedFlag(&'c Flag),
    ScannedOption(&'c OptionArg),
    ScannedOptionValue(&'c OptionArg, String),
    ScannedInput(&'c Input, String),
    ScannedInvalidFlagOrOption(String),
    ScannedHelpFlag,
    ScannedUnexpectedArgument(String),
    ErrorWasThrown(ParseError),
    NoMoreArguments,
}

/// Classify the next token given the machine state and the current command.
///
/// After `ParsedOption` the token is forced to be that option's value; a
/// dashed token in that slot means the value is missing. Otherwise dashed
/// tokens resolve against the still-available flags and options (`-h`,
/// `--help`, or any flag named `help` short-circuits into a usage request),
/// bare tokens resolve as a subcommand, then as the next positional input.
pub(crate) fn classify<'c>(
    context: &ParseContext<'c>,
    state: &ParserState<'c>,
    token: &str,
) -> ParserEvent<'c> {
    if let ParserState::ParsedOption(option) = state {
        if token.starts_with('-') {
            return ParserEvent::ErrorWasThrown(ParseError::MissingOptionValue(
                option.name.clone(),
            ));
        }
        return ParserEvent::ScannedOptionValue(*option, token.to_string());
    }

    if token.starts_with('-') {
        if token == "-h" || token == "--help" {
            return ParserEvent::ScannedHelpFlag;
        }
        if let Some(flag) = context.remaining_flag(token) {
            if flag.name == HELP_NAME {
                return ParserEvent::ScannedHelpFlag;
            }
            return ParserEvent::ScannedFlag(flag);
        }
        if let Some(option) = context.remaining_option(token) {
            return ParserEvent::ScannedOption(option);
        }
        return ParserEvent::ScannedInvalidFlagOrOption(token.to_string());
    }

    if let Some(subcommand) = context.current().subcommand(token) {
        return ParserEvent::ScannedSubcommand(subcommand);
    }
    if let Some(input) = context.next_input() {
        return ParserEvent::ScannedInput(input, token.to_string());
    }

    match context.current().context {
        CommandContext::Subcommands { .. } => {
            ParserEvent::ErrorWasThrown(ParseError::NoSuchSubcommand(token.to_string()))
        }
        CommandContext::Arguments { .. } => {
            ParserEvent::ScannedUnexpectedArgument(token.to_string())
        }
    }
}

/// The transition function. Commits the event's effect on the parse context
/// before advancing; a failed commit moves straight to `Failure`.
pub(crate) fn transition<'c>(
    state: ParserState<'c>,
    event: ParserEvent<'c>,
    context: &mut ParseContext<'c>,
) -> ParserState<'c> {
    match event {
        ParserEvent::ScannedSubcommand(subcommand) => {
            context.commit_subcommand(subcommand);
            ParserState::ParsedSubcommand(subcommand)
        }
        ParserEvent::ScannedFlag(flag) => match context.commit_flag(flag) {
            Ok(()) => ParserState::ParsedFlag(flag),
            Err(err) => ParserState::Failure(err),
        },
        ParserEvent::ScannedOption(option) => ParserState::ParsedOption(option),
        ParserEvent::ScannedOptionValue(option, value) => {
            match context.commit_option_value(option, &value) {
                Ok(()) => ParserState::ParsedOptionValue(option),
                Err(err) => ParserState::Failure(err),
            }
        }
        ParserEvent::ScannedInput(input, value) => match context.commit_input(input, &value) {
            Ok(()) => ParserState::ParsedInput(input),
            Err(err) => ParserState::Failure(err),
        },
        ParserEvent::ScannedHelpFlag => ParserState::Failure(ParseError::UsageRequested(
            Box::new(UsageRequest {
                root: context.root().clone(),
                target: context.current().clone(),
            }),
        )),
        ParserEvent::ScannedInvalidFlagOrOption(token) => {
            ParserState::Failure(ParseError::InvalidFlagOrOption(token))
        }
        ParserEvent::ScannedUnexpectedArgument(token) => {
            ParserState::Failure(ParseError::UnexpectedArgument(token))
        }
        ParserEvent::ErrorWasThrown(err) => ParserState::Failure(err),
        ParserEvent::NoMoreArguments => match state {
            ParserState::ParsedOption(option) => {
                ParserState::Failure(ParseError::MissingOptionValue(option.name.clone()))
            }
            _ => match context.finish() {
                Ok(()) => ParserState::Success,
                Err(err) => ParserState::Failure(err),
            },
        },
    }
}
