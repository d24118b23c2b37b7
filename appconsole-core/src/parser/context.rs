use std::collections::{BTreeMap, VecDeque};

use regex::Regex;

use crate::catalog::{ArgumentValue, Command, Flag, Input, OptionArg};
use crate::invocation::Invocation;
use crate::parser::ParseError;

/// Mutable state of one parse: the command chain resolved so far, the
/// accumulated `(name, value)` pairs, and the sets of still-available
/// flags, options, and inputs at the current command.
///
/// Created per parse and consumed on completion. Lookups run against the
/// remaining sets, so a consumed flag or exhausted non-multiple option no
/// longer resolves and a repeat surfaces as an unknown flag or option.
pub(crate) struct ParseContext<'c> {
    root: &'c Command,
    current: &'c Command,
    chain: Vec<&'c Command>,
    arguments: BTreeMap<String, ArgumentValue>,
    remaining_flags: Vec<&'c Flag>,
    remaining_options: Vec<&'c OptionArg>,
    remaining_inputs: VecDeque<&'c Input>,
}

impl<'c> ParseContext<'c> {
    pub fn new(root: &'c Command) -> ParseContext<'c> {
        ParseContext {
            root,
            current: root,
            chain: vec![root],
            arguments: BTreeMap::new(),
            remaining_flags: root.flags().iter().collect(),
            remaining_options: root.options().iter().collect(),
            remaining_inputs: root.inputs().iter().collect(),
        }
    }

    pub fn root(&self) -> &'c Command {
        self.root
    }

    /// The deepest command descended into so far.
    pub fn current(&self) -> &'c Command {
        self.current
    }

    /// The resolved command chain, root first.
    pub fn chain(&self) -> &[&'c Command] {
        &self.chain
    }

    pub fn arguments(&self) -> &BTreeMap<String, ArgumentValue> {
        &self.arguments
    }

    /// Find a still-available flag by its dashed spelling.
    pub fn remaining_flag(&self, token: &str) -> Option<&'c Flag> {
        self.remaining_flags.iter().copied().find(|f| f.matches(token))
    }

    /// Find a still-available option by its dashed spelling.
    pub fn remaining_option(&self, token: &str) -> Option<&'c OptionArg> {
        self.remaining_options
            .iter()
            .copied()
            .find(|o| o.matches(token))
    }

    /// The next positional input to bind, if any remain.
    pub fn next_input(&self) -> Option<&'c Input> {
        self.remaining_inputs.front().copied()
    }

    /// Descend into a subcommand: append it to the chain and replace the
    /// remaining descriptor sets with the subcommand's.
    pub fn commit_subcommand(&mut self, subcommand: &'c Command) {
        self.chain.push(subcommand);
        self.current = subcommand;
        self.remaining_flags = subcommand.flags().iter().collect();
        self.remaining_options = subcommand.options().iter().collect();
        self.remaining_inputs = subcommand.inputs().iter().collect();
    }

    /// Record a flag as present and retire it from the remaining set.
    pub fn commit_flag(&mut self, flag: &'c Flag) -> Result<(), ParseError> {
        let position = self
            .remaining_flags
            .iter()
            .position(|f| f.name == flag.name)
            .ok_or_else(|| {
                ParseError::Unexpected(format!("flag '--{}' was already consumed", flag.name))
            })?;
        self.remaining_flags.remove(position);
        self.arguments
            .insert(flag.name.clone(), ArgumentValue::Bool { value: true });
        Ok(())
    }

    /// Validate, convert, and record an option value. The option is retired
    /// unless it allows multiple occurrences; on a repeat the latest value
    /// wins in the argument map.
    pub fn commit_option_value(
        &mut self,
        option: &'c OptionArg,
        raw: &str,
    ) -> Result<(), ParseError> {
        if let Some(pattern) = &option.validation_regex {
            if !regex_matches(pattern, raw, &option.name)? {
                return Err(ParseError::InvalidOptionValueFormat(option.name.clone()));
            }
        }
        let value = ArgumentValue::convert(raw, option.data_type).map_err(|_| {
            ParseError::ArgumentValueNotConvertible {
                argument: option.name.clone(),
                value: raw.to_string(),
                data_type: option.data_type,
            }
        })?;
        if !option.is_multiple_allowed {
            self.remaining_options.retain(|o| o.name != option.name);
        }
        self.arguments.insert(option.name.clone(), value);
        Ok(())
    }

    /// Validate, convert, and record a positional input. The head of the
    /// remaining inputs is consumed, except that a variadic last input is
    /// retained so it absorbs all further positional tokens (latest value
    /// wins in the argument map).
    pub fn commit_input(&mut self, input: &'c Input, raw: &str) -> Result<(), ParseError> {
        if let Some(pattern) = &input.validation_regex {
            if !regex_matches(pattern, raw, &input.name)? {
                return Err(ParseError::InvalidInputValueFormat(input.name.clone()));
            }
        }
        let value = ArgumentValue::convert(raw, input.data_type).map_err(|_| {
            ParseError::ArgumentValueNotConvertible {
                argument: input.name.clone(),
                value: raw.to_string(),
                data_type: input.data_type,
            }
        })?;
        let retained = self.remaining_inputs.len() == 1 && self.current.is_last_input_variadic();
        if !retained {
            self.remaining_inputs.pop_front();
        }
        self.arguments.insert(input.name.clone(), value);
        Ok(())
    }

    /// End-of-input check: every required input must be bound.
    pub fn finish(&self) -> Result<(), ParseError> {
        if let Some(missing) = self
            .remaining_inputs
            .iter()
            .find(|i| !i.is_optional && !self.arguments.contains_key(&i.name))
        {
            return Err(ParseError::MissingInputArgument(missing.name.clone()));
        }
        Ok(())
    }

    /// Build the owned invocation result.
    pub fn into_invocation(self) -> Invocation {
        Invocation::new(
            self.chain.iter().map(|c| c.name.clone()).collect(),
            self.arguments,
        )
    }
}

fn regex_matches(pattern: &str, value: &str, argument: &str) -> Result<bool, ParseError> {
    let regex = Regex::new(pattern).map_err(|_| {
        ParseError::Unexpected(format!(
            "invalid validation regex for argument '{argument}'"
        ))
    })?;
    Ok(regex.is_match(value))
}
