use crate::catalog::{Command, CommandContext, Flag, Input, OptionArg};

/// Column where descriptions start in the two-column sections. A left
/// column reaching this threshold pushes its description to the next line.
const DESCRIPTION_COLUMN: usize = 26;

/// Hard wrap for rendered usage text.
const LINE_WIDTH: usize = 80;

/// Render the human usage block for `target`, reached from within `root`'s
/// command tree: overview, USAGE line, and the SUBCOMMANDS or
/// FLAGS/OPTIONS/INPUTS sections that apply.
pub fn render(root: &Command, target: &Command) -> String {
    let mut out = String::new();
    out.push_str("OVERVIEW: ");
    out.push_str(&target.description);
    out.push_str("\n\n");
    out.push_str("USAGE: ");
    out.push_str(&usage_line(root, target));
    out.push('\n');

    match &target.context {
        CommandContext::Subcommands { subcommands } => {
            out.push_str("\nSUBCOMMANDS:\n");
            for subcommand in subcommands {
                two_column(&mut out, &subcommand.name, &subcommand.description);
            }
        }
        CommandContext::Arguments {
            flags,
            options,
            inputs,
            ..
        } => {
            if !flags.is_empty() {
                out.push_str("\nFLAGS:\n");
                for flag in flags {
                    two_column(&mut out, &flag_label(flag), &flag.description);
                }
            }
            if !options.is_empty() {
                out.push_str("\nOPTIONS:\n");
                for option in options {
                    two_column(&mut out, &option_label(option), &option.description);
                }
            }
            if !inputs.is_empty() {
                out.push_str("\nINPUTS:\n");
                for input in inputs {
                    let description = if input.is_optional {
                        format!("(optional) {}", input.description)
                    } else {
                        input.description.clone()
                    };
                    two_column(&mut out, &input_label(input), &description);
                }
            }
        }
    }

    out
}

/// The one-line synopsis: the command path from `root` to `target`,
/// followed by the target's argument placeholders.
fn usage_line(root: &Command, target: &Command) -> String {
    let mut parts = path_to(root, target).unwrap_or_else(|| vec![target.name.clone()]);
    match &target.context {
        CommandContext::Subcommands { .. } => parts.push("<subcommand>".to_string()),
        CommandContext::Arguments {
            flags,
            options,
            inputs,
            is_last_input_variadic,
        } => {
            for flag in flags {
                parts.push(format!("[--{}]", flag.name));
            }
            for option in options {
                parts.push(format!("[--{} <{}>]", option.name, option.name));
            }
            for (index, input) in inputs.iter().enumerate() {
                let mut part = format!("<{}>", input.name);
                if index + 1 == inputs.len() && *is_last_input_variadic {
                    part.push_str(" ...");
                }
                if input.is_optional {
                    part = format!("[{part}]");
                }
                parts.push(part);
            }
        }
    }
    parts.join(" ")
}

/// Names along the path from `root` down to `target`, when `target` lives
/// in `root`'s tree.
fn path_to(root: &Command, target: &Command) -> Option<Vec<String>> {
    if root == target {
        return Some(vec![root.name.clone()]);
    }
    for subcommand in root.subcommand_list()? {
        if let Some(mut path) = path_to(subcommand, target) {
            path.insert(0, root.name.clone());
            return Some(path);
        }
    }
    None
}

fn flag_label(flag: &Flag) -> String {
    match flag.short {
        Some(short) => format!("-{short}, --{}", flag.name),
        None => format!("--{}", flag.name),
    }
}

fn option_label(option: &OptionArg) -> String {
    match option.short {
        Some(short) => format!("-{short}, --{} <{}>", option.name, option.name),
        None => format!("--{} <{}>", option.name, option.name),
    }
}

fn input_label(input: &Input) -> String {
    if input.is_optional {
        format!("[<{}>]", input.name)
    } else {
        format!("<{}>", input.name)
    }
}

/// Emit one two-column row: the left label, then the description starting
/// at [`DESCRIPTION_COLUMN`] and word-wrapped to [`LINE_WIDTH`] with
/// continuation lines aligned to the right column.
fn two_column(out: &mut String, left: &str, description: &str) {
    let mut line = format!("  {left}");
    if description.is_empty() {
        line.push('\n');
        out.push_str(&line);
        return;
    }

    if line.len() >= DESCRIPTION_COLUMN {
        line.push('\n');
        out.push_str(&line);
        line = " ".repeat(DESCRIPTION_COLUMN);
    } else {
        line.push_str(&" ".repeat(DESCRIPTION_COLUMN - line.len()));
    }

    let mut column = DESCRIPTION_COLUMN;
    let mut first = true;
    for word in description.split_whitespace() {
        if !first {
            if column + 1 + word.len() > LINE_WIDTH {
                line.push('\n');
                line.push_str(&" ".repeat(DESCRIPTION_COLUMN));
                column = DESCRIPTION_COLUMN;
            } else {
                line.push(' ');
                column += 1;
            }
        }
        line.push_str(word);
        column += word.len();
        first = false;
    }
    line.push('\n');
    out.push_str(&line);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ArgumentDataType;

    fn process() -> Command {
        Command::with_arguments(
            "process",
            "Process a text file.",
            vec![Flag::new("verbose", Some('v'), "Print more about each pass.")],
            vec![OptionArg::new(
                "passes",
                Some('p'),
                ArgumentDataType::Int,
                "Number of passes over the file.",
            )],
            vec![Input::new(
                "textFile",
                ArgumentDataType::File,
                "The file to process.",
            )],
            false,
        )
    }

    fn stuff() -> Command {
        Command::with_subcommands("stuff", "Things to do with stuff.", vec![process()])
    }

    #[test]
    fn arguments_usage_has_all_sections() {
        let root = stuff();
        let target = root.subcommand("process").unwrap();
        let usage = render(&root, target);

        assert!(usage.starts_with("OVERVIEW: Process a text file.\n"));
        assert!(usage.contains(
            "USAGE: stuff process [--verbose] [--help] [--passes <passes>] <textFile>\n"
        ));
        assert!(usage.contains("FLAGS:\n"));
        assert!(usage.contains("  -v, --verbose"));
        assert!(usage.contains("  -h, --help"));
        assert!(usage.contains("OPTIONS:\n"));
        assert!(usage.contains("  -p, --passes <passes>"));
        assert!(usage.contains("INPUTS:\n"));
        assert!(usage.contains("  <textFile>"));
    }

    #[test]
    fn subcommands_usage_lists_the_menu() {
        let root = stuff();
        let usage = render(&root, &root);

        assert!(usage.contains("USAGE: stuff <subcommand>\n"));
        assert!(usage.contains("SUBCOMMANDS:\n"));
        assert!(usage.contains("  process"));
        assert!(usage.contains("  help"));
    }

    #[test]
    fn descriptions_start_at_the_padding_column() {
        let root = stuff();
        let usage = render(&root, &root);
        let line = usage
            .lines()
            .find(|l| l.starts_with("  process"))
            .unwrap();
        assert_eq!(line.find("Process a text file.").unwrap(), DESCRIPTION_COLUMN);
    }

    #[test]
    fn long_left_column_pushes_description_to_the_next_line() {
        let mut out = String::new();
        two_column(
            &mut out,
            "--a-very-long-option-name <value>",
            "Description text.",
        );
        let mut lines = out.lines();
        assert_eq!(lines.next().unwrap(), "  --a-very-long-option-name <value>");
        let second = lines.next().unwrap();
        assert_eq!(second.find("Description").unwrap(), DESCRIPTION_COLUMN);
    }

    #[test]
    fn long_descriptions_wrap_to_the_right_column() {
        let mut out = String::new();
        let description =
            "word ".repeat(30);
        two_column(&mut out, "-x, --xyz", &description);
        assert!(out.lines().count() > 1);
        for line in out.lines().skip(1) {
            assert!(line.starts_with(&" ".repeat(DESCRIPTION_COLUMN)));
            assert!(line.len() <= LINE_WIDTH);
        }
    }

    #[test]
    fn optional_and_variadic_inputs_are_marked() {
        let command = Command::with_arguments(
            "say",
            "Say words.",
            Vec::new(),
            Vec::new(),
            vec![Input::new("word", ArgumentDataType::String, "Words to say.").optional()],
            true,
        );
        let usage = render(&command, &command);
        assert!(usage.contains("[<word> ...]"));
        assert!(usage.contains("(optional)"));
    }
}
