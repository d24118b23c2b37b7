use crate::parser::ParseError;

/// Scanner state while splitting a command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    /// Between tokens, skipping whitespace.
    Between,
    /// Inside an unquoted token.
    InToken,
    /// Inside a double-quoted segment.
    InQuotes,
    /// Just saw `\` inside an unquoted token.
    EscapedInToken,
    /// Just saw `\` inside a quoted segment.
    EscapedInQuotes,
    /// Just closed a quote; only whitespace or end of line may follow.
    AfterQuote,
}

/// Split a command line into argument tokens with shell-like quoting.
///
/// Whitespace separates tokens. A double-quoted segment is a single token
/// preserving internal whitespace; a quote therefore spans a whole token,
/// and text butting up against a quote on either side is malformed. Inside
/// and outside quotes, `\\` yields `\` and `\"` yields `"`; any other escape
/// stalls the scanner. Malformed lines fail with
/// [`ParseError::FailedToTokenize`].
///
/// Every returned token is non-empty (an empty quoted segment contributes
/// nothing); empty input produces an empty list.
pub fn tokenize(line: &str) -> Result<Vec<String>, ParseError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut state = Scan::Between;

    let malformed = || ParseError::FailedToTokenize(line.to_string());

    for ch in line.chars() {
        state = match state {
            Scan::Between => match ch {
                c if c.is_whitespace() => Scan::Between,
                '"' => Scan::InQuotes,
                '\\' => Scan::EscapedInToken,
                c => {
                    current.push(c);
                    Scan::InToken
                }
            },
            Scan::InToken => match ch {
                c if c.is_whitespace() => {
                    tokens.push(std::mem::take(&mut current));
                    Scan::Between
                }
                '"' => return Err(malformed()),
                '\\' => Scan::EscapedInToken,
                c => {
                    current.push(c);
                    Scan::InToken
                }
            },
            Scan::EscapedInToken => match ch {
                '"' | '\\' => {
                    current.push(ch);
                    Scan::InToken
                }
                _ => return Err(malformed()),
            },
            Scan::InQuotes => match ch {
                '"' => Scan::AfterQuote,
                '\\' => Scan::EscapedInQuotes,
                c => {
                    current.push(c);
                    Scan::InQuotes
                }
            },
            Scan::EscapedInQuotes => match ch {
                '"' | '\\' => {
                    current.push(ch);
                    Scan::InQuotes
                }
                _ => return Err(malformed()),
            },
            Scan::AfterQuote => match ch {
                c if c.is_whitespace() => {
                    if !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                    }
                    Scan::Between
                }
                _ => return Err(malformed()),
            },
        };
    }

    match state {
        Scan::Between => {}
        Scan::InToken => tokens.push(current),
        Scan::AfterQuote => {
            if !current.is_empty() {
                tokens.push(current);
            }
        }
        Scan::InQuotes | Scan::EscapedInQuotes | Scan::EscapedInToken => return Err(malformed()),
    }

    Ok(tokens)
}

/// Re-quote a token so that [`tokenize`] yields it back verbatim: wrap in
/// double quotes and escape `"` and `\`.
pub fn quote(token: &str) -> String {
    let mut quoted = String::with_capacity(token.len() + 2);
    quoted.push('"');
    for ch in token.chars() {
        if ch == '"' || ch == '\\' {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(line: &str) -> Vec<String> {
        tokenize(line).unwrap()
    }

    #[test]
    fn whitespace_separates_tokens() {
        assert_eq!(ok("stuff process -v"), vec!["stuff", "process", "-v"]);
        assert_eq!(ok("  a \t b  "), vec!["a", "b"]);
    }

    #[test]
    fn empty_input_produces_no_tokens() {
        assert!(ok("").is_empty());
        assert!(ok("   \t ").is_empty());
    }

    #[test]
    fn quoted_segment_is_one_token() {
        assert_eq!(ok(r#"say "hello there" now"#), vec!["say", "hello there", "now"]);
    }

    #[test]
    fn escapes_inside_and_outside_quotes() {
        assert_eq!(ok(r#"a\\b"#), vec![r"a\b"]);
        assert_eq!(ok(r#"a\"b"#), vec![r#"a"b"#]);
        assert_eq!(ok(r#""a \"quoted\" word""#), vec![r#"a "quoted" word"#]);
        assert_eq!(ok(r#""back\\slash""#), vec![r"back\slash"]);
    }

    #[test]
    fn empty_quotes_contribute_nothing() {
        assert!(ok(r#""""#).is_empty());
        assert_eq!(ok(r#"a "" b"#), vec!["a", "b"]);
    }

    #[test]
    fn unterminated_quote_is_malformed() {
        assert!(matches!(
            tokenize(r#"say "unterminated"#),
            Err(ParseError::FailedToTokenize(_))
        ));
    }

    #[test]
    fn trailing_escape_is_malformed() {
        assert!(matches!(
            tokenize(r"oops\"),
            Err(ParseError::FailedToTokenize(_))
        ));
    }

    #[test]
    fn unknown_escape_is_malformed() {
        assert!(matches!(
            tokenize(r"a\nb"),
            Err(ParseError::FailedToTokenize(_))
        ));
    }

    #[test]
    fn text_against_a_quote_is_malformed() {
        assert!(tokenize(r#""abc"def"#).is_err());
        assert!(tokenize(r#"abc"def""#).is_err());
    }

    #[test]
    fn requoted_token_round_trips() {
        for token in [
            "plain",
            "with space",
            r#"with "quotes""#,
            r"back\slash",
            r#"mixed \" both"#,
        ] {
            assert_eq!(ok(&quote(token)), vec![token], "token: {token:?}");
        }
    }

    #[test]
    fn error_carries_the_original_line() {
        let line = r#"broken "line"#;
        match tokenize(line) {
            Err(ParseError::FailedToTokenize(l)) => assert_eq!(l, line),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
