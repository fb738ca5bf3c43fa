//! Tool identity extraction from an action's `run` command.

use std::borrow::Cow;

use super::error::CommandError;

/// The executable an action invokes, taken from the first token of its
/// `run` command (`type:version`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolIdentity {
    pub tool_type: String,
    pub version: String,
}

/// Tokenizes `command` with shell quoting rules and splits the first token
/// on its first colon. `#` is an ordinary character, never a comment.
pub fn parse_tool_identity(command: &str) -> Result<ToolIdentity, CommandError> {
    let tokens = shlex::split(&escape_comment_markers(command))
        .ok_or_else(|| CommandError::Tokenize(command.to_string()))?;

    let first = tokens.into_iter().next().ok_or(CommandError::Empty)?;
    if first.is_empty() {
        return Err(CommandError::Empty);
    }

    match first.split_once(':') {
        Some((tool_type, version)) => Ok(ToolIdentity {
            tool_type: tool_type.to_string(),
            version: version.to_string(),
        }),
        None => Err(CommandError::MissingVersion(first)),
    }
}

/// Backslash-escapes each unquoted `#` that starts a word, which `shlex`
/// would otherwise read as the start of a comment.
fn escape_comment_markers(command: &str) -> Cow<'_, str> {
    if !command.contains('#') {
        return Cow::Borrowed(command);
    }

    let mut escaped = String::with_capacity(command.len() + 4);
    let mut quote: Option<char> = None;
    let mut word_start = true;
    let mut chars = command.chars();

    while let Some(c) = chars.next() {
        let starts_word = word_start;
        word_start = false;

        match quote {
            Some('\'') => {
                if c == '\'' {
                    quote = None;
                }
                escaped.push(c);
            }
            Some(_) => {
                escaped.push(c);
                if c == '\\' {
                    escaped.extend(chars.next());
                } else if c == '"' {
                    quote = None;
                }
            }
            None => match c {
                '#' if starts_word => escaped.push_str("\\#"),
                '\\' => {
                    escaped.push(c);
                    escaped.extend(chars.next());
                }
                '\'' | '"' => {
                    quote = Some(c);
                    escaped.push(c);
                }
                ' ' | '\t' | '\n' => {
                    word_start = true;
                    escaped.push(c);
                }
                _ => escaped.push(c),
            },
        }
    }

    Cow::Owned(escaped)
}
