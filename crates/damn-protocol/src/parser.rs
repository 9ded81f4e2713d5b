//! Frame-to-packet decoder.
//!
//! The grammar is small enough for an explicit state machine:
//!
//! ```text
//! Cmd ──' '──→ Param ──'\n'──┐
//!  └─────────'\n'────────────┴→ ArgName ⇄ ArgValue
//!                                  │
//!                             blank line
//!                                  ↓
//!                                Data (rest of frame, verbatim)
//! ```
//!
//! Parsing is total: every input yields either a [`Packet`] or a
//! [`ParseError`], and nothing in here panics.

use std::collections::BTreeMap;

use crate::{Packet, ParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Cmd,
    Param,
    ArgName,
    ArgValue,
}

/// Parses one frame (without its NUL terminator) into a packet.
pub fn parse(bytes: &[u8]) -> Result<Packet, ParseError> {
    let text = std::str::from_utf8(bytes).map_err(|_| ParseError::InvalidUtf8)?;
    parse_str(text)
}

/// Parses one frame that is already known to be text.
pub fn parse_str(text: &str) -> Result<Packet, ParseError> {
    if text.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut state = State::Cmd;
    let mut command = String::new();
    let mut param = String::new();
    let mut name = String::new();
    let mut value = String::new();
    let mut args = BTreeMap::new();
    let mut data_start = None;

    for (idx, ch) in text.char_indices() {
        match state {
            State::Cmd => match ch {
                ' ' | '\n' if command.is_empty() => {
                    return Err(ParseError::EmptyCommand);
                }
                ' ' => state = State::Param,
                '\n' => state = State::ArgName,
                _ => command.push(ch),
            },
            State::Param => match ch {
                '\n' => state = State::ArgName,
                _ => param.push(ch),
            },
            State::ArgName => match ch {
                '=' if name.is_empty() => {
                    return Err(ParseError::EmptyArgumentName);
                }
                '=' => state = State::ArgValue,
                '\n' if name.is_empty() => {
                    data_start = Some(idx + ch.len_utf8());
                    break;
                }
                '\n' => return Err(ParseError::UnterminatedArgument(name)),
                _ => name.push(ch),
            },
            State::ArgValue => match ch {
                '\n' => {
                    commit_arg(&mut args, &mut name, &mut value);
                    state = State::ArgName;
                }
                _ => value.push(ch),
            },
        }
    }

    // End of input without reaching the data section.
    if data_start.is_none() {
        match state {
            State::Cmd if command.is_empty() => return Err(ParseError::EmptyCommand),
            State::ArgName if !name.is_empty() => {
                return Err(ParseError::UnterminatedArgument(name));
            }
            State::ArgValue => commit_arg(&mut args, &mut name, &mut value),
            _ => {}
        }
    }

    let data = data_start.map(|start| text[start..].to_owned()).unwrap_or_default();
    Ok(Packet::from_parts(command, param, args, data))
}

fn commit_arg(args: &mut BTreeMap<String, String>, name: &mut String, value: &mut String) {
    let name = std::mem::take(name);
    let value = std::mem::take(value);
    if value.is_empty() {
        tracing::warn!(arg = %name, "argument with empty value");
    }
    args.insert(name, value);
}

/// Splits a `key=value` line at the first `=`.
///
/// Returns `None` when the line has no `=` at all.
pub fn split_pair(line: &str) -> Option<(&str, &str)> {
    line.split_once('=')
}

/// Iterates the `key=value` lines of a payload, skipping blank lines.
///
/// Lines without `=` are yielded with an empty value so callers can decide
/// whether to reject them.
pub fn key_values(data: &str) -> impl Iterator<Item = (&str, &str)> {
    data.lines()
        .filter(|line| !line.is_empty())
        .map(|line| split_pair(line).unwrap_or((line, "")))
}
