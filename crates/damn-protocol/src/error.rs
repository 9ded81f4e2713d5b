/// Errors raised while turning raw frame bytes into a [`Packet`](crate::Packet).
///
/// `Clone` because a failed sub-packet parse is memoized alongside the
/// packet and handed back on every later access.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The frame contained no bytes at all.
    #[error("empty frame")]
    Empty,

    /// The frame was not valid UTF-8.
    #[error("frame is not valid UTF-8")]
    InvalidUtf8,

    /// The command token before the first space or newline was empty.
    #[error("empty command token")]
    EmptyCommand,

    /// An argument line started with `=`.
    #[error("argument with an empty name")]
    EmptyArgumentName,

    /// An argument line ended before its `=` separator.
    #[error("argument `{0}` has no `=` separator")]
    UnterminatedArgument(String),
}

/// Errors that can occur while decoding packets into typed events.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The packet (or its sub-packet) did not follow the wire grammar.
    #[error("parse failed: {0}")]
    Parse(#[from] ParseError),

    /// A chatroom identifier could not be understood.
    #[error("invalid chatroom identifier: {0:?}")]
    InvalidChatroom(String),

    /// A decoder was handed a packet with the wrong command.
    #[error("expected `{expected}` packet, got `{found}`")]
    UnexpectedCommand {
        /// The command the decoder handles.
        expected: &'static str,
        /// The command that was actually received.
        found: String,
    },

    /// A required argument was absent.
    #[error("`{command}` packet is missing argument `{name}`")]
    MissingArgument {
        /// The command of the offending packet.
        command: String,
        /// The missing argument name.
        name: &'static str,
    },

    /// A field carried a value of the wrong shape.
    #[error("invalid value {value:?} for field `{field}`")]
    InvalidField {
        /// The field name.
        field: String,
        /// The raw value.
        value: String,
    },

    /// A key=value field name that the decoder does not know.
    #[error("unknown field `{0}`")]
    UnknownField(String),

    /// A structured payload did not match its grammar.
    #[error("malformed {event} payload: {reason}")]
    Malformed {
        /// The event being decoded.
        event: &'static str,
        /// What went wrong.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_from_parse_error() {
        let err: ProtocolError = ParseError::EmptyCommand.into();
        assert!(matches!(err, ProtocolError::Parse(ParseError::EmptyCommand)));
        assert_eq!(err.to_string(), "parse failed: empty command token");
    }

    #[test]
    fn test_missing_argument_display_names_command_and_arg() {
        let err = ProtocolError::MissingArgument {
            command: "login".into(),
            name: "e",
        };
        assert_eq!(err.to_string(), "`login` packet is missing argument `e`");
    }
}
