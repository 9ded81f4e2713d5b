//! Error types for the room model.

/// Errors from chatroom and privclass mutations.
///
/// None of these are fatal to a session. The dispatch path logs them and
/// carries on; they exist as values so direct callers can react.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// The user is not a member of this chatroom.
    #[error("{user} is not a member of {chatroom}")]
    MemberNotFound { chatroom: String, user: String },

    /// No privclass with this name exists in the chatroom.
    #[error("privclass {name:?} not found in {chatroom}")]
    PrivClassNotFound { chatroom: String, name: String },

    /// A privclass with this name already exists.
    #[error("privclass {0:?} already exists")]
    DuplicatePrivClass(String),

    /// A privclass list line that is not `order:name`.
    #[error("invalid privclass line: {0:?}")]
    InvalidPrivString(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_room_and_user() {
        let err = RoomError::MemberNotFound {
            chatroom: "#Botdom".into(),
            user: "bob".into(),
        };
        assert_eq!(err.to_string(), "bob is not a member of #Botdom");
    }

    #[test]
    fn test_display_quotes_privclass_names() {
        let err = RoomError::PrivClassNotFound {
            chatroom: "#Botdom".into(),
            name: "peanut gallery".into(),
        };
        assert_eq!(
            err.to_string(),
            "privclass \"peanut gallery\" not found in #Botdom"
        );
    }
}
