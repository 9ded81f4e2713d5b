//! Outgoing operations.
//!
//! Each one builds a packet and queues it. Nothing waits for a reply:
//! failures come back later as error events that the caller correlates by
//! chatroom or username.

use damn_protocol::{ChatroomId, requests};

use crate::{Session, SessionError, SessionState};

impl Session {
    fn require_online(&self) -> Result<(), SessionError> {
        if self.state().is_online() {
            Ok(())
        } else {
            Err(SessionError::NotOnline)
        }
    }

    pub fn join(&mut self, chatroom: &ChatroomId) -> Result<(), SessionError> {
        self.require_online()?;
        self.transmit(&requests::join(chatroom));
        Ok(())
    }

    /// # Errors
    /// [`SessionError::NotJoined`] if the chatroom is not in the model.
    pub fn part(&mut self, chatroom: &ChatroomId) -> Result<(), SessionError> {
        self.require_online()?;
        if !self.is_joined(chatroom) {
            return Err(SessionError::NotJoined(chatroom.to_string()));
        }
        self.transmit(&requests::part(chatroom));
        Ok(())
    }

    pub fn say(&mut self, chatroom: &ChatroomId, text: &str) -> Result<(), SessionError> {
        self.require_online()?;
        self.transmit(&requests::say(chatroom, text));
        Ok(())
    }

    pub fn act(&mut self, chatroom: &ChatroomId, text: &str) -> Result<(), SessionError> {
        self.require_online()?;
        self.transmit(&requests::act(chatroom, text));
        Ok(())
    }

    /// Sends a message the server will not parse for markup.
    pub fn npmsg(&mut self, chatroom: &ChatroomId, text: &str) -> Result<(), SessionError> {
        self.require_online()?;
        self.transmit(&requests::npmsg(chatroom, text));
        Ok(())
    }

    /// Promotes `username`, to `privclass` if given or the next class up.
    pub fn promote(
        &mut self,
        chatroom: &ChatroomId,
        username: &str,
        privclass: Option<&str>,
    ) -> Result<(), SessionError> {
        self.require_online()?;
        self.transmit(&requests::promote(chatroom, username, privclass));
        Ok(())
    }

    pub fn demote(
        &mut self,
        chatroom: &ChatroomId,
        username: &str,
        privclass: Option<&str>,
    ) -> Result<(), SessionError> {
        self.require_online()?;
        self.transmit(&requests::demote(chatroom, username, privclass));
        Ok(())
    }

    pub fn kick(
        &mut self,
        chatroom: &ChatroomId,
        username: &str,
        reason: Option<&str>,
    ) -> Result<(), SessionError> {
        self.require_online()?;
        self.transmit(&requests::kick(chatroom, username, reason));
        Ok(())
    }

    pub fn ban(&mut self, chatroom: &ChatroomId, username: &str) -> Result<(), SessionError> {
        self.require_online()?;
        self.transmit(&requests::ban(chatroom, username));
        Ok(())
    }

    pub fn unban(&mut self, chatroom: &ChatroomId, username: &str) -> Result<(), SessionError> {
        self.require_online()?;
        self.transmit(&requests::unban(chatroom, username));
        Ok(())
    }

    pub fn get_room_property(
        &mut self,
        chatroom: &ChatroomId,
        property: &str,
    ) -> Result<(), SessionError> {
        self.require_online()?;
        self.transmit(&requests::get_property(chatroom, property));
        Ok(())
    }

    pub fn set_room_property(
        &mut self,
        chatroom: &ChatroomId,
        property: &str,
        value: &str,
    ) -> Result<(), SessionError> {
        self.require_online()?;
        self.transmit(&requests::set_property(chatroom, property, value));
        Ok(())
    }

    /// Sends a raw admin command such as `show privclass` or
    /// `create privclass Testers +msg`.
    pub fn send_admin_command(
        &mut self,
        chatroom: &ChatroomId,
        command: &str,
    ) -> Result<(), SessionError> {
        self.require_online()?;
        self.transmit(&requests::admin(chatroom, command));
        Ok(())
    }

    /// Asks the server to disconnect `username`. Needs server-wide rights.
    pub fn kill(&mut self, username: &str, reason: &str) -> Result<(), SessionError> {
        self.require_online()?;
        self.transmit(&requests::kill(username, reason));
        Ok(())
    }

    /// Requests whois information; the reply arrives as a whois event.
    pub fn whois(&mut self, username: &str) -> Result<(), SessionError> {
        self.require_online()?;
        self.transmit(&requests::whois(username));
        Ok(())
    }

    /// Asks the server to end the session. The server closes the socket
    /// after acknowledging with a `disconnect` packet.
    pub fn quit(&mut self) -> Result<(), SessionError> {
        if !self.state().is_connected() {
            return Err(SessionError::InvalidState {
                operation: "quit",
                state: self.state(),
            });
        }
        self.transmit(&requests::disconnect());
        Ok(())
    }
}
