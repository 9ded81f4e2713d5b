//! The structured form of one protocol message.
//!
//! A packet on the wire looks like:
//!
//! ```text
//! <command>[ <param>]\n
//! [<name>=<value>\n]*
//! \n
//! [<data>]
//! \0
//! ```
//!
//! The data section is opaque. Some commands (`recv`, `send`) carry a whole
//! second packet in it. That nested packet is only parsed when someone asks
//! for it through [`Packet::sub_packet`], and the result is cached.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use serde::Serialize;

use crate::{Command, ParseError};

/// One protocol message: command, optional parameter, arguments, and data.
///
/// Packets built by the parser are effectively immutable. Packets built for
/// sending use the `with_*` builder methods; only the argument map can be
/// changed afterwards through [`set_arg`](Self::set_arg).
#[derive(Debug, Clone, Serialize)]
pub struct Packet {
    command: Command,
    #[serde(rename = "command_name")]
    name: String,
    param: String,
    args: BTreeMap<String, String>,
    data: String,
    #[serde(skip)]
    sub: OnceLock<Result<Box<Packet>, ParseError>>,
}

impl Packet {
    /// Creates a packet with the given command token and nothing else.
    pub fn new(command: impl Into<String>) -> Self {
        let name = command.into();
        Self {
            command: Command::from_name(&name),
            name,
            param: String::new(),
            args: BTreeMap::new(),
            data: String::new(),
            sub: OnceLock::new(),
        }
    }

    /// Creates a packet for a known command.
    pub fn of(command: Command) -> Self {
        Self::new(command.as_str().unwrap_or("unknown"))
    }

    pub(crate) fn from_parts(
        name: String,
        param: String,
        args: BTreeMap<String, String>,
        data: String,
    ) -> Self {
        Self {
            command: Command::from_name(&name),
            name,
            param,
            args,
            data,
            sub: OnceLock::new(),
        }
    }

    /// Sets the parameter.
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.param = param.into();
        self
    }

    /// Adds an argument, replacing any earlier value for the same name.
    pub fn with_arg(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }

    /// Sets the data payload.
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = data.into();
        self.sub = OnceLock::new();
        self
    }

    /// Embeds another packet as this packet's data payload.
    pub fn with_sub_packet(self, sub: &Packet) -> Self {
        self.with_data(sub.to_wire_string())
    }

    /// The resolved command.
    pub fn command(&self) -> Command {
        self.command
    }

    /// The raw command token as it appeared on the wire.
    pub fn command_name(&self) -> &str {
        &self.name
    }

    pub fn param(&self) -> &str {
        &self.param
    }

    /// Looks up an argument by name.
    pub fn arg(&self, name: &str) -> Option<&str> {
        self.args.get(name).map(String::as_str)
    }

    pub fn args(&self) -> &BTreeMap<String, String> {
        &self.args
    }

    /// Sets an argument in place, for adjusting a packet just before send.
    pub fn set_arg(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.args.insert(name.into(), value.into());
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    /// Parses the data payload as a nested packet.
    ///
    /// The first call does the work; later calls return the cached result,
    /// including a cached error.
    pub fn sub_packet(&self) -> Result<&Packet, ParseError> {
        self.sub
            .get_or_init(|| crate::parse_str(&self.data).map(Box::new))
            .as_ref()
            .map(|packet| packet.as_ref())
            .map_err(Clone::clone)
    }

    /// Serializes to wire text without the trailing NUL.
    ///
    /// This is the form embedded as another packet's data.
    pub fn to_wire_string(&self) -> String {
        let mut out = String::with_capacity(
            self.name.len() + self.param.len() + self.data.len() + 16,
        );
        out.push_str(&self.name);
        if !self.param.is_empty() {
            out.push(' ');
            out.push_str(&self.param);
        }
        out.push('\n');
        for (name, value) in &self.args {
            out.push_str(name);
            out.push('=');
            out.push_str(value);
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.data);
        out
    }

    /// Serializes to a NUL-terminated frame ready for the socket.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = self.to_wire_string().into_bytes();
        bytes.push(0);
        bytes
    }
}

impl PartialEq for Packet {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.param == other.param
            && self.args == other.args
            && self.data == other.data
    }
}

impl Eq for Packet {}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.param.is_empty() {
            write!(f, " {}", self.param)?;
        }
        Ok(())
    }
}
