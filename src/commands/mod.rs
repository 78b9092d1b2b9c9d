pub mod executable;
pub mod exists;
pub mod list;
pub mod read_hex;
pub mod read_resources;
pub mod reset;
pub mod unbind;
pub mod write;

use bytes::Bytes;
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error as ThisError;
use tracing::warn;

use crate::backend::{Backend, BackendError};
use crate::commands::executable::Executable;
use crate::document::{Document, Map};
use crate::outcome::Outcome;
use crate::reply::ID;
use crate::target::{Namespace, Target};

use exists::Exists;
use list::List;
use read_hex::ReadHex;
use read_resources::ReadResources;
use reset::Reset;
use unbind::Unbind;
use write::Write;

pub const EXECUTE: &str = "execute";
pub const ARGUMENTS: &str = "arguments";

pub const DIR_ID: &str = "dir_id";
pub const PCI_PATH: &str = "pci_path";
pub const PCI_INFO: &str = "pci_info";

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum CommandName {
    List,
    Write,
    ReadHex,
    Exists,
    ReadResources,
    Unbind,
    Reset,
}

#[derive(Debug, PartialEq)]
pub enum Command {
    List(List),
    Write(Write),
    ReadHex(ReadHex),
    Exists(Exists),
    ReadResources(ReadResources),
    Unbind(Unbind),
    Reset(Reset),
}

impl Command {
    pub fn name(&self) -> CommandName {
        match self {
            Command::List(_) => CommandName::List,
            Command::Write(_) => CommandName::Write,
            Command::ReadHex(_) => CommandName::ReadHex,
            Command::Exists(_) => CommandName::Exists,
            Command::ReadResources(_) => CommandName::ReadResources,
            Command::Unbind(_) => CommandName::Unbind,
            Command::Reset(_) => CommandName::Reset,
        }
    }

    /// Runs the command. Backend errors become [`Outcome::Failure`]; they never end the session.
    pub fn execute(self, backend: &dyn Backend) -> Outcome {
        let name = self.name();
        match self.exec(backend) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(command = %name, error = %err, "command failed");
                Outcome::Failure(err.to_string())
            }
        }
    }
}

impl Executable for Command {
    fn exec(self, backend: &dyn Backend) -> Result<Outcome, BackendError> {
        match self {
            Command::List(cmd) => cmd.exec(backend),
            Command::Write(cmd) => cmd.exec(backend),
            Command::ReadHex(cmd) => cmd.exec(backend),
            Command::Exists(cmd) => cmd.exec(backend),
            Command::ReadResources(cmd) => cmd.exec(backend),
            Command::Unbind(cmd) => cmd.exec(backend),
            Command::Reset(cmd) => cmd.exec(backend),
        }
    }
}

impl TryFrom<&Document> for Command {
    type Error = DispatchError;

    fn try_from(document: &Document) -> Result<Self, Self::Error> {
        let request = document
            .as_map()
            .ok_or(DispatchError::InvalidRequest("request is not a map"))?;

        let command_name = match request.get(EXECUTE) {
            Some(Document::String(name)) => name.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        let command = command_name
            .parse::<CommandName>()
            .map_err(|_| DispatchError::UnknownCommand {
                command: command_name,
            })?;

        let arguments = match request.get(ARGUMENTS) {
            Some(Document::Map(arguments)) => Some(arguments),
            Some(_) => return Err(DispatchError::InvalidRequest("arguments is not a map")),
            None => None,
        };

        let parser = &ArgumentParser { command, arguments };

        match command {
            CommandName::List => List::try_from(parser).map(Command::List),
            CommandName::Write => Write::try_from(parser).map(Command::Write),
            CommandName::ReadHex => ReadHex::try_from(parser).map(Command::ReadHex),
            CommandName::Exists => Exists::try_from(parser).map(Command::Exists),
            CommandName::ReadResources => {
                ReadResources::try_from(parser).map(Command::ReadResources)
            }
            CommandName::Unbind => Unbind::try_from(parser).map(Command::Unbind),
            CommandName::Reset => Reset::try_from(parser).map(Command::Reset),
        }
    }
}

/// Validates a request document and turns it into its id and command.
pub fn dispatch(document: &Document) -> Result<(i64, Command), DispatchError> {
    let id = match document.as_map().map(|request| request.get(ID)) {
        None => return Err(DispatchError::InvalidRequest("request is not a map")),
        Some(None) => return Err(DispatchError::MissingId),
        Some(Some(id)) => id.as_integer().ok_or(DispatchError::InvalidId)?,
    };

    let command = Command::try_from(document)?;
    Ok((id, command))
}

/// The request id, if the document carries a usable one.
pub fn request_id(document: &Document) -> Option<i64> {
    document.as_map()?.get(ID)?.as_integer()
}

/// Typed access to the `arguments` map of one request.
pub struct ArgumentParser<'a> {
    command: CommandName,
    arguments: Option<&'a Map>,
}

impl<'a> ArgumentParser<'a> {
    pub fn command(&self) -> CommandName {
        self.command
    }

    pub fn string(&self, key: &'static str) -> Result<&'a str, DispatchError> {
        let value = self
            .arguments
            .and_then(|arguments| arguments.get(key))
            .ok_or(DispatchError::MissingArgument {
                command: self.command,
                key,
            })?;

        value.as_str().ok_or(DispatchError::InvalidArgument {
            command: self.command,
            key,
        })
    }

    pub fn namespace(&self) -> Result<Namespace, DispatchError> {
        let dir_id = self.string(DIR_ID)?;
        dir_id
            .parse::<Namespace>()
            .map_err(|_| DispatchError::UnknownNamespace {
                command: self.command,
                namespace: dir_id.to_string(),
            })
    }

    /// The value of `key` composed under `namespace`.
    pub fn target(&self, namespace: Namespace, key: &'static str) -> Result<Target, DispatchError> {
        Target::new(namespace, self.string(key)?).ok_or(DispatchError::InvalidArgument {
            command: self.command,
            key,
        })
    }

    pub fn payload(&self, key: &'static str) -> Result<Bytes, DispatchError> {
        self.string(key)
            .map(|value| Bytes::copy_from_slice(value.as_bytes()))
    }
}

#[derive(Debug, ThisError, PartialEq)]
pub enum DispatchError {
    #[error("protocol error; invalid request, {0}")]
    InvalidRequest(&'static str),
    #[error("protocol error; request has no id")]
    MissingId,
    #[error("protocol error; request id is not an integer")]
    InvalidId,
    #[error("protocol error; unknown command {command:?}")]
    UnknownCommand { command: String },
    #[error("protocol error; command {command} is missing argument {key}")]
    MissingArgument {
        command: CommandName,
        key: &'static str,
    },
    #[error("protocol error; invalid argument {key} for command {command}")]
    InvalidArgument {
        command: CommandName,
        key: &'static str,
    },
    #[error("protocol error; unknown namespace {namespace:?} for command {command}")]
    UnknownNamespace {
        command: CommandName,
        namespace: String,
    },
}

/// Builds a request document the way a client would send it.
#[cfg(test)]
pub(crate) fn request(command: &str, arguments: &[(&str, &str)], id: i64) -> Document {
    let arguments = arguments
        .iter()
        .fold(Map::new(), |map, (key, value)| map.with(*key, *value));

    Document::Map(
        Map::new()
            .with(EXECUTE, command)
            .with(ARGUMENTS, arguments)
            .with(ID, id),
    )
}
