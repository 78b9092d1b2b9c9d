use crate::backend::{Backend, BackendError};
use crate::commands::executable::Executable;
use crate::commands::{ArgumentParser, DispatchError, PCI_INFO};
use crate::outcome::Outcome;
use crate::target::Target;

/// Read a `0x`-prefixed hexadecimal attribute, such as a device's `vendor`, as an integer.
#[derive(Debug, PartialEq)]
pub struct ReadHex {
    pub target: Target,
}

impl Executable for ReadHex {
    fn exec(self, backend: &dyn Backend) -> Result<Outcome, BackendError> {
        backend.read_token(&self.target).map(Outcome::Integer)
    }
}

impl TryFrom<&ArgumentParser<'_>> for ReadHex {
    type Error = DispatchError;

    fn try_from(parser: &ArgumentParser<'_>) -> Result<Self, Self::Error> {
        let namespace = parser.namespace()?;
        let target = parser.target(namespace, PCI_INFO)?;

        Ok(Self { target })
    }
}
