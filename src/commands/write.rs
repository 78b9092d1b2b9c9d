use bytes::Bytes;

use crate::backend::{Backend, BackendError};
use crate::commands::executable::Executable;
use crate::commands::{ArgumentParser, DispatchError, PCI_INFO, PCI_PATH};
use crate::outcome::Outcome;
use crate::target::Target;

/// Write `pci_info` to the file `pci_path` names within `dir_id`.
///
/// The file must exist; sysfs attributes are never created.
#[derive(Debug, PartialEq)]
pub struct Write {
    pub target: Target,
    pub payload: Bytes,
}

impl Executable for Write {
    fn exec(self, backend: &dyn Backend) -> Result<Outcome, BackendError> {
        backend.write_file(&self.target, &self.payload)?;
        Ok(Outcome::success())
    }
}

impl TryFrom<&ArgumentParser<'_>> for Write {
    type Error = DispatchError;

    fn try_from(parser: &ArgumentParser<'_>) -> Result<Self, Self::Error> {
        let namespace = parser.namespace()?;
        let target = parser.target(namespace, PCI_PATH)?;
        let payload = parser.payload(PCI_INFO)?;

        Ok(Self { target, payload })
    }
}
