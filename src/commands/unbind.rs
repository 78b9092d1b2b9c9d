use bytes::Bytes;

use crate::backend::{Backend, BackendError};
use crate::commands::executable::Executable;
use crate::commands::{ArgumentParser, DispatchError, PCI_INFO, PCI_PATH};
use crate::outcome::{Outcome, NOLSTAT};
use crate::target::{Namespace, Target};

/// Detach a device from its current driver.
///
/// `pci_path` names the device's `driver` link; the link is resolved and `pci_info` is written to
/// the driver's `unbind` file. Replies with the driver's canonical path, or `nolstat` when the
/// device has no driver link.
#[derive(Debug, PartialEq)]
pub struct Unbind {
    pub driver_link: Target,
    pub payload: Bytes,
}

impl Executable for Unbind {
    fn exec(self, backend: &dyn Backend) -> Result<Outcome, BackendError> {
        let Some(driver) = backend.canonicalize(&self.driver_link)? else {
            return Ok(Outcome::Text(Some(NOLSTAT.to_string())));
        };

        backend.write_file(&Target::Literal(driver.join("unbind")), &self.payload)?;
        Ok(Outcome::Text(Some(driver.to_string_lossy().into_owned())))
    }
}

impl TryFrom<&ArgumentParser<'_>> for Unbind {
    type Error = DispatchError;

    fn try_from(parser: &ArgumentParser<'_>) -> Result<Self, Self::Error> {
        let driver_link = parser.target(Namespace::PciDevices, PCI_PATH)?;
        let payload = parser.payload(PCI_INFO)?;

        Ok(Self {
            driver_link,
            payload,
        })
    }
}
