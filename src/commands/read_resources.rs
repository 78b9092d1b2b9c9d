use crate::backend::{Backend, BackendError};
use crate::commands::executable::Executable;
use crate::commands::{ArgumentParser, DispatchError, PCI_INFO};
use crate::outcome::Outcome;
use crate::target::{Namespace, Target};

/// Number of resource windows the kernel lists for a PCI device.
pub const MAX_RESOURCES: usize = 7;

/// Read the `start end flags` windows of a device `resource` file below the devices directory.
#[derive(Debug, PartialEq)]
pub struct ReadResources {
    pub target: Target,
}

impl Executable for ReadResources {
    fn exec(self, backend: &dyn Backend) -> Result<Outcome, BackendError> {
        backend
            .read_resources(&self.target, MAX_RESOURCES)
            .map(Outcome::ResourceRanges)
    }
}

impl TryFrom<&ArgumentParser<'_>> for ReadResources {
    type Error = DispatchError;

    fn try_from(parser: &ArgumentParser<'_>) -> Result<Self, Self::Error> {
        let target = parser.target(Namespace::PciDevices, PCI_INFO)?;
        Ok(Self { target })
    }
}
