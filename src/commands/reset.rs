use bytes::Bytes;

use crate::backend::{Backend, BackendError};
use crate::commands::executable::Executable;
use crate::commands::{ArgumentParser, DispatchError, PCI_INFO, PCI_PATH};
use crate::outcome::Outcome;
use crate::target::{Namespace, Target};

/// Trigger a function-level reset by writing `pci_info` to the device's `reset` file.
#[derive(Debug, PartialEq)]
pub struct Reset {
    pub device: Target,
    pub payload: Bytes,
}

impl Executable for Reset {
    fn exec(self, backend: &dyn Backend) -> Result<Outcome, BackendError> {
        backend.write_file(&self.device.join("reset"), &self.payload)?;
        Ok(Outcome::success())
    }
}

impl TryFrom<&ArgumentParser<'_>> for Reset {
    type Error = DispatchError;

    fn try_from(parser: &ArgumentParser<'_>) -> Result<Self, Self::Error> {
        let device = parser.target(Namespace::PciDevices, PCI_PATH)?;
        let payload = parser.payload(PCI_INFO)?;

        Ok(Self { device, payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::FakeBackend;
    use crate::commands::{dispatch, request};

    #[test]
    fn writes_reset_trigger() {
        let (id, cmd) = dispatch(&request(
            "reset",
            &[(PCI_PATH, "/0000:00:19.0"), (PCI_INFO, "1")],
            12,
        ))
        .unwrap();
        let backend =
            FakeBackend::default().with_file("/sys/bus/pci/devices/0000:00:19.0/reset", "");

        assert_eq!(id, 12);
        assert_eq!(cmd.execute(&backend), Outcome::success());
        assert_eq!(
            backend.file("/sys/bus/pci/devices/0000:00:19.0/reset"),
            Some("1".to_string())
        );
    }

    #[test]
    fn device_without_reset_support_is_a_failure() {
        let (_, cmd) = dispatch(&request(
            "reset",
            &[(PCI_PATH, "/0000:00:19.0"), (PCI_INFO, "1")],
            12,
        ))
        .unwrap();

        assert!(cmd.execute(&FakeBackend::default()).is_failure());
    }
}
