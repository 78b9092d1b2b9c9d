use crate::backend::{Backend, BackendError};
use crate::commands::executable::Executable;
use crate::commands::{ArgumentParser, DispatchError};
use crate::outcome::Outcome;
use crate::target::{SysfsDir, Target};

/// List the entries of a namespace directory, in the order the backend enumerates them.
///
/// Only sysfs namespaces can be listed; a missing directory (e.g. pciback not loaded) is a
/// failure reply.
#[derive(Debug, PartialEq)]
pub struct List {
    pub dir: SysfsDir,
}

impl Executable for List {
    fn exec(self, backend: &dyn Backend) -> Result<Outcome, BackendError> {
        backend
            .list_dir(&Target::dir(self.dir))
            .map(Outcome::StringList)
    }
}

impl TryFrom<&ArgumentParser<'_>> for List {
    type Error = DispatchError;

    fn try_from(parser: &ArgumentParser<'_>) -> Result<Self, Self::Error> {
        let namespace = parser.namespace()?;
        let dir = namespace
            .sysfs_dir()
            .ok_or_else(|| DispatchError::UnknownNamespace {
                command: parser.command(),
                namespace: namespace.to_string(),
            })?;

        Ok(Self { dir })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::FakeBackend;
    use crate::commands::{dispatch, request, Command, CommandName, DIR_ID};

    #[test]
    fn lists_devices_in_backend_order() {
        let (_, cmd) = dispatch(&request("list", &[(DIR_ID, "pci_dev")], 1)).unwrap();

        assert_eq!(
            cmd,
            Command::List(List {
                dir: SysfsDir::Devices
            })
        );

        let backend = FakeBackend::default().with_dir(
            "/sys/bus/pci/devices",
            &["0000:00:02.0", "0000:00:01.0"],
        );

        assert_eq!(
            cmd.execute(&backend),
            Outcome::StringList(vec![
                "0000:00:02.0".to_string(),
                "0000:00:01.0".to_string()
            ])
        );
    }

    #[test]
    fn missing_directory_is_a_failure() {
        let (_, cmd) = dispatch(&request("list", &[(DIR_ID, "pciback_driver")], 1)).unwrap();

        assert!(cmd.execute(&FakeBackend::default()).is_failure());
    }

    #[test]
    fn literal_paths_cannot_be_listed() {
        let err = dispatch(&request("list", &[(DIR_ID, "driver_path")], 1)).unwrap_err();

        assert_eq!(
            err,
            DispatchError::UnknownNamespace {
                command: CommandName::List,
                namespace: "driver_path".to_string()
            }
        );
    }
}
