//! Symbolic namespaces (`dir_id`) and the paths commands act on.
//!
//! Composition is pure: nothing here touches the filesystem. Paths below a sysfs namespace stay
//! relative until a backend resolves them against its root.

use std::path::{Component, Path, PathBuf};
use strum_macros::{AsRefStr, Display, EnumString};

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Namespace {
    /// Devices known to the PCI bus.
    #[strum(serialize = "pci_dev")]
    PciDevices,
    /// Devices bound to the pciback driver.
    PcibackDriver,
    /// A caller-supplied path, used verbatim.
    DriverPath,
}

impl Namespace {
    pub fn sysfs_dir(self) -> Option<SysfsDir> {
        match self {
            Namespace::PciDevices => Some(SysfsDir::Devices),
            Namespace::PcibackDriver => Some(SysfsDir::PcibackDriver),
            Namespace::DriverPath => None,
        }
    }
}

/// Directories below the PCI sysfs root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SysfsDir {
    Devices,
    PcibackDriver,
}

impl SysfsDir {
    pub fn relative_path(self) -> &'static str {
        match self {
            SysfsDir::Devices => "devices",
            SysfsDir::PcibackDriver => "drivers/pciback",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    Sysfs { dir: SysfsDir, relative: PathBuf },
    Literal(PathBuf),
}

impl Target {
    /// The namespace directory itself.
    pub fn dir(dir: SysfsDir) -> Target {
        Target::Sysfs {
            dir,
            relative: PathBuf::new(),
        }
    }

    /// Composes `path` under `namespace`.
    ///
    /// Leading slashes are dropped so `"/0000:00:01.0/vendor"` and `"0000:00:01.0/vendor"` name
    /// the same file. Returns `None` when a namespaced path steps out of its directory, or a
    /// literal path is relative.
    pub fn new(namespace: Namespace, path: &str) -> Option<Target> {
        let Some(dir) = namespace.sysfs_dir() else {
            let path = PathBuf::from(path);
            return path.is_absolute().then_some(Target::Literal(path));
        };

        let relative = Path::new(path.trim_start_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return None;
        }

        Some(Target::Sysfs {
            dir,
            relative: relative.to_path_buf(),
        })
    }

    pub fn join(&self, child: &str) -> Target {
        match self {
            Target::Sysfs { dir, relative } => Target::Sysfs {
                dir: *dir,
                relative: relative.join(child),
            },
            Target::Literal(path) => Target::Literal(path.join(child)),
        }
    }

    pub fn resolve(&self, sysfs_root: &Path) -> PathBuf {
        match self {
            Target::Sysfs { dir, relative } => {
                let dir = sysfs_root.join(dir.relative_path());
                if relative.as_os_str().is_empty() {
                    dir
                } else {
                    dir.join(relative)
                }
            }
            Target::Literal(path) => path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_names() {
        assert_eq!("pci_dev".parse::<Namespace>(), Ok(Namespace::PciDevices));
        assert_eq!(
            "pciback_driver".parse::<Namespace>(),
            Ok(Namespace::PcibackDriver)
        );
        assert_eq!("driver_path".parse::<Namespace>(), Ok(Namespace::DriverPath));
        assert!("pci_devices".parse::<Namespace>().is_err());
        assert_eq!(Namespace::PciDevices.as_ref(), "pci_dev");
    }

    #[test]
    fn namespaced_paths_resolve_under_the_root() {
        let target = Target::new(Namespace::PciDevices, "/0000:00:01.0/vendor").unwrap();

        assert_eq!(
            target.resolve(Path::new("/sys/bus/pci")),
            PathBuf::from("/sys/bus/pci/devices/0000:00:01.0/vendor")
        );

        let target = Target::new(Namespace::PcibackDriver, "new_slot").unwrap();

        assert_eq!(
            target.resolve(Path::new("/sys/bus/pci")),
            PathBuf::from("/sys/bus/pci/drivers/pciback/new_slot")
        );
    }

    #[test]
    fn driver_path_is_literal() {
        let target = Target::new(Namespace::DriverPath, "/sys/bus/pci/drivers/e1000e/bind").unwrap();

        assert_eq!(
            target,
            Target::Literal(PathBuf::from("/sys/bus/pci/drivers/e1000e/bind"))
        );
        assert_eq!(
            target.resolve(Path::new("/elsewhere")),
            PathBuf::from("/sys/bus/pci/drivers/e1000e/bind")
        );
    }

    #[test]
    fn driver_path_must_be_absolute() {
        assert_eq!(Target::new(Namespace::DriverPath, "relative/new_id"), None);
        assert_eq!(Target::new(Namespace::DriverPath, ""), None);
    }

    #[test]
    fn namespaced_paths_cannot_escape() {
        assert_eq!(Target::new(Namespace::PciDevices, "../../../etc/shadow"), None);
        assert_eq!(Target::new(Namespace::PcibackDriver, "a/../../b"), None);
    }

    #[test]
    fn join_appends_a_component() {
        let target = Target::new(Namespace::PciDevices, "0000:00:01.0").unwrap();

        assert_eq!(
            target.join("reset").resolve(Path::new("/sys/bus/pci")),
            PathBuf::from("/sys/bus/pci/devices/0000:00:01.0/reset")
        );
    }
}
