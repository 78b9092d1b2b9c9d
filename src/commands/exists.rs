use crate::backend::{Backend, BackendError};
use crate::commands::executable::Executable;
use crate::commands::{ArgumentParser, DispatchError, PCI_INFO};
use crate::outcome::{Outcome, NOLSTAT};
use crate::target::Target;

/// Resolve a path to its canonical form. A missing path is reported as `nolstat`, not as a
/// failure.
#[derive(Debug, PartialEq)]
pub struct Exists {
    pub target: Target,
}

impl Executable for Exists {
    fn exec(self, backend: &dyn Backend) -> Result<Outcome, BackendError> {
        let text = match backend.canonicalize(&self.target)? {
            Some(path) => path.to_string_lossy().into_owned(),
            None => NOLSTAT.to_string(),
        };

        Ok(Outcome::Text(Some(text)))
    }
}

impl TryFrom<&ArgumentParser<'_>> for Exists {
    type Error = DispatchError;

    fn try_from(parser: &ArgumentParser<'_>) -> Result<Self, Self::Error> {
        let namespace = parser.namespace()?;
        let target = parser.target(namespace, PCI_INFO)?;

        Ok(Self { target })
    }
}
