use crate::backend::{Backend, BackendError};
use crate::outcome::Outcome;

pub trait Executable {
    fn exec(self, backend: &dyn Backend) -> Result<Outcome, BackendError>;
}
