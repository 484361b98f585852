//! Store persistence port trait.

use crate::domain::error::PackError;
use crate::domain::store::StoreState;

pub trait StatePort {
    /// Previously saved state, or `None` if nothing has been saved yet.
    fn load(&self) -> Result<Option<StoreState>, PackError>;

    fn save(&self, state: &StoreState) -> Result<(), PackError>;
}
