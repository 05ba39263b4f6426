pub mod analytics;
pub mod api;
pub mod clock;
pub mod config;
pub mod directory;
pub mod engine;
pub mod error;
pub mod notify;
pub mod sequence;
pub mod shift;
pub mod shutdown;
pub mod store;
pub mod sweeper;

pub use engine::{Collaborators, ShiftEngine};
pub use error::{ErrorKind, Result, RosterError};
