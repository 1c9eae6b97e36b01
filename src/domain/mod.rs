//! Domain layer: models, collaborator ports, and error types.

pub mod error;
pub mod models;
pub mod ports;

pub use error::{StoreError, ValidationError, WatchError};
