//! Unit registration errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Unit already registered: {0}")]
    Duplicate(String),
}
