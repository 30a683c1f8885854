//! Errors produced by [`crate::Validator`] implementations across the
//! workspace. Kept deliberately small: this crate has no transport or
//! protocol layer of its own to aggregate errors from.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IntegrationError {
    #[error("validation failed: {0}")]
    Validation(String),
}
