//! Shared types for the Daraja workspace

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
