//! Common types shared by the callback gateway crates

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
