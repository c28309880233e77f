//! Errors produced while loading configuration.

use thiserror::Error;

/// An error loading or validating an [`crate::AppConfig`].
#[derive(Error, Debug)]
pub enum Error {
    /// The configuration source existed but could not be read.
    #[error("failed to read configuration source: {0}")]
    Unreadable(#[from] std::io::Error),
}

/// A [`Result`](std::result::Result) with an [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
