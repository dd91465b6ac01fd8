//! Top-level error for the binary.

use crate::store::StoreError;
use crate::workflow::WorkflowError;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
/// Anything that can stop the application.
pub enum Error {
    /// Terminal, file or logging I/O.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The game store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An editing operation failed.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// The requested game does not exist.
    #[error("no game matches {0:?}")]
    UnknownGame(String),
}
