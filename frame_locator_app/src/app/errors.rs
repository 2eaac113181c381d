use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Indexing or querying failed inside the library (decoder spawn
    /// failure, bad frame geometry, table parse error, resize failure).
    #[error(transparent)]
    Locator(#[from] frame_locator_lib::Error),

    #[error("could not open fingerprint table {path}: {reason}")]
    TableOpen { path: PathBuf, reason: String },

    #[error("could not load query image: {0}")]
    ImageLoad(String),

    #[error("could not write output {path}: {reason}")]
    Output { path: PathBuf, reason: String },
}
