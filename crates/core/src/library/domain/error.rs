use std::path::PathBuf;

use thiserror::Error;

use crate::video::domain::video_source::VideoSourceError;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error(
        "video ledger '{path}' is corrupt: {source}. Restore it by hand from \
         '{path}.bak' or '{path}.tmp' if present, or delete it to rescan \
         '{directory}' from scratch"
    )]
    LedgerCorrupt {
        path: PathBuf,
        directory: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(
        "video ledger '{path}' did not read back as written; the disk in \
         '{directory}' may be failing"
    )]
    LedgerWriteVerificationFailed { path: PathBuf, directory: PathBuf },
    #[error("I/O error on video ledger '{path}': {source}")]
    Ledger {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("video directory '{0}' does not exist")]
    DirectoryNotFound(PathBuf),
    #[error("no video files in the library")]
    EmptyLibrary,
    #[error("no video in the library has any frames")]
    NoPlayableFrames,
    #[error(transparent)]
    Video(#[from] VideoSourceError),
}
