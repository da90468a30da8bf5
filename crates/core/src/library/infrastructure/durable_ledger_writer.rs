use std::ffi::OsString;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::library::infrastructure::ledger_fs::LedgerFs;
use crate::shared::constants::{LEDGER_BACKUP_EXTENSION, LEDGER_TEMP_EXTENSION};

#[derive(Error, Debug)]
pub enum DurableWriteError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} does not match the contents written")]
    Mismatch { path: PathBuf },
}

/// Publishes a file through a temp file and a backup generation.
///
/// Steps: write `<path>.tmp` durably, verify it, move the current file to
/// `<path>.bak`, move the temp file into place, verify again, drop the backup.
/// A crash at any point leaves either the old or the new contents at `path`,
/// or, between the two renames, the old contents at `<path>.bak`.
pub struct DurableLedgerWriter {
    fs: Box<dyn LedgerFs>,
}

impl DurableLedgerWriter {
    pub fn new(fs: Box<dyn LedgerFs>) -> Self {
        Self { fs }
    }

    pub fn fs(&self) -> &dyn LedgerFs {
        self.fs.as_ref()
    }

    pub fn write(&self, path: &Path, contents: &[u8]) -> Result<(), DurableWriteError> {
        let temp = sibling(path, LEDGER_TEMP_EXTENSION);
        let backup = sibling(path, LEDGER_BACKUP_EXTENSION);

        self.fs
            .write_durable(&temp, contents)
            .map_err(|source| io_error(&temp, source))?;
        self.verify(&temp, contents)?;

        if self.fs.exists(path) {
            self.fs
                .rename(path, &backup)
                .map_err(|source| io_error(path, source))?;
        }
        self.fs
            .rename(&temp, path)
            .map_err(|source| io_error(&temp, source))?;
        self.verify(path, contents)?;

        if self.fs.exists(&backup) {
            self.fs
                .remove(&backup)
                .map_err(|source| io_error(&backup, source))?;
        }
        Ok(())
    }

    fn verify(&self, path: &Path, expected: &[u8]) -> Result<(), DurableWriteError> {
        let actual = self.fs.read(path).map_err(|source| io_error(path, source))?;
        if actual != expected {
            return Err(DurableWriteError::Mismatch {
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }
}

/// `path` with `suffix` appended to its file name.
pub fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn io_error(path: &Path, source: std::io::Error) -> DurableWriteError {
    DurableWriteError::Io {
        path: path.to_path_buf(),
        source,
    }
}
