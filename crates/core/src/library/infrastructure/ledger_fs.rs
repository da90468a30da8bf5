use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

/// File operations the ledger save protocol is built from.
///
/// Injected so tests can fail any single step and inspect what is left on disk.
pub trait LedgerFs {
    fn exists(&self, path: &Path) -> bool;

    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Creates or truncates `path`, writes `contents`, and syncs it to stable
    /// storage before returning.
    fn write_durable(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// [`LedgerFs`] on the real filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdLedgerFs;

impl LedgerFs for StdLedgerFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write_durable(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(contents)?;
        file.flush()?;
        file.sync_all()
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}
