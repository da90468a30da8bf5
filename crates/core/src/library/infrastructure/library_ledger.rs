use std::path::{Path, PathBuf};

use crate::library::domain::error::LibraryError;
use crate::library::domain::library::Library;
use crate::library::infrastructure::durable_ledger_writer::{DurableLedgerWriter, DurableWriteError};
use crate::library::infrastructure::ledger_fs::{LedgerFs, StdLedgerFs};
use crate::shared::constants::LEDGER_FILE_NAME;

/// The `videos.json` ledger of one video directory.
pub struct LibraryLedger {
    directory: PathBuf,
    path: PathBuf,
    writer: DurableLedgerWriter,
}

impl LibraryLedger {
    pub fn new(directory: &Path) -> Self {
        Self::with_fs(directory, Box::new(StdLedgerFs))
    }

    pub fn with_fs(directory: &Path, fs: Box<dyn LedgerFs>) -> Self {
        Self {
            directory: directory.to_path_buf(),
            path: directory.join(LEDGER_FILE_NAME),
            writer: DurableLedgerWriter::new(fs),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the ledger. A missing file is an empty library; an unparsable one
    /// is [`LibraryError::LedgerCorrupt`] and is left untouched.
    pub fn load(&self) -> Result<Library, LibraryError> {
        let fs = self.writer.fs();
        if !fs.exists(&self.path) {
            log::info!("No ledger at {}, starting empty", self.path.display());
            return Ok(Library::new());
        }

        let bytes = fs.read(&self.path).map_err(|source| LibraryError::Ledger {
            path: self.path.clone(),
            source,
        })?;
        let library =
            Library::from_ledger_slice(&bytes).map_err(|source| LibraryError::LedgerCorrupt {
                path: self.path.clone(),
                directory: self.directory.clone(),
                source,
            })?;

        log::debug!(
            "Loaded {} entries from {}",
            library.len(),
            self.path.display()
        );
        Ok(library)
    }

    pub fn save(&self, library: &Library) -> Result<(), LibraryError> {
        let text = library
            .to_ledger_text()
            .map_err(|e| LibraryError::Ledger {
                path: self.path.clone(),
                source: e.into(),
            })?;

        self.writer
            .write(&self.path, text.as_bytes())
            .map_err(|e| match e {
                DurableWriteError::Io { path, source } => LibraryError::Ledger { path, source },
                DurableWriteError::Mismatch { path } => {
                    LibraryError::LedgerWriteVerificationFailed {
                        path,
                        directory: self.directory.clone(),
                    }
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::domain::video_entry::VideoEntry;
    use crate::shared::video_stats::VideoStats;

    #[test]
    fn test_missing_ledger_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = LibraryLedger::new(dir.path());
        assert!(ledger.load().unwrap().is_empty());
        assert!(!ledger.path().exists());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = LibraryLedger::new(dir.path());

        let mut library = Library::new();
        library.insert(
            "b.mp4".to_string(),
            VideoEntry::new(VideoStats::new(3, 1.0)),
        );
        library.insert(
            "a.mp4".to_string(),
            VideoEntry::new(VideoStats::new(10, 25.0)),
        );
        ledger.save(&library).unwrap();

        assert_eq!(ledger.load().unwrap(), library);
        assert_eq!(
            std::fs::read_to_string(ledger.path()).unwrap(),
            library.to_ledger_text().unwrap()
        );
    }

    #[test]
    fn test_invalid_json_is_corrupt_and_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = LibraryLedger::new(dir.path());
        std::fs::write(ledger.path(), b"{\"a.mp4\": ").unwrap();

        let err = ledger.load().unwrap_err();
        assert!(matches!(err, LibraryError::LedgerCorrupt { .. }));
        assert_eq!(std::fs::read(ledger.path()).unwrap(), b"{\"a.mp4\": ");
    }

    #[test]
    fn test_invalid_utf8_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = LibraryLedger::new(dir.path());
        std::fs::write(ledger.path(), [0xff, 0xfe, 0x00]).unwrap();

        assert!(matches!(
            ledger.load(),
            Err(LibraryError::LedgerCorrupt { .. })
        ));
    }
}
