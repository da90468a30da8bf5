use std::path::{Path, PathBuf};

use rand::Rng;

use crate::library::domain::error::LibraryError;
use crate::library::domain::library::Library;
use crate::library::domain::skip_policy::SkipPolicy;
use crate::library::domain::video_entry::VideoEntry;
use crate::library::infrastructure::library_ledger::LibraryLedger;
use crate::library::infrastructure::video_scanner::scan_videos;
use crate::shared::frame::Frame;
use crate::video::domain::video_source::{FramePosition, VideoOpener};

/// Resumable playback over every video in a directory.
///
/// Construction loads the directory's ledger, reconciles it with the files on
/// disk and saves it. Every served frame is persisted before it is returned,
/// so after a restart playback continues with the next unseen frame.
///
/// Filesystem changes are picked up only by constructing a new instance. Two
/// instances must not share a directory: the ledger is not locked.
pub struct VideoLibrary {
    directory: PathBuf,
    opener: Box<dyn VideoOpener>,
    ledger: LibraryLedger,
    library: Library,
}

impl VideoLibrary {
    pub fn new(directory: &Path, opener: Box<dyn VideoOpener>) -> Result<Self, LibraryError> {
        Self::with_ledger(directory, opener, LibraryLedger::new(directory))
    }

    pub fn with_ledger(
        directory: &Path,
        opener: Box<dyn VideoOpener>,
        ledger: LibraryLedger,
    ) -> Result<Self, LibraryError> {
        if !directory.is_dir() {
            return Err(LibraryError::DirectoryNotFound(directory.to_path_buf()));
        }

        let library = ledger.load()?;
        let mut video_library = Self {
            directory: directory.to_path_buf(),
            opener,
            ledger,
            library,
        };
        video_library.discover()?;
        Ok(video_library)
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn ledger_path(&self) -> &Path {
        self.ledger.path()
    }

    /// Serves the next unseen frame and advances playback by `skip`.
    ///
    /// Entries are played in ledger order. When the last entry is exhausted
    /// the whole library is rewound, saved, and selection runs once more.
    pub fn get_next_frame(&mut self, skip: SkipPolicy) -> Result<Frame, LibraryError> {
        if self.library.is_empty() {
            return Err(LibraryError::EmptyLibrary);
        }

        let position = match self.next_playable() {
            Some(position) => position,
            None => {
                log::info!("Reached the end of the library, starting over");
                self.library.rewind_all();
                self.ledger.save(&self.library)?;
                self.next_playable().ok_or(LibraryError::NoPlayableFrames)?
            }
        };
        self.serve(position, skip)
    }

    /// A uniformly random frame of a uniformly random video. Playback state
    /// is neither read nor changed.
    pub fn get_random_frame(&self) -> Result<Frame, LibraryError> {
        self.get_random_frame_with(&mut rand::rng())
    }

    pub fn get_random_frame_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Frame, LibraryError> {
        if self.library.is_empty() {
            return Err(LibraryError::EmptyLibrary);
        }

        let position = rng.random_range(0..self.library.len());
        let (path, entry) = self
            .library
            .get_index(position)
            .ok_or(LibraryError::EmptyLibrary)?;
        if entry.frame_count == 0 {
            return Err(LibraryError::NoPlayableFrames);
        }

        let index = rng.random_range(0..entry.frame_count);
        log::info!("Serving random frame {index} of {path}");
        let mut source = self.opener.open(Path::new(path))?;
        Ok(source.frame_at(FramePosition::Index(index))?)
    }

    /// Brings the ledger in line with the directory and saves it.
    ///
    /// Entries whose file is gone are dropped, changed files are rewound, and
    /// new files are appended in sorted order. Existing entries keep their
    /// position.
    fn discover(&mut self) -> Result<(), LibraryError> {
        for path in self.library.retain(|path, _| Path::new(path).is_file()) {
            log::info!("Removed missing video {path}");
        }

        let found = scan_videos(&self.directory);
        for path in found {
            let stats = self.opener.open(Path::new(&path))?.stats();
            match self.library.get_mut(&path) {
                Some(entry) => {
                    if entry.refresh(stats) {
                        log::info!(
                            "Video {path} changed ({} frames), restarting it",
                            stats.frame_count
                        );
                    }
                }
                None => {
                    log::info!("Added video {path} ({} frames)", stats.frame_count);
                    self.library.insert(path, VideoEntry::new(stats));
                }
            }
        }

        self.ledger.save(&self.library)?;
        log::info!(
            "Library {} has {} videos",
            self.directory.display(),
            self.library.len()
        );
        Ok(())
    }

    /// Position of the first entry that is not exhausted, scanning in ledger
    /// order. `None` means the scan ran past the last entry.
    fn next_playable(&self) -> Option<usize> {
        self.library.iter().position(|(_, entry)| !entry.is_exhausted())
    }

    fn serve(&mut self, position: usize, skip: SkipPolicy) -> Result<Frame, LibraryError> {
        let (path, entry) = self
            .library
            .get_index_mut(position)
            .ok_or(LibraryError::EmptyLibrary)?;

        let mut source = self.opener.open(Path::new(path))?;
        let requested = match skip {
            SkipPolicy::FrameSkip(_) => FramePosition::Index(entry.next_frame),
            SkipPolicy::TimeSkip(_) => FramePosition::Timestamp(entry.next_timestamp),
        };
        let frame = source.frame_at(requested)?;
        log::info!("Serving {requested} of {path}");

        entry.advance(skip, source.frame_rate());
        self.ledger.save(&self.library)?;
        Ok(frame)
    }
}
