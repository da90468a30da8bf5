use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::display::domain::display_updater::{DisplayError, DisplayUpdater};
use crate::imaging::error::ImageError;
use crate::imaging::frame_encoder::FrameEncoder;
use crate::library::domain::error::LibraryError;
use crate::library::domain::skip_policy::SkipPolicy;
use crate::library::video_library::VideoLibrary;
use crate::shared::constants::ENCODED_FRAME_FILE_NAME;

#[derive(Error, Debug)]
pub enum PlayerError {
    #[error(transparent)]
    Library(#[from] LibraryError),
    #[error(transparent)]
    Image(#[from] ImageError),
    #[error(transparent)]
    Display(#[from] DisplayError),
    #[error("cannot write encoded frame '{path}': {source}")]
    WriteFrame {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Shows one frame per refresh: select → encode → write → display.
pub struct SlowMoviePlayer {
    library: VideoLibrary,
    encoder: Box<dyn FrameEncoder>,
    display: Box<dyn DisplayUpdater>,
    frame_path: PathBuf,
    skip: SkipPolicy,
    random_frame: bool,
    refresh_timeout: Duration,
}

impl SlowMoviePlayer {
    /// The encoded frame is written to `runtime_directory/frame.4bpp`.
    pub fn new(
        library: VideoLibrary,
        encoder: Box<dyn FrameEncoder>,
        display: Box<dyn DisplayUpdater>,
        runtime_directory: &Path,
    ) -> Self {
        Self {
            library,
            encoder,
            display,
            frame_path: runtime_directory.join(ENCODED_FRAME_FILE_NAME),
            skip: SkipPolicy::default(),
            random_frame: false,
            refresh_timeout: Duration::ZERO,
        }
    }

    pub fn with_skip(mut self, skip: SkipPolicy) -> Self {
        self.skip = skip;
        self
    }

    pub fn with_random_frame(mut self, random_frame: bool) -> Self {
        self.random_frame = random_frame;
        self
    }

    pub fn with_refresh_timeout(mut self, refresh_timeout: Duration) -> Self {
        self.refresh_timeout = refresh_timeout;
        self
    }

    pub fn frame_path(&self) -> &Path {
        &self.frame_path
    }

    pub fn library(&self) -> &VideoLibrary {
        &self.library
    }

    pub fn tick(&mut self) -> Result<(), PlayerError> {
        let frame = if self.random_frame {
            self.library.get_random_frame()?
        } else {
            self.library.get_next_frame(self.skip)?
        };

        let encoded = self.encoder.encode(&frame)?;
        fs::write(&self.frame_path, encoded).map_err(|source| PlayerError::WriteFrame {
            path: self.frame_path.clone(),
            source,
        })?;
        self.display.update(&self.frame_path)?;
        Ok(())
    }

    /// Ticks until one fails. Each tick starts `refresh_timeout` after the
    /// previous one started, or right away if that tick took longer.
    pub fn run(&mut self) -> Result<(), PlayerError> {
        loop {
            let started = Instant::now();
            self.tick()?;
            let remaining = self.refresh_timeout.saturating_sub(started.elapsed());
            if !remaining.is_zero() {
                log::debug!("Next frame in {:.1}s", remaining.as_secs_f64());
                std::thread::sleep(remaining);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::frame::Frame;
    use crate::shared::video_stats::VideoStats;
    use crate::video::domain::video_source::{
        FramePosition, VideoOpener, VideoSource, VideoSourceError,
    };
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    /// Every video has `frame_count` 1x1 frames whose pixel is the index.
    struct CountingOpener {
        frame_count: u64,
    }

    impl VideoOpener for CountingOpener {
        fn open(&self, _path: &Path) -> Result<Box<dyn VideoSource>, VideoSourceError> {
            Ok(Box::new(CountingSource {
                frame_count: self.frame_count,
            }))
        }
    }

    struct CountingSource {
        frame_count: u64,
    }

    impl VideoSource for CountingSource {
        fn frame_rate(&self) -> f64 {
            10.0
        }

        fn stats(&self) -> VideoStats {
            VideoStats::new(self.frame_count, 10.0)
        }

        fn frame_at(&mut self, position: FramePosition) -> Result<Frame, VideoSourceError> {
            let index = match position {
                FramePosition::Index(index) => index,
                FramePosition::Timestamp(millis) => (millis / 100.0) as u64,
            };
            Ok(Frame::new(vec![index as u8], 1, 1, 1, index))
        }
    }

    /// Encodes a frame as its single pixel value.
    struct PixelEncoder;

    impl FrameEncoder for PixelEncoder {
        fn encode(&self, frame: &Frame) -> Result<Vec<u8>, ImageError> {
            Ok(frame.data().to_vec())
        }
    }

    struct FailingEncoder;

    impl FrameEncoder for FailingEncoder {
        fn encode(&self, _frame: &Frame) -> Result<Vec<u8>, ImageError> {
            Err(ImageError::OddPixelCount {
                width: 1,
                height: 1,
            })
        }
    }

    /// Records the file contents seen on each update and fails after
    /// `fail_after` successful updates.
    struct RecordingDisplay {
        shown: Arc<Mutex<Vec<Vec<u8>>>>,
        fail_after: usize,
    }

    impl RecordingDisplay {
        fn new(fail_after: usize) -> Self {
            Self {
                shown: Arc::new(Mutex::new(Vec::new())),
                fail_after,
            }
        }
    }

    impl DisplayUpdater for RecordingDisplay {
        fn update(&mut self, frame_path: &Path) -> Result<(), DisplayError> {
            let mut shown = self.shown.lock().unwrap();
            if shown.len() >= self.fail_after {
                return Err(DisplayError::Failed {
                    code: Some(1),
                    output: "panel busy".to_string(),
                });
            }
            shown.push(fs::read(frame_path).unwrap());
            Ok(())
        }

        fn clear(&mut self) -> Result<(), DisplayError> {
            Ok(())
        }
    }

    // --- Helpers ---

    fn library_with_one_video(dir: &Path, frame_count: u64) -> VideoLibrary {
        let videos = dir.join("videos");
        fs::create_dir(&videos).unwrap();
        fs::write(videos.join("movie.mp4"), b"").unwrap();
        VideoLibrary::new(&videos, Box::new(CountingOpener { frame_count })).unwrap()
    }

    // --- Tests ---

    #[test]
    fn test_tick_writes_frame_and_updates_display() {
        let dir = tempfile::tempdir().unwrap();
        let display = RecordingDisplay::new(usize::MAX);
        let shown = display.shown.clone();

        let mut player = SlowMoviePlayer::new(
            library_with_one_video(dir.path(), 10),
            Box::new(PixelEncoder),
            Box::new(display),
            dir.path(),
        )
        .with_skip(SkipPolicy::FrameSkip(3));

        player.tick().unwrap();
        player.tick().unwrap();

        assert_eq!(player.frame_path(), dir.path().join("frame.4bpp"));
        assert_eq!(*shown.lock().unwrap(), vec![vec![0], vec![3]]);
        assert_eq!(fs::read(player.frame_path()).unwrap(), vec![3]);
    }

    #[test]
    fn test_random_tick_leaves_playback_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let display = RecordingDisplay::new(usize::MAX);
        let shown = display.shown.clone();

        let mut player = SlowMoviePlayer::new(
            library_with_one_video(dir.path(), 5),
            Box::new(PixelEncoder),
            Box::new(display),
            dir.path(),
        )
        .with_random_frame(true);

        for _ in 0..4 {
            player.tick().unwrap();
        }

        assert!(shown.lock().unwrap().iter().all(|f| f[0] < 5));
        let (_, entry) = player.library().library().get_index(0).unwrap();
        assert_eq!(entry.next_frame, 0);
    }

    #[test]
    fn test_encoder_failure_skips_display() {
        let dir = tempfile::tempdir().unwrap();
        let display = RecordingDisplay::new(usize::MAX);
        let shown = display.shown.clone();

        let mut player = SlowMoviePlayer::new(
            library_with_one_video(dir.path(), 5),
            Box::new(FailingEncoder),
            Box::new(display),
            dir.path(),
        );

        assert!(matches!(player.tick(), Err(PlayerError::Image(_))));
        assert!(shown.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unwritable_runtime_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut player = SlowMoviePlayer::new(
            library_with_one_video(dir.path(), 5),
            Box::new(PixelEncoder),
            Box::new(RecordingDisplay::new(usize::MAX)),
            &dir.path().join("missing"),
        );

        assert!(matches!(
            player.tick(),
            Err(PlayerError::WriteFrame { .. })
        ));
    }

    #[test]
    fn test_run_stops_at_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        let display = RecordingDisplay::new(3);
        let shown = display.shown.clone();

        let mut player = SlowMoviePlayer::new(
            library_with_one_video(dir.path(), 2),
            Box::new(PixelEncoder),
            Box::new(display),
            dir.path(),
        );

        let err = player.run().unwrap_err();

        assert!(matches!(err, PlayerError::Display(DisplayError::Failed { .. })));
        // Two frames, then the library wraps around.
        assert_eq!(*shown.lock().unwrap(), vec![vec![0], vec![1], vec![0]]);
    }

    #[test]
    fn test_run_waits_for_refresh_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let mut player = SlowMoviePlayer::new(
            library_with_one_video(dir.path(), 5),
            Box::new(PixelEncoder),
            Box::new(RecordingDisplay::new(2)),
            dir.path(),
        )
        .with_refresh_timeout(Duration::from_millis(100));

        let started = Instant::now();
        assert!(player.run().is_err());
        assert!(started.elapsed() >= Duration::from_millis(200));
    }
}
