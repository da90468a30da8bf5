use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::frame::Frame;
use crate::shared::video_stats::VideoStats;

/// Where to read a frame from: a frame index or a timestamp in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FramePosition {
    Index(u64),
    Timestamp(f64),
}

impl fmt::Display for FramePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FramePosition::Index(index) => write!(f, "frame {index}"),
            FramePosition::Timestamp(millis) => write!(f, "{millis} ms"),
        }
    }
}

#[derive(Error, Debug)]
pub enum VideoSourceError {
    #[error("cannot open video '{path}': {reason}")]
    Open { path: PathBuf, reason: String },
    #[error("cannot read {position} from video '{path}': {reason}")]
    FrameRead {
        path: PathBuf,
        position: FramePosition,
        reason: String,
    },
}

/// One opened video file.
///
/// The decoder handle is owned by the implementation and released when the
/// value is dropped, so every exit path of a caller releases it.
pub trait VideoSource {
    fn frame_rate(&self) -> f64;

    fn stats(&self) -> VideoStats;

    /// Decodes the frame at `position` into a 3-channel RGB frame.
    ///
    /// Fails with [`VideoSourceError::FrameRead`] when the decoder cannot
    /// produce a frame there (past the end, corrupt data); never returns an
    /// empty frame instead.
    fn frame_at(&mut self, position: FramePosition) -> Result<Frame, VideoSourceError>;
}

/// Opens video files. Injected into the library so tests can fake decoding.
pub trait VideoOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn VideoSource>, VideoSourceError>;
}
