use std::fmt;

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum SkipPolicyError {
    #[error("frame skip must be a positive number of frames, got {0}")]
    NonPositiveFrames(i64),
    #[error("time skip must be a positive, finite number of milliseconds, got {0}")]
    NonPositiveMillis(f64),
}

/// How far playback advances after a frame is served.
///
/// Amounts are validated once by [`SkipPolicy::frame_skip`] and
/// [`SkipPolicy::time_skip`]; a constructed policy is always positive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SkipPolicy {
    /// Advance by a whole number of frames.
    FrameSkip(u64),
    /// Advance by a duration in milliseconds.
    TimeSkip(f64),
}

impl SkipPolicy {
    pub fn frame_skip(frames: i64) -> Result<Self, SkipPolicyError> {
        if frames <= 0 {
            return Err(SkipPolicyError::NonPositiveFrames(frames));
        }
        Ok(Self::FrameSkip(frames as u64))
    }

    pub fn time_skip(millis: f64) -> Result<Self, SkipPolicyError> {
        if !millis.is_finite() || millis <= 0.0 {
            return Err(SkipPolicyError::NonPositiveMillis(millis));
        }
        Ok(Self::TimeSkip(millis))
    }
}

impl Default for SkipPolicy {
    fn default() -> Self {
        Self::FrameSkip(1)
    }
}

impl fmt::Display for SkipPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FrameSkip(1) => write!(f, "every frame"),
            Self::FrameSkip(frames) => write!(f, "every {frames} frames"),
            Self::TimeSkip(millis) => write!(f, "every {millis} ms"),
        }
    }
}
