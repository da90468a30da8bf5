use serde::{Deserialize, Serialize};

use crate::library::domain::skip_policy::SkipPolicy;
use crate::shared::video_stats::{frames_to_millis, millis_to_frame, VideoStats};

/// Cached probe result and playback cursors for one video file.
///
/// Field order is the on-disk order in the ledger.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VideoEntry {
    pub frame_count: u64,
    pub duration: f64,
    pub next_frame: u64,
    pub next_timestamp: f64,
}

impl VideoEntry {
    /// A freshly discovered video with both cursors at the start.
    pub fn new(stats: VideoStats) -> Self {
        Self {
            frame_count: stats.frame_count,
            duration: stats.duration,
            next_frame: 0,
            next_timestamp: 0.0,
        }
    }

    pub fn stats(&self) -> VideoStats {
        VideoStats {
            frame_count: self.frame_count,
            duration: self.duration,
        }
    }

    /// Both cursors have reached the end. Either policy may be used on the
    /// next call, so one cursor alone is not enough.
    pub fn is_exhausted(&self) -> bool {
        self.next_frame >= self.frame_count && self.next_timestamp >= self.duration
    }

    pub fn rewind(&mut self) {
        self.next_frame = 0;
        self.next_timestamp = 0.0;
    }

    /// Replaces cached stats when a re-probe disagrees and rewinds.
    ///
    /// Returns whether anything changed.
    pub fn refresh(&mut self, stats: VideoStats) -> bool {
        if self.stats() == stats {
            return false;
        }
        self.frame_count = stats.frame_count;
        self.duration = stats.duration;
        self.rewind();
        true
    }

    /// Moves both cursors past the frame just served.
    pub fn advance(&mut self, skip: SkipPolicy, frame_rate: f64) {
        match skip {
            SkipPolicy::FrameSkip(frames) => {
                self.next_frame += frames;
                self.next_timestamp = frames_to_millis(self.next_frame as f64, frame_rate);
            }
            SkipPolicy::TimeSkip(millis) => {
                self.next_timestamp += millis;
                self.next_frame = millis_to_frame(self.next_timestamp, frame_rate);
            }
        }
    }
}
