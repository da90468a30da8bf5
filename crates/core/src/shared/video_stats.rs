/// Probe result for one video file.
///
/// `duration` is in milliseconds and derived from the frame count and frame
/// rate, so two probes of the same file always agree bit-for-bit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoStats {
    pub frame_count: u64,
    pub duration: f64,
}

impl VideoStats {
    pub fn new(frame_count: u64, frame_rate: f64) -> Self {
        Self {
            frame_count,
            duration: frames_to_millis(frame_count as f64, frame_rate),
        }
    }
}

/// Converts a (possibly fractional) frame position to milliseconds.
///
/// A non-positive frame rate has no meaningful time axis and maps to 0.
pub fn frames_to_millis(frames: f64, frame_rate: f64) -> f64 {
    if frame_rate > 0.0 && frames > 0.0 {
        frames / frame_rate * 1000.0
    } else {
        0.0
    }
}

/// Converts milliseconds to the index of the frame shown at that time.
pub fn millis_to_frame(millis: f64, frame_rate: f64) -> u64 {
    if frame_rate > 0.0 && millis > 0.0 {
        (millis / 1000.0 * frame_rate).floor() as u64
    } else {
        0
    }
}
