use std::time::Duration;

pub const LEDGER_FILE_NAME: &str = "videos.json";
pub const LEDGER_TEMP_EXTENSION: &str = ".tmp";
pub const LEDGER_BACKUP_EXTENSION: &str = ".bak";

/// Lowercase, without the dot. Matching is case-insensitive.
pub const VIDEO_EXTENSIONS: &[&str] = &["avi", "mkv", "mov", "mp4", "webm"];

pub const CONFIG_FILE_EXTENSION: &str = "conf";
pub const DEFAULT_CONFIG_DIRECTORY: &str = "/etc/slow-movie-player";
pub const DEFAULT_RUNTIME_DIRECTORY: &str = "/tmp";

pub const UPDATE_DISPLAY_PATH: &str = "/opt/slow-movie-player/update-display";
pub const DISPLAY_UPDATE_TIMEOUT: Duration = Duration::from_secs(30);

pub const ENCODED_FRAME_FILE_NAME: &str = "frame.4bpp";
