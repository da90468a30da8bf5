pub mod error;
pub mod library;
pub mod skip_policy;
pub mod video_entry;
