pub mod constants;
pub mod frame;
pub mod video_stats;
