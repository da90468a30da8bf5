pub mod config;
pub mod display;
pub mod imaging;
pub mod library;
pub mod player;
pub mod shared;
pub mod video;
