pub mod ffmpeg_source;
