use std::path::{Path, PathBuf};

use crate::shared::frame::Frame;
use crate::shared::video_stats::{millis_to_frame, VideoStats};
use crate::video::domain::video_source::{
    FramePosition, VideoOpener, VideoSource, VideoSourceError,
};

const AV_TIME_BASE: f64 = 1_000_000.0;

/// Opens videos with [`FfmpegSource`].
#[derive(Clone, Copy, Debug, Default)]
pub struct FfmpegOpener;

impl VideoOpener for FfmpegOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn VideoSource>, VideoSourceError> {
        Ok(Box::new(FfmpegSource::open(path)?))
    }
}

/// Random-access frame reader backed by ffmpeg-next (libavformat + libavcodec).
///
/// Each `frame_at` call seeks to the nearest keyframe before the target,
/// decodes forward until the target frame, and converts it to RGB24. The
/// demuxer is closed when the source is dropped.
pub struct FfmpegSource {
    path: PathBuf,
    input_ctx: ffmpeg_next::format::context::Input,
    video_stream_index: usize,
    time_base: ffmpeg_next::Rational,
    start_pts: i64,
    frame_rate: f64,
    stats: VideoStats,
}

impl FfmpegSource {
    pub fn open(path: &Path) -> Result<Self, VideoSourceError> {
        let open_error = |reason: String| VideoSourceError::Open {
            path: path.to_path_buf(),
            reason,
        };

        ffmpeg_next::init().map_err(|e| open_error(e.to_string()))?;
        let ictx = ffmpeg_next::format::input(path).map_err(|e| open_error(e.to_string()))?;

        let (video_stream_index, time_base, start_pts, frame_rate, frame_count) = {
            let stream = ictx
                .streams()
                .best(ffmpeg_next::media::Type::Video)
                .ok_or_else(|| open_error("no video stream found".to_string()))?;

            let time_base = stream.time_base();
            let frame_rate = stream_frame_rate(&stream);
            let start_pts = match stream.start_time() {
                ffmpeg_next::ffi::AV_NOPTS_VALUE => 0,
                pts => pts,
            };
            let frame_count = stream_frame_count(&stream, ictx.duration(), frame_rate);
            (stream.index(), time_base, start_pts, frame_rate, frame_count)
        };

        log::debug!(
            "Opened {}: {frame_count} frames at {frame_rate:.3} fps",
            path.display()
        );

        Ok(Self {
            path: path.to_path_buf(),
            input_ctx: ictx,
            video_stream_index,
            time_base,
            start_pts,
            frame_rate,
            stats: VideoStats::new(frame_count, frame_rate),
        })
    }

    /// Decodes forward until the frame numbered `target`.
    ///
    /// Returns `Ok(None)` when the stream ends first.
    fn decode_frame(&mut self, target: u64) -> Result<Option<Frame>, ffmpeg_next::Error> {
        let mut decoder = {
            let stream = self
                .input_ctx
                .stream(self.video_stream_index)
                .ok_or(ffmpeg_next::Error::StreamNotFound)?;
            let codec_ctx =
                ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
            codec_ctx.decoder().video()?
        };

        let width = decoder.width();
        let height = decoder.height();
        let mut scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        let mut numbering = FrameNumbering {
            time_base: self.time_base,
            start_pts: self.start_pts,
            frame_rate: self.frame_rate,
            seeked: self.frame_rate > 0.0 && target > 0,
            counter: 0,
        };

        // Earlier reads leave the demuxer mid-stream, so every read seeks:
        // near the target when the frame rate allows, else to the start.
        let start_us = pts_to_seconds(self.start_pts, self.time_base) * AV_TIME_BASE;
        let offset_us = if numbering.seeked {
            target as f64 / self.frame_rate * AV_TIME_BASE
        } else {
            0.0
        };
        let ts = (start_us + offset_us) as i64;
        self.input_ctx.seek(ts, ..ts)?;

        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();

        for (stream, packet) in self.input_ctx.packets() {
            if stream.index() != self.video_stream_index {
                continue;
            }
            if decoder.send_packet(&packet).is_err() {
                continue;
            }
            while decoder.receive_frame(&mut decoded).is_ok() {
                let number = numbering.next(&decoded, target);
                if number >= target {
                    return to_rgb_frame(&mut scaler, &decoded, width, height, number).map(Some);
                }
            }
        }

        decoder.send_eof()?;
        while decoder.receive_frame(&mut decoded).is_ok() {
            let number = numbering.next(&decoded, target);
            if number >= target {
                return to_rgb_frame(&mut scaler, &decoded, width, height, number).map(Some);
            }
        }

        Ok(None)
    }
}

impl VideoSource for FfmpegSource {
    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    fn stats(&self) -> VideoStats {
        self.stats
    }

    fn frame_at(&mut self, position: FramePosition) -> Result<Frame, VideoSourceError> {
        let target = match position {
            FramePosition::Index(index) => index,
            FramePosition::Timestamp(millis) => millis_to_frame(millis, self.frame_rate),
        };

        let read_error = |reason: String| VideoSourceError::FrameRead {
            path: self.path.clone(),
            position,
            reason,
        };

        match self.decode_frame(target) {
            Ok(Some(frame)) => Ok(frame),
            Ok(None) => Err(read_error("end of stream reached".to_string())),
            Err(e) => Err(read_error(e.to_string())),
        }
    }
}

/// Assigns frame numbers to decoded frames.
///
/// Presentation timestamps are authoritative. Without a usable time axis the
/// decode order from the start of the stream is used instead.
struct FrameNumbering {
    time_base: ffmpeg_next::Rational,
    start_pts: i64,
    frame_rate: f64,
    seeked: bool,
    counter: u64,
}

impl FrameNumbering {
    fn next(&mut self, decoded: &ffmpeg_next::util::frame::video::Video, target: u64) -> u64 {
        let sequential = self.counter;
        self.counter += 1;

        let pts = decoded.timestamp().or_else(|| decoded.pts());
        match pts {
            Some(pts) if self.frame_rate > 0.0 => {
                let seconds = pts_to_seconds(pts - self.start_pts, self.time_base);
                (seconds * self.frame_rate).round().max(0.0) as u64
            }
            _ if !self.seeked => sequential,
            // After a seek without timestamps the position is unknown; the
            // first frame out is the best available answer.
            _ => target,
        }
    }
}

fn pts_to_seconds(pts: i64, time_base: ffmpeg_next::Rational) -> f64 {
    if time_base.denominator() == 0 {
        return 0.0;
    }
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

fn rational_to_f64(rate: ffmpeg_next::Rational) -> f64 {
    if rate.denominator() != 0 && rate.numerator() > 0 {
        rate.numerator() as f64 / rate.denominator() as f64
    } else {
        0.0
    }
}

/// Average frame rate, falling back to the container's guessed base rate.
fn stream_frame_rate(stream: &ffmpeg_next::format::stream::Stream) -> f64 {
    match rational_to_f64(stream.avg_frame_rate()) {
        fps if fps > 0.0 => fps,
        _ => rational_to_f64(stream.rate()),
    }
}

/// Frame count from the container index, estimated from the duration when the
/// container does not record it (Matroska, WebM).
fn stream_frame_count(
    stream: &ffmpeg_next::format::stream::Stream,
    container_duration: i64,
    frame_rate: f64,
) -> u64 {
    if stream.frames() > 0 {
        return stream.frames() as u64;
    }

    let seconds = if stream.duration() > 0 {
        pts_to_seconds(stream.duration(), stream.time_base())
    } else if container_duration > 0 {
        container_duration as f64 / AV_TIME_BASE
    } else {
        0.0
    };

    (seconds * frame_rate).round().max(0.0) as u64
}

fn to_rgb_frame(
    scaler: &mut ffmpeg_next::software::scaling::Context,
    decoded: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
    index: u64,
) -> Result<Frame, ffmpeg_next::Error> {
    let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
    scaler.run(decoded, &mut rgb_frame)?;
    let pixels = extract_rgb_pixels(&rgb_frame, width, height);
    Ok(Frame::new(pixels, width, height, 3, index))
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer.
///
/// ffmpeg frames may have padding bytes at the end of each row (stride > width*3).
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Encodes `num_frames` flat gray MPEG-4 frames; frame `i` has value `i * 40`.
    pub(crate) fn create_test_video(
        path: &Path,
        num_frames: usize,
        width: u32,
        height: u32,
        fps: i32,
    ) {
        ffmpeg_next::init().unwrap();

        let mut octx = ffmpeg_next::format::output(path).unwrap();

        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4).unwrap();
        let mut ost = octx.add_stream(Some(codec)).unwrap();

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .unwrap();

        encoder_ctx.set_width(width);
        encoder_ctx.set_height(height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(ffmpeg_next::Rational(1, fps));
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(fps, 1)));

        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let mut encoder = encoder_ctx
            .open_with(ffmpeg_next::Dictionary::new())
            .unwrap();
        ost.set_parameters(&encoder);

        octx.write_header().unwrap();

        let ost_time_base = octx.stream(0).unwrap().time_base();

        let mut scaler = ffmpeg_next::software::scaling::Context::get(
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::format::Pixel::YUV420P,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .unwrap();

        for i in 0..num_frames {
            let mut rgb_frame = ffmpeg_next::util::frame::video::Video::new(
                ffmpeg_next::format::Pixel::RGB24,
                width,
                height,
            );
            let stride = rgb_frame.stride(0);
            let data = rgb_frame.data_mut(0);
            let value = ((i * 40) % 256) as u8;
            for row in 0..height as usize {
                for col in 0..width as usize {
                    let offset = row * stride + col * 3;
                    data[offset] = value;
                    data[offset + 1] = value;
                    data[offset + 2] = value;
                }
            }

            let mut yuv_frame = ffmpeg_next::util::frame::video::Video::empty();
            scaler.run(&rgb_frame, &mut yuv_frame).unwrap();
            yuv_frame.set_pts(Some(i as i64));

            encoder.send_frame(&yuv_frame).unwrap();

            let mut encoded = ffmpeg_next::Packet::empty();
            while encoder.receive_packet(&mut encoded).is_ok() {
                encoded.set_stream(0);
                encoded.rescale_ts(ffmpeg_next::Rational(1, fps), ost_time_base);
                encoded.write_interleaved(&mut octx).unwrap();
            }
        }

        encoder.send_eof().unwrap();
        let mut encoded = ffmpeg_next::Packet::empty();
        while encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(0);
            encoded.rescale_ts(ffmpeg_next::Rational(1, fps), ost_time_base);
            encoded.write_interleaved(&mut octx).unwrap();
        }

        octx.write_trailer().unwrap();
    }

    fn mean(frame: &Frame) -> f64 {
        frame.data().iter().map(|&v| v as f64).sum::<f64>() / frame.data().len() as f64
    }

    #[test]
    fn test_open_reports_stats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.mp4");
        create_test_video(&path, 5, 160, 120, 10);

        let source = FfmpegSource::open(&path).unwrap();
        assert_relative_eq!(source.frame_rate(), 10.0, epsilon = 0.01);
        let stats = source.stats();
        assert_eq!(stats.frame_count, 5);
        assert_relative_eq!(stats.duration, 500.0, epsilon = 1.0);
    }

    #[test]
    fn test_open_nonexistent_fails() {
        let result = FfmpegSource::open(Path::new("/nonexistent/test.mp4"));
        assert!(matches!(result, Err(VideoSourceError::Open { .. })));
    }

    #[test]
    fn test_opener_returns_boxed_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.mp4");
        create_test_video(&path, 3, 64, 48, 10);

        let source = FfmpegOpener.open(&path).unwrap();
        assert_eq!(source.stats().frame_count, 3);
    }

    #[test]
    fn test_frame_at_index_is_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.mp4");
        create_test_video(&path, 5, 160, 120, 10);

        let mut source = FfmpegSource::open(&path).unwrap();
        let frame = source.frame_at(FramePosition::Index(0)).unwrap();
        assert_eq!(frame.width(), 160);
        assert_eq!(frame.height(), 120);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.data().len(), 160 * 120 * 3);
    }

    #[test]
    fn test_frame_at_index_decodes_requested_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.mp4");
        create_test_video(&path, 5, 160, 120, 10);

        let mut source = FfmpegSource::open(&path).unwrap();
        let frame = source.frame_at(FramePosition::Index(3)).unwrap();
        assert_eq!(frame.index(), 3);
        assert_relative_eq!(mean(&frame), 120.0, epsilon = 10.0);
    }

    #[test]
    fn test_frame_at_timestamp_decodes_frame_shown_at_that_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.mp4");
        create_test_video(&path, 5, 160, 120, 10);

        let mut source = FfmpegSource::open(&path).unwrap();
        // 10 fps: 250 ms falls inside frame 2.
        let frame = source.frame_at(FramePosition::Timestamp(250.0)).unwrap();
        assert_eq!(frame.index(), 2);
        assert_relative_eq!(mean(&frame), 80.0, epsilon = 10.0);
    }

    #[test]
    fn test_frame_at_past_end_is_frame_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.mp4");
        create_test_video(&path, 3, 64, 48, 10);

        let mut source = FfmpegSource::open(&path).unwrap();
        let result = source.frame_at(FramePosition::Index(10));
        assert!(matches!(
            result,
            Err(VideoSourceError::FrameRead {
                position: FramePosition::Index(10),
                ..
            })
        ));
    }

    #[test]
    fn test_repeated_reads_on_one_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.mp4");
        create_test_video(&path, 5, 64, 48, 10);

        let mut source = FfmpegSource::open(&path).unwrap();
        assert_eq!(source.frame_at(FramePosition::Index(4)).unwrap().index(), 4);
        assert_eq!(source.frame_at(FramePosition::Index(1)).unwrap().index(), 1);
    }

    #[test]
    fn test_first_frame_after_later_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.mp4");
        create_test_video(&path, 5, 64, 48, 10);

        let mut source = FfmpegSource::open(&path).unwrap();
        assert_eq!(source.frame_at(FramePosition::Index(4)).unwrap().index(), 4);

        let first = source.frame_at(FramePosition::Index(0)).unwrap();
        assert_eq!(first.index(), 0);
        assert_relative_eq!(mean(&first), 0.0, epsilon = 10.0);

        let early = source.frame_at(FramePosition::Timestamp(40.0)).unwrap();
        assert_eq!(early.index(), 0);
    }

    #[test]
    fn test_rational_to_f64_handles_zero_denominator() {
        assert_eq!(rational_to_f64(ffmpeg_next::Rational(30, 0)), 0.0);
        assert_relative_eq!(rational_to_f64(ffmpeg_next::Rational(30000, 1001)), 29.97, epsilon = 0.01);
    }
}
