use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};
use ndarray::s;

use crate::imaging::error::ImageError;
use crate::shared::frame::Frame;

/// Largest size with the frame's aspect ratio that fits `max_width` x
/// `max_height`. The free dimension is rounded to the nearest pixel.
pub fn fitted_size(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let (w, h) = (width as u64, height as u64);
    let (max_w, max_h) = (max_width as u64, max_height as u64);

    if w * max_h <= max_w * h {
        let new_width = (width as f64 * max_height as f64 / height as f64).round() as u32;
        (new_width.max(1), max_height)
    } else {
        let new_height = (height as f64 * max_width as f64 / width as f64).round() as u32;
        (max_width, new_height.max(1))
    }
}

/// Scales the frame to the largest size that fits, keeping its aspect ratio.
///
/// Enlarging uses Catmull-Rom, shrinking uses a triangle filter.
pub fn resize_keeping_aspect_ratio(
    frame: &Frame,
    max_width: u32,
    max_height: u32,
) -> Result<Frame, ImageError> {
    let (width, height) = (frame.width(), frame.height());
    if width == 0 || height == 0 || max_width == 0 || max_height == 0 {
        return Err(ImageError::Empty { width, height });
    }

    let (new_width, new_height) = fitted_size(width, height, max_width, max_height);
    if (new_width, new_height) == (width, height) {
        return Ok(frame.clone());
    }

    let filter = if new_width > width || new_height > height {
        FilterType::CatmullRom
    } else {
        FilterType::Triangle
    };

    let data = match frame.channels() {
        1 => {
            let img = GrayImage::from_raw(width, height, frame.data().to_vec())
                .ok_or(ImageError::Empty { width, height })?;
            imageops::resize(&img, new_width, new_height, filter).into_raw()
        }
        3 => {
            let img = RgbImage::from_raw(width, height, frame.data().to_vec())
                .ok_or(ImageError::Empty { width, height })?;
            imageops::resize(&img, new_width, new_height, filter).into_raw()
        }
        channels => return Err(ImageError::UnsupportedChannels(channels)),
    };

    Ok(Frame::new(
        data,
        new_width,
        new_height,
        frame.channels(),
        frame.index(),
    ))
}

/// Centers the frame on a black `width` x `height` canvas.
pub fn add_padding(frame: &Frame, width: u32, height: u32) -> Result<Frame, ImageError> {
    if frame.width() > width || frame.height() > height {
        return Err(ImageError::DoesNotFit {
            width: frame.width(),
            height: frame.height(),
            target_width: width,
            target_height: height,
        });
    }
    if (frame.width(), frame.height()) == (width, height) {
        return Ok(frame.clone());
    }

    let x = ((width - frame.width()) / 2) as usize;
    let y = ((height - frame.height()) / 2) as usize;
    let (w, h) = (frame.width() as usize, frame.height() as usize);
    let channels = frame.channels();

    let mut canvas = Frame::new(
        vec![0u8; width as usize * height as usize * channels as usize],
        width,
        height,
        channels,
        frame.index(),
    );
    canvas
        .as_ndarray_mut()
        .slice_mut(s![y..y + h, x..x + w, ..])
        .assign(&frame.as_ndarray());
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn white(width: u32, height: u32, channels: u8) -> Frame {
        let len = width as usize * height as usize * channels as usize;
        Frame::new(vec![0xff; len], width, height, channels, 0)
    }

    #[rstest]
    #[case::same_ratio_enlarge((4, 3), (16, 12), (16, 12))]
    #[case::same_ratio_shrink((1024, 768), (800, 600), (800, 600))]
    #[case::width_limits((18, 32), (9, 24), (9, 16))]
    #[case::height_limits_with_rounding((36, 64), (1000, 72), (41, 72))]
    #[case::square_into_tall((10, 10), (100, 1000), (100, 100))]
    #[case::square_into_wide((3, 3), (300, 30), (30, 30))]
    #[case::square_shrink((9, 9), (4, 2), (2, 2))]
    #[case::landscape_rounds_up((640, 241), (1872, 1404), (1872, 705))]
    #[case::unchanged((457, 193), (457, 193), (457, 193))]
    fn test_fitted_size(
        #[case] size: (u32, u32),
        #[case] max: (u32, u32),
        #[case] expected: (u32, u32),
    ) {
        assert_eq!(fitted_size(size.0, size.1, max.0, max.1), expected);
    }

    #[rstest]
    #[case::rgb(3)]
    #[case::gray(1)]
    fn test_resize_output_shape(#[case] channels: u8) {
        let resized = resize_keeping_aspect_ratio(&white(640, 241, channels), 1872, 1404).unwrap();
        assert_eq!((resized.width(), resized.height()), (1872, 705));
        assert_eq!(resized.channels(), channels);
        assert_eq!(resized.data().len(), 1872 * 705 * channels as usize);
    }

    #[test]
    fn test_resize_keeps_flat_color() {
        let resized = resize_keeping_aspect_ratio(&white(8, 6, 3), 80, 60).unwrap();
        assert!(resized.data().iter().all(|&v| v == 0xff));
    }

    #[test]
    fn test_resize_same_size_is_identity() {
        let frame = Frame::new(vec![1, 2, 3, 4], 2, 2, 1, 9);
        assert_eq!(resize_keeping_aspect_ratio(&frame, 2, 2).unwrap(), frame);
    }

    #[test]
    fn test_resize_rejects_empty_and_unsupported() {
        let empty = Frame::new(Vec::new(), 0, 4, 3, 0);
        assert!(matches!(
            resize_keeping_aspect_ratio(&empty, 10, 10),
            Err(ImageError::Empty { .. })
        ));
        let rgba = Frame::new(vec![0; 16], 2, 2, 4, 0);
        assert_eq!(
            resize_keeping_aspect_ratio(&rgba, 4, 4),
            Err(ImageError::UnsupportedChannels(4))
        );
    }

    #[test]
    fn test_padding_centers_rgb() {
        let padded = add_padding(&white(1, 1, 3), 3, 3).unwrap();
        let mut expected = vec![0u8; 27];
        expected[12..15].copy_from_slice(&[0xff, 0xff, 0xff]);
        assert_eq!(padded.data(), &expected[..]);
    }

    #[rstest]
    #[case::horizontal((3, 1), vec![0x00, 0xff, 0x00])]
    #[case::vertical((1, 3), vec![0x00, 0xff, 0x00])]
    #[case::uneven_split((4, 1), vec![0x00, 0xff, 0x00, 0x00])]
    fn test_padding_gray(#[case] size: (u32, u32), #[case] expected: Vec<u8>) {
        let padded = add_padding(&white(1, 1, 1), size.0, size.1).unwrap();
        assert_eq!((padded.width(), padded.height()), size);
        assert_eq!(padded.data(), &expected[..]);
    }

    #[test]
    fn test_padding_not_needed() {
        let frame = white(3, 3, 1);
        assert_eq!(add_padding(&frame, 3, 3).unwrap(), frame);
    }

    #[test]
    fn test_padding_rejects_larger_frame() {
        assert!(matches!(
            add_padding(&white(4, 4, 1), 3, 5),
            Err(ImageError::DoesNotFit { .. })
        ));
    }
}
