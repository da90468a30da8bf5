use ndarray::Array2;

use crate::imaging::error::ImageError;
use crate::imaging::grayscale_method::GrayscaleMethod;
use crate::shared::frame::Frame;

/// Gray levels the panel can show: `0x00, 0x11, ..., 0xff`.
pub const LEVEL_STEP: f32 = 17.0;

/// Converts to gray with `method`, then quantizes to 16 levels with
/// Floyd-Steinberg error diffusion. Returns a single-channel frame.
pub fn dither_4bpp(frame: &Frame, method: GrayscaleMethod) -> Result<Frame, ImageError> {
    let mut gray = to_gray(frame, method)?;
    let (height, width) = gray.dim();
    let mut out = Vec::with_capacity(width * height);

    for y in 0..height {
        for x in 0..width {
            let old = gray[[y, x]].clamp(0.0, 255.0);
            let new = (old / LEVEL_STEP).round() * LEVEL_STEP;
            out.push(new as u8);

            let error = old - new;
            if x + 1 < width {
                gray[[y, x + 1]] += error * 7.0 / 16.0;
            }
            if y + 1 < height {
                if x > 0 {
                    gray[[y + 1, x - 1]] += error * 3.0 / 16.0;
                }
                gray[[y + 1, x]] += error * 5.0 / 16.0;
                if x + 1 < width {
                    gray[[y + 1, x + 1]] += error / 16.0;
                }
            }
        }
    }

    Ok(Frame::new(
        out,
        frame.width(),
        frame.height(),
        1,
        frame.index(),
    ))
}

fn to_gray(frame: &Frame, method: GrayscaleMethod) -> Result<Array2<f32>, ImageError> {
    let pixels = frame.as_ndarray();
    let shape = (frame.height() as usize, frame.width() as usize);
    match frame.channels() {
        1 => Ok(pixels.index_axis(ndarray::Axis(2), 0).mapv(|v| v as f32)),
        3 => Ok(Array2::from_shape_fn(shape, |(y, x)| {
            method.gray(pixels[[y, x, 0]], pixels[[y, x, 1]], pixels[[y, x, 2]])
        })),
        channels => Err(ImageError::UnsupportedChannels(channels)),
    }
}
