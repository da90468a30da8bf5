use crate::imaging::dithering::dither_4bpp;
use crate::imaging::error::ImageError;
use crate::imaging::four_bpp::encode_4bpp;
use crate::imaging::grayscale_method::GrayscaleMethod;
use crate::imaging::transform::{add_padding, resize_keeping_aspect_ratio};
use crate::shared::frame::Frame;

/// Turns a decoded video frame into the bytes the display helper reads.
pub trait FrameEncoder {
    fn encode(&self, frame: &Frame) -> Result<Vec<u8>, ImageError>;
}

/// Fit to screen, dither to 16 grays, letterbox, pack as 4 bits per pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FourBppEncoder {
    screen_width: u32,
    screen_height: u32,
    method: GrayscaleMethod,
}

impl FourBppEncoder {
    pub fn new(screen_width: u32, screen_height: u32, method: GrayscaleMethod) -> Self {
        Self {
            screen_width,
            screen_height,
            method,
        }
    }
}

impl FrameEncoder for FourBppEncoder {
    fn encode(&self, frame: &Frame) -> Result<Vec<u8>, ImageError> {
        let resized = resize_keeping_aspect_ratio(frame, self.screen_width, self.screen_height)?;
        let dithered = dither_4bpp(&resized, self.method)?;
        let padded = add_padding(&dithered, self.screen_width, self.screen_height)?;
        encode_4bpp(&padded)
    }
}
