use crate::imaging::error::ImageError;
use crate::shared::frame::Frame;

const MAX_DIMENSION: u32 = u16::MAX as u32;

/// Packs a single-channel frame into the panel's 4 bits per pixel file format.
///
/// Layout: width and height as little-endian `u16`, then two pixels per byte
/// (high nibble of the first pixel in the low nibble of the byte). The panel
/// controller reads 16-bit words, so each pair of bytes is stored swapped.
pub fn encode_4bpp(frame: &Frame) -> Result<Vec<u8>, ImageError> {
    let (width, height) = (frame.width(), frame.height());
    if frame.channels() != 1 {
        return Err(ImageError::NotGrayscale(frame.channels()));
    }
    let fits = (width <= MAX_DIMENSION && height < MAX_DIMENSION)
        || (width < MAX_DIMENSION && height <= MAX_DIMENSION);
    if !fits {
        return Err(ImageError::TooLarge { width, height });
    }
    if frame.pixel_count() % 2 != 0 {
        return Err(ImageError::OddPixelCount { width, height });
    }

    let mut packed: Vec<u8> = frame
        .data()
        .chunks_exact(2)
        .map(|pair| (pair[1] & 0xf0) | (pair[0] >> 4))
        .collect();
    for word in packed.chunks_exact_mut(2) {
        word.swap(0, 1);
    }

    let mut encoded = Vec::with_capacity(4 + packed.len());
    encoded.extend_from_slice(&(width as u16).to_le_bytes());
    encoded.extend_from_slice(&(height as u16).to_le_bytes());
    encoded.extend_from_slice(&packed);
    Ok(encoded)
}
