pub mod dithering;
pub mod error;
pub mod four_bpp;
pub mod frame_encoder;
pub mod grayscale_method;
pub mod transform;
