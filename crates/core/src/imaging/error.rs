use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ImageError {
    #[error(
        "the 4 bits per pixel format needs an image with a single color channel, \
         got {0} channels"
    )]
    NotGrayscale(u8),
    #[error("{width}x{height} image has an odd number of pixels and cannot be packed")]
    OddPixelCount { width: u32, height: u32 },
    #[error(
        "{width}x{height} image exceeds the 4 bits per pixel format's maximum of \
         65535x65534 or 65534x65535 pixels"
    )]
    TooLarge { width: u32, height: u32 },
    #[error("cannot process an empty {width}x{height} image")]
    Empty { width: u32, height: u32 },
    #[error("expected 1 or 3 color channels, got {0}")]
    UnsupportedChannels(u8),
    #[error("{width}x{height} image does not fit a {target_width}x{target_height} canvas")]
    DoesNotFit {
        width: u32,
        height: u32,
        target_width: u32,
        target_height: u32,
    },
}
