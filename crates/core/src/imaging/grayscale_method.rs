use std::fmt;

/// Formula used to reduce an sRGB pixel to one gray value.
///
/// `Luma` variants weight the gamma-encoded values directly. `Luminance`
/// variants weight linear light and encode the result back to sRGB.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GrayscaleMethod {
    Rec601Luma,
    Rec601Luminance,
    #[default]
    Rec709Luma,
    Rec709Luminance,
    /// Largest channel.
    Brightness,
    /// Midpoint of the smallest and largest channel.
    Lightness,
    Average,
    /// Root mean square of the channels.
    Rms,
}

const REC601: [f64; 3] = [0.298839, 0.586811, 0.114350];
const REC709: [f64; 3] = [0.212656, 0.715158, 0.072186];

impl GrayscaleMethod {
    pub const ALL: [GrayscaleMethod; 8] = [
        Self::Rec601Luma,
        Self::Rec601Luminance,
        Self::Rec709Luma,
        Self::Rec709Luminance,
        Self::Brightness,
        Self::Lightness,
        Self::Average,
        Self::Rms,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Rec601Luma => "Rec601Luma",
            Self::Rec601Luminance => "Rec601Luminance",
            Self::Rec709Luma => "Rec709Luma",
            Self::Rec709Luminance => "Rec709Luminance",
            Self::Brightness => "Brightness",
            Self::Lightness => "Lightness",
            Self::Average => "Average",
            Self::Rms => "RMS",
        }
    }

    /// Exact, case-sensitive name lookup. Unknown names fall back to
    /// [`GrayscaleMethod::Rec709Luma`].
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|method| method.name() == name)
            .unwrap_or_default()
    }

    /// Gray value of one pixel in `0.0..=255.0`.
    pub fn gray(self, r: u8, g: u8, b: u8) -> f32 {
        let rgb = [r as f64, g as f64, b as f64];
        let max = rgb.iter().copied().fold(0.0, f64::max);
        let min = rgb.iter().copied().fold(255.0, f64::min);

        let value = match self {
            Self::Rec601Luma => weighted(rgb, REC601),
            Self::Rec709Luma => weighted(rgb, REC709),
            Self::Rec601Luminance => luminance(rgb, REC601),
            Self::Rec709Luminance => luminance(rgb, REC709),
            Self::Brightness => max,
            Self::Lightness => (min + max) / 2.0,
            Self::Average => rgb.iter().sum::<f64>() / 3.0,
            Self::Rms => (rgb.iter().map(|c| c * c).sum::<f64>() / 3.0).sqrt(),
        };
        value.clamp(0.0, 255.0) as f32
    }
}

impl fmt::Display for GrayscaleMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn weighted(rgb: [f64; 3], weights: [f64; 3]) -> f64 {
    rgb.iter().zip(weights).map(|(c, w)| c * w).sum()
}

fn luminance(rgb: [f64; 3], weights: [f64; 3]) -> f64 {
    let linear = rgb.map(|c| srgb_to_linear(c / 255.0));
    linear_to_srgb(weighted(linear, weights)) * 255.0
}

fn srgb_to_linear(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f64) -> f64 {
    if c <= 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}
