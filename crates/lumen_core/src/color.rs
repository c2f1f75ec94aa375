//! Color conversions between linear radiance, sRGB and packed 8-bit pixels.

use lumen_math::Vec3;

/// Linear RGB color.
pub type Color = Vec3;

/// Convert an sRGB byte value to linear float.
pub fn srgb_to_linear(value: u8) -> f32 {
    let v = value as f32 / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// Exact sRGB transfer function. Input is clamped to `[0, 1]` first.
pub fn linear_to_srgb(value: f32) -> f32 {
    let v = value.clamp(0.0, 1.0);
    if v > 0.0031308 {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    } else {
        12.92 * v
    }
}

/// Encode a linear color to sRGB and pack it as `[r, g, b, 255]`.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let quantize = |v: f32| (linear_to_srgb(v) * 255.0 + 0.5) as u8;
    [quantize(color.x), quantize(color.y), quantize(color.z), 255]
}
