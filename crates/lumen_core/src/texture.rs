//! Texture loading and bilinear sampling for materials.
//!
//! Texels are decoded from sRGB to linear float once at load time, so
//! sampling is a plain weighted blend.

use std::path::Path;

use lumen_math::{Vec2, Vec3};
use thiserror::Error;

use crate::color::srgb_to_linear;

/// Errors that can occur during texture loading.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Failed to load texture {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Texture has zero size ({width}x{height})")]
    ZeroSize { width: u32, height: u32 },

    #[error("Expected {expected} bytes of RGBA8 data, got {actual}")]
    DataLength { expected: usize, actual: usize },
}

pub type TextureResult<T> = Result<T, TextureError>;

/// A loaded texture with pixel data.
///
/// Stores pixels in linear RGBA float format for rendering.
#[derive(Clone, Debug)]
pub struct Texture {
    /// Texture width in pixels
    pub width: u32,

    /// Texture height in pixels
    pub height: u32,

    /// Pixel data in RGBA format (linear, 0-1 range), row-major, row 0 first
    pub pixels: Vec<[f32; 4]>,

    /// Original file path (for debugging)
    pub path: String,
}

impl Texture {
    /// Decode an sRGB RGBA8 buffer into a linear texture.
    pub fn from_rgba8(
        width: u32,
        height: u32,
        data: &[u8],
        path: impl Into<String>,
    ) -> TextureResult<Self> {
        if width == 0 || height == 0 {
            return Err(TextureError::ZeroSize { width, height });
        }
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(TextureError::DataLength {
                expected,
                actual: data.len(),
            });
        }

        let pixels = data
            .chunks_exact(4)
            .map(|p| {
                [
                    srgb_to_linear(p[0]),
                    srgb_to_linear(p[1]),
                    srgb_to_linear(p[2]),
                    p[3] as f32 / 255.0, // Alpha is linear
                ]
            })
            .collect();

        Ok(Self {
            width,
            height,
            pixels,
            path: path.into(),
        })
    }

    /// Load a texture from an image file.
    pub fn load(path: impl AsRef<Path>) -> TextureResult<Self> {
        let path = path.as_ref();
        let display = path.to_string_lossy().to_string();

        let img = image::open(path).map_err(|source| TextureError::Load {
            path: display.clone(),
            source,
        })?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        let texture = Self::from_rgba8(width, height, rgba.as_raw(), display)?;
        log::debug!(
            "Loaded texture: {} ({}x{}, {:.1} KB)",
            texture.path,
            width,
            height,
            texture.size_bytes() as f32 / 1024.0
        );
        Ok(texture)
    }

    /// Create a solid color texture (1x1).
    pub fn solid_color(color: Vec3) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![[color.x, color.y, color.z, 1.0]],
            path: "<solid>".to_string(),
        }
    }

    /// Sample the texture at `uv` with bilinear filtering.
    ///
    /// `(0, 0)` is the first texel of row 0 and `(1, 1)` the far corner; texel
    /// centres sit at half-integer positions. Lookups outside the texture clamp
    /// to the edge.
    pub fn sample(&self, uv: Vec2) -> Vec3 {
        let x = uv.x * self.width as f32 - 0.5;
        let y = uv.y * self.height as f32 - 0.5;

        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;

        let p00 = self.texel(x0 as i64, y0 as i64);
        let p10 = self.texel(x0 as i64 + 1, y0 as i64);
        let p01 = self.texel(x0 as i64, y0 as i64 + 1);
        let p11 = self.texel(x0 as i64 + 1, y0 as i64 + 1);

        let top = p00.lerp(p10, fx);
        let bottom = p01.lerp(p11, fx);
        top.lerp(bottom, fy)
    }

    /// Texel at integer coordinates, clamped to the edge.
    fn texel(&self, x: i64, y: i64) -> Vec3 {
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        let p = self.pixels[y * self.width as usize + x];
        Vec3::new(p[0], p[1], p[2])
    }

    /// Get total size in bytes (approximate).
    pub fn size_bytes(&self) -> usize {
        self.pixels.len() * std::mem::size_of::<[f32; 4]>()
    }
}
