//! Packed RGBA8 output image.
//!
//! Pixels are stored row-major with row 0 at the top, four bytes per pixel in
//! `[r, g, b, a]` order. The render scheduler hands out disjoint row segments of
//! [`ImageBuffer::pixels_mut`] to its workers.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while writing an image to disk.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Failed to write image {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

pub type ImageResult<T> = Result<T, ImageError>;

/// Output framebuffer.
#[derive(Clone, Debug)]
pub struct ImageBuffer {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
}

impl ImageBuffer {
    /// Create an opaque black image.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0, 0, 0, 255]; (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row stride in bytes.
    pub fn pitch(&self) -> usize {
        self.width as usize * 4
    }

    pub fn get(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels[self.offset(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, pixel: [u8; 4]) {
        let offset = self.offset(x, y);
        self.pixels[offset] = pixel;
    }

    pub fn pixels(&self) -> &[[u8; 4]] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [[u8; 4]] {
        &mut self.pixels
    }

    /// Raw bytes, `pitch() * height()` long.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Save the image. The format is chosen from the file extension (`.bmp`, `.png`, ...).
    pub fn save(&self, path: impl AsRef<Path>) -> ImageResult<()> {
        let path = path.as_ref();
        image::save_buffer(
            path,
            self.as_bytes(),
            self.width,
            self.height,
            image::ColorType::Rgba8,
        )
        .map_err(|source| ImageError::Write {
            path: path.to_path_buf(),
            source,
        })?;

        log::info!("Saved {}x{} image to {}", self.width, self.height, path.display());
        Ok(())
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_image_is_opaque_black() {
        let image = ImageBuffer::new(4, 3);

        assert_eq!(image.pixels().len(), 12);
        assert_eq!(image.pitch(), 16);
        assert_eq!(image.as_bytes().len(), image.pitch() * 3);
        assert!(image.pixels().iter().all(|p| *p == [0, 0, 0, 255]));
    }

    #[test]
    fn test_set_and_get_are_row_major() {
        let mut image = ImageBuffer::new(4, 3);
        image.set(1, 2, [10, 20, 30, 255]);

        assert_eq!(image.get(1, 2), [10, 20, 30, 255]);
        assert_eq!(image.pixels()[2 * 4 + 1], [10, 20, 30, 255]);
        assert_eq!(&image.as_bytes()[(2 * 4 + 1) * 4..(2 * 4 + 1) * 4 + 3], &[10, 20, 30]);
    }

    #[test]
    fn test_save_and_reload_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");

        let mut image = ImageBuffer::new(2, 2);
        image.set(1, 0, [255, 0, 0, 255]);
        image.save(&path).unwrap();

        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.dimensions(), (2, 2));
        assert_eq!(loaded.get_pixel(1, 0).0, [255, 0, 0, 255]);
        assert_eq!(loaded.get_pixel(0, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_save_bmp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bmp");

        ImageBuffer::new(3, 2).save(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_save_unknown_extension_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = ImageBuffer::new(1, 1).save(dir.path().join("out.unknown"));

        assert!(matches!(result, Err(ImageError::Write { .. })));
    }
}
