//! Lumen Core - geometry, texture and image data shared by the renderer.
//!
//! This crate provides:
//!
//! - **Meshes**: `MeshData` with per-vertex attributes and validation
//! - **OBJ ingestion**: `load_obj` via `tobj`
//! - **Textures**: linear RGBA textures decoded from sRGB images
//! - **Output**: `ImageBuffer`, a packed RGBA8 framebuffer that can be saved to disk
//!
//! # Example
//!
//! ```ignore
//! use lumen_core::{load_obj, ImageBuffer};
//!
//! let mesh = load_obj("dragon.obj")?;
//! println!("{} triangles", mesh.triangle_count());
//!
//! let image = ImageBuffer::new(640, 480);
//! image.save("out.bmp")?;
//! ```

pub mod color;
pub mod image_buffer;
pub mod mesh;
pub mod obj;
pub mod texture;

// Re-export commonly used types
pub use color::{color_to_rgba, linear_to_srgb, srgb_to_linear, Color};
pub use image_buffer::{ImageBuffer, ImageError, ImageResult};
pub use mesh::{MeshData, MeshError, MeshResult, Skin};
pub use obj::load_obj;
pub use texture::{Texture, TextureError, TextureResult};
