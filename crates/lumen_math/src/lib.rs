// Re-export glam for convenience
pub use glam::*;

// Lumen math types
mod aabb;
mod camera;
mod ray;
mod transform;

pub use aabb::Aabb;
pub use camera::{Film, PinholeCamera};
pub use ray::Ray;
pub use transform::InstanceTransform;

/// Distance reported by every intersection kernel when nothing is hit.
pub const NO_HIT: f32 = f32::MAX;
