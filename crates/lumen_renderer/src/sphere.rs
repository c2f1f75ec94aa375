//! Sphere primitive for ray tracing.

use lumen_math::{Ray, Vec2, Vec3, NO_HIT};
use std::f32::consts::PI;

/// A sphere primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    /// Create a new sphere.
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            center,
            radius: radius.max(0.0),
        }
    }

    /// Distance to the nearest forward root, or [`NO_HIT`].
    ///
    /// Misses when the origin is outside and the ray points away, or when the
    /// ray passes beside the sphere. An origin inside the sphere reports 0,
    /// which scene queries discard.
    pub fn intersect(&self, ray: &Ray) -> f32 {
        let m = ray.origin - self.center;
        let b = m.dot(ray.direction);
        let c = m.length_squared() - self.radius * self.radius;

        if c > 0.0 && b > 0.0 {
            return NO_HIT;
        }

        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return NO_HIT;
        }

        (-b - discriminant.sqrt()).max(0.0)
    }

    /// Outward unit normal at a point on the surface.
    pub fn normal_at(&self, point: Vec3) -> Vec3 {
        (point - self.center).normalize()
    }
}

/// Spherical UV mapping for a unit normal in a Z-up world.
///
/// `u` runs around the Z axis starting at -X; `v` runs from the south pole
/// (0) to the north pole (1).
pub fn sphere_uv(normal: Vec3) -> Vec2 {
    let theta = (-normal.z).clamp(-1.0, 1.0).acos();
    let phi = (-normal.y).atan2(normal.x) + PI;

    Vec2::new(phi / (2.0 * PI), theta / PI)
}
