//! Placement of a mesh instance in the world.
//!
//! Rotation is an orthonormal `Mat3`, so its inverse is the transpose.
//! Distances convert between spaces with the cube root of the scale product,
//! which is exact for uniform scale.

use glam::{Mat3, Vec3};

use crate::Ray;

/// Position, orthonormal rotation and non-uniform scale of one mesh instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceTransform {
    pub position: Vec3,
    pub rotation: Mat3,
    pub scale: Vec3,
    inv_scale: Vec3,
    avg_scale: f32,
    inv_avg_scale: f32,
}

impl Default for InstanceTransform {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Mat3::IDENTITY, Vec3::ONE)
    }
}

impl InstanceTransform {
    /// Build a transform. Scale components must be positive.
    pub fn new(position: Vec3, rotation: Mat3, scale: Vec3) -> Self {
        let avg_scale = (scale.x * scale.y * scale.z).cbrt();
        Self {
            position,
            rotation,
            scale,
            inv_scale: scale.recip(),
            avg_scale,
            inv_avg_scale: 1.0 / avg_scale,
        }
    }

    /// True when every scale component is finite and positive.
    ///
    /// Mirrored instances are excluded: their scale product is negative, so
    /// converted hit distances would change sign.
    pub fn has_positive_scale(&self) -> bool {
        self.scale.is_finite() && self.scale.cmpgt(Vec3::ZERO).all()
    }

    /// Cube root of the scale product.
    pub fn avg_scale(&self) -> f32 {
        self.avg_scale
    }

    /// `Rᵀ(p - position) / scale`
    pub fn world_to_local_point(&self, point: Vec3) -> Vec3 {
        (self.rotation.transpose() * (point - self.position)) * self.inv_scale
    }

    /// `normalize(Rᵀ d / scale)`
    pub fn world_to_local_direction(&self, direction: Vec3) -> Vec3 {
        ((self.rotation.transpose() * direction) * self.inv_scale).normalize()
    }

    /// Map a world ray into mesh-local space with a unit direction.
    pub fn world_to_local_ray(&self, ray: &Ray) -> Ray {
        Ray::new(
            self.world_to_local_point(ray.origin),
            self.world_to_local_direction(ray.direction),
        )
    }

    /// `R(p * scale) + position`
    pub fn local_to_world_point(&self, point: Vec3) -> Vec3 {
        self.rotation * (point * self.scale) + self.position
    }

    /// `normalize(R(n / scale))`
    ///
    /// Normals transform by the inverse transpose, which for `R * S` is
    /// `R * S⁻¹`.
    pub fn local_to_world_normal(&self, normal: Vec3) -> Vec3 {
        (self.rotation * (normal * self.inv_scale)).normalize()
    }

    /// Convert a world distance bound into local units. [`crate::NO_HIT`] is kept as is.
    pub fn world_to_local_distance(&self, distance: f32) -> f32 {
        if distance == crate::NO_HIT {
            distance
        } else {
            distance * self.inv_avg_scale
        }
    }

    pub fn local_to_world_distance(&self, distance: f32) -> f32 {
        distance * self.avg_scale
    }
}
