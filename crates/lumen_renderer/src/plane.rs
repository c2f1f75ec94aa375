//! Infinite plane primitive.

use lumen_math::{Ray, Vec3, NO_HIT};

/// Directions closer than this to parallel with the plane never hit it.
const PARALLEL_EPSILON: f32 = 0.001;

/// Plane `normal · p = d` with a unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub d: f32,
}

impl Plane {
    pub fn new(normal: Vec3, d: f32) -> Self {
        Self { normal, d }
    }

    /// Distance along the ray to the plane, or [`NO_HIT`].
    ///
    /// Misses when the ray is nearly parallel to the plane or the plane lies
    /// behind the origin. Either side of the plane can be hit.
    pub fn intersect(&self, ray: &Ray) -> f32 {
        let denom = self.normal.dot(ray.direction);
        if denom.abs() < PARALLEL_EPSILON {
            return NO_HIT;
        }

        let t = (self.d - self.normal.dot(ray.origin)) / denom;
        if t < 0.0 {
            NO_HIT
        } else {
            t
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ground() -> Plane {
        Plane::new(Vec3::Z, 0.0)
    }

    #[test]
    fn test_plane_hit_from_above() {
        let ray = Ray::new(Vec3::new(3.0, -2.0, 5.0), -Vec3::Z);

        assert!((ground().intersect(&ray) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_plane_offset() {
        let plane = Plane::new(Vec3::Z, 2.0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);

        assert!((plane.intersect(&ray) - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_plane_behind_origin_misses() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::Z);

        assert_eq!(ground().intersect(&ray), NO_HIT);
    }

    #[test]
    fn test_plane_parallel_misses() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(1.0, 0.0, 0.0005).normalize());

        assert_eq!(ground().intersect(&ray), NO_HIT);
    }
}
