//! Single-sided ray/triangle intersection with diagnostic counters.

use std::ops::AddAssign;

use lumen_math::{Ray, Vec3, NO_HIT};

/// Triangle test counters for one unit of work.
///
/// Workers keep their own copy and merge it into the render totals when a
/// tile is committed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriangleTests {
    /// Every triangle test performed
    pub total: u64,
    /// Tests that produced a hit
    pub passed: u64,
}

impl AddAssign for TriangleTests {
    fn add_assign(&mut self, other: Self) {
        self.total += other.total;
        self.passed += other.passed;
    }
}

/// Result of a triangle test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    /// Distance along the ray, [`NO_HIT`] on a miss
    pub distance: f32,
    /// Barycentric weights of `a`, `b` and `c`; they sum to 1
    pub uvw: Vec3,
}

impl TriangleHit {
    pub const MISS: TriangleHit = TriangleHit {
        distance: NO_HIT,
        uvw: Vec3::ZERO,
    };

    pub fn is_hit(&self) -> bool {
        self.distance < NO_HIT
    }
}

/// Intersect a ray with triangle `(a, b, c)`.
///
/// Only the front face is hit: the side that `(c - a) × (b - a)` points to.
/// Mesh storage winds triangles the other way round, so BVH leaves pass
/// vertices as `(i0, i2, i1)`. Hits behind the origin are rejected.
pub fn ray_triangle_intersect(
    ray: &Ray,
    a: Vec3,
    b: Vec3,
    c: Vec3,
    tests: &mut TriangleTests,
) -> TriangleHit {
    tests.total += 1;

    let ab = b - a;
    let ac = c - a;
    let qp = -ray.direction;

    let n = ac.cross(ab);
    let d = qp.dot(n);
    if d <= 0.0 {
        return TriangleHit::MISS;
    }

    let ap = ray.origin - a;
    let t = ap.dot(n);
    if t < 0.0 {
        return TriangleHit::MISS;
    }

    let e = ap.cross(qp);
    let v = ac.dot(e);
    if v < 0.0 || v > d {
        return TriangleHit::MISS;
    }
    let w = -ab.dot(e);
    if w < 0.0 || v + w > d {
        return TriangleHit::MISS;
    }

    tests.passed += 1;

    let inv_d = 1.0 / d;
    let v = v * inv_d;
    let w = w * inv_d;
    TriangleHit {
        distance: t * inv_d,
        uvw: Vec3::new(1.0 - v - w, v, w),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Wound so that the front face looks up +Z
    const A: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    const B: Vec3 = Vec3::new(0.0, 1.0, 0.0);
    const C: Vec3 = Vec3::new(1.0, 0.0, 0.0);

    #[test]
    fn test_triangle_hit() {
        let mut tests = TriangleTests::default();
        let ray = Ray::new(Vec3::new(0.2, 0.3, 1.0), -Vec3::Z);

        let hit = ray_triangle_intersect(&ray, A, B, C, &mut tests);
        assert!(hit.is_hit(), "Ray should hit the triangle");
        assert!((hit.distance - 1.0).abs() < 1e-6);
        assert!((hit.uvw.x + hit.uvw.y + hit.uvw.z - 1.0).abs() < 1e-6);

        // Barycentrics reproduce the hit point
        let p = hit.uvw.x * A + hit.uvw.y * B + hit.uvw.z * C;
        assert!((p - Vec3::new(0.2, 0.3, 0.0)).length() < 1e-6);

        assert_eq!(tests, TriangleTests { total: 1, passed: 1 });
    }

    #[test]
    fn test_triangle_back_face_misses() {
        let mut tests = TriangleTests::default();
        let ray = Ray::new(Vec3::new(0.2, 0.3, -1.0), Vec3::Z);

        assert!(!ray_triangle_intersect(&ray, A, B, C, &mut tests).is_hit());
        assert_eq!(tests, TriangleTests { total: 1, passed: 0 });
    }

    #[test]
    fn test_triangle_miss() {
        let mut tests = TriangleTests::default();

        // Outside the edges
        let ray = Ray::new(Vec3::new(0.8, 0.8, 1.0), -Vec3::Z);
        assert!(!ray_triangle_intersect(&ray, A, B, C, &mut tests).is_hit());

        // Triangle behind the origin
        let ray = Ray::new(Vec3::new(0.2, 0.3, -1.0), -Vec3::Z);
        assert!(!ray_triangle_intersect(&ray, A, B, C, &mut tests).is_hit());

        // Parallel to the triangle plane
        let ray = Ray::new(Vec3::new(-1.0, 0.2, 0.0), Vec3::X);
        assert!(!ray_triangle_intersect(&ray, A, B, C, &mut tests).is_hit());

        assert_eq!(tests.total, 3);
        assert_eq!(tests.passed, 0);
    }

    #[test]
    fn test_triangle_hit_at_vertex() {
        let mut tests = TriangleTests::default();
        let ray = Ray::new(Vec3::new(0.0, 1.0, 2.0), -Vec3::Z);

        let hit = ray_triangle_intersect(&ray, A, B, C, &mut tests);
        assert!(hit.is_hit());
        assert!((hit.uvw - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_counters_merge() {
        let mut total = TriangleTests { total: 10, passed: 2 };
        total += TriangleTests { total: 5, passed: 1 };

        assert_eq!(total, TriangleTests { total: 15, passed: 3 });
    }
}
