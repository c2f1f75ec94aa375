use crate::{Ray, Vec3, NO_HIT};

/// Axis-Aligned Bounding Box used by the mesh BVH.
///
/// Unlike a padded render box this one is exact: it is the tightest box around
/// the points that were grown into it, so containment checks between a node and
/// its children hold without slack.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    /// Box that contains nothing. Growing it by a point yields that point.
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Bound every vertex referenced by `indices`.
    pub fn from_indexed(positions: &[Vec3], indices: &[u32]) -> Self {
        let mut aabb = Self::EMPTY;
        for &index in indices {
            aabb.grow(positions[index as usize]);
        }
        aabb
    }

    /// Extend the box so it contains `point`.
    pub fn grow(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// True until at least one point has been grown into the box.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Surface area, `2(dx*dy + dy*dz + dz*dx)`.
    ///
    /// An empty box reports infinity so it never wins a cost comparison.
    pub fn area(&self) -> f32 {
        let d = self.max - self.min;
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    /// Volume, `dx*dy*dz`.
    pub fn volume(&self) -> f32 {
        let d = self.max - self.min;
        d.x * d.y * d.z
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// True when `other` lies entirely inside this box (boundaries included).
    pub fn contains(&self, other: &Aabb) -> bool {
        other.is_empty() || (self.contains_point(other.min) && self.contains_point(other.max))
    }

    /// Returns the center point of the bounding box.
    pub fn centroid(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Slab test returning the entry distance along the ray.
    ///
    /// Returns 0 when the origin is inside the box and [`NO_HIT`] on a miss.
    /// Axes where the direction component is below `1e-6` in magnitude are
    /// treated as parallel: the ray misses unless the origin already lies
    /// within that slab.
    pub fn ray_distance(&self, ray: &Ray) -> f32 {
        let mut t_min = 0.0_f32;
        let mut t_max = NO_HIT;

        for axis in 0..3 {
            let origin = ray.origin[axis];
            let direction = ray.direction[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);

            if direction.abs() < 1e-6 {
                if origin < lo || origin > hi {
                    return NO_HIT;
                }
                continue;
            }

            let inv = 1.0 / direction;
            let mut t0 = (lo - origin) * inv;
            let mut t1 = (hi - origin) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return NO_HIT;
            }
        }

        t_min
    }
}
