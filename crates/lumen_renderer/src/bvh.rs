//! Bounding Volume Hierarchy over the triangles of one mesh.
//!
//! The tree is built once per mesh by partitioning the mesh's own index
//! array in place, so every leaf refers to a contiguous slice of it. Nodes
//! live in an arena and reference their children by index; node 0 is the
//! root. After building, the tree is read-only and can be shared across
//! worker threads.

use lumen_math::{Aabb, Ray, Vec3};

use crate::triangle::{ray_triangle_intersect, TriangleTests};

/// Nodes with fewer triangles than this become leaves.
pub const MIN_TRIANGLES_PER_LEAF: usize = 10;

/// A split leaving fewer triangles than this on either side is abandoned.
pub const MIN_TRIANGLE_DIFFERENCE: usize = 3;

/// Index of a node in the arena.
pub type NodeId = u32;

/// BVH node - either a branch with two children or a leaf with triangles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BvhNode {
    /// Internal node with two children.
    Branch {
        left: NodeId,
        right: NodeId,
        bbox: Aabb,
    },
    /// Leaf owning `indices[first..first + count]`; `count` is a multiple of 3.
    Leaf { first: u32, count: u32, bbox: Aabb },
}

impl BvhNode {
    pub fn bounding_box(&self) -> &Aabb {
        match self {
            BvhNode::Branch { bbox, .. } | BvhNode::Leaf { bbox, .. } => bbox,
        }
    }
}

/// Closest triangle found by a BVH query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshHit {
    /// Distance along the (mesh-local) ray
    pub distance: f32,
    /// Barycentric weights matching `indices`
    pub uvw: Vec3,
    /// Vertex indices in the order the weights apply to
    pub indices: [u32; 3],
}

impl MeshHit {
    /// Interpolate a per-vertex attribute at the hit.
    pub fn interpolate<T>(&self, attribute: &[T]) -> T
    where
        T: Copy + std::ops::Mul<f32, Output = T> + std::ops::Add<Output = T>,
    {
        let [i0, i1, i2] = self.indices;
        attribute[i0 as usize] * self.uvw.x
            + attribute[i1 as usize] * self.uvw.y
            + attribute[i2 as usize] * self.uvw.z
    }
}

/// Arena-allocated AABB tree.
#[derive(Debug, Clone, Default)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
}

impl Bvh {
    /// Build a tree over `indices`, reordering whole triangles in place.
    ///
    /// `indices.len()` must be a multiple of 3. An empty slice produces a
    /// single empty leaf that nothing can hit.
    pub fn build(positions: &[Vec3], indices: &mut [u32]) -> Self {
        let mut nodes = Vec::new();
        build_node(positions, indices, 0, &mut nodes);
        Self { nodes }
    }

    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> &BvhNode {
        &self.nodes[id as usize]
    }

    pub fn root(&self) -> Option<&BvhNode> {
        self.nodes.first()
    }

    /// Find the closest front-facing triangle nearer than `max_distance`.
    ///
    /// `positions` and `indices` must be the arrays the tree was built from.
    pub fn intersect(
        &self,
        positions: &[Vec3],
        indices: &[u32],
        ray: &Ray,
        max_distance: f32,
        tests: &mut TriangleTests,
    ) -> Option<MeshHit> {
        let root = self.root()?;
        if root.bounding_box().ray_distance(ray) >= max_distance {
            return None;
        }

        let mut best = MeshHit {
            distance: max_distance,
            uvw: Vec3::ZERO,
            indices: [0; 3],
        };
        let query = Query {
            positions,
            indices,
            ray,
        };
        self.intersect_node(0, &query, &mut best, tests)
            .then_some(best)
    }

    fn intersect_node(
        &self,
        id: NodeId,
        query: &Query<'_>,
        best: &mut MeshHit,
        tests: &mut TriangleTests,
    ) -> bool {
        match self.nodes[id as usize] {
            BvhNode::Leaf { first, count, .. } => {
                let slice = &query.indices[first as usize..(first + count) as usize];
                let mut found = false;

                for tri in slice.chunks_exact(3) {
                    let (i0, i1, i2) = (tri[0], tri[2], tri[1]);
                    let hit = ray_triangle_intersect(
                        query.ray,
                        query.positions[i0 as usize],
                        query.positions[i1 as usize],
                        query.positions[i2 as usize],
                        tests,
                    );
                    if hit.distance > 0.0 && hit.distance < best.distance {
                        *best = MeshHit {
                            distance: hit.distance,
                            uvw: hit.uvw,
                            indices: [i0, i1, i2],
                        };
                        found = true;
                    }
                }
                found
            }
            BvhNode::Branch { left, right, .. } => {
                let left_distance = self.node(left).bounding_box().ray_distance(query.ray);
                let right_distance = self.node(right).bounding_box().ray_distance(query.ray);

                let ((near, near_distance), (far, far_distance)) = if left_distance <= right_distance {
                    ((left, left_distance), (right, right_distance))
                } else {
                    ((right, right_distance), (left, left_distance))
                };

                let mut found = false;
                if near_distance < best.distance {
                    found |= self.intersect_node(near, query, best, tests);
                }
                // best may have tightened while visiting the near child
                if far_distance < best.distance {
                    found |= self.intersect_node(far, query, best, tests);
                }
                found
            }
        }
    }
}

struct Query<'a> {
    positions: &'a [Vec3],
    indices: &'a [u32],
    ray: &'a Ray,
}

fn build_node(positions: &[Vec3], indices: &mut [u32], first: usize, nodes: &mut Vec<BvhNode>) -> NodeId {
    let bbox = Aabb::from_indexed(positions, indices);
    let id = nodes.len();
    let leaf = BvhNode::Leaf {
        first: first as u32,
        count: indices.len() as u32,
        bbox,
    };
    nodes.push(leaf);

    if indices.len() / 3 < MIN_TRIANGLES_PER_LEAF {
        return id as NodeId;
    }

    let split = partition_triangles(positions, indices);
    let min_side = 3 * MIN_TRIANGLE_DIFFERENCE;
    if split < min_side || indices.len() - split < min_side {
        return id as NodeId;
    }

    let (below, above) = indices.split_at_mut(split);
    let left = build_node(positions, below, first, nodes);
    let right = build_node(positions, above, first + split, nodes);
    nodes[id] = BvhNode::Branch { left, right, bbox };
    id as NodeId
}

/// Split `indices` into below/above groups on the cheapest axis.
///
/// Triangles are classified by comparing their centroid with the mean of all
/// referenced vertices. Each side's cost is the area of a box grown only from
/// each triangle's lowest vertex on that axis. Returns the index where the
/// above group starts.
fn partition_triangles(positions: &[Vec3], indices: &mut [u32]) -> usize {
    let weight = 1.0 / indices.len() as f32;
    let mut mean = Vec3::ZERO;
    for &index in indices.iter() {
        mean += positions[index as usize] * weight;
    }

    let mut above = [Aabb::EMPTY; 3];
    let mut below = [Aabb::EMPTY; 3];
    let mut below_count = [0usize; 3];

    for tri in indices.chunks_exact(3) {
        let corners = triangle_corners(positions, tri);
        let centroid = triangle_centroid(&corners);

        for axis in 0..3 {
            let lowest = corners[index_of_min(corners[0][axis], corners[1][axis], corners[2][axis])];
            if centroid[axis] >= mean[axis] {
                above[axis].grow(lowest);
            } else {
                below[axis].grow(lowest);
                below_count[axis] += 1;
            }
        }
    }

    let mut best_axis = 0;
    let mut best_area = f32::MAX;
    for axis in 0..3 {
        let area = above[axis].area() + below[axis].area();
        if area < best_area {
            best_area = area;
            best_axis = axis;
        }
    }

    let split = 3 * below_count[best_axis];
    let threshold = mean[best_axis];
    let mut below_at = 0;
    let mut above_at = split;

    while below_at < split && above_at < indices.len() {
        let corners = triangle_corners(positions, &indices[below_at..below_at + 3]);
        if triangle_centroid(&corners)[best_axis] >= threshold {
            for k in 0..3 {
                indices.swap(below_at + k, above_at + k);
            }
            above_at += 3;
        } else {
            below_at += 3;
        }
    }

    split
}

fn triangle_corners(positions: &[Vec3], tri: &[u32]) -> [Vec3; 3] {
    [
        positions[tri[0] as usize],
        positions[tri[1] as usize],
        positions[tri[2] as usize],
    ]
}

fn triangle_centroid(corners: &[Vec3; 3]) -> Vec3 {
    (corners[0] + corners[1] + corners[2]) * (1.0 / 3.0)
}

/// Ties resolve towards the later vertex.
fn index_of_min(a: f32, b: f32, c: f32) -> usize {
    if a < b {
        if a < c {
            0
        } else {
            2
        }
    } else if b < c {
        1
    } else {
        2
    }
}
