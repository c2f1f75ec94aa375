//! Mesh geometry shared by the asset loaders and the renderer.
//!
//! A mesh is a set of parallel per-vertex arrays plus a flat triangle index
//! list. Triangles are wound counter-clockwise when seen from the side their
//! normal faces.

use lumen_math::{Aabb, Mat3, Mat4, Vec2, Vec3, Vec4};
use thiserror::Error;

/// Errors reported when mesh data is malformed.
#[derive(Error, Debug)]
pub enum MeshError {
    #[error("Index count {0} is not a multiple of 3")]
    IndexCountNotMultipleOfThree(usize),

    #[error("Mesh has no triangles")]
    Empty,

    #[error("Index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error("Attribute '{attribute}' has {actual} entries, expected {expected}")]
    AttributeLength {
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Failed to load OBJ: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("OBJ file contains no models")]
    NoModels,
}

pub type MeshResult<T> = Result<T, MeshError>;

/// Skinning data carried through from asset loaders. The renderer ignores it.
#[derive(Clone, Debug, Default)]
pub struct Skin {
    /// Up to four joint indices per vertex
    pub joints: Vec<[u32; 4]>,

    /// Blend weights matching `joints`
    pub weights: Vec<Vec4>,

    /// Inverse bind matrix per joint
    pub inverse_bind: Vec<Mat4>,
}

/// Triangle mesh with per-vertex attributes.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Unit vertex normals, same length as `positions`
    pub normals: Vec<Vec3>,

    /// Texture coordinates, same length as `positions`
    pub uvs: Vec<Vec2>,

    /// Tangents; either empty or the same length as `positions`
    pub tangents: Vec<Vec3>,

    /// Triangle indices (every 3 indices form a triangle)
    pub indices: Vec<u32>,

    pub skin: Option<Skin>,
}

impl MeshData {
    /// Create a mesh from explicit attributes. Call [`MeshData::validate`] before use.
    pub fn new(positions: Vec<Vec3>, normals: Vec<Vec3>, uvs: Vec<Vec2>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            normals,
            uvs,
            tangents: Vec::new(),
            indices,
            skin: None,
        }
    }

    /// Create a mesh from positions alone, with smooth normals and zero UVs.
    pub fn from_positions(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        let mut mesh = Self::new(positions, Vec::new(), Vec::new(), indices);
        mesh.ensure_attributes();
        mesh
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get the number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Bounds of all vertex positions.
    pub fn bounds(&self) -> Aabb {
        let mut aabb = Aabb::EMPTY;
        for &p in &self.positions {
            aabb.grow(p);
        }
        aabb
    }

    /// Check index ranges and attribute lengths.
    pub fn validate(&self) -> MeshResult<()> {
        if self.indices.len() % 3 != 0 {
            return Err(MeshError::IndexCountNotMultipleOfThree(self.indices.len()));
        }
        if self.indices.is_empty() || self.positions.is_empty() {
            return Err(MeshError::Empty);
        }

        let vertex_count = self.vertex_count();
        if let Some(&index) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(MeshError::IndexOutOfRange {
                index,
                vertex_count,
            });
        }

        check_length("normals", vertex_count, self.normals.len())?;
        check_length("uvs", vertex_count, self.uvs.len())?;
        if !self.tangents.is_empty() {
            check_length("tangents", vertex_count, self.tangents.len())?;
        }
        if let Some(skin) = &self.skin {
            check_length("joints", vertex_count, skin.joints.len())?;
            check_length("weights", vertex_count, skin.weights.len())?;
        }

        Ok(())
    }

    /// Fill in attributes the source did not provide.
    ///
    /// Normals are recomputed when missing or mis-sized (face-varying data);
    /// UVs default to zero.
    pub fn ensure_attributes(&mut self) {
        if self.normals.len() != self.positions.len() {
            if !self.normals.is_empty() {
                log::debug!(
                    "Normals array length ({}) doesn't match vertex count ({}), computing smooth normals",
                    self.normals.len(),
                    self.positions.len()
                );
            }
            self.compute_normals();
        }
        if self.uvs.len() != self.positions.len() {
            self.uvs = vec![Vec2::ZERO; self.positions.len()];
        }
    }

    /// Compute smooth vertex normals by averaging face normals.
    ///
    /// Face normals are area weighted. Vertices not referenced by any
    /// non-degenerate triangle get +Z.
    pub fn compute_normals(&mut self) {
        let vertex_count = self.positions.len();
        let mut normals = vec![Vec3::ZERO; vertex_count];

        for face in self.indices.chunks_exact(3) {
            let [i0, i1, i2] = [face[0] as usize, face[1] as usize, face[2] as usize];
            if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
                continue;
            }

            let p0 = self.positions[i0];
            let face_normal = (self.positions[i1] - p0).cross(self.positions[i2] - p0);

            normals[i0] += face_normal;
            normals[i1] += face_normal;
            normals[i2] += face_normal;
        }

        for normal in &mut normals {
            *normal = normal.try_normalize().unwrap_or(Vec3::Z);
        }

        self.normals = normals;
    }

    /// Apply an affine transform to positions, normals and tangents.
    ///
    /// Normals use the inverse transpose of the linear part.
    pub fn transform(&mut self, matrix: Mat4) {
        let linear = Mat3::from_mat4(matrix);
        let normal_matrix = linear.inverse().transpose();

        for p in &mut self.positions {
            *p = matrix.transform_point3(*p);
        }
        for n in &mut self.normals {
            *n = (normal_matrix * *n).normalize_or_zero();
        }
        for t in &mut self.tangents {
            *t = (linear * *t).normalize_or_zero();
        }
    }
}

fn check_length(attribute: &'static str, expected: usize, actual: usize) -> MeshResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(MeshError::AttributeLength {
            attribute,
            expected,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> MeshData {
        let positions = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        MeshData::from_positions(positions, vec![0, 1, 2, 0, 2, 3])
    }

    #[test]
    fn test_mesh_creation() {
        let mesh = quad();

        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.uvs.len(), 4);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_compute_normals_ccw_faces_up() {
        let mesh = quad();

        // Counter-clockwise seen from +Z
        for normal in &mesh.normals {
            assert!((normal.z - 1.0).abs() < 0.001);
        }
    }

    #[test]
    fn test_unreferenced_vertex_gets_default_normal() {
        let mut mesh = quad();
        mesh.positions.push(Vec3::splat(9.0));
        mesh.compute_normals();

        assert_eq!(mesh.normals[4], Vec3::Z);
    }

    #[test]
    fn test_validate_rejects_partial_triangle() {
        let mut mesh = quad();
        mesh.indices.push(0);

        assert!(matches!(
            mesh.validate(),
            Err(MeshError::IndexCountNotMultipleOfThree(7))
        ));
    }

    #[test]
    fn test_validate_rejects_out_of_range_index() {
        let mut mesh = quad();
        mesh.indices[4] = 17;

        assert!(matches!(
            mesh.validate(),
            Err(MeshError::IndexOutOfRange {
                index: 17,
                vertex_count: 4
            })
        ));
    }

    #[test]
    fn test_validate_rejects_mismatched_attributes() {
        let mut mesh = quad();
        mesh.uvs.pop();
        assert!(matches!(
            mesh.validate(),
            Err(MeshError::AttributeLength { attribute: "uvs", .. })
        ));

        let mut mesh = quad();
        mesh.skin = Some(Skin::default());
        assert!(matches!(
            mesh.validate(),
            Err(MeshError::AttributeLength { attribute: "joints", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_empty() {
        let mesh = MeshData::default();
        assert!(matches!(mesh.validate(), Err(MeshError::Empty)));
    }

    #[test]
    fn test_bounds_computation() {
        let mesh = MeshData::from_positions(
            vec![
                Vec3::new(-1.0, -2.0, -3.0),
                Vec3::new(4.0, 5.0, 6.0),
                Vec3::new(0.0, 0.0, 0.0),
            ],
            vec![0, 1, 2],
        );

        let bounds = mesh.bounds();
        assert_eq!(bounds.min, Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(bounds.max, Vec3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn test_transform_rotates_normals() {
        let mut mesh = quad();
        // Y-up to Z-up: +Z normals become -Y
        mesh.transform(Mat4::from_rotation_x(std::f32::consts::FRAC_PI_2));

        for normal in &mesh.normals {
            assert!((normal.y + 1.0).abs() < 1e-5);
        }
        assert!((mesh.positions[2] - Vec3::new(1.0, 0.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn test_transform_non_uniform_scale_keeps_normals_perpendicular() {
        let mut mesh = MeshData::from_positions(
            vec![Vec3::X, Vec3::Y, Vec3::Z],
            vec![0, 1, 2],
        );
        mesh.transform(Mat4::from_scale(Vec3::new(3.0, 1.0, 1.0)));

        let edge = mesh.positions[1] - mesh.positions[0];
        assert!(mesh.normals[0].dot(edge).abs() < 1e-5);
    }
}
