//! Demo scene: a lit box room holding three instances of one mesh.

use std::f32::consts::{FRAC_PI_2, TAU};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use lumen_core::{load_obj, Color, MeshData, Texture};
use lumen_math::{Mat3, Mat4, PinholeCamera, Vec2, Vec3};
use lumen_renderer::{Material, World};

/// Largest extent of the mesh after fitting, before instance scale.
const MESH_SIZE: f32 = 1.0;

/// Camera looking into the room from the open side.
pub fn camera() -> PinholeCamera {
    PinholeCamera::look_at(Vec3::new(0.0, -8.0, 1.0), Vec3::new(0.0, 0.0, 0.7), Vec3::Z)
}

/// Build the demo world. `mesh` replaces the built-in torus, `texture` is
/// mapped onto the centre sphere.
///
/// Meshes are registered but not preprocessed.
pub fn build(mesh: Option<&Path>, texture: Option<&Path>) -> Result<World> {
    let mut world = World::default();

    let white = world.push_material(Material::specular(Color::ONE, 0.5))?;
    let light = world.push_material(Material::light(Color::ONE))?;
    let green = world.push_material(Material::specular(Color::new(0.3, 1.0, 0.3), 0.1))?;
    let blue = world.push_material(Material::specular(Color::new(0.3, 0.3, 1.0), 0.1))?;
    let red = world.push_material(Material::specular(Color::new(1.0, 0.0, 0.0), 0.1))?;

    let bronze = world.push_material(Material::specular(Color::new(0.804, 0.498, 0.196), 0.7))?;
    let chrome = world.push_material(Material::specular(Color::ONE, 1.0))?;
    let steel = world.push_material(Material::specular(Color::new(0.3, 0.6, 0.9), 0.8))?;

    // Floor, ceiling light and three walls
    world.push_plane(Vec3::Z, 0.0, green)?;
    world.push_plane(-Vec3::Z, -3.0, light)?;
    world.push_plane(-Vec3::Y, -2.0, white)?;
    world.push_plane(Vec3::X, -2.0, blue)?;
    world.push_plane(-Vec3::X, -2.0, red)?;

    let centre = match texture {
        Some(path) => {
            let texture = Texture::load(path)
                .with_context(|| format!("Failed to load texture {}", path.display()))?;
            world.push_textured_material(Arc::new(texture))?
        }
        None => world.push_material(Material::refractive(Color::new(1.0, 0.7, 0.7), 1.5))?,
    };
    world.push_sphere(Vec3::new(0.0, 0.0, 0.6), 0.6, centre)?;

    let data = match mesh {
        Some(path) => {
            let mut data = load_obj(path)
                .with_context(|| format!("Failed to load mesh {}", path.display()))?;
            // OBJ files are Y-up
            data.transform(Mat4::from_rotation_x(FRAC_PI_2));
            data
        }
        None => torus(48, 24, 1.0, 0.35),
    };
    let mesh = world.push_mesh_info(fit_to_floor(data))?;

    let rotation = Mat3::from_rotation_z(FRAC_PI_2);
    let scale = Vec3::splat(0.8);
    for (x, material) in [(-1.0, bronze), (0.0, chrome), (1.0, steel)] {
        world.push_mesh(mesh, Vec3::new(x, -2.0, 0.0), rotation, scale, material)?;
    }

    log::info!(
        "Scene: {} planes, {} spheres, {} mesh instances, {} materials",
        world.planes().len(),
        world.spheres().len(),
        world.instances().len(),
        world.materials().len()
    );
    Ok(world)
}

/// Centre the mesh over the origin, rest it on `z = 0` and scale its
/// largest extent to [`MESH_SIZE`].
fn fit_to_floor(mut data: MeshData) -> MeshData {
    let bounds = data.bounds();
    let extent = (bounds.max - bounds.min).max_element();
    if !extent.is_finite() || extent <= 0.0 {
        return data;
    }

    let centre = bounds.centroid();
    let offset = Vec3::new(centre.x, centre.y, bounds.min.z);
    data.transform(Mat4::from_scale(Vec3::splat(MESH_SIZE / extent)) * Mat4::from_translation(-offset));
    data
}

/// Torus around the Z axis with outward facing, counter-clockwise triangles.
fn torus(major_segments: u32, minor_segments: u32, major_radius: f32, minor_radius: f32) -> MeshData {
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut uvs = Vec::new();

    for i in 0..major_segments {
        let u = i as f32 / major_segments as f32;
        let (sin_u, cos_u) = (u * TAU).sin_cos();
        for j in 0..minor_segments {
            let v = j as f32 / minor_segments as f32;
            let (sin_v, cos_v) = (v * TAU).sin_cos();

            let normal = Vec3::new(cos_v * cos_u, cos_v * sin_u, sin_v);
            let ring = Vec3::new(cos_u, sin_u, 0.0) * major_radius;
            positions.push(ring + normal * minor_radius);
            normals.push(normal);
            uvs.push(Vec2::new(u, v));
        }
    }

    let vertex = |i: u32, j: u32| (i % major_segments) * minor_segments + (j % minor_segments);
    let mut indices = Vec::with_capacity((major_segments * minor_segments * 6) as usize);
    for i in 0..major_segments {
        for j in 0..minor_segments {
            let a = vertex(i, j);
            let b = vertex(i + 1, j);
            let c = vertex(i + 1, j + 1);
            let d = vertex(i, j + 1);
            indices.extend_from_slice(&[a, b, c, a, c, d]);
        }
    }

    MeshData::new(positions, normals, uvs, indices)
}
