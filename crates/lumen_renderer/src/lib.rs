//! Lumen Renderer - CPU path tracing
//!
//! An offline Monte Carlo path tracer over planes, spheres and instanced
//! triangle meshes:
//! - Per-mesh BVH built with a coarse surface area split
//! - Iterative bounce loop with diffuse, specular and refractive materials
//! - Tile scheduler over a fixed pool of OS threads writing disjoint image slices
//!
//! # Example
//!
//! ```ignore
//! use lumen_renderer::{Material, RenderSettings, Renderer, World};
//!
//! let mut world = World::default();
//! let white = world.push_material(Material::diffuse(Color::splat(0.8)))?;
//! world.push_sphere(Vec3::new(0.0, 0.0, 1.0), 1.0, white)?;
//! world.preprocess_meshes(false);
//!
//! let output = Renderer::new(RenderSettings::default())?.render(&world, &camera)?;
//! output.image.save("out.bmp")?;
//! ```

mod bvh;
mod bvh_stats;
mod error;
mod integrator;
mod material;
mod plane;
mod renderer;
mod sampler;
mod settings;
mod sphere;
mod tile;
mod triangle;
mod world;

pub use bvh::{Bvh, BvhNode, MeshHit, NodeId, MIN_TRIANGLES_PER_LEAF, MIN_TRIANGLE_DIFFERENCE};
pub use bvh_stats::BvhStats;
pub use error::{ConfigError, RenderError, RenderResult, SceneError, SceneResult};
pub use integrator::cast_ray;
pub use material::{random_in_hemisphere, random_unit_vector, reflect, refract, Material, Surface};
pub use plane::Plane;
pub use renderer::{render, RenderOutput, RenderStats, Renderer};
pub use sampler::{gen_f32, sample_offsets, tile_rng, tile_seeds};
pub use settings::{RenderSettings, MAX_BOUNCES, MAX_RAYS_PER_PIXEL, MAX_RESOLUTION, MAX_THREADS};
pub use sphere::{sphere_uv, Sphere};
pub use tile::{run_tiles, RenderCounters, Tile, TileGrid, TileTarget, TileWork, DEFAULT_TILE_COUNT};
pub use triangle::{ray_triangle_intersect, TriangleHit, TriangleTests};
pub use world::{
    MeshInfo, MeshInstance, PlaneEntry, SceneHit, SphereEntry, World, WorldCapacity,
    DEFAULT_BACKGROUND,
};

/// Re-export the math and data types used in this crate's API
pub use lumen_core::{Color, ImageBuffer, MeshData, Texture};
pub use lumen_math::{Aabb, Film, InstanceTransform, PinholeCamera, Ray, Vec2, Vec3};
