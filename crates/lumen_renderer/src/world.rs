//! Scene container: primitives, mesh instances, meshes and materials.
//!
//! The world is built up front through capacity-checked `push_*` calls,
//! then [`World::preprocess_meshes`] builds one BVH per mesh. After that it is
//! only read, and is shared by reference across render threads.

use std::sync::Arc;
use std::time::Instant;

use lumen_core::{Color, MeshData, Texture};
use lumen_math::{InstanceTransform, Mat3, Ray, Vec2, Vec3, NO_HIT};

use crate::bvh::{Bvh, MIN_TRIANGLES_PER_LEAF, MIN_TRIANGLE_DIFFERENCE};
use crate::bvh_stats::BvhStats;
use crate::error::{SceneError, SceneResult};
use crate::material::Material;
use crate::plane::Plane;
use crate::sphere::{sphere_uv, Sphere};
use crate::triangle::TriangleTests;

/// Default sky color returned by rays that escape the scene.
pub const DEFAULT_BACKGROUND: Color = Color::new(0.7, 0.9, 1.0);

/// Upper bounds on the number of scene entries of each kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldCapacity {
    pub planes: usize,
    pub spheres: usize,
    pub materials: usize,
    pub instances: usize,
    pub meshes: usize,
}

impl Default for WorldCapacity {
    fn default() -> Self {
        Self {
            planes: 1024,
            spheres: 1024,
            materials: 64,
            instances: 64,
            meshes: 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneEntry {
    pub plane: Plane,
    pub material: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereEntry {
    pub sphere: Sphere,
    pub material: u32,
}

/// A placed copy of a registered mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshInstance {
    pub mesh: u32,
    pub transform: InstanceTransform,
    pub material: u32,
}

/// A registered mesh and, once preprocessed, its BVH.
#[derive(Debug, Clone)]
pub struct MeshInfo {
    pub data: MeshData,
    pub bvh: Option<Bvh>,
}

/// Closest surface found by [`World::intersect`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneHit {
    /// World-space distance along the ray
    pub distance: f32,
    /// Unit world-space surface normal
    pub normal: Vec3,
    pub uv: Vec2,
    pub material: u32,
}

/// The scene.
#[derive(Debug, Clone)]
pub struct World {
    pub background: Color,
    capacity: WorldCapacity,
    planes: Vec<PlaneEntry>,
    spheres: Vec<SphereEntry>,
    instances: Vec<MeshInstance>,
    meshes: Vec<MeshInfo>,
    materials: Vec<Material>,
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldCapacity::default())
    }
}

impl World {
    pub fn new(capacity: WorldCapacity) -> Self {
        Self {
            background: DEFAULT_BACKGROUND,
            capacity,
            planes: Vec::new(),
            spheres: Vec::new(),
            instances: Vec::new(),
            meshes: Vec::new(),
            materials: Vec::new(),
        }
    }

    /// Set the background (sky) color.
    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    pub fn capacity(&self) -> WorldCapacity {
        self.capacity
    }

    pub fn planes(&self) -> &[PlaneEntry] {
        &self.planes
    }

    pub fn spheres(&self) -> &[SphereEntry] {
        &self.spheres
    }

    pub fn instances(&self) -> &[MeshInstance] {
        &self.instances
    }

    pub fn meshes(&self) -> &[MeshInfo] {
        &self.meshes
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn material(&self, index: u32) -> &Material {
        &self.materials[index as usize]
    }

    /// Add the plane `normal · p = d`. Returns its index.
    pub fn push_plane(&mut self, normal: Vec3, d: f32, material: u32) -> SceneResult<usize> {
        check_capacity("planes", self.planes.len(), self.capacity.planes)?;
        self.planes.push(PlaneEntry {
            plane: Plane::new(normal.normalize(), d),
            material,
        });
        Ok(self.planes.len() - 1)
    }

    pub fn push_sphere(&mut self, center: Vec3, radius: f32, material: u32) -> SceneResult<usize> {
        check_capacity("spheres", self.spheres.len(), self.capacity.spheres)?;
        self.spheres.push(SphereEntry {
            sphere: Sphere::new(center, radius),
            material,
        });
        Ok(self.spheres.len() - 1)
    }

    /// Place an instance of registered mesh `mesh`. Returns the instance index.
    pub fn push_mesh(
        &mut self,
        mesh: u32,
        position: Vec3,
        rotation: Mat3,
        scale: Vec3,
        material: u32,
    ) -> SceneResult<usize> {
        check_capacity("mesh instances", self.instances.len(), self.capacity.instances)?;
        let transform = InstanceTransform::new(position, rotation, scale);
        if !transform.has_positive_scale() {
            return Err(SceneError::InvalidScale {
                instance: self.instances.len(),
            });
        }

        self.instances.push(MeshInstance {
            mesh,
            transform,
            material,
        });
        Ok(self.instances.len() - 1)
    }

    /// Register mesh data for instancing. The BVH is built later by
    /// [`World::preprocess_meshes`].
    pub fn push_mesh_info(&mut self, data: MeshData) -> SceneResult<u32> {
        check_capacity("meshes", self.meshes.len(), self.capacity.meshes)?;
        let mesh = self.meshes.len();
        data.validate()
            .map_err(|source| SceneError::InvalidMesh { mesh, source })?;

        self.meshes.push(MeshInfo { data, bvh: None });
        Ok(mesh as u32)
    }

    pub fn push_material(&mut self, material: Material) -> SceneResult<u32> {
        check_capacity("materials", self.materials.len(), self.capacity.materials)?;
        self.materials.push(material);
        Ok((self.materials.len() - 1) as u32)
    }

    /// Add a material whose albedo is sampled from `texture`.
    pub fn push_textured_material(&mut self, texture: Arc<Texture>) -> SceneResult<u32> {
        self.push_material(Material::textured(texture))
    }

    /// Build one BVH per registered mesh, replacing any earlier tree.
    ///
    /// Returns the statistics of each tree, in mesh order.
    pub fn preprocess_meshes(&mut self, verbose: bool) -> Vec<BvhStats> {
        log::info!(
            "Building BVHs for {} meshes (leaf below {} triangles, split needs {} per side)",
            self.meshes.len(),
            MIN_TRIANGLES_PER_LEAF,
            MIN_TRIANGLE_DIFFERENCE
        );

        let mut all_stats = Vec::with_capacity(self.meshes.len());
        for (index, info) in self.meshes.iter_mut().enumerate() {
            let start = Instant::now();
            let bvh = Bvh::build(&info.data.positions, &mut info.data.indices);
            let stats = BvhStats::compute(&bvh);

            log::info!(
                "Mesh {}: {} triangles, BVH built in {:.2} ms",
                index,
                info.data.triangle_count(),
                start.elapsed().as_secs_f64() * 1000.0
            );
            if verbose {
                log::info!("Mesh {} BVH:\n{}", index, stats);
            }

            info.bvh = Some(bvh);
            all_stats.push(stats);
        }
        all_stats
    }

    /// True once every registered mesh has a BVH.
    pub fn is_preprocessed(&self) -> bool {
        self.meshes.iter().all(|m| m.bvh.is_some())
    }

    /// Check every cross reference and that meshes are preprocessed.
    pub fn validate(&self) -> SceneResult<()> {
        let materials = self.materials.len();
        let check_material = |owner: String, index: u32| {
            if (index as usize) < materials {
                Ok(())
            } else {
                Err(SceneError::MissingMaterial {
                    owner,
                    index,
                    count: materials,
                })
            }
        };

        for (i, entry) in self.planes.iter().enumerate() {
            check_material(format!("Plane {}", i), entry.material)?;
        }
        for (i, entry) in self.spheres.iter().enumerate() {
            check_material(format!("Sphere {}", i), entry.material)?;
        }
        for (i, instance) in self.instances.iter().enumerate() {
            check_material(format!("Mesh instance {}", i), instance.material)?;
            if instance.mesh as usize >= self.meshes.len() {
                return Err(SceneError::MissingMesh {
                    instance: i,
                    index: instance.mesh,
                    count: self.meshes.len(),
                });
            }
        }
        if let Some(mesh) = self.meshes.iter().position(|m| m.bvh.is_none()) {
            return Err(SceneError::NotPreprocessed { mesh });
        }
        Ok(())
    }

    /// Closest hit along `ray` over planes, spheres and mesh instances.
    ///
    /// Hits at distance 0 or less are ignored. Mesh instances whose mesh has
    /// no BVH are skipped.
    pub fn intersect(&self, ray: &Ray, tests: &mut TriangleTests) -> Option<SceneHit> {
        let mut best: Option<SceneHit> = None;
        let mut best_distance = NO_HIT;

        for entry in &self.planes {
            let distance = entry.plane.intersect(ray);
            if distance > 0.0 && distance < best_distance {
                best_distance = distance;
                best = Some(SceneHit {
                    distance,
                    normal: entry.plane.normal,
                    uv: Vec2::ZERO,
                    material: entry.material,
                });
            }
        }

        for entry in &self.spheres {
            let distance = entry.sphere.intersect(ray);
            if distance > 0.0 && distance < best_distance {
                best_distance = distance;
                let normal = entry.sphere.normal_at(ray.at(distance));
                best = Some(SceneHit {
                    distance,
                    normal,
                    uv: sphere_uv(normal),
                    material: entry.material,
                });
            }
        }

        for instance in &self.instances {
            let Some(info) = self.meshes.get(instance.mesh as usize) else {
                continue;
            };
            let Some(bvh) = &info.bvh else {
                continue;
            };

            let xf = &instance.transform;
            let local_ray = xf.world_to_local_ray(ray);
            let local_best = xf.world_to_local_distance(best_distance);

            let Some(hit) = bvh.intersect(
                &info.data.positions,
                &info.data.indices,
                &local_ray,
                local_best,
                tests,
            ) else {
                continue;
            };

            let local_normal = hit.interpolate(&info.data.normals).normalize_or_zero();
            best_distance = xf.local_to_world_distance(hit.distance);
            best = Some(SceneHit {
                distance: best_distance,
                normal: xf.local_to_world_normal(local_normal),
                uv: hit.interpolate(&info.data.uvs),
                material: instance.material,
            });
        }

        best
    }
}

fn check_capacity(kind: &'static str, len: usize, capacity: usize) -> SceneResult<()> {
    if len < capacity {
        Ok(())
    } else {
        Err(SceneError::CapacityExceeded { kind, capacity })
    }
}
