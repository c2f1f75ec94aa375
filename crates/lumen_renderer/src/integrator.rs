//! Iterative path tracing along a single ray.

use lumen_core::Color;
use lumen_math::{Ray, Vec3};
use rand::RngCore;

use crate::material::{random_in_hemisphere, reflect, refract, Surface};
use crate::triangle::TriangleTests;
use crate::world::World;

/// Offset along the normal applied after a specular/diffuse bounce.
const NORMAL_BIAS: f32 = 1e-6;

/// Offset along the ray applied after a refraction.
const REFRACTION_BIAS: f32 = 1e-4;

/// Estimate the radiance arriving at `origin` from `direction`.
///
/// Follows up to `bounces` surface interactions. A miss adds the background
/// weighted by the path throughput and ends the path; running out of bounces
/// returns whatever light was gathered so far. The result is always finite.
pub fn cast_ray(
    world: &World,
    origin: Vec3,
    direction: Vec3,
    bounces: u32,
    rng: &mut dyn RngCore,
    tests: &mut TriangleTests,
) -> Color {
    let mut result = Color::ZERO;
    let mut attenuation = Color::ONE;
    let mut ray = Ray::new(origin, direction);

    for _ in 0..bounces {
        let Some(hit) = world.intersect(&ray, tests) else {
            result += attenuation * world.background;
            break;
        };

        let material = world.material(hit.material);
        let albedo = material.albedo_at(hit.uv);
        result += attenuation * material.emit;

        let normal = hit.normal;
        let cos = (-ray.direction).dot(normal).max(0.0);
        attenuation *= albedo * cos;

        let point = ray.at(hit.distance);
        ray = match material.surface {
            Surface::Specular { specularity } => {
                let mirror = reflect(ray.direction, normal);
                let random = random_in_hemisphere(normal, rng);
                let direction = random.lerp(mirror, specularity).try_normalize().unwrap_or(normal);
                Ray::new(point + normal * NORMAL_BIAS, direction)
            }
            Surface::Refractive { inv_ior } => {
                let refracted = refract(ray.direction, normal, inv_ior);
                // Total internal reflection
                let direction = refracted
                    .try_normalize()
                    .unwrap_or_else(|| reflect(ray.direction, normal));
                Ray::new(point + ray.direction * REFRACTION_BIAS, direction)
            }
        };

        if attenuation == Color::ZERO {
            break;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;
    use lumen_core::MeshData;
    use lumen_math::Mat3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn cast(world: &World, origin: Vec3, direction: Vec3, bounces: u32) -> Color {
        let mut rng = StdRng::seed_from_u64(42);
        let mut tests = TriangleTests::default();
        cast_ray(world, origin, direction, bounces, &mut rng, &mut tests)
    }

    #[test]
    fn test_empty_scene_returns_background() {
        let world = World::default().with_background(Color::new(0.1, 0.2, 0.3));

        for direction in [Vec3::X, -Vec3::Z, Vec3::new(1.0, 1.0, 1.0).normalize()] {
            assert_eq!(cast(&world, Vec3::ZERO, direction, 8), Color::new(0.1, 0.2, 0.3));
        }
    }

    #[test]
    fn test_emitter_seen_directly() {
        let mut world = World::default().with_background(Color::ZERO);
        let light = world.push_material(Material::light(Color::splat(5.0))).unwrap();
        world.push_sphere(Vec3::ZERO, 1.0, light).unwrap();

        let color = cast(&world, Vec3::new(0.0, 0.0, 5.0), -Vec3::Z, 4);
        assert_eq!(color, Color::splat(5.0));
    }

    #[test]
    fn test_perfect_mirror_reflects_background() {
        let mut world = World::default().with_background(Color::ONE);
        let mirror = world.push_material(Material::specular(Color::splat(0.5), 1.0)).unwrap();
        world.push_plane(Vec3::Z, 0.0, mirror).unwrap();

        // Straight down: cos = 1, bounce straight back up into the sky
        let color = cast(&world, Vec3::new(0.0, 0.0, 1.0), -Vec3::Z, 4);
        assert!((color - Color::splat(0.5)).length() < 1e-5);
    }

    #[test]
    fn test_single_bounce_gathers_only_emission() {
        let mut world = World::default().with_background(Color::ONE);
        let m = world
            .push_material(Material::diffuse(Color::ONE).with_emission(Color::splat(0.25)))
            .unwrap();
        world.push_plane(Vec3::Z, 0.0, m).unwrap();

        // The bounce budget runs out before the sky is reached
        let color = cast(&world, Vec3::new(0.0, 0.0, 1.0), -Vec3::Z, 1);
        assert_eq!(color, Color::splat(0.25));
    }

    #[test]
    fn test_diffuse_result_is_finite_and_bounded() {
        let mut world = World::default().with_background(Color::ONE);
        let grey = world.push_material(Material::diffuse(Color::splat(0.5))).unwrap();
        world.push_plane(Vec3::Z, 0.0, grey).unwrap();
        world.push_sphere(Vec3::new(0.0, 0.0, 1.0), 1.0, grey).unwrap();

        let mut rng = StdRng::seed_from_u64(42);
        let mut tests = TriangleTests::default();
        for _ in 0..500 {
            let c = cast_ray(&world, Vec3::new(0.0, -5.0, 1.0), Vec3::Y, 8, &mut rng, &mut tests);
            assert!(c.is_finite());
            assert!(c.min_element() >= 0.0 && c.max_element() <= 1.0);
        }
    }

    #[test]
    fn test_total_internal_reflection_stays_finite() {
        let mut world = World::default().with_background(Color::ONE);
        // Index below 1 makes grazing rays reflect totally
        let glass = world.push_material(Material::refractive(Color::ONE, 0.5)).unwrap();
        world.push_plane(Vec3::Z, 0.0, glass).unwrap();

        let direction = Vec3::new(1.0, 0.0, -0.3).normalize();
        let color = cast(&world, Vec3::new(0.0, 0.0, 1.0), direction, 4);
        assert!(color.is_finite());
    }

    #[test]
    fn test_mesh_instances_count_triangle_tests() {
        let mut world = World::default().with_background(Color::ZERO);
        let light = world.push_material(Material::light(Color::ONE)).unwrap();
        let mesh = world
            .push_mesh_info(MeshData::from_positions(
                vec![
                    Vec3::new(-1.0, -1.0, 0.0),
                    Vec3::new(1.0, -1.0, 0.0),
                    Vec3::new(0.0, 1.0, 0.0),
                ],
                vec![0, 1, 2],
            ))
            .unwrap();
        world.push_mesh(mesh, Vec3::ZERO, Mat3::IDENTITY, Vec3::ONE, light).unwrap();
        world.preprocess_meshes(false);

        let mut rng = StdRng::seed_from_u64(42);
        let mut tests = TriangleTests::default();
        let color = cast_ray(&world, Vec3::new(0.0, 0.0, 3.0), -Vec3::Z, 1, &mut rng, &mut tests);

        assert_eq!(color, Color::ONE);
        assert_eq!(tests, TriangleTests { total: 1, passed: 1 });
    }
}
