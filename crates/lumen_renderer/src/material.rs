//! Surface materials and scattering helpers.

use std::sync::Arc;

use lumen_core::{Color, Texture};
use lumen_math::{Vec2, Vec3};
use rand::RngCore;

use crate::sampler::gen_f32;

/// How a surface redirects light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Surface {
    /// Blend between a random hemisphere bounce (0) and a perfect mirror (1).
    Specular { specularity: f32 },
    /// Transmits through the surface; stores `1 / index_of_refraction`.
    Refractive { inv_ior: f32 },
}

/// A material: flat or textured albedo, emission and a surface response.
#[derive(Debug, Clone)]
pub struct Material {
    pub albedo: Color,
    pub emit: Color,
    pub surface: Surface,
    /// Overrides `albedo` when present
    pub texture: Option<Arc<Texture>>,
}

impl Material {
    /// Lambert-like diffuse surface.
    pub fn diffuse(albedo: Color) -> Self {
        Self::specular(albedo, 0.0)
    }

    /// Surface with the given specularity, clamped to `[0, 1]`.
    pub fn specular(albedo: Color, specularity: f32) -> Self {
        Self {
            albedo,
            emit: Color::ZERO,
            surface: Surface::Specular {
                specularity: specularity.clamp(0.0, 1.0),
            },
            texture: None,
        }
    }

    /// Transmissive surface with the given index of refraction.
    pub fn refractive(albedo: Color, ior: f32) -> Self {
        Self {
            albedo,
            emit: Color::ZERO,
            surface: Surface::Refractive { inv_ior: 1.0 / ior },
            texture: None,
        }
    }

    /// Black diffuse surface that only emits.
    pub fn light(emit: Color) -> Self {
        Self::diffuse(Color::ZERO).with_emission(emit)
    }

    /// Diffuse surface whose albedo comes entirely from a texture.
    pub fn textured(texture: Arc<Texture>) -> Self {
        Self::diffuse(Color::ZERO).with_texture(texture)
    }

    pub fn with_emission(mut self, emit: Color) -> Self {
        self.emit = emit;
        self
    }

    pub fn with_texture(mut self, texture: Arc<Texture>) -> Self {
        self.texture = Some(texture);
        self
    }

    /// Albedo at a surface point, sampled bilinearly when textured.
    pub fn albedo_at(&self, uv: Vec2) -> Color {
        match &self.texture {
            Some(texture) => texture.sample(uv),
            None => self.albedo,
        }
    }
}

// =============================================================================
// Helper functions
// =============================================================================

/// Reflect a vector about a normal.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract `incident` through a surface with normal `n` facing against it.
///
/// `eta` is the ratio of refractive indices. Returns zero on total internal
/// reflection.
#[inline]
pub fn refract(incident: Vec3, n: Vec3, eta: f32) -> Vec3 {
    let cos = n.dot(incident);
    let k = 1.0 - eta * eta * (1.0 - cos * cos);
    if k < 0.0 {
        Vec3::ZERO
    } else {
        eta * incident - (eta * cos + k.sqrt()) * n
    }
}

/// Generate a random unit vector on the unit sphere.
pub fn random_unit_vector(rng: &mut dyn RngCore) -> Vec3 {
    // Use rejection sampling for uniform distribution on sphere
    loop {
        let v = Vec3::new(
            gen_f32(rng) * 2.0 - 1.0,
            gen_f32(rng) * 2.0 - 1.0,
            gen_f32(rng) * 2.0 - 1.0,
        );
        let len_sq = v.length_squared();
        if len_sq > 1e-6 && len_sq <= 1.0 {
            return v / len_sq.sqrt();
        }
    }
}

/// Uniform random unit vector in the hemisphere around `normal`.
pub fn random_in_hemisphere(normal: Vec3, rng: &mut dyn RngCore) -> Vec3 {
    let v = random_unit_vector(rng);
    if v.dot(normal) < 0.0 {
        -v
    } else {
        v
    }
}
