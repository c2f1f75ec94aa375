//! Errors surfaced before rendering starts.
//!
//! Everything that can go wrong with a scene or a configuration is reported
//! here, up front. Per-ray geometric degeneracies are never errors.

use lumen_core::MeshError;
use thiserror::Error;

/// Invalid scene construction.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Capacity for {kind} exceeded ({capacity})")]
    CapacityExceeded { kind: &'static str, capacity: usize },

    #[error("{owner} references material {index}, but only {count} materials exist")]
    MissingMaterial {
        owner: String,
        index: u32,
        count: usize,
    },

    #[error("Mesh instance {instance} references mesh {index}, but only {count} meshes exist")]
    MissingMesh {
        instance: usize,
        index: u32,
        count: usize,
    },

    #[error("Mesh {mesh} is invalid: {source}")]
    InvalidMesh {
        mesh: usize,
        #[source]
        source: MeshError,
    },

    #[error("Mesh instance {instance} has a scale component that is not finite and positive")]
    InvalidScale { instance: usize },

    #[error("Mesh {mesh} has no BVH; preprocess the world before rendering")]
    NotPreprocessed { mesh: usize },
}

pub type SceneResult<T> = Result<T, SceneError>;

/// Render settings outside their supported ranges.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Resolution {width}x{height} is outside 1..=65536")]
    Resolution { width: u32, height: u32 },

    #[error("Rays per pixel {0} is outside 1..=4096")]
    RaysPerPixel(u32),

    #[error("Bounce limit {0} is outside 1..=65536")]
    Bounces(u32),

    #[error("Thread count {0} is outside 1..=512")]
    Threads(u32),

    #[error("Tile grid {tiles_x}x{tiles_y} must be at least 1x1")]
    TileGrid { tiles_x: u32, tiles_y: u32 },
}

/// Any failure that prevents a render from running.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid scene: {0}")]
    Scene(#[from] SceneError),

    #[error("Invalid settings: {0}")]
    Config(#[from] ConfigError),
}

pub type RenderResult<T> = Result<T, RenderError>;
