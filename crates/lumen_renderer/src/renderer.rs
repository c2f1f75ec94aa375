//! Multi-threaded tile renderer.
//!
//! A render validates its settings and the world, precomputes the pixel
//! sample pattern, cuts the image into tiles and hands them to the tile
//! scheduler. Each tile averages `rays_per_pixel` integrator samples per pixel
//! with its own random series and writes sRGB pixels straight into its slice
//! of the output image.

use std::fmt;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use lumen_core::{color_to_rgba, Color, ImageBuffer};
use lumen_math::{Film, PinholeCamera, Vec2};

use crate::error::RenderResult;
use crate::integrator::cast_ray;
use crate::sampler::{sample_offsets, tile_rng};
use crate::settings::RenderSettings;
use crate::tile::{run_tiles, RenderCounters, TileGrid, TileTarget, TileWork};
use crate::triangle::TriangleTests;
use crate::world::World;

/// Aggregate counters of a finished render.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RenderStats {
    pub rays_cast: u64,
    pub triangle_tests: TriangleTests,
    pub elapsed: Duration,
    pub tiles: usize,
    pub threads: u32,
}

impl RenderStats {
    /// Fraction of triangle tests that hit, 0 when none were run.
    pub fn pass_ratio(&self) -> f64 {
        if self.triangle_tests.total == 0 {
            return 0.0;
        }
        self.triangle_tests.passed as f64 / self.triangle_tests.total as f64
    }

    /// Millions of primary rays per second.
    pub fn mrays_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.rays_cast as f64 / secs / 1_000_000.0
    }
}

impl fmt::Display for RenderStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Render statistics")?;
        writeln!(f, "  Tiles:           {} on {} threads", self.tiles, self.threads)?;
        writeln!(f, "  Rays cast:       {}", self.rays_cast)?;
        writeln!(
            f,
            "  Triangle tests:  {} / {} passed ({:.2}%)",
            self.triangle_tests.passed,
            self.triangle_tests.total,
            self.pass_ratio() * 100.0
        )?;
        writeln!(f, "  Elapsed:         {:.3} s", self.elapsed.as_secs_f64())?;
        write!(f, "  Performance:     {:.3} MRays/s", self.mrays_per_second())
    }
}

/// Finished image plus the counters gathered while rendering it.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub image: ImageBuffer,
    pub stats: RenderStats,
}

/// Renders worlds with a fixed set of settings.
#[derive(Debug, Clone)]
pub struct Renderer {
    settings: RenderSettings,
}

impl Renderer {
    /// Create a renderer, rejecting settings outside their supported ranges.
    pub fn new(settings: RenderSettings) -> RenderResult<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Render `world` as seen through `camera`.
    ///
    /// The world must be preprocessed; it is only read while rendering.
    pub fn render(&self, world: &World, camera: &PinholeCamera) -> RenderResult<RenderOutput> {
        render(world, camera, &self.settings)
    }
}

/// Render `world` as seen through `camera` with `settings`.
pub fn render(
    world: &World,
    camera: &PinholeCamera,
    settings: &RenderSettings,
) -> RenderResult<RenderOutput> {
    settings.validate()?;
    world.validate()?;

    let start = Instant::now();
    let film = camera.film(settings.width, settings.height);
    let offsets = sample_offsets(settings.rays_per_pixel, settings.seed);
    let grid = TileGrid::new(
        settings.width,
        settings.height,
        settings.tiles_x,
        settings.tiles_y,
        settings.seed,
    );

    log::info!(
        "Rendering {}x{}, {} rays per pixel, {} bounces: {} tiles on {} threads",
        settings.width,
        settings.height,
        settings.rays_per_pixel,
        settings.bounces,
        grid.len(),
        settings.threads
    );

    let mut image = ImageBuffer::new(settings.width, settings.height);
    let counters = RenderCounters::default();
    let targets = grid.split(&mut image);
    run_tiles(
        targets,
        settings.threads as usize,
        settings.total_rays(),
        &counters,
        |target| render_tile(world, &film, &offsets, settings.bounces, target),
    );

    let stats = RenderStats {
        rays_cast: counters.rays_cast.load(Ordering::Acquire),
        triangle_tests: TriangleTests {
            total: counters.triangle_tests.load(Ordering::Acquire),
            passed: counters.triangle_hits.load(Ordering::Acquire),
        },
        elapsed: start.elapsed(),
        tiles: counters.tiles_completed.load(Ordering::Acquire),
        threads: settings.threads,
    };
    log::info!("{}", stats);

    Ok(RenderOutput { image, stats })
}

fn render_tile(
    world: &World,
    film: &Film,
    offsets: &[Vec2],
    bounces: u32,
    target: &mut TileTarget<'_>,
) -> TileWork {
    let tile = *target.tile();
    let mut rng = tile_rng(tile.seed);
    let mut tests = TriangleTests::default();
    let scale = 1.0 / offsets.len() as f32;

    for y in 0..tile.height {
        for x in 0..tile.width {
            let mut color = Color::ZERO;
            for &offset in offsets {
                let ray = film.ray(tile.x + x, tile.y + y, offset);
                color += cast_ray(world, ray.origin, ray.direction, bounces, &mut rng, &mut tests);
            }
            target.set(x, y, color_to_rgba(color * scale));
        }
    }

    TileWork {
        rays: tile.pixel_count() * offsets.len() as u64,
        tests,
    }
}
