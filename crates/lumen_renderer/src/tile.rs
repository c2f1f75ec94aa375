//! Tile grid and the multi-threaded tile scheduler.
//!
//! The image is cut into a grid of tiles issued centre-out so the middle of
//! the frame finishes first. Before any worker starts, the output pixels are
//! split into one [`TileTarget`] per tile: a set of row segments that only
//! that tile can write. Workers claim tiles through an atomic counter, render
//! into the claimed target and commit their counters with atomic adds.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use lumen_core::ImageBuffer;

use crate::sampler::tile_seeds;
use crate::triangle::TriangleTests;

/// Default number of tiles along each image axis.
pub const DEFAULT_TILE_COUNT: u32 = 16;

/// How long the coordinating thread sleeps between completion polls.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// A rectangular region of the image to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// X coordinate of the tile's top-left corner
    pub x: u32,
    /// Y coordinate of the tile's top-left corner
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Grid column and row
    pub column: u32,
    pub row: u32,
    /// Position in issue order
    pub index: usize,
    /// Seed of the tile's private random series
    pub seed: u64,
}

impl Tile {
    /// Get the total number of pixels in this tile.
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Grid of non-overlapping tiles covering an image exactly.
#[derive(Debug, Clone)]
pub struct TileGrid {
    width: u32,
    height: u32,
    /// `(x, width)` of each column
    columns: Vec<(u32, u32)>,
    /// `(y, height)` of each row
    rows: Vec<(u32, u32)>,
    /// Tiles in issue order
    tiles: Vec<Tile>,
}

impl TileGrid {
    /// Cut a `width x height` image into `tiles_x x tiles_y` tiles.
    ///
    /// The tile counts are clamped to `1..=width` and `1..=height` so no tile
    /// is empty; the last column and row absorb the remainder.
    pub fn new(width: u32, height: u32, tiles_x: u32, tiles_y: u32, seed: u64) -> Self {
        let columns = split_axis(width, tiles_x);
        let rows = split_axis(height, tiles_y);
        let seeds = tile_seeds(columns.len() * rows.len(), seed);

        let mut tiles = Vec::with_capacity(seeds.len());
        for (row, &(y, tile_height)) in rows.iter().enumerate() {
            for (column, &(x, tile_width)) in columns.iter().enumerate() {
                tiles.push(Tile {
                    x,
                    y,
                    width: tile_width,
                    height: tile_height,
                    column: column as u32,
                    row: row as u32,
                    index: 0,
                    seed: seeds[row * columns.len() + column],
                });
            }
        }

        sort_center_out(&mut tiles, width, height);
        for (i, tile) in tiles.iter_mut().enumerate() {
            tile.index = i;
        }

        Self {
            width,
            height,
            columns,
            rows,
            tiles,
        }
    }

    /// Tiles in issue order.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Hand out the pixels of `image` as one exclusive target per tile, in
    /// issue order. `image` must match the grid's dimensions.
    pub fn split<'a>(&self, image: &'a mut ImageBuffer) -> Vec<TileTarget<'a>> {
        debug_assert_eq!((image.width(), image.height()), (self.width, self.height));

        let columns = self.columns.len();
        let mut slot = vec![0usize; columns * self.rows.len()];
        for (i, tile) in self.tiles.iter().enumerate() {
            slot[tile.row as usize * columns + tile.column as usize] = i;
        }

        let mut targets: Vec<TileTarget<'a>> = self
            .tiles
            .iter()
            .map(|&tile| TileTarget {
                tile,
                rows: Vec::with_capacity(tile.height as usize),
            })
            .collect();

        let mut rest = image.pixels_mut();
        for (row, &(_, height)) in self.rows.iter().enumerate() {
            for _ in 0..height {
                let (mut line, tail) = std::mem::take(&mut rest).split_at_mut(self.width as usize);
                rest = tail;
                for (column, &(_, width)) in self.columns.iter().enumerate() {
                    let (segment, tail) = std::mem::take(&mut line).split_at_mut(width as usize);
                    line = tail;
                    targets[slot[row * columns + column]].rows.push(segment);
                }
            }
        }

        targets
    }
}

fn split_axis(extent: u32, count: u32) -> Vec<(u32, u32)> {
    let count = count.clamp(1, extent.max(1));
    let size = extent / count;
    (0..count)
        .map(|i| {
            let start = i * size;
            let len = if i + 1 == count { extent - start } else { size };
            (start, len)
        })
        .collect()
}

/// Sort tiles by distance from image center.
fn sort_center_out(tiles: &mut [Tile], width: u32, height: u32) {
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;
    let distance = |t: &Tile| {
        let x = t.x as f32 + t.width as f32 / 2.0 - center_x;
        let y = t.y as f32 + t.height as f32 / 2.0 - center_y;
        x * x + y * y
    };

    tiles.sort_by(|a, b| {
        distance(a)
            .partial_cmp(&distance(b))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Exclusive write access to one tile's pixels.
#[derive(Debug)]
pub struct TileTarget<'a> {
    tile: Tile,
    rows: Vec<&'a mut [[u8; 4]]>,
}

impl TileTarget<'_> {
    pub fn tile(&self) -> &Tile {
        &self.tile
    }

    /// Write a pixel at tile-local coordinates.
    pub fn set(&mut self, x: u32, y: u32, pixel: [u8; 4]) {
        self.rows[y as usize][x as usize] = pixel;
    }

    /// Row `y` of the tile, `tile().width` pixels long.
    pub fn row_mut(&mut self, y: u32) -> &mut [[u8; 4]] {
        &mut self.rows[y as usize]
    }
}

/// What a worker adds to the shared totals when it commits a tile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileWork {
    pub rays: u64,
    pub tests: TriangleTests,
}

/// Shared counters updated by every worker with atomic adds.
#[derive(Debug, Default)]
pub struct RenderCounters {
    pub tiles_completed: AtomicUsize,
    pub rays_cast: AtomicU64,
    pub triangle_tests: AtomicU64,
    pub triangle_hits: AtomicU64,
}

impl RenderCounters {
    fn commit(&self, work: &TileWork) {
        self.triangle_tests.fetch_add(work.tests.total, Ordering::Relaxed);
        self.triangle_hits.fetch_add(work.tests.passed, Ordering::Relaxed);
        self.rays_cast.fetch_add(work.rays, Ordering::Relaxed);
        self.tiles_completed.fetch_add(1, Ordering::Release);
    }
}

struct TileQueue<'a> {
    next: AtomicUsize,
    slots: Vec<Mutex<Option<TileTarget<'a>>>>,
}

impl<'a> TileQueue<'a> {
    fn new(targets: Vec<TileTarget<'a>>) -> Self {
        Self {
            next: AtomicUsize::new(0),
            slots: targets.into_iter().map(|t| Mutex::new(Some(t))).collect(),
        }
    }

    fn len(&self) -> usize {
        self.slots.len()
    }

    /// Claim the next unrendered tile; `None` once every tile is taken.
    fn claim(&self) -> Option<TileTarget<'a>> {
        let index = self.next.fetch_add(1, Ordering::Relaxed);
        let slot = self.slots.get(index)?;
        slot.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

/// Progress lines in 10% steps, written only by the coordinating thread.
struct Progress {
    total_rays: u64,
    reported: u64,
}

impl Progress {
    fn report(&mut self, counters: &RenderCounters) {
        if self.total_rays == 0 {
            return;
        }
        let done = counters.rays_cast.load(Ordering::Relaxed);
        let step = (done.saturating_mul(10) / self.total_rays).min(10);
        if step > self.reported {
            self.reported = step;
            log::info!("Rendering: {}% ({} rays)", step * 10, done);
        }
    }
}

/// Render every target on `threads` threads, the calling thread included.
///
/// `threads - 1` workers are spawned; the calling thread works too, then
/// polls the completion counter until every tile is committed. It is the only
/// thread that reports progress.
///
/// Polling also stops once every worker has exited, so a panic while
/// rendering a tile is re-raised here instead of leaving the tile uncommitted.
pub fn run_tiles<F>(
    targets: Vec<TileTarget<'_>>,
    threads: usize,
    total_rays: u64,
    counters: &RenderCounters,
    render_tile: F,
) where
    F: Fn(&mut TileTarget<'_>) -> TileWork + Sync,
{
    let queue = TileQueue::new(targets);
    let queue = &queue;
    let render_tile = &render_tile;

    thread::scope(|scope| {
        let workers: Vec<_> = (1..threads.max(1))
            .map(|_| scope.spawn(move || run_worker(queue, counters, render_tile, None)))
            .collect();

        let mut progress = Progress {
            total_rays,
            reported: 0,
        };
        run_worker(queue, counters, render_tile, Some(&mut progress));

        while counters.tiles_completed.load(Ordering::Acquire) < queue.len()
            && !workers.iter().all(|worker| worker.is_finished())
        {
            progress.report(counters);
            thread::sleep(POLL_INTERVAL);
        }
        progress.report(counters);
    });
}

fn run_worker<F>(
    queue: &TileQueue<'_>,
    counters: &RenderCounters,
    render_tile: &F,
    mut progress: Option<&mut Progress>,
) where
    F: Fn(&mut TileTarget<'_>) -> TileWork,
{
    while let Some(mut target) = queue.claim() {
        let work = render_tile(&mut target);
        counters.commit(&work);
        if let Some(progress) = progress.as_deref_mut() {
            progress.report(counters);
        }
    }
}
