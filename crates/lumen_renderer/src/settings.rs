//! Render configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::tile::DEFAULT_TILE_COUNT;

/// Largest supported image dimension.
pub const MAX_RESOLUTION: u32 = 65_536;

/// Largest supported number of rays per pixel.
pub const MAX_RAYS_PER_PIXEL: u32 = 4096;

/// Largest supported bounce limit.
pub const MAX_BOUNCES: u32 = 65_536;

/// Largest supported worker thread count.
pub const MAX_THREADS: u32 = 512;

/// Settings for one render.
///
/// Missing fields take their default when deserialized, so a settings file
/// only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Samples per pixel, box filtered
    pub rays_per_pixel: u32,
    /// Maximum surface interactions per path
    pub bounces: u32,
    /// Worker threads, the calling thread included
    pub threads: u32,
    /// Tile grid columns
    pub tiles_x: u32,
    /// Tile grid rows
    pub tiles_y: u32,
    /// Seed for the sample pattern and every tile's random series
    pub seed: u64,
    /// Build acceleration structures and stop before rendering
    pub preprocess_only: bool,
    /// Log tree statistics for every mesh during preprocessing
    pub verbose_preprocess: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            rays_per_pixel: 8,
            bounces: 8,
            threads: 8,
            tiles_x: DEFAULT_TILE_COUNT,
            tiles_y: DEFAULT_TILE_COUNT,
            seed: 0,
            preprocess_only: false,
            verbose_preprocess: false,
        }
    }
}

impl RenderSettings {
    /// Check every value against its supported range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let in_range = |v: u32, max: u32| (1..=max).contains(&v);

        if !in_range(self.width, MAX_RESOLUTION) || !in_range(self.height, MAX_RESOLUTION) {
            return Err(ConfigError::Resolution {
                width: self.width,
                height: self.height,
            });
        }
        if !in_range(self.rays_per_pixel, MAX_RAYS_PER_PIXEL) {
            return Err(ConfigError::RaysPerPixel(self.rays_per_pixel));
        }
        if !in_range(self.bounces, MAX_BOUNCES) {
            return Err(ConfigError::Bounces(self.bounces));
        }
        if !in_range(self.threads, MAX_THREADS) {
            return Err(ConfigError::Threads(self.threads));
        }
        if self.tiles_x == 0 || self.tiles_y == 0 {
            return Err(ConfigError::TileGrid {
                tiles_x: self.tiles_x,
                tiles_y: self.tiles_y,
            });
        }
        Ok(())
    }

    /// Total number of primary rays the render will cast.
    pub fn total_rays(&self) -> u64 {
        self.width as u64 * self.height as u64 * self.rays_per_pixel as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = RenderSettings::default();
        assert_eq!(settings.validate(), Ok(()));
        assert_eq!((settings.width, settings.height), (1920, 1080));
        assert_eq!(settings.total_rays(), 1920 * 1080 * 8);
    }

    #[test]
    fn test_out_of_range_values() {
        let base = RenderSettings::default();

        let s = RenderSettings { width: 0, ..base.clone() };
        assert_eq!(s.validate(), Err(ConfigError::Resolution { width: 0, height: 1080 }));

        let s = RenderSettings { height: MAX_RESOLUTION + 1, ..base.clone() };
        assert!(matches!(s.validate(), Err(ConfigError::Resolution { .. })));

        let s = RenderSettings { rays_per_pixel: MAX_RAYS_PER_PIXEL + 1, ..base.clone() };
        assert_eq!(s.validate(), Err(ConfigError::RaysPerPixel(4097)));

        let s = RenderSettings { bounces: 0, ..base.clone() };
        assert_eq!(s.validate(), Err(ConfigError::Bounces(0)));

        let s = RenderSettings { threads: 0, ..base.clone() };
        assert_eq!(s.validate(), Err(ConfigError::Threads(0)));

        let s = RenderSettings { threads: 513, ..base.clone() };
        assert_eq!(s.validate(), Err(ConfigError::Threads(513)));

        let s = RenderSettings { tiles_y: 0, ..base };
        assert_eq!(s.validate(), Err(ConfigError::TileGrid { tiles_x: 16, tiles_y: 0 }));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: RenderSettings =
            serde_json::from_str(r#"{ "width": 320, "height": 240, "seed": 7 }"#).unwrap();

        assert_eq!(settings.width, 320);
        assert_eq!(settings.height, 240);
        assert_eq!(settings.seed, 7);
        assert_eq!(settings.rays_per_pixel, 8);
        assert_eq!(settings.tiles_x, DEFAULT_TILE_COUNT);
        assert!(!settings.preprocess_only);
    }

    #[test]
    fn test_json_round_trip() {
        let settings = RenderSettings {
            threads: 3,
            preprocess_only: true,
            ..Default::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        let back: RenderSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }
}
