use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use lumen_renderer::{render, RenderSettings};

mod scene;

/// Offline CPU path tracer.
#[derive(Parser, Debug)]
#[command(name = "lumen", version, about = "Render the Lumen demo scene to an image file")]
struct Args {
    /// Output image; the format follows the extension (BMP when there is none)
    output: PathBuf,

    /// Output resolution
    #[arg(short = 'o', num_args = 2, value_names = ["WIDTH", "HEIGHT"])]
    resolution: Option<Vec<u32>>,

    /// Rays per pixel
    #[arg(short = 'r', value_name = "RAYS")]
    rays: Option<u32>,

    /// Bounces per ray
    #[arg(short = 'b', value_name = "BOUNCES")]
    bounces: Option<u32>,

    /// Worker threads, this one included
    #[arg(short = 'j', value_name = "THREADS")]
    threads: Option<u32>,

    /// Only build the mesh BVHs and print their statistics
    #[arg(short = 'p')]
    preprocess_only: bool,

    /// Tile grid size
    #[arg(long, num_args = 2, value_names = ["X", "Y"])]
    tiles: Option<Vec<u32>>,

    /// Seed for sampling
    #[arg(long)]
    seed: Option<u64>,

    /// Wavefront OBJ mesh to instance instead of the built-in torus
    #[arg(long, value_name = "FILE.obj")]
    mesh: Option<PathBuf>,

    /// JSON render settings; command line values take precedence
    #[arg(long, value_name = "FILE.json")]
    config: Option<PathBuf>,

    /// Image used as the albedo of the centre sphere
    #[arg(long, value_name = "FILE")]
    texture: Option<PathBuf>,

    /// Log BVH statistics for every mesh
    #[arg(short = 'v', long)]
    verbose: bool,
}

/// Defaults, then the JSON file, then command line flags.
fn resolve_settings(args: &Args) -> Result<RenderSettings> {
    let mut settings = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        }
        None => RenderSettings::default(),
    };

    if let Some(res) = &args.resolution {
        settings.width = res[0];
        settings.height = res[1];
    }
    if let Some(tiles) = &args.tiles {
        settings.tiles_x = tiles[0];
        settings.tiles_y = tiles[1];
    }
    settings.rays_per_pixel = args.rays.unwrap_or(settings.rays_per_pixel);
    settings.bounces = args.bounces.unwrap_or(settings.bounces);
    settings.threads = args.threads.unwrap_or(settings.threads);
    settings.seed = args.seed.unwrap_or(settings.seed);
    settings.preprocess_only |= args.preprocess_only;
    settings.verbose_preprocess |= args.verbose;

    settings.validate().context("Invalid render settings")?;
    Ok(settings)
}

fn output_path(output: &Path) -> PathBuf {
    if output.extension().is_some() {
        output.to_path_buf()
    } else {
        output.with_extension("bmp")
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let settings = resolve_settings(&args)?;

    log::info!("Starting Lumen");

    let mut world = scene::build(args.mesh.as_deref(), args.texture.as_deref())?;
    let tree_stats = world.preprocess_meshes(settings.verbose_preprocess);

    if settings.preprocess_only {
        for (index, stats) in tree_stats.iter().enumerate() {
            println!("Mesh {}:\n{}", index, stats);
        }
        return Ok(());
    }

    let output = render(&world, &scene::camera(), &settings).context("Render failed")?;

    let path = output_path(&args.output);
    output
        .image
        .save(&path)
        .with_context(|| format!("Failed to save {}", path.display()))?;

    println!("{}", output.stats);
    log::info!("Saved {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("lumen").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_parse_all_flags() {
        let args = parse(&[
            "out.png", "-o", "640", "480", "-r", "16", "-b", "4", "-j", "2", "-p", "--tiles", "8",
            "4", "--seed", "5",
        ]);

        assert_eq!(args.output, PathBuf::from("out.png"));
        assert_eq!(args.resolution, Some(vec![640, 480]));
        assert_eq!(args.rays, Some(16));
        assert_eq!(args.bounces, Some(4));
        assert_eq!(args.threads, Some(2));
        assert!(args.preprocess_only);
        assert_eq!(args.tiles, Some(vec![8, 4]));
        assert_eq!(args.seed, Some(5));
    }

    #[test]
    fn test_output_is_required() {
        assert!(Args::try_parse_from(["lumen", "-r", "4"]).is_err());
    }

    #[test]
    fn test_defaults_without_flags() {
        let settings = resolve_settings(&parse(&["out.bmp"])).unwrap();
        assert_eq!(settings, RenderSettings::default());
    }

    #[test]
    fn test_command_line_overrides_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "width": 320, "height": 200, "rays_per_pixel": 64, "threads": 3 }}"#)
            .unwrap();
        let config = file.path().to_str().unwrap();

        let settings = resolve_settings(&parse(&["out.bmp", "--config", config, "-r", "2"])).unwrap();

        assert_eq!((settings.width, settings.height), (320, 200));
        assert_eq!(settings.threads, 3);
        assert_eq!(settings.rays_per_pixel, 2);
        assert_eq!(settings.bounces, RenderSettings::default().bounces);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(resolve_settings(&parse(&["out.bmp", "-j", "0"])).is_err());
        assert!(resolve_settings(&parse(&["out.bmp", "-j", "513"])).is_err());
        assert!(resolve_settings(&parse(&["out.bmp", "-b", "0"])).is_err());
        assert!(resolve_settings(&parse(&["out.bmp", "-o", "0", "10"])).is_err());
        assert!(resolve_settings(&parse(&["out.bmp", "--config", "/nonexistent/lumen.json"])).is_err());
    }

    #[test]
    fn test_output_defaults_to_bmp() {
        assert_eq!(output_path(Path::new("render")), PathBuf::from("render.bmp"));
        assert_eq!(output_path(Path::new("render.png")), PathBuf::from("render.png"));
    }
}
