//! Small sphere scene rendered on every available core.
//!
//! Saves `spheres.png` in the working directory.

use lumen_renderer::{
    Color, Material, PinholeCamera, RenderSettings, Renderer, Vec3, World,
};

fn main() {
    println!("Lumen - Sphere Example");
    println!("======================");

    let world = build_scene();
    let camera = PinholeCamera::look_at(
        Vec3::new(0.0, -8.0, 2.0), // position
        Vec3::new(0.0, 0.0, 0.8),  // target
        Vec3::Z,                   // up
    );

    let threads = std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1);
    let settings = RenderSettings {
        width: 480,
        height: 270,
        rays_per_pixel: 32,
        bounces: 6,
        threads,
        ..Default::default()
    };

    println!(
        "Rendering {}x{} @ {} rays per pixel on {} threads...",
        settings.width, settings.height, settings.rays_per_pixel, settings.threads
    );

    let renderer = Renderer::new(settings).expect("Invalid settings");
    let output = renderer.render(&world, &camera).expect("Render failed");
    println!("{}", output.stats);

    let filename = "spheres.png";
    output.image.save(filename).expect("Failed to save image");
    println!("Saved to {}", filename);
}

fn build_scene() -> World {
    let mut world = World::default();

    let ground = world.push_material(Material::diffuse(Color::new(0.5, 0.5, 0.5))).unwrap();
    let brown = world.push_material(Material::diffuse(Color::new(0.4, 0.2, 0.1))).unwrap();
    let metal = world.push_material(Material::specular(Color::new(0.7, 0.6, 0.5), 0.95)).unwrap();
    let glass = world.push_material(Material::refractive(Color::ONE, 1.5)).unwrap();
    let light = world.push_material(Material::light(Color::new(6.0, 5.5, 5.0))).unwrap();

    world.push_plane(Vec3::Z, 0.0, ground).unwrap();
    world.push_sphere(Vec3::new(-2.2, 0.0, 1.0), 1.0, brown).unwrap();
    world.push_sphere(Vec3::new(0.0, 0.0, 1.0), 1.0, glass).unwrap();
    world.push_sphere(Vec3::new(2.2, 0.0, 1.0), 1.0, metal).unwrap();
    world.push_sphere(Vec3::new(0.0, 3.0, 5.0), 1.5, light).unwrap();

    world.preprocess_meshes(false);
    world
}
