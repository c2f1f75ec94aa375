use glam::{Vec2, Vec3};

use crate::Ray;

/// Pinhole camera described by a position and an orthonormal basis.
///
/// `z` points from the eye towards the scene; `x` and `y` span the film,
/// which sits behind the eye and is therefore mirrored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinholeCamera {
    pub position: Vec3,
    pub x: Vec3,
    pub y: Vec3,
    pub z: Vec3,
}

impl PinholeCamera {
    /// Aim a camera at `target` with the given world up vector.
    pub fn look_at(position: Vec3, target: Vec3, up: Vec3) -> Self {
        let z = (target - position).normalize();
        let x = up.cross(z).normalize();
        let y = z.cross(x).normalize();
        Self { position, x, y, z }
    }

    /// Film plane for an image of the given resolution.
    pub fn film(&self, width: u32, height: u32) -> Film {
        Film::new(*self, width, height)
    }
}

/// Film plane placed one unit behind the pinhole.
///
/// The larger image dimension spans one unit of film and the other is scaled
/// by the aspect ratio. Rays start on the film and pass through the pinhole, so
/// the film is mirrored: pixel row 0 ends up at the top of the image.
#[derive(Debug, Clone, Copy)]
pub struct Film {
    camera: PinholeCamera,
    width: u32,
    height: u32,
    center: Vec3,
    half_extent: Vec2,
    half_pixel: Vec2,
}

impl Film {
    pub fn new(camera: PinholeCamera, width: u32, height: u32) -> Self {
        let (w, h) = (width as f32, height as f32);
        let (film_w, film_h) = if w > h { (1.0, h / w) } else { (w / h, 1.0) };

        Self {
            camera,
            width,
            height,
            center: camera.position - camera.z,
            half_extent: Vec2::new(0.5 * film_w, 0.5 * film_h),
            half_pixel: Vec2::new(1.0 / w, 1.0 / h),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Primary ray for pixel `(x, y)`.
    ///
    /// The pixel maps to film coordinate `(x / W, y / H) * 2 - 1`, its upper
    /// left corner. `offset` is a sample position in `[-1, 1]²` around that
    /// point, measured in half pixels.
    pub fn ray(&self, x: u32, y: u32, offset: Vec2) -> Ray {
        let film = Vec2::new(x as f32 / self.width as f32, y as f32 / self.height as f32) * 2.0
            - Vec2::ONE;
        let film = (film + offset * self.half_pixel) * self.half_extent;

        let origin = self.center + film.x * self.camera.x + film.y * self.camera.y;
        Ray::new(origin, (self.camera.position - origin).normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> PinholeCamera {
        // Z-up world, looking down +Y
        PinholeCamera::look_at(Vec3::new(0.0, -10.0, 1.0), Vec3::new(0.0, 0.0, 1.0), Vec3::Z)
    }

    #[test]
    fn test_look_at_basis_is_orthonormal() {
        let camera = camera();

        assert!((camera.z - Vec3::Y).length() < 1e-6);
        assert!(camera.x.dot(camera.y).abs() < 1e-6);
        assert!(camera.x.dot(camera.z).abs() < 1e-6);
        assert!((camera.y - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_middle_pixel_looks_forward() {
        let film = camera().film(100, 100);
        let ray = film.ray(50, 50, Vec2::ZERO);

        assert!((ray.direction - Vec3::Y).length() < 1e-5);
        assert!((ray.direction.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_row_zero_is_top_and_column_zero_is_left() {
        let film = camera().film(64, 32);

        let top_left = film.ray(0, 0, Vec2::ZERO).direction;
        assert!(top_left.z > 0.0, "Row 0 should look up");
        assert!(top_left.x < 0.0, "Column 0 should look left");

        let bottom_right = film.ray(63, 31, Vec2::ZERO).direction;
        assert!(bottom_right.z < 0.0);
        assert!(bottom_right.x > 0.0);
    }

    #[test]
    fn test_wide_film_spans_one_unit_horizontally() {
        let cam = camera();
        let film = cam.film(200, 100);

        let ray = film.ray(0, 50, Vec2::ZERO);
        let origin_x = (ray.origin - (cam.position - cam.z)).dot(cam.x);
        assert!((origin_x + 0.5).abs() < 1e-5);

        // A full offset moves half a pixel, 1/400 of the film width
        let ray = film.ray(0, 50, Vec2::new(1.0, 0.0));
        let origin_x = (ray.origin - (cam.position - cam.z)).dot(cam.x);
        assert!((origin_x + 0.5 - 1.0 / 400.0).abs() < 1e-5);
    }

    #[test]
    fn test_neighbouring_pixels_are_one_pixel_apart() {
        let cam = camera();
        let film = cam.film(64, 64);
        let film_x = |x: u32| (film.ray(x, 10, Vec2::ZERO).origin - (cam.position - cam.z)).dot(cam.x);

        // Film spans one unit over 64 pixels
        assert!((film_x(11) - film_x(10) - 1.0 / 64.0).abs() < 1e-5);
        assert!(film_x(32).abs() < 1e-6);
    }
}
