use crate::math::{Vec2, Vec3};
use crate::ray::Ray;
use crate::rng::Rng;

pub struct Camera {
    width: u32,
    height: u32,
    fov_y: f32,
    aperture: f32,
    focal_length: f32,

    pub pos: Vec3,
    pub target: Vec3,

    inv_size: Vec2,
    u_axis: Vec3,
    v_axis: Vec3,
    w_axis: Vec3,
    horizontal: Vec3,
    vertical: Vec3,
    lower_left: Vec3,
    lens_radius: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32, fov_y: f32, aperture: f32, focal_length: f32) -> Camera {
        Camera {
            width,
            height,
            fov_y,
            aperture,
            focal_length,
            pos: Vec3::ZERO,
            target: Vec3::new(0.0, 0.0, -1.0),
            inv_size: Vec2::new(0.0, 0.0),
            u_axis: Vec3::ZERO,
            v_axis: Vec3::ZERO,
            w_axis: Vec3::ZERO,
            horizontal: Vec3::ZERO,
            vertical: Vec3::ZERO,
            lower_left: Vec3::ZERO,
            lens_radius: 0.0,
        }
    }

    // Must be called at least once before `ray`.
    pub fn update(&mut self) {
        self.inv_size = Vec2::new(
            1.0 / (self.width - 1) as f32,
            1.0 / (self.height - 1) as f32,
        );

        let aspect = self.width as f32 / self.height as f32;

        let vh = 2.0 * (self.fov_y.to_radians() / 2.0).tan();
        let vw = vh * aspect;

        self.w_axis = (self.pos - self.target).normalize();
        self.u_axis = Vec3::new(0.0, 1.0, 0.0).cross(self.w_axis).normalize();
        self.v_axis = self.w_axis.cross(self.u_axis);

        self.horizontal = self.u_axis * (self.focal_length * vw);
        self.vertical = self.v_axis * (self.focal_length * vh);

        self.lower_left =
            self.horizontal / -2.0 - self.vertical / 2.0 - self.w_axis * self.focal_length;

        self.lens_radius = self.aperture / 2.0;
    }

    // No sub-pixel jitter, only the lens-disk sample.
    pub fn ray(&self, rng: &mut Rng, x: u32, y: u32) -> Ray {
        let disk = rng.next_in_unit_disk() * self.lens_radius;
        let offset = self.u_axis * disk.x + self.v_axis * disk.y;

        let u = x as f32 * self.inv_size.x;
        let v = (self.height - y - 1) as f32 * self.inv_size.y;

        Ray {
            origin: self.pos + offset,
            dir: self.lower_left + self.horizontal * u + self.vertical * v - offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn looking_down_negative_z_points_the_center_ray_forward() {
        let mut cam = Camera::new(100, 100, 90.0, 0.0, 1.0);
        cam.update();

        let mut rng = Rng::with_seed(1);
        let ray = cam.ray(&mut rng, 50, 50);
        assert!(ray.dir.z < 0.0);
        assert_relative_eq!(ray.origin.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(ray.origin.y, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn zero_aperture_produces_a_fixed_origin_regardless_of_rng() {
        let mut cam = Camera::new(64, 64, 40.0, 0.0, 5.0);
        cam.update();

        let mut a = Rng::with_seed(1);
        let mut b = Rng::with_seed(2);
        let ray_a = cam.ray(&mut a, 10, 10);
        let ray_b = cam.ray(&mut b, 10, 10);
        assert_eq!(ray_a.origin, ray_b.origin);
    }

    #[test]
    fn top_left_pixel_points_up_and_left_of_bottom_right() {
        let mut cam = Camera::new(64, 64, 60.0, 0.0, 1.0);
        cam.update();

        let mut rng = Rng::with_seed(3);
        let top_left = cam.ray(&mut rng, 0, 0);
        let bottom_right = cam.ray(&mut rng, 63, 63);
        assert!(top_left.dir.y > bottom_right.dir.y);
    }
}
