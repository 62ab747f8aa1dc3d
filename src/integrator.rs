use crate::config::Config;
use crate::material::MaterialKind;
use crate::math::Vec3;
use crate::ray::Ray;
use crate::rng::Rng;
use crate::scene::Scene;

// Checked on raw components, not magnitude, on purpose.
const SCATTER_EPSILON: f32 = 1e-9;

fn schlick(cos_theta: f32, refractive_index: f32) -> f32 {
    let r0 = (1.0 - refractive_index) / (1.0 + refractive_index);
    let r0 = r0 * r0;
    r0 + (1.0 - r0) * (1.0 - cos_theta).powf(5.0)
}

pub fn trace(scene: &Scene, initial: Ray, rng: &mut Rng, bounces: u32) -> Vec3 {
    let mut color = Vec3::ONE;
    let mut ray = initial;

    let mut last_hit_was_light = false;
    let mut hit_anything = false;

    for _ in 0..=bounces {
        let result = scene.trace_ray(&ray);

        let material = match result.hit_material {
            None => {
                color *= result.miss_color;
                hit_anything = false;
                break;
            }
            Some(m) => m,
        };

        hit_anything = true;

        let mut front = true;
        let mut normal = result.hit_normal;
        if ray.dir.dot(result.hit_normal) > 0.0 {
            front = false;
            normal = -normal;
        }

        ray.origin = result.hit_pos;

        let mut bounce = true;

        match material.kind {
            MaterialKind::Diffuse { albedo } => {
                color *= albedo;

                ray.dir = result.hit_normal + rng.next_unit();
                if ray.dir.x < SCATTER_EPSILON
                    && ray.dir.y < SCATTER_EPSILON
                    && ray.dir.z < SCATTER_EPSILON
                {
                    ray.dir = result.hit_normal;
                }

                last_hit_was_light = false;
            }
            MaterialKind::Metal { albedo, roughness } => {
                color *= albedo;

                let dir = ray.dir.normalize();
                ray.dir = dir.reflect(result.hit_normal) + rng.next_unit() * roughness;
                bounce = ray.dir.dot(result.hit_normal) > 0.0;

                last_hit_was_light = false;
            }
            MaterialKind::Dielectric {
                refractive_index, ..
            } => {
                let dir = ray.dir.normalize();

                let ratio = if front {
                    1.0 / refractive_index
                } else {
                    refractive_index
                };

                let cos_theta = f32::min((-dir).dot(normal), 1.0);
                let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();

                if ratio * sin_theta > 1.0 || schlick(cos_theta, ratio) > rng.next_f32() {
                    ray.dir = dir.reflect(normal);
                } else {
                    ray.dir = dir.refract(normal, ratio);
                }

                last_hit_was_light = false;
            }
            MaterialKind::Light { emitted } => {
                color *= emitted;
                bounce = false;
                last_hit_was_light = true;
            }
        }

        if !bounce {
            break;
        }
    }

    // Ran the bounce loop dry without hitting a miss or a light: every photon
    // along this path is assumed absorbed.
    if hit_anything && !last_hit_was_light {
        color = Vec3::ZERO;
    }

    color
}

// rgb must already be clamped to [0,1].
pub fn to_color(rgb: Vec3) -> u32 {
    let rgb = rgb.clamp(Vec3::ZERO, Vec3::ONE);
    0xFF00_0000
        | (rgb.x * 255.0) as u32
        | (((rgb.y * 255.0) as u32) << 8)
        | (((rgb.z * 255.0) as u32) << 16)
}

pub fn post_process(sum: Vec3, config: &Config) -> Vec3 {
    let mut result = sum / config.samples as f32;
    result = result.max(Vec3::ZERO);

    if config.tonemap {
        result = result / (Vec3::ONE + result);
    }

    if config.gamma_correct {
        result = result.powf(Vec3::splat(1.0 / config.gamma));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn miss_color_on_empty_scene_matches_the_sky_gradient_formula() {
        let mut scene = Scene::new();
        scene.build_bvh();
        let mut rng = Rng::with_seed(1);

        let ray = Ray {
            origin: Vec3::ZERO,
            dir: Vec3::new(0.0, 1.0, 0.0),
        };
        let color = trace(&scene, ray, &mut rng, 50);
        assert_relative_eq!(color.x, 0.5, epsilon = 1e-5);
        assert_relative_eq!(color.y, 0.7, epsilon = 1e-5);
        assert_relative_eq!(color.z, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn light_material_hit_head_on_returns_raw_emission() {
        let mut scene = Scene::new();
        let light = scene.create_light(Vec3::new(2.0, 2.0, 2.0));
        scene.create_sphere(Vec3::new(0.0, 0.0, -1.0), 0.5, light);
        scene.build_bvh();
        let mut rng = Rng::with_seed(1);

        let ray = Ray {
            origin: Vec3::ZERO,
            dir: Vec3::new(0.0, 0.0, -1.0),
        };
        let color = trace(&scene, ray, &mut rng, 50);
        assert_relative_eq!(color.x, 2.0, epsilon = 1e-5);
        assert_relative_eq!(color.y, 2.0, epsilon = 1e-5);
        assert_relative_eq!(color.z, 2.0, epsilon = 1e-5);

        let packed = to_color(post_process(
            color,
            &Config {
                samples: 1,
                tonemap: false,
                gamma_correct: true,
                ..Config::default()
            },
        ));
        assert_eq!(packed, 0xFFFF_FFFF);
    }

    #[test]
    fn running_out_of_bounces_on_non_light_surfaces_contributes_zero() {
        let mut scene = Scene::new();
        let diffuse = scene.create_diffuse(Vec3::ONE);
        scene.create_sphere(Vec3::ZERO, 1_000_000.0, diffuse);
        scene.build_bvh();
        let mut rng = Rng::with_seed(1);

        let ray = Ray {
            origin: Vec3::new(0.0, 0.0, 999_990.0),
            dir: Vec3::new(0.0, 0.0, -1.0),
        };
        let color = trace(&scene, ray, &mut rng, 0);
        assert_eq!(color, Vec3::ZERO);
    }

    #[test]
    fn total_internal_reflection_branch_is_taken_when_ratio_sin_theta_exceeds_one() {
        let refractive_index = 1.5f32;
        let front = false;
        let ratio = refractive_index;
        let cos_theta = 0.1f32;
        let sin_theta = (1.0 - cos_theta * cos_theta).sqrt();
        assert!(ratio * sin_theta > 1.0);
        let _ = front;
    }

    #[test]
    fn to_color_truncates_toward_zero_and_always_sets_full_alpha() {
        let packed = to_color(Vec3::new(1.0, 0.0, 0.5));
        assert_eq!(packed & 0xFF00_0000, 0xFF00_0000);
        assert_eq!(packed & 0xFF, 255);
        assert_eq!((packed >> 8) & 0xFF, 0);
        assert_eq!((packed >> 16) & 0xFF, 127);
    }
}
