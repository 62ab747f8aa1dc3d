// No knowledge of JSON, files, or the host binary; see scene_file for that layer.

use crate::bvh::Bvh;
use crate::material::{Material, MaterialStore};
use crate::math::Vec3;
use crate::ray::{sphere_hit, InvRay, Ray, TraceContext, TraceResult};
use crate::sphere::{Sphere, SphereData};

pub struct Scene {
    materials: MaterialStore,
    spheres: Vec<Sphere>,
    bvh: Bvh,
}

impl Scene {
    pub fn new() -> Scene {
        Scene {
            materials: MaterialStore::new(),
            spheres: Vec::new(),
            bvh: Bvh::build(&[]),
        }
    }

    pub fn create_diffuse(&mut self, albedo: Vec3) -> u32 {
        self.materials.create_diffuse(albedo).id
    }

    pub fn create_metal(&mut self, albedo: Vec3, roughness: f32) -> u32 {
        self.materials.create_metal(albedo, roughness).id
    }

    pub fn create_dielectric(&mut self, color: Vec3, refractive_index: f32) -> u32 {
        self.materials.create_dielectric(color, refractive_index).id
    }

    pub fn create_light(&mut self, emitted: Vec3) -> u32 {
        self.materials.create_light(emitted).id
    }

    pub fn create_sphere(&mut self, pos: Vec3, radius: f32, material_id: u32) -> usize {
        self.spheres.push(Sphere::new(SphereData {
            pos,
            radius,
            material_id,
        }));
        self.spheres.len() - 1
    }

    pub fn material(&self, id: u32) -> &Material {
        self.materials.get(id)
    }

    pub fn sphere_count(&self) -> usize {
        self.spheres.len()
    }

    pub fn build_bvh(&mut self) {
        if self.spheres.is_empty() {
            eprintln!("warning: build_bvh called with zero spheres; every ray will miss");
        }
        self.bvh = Bvh::build(&self.spheres);
    }

    pub fn trace_ray(&self, ray: &Ray) -> TraceResult<'_> {
        let mut ctx = TraceContext::new();
        let inv_ray = InvRay::new(ray);
        self.bvh.traverse(&mut ctx, &self.spheres, ray, &inv_ray);

        match ctx.sphere_idx {
            Some(idx) => {
                let sphere = &self.spheres[idx];
                let hit_pos = ray.origin + ray.dir * ctx.t;
                let hit_normal = (hit_pos - sphere.pos).normalize();
                TraceResult {
                    hit_material: Some(self.materials.get(sphere.material_id)),
                    miss_color: Vec3::ZERO,
                    hit_pos,
                    hit_normal,
                    t: ctx.t,
                }
            }
            None => {
                let t = ray.dir.normalize().y * 0.5 + 0.5;
                let miss_color = Vec3::mix(Vec3::ONE, Vec3::new(0.5, 0.7, 1.0), t);
                TraceResult {
                    hit_material: None,
                    miss_color,
                    ..TraceResult::default()
                }
            }
        }
    }
}

impl Default for Scene {
    fn default() -> Scene {
        Scene::new()
    }
}

// Used only by the BVH-equivalence tests below.
#[cfg(test)]
pub(crate) fn exhaustive_trace(spheres: &[Sphere], ray: &Ray) -> Option<(usize, f32)> {
    spheres
        .iter()
        .enumerate()
        .filter_map(|(i, s)| sphere_hit(ray, s).filter(|t| *t > 0.0).map(|t| (i, t)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}
