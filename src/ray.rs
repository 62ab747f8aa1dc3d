use crate::material::Material;
use crate::math::Vec3;
use crate::sphere::{Aabb, Sphere};

// Guards against self-intersection at the previous bounce's origin.
pub const HIT_EPSILON: f32 = 0.001;

#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

pub struct InvRay {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl InvRay {
    #[inline]
    pub fn new(ray: &Ray) -> InvRay {
        InvRay {
            origin: ray.origin,
            dir: Vec3::new(1.0 / ray.dir.x, 1.0 / ray.dir.y, 1.0 / ray.dir.z),
        }
    }
}

// hit_material is Some on a hit (hit_pos/hit_normal meaningful) or None on
// a miss (miss_color holds the sky radiance). Never both.
pub struct TraceResult<'a> {
    pub hit_material: Option<&'a Material>,
    pub miss_color: Vec3,

    pub hit_pos: Vec3,
    pub hit_normal: Vec3,

    pub t: f32,
}

impl<'a> Default for TraceResult<'a> {
    fn default() -> Self {
        TraceResult {
            hit_material: None,
            miss_color: Vec3::ZERO,
            hit_pos: Vec3::ZERO,
            hit_normal: Vec3::ZERO,
            t: f32::INFINITY,
        }
    }
}

#[derive(Default)]
pub struct TraceContext {
    pub sphere_idx: Option<usize>,
    pub t: f32,
}

impl TraceContext {
    pub fn new() -> TraceContext {
        TraceContext {
            sphere_idx: None,
            t: f32::INFINITY,
        }
    }
}

// Falls back to the far root if the near one is behind HIT_EPSILON (origin inside the sphere).
#[inline]
pub fn sphere_hit(ray: &Ray, sphere: &Sphere) -> Option<f32> {
    let oc = ray.origin - sphere.pos;

    let a = ray.dir.length2();
    let b = oc.dot(ray.dir);
    let c = oc.length2() - sphere.radius2;

    let disc = b * b - a * c;
    if disc < 0.0 {
        return None;
    }

    let h = disc.sqrt();

    let mut t = (-b - h) / a;
    if t <= HIT_EPSILON {
        t = (-b + h) / a;
        if t <= HIT_EPSILON {
            return None;
        }
    }

    Some(t)
}

#[inline]
pub fn aabb_hit(ray: &InvRay, aabb: &Aabb, t: f32) -> bool {
    let tx1 = (aabb.min.x - ray.origin.x) * ray.dir.x;
    let tx2 = (aabb.max.x - ray.origin.x) * ray.dir.x;
    let mut t_min = tx1.min(tx2);
    let mut t_max = tx1.max(tx2);

    let ty1 = (aabb.min.y - ray.origin.y) * ray.dir.y;
    let ty2 = (aabb.max.y - ray.origin.y) * ray.dir.y;
    t_min = t_min.max(ty1.min(ty2));
    t_max = t_max.min(ty1.max(ty2));

    let tz1 = (aabb.min.z - ray.origin.z) * ray.dir.z;
    let tz2 = (aabb.max.z - ray.origin.z) * ray.dir.z;
    t_min = t_min.max(tz1.min(tz2));
    t_max = t_max.min(tz1.max(tz2));

    t_max >= HIT_EPSILON.max(t_min) && t_min < t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sphere::SphereData;
    use approx::assert_relative_eq;

    #[test]
    fn ray_through_sphere_center_returns_near_root() {
        let sphere = Sphere::new(SphereData {
            pos: Vec3::ZERO,
            radius: 1.0,
            material_id: 0,
        });
        let ray = Ray {
            origin: Vec3::new(0.0, 0.0, 5.0),
            dir: Vec3::new(0.0, 0.0, -1.0),
        };
        let t = sphere_hit(&ray, &sphere).unwrap();
        assert_relative_eq!(t, 4.0, epsilon = 1e-4);
    }

    #[test]
    fn hit_position_lies_on_the_sphere_surface() {
        let sphere = Sphere::new(SphereData {
            pos: Vec3::new(1.0, 2.0, 3.0),
            radius: 2.0,
            material_id: 0,
        });
        let ray = Ray {
            origin: Vec3::new(10.0, 2.0, 3.0),
            dir: Vec3::new(-1.0, 0.0, 0.0),
        };
        let t = sphere_hit(&ray, &sphere).unwrap();
        let hit_pos = ray.origin + ray.dir * t;
        let dist2 = (hit_pos - sphere.pos).length2();
        assert_relative_eq!(dist2, sphere.radius2, epsilon = 1e-3 * sphere.radius);
    }

    #[test]
    fn ray_missing_sphere_entirely_returns_none() {
        let sphere = Sphere::new(SphereData {
            pos: Vec3::ZERO,
            radius: 1.0,
            material_id: 0,
        });
        let ray = Ray {
            origin: Vec3::new(5.0, 5.0, 5.0),
            dir: Vec3::new(0.0, 0.0, -1.0),
        };
        assert!(sphere_hit(&ray, &sphere).is_none());
    }

    #[test]
    fn aabb_slab_test_hits_a_box_straddling_the_ray() {
        let aabb = Aabb {
            min: Vec3::new(-1.0, -1.0, -1.0),
            max: Vec3::new(1.0, 1.0, 1.0),
        };
        let ray = Ray {
            origin: Vec3::new(0.0, 0.0, 5.0),
            dir: Vec3::new(0.0, 0.0, -1.0),
        };
        let inv = InvRay::new(&ray);
        assert!(aabb_hit(&inv, &aabb, f32::INFINITY));
    }

    #[test]
    fn aabb_slab_test_misses_a_box_beside_the_ray() {
        let aabb = Aabb {
            min: Vec3::new(10.0, 10.0, 10.0),
            max: Vec3::new(11.0, 11.0, 11.0),
        };
        let ray = Ray {
            origin: Vec3::new(0.0, 0.0, 5.0),
            dir: Vec3::new(0.0, 0.0, -1.0),
        };
        let inv = InvRay::new(&ray);
        assert!(!aabb_hit(&inv, &aabb, f32::INFINITY));
    }
}
