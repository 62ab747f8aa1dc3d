use crate::math::Vec3;

/// Axis-aligned bounding box; `min <= max` component-wise.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    #[inline]
    pub fn union(self, other: Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// Construction payload for [`Sphere`].
pub struct SphereData {
    pub pos: Vec3,
    pub radius: f32,
    pub material_id: u32,
}

/// A sphere primitive. Append-only: spheres are never deleted or moved once
/// created.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sphere {
    pub pos: Vec3,
    pub radius: f32,
    pub radius2: f32,
    pub material_id: u32,
}

impl Sphere {
    pub fn new(data: SphereData) -> Sphere {
        debug_assert!(data.radius > 0.0, "sphere radius must be positive");
        Sphere {
            pos: data.pos,
            radius: data.radius,
            radius2: data.radius * data.radius,
            material_id: data.material_id,
        }
    }

    #[inline]
    pub fn aabb(&self) -> Aabb {
        Aabb {
            min: self.pos - Vec3::splat(self.radius),
            max: self.pos + Vec3::splat(self.radius),
        }
    }
}
