use crate::math::Vec3;

// id is the dense index this material occupies in its owning MaterialStore.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub id: u32,
    pub kind: MaterialKind,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MaterialKind {
    Diffuse { albedo: Vec3 },
    Metal { albedo: Vec3, roughness: f32 },
    // color is never read by the integrator; refraction doesn't attenuate throughput.
    Dielectric { color: Vec3, refractive_index: f32 },
    Light { emitted: Vec3 },
}

// Append-only. Id 0 is always the magenta fallback metal, minted at construction.
pub struct MaterialStore {
    materials: Vec<Material>,
}

impl MaterialStore {
    pub fn new() -> MaterialStore {
        let mut store = MaterialStore {
            materials: Vec::new(),
        };
        store.create_metal(Vec3::new(1.0, 0.0, 1.0), 0.0);
        store
    }

    fn push(&mut self, kind: MaterialKind) -> &Material {
        let id = self.materials.len() as u32;
        self.materials.push(Material { id, kind });
        &self.materials[id as usize]
    }

    pub fn create_diffuse(&mut self, albedo: Vec3) -> &Material {
        let albedo = albedo.clamp(Vec3::ZERO, Vec3::ONE);
        self.push(MaterialKind::Diffuse { albedo })
    }

    pub fn create_metal(&mut self, albedo: Vec3, roughness: f32) -> &Material {
        let albedo = albedo.clamp(Vec3::ZERO, Vec3::ONE);
        let roughness = roughness.clamp(0.0, 1.0);
        self.push(MaterialKind::Metal { albedo, roughness })
    }

    pub fn create_dielectric(&mut self, color: Vec3, refractive_index: f32) -> &Material {
        self.push(MaterialKind::Dielectric {
            color,
            refractive_index,
        })
    }

    pub fn create_light(&mut self, emitted: Vec3) -> &Material {
        self.push(MaterialKind::Light { emitted })
    }

    #[inline]
    pub fn get(&self, id: u32) -> &Material {
        &self.materials[id as usize]
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

impl Default for MaterialStore {
    fn default() -> MaterialStore {
        MaterialStore::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_zero_is_the_magenta_fallback_metal() {
        let store = MaterialStore::new();
        let fallback = store.get(0);
        assert_eq!(fallback.id, 0);
        assert_eq!(
            fallback.kind,
            MaterialKind::Metal {
                albedo: Vec3::new(1.0, 0.0, 1.0),
                roughness: 0.0
            }
        );
    }

    #[test]
    fn ids_are_dense_and_self_consistent() {
        let mut store = MaterialStore::new();
        store.create_diffuse(Vec3::new(0.5, 0.5, 0.5));
        store.create_light(Vec3::new(4.0, 4.0, 4.0));
        for id in 0..store.len() as u32 {
            assert_eq!(store.get(id).id, id);
        }
    }

    #[test]
    fn diffuse_and_metal_albedo_are_clamped_on_creation() {
        let mut store = MaterialStore::new();
        let id = store.create_diffuse(Vec3::new(2.0, -1.0, 0.5)).id;
        assert_eq!(
            store.get(id).kind,
            MaterialKind::Diffuse {
                albedo: Vec3::new(1.0, 0.0, 0.5)
            }
        );

        let id = store.create_metal(Vec3::new(0.5, 0.5, 0.5), 5.0).id;
        match store.get(id).kind {
            MaterialKind::Metal { roughness, .. } => assert_eq!(roughness, 1.0),
            _ => unreachable!(),
        }
    }

    #[test]
    fn dielectric_color_is_carried_unclamped() {
        let mut store = MaterialStore::new();
        let id = store.create_dielectric(Vec3::new(1.0, 1.0, 1.0), 1.5).id;
        assert_eq!(
            store.get(id).kind,
            MaterialKind::Dielectric {
                color: Vec3::new(1.0, 1.0, 1.0),
                refractive_index: 1.5
            }
        );
    }
}
