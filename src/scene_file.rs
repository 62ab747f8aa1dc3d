// Translates a JSON scene file into calls against the core builder API
// (Scene::create_*). The core crate has no notion of JSON, file paths, or
// material names.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::camera::Camera;
use crate::config::Config;
use crate::error::SceneError;
use crate::math::Vec3;
use crate::scene::Scene;

#[derive(Deserialize)]
struct SceneFile {
    camera: SceneCamera,
    #[serde(default)]
    config: ConfigOverlay,
    materials: Vec<SceneMaterial>,
    spheres: Vec<SceneSphere>,
}

#[derive(Deserialize)]
struct SceneCamera {
    look_from: [f32; 3],
    #[serde(default = "default_look_at")]
    look_at: [f32; 3],
    #[serde(default = "default_fov_y")]
    fov_y: f32,
    #[serde(default)]
    aperture: f32,
    #[serde(default = "default_focal_length")]
    focal_length: f32,
}

fn default_look_at() -> [f32; 3] {
    [0.0, 0.0, -1.0]
}
fn default_fov_y() -> f32 {
    20.0
}
fn default_focal_length() -> f32 {
    10.0
}

// Mirrors Config, but every field optional; absent fields keep
// Config::default()'s value rather than serde's own zero defaults.
#[derive(Deserialize, Default)]
struct ConfigOverlay {
    width: Option<u32>,
    height: Option<u32>,
    samples: Option<u32>,
    bounces: Option<u32>,
    threads: Option<u32>,
    tile_size: Option<u32>,
    gamma: Option<f32>,
    tonemap: Option<bool>,
    gamma_correct: Option<bool>,
}

impl ConfigOverlay {
    fn apply(&self, base: Config) -> Config {
        Config {
            width: self.width.unwrap_or(base.width),
            height: self.height.unwrap_or(base.height),
            samples: self.samples.unwrap_or(base.samples),
            bounces: self.bounces.unwrap_or(base.bounces),
            threads: self.threads.unwrap_or(base.threads),
            tile_size: self.tile_size.unwrap_or(base.tile_size),
            gamma: self.gamma.unwrap_or(base.gamma),
            tonemap: self.tonemap.unwrap_or(base.tonemap),
            gamma_correct: self.gamma_correct.unwrap_or(base.gamma_correct),
        }
    }
}

// `type` is read as a plain string first so an unrecognized value can be
// turned into SceneError::UnknownMaterialType instead of a generic parse
// failure; the remaining fields are only decoded once the kind is known.
#[derive(Deserialize)]
struct SceneMaterial {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(flatten)]
    fields: Value,
}

#[derive(Deserialize)]
struct DiffuseFields {
    albedo: [f32; 3],
}

#[derive(Deserialize)]
struct MetalFields {
    albedo: [f32; 3],
    roughness: f32,
}

#[derive(Deserialize)]
struct DielectricFields {
    color: [f32; 3],
    refractive_index: f32,
}

#[derive(Deserialize)]
struct LightFields {
    emitted: [f32; 3],
}

#[derive(Deserialize)]
struct SceneSphere {
    pos: [f32; 3],
    radius: f32,
    material: String,
}

fn to_vec3(v: [f32; 3]) -> Vec3 {
    Vec3::new(v[0], v[1], v[2])
}

pub struct LoadedScene {
    pub scene: Scene,
    pub camera: Camera,
    pub config: Config,
}

pub fn load(path: &Path, base_config: Config) -> Result<LoadedScene, SceneError> {
    let text = fs::read_to_string(path).map_err(|source| SceneError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let file: SceneFile = serde_json::from_str(&text).map_err(|source| SceneError::Parse {
        path: path.display().to_string(),
        source,
    })?;

    let config = file.config.apply(base_config);

    let mut camera = Camera::new(
        config.width,
        config.height,
        file.camera.fov_y,
        file.camera.aperture,
        file.camera.focal_length,
    );
    camera.pos = to_vec3(file.camera.look_from);
    camera.target = to_vec3(file.camera.look_at);

    let mut scene = Scene::new();
    let mut material_ids = HashMap::with_capacity(file.materials.len());

    for material in file.materials {
        let parse_err = |source| SceneError::Parse {
            path: path.display().to_string(),
            source,
        };

        let id = match material.kind.as_str() {
            "diffuse" => {
                let f: DiffuseFields = serde_json::from_value(material.fields).map_err(parse_err)?;
                scene.create_diffuse(to_vec3(f.albedo))
            }
            "metal" => {
                let f: MetalFields = serde_json::from_value(material.fields).map_err(parse_err)?;
                scene.create_metal(to_vec3(f.albedo), f.roughness)
            }
            "dielectric" => {
                let f: DielectricFields =
                    serde_json::from_value(material.fields).map_err(parse_err)?;
                scene.create_dielectric(to_vec3(f.color), f.refractive_index)
            }
            "light" => {
                let f: LightFields = serde_json::from_value(material.fields).map_err(parse_err)?;
                scene.create_light(to_vec3(f.emitted))
            }
            other => {
                return Err(SceneError::UnknownMaterialType {
                    kind: other.to_string(),
                })
            }
        };
        material_ids.insert(material.name, id);
    }

    for sphere in &file.spheres {
        let material_id = *material_ids
            .get(&sphere.material)
            .ok_or_else(|| SceneError::InvalidMaterialId {
                name: sphere.material.clone(),
            })?;
        scene.create_sphere(to_vec3(sphere.pos), sphere.radius, material_id);
    }

    Ok(LoadedScene {
        scene,
        camera,
        config,
    })
}
