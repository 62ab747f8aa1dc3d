// Copied by value into worker closures, never mutated concurrently.

use serde::Deserialize;

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_samples")]
    pub samples: u32,
    #[serde(default = "default_bounces")]
    pub bounces: u32,
    #[serde(default = "default_threads")]
    pub threads: u32,
    #[serde(default = "default_tile_size")]
    pub tile_size: u32,
    #[serde(default = "default_gamma")]
    pub gamma: f32,
    #[serde(default = "default_tonemap")]
    pub tonemap: bool,
    #[serde(default = "default_gamma_correct")]
    pub gamma_correct: bool,
}

const fn default_width() -> u32 {
    1200
}
const fn default_height() -> u32 {
    800
}
const fn default_samples() -> u32 {
    500
}
const fn default_bounces() -> u32 {
    50
}
const fn default_threads() -> u32 {
    0
}
const fn default_tile_size() -> u32 {
    16
}
const fn default_gamma() -> f32 {
    2.2
}
const fn default_tonemap() -> bool {
    false
}
const fn default_gamma_correct() -> bool {
    true
}

impl Default for Config {
    fn default() -> Config {
        Config {
            width: default_width(),
            height: default_height(),
            samples: default_samples(),
            bounces: default_bounces(),
            threads: default_threads(),
            tile_size: default_tile_size(),
            gamma: default_gamma(),
            tonemap: default_tonemap(),
            gamma_correct: default_gamma_correct(),
        }
    }
}
