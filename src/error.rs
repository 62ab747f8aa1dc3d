//! Typed error kinds. The core itself is panic-free on well-formed input and
//! never returns an error during tracing; these variants exist for the
//! host-facing scene-file loader, where untrusted JSON has to be rejected
//! cleanly rather than assumed valid.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SceneError {
    #[error("failed to read scene file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse scene file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("material kind {kind:?} is not one of diffuse/metal/dielectric/light")]
    UnknownMaterialType { kind: String },

    #[error("sphere references unknown material name {name:?}")]
    InvalidMaterialId { name: String },
}
