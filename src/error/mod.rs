use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Duplicate property: {0:?} is owned by more than one parameter group")]
    DuplicateProperty(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Mismatched property names: {1:?} should be {0:?}")]
    KeyMismatch(Vec<String>, Vec<String>),

    #[error("Missing depth scale file: {0:?}")]
    MissingDepthScale(PathBuf),

    #[error("No depth map is usable")]
    NoDepthMaps,

    #[error("Random normal distribution error: {0}")]
    RandomNormalDistribution(#[from] rand_distr::NormalError),

    #[error("Mismatched shape of {0:?}: {2:?} should be {1:?}")]
    ShapeMismatch(String, Vec<usize>, Vec<usize>),

    #[error("Unsupported NPY file: {0}")]
    UnsupportedNpy(String),
}
