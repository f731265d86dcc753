#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Voxel block store has no layer named {0:?}")]
    MissingLayer(String),

    #[error("Block resolution must be even and non-zero, got {0}")]
    InvalidBlockResolution(u32),

    #[error("Minimum level {min_level} is not below the coarsest level of a {num_levels}-level pyramid")]
    InvalidMinLevel { min_level: usize, num_levels: usize },
}
