/// Name of the layer read when no other is configured.
pub const DEFAULT_LAYER: &str = "occupancy";

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "with_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PyramidOptions {
    /// Store layer whose block geometry the pyramid is built from.
    pub layer: String,
}

impl PyramidOptions {
    pub fn with_layer(layer: impl Into<String>) -> Self {
        Self {
            layer: layer.into(),
        }
    }
}

impl Default for PyramidOptions {
    fn default() -> Self {
        Self::with_layer(DEFAULT_LAYER)
    }
}
