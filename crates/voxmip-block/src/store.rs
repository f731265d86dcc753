use crate::BlockLayout;
use crate::Occupancy;
use glam::IVec3;

/// Geometry of a named voxel layer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "with_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayerDescriptor {
    /// Voxels per block edge, excluding the border.
    pub block_resolution: u32,
    pub border_size: u32,
}

impl LayerDescriptor {
    pub fn layout(&self) -> BlockLayout {
        BlockLayout::new(self.block_resolution, self.border_size)
    }
}

/// Axis-aligned range of block indices, `min..min + size`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "with_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockIdRange {
    pub min: IVec3,
    pub size: IVec3,
}

impl BlockIdRange {
    /// Exclusive upper corner.
    #[inline]
    pub fn max(&self) -> IVec3 {
        self.min + self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size.cmple(IVec3::ZERO).any()
    }

    #[inline]
    pub fn contains(&self, block: IVec3) -> bool {
        block.cmpge(self.min).all() && block.cmplt(self.max()).all()
    }
}

/// Sparse storage of fixed-size voxel blocks addressed by `(level, block index)`.
///
/// A block that is not present reads as entirely empty.
pub trait VoxelBlockStore {
    type Voxel: Occupancy;

    /// Block geometry of the layer called `name`, if the store has one.
    fn layer_descriptor(&self, name: &str) -> Option<LayerDescriptor>;

    /// Range of block indices occupied on level 0.
    fn block_id_range(&self) -> BlockIdRange;

    /// Total number of stored blocks across all levels.
    fn block_count(&self) -> usize;

    fn has_block(&self, level: usize, block: IVec3) -> bool;

    /// Copies the block into `out`, which must hold a full bordered block.
    ///
    /// Callers check [`Self::has_block`] first; the contents of `out` are
    /// unspecified for absent blocks.
    fn get_block(&self, level: usize, block: IVec3, out: &mut [Self::Voxel]);

    /// Stores a new block. `data` must hold a full bordered block.
    fn add_block(&mut self, level: usize, block: IVec3, data: Vec<Self::Voxel>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_bounds() {
        let range = BlockIdRange {
            min: IVec3::new(-2, 0, 1),
            size: IVec3::new(3, 1, 2),
        };
        assert_eq!(range.max(), IVec3::new(1, 1, 3));
        assert!(range.contains(IVec3::new(-2, 0, 2)));
        assert!(!range.contains(IVec3::new(1, 0, 2)));
        assert!(!range.is_empty());
        assert!(BlockIdRange::default().is_empty());
    }
}
