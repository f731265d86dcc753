use crate::BlockIdRange;
use crate::BlockLayout;
use crate::LayerDescriptor;
use crate::Occupancy;
use crate::VoxelBlockStore;
use ahash::AHashMap;
use glam::IVec3;

/// A [`VoxelBlockStore`] keeping every block in a hash map.
///
/// Holds a single named layer. The level-0 block-id range grows as blocks are added.
#[derive(Clone, Debug)]
pub struct MemoryBlockStore<V = u16> {
    layer: String,
    layout: BlockLayout,
    blocks: AHashMap<(usize, IVec3), Box<[V]>>,
    /// Inclusive min and exclusive max of the level-0 blocks.
    bounds: Option<(IVec3, IVec3)>,
}

impl<V: Occupancy> MemoryBlockStore<V> {
    pub fn new(layer: impl Into<String>, layout: BlockLayout) -> Self {
        Self {
            layer: layer.into(),
            layout,
            blocks: AHashMap::default(),
            bounds: None,
        }
    }

    pub fn layout(&self) -> BlockLayout {
        self.layout
    }

    /// Raw buffer of a stored block.
    pub fn block(&self, level: usize, block: IVec3) -> Option<&[V]> {
        self.blocks.get(&(level, block)).map(|data| &data[..])
    }

    /// Every stored block as `(level, block index, buffer)`, in no particular order.
    pub fn blocks(&self) -> impl Iterator<Item = (usize, IVec3, &[V])> + '_ {
        self.blocks
            .iter()
            .map(|(&(level, block), data)| (level, block, &data[..]))
    }

    /// Writes a level-0 voxel, allocating its block if needed.
    ///
    /// Writing zero into an absent block leaves the block absent.
    pub fn set_voxel(&mut self, voxel: IVec3, value: V) {
        let (block, local) = self.layout.split_coordinates(voxel);
        let index = self.layout.index(local);
        if let Some(data) = self.blocks.get_mut(&(0, block)) {
            data[index] = value;
        } else if value.is_occupied() {
            let mut data = vec![V::zero(); self.layout.voxel_count()];
            data[index] = value;
            self.add_block(0, block, data);
        }
    }

    /// Reads a level-0 voxel. Absent blocks read as zero.
    pub fn voxel(&self, voxel: IVec3) -> V {
        let (block, local) = self.layout.split_coordinates(voxel);
        self.blocks
            .get(&(0, block))
            .map_or(V::zero(), |data| data[self.layout.index(local)])
    }

    fn grow_bounds(&mut self, block: IVec3) {
        self.bounds = Some(match self.bounds {
            Some((min, max)) => (min.min(block), max.max(block + IVec3::ONE)),
            None => (block, block + IVec3::ONE),
        });
    }
}

impl<V: Occupancy> VoxelBlockStore for MemoryBlockStore<V> {
    type Voxel = V;

    fn layer_descriptor(&self, name: &str) -> Option<LayerDescriptor> {
        (name == self.layer).then_some(LayerDescriptor {
            block_resolution: self.layout.resolution,
            border_size: self.layout.border,
        })
    }

    fn block_id_range(&self) -> BlockIdRange {
        self.bounds
            .map(|(min, max)| BlockIdRange {
                min,
                size: max - min,
            })
            .unwrap_or_default()
    }

    fn block_count(&self) -> usize {
        self.blocks.len()
    }

    fn has_block(&self, level: usize, block: IVec3) -> bool {
        self.blocks.contains_key(&(level, block))
    }

    fn get_block(&self, level: usize, block: IVec3, out: &mut [V]) {
        if let Some(data) = self.blocks.get(&(level, block)) {
            out.copy_from_slice(data);
        }
    }

    fn add_block(&mut self, level: usize, block: IVec3, data: Vec<V>) {
        debug_assert_eq!(data.len(), self.layout.voxel_count());
        if level == 0 {
            self.grow_bounds(block);
        }
        self.blocks.insert((level, block), data.into_boxed_slice());
    }
}
