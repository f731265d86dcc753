use crate::Error;
use crate::PyramidOptions;
use glam::IVec3;
use voxmip_block::box_positions;
use voxmip_block::cube_positions;
use voxmip_block::BlockIdRange;
use voxmip_block::BlockLayout;
use voxmip_block::VoxelBlockStore;
use voxmip_block::CUBE_CORNERS;

/// Block-space geometry of one pyramid level.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "with_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MipLevel {
    /// Minimum block index of the level's bounding volume.
    pub origin: IVec3,
    /// Extent of the bounding volume, in blocks.
    pub dimensions: IVec3,
    /// Number of level-0 voxels along one edge of a voxel on this level.
    pub voxel_scale: i32,
}

impl MipLevel {
    pub fn block_count(&self) -> usize {
        if self.dimensions.cmple(IVec3::ZERO).any() {
            0
        } else {
            self.dimensions.x as usize * self.dimensions.y as usize * self.dimensions.z as usize
        }
    }

    /// Linear slot of `block` within the bounding volume, x fastest.
    #[inline]
    pub fn block_slot(&self, block: IVec3) -> Option<usize> {
        let p = block - self.origin;
        if p.cmpge(IVec3::ZERO).all() && p.cmplt(self.dimensions).all() {
            let d = self.dimensions;
            Some(p.x as usize + d.x as usize * (p.y as usize + d.y as usize * p.z as usize))
        } else {
            None
        }
    }

    /// All block indices of the bounding volume, present or not.
    pub fn blocks(&self) -> impl Iterator<Item = IVec3> {
        box_positions(self.origin, self.dimensions)
    }

    /// Inclusive minimum voxel (in this level's voxel units) of the bounding volume.
    pub fn voxel_min(&self, resolution: u32) -> IVec3 {
        self.origin * resolution as i32
    }

    /// Exclusive maximum voxel (in this level's voxel units) of the bounding volume.
    pub fn voxel_max(&self, resolution: u32) -> IVec3 {
        (self.origin + self.dimensions) * resolution as i32
    }
}

/// Derives the level hierarchy from the level-0 block range.
///
/// Levels are added until one voxel of the coarsest level spans the longest
/// edge of the volume.
pub fn derive_levels(range: BlockIdRange, resolution: u32) -> Vec<MipLevel> {
    let mut levels = vec![MipLevel {
        origin: range.min,
        dimensions: range.size,
        voxel_scale: 1,
    }];

    let extent = range.size.max_element().max(0) * resolution as i32;
    let two = IVec3::splat(2);

    let mut previous = levels[0];
    while previous.voxel_scale < extent {
        let min = previous.origin.div_euclid(two);
        // ceil(x / 2) == floor((x + 1) / 2)
        let max = (previous.origin + previous.dimensions + IVec3::ONE).div_euclid(two);
        previous = MipLevel {
            origin: min,
            dimensions: max - min,
            voxel_scale: previous.voxel_scale * 2,
        };
        levels.push(previous);
    }

    levels
}

/// Max-downsamples the children of `block` on `level - 1`.
///
/// Returns `None` when none of the 8 child blocks exist.
fn downsample_block<S: VoxelBlockStore + ?Sized>(
    store: &S,
    level: usize,
    block: IVec3,
    layout: BlockLayout,
) -> Option<Vec<S::Voxel>> {
    let children: Vec<(IVec3, IVec3)> = CUBE_CORNERS
        .iter()
        .map(|&corner| (corner, block * 2 + corner))
        .filter(|&(_, child)| store.has_block(level - 1, child))
        .collect();
    if children.is_empty() {
        return None;
    }

    let half = layout.resolution as i32 / 2;
    let mut data = vec![S::Voxel::default(); layout.voxel_count()];
    let mut child_data = vec![S::Voxel::default(); layout.voxel_count()];

    // TODO: downsample into the border as well; it is left zeroed for now.
    for (corner, child) in children {
        store.get_block(level - 1, child, &mut child_data);
        let offset = corner * half;
        for p in cube_positions(half) {
            let value = CUBE_CORNERS
                .iter()
                .map(|&d| child_data[layout.index(p * 2 + d)])
                .fold(S::Voxel::default(), Ord::max);
            data[layout.index(offset + p)] = value;
        }
    }

    Some(data)
}

#[cfg(not(feature = "with_rayon"))]
fn downsample_level<S: VoxelBlockStore + MaybeSync + ?Sized>(
    store: &S,
    level: usize,
    positions: &[IVec3],
    layout: BlockLayout,
) -> Vec<(IVec3, Vec<S::Voxel>)> {
    positions
        .iter()
        .filter_map(|&block| downsample_block(store, level, block, layout).map(|d| (block, d)))
        .collect()
}

#[cfg(feature = "with_rayon")]
fn downsample_level<S: VoxelBlockStore + MaybeSync + ?Sized>(
    store: &S,
    level: usize,
    positions: &[IVec3],
    layout: BlockLayout,
) -> Vec<(IVec3, Vec<S::Voxel>)> {
    use rayon::prelude::*;

    positions
        .par_iter()
        .filter_map(|&block| downsample_block(store, level, block, layout).map(|d| (block, d)))
        .collect()
}

/// Fills in every missing block of levels `1..` by max-downsampling the level below.
///
/// Blocks that already exist are never overwritten, and no block is created
/// where all 8 children are absent. Returns the number of blocks added.
pub fn generate_mip_blocks<S: VoxelBlockStore + MaybeSync + ?Sized>(
    store: &mut S,
    levels: &[MipLevel],
    layout: BlockLayout,
) -> usize {
    let mut added = 0;

    for (index, level) in levels.iter().enumerate().skip(1) {
        let positions: Vec<IVec3> = level
            .blocks()
            .filter(|&block| !store.has_block(index, block))
            .collect();

        let new_blocks = downsample_level(&*store, index, &positions, layout);
        tracing::debug!(
            level = index,
            scanned = positions.len(),
            generated = new_blocks.len(),
            "generated mip blocks"
        );

        added += new_blocks.len();
        for (block, data) in new_blocks {
            store.add_block(index, block, data);
        }
    }

    added
}

/// Stores the mip pass may read from worker threads. With `with_rayon` this is `Sync`.
#[cfg(feature = "with_rayon")]
pub trait MaybeSync: Sync {}
#[cfg(feature = "with_rayon")]
impl<T: Sync + ?Sized> MaybeSync for T {}

/// Stores the mip pass may read from worker threads. With `with_rayon` this is `Sync`.
#[cfg(not(feature = "with_rayon"))]
pub trait MaybeSync {}
#[cfg(not(feature = "with_rayon"))]
impl<T: ?Sized> MaybeSync for T {}

/// A hierarchy of max-downsampled levels over a [`VoxelBlockStore`].
///
/// Level 0 is the store's own resolution; each further level halves it, until
/// a single voxel of the coarsest level covers the whole volume.
pub struct MipPyramid<'a, S: VoxelBlockStore + ?Sized> {
    store: &'a S,
    layout: BlockLayout,
    levels: Vec<MipLevel>,
    empty: bool,
}

impl<'a, S: VoxelBlockStore + MaybeSync + ?Sized> MipPyramid<'a, S> {
    /// Derives the levels from the store's metadata and generates all missing mip blocks.
    pub fn new(store: &'a mut S, options: &PyramidOptions) -> Result<Self, Error> {
        let _span = tracing::debug_span!("mip_pyramid", layer = %options.layer).entered();

        let layout = store
            .layer_descriptor(&options.layer)
            .ok_or_else(|| Error::MissingLayer(options.layer.clone()))?
            .layout();
        if layout.resolution == 0 || layout.resolution % 2 != 0 {
            return Err(Error::InvalidBlockResolution(layout.resolution));
        }

        let levels = derive_levels(store.block_id_range(), layout.resolution);
        for (index, level) in levels.iter().enumerate() {
            tracing::debug!(
                level = index,
                origin = %level.origin,
                dimensions = %level.dimensions,
                voxel_scale = level.voxel_scale,
                "mip level"
            );
        }

        let added = generate_mip_blocks(store, &levels, layout);
        let store: &'a S = store;
        let empty = store.block_count() == 0;
        tracing::debug!(levels = levels.len(), added, empty, "built mip pyramid");

        Ok(Self {
            store,
            layout,
            levels,
            empty,
        })
    }
}

impl<'a, S: VoxelBlockStore + ?Sized> MipPyramid<'a, S> {
    pub fn store(&self) -> &'a S {
        self.store
    }

    pub fn layout(&self) -> BlockLayout {
        self.layout
    }

    pub fn levels(&self) -> &[MipLevel] {
        &self.levels
    }

    pub fn level(&self, index: usize) -> Option<&MipLevel> {
        self.levels.get(index)
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    /// True when the store holds no blocks on any level.
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn has_block(&self, level: usize, block: IVec3) -> bool {
        self.store.has_block(level, block)
    }

    pub fn get_block(&self, level: usize, block: IVec3, out: &mut [S::Voxel]) {
        self.store.get_block(level, block, out);
    }

    /// Level-0 block index and in-block position of a voxel.
    pub fn split_coordinates(&self, voxel: IVec3) -> (IVec3, IVec3) {
        self.layout.split_coordinates(voxel)
    }

    /// Reads a voxel out of a full block buffer.
    #[inline]
    pub fn get_voxel(&self, block: &[S::Voxel], local: IVec3) -> S::Voxel {
        block[self.layout.index(local)]
    }

    /// The box, in level-0 voxel units, covered by `voxel` on `level`.
    #[inline]
    pub fn cube_for_mipped_voxel(&self, level: usize, voxel: IVec3) -> (IVec3, IVec3) {
        let scale = self.levels[level].voxel_scale;
        let min = voxel * scale;
        (min, min + IVec3::splat(scale))
    }

    /// Cells of the coarsest level that cover the level-0 volume.
    ///
    /// This is just the origin cell when the level-0 block range starts at the origin.
    pub fn coarsest_voxels(&self) -> Vec<IVec3> {
        let base = &self.levels[0];
        if base.block_count() == 0 {
            return Vec::new();
        }

        let scale = IVec3::splat(self.levels[self.levels.len() - 1].voxel_scale);
        let lo = base.voxel_min(self.layout.resolution).div_euclid(scale);
        let hi = (base.voxel_max(self.layout.resolution) - IVec3::ONE).div_euclid(scale);

        box_positions(lo, hi - lo + IVec3::ONE).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxmip_block::MemoryBlockStore;

    fn store_with(resolution: u32, voxels: &[(IVec3, u16)]) -> MemoryBlockStore<u16> {
        let mut store = MemoryBlockStore::new("occupancy", BlockLayout::new(resolution, 1));
        for &(voxel, value) in voxels {
            store.set_voxel(voxel, value);
        }
        store
    }

    /// Tiny xorshift so tests stay deterministic without extra dependencies.
    fn xorshift(state: &mut u32) -> u32 {
        *state ^= *state << 13;
        *state ^= *state >> 17;
        *state ^= *state << 5;
        *state
    }

    #[test]
    fn levels_of_single_block() {
        let range = BlockIdRange {
            min: IVec3::ZERO,
            size: IVec3::ONE,
        };
        let levels = derive_levels(range, 16);
        let scales: Vec<i32> = levels.iter().map(|l| l.voxel_scale).collect();
        assert_eq!(scales, vec![1, 2, 4, 8, 16]);
        assert!(levels
            .iter()
            .all(|l| l.origin == IVec3::ZERO && l.dimensions == IVec3::ONE));
    }

    #[test]
    fn levels_with_negative_origin() {
        let range = BlockIdRange {
            min: IVec3::new(-3, 0, 0),
            size: IVec3::new(5, 1, 1),
        };
        let levels = derive_levels(range, 2);
        assert_eq!(levels.len(), 5);
        assert_eq!(levels[1].origin, IVec3::new(-2, 0, 0));
        assert_eq!(levels[1].dimensions, IVec3::new(3, 1, 1));
        assert_eq!(levels[2].origin, IVec3::new(-1, 0, 0));
        assert_eq!(levels[2].dimensions, IVec3::new(2, 1, 1));
        assert_eq!(levels[4].voxel_scale, 16);
    }

    #[test]
    fn empty_range_has_one_level() {
        assert_eq!(derive_levels(BlockIdRange::default(), 8).len(), 1);
    }

    #[test]
    fn block_slots() {
        let level = MipLevel {
            origin: IVec3::new(-1, 2, 0),
            dimensions: IVec3::new(2, 3, 4),
            voxel_scale: 4,
        };
        assert_eq!(level.block_count(), 24);
        assert_eq!(level.block_slot(IVec3::new(-1, 2, 0)), Some(0));
        assert_eq!(level.block_slot(IVec3::new(0, 4, 3)), Some(23));
        assert_eq!(level.block_slot(IVec3::new(1, 2, 0)), None);
        let slots: Vec<usize> = level.blocks().filter_map(|b| level.block_slot(b)).collect();
        assert_eq!(slots, (0..24).collect::<Vec<_>>());
    }

    #[test]
    fn rejects_bad_layers() {
        let mut store = store_with(4, &[(IVec3::ZERO, 1)]);
        let err = MipPyramid::new(&mut store, &PyramidOptions::with_layer("density")).err();
        assert_eq!(err, Some(Error::MissingLayer("density".to_owned())));

        let mut odd = MemoryBlockStore::<u16>::new("occupancy", BlockLayout::new(3, 0));
        let err = MipPyramid::new(&mut odd, &PyramidOptions::default()).err();
        assert_eq!(err, Some(Error::InvalidBlockResolution(3)));
    }

    #[test]
    fn generates_sparse_mips() {
        let mut store = store_with(4, &[(IVec3::new(1, 2, 3), 5), (IVec3::new(13, 0, 0), 9)]);
        let pyramid = MipPyramid::new(&mut store, &PyramidOptions::default()).unwrap();
        assert_eq!(pyramid.num_levels(), 5);
        assert!(!pyramid.is_empty());

        // Level 1 block (0,0,0) covers level-0 blocks 0..2; block (1,0,0) covers 2..4.
        assert!(pyramid.has_block(1, IVec3::ZERO));
        assert!(pyramid.has_block(1, IVec3::X));
        assert!(!pyramid.has_block(1, IVec3::Y));

        let layout = pyramid.layout();
        let mut data = vec![0; layout.voxel_count()];
        pyramid.get_block(1, IVec3::ZERO, &mut data);
        assert_eq!(pyramid.get_voxel(&data, IVec3::new(0, 1, 1)), 5);
        let occupied = layout.interior().filter(|&p| data[layout.index(p)] > 0).count();
        assert_eq!(occupied, 1);

        pyramid.get_block(4, IVec3::ZERO, &mut data);
        assert_eq!(pyramid.get_voxel(&data, IVec3::ZERO), 9);
    }

    #[test]
    fn coarsest_cells_cover_volume() {
        let mut store = store_with(4, &[(IVec3::new(3, 2, 0), 1)]);
        let pyramid = MipPyramid::new(&mut store, &PyramidOptions::default()).unwrap();
        assert_eq!(pyramid.coarsest_voxels(), vec![IVec3::ZERO]);

        // Block (0,1,0) alone: the single coarsest cell sits off the origin.
        let mut store = store_with(4, &[(IVec3::new(3, 7, 0), 1)]);
        let pyramid = MipPyramid::new(&mut store, &PyramidOptions::default()).unwrap();
        assert_eq!(pyramid.coarsest_voxels(), vec![IVec3::new(0, 1, 0)]);

        let mut store = store_with(2, &[(IVec3::new(-6, 0, 0), 1), (IVec3::new(3, 1, 1), 1)]);
        let pyramid = MipPyramid::new(&mut store, &PyramidOptions::default()).unwrap();
        assert_eq!(
            pyramid.coarsest_voxels(),
            vec![IVec3::new(-1, 0, 0), IVec3::new(0, 0, 0)]
        );
    }

    #[test]
    fn mipped_voxel_cube() {
        let mut store = store_with(16, &[(IVec3::ZERO, 1)]);
        let pyramid = MipPyramid::new(&mut store, &PyramidOptions::default()).unwrap();
        assert_eq!(
            pyramid.cube_for_mipped_voxel(0, IVec3::new(3, 0, 1)),
            (IVec3::new(3, 0, 1), IVec3::new(4, 1, 2))
        );
        assert_eq!(
            pyramid.cube_for_mipped_voxel(3, IVec3::new(1, 0, 1)),
            (IVec3::new(8, 0, 8), IVec3::new(16, 8, 16))
        );
    }

    #[test]
    fn generation_is_idempotent() {
        let mut seed = 0x9e37_79b9;
        let voxels: Vec<(IVec3, u16)> = (0..40)
            .map(|_| {
                let x = (xorshift(&mut seed) % 24) as i32;
                let y = (xorshift(&mut seed) % 24) as i32;
                let z = (xorshift(&mut seed) % 24) as i32;
                (IVec3::new(x, y, z), (xorshift(&mut seed) % 7 + 1) as u16)
            })
            .collect();
        let mut store = store_with(4, &voxels);

        let levels = {
            let pyramid = MipPyramid::new(&mut store, &PyramidOptions::default()).unwrap();
            pyramid.levels().to_vec()
        };
        let snapshot = store.clone();
        let layout = store.layout();

        assert_eq!(generate_mip_blocks(&mut store, &levels, layout), 0);
        assert_eq!(store.block_count(), snapshot.block_count());
        for (level, block, data) in snapshot.blocks() {
            assert_eq!(store.block(level, block), Some(data));
        }
    }

    #[test]
    fn existing_mip_blocks_are_kept() {
        let layout = BlockLayout::new(4, 1);
        let mut store = store_with(4, &[(IVec3::ZERO, 1)]);
        store.add_block(1, IVec3::ZERO, vec![3; layout.voxel_count()]);

        let pyramid = MipPyramid::new(&mut store, &PyramidOptions::default()).unwrap();
        let mut data = vec![0; layout.voxel_count()];
        pyramid.get_block(1, IVec3::ZERO, &mut data);
        assert!(data.iter().all(|&v| v == 3));
    }
}
