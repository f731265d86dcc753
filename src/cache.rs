use crate::MipPyramid;
use glam::IVec3;
use voxmip_block::VoxelBlockStore;

enum Slot<V> {
    Unqueried,
    Empty,
    Present(Box<[V]>),
}

/// Lazily filled copy of the pyramid's blocks for one burst of queries.
///
/// Every level gets a flat slot array covering its whole block range. A slot is
/// resolved on first access and kept for the cache's lifetime, absent blocks
/// included, so the store is asked about each block at most once.
///
/// Not meant to be shared between threads; use one cache per query thread.
pub struct BlockCache<'p, S: VoxelBlockStore + ?Sized> {
    pyramid: &'p MipPyramid<'p, S>,
    levels: Vec<Vec<Slot<S::Voxel>>>,
    cached: usize,
}

impl<'p, S: VoxelBlockStore + ?Sized> BlockCache<'p, S> {
    pub fn new(pyramid: &'p MipPyramid<'p, S>) -> Self {
        let levels = pyramid
            .levels()
            .iter()
            .map(|level| {
                std::iter::repeat_with(|| Slot::Unqueried)
                    .take(level.block_count())
                    .collect()
            })
            .collect();

        Self {
            pyramid,
            levels,
            cached: 0,
        }
    }

    pub fn pyramid(&self) -> &'p MipPyramid<'p, S> {
        self.pyramid
    }

    /// Number of blocks resolved so far, whether present or absent.
    pub fn cached_block_count(&self) -> usize {
        self.cached
    }

    /// The block buffer at `(level, block)`, or an empty slice if it doesn't exist.
    pub fn get_block(&mut self, level: usize, block: IVec3) -> &[S::Voxel] {
        let pyramid = self.pyramid;
        let Some(index) = pyramid.level(level).and_then(|l| l.block_slot(block)) else {
            return &[];
        };

        let slot = &mut self.levels[level][index];
        if matches!(slot, Slot::Unqueried) {
            *slot = if pyramid.has_block(level, block) {
                let mut data = vec![S::Voxel::default(); pyramid.layout().voxel_count()];
                pyramid.get_block(level, block, &mut data);
                Slot::Present(data.into_boxed_slice())
            } else {
                Slot::Empty
            };
            self.cached += 1;
        }

        match slot {
            Slot::Present(data) => &data[..],
            Slot::Empty | Slot::Unqueried => &[],
        }
    }

    /// Occupancy of `voxel` (in `level`'s voxel units). Missing data reads as zero.
    pub fn get_voxel(&mut self, level: usize, voxel: IVec3) -> S::Voxel {
        let pyramid = self.pyramid;
        if pyramid.is_empty() {
            return S::Voxel::default();
        }

        let (block, local) = pyramid.layout().split_coordinates(voxel);
        let data = self.get_block(level, block);
        if data.is_empty() {
            S::Voxel::default()
        } else {
            pyramid.get_voxel(data, local)
        }
    }
}
