//! Nearest occupied voxel queries over sparse block volumes.
//!
//! A [`MipPyramid`] max-downsamples the blocks of a [`VoxelBlockStore`] into
//! ever coarser levels. A [`BlockCache`] memoizes decoded blocks for a burst of
//! queries, and the [`search`] functions walk the pyramid top-down with
//! branch-and-bound pruning to find the squared distance to the nearest
//! occupied voxel, optionally restricted by a [`Conditioner`].
//!
//! ```ignore
//! let mut store = MemoryBlockStore::<u16>::new("occupancy", BlockLayout::new(16, 1));
//! store.set_voxel(IVec3::new(15, 0, 0), 1);
//!
//! let pyramid = MipPyramid::new(&mut store, &PyramidOptions::default())?;
//! let mut cache = BlockCache::new(&pyramid);
//! let d2 = find_squared_distance_to_nearest_voxel(&mut cache, IVec3::ZERO, 0)?;
//! assert_eq!(d2, Some(14 * 14));
//! ```

// crate-specific exceptions:
#![forbid(unsafe_code)]

pub use voxmip_block::*;

mod cache;
pub use cache::*;

mod conditioner;
pub use conditioner::*;

mod error;
pub use error::*;

mod geometry;
pub use geometry::*;

mod options;
pub use options::*;

mod pyramid;
pub use pyramid::*;

pub mod search;
pub use search::find_squared_distance_to_nearest_conditioned_voxel;
pub use search::find_squared_distance_to_nearest_voxel;
