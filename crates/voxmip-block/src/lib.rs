//! Sparse voxel block storage primitives: block layout, the block store interface
//! and an in-memory store.

#![forbid(unsafe_code)]

mod corners;
pub use corners::*;

mod layout;
pub use layout::*;

mod memory;
pub use memory::*;

mod occupancy;
pub use occupancy::*;

mod store;
pub use store::*;
