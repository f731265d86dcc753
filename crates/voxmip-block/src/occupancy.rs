use num_traits::PrimInt;
use num_traits::Unsigned;

/// A scalar voxel sample. Zero is empty, anything greater is occupied.
///
/// Implemented for every unsigned primitive integer (`u8`, `u16`, `u32`, ...).
pub trait Occupancy: PrimInt + Unsigned + Default + Send + Sync + std::fmt::Debug + 'static {
    #[inline]
    fn is_occupied(self) -> bool {
        self > Self::zero()
    }
}

impl<T> Occupancy for T where
    T: PrimInt + Unsigned + Default + Send + Sync + std::fmt::Debug + 'static
{
}
