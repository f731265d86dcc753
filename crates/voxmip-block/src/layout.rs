use glam::IVec3;

/// Shape of a single voxel block: a cube of `resolution`³ voxels surrounded by
/// `border` extra voxels on every side.
///
/// Block buffers store the full bordered cube in x-fastest row-major order:
/// `[x + w * (y + w * z)]` where `w = resolution + 2 * border`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "with_serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockLayout {
    /// Voxels per block edge, excluding the border.
    pub resolution: u32,
    /// Border voxels on each side of the block.
    pub border: u32,
}

impl BlockLayout {
    pub fn new(resolution: u32, border: u32) -> Self {
        Self { resolution, border }
    }

    /// Edge length of the stored cube, border included.
    #[inline]
    pub fn total_size(&self) -> u32 {
        self.resolution + 2 * self.border
    }

    /// Number of samples in one block buffer, border included.
    #[inline]
    pub fn voxel_count(&self) -> usize {
        let w = self.total_size() as usize;
        w * w * w
    }

    /// Linear offset of `local` (relative to the first non-border voxel) in a block buffer.
    ///
    /// `local` may reach into the border, i.e. each component lies in
    /// `-border..resolution + border`.
    #[inline]
    pub fn index(&self, local: IVec3) -> usize {
        let w = self.total_size() as i32;
        let p = local + IVec3::splat(self.border as i32);
        debug_assert!(
            p.cmpge(IVec3::ZERO).all() && p.cmplt(IVec3::splat(w)).all(),
            "voxel {local} outside block of layout {self:?}"
        );
        (p.x + w * (p.y + w * p.z)) as usize
    }

    /// Splits a voxel position into the index of the block holding it and the
    /// position inside that block. Rounds towards negative infinity.
    #[inline]
    pub fn split_coordinates(&self, voxel: IVec3) -> (IVec3, IVec3) {
        let resolution = IVec3::splat(self.resolution as i32);
        let block = voxel.div_euclid(resolution);
        (block, voxel - block * resolution)
    }

    /// Iterates all positions of the non-border part of a block, x fastest.
    pub fn interior(&self) -> impl Iterator<Item = IVec3> {
        cube_positions(self.resolution as i32)
    }
}

/// All positions of the box `[min, min + size)`, x fastest.
pub fn box_positions(min: IVec3, size: IVec3) -> impl Iterator<Item = IVec3> {
    (0..size.z).flat_map(move |z| {
        (0..size.y).flat_map(move |y| (0..size.x).map(move |x| min + IVec3::new(x, y, z)))
    })
}

/// All positions of the cube `[0, size)³`, x fastest.
pub fn cube_positions(size: i32) -> impl Iterator<Item = IVec3> {
    box_positions(IVec3::ZERO, IVec3::splat(size))
}
