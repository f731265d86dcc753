use glam::IVec3;

/// Offsets of the 8 corners of the unit cube.
///
/// The child cells of a mip cell `c` are `c * 2 + CUBE_CORNERS[i]`.
pub const CUBE_CORNERS: [IVec3; 8] = [
    IVec3::new(0, 0, 0),
    IVec3::new(1, 0, 0),
    IVec3::new(0, 1, 0),
    IVec3::new(0, 0, 1),
    IVec3::new(1, 1, 0),
    IVec3::new(0, 1, 1),
    IVec3::new(1, 0, 1),
    IVec3::new(1, 1, 1),
];

/// The 8 children of `cell` on the next finer level.
#[inline]
pub fn child_cells(cell: IVec3) -> impl Iterator<Item = IVec3> {
    CUBE_CORNERS.into_iter().map(move |corner| cell * 2 + corner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_are_distinct_unit_offsets() {
        for (i, a) in CUBE_CORNERS.iter().enumerate() {
            assert!(a.cmpge(IVec3::ZERO).all() && a.cmple(IVec3::ONE).all());
            for b in &CUBE_CORNERS[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn children_of_negative_cell() {
        let children: Vec<IVec3> = child_cells(IVec3::new(-1, 0, 2)).collect();
        assert_eq!(children[0], IVec3::new(-2, 0, 4));
        assert_eq!(children[7], IVec3::new(-1, 1, 5));
        assert!(children.iter().all(|c| c.div_euclid(IVec3::splat(2)) == IVec3::new(-1, 0, 2)));
    }
}
