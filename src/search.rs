//! Nearest occupied voxel search over a [`MipPyramid`].
//!
//! Both searches walk the pyramid from the coarsest level down. On each level
//! the occupied children of the surviving cells become candidates, and a
//! candidate is dropped when even its nearest point lies farther away than the
//! farthest point of some other candidate. Since a coarse cell is occupied iff
//! one of its children is, this never discards the cell holding the answer.

use crate::geometry::squared_distance_aabox_point;
use crate::geometry::squared_max_distance_aabox_point;
use crate::BlockCache;
use crate::Conditioner;
use crate::Containment;
use crate::Error;
use crate::MipPyramid;
use glam::IVec3;
use voxmip_block::child_cells;
use voxmip_block::Occupancy;
use voxmip_block::VoxelBlockStore;

fn check_min_level<S: VoxelBlockStore + ?Sized>(
    pyramid: &MipPyramid<'_, S>,
    min_level: usize,
) -> Result<usize, Error> {
    let num_levels = pyramid.num_levels();
    if min_level + 1 >= num_levels {
        Err(Error::InvalidMinLevel {
            min_level,
            num_levels,
        })
    } else {
        Ok(num_levels)
    }
}

/// Occupied children on `level` of the given cells one level up.
fn occupied_children<S: VoxelBlockStore + ?Sized>(
    cache: &mut BlockCache<'_, S>,
    level: usize,
    cells: &[IVec3],
) -> Vec<IVec3> {
    cells
        .iter()
        .flat_map(|&cell| child_cells(cell))
        .filter(|&child| cache.get_voxel(level, child).is_occupied())
        .collect()
}

/// Smallest farthest-corner distance over the candidates' mip cubes.
fn min_of_max_distances<S: VoxelBlockStore + ?Sized>(
    pyramid: &MipPyramid<'_, S>,
    level: usize,
    candidates: &[IVec3],
    position: IVec3,
) -> u64 {
    candidates
        .iter()
        .map(|&cell| {
            let (min, max) = pyramid.cube_for_mipped_voxel(level, cell);
            squared_max_distance_aabox_point(min, max, position)
        })
        .min()
        .unwrap_or(u64::MAX)
}

/// Keeps the cells whose mip cube comes within `bound` of `position`.
fn prune<S: VoxelBlockStore + ?Sized>(
    pyramid: &MipPyramid<'_, S>,
    level: usize,
    mut cells: Vec<IVec3>,
    position: IVec3,
    bound: u64,
) -> Vec<IVec3> {
    cells.retain(|&cell| {
        let (min, max) = pyramid.cube_for_mipped_voxel(level, cell);
        squared_distance_aabox_point(min, max, position) <= bound
    });
    cells
}

/// Distance to the nearest unit cell, measured in the final level's own voxel grid.
fn nearest_unit_cell<'c>(
    cells: impl IntoIterator<Item = &'c IVec3>,
    position: IVec3,
) -> Option<u64> {
    cells
        .into_iter()
        .map(|&cell| squared_distance_aabox_point(cell, cell + IVec3::ONE, position))
        .min()
}

/// Squared distance from `position` to the nearest occupied voxel of `min_level`.
///
/// `position` is given in level-0 voxels. The returned distance is measured to
/// the unit cell `[v, v + 1]` of the winning voxel `v` in `min_level`'s own
/// voxel grid, so for `min_level > 0` it is a coarse approximation.
///
/// Returns `Ok(None)` when no occupied voxel exists, which includes every query
/// against an empty store. `min_level` must be below the coarsest level.
pub fn find_squared_distance_to_nearest_voxel<S: VoxelBlockStore + ?Sized>(
    cache: &mut BlockCache<'_, S>,
    position: IVec3,
    min_level: usize,
) -> Result<Option<u64>, Error> {
    let pyramid = cache.pyramid();
    if pyramid.is_empty() {
        return Ok(None);
    }
    let mut level = check_min_level(pyramid, min_level)? - 1;

    let _span = tracing::trace_span!("nearest_voxel", %position, min_level).entered();

    let mut current: Vec<IVec3> = pyramid
        .coarsest_voxels()
        .into_iter()
        .filter(|&cell| cache.get_voxel(level, cell).is_occupied())
        .collect();

    while !current.is_empty() {
        level -= 1;
        let candidates = occupied_children(cache, level, &current);
        tracing::trace!(level, candidates = candidates.len(), "expanded");

        if level == min_level {
            return Ok(nearest_unit_cell(&candidates, position));
        }

        let bound = min_of_max_distances(pyramid, level, &candidates, position);
        current = prune(pyramid, level, candidates, position, bound);
    }

    Ok(None)
}

/// Like [`find_squared_distance_to_nearest_voxel`], but only counts voxels inside
/// the region described by `conditioner`.
///
/// Cells the conditioner can't decide on (`Partial`) are refined level by level
/// alongside the fully matching ones. Whatever is still partial on `min_level`
/// counts as a match.
pub fn find_squared_distance_to_nearest_conditioned_voxel<S, C>(
    cache: &mut BlockCache<'_, S>,
    position: IVec3,
    conditioner: &C,
    min_level: usize,
) -> Result<Option<u64>, Error>
where
    S: VoxelBlockStore + ?Sized,
    C: Conditioner + ?Sized,
{
    let pyramid = cache.pyramid();
    if pyramid.is_empty() {
        return Ok(None);
    }
    let mut level = check_min_level(pyramid, min_level)? - 1;

    let _span = tracing::trace_span!("nearest_conditioned_voxel", %position, min_level).entered();

    let mut current = Vec::new();
    let mut partials = Vec::new();
    for cell in pyramid.coarsest_voxels() {
        if !cache.get_voxel(level, cell).is_occupied() {
            continue;
        }
        let (min, max) = pyramid.cube_for_mipped_voxel(level, cell);
        match conditioner.classify(min, max) {
            Containment::Match => current.push(cell),
            Containment::Partial => partials.push(cell),
            Containment::NoMatch => {}
        }
    }

    while !current.is_empty() || !partials.is_empty() {
        level -= 1;

        let mut candidates = occupied_children(cache, level, &current);
        let mut partial_candidates = Vec::new();
        for child in occupied_children(cache, level, &partials) {
            let (min, max) = pyramid.cube_for_mipped_voxel(level, child);
            match conditioner.classify(min, max) {
                Containment::Match => candidates.push(child),
                Containment::Partial => partial_candidates.push(child),
                Containment::NoMatch => {}
            }
        }
        tracing::trace!(
            level,
            candidates = candidates.len(),
            partials = partial_candidates.len(),
            "expanded"
        );

        if level == min_level {
            return Ok(nearest_unit_cell(
                candidates.iter().chain(&partial_candidates),
                position,
            ));
        }

        // Only cells known to match may tighten the bound.
        let bound = min_of_max_distances(pyramid, level, &candidates, position);
        current = prune(pyramid, level, candidates, position, bound);
        partials = prune(pyramid, level, partial_candidates, position, bound);
    }

    Ok(None)
}
