use glam::IVec3;

/// Saturates at `u64::MAX`; per-axis gaps between `i32` values always fit in `u64`.
#[inline]
fn squared_length(d: [i64; 3]) -> u64 {
    d.iter()
        .map(|&c| u128::from(c.unsigned_abs()).pow(2))
        .sum::<u128>()
        .try_into()
        .unwrap_or(u64::MAX)
}

/// Squared distance from `point` to the closed box `[min, max]`. Zero inside the box.
#[inline]
pub fn squared_distance_aabox_point(min: IVec3, max: IVec3, point: IVec3) -> u64 {
    let gap = |lo: i32, hi: i32, p: i32| {
        let (lo, hi, p) = (i64::from(lo), i64::from(hi), i64::from(p));
        if p < lo {
            lo - p
        } else if p > hi {
            p - hi
        } else {
            0
        }
    };
    squared_length([
        gap(min.x, max.x, point.x),
        gap(min.y, max.y, point.y),
        gap(min.z, max.z, point.z),
    ])
}

/// Squared distance from `point` to the farthest corner of the box `[min, max]`.
#[inline]
pub fn squared_max_distance_aabox_point(min: IVec3, max: IVec3, point: IVec3) -> u64 {
    let reach = |lo: i32, hi: i32, p: i32| {
        let (lo, hi, p) = (i64::from(lo), i64::from(hi), i64::from(p));
        (p - lo).abs().max((p - hi).abs())
    };
    squared_length([
        reach(min.x, max.x, point.x),
        reach(min.y, max.y, point.y),
        reach(min.z, max.z, point.z),
    ])
}
