use glam::IVec3;
use glam::Vec3;
use glam::Vec4;

/// How a box relates to a conditioner's region.
///
/// Ordered `NoMatch < Partial < Match`, so `and` is the minimum, `or` the
/// maximum and `not` mirrors around `Partial`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "with_serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Containment {
    /// The box lies completely outside the region.
    NoMatch,
    /// Undecided, the box may straddle the region's boundary.
    Partial,
    /// The box lies completely inside the region.
    Match,
}

impl Containment {
    #[inline]
    #[must_use]
    pub fn combine_and(self, other: Self) -> Self {
        self.min(other)
    }

    #[inline]
    #[must_use]
    pub fn combine_or(self, other: Self) -> Self {
        self.max(other)
    }

    #[inline]
    #[must_use]
    pub fn negate(self) -> Self {
        match self {
            Self::NoMatch => Self::Match,
            Self::Partial => Self::Partial,
            Self::Match => Self::NoMatch,
        }
    }
}

impl std::ops::BitAnd for Containment {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.combine_and(rhs)
    }
}

impl std::ops::BitOr for Containment {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.combine_or(rhs)
    }
}

impl std::ops::Not for Containment {
    type Output = Self;

    fn not(self) -> Self {
        self.negate()
    }
}

/// A spatial predicate over axis-aligned boxes given in level-0 voxel units.
///
/// `Partial` must be returned whenever the answer could differ for parts of
/// the box; the search then keeps refining it on finer levels.
pub trait Conditioner {
    fn classify(&self, min: IVec3, max: IVec3) -> Containment;
}

impl<F> Conditioner for F
where
    F: Fn(IVec3, IVec3) -> Containment,
{
    fn classify(&self, min: IVec3, max: IVec3) -> Containment {
        self(min, max)
    }
}

/// Composition helpers available on every [`Conditioner`].
pub trait ConditionerExt: Conditioner + Sized {
    fn and<B: Conditioner>(self, other: B) -> And<Self, B> {
        And(self, other)
    }

    fn or<B: Conditioner>(self, other: B) -> Or<Self, B> {
        Or(self, other)
    }

    fn not(self) -> Not<Self> {
        Not(self)
    }
}

impl<C: Conditioner> ConditionerExt for C {}

#[derive(Clone, Debug)]
pub struct And<A, B>(pub A, pub B);

impl<A: Conditioner, B: Conditioner> Conditioner for And<A, B> {
    fn classify(&self, min: IVec3, max: IVec3) -> Containment {
        match self.0.classify(min, max) {
            Containment::NoMatch => Containment::NoMatch,
            lhs => lhs & self.1.classify(min, max),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Or<A, B>(pub A, pub B);

impl<A: Conditioner, B: Conditioner> Conditioner for Or<A, B> {
    fn classify(&self, min: IVec3, max: IVec3) -> Containment {
        match self.0.classify(min, max) {
            Containment::Match => Containment::Match,
            lhs => lhs | self.1.classify(min, max),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Not<A>(pub A);

impl<A: Conditioner> Conditioner for Not<A> {
    fn classify(&self, min: IVec3, max: IVec3) -> Containment {
        !self.0.classify(min, max)
    }
}

/// Axis-aligned box region, e.g. a slab of allowed heights.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxRegion {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoxRegion {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Everything with `lo <= p[axis] <= hi`, unbounded along the other axes.
    pub fn slab(axis: usize, lo: f32, hi: f32) -> Self {
        let mut min = Vec3::splat(f32::NEG_INFINITY);
        let mut max = Vec3::splat(f32::INFINITY);
        min[axis] = lo;
        max[axis] = hi;
        Self { min, max }
    }
}

impl Conditioner for BoxRegion {
    fn classify(&self, min: IVec3, max: IVec3) -> Containment {
        let (min, max) = (min.as_vec3(), max.as_vec3());
        if min.cmpge(self.min).all() && max.cmple(self.max).all() {
            Containment::Match
        } else if max.cmplt(self.min).any() || min.cmpgt(self.max).any() {
            Containment::NoMatch
        } else {
            Containment::Partial
        }
    }
}

/// The half-space `normal.dot(p) + w >= 0` of the plane `(normal, w)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HalfSpace(pub Vec4);

impl HalfSpace {
    pub fn new(normal: Vec3, w: f32) -> Self {
        Self(normal.extend(w))
    }

    /// The side of the plane through `point` that `normal` points into.
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        Self::new(normal, -normal.dot(point))
    }
}

impl Conditioner for HalfSpace {
    fn classify(&self, min: IVec3, max: IVec3) -> Containment {
        let (min, max) = (min.as_vec3(), max.as_vec3());
        let center = (min + max) * 0.5;
        let half_extent = (max - min) * 0.5;

        let normal = self.0.truncate();
        let distance = normal.dot(center) + self.0.w;
        let radius = normal.abs().dot(half_extent);

        if distance - radius >= 0.0 {
            Containment::Match
        } else if distance + radius < 0.0 {
            Containment::NoMatch
        } else {
            Containment::Partial
        }
    }
}

/// Intersection of half-spaces, e.g. the six planes of a view frustum.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frustum {
    pub planes: Vec<HalfSpace>,
}

impl Frustum {
    pub fn new(planes: Vec<HalfSpace>) -> Self {
        Self { planes }
    }
}

impl Conditioner for Frustum {
    fn classify(&self, min: IVec3, max: IVec3) -> Containment {
        let mut result = Containment::Match;
        for plane in &self.planes {
            result = result & plane.classify(min, max);
            if result == Containment::NoMatch {
                break;
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::Containment::Match;
    use super::Containment::NoMatch;
    use super::Containment::Partial;

    #[test]
    fn lattice() {
        assert_eq!(Match & Partial, Partial);
        assert_eq!(NoMatch & Match, NoMatch);
        assert_eq!(NoMatch | Partial, Partial);
        assert_eq!(Match | NoMatch, Match);
        assert_eq!(!Match, NoMatch);
        assert_eq!(!Partial, Partial);
        assert_eq!(!NoMatch, Match);

        for a in [NoMatch, Partial, Match] {
            for b in [NoMatch, Partial, Match] {
                // De Morgan holds on the three-valued lattice.
                assert_eq!(!(a & b), !a | !b);
                assert_eq!(a.combine_or(b), b.combine_or(a));
            }
        }
    }

    #[test]
    fn box_region() {
        let region = BoxRegion::new(Vec3::new(8.0, 0.0, 0.0), Vec3::new(16.0, 16.0, 16.0));
        assert_eq!(region.classify(IVec3::new(15, 0, 0), IVec3::new(16, 1, 1)), Match);
        assert_eq!(region.classify(IVec3::ZERO, IVec3::ONE), NoMatch);
        assert_eq!(region.classify(IVec3::ZERO, IVec3::splat(16)), Partial);

        let slab = BoxRegion::slab(1, 2.0, 4.0);
        assert_eq!(slab.classify(IVec3::new(-100, 2, 50), IVec3::new(-99, 3, 51)), Match);
        assert_eq!(slab.classify(IVec3::new(0, 5, 0), IVec3::new(1, 6, 1)), NoMatch);
        assert_eq!(slab.classify(IVec3::new(0, 0, 0), IVec3::new(8, 8, 8)), Partial);
    }

    #[test]
    fn half_space() {
        // x <= 4
        let plane = HalfSpace::new(Vec3::new(-1.0, 0.0, 0.0), 4.0);
        assert_eq!(plane.classify(IVec3::ZERO, IVec3::ONE), Match);
        assert_eq!(plane.classify(IVec3::new(15, 0, 0), IVec3::new(16, 1, 1)), NoMatch);
        assert_eq!(plane.classify(IVec3::ZERO, IVec3::splat(8)), Partial);

        let same = HalfSpace::from_point_normal(Vec3::new(4.0, 7.0, -2.0), Vec3::NEG_X);
        assert_eq!(same, plane);
    }

    #[test]
    fn frustum_is_intersection() {
        let frustum = Frustum::new(vec![
            HalfSpace::new(Vec3::X, 0.0),
            HalfSpace::new(Vec3::NEG_X, 8.0),
        ]);
        assert_eq!(frustum.classify(IVec3::new(2, 0, 0), IVec3::new(4, 9, 9)), Match);
        assert_eq!(frustum.classify(IVec3::new(6, 0, 0), IVec3::new(10, 1, 1)), Partial);
        assert_eq!(frustum.classify(IVec3::new(-4, 0, 0), IVec3::new(-2, 1, 1)), NoMatch);
        assert_eq!(Frustum::default().classify(IVec3::ZERO, IVec3::ONE), Match);
    }

    #[test]
    fn combinators() {
        let left = HalfSpace::new(Vec3::NEG_X, 4.0);
        let right = BoxRegion::new(Vec3::new(8.0, 0.0, 0.0), Vec3::splat(16.0));
        let either = left.or(right);
        let cell_a = (IVec3::ZERO, IVec3::ONE);
        let cell_b = (IVec3::new(15, 0, 0), IVec3::new(16, 1, 1));
        let cell_c = (IVec3::new(5, 0, 0), IVec3::new(6, 1, 1));

        assert_eq!(either.classify(cell_a.0, cell_a.1), Match);
        assert_eq!(either.classify(cell_b.0, cell_b.1), Match);
        assert_eq!(either.classify(cell_c.0, cell_c.1), NoMatch);

        let neither = either.not();
        assert_eq!(neither.classify(cell_c.0, cell_c.1), Match);

        let never = left.and(right);
        assert_eq!(never.classify(cell_a.0, cell_a.1), NoMatch);
        assert_eq!(never.classify(cell_b.0, cell_b.1), NoMatch);

        let closure = |min: IVec3, _max: IVec3| if min.y > 0 { Match } else { Partial };
        let both = closure.and(left);
        assert_eq!(both.classify(IVec3::new(0, 1, 0), IVec3::new(1, 2, 1)), Match);
        assert_eq!(both.classify(cell_a.0, cell_a.1), Partial);
    }
}
