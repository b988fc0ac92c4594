use crate::core::{bounds::Bounds, geo::Point};

/// Axis-aligned culling against the visible area.
pub struct Culling;

impl Culling {
    /// Returns `true` if the supplied rectangle is at least partially inside the area.
    pub fn aabb_intersects(area: &Bounds, target: &Bounds) -> bool {
        area.intersects(target)
    }

    /// Returns `true` if a point lies strictly inside the area. Points on an
    /// edge are culled.
    pub fn point_visible(area: &Bounds, p: &Point) -> bool {
        area.contains_strict(p)
    }

    /// Indices of the visible points, in iteration order
    pub fn visible_indices<'a>(
        area: &Bounds,
        points: impl Iterator<Item = &'a Point>,
    ) -> Vec<usize> {
        points
            .enumerate()
            .filter_map(|(idx, p)| Self::point_visible(area, p).then_some(idx))
            .collect()
    }
}
