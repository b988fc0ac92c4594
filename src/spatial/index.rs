use crate::core::{bounds::Bounds, geo::Point};

use rstar::{RTree, RTreeObject, AABB};

/// A spatial item that can be indexed via an R-tree
#[derive(Debug, Clone)]
pub struct SpatialItem<T> {
    pub id: String,
    pub bounds: Bounds,
    pub data: T,
}

impl<T> SpatialItem<T> {
    pub fn new(id: impl Into<String>, bounds: Bounds, data: T) -> Self {
        Self {
            id: id.into(),
            bounds,
            data,
        }
    }

    pub fn from_point(id: impl Into<String>, point: Point, data: T) -> Self {
        Self::new(id, Bounds::new(point, point), data)
    }
}

impl<T> RTreeObject for SpatialItem<T> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bounds.min.x, self.bounds.min.y],
            [self.bounds.max.x, self.bounds.max.y],
        )
    }
}

/// R-tree backed index over map-space boxes
pub struct SpatialIndex<T> {
    rtree: RTree<SpatialItem<T>>,
}

impl<T> SpatialIndex<T> {
    pub fn new() -> Self {
        Self { rtree: RTree::new() }
    }

    /// Builds a balanced tree in one pass
    pub fn bulk_load(items: Vec<SpatialItem<T>>) -> Self {
        Self {
            rtree: RTree::bulk_load(items),
        }
    }

    pub fn insert(&mut self, item: SpatialItem<T>) {
        self.rtree.insert(item);
    }

    /// Items whose box intersects `bounds`, edges included
    pub fn query(&self, bounds: &Bounds) -> Vec<&SpatialItem<T>> {
        let envelope = AABB::from_corners(
            [bounds.min.x, bounds.min.y],
            [bounds.max.x, bounds.max.y],
        );
        self.rtree.locate_in_envelope_intersecting(&envelope).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn clear(&mut self) {
        self.rtree = RTree::new();
    }
}

impl<T> Default for SpatialIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> SpatialIndex<usize> {
        SpatialIndex::bulk_load(vec![
            SpatialItem::from_point("a", Point::new(1.0, 1.0), 0),
            SpatialItem::from_point("b", Point::new(5.0, 5.0), 1),
            SpatialItem::from_point("c", Point::new(50.0, 50.0), 2),
        ])
    }

    #[test]
    fn test_query_returns_intersecting_items() {
        let index = index();
        let mut hits: Vec<usize> = index
            .query(&Bounds::from_coords(0.0, 0.0, 10.0, 10.0))
            .into_iter()
            .map(|item| item.data)
            .collect();
        hits.sort_unstable();
        assert_eq!(hits, vec![0, 1]);
    }

    #[test]
    fn test_query_includes_edges_and_inserted_items() {
        let mut index = index();
        index.insert(SpatialItem::from_point("d", Point::new(10.0, 10.0), 3));
        assert_eq!(index.len(), 4);

        // a point on the query edge still intersects
        let hits: Vec<&str> = index
            .query(&Bounds::from_coords(10.0, 10.0, 20.0, 20.0))
            .into_iter()
            .map(|item| item.id.as_str())
            .collect();
        assert_eq!(hits, vec!["d"]);

        index.clear();
        assert!(index.is_empty());
        assert!(index.query(&Bounds::from_coords(0.0, 0.0, 100.0, 100.0)).is_empty());
    }
}
