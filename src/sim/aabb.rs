//! Axis-aligned bounding boxes
//!
//! All hit tests in the simulation reduce to AABB overlap: entity hitboxes,
//! melee swing zones, projectile sweeps, and arena containment.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box (min/max corners)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Build from a center point and full size
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Overlap test (touching edges count as overlapping)
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// True if `other` lies entirely inside this box
    pub fn contains(&self, other: &Aabb) -> bool {
        other.min.x >= self.min.x
            && other.max.x <= self.max.x
            && other.min.y >= self.min.y
            && other.max.y <= self.max.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap() {
        let a = Aabb::from_center(Vec2::ZERO, Vec2::splat(10.0));
        let b = Aabb::from_center(Vec2::new(8.0, 0.0), Vec2::splat(10.0));
        let c = Aabb::from_center(Vec2::new(20.0, 0.0), Vec2::splat(10.0));
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_touching_edges_overlap() {
        let a = Aabb::new(Vec2::ZERO, Vec2::new(10.0, 10.0));
        let b = Aabb::new(Vec2::new(10.0, 0.0), Vec2::new(20.0, 10.0));
        assert!(a.overlaps(&b));
    }

    #[test]
    fn test_contains() {
        let outer = Aabb::new(Vec2::ZERO, Vec2::new(100.0, 100.0));
        let inner = Aabb::new(Vec2::new(10.0, 10.0), Vec2::new(20.0, 20.0));
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(outer.contains_point(Vec2::new(50.0, 50.0)));
        assert!(!outer.contains_point(Vec2::new(150.0, 50.0)));
    }
}
