//! Bike-vs-bike overlap tests on axis-aligned boxes.
//!
//! Boxes are rebuilt from the current transform on every query; nothing is
//! cached between ticks.

use glam::Vec3;

use crate::constants::{BIKE_CENTER_HEIGHT, BIKE_HALF_EXTENTS, COLLISION_FORCE_SCALE};

/// Axis-aligned box in world space. `min <= max` on every axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_center_half_extents(center: Vec3, half: Vec3) -> Self {
        let half = half.abs();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Box around a bike standing at `position` (ground contact point) and
    /// yawed by `heading`. The footprint grows to cover the rotated body.
    pub fn around_bike(position: Vec3, heading: f32) -> Self {
        let (sin, cos) = heading.sin_cos();
        let (sin, cos) = (sin.abs(), cos.abs());
        let h = BIKE_HALF_EXTENTS;
        let half = Vec3::new(cos * h.x + sin * h.z, h.y, sin * h.x + cos * h.z);
        Self::from_center_half_extents(position + Vec3::Y * BIKE_CENTER_HEIGHT, half)
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Inclusive on faces: touching boxes count as overlapping.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.cmple(other.max).all() && self.max.cmpge(other.min).all()
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        self.min.cmple(point).all() && self.max.cmpge(point).all()
    }
}

pub fn intersects(a: &Aabb, b: &Aabb) -> bool {
    a.intersects(b)
}

/// Unit vector from `a`'s center toward `b`'s. Zero when the centers coincide.
pub fn normal(a: &Aabb, b: &Aabb) -> Vec3 {
    (b.center() - a.center()).normalize_or_zero()
}

/// Per-axis overlap depth, zero on axes that don't overlap.
pub fn penetration(a: &Aabb, b: &Aabb) -> Vec3 {
    (a.max.min(b.max) - a.min.max(b.min)).max(Vec3::ZERO)
}

pub fn distance(a: &Aabb, b: &Aabb) -> f32 {
    a.center().distance(b.center())
}

/// Impulse exchanged by two bikes that touch, from their speeds in km/h.
#[inline]
pub fn collision_force(speed_a: f32, speed_b: f32) -> f32 {
    (speed_a - speed_b).abs() * COLLISION_FORCE_SCALE
}

/// Grid bucket on the ground plane.
#[inline]
pub fn grid_cell(position: Vec3, cell_size: f32) -> (i32, i32) {
    (
        (position.x / cell_size).floor() as i32,
        (position.z / cell_size).floor() as i32,
    )
}

/// Coarse filter: indices of `candidates` whose grid cell is the subject's
/// cell or one of its eight neighbours. Everything that could touch the
/// subject is kept as long as `cell_size` exceeds a bike's length.
pub fn broad_phase<I>(subject: Vec3, candidates: I, cell_size: f32) -> Vec<usize>
where
    I: IntoIterator<Item = Vec3>,
{
    if !(cell_size.is_finite() && cell_size > 0.0) {
        return candidates.into_iter().enumerate().map(|(i, _)| i).collect();
    }

    let (cx, cz) = grid_cell(subject, cell_size);
    candidates
        .into_iter()
        .enumerate()
        .filter_map(|(index, position)| {
            let (x, z) = grid_cell(position, cell_size);
            let near = (x - cx).abs() <= 1 && (z - cz).abs() <= 1;
            near.then_some(index)
        })
        .collect()
}
