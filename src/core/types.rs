//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// Stable identifier the host engine assigns to a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl UnitId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of a unit type in the [`UnitCatalog`](crate::units::UnitCatalog)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitTypeId(pub u16);

/// Game frame counter (simulation time unit)
pub type Tick = u64;

/// Frames per game second at normal speed
pub const FRAMES_PER_SECOND: Tick = 24;

/// Which side a unit belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Owner {
    Own,
    Enemy,
    Neutral,
}

/// 2D position in map pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Self) -> f32 {
        self.distance_squared(other).sqrt()
    }

    #[inline]
    pub fn distance_squared(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Unit vector in the same direction.
    ///
    /// The zero vector has no direction; callers must not normalize it.
    pub fn normalize(&self) -> Self {
        let len = self.length();
        debug_assert!(len > 0.0001, "normalize called on a zero-length vector");
        Self {
            x: self.x / len,
            y: self.y / len,
        }
    }

    /// Move from `self` toward `target` by at most `step`
    pub fn step_toward(&self, target: Vec2, step: f32) -> Vec2 {
        let dist = self.distance(&target);
        if dist <= step || dist <= 0.0001 {
            target
        } else {
            *self + (target - *self) * (step / dist)
        }
    }

    /// Mean of a set of points, or `None` when empty
    pub fn centroid(points: impl IntoIterator<Item = Vec2>) -> Option<Vec2> {
        let mut sum = Vec2::ZERO;
        let mut count = 0usize;
        for p in points {
            sum = sum + p;
            count += 1;
        }
        (count > 0).then(|| sum * (1.0 / count as f32))
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self { x: self.x * rhs, y: self.y * rhs }
    }
}
