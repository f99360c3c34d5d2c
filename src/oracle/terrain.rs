use crate::core::types::Vec2;

/// Identifier of a ground-connected area of the map
pub type PartitionId = u32;

/// Precomputed terrain analysis
///
/// Implementations must be pure: the same question always gets the same
/// answer for the lifetime of a game.
pub trait TerrainOracle {
    /// Walking distance between two points, `None` if unreachable by ground
    fn ground_distance(&self, from: Vec2, to: Vec2) -> Option<f32>;

    /// Connected ground area containing `pos`
    fn partition_id(&self, pos: Vec2) -> PartitionId;

    /// Center of the region containing `pos`
    fn region_center(&self, pos: Vec2) -> Vec2;

    fn same_partition(&self, a: Vec2, b: Vec2) -> bool {
        self.partition_id(a) == self.partition_id(b)
    }
}

/// A flat map with no obstacles, split into square regions
#[derive(Debug, Clone)]
pub struct OpenTerrain {
    pub region_size: f32,
}

impl Default for OpenTerrain {
    fn default() -> Self {
        Self { region_size: 256.0 }
    }
}

impl TerrainOracle for OpenTerrain {
    fn ground_distance(&self, from: Vec2, to: Vec2) -> Option<f32> {
        Some(from.distance(&to))
    }

    fn partition_id(&self, _pos: Vec2) -> PartitionId {
        0
    }

    fn region_center(&self, pos: Vec2) -> Vec2 {
        let size = self.region_size;
        Vec2::new(
            ((pos.x / size).floor() + 0.5) * size,
            ((pos.y / size).floor() + 0.5) * size,
        )
    }
}
