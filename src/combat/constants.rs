//! Combat prediction constants

/// Added to weapon range when checking whether a target can be hit;
/// approximates the sum of the two units' footprints
pub const CONTACT_DISTANCE: f32 = 16.0;

/// Meat-grinder scoring weighs each enemy loss this many times a friendly one
pub const MEAT_GRINDER_ENEMY_WEIGHT: f64 = 3.0;
