pub mod config;
pub mod error;
pub mod types;

pub use config::CommanderConfig;
pub use error::{CommanderError, Result};
pub use types::{Owner, Tick, UnitId, UnitTypeId, Vec2, FRAMES_PER_SECOND};
