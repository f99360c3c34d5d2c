//! Fight outcome prediction

pub mod agent;
pub mod constants;
pub mod predictor;

pub use agent::{CombatAgent, EnemyFilter};
pub use predictor::{CombatPredictor, SimOutcome};
