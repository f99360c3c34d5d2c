//! Root context: owns every component and drives one decision tick

pub mod budget;
pub mod commander;
pub mod event;
pub mod tick;

pub use budget::TickBudget;
pub use commander::Commander;
pub use event::UnitEvent;
pub use tick::TickReport;
