//! Outgoing unit commands
//!
//! Decisions never talk to the engine directly. They push [`UnitCommand`]s
//! into a [`CommandBuffer`] which the host drains once per tick.

pub mod buffer;

pub use buffer::{CommandBuffer, UnitCommand};
