//! Unit information layer
//!
//! - `unit_type`: per-type stats loaded from TOML
//! - `snapshot`: last-known state of one unit
//! - `registry`: the owned table every other component resolves ids through

pub mod registry;
pub mod snapshot;
pub mod unit_type;

pub use registry::{closest, BaseLayout, Economy, UnitRegistry};
pub use snapshot::{UnitOrder, UnitSnapshot};
pub use unit_type::{load_catalog, UnitCatalog, UnitRole, UnitStats};
