/// Queries answered by build-order planning
pub trait ProductionOracle {
    /// Some building is currently under construction
    fn anything_being_built(&self) -> bool;

    /// The next queued production item is a building
    fn next_is_building(&self) -> bool;
}

/// Production state as plain values, for hosts that poll it once per tick
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductionStatus {
    pub building_in_progress: bool,
    pub next_item_is_building: bool,
}

impl ProductionOracle for ProductionStatus {
    fn anything_being_built(&self) -> bool {
        self.building_in_progress
    }

    fn next_is_building(&self) -> bool {
        self.next_item_is_building
    }
}
