use ahash::AHashMap;
use serde::Serialize;

use crate::core::types::{UnitId, Vec2};

/// An action for one unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum UnitCommand {
    Move { unit: UnitId, to: Vec2 },
    AttackMove { unit: UnitId, to: Vec2 },
    Attack { unit: UnitId, target: UnitId },
    Gather { unit: UnitId, target: UnitId },
    ReturnCargo { unit: UnitId },
    Repair { unit: UnitId, target: UnitId },
    Stim { unit: UnitId },
    Siege { unit: UnitId },
    Unsiege { unit: UnitId },
    Load { unit: UnitId, transport: UnitId },
    UnloadAll { transport: UnitId, at: Vec2 },
    Stop { unit: UnitId },
}

impl UnitCommand {
    /// The unit receiving the command
    pub fn unit(&self) -> UnitId {
        match *self {
            UnitCommand::Move { unit, .. }
            | UnitCommand::AttackMove { unit, .. }
            | UnitCommand::Attack { unit, .. }
            | UnitCommand::Gather { unit, .. }
            | UnitCommand::ReturnCargo { unit }
            | UnitCommand::Repair { unit, .. }
            | UnitCommand::Stim { unit }
            | UnitCommand::Siege { unit }
            | UnitCommand::Unsiege { unit }
            | UnitCommand::Load { unit, .. }
            | UnitCommand::Stop { unit } => unit,
            UnitCommand::UnloadAll { transport, .. } => transport,
        }
    }
}

/// Commands issued during the current tick, in issue order
#[derive(Debug, Clone, Default)]
pub struct CommandBuffer {
    commands: Vec<UnitCommand>,
    /// Positions in `commands` per receiving unit
    by_unit: AHashMap<UnitId, Vec<usize>>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a command; an identical command already queued this tick is not repeated
    pub fn issue(&mut self, command: UnitCommand) {
        let slots = self.by_unit.entry(command.unit()).or_default();
        if slots.iter().any(|&i| self.commands[i] == command) {
            return;
        }
        slots.push(self.commands.len());
        self.commands.push(command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UnitCommand> {
        self.commands.iter()
    }

    /// Commands addressed to one unit
    pub fn for_unit(&self, unit: UnitId) -> impl Iterator<Item = &UnitCommand> {
        self.by_unit
            .get(&unit)
            .into_iter()
            .flatten()
            .map(|&i| &self.commands[i])
    }

    /// Take everything queued so far
    pub fn drain(&mut self) -> Vec<UnitCommand> {
        self.by_unit.clear();
        std::mem::take(&mut self.commands)
    }
}
