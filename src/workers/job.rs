//! Worker job tags and their payloads

use serde::Serialize;

use crate::core::types::{UnitId, UnitTypeId, Vec2};

/// The one job a worker holds
///
/// Payload fields are references by id; they are resolved through the
/// unit registry when used and may point at units that no longer exist.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub enum WorkerJob {
    /// Never given a job
    #[default]
    Unassigned,
    Idle,
    Mining { depot: UnitId, patch: UnitId },
    Gas { refinery: UnitId },
    Repairing { target: UnitId },
    Building { building: UnitTypeId },
    /// Travelling to a site, holding back resources for what it will build
    Moving { to: Vec2, minerals: u32, gas: u32 },
    /// Lent to a combat squad
    Combat,
    Scout,
    ReturningCargo { depot: UnitId },
}

/// Job tag without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum JobKind {
    Unassigned,
    Idle,
    Mining,
    Gas,
    Repairing,
    Building,
    Moving,
    Combat,
    Scout,
    ReturningCargo,
}

impl WorkerJob {
    pub fn kind(&self) -> JobKind {
        match self {
            WorkerJob::Unassigned => JobKind::Unassigned,
            WorkerJob::Idle => JobKind::Idle,
            WorkerJob::Mining { .. } => JobKind::Mining,
            WorkerJob::Gas { .. } => JobKind::Gas,
            WorkerJob::Repairing { .. } => JobKind::Repairing,
            WorkerJob::Building { .. } => JobKind::Building,
            WorkerJob::Moving { .. } => JobKind::Moving,
            WorkerJob::Combat => JobKind::Combat,
            WorkerJob::Scout => JobKind::Scout,
            WorkerJob::ReturningCargo { .. } => JobKind::ReturningCargo,
        }
    }

    /// One-character code for compact debug display
    pub fn code(&self) -> char {
        match self.kind() {
            JobKind::Mining => 'M',
            JobKind::Gas => 'G',
            JobKind::Building => 'B',
            JobKind::Combat => 'C',
            JobKind::Idle => 'I',
            JobKind::Repairing => 'R',
            JobKind::Moving => '>',
            JobKind::Scout => 'S',
            JobKind::ReturningCargo => '$',
            JobKind::Unassigned => '?',
        }
    }

    /// Mining or idle: available to be pulled for other work
    pub fn is_free(&self) -> bool {
        matches!(self, WorkerJob::Idle | WorkerJob::Mining { .. })
    }

    /// The resource this job gathers from, if any
    pub fn resource(&self) -> Option<UnitId> {
        match *self {
            WorkerJob::Mining { patch, .. } => Some(patch),
            WorkerJob::Gas { refinery } => Some(refinery),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let jobs = [
            WorkerJob::Unassigned,
            WorkerJob::Idle,
            WorkerJob::Mining { depot: UnitId(1), patch: UnitId(2) },
            WorkerJob::Gas { refinery: UnitId(3) },
            WorkerJob::Repairing { target: UnitId(4) },
            WorkerJob::Building { building: UnitTypeId(5) },
            WorkerJob::Moving { to: Vec2::ZERO, minerals: 0, gas: 0 },
            WorkerJob::Combat,
            WorkerJob::Scout,
            WorkerJob::ReturningCargo { depot: UnitId(1) },
        ];
        let mut codes: Vec<char> = jobs.iter().map(|j| j.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), jobs.len());
    }

    #[test]
    fn test_free_jobs() {
        assert!(WorkerJob::Idle.is_free());
        assert!(WorkerJob::Mining { depot: UnitId(1), patch: UnitId(2) }.is_free());
        assert!(!WorkerJob::Combat.is_free());
        assert!(!WorkerJob::Unassigned.is_free());
    }
}
