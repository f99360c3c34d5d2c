use thiserror::Error;

use crate::core::types::UnitTypeId;

#[derive(Error, Debug)]
pub enum CommanderError {
    #[error("Unknown unit type: {0:?}")]
    UnknownUnitType(UnitTypeId),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Squad already exists: {0}")]
    DuplicateSquad(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CommanderError>;
