use thiserror::Error;

use crate::battle::hex::BattleHexCoord;
use crate::core::types::UnitId;

#[derive(Error, Debug)]
pub enum TacticaError {
    #[error("Unit not found: {0}")]
    UnitNotFound(UnitId),

    #[error("Hex {0:?} is already occupied")]
    HexOccupied(BattleHexCoord),

    #[error("Hex {0:?} is off the map")]
    OffMap(BattleHexCoord),

    #[error("Unit {0} has no weapon able to initiate combat")]
    CannotInitiate(UnitId),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unknown unit type: {0}")]
    UnknownUnitType(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TacticaError>;
