use std::path::PathBuf;

use crate::group::GroupId;
use crate::piece::PieceId;

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("no piece with id {0}")]
    UnknownPiece(PieceId),
    #[error("no group with id {0}")]
    UnknownGroup(GroupId),
    #[error("a table needs at least one piece")]
    EmptyTable,
    #[error("solution neighborhood of piece {0} was already initialized")]
    NeighborhoodAlreadyInitialized(PieceId),
    #[error("piece {0} belongs to a group and cannot be placed on its own")]
    PieceGrouped(PieceId),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
