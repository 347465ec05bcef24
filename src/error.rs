use thiserror::Error;

use crate::entry::ListKind;
use crate::rules::SortMode;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("couldn't complete database setup: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("couldn't (de)serialize snapshot: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("no config directory available")]
    NoConfigDir,

    #[error("no local data directory available")]
    NoDataDir,

    #[error("{kind} entry '{id}' not found")]
    NotFound { kind: ListKind, id: String },

    #[error("{kind} entry '{id}' is not in history")]
    NotInHistory { kind: ListKind, id: String },

    #[error("urgency must be between 1 and 5, got {0}")]
    InvalidUrgency(u8),

    #[error("{kind} list can't be sorted by {mode}")]
    UnsupportedSort { kind: ListKind, mode: SortMode },
}

pub type Result<T> = std::result::Result<T, Error>;
