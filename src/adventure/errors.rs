use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the adventure core.
///
/// Load-time variants (`NotFound`, `MalformedDescription`, `Io`) abort the
/// current load call only. Command-time variants are recovered by the
/// command engine and rendered for the player. `PositionWrite` is the one
/// error the engine hands back to its caller.
#[derive(Debug, Error)]
pub enum AdventureError {
    /// A description file or directory does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A description file exists but cannot be understood.
    #[error("malformed description {path}: {reason}")]
    MalformedDescription { path: PathBuf, reason: String },

    /// Wrapper around IO errors other than a missing file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The item cannot be put in an inventory.
    #[error("{0} cannot be carried")]
    NotCarriable(String),

    /// The inventory holds no slot for this item.
    #[error("no {0} here")]
    ItemNotFound(String),

    /// The slot holds fewer units than requested.
    #[error("not enough {item_id}: {available} available, {requested} requested")]
    InsufficientQuantity {
        item_id: String,
        available: u32,
        requested: u32,
    },

    /// Quantities must be positive.
    #[error("quantity must be a positive integer")]
    InvalidQuantity,

    /// Adding would push a slot past `u32::MAX` units.
    #[error("cannot hold that many {0}")]
    QuantityOverflow(String),

    /// A target argument is neither a direction nor a known item.
    #[error("'{0}' is neither a direction nor an item")]
    AmbiguousArgument(String),

    /// No handler is registered for this command identifier.
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// Arguments do not fit the command's grammar.
    #[error("invalid arguments for {command}, usage: {usage}")]
    InvalidArguments { command: String, usage: String },

    /// A game command was issued while no instance is loaded.
    #[error("no game loaded")]
    NoActiveGame,

    /// Creating an instance whose directory already exists.
    #[error("a game instance named {0} already exists")]
    InstanceExists(String),

    /// An identifier or instance name failed validation.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Another process holds the instance lock.
    #[error("game instance {0} is already in use")]
    InstanceLocked(String),

    /// The new position could not be recorded in the instance file.
    #[error("cannot record position {path}: {source}")]
    PositionWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl AdventureError {
    /// Builds a `MalformedDescription` for the given file.
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        AdventureError::MalformedDescription {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True for the load-time failures of a description catalog.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            AdventureError::NotFound(_)
                | AdventureError::MalformedDescription { .. }
                | AdventureError::Io(_)
        )
    }
}

pub type AdventureResult<T> = Result<T, AdventureError>;
