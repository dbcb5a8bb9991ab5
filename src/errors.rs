use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating the reward configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read or written
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The configuration file is not valid RON for the schema
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
    /// The default configuration could not be serialized
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] ron::Error),
    /// A reward entry violates a schema constraint
    #[error("Invalid reward '{reward_id}': {reason}")]
    Invalid { reward_id: String, reason: String },
}

/// Errors local to granting a single reward. These never escape the
/// dispatcher; they are logged and turned into a failed grant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("Malformed item payload: {0}")]
    MalformedItem(String),
    #[error("No item payload variants configured")]
    NoItemVariants,
    #[error("Command template is blank")]
    EmptyCommand,
    #[error("Command '{command}' failed: {reason}")]
    CommandFailed { command: String, reason: String },
    #[error("Inventory full and items are not dropped")]
    InventoryFull,
    #[error("Reward kind cannot be granted")]
    UnknownKind,
}

/// Errors that stop the engine from starting.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Missing required collaborator: {0}")]
    MissingCollaborator(&'static str),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Type alias for Results using ConfigError
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Type alias for Results using DispatchError
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Type alias for Results using EngineError
pub type EngineResult<T> = Result<T, EngineError>;
