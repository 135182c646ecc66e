//! Error types for the fallible engine surfaces
//!
//! Only I/O-shaped work can fail: loading or saving configuration and encoding or
//! decoding the pending-soil snapshot. Everything else (missing trees, stale
//! blocks, malformed identifiers) is a normal outcome and reported through
//! `Option` or outcome enums instead.

/// Errors from loading, saving or validating [`EngineConfig`](crate::config::EngineConfig)
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to read the config file
    LoadFailed(String),
    /// Failed to parse config contents
    ParseFailed(String),
    /// Failed to serialize config
    SerializeFailed(String),
    /// Failed to write the config file
    SaveFailed(String),
    /// A field holds a value the engine cannot run with
    Invalid { field: &'static str, reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::LoadFailed(msg) => write!(f, "Failed to load config: {msg}"),
            ConfigError::ParseFailed(msg) => write!(f, "Failed to parse config: {msg}"),
            ConfigError::SerializeFailed(msg) => write!(f, "Failed to serialize config: {msg}"),
            ConfigError::SaveFailed(msg) => write!(f, "Failed to save config: {msg}"),
            ConfigError::Invalid { field, reason } => {
                write!(f, "Invalid config value for `{field}`: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors from persisting the pending-soil snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotError {
    /// Failed to read the snapshot file
    LoadFailed(String),
    /// Failed to parse snapshot contents
    ParseFailed(String),
    /// Failed to serialize the snapshot
    SerializeFailed(String),
    /// Failed to write the snapshot file
    SaveFailed(String),
    /// Snapshot was written by an incompatible format version
    UnsupportedVersion(u32),
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotError::LoadFailed(msg) => write!(f, "Failed to load snapshot: {msg}"),
            SnapshotError::ParseFailed(msg) => write!(f, "Failed to parse snapshot: {msg}"),
            SnapshotError::SerializeFailed(msg) => {
                write!(f, "Failed to serialize snapshot: {msg}")
            }
            SnapshotError::SaveFailed(msg) => write!(f, "Failed to save snapshot: {msg}"),
            SnapshotError::UnsupportedVersion(v) => {
                write!(f, "Unsupported snapshot version: {v}")
            }
        }
    }
}

impl std::error::Error for SnapshotError {}
