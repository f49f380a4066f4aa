use std::fmt;

// === FavoriteError ===

/// Errors raised by the local favorites store.
///
/// A duplicate add is not an error: it only refreshes `last_used_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavoriteError {
    /// The candidate is missing a required field.
    InvalidCandidate(String),
    /// The on-device snapshot could not be written. The in-memory change stands.
    PersistenceWriteFailure(String),
    /// No favorite with the given ID exists.
    NotFound(String),
}

impl fmt::Display for FavoriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FavoriteError::InvalidCandidate(msg) => write!(f, "Invalid favorite: {}", msg),
            FavoriteError::PersistenceWriteFailure(msg) => {
                write!(f, "Favorite may not be saved: {}", msg)
            }
            FavoriteError::NotFound(id) => write!(f, "Favorite not found: {}", id),
        }
    }
}

impl std::error::Error for FavoriteError {}

impl From<StorageError> for FavoriteError {
    fn from(err: StorageError) -> Self {
        FavoriteError::PersistenceWriteFailure(err.to_string())
    }
}

// === StorageError ===

/// Errors from the on-device key-value storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Database operation failed.
    DatabaseError(String),
    /// A stored value could not be encoded or decoded.
    SerializationError(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::DatabaseError(msg) => write!(f, "Storage database error: {}", msg),
            StorageError::SerializationError(msg) => {
                write!(f, "Storage serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for StorageError {}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::DatabaseError(err.to_string())
    }
}

// === SyncError ===

/// Errors from the remote favorites table.
///
/// Always advisory: callers keep operating on local state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Network, auth or timeout failure talking to the remote table.
    RemoteUnavailable(String),
    /// No signed-in user; sync is skipped.
    Unauthenticated,
    /// The remote answered with something that is not a favorites row set.
    InvalidResponse(String),
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::RemoteUnavailable(msg) => write!(f, "Remote unavailable: {}", msg),
            SyncError::Unauthenticated => write!(f, "Sync skipped: not signed in"),
            SyncError::InvalidResponse(msg) => write!(f, "Invalid remote response: {}", msg),
        }
    }
}

impl std::error::Error for SyncError {}

// === ReflectionError ===

/// Errors from the reflections journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReflectionError {
    /// Title or content empty after trimming.
    InvalidEntry(String),
    /// No reflection with the given ID exists for this user.
    NotFound(String),
    /// The remote table could not be reached.
    RemoteUnavailable(String),
    /// Journal operations need a signed-in user.
    Unauthenticated,
}

impl fmt::Display for ReflectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReflectionError::InvalidEntry(msg) => write!(f, "Invalid reflection: {}", msg),
            ReflectionError::NotFound(id) => write!(f, "Reflection not found: {}", id),
            ReflectionError::RemoteUnavailable(msg) => {
                write!(f, "Reflection not saved, remote unavailable: {}", msg)
            }
            ReflectionError::Unauthenticated => write!(f, "Sign in to use the journal"),
        }
    }
}

impl std::error::Error for ReflectionError {}

impl From<SyncError> for ReflectionError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Unauthenticated => ReflectionError::Unauthenticated,
            SyncError::RemoteUnavailable(msg) | SyncError::InvalidResponse(msg) => {
                ReflectionError::RemoteUnavailable(msg)
            }
        }
    }
}

// === AuthError ===

/// Errors decoding the session handed over by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    InvalidToken(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidToken(msg) => write!(f, "Invalid access token: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

// === SettingsError ===

/// Errors related to settings operations.
#[derive(Debug)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    IoError(String),
    /// Settings data could not be serialized or deserialized.
    SerializationError(String),
    /// The requested settings key does not exist.
    InvalidKey(String),
    /// The provided value is invalid for the given key.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidKey(key) => write!(f, "Invalid settings key: {}", key),
            SettingsError::InvalidValue(msg) => write!(f, "Invalid settings value: {}", msg),
        }
    }
}

impl std::error::Error for SettingsError {}
