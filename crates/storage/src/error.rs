/// All errors that can be returned by a PvStorage implementation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No PV record with the given id.
    #[error("PV not found: {id}")]
    PvNotFound { id: String },

    /// No task record with the given id.
    #[error("task not found: {id}")]
    TaskNotFound { id: String },

    /// No user record with the given id.
    #[error("user not found: {id}")]
    UserNotFound { id: String },

    /// A backend-specific storage error (DB connection, serialization, etc.).
    #[error("storage backend error: {0}")]
    Backend(String),
}
