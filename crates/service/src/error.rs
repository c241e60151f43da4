use pvdesk_core::ValidationError;
use pvdesk_storage::StorageError;

/// Errors surfaced by the lifecycle and image services.
///
/// Display strings are the user-facing French messages the legacy client
/// shows verbatim; backend failures keep their technical message and are
/// reported generically at the HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Tâche non trouvée")]
    TaskNotFound,

    #[error("PV non trouvé")]
    PvNotFound,

    /// Missing or malformed fields in a create payload.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Image operation on a non-surveillance PV.
    #[error("Les images ne peuvent être ajoutées qu'aux PV de surveillance")]
    NotSurveillance,

    /// Image reference not present on the PV.
    #[error("Image non trouvée dans le PV")]
    ImageNotFound,

    /// Rejected upload: wrong count, content-type, or size.
    #[error("{0}")]
    InvalidUpload(String),

    /// Counter increment, persistence, or file I/O failure.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl ServiceError {
    /// True for errors caused by the request rather than the backend.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ServiceError::Storage(_))
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::PvNotFound { .. } => ServiceError::PvNotFound,
            StorageError::TaskNotFound { .. } => ServiceError::TaskNotFound,
            StorageError::UserNotFound { .. } | StorageError::Backend(_) => {
                ServiceError::Storage(err.to_string())
            }
        }
    }
}
