use folio_core::error::CoreError;
use folio_core::policy::EditDenied;
use folio_db::StoreError;

/// Error type returned by every engine operation.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A domain rule refused the operation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The store failed or rejected a write unexpectedly.
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl From<EditDenied> for EngineError {
    fn from(denied: EditDenied) -> Self {
        EngineError::Core(denied.into())
    }
}
