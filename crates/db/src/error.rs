/// Errors surfaced by a [`WikiStore`](crate::store::WikiStore).
///
/// Unique violations are split out so the engine can turn them into
/// conflicts; everything else is an infrastructure failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint (named `uq_*`) rejected the write.
    #[error("Duplicate value violates unique constraint: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// The violated constraint, if this is a duplicate.
    pub fn duplicate_constraint(&self) -> Option<&str> {
        match self {
            StoreError::Duplicate(constraint) => Some(constraint),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                if let Some(constraint) = db_err.constraint() {
                    if constraint.starts_with("uq_") {
                        return StoreError::Duplicate(constraint.to_string());
                    }
                }
            }
        }
        StoreError::Database(err)
    }
}
