use thiserror::Error;

#[derive(Error, Debug)]
pub enum PetError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Session '{session_id}' not found")]
    SessionNotFound { session_id: String },
}

pub type PetResult<T> = Result<T, PetError>;
