use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Timestamp error: {0}")]
    Timestamp(#[from] chrono::ParseError),

    #[error("Profile '{user_id}' not found")]
    NotFound { user_id: String },

    #[error("Profile '{user_id}' already exists")]
    DuplicateProfile { user_id: String },

    #[error("Invalid profile '{user_id}': {reason}")]
    InvalidProfile { user_id: String, reason: String },

    #[error("Invalid rating: expected 1..=5 stars, got {stars}")]
    InvalidRating { stars: u8 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type MarketResult<T> = Result<T, MarketError>;
