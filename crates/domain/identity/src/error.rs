use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity view request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("identity view returned status {0}")]
    Status(u16),

    #[error("no identity for session")]
    NotFound,

    #[error("identity fetch timed out")]
    Timeout,

    #[error("identity view unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, IdentityError>;
