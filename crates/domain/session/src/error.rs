use pulseiq_identifiers::SessionId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("unknown session: {0}")]
    UnknownSession(SessionId),

    #[error("session already terminated: {0}")]
    Terminated(SessionId),
}

pub type Result<T> = std::result::Result<T, SessionError>;
