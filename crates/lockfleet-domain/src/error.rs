use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Lock not found: {0}")]
    LockNotFound(String),

    #[error("Downlink transport error: {0}")]
    Transport(#[source] anyhow::Error),

    #[error("Geolocation error: {0}")]
    Geolocation(#[source] anyhow::Error),

    #[error("Snapshot error: {0}")]
    Snapshot(#[source] anyhow::Error),
}

pub type DomainResult<T> = Result<T, DomainError>;
