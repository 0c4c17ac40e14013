use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ElsError {
    #[error("sync not reached within {0} ticks")]
    SyncTimeout(u64),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing step/dir bus")]
    MissingBus,
    #[error("missing lead axis")]
    MissingAxis,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
