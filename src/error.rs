use thiserror::Error;

use crate::{network::JoinError, parser::ParseError, time_service::FetchError};

/// Why a synchronisation attempt failed. The message is short enough for one display line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("{0}")]
    Join(#[from] JoinError),
    #[error("{0}")]
    Fetch(#[from] FetchError),
    #[error("{0}")]
    Parse(#[from] ParseError),
}

pub type SyncResult<T> = Result<T, SyncError>;
