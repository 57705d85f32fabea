use sr_core::{RouteId, UserId};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackerError {
    #[error("no active route session for user {0}")]
    NoActiveSession(UserId),

    #[error("route {0} is not known to the tracker")]
    UnknownRoute(RouteId),
}

pub type TrackerResult<T> = Result<T, TrackerError>;
