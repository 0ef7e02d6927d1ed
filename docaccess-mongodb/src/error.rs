//! Mapping of driver errors onto [`AccessError`].

use mongodb::error::{Error as MongoError, ErrorKind};

use docaccess_core::error::AccessError;

/// Server error code for an operation that exceeded its `maxTimeMS`.
const MAX_TIME_MS_EXPIRED: i32 = 50;

/// Passes a driver error through, separating out time budget expiry.
pub(crate) fn backend_error(err: MongoError) -> AccessError {
    if is_time_budget_expired(&err) {
        AccessError::Timeout(err.to_string())
    } else {
        AccessError::Backend(err.to_string())
    }
}

pub(crate) fn connection_error(err: MongoError) -> AccessError {
    AccessError::Connection(err.to_string())
}

fn is_time_budget_expired(err: &MongoError) -> bool {
    matches!(err.kind.as_ref(), ErrorKind::Command(command) if command.code == MAX_TIME_MS_EXPIRED)
}
