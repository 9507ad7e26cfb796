//! Panic containment around user-supplied thunks.

use std::panic::{self, AssertUnwindSafe};

use crate::error::{BoxError, ConstructorPanic};

/// Runs `f`, turning a panic into a [`ConstructorPanic`] error.
pub(crate) fn catch_panics<R, F>(f: F) -> Result<R, BoxError>
where
    F: FnOnce() -> Result<R, BoxError>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = if let Some(s) = payload.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic payload".to_string()
            };
            Err(Box::new(ConstructorPanic(message)))
        }
    }
}
