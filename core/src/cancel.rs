//! Cooperative cancellation.
//!
//! A `CancelToken` is shared between the caller and a running call. Setting
//! it never aborts network I/O; the pipeline only looks at it at fixed
//! checkpoints and, once it sees the flag, skips the remaining stages and
//! routes the call to `on_fail`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::PipelineError;

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear the flag so the token can be reused for a new call.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// `Err(Cancelled)` once the token has been cancelled.
    pub(crate) fn checkpoint(&self, tag: &str) -> Result<(), PipelineError> {
        if self.is_cancelled() {
            return Err(PipelineError::Cancelled {
                tag: tag.to_string(),
            });
        }
        Ok(())
    }
}
