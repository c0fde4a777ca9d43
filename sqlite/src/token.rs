//! Cooperative cancellation.
//!
//! A [`CancellationToken`] is an atomic flag the caller may set from any
//! thread. Cursors check it between rows and long-running loops at
//! reasonable granularity; there is no involuntary interruption, and
//! cancellation implies rollback of the surrounding transaction.

use crate::error::{Error, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken::default()
    }

    /// Requests cancellation; safe from any thread.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        !self.is_cancelled()
    }

    /// Fails with [`Error::Cancelled`] once the token has fired.
    pub fn ensure_active(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_trips_once_cancelled() {
        let token = CancellationToken::new();
        assert!(token.ensure_active().is_ok());
        token.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.ensure_active(), Err(Error::Cancelled)));
    }

    #[test]
    fn clones_share_state() {
        let token = CancellationToken::new();
        let clone = token.clone();
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
