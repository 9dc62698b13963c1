//! Best-effort cancellation for in-flight renders.
//!
//! Every render request takes a token from a shared [`RenderTokens`] counter.
//! Issuing a newer token (or calling [`RenderTokens::cancel`]) makes every
//! older token stale; long-running jobs poll [`RenderToken::is_current`]
//! between tiles and frames and stop once it turns false.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Source of monotonically increasing render tokens.
#[derive(Debug, Clone, Default)]
pub struct RenderTokens {
    latest: Arc<AtomicU64>,
}

impl RenderTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a token for a new render, invalidating all earlier ones.
    pub fn issue(&self) -> RenderToken {
        let id = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        RenderToken {
            id,
            latest: self.latest.clone(),
        }
    }

    /// Invalidate every outstanding token without starting a new render.
    pub fn cancel(&self) {
        self.latest.fetch_add(1, Ordering::AcqRel);
    }

    /// Id of the most recent token.
    pub fn current(&self) -> u64 {
        self.latest.load(Ordering::Acquire)
    }
}

/// Identifies one render request.
#[derive(Debug, Clone)]
pub struct RenderToken {
    id: u64,
    latest: Arc<AtomicU64>,
}

impl RenderToken {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// `false` once a newer token has been issued or the job was cancelled.
    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::Acquire) == self.id
    }
}
