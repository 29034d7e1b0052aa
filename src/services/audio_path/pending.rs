use tokio::sync::oneshot;
use tracing::debug;

use super::{AudioPathError, PathGrant, RequestData};

/// Reply channel for a source request.
pub type GrantReply = oneshot::Sender<Result<PathGrant, AudioPathError>>;

/// A caller waiting for the pending activation to resolve.
#[derive(Debug)]
pub struct PendingCaller {
    reply: GrantReply,
    request_data: RequestData,
}

impl PendingCaller {
    /// Bundle a reply channel with the request data the caller sent.
    pub fn new(reply: GrantReply, request_data: RequestData) -> Self {
        Self {
            reply,
            request_data,
        }
    }
}

/// Callers queued on the single pending activation, in arrival order.
#[derive(Debug, Default)]
pub struct PendingCallers {
    callers: Vec<PendingCaller>,
}

impl PendingCallers {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a caller.
    pub fn push(&mut self, caller: PendingCaller) {
        self.callers.push(caller);
    }

    /// Number of queued callers.
    pub fn len(&self) -> usize {
        self.callers.len()
    }

    /// Whether nobody is waiting.
    pub fn is_empty(&self) -> bool {
        self.callers.is_empty()
    }

    /// Reply to every queued caller in order and empty the queue.
    ///
    /// `outcome` is evaluated once per caller so that each one receives its
    /// own copy of the same result. Callers that went away in the meantime
    /// are skipped. Returns the number of callers that were queued.
    pub fn complete_all<F>(&mut self, outcome: F) -> usize
    where
        F: Fn() -> Result<PathGrant, AudioPathError>,
    {
        let count = self.callers.len();

        for caller in self.callers.drain(..) {
            if caller.reply.send(outcome()).is_err() {
                debug!(request_data = ?caller.request_data, "Pending caller gone before reply");
            }
        }

        count
    }

    /// Fail every queued caller because a newer request replaced theirs.
    pub fn supersede_all(&mut self) -> usize {
        self.complete_all(|| Err(AudioPathError::Superseded))
    }
}
