//! Bookkeeping for the one chat request that may be in flight.
//!
//! Every request gets a generation number and a cancellation token. Starting
//! a request or cancelling the current one retires the previous generation,
//! so a late completion can tell that it no longer owns the busy flag.

use lyria_types::chat::{ConversationId, RequestStatus};
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug)]
struct InFlight {
    generation: u64,
    sent_from: Option<ConversationId>,
    token: CancellationToken,
}

#[derive(Debug, Default)]
pub struct RequestTracker {
    next_generation: u64,
    in_flight: Option<InFlight>,
    last_status: Option<RequestStatus>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request from `sent_from`, cancelling any pending one first.
    pub fn begin(&mut self, sent_from: Option<ConversationId>) -> (u64, CancellationToken) {
        self.cancel_pending();
        self.next_generation += 1;
        let token = CancellationToken::new();
        self.in_flight = Some(InFlight {
            generation: self.next_generation,
            sent_from,
            token: token.clone(),
        });
        (self.next_generation, token)
    }

    /// Cancel the pending request, if any. Returns true if one was cancelled.
    pub fn cancel_pending(&mut self) -> bool {
        match self.in_flight.take() {
            Some(request) => {
                request.token.cancel();
                self.last_status = Some(RequestStatus::Cancelled);
                debug!(
                    generation = request.generation,
                    sent_from = ?request.sent_from,
                    "cancelled pending request"
                );
                true
            }
            None => false,
        }
    }

    /// Record the terminal status of `generation`. A retired generation
    /// changes nothing and returns false.
    pub fn finish(&mut self, generation: u64, status: RequestStatus) -> bool {
        debug_assert!(status.is_terminal());
        if !self.is_current(generation) {
            return false;
        }
        self.in_flight = None;
        self.last_status = Some(status);
        true
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|r| r.generation == generation)
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    /// `Pending` while a request is in flight, otherwise `Idle`.
    pub fn status(&self) -> RequestStatus {
        if self.is_pending() {
            RequestStatus::Pending
        } else {
            RequestStatus::Idle
        }
    }

    /// How the most recent request ended.
    pub fn last_status(&self) -> Option<RequestStatus> {
        self.last_status
    }
}
