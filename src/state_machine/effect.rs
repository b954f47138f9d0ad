//! Effects produced by state transitions

use super::state::ConversionRequest;
use std::time::Duration;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Push the new snapshot to observers
    Publish,

    /// Cancel any outstanding timer or call, then arm the debounce timer
    ScheduleFetch {
        request: ConversionRequest,
        delay: Duration,
    },

    /// Call the rate source (spawns as background task)
    RequestRate { request: ConversionRequest },

    /// Abandon the outstanding timer or call
    CancelFetch,
}

impl Effect {
    pub fn schedule_fetch(request: ConversionRequest, delay: Duration) -> Self {
        Effect::ScheduleFetch { request, delay }
    }
}
