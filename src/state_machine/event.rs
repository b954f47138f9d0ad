//! Inputs to the controller

use super::state::Slot;
use crate::catalog::Currency;
use crate::rates::{FetchError, RateQuote};

/// User-facing actions accepted by the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    AmountEdited { slot: Slot, text: String },
    CurrencySelected { slot: Slot, currency: Currency },
    CurrencyPickerOpened { slot: Slot },
    CurrencyPickerClosed,
    SwapRequested,
    ErrorPanelDismissed,
}

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    Action(Action),

    // Timer events
    DebounceElapsed {
        generation: u64,
    },

    // Rate source events
    FetchSettled {
        generation: u64,
        outcome: Result<RateQuote, FetchError>,
    },
}

impl From<Action> for Event {
    fn from(action: Action) -> Self {
        Event::Action(action)
    }
}
