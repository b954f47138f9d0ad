//! API request and response types

use crate::catalog::{Currency, CurrencyCatalog};
use crate::state_machine::state::ErrorPanel;
use crate::state_machine::{Action, ConversionState, Slot};
use serde::{Deserialize, Serialize};

/// An action posted by a client. Currencies are referenced by code.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionRequest {
    AmountEdited { slot: Slot, text: String },
    CurrencySelected { slot: Slot, currency: String },
    CurrencyPickerOpened { slot: Slot },
    CurrencyPickerClosed,
    SwapRequested,
    ErrorPanelDismissed,
}

impl ActionRequest {
    /// Resolve currency codes against the catalog
    pub fn into_action(self, catalog: &CurrencyCatalog) -> Result<Action, String> {
        let action = match self {
            ActionRequest::AmountEdited { slot, text } => Action::AmountEdited { slot, text },
            ActionRequest::CurrencySelected { slot, currency } => {
                let currency = catalog
                    .by_code(&currency)
                    .ok_or_else(|| format!("Unknown currency: {currency}"))?
                    .clone();
                Action::CurrencySelected { slot, currency }
            }
            ActionRequest::CurrencyPickerOpened { slot } => Action::CurrencyPickerOpened { slot },
            ActionRequest::CurrencyPickerClosed => Action::CurrencyPickerClosed,
            ActionRequest::SwapRequested => Action::SwapRequested,
            ActionRequest::ErrorPanelDismissed => Action::ErrorPanelDismissed,
        };
        Ok(action)
    }
}

/// Response for an accepted action
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub queued: bool,
}

/// Response with the supported currencies in catalog order
#[derive(Debug, Serialize)]
pub struct CurrenciesResponse {
    pub currencies: Vec<Currency>,
}

/// Error panel text for clients that do not localize
#[derive(Debug, Serialize)]
pub struct ErrorText {
    pub title: &'static str,
    pub message: &'static str,
}

/// Snapshot as sent over HTTP and SSE
#[derive(Debug, Serialize)]
pub struct SnapshotResponse {
    #[serde(flatten)]
    pub state: ConversionState,
    /// Present while the error panel is visible
    pub error_text: Option<ErrorText>,
}

impl From<ConversionState> for SnapshotResponse {
    fn from(state: ConversionState) -> Self {
        let error_text = match state.error_panel {
            Some(ErrorPanel {
                kind,
                visible: true,
            }) => Some(ErrorText {
                title: kind.title(),
                message: kind.message(),
            }),
            _ => None,
        };
        Self { state, error_text }
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
