//! Controller state types

use crate::catalog::{Currency, CurrencyCatalog, DEFAULT_SENDING_AMOUNT};
use crate::rates::FetchErrorKind;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Quiet period after the last edit before a rate lookup starts
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// One of the two amount/currency pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Sending,
    Receiving,
}

impl Slot {
    pub fn other(self) -> Self {
        match self {
            Slot::Sending => Slot::Receiving,
            Slot::Receiving => Slot::Sending,
        }
    }
}

/// Classified fetch failure shown in the error panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NetworkFailure,
    ServerFailure,
    UnexpectedFailure,
}

impl ErrorKind {
    pub fn title(self) -> &'static str {
        match self {
            ErrorKind::NetworkFailure => "No Network",
            ErrorKind::ServerFailure => "Server error",
            ErrorKind::UnexpectedFailure => "Unexpected error",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ErrorKind::NetworkFailure => "Check your internet connection",
            ErrorKind::ServerFailure => "The exchange service rejected the request",
            ErrorKind::UnexpectedFailure => "Please try again later",
        }
    }
}

impl From<FetchErrorKind> for ErrorKind {
    fn from(kind: FetchErrorKind) -> Self {
        match kind {
            FetchErrorKind::Network => ErrorKind::NetworkFailure,
            FetchErrorKind::Server => ErrorKind::ServerFailure,
            FetchErrorKind::Unexpected => ErrorKind::UnexpectedFailure,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ErrorPanel {
    pub kind: ErrorKind,
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PickerState {
    pub for_slot: Slot,
}

/// Published snapshot. Replaced wholesale on every processed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionState {
    pub available_currencies: Vec<Currency>,
    pub sending_currency: Currency,
    pub sending_amount_text: String,
    pub receiving_currency: Currency,
    pub receiving_amount_text: String,
    pub exchange_ratio: Option<Decimal>,
    /// Human-readable form of `exchange_ratio`, e.g. `1 PLN = 11.52 UAH`
    pub ratio_label: Option<String>,
    pub limit_message: Option<String>,
    pub error_panel: Option<ErrorPanel>,
    pub picker_open: Option<PickerState>,
}

impl ConversionState {
    pub fn initial(catalog: &CurrencyCatalog) -> Self {
        Self {
            available_currencies: catalog.list_supported().to_vec(),
            sending_currency: catalog.default_from().clone(),
            sending_amount_text: DEFAULT_SENDING_AMOUNT.to_string(),
            receiving_currency: catalog.default_to().clone(),
            receiving_amount_text: String::new(),
            exchange_ratio: None,
            ratio_label: None,
            limit_message: None,
            error_panel: None,
            picker_open: None,
        }
    }

    pub fn currency(&self, slot: Slot) -> &Currency {
        match slot {
            Slot::Sending => &self.sending_currency,
            Slot::Receiving => &self.receiving_currency,
        }
    }

    pub fn currency_mut(&mut self, slot: Slot) -> &mut Currency {
        match slot {
            Slot::Sending => &mut self.sending_currency,
            Slot::Receiving => &mut self.receiving_currency,
        }
    }

    pub fn amount_text(&self, slot: Slot) -> &str {
        match slot {
            Slot::Sending => &self.sending_amount_text,
            Slot::Receiving => &self.receiving_amount_text,
        }
    }

    pub fn amount_text_mut(&mut self, slot: Slot) -> &mut String {
        match slot {
            Slot::Sending => &mut self.sending_amount_text,
            Slot::Receiving => &mut self.receiving_amount_text,
        }
    }

    pub fn clear_ratio(&mut self) {
        self.exchange_ratio = None;
        self.ratio_label = None;
    }
}

/// A rate lookup the controller decided to make.
///
/// `generation` fingerprints the request; results carrying any other
/// generation are discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub from: Currency,
    pub to: Currency,
    pub amount: Decimal,
    pub target_slot: Slot,
    pub generation: u64,
}

/// Progress of the single authoritative rate lookup
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FetchPhase {
    #[default]
    Idle,
    /// Timer armed, no network call yet
    Debouncing { request: ConversionRequest },
    /// Network call in flight
    Fetching { request: ConversionRequest },
}

impl FetchPhase {
    pub fn request(&self) -> Option<&ConversionRequest> {
        match self {
            FetchPhase::Idle => None,
            FetchPhase::Debouncing { request } | FetchPhase::Fetching { request } => Some(request),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, FetchPhase::Idle)
    }
}

/// Everything the transition function reads and replaces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerState {
    pub snapshot: ConversionState,
    pub phase: FetchPhase,
    /// Generation of the most recently scheduled request
    pub generation: u64,
}

impl ControllerState {
    pub fn new(catalog: &CurrencyCatalog) -> Self {
        Self {
            snapshot: ConversionState::initial(catalog),
            phase: FetchPhase::Idle,
            generation: 0,
        }
    }
}

/// Fixed parameters of a controller
#[derive(Debug, Clone)]
pub struct ControllerContext {
    pub debounce: Duration,
}

impl ControllerContext {
    pub fn new(debounce: Duration) -> Self {
        Self { debounce }
    }
}

impl Default for ControllerContext {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}
