//! Pure state transition function
//!
//! Every user action replaces the snapshot and publishes it. Rate lookups are
//! fingerprinted by a generation counter: timer and fetch completions that do
//! not carry the generation of the current phase are dropped without touching
//! the state.

use super::state::{ConversionRequest, ControllerContext, ControllerState, ErrorPanel, FetchPhase, Slot};
use super::{Action, Effect, Event};
use crate::rates::{FetchError, RateQuote};
use crate::validation::{check_syntax, full_validation, parse_amount};
use rust_decimal::Decimal;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ControllerState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ControllerState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Pure transition function.
///
/// Given the same inputs it always produces the same outputs, with no I/O.
pub fn transition(
    state: &ControllerState,
    context: &ControllerContext,
    event: Event,
) -> TransitionResult {
    match event {
        Event::Action(action) => apply_action(state, context, action),
        Event::DebounceElapsed { generation } => debounce_elapsed(state, generation),
        Event::FetchSettled {
            generation,
            outcome,
        } => fetch_settled(state, generation, outcome),
    }
}

fn apply_action(
    state: &ControllerState,
    context: &ControllerContext,
    action: Action,
) -> TransitionResult {
    let mut next = state.clone();

    let effects = match action {
        Action::AmountEdited {
            slot: Slot::Sending,
            text,
        } => {
            next.snapshot.sending_amount_text = text;
            next.snapshot.error_panel = None;
            drive_from_sending(&mut next, context)
        }

        Action::AmountEdited {
            slot: Slot::Receiving,
            text,
        } => {
            next.snapshot.receiving_amount_text = text;
            drive_from_receiving(&mut next, context)
        }

        Action::CurrencySelected { slot, currency } => {
            *next.snapshot.currency_mut(slot) = currency;
            next.snapshot.picker_open = None;
            redrive(&mut next, context)
        }

        Action::SwapRequested => {
            let snapshot = &mut next.snapshot;
            std::mem::swap(&mut snapshot.sending_currency, &mut snapshot.receiving_currency);
            std::mem::swap(
                &mut snapshot.sending_amount_text,
                &mut snapshot.receiving_amount_text,
            );
            redrive(&mut next, context)
        }

        // Pure UI toggles: in-flight work is left alone
        Action::CurrencyPickerOpened { slot } => {
            next.snapshot.picker_open = Some(super::state::PickerState { for_slot: slot });
            vec![]
        }

        Action::CurrencyPickerClosed => {
            next.snapshot.picker_open = None;
            vec![]
        }

        Action::ErrorPanelDismissed => {
            if let Some(panel) = next.snapshot.error_panel.as_mut() {
                panel.visible = false;
            }
            vec![]
        }
    };

    TransitionResult::new(next)
        .with_effects(effects)
        .with_effect(Effect::Publish)
}

/// Recompute everything from the sending side after a currency change
fn redrive(next: &mut ControllerState, context: &ControllerContext) -> Vec<Effect> {
    next.snapshot.clear_ratio();
    next.snapshot.error_panel = None;
    drive_from_sending(next, context)
}

fn drive_from_sending(next: &mut ControllerState, context: &ControllerContext) -> Vec<Effect> {
    let text = next.snapshot.amount_text(Slot::Sending).to_string();
    if text.is_empty() {
        next.snapshot.receiving_amount_text.clear();
        next.snapshot.limit_message = None;
        return cancel_pending(next);
    }

    let outcome = full_validation(&text, &next.snapshot.sending_currency);
    next.snapshot.limit_message = outcome.message().map(str::to_string);

    match parse_amount(&text) {
        Some(amount) if outcome.allows_fetch() => schedule(next, context, Slot::Sending, amount),
        _ => {
            next.snapshot.clear_ratio();
            cancel_pending(next)
        }
    }
}

fn drive_from_receiving(next: &mut ControllerState, context: &ControllerContext) -> Vec<Effect> {
    let text = next.snapshot.amount_text(Slot::Receiving).to_string();
    if text.is_empty() {
        next.snapshot.sending_amount_text.clear();
        next.snapshot.limit_message = None;
        return cancel_pending(next);
    }

    // The limit binds the sending side only; it is checked when this settles
    match parse_amount(&text) {
        Some(amount) if check_syntax(&text).is_valid() => {
            schedule(next, context, Slot::Receiving, amount)
        }
        _ => cancel_pending(next),
    }
}

/// Start a new generation converting `amount` out of `source` into the other slot
fn schedule(
    next: &mut ControllerState,
    context: &ControllerContext,
    source: Slot,
    amount: Decimal,
) -> Vec<Effect> {
    next.generation += 1;
    let request = ConversionRequest {
        from: next.snapshot.currency(source).clone(),
        to: next.snapshot.currency(source.other()).clone(),
        amount,
        target_slot: source.other(),
        generation: next.generation,
    };
    next.phase = FetchPhase::Debouncing {
        request: request.clone(),
    };
    vec![Effect::schedule_fetch(request, context.debounce)]
}

fn cancel_pending(next: &mut ControllerState) -> Vec<Effect> {
    if next.phase.is_idle() {
        vec![]
    } else {
        next.phase = FetchPhase::Idle;
        vec![Effect::CancelFetch]
    }
}

fn debounce_elapsed(state: &ControllerState, generation: u64) -> TransitionResult {
    match &state.phase {
        FetchPhase::Debouncing { request } if request.generation == generation => {
            let mut next = state.clone();
            next.phase = FetchPhase::Fetching {
                request: request.clone(),
            };
            TransitionResult::new(next).with_effect(Effect::RequestRate {
                request: request.clone(),
            })
        }
        // Superseded or cancelled
        _ => TransitionResult::new(state.clone()),
    }
}

fn fetch_settled(
    state: &ControllerState,
    generation: u64,
    outcome: Result<RateQuote, FetchError>,
) -> TransitionResult {
    let request = match &state.phase {
        FetchPhase::Fetching { request } if request.generation == generation => request.clone(),
        // Last request wins, not last response
        _ => return TransitionResult::new(state.clone()),
    };

    let mut next = state.clone();
    next.phase = FetchPhase::Idle;
    let snapshot = &mut next.snapshot;

    match outcome {
        Ok(quote) => {
            *snapshot.amount_text_mut(request.target_slot) =
                quote.converted_amount.normalize().to_string();
            snapshot.exchange_ratio = Some(quote.rate);
            snapshot.ratio_label = Some(ratio_label(&request, quote.rate));
            snapshot.error_panel = None;
            // Covers the computed amount when the sending side was the target
            snapshot.limit_message =
                full_validation(&snapshot.sending_amount_text, &snapshot.sending_currency)
                    .message()
                    .map(str::to_string);
        }
        Err(error) => {
            snapshot.clear_ratio();
            snapshot.error_panel = Some(ErrorPanel {
                kind: error.kind.into(),
                visible: true,
            });
        }
    }

    TransitionResult::new(next).with_effect(Effect::Publish)
}

fn ratio_label(request: &ConversionRequest, rate: Decimal) -> String {
    format!(
        "1 {} = {:.2} {}",
        request.from.code,
        rate.round_dp(2),
        request.to.code
    )
}
