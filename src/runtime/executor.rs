//! Conversion runtime executor

use crate::rates::RateFetcher;
use crate::state_machine::state::ConversionRequest;
use crate::state_machine::{
    transition, Action, ControllerContext, ControllerState, ConversionState, Effect, Event,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Single-writer runtime around the pure transition function
pub struct ConverterRuntime<F>
where
    F: RateFetcher + 'static,
{
    context: ControllerContext,
    state: ControllerState,
    fetcher: Arc<F>,
    action_rx: mpsc::Receiver<Action>,
    /// Completions from timer and fetch tasks
    event_rx: mpsc::Receiver<Event>,
    event_tx: mpsc::Sender<Event>,
    snapshot_tx: watch::Sender<ConversionState>,
    broadcast_tx: broadcast::Sender<ConversionState>,
    /// Token for the outstanding debounce timer or rate call
    fetch_cancel_token: Option<CancellationToken>,
}

impl<F> ConverterRuntime<F>
where
    F: RateFetcher + 'static,
{
    pub fn new(
        context: ControllerContext,
        state: ControllerState,
        fetcher: F,
        action_rx: mpsc::Receiver<Action>,
        snapshot_tx: watch::Sender<ConversionState>,
        broadcast_tx: broadcast::Sender<ConversionState>,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::channel(32);
        Self {
            context,
            state,
            fetcher: Arc::new(fetcher),
            action_rx,
            event_rx,
            event_tx,
            snapshot_tx,
            broadcast_tx,
            fetch_cancel_token: None,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(
            from = %self.state.snapshot.sending_currency.code,
            to = %self.state.snapshot.receiving_currency.code,
            debounce = ?self.context.debounce,
            "Starting conversion runtime"
        );

        loop {
            tokio::select! {
                action = self.action_rx.recv() => match action {
                    Some(action) => self.process_event(Event::Action(action)),
                    // Every handle is gone
                    None => break,
                },
                Some(event) = self.event_rx.recv() => self.process_event(event),
            }
        }

        self.cancel_outstanding();
        tracing::info!("Conversion runtime stopped");
    }

    fn process_event(&mut self, event: Event) {
        let completion = match &event {
            Event::Action(action) => {
                tracing::debug!(?action, "Processing action");
                None
            }
            Event::DebounceElapsed { generation } => Some(("debounce timer", *generation)),
            Event::FetchSettled { generation, .. } => Some(("rate fetch", *generation)),
        };

        let result = transition(&self.state, &self.context, event);

        if let Some((source, generation)) = completion {
            if result.effects.is_empty() {
                tracing::debug!(
                    generation,
                    pending = ?self.state.phase.request().map(|r| r.generation),
                    "Discarding stale {source}"
                );
            }
        }

        self.state = result.new_state;

        for effect in result.effects {
            self.execute_effect(effect);
        }
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::Publish => {
                let snapshot = self.state.snapshot.clone();
                self.snapshot_tx.send_replace(snapshot.clone());
                // No subscribers is fine
                let _ = self.broadcast_tx.send(snapshot);
            }

            Effect::ScheduleFetch { request, delay } => {
                let cancel_token = self.replace_cancel_token();
                self.spawn_debounce(request.generation, delay, cancel_token);
            }

            Effect::RequestRate { request } => {
                let cancel_token = self.replace_cancel_token();
                self.spawn_fetch(request, cancel_token);
            }

            Effect::CancelFetch => {
                self.cancel_outstanding();
            }
        }
    }

    /// Cancel whatever holds the previous generation and issue a fresh token
    fn replace_cancel_token(&mut self) -> CancellationToken {
        self.cancel_outstanding();
        let token = CancellationToken::new();
        self.fetch_cancel_token = Some(token.clone());
        token
    }

    fn cancel_outstanding(&mut self) {
        if let Some(token) = self.fetch_cancel_token.take() {
            token.cancel();
        }
    }

    fn spawn_debounce(&self, generation: u64, delay: Duration, cancel_token: CancellationToken) {
        let event_tx = self.event_tx.clone();

        tokio::spawn(async move {
            tokio::select! {
                biased;

                () = cancel_token.cancelled() => {
                    tracing::trace!(generation, "Debounce timer cancelled");
                }

                () = tokio::time::sleep(delay) => {
                    let _ = event_tx.send(Event::DebounceElapsed { generation }).await;
                }
            }
        });
    }

    fn spawn_fetch(&self, request: ConversionRequest, cancel_token: CancellationToken) {
        let fetcher = self.fetcher.clone();
        let event_tx = self.event_tx.clone();

        tokio::spawn(async move {
            let generation = request.generation;
            tracing::debug!(
                generation,
                from = %request.from.code,
                to = %request.to.code,
                amount = %request.amount,
                "Requesting rate (background)"
            );

            // Race the call against cancellation; the transport may still finish on its own
            tokio::select! {
                biased;

                () = cancel_token.cancelled() => {
                    tracing::debug!(generation, "Rate request abandoned");
                }

                outcome = fetcher.fetch(&request.from, &request.to, request.amount) => {
                    let _ = event_tx.send(Event::FetchSettled { generation, outcome }).await;
                }
            }
        });
    }
}
