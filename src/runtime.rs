//! Runtime for driving a conversion controller
//!
//! One controller owns one snapshot. Actions arrive through a
//! [`ConverterHandle`] and are processed strictly in order by a single task;
//! timer and fetch completions are fed back through the same task.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::ConverterRuntime;

use crate::catalog::CurrencyCatalog;
use crate::rates::RateFetcher;
use crate::state_machine::{Action, ControllerContext, ControllerState, ConversionState};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("conversion controller has stopped")]
    Stopped,
}

/// Handle to interact with a running controller
#[derive(Clone)]
pub struct ConverterHandle {
    action_tx: mpsc::Sender<Action>,
    snapshot_rx: watch::Receiver<ConversionState>,
    broadcast_tx: broadcast::Sender<ConversionState>,
}

impl ConverterHandle {
    /// Queue an action behind any already waiting
    pub async fn dispatch(&self, action: Action) -> Result<(), ControllerError> {
        self.action_tx
            .send(action)
            .await
            .map_err(|_| ControllerError::Stopped)
    }

    /// Latest published snapshot
    pub fn current(&self) -> ConversionState {
        self.snapshot_rx.borrow().clone()
    }

    /// Stream of every snapshot published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ConversionState> {
        self.broadcast_tx.subscribe()
    }

    /// Latest-value view of the snapshot
    pub fn watch(&self) -> watch::Receiver<ConversionState> {
        self.snapshot_rx.clone()
    }
}

/// Start a controller task and return its handle.
///
/// The task runs until every handle has been dropped.
pub fn spawn_converter<F>(
    context: ControllerContext,
    catalog: &CurrencyCatalog,
    fetcher: F,
) -> ConverterHandle
where
    F: RateFetcher + 'static,
{
    let state = ControllerState::new(catalog);
    let (action_tx, action_rx) = mpsc::channel(64);
    let (snapshot_tx, snapshot_rx) = watch::channel(state.snapshot.clone());
    let (broadcast_tx, _) = broadcast::channel(128);

    let runtime = ConverterRuntime::new(
        context,
        state,
        fetcher,
        action_rx,
        snapshot_tx,
        broadcast_tx.clone(),
    );

    tokio::spawn(async move {
        runtime.run().await;
        tracing::info!("Conversion runtime finished");
    });

    ConverterHandle {
        action_tx,
        snapshot_rx,
        broadcast_tx,
    }
}
