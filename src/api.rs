//! HTTP API for the currency converter
//!
//! One controller per process. Clients post actions and follow the
//! snapshot over SSE.

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;

use crate::catalog::CurrencyCatalog;
use crate::runtime::ConverterHandle;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub controller: ConverterHandle,
    pub catalog: Arc<CurrencyCatalog>,
}

impl AppState {
    pub fn new(controller: ConverterHandle, catalog: Arc<CurrencyCatalog>) -> Self {
        Self {
            controller,
            catalog,
        }
    }
}
