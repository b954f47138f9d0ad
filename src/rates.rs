//! Exchange rate source
//!
//! The controller's only I/O boundary. Implementations must be cancellable
//! (dropping the future abandons the call) and must not retry internally.

mod error;
mod transfergo;

pub use error::{FetchError, FetchErrorKind};
pub use transfergo::TransferGoFetcher;

use crate::catalog::Currency;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://my.transfergo.com/api/";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Successful rate lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateQuote {
    pub rate: Decimal,
    pub converted_amount: Decimal,
}

/// Common interface for rate sources
#[async_trait]
pub trait RateFetcher: Send + Sync {
    /// Convert `amount` of `from` into `to`
    async fn fetch(
        &self,
        from: &Currency,
        to: &Currency,
        amount: Decimal,
    ) -> Result<RateQuote, FetchError>;
}

#[async_trait]
impl<T: RateFetcher + ?Sized> RateFetcher for Arc<T> {
    async fn fetch(
        &self,
        from: &Currency,
        to: &Currency,
        amount: Decimal,
    ) -> Result<RateQuote, FetchError> {
        (**self).fetch(from, to, amount).await
    }
}

/// Rate source configuration, read from the environment
#[derive(Debug, Clone)]
pub struct RatesConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl RatesConfig {
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("FX_RATES_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let timeout_secs = std::env::var("FX_RATES_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Logging wrapper for rate sources
pub struct LoggingFetcher {
    inner: Arc<dyn RateFetcher>,
}

impl LoggingFetcher {
    pub fn new(inner: Arc<dyn RateFetcher>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl RateFetcher for LoggingFetcher {
    async fn fetch(
        &self,
        from: &Currency,
        to: &Currency,
        amount: Decimal,
    ) -> Result<RateQuote, FetchError> {
        let start = std::time::Instant::now();
        let result = self.inner.fetch(from, to, amount).await;
        let duration = start.elapsed();

        match &result {
            Ok(quote) => {
                tracing::info!(
                    from = %from.code,
                    to = %to.code,
                    %amount,
                    rate = %quote.rate,
                    duration_ms = duration.as_millis(),
                    "Rate lookup completed"
                );
            }
            Err(e) => {
                tracing::warn!(
                    from = %from.code,
                    to = %to.code,
                    %amount,
                    kind = ?e.kind,
                    error = %e,
                    duration_ms = duration.as_millis(),
                    "Rate lookup failed"
                );
            }
        }

        result
    }
}
