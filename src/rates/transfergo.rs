//! HTTP rate source backed by the TransferGo `fx-rates` endpoint

use super::{FetchError, RateFetcher, RateQuote, RatesConfig};
use crate::catalog::Currency;
use async_trait::async_trait;
use reqwest::{Client, Url};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Response body of `GET fx-rates`
#[derive(Debug, Deserialize)]
struct FxRateResponse {
    rate: Decimal,
    #[serde(rename = "toAmount")]
    to_amount: Decimal,
}

/// Rate fetcher talking to the remote exchange service
pub struct TransferGoFetcher {
    client: Client,
    endpoint: Url,
}

impl TransferGoFetcher {
    pub fn new(config: &RatesConfig) -> Result<Self, FetchError> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| FetchError::unexpected(format!("Invalid base URL: {e}")))?;
        let endpoint = base
            .join("fx-rates")
            .map_err(|e| FetchError::unexpected(format!("Invalid base URL: {e}")))?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| FetchError::unexpected(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, endpoint })
    }

    /// Anything that went wrong on the wire is a connectivity failure;
    /// builder and decode errors are not.
    fn classify_transport(error: &reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::network(format!("Request timeout: {error}"))
        } else if error.is_connect() {
            FetchError::network(format!("Connection failed: {error}"))
        } else if error.is_builder() || error.is_decode() {
            FetchError::unexpected(format!("Request failed: {error}"))
        } else if error.is_request() || error.is_body() || has_io_source(error) {
            FetchError::network(format!("Connection lost: {error}"))
        } else {
            FetchError::unexpected(format!("Request failed: {error}"))
        }
    }

    fn classify_status(status: reqwest::StatusCode, body: &str) -> FetchError {
        if status.is_client_error() || status.is_server_error() {
            FetchError::server(format!("Server error: {status}: {body}"))
        } else {
            FetchError::unexpected(format!("HTTP {status}: {body}"))
        }
    }
}

fn has_io_source(error: &(dyn std::error::Error + 'static)) -> bool {
    let mut source = error.source();
    while let Some(cause) = source {
        if cause.is::<std::io::Error>() {
            return true;
        }
        source = cause.source();
    }
    false
}

#[async_trait]
impl RateFetcher for TransferGoFetcher {
    async fn fetch(
        &self,
        from: &Currency,
        to: &Currency,
        amount: Decimal,
    ) -> Result<RateQuote, FetchError> {
        let amount_param = amount.to_string();
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[
                ("from", from.code.as_str()),
                ("to", to.code.as_str()),
                ("amount", amount_param.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Self::classify_transport(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(Self::classify_status(status, &body));
        }

        let parsed: FxRateResponse = serde_json::from_str(&body).map_err(|e| {
            FetchError::unexpected(format!("Failed to parse response: {e} - body: {body}"))
        })?;

        Ok(RateQuote {
            rate: parsed.rate,
            converted_amount: parsed.to_amount,
        })
    }
}
