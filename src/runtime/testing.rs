//! Mock implementations for testing
//!
//! These mocks drive the runtime without real I/O. Combine them with
//! `#[tokio::test(start_paused = true)]` so debounce timers run on virtual time.

use super::{spawn_converter, ConverterHandle};
use crate::catalog::{Currency, CurrencyCatalog};
use crate::rates::{FetchError, RateFetcher, RateQuote};
use crate::state_machine::{Action, ControllerContext, ConversionState, Slot};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

// ============================================================================
// Mock Rate Fetcher
// ============================================================================

/// One recorded call to a mock fetcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCall {
    pub from: String,
    pub to: String,
    pub amount: Decimal,
}

/// Mock fetcher answering from a fixed rate table
pub struct MockRateFetcher {
    rates: HashMap<(String, String), Decimal>,
    errors: Mutex<VecDeque<FetchError>>,
    /// Record of all calls made
    pub calls: Mutex<Vec<FetchCall>>,
}

impl MockRateFetcher {
    pub fn new() -> Self {
        Self {
            rates: HashMap::new(),
            errors: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answer `from -> to` with `rate`
    pub fn with_rate(mut self, from: &str, to: &str, rate: Decimal) -> Self {
        self.rates.insert((from.to_string(), to.to_string()), rate);
        self
    }

    /// Fail the next call with `error`, ahead of any rate lookup
    pub fn queue_error(&self, error: FetchError) {
        self.errors.lock().unwrap().push_back(error);
    }

    /// Get recorded calls
    pub fn recorded_calls(&self) -> Vec<FetchCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, from: &Currency, to: &Currency, amount: Decimal) {
        self.calls.lock().unwrap().push(FetchCall {
            from: from.code.clone(),
            to: to.code.clone(),
            amount,
        });
    }

    fn answer(&self, from: &Currency, to: &Currency, amount: Decimal) -> Result<RateQuote, FetchError> {
        if let Some(error) = self.errors.lock().unwrap().pop_front() {
            return Err(error);
        }
        self.rates
            .get(&(from.code.clone(), to.code.clone()))
            .map(|rate| RateQuote {
                rate: *rate,
                converted_amount: amount * rate,
            })
            .ok_or_else(|| {
                FetchError::unexpected(format!("No mock rate for {} -> {}", from.code, to.code))
            })
    }
}

impl Default for MockRateFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateFetcher for MockRateFetcher {
    async fn fetch(
        &self,
        from: &Currency,
        to: &Currency,
        amount: Decimal,
    ) -> Result<RateQuote, FetchError> {
        self.record(from, to, amount);
        self.answer(from, to, amount)
    }
}

// ============================================================================
// Delayed Mock Rate Fetcher (for staleness testing)
// ============================================================================

/// Mock fetcher whose calls take a scripted amount of time
pub struct DelayedMockRateFetcher {
    inner: MockRateFetcher,
    delays: Mutex<VecDeque<Duration>>,
    default_delay: Duration,
}

impl DelayedMockRateFetcher {
    pub fn new(inner: MockRateFetcher, default_delay: Duration) -> Self {
        Self {
            inner,
            delays: Mutex::new(VecDeque::new()),
            default_delay,
        }
    }

    /// Delay for the next call; later calls fall back to the default
    pub fn queue_delay(&self, delay: Duration) {
        self.delays.lock().unwrap().push_back(delay);
    }

    pub fn recorded_calls(&self) -> Vec<FetchCall> {
        self.inner.recorded_calls()
    }
}

#[async_trait]
impl RateFetcher for DelayedMockRateFetcher {
    async fn fetch(
        &self,
        from: &Currency,
        to: &Currency,
        amount: Decimal,
    ) -> Result<RateQuote, FetchError> {
        self.inner.record(from, to, amount);
        let delay = self
            .delays
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.default_delay);
        tokio::time::sleep(delay).await;
        self.inner.answer(from, to, amount)
    }
}

// ============================================================================
// Test Runtime Builder
// ============================================================================

/// Helper for building test runtimes with minimal boilerplate
pub struct TestRuntime<F: RateFetcher + 'static> {
    pub handle: ConverterHandle,
    pub snapshots: watch::Receiver<ConversionState>,
    pub fetcher: Arc<F>,
    pub catalog: CurrencyCatalog,
}

impl TestRuntime<MockRateFetcher> {
    /// Create a simple test runtime with an instant mock fetcher
    pub fn new() -> TestRuntimeBuilder<MockRateFetcher> {
        TestRuntimeBuilder::new()
    }
}

pub struct TestRuntimeBuilder<F> {
    fetcher: F,
    catalog: CurrencyCatalog,
    debounce: Duration,
}

impl<F: RateFetcher + 'static> TestRuntimeBuilder<F> {
    pub fn fetcher<G: RateFetcher + 'static>(self, fetcher: G) -> TestRuntimeBuilder<G> {
        TestRuntimeBuilder {
            fetcher,
            catalog: self.catalog,
            debounce: self.debounce,
        }
    }

    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn build(self) -> TestRuntime<F> {
        let fetcher = Arc::new(self.fetcher);
        let handle = spawn_converter(
            ControllerContext::new(self.debounce),
            &self.catalog,
            fetcher.clone(),
        );

        TestRuntime {
            snapshots: handle.watch(),
            handle,
            fetcher,
            catalog: self.catalog,
        }
    }
}

impl TestRuntimeBuilder<MockRateFetcher> {
    pub fn new() -> Self {
        Self {
            fetcher: MockRateFetcher::new(),
            catalog: CurrencyCatalog::default(),
            debounce: crate::state_machine::state::DEFAULT_DEBOUNCE,
        }
    }
}

impl Default for TestRuntimeBuilder<MockRateFetcher> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: RateFetcher + 'static> TestRuntime<F> {
    pub async fn send(&self, action: Action) {
        self.handle
            .dispatch(action)
            .await
            .expect("Failed to dispatch action");
    }

    pub async fn edit(&self, slot: Slot, text: &str) {
        self.send(Action::AmountEdited {
            slot,
            text: text.to_string(),
        })
        .await;
    }

    pub async fn select(&self, slot: Slot, code: &str) {
        let currency = self
            .catalog
            .by_code(code)
            .expect("Unknown currency in test")
            .clone();
        self.send(Action::CurrencySelected { slot, currency }).await;
    }

    /// Wait until a published snapshot satisfies `predicate`
    pub async fn wait_for(
        &mut self,
        predicate: impl Fn(&ConversionState) -> bool,
        timeout: Duration,
    ) -> Option<ConversionState> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let current = self.snapshots.borrow_and_update().clone();
            if predicate(&current) {
                return Some(current);
            }
            match tokio::time::timeout_at(deadline, self.snapshots.changed()).await {
                Ok(Ok(())) => continue,
                _ => return None,
            }
        }
    }

    pub fn snapshot(&self) -> ConversionState {
        self.handle.current()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::FetchErrorKind;
    use crate::state_machine::state::{ErrorKind, ErrorPanel};
    use rust_decimal_macros::dec;

    const WAIT: Duration = Duration::from_secs(5);

    fn pln_uah() -> MockRateFetcher {
        MockRateFetcher::new()
            .with_rate("PLN", "UAH", dec!(11.52))
            .with_rate("UAH", "PLN", dec!(0.0868))
    }

    #[tokio::test]
    async fn test_mock_rate_fetcher() {
        let catalog = CurrencyCatalog::default();
        let pln = catalog.by_code("PLN").unwrap();
        let uah = catalog.by_code("UAH").unwrap();
        let mock = pln_uah();

        let quote = mock.fetch(pln, uah, dec!(300)).await.unwrap();
        assert_eq!(quote.rate, dec!(11.52));
        assert_eq!(quote.converted_amount, dec!(3456));

        mock.queue_error(FetchError::network("offline"));
        let err = mock.fetch(pln, uah, dec!(1)).await.unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Network);

        let eur = catalog.by_code("EUR").unwrap();
        let err = mock.fetch(pln, eur, dec!(1)).await.unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Unexpected);

        assert_eq!(mock.recorded_calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_snapshot_published() {
        let rt = TestRuntime::new().fetcher(pln_uah()).build();
        let snapshot = rt.snapshot();
        assert_eq!(snapshot.sending_amount_text, "300");
        assert_eq!(snapshot.sending_currency.code, "PLN");
        assert_eq!(snapshot.receiving_currency.code, "UAH");

        // Nothing is fetched until the user acts
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rt.fetcher.recorded_calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scenario_a_through_runtime() {
        let mut rt = TestRuntime::new().fetcher(pln_uah()).build();

        rt.edit(Slot::Sending, "300").await;
        let snapshot = rt
            .wait_for(|s| s.exchange_ratio.is_some(), WAIT)
            .await
            .expect("conversion should settle");

        assert_eq!(snapshot.exchange_ratio, Some(dec!(11.52)));
        assert_eq!(snapshot.receiving_amount_text, "3456");
        assert_eq!(snapshot.limit_message, None);
        assert_eq!(snapshot.ratio_label.as_deref(), Some("1 PLN = 11.52 UAH"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_is_visible_before_debounce() {
        let mut rt = TestRuntime::new().fetcher(pln_uah()).build();

        rt.edit(Slot::Sending, "25000").await;
        let snapshot = rt
            .wait_for(|s| s.sending_amount_text == "25000", Duration::from_millis(10))
            .await
            .expect("edit should publish immediately");
        assert_eq!(
            snapshot.limit_message.as_deref(),
            Some("exceeds limit of 20000 PLN")
        );
        assert!(rt.fetcher.recorded_calls().is_empty());

        // Scenario B: the warning does not block the fetch
        let settled = rt
            .wait_for(|s| s.exchange_ratio.is_some(), WAIT)
            .await
            .expect("conversion should settle");
        assert_eq!(settled.receiving_amount_text, "288000");
        assert_eq!(
            settled.limit_message.as_deref(),
            Some("exceeds limit of 20000 PLN")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_coalesces_typing() {
        let mut rt = TestRuntime::new().fetcher(pln_uah()).build();

        for text in ["1", "10", "100", "1000"] {
            rt.edit(Slot::Sending, text).await;
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        let snapshot = rt
            .wait_for(|s| s.exchange_ratio.is_some(), WAIT)
            .await
            .expect("conversion should settle");
        assert_eq!(snapshot.receiving_amount_text, "11520");

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(
            rt.fetcher.recorded_calls(),
            vec![FetchCall {
                from: "PLN".to_string(),
                to: "UAH".to_string(),
                amount: dec!(1000),
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_fetch_separately() {
        let mut rt = TestRuntime::new().fetcher(pln_uah()).build();

        rt.edit(Slot::Sending, "100").await;
        rt.wait_for(|s| s.receiving_amount_text == "1152", WAIT)
            .await
            .expect("first conversion should settle");

        rt.edit(Slot::Sending, "200").await;
        rt.wait_for(|s| s.receiving_amount_text == "2304", WAIT)
            .await
            .expect("second conversion should settle");

        assert_eq!(rt.fetcher.recorded_calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_response_never_overwrites_newer_request() {
        let fetcher = DelayedMockRateFetcher::new(pln_uah(), Duration::from_millis(10));
        fetcher.queue_delay(Duration::from_secs(2));
        let mut rt = TestRuntime::new().fetcher(fetcher).build();

        // G1 goes in flight and is slow
        rt.edit(Slot::Sending, "100").await;
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(rt.fetcher.recorded_calls().len(), 1);

        // G2 supersedes it and answers quickly
        rt.edit(Slot::Sending, "200").await;
        rt.wait_for(|s| s.receiving_amount_text == "2304", WAIT)
            .await
            .expect("newer request should settle");

        // Well past the moment G1 would have answered
        tokio::time::sleep(Duration::from_secs(5)).await;
        let snapshot = rt.snapshot();
        assert_eq!(snapshot.sending_amount_text, "200");
        assert_eq!(snapshot.receiving_amount_text, "2304");
        assert_eq!(rt.fetcher.recorded_calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_edit_cancels_in_flight_fetch() {
        let fetcher = DelayedMockRateFetcher::new(pln_uah(), Duration::from_secs(1));
        let mut rt = TestRuntime::new().fetcher(fetcher).build();

        rt.edit(Slot::Sending, "100").await;
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(rt.fetcher.recorded_calls().len(), 1);

        // Scenario D
        rt.edit(Slot::Sending, "").await;
        rt.wait_for(|s| s.sending_amount_text.is_empty(), WAIT)
            .await
            .expect("clear should publish");

        tokio::time::sleep(Duration::from_secs(5)).await;
        let snapshot = rt.snapshot();
        assert_eq!(snapshot.receiving_amount_text, "");
        assert_eq!(snapshot.exchange_ratio, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_receiving_edit_cancels_in_flight_fetch() {
        let fetcher = DelayedMockRateFetcher::new(pln_uah(), Duration::from_secs(1));
        let mut rt = TestRuntime::new().fetcher(fetcher).build();

        // Forward fetch targeting the receiving slot goes in flight
        rt.edit(Slot::Sending, "100").await;
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(rt.fetcher.recorded_calls().len(), 1);

        rt.edit(Slot::Receiving, "abc").await;
        rt.wait_for(|s| s.receiving_amount_text == "abc", WAIT)
            .await
            .expect("edit should publish");

        // Well past the moment the forward response would have arrived
        tokio::time::sleep(Duration::from_secs(5)).await;
        let snapshot = rt.snapshot();
        assert_eq!(snapshot.receiving_amount_text, "abc");
        assert_eq!(snapshot.sending_amount_text, "100");
        assert_eq!(snapshot.exchange_ratio, None);
        assert_eq!(rt.fetcher.recorded_calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scenario_c_network_failure() {
        let mut rt = TestRuntime::new().fetcher(pln_uah()).build();

        rt.edit(Slot::Sending, "300").await;
        rt.wait_for(|s| s.receiving_amount_text == "3456", WAIT)
            .await
            .expect("first conversion should settle");

        rt.fetcher.queue_error(FetchError::network("Connection refused"));
        rt.edit(Slot::Sending, "400").await;
        let snapshot = rt
            .wait_for(|s| s.error_panel.is_some(), WAIT)
            .await
            .expect("failure should surface");

        assert_eq!(
            snapshot.error_panel,
            Some(ErrorPanel {
                kind: ErrorKind::NetworkFailure,
                visible: true
            })
        );
        assert_eq!(snapshot.sending_amount_text, "400");
        assert_eq!(snapshot.receiving_amount_text, "3456");
        assert_eq!(snapshot.exchange_ratio, None);

        // Dismissing only hides the panel and never fetches again
        rt.send(Action::ErrorPanelDismissed).await;
        let dismissed = rt
            .wait_for(|s| s.error_panel.is_some_and(|p| !p.visible), WAIT)
            .await
            .expect("dismiss should publish");
        assert_eq!(
            dismissed.error_panel.map(|p| p.kind),
            Some(ErrorKind::NetworkFailure)
        );
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(rt.fetcher.recorded_calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_receiving_edit_fills_sending() {
        let mut rt = TestRuntime::new().fetcher(pln_uah()).build();

        rt.edit(Slot::Receiving, "1000").await;
        let snapshot = rt
            .wait_for(|s| s.exchange_ratio.is_some(), WAIT)
            .await
            .expect("conversion should settle");

        assert_eq!(snapshot.sending_amount_text, "86.8");
        assert_eq!(snapshot.receiving_amount_text, "1000");
        assert_eq!(snapshot.ratio_label.as_deref(), Some("1 UAH = 0.09 PLN"));
        assert_eq!(
            rt.fetcher.recorded_calls()[0],
            FetchCall {
                from: "UAH".to_string(),
                to: "PLN".to_string(),
                amount: dec!(1000),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_currency_change_redrives_forward() {
        let fetcher = pln_uah().with_rate("GBP", "UAH", dec!(52));
        let mut rt = TestRuntime::new().fetcher(fetcher).build();

        rt.send(Action::CurrencyPickerOpened {
            slot: Slot::Sending,
        })
        .await;
        rt.select(Slot::Sending, "GBP").await;

        let snapshot = rt
            .wait_for(|s| s.exchange_ratio.is_some(), WAIT)
            .await
            .expect("conversion should settle");
        assert_eq!(snapshot.sending_currency.code, "GBP");
        assert_eq!(snapshot.picker_open, None);
        assert_eq!(snapshot.receiving_amount_text, "15600");
        assert_eq!(snapshot.limit_message, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_swap_redrives_from_new_sending() {
        let mut rt = TestRuntime::new().fetcher(pln_uah()).build();

        rt.edit(Slot::Sending, "100").await;
        rt.wait_for(|s| s.receiving_amount_text == "1152", WAIT)
            .await
            .expect("conversion should settle");

        rt.send(Action::SwapRequested).await;
        let snapshot = rt
            .wait_for(
                |s| s.sending_currency.code == "UAH" && s.exchange_ratio.is_some(),
                WAIT,
            )
            .await
            .expect("swap should settle");

        assert_eq!(snapshot.receiving_currency.code, "PLN");
        assert_eq!(snapshot.sending_amount_text, "1152");
        assert_eq!(snapshot.receiving_amount_text, "99.9936");
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_interval_is_configurable() {
        let rt = TestRuntime::new()
            .fetcher(pln_uah())
            .debounce(Duration::from_millis(50))
            .build();

        rt.edit(Slot::Sending, "10").await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(rt.fetcher.recorded_calls().is_empty());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(rt.fetcher.recorded_calls().len(), 1);
        assert_eq!(rt.snapshot().receiving_amount_text, "115.2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_every_publish() {
        let rt = TestRuntime::new().fetcher(pln_uah()).build();
        let mut updates = rt.handle.subscribe();

        rt.edit(Slot::Sending, "5").await;
        let first = updates.recv().await.unwrap();
        assert_eq!(first.sending_amount_text, "5");
        assert_eq!(first.exchange_ratio, None);

        let second = updates.recv().await.unwrap();
        assert_eq!(second.receiving_amount_text, "57.6");
    }
}
