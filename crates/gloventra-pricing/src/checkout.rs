//! # Checkout Session
//!
//! Holds one customer's checkout inputs and recomputes totals on demand.
//!
//! ## Inputs and Outputs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  set_cart(lines) ─────────┐                                             │
//! │  set_destination(addr) ───┼──► requote() ──► ShippingQuoteService       │
//! │  refresh_quotes() ────────┘        │                                    │
//! │                                    ▼                                    │
//! │                           options: Vec<ShippingOption>                  │
//! │  select_shipping(id) ────────────► selected                             │
//! │                                                                         │
//! │  calculation() = calculate_checkout(lines, selected, policy,            │
//! │                                     view.currency, view.rates)          │
//! │  display()     = calculation().display(view.rates)                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Quote failures clear the options so totals fall back to the policy's
//! flat fee or free shipping. Quoted options with an unusable rate are
//! dropped; when none remain the quote counts as failed.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use gloventra_core::checkout::{
    calculate_checkout, CheckoutCalculation, CheckoutDisplay, CheckoutPolicy,
};
use gloventra_core::validation::{
    validate_price_cents, validate_quantity, validate_shipping_address, validate_shipping_rate,
};
use gloventra_core::{
    CartLine, CoreError, ShippingAddress, ShippingOption, ShippingRateRequest, ValidationError,
};

use crate::client::ShippingQuoteService;
use crate::context::CurrencyView;
use crate::error::{PricingError, PricingResult};

/// Result of asking carriers for quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteStatus {
    /// The service answered with this many options.
    Quoted(usize),
    /// Destination or cart incomplete; no request was sent.
    Skipped,
    /// The request failed, timed out or returned no usable option;
    /// options were cleared.
    Failed,
}

/// A single checkout in progress.
pub struct CheckoutSession {
    id: Uuid,
    policy: CheckoutPolicy,
    quotes: Arc<dyn ShippingQuoteService>,
    quote_timeout: Duration,
    currency: watch::Receiver<CurrencyView>,
    lines: Vec<CartLine>,
    destination: Option<ShippingAddress>,
    options: Vec<ShippingOption>,
    selected: Option<String>,
}

impl CheckoutSession {
    pub fn new(
        policy: CheckoutPolicy,
        quotes: Arc<dyn ShippingQuoteService>,
        quote_timeout: Duration,
        currency: watch::Receiver<CurrencyView>,
    ) -> Self {
        CheckoutSession {
            id: Uuid::new_v4(),
            policy,
            quotes,
            quote_timeout,
            currency,
            lines: Vec::new(),
            destination: None,
            options: Vec::new(),
            selected: None,
        }
    }

    // =========================================================================
    // Inputs
    // =========================================================================

    /// Replaces the cart and re-quotes shipping for the new weight.
    ///
    /// Rejects out-of-range quantities and prices without changing the
    /// session.
    pub async fn set_cart(&mut self, lines: Vec<CartLine>) -> PricingResult<QuoteStatus> {
        for line in &lines {
            validate_quantity(i64::from(line.quantity))?;
            validate_price_cents(line.price.cents())?;
        }

        debug!(session = %self.id, lines = lines.len(), "Cart updated");
        self.lines = lines;
        Ok(self.requote().await)
    }

    /// Sets the delivery address and re-quotes shipping.
    pub async fn set_destination(&mut self, address: ShippingAddress) -> QuoteStatus {
        self.destination = Some(address);
        self.requote().await
    }

    /// Re-quotes with the current inputs, e.g. after the display currency
    /// changed.
    pub async fn refresh_quotes(&mut self) -> QuoteStatus {
        self.requote().await
    }

    /// Chooses a quoted option by id.
    ///
    /// An unknown id leaves the current selection unchanged.
    pub fn select_shipping(&mut self, id: &str) -> PricingResult<()> {
        if self.options.iter().any(|option| option.id == id) {
            self.selected = Some(id.to_string());
            Ok(())
        } else {
            warn!(
                session = %self.id,
                option = %id,
                "Ignoring selection of unknown shipping option"
            );
            Err(PricingError::Core(CoreError::ShippingOptionNotFound(id.to_string())))
        }
    }

    /// Drops the carrier selection so the policy default applies.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    // =========================================================================
    // Outputs
    // =========================================================================

    /// Identifier carried in this session's log events.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn options(&self) -> &[ShippingOption] {
        &self.options
    }

    pub fn selected(&self) -> Option<&ShippingOption> {
        let id = self.selected.as_deref()?;
        self.options.iter().find(|option| option.id == id)
    }

    /// Every problem with the destination address, in form order.
    pub fn validate_destination(&self) -> Vec<ValidationError> {
        match &self.destination {
            Some(address) => validate_shipping_address(address),
            None => vec![ValidationError::Required {
                field: "shippingAddress".to_string(),
            }],
        }
    }

    /// Totals for the current inputs, recomputed from scratch.
    pub fn calculation(&self) -> CheckoutCalculation {
        let view = self.currency.borrow();
        calculate_checkout(
            &self.lines,
            self.selected(),
            &self.policy,
            &view.currency,
            view.rates.as_deref(),
        )
    }

    /// Totals formatted in the display currency.
    pub fn display(&self) -> CheckoutDisplay {
        let calculation = self.calculation();
        let view = self.currency.borrow();
        calculation.display(view.rates.as_deref())
    }

    // =========================================================================
    // Quoting
    // =========================================================================

    async fn requote(&mut self) -> QuoteStatus {
        let destination = match &self.destination {
            Some(address) if address.is_quotable() && !self.lines.is_empty() => address,
            _ => {
                self.options.clear();
                self.selected = None;
                return QuoteStatus::Skipped;
            }
        };

        let request = ShippingRateRequest::for_cart(destination, &self.lines);
        let currency = self.currency.borrow().currency.clone();

        let result = timeout(self.quote_timeout, self.quotes.quote(&request, &currency))
            .await
            .map_err(|_| PricingError::Timeout(self.quote_timeout))
            .and_then(|quoted| quoted);

        let result = result.and_then(|quoted| {
            let received = quoted.len();
            let usable = self.usable_options(quoted);
            if received > 0 && usable.is_empty() {
                Err(PricingError::InvalidResponse(format!(
                    "none of {received} shipping options had a usable rate"
                )))
            } else {
                Ok(usable)
            }
        });

        match result {
            Ok(options) => {
                info!(
                    session = %self.id,
                    country = %request.destination_country,
                    options = options.len(),
                    "Shipping quoted"
                );
                self.options = options;
                self.reconcile_selection();
                QuoteStatus::Quoted(self.options.len())
            }
            Err(err) => {
                warn!(
                    session = %self.id,
                    error = %err,
                    "Shipping quote failed, using default shipping"
                );
                self.options.clear();
                self.selected = None;
                QuoteStatus::Failed
            }
        }
    }

    /// Drops options whose rate is non-finite, negative or implausibly large.
    fn usable_options(&self, options: Vec<ShippingOption>) -> Vec<ShippingOption> {
        options
            .into_iter()
            .filter(|option| match validate_shipping_rate(option.rate) {
                Ok(()) => true,
                Err(err) => {
                    warn!(
                        session = %self.id,
                        option = %option.id,
                        rate = option.rate,
                        error = %err,
                        "Dropping shipping option with unusable rate"
                    );
                    false
                }
            })
            .collect()
    }

    /// Keeps a selection that is still quoted, otherwise picks the first
    /// option.
    fn reconcile_selection(&mut self) {
        let still_quoted = self
            .selected
            .as_deref()
            .is_some_and(|id| self.options.iter().any(|option| option.id == id));

        if !still_quoted {
            self.selected = self.options.first().map(|option| option.id.clone());
        }
    }
}

impl std::fmt::Debug for CheckoutSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutSession")
            .field("id", &self.id)
            .field("lines", &self.lines.len())
            .field("options", &self.options.len())
            .field("selected", &self.selected)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{init_tracing, option, FakeQuoteService};
    use chrono::Utc;
    use gloventra_core::checkout::ShippingSource;
    use gloventra_core::currency::CurrencyCode;
    use gloventra_core::rates::ExchangeRateSnapshot;
    use gloventra_core::Money;

    fn view(currency: &str, rates: Option<ExchangeRateSnapshot>) -> CurrencyView {
        CurrencyView {
            currency: CurrencyCode::parse(currency).unwrap(),
            source: None,
            rates: rates.map(Arc::new),
            rates_degraded: false,
            is_loading: false,
        }
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Ada Lovelace".into(),
            address_line1: "12 Analytical Way".into(),
            address_line2: None,
            city: "London".into(),
            state: "Greater London".into(),
            postal_code: "N1 9GU".into(),
            country: "GB".into(),
            phone: "+44 20 7946 0000".into(),
        }
    }

    fn small_cart() -> Vec<CartLine> {
        vec![
            CartLine::new("shirt", Money::from_cents(1000), 2),
            CartLine::new("socks", Money::from_cents(500), 1),
        ]
    }

    fn session(
        quotes: Arc<FakeQuoteService>,
        view: CurrencyView,
    ) -> (watch::Sender<CurrencyView>, CheckoutSession) {
        init_tracing();
        let (tx, rx) = watch::channel(view);
        let session = CheckoutSession::new(
            CheckoutPolicy::default(),
            quotes,
            Duration::from_secs(10),
            rx,
        );
        (tx, session)
    }

    #[tokio::test]
    async fn test_totals_without_destination() {
        let quotes = Arc::new(FakeQuoteService::answering(vec![option("dhl", 25.0)]));
        let (_tx, mut checkout) = session(quotes.clone(), view("USD", None));

        let status = checkout.set_cart(small_cart()).await.unwrap();
        assert_eq!(status, QuoteStatus::Skipped);
        assert!(quotes.requests().is_empty());

        let calc = checkout.calculation();
        assert_eq!(calc.subtotal.cents(), 2500);
        assert_eq!(calc.shipping.cents(), 1000);
        assert_eq!(calc.tax.cents(), 250);
        assert_eq!(calc.total.cents(), 3750);
        assert_eq!(calc.shipping_source, ShippingSource::FlatFee);
    }

    #[tokio::test]
    async fn test_destination_quotes_and_selects_first() {
        let quotes = Arc::new(FakeQuoteService::answering(vec![
            option("dhl", 25.0),
            option("aramex", 18.0),
        ]));
        let (_tx, mut checkout) = session(quotes.clone(), view("GBP", None));
        checkout.set_cart(small_cart()).await.unwrap();

        let status = checkout.set_destination(address()).await;
        assert_eq!(status, QuoteStatus::Quoted(2));
        assert_eq!(checkout.selected().map(|o| o.id.as_str()), Some("dhl"));

        let (request, currency) = quotes.requests().pop().unwrap();
        assert_eq!(request.weight, 1.5);
        assert_eq!(currency.as_str(), "GBP");

        checkout.select_shipping("aramex").unwrap();
        let calc = checkout.calculation();
        assert_eq!(calc.shipping.cents(), 1800);
        assert_eq!(calc.shipping_source, ShippingSource::Selected);
        assert_eq!(calc.total.cents(), 2500 + 1800 + 250);
    }

    #[tokio::test]
    async fn test_unknown_selection_is_ignored() {
        let quotes = Arc::new(FakeQuoteService::answering(vec![option("dhl", 25.0)]));
        let (_tx, mut checkout) = session(quotes, view("USD", None));
        checkout.set_cart(small_cart()).await.unwrap();
        checkout.set_destination(address()).await;

        let err = checkout.select_shipping("pigeon").unwrap_err();
        assert!(matches!(
            err,
            PricingError::Core(CoreError::ShippingOptionNotFound(_))
        ));
        assert_eq!(checkout.selected().map(|o| o.id.as_str()), Some("dhl"));
    }

    #[tokio::test]
    async fn test_quote_failure_falls_back_to_policy() {
        let quotes = Arc::new(FakeQuoteService::answering(vec![option("dhl", 25.0)]));
        let (_tx, mut checkout) = session(quotes.clone(), view("USD", None));
        checkout.set_cart(small_cart()).await.unwrap();
        checkout.set_destination(address()).await;
        assert!(checkout.selected().is_some());

        quotes.set_failing(true);
        assert_eq!(checkout.refresh_quotes().await, QuoteStatus::Failed);
        assert!(checkout.options().is_empty());
        assert!(checkout.selected().is_none());

        let calc = checkout.calculation();
        assert_eq!(calc.shipping.cents(), 1000);
        assert_eq!(calc.shipping_source, ShippingSource::FlatFee);
    }

    #[tokio::test]
    async fn test_free_shipping_threshold_is_strict() {
        let quotes = Arc::new(FakeQuoteService::answering(vec![]));
        let (_tx, mut checkout) = session(quotes, view("USD", None));

        checkout
            .set_cart(vec![CartLine::new("coat", Money::from_cents(10_000), 1)])
            .await
            .unwrap();
        assert_eq!(checkout.calculation().shipping.cents(), 1000);

        checkout
            .set_cart(vec![CartLine::new("coat", Money::from_cents(10_001), 1)])
            .await
            .unwrap();
        let calc = checkout.calculation();
        assert!(calc.shipping.is_zero());
        assert_eq!(calc.shipping_source, ShippingSource::FreeOverThreshold);
        assert_eq!(checkout.display().shipping, "Free");
    }

    #[tokio::test]
    async fn test_display_follows_currency_changes() {
        let rates = ExchangeRateSnapshot::new("USD", [("EUR".to_string(), 0.5)], Utc::now());
        let quotes = Arc::new(FakeQuoteService::answering(vec![]));
        let (tx, mut checkout) = session(quotes, view("USD", Some(rates.clone())));
        checkout.set_cart(small_cart()).await.unwrap();

        let display = checkout.display();
        assert_eq!(display.subtotal, "$25.00");
        assert_eq!(display.shipping, "$10.00");
        assert_eq!(display.tax, "$2.50");
        assert_eq!(display.total, "$37.50");

        tx.send_modify(|v| v.currency = CurrencyCode::parse("EUR").unwrap());
        let display = checkout.display();
        assert_eq!(display.total, "€18.75");
        assert_eq!(checkout.calculation().currency.as_str(), "EUR");
        // canonical amounts are unaffected by the display currency
        assert_eq!(checkout.calculation().total.cents(), 3750);
    }

    #[tokio::test]
    async fn test_empty_cart_is_all_zero() {
        let quotes = Arc::new(FakeQuoteService::answering(vec![option("dhl", 25.0)]));
        let (_tx, mut checkout) = session(quotes.clone(), view("USD", None));
        checkout.set_destination(address()).await;

        assert!(quotes.requests().is_empty());
        let calc = checkout.calculation();
        assert!(calc.is_empty());
        assert_eq!(calc.shipping_source, ShippingSource::NotRequired);
    }

    #[tokio::test]
    async fn test_oversized_quantity_rejected() {
        let quotes = Arc::new(FakeQuoteService::answering(vec![]));
        let (_tx, mut checkout) = session(quotes, view("USD", None));
        checkout.set_cart(small_cart()).await.unwrap();

        let result = checkout
            .set_cart(vec![CartLine::new("bulk", Money::from_cents(100), 5000)])
            .await;
        assert!(result.is_err());
        assert_eq!(checkout.lines().len(), 2);
    }

    #[tokio::test]
    async fn test_unusable_quote_rates_are_dropped() {
        let quotes = Arc::new(FakeQuoteService::answering(vec![
            option("bogus", 1e300),
            option("refund", -50.0),
            option("ups", 24.0),
        ]));
        let (_tx, mut checkout) = session(quotes, view("USD", None));
        checkout.set_cart(small_cart()).await.unwrap();

        let status = checkout.set_destination(address()).await;
        assert_eq!(status, QuoteStatus::Quoted(1));
        assert_eq!(checkout.selected().map(|o| o.id.as_str()), Some("ups"));
        assert!(checkout.select_shipping("bogus").is_err());

        let calc = checkout.calculation();
        assert_eq!(calc.shipping.cents(), 2400);
        assert_eq!(calc.total.cents(), 2500 + 2400 + 250);
    }

    #[tokio::test]
    async fn test_all_unusable_quotes_fall_back_to_flat_fee() {
        let quotes = Arc::new(FakeQuoteService::answering(vec![
            option("bogus", 1e300),
            option("refund", -50.0),
            option("nan", f64::NAN),
        ]));
        let (_tx, mut checkout) = session(quotes, view("USD", None));
        checkout.set_cart(small_cart()).await.unwrap();

        assert_eq!(checkout.set_destination(address()).await, QuoteStatus::Failed);
        assert!(checkout.options().is_empty());

        let calc = checkout.calculation();
        assert_eq!(calc.shipping.cents(), 1000);
        assert_eq!(calc.shipping_source, ShippingSource::FlatFee);
        assert_eq!(calc.total.cents(), 3750);
    }

    #[tokio::test]
    async fn test_negative_price_rejected() {
        let quotes = Arc::new(FakeQuoteService::answering(vec![]));
        let (_tx, mut checkout) = session(quotes, view("USD", None));
        checkout.set_cart(small_cart()).await.unwrap();

        let result = checkout
            .set_cart(vec![CartLine::new("refund", Money::from_cents(-2000), 1)])
            .await;
        assert!(matches!(
            result,
            Err(PricingError::Core(CoreError::Validation(ValidationError::OutOfRange { .. })))
        ));
        assert_eq!(checkout.lines(), small_cart().as_slice());
        assert_eq!(checkout.calculation().total.cents(), 3750);
    }

    #[tokio::test]
    async fn test_oversized_price_rejected() {
        let quotes = Arc::new(FakeQuoteService::answering(vec![]));
        let (_tx, mut checkout) = session(quotes, view("USD", None));

        let result = checkout
            .set_cart(vec![CartLine::new("yacht", Money::from_cents(i64::MAX / 2), 3)])
            .await;
        assert!(result.is_err());
        assert!(checkout.lines().is_empty());
        assert!(checkout.calculation().is_empty());
    }

    #[tokio::test]
    async fn test_destination_validation() {
        let quotes = Arc::new(FakeQuoteService::answering(vec![]));
        let (_tx, mut checkout) = session(quotes, view("USD", None));
        assert_eq!(checkout.validate_destination().len(), 1);

        checkout.set_destination(address()).await;
        assert!(checkout.validate_destination().is_empty());

        let mut bad = address();
        bad.phone = "12".into();
        bad.postal_code = String::new();
        checkout.set_destination(bad).await;
        let fields: Vec<_> = checkout
            .validate_destination()
            .iter()
            .map(|e| e.field().to_string())
            .collect();
        assert_eq!(fields, vec!["postalCode", "phone"]);
    }
}
