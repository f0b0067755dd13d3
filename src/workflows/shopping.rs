//! Shopping agent: search → add to cart → wait for payment → track.
//!
//! Every step after search is skipped when the previous one did not
//! succeed. Tracking polls the order page a bounded number of times with a
//! fixed pause between checks; a check that errors counts as an attempt.

use crate::collab::browser::{BrowserStorefront, BrowserTarget, StdinPaymentConfirmation};
use crate::collab::search::DuckDuckGoSearch;
use crate::collab::{OrderState, PaymentConfirmation, SearchHit, Storefront, WebSearch};
use crate::config::WorkflowConfig;
use crate::error::WorkflowError;
use crate::progress::{Progress, ProgressCallback};
use crate::retry::PollPolicy;
use crate::workflows::run_step;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

pub const WORKFLOW: &str = "shop";
pub const DEFAULT_QUERY: &str = "razor site:amazon.com Gillette inurl:/dp/";
pub const DEFAULT_BRAND: &str = "Gillette";

/// Terminal outcome of the tracking step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingStatus {
    #[default]
    Pending,
    Shipped,
    Delivered,
}

impl ShippingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ShippingStatus::Pending => "pending",
            ShippingStatus::Shipped => "shipped",
            ShippingStatus::Delivered => "delivered",
        }
    }
}

impl std::fmt::Display for ShippingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingState {
    pub product_url: Option<String>,
    pub in_cart: bool,
    pub payment_done: bool,
    pub shipping_status: ShippingStatus,
    pub tracking_url: String,
    /// Number of status checks the tracking step performed.
    pub status_checks: u32,
}

/// What to look for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub query: String,
    /// Must appear in the result title.
    pub brand: String,
    pub max_results: usize,
}

impl ProductQuery {
    pub fn new(query: impl Into<String>, brand: impl Into<String>, max_results: usize) -> Self {
        Self {
            query: query.into(),
            brand: brand.into(),
            max_results,
        }
    }
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self::new(DEFAULT_QUERY, DEFAULT_BRAND, 10)
    }
}

/// First hit that is a product page for the brand.
pub fn select_product(hits: &[SearchHit], brand: &str) -> Option<String> {
    hits.iter()
        .find(|h| h.title.contains(brand) && h.url.contains("amazon.com") && h.url.contains("/dp/"))
        .map(|h| h.url.clone())
}

pub struct ShoppingAgent {
    search: Arc<dyn WebSearch>,
    store: Arc<dyn Storefront>,
    payment: Arc<dyn PaymentConfirmation>,
    poll: PollPolicy,
    progress: Option<ProgressCallback>,
}

impl ShoppingAgent {
    pub fn new(
        search: Arc<dyn WebSearch>,
        store: Arc<dyn Storefront>,
        payment: Arc<dyn PaymentConfirmation>,
        poll: PollPolicy,
    ) -> Self {
        Self {
            search,
            store,
            payment,
            poll,
            progress: None,
        }
    }

    pub fn with_progress(mut self, callback: Option<ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// DuckDuckGo search, a chromiumoxide storefront and a stdin payment
    /// gate. The returned storefront handle should be closed after the run.
    pub async fn from_config(
        config: &WorkflowConfig,
        target: &BrowserTarget,
        shop_base: &str,
    ) -> Result<(Self, Arc<BrowserStorefront>), WorkflowError> {
        let store = Arc::new(BrowserStorefront::open(target, shop_base).await?);
        let agent = Self::new(
            Arc::new(DuckDuckGoSearch::new(config.download_timeout_secs)?),
            store.clone(),
            Arc::new(StdinPaymentConfirmation),
            config.poll,
        )
        .with_progress(config.progress_callback.clone());
        Ok((agent, store))
    }

    pub async fn run(&self, query: &ProductQuery) -> Result<ShoppingState, WorkflowError> {
        let progress = Progress(self.progress.as_ref());
        progress.workflow_start(WORKFLOW);
        let mut state = ShoppingState::default();

        state.product_url = run_step(&progress, "search", self.search_product(query)).await?;

        match state.product_url.clone() {
            Some(url) => {
                state.in_cart = run_step(&progress, "cart", async { Ok(self.add_to_cart(&url).await) }).await?;
            }
            None => {
                info!("No product URL available");
                progress.step_skipped("cart");
            }
        }

        if state.in_cart {
            state.payment_done = run_step(&progress, "payment", self.wait_for_payment()).await?;
        } else {
            info!("Cart is empty, stopping");
            progress.step_skipped("payment");
        }

        if state.payment_done {
            let (status, tracking_url, checks) = run_step(&progress, "track", self.track()).await?;
            state.shipping_status = status;
            state.tracking_url = tracking_url;
            state.status_checks = checks;
        } else {
            info!("Payment not completed, stopping");
            progress.step_skipped("track");
        }

        info!("Shopping finished: {}", state.shipping_status);
        progress.workflow_complete(WORKFLOW);
        Ok(state)
    }

    async fn search_product(&self, query: &ProductQuery) -> Result<Option<String>, WorkflowError> {
        let hits = match self.search.search(&query.query, query.max_results).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!("Product search failed: {}", e);
                Vec::new()
            }
        };
        let selected = select_product(&hits, &query.brand);
        match &selected {
            Some(url) => info!("Selected product URL: {}", url),
            None => info!("No {} product page found among {} hits", query.brand, hits.len()),
        }
        Ok(selected)
    }

    async fn add_to_cart(&self, url: &str) -> bool {
        match self.store.add_to_cart(url).await {
            Ok(()) => {
                info!("Added to cart");
                true
            }
            Err(e) => {
                warn!("Error adding to cart: {}", e);
                false
            }
        }
    }

    async fn wait_for_payment(&self) -> Result<bool, WorkflowError> {
        self.store.open_cart().await?;
        Ok(self.payment.wait_for_payment().await)
    }

    /// Poll up to `max_attempts` times, sleeping only between checks.
    async fn track(&self) -> Result<(ShippingStatus, String, u32), WorkflowError> {
        self.store.open_order_history().await?;
        let max = self.poll.max_attempts;

        for attempt in 1..=max {
            match self.store.order_state().await {
                Ok(OrderState::Shipped { tracking_url }) => {
                    info!("Order has shipped");
                    return Ok((ShippingStatus::Shipped, tracking_url.unwrap_or_default(), attempt));
                }
                Ok(OrderState::Delivered) => {
                    info!("Order delivered");
                    return Ok((ShippingStatus::Delivered, String::new(), attempt));
                }
                Ok(OrderState::NotShipped) => {
                    debug!("Check {}/{}: not yet shipped", attempt, max);
                }
                Err(e) => warn!("Check {}/{} failed: {}", attempt, max, e),
            }

            if attempt < max {
                sleep(self.poll.interval).await;
                if let Err(e) = self.store.refresh().await {
                    warn!("Refresh failed: {}", e);
                }
            }
        }

        warn!("Tracking timed out after {} checks", max);
        Ok((ShippingStatus::Pending, String::new(), max))
    }
}
