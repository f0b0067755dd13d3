//! Browser-driven storefront and the human payment gate.
//!
//! [`BrowserStorefront`] drives one Chrome tab through chromiumoxide. It
//! either launches its own browser (visible by default, since a human has
//! to log in and pay in the same window) or attaches to one already running
//! with `--remote-debugging-port`.

use crate::collab::{OrderState, PaymentConfirmation, Storefront};
use crate::error::WorkflowError;
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Element, Page};
use futures::StreamExt;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

pub const DEFAULT_SHOP_BASE: &str = "https://www.amazon.com";
const CART_PATH: &str = "/gp/cart/view.html";
const ORDER_HISTORY_PATH: &str = "/gp/your-account/order-history";
const ADD_TO_CART_SELECTOR: &str = "#add-to-cart-button";
const ORDER_SELECTOR: &str = ".order";
const TRACK_LINK_XPATH: &str = "//a[contains(text(), 'Track')]";

const ELEMENT_TIMEOUT: Duration = Duration::from_secs(15);
const ELEMENT_POLL: Duration = Duration::from_millis(500);
const CART_SETTLE: Duration = Duration::from_secs(2);

static RE_NOT_SHIPPED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bnot\s+(yet\s+)?shipped\b").expect("valid not-shipped regex")
});

/// How to get hold of a browser.
#[derive(Debug, Clone)]
pub enum BrowserTarget {
    /// Launch a new browser; `headless` hides the window.
    Launch { headless: bool },
    /// Attach over CDP, e.g. `http://localhost:9222`.
    Connect { url: String },
}

/// [`Storefront`] backed by a live Chrome tab.
pub struct BrowserStorefront {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    base_url: String,
}

fn browser_err(step: &'static str) -> impl Fn(chromiumoxide::error::CdpError) -> WorkflowError {
    move |e| WorkflowError::Browser {
        step,
        detail: e.to_string(),
    }
}

impl BrowserStorefront {
    pub async fn open(target: &BrowserTarget, base_url: impl Into<String>) -> Result<Self, WorkflowError> {
        let (browser, mut handler) = match target {
            BrowserTarget::Launch { headless } => {
                let builder = if *headless {
                    BrowserConfig::builder().new_headless_mode()
                } else {
                    BrowserConfig::builder().with_head()
                };
                let config = builder
                    .args(vec!["--disable-gpu", "--no-sandbox", "--disable-dev-shm-usage"])
                    .build()
                    .map_err(|detail| WorkflowError::Browser {
                        step: "launch",
                        detail,
                    })?;
                info!("Launching browser (headless: {})", headless);
                Browser::launch(config).await.map_err(browser_err("launch"))?
            }
            BrowserTarget::Connect { url } => {
                info!("Connecting to browser at {}", url);
                Browser::connect(url.as_str()).await.map_err(browser_err("connect"))?
            }
        };

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(browser_err("new_page"))?;

        Ok(Self {
            browser,
            page,
            handler,
            base_url: base_url.into(),
        })
    }

    /// Close the browser and stop the event loop.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Browser close failed: {}", e);
        }
        self.handler.abort();
    }

    async fn goto(&self, step: &'static str, url: &str) -> Result<(), WorkflowError> {
        debug!("Navigating to {}", url);
        self.page.goto(url).await.map_err(browser_err(step))?;
        Ok(())
    }

    /// Poll for a CSS selector until it appears or the timeout passes.
    async fn wait_for(&self, step: &'static str, selector: &str) -> Result<Element, WorkflowError> {
        let deadline = Instant::now() + ELEMENT_TIMEOUT;
        loop {
            match self.page.find_element(selector).await {
                Ok(element) => return Ok(element),
                Err(e) if Instant::now() >= deadline => {
                    return Err(WorkflowError::Browser {
                        step,
                        detail: format!("'{selector}' not found within {ELEMENT_TIMEOUT:?}: {e}"),
                    })
                }
                Err(_) => sleep(ELEMENT_POLL).await,
            }
        }
    }
}

#[async_trait]
impl Storefront for BrowserStorefront {
    async fn add_to_cart(&self, product_url: &str) -> Result<(), WorkflowError> {
        self.goto("add_to_cart", product_url).await?;
        let button = self.wait_for("add_to_cart", ADD_TO_CART_SELECTOR).await?;
        button.click().await.map_err(browser_err("add_to_cart"))?;
        sleep(CART_SETTLE).await;
        Ok(())
    }

    async fn open_cart(&self) -> Result<(), WorkflowError> {
        self.goto("open_cart", &format!("{}{CART_PATH}", self.base_url)).await
    }

    async fn open_order_history(&self) -> Result<(), WorkflowError> {
        self.goto("order_history", &format!("{}{ORDER_HISTORY_PATH}", self.base_url))
            .await
    }

    async fn order_state(&self) -> Result<OrderState, WorkflowError> {
        let order = self.wait_for("order_state", ORDER_SELECTOR).await?;
        let text = order
            .inner_text()
            .await
            .map_err(browser_err("order_state"))?
            .unwrap_or_default();

        let tracking_url = match self.page.find_xpath(TRACK_LINK_XPATH).await {
            Ok(link) => link.attribute("href").await.ok().flatten(),
            Err(_) => None,
        };
        Ok(classify_order_text(&text, tracking_url))
    }

    async fn refresh(&self) -> Result<(), WorkflowError> {
        self.page.reload().await.map_err(browser_err("refresh"))?;
        Ok(())
    }
}

/// Read an order block's text. Negated phrases such as "not yet shipped"
/// count as not shipped.
pub fn classify_order_text(text: &str, tracking_url: Option<String>) -> OrderState {
    let lower = text.to_lowercase();
    if RE_NOT_SHIPPED.is_match(&lower) {
        OrderState::NotShipped
    } else if lower.contains("shipped") {
        OrderState::Shipped { tracking_url }
    } else if lower.contains("delivered") {
        OrderState::Delivered
    } else {
        OrderState::NotShipped
    }
}

/// Waits for Enter on stdin after the human finishes checkout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPaymentConfirmation;

#[async_trait]
impl PaymentConfirmation for StdinPaymentConfirmation {
    async fn wait_for_payment(&self) -> bool {
        eprintln!("Please log in, enter your payment details, and complete checkout.");
        eprintln!("Press Enter after payment to resume tracking...");
        let read = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            std::io::stdin().read_line(&mut line).map(|_| ())
        })
        .await;
        match read {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!("Could not read confirmation from stdin: {}", e);
                false
            }
            Err(e) => {
                warn!("Confirmation task failed: {}", e);
                false
            }
        }
    }
}
