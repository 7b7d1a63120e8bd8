use anyhow::{Context, Result};
use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// One browsing session: a dedicated headless Chrome instance with a single
/// tab. Created fresh every polling cycle and closed before the next one, so
/// no cookie or session state survives between cycles.
pub struct BrowserSession {
    browser: Browser,
    tab: Arc<Tab>,
}

impl BrowserSession {
    pub fn launch(headless: bool) -> Result<Self> {
        info!("Launching headless Chrome...");

        let options = LaunchOptions::default_builder()
            .headless(headless)
            .sandbox(false)
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;
        let tab = browser.new_tab().context("Failed to open browser tab")?;

        Ok(Self { browser, tab })
    }

    pub fn navigate(&self, url: &str) -> Result<()> {
        debug!("Navigating to {}", url);
        self.tab
            .navigate_to(url)
            .with_context(|| format!("Failed to navigate to {url}"))?;
        self.tab.wait_until_navigated()?;
        Ok(())
    }

    pub fn current_url(&self) -> String {
        self.tab.get_url()
    }

    /// Poll the navigated URL until it contains `needle`, up to `timeout`.
    pub fn wait_until_url_contains(&self, needle: &str, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.tab.get_url().contains(needle) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                anyhow::bail!("URL did not contain {needle:?} within {timeout:?}");
            }
            thread::sleep(Duration::from_millis(200));
        }
    }

    /// Locate an element by CSS selector, polling briefly so the call tolerates
    /// client-side rendering lag.
    pub fn wait_for_element(&self, selector: &str) -> Result<Element<'_>> {
        self.tab
            .wait_for_element(selector)
            .with_context(|| format!("Element {selector:?} not found"))
    }

    /// Script-level synthetic click. The native pointer click does not reliably
    /// penetrate the overlay sitting on top of the login provider control.
    pub fn force_click(&self, element: &Element<'_>) -> Result<()> {
        element
            .call_js_fn("function() { this.click(); }", vec![], false)
            .context("Synthetic click failed")?;
        Ok(())
    }

    pub fn type_into(&self, element: &Element<'_>, text: &str) -> Result<()> {
        element.type_into(text)?;
        Ok(())
    }

    /// Send an Enter keypress to the currently focused element.
    pub fn press_enter(&self) -> Result<()> {
        self.tab.press_key("Enter")?;
        Ok(())
    }

    /// Current rendered markup of the page.
    pub fn page_html(&self) -> Result<String> {
        let result = self
            .tab
            .evaluate("document.documentElement.outerHTML", false)
            .context("Failed to read page HTML")?;
        let html = result
            .value
            .as_ref()
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        if html.is_empty() {
            warn!("Rendered page HTML is empty");
        }
        Ok(html)
    }

    /// Close the tab and shut the browser down. Dropping the session kills the
    /// Chrome process either way; this just makes the release explicit.
    pub fn close(self) {
        if let Err(e) = self.tab.close(false) {
            warn!("Failed to close browser tab: {e:#}");
        }
        drop(self.browser);
    }
}
