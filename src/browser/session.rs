//! A single pooled browser process and its page-open counter.

use chromiumoxide::{Browser, BrowserConfig, Page};
use tracing::{debug, warn};

use crate::error::{AppError, Result};

use super::stealth::{apply_stealth, enable_resource_blocking};

/// One Chromium instance plus the bookkeeping the pool needs to decide
/// when to recycle it (spec.md §4.4: `pagesOpened >= M` triggers recycle).
pub struct BrowserSession {
    pub(crate) browser: Browser,
    handler_task: tokio::task::JoinHandle<()>,
    pages_opened: u32,
    pub(crate) fatal: bool,
    block_media_and_fonts: bool,
}

impl BrowserSession {
    pub async fn launch(block_media_and_fonts: bool) -> Result<Self> {
        let config = BrowserConfig::builder()
            .build()
            .map_err(|e| AppError::BrowserCrash(format!("failed to build browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| AppError::BrowserCrash(format!("failed to launch browser: {e}")))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = futures::StreamExt::next(&mut handler).await {
                if let Err(e) = event {
                    warn!(error = %e, "browser handler event error");
                }
            }
        });

        Ok(Self {
            browser,
            handler_task,
            pages_opened: 0,
            fatal: false,
            block_media_and_fonts,
        })
    }

    /// Open a new page, wiring the CDP Fetch-domain resource blocking and
    /// anti-detection policy from spec.md §4.4 before returning it. Page
    /// and navigation timeouts are applied by the caller (`FormSubmitter`)
    /// around its own `goto`/element-wait calls, since chromiumoxide has
    /// no per-page timeout knob of its own.
    pub async fn new_page(&mut self, url: &str) -> Result<Page> {
        let page = self
            .browser
            .new_page(url)
            .await
            .map_err(|e| AppError::BrowserCrash(format!("failed to open page: {e}")))?;

        if self.block_media_and_fonts {
            if let Err(e) = enable_resource_blocking(&page).await {
                warn!(error = %e, "resource blocking setup failed, continuing anyway");
            }
        }
        if let Err(e) = apply_stealth(&page).await {
            warn!(error = %e, "stealth patching failed, continuing anyway");
        }

        self.pages_opened += 1;
        Ok(page)
    }

    pub fn pages_opened(&self) -> u32 {
        self.pages_opened
    }

    pub fn mark_fatal(&mut self) {
        self.fatal = true;
    }

    pub async fn shutdown(mut self) {
        debug!(pages_opened = self.pages_opened, "shutting down browser session");
        let _ = self.browser.close().await;
        self.handler_task.abort();
    }
}
