//! Anti-detection patching applied to every new page (spec.md §4.4): hide
//! `navigator.webdriver`, synthesize a plausible plugin list, set
//! realistic `languages`, and trim the `chrome` runtime object down to
//! what a real Chrome install exposes. Also configures resource blocking
//! that allows `image`/`script`/`stylesheet` through (CAPTCHA solving
//! depends on fetched images) and blocks only `font`/`media`.

use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams, EventRequestPaused, FailRequestParams, RequestPattern,
};
use chromiumoxide::cdp::browser_protocol::network::{ErrorReason, ResourceType};
use futures::StreamExt;
use tracing::warn;

use crate::error::{AppError, Result};

const STEALTH_SCRIPT: &str = r#"
(() => {
    Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
    Object.defineProperty(navigator, 'languages', { get: () => ['es-PE', 'es', 'en-US', 'en'] });
    Object.defineProperty(navigator, 'plugins', {
        get: () => [1, 2, 3, 4, 5].map(() => ({ name: 'Chrome PDF Plugin' })),
    });
    window.chrome = { runtime: {} };
    const originalQuery = window.navigator.permissions.query;
    window.navigator.permissions.query = (parameters) =>
        parameters.name === 'notifications'
            ? Promise.resolve({ state: Notification.permission })
            : originalQuery(parameters);
})();
"#;

const CHROME_UA: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/124.0.0.0 Safari/537.36";

pub async fn apply_stealth(page: &Page) -> Result<()> {
    page.evaluate_on_new_document(STEALTH_SCRIPT)
        .await
        .map_err(|e| AppError::BrowserCrash(format!("stealth script injection failed: {e}")))?;

    page.set_user_agent(CHROME_UA)
        .await
        .map_err(|e| AppError::BrowserCrash(format!("user agent override failed: {e}")))?;

    Ok(())
}

/// Resource types the pool blocks outright. Images, scripts, and
/// stylesheets always pass through: the CAPTCHA image strategy fetches
/// an `img` element, and the Portal's form relies on its own JS.
pub const BLOCKED_RESOURCE_TYPES: &[ResourceType] = &[ResourceType::Font, ResourceType::Media];

/// Enable the CDP Fetch domain and spawn a background listener that fails
/// requests for `BLOCKED_RESOURCE_TYPES` and continues everything else
/// (spec.md §4.4). Must be called once per page, before navigation.
pub async fn enable_resource_blocking(page: &Page) -> Result<()> {
    let patterns = vec![RequestPattern::builder().url_pattern("*").build()];
    page.execute(
        EnableParams::builder()
            .patterns(patterns)
            .build()
            .map_err(|e| AppError::BrowserCrash(format!("failed to build Fetch.enable params: {e}")))?,
    )
    .await
    .map_err(|e| AppError::BrowserCrash(format!("Fetch.enable failed: {e}")))?;

    let mut events = page
        .event_listener::<EventRequestPaused>()
        .await
        .map_err(|e| AppError::BrowserCrash(format!("failed to subscribe to Fetch.requestPaused: {e}")))?;

    let page = page.clone();
    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            let blocked = BLOCKED_RESOURCE_TYPES.contains(&event.resource_type);

            let result = if blocked {
                page.execute(FailRequestParams::new(event.request_id.clone(), ErrorReason::BlockedByClient))
                    .await
                    .map(|_| ())
            } else {
                page.execute(ContinueRequestParams::new(event.request_id.clone()))
                    .await
                    .map(|_| ())
            };
            if let Err(e) = result {
                warn!(error = %e, "failed to respond to Fetch.requestPaused");
            }
        }
    });

    Ok(())
}
