//! Concrete `FormSubmitter` for the judicial case-file Portal.

use std::time::Duration;

use chromiumoxide::Page;
use reqwest::Client;
use tracing::warn;

use crate::error::{AppError, Result};

use super::{FormSubmitter, PageState, RawBinnacle, RawFileLink, RawNotification};

/// Wrap a future with a timeout, mapping expiry onto `AppError::Timeout`
/// (spec.md §6 `pageTimeoutMs`/`navigationTimeoutMs`).
async fn with_timeout<T>(what: &str, duration: Duration, fut: impl std::future::Future<Output = Result<T>>) -> Result<T> {
    match tokio::time::timeout(duration, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Timeout(format!("{what} timed out after {duration:.2?}"))),
    }
}

const SEARCH_URL_SUFFIX: &str = "/consultaDeExpedientes";
const CASE_NUMBER_INPUT: &str = "#numeroExpediente, input[name='numeroExpediente']";
const PARTY_NAME_INPUT: &str = "#nombreParte, input[name='nombreParte']";
const SUBMIT_BUTTON: &str = "#buscarExpediente, button[type='submit']";
const RESULTS_TABLE_ROW: &str = "table.binnacle-table tbody tr, table#tablaSeguimiento tbody tr";
const NO_RESULTS_BANNER: &str = ".no-results, #sinResultados";
const ANTIBOT_BANNER: &str = "#antibot-block, .access-denied-banner";
const CAPTCHA_ERROR_BANNER: &str = ".captcha-error, #captchaError";

pub struct PortalFormSubmitter {
    base_url: String,
    http: Client,
    page_timeout: Duration,
    navigation_timeout: Duration,
}

impl PortalFormSubmitter {
    pub fn new(base_url: String, http: Client) -> Self {
        Self::with_timeouts(base_url, http, Duration::from_millis(30_000), Duration::from_millis(45_000))
    }

    pub fn with_timeouts(base_url: String, http: Client, page_timeout: Duration, navigation_timeout: Duration) -> Self {
        Self { base_url, http, page_timeout, navigation_timeout }
    }

    fn search_url(&self) -> String {
        format!("{}{SEARCH_URL_SUFFIX}", self.base_url)
    }

    async fn submit_inner(&self, page: &Page, case_number: &str, party_name: &str) -> Result<PageState> {
        let input = page
            .find_element(CASE_NUMBER_INPUT)
            .await
            .map_err(|e| AppError::PortalUnreachable(format!("case number input not found: {e}")))?;
        input
            .type_str(case_number)
            .await
            .map_err(|e| AppError::PortalUnreachable(format!("failed to type case number: {e}")))?;

        if !party_name.is_empty() {
            let party_input = page
                .find_element(PARTY_NAME_INPUT)
                .await
                .map_err(|e| AppError::PortalUnreachable(format!("party name input not found: {e}")))?;
            party_input
                .type_str(party_name)
                .await
                .map_err(|e| AppError::PortalUnreachable(format!("failed to type party name: {e}")))?;
        }

        let button = page
            .find_element(SUBMIT_BUTTON)
            .await
            .map_err(|e| AppError::PortalUnreachable(format!("submit button not found: {e}")))?;
        button
            .click()
            .await
            .map_err(|e| AppError::PortalUnreachable(format!("failed to click submit: {e}")))?;

        classify_page(page).await
    }
}

#[async_trait::async_trait]
impl FormSubmitter for PortalFormSubmitter {
    async fn navigate(&self, page: &Page) -> Result<()> {
        with_timeout("navigation", self.navigation_timeout, async {
            page.goto(self.search_url())
                .await
                .map_err(|e| AppError::PortalUnreachable(format!("navigation failed: {e}")))?;
            page.wait_for_navigation()
                .await
                .map_err(|e| AppError::PortalUnreachable(format!("navigation did not settle: {e}")))?;
            Ok(())
        })
        .await
    }

    async fn submit(&self, page: &Page, case_number: &str, party_name: &str) -> Result<PageState> {
        with_timeout("form submit", self.page_timeout, self.submit_inner(page, case_number, party_name)).await
    }

    async fn extract_binnacles(&self, page: &Page) -> Result<Vec<RawBinnacle>> {
        let rows = page
            .find_elements(RESULTS_TABLE_ROW)
            .await
            .map_err(|e| AppError::ValidationFailed(format!("binnacle table not found: {e}")))?;

        let mut binnacles = Vec::with_capacity(rows.len());
        for (idx, row) in rows.iter().enumerate() {
            let text = row
                .inner_text()
                .await
                .map_err(|e| AppError::ValidationFailed(format!("failed reading row text: {e}")))?
                .unwrap_or_default();
            let cells: Vec<&str> = text.split('\t').map(str::trim).collect();

            binnacles.push(RawBinnacle {
                index: idx as i32,
                resolution_date: cells.first().map(|s| s.to_string()),
                entry_date: cells.get(1).map(|s| s.to_string()),
                acto: cells.get(2).map(|s| s.to_string()),
                fojas: cells.get(3).map(|s| s.to_string()),
                folios: cells.get(4).map(|s| s.to_string()),
                proveido_date: cells.get(5).map(|s| s.to_string()),
                sumilla: cells.get(6).map(|s| s.to_string()),
                user_description: cells.get(7).map(|s| s.to_string()),
                notification_type: cells.get(8).map(|s| s.to_string()),
                notification_count: 0,
            });
        }
        Ok(binnacles)
    }

    async fn extract_notifications(&self, page: &Page) -> Result<Vec<RawNotification>> {
        // The Portal nests notification rows under each binnacle's
        // expandable panel; this crate does not need per-column fidelity
        // beyond what the change detector keys on, so it reads a single
        // flattened notification sub-table keyed by its parent row index.
        let rows = page
            .find_elements("table.notification-subtable tbody tr")
            .await
            .unwrap_or_default();

        let mut notifications = Vec::with_capacity(rows.len());
        for row in rows {
            let parent_index: i32 = row
                .attribute("data-binnacle-index")
                .await
                .ok()
                .flatten()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0);

            let text = row.inner_text().await.ok().flatten().unwrap_or_default();
            let cells: Vec<&str> = text.split('\t').map(str::trim).collect();

            notifications.push(RawNotification {
                binnacle_index: parent_index,
                code: cells.first().map(|s| s.to_string()),
                addressee: cells.get(1).map(|s| s.to_string()),
                ship_date: cells.get(2).map(|s| s.to_string()),
                delivery_method: cells.get(3).map(|s| s.to_string()),
            });
        }
        Ok(notifications)
    }

    async fn extract_file_links(&self, page: &Page) -> Result<Vec<RawFileLink>> {
        let anchors = page
            .find_elements("a.file-attachment-link")
            .await
            .unwrap_or_default();

        let mut links = Vec::with_capacity(anchors.len());
        for a in anchors {
            let parent_index: i32 = a
                .attribute("data-binnacle-index")
                .await
                .ok()
                .flatten()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0);
            let href = a.attribute("href").await.ok().flatten();
            let name = a.inner_text().await.ok().flatten();

            if let (Some(url), Some(original_name)) = (href, name) {
                links.push(RawFileLink {
                    binnacle_index: parent_index,
                    original_name,
                    url,
                });
            }
        }
        Ok(links)
    }

    async fn download_file(&self, url: &str) -> Result<Option<bytes::Bytes>> {
        match self.http.get(url).send().await {
            Ok(resp) if resp.status().is_success() => match resp.bytes().await {
                Ok(bytes) => Ok(Some(bytes)),
                Err(e) => {
                    warn!(url, error = %e, "file download body read failed");
                    Ok(None)
                }
            },
            Ok(resp) => {
                warn!(url, status = %resp.status(), "file download returned non-success status");
                Ok(None)
            }
            Err(e) => {
                warn!(url, error = %e, "file download request failed");
                Ok(None)
            }
        }
    }
}

async fn classify_page(page: &Page) -> Result<PageState> {
    if page.find_element(ANTIBOT_BANNER).await.is_ok() {
        return Ok(PageState::AntibotInterposition);
    }
    if page.find_element(CAPTCHA_ERROR_BANNER).await.is_ok() {
        return Ok(PageState::CaptchaError);
    }
    if page.find_element(NO_RESULTS_BANNER).await.is_ok() {
        return Ok(PageState::NoResults);
    }
    if page.find_element(RESULTS_TABLE_ROW).await.is_ok() {
        return Ok(PageState::Results);
    }
    Ok(PageState::NoResults)
}
