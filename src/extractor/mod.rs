//! FormSubmitter contract (spec.md §4.7): navigates the Portal's search
//! form, submits a case number, and extracts the structured results.
//! Grounded on the teacher's `banner::session::SessionManager` for the
//! navigate/submit shape (form post, follow the resulting page) but
//! reworked around a rendered `chromiumoxide::Page` instead of a
//! `reqwest::Client`, since the Portal's form is JS-driven.

pub mod portal;

use chromiumoxide::Page;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Raw, unnormalized fields scraped directly off one binnacle row. Goes
/// through `normalize` before it becomes a `Binnacle`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawBinnacle {
    pub index: i32,
    pub resolution_date: Option<String>,
    pub entry_date: Option<String>,
    pub acto: Option<String>,
    pub fojas: Option<String>,
    pub folios: Option<String>,
    pub proveido_date: Option<String>,
    pub sumilla: Option<String>,
    pub user_description: Option<String>,
    pub notification_type: Option<String>,
    pub notification_count: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawNotification {
    pub binnacle_index: i32,
    pub code: Option<String>,
    pub addressee: Option<String>,
    pub ship_date: Option<String>,
    pub delivery_method: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RawFileLink {
    pub binnacle_index: i32,
    pub original_name: String,
    pub url: String,
}

/// Classification of what the Portal returned after a search submit
/// (spec.md §4.6 step 5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    Results,
    NoResults,
    AntibotInterposition,
    CaptchaError,
}

#[async_trait::async_trait]
pub trait FormSubmitter: Send + Sync {
    /// Navigate to the Portal's search form.
    async fn navigate(&self, page: &Page) -> Result<()>;

    /// Submit a case number and party name search, returning the
    /// resulting page state (spec.md §4.6 steps 3-4, §4.7).
    async fn submit(&self, page: &Page, case_number: &str, party_name: &str) -> Result<PageState>;

    async fn extract_binnacles(&self, page: &Page) -> Result<Vec<RawBinnacle>>;

    async fn extract_notifications(&self, page: &Page) -> Result<Vec<RawNotification>>;

    async fn extract_file_links(&self, page: &Page) -> Result<Vec<RawFileLink>>;

    /// Download a file. Never raises on HTTP-level failure: returns
    /// `Ok(None)` so a single missing attachment doesn't fail the whole
    /// job (spec.md §4.6 step 9, per-file failure is non-fatal).
    async fn download_file(&self, url: &str) -> Result<Option<bytes::Bytes>>;
}
