//! HTTP client for the external CAPTCHA-solving API used by the Image and
//! Interactive strategies (spec.md §4.5). Audio solving is done locally
//! (transcription happens in `audio.rs`) so it never touches this client.

use reqwest::Client;
use serde::Deserialize;

use crate::error::{AppError, ErrorKind, Result};

pub struct ExternalSolverClient {
    http: Client,
    api_base: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct SolveResponse {
    status: String,
    solution: Option<String>,
    error: Option<String>,
}

impl ExternalSolverClient {
    pub fn new(http: Client, api_base: String, api_key: String) -> Self {
        Self {
            http,
            api_base,
            api_key,
        }
    }

    /// Submit an image CAPTCHA (base64-encoded) and return the transcribed
    /// text. Failures here are `SolverApi`, which §7 surfaces to the
    /// worker as `CaptchaFailed` once the chain exhausts.
    pub async fn solve_image(&self, image_base64: &str) -> Result<String> {
        let resp = self
            .http
            .post(format!("{}/solve/image", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "image": image_base64 }))
            .send()
            .await
            .map_err(|e| AppError::CaptchaFailed(format!("solver API request failed: {e}")))?;

        let parsed: SolveResponse = resp
            .json()
            .await
            .map_err(|e| map_solver_error(&format!("solver API response undecodable: {e}")))?;

        if parsed.status != "solved" {
            return Err(map_solver_error(
                parsed.error.as_deref().unwrap_or("solver reported failure"),
            ));
        }
        parsed
            .solution
            .ok_or_else(|| map_solver_error("solver reported success with no solution"))
    }

    /// Submit a challenge's site key and page URL, returning the response
    /// token the page's callback expects.
    pub async fn solve_challenge(&self, site_key: &str, page_url: &str) -> Result<String> {
        let resp = self
            .http
            .post(format!("{}/solve/challenge", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "siteKey": site_key, "pageUrl": page_url }))
            .send()
            .await
            .map_err(|e| AppError::CaptchaFailed(format!("solver API request failed: {e}")))?;

        let parsed: SolveResponse = resp
            .json()
            .await
            .map_err(|e| map_solver_error(&format!("solver API response undecodable: {e}")))?;

        if parsed.status != "solved" {
            return Err(map_solver_error(
                parsed.error.as_deref().unwrap_or("solver reported failure"),
            ));
        }
        parsed
            .solution
            .ok_or_else(|| map_solver_error("solver reported success with no token"))
    }
}

fn map_solver_error(message: &str) -> AppError {
    debug_assert_eq!(ErrorKind::SolverApi.as_str(), "SolverApi");
    AppError::SolverApi(message.to_string())
}
