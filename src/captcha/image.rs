//! Image CAPTCHA strategy: fetches the challenge image, base64-encodes
//! it, and hands it to the external solver API (spec.md §4.5).

use std::sync::Arc;

use base64::Engine;
use chromiumoxide::Page;

use crate::error::{AppError, Result};

use super::solver::ExternalSolverClient;
use super::{CaptchaStrategy, SolveOutcome};

const IMAGE_SELECTOR: &str = "img#captchaImage, img.captcha-image";
const RESPONSE_INPUT_SELECTOR: &str = "#captchaResponse, input.captcha-response";

pub struct ImageStrategy {
    solver: Arc<ExternalSolverClient>,
}

impl ImageStrategy {
    pub fn new(solver: Arc<ExternalSolverClient>) -> Self {
        Self { solver }
    }
}

#[async_trait::async_trait]
impl CaptchaStrategy for ImageStrategy {
    fn name(&self) -> &'static str {
        "image"
    }

    async fn applicable(&self, page: &Page) -> Result<bool> {
        Ok(page.find_element(IMAGE_SELECTOR).await.is_ok())
    }

    async fn solve(&self, page: &Page) -> Result<SolveOutcome> {
        let image = page
            .find_element(IMAGE_SELECTOR)
            .await
            .map_err(|e| AppError::CaptchaFailed(format!("captcha image not found: {e}")))?;

        let screenshot = image
            .screenshot(chromiumoxide::page::ScreenshotParams::builder().build())
            .await
            .map_err(|e| AppError::CaptchaFailed(format!("failed to screenshot captcha: {e}")))?;

        let encoded = base64::engine::general_purpose::STANDARD.encode(screenshot);
        let solution = self.solver.solve_image(&encoded).await?;

        let input = page
            .find_element(RESPONSE_INPUT_SELECTOR)
            .await
            .map_err(|e| AppError::CaptchaFailed(format!("captcha response field not found: {e}")))?;
        input
            .type_str(&solution)
            .await
            .map_err(|e| AppError::CaptchaFailed(format!("failed to type captcha response: {e}")))?;

        Ok(SolveOutcome {
            solved: true,
            solution: Some(solution),
            token: None,
        })
    }
}
