//! Interactive-challenge strategy (e.g. a siteKey-based widget): extracts
//! the widget's site key, asks the external solver for a response token,
//! injects it into the hidden response field, and invokes the widget's
//! callback (spec.md §4.5).

use std::sync::Arc;

use chromiumoxide::Page;

use crate::error::{AppError, Result};

use super::solver::ExternalSolverClient;
use super::{CaptchaStrategy, SolveOutcome};

const WIDGET_SELECTOR: &str = "div.g-recaptcha, div[data-sitekey]";
const RESPONSE_FIELD_ID: &str = "g-recaptcha-response";

pub struct InteractiveStrategy {
    solver: Arc<ExternalSolverClient>,
}

impl InteractiveStrategy {
    pub fn new(solver: Arc<ExternalSolverClient>) -> Self {
        Self { solver }
    }
}

#[async_trait::async_trait]
impl CaptchaStrategy for InteractiveStrategy {
    fn name(&self) -> &'static str {
        "interactive"
    }

    async fn applicable(&self, page: &Page) -> Result<bool> {
        Ok(page.find_element(WIDGET_SELECTOR).await.is_ok())
    }

    async fn solve(&self, page: &Page) -> Result<SolveOutcome> {
        let widget = page
            .find_element(WIDGET_SELECTOR)
            .await
            .map_err(|e| AppError::CaptchaFailed(format!("challenge widget not found: {e}")))?;

        let site_key: Option<String> = widget
            .attribute("data-sitekey")
            .await
            .map_err(|e| AppError::CaptchaFailed(format!("failed reading site key: {e}")))?;
        let site_key = site_key
            .ok_or_else(|| AppError::CaptchaFailed("challenge widget missing site key".into()))?;

        let page_url = page
            .url()
            .await
            .map_err(|e| AppError::CaptchaFailed(format!("failed reading page url: {e}")))?
            .ok_or_else(|| AppError::CaptchaFailed("page has no url".into()))?;

        let token = self.solver.solve_challenge(&site_key, &page_url).await?;

        let inject_script = format!(
            r#"
            (() => {{
                const field = document.getElementById('{RESPONSE_FIELD_ID}');
                if (field) {{ field.innerHTML = '{token}'; }}
                if (window.___grecaptcha_cfg) {{
                    Object.values(window.___grecaptcha_cfg.clients).forEach((client) => {{
                        Object.values(client).forEach((prop) => {{
                            if (prop && typeof prop.callback === 'function') {{
                                prop.callback('{token}');
                            }}
                        }});
                    }});
                }}
            }})();
            "#
        );

        page.evaluate(inject_script)
            .await
            .map_err(|e| AppError::CaptchaFailed(format!("failed to inject token: {e}")))?;

        Ok(SolveOutcome {
            solved: true,
            solution: None,
            token: Some(token),
        })
    }
}
