//! CaptchaChain (spec.md §4.5): a `Strategy` trait object chain tried in
//! order, first applicable-and-successful wins. Generalizes the teacher's
//! `scraper::jobs::Job` trait-object dispatch pattern (one trait, several
//! concrete implementations, a thin dispatcher enum/vec picking among
//! them) from "one job type per target" to "one CAPTCHA strategy per
//! mechanism the Portal might present".

pub mod audio;
pub mod image;
pub mod interactive;
pub mod solver;

use chromiumoxide::Page;

use crate::error::Result;

/// Outcome of a single strategy attempt.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub solved: bool,
    pub solution: Option<String>,
    pub token: Option<String>,
}

impl SolveOutcome {
    pub fn unsolved() -> Self {
        Self {
            solved: false,
            solution: None,
            token: None,
        }
    }
}

#[async_trait::async_trait]
pub trait CaptchaStrategy: Send + Sync {
    /// Human-readable name, used in logging and `JobLogEntry` context.
    fn name(&self) -> &'static str;

    /// Whether this strategy's CAPTCHA mechanism is present on `page`.
    async fn applicable(&self, page: &Page) -> Result<bool>;

    /// Attempt to solve. Only called when `applicable` returned `true`.
    async fn solve(&self, page: &Page) -> Result<SolveOutcome>;
}

/// Tries strategies in order, returning the first successful solve.
/// Audio is listed first per spec.md §4.5 ("fastest, preferred").
pub struct CaptchaChain {
    strategies: Vec<Box<dyn CaptchaStrategy>>,
}

impl CaptchaChain {
    pub fn new(strategies: Vec<Box<dyn CaptchaStrategy>>) -> Self {
        Self { strategies }
    }

    /// Standard chain: audio, then image, then interactive-challenge.
    pub fn standard(solver: std::sync::Arc<solver::ExternalSolverClient>) -> Self {
        Self::new(vec![
            Box::new(audio::AudioStrategy::new(solver.clone())),
            Box::new(image::ImageStrategy::new(solver.clone())),
            Box::new(interactive::InteractiveStrategy::new(solver)),
        ])
    }

    /// Run the chain against `page`. Tries each applicable strategy in
    /// order, moving on to the next on an unsolved outcome (spec.md §4.5:
    /// first applicable-*and-successful* wins). Returns `Ok(None)` if no
    /// strategy was applicable at all, or `Ok(Some(outcome))` with the
    /// last attempted outcome once every applicable strategy has been
    /// tried, whether or not it solved.
    pub async fn run(&self, page: &Page) -> Result<Option<SolveOutcome>> {
        let mut last_outcome = None;
        for strategy in &self.strategies {
            if strategy.applicable(page).await? {
                let outcome = strategy.solve(page).await?;
                tracing::debug!(strategy = strategy.name(), solved = outcome.solved, "captcha strategy attempted");
                if outcome.solved {
                    return Ok(Some(outcome));
                }
                last_outcome = Some(outcome);
            }
        }
        Ok(last_outcome)
    }
}
