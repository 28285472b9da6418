//! Error classification shared by the Worker, JobStore, and Repository.
//!
//! Mirrors the split the Banner client uses (`BannerApiError` for
//! well-understood failure modes, `anyhow::Error` for everything flowing
//! in from collaborators) but adds the retry/disposition classification
//! spec'd for this engine's job pipeline.

use thiserror::Error;

/// Classification of a job-processing failure, independent of the
/// concrete error type that produced it. Drives JobStore retry policy and
/// Snapshot bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    CaptchaFailed,
    PortalUnreachable,
    BotDetected,
    InvalidCaseNumber,
    BrowserCrash,
    ValidationFailed,
    Timeout,
    SolverApi,
    ObjectStoreFailure,
    RepositoryFailure,
    Unknown,
}

impl ErrorKind {
    /// Whether a job that failed with this kind should be retried
    /// (subject to `maxAttempts`).
    pub fn retryable(self) -> bool {
        match self {
            ErrorKind::CaptchaFailed
            | ErrorKind::PortalUnreachable
            | ErrorKind::BotDetected
            | ErrorKind::BrowserCrash
            | ErrorKind::Timeout
            | ErrorKind::SolverApi
            | ErrorKind::RepositoryFailure
            | ErrorKind::Unknown => true,
            ErrorKind::InvalidCaseNumber | ErrorKind::ValidationFailed => false,
            ErrorKind::ObjectStoreFailure => false,
        }
    }

    /// A retry of this kind forces the worker to recycle its browser
    /// session rather than reuse it.
    pub fn forces_session_recycle(self) -> bool {
        matches!(self, ErrorKind::BrowserCrash)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::CaptchaFailed => "CaptchaFailed",
            ErrorKind::PortalUnreachable => "PortalUnreachable",
            ErrorKind::BotDetected => "BotDetected",
            ErrorKind::InvalidCaseNumber => "InvalidCaseNumber",
            ErrorKind::BrowserCrash => "BrowserCrash",
            ErrorKind::ValidationFailed => "ValidationFailed",
            ErrorKind::Timeout => "Timeout",
            ErrorKind::SolverApi => "SolverApi",
            ErrorKind::ObjectStoreFailure => "ObjectStoreFailure",
            ErrorKind::RepositoryFailure => "RepositoryFailure",
            ErrorKind::Unknown => "Unknown",
        }
    }
}

/// The error type returned by core-engine operations (Worker, CaptchaChain,
/// BrowserPool, Repository). Carries enough to classify without
/// re-inspecting the error chain at every call site.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("CAPTCHA strategies exhausted: {0}")]
    CaptchaFailed(String),

    #[error("Portal unreachable: {0}")]
    PortalUnreachable(String),

    #[error("antibot interposition persisted after retries: {0}")]
    BotDetected(String),

    #[error("case number not found on Portal")]
    InvalidCaseNumber,

    #[error("browser session crashed or became unresponsive: {0}")]
    BrowserCrash(String),

    #[error("extraction failed validation: {0}")]
    ValidationFailed(String),

    #[error("operation timed out: {0}")]
    Timeout(String),

    #[error("CAPTCHA solver API failure: {0}")]
    SolverApi(String),

    #[error("object store failure: {0}")]
    ObjectStoreFailure(String),

    #[error("repository failure: {0}")]
    RepositoryFailure(#[from] sqlx::Error),

    #[error("unexpected error: {0}")]
    Unknown(#[from] anyhow::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::CaptchaFailed(_) => ErrorKind::CaptchaFailed,
            AppError::PortalUnreachable(_) => ErrorKind::PortalUnreachable,
            AppError::BotDetected(_) => ErrorKind::BotDetected,
            AppError::InvalidCaseNumber => ErrorKind::InvalidCaseNumber,
            AppError::BrowserCrash(_) => ErrorKind::BrowserCrash,
            AppError::ValidationFailed(_) => ErrorKind::ValidationFailed,
            AppError::Timeout(_) => ErrorKind::Timeout,
            AppError::SolverApi(_) => ErrorKind::SolverApi,
            AppError::ObjectStoreFailure(_) => ErrorKind::ObjectStoreFailure,
            AppError::RepositoryFailure(_) => ErrorKind::RepositoryFailure,
            AppError::Unknown(_) => ErrorKind::Unknown,
        }
    }

    pub fn retryable(&self) -> bool {
        self.kind().retryable()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_case_number_is_terminal() {
        assert!(!ErrorKind::InvalidCaseNumber.retryable());
        assert!(!ErrorKind::ValidationFailed.retryable());
    }

    #[test]
    fn transient_kinds_retry() {
        for kind in [
            ErrorKind::CaptchaFailed,
            ErrorKind::PortalUnreachable,
            ErrorKind::BotDetected,
            ErrorKind::BrowserCrash,
            ErrorKind::Timeout,
            ErrorKind::RepositoryFailure,
            ErrorKind::Unknown,
        ] {
            assert!(kind.retryable());
        }
    }

    #[test]
    fn only_browser_crash_forces_recycle() {
        assert!(ErrorKind::BrowserCrash.forces_session_recycle());
        assert!(!ErrorKind::CaptchaFailed.forces_session_recycle());
    }
}
