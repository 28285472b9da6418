//! The bounded browser pool itself: `acquire`/`release`/`drain` with FIFO
//! waiters, sized `P` (default 3), recycling a session once it has opened
//! `M` (default 20) pages (spec.md §4.4). Structured like the teacher's
//! `ServiceManager` in that it owns background state behind a
//! `tokio::sync::Mutex` and exposes an explicit shutdown path, but the
//! resource being pooled is a browser session rather than a service task.

use std::sync::Arc;

use chromiumoxide::Page;
use tokio::sync::{Mutex, Semaphore, SemaphorePermit};
use tracing::{info, warn};

use crate::error::{AppError, Result};

use super::session::BrowserSession;

pub const DEFAULT_POOL_SIZE: usize = 3;
pub const DEFAULT_RECYCLE_AFTER_PAGES: u32 = 20;

struct Inner {
    sessions: Vec<Option<BrowserSession>>,
    recycle_after_pages: u32,
}

/// A checked-out browser session plus the page opened for the caller.
/// Dropping this guard without calling [`PageGuard::release`] still frees
/// the pool slot (via the held `SemaphorePermit`'s `Drop`), but does not
/// return the session to `Inner` — callers must call `release` or
/// `release_for_recycle` explicitly, mirroring `FileAttachment`-style
/// resource handles elsewhere in this crate that require an explicit
/// disposition rather than relying on `Drop` to pick one.
pub struct PageGuard<'a> {
    pool: &'a BrowserPool,
    slot: usize,
    session: Option<BrowserSession>,
    pub page: Page,
    _permit: SemaphorePermit<'a>,
}

impl<'a> PageGuard<'a> {
    pub fn pages_opened(&self) -> u32 {
        self.session
            .as_ref()
            .map(BrowserSession::pages_opened)
            .unwrap_or(0)
    }

    /// Return the session to the pool, recycling it if it crossed the
    /// page-open threshold, was marked fatal, or `force_recycle` is set
    /// (a `BrowserCrash` retry forces recycle per spec.md §7).
    pub async fn release(mut self, force_recycle: bool) {
        let Some(session) = self.session.take() else {
            return;
        };
        self.pool
            .return_session(self.slot, session, force_recycle)
            .await;
    }
}

pub struct PoolStats {
    pub size: usize,
    pub in_use: usize,
    pub available: usize,
}

pub struct BrowserPool {
    inner: Mutex<Inner>,
    semaphore: Semaphore,
    size: usize,
}

impl BrowserPool {
    pub async fn new(size: usize, recycle_after_pages: u32) -> Result<Self> {
        let mut sessions = Vec::with_capacity(size);
        for _ in 0..size {
            sessions.push(Some(BrowserSession::launch(true).await?));
        }
        Ok(Self {
            inner: Mutex::new(Inner {
                sessions,
                recycle_after_pages,
            }),
            semaphore: Semaphore::new(size),
            size,
        })
    }

    /// Acquire a free slot and open `url` in it. Blocks (FIFO, via the
    /// semaphore's own queueing) until a slot is free.
    pub async fn acquire(&self, url: &str) -> Result<PageGuard<'_>> {
        let permit = self
            .semaphore
            .acquire()
            .await
            .expect("browser pool semaphore is never closed while the pool is alive");

        let mut inner = self.inner.lock().await;
        let slot = inner
            .sessions
            .iter()
            .position(Option::is_some)
            .expect("a free semaphore permit implies a free slot");

        let mut session = inner.sessions[slot]
            .take()
            .expect("slot position found above must hold Some");
        drop(inner);

        let page = match session.new_page(url).await {
            Ok(page) => page,
            Err(e) => {
                session.mark_fatal();
                self.return_session(slot, session, true).await;
                return Err(e);
            }
        };

        Ok(PageGuard {
            pool: self,
            slot,
            session: Some(session),
            page,
            _permit: permit,
        })
    }

    async fn return_session(&self, slot: usize, mut session: BrowserSession, force_recycle: bool) {
        let mut inner = self.inner.lock().await;
        let should_recycle =
            force_recycle || session.fatal || session.pages_opened() >= inner.recycle_after_pages;

        if should_recycle {
            info!(slot, pages_opened = session.pages_opened(), "recycling browser session");
            session.shutdown().await;
            match BrowserSession::launch(true).await {
                Ok(fresh) => inner.sessions[slot] = Some(fresh),
                Err(e) => {
                    warn!(slot, error = %e, "failed to relaunch browser session after recycle");
                    inner.sessions[slot] = None;
                }
            }
        } else {
            inner.sessions[slot] = Some(session);
        }
    }

    pub async fn stats(&self) -> PoolStats {
        let inner = self.inner.lock().await;
        let available = inner.sessions.iter().filter(|s| s.is_some()).count();
        PoolStats {
            size: self.size,
            in_use: self.size - available,
            available,
        }
    }

    /// Shut down every session. Called during graceful shutdown.
    pub async fn drain(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        for slot in inner.sessions.iter_mut() {
            if let Some(session) = slot.take() {
                session.shutdown().await;
            }
        }
        Ok(())
    }
}

pub type SharedBrowserPool = Arc<BrowserPool>;
