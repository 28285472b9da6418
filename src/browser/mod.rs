//! BrowserPool (spec.md §4.4): a bounded pool of Chromium sessions shared
//! by the Worker fleet. Grounded on the teacher's
//! `banner::session::SessionManager` (expiry-driven lifecycle, one shared
//! resource guarded by interior mutability) generalized from a single
//! cookie-jar session to a pool of real browser processes via
//! `chromiumoxide`, since this engine drives an actual rendered page
//! rather than a REST API.

pub mod pool;
pub mod session;
pub mod stealth;

pub use pool::{BrowserPool, PageGuard, PoolStats};
pub use session::BrowserSession;
