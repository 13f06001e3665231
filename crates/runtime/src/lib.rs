//! Browser engine lifecycle and page sessions.
//!
//! The scraper talks to the browser through two narrow traits:
//! [`BrowserEngine`] hands out pages and [`PageDriver`] drives one of them.
//! [`ChromiumEngine`] implements them over a local Chromium via CDP, and
//! [`fake::FakeEngine`] serves canned documents for tests and dry runs.
//!
//! Both engines report request lifecycles to a [`NetworkTracker`], which
//! decides when a page has gone quiet.
//!
//! [`SessionManager`] layers timeouts, network-idle waits and scoped release
//! on top, so callers only ever see a loaded page or a navigation error.

mod browser_finder;
mod chromium;
mod engine;
mod error;
pub mod fake;
mod network;
mod session;

pub use browser_finder::find_chrome_executable;
pub use chromium::{ChromiumEngine, LaunchOptions};
pub use engine::{BrowserEngine, ControlHandle, IdleOptions, NavigationResponse, PageDriver};
pub use error::{Error, Result};
pub use network::{IdleReport, NetworkTracker};
pub use session::{Session, SessionManager, SessionOptions};
