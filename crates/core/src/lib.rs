//! Scrape pipeline for BuyICT procurement opportunities.
//!
//! [`ListingPaginator`] walks the client-rendered search results and collects
//! one [`OpportunitySummary`](tender_protocol::OpportunitySummary) per card.
//! [`DetailExtractor`] visits each opportunity page in its own session.
//! [`Orchestrator`] sequences both, isolates per-opportunity failures and
//! writes the [`RunSnapshot`](tender_protocol::RunSnapshot) through
//! [`SnapshotStore`].
//!
//! Every site-specific selector lives in [`SelectorTable`], so markup changes
//! on the portal are a data change rather than a code change.

pub mod error;
pub mod extractor;
pub mod orchestrator;
pub mod paginator;
pub mod selectors;
pub mod store;
mod text;

pub use error::{Error, ErrorKind, Result};
pub use extractor::{DetailExtractor, parse_detail};
pub use orchestrator::{Orchestrator, RunOptions, RunOutcome, RunPhase, RunReport};
pub use paginator::{ListingPaginator, PaginationReport, PaginationStop, parse_listing};
pub use selectors::{CompiledSelectors, DetailSelectors, ListingSelectors, SelectorTable};
pub use store::{DEFAULT_SNAPSHOT_PATH, SnapshotStore};

/// BuyICT opportunities search page.
pub const DEFAULT_ENTRY_URL: &str = "https://www.buyict.gov.au/sp?id=opportunities";
