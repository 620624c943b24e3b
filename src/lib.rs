//! # rustscopus
//!
//! Scopus publication harvester - RIS citation export service
//!
//! ## Modules
//!
//! - [`query`] - Search expression and output file name for a year/quarter
//! - [`scopus`] - Scopus API client and search paginator
//! - [`document`] - Raw search entries and the normalized `Document`
//! - [`authors`] - Full author lists from a record's author link
//! - [`abstracts`] - Abstract retrieval by DOI
//! - [`ris`] - RIS citation blocks
//! - [`writer`] - Output stream, tallies and the manual-review list
//! - [`pipeline`] - The harvest run tying it together
//! - [`server`] - HTTP front end
//! - [`config`] - API key and settings
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rustscopus::{config::ScopusConfig, pipeline::Harvester, query::SearchQuery};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let harvester = Harvester::new(ScopusConfig::new("your-api-key"))?;
//!     let outcome = harvester.run(&SearchQuery::annual(2023)).await?;
//!     println!("Wrote {}", outcome.path.display());
//!     Ok(())
//! }
//! ```

pub mod abstracts;
pub mod authors;
pub mod config;
pub mod document;
pub mod error;
pub mod pipeline;
pub mod query;
pub mod ris;
pub mod scopus;
pub mod server;
pub mod writer;

pub use error::{Result, ScopusError};
