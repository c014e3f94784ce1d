//! Country Feed Adapter
//!
//! The only component that talks to the external feeds. It fetches the
//! country reference list and the USD exchange-rate table, checks that each
//! payload has the expected shape, and reports failures as [`SourceError`]
//! tagged with the feed that failed.
//!
//! Features:
//! - [`CountrySource`] trait so the refresh pipeline can run against a
//!   substitute source in tests
//! - [`HttpCountrySource`] backed by `reqwest`
//! - [`fetch_feeds`] runs both fetches concurrently with a per-feed timeout
//!   and cancels the survivor when one fails

pub mod error;
pub mod http;
pub mod source;

pub use error::{Feed, Result, SourceError};
pub use http::HttpCountrySource;
pub use source::{fetch_feeds, CountrySource, FeedSnapshot};
