//! Polygon.io REST provider.
//!
//! Implements [`DataProvider`](crate::providers::DataProvider) over the
//! aggregates endpoint and exposes the reference endpoints the pipeline needs
//! beyond bars: ticker details, the gainers snapshot, and ticker news.

pub mod params;
pub mod provider;
pub mod response;

pub use params::{PolygonBarsParams, Sort};
pub use provider::PolygonProvider;
pub use response::{NewsArticle, SnapshotAgg, TickerDetails, TickerSnapshot};
