//! Reporting over already-fetched collections: filtering by period and
//! service subtree, aggregation and CSV export.

pub mod aggregator;
pub mod export;
