//! Group profile scoring.
//!
//! Collects per-candidate sub-scores of an order, averages them per
//! factor/subfactor, standardizes them against question code norms and
//! assigns bandings from scoring tables.

pub mod aggregate;
pub mod banding;
pub mod generator;
pub mod percentile;
pub mod types;
pub mod utility;
