//! Synthetic geospatial risk data for insured properties.
//!
//! A [`generator::Generator`] samples locations in configured regions,
//! rejects those off land, scores them against circular risk hotspots,
//! synthesises a claims history for high-risk sites and assembles the
//! [`property::Property`] records a map layer consumes.

pub mod analysis;
pub mod claims;
pub mod config;
pub mod error;
pub mod generator;
pub mod property;
pub mod sampler;
pub mod scoring;
pub mod tables;
pub mod types;
