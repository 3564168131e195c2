use std::path::PathBuf;

use thiserror::Error;

use crate::types::{ClaimId, PropertyId};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no regions configured")]
    NoRegions,
    #[error("region {region}: name appears more than once")]
    DuplicateRegion { region: String },
    #[error("region {region}: sampling weights must be finite, non-negative and not all zero")]
    InvalidWeights { region: String },
    #[error("{field}: empty or inverted range [{min}, {max})")]
    InvalidRange { field: &'static str, min: f64, max: f64 },
    #[error("{field}: probability {value} outside [0, 1]")]
    InvalidProbability { field: &'static str, value: f64 },
    #[error("region {region}: variance must be positive (lat {lat}, lon {lon})")]
    InvalidVariance { region: String, lat: f64, lon: f64 },
    #[error("region {region}: street name list is empty")]
    NoStreetNames { region: String },
    #[error("hotspot {index}: radius {radius} must be positive")]
    InvalidHotspotRadius { index: usize, radius: f64 },
    #[error("hotspot {index}: risk boost {boost} must be positive")]
    InvalidHotspotBoost { index: usize, boost: f64 },
    #[error("region {region}: land bounds exclude the whole sampling box")]
    LandUnreachable { region: String },
    #[error(
        "claim floor {floor} exceeds the smallest claim cap {cap} (minimum TIV × max TIV fraction)"
    )]
    ClaimFloorAboveCap { floor: f64, cap: f64 },
    #[error("max attempts per property must be at least 1")]
    NoAttempts,
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The land filter rejected every candidate within the attempt cap. Treated
    /// as a configuration fault: no partial population is returned.
    #[error("land filter rejected {attempts} consecutive candidates (last region: {region})")]
    LandFilterExhausted { region: String, attempts: u32 },
}

/// A record that does not conform to the exported property schema.
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("property {id}: claimsCount {stated} but {actual} claims listed")]
    ClaimsCountMismatch { id: PropertyId, stated: usize, actual: usize },
    #[error("property {id}: totalClaimAmount {stated} but claims sum to {actual}")]
    ClaimTotalMismatch { id: PropertyId, stated: f64, actual: f64 },
    #[error("property {id}: risk score {score} outside [0, 100]")]
    RiskScoreOutOfRange { id: PropertyId, score: f64 },
    #[error("property {id}: tiv {tiv} must be positive")]
    NonPositiveTiv { id: PropertyId, tiv: f64 },
    #[error("property {id}: claim {claim_id} amount {amount} outside (0, {cap}]")]
    ClaimAmountOutOfRange { id: PropertyId, claim_id: ClaimId, amount: f64, cap: f64 },
    #[error("claim {claim_id} references unknown property {property_id}")]
    OrphanClaim { claim_id: ClaimId, property_id: PropertyId },
}
