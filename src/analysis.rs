use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::GeneratorConfig;
use crate::property::Property;
use crate::scoring::{MAX_RISK_SCORE, MIN_RISK_SCORE};
use crate::types::{ClaimId, PrimaryRisk, PropertyId};

/// Scores strictly above this are high risk.
pub const HIGH_RISK_THRESHOLD: f64 = 75.0;
/// Scores strictly above this (and not high) are medium risk.
pub const MEDIUM_RISK_THRESHOLD: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    pub fn of(score: f64) -> Self {
        if score > HIGH_RISK_THRESHOLD {
            RiskBand::High
        } else if score > MEDIUM_RISK_THRESHOLD {
            RiskBand::Medium
        } else {
            RiskBand::Low
        }
    }
}

/// Aggregate view of a population, restricted to `risk_score >= min_risk`.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioSummary {
    pub min_risk: f64,
    pub count: usize,
    /// Properties in `RiskBand::High`.
    pub high_risk_count: usize,
    pub total_tiv: f64,
    pub properties_with_claims: usize,
    pub claims_count: usize,
    pub total_claim_amount: f64,
    pub by_city: BTreeMap<String, usize>,
    pub by_primary_risk: BTreeMap<PrimaryRisk, usize>,
    pub by_band: BTreeMap<RiskBand, usize>,
}

impl PortfolioSummary {
    pub fn from_properties(properties: &[Property], min_risk: f64) -> Self {
        let mut s = PortfolioSummary {
            min_risk,
            count: 0,
            high_risk_count: 0,
            total_tiv: 0.0,
            properties_with_claims: 0,
            claims_count: 0,
            total_claim_amount: 0.0,
            by_city: BTreeMap::new(),
            by_primary_risk: BTreeMap::new(),
            by_band: BTreeMap::new(),
        };
        for p in properties.iter().filter(|p| p.risk_score >= min_risk) {
            let band = RiskBand::of(p.risk_score);
            s.count += 1;
            if band == RiskBand::High {
                s.high_risk_count += 1;
            }
            s.total_tiv += p.tiv;
            if !p.claims.is_empty() {
                s.properties_with_claims += 1;
            }
            s.claims_count += p.claims_count();
            s.total_claim_amount += p.total_claim_amount();
            *s.by_city.entry(p.city.clone()).or_insert(0) += 1;
            *s.by_primary_risk.entry(p.primary_risk).or_insert(0) += 1;
            *s.by_band.entry(band).or_insert(0) += 1;
        }
        s
    }

    /// Mean TIV of the filtered properties. Zero if none.
    pub fn avg_tiv(&self) -> f64 {
        if self.count == 0 { 0.0 } else { self.total_tiv / self.count as f64 }
    }
}

/// A record that breaks a population invariant.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordViolation {
    DuplicatePropertyId { id: PropertyId },
    RiskScoreOutOfRange { id: PropertyId, score: f64 },
    NonPositiveTiv { id: PropertyId, tiv: f64 },
    YearBuiltOutOfRange { id: PropertyId, year: i32 },
    ClaimAmountOutOfRange { id: PropertyId, claim_id: ClaimId, amount: f64, cap: f64 },
    DuplicateClaimId { id: PropertyId, claim_id: ClaimId },
    OffLand { id: PropertyId, city: String, lon: f64, lat: f64 },
}

impl std::fmt::Display for RecordViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicatePropertyId { id } => write!(f, "DuplicatePropertyId id={id}"),
            Self::RiskScoreOutOfRange { id, score } => write!(f, "RiskScoreOutOfRange id={id} score={score}"),
            Self::NonPositiveTiv { id, tiv } => write!(f, "NonPositiveTiv id={id} tiv={tiv}"),
            Self::YearBuiltOutOfRange { id, year } => write!(f, "YearBuiltOutOfRange id={id} year={year}"),
            Self::ClaimAmountOutOfRange { id, claim_id, amount, cap } => {
                write!(f, "ClaimAmountOutOfRange id={id} claim={claim_id} amount={amount} cap={cap}")
            }
            Self::DuplicateClaimId { id, claim_id } => write!(f, "DuplicateClaimId id={id} claim={claim_id}"),
            Self::OffLand { id, city, lon, lat } => write!(f, "OffLand id={id} city={city} lon={lon} lat={lat}"),
        }
    }
}

/// Check a population, generated or supplied externally, against the record
/// invariants. Limits (year range, claim cap fraction, land bounds) come from
/// `config`; properties whose city matches no configured region skip the land
/// check.
pub fn verify_records(properties: &[Property], config: &GeneratorConfig) -> Vec<RecordViolation> {
    let regions: HashMap<&str, _> = config.regions.iter().map(|r| (r.name.as_str(), r)).collect();
    let mut seen_ids: HashSet<&PropertyId> = HashSet::new();
    let mut violations = Vec::new();

    for p in properties {
        let id = &p.id;
        if !seen_ids.insert(id) {
            violations.push(RecordViolation::DuplicatePropertyId { id: id.clone() });
        }
        if !(MIN_RISK_SCORE..=MAX_RISK_SCORE).contains(&p.risk_score) {
            violations.push(RecordViolation::RiskScoreOutOfRange { id: id.clone(), score: p.risk_score });
        }
        if !(p.tiv > 0.0) {
            violations.push(RecordViolation::NonPositiveTiv { id: id.clone(), tiv: p.tiv });
        }
        if !config.year_built.contains(&p.year_built) {
            violations.push(RecordViolation::YearBuiltOutOfRange { id: id.clone(), year: p.year_built });
        }
        if let Some(region) = regions.get(p.city.as_str())
            && !crate::sampler::is_on_land(region, p.position)
        {
            violations.push(RecordViolation::OffLand {
                id: id.clone(),
                city: p.city.clone(),
                lon: p.position.lon,
                lat: p.position.lat,
            });
        }

        let cap = p.tiv * config.claims.max_tiv_fraction;
        let mut seen_claims: HashSet<&ClaimId> = HashSet::new();
        for c in &p.claims {
            if !seen_claims.insert(&c.id) {
                violations.push(RecordViolation::DuplicateClaimId { id: id.clone(), claim_id: c.id.clone() });
            }
            if !(c.amount > 0.0 && c.amount <= cap) {
                violations.push(RecordViolation::ClaimAmountOutOfRange {
                    id: id.clone(),
                    claim_id: c.id.clone(),
                    amount: c.amount,
                    cap,
                });
            }
        }
    }

    violations
}
