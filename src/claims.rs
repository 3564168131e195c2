use chrono::{Days, NaiveDate};
use rand::Rng;
use rand_distr::{Bernoulli, Distribution, Uniform};
use serde::{Deserialize, Serialize};

use crate::config::ClaimsConfig;
use crate::error::ConfigError;
use crate::types::{ClaimId, ClaimType};

/// No claim may exceed this share of its property's TIV.
pub const MAX_CLAIM_TIV_FRACTION: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub id: ClaimId,
    /// Calendar date, serialised as `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub amount: f64,
    #[serde(rename = "type")]
    pub claim_type: ClaimType,
}

/// Builds claims histories correlated with risk: only properties scoring
/// strictly above the threshold can have claims, and then only when the
/// secondary gate fires.
pub struct ClaimsSynthesizer {
    risk_threshold: f64,
    gate: Bernoulli,
    count: Uniform<u32>,
    days_ago: Uniform<u32>,
    amount_floor: f64,
    max_tiv_fraction: f64,
}

impl ClaimsSynthesizer {
    pub fn new(config: &ClaimsConfig) -> Result<Self, ConfigError> {
        let gate = Bernoulli::new(config.probability).map_err(|_| ConfigError::InvalidProbability {
            field: "claims.probability",
            value: config.probability,
        })?;
        let count = Uniform::new(config.count.start, config.count.end).map_err(|_| {
            ConfigError::InvalidRange {
                field: "claims.count",
                min: config.count.start as f64,
                max: config.count.end as f64,
            }
        })?;
        let days_ago = Uniform::new(0, config.lookback_days).map_err(|_| ConfigError::InvalidRange {
            field: "claims.lookback_days",
            min: 0.0,
            max: config.lookback_days as f64,
        })?;
        Ok(ClaimsSynthesizer {
            risk_threshold: config.risk_threshold,
            gate,
            count,
            days_ago,
            amount_floor: config.amount_floor,
            max_tiv_fraction: config.max_tiv_fraction,
        })
    }

    /// Largest claim a property with this TIV may carry.
    pub fn amount_cap(&self, tiv: f64) -> f64 {
        tiv * self.max_tiv_fraction
    }

    /// Claims for property number `property_seq`, in insertion order.
    ///
    /// Dates fall within the lookback window ending at `today` (inclusive);
    /// amounts are uniform in [floor, tiv × fraction]. A property whose cap is
    /// below the floor gets no claims.
    pub fn synthesize(
        &self,
        property_seq: u64,
        risk_score: f64,
        tiv: f64,
        today: NaiveDate,
        rng: &mut impl Rng,
    ) -> Vec<Claim> {
        if risk_score <= self.risk_threshold || !self.gate.sample(rng) {
            return Vec::new();
        }
        let cap = self.amount_cap(tiv);
        if cap < self.amount_floor {
            return Vec::new();
        }

        let n = self.count.sample(rng);
        let mut claims = Vec::with_capacity(n as usize);
        for index in 0..n {
            let days_ago = self.days_ago.sample(rng);
            let date = today.checked_sub_days(Days::new(days_ago as u64)).unwrap_or(NaiveDate::MIN);
            let amount = rng.random_range(self.amount_floor..=cap);
            let claim_type = ClaimType::ALL[rng.random_range(0..ClaimType::ALL.len())];
            claims.push(Claim { id: ClaimId::sequential(property_seq, index), date, amount, claim_type });
        }
        claims
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;
    use crate::config::GeneratorConfig;

    fn rng() -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(42)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    fn synthesizer() -> ClaimsSynthesizer {
        ClaimsSynthesizer::new(&GeneratorConfig::canonical().claims).unwrap()
    }

    #[test]
    fn no_claims_at_or_below_threshold() {
        let s = synthesizer();
        let mut rng = rng();
        for _ in 0..2_000 {
            assert!(s.synthesize(1, 50.0, 1_000_000.0, today(), &mut rng).is_empty());
            assert!(s.synthesize(1, 12.5, 1_000_000.0, today(), &mut rng).is_empty());
        }
    }

    /// Above the threshold roughly 40% of properties get claims.
    #[test]
    fn gate_fires_about_forty_percent() {
        let s = synthesizer();
        let mut rng = rng();
        let n = 10_000;
        let with_claims = (0..n)
            .filter(|_| !s.synthesize(1, 80.0, 1_000_000.0, today(), &mut rng).is_empty())
            .count();
        let share = with_claims as f64 / n as f64;
        assert!((0.37..=0.43).contains(&share), "claims share {share:.3} not near 0.4");
    }

    #[test]
    fn claims_respect_count_amount_and_date_bounds() {
        let s = synthesizer();
        let mut rng = rng();
        let tiv = 350_000.0;
        let earliest = today() - Days::new(730);
        let mut counts = HashSet::new();
        for _ in 0..5_000 {
            let claims = s.synthesize(9, 90.0, tiv, today(), &mut rng);
            if claims.is_empty() {
                continue;
            }
            counts.insert(claims.len());
            assert!((1..4).contains(&claims.len()));
            for c in &claims {
                assert!(c.amount >= 1_000.0 && c.amount <= tiv * 0.1, "amount {} out of range", c.amount);
                assert!(c.date > earliest && c.date <= today(), "date {} outside window", c.date);
            }
        }
        assert_eq!(counts, HashSet::from([1, 2, 3]), "every count in [1, 4) should appear");
    }

    #[test]
    fn claim_ids_are_sequential_within_property() {
        let s = synthesizer();
        let mut rng = rng();
        let claims = std::iter::repeat_with(|| s.synthesize(17, 99.0, 1_000_000.0, today(), &mut rng))
            .find(|c| c.len() == 3)
            .unwrap();
        let ids: Vec<String> = claims.iter().map(|c| c.id.to_string()).collect();
        assert_eq!(ids, ["clm-17-0", "clm-17-1", "clm-17-2"]);
    }

    #[test]
    fn cap_below_floor_yields_no_claims() {
        let s = synthesizer();
        let mut rng = rng();
        for _ in 0..500 {
            assert!(s.synthesize(1, 99.0, 5_000.0, today(), &mut rng).is_empty());
        }
    }

    #[test]
    fn claim_serializes_with_iso_date_and_type_key() {
        let claim = Claim {
            id: ClaimId::sequential(3, 1),
            date: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            amount: 1_500.0,
            claim_type: ClaimType::WaterDamage,
        };
        let json = serde_json::to_string(&claim).unwrap();
        assert_eq!(json, r#"{"id":"clm-3-1","date":"2024-02-29","amount":1500.0,"type":"Water Damage"}"#);
    }
}
