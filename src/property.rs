use rand::Rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize, Serializer};

use crate::claims::{Claim, MAX_CLAIM_TIV_FRACTION};
use crate::config::{GeneratorConfig, Region};
use crate::error::{ConfigError, RecordError};
use crate::scoring::{MAX_RISK_SCORE, MIN_RISK_SCORE, RiskAssessment};
use crate::types::{Position, PrimaryRisk, PropertyId};

/// One insured location, the unit of output.
///
/// `claimsCount` and `totalClaimAmount` are not stored: they are derived from
/// `claims` whenever the record is serialised, and checked against it when a
/// record is decoded.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "PropertyRecord")]
pub struct Property {
    pub id: PropertyId,
    pub position: Position,
    pub address: String,
    pub tiv: f64,
    pub risk_score: f64,
    pub primary_risk: PrimaryRisk,
    pub year_built: i32,
    pub claims: Vec<Claim>,
    pub city: String,
}

impl Property {
    pub fn claims_count(&self) -> usize {
        self.claims.len()
    }

    pub fn total_claim_amount(&self) -> f64 {
        self.claims.iter().map(|c| c.amount).sum()
    }
}

/// Borrowed wire view used for serialisation.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PropertyView<'a> {
    id: &'a PropertyId,
    position: Position,
    address: &'a str,
    tiv: f64,
    risk_score: f64,
    primary_risk: PrimaryRisk,
    year_built: i32,
    claims: &'a [Claim],
    claims_count: usize,
    total_claim_amount: f64,
    city: &'a str,
}

impl Serialize for Property {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        PropertyView {
            id: &self.id,
            position: self.position,
            address: &self.address,
            tiv: self.tiv,
            risk_score: self.risk_score,
            primary_risk: self.primary_risk,
            year_built: self.year_built,
            claims: &self.claims,
            claims_count: self.claims_count(),
            total_claim_amount: self.total_claim_amount(),
            city: &self.city,
        }
        .serialize(serializer)
    }
}

/// Property as it appears on the wire, including the derived fields. Records
/// from an external source decode through this and must agree with their own
/// claims list. Decoding also enforces the bounds every `Property` holds: risk
/// score in [0, 100], positive TIV, and claim amounts in (0, 10% of TIV].
/// Config-dependent limits (year built, land) are left to `verify_records`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRecord {
    pub id: PropertyId,
    pub position: Position,
    pub address: String,
    pub tiv: f64,
    pub risk_score: f64,
    pub primary_risk: PrimaryRisk,
    pub year_built: i32,
    #[serde(default)]
    pub claims: Vec<Claim>,
    pub claims_count: usize,
    pub total_claim_amount: f64,
    pub city: String,
}

/// Totals summed in a different order can differ in the last bits.
fn amounts_agree(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * a.abs().max(b.abs()).max(1.0)
}

impl TryFrom<PropertyRecord> for Property {
    type Error = RecordError;

    fn try_from(r: PropertyRecord) -> Result<Self, Self::Error> {
        if r.claims_count != r.claims.len() {
            return Err(RecordError::ClaimsCountMismatch {
                id: r.id,
                stated: r.claims_count,
                actual: r.claims.len(),
            });
        }
        let actual: f64 = r.claims.iter().map(|c| c.amount).sum();
        if !amounts_agree(r.total_claim_amount, actual) {
            return Err(RecordError::ClaimTotalMismatch { id: r.id, stated: r.total_claim_amount, actual });
        }
        if !(MIN_RISK_SCORE..=MAX_RISK_SCORE).contains(&r.risk_score) {
            return Err(RecordError::RiskScoreOutOfRange { id: r.id, score: r.risk_score });
        }
        if !(r.tiv > 0.0 && r.tiv.is_finite()) {
            return Err(RecordError::NonPositiveTiv { id: r.id, tiv: r.tiv });
        }
        let cap = r.tiv * MAX_CLAIM_TIV_FRACTION;
        if let Some(c) = r.claims.iter().find(|c| !(c.amount > 0.0 && c.amount <= cap)) {
            return Err(RecordError::ClaimAmountOutOfRange {
                id: r.id,
                claim_id: c.id.clone(),
                amount: c.amount,
                cap,
            });
        }
        Ok(Property {
            id: r.id,
            position: r.position,
            address: r.address,
            tiv: r.tiv,
            risk_score: r.risk_score,
            primary_risk: r.primary_risk,
            year_built: r.year_built,
            claims: r.claims,
            city: r.city,
        })
    }
}

/// Packages a scored, valued location into a `Property`, drawing the address
/// and year built.
pub struct RecordAssembler {
    house_number: Uniform<u32>,
    year_built: Uniform<i32>,
}

impl RecordAssembler {
    pub fn new(config: &GeneratorConfig) -> Result<Self, ConfigError> {
        let (lo, hi) = (*config.house_number.start(), *config.house_number.end());
        let house_number = Uniform::new_inclusive(lo, hi).map_err(|_| ConfigError::InvalidRange {
            field: "house_number",
            min: lo as f64,
            max: hi as f64,
        })?;
        let year_built =
            Uniform::new(config.year_built.start, config.year_built.end).map_err(|_| {
                ConfigError::InvalidRange {
                    field: "year_built",
                    min: config.year_built.start as f64,
                    max: config.year_built.end as f64,
                }
            })?;
        Ok(RecordAssembler { house_number, year_built })
    }

    /// `{number} {street}` followed by the region's suffix, if any.
    pub fn address(&self, region: &Region, rng: &mut impl Rng) -> String {
        let number = self.house_number.sample(rng);
        let street = &region.street_names[rng.random_range(0..region.street_names.len())];
        match &region.street_suffix {
            Some(suffix) => format!("{number} {street} {suffix}"),
            None => format!("{number} {street}"),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn assemble(
        &self,
        seq: u64,
        region: &Region,
        position: Position,
        risk: &RiskAssessment,
        tiv: f64,
        claims: Vec<Claim>,
        rng: &mut impl Rng,
    ) -> Property {
        let address = self.address(region, rng);
        let year_built = self.year_built.sample(rng);
        Property {
            id: PropertyId::sequential(seq),
            position,
            address,
            tiv,
            risk_score: risk.score,
            primary_risk: risk.primary_risk,
            year_built,
            claims,
            city: region.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;
    use crate::types::{ClaimId, ClaimType};

    fn rng() -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(42)
    }

    fn claim(index: u32, amount: f64) -> Claim {
        Claim {
            id: ClaimId::sequential(1, index),
            date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            amount,
            claim_type: ClaimType::Burglary,
        }
    }

    fn sample_property() -> Property {
        Property {
            id: PropertyId::sequential(1),
            position: Position::new(-0.1, 51.5),
            address: "12 High St".to_string(),
            tiv: 1_000_000.0,
            risk_score: 72.5,
            primary_risk: PrimaryRisk::Flood,
            year_built: 1965,
            claims: vec![claim(0, 2_000.0), claim(1, 3_500.0)],
            city: "London".to_string(),
        }
    }

    #[test]
    fn serialized_record_has_camel_case_keys_and_derived_fields() {
        let v = serde_json::to_value(sample_property()).unwrap();
        assert_eq!(v["id"], "prop-1");
        assert_eq!(v["position"], serde_json::json!([-0.1, 51.5]));
        assert_eq!(v["riskScore"], 72.5);
        assert_eq!(v["primaryRisk"], "Flood");
        assert_eq!(v["yearBuilt"], 1965);
        assert_eq!(v["claimsCount"], 2);
        assert_eq!(v["totalClaimAmount"], 5_500.0);
        assert_eq!(v["city"], "London");
        assert_eq!(v["claims"][1]["id"], "clm-1-1");
    }

    #[test]
    fn record_decodes_back_to_property() {
        let p = sample_property();
        let json = serde_json::to_string(&p).unwrap();
        let back: Property = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn record_with_wrong_claims_count_rejected() {
        let mut v = serde_json::to_value(sample_property()).unwrap();
        v["claimsCount"] = serde_json::json!(5);
        let err = serde_json::from_value::<Property>(v).unwrap_err();
        assert!(err.to_string().contains("claimsCount 5"), "got: {err}");
    }

    #[test]
    fn record_with_wrong_total_rejected() {
        let mut v = serde_json::to_value(sample_property()).unwrap();
        v["totalClaimAmount"] = serde_json::json!(9_999.0);
        let err = serde_json::from_value::<Property>(v).unwrap_err();
        assert!(err.to_string().contains("totalClaimAmount"), "got: {err}");
    }

    #[test]
    fn record_with_out_of_range_risk_score_rejected() {
        let mut v = serde_json::to_value(sample_property()).unwrap();
        v["riskScore"] = serde_json::json!(250.0);
        let err = serde_json::from_value::<Property>(v).unwrap_err();
        assert!(err.to_string().contains("risk score 250"), "got: {err}");
    }

    #[test]
    fn record_with_non_positive_tiv_rejected() {
        let mut v = serde_json::to_value(sample_property()).unwrap();
        v["tiv"] = serde_json::json!(-5.0);
        let err = serde_json::from_value::<Property>(v).unwrap_err();
        assert!(err.to_string().contains("tiv -5"), "got: {err}");
    }

    #[test]
    fn record_with_claim_above_cap_rejected() {
        let mut p = sample_property();
        p.claims.push(claim(2, 99_999_999.0));
        let err = serde_json::from_value::<Property>(serde_json::to_value(&p).unwrap()).unwrap_err();
        assert!(err.to_string().contains("claim clm-1-2 amount 99999999"), "got: {err}");

        // Exactly 10% of TIV is allowed.
        let mut p = sample_property();
        p.claims.push(claim(2, 100_000.0));
        let back: Property = serde_json::from_value(serde_json::to_value(&p).unwrap()).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn record_without_claims_key_decodes_empty() {
        let mut v = serde_json::to_value(sample_property()).unwrap();
        let obj = v.as_object_mut().unwrap();
        obj.remove("claims");
        obj.insert("claimsCount".into(), 0.into());
        obj.insert("totalClaimAmount".into(), 0.0.into());
        let p: Property = serde_json::from_value(v).unwrap();
        assert!(p.claims.is_empty());
        assert_eq!(p.total_claim_amount(), 0.0);
    }

    #[test]
    fn addresses_follow_region_vocabulary() {
        let config = GeneratorConfig::canonical();
        let assembler = RecordAssembler::new(&config).unwrap();
        let (sf, london) = (&config.regions[0], &config.regions[1]);
        let mut rng = rng();
        for _ in 0..500 {
            let a = assembler.address(sf, &mut rng);
            let (number, rest) = a.split_once(' ').unwrap();
            let number: u32 = number.parse().unwrap();
            assert!((1..=9999).contains(&number));
            assert!(rest.ends_with(" St"), "SF address {a:?} missing suffix");
            assert!(sf.street_names.iter().any(|s| rest == format!("{s} St")));

            let a = assembler.address(london, &mut rng);
            let (_, rest) = a.split_once(' ').unwrap();
            assert!(london.street_names.iter().any(|s| s == rest), "unexpected London street {rest:?}");
        }
    }

    #[test]
    fn assemble_copies_inputs_and_draws_year() {
        let config = GeneratorConfig::canonical();
        let assembler = RecordAssembler::new(&config).unwrap();
        let risk = RiskAssessment { base: 30.0, boost: 10.0, score: 40.0, primary_risk: PrimaryRisk::General };
        let p = assembler.assemble(
            42,
            &config.regions[1],
            Position::new(-0.12, 51.49),
            &risk,
            750_000.0,
            Vec::new(),
            &mut rng(),
        );
        assert_eq!(p.id.to_string(), "prop-42");
        assert_eq!(p.city, "London");
        assert_eq!(p.risk_score, 40.0);
        assert_eq!(p.tiv, 750_000.0);
        assert!((1900..2023).contains(&p.year_built));
        assert_eq!(p.claims_count(), 0);
    }
}
