use rand::Rng;
use rand_distr::{Bernoulli, Distribution, Uniform};

use crate::config::{Hotspot, LabelPolicy, RiskConfig};
use crate::error::ConfigError;
use crate::types::{Position, PrimaryRisk};

pub const MIN_RISK_SCORE: f64 = 0.0;
pub const MAX_RISK_SCORE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskAssessment {
    /// Uniform base draw.
    pub base: f64,
    /// Sum of hotspot contributions, before clamping.
    pub boost: f64,
    /// `base + boost` clamped to [0, 100].
    pub score: f64,
    pub primary_risk: PrimaryRisk,
}

/// Contribution of `hotspot` at `position`, or `None` outside its radius.
/// Falls linearly from the full boost at the centre to zero at the radius.
pub fn hotspot_falloff(hotspot: &Hotspot, position: Position) -> Option<f64> {
    let dist = position.distance(hotspot.center);
    (dist < hotspot.radius).then(|| hotspot.risk_boost * (1.0 - dist / hotspot.radius))
}

pub struct RiskScorer {
    base: Uniform<f64>,
    label_roll: Bernoulli,
    policy: LabelPolicy,
}

impl RiskScorer {
    pub fn new(config: &RiskConfig) -> Result<Self, ConfigError> {
        let base = Uniform::new(config.base.start, config.base.end).map_err(|_| {
            ConfigError::InvalidRange { field: "risk.base", min: config.base.start, max: config.base.end }
        })?;
        let label_roll = Bernoulli::new(config.label_probability).map_err(|_| {
            ConfigError::InvalidProbability {
                field: "risk.label_probability",
                value: config.label_probability,
            }
        })?;
        Ok(RiskScorer { base, label_roll, policy: config.label_policy })
    }

    /// Score a location against every hotspot. Overlapping hotspots add up;
    /// each triggering hotspot rolls independently for the primary-risk label.
    /// The label policy only decides between successful rolls, so every
    /// policy consumes the same random draws.
    pub fn assess(&self, hotspots: &[Hotspot], position: Position, rng: &mut impl Rng) -> RiskAssessment {
        let base = self.base.sample(rng);
        let mut boost = 0.0;
        let mut label: Option<(PrimaryRisk, f64)> = None;

        for hotspot in hotspots {
            let Some(contribution) = hotspot_falloff(hotspot, position) else {
                continue;
            };
            boost += contribution;
            if !self.label_roll.sample(rng) {
                continue;
            }
            let rolled = (PrimaryRisk::from(hotspot.peril), contribution);
            label = match (self.policy, label) {
                (_, None) | (LabelPolicy::LastRolled, _) => Some(rolled),
                (LabelPolicy::FirstRolled, kept) => kept,
                (LabelPolicy::HighestBoost, Some(best)) => {
                    if contribution > best.1 { Some(rolled) } else { Some(best) }
                }
            };
        }

        RiskAssessment {
            base,
            boost,
            score: (base + boost).max(MIN_RISK_SCORE).min(MAX_RISK_SCORE),
            primary_risk: label.map_or(PrimaryRisk::General, |(risk, _)| risk),
        }
    }
}
