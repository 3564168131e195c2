use chrono::NaiveDate;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rand_distr::{Distribution, Uniform};

use crate::claims::ClaimsSynthesizer;
use crate::config::GeneratorConfig;
use crate::error::{ConfigError, GenerateError};
use crate::property::{Property, RecordAssembler};
use crate::sampler::{self, Candidate, RegionSampler};
use crate::scoring::RiskScorer;

/// Rejection share above which a finished batch logs a warning.
const HIGH_REJECTION_RATE: f64 = 0.5;

/// Batch generator over an immutable configuration.
///
/// Holds no mutable state: one `Generator` can serve any number of
/// independent batches, each driven by its own random source.
pub struct Generator {
    config: GeneratorConfig,
    sampler: RegionSampler,
    scorer: RiskScorer,
    claims: ClaimsSynthesizer,
    assembler: RecordAssembler,
    tiv: Uniform<f64>,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let tiv = Uniform::new(config.tiv.start, config.tiv.end).map_err(|_| {
            ConfigError::InvalidRange { field: "tiv", min: config.tiv.start, max: config.tiv.end }
        })?;
        Ok(Generator {
            sampler: RegionSampler::new(&config.regions)?,
            scorer: RiskScorer::new(&config.risk)?,
            claims: ClaimsSynthesizer::new(&config.claims)?,
            assembler: RecordAssembler::new(&config)?,
            tiv,
            config,
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Draw candidates until one passes the land filter. Gives up after
    /// `max_attempts_per_property` consecutive rejections.
    fn sample_on_land(&self, rng: &mut impl Rng, rejected: &mut u64) -> Result<Candidate, GenerateError> {
        let max_attempts = self.config.max_attempts_per_property;
        let mut last_region = 0;
        for _ in 0..max_attempts {
            let candidate = self.sampler.sample(rng);
            if sampler::is_on_land(&self.config.regions[candidate.region], candidate.position) {
                return Ok(candidate);
            }
            last_region = candidate.region;
            *rejected += 1;
        }
        Err(GenerateError::LandFilterExhausted {
            region: self.config.regions[last_region].name.clone(),
            attempts: max_attempts,
        })
    }

    /// Generate exactly `count` properties, ids `prop-1..=prop-count` in
    /// acceptance order. Claim dates are relative to `today`.
    ///
    /// All or nothing: on error no properties are returned.
    pub fn generate(
        &self,
        count: usize,
        today: NaiveDate,
        rng: &mut impl Rng,
    ) -> Result<Vec<Property>, GenerateError> {
        let mut properties = Vec::with_capacity(count);
        let mut rejected = 0u64;

        while properties.len() < count {
            let candidate = self.sample_on_land(rng, &mut rejected)?;
            let seq = properties.len() as u64 + 1;
            let region = &self.config.regions[candidate.region];

            let risk = self.scorer.assess(&self.config.hotspots, candidate.position, rng);
            let tiv = self.tiv.sample(rng);
            let claims = self.claims.synthesize(seq, risk.score, tiv, today, rng);
            properties.push(self.assembler.assemble(seq, region, candidate.position, &risk, tiv, claims, rng));
        }

        let drawn = count as u64 + rejected;
        let rejection_rate = if drawn == 0 { 0.0 } else { rejected as f64 / drawn as f64 };
        log::debug!("land filter rejected {rejected} of {drawn} candidates");
        if rejection_rate > HIGH_REJECTION_RATE {
            log::warn!(
                "land filter rejected {:.1}% of candidates; check region land bounds",
                rejection_rate * 100.0
            );
        }
        log::info!("generated {count} properties");
        Ok(properties)
    }

    /// Seeded convenience: same seed, config and `today` give the same batch.
    pub fn generate_seeded(&self, count: usize, today: NaiveDate, seed: u64) -> Result<Vec<Property>, GenerateError> {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        self.generate(count, today, &mut rng)
    }
}
