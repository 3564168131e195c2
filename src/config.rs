use std::collections::HashSet;
use std::ops::{Range, RangeInclusive};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::claims::MAX_CLAIM_TIV_FRACTION;
use crate::error::ConfigError;
use crate::types::{Peril, Position};

/// Axis-aligned area a region's properties must fall inside. Each bound is
/// optional; a candidate west of `west`, east of `east`, south of `south` or
/// north of `north` is off land.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LandBounds {
    pub west: Option<f64>,
    pub east: Option<f64>,
    pub south: Option<f64>,
    pub north: Option<f64>,
}

impl LandBounds {
    pub fn contains(&self, p: Position) -> bool {
        !(self.west.is_some_and(|w| p.lon < w)
            || self.east.is_some_and(|e| p.lon > e)
            || self.south.is_some_and(|s| p.lat < s)
            || self.north.is_some_and(|n| p.lat > n))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// City label written to every property sampled in this region.
    pub name: String,
    pub center: Position,
    /// Half-widths of the sampling box around `center`, in degrees.
    pub lat_variance: f64,
    pub lon_variance: f64,
    /// Relative selection weight.
    pub weight: f64,
    /// `None` accepts every candidate.
    pub land: Option<LandBounds>,
    pub street_names: Vec<String>,
    pub street_suffix: Option<String>,
}

impl Region {
    /// (west, east, south, north) of the sampling box.
    pub fn sampling_box(&self) -> (f64, f64, f64, f64) {
        (
            self.center.lon - self.lon_variance,
            self.center.lon + self.lon_variance,
            self.center.lat - self.lat_variance,
            self.center.lat + self.lat_variance,
        )
    }

    /// True when some part of the sampling box with non-zero area lies on land.
    pub fn land_reachable(&self) -> bool {
        let Some(land) = self.land else {
            return true;
        };
        let (w, e, s, n) = self.sampling_box();
        let w = land.west.map_or(w, |b| b.max(w));
        let e = land.east.map_or(e, |b| b.min(e));
        let s = land.south.map_or(s, |b| b.max(s));
        let n = land.north.map_or(n, |b| b.min(n));
        w < e && s < n
    }
}

/// Circular zone of elevated risk with a linear falloff to zero at `radius`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub center: Position,
    /// Same units as coordinates (degrees).
    pub radius: f64,
    /// Boost at the centre.
    pub risk_boost: f64,
    pub peril: Peril,
}

/// Which hotspot's peril becomes the primary risk when several roll successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LabelPolicy {
    /// Last successful hotspot in iteration order.
    #[default]
    LastRolled,
    FirstRolled,
    /// Successful hotspot with the largest realised boost; earlier wins ties.
    HighestBoost,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Uniform base score before hotspot contributions.
    pub base: Range<f64>,
    /// Chance each triggering hotspot claims the primary-risk label.
    pub label_probability: f64,
    pub label_policy: LabelPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimsConfig {
    /// Claims are only possible when the risk score is strictly above this.
    pub risk_threshold: f64,
    /// Chance a property above the threshold has any claims.
    pub probability: f64,
    /// Number of claims once triggered, upper bound exclusive.
    pub count: Range<u32>,
    pub amount_floor: f64,
    /// Claim amounts are capped at this fraction of the property's TIV.
    pub max_tiv_fraction: f64,
    /// Claim dates fall within this many days before "today".
    pub lookback_days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub regions: Vec<Region>,
    pub hotspots: Vec<Hotspot>,
    pub tiv: Range<f64>,
    pub year_built: Range<i32>,
    pub house_number: RangeInclusive<u32>,
    pub risk: RiskConfig,
    pub claims: ClaimsConfig,
    /// Consecutive land-filter rejections tolerated before giving up.
    pub max_attempts_per_property: u32,
}

fn streets(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl GeneratorConfig {
    pub fn canonical() -> Self {
        // ── Regions ───────────────────────────────────────────────────────────
        // San Francisco excludes the bay to the east and north and the ocean to
        // the west. London has no exclusion.
        let san_francisco = Region {
            name: "San Francisco".to_string(),
            center: Position::new(-122.4194, 37.7749),
            lat_variance: 0.1,
            lon_variance: 0.1,
            weight: 1.0,
            land: Some(LandBounds {
                west: Some(-122.51),
                east: Some(-122.39),
                south: None,
                north: Some(37.81),
            }),
            street_names: streets(&["Market", "Mission", "Valencia", "Geary", "California", "Powell"]),
            street_suffix: Some("St".to_string()),
        };

        let london = Region {
            name: "London".to_string(),
            center: Position::new(-0.1278, 51.5074),
            lat_variance: 0.1,
            lon_variance: 0.1,
            weight: 1.0,
            land: None,
            street_names: streets(&["High St", "Station Rd", "London Rd", "Church St", "Main St", "Park Rd"]),
            street_suffix: None,
        };

        GeneratorConfig {
            regions: vec![san_francisco, london],
            // ── Hotspots ──────────────────────────────────────────────────────
            hotspots: vec![
                Hotspot {
                    center: Position::new(-122.45, 37.75),
                    radius: 0.03,
                    risk_boost: 40.0,
                    peril: Peril::Flood,
                },
                Hotspot {
                    center: Position::new(-122.40, 37.80),
                    radius: 0.02,
                    risk_boost: 30.0,
                    peril: Peril::Fire,
                },
                // Near the Thames
                Hotspot {
                    center: Position::new(-0.11, 51.50),
                    radius: 0.02,
                    risk_boost: 45.0,
                    peril: Peril::Flood,
                },
                // City of London
                Hotspot {
                    center: Position::new(-0.09, 51.51),
                    radius: 0.015,
                    risk_boost: 35.0,
                    peril: Peril::Theft,
                },
            ],
            tiv: 200_000.0..5_000_000.0,
            year_built: 1900..2023,
            house_number: 1..=9999,
            risk: RiskConfig {
                base: 10.0..60.0,
                label_probability: 0.5,
                label_policy: LabelPolicy::LastRolled,
            },
            claims: ClaimsConfig {
                risk_threshold: 50.0,
                probability: 0.4,
                count: 1..4,
                amount_floor: 1_000.0,
                max_tiv_fraction: 0.1,
                lookback_days: 730,
            },
            max_attempts_per_property: 10_000,
        }
    }

    /// Load a JSON config and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let config: GeneratorConfig = serde_json::from_str(&text)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the generator cannot sample from.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.regions.is_empty() {
            return Err(ConfigError::NoRegions);
        }
        let total_weight: f64 = self.regions.iter().map(|r| r.weight).sum();
        let mut names = HashSet::new();
        for region in &self.regions {
            // Records carry only the region name, so it must identify the region.
            if !names.insert(region.name.as_str()) {
                return Err(ConfigError::DuplicateRegion { region: region.name.clone() });
            }
            if !region.weight.is_finite() || region.weight < 0.0 || total_weight <= 0.0 {
                return Err(ConfigError::InvalidWeights { region: region.name.clone() });
            }
            if !(region.lat_variance > 0.0 && region.lon_variance > 0.0) {
                return Err(ConfigError::InvalidVariance {
                    region: region.name.clone(),
                    lat: region.lat_variance,
                    lon: region.lon_variance,
                });
            }
            if region.street_names.is_empty() {
                return Err(ConfigError::NoStreetNames { region: region.name.clone() });
            }
            if !region.land_reachable() {
                return Err(ConfigError::LandUnreachable { region: region.name.clone() });
            }
        }

        for (index, h) in self.hotspots.iter().enumerate() {
            if !(h.radius > 0.0 && h.radius.is_finite()) {
                return Err(ConfigError::InvalidHotspotRadius { index, radius: h.radius });
            }
            if !(h.risk_boost > 0.0 && h.risk_boost.is_finite()) {
                return Err(ConfigError::InvalidHotspotBoost { index, boost: h.risk_boost });
            }
        }

        check_range("tiv", self.tiv.start, self.tiv.end)?;
        if self.tiv.start <= 0.0 {
            return Err(ConfigError::InvalidRange { field: "tiv", min: self.tiv.start, max: self.tiv.end });
        }
        check_range("year_built", self.year_built.start as f64, self.year_built.end as f64)?;
        let (lo, hi) = (*self.house_number.start(), *self.house_number.end());
        if lo == 0 || lo > hi {
            return Err(ConfigError::InvalidRange { field: "house_number", min: lo as f64, max: hi as f64 });
        }

        check_range("risk.base", self.risk.base.start, self.risk.base.end)?;
        check_probability("risk.label_probability", self.risk.label_probability)?;

        let claims = &self.claims;
        check_probability("claims.probability", claims.probability)?;
        check_range("claims.count", claims.count.start as f64, claims.count.end as f64)?;
        if !(claims.max_tiv_fraction > 0.0 && claims.max_tiv_fraction <= MAX_CLAIM_TIV_FRACTION) {
            return Err(ConfigError::InvalidProbability {
                field: "claims.max_tiv_fraction",
                value: claims.max_tiv_fraction,
            });
        }
        let smallest_cap = self.tiv.start * claims.max_tiv_fraction;
        if !(claims.amount_floor > 0.0) || claims.amount_floor > smallest_cap {
            return Err(ConfigError::ClaimFloorAboveCap { floor: claims.amount_floor, cap: smallest_cap });
        }
        if claims.lookback_days == 0 {
            return Err(ConfigError::InvalidRange { field: "claims.lookback_days", min: 0.0, max: 0.0 });
        }

        if self.max_attempts_per_property == 0 {
            return Err(ConfigError::NoAttempts);
        }
        Ok(())
    }
}

fn check_range(field: &'static str, min: f64, max: f64) -> Result<(), ConfigError> {
    if min.is_finite() && max.is_finite() && min < max {
        Ok(())
    } else {
        Err(ConfigError::InvalidRange { field, min, max })
    }
}

fn check_probability(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidProbability { field, value })
    }
}
