//! Region sampling and the land filter.
//!
//! A candidate is drawn by picking a region by weight and then a point
//! uniformly inside the region's sampling box. Candidates that fail the land
//! filter are discarded by the caller and a fresh region is drawn.

use rand::Rng;
use rand::distr::weighted::WeightedIndex;
use rand_distr::{Distribution, Uniform};

use crate::config::Region;
use crate::error::ConfigError;
use crate::types::Position;

/// Unvalidated candidate coordinate, tagged with the index of its region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub region: usize,
    pub position: Position,
}

pub struct RegionSampler {
    choose: WeightedIndex<f64>,
    /// Per region: (latitude, longitude) uniforms over the sampling box.
    boxes: Vec<(Uniform<f64>, Uniform<f64>)>,
}

impl RegionSampler {
    pub fn new(regions: &[Region]) -> Result<Self, ConfigError> {
        if regions.is_empty() {
            return Err(ConfigError::NoRegions);
        }
        let choose = WeightedIndex::new(regions.iter().map(|r| r.weight)).map_err(|_| {
            ConfigError::InvalidWeights {
                region: regions.iter().map(|r| r.name.as_str()).collect::<Vec<_>>().join(", "),
            }
        })?;
        let boxes = regions
            .iter()
            .map(|r| {
                let invalid = || ConfigError::InvalidVariance {
                    region: r.name.clone(),
                    lat: r.lat_variance,
                    lon: r.lon_variance,
                };
                let (west, east, south, north) = r.sampling_box();
                let lat = Uniform::new(south, north).map_err(|_| invalid())?;
                let lon = Uniform::new(west, east).map_err(|_| invalid())?;
                Ok((lat, lon))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(RegionSampler { choose, boxes })
    }

    /// Draw a region, then latitude, then longitude.
    pub fn sample(&self, rng: &mut impl Rng) -> Candidate {
        let region = self.choose.sample(rng);
        let (lat, lon) = &self.boxes[region];
        let lat = lat.sample(rng);
        let lon = lon.sample(rng);
        Candidate { region, position: Position::new(lon, lat) }
    }
}

/// Land filter. Regions without land bounds accept everything.
pub fn is_on_land(region: &Region, position: Position) -> bool {
    region.land.is_none_or(|land| land.contains(position))
}
