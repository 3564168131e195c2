use std::fmt;

use serde::{Deserialize, Serialize};

/// Property identifier, unique within one generated population.
/// Generated ids are `prop-1`, `prop-2`, ... in acceptance order; records from
/// an external source may carry any string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyId(pub String);

impl PropertyId {
    pub fn sequential(seq: u64) -> Self {
        PropertyId(format!("prop-{seq}"))
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Claim identifier, unique within its parent property.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimId(pub String);

impl ClaimId {
    /// `clm-{property_seq}-{index}`; `index` counts from 0 within the property.
    pub fn sequential(property_seq: u64, index: u32) -> Self {
        ClaimId(format!("clm-{property_seq}-{index}"))
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A point in coordinate space (degrees).
///
/// Serialises as `[longitude, latitude]`: the map layer consuming the records
/// expects lon-then-lat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Position {
    pub lon: f64,
    pub lat: f64,
}

impl Position {
    pub fn new(lon: f64, lat: f64) -> Self {
        Position { lon, lat }
    }

    /// Planar Euclidean distance in degrees. Only meaningful over the small
    /// extents used here; this is not a great-circle distance.
    pub fn distance(self, other: Position) -> f64 {
        let dlat = self.lat - other.lat;
        let dlon = self.lon - other.lon;
        (dlat * dlat + dlon * dlon).sqrt()
    }
}

impl From<[f64; 2]> for Position {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Position { lon, lat }
    }
}

impl From<Position> for [f64; 2] {
    fn from(p: Position) -> Self {
        [p.lon, p.lat]
    }
}

/// Peril carried by a hotspot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Peril {
    Flood,
    Fire,
    Wind,
    Theft,
}

/// Dominant peril attributed to a property. `General` when no hotspot claimed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PrimaryRisk {
    Flood,
    Fire,
    Wind,
    Theft,
    General,
}

impl From<Peril> for PrimaryRisk {
    fn from(peril: Peril) -> Self {
        match peril {
            Peril::Flood => PrimaryRisk::Flood,
            Peril::Fire => PrimaryRisk::Fire,
            Peril::Wind => PrimaryRisk::Wind,
            Peril::Theft => PrimaryRisk::Theft,
        }
    }
}

impl fmt::Display for PrimaryRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PrimaryRisk::Flood => "Flood",
            PrimaryRisk::Fire => "Fire",
            PrimaryRisk::Wind => "Wind",
            PrimaryRisk::Theft => "Theft",
            PrimaryRisk::General => "General",
        };
        f.write_str(s)
    }
}

/// Claim cause. A separate vocabulary from hotspot perils.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimType {
    #[serde(rename = "Water Damage")]
    WaterDamage,
    Fire,
    Windstorm,
    Burglary,
    Liability,
}

impl ClaimType {
    pub const ALL: [ClaimType; 5] = [
        ClaimType::WaterDamage,
        ClaimType::Fire,
        ClaimType::Windstorm,
        ClaimType::Burglary,
        ClaimType::Liability,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_serializes_lon_then_lat() {
        let p = Position::new(-122.4194, 37.7749);
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "[-122.4194,37.7749]");
        let back: Position = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn distance_is_planar_euclidean() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(3.0, 4.0);
        assert_eq!(a.distance(b), 5.0);
        assert_eq!(b.distance(a), 5.0);
    }

    #[test]
    fn sequential_ids_format() {
        assert_eq!(PropertyId::sequential(7).to_string(), "prop-7");
        assert_eq!(ClaimId::sequential(7, 0).to_string(), "clm-7-0");
    }

    #[test]
    fn claim_type_water_damage_has_spaced_name() {
        let json = serde_json::to_string(&ClaimType::WaterDamage).unwrap();
        assert_eq!(json, r#""Water Damage""#);
        let json = serde_json::to_string(&PrimaryRisk::General).unwrap();
        assert_eq!(json, r#""General""#);
    }
}
