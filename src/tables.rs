//! Relational form of a population: one `properties` table and one `claims`
//! table keyed by property id, with snake_case columns. Derived fields are
//! dropped on export and recomputed on import.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::claims::Claim;
use crate::error::RecordError;
use crate::property::Property;
use crate::types::{ClaimId, ClaimType, Position, PrimaryRisk, PropertyId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRow {
    pub id: PropertyId,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub tiv: f64,
    pub risk_score: f64,
    pub primary_risk: PrimaryRisk,
    pub year_built: i32,
    pub city: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimRow {
    pub claim_id: ClaimId,
    pub property_id: PropertyId,
    pub date: NaiveDate,
    pub amount: f64,
    #[serde(rename = "type")]
    pub claim_type: ClaimType,
}

pub fn split(properties: &[Property]) -> (Vec<PropertyRow>, Vec<ClaimRow>) {
    let mut property_rows = Vec::with_capacity(properties.len());
    let mut claim_rows = Vec::new();
    for p in properties {
        property_rows.push(PropertyRow {
            id: p.id.clone(),
            latitude: p.position.lat,
            longitude: p.position.lon,
            address: p.address.clone(),
            tiv: p.tiv,
            risk_score: p.risk_score,
            primary_risk: p.primary_risk,
            year_built: p.year_built,
            city: p.city.clone(),
        });
        claim_rows.extend(p.claims.iter().map(|c| ClaimRow {
            claim_id: c.id.clone(),
            property_id: p.id.clone(),
            date: c.date,
            amount: c.amount,
            claim_type: c.claim_type,
        }));
    }
    (property_rows, claim_rows)
}

/// Rebuild properties in `properties` order. Each property's claims keep
/// their order in `claims`; a claim for an unknown property is an error.
pub fn join(properties: Vec<PropertyRow>, claims: Vec<ClaimRow>) -> Result<Vec<Property>, RecordError> {
    let index: HashMap<PropertyId, usize> =
        properties.iter().enumerate().map(|(i, row)| (row.id.clone(), i)).collect();
    let mut grouped: Vec<Vec<Claim>> = vec![Vec::new(); properties.len()];
    for row in claims {
        let Some(&slot) = index.get(&row.property_id) else {
            return Err(RecordError::OrphanClaim { claim_id: row.claim_id, property_id: row.property_id });
        };
        grouped[slot].push(Claim { id: row.claim_id, date: row.date, amount: row.amount, claim_type: row.claim_type });
    }

    Ok(properties
        .into_iter()
        .zip(grouped)
        .map(|(row, claims)| Property {
            id: row.id,
            position: Position::new(row.longitude, row.latitude),
            address: row.address,
            tiv: row.tiv,
            risk_score: row.risk_score,
            primary_risk: row.primary_risk,
            year_built: row.year_built,
            claims,
            city: row.city,
        })
        .collect())
}
