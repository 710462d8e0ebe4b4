//! Weight statistics over loosely-shaped `items` payloads.
//!
//! Payloads arrive either as a list of entries or as an object whose values
//! are entries. Anything that does not look like an entry is skipped, and a
//! weight that cannot be read contributes zero. Nothing in here fails.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::request::PickupRequest;

const MATERIAL_KEYS: [&str; 3] = ["materialType", "material_type", "type"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Material {
    Plastic,
    Paper,
    Glass,
    Metal,
}

impl Material {
    pub const ALL: [Material; 4] = [
        Material::Plastic,
        Material::Paper,
        Material::Glass,
        Material::Metal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Material::Plastic => "plastic",
            Material::Paper => "paper",
            Material::Glass => "glass",
            Material::Metal => "metal",
        }
    }

    /// Matches an already case-folded material name.
    fn recognize(folded: &str) -> Option<Self> {
        Material::ALL
            .into_iter()
            .find(|material| material.as_str() == folded)
    }
}

/// One entry of an `items` payload after shape normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemEntry {
    /// Lower-cased and trimmed.
    pub material: Option<String>,
    pub weight: Option<f64>,
}

impl ItemEntry {
    fn from_value(value: &Value) -> Option<Self> {
        let record = value.as_object()?;

        let material = MATERIAL_KEYS
            .iter()
            .find_map(|key| record.get(*key).and_then(Value::as_str))
            .map(|raw| raw.trim().to_lowercase())
            .filter(|folded| !folded.is_empty());

        Some(Self {
            material,
            weight: record.get("weight").and_then(parse_weight),
        })
    }

    pub fn category(&self) -> Option<Material> {
        self.material.as_deref().and_then(Material::recognize)
    }

    fn contribution(&self) -> f64 {
        self.weight.unwrap_or(0.0)
    }
}

fn parse_weight(value: &Value) -> Option<f64> {
    let weight = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        _ => None,
    }?;

    // Negative weights are dirty data, same as NaN.
    (weight.is_finite() && weight >= 0.0).then_some(weight)
}

#[derive(Debug, Clone, Copy)]
pub enum ItemsPayload<'a> {
    Sequence(&'a [Value]),
    Keyed(&'a Map<String, Value>),
    Malformed,
}

impl<'a> ItemsPayload<'a> {
    pub fn from_value(items: &'a Value) -> Self {
        match items {
            Value::Array(list) => ItemsPayload::Sequence(list),
            Value::Object(map) => ItemsPayload::Keyed(map),
            _ => ItemsPayload::Malformed,
        }
    }

    /// Well-formed entries in payload order; keys of a keyed payload are ignored.
    pub fn entries(self) -> impl Iterator<Item = ItemEntry> + 'a {
        let values: Box<dyn Iterator<Item = &'a Value> + 'a> = match self {
            ItemsPayload::Sequence(list) => Box::new(list.iter()),
            ItemsPayload::Keyed(map) => Box::new(map.values()),
            ItemsPayload::Malformed => Box::new(std::iter::empty()),
        };

        values.filter_map(ItemEntry::from_value)
    }
}

/// Per-category weights plus the weight that matched no category. `total`
/// covers both.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MaterialTotals {
    pub by_material: BTreeMap<Material, f64>,
    pub unrecognized: f64,
    pub total: f64,
}

impl Default for MaterialTotals {
    fn default() -> Self {
        Self {
            by_material: Material::ALL.into_iter().map(|m| (m, 0.0)).collect(),
            unrecognized: 0.0,
            total: 0.0,
        }
    }
}

impl MaterialTotals {
    pub fn weight_of(&self, material: Material) -> f64 {
        self.by_material.get(&material).copied().unwrap_or(0.0)
    }

    fn add(&mut self, entry: &ItemEntry) {
        let weight = entry.contribution();
        match entry.category() {
            Some(material) => *self.by_material.entry(material).or_insert(0.0) += weight,
            None => self.unrecognized += weight,
        }
        self.total += weight;
    }

    fn rounded(mut self) -> Self {
        for weight in self.by_material.values_mut() {
            *weight = round2(*weight);
        }
        self.unrecognized = round2(self.unrecognized);
        self.total = round2(self.total);
        self
    }
}

/// Two decimals, halves away from zero.
///
/// Rounds the shortest decimal spelling of `value`, so `1.005` (stored in
/// binary as `1.00499...`) becomes `1.01`. Values outside the decimal range
/// fall back to binary rounding.
pub fn round2(value: f64) -> f64 {
    value
        .to_string()
        .parse::<Decimal>()
        .ok()
        .map(|exact| exact.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|rounded| rounded.to_string().parse::<f64>().ok())
        .unwrap_or_else(|| {
            let scaled = (value * 100.0).round() / 100.0;
            if scaled.is_finite() { scaled } else { value }
        })
}

fn request_entries(requests: &[PickupRequest]) -> impl Iterator<Item = ItemEntry> + '_ {
    requests
        .iter()
        .flat_map(|request| ItemsPayload::from_value(&request.items).entries())
}

/// Sum of every entry weight across `requests`, recognized or not.
pub fn total_weight(requests: &[PickupRequest]) -> f64 {
    round2(request_entries(requests).map(|entry| entry.contribution()).sum())
}

pub fn weight_by_material(requests: &[PickupRequest]) -> MaterialTotals {
    request_entries(requests)
        .fold(MaterialTotals::default(), |mut totals, entry| {
            totals.add(&entry);
            totals
        })
        .rounded()
}

pub fn items_weight(items: &Value) -> f64 {
    round2(
        ItemsPayload::from_value(items)
            .entries()
            .map(|entry| entry.contribution())
            .sum(),
    )
}

/// Label for the first entry that names a material.
pub fn primary_material(items: &Value) -> Option<String> {
    ItemsPayload::from_value(items)
        .entries()
        .find_map(|entry| entry.material)
}
