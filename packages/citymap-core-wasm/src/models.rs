// Building data model and the network-boundary payload types
use geo::Area;
use geo_types::{LineString, Polygon};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashSet;

use crate::{console_log, console_warn};

/// One physical structure, as held by the feature store.
///
/// The footprint is stored open: the closing vertex of the wire ring is
/// dropped and consecutive duplicates are merged.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    pub id: String,
    pub footprint: Vec<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessed_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub land_use: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_built: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roll_number: Option<String>,
}

impl Building {
    pub fn new(id: impl Into<String>, footprint: Vec<[f64; 2]>) -> Self {
        Self {
            id: id.into(),
            footprint,
            height: None,
            assessed_value: None,
            land_use: None,
            year_built: None,
            address: None,
            roll_number: None,
        }
    }

    pub fn with_height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    /// Footprint with the first vertex repeated at the end.
    pub fn closed_footprint(&self) -> Vec<[f64; 2]> {
        let mut ring = self.footprint.clone();
        if let Some(first) = ring.first().copied() {
            ring.push(first);
        }
        ring
    }
}

/// Ordered set of buildings returned by one completed request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeatureCollection {
    pub buildings: Vec<Building>,
}

impl FeatureCollection {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Building> {
        self.buildings.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Building> {
        self.buildings.iter().find(|b| b.id == id)
    }

    /// Build a collection from raw GeoJSON features.
    ///
    /// Features without a usable id or footprint are dropped, and a repeated
    /// id keeps its first occurrence.
    pub fn from_features(features: &[Value]) -> Self {
        let mut seen = HashSet::new();
        let mut buildings = Vec::with_capacity(features.len());
        let mut dropped = 0usize;

        for feature in features {
            match building_from_feature(feature) {
                Some(building) if seen.insert(building.id.clone()) => buildings.push(building),
                Some(building) => {
                    console_log!("Skipping duplicate building id {}", building.id);
                    dropped += 1;
                }
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            console_warn!(
                "Dropped {} of {} features without a valid id or footprint",
                dropped,
                features.len()
            );
        }

        Self { buildings }
    }

    /// Re-emit the collection as GeoJSON using the snake_case wire names.
    pub fn to_geojson(&self) -> Value {
        let features: Vec<Value> = self
            .buildings
            .iter()
            .map(|b| {
                json!({
                    "type": "Feature",
                    "id": b.id,
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [b.closed_footprint()],
                    },
                    "properties": {
                        "struct_id": b.id,
                        "height": b.height,
                        "assessed_value": b.assessed_value,
                        "land_use_designation": b.land_use,
                        "year_of_construction": b.year_built,
                        "roll_number": b.roll_number,
                        "address": b.address,
                    },
                })
            })
            .collect();

        json!({ "type": "FeatureCollection", "features": features })
    }
}

#[derive(Debug, Deserialize)]
enum CollectionTag {
    FeatureCollection,
}

#[derive(Debug, Deserialize)]
pub struct CollectionPayload {
    #[serde(rename = "type")]
    _kind: CollectionTag,
    features: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct MessagePayload {
    message: String,
    data: Vec<Value>,
}

/// Every body shape a 2xx response from the building API can take.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ApiPayload {
    Collection(CollectionPayload),
    Message(MessagePayload),
    Unrecognized(Value),
    #[serde(skip)]
    Malformed(String),
}

impl ApiPayload {
    pub fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_else(|e| ApiPayload::Malformed(e.to_string()))
    }

    /// Collapse the payload into the collection to display. Only the
    /// collection shape yields buildings; every other shape means zero.
    pub fn normalize(self) -> FeatureCollection {
        match self {
            ApiPayload::Collection(payload) => {
                let collection = FeatureCollection::from_features(&payload.features);
                if collection.is_empty() {
                    console_warn!("Received empty FeatureCollection.");
                }
                collection
            }
            ApiPayload::Message(payload) if payload.data.is_empty() => {
                console_warn!("No buildings matched the filter criteria: {}", payload.message);
                FeatureCollection::empty()
            }
            ApiPayload::Message(payload) => {
                console_warn!(
                    "Message payload carried {} unexpected records, setting to empty: {}",
                    payload.data.len(),
                    payload.message
                );
                FeatureCollection::empty()
            }
            ApiPayload::Unrecognized(value) => {
                console_warn!("Received non-GeoJSON data or unexpected format, setting to empty: {}", value);
                FeatureCollection::empty()
            }
            ApiPayload::Malformed(reason) => {
                console_warn!("Response body is not valid JSON ({}), setting to empty", reason);
                FeatureCollection::empty()
            }
        }
    }
}

#[derive(Deserialize)]
struct WireFeature {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    geometry: Option<WireGeometry>,
    #[serde(default)]
    properties: Option<WireProperties>,
}

#[derive(Deserialize)]
#[serde(tag = "type", content = "coordinates")]
enum WireGeometry {
    Polygon(Vec<Vec<Vec<f64>>>),
    MultiPolygon(Vec<Vec<Vec<Vec<f64>>>>),
}

// snake_case is the backend contract; the camelCase and short names are
// accepted so records from either client convention load.
#[derive(Deserialize, Default)]
#[serde(default)]
struct WireProperties {
    struct_id: Option<Value>,
    id: Option<Value>,
    height: Option<Value>,
    assessed_value: Option<Value>,
    #[serde(rename = "assessedValue")]
    assessed_value_camel: Option<Value>,
    land_use_designation: Option<Value>,
    land_use: Option<Value>,
    #[serde(rename = "landUse")]
    land_use_camel: Option<Value>,
    year_of_construction: Option<Value>,
    year_built: Option<Value>,
    #[serde(rename = "yearBuilt")]
    year_built_camel: Option<Value>,
    roll_number: Option<Value>,
    #[serde(rename = "rollNumber")]
    roll_number_camel: Option<Value>,
    address: Option<Value>,
}

fn building_from_feature(feature: &Value) -> Option<Building> {
    let wire: WireFeature = serde_json::from_value(feature.clone()).ok()?;
    let props = wire.properties.unwrap_or_default();

    let roll_number = text(&props.roll_number).or_else(|| text(&props.roll_number_camel));
    let id = text(&props.struct_id)
        .or_else(|| text(&props.id))
        .or_else(|| roll_number.clone())
        .or_else(|| text(&wire.id))?;

    let footprint = match wire.geometry? {
        WireGeometry::Polygon(rings) => exterior_ring(&rings),
        WireGeometry::MultiPolygon(parts) => parts
            .iter()
            .filter_map(|rings| exterior_ring(rings))
            .max_by(|a, b| ring_area(a).total_cmp(&ring_area(b))),
    }?;

    Some(Building {
        id,
        footprint,
        height: non_negative(number(&props.height)),
        assessed_value: non_negative(
            number(&props.assessed_value).or_else(|| number(&props.assessed_value_camel)),
        ),
        land_use: text(&props.land_use_designation)
            .or_else(|| text(&props.land_use))
            .or_else(|| text(&props.land_use_camel)),
        year_built: year(&props.year_of_construction)
            .or_else(|| year(&props.year_built))
            .or_else(|| year(&props.year_built_camel)),
        address: text(&props.address),
        roll_number,
    })
}

fn exterior_ring(rings: &[Vec<Vec<f64>>]) -> Option<Vec<[f64; 2]>> {
    let raw = rings.first()?;
    let mut ring: Vec<[f64; 2]> = Vec::with_capacity(raw.len());
    for position in raw {
        let (x, y) = match position.as_slice() {
            [x, y, ..] => (*x, *y),
            _ => return None,
        };
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        if ring.last() != Some(&[x, y]) {
            ring.push([x, y]);
        }
    }
    if ring.len() > 1 && ring.first() == ring.last() {
        ring.pop();
    }
    if distinct_vertices(&ring) < 3 || ring_area(&ring) <= 0.0 {
        return None;
    }
    Some(ring)
}

fn distinct_vertices(ring: &[[f64; 2]]) -> usize {
    ring.iter()
        .map(|p| (p[0].to_bits(), p[1].to_bits()))
        .collect::<HashSet<_>>()
        .len()
}

fn ring_area(ring: &[[f64; 2]]) -> f64 {
    let line: LineString<f64> = ring.iter().map(|p| (p[0], p[1])).collect();
    Polygon::new(line, vec![]).unsigned_area()
}

fn number(value: &Option<Value>) -> Option<f64> {
    let n = match value.as_ref()? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn non_negative(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v >= 0.0)
}

fn year(value: &Option<Value>) -> Option<i32> {
    let n = number(value)?;
    (n.fract() == 0.0 && n >= i32::MIN as f64 && n <= i32::MAX as f64).then_some(n as i32)
}

fn text(value: &Option<Value>) -> Option<String> {
    match value.as_ref()? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
