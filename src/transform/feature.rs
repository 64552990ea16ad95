use serde::Serialize;
use serde_json::{Map, Value};

/// Remaining CSV columns as string values, kept in header order.
pub type Properties = Map<String, Value>;

/// One geo-tagged address record, serialized as a single GeoJSON line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    pub geometry: Geometry,
    pub source: String,
    pub properties: Properties,
}

impl Feature {
    pub fn new(lon: f64, lat: f64, source: impl Into<String>, properties: Properties) -> Self {
        Self {
            kind: "Feature",
            geometry: Geometry {
                coordinates: [lon, lat],
            },
            source: source.into(),
            properties,
        }
    }

    pub fn lon(&self) -> f64 {
        self.geometry.coordinates[0]
    }

    pub fn lat(&self) -> f64 {
        self.geometry.coordinates[1]
    }
}

/// `[longitude, latitude]`, in that order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Geometry {
    pub coordinates: [f64; 2],
}
