//! Extraction of the light-field sensor from a merlict scenery.
//!
//! A scenery is a JSON scene graph. The plenoscope's light-field sensor sits
//! inside the frame named `Portal`:
//!
//! ```text
//! {"children": [{"type": "Frame", "name": "Portal",
//!                "children": [{"type": "LightFieldSensor", ...}, ...]}, ...]}
//! ```
//!
//! When several records match, the last one wins.

use serde_json::Value;
use std::path::Path;
use thiserror::Error;

const PORTAL_TYPE: &str = "Frame";
const PORTAL_NAME: &str = "Portal";
const SENSOR_TYPE: &str = "LightFieldSensor";

#[derive(Debug, Error)]
pub enum SceneryError {
    #[error("failed to read scenery: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse scenery: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("scenery has no child of type 'Frame' named 'Portal'")]
    PortalNotFound,

    #[error("portal frame has no child of type 'LightFieldSensor'")]
    SensorNotFound,
}

/// Read the scenery at `path` and return its light-field sensor record.
pub fn read_plenoscope_geometry(path: &Path) -> Result<Value, SceneryError> {
    let json = std::fs::read_to_string(path)?;
    let scenery: Value = serde_json::from_str(&json)?;
    light_field_sensor(&scenery).cloned()
}

/// Locate the light-field sensor record inside a parsed scenery.
pub fn light_field_sensor(scenery: &Value) -> Result<&Value, SceneryError> {
    let portal = children(scenery)
        .rev()
        .find(|child| has_type(child, PORTAL_TYPE) && child["name"] == PORTAL_NAME)
        .ok_or(SceneryError::PortalNotFound)?;

    children(portal)
        .rev()
        .find(|child| has_type(child, SENSOR_TYPE))
        .ok_or(SceneryError::SensorNotFound)
}

fn children(node: &Value) -> std::slice::Iter<'_, Value> {
    node["children"]
        .as_array()
        .map(|children| children.iter())
        .unwrap_or_default()
}

fn has_type(node: &Value, type_name: &str) -> bool {
    node["type"] == type_name
}
