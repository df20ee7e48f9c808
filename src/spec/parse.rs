//! Tolerant parsing of generation responses into specifications.
//!
//! Back ends wrap JSON in prose and code fences, rename keys, or return
//! plain text. The parser extracts what it can and always retains the
//! response verbatim in `raw_text`; an unparseable response degrades the
//! result instead of failing it.

use serde_json::Value;
use tracing::debug;

use super::{FeatureSpec, ModelSpec, ScreenSpec, Specification};

/// Slice the outermost JSON object out of a prose-wrapped response.
pub(crate) fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse a generation response into a [`Specification`].
///
/// Never fails: a response without a usable JSON object yields a degraded
/// document whose structured fields are empty and whose `raw_text` holds
/// the response unchanged.
pub fn parse_specification(response: &str) -> Specification {
    let mut spec = Specification {
        raw_text: response.to_string(),
        ..Default::default()
    };

    let Some(json) = extract_json_object(response) else {
        debug!("Specification response carries no JSON object; keeping raw text only");
        return spec;
    };
    let Ok(value) = serde_json::from_str::<Value>(json) else {
        debug!("Specification response JSON did not parse; keeping raw text only");
        return spec;
    };

    spec.overview = string_field(&value, &["overview", "app_overview"]);
    spec.technical_requirements = string_field(&value, &["technical_requirements"]);
    spec.features = entry_field(&value, &["features", "feature_specifications"]);
    spec.screens = entry_field(
        &value,
        &["screens", "screen_layouts", "screen_layouts_and_navigation"],
    );
    spec.data_models = entry_field(&value, &["data_models", "models"]);
    spec.api_requirements = string_field(&value, &["api_requirements"]);
    spec.design_guidelines = string_field(&value, &["design_guidelines"]);
    spec.testing_requirements = string_field(&value, &["testing_requirements"]);

    spec
}

/// First matching key rendered as prose. Objects and arrays are rendered
/// as pretty JSON so nothing the back end wrote is dropped.
fn string_field(value: &Value, keys: &[&str]) -> String {
    for key in keys {
        match value.get(key) {
            None | Some(Value::Null) => continue,
            Some(Value::String(s)) => return s.trim().to_string(),
            Some(other) => {
                return serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string())
            }
        }
    }
    String::new()
}

/// First matching key interpreted as an entry list. Accepts arrays of
/// strings, arrays of objects, or a map of name to description.
fn entry_field<T: From<(String, String)>>(value: &Value, keys: &[&str]) -> Vec<T> {
    for key in keys {
        let entries = match value.get(key) {
            Some(Value::Array(items)) => items.iter().filter_map(entry_pair).collect::<Vec<_>>(),
            Some(Value::Object(map)) => map
                .iter()
                .map(|(name, detail)| (name.clone(), detail_text(detail)))
                .collect(),
            _ => continue,
        };
        if !entries.is_empty() {
            return entries.into_iter().map(T::from).collect();
        }
    }
    Vec::new()
}

fn entry_pair(item: &Value) -> Option<(String, String)> {
    match item {
        Value::String(name) => Some((name.trim().to_string(), String::new())),
        Value::Object(map) => {
            let name = ["name", "title", "screen", "model", "feature"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str))?;
            let description = ["description", "details"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str))
                .unwrap_or_default();
            Some((name.to_string(), description.to_string()))
        }
        _ => None,
    }
}

fn detail_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}
