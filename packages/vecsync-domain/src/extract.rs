//! Field extraction: turns a record payload into the units worth embedding.
//!
//! A payload is a JSON object whose entries are field wrappers such as
//! `{"valeur": "Boutique", "origine": "ia"}`. Entries are visited in insertion order, so the same
//! payload always yields the same unit sequence.

use serde_json::{Map, Value};

use crate::record::{DataType, EmbeddableUnit, RESERVED_INTENTION_FIELD, SERVICE_DOMAIN};

/// Wrapper keys holding the scalar value, in lookup order.
const VALUE_KEYS: [&str; 2] = ["valeur", "value"];

/// Extracts embeddable units from `payload`.
///
/// A payload that is not an object has nothing to embed.
pub fn extract_units(record_id: i64, payload: &Value, locale: &str) -> Vec<EmbeddableUnit> {
	let Value::Object(fields) = payload else {
		if !payload.is_null() {
			tracing::warn!(
				record_id,
				kind = json_kind(payload),
				"Record payload is not a JSON object. Nothing to embed."
			);
		}

		return Vec::new();
	};

	extract_fields(fields)
		.into_iter()
		.map(|(field, value)| EmbeddableUnit {
			record_id,
			field,
			value,
			data_type: DataType::Text,
			locale: locale.to_string(),
			domain: SERVICE_DOMAIN,
		})
		.collect()
}

/// Ordered `(field, value)` pairs that survive the reserved-field and absent-value filters.
pub fn extract_fields(fields: &Map<String, Value>) -> Vec<(String, String)> {
	fields
		.iter()
		.filter(|(name, _)| name.as_str() != RESERVED_INTENTION_FIELD)
		.filter_map(|(name, raw)| resolve_value(raw).map(|value| (name.clone(), value)))
		.collect()
}

/// Resolves a field wrapper to its text, or `None` when the value is absent.
///
/// A wrapped `false` or zero counts as absent. Bare scalars are always kept.
pub fn resolve_value(raw: &Value) -> Option<String> {
	let wrapped = match raw {
		Value::Object(wrapper) => VALUE_KEYS.iter().find_map(|key| wrapper.get(*key)),
		_ => None,
	};

	if wrapped.is_some_and(is_falsy_scalar) {
		return None;
	}

	let text = match wrapped.unwrap_or(raw) {
		Value::Null => return None,
		Value::String(text) => text.clone(),
		Value::Array(items) if items.is_empty() => return None,
		Value::Object(map) if map.is_empty() => return None,
		other => other.to_string(),
	};

	if is_absent(&text) { None } else { Some(text) }
}

fn is_absent(text: &str) -> bool {
	let trimmed = text.trim();

	trimmed.is_empty() || trimmed == "null"
}

fn is_falsy_scalar(value: &Value) -> bool {
	match value {
		Value::Bool(flag) => !flag,
		Value::Number(number) => number.as_f64() == Some(0.0),
		_ => false,
	}
}

fn json_kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "bool",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}
