use std::time::Duration;

use reqwest::{Client, StatusCode, header::HeaderMap};
use serde::Serialize;
use serde_json::Value;

use vecsync_config::EmbeddingProviderConfig;
use vecsync_domain::record::{DataType, EmbeddableUnit, Outcome};

use crate::{Error, Result};

const MAX_DETAIL_CHARS: usize = 512;

#[derive(Debug, Serialize)]
struct AddEmbeddingRequest<'a> {
	value: &'a str,
	type_donnee: DataType,
	service_id: i64,
	gps_lat: Option<f64>,
	gps_lon: Option<f64>,
	langue: &'a str,
	active: bool,
	type_metier: &'a str,
}
impl<'a> From<&'a EmbeddableUnit> for AddEmbeddingRequest<'a> {
	fn from(unit: &'a EmbeddableUnit) -> Self {
		Self {
			value: &unit.value,
			type_donnee: unit.data_type,
			service_id: unit.record_id,
			gps_lat: None,
			gps_lon: None,
			langue: &unit.locale,
			active: true,
			type_metier: unit.domain,
		}
	}
}

/// HTTP client for the vectorization service's `add_embedding_pinecone` contract.
#[derive(Clone, Debug)]
pub struct EmbeddingClient {
	http: Client,
	url: String,
	headers: HeaderMap,
}
impl EmbeddingClient {
	pub fn new(cfg: &EmbeddingProviderConfig) -> Result<Self> {
		let http = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
		let url = format!("{}{}", cfg.api_base.trim_end_matches('/'), cfg.path);
		let headers = crate::auth_headers(&cfg.api_key, &cfg.default_headers)?;

		Ok(Self { http, url, headers })
	}

	pub fn url(&self) -> &str {
		&self.url
	}

	/// Submits one unit. Transport and protocol errors come back as [`Outcome::Failed`].
	pub async fn submit(&self, unit: &EmbeddableUnit) -> Outcome {
		match self.try_submit(unit).await {
			Ok(outcome) => outcome,
			Err(err) => {
				tracing::warn!(
					record_id = unit.record_id,
					field = %unit.field,
					error = %err,
					"Embedding call failed."
				);

				Outcome::failed(err.to_string())
			},
		}
	}

	async fn try_submit(&self, unit: &EmbeddableUnit) -> Result<Outcome> {
		let body = AddEmbeddingRequest::from(unit);
		let res = self.http.post(&self.url).headers(self.headers.clone()).json(&body).send().await?;
		let status = res.status();

		if status != StatusCode::OK {
			tracing::warn!(
				record_id = unit.record_id,
				field = %unit.field,
				status = status.as_u16(),
				"Embedding service returned a non-200 status."
			);

			return Ok(Outcome::failed(format!("HTTP {}", status.as_u16())));
		}

		let json: Value = res.json().await?;

		parse_add_embedding_response(&json)
	}
}

/// Maps a 200 response body to an outcome.
///
/// Only `status == "ok"` together with `verification == "confirmed"` counts as success.
pub fn parse_add_embedding_response(json: &Value) -> Result<Outcome> {
	if !json.is_object() {
		return Err(Error::InvalidResponse {
			message: "Embedding response must be a JSON object.".to_string(),
		});
	}

	let status = json.get("status").and_then(Value::as_str);
	let verification = json.get("verification").and_then(Value::as_str);

	if status == Some("ok") && verification == Some("confirmed") {
		let vector_id = json.get("pinecone_id").and_then(Value::as_str).map(str::to_string);

		return Ok(Outcome::Succeeded { vector_id });
	}

	Ok(Outcome::failed(format!("Embedding not confirmed: {}", truncate(&json.to_string()))))
}

fn truncate(text: &str) -> String {
	if text.chars().count() <= MAX_DETAIL_CHARS {
		return text.to_string();
	}

	let mut out: String = text.chars().take(MAX_DETAIL_CHARS).collect();

	out.push_str("...");

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn confirmed_ok_response_succeeds() {
		let json = serde_json::json!({
			"status": "ok",
			"verification": "confirmed",
			"pinecone_id": "svc-12-titre"
		});
		let outcome = parse_add_embedding_response(&json).expect("parse failed");

		assert_eq!(outcome, Outcome::Succeeded { vector_id: Some("svc-12-titre".to_string()) });
	}

	#[test]
	fn unconfirmed_response_fails_with_body() {
		let json = serde_json::json!({ "status": "ok", "verification": "pending" });
		let outcome = parse_add_embedding_response(&json).expect("parse failed");
		let Outcome::Failed { error } = outcome else {
			panic!("Expected a failed outcome.");
		};

		assert!(error.contains("pending"), "Unexpected error: {error}");
	}

	#[test]
	fn non_object_response_is_invalid() {
		let json = serde_json::json!(["ok"]);

		assert!(parse_add_embedding_response(&json).is_err());
	}

	#[test]
	fn request_carries_fixed_contract_fields() {
		let unit = EmbeddableUnit {
			record_id: 12,
			field: "titre".to_string(),
			value: "Boutique".to_string(),
			data_type: DataType::Text,
			locale: "fra".to_string(),
			domain: "service",
		};
		let body = serde_json::to_value(AddEmbeddingRequest::from(&unit)).expect("encode failed");

		assert_eq!(
			body,
			serde_json::json!({
				"value": "Boutique",
				"type_donnee": "texte",
				"service_id": 12,
				"gps_lat": null,
				"gps_lon": null,
				"langue": "fra",
				"active": true,
				"type_metier": "service"
			})
		);
	}
}
