use serde_json::json;

use vecsync_config::PartialPolicy;
use vecsync_domain::{
	aggregate::{self, NO_SUCCESSFUL_EMBEDDINGS, Tally, Verdict},
	extract,
	record::{DataType, EmbeddableUnit, Outcome, SERVICE_DOMAIN},
	status::EmbeddingStatus,
};

fn ok() -> Outcome {
	Outcome::Succeeded { vector_id: Some("vec-1".to_string()) }
}

fn err() -> Outcome {
	Outcome::failed("HTTP 500")
}

#[test]
fn extractor_skips_intention_and_empty_values() {
	let payload = json!({
		"titre": { "valeur": "Boutique" },
		"intention": { "valeur": "creation_service" },
		"desc": { "valeur": "" }
	});
	let units = extract::extract_units(7, &payload, "fra");

	assert_eq!(
		units,
		vec![EmbeddableUnit {
			record_id: 7,
			field: "titre".to_string(),
			value: "Boutique".to_string(),
			data_type: DataType::Text,
			locale: "fra".to_string(),
			domain: SERVICE_DOMAIN,
		}]
	);
}

#[test]
fn extractor_preserves_payload_order() {
	let payload = json!({
		"zone": { "valeur": "Douala" },
		"titre": { "valeur": "Boutique" },
		"intention": "creation_service",
		"prix": { "value": 1500 },
		"note": "null",
		"tags": ["a", "b"],
		"vide": { "valeur": null }
	});
	let fields: Vec<(String, String)> = extract::extract_units(1, &payload, "fra")
		.into_iter()
		.map(|unit| (unit.field, unit.value))
		.collect();

	assert_eq!(
		fields,
		vec![
			("zone".to_string(), "Douala".to_string()),
			("titre".to_string(), "Boutique".to_string()),
			("prix".to_string(), "1500".to_string()),
			("tags".to_string(), r#"["a","b"]"#.to_string()),
		]
	);
}

#[test]
fn extractor_never_emits_reserved_or_absent_values() {
	let payloads = [
		json!({ "intention": { "valeur": "x" } }),
		json!({ "a": { "valeur": "null" }, "b": "", "c": { "valeur": "   " } }),
		json!({ "intention": "x", "a": {} }),
		json!({}),
	];

	for payload in payloads {
		let units = extract::extract_units(1, &payload, "fra");

		assert!(units.is_empty(), "Unexpected units for {payload}: {units:?}");
	}
}

#[test]
fn non_object_payloads_have_no_units() {
	let payloads = [
		serde_json::Value::Null,
		json!("plain text payload"),
		json!(["titre", "Boutique"]),
		json!(42),
		json!(true),
	];

	for payload in payloads {
		let units = extract::extract_units(3, &payload, "fra");

		assert!(units.is_empty(), "Unexpected units for {payload}: {units:?}");
	}
}

#[test]
fn wrapped_falsy_scalars_are_not_embedded() {
	let payload = json!({
		"prix": { "valeur": 0 },
		"actif": { "valeur": false },
		"stock": { "valeur": 3 },
		"remise": 0
	});
	let fields: Vec<(String, String)> = extract::extract_units(1, &payload, "fra")
		.into_iter()
		.map(|unit| (unit.field, unit.value))
		.collect();

	assert_eq!(
		fields,
		vec![("stock".to_string(), "3".to_string()), ("remise".to_string(), "0".to_string())]
	);
}

#[test]
fn all_succeeded_is_success_without_note() {
	let tally: Tally = [ok(), ok()].iter().collect();

	assert_eq!(
		aggregate::verdict(tally, PartialPolicy::Success),
		Verdict { status: EmbeddingStatus::Success, error: None }
	);
}

#[test]
fn zero_units_is_vacuous_success() {
	let verdict = aggregate::verdict(Tally::default(), PartialPolicy::Fail);

	assert_eq!(verdict, Verdict { status: EmbeddingStatus::Success, error: None });
}

#[test]
fn partial_success_carries_exact_note() {
	for (succeeded, total) in [(1_u32, 2_u32), (2, 3), (4, 5)] {
		let tally = Tally { succeeded, total };
		let verdict = aggregate::verdict(tally, PartialPolicy::Success);

		assert_eq!(verdict.status, EmbeddingStatus::Success);
		assert_eq!(verdict.error, Some(format!("partial: {succeeded}/{total}")));
	}
}

#[test]
fn strict_policy_fails_partial_records() {
	let tally: Tally = [ok(), err()].iter().collect();
	let verdict = aggregate::verdict(tally, PartialPolicy::Fail);

	assert_eq!(verdict.status, EmbeddingStatus::Failed);
	assert_eq!(verdict.error.as_deref(), Some("partial: 1/2"));
}

#[test]
fn no_success_is_failed_with_error() {
	let tally: Tally = [err(), err(), err()].iter().collect();
	let verdict = aggregate::verdict(tally, PartialPolicy::Success);

	assert_eq!(tally.failed(), 3);
	assert_eq!(verdict.status, EmbeddingStatus::Failed);
	assert_eq!(verdict.error.as_deref(), Some(NO_SUCCESSFUL_EMBEDDINGS));
}
