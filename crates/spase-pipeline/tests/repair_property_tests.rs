use proptest::prelude::*;
use serde_json::{json, Map, Value};
use spase_pipeline::{
    repair, RepairConfig, RepairOutcome, RepairPipeline, RuleCatalogue,
};
use spase_validation::ValidationEngine;

fn field_name() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Z][A-Za-z]{0,8}").unwrap()
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        proptest::string::string_regex("[a-z0-9:/ ]{0,16}")
            .unwrap()
            .prop_map(Value::String),
        any::<i32>().prop_map(|n| json!(n)),
        any::<bool>().prop_map(Value::Bool),
    ]
}

/// `YYYY-MM-DDThh:mm:ss` with no offset
fn naive_timestamp() -> impl Strategy<Value = String> {
    (1950u32..2100, 1u32..=12, 1u32..=28, 0u32..24, 0u32..60, 0u32..60).prop_map(
        |(y, mo, d, h, mi, s)| format!("{y:04}-{mo:02}-{d:02}T{h:02}:{mi:02}:{s:02}"),
    )
}

fn object_schema(names: &[String], property: &Value) -> Value {
    let properties: Map<String, Value> = names
        .iter()
        .map(|n| (n.clone(), property.clone()))
        .collect();
    json!({"type": "object", "properties": properties})
}

/// Object schema whose every property is an array of anything
fn list_schema(names: &[String]) -> Value {
    object_schema(names, &json!({"type": "array"}))
}

fn record() -> impl Strategy<Value = (Vec<String>, Value)> {
    proptest::collection::btree_map(field_name(), scalar(), 1..6).prop_map(|fields| {
        let names = fields.keys().cloned().collect();
        let body: Map<String, Value> = fields.into_iter().collect();
        (names, Value::Object(body))
    })
}

/// Validate `doc`, run one pass, then run a second pass with the same
/// issues. Returns the fix count of the first pass and whether the second
/// pass applied anything or changed the document.
fn rerun_pass(schema: &Value, doc: &Value) -> (usize, bool, bool) {
    let engine = ValidationEngine::new(schema).unwrap();
    let catalogue = RuleCatalogue::default();
    let issues = engine.validate(doc);

    let mut once = doc.clone();
    let first = repair(&mut once, &issues, &catalogue).unwrap();
    let mut twice = once.clone();
    let second = repair(&mut twice, &issues, &catalogue).unwrap();
    (first.fixes.len(), second.applied, once != twice)
}

proptest! {
    #[test]
    fn wrapping_twice_changes_nothing((names, doc) in record()) {
        let (fixes, applied, changed) = rerun_pass(&list_schema(&names), &doc);
        prop_assert_eq!(fixes, names.len());
        prop_assert!(!applied);
        prop_assert!(!changed);
    }

    #[test]
    fn utc_suffix_twice_changes_nothing(
        stamps in proptest::collection::btree_map(field_name(), naive_timestamp(), 1..6)
    ) {
        let names: Vec<String> = stamps.keys().cloned().collect();
        let schema = object_schema(&names, &json!({"type": "string", "format": "date-time"}));
        let doc = Value::Object(stamps.into_iter().map(|(k, v)| (k, Value::String(v))).collect());

        let (fixes, applied, changed) = rerun_pass(&schema, &doc);
        prop_assert_eq!(fixes, names.len());
        prop_assert!(!applied);
        prop_assert!(!changed);
    }

    #[test]
    fn stop_date_twice_changes_nothing(start in naive_timestamp()) {
        let schema = json!({
            "type": "object",
            "properties": {
                "StartDate": {"type": "string", "format": "date-time"},
                "StopDate": {"type": "string", "format": "date-time"}
            },
            "required": ["StartDate", "StopDate"]
        });
        let doc = json!({"StartDate": format!("{start}Z")});

        let (fixes, applied, changed) = rerun_pass(&schema, &doc);
        prop_assert_eq!(fixes, 1);
        prop_assert!(!applied);
        prop_assert!(!changed);
    }

    #[test]
    fn first_element_twice_changes_nothing(
        lists in proptest::collection::btree_map(
            field_name(),
            proptest::collection::vec("[a-z]{1,8}", 1..4),
            1..6,
        )
    ) {
        let names: Vec<String> = lists.keys().cloned().collect();
        let schema = object_schema(&names, &json!({"type": "string"}));
        let doc = Value::Object(lists.into_iter().map(|(k, v)| (k, json!(v))).collect());

        let (fixes, applied, changed) = rerun_pass(&schema, &doc);
        prop_assert_eq!(fixes, names.len());
        prop_assert!(!applied);
        prop_assert!(!changed);
    }

    #[test]
    fn scalar_becomes_singleton_list((names, doc) in record()) {
        let pipeline = RepairPipeline::from_schema(&list_schema(&names)).unwrap();
        let run = pipeline.run(doc.clone()).unwrap();

        prop_assert_eq!(run.outcome, RepairOutcome::Valid);
        for name in &names {
            prop_assert_eq!(&run.document[name], &json!([doc[name].clone()]));
        }
    }

    #[test]
    fn every_pass_applies_a_fix((names, doc) in record()) {
        let run = RepairPipeline::from_schema(&list_schema(&names)).unwrap().run(doc).unwrap();
        let fixes: usize = run.rule_counts.values().sum();

        prop_assert!(run.outcome.is_valid());
        prop_assert!(run.iterations <= fixes);
    }

    #[test]
    fn nested_issues_surface_after_wrapping(
        fields in proptest::collection::btree_map(field_name(), scalar(), 1..5)
    ) {
        // Each member is an object holding one scalar, where the model wants
        // a list of objects holding a list.
        let names: Vec<String> = fields.keys().cloned().collect();
        let item = json!({"type": "object", "properties": {"Value": {"type": "array"}}});
        let schema = object_schema(&names, &json!({"type": "array", "items": item}));
        let doc = Value::Object(
            fields.into_iter().map(|(k, v)| (k, json!({"Value": v}))).collect(),
        );

        let pipeline = RepairPipeline::from_schema(&schema).unwrap();
        let initial = pipeline.engine().validate(&doc).len();
        let run = pipeline.run(doc).unwrap();
        let fixes: usize = run.rule_counts.values().sum();

        prop_assert_eq!(initial, names.len());
        prop_assert!(run.outcome.is_valid());
        prop_assert_eq!(fixes, 2 * names.len());
        prop_assert_eq!(run.iterations, 2);
        prop_assert!(run.iterations <= fixes);
    }

    #[test]
    fn iteration_cap_is_respected((names, doc) in record(), cap in 0usize..3) {
        let run = RepairPipeline::from_schema(&list_schema(&names))
            .unwrap()
            .with_config(RepairConfig { max_iterations: cap })
            .run(doc)
            .unwrap();
        prop_assert!(run.iterations <= cap);
        if cap == 0 {
            let is_limit = matches!(run.outcome, RepairOutcome::IterationLimit { .. });
            prop_assert!(is_limit);
        }
    }
}
