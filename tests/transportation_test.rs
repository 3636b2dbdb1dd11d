//! End-to-end export of the transportation survey: header resolution, CSV
//! passes and the structured views of a submission.

mod utils;

use std::collections::BTreeMap;

use odk_export::{
    Cell, ExportConfig, ExportMode, Exporter, Flattener, Instance, InstanceNode, flatten_nested,
    resolve_headers,
};
use serde_json::{Value, json};

use utils::{ID_STRING, load_instances, load_survey, read_fixture, resolve_survey, strip_root};

fn export_csv() -> String {
    let resolved = resolve_survey();
    let exporter = Exporter::new(&resolved, ExportConfig::default());
    let mut out = Vec::new();
    exporter
        .write_csv(&load_instances(), &mut out)
        .expect("csv export succeeds");
    String::from_utf8(out).expect("csv is utf-8")
}

#[test]
fn test_headers_match_fixture() {
    let expected: Vec<String> = serde_json::from_str(&read_fixture("headers.json")).unwrap();
    let survey = load_survey();

    assert_eq!(resolve_headers(&survey).unwrap(), expected);
    // Resolution is deterministic
    assert_eq!(resolve_headers(&survey).unwrap(), resolve_headers(&survey).unwrap());

    let csv = export_csv();
    let first_line = csv.lines().next().unwrap();
    assert_eq!(first_line.split(',').collect::<Vec<_>>(), expected);
}

#[test]
fn test_csv_export_first_pass() {
    let actual = export_csv();
    let expected = read_fixture("transportation.csv");
    for (actual_row, expected_row) in actual.lines().zip(expected.lines()) {
        assert_eq!(actual_row, expected_row);
    }
    assert_eq!(actual.lines().count(), expected.lines().count());
}

#[test]
fn test_csv_export_is_idempotent() {
    assert_eq!(export_csv().into_bytes(), export_csv().into_bytes());
}

#[test]
fn test_csv_export_second_pass() {
    let resolved = resolve_survey();
    let csv = export_csv();
    let mut lines = csv.lines();
    let headers: Vec<&str> = lines.next().unwrap().split(',').collect();

    let expected = vec![
        json!({
            "available_transportation_types_to_referral_facility/ambulance": "True",
            "available_transportation_types_to_referral_facility/bicycle": "True",
            "ambulance/frequency_to_referral_facility": "daily",
            "bicycle/frequency_to_referral_facility": "weekly"
        }),
        json!({
            "available_transportation_types_to_referral_facility/none": "True"
        }),
        json!({
            "available_transportation_types_to_referral_facility/ambulance": "True",
            "ambulance/frequency_to_referral_facility": "weekly"
        }),
        json!({
            "available_transportation_types_to_referral_facility/taxi": "True",
            "available_transportation_types_to_referral_facility/other": "True",
            "available_transportation_types_to_referral_facility_other": "camel",
            "taxi/frequency_to_referral_facility": "daily",
            "other/frequency_to_referral_facility": "other"
        }),
    ];

    let mut rows = 0;
    for (line, expected) in lines.zip(expected) {
        let row: serde_json::Map<String, Value> = headers
            .iter()
            .zip(line.split(','))
            .filter(|(header, value)| {
                !["n/a", "False"].contains(value)
                    && !resolved.meta_headers().iter().any(|m| m == *header)
            })
            .map(|(header, value)| (strip_root(header), Value::String(value.to_string())))
            .collect();
        assert_eq!(Value::Object(row), expected);
        rows += 1;
    }
    assert_eq!(rows, 4);
}

#[test]
fn test_data_for_export() {
    let resolved = resolve_survey();
    let exporter = Exporter::new(&resolved, ExportConfig::default());

    let mut expected = vec![
        json!({
            "available_transportation_types_to_referral_facility/ambulance": true,
            "available_transportation_types_to_referral_facility/bicycle": true,
            "ambulance/frequency_to_referral_facility": "daily",
            "bicycle/frequency_to_referral_facility": "weekly"
        }),
        json!({
            "available_transportation_types_to_referral_facility/none": true
        }),
        json!({
            "available_transportation_types_to_referral_facility/ambulance": true,
            "ambulance/frequency_to_referral_facility": "weekly"
        }),
        json!({
            "available_transportation_types_to_referral_facility/taxi": true,
            "available_transportation_types_to_referral_facility/other": true,
            "available_transportation_types_to_referral_facility_other": "camel",
            "taxi/frequency_to_referral_facility": "daily",
            "other/frequency_to_referral_facility": "other"
        }),
    ];

    for row in exporter.to_json_rows(&load_instances()) {
        let Value::Object(row) = row else {
            panic!("json row is not an object");
        };
        assert_eq!(row.get("_xform_id_string"), Some(&json!(ID_STRING)));
        let stripped: serde_json::Map<String, Value> = row
            .into_iter()
            .filter(|(k, _)| k != "_xform_id_string")
            .map(|(k, v)| (strip_root(&k), v))
            .collect();
        let stripped = Value::Object(stripped);
        let position = expected
            .iter()
            .position(|e| *e == stripped)
            .unwrap_or_else(|| panic!("unexpected row {stripped}"));
        expected.remove(position);
    }
    assert!(expected.is_empty());
}

#[test]
fn test_group_xpaths_do_not_appear_in_dicts_for_export() {
    let resolved = resolve_survey();
    let flattener = Flattener::new(&resolved);
    let instances = load_instances();
    let instance = &instances[0];

    assert_eq!(
        flattener.to_nested_dict(instance, true),
        json!({
            "transportation": {
                "transportation": {
                    "bicycle": {"frequency_to_referral_facility": "weekly"},
                    "ambulance": {"frequency_to_referral_facility": "daily"},
                    "available_transportation_types_to_referral_facility": "ambulance bicycle"
                }
            }
        })
    );
    assert_eq!(
        Value::Object(flattener.to_flat_dict(instance)),
        json!({
            "transportation/available_transportation_types_to_referral_facility": "ambulance bicycle",
            "transportation/ambulance/frequency_to_referral_facility": "daily",
            "transportation/bicycle/frequency_to_referral_facility": "weekly",
            "_xform_id_string": ID_STRING
        })
    );
}

#[test]
fn test_nested_and_flat_views_agree() {
    let resolved = resolve_survey();
    let flattener = Flattener::new(&resolved);
    for instance in load_instances() {
        let mut flat = flattener.to_flat_dict(&instance);
        for header in resolved.meta_headers() {
            flat.remove(header);
        }
        assert_eq!(flatten_nested(&flattener.to_nested_dict(&instance, false)), flat);
    }
}

#[test]
fn test_full_rows_are_column_aligned() {
    let resolved = resolve_survey();
    let flattener = Flattener::new(&resolved);
    for instance in load_instances() {
        let row = flattener.to_flat_row(&instance, ExportMode::Full);
        assert_eq!(
            row.len(),
            resolved.headers().len() - resolved.meta_headers().len()
        );
        assert!(row.keys().all(|k| resolved.headers().iter().any(|h| h == k)));
    }
}

#[test]
fn test_sparse_row_of_first_submission() {
    let resolved = resolve_survey();
    let row = Flattener::new(&resolved).to_flat_row(&load_instances()[0], ExportMode::Sparse);
    let stripped: BTreeMap<String, Cell> = row
        .iter()
        .map(|(k, v)| (strip_root(k), v.clone()))
        .collect();

    let expected: BTreeMap<String, Cell> = [
        (
            "available_transportation_types_to_referral_facility/ambulance",
            Cell::Flag(true),
        ),
        (
            "available_transportation_types_to_referral_facility/bicycle",
            Cell::Flag(true),
        ),
        ("ambulance/frequency_to_referral_facility", Cell::text("daily")),
        ("bicycle/frequency_to_referral_facility", Cell::text("weekly")),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    assert_eq!(stripped, expected);
}

#[test]
fn test_unknown_fields_are_tolerated() {
    let resolved = resolve_survey();
    let flattener = Flattener::new(&resolved);
    let instance = Instance::new(
        ID_STRING,
        "transportation",
        [
            (
                "available_transportation_types_to_referral_facility".to_string(),
                InstanceNode::value("taxi"),
            ),
            (
                "fuel".to_string(),
                InstanceNode::group([("price", InstanceNode::value("12"))]),
            ),
        ]
        .into_iter()
        .collect(),
    );

    let (row, warnings) = flattener.flatten(&instance, ExportMode::Full);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].path, "transportation/fuel/price");
    assert!(row.get("transportation/fuel/price").is_none());

    let nested = flattener.to_nested_dict(&instance, false);
    assert!(nested["transportation"].get("fuel").is_none());

    let exporter = Exporter::new(&resolved, ExportConfig::default());
    assert_eq!(exporter.render_row(&instance).len(), resolved.headers().len());
}

#[test]
fn test_untagged_submission_is_exported() {
    let resolved = resolve_survey();
    let instance = Instance::from_json_str(
        r#"{"transportation": {"available_transportation_types_to_referral_facility": "taxi"}}"#,
    )
    .unwrap();

    let exporter = Exporter::new(&resolved, ExportConfig::default());
    let rows = exporter.rows(&[instance]);
    assert_eq!(rows.len(), 1);

    let row: BTreeMap<&str, &str> = resolved
        .headers()
        .iter()
        .map(String::as_str)
        .zip(rows[0].iter().map(String::as_str))
        .collect();
    assert_eq!(row["_xform_id_string"], ID_STRING);
    assert_eq!(
        row["transportation/available_transportation_types_to_referral_facility/taxi"],
        "True"
    );
}
