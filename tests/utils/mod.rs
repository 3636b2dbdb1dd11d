use std::path::PathBuf;

use odk_export::{FormSchema, Instance, MetaPosition, ResolvedSchema};

/// Form identifier of the transportation fixtures
pub const ID_STRING: &str = "transportation_2011_07_25";

/// Base path for test data files
#[must_use]
pub fn test_data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("data")
}

/// Create a path to a file of the transportation fixtures
#[must_use]
pub fn transportation_file(filename: &str) -> PathBuf {
    test_data_dir().join("transportation").join(filename)
}

#[must_use]
pub fn instances_dir() -> PathBuf {
    transportation_file("instances")
}

#[must_use]
pub fn load_survey() -> FormSchema {
    odk_export::load_schema(&transportation_file("survey.json")).expect("survey fixture loads")
}

#[must_use]
pub fn resolve_survey() -> ResolvedSchema {
    ResolvedSchema::resolve(&load_survey(), MetaPosition::Front).expect("survey fixture resolves")
}

#[must_use]
pub fn load_instances() -> Vec<Instance> {
    odk_export::load_instances_parallel(&instances_dir()).expect("instance fixtures load")
}

#[must_use]
pub fn read_fixture(filename: &str) -> String {
    std::fs::read_to_string(transportation_file(filename)).expect("fixture readable")
}

/// Drop the root group prefix, as the expected data is written without it
#[must_use]
pub fn strip_root(key: &str) -> String {
    key.strip_prefix("transportation/").unwrap_or(key).to_string()
}
