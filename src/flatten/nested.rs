//! Structured views of an instance.

use serde_json::{Map, Value};

use super::Flattener;
use crate::instance::Instance;

impl Flattener<'_> {
    /// Rebuild the group nesting of an instance, keeping only known fields.
    ///
    /// Multi-select answers stay as their raw token string. With
    /// `include_meta` the tree is wrapped once more under the root name; no
    /// metadata values are added. Metadata is read through `to_flat_dict`
    /// or `meta_value`.
    #[must_use]
    pub fn to_nested_dict(&self, instance: &Instance, include_meta: bool) -> Value {
        let prefix = format!("{}/", instance.root());
        let mut body = Map::new();
        for (path, value) in instance.leaves() {
            if !self.schema.is_known(&path) {
                continue;
            }
            if let Some(relative) = path.strip_prefix(&prefix) {
                insert_path(&mut body, relative, value);
            }
        }

        let tree = single(instance.root(), Value::Object(body));
        if include_meta {
            single(instance.root(), tree)
        } else {
            tree
        }
    }

    /// Root-prefixed paths to raw leaf values, plus the metadata headers
    #[must_use]
    pub fn to_flat_dict(&self, instance: &Instance) -> Map<String, Value> {
        let mut out: Map<String, Value> = self
            .schema
            .meta_headers()
            .iter()
            .filter_map(|header| {
                self.meta_value(instance, header)
                    .map(|value| (header.clone(), Value::String(value.to_string())))
            })
            .collect();
        out.extend(
            instance
                .leaves()
                .into_iter()
                .filter(|(path, _)| self.schema.is_known(path))
                .map(|(path, value)| (path, Value::String(value.to_string()))),
        );
        out
    }
}

/// Collapse a nested tree into `/`-joined paths to its leaves
#[must_use]
pub fn flatten_nested(value: &Value) -> Map<String, Value> {
    let mut out = Map::new();
    if let Value::Object(map) = value {
        collect(None, map, &mut out);
    }
    out
}

fn collect(prefix: Option<&str>, map: &Map<String, Value>, out: &mut Map<String, Value>) {
    for (key, value) in map {
        let path = match prefix {
            Some(prefix) => format!("{prefix}/{key}"),
            None => key.clone(),
        };
        match value {
            Value::Object(child) => collect(Some(&path), child, out),
            leaf => {
                out.insert(path, leaf.clone());
            }
        }
    }
}

fn insert_path(map: &mut Map<String, Value>, path: &str, value: &str) {
    match path.split_once('/') {
        None => {
            map.insert(path.to_string(), Value::String(value.to_string()));
        }
        Some((head, rest)) => {
            let entry = map
                .entry(head)
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(child) = entry {
                insert_path(child, rest, value);
            }
        }
    }
}

fn single(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::MetaPosition;
    use crate::schema::{FormSchema, ResolvedSchema, SchemaNode};

    fn resolved() -> ResolvedSchema {
        let schema = FormSchema::new(
            "survey_v1",
            "survey",
            vec![
                SchemaNode::multi_select("transport", ["ambulance", "bicycle"]),
                SchemaNode::group("ambulance", vec![SchemaNode::scalar("frequency")]),
            ],
        );
        ResolvedSchema::resolve(&schema, MetaPosition::Front).unwrap()
    }

    fn sample() -> Instance {
        Instance::from_json(json!({
            "_xform_id_string": "survey_v1",
            "survey": {
                "transport": "ambulance bicycle",
                "ambulance": {"frequency": "daily"},
                "unknown": {"deep": "x"}
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_nested_dict_with_and_without_meta() {
        let schema = resolved();
        let flattener = Flattener::new(&schema);
        let inner = json!({
            "survey": {
                "transport": "ambulance bicycle",
                "ambulance": {"frequency": "daily"}
            }
        });
        assert_eq!(flattener.to_nested_dict(&sample(), false), inner);
        assert_eq!(
            flattener.to_nested_dict(&sample(), true),
            json!({ "survey": inner })
        );
    }

    #[test]
    fn test_include_meta_only_adds_root_wrapper() {
        let schema = resolved();
        let instance = sample().with_meta("_uuid", "abc");
        let nested = Flattener::new(&schema).to_nested_dict(&instance, true);
        let Value::Object(outer) = &nested else {
            panic!("expected an object, got {nested}");
        };
        assert_eq!(outer.keys().collect::<Vec<_>>(), vec!["survey"]);
        assert!(nested["survey"].get("_uuid").is_none());
        assert_eq!(nested["survey"]["survey"]["ambulance"]["frequency"], "daily");
    }

    #[test]
    fn test_flat_dict() {
        let schema = resolved();
        let flat = Flattener::new(&schema).to_flat_dict(&sample());
        assert_eq!(
            Value::Object(flat),
            json!({
                "_xform_id_string": "survey_v1",
                "survey/transport": "ambulance bicycle",
                "survey/ambulance/frequency": "daily"
            })
        );
    }

    #[test]
    fn test_flatten_nested_matches_flat_dict() {
        let schema = resolved();
        let flattener = Flattener::new(&schema);
        let instance = sample();

        let mut flat = flattener.to_flat_dict(&instance);
        flat.remove("_xform_id_string");
        assert_eq!(flatten_nested(&flattener.to_nested_dict(&instance, false)), flat);
    }
}
