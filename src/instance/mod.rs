//! Submission instances.
//!
//! An `Instance` is one parsed submission: the answers under the form's root
//! group plus the metadata it was tagged with on ingestion. Instances are
//! never mutated after construction.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{ExportError, Result};
use crate::schema::XFORM_ID_STRING;

/// A node of a submitted answer tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceNode {
    Value(String),
    Group(BTreeMap<String, InstanceNode>),
}

impl InstanceNode {
    pub fn value(value: impl Into<String>) -> Self {
        Self::Value(value.into())
    }

    pub fn group<I, K>(children: I) -> Self
    where
        I: IntoIterator<Item = (K, InstanceNode)>,
        K: Into<String>,
    {
        Self::Group(children.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Best-effort conversion of a JSON document. `None` means unanswered.
    #[must_use]
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(Self::Value(s)),
            Value::Bool(b) => Some(Self::Value(b.to_string())),
            Value::Number(n) => Some(Self::Value(n.to_string())),
            Value::Array(items) => {
                if items.len() > 1 {
                    log::warn!(
                        "Exporting first of {} repeated entries, dropping the rest",
                        items.len()
                    );
                }
                items.into_iter().find_map(Self::from_json)
            }
            Value::Object(map) => Some(Self::Group(
                map.into_iter()
                    .filter_map(|(k, v)| Self::from_json(v).map(|node| (k, node)))
                    .collect(),
            )),
        }
    }
}

/// One submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    /// `None` when the submission carries no `_xform_id_string` tag
    id_string: Option<String>,
    root: String,
    answers: BTreeMap<String, InstanceNode>,
    meta: BTreeMap<String, String>,
}

impl Instance {
    pub fn new(
        id_string: impl Into<String>,
        root: impl Into<String>,
        answers: BTreeMap<String, InstanceNode>,
    ) -> Self {
        Self {
            id_string: Some(id_string.into()),
            root: root.into(),
            answers,
            meta: BTreeMap::new(),
        }
    }

    /// Attach a metadata value such as `_uuid` or `_submission_time`
    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Decode a submission envelope.
    ///
    /// The envelope is an object whose single key without a leading `_` names
    /// the root group; `_`-prefixed keys are metadata and `_xform_id_string`,
    /// when present, tags the form.
    pub fn from_json(value: Value) -> Result<Self> {
        let Value::Object(envelope) = value else {
            return Err(ExportError::InvalidInstance(
                "submission is not a JSON object".to_string(),
            ));
        };

        let mut root = None;
        let mut meta = BTreeMap::new();
        for (key, value) in envelope {
            if key.starts_with('_') {
                if let Some(InstanceNode::Value(v)) = InstanceNode::from_json(value) {
                    meta.insert(key, v);
                }
                continue;
            }
            if root.is_some() {
                return Err(ExportError::InvalidInstance(format!(
                    "submission has more than one root group (second: '{key}')"
                )));
            }
            root = Some((key, value));
        }

        let Some((root, body)) = root else {
            return Err(ExportError::InvalidInstance(
                "submission has no root group".to_string(),
            ));
        };
        let answers = match InstanceNode::from_json(body) {
            Some(InstanceNode::Group(answers)) => answers,
            None => BTreeMap::new(),
            Some(InstanceNode::Value(_)) => {
                return Err(ExportError::InvalidInstance(format!(
                    "root '{root}' is not a group"
                )));
            }
        };
        let id_string = meta.remove(XFORM_ID_STRING);

        Ok(Self {
            id_string,
            root,
            answers,
            meta,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_json(serde_json::from_str(json)?)
    }

    /// Form tag of the submission, if it carried one
    #[must_use]
    pub fn id_string(&self) -> Option<&str> {
        self.id_string.as_deref()
    }

    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    #[must_use]
    pub const fn answers(&self) -> &BTreeMap<String, InstanceNode> {
        &self.answers
    }

    /// Value of a metadata header for this submission
    #[must_use]
    pub fn meta_value(&self, header: &str) -> Option<&str> {
        if header == XFORM_ID_STRING {
            return self.id_string();
        }
        self.meta.get(header).map(String::as_str)
    }

    /// Every answered leaf as a root-prefixed path, in path order
    #[must_use]
    pub fn leaves(&self) -> Vec<(String, &str)> {
        let mut out = Vec::new();
        collect_leaves(&self.root, &self.answers, &mut out);
        out
    }
}

fn collect_leaves<'a>(
    prefix: &str,
    children: &'a BTreeMap<String, InstanceNode>,
    out: &mut Vec<(String, &'a str)>,
) {
    for (name, node) in children {
        let path = format!("{prefix}/{name}");
        match node {
            InstanceNode::Value(value) => out.push((path, value)),
            InstanceNode::Group(grandchildren) => collect_leaves(&path, grandchildren, out),
        }
    }
}
