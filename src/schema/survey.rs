//! Loading form schemas from compiled survey documents.
//!
//! The form compiler emits a JSON survey tree:
//!
//! ```json
//! {"type": "survey", "name": "transportation", "id_string": "transportation_2011_07_25",
//!  "children": [{"type": "select all that apply", "name": "...", "children": [{"name": "ambulance"}]},
//!               {"type": "group", "name": "ambulance", "children": [...]}]}
//! ```

use std::path::Path;

use serde::Deserialize;

use super::{FormSchema, SchemaNode};
use crate::error::{Result, SchemaError};
use crate::flatten::OTHER_OPTION;

#[derive(Debug, Deserialize)]
struct SurveyElement {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    id_string: Option<String>,
    #[serde(default)]
    children: Vec<SurveyElement>,
    /// Some compiler versions list select options here instead of `children`
    #[serde(default)]
    choices: Vec<SurveyElement>,
}

enum ElementKind {
    Container,
    MultiSelect { other_text: bool },
    NoData,
    Scalar,
}

fn classify(kind: &str) -> ElementKind {
    let kind = kind.trim().to_ascii_lowercase();
    match kind.as_str() {
        "group" | "repeat" => ElementKind::Container,
        "note" => ElementKind::NoData,
        k if k.starts_with("select all that apply") || k.starts_with("select_multiple") => {
            ElementKind::MultiSelect {
                other_text: k.ends_with("or specify other") || k.ends_with("or_other"),
            }
        }
        _ => ElementKind::Scalar,
    }
}

impl FormSchema {
    /// Build a schema from a compiled survey document
    pub fn from_survey_json(json: &str) -> Result<Self> {
        let survey: SurveyElement = serde_json::from_str(json)?;
        Ok(Self::from_survey(survey)?)
    }

    /// Read a compiled survey document from disk
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_survey_json(&json)
    }

    fn from_survey(survey: SurveyElement) -> std::result::Result<Self, SchemaError> {
        if survey.name.trim().is_empty() {
            return Err(SchemaError::MissingRoot);
        }
        let id_string = survey.id_string.unwrap_or_else(|| survey.name.clone());
        let children = convert_children(survey.children);
        log::debug!(
            "Loaded survey '{}' with {} top-level nodes",
            id_string,
            children.len()
        );
        Ok(Self::new(id_string, survey.name, children))
    }
}

fn convert_children(elements: Vec<SurveyElement>) -> Vec<SchemaNode> {
    // Free-text companions of "or specify other" selects are folded into the select
    let absorbed: Vec<String> = elements
        .iter()
        .filter(|e| matches!(classify(&e.kind), ElementKind::MultiSelect { other_text: true }))
        .map(|e| format!("{}_other", e.name))
        .collect();

    elements
        .into_iter()
        .filter_map(|element| match classify(&element.kind) {
            ElementKind::Container => Some(SchemaNode::group(
                element.name,
                convert_children(element.children),
            )),
            ElementKind::NoData => None,
            ElementKind::MultiSelect { other_text } => {
                let choices = if element.children.is_empty() {
                    element.choices
                } else {
                    element.children
                };
                let mut options: Vec<String> = choices.into_iter().map(|c| c.name).collect();
                if other_text && !options.iter().any(|o| o == OTHER_OPTION) {
                    options.push(OTHER_OPTION.to_string());
                }
                Some(SchemaNode::MultiSelect {
                    name: element.name,
                    options,
                    other_text,
                })
            }
            ElementKind::Scalar if absorbed.contains(&element.name) => None,
            ElementKind::Scalar => Some(SchemaNode::scalar(element.name)),
        })
        .collect()
}
