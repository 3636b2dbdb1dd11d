//! Header resolution for form schemas.
//!
//! Resolution walks the declared nodes once, in order, and records:
//!
//! * the Header Set: scalar paths, `<path>/<option>` for every option of a
//!   multi-select, `<path>_other` right after the options when the select
//!   carries free text, with the metadata headers in front (or at the back);
//! * one `ResolvedField` per exportable path, in the same order;
//! * the group paths, which are tracked for collision checks and never
//!   become headers.
//!
//! The result depends on nothing but the schema and can be shared between
//! exports.

use rustc_hash::{FxHashMap, FxHashSet};

use super::{FieldKind, FormSchema, SchemaNode};
use crate::config::MetaPosition;
use crate::error::SchemaError;

/// What the flattener needs to know about an exportable path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSpec {
    Scalar,
    MultiSelect { options: Vec<String> },
    /// Free text of the multi-select at `select`
    OtherText { select: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
    pub path: String,
    pub spec: FieldSpec,
}

impl ResolvedField {
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        match self.spec {
            FieldSpec::Scalar => FieldKind::Scalar,
            FieldSpec::MultiSelect { .. } => FieldKind::MultiSelect,
            FieldSpec::OtherText { .. } => FieldKind::MultiSelectOther,
        }
    }

    /// Headers this field contributes, in order
    #[must_use]
    pub fn headers(&self) -> Vec<String> {
        match &self.spec {
            FieldSpec::MultiSelect { options } => options
                .iter()
                .map(|option| format!("{}/{option}", self.path))
                .collect(),
            FieldSpec::Scalar | FieldSpec::OtherText { .. } => vec![self.path.clone()],
        }
    }
}

/// A schema with its Header Set and lookups computed
#[derive(Debug, Clone)]
pub struct ResolvedSchema {
    id_string: String,
    root: String,
    meta_headers: Vec<String>,
    headers: Vec<String>,
    field_header_range: std::ops::Range<usize>,
    fields: Vec<ResolvedField>,
    index: FxHashMap<String, usize>,
    groups: FxHashSet<String>,
}

impl ResolvedSchema {
    /// Resolve a schema, failing on any path collision
    pub fn resolve(schema: &FormSchema, meta_position: MetaPosition) -> Result<Self, SchemaError> {
        validate_name(&schema.root)?;

        let mut walker = Walker::default();
        walker.groups.insert(schema.root.clone());
        walker.claimed.insert(schema.root.clone());
        walker.walk(&schema.root, &schema.children)?;

        let field_headers: Vec<String> = walker
            .fields
            .iter()
            .flat_map(ResolvedField::headers)
            .collect();

        let mut claimed: FxHashSet<&str> = FxHashSet::default();
        for header in field_headers.iter().chain(&schema.additional_headers) {
            if !claimed.insert(header.as_str()) || walker.groups.contains(header) {
                return Err(SchemaError::PathCollision {
                    path: header.clone(),
                });
            }
        }

        let meta = schema.additional_headers.len();
        let fields_len = field_headers.len();
        let (headers, field_header_range) = match meta_position {
            MetaPosition::Front => (
                schema
                    .additional_headers
                    .iter()
                    .cloned()
                    .chain(field_headers)
                    .collect::<Vec<_>>(),
                meta..meta + fields_len,
            ),
            MetaPosition::Back => (
                field_headers
                    .into_iter()
                    .chain(schema.additional_headers.iter().cloned())
                    .collect::<Vec<_>>(),
                0..fields_len,
            ),
        };

        let index = walker
            .fields
            .iter()
            .enumerate()
            .map(|(i, field)| (field.path.clone(), i))
            .collect();

        log::debug!(
            "Resolved {} headers ({} fields, {} groups) for form {}",
            headers.len(),
            walker.fields.len(),
            walker.groups.len(),
            schema.id_string
        );

        Ok(Self {
            id_string: schema.id_string.clone(),
            root: schema.root.clone(),
            meta_headers: schema.additional_headers.clone(),
            headers,
            field_header_range,
            fields: walker.fields,
            index,
            groups: walker.groups,
        })
    }

    #[must_use]
    pub fn id_string(&self) -> &str {
        &self.id_string
    }

    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// The full Header Set, metadata headers included
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Headers derived from schema fields only
    #[must_use]
    pub fn field_headers(&self) -> &[String] {
        &self.headers[self.field_header_range.clone()]
    }

    #[must_use]
    pub fn meta_headers(&self) -> &[String] {
        &self.meta_headers
    }

    /// Exportable fields in schema order
    #[must_use]
    pub fn fields(&self) -> &[ResolvedField] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, path: &str) -> Option<&ResolvedField> {
        self.index.get(path).map(|&i| &self.fields[i])
    }

    /// Whether `path` is an exportable field
    #[must_use]
    pub fn is_known(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    #[must_use]
    pub fn is_multi_select(&self, path: &str) -> bool {
        self.field(path)
            .is_some_and(|field| field.kind() == FieldKind::MultiSelect)
    }

    /// Declared options of a multi-select; empty for any other path
    #[must_use]
    pub fn options_of(&self, path: &str) -> &[String] {
        match self.field(path).map(|field| &field.spec) {
            Some(FieldSpec::MultiSelect { options }) => options,
            _ => &[],
        }
    }

    #[must_use]
    pub fn kind_of(&self, path: &str) -> Option<FieldKind> {
        if self.groups.contains(path) {
            return Some(FieldKind::Group);
        }
        self.field(path).map(ResolvedField::kind)
    }
}

/// Resolve the Header Set of a schema with metadata headers in front
pub fn resolve_headers(schema: &FormSchema) -> Result<Vec<String>, SchemaError> {
    ResolvedSchema::resolve(schema, MetaPosition::Front).map(|resolved| resolved.headers)
}

#[derive(Default)]
struct Walker {
    fields: Vec<ResolvedField>,
    groups: FxHashSet<String>,
    claimed: FxHashSet<String>,
}

impl Walker {
    fn walk(&mut self, prefix: &str, nodes: &[SchemaNode]) -> Result<(), SchemaError> {
        for node in nodes {
            validate_name(node.name())?;
            let path = format!("{prefix}/{}", node.name());
            match node {
                SchemaNode::Scalar { .. } => self.push(path, FieldSpec::Scalar)?,
                SchemaNode::MultiSelect {
                    options,
                    other_text,
                    ..
                } => {
                    let mut seen = FxHashSet::default();
                    for option in options {
                        validate_name(option)?;
                        if !seen.insert(option.as_str()) {
                            return Err(SchemaError::DuplicateOption {
                                path,
                                option: option.clone(),
                            });
                        }
                    }
                    self.push(
                        path.clone(),
                        FieldSpec::MultiSelect {
                            options: options.clone(),
                        },
                    )?;
                    if *other_text {
                        self.push(format!("{path}_other"), FieldSpec::OtherText { select: path })?;
                    }
                }
                SchemaNode::Group { children, .. } => {
                    self.claim(&path)?;
                    self.groups.insert(path.clone());
                    self.walk(&path, children)?;
                }
            }
        }
        Ok(())
    }

    fn push(&mut self, path: String, spec: FieldSpec) -> Result<(), SchemaError> {
        self.claim(&path)?;
        self.fields.push(ResolvedField { path, spec });
        Ok(())
    }

    fn claim(&mut self, path: &str) -> Result<(), SchemaError> {
        if self.claimed.insert(path.to_string()) {
            Ok(())
        } else {
            Err(SchemaError::PathCollision {
                path: path.to_string(),
            })
        }
    }
}

fn validate_name(name: &str) -> Result<(), SchemaError> {
    let reason = if name.is_empty() {
        "name is empty"
    } else if name.contains('/') {
        "name contains '/'"
    } else if name.chars().any(char::is_whitespace) {
        "name contains whitespace"
    } else {
        return Ok(());
    };
    Err(SchemaError::InvalidName {
        name: name.to_string(),
        reason,
    })
}
