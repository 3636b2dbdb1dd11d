//! Form schema model.
//!
//! A `FormSchema` is the in-memory form definition handed over by the form
//! compiler: the root group name, the declared fields in order, and the
//! metadata headers every export carries. `resolver` turns it into the
//! ordered Header Set and the per-field lookups the flattener needs.

use std::fmt;

pub mod resolver;
pub mod survey;

pub use resolver::{FieldSpec, ResolvedField, ResolvedSchema, resolve_headers};

/// Metadata header holding the form identifier of each submission
pub const XFORM_ID_STRING: &str = "_xform_id_string";

/// The kind of a resolved path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Single value field
    Scalar,
    /// Space-separated set of option tokens
    MultiSelect,
    /// Free text accompanying the `other` option of a multi-select
    MultiSelectOther,
    /// Structural container, never exported as a column
    Group,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Scalar => write!(f, "scalar"),
            FieldKind::MultiSelect => write!(f, "multi-select"),
            FieldKind::MultiSelectOther => write!(f, "multi-select-other"),
            FieldKind::Group => write!(f, "group"),
        }
    }
}

/// A declared node of the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaNode {
    Scalar {
        name: String,
    },
    MultiSelect {
        name: String,
        /// Options in declared order
        options: Vec<String>,
        /// Whether a free-text `<name>_other` answer accompanies the `other` option
        other_text: bool,
    },
    Group {
        name: String,
        children: Vec<SchemaNode>,
    },
}

impl SchemaNode {
    pub fn scalar(name: impl Into<String>) -> Self {
        Self::Scalar { name: name.into() }
    }

    pub fn multi_select<I, S>(name: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MultiSelect {
            name: name.into(),
            options: options.into_iter().map(Into::into).collect(),
            other_text: false,
        }
    }

    /// A multi-select whose `other` option carries a free-text answer
    pub fn multi_select_with_other<I, S>(name: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MultiSelect {
            name: name.into(),
            options: options.into_iter().map(Into::into).collect(),
            other_text: true,
        }
    }

    pub fn group(name: impl Into<String>, children: Vec<SchemaNode>) -> Self {
        Self::Group {
            name: name.into(),
            children,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Scalar { name } | Self::MultiSelect { name, .. } | Self::Group { name, .. } => {
                name
            }
        }
    }

    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        match self {
            Self::Scalar { .. } => FieldKind::Scalar,
            Self::MultiSelect { .. } => FieldKind::MultiSelect,
            Self::Group { .. } => FieldKind::Group,
        }
    }
}

/// A form definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSchema {
    /// Form identifier submissions are tagged with
    pub id_string: String,
    /// Name of the root group; prefixes every path
    pub root: String,
    /// Top-level nodes in declared order
    pub children: Vec<SchemaNode>,
    /// Metadata columns added to every export
    pub additional_headers: Vec<String>,
}

impl FormSchema {
    pub fn new(
        id_string: impl Into<String>,
        root: impl Into<String>,
        children: Vec<SchemaNode>,
    ) -> Self {
        Self {
            id_string: id_string.into(),
            root: root.into(),
            children,
            additional_headers: vec![XFORM_ID_STRING.to_string()],
        }
    }

    /// Replace the metadata headers
    #[must_use]
    pub fn with_additional_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.additional_headers = headers.into_iter().map(Into::into).collect();
        self
    }
}
