//! Serializable schema text model.
//!
//! [`SchemaDocument`] mirrors the persisted schema exactly: names are plain
//! strings and nothing is resolved. [`Schema::from_document`](crate::Schema::from_document)
//! turns it into a resolved definition graph; [`Schema::to_document`](crate::Schema::to_document)
//! and [`prune`](crate::prune) turn a graph back into one.
//!
//! Empty lists and default scalars are omitted on output so that delta-only
//! documents stay small.

use serde::{Deserialize, Serialize};

use crate::settings::SchemaSettings;
use crate::types::{FieldStyle, PicklistEntry};

fn is_false(value: &bool) -> bool {
    !*value
}

/// Top-level schema text: settings plus three ordered definition lists.
///
/// # Examples
///
/// ```
/// use lore_schema_core::*;
///
/// let doc = SchemaDocument::default()
///     .with_type(TypeDocument::new("Character").with_field(FieldDocument::required("Name")))
///     .with_type(TypeDocument::new("Hero").extending("Character"));
///
/// let schema = Schema::from_document(&doc, &doc.settings).unwrap();
/// let hero = schema.find_type("Hero", &doc.settings).unwrap();
/// assert_eq!(schema.type_def(hero).fields.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(default)]
    pub settings: SchemaSettings,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<TypeDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collections: Vec<CollectionDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub picklists: Vec<PicklistDocument>,
}

impl SchemaDocument {
    /// Adds a type definition.
    pub fn with_type(mut self, def: TypeDocument) -> Self {
        self.types.push(def);
        self
    }

    /// Adds a top-level collection definition.
    pub fn with_collection(mut self, def: CollectionDocument) -> Self {
        self.collections.push(def);
        self
    }

    /// Adds a picklist.
    pub fn with_picklist(mut self, def: PicklistDocument) -> Self {
        self.picklists.push(def);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeDocument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<SectionDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collections: Vec<CollectionDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedded: Vec<EmbeddedDocument>,
}

impl TypeDocument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets the parent type.
    pub fn extending(mut self, parent: impl Into<String>) -> Self {
        self.extends = Some(parent.into());
        self
    }

    pub fn with_field(mut self, field: FieldDocument) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_section(mut self, section: SectionDocument) -> Self {
        self.sections.push(section);
        self
    }

    pub fn with_collection(mut self, collection: CollectionDocument) -> Self {
        self.collections.push(collection);
        self
    }

    pub fn with_embedded(mut self, embedded: EmbeddedDocument) -> Self {
        self.embedded.push(embedded);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDocument {
    pub name: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    /// Left out on an override to keep the parent's style.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<FieldStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picklist: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDocument>,
}

impl FieldDocument {
    /// An optional single-value field.
    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// A required single-value field.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
            ..Default::default()
        }
    }

    /// A field whose value must come from `picklist`.
    pub fn pick_list(name: impl Into<String>, picklist: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            style: Some(FieldStyle::PickList),
            picklist: Some(picklist.into()),
            ..Default::default()
        }
    }

    pub fn with_style(mut self, style: FieldStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Adds a nested field (implies [`FieldStyle::NestedValues`] when the style is unset).
    pub fn with_field(mut self, field: FieldDocument) -> Self {
        self.style.get_or_insert(FieldStyle::NestedValues);
        self.fields.push(field);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionDocument {
    pub name: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub freeform: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<SectionDocument>,
}

impl SectionDocument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn freeform(mut self) -> Self {
        self.freeform = true;
        self
    }

    pub fn with_field(mut self, field: FieldDocument) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_section(mut self, section: SectionDocument) -> Self {
        self.sections.push(section);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionDocument {
    pub name: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    /// Name of the type held by this collection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains: Option<String>,
    /// Inner collection definition for a collection of collections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<Box<CollectionDocument>>,
}

impl CollectionDocument {
    /// A collection of nodes of type `contains`.
    pub fn of(name: impl Into<String>, contains: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contains: Some(contains.into()),
            ..Default::default()
        }
    }

    /// A collection whose items are collections described by `inner`.
    pub fn of_collections(name: impl Into<String>, inner: CollectionDocument) -> Self {
        Self {
            name: name.into(),
            collection: Some(Box::new(inner)),
            ..Default::default()
        }
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
}

impl EmbeddedDocument {
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            ..Default::default()
        }
    }

    /// Sets an alias distinct from the type name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PicklistDocument {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<PicklistEntry>,
}

impl PicklistDocument {
    /// A flat picklist with the given options.
    pub fn flat(name: impl Into<String>, options: &[&str]) -> Self {
        Self {
            name: name.into(),
            entries: options.iter().map(|o| PicklistEntry::new(*o)).collect(),
        }
    }
}
