//! Definition model for lore schemas.
//!
//! Definitions live in per-kind tables owned by a [`Schema`](crate::Schema)
//! and refer to each other through small copyable handles ([`TypeId`],
//! [`FieldId`], ...). A definition produced by inheritance carries a `base`
//! handle naming the parent definition it was derived from; the handle never
//! owns its target, so detaching or re-pointing it is a plain assignment.

use serde::{Deserialize, Serialize};

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) usize);

        impl $name {
            /// Position of this definition in its schema table.
            pub fn index(self) -> usize {
                self.0
            }
        }
    };
}

arena_id!(
    /// Handle to a [`TypeDefinition`].
    TypeId
);
arena_id!(
    /// Handle to a [`FieldDefinition`].
    FieldId
);
arena_id!(
    /// Handle to a [`SectionDefinition`].
    SectionId
);
arena_id!(
    /// Handle to a [`CollectionDefinition`].
    CollectionId
);
arena_id!(
    /// Handle to an [`EmbeddedNodeDefinition`].
    EmbeddedId
);
arena_id!(
    /// Handle to a [`PicklistDefinition`].
    PicklistId
);

/// Reference to any definition that can govern a content entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefRef {
    Type(TypeId),
    Field(FieldId),
    Section(SectionId),
    Collection(CollectionId),
    Embedded(EmbeddedId),
}

impl DefRef {
    /// Human-readable kind name, used in diagnostics.
    pub fn kind_name(self) -> &'static str {
        match self {
            DefRef::Type(_) => "type",
            DefRef::Field(_) => "field",
            DefRef::Section(_) => "section",
            DefRef::Collection(_) => "collection",
            DefRef::Embedded(_) => "embedded node",
        }
    }
}

/// How an attribute's value is written and interpreted.
///
/// # Examples
///
/// ```
/// use lore_schema_core::FieldStyle;
///
/// assert_eq!(FieldStyle::default(), FieldStyle::SingleValue);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStyle {
    /// One scalar value (the default).
    #[default]
    SingleValue,
    /// A list of scalar values.
    MultiValue,
    /// Nested key/value attributes described by the field's own `fields`.
    NestedValues,
    /// One value drawn from a named picklist.
    PickList,
    /// Free-form prose.
    Textual,
}

/// A named category of content and the structure it requires.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDefinition {
    pub name: String,
    /// Name of the parent type, as written in the schema text.
    pub extends: Option<String>,
    /// Resolved parent type; set by the merge engine.
    pub parent: Option<TypeId>,
    pub fields: Vec<FieldId>,
    pub sections: Vec<SectionId>,
    pub collections: Vec<CollectionId>,
    pub embedded: Vec<EmbeddedId>,
    /// Reference resolution has completed for this type.
    pub processed: bool,
}

impl TypeDefinition {
    pub(crate) fn new(name: impl Into<String>, extends: Option<String>) -> Self {
        Self {
            name: name.into(),
            extends,
            parent: None,
            fields: Vec::new(),
            sections: Vec::new(),
            collections: Vec::new(),
            embedded: Vec::new(),
            processed: false,
        }
    }
}

/// An attribute a node or section may carry.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub name: String,
    pub required: bool,
    /// Style as written for this entry. `None` takes the base's style; see
    /// [`Schema::field_style`](crate::Schema::field_style).
    pub style: Option<FieldStyle>,
    /// Nested fields, meaningful for [`FieldStyle::NestedValues`].
    pub fields: Vec<FieldId>,
    /// Picklist name, meaningful for [`FieldStyle::PickList`].
    pub picklist_name: Option<String>,
    /// Resolved picklist; set by reference resolution.
    pub picklist: Option<PicklistId>,
    pub base: Option<FieldId>,
}

/// A headed block of a document, possibly containing further sections.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionDefinition {
    pub name: String,
    pub required: bool,
    /// Section body is prose rather than structured attributes.
    pub freeform: bool,
    pub fields: Vec<FieldId>,
    pub sections: Vec<SectionId>,
    pub base: Option<SectionId>,
}

/// An ordered group of nodes of one type, or of nested collections.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionDefinition {
    pub name: String,
    pub required: bool,
    /// Contained type name, as written in the schema text.
    pub contains: Option<String>,
    /// Resolved contained type; set by reference resolution.
    pub contained_type: Option<TypeId>,
    /// Definition of the inner collections for a collection of collections.
    pub nested: Option<CollectionId>,
    pub base: Option<CollectionId>,
}

impl CollectionDefinition {
    /// Returns `true` if the items of this collection are themselves collections.
    pub fn is_collection_of_collections(&self) -> bool {
        self.nested.is_some()
    }
}

/// A node of another type embedded directly inside a node.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedNodeDefinition {
    /// Optional alias; the type name is used when absent.
    pub name: Option<String>,
    pub type_name: String,
    /// Resolved node type; set by reference resolution.
    pub node_type: Option<TypeId>,
    pub required: bool,
    pub base: Option<EmbeddedId>,
}

impl EmbeddedNodeDefinition {
    /// Alias if present, otherwise the embedded type's name.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.type_name)
    }
}

/// A named, optionally hierarchical set of legal values.
///
/// # Examples
///
/// ```
/// use lore_schema_core::{PicklistDefinition, PicklistEntry};
///
/// let alignments = PicklistDefinition {
///     name: "Alignment".into(),
///     entries: vec![
///         PicklistEntry::new("Good").with_entry(PicklistEntry::new("Lawful Good")),
///         PicklistEntry::new("Evil"),
///     ],
/// };
/// assert_eq!(alignments.flatten(), vec!["Good", "Lawful Good", "Evil"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PicklistDefinition {
    pub name: String,
    pub entries: Vec<PicklistEntry>,
}

impl PicklistDefinition {
    /// Every legal value, parents before their children.
    pub fn flatten(&self) -> Vec<&str> {
        let mut values = Vec::new();
        for entry in &self.entries {
            entry.collect_into(&mut values);
        }
        values
    }
}

/// One option of a picklist, with optional sub-options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PicklistEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<PicklistEntry>,
}

impl PicklistEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    /// Adds a sub-option.
    pub fn with_entry(mut self, entry: PicklistEntry) -> Self {
        self.entries.push(entry);
        self
    }

    fn collect_into<'a>(&'a self, values: &mut Vec<&'a str>) {
        values.push(&self.name);
        for entry in &self.entries {
            entry.collect_into(values);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_walks_nested_entries_depth_first() {
        let list = PicklistDefinition {
            name: "Regions".into(),
            entries: vec![
                PicklistEntry::new("North")
                    .with_entry(PicklistEntry::new("Tundra").with_entry(PicklistEntry::new("Ice")))
                    .with_entry(PicklistEntry::new("Taiga")),
                PicklistEntry::new("South"),
            ],
        };
        assert_eq!(
            list.flatten(),
            vec!["North", "Tundra", "Ice", "Taiga", "South"]
        );
    }

    #[test]
    fn test_embedded_display_name_falls_back_to_type() {
        let mut def = EmbeddedNodeDefinition {
            name: None,
            type_name: "Location".into(),
            node_type: None,
            required: false,
            base: None,
        };
        assert_eq!(def.display_name(), "Location");
        def.name = Some("Birthplace".into());
        assert_eq!(def.display_name(), "Birthplace");
    }

    #[test]
    fn test_collection_of_collections_flag() {
        let def = CollectionDefinition {
            name: "Parties".into(),
            required: false,
            contains: None,
            contained_type: None,
            nested: Some(CollectionId(3)),
            base: None,
        };
        assert!(def.is_collection_of_collections());
    }
}
