//! Content documents and binding.
//!
//! Lore files are parsed outside this crate. What reaches it is a neutral
//! [`ContentDocument`] (JSON or YAML) that names, for every node, its type
//! and the schema members its attributes, sections, collections and embedded
//! nodes belong to. [`bind_content`] resolves those names against a loaded
//! [`Schema`] and produces the entity tree the validator consumes.
//!
//! ```yaml
//! nodes:
//!   - type: Hero
//!     name: Ayla
//!     attributes:
//!       - { name: Name, value: Ayla }
//!       - { name: Stats, value: [ { name: Strength, value: 12 } ] }
//!     sections:
//!       - name: History
//!         sections: [ { name: Childhood, text: "Grew up by the sea." } ]
//!     embedded:
//!       - { name: Home, attributes: [ { name: Region, value: Coast } ] }
//! collections:
//!   - name: Cast
//!     nodes: [ { type: Hero, name: Brann } ]
//! ```

use std::path::Path;

use lore_schema_core::{
    AttributeValue, CollectionId, DefRef, EntityId, FieldId, FieldStyle, LoreAttribute,
    LoreCollection, LoreEntity, LoreNode, LoreSection, Schema, SchemaSettings, SectionId, TypeId,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, StoreError};

/// Top-level content: standalone nodes and top-level collections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentDocument {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<ContentNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collections: Vec<ContentCollection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentNode {
    /// Type name. Required for standalone nodes; collection items default to
    /// the collection's contained type and embedded nodes use their
    /// definition's type.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<ContentAttribute>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<ContentSection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collections: Vec<ContentCollection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedded: Vec<ContentNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentSection {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<ContentAttribute>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<ContentSection>,
}

/// A collection holds either nodes or, for a collection of collections,
/// inner collections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentCollection {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<ContentNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collections: Vec<ContentCollection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentAttribute {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ContentValue>,
}

/// An attribute value as written in content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentValue {
    Text(String),
    Number(serde_json::Number),
    Flag(bool),
    List(Vec<String>),
    Nested(Vec<ContentAttribute>),
}

impl ContentDocument {
    /// Reads a content document, choosing JSON or YAML by extension.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidInput`] for any other extension, plus I/O and
    /// parse errors.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = ContentFormat::from_path(path).ok_or_else(|| {
            StoreError::InvalidInput(format!(
                "content file '{}' must end in .json, .yaml or .yml",
                path.display()
            ))
        })?;
        let text = std::fs::read_to_string(path)?;
        match format {
            ContentFormat::Json => Ok(serde_json::from_str(&text)?),
            ContentFormat::Yaml => Ok(serde_yaml::from_str(&text)?),
        }
    }
}

/// Serialized form of a content document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentFormat {
    Json,
    Yaml,
}

impl ContentFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "json" => Some(ContentFormat::Json),
            "yaml" | "yml" => Some(ContentFormat::Yaml),
            _ => None,
        }
    }
}

/// Binds `doc` to `schema`, numbering entities in pre-order from zero.
///
/// Standalone nodes come first, then top-level collections.
///
/// # Errors
///
/// [`StoreError::UnknownType`] or [`StoreError::UnknownMember`] for names
/// the schema does not define, and [`StoreError::InvalidContent`] for
/// content whose shape contradicts its definition.
///
/// # Examples
///
/// ```
/// use lore_schema_core::{validate, EntityId, ValidationState};
/// use lore_schema_db::{bind_content, ContentDocument, SchemaStore};
///
/// let store = SchemaStore::from_yaml(
///     "types:\n  - name: Character\n    fields: [ { name: Name, required: true } ]\n",
/// )
/// .unwrap();
/// let doc: ContentDocument =
///     serde_yaml::from_str("nodes: [ { type: Character, name: Ayla } ]").unwrap();
///
/// let roots = bind_content(store.schema(), store.settings(), &doc).unwrap();
/// let result = validate(store.schema(), store.settings(), &roots);
/// assert_eq!(result.state(EntityId(0)), Some(ValidationState::Failed));
/// ```
pub fn bind_content(
    schema: &Schema,
    settings: &SchemaSettings,
    doc: &ContentDocument,
) -> Result<Vec<LoreEntity>> {
    let mut binder = Binder {
        schema,
        settings,
        next: 0,
    };
    let mut roots = Vec::with_capacity(doc.nodes.len() + doc.collections.len());

    for node in &doc.nodes {
        let type_name = node.node_type.as_deref().ok_or_else(|| {
            StoreError::InvalidContent(format!("node '{}' does not name its type", node.name))
        })?;
        let ty = binder.type_named(type_name)?;
        roots.push(binder.node(node, DefRef::Type(ty), ty)?);
    }
    for collection in &doc.collections {
        let id = schema
            .find_collection(&collection.name, settings)
            .ok_or_else(|| StoreError::UnknownMember {
                owner: "collections".to_string(),
                member: collection.name.clone(),
            })?;
        roots.push(binder.collection(collection, id)?);
    }

    debug!(roots = roots.len(), entities = binder.next, "bound content");
    Ok(roots)
}

struct Binder<'a> {
    schema: &'a Schema,
    settings: &'a SchemaSettings,
    next: usize,
}

impl Binder<'_> {
    fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }

    fn type_named(&self, name: &str) -> Result<TypeId> {
        self.schema
            .find_type(name, self.settings)
            .ok_or_else(|| StoreError::UnknownType(name.to_string()))
    }

    fn node(&mut self, node: &ContentNode, definition: DefRef, ty: TypeId) -> Result<LoreEntity> {
        let schema = self.schema;
        let def = schema.type_def(ty);
        let mut entity = LoreNode::new(self.next_id(), &node.name, definition);

        for child in &node.embedded {
            let id = schema
                .find_embedded(&def.embedded, &child.name, self.settings)
                .ok_or_else(|| unknown_member(&def.name, &child.name))?;
            let embedded = schema.embedded(id);
            let child_ty = embedded
                .node_type
                .ok_or_else(|| StoreError::UnknownType(embedded.type_name.clone()))?;
            entity
                .embedded
                .push(self.node(child, DefRef::Embedded(id), child_ty)?);
        }
        entity.attributes = self.attributes(&def.name, &node.attributes, &def.fields)?;
        entity.sections = self.sections(&def.name, &node.sections, &def.sections)?;
        for child in &node.collections {
            let id = schema
                .find_member_collection(&def.collections, &child.name, self.settings)
                .ok_or_else(|| unknown_member(&def.name, &child.name))?;
            entity.collections.push(self.collection(child, id)?);
        }
        Ok(entity.into())
    }

    fn attributes(
        &mut self,
        owner: &str,
        attributes: &[ContentAttribute],
        fields: &[FieldId],
    ) -> Result<Vec<LoreEntity>> {
        let mut bound = Vec::with_capacity(attributes.len());
        for attribute in attributes {
            let field = self
                .schema
                .find_field(fields, &attribute.name, self.settings)
                .ok_or_else(|| unknown_member(owner, &attribute.name))?;
            let id = self.next_id();
            let value = match &attribute.value {
                None => AttributeValue::Single(String::new()),
                Some(ContentValue::Text(text)) => AttributeValue::Single(text.clone()),
                Some(ContentValue::Number(number)) => AttributeValue::Single(number.to_string()),
                Some(ContentValue::Flag(flag)) => AttributeValue::Single(flag.to_string()),
                Some(ContentValue::List(items)) => AttributeValue::Multi(items.clone()),
                Some(ContentValue::Nested(nested)) => {
                    let schema = self.schema;
                    let def = schema.field(field);
                    if schema.field_style(field) != FieldStyle::NestedValues {
                        return Err(StoreError::InvalidContent(format!(
                            "attribute '{}' has nested values but field '{}' does not",
                            attribute.name, def.name
                        )));
                    }
                    AttributeValue::Nested(self.attributes(&def.name, nested, &def.fields)?)
                }
            };
            bound.push(
                LoreAttribute::new(id, &attribute.name, DefRef::Field(field), value).into(),
            );
        }
        Ok(bound)
    }

    fn sections(
        &mut self,
        owner: &str,
        sections: &[ContentSection],
        defs: &[SectionId],
    ) -> Result<Vec<LoreEntity>> {
        let schema = self.schema;
        let mut bound = Vec::with_capacity(sections.len());
        for section in sections {
            let id = schema
                .find_section(defs, &section.name, self.settings)
                .ok_or_else(|| unknown_member(owner, &section.name))?;
            let def = schema.section(id);
            let mut entity = LoreSection::new(self.next_id(), &section.name, DefRef::Section(id));
            entity.text = section.text.clone();
            entity.attributes = self.attributes(&def.name, &section.attributes, &def.fields)?;
            entity.sections = self.sections(&def.name, &section.sections, &def.sections)?;
            bound.push(entity.into());
        }
        Ok(bound)
    }

    fn collection(
        &mut self,
        collection: &ContentCollection,
        id: CollectionId,
    ) -> Result<LoreEntity> {
        let schema = self.schema;
        let def = schema.collection(id);
        let mut entity =
            LoreCollection::new(self.next_id(), &collection.name, DefRef::Collection(id));

        match def.nested {
            Some(inner) => {
                if !collection.nodes.is_empty() {
                    return Err(StoreError::InvalidContent(format!(
                        "collection '{}' holds collections, not nodes",
                        collection.name
                    )));
                }
                for item in &collection.collections {
                    entity.items.push(self.collection(item, inner)?);
                }
            }
            None => {
                if !collection.collections.is_empty() {
                    return Err(StoreError::InvalidContent(format!(
                        "collection '{}' holds nodes, not collections",
                        collection.name
                    )));
                }
                let contained = def.contained_type.ok_or_else(|| {
                    StoreError::UnknownType(def.contains.clone().unwrap_or_default())
                })?;
                for item in &collection.nodes {
                    let ty = match &item.node_type {
                        Some(name) => self.type_named(name)?,
                        None => contained,
                    };
                    if !schema.is_descendant_of(ty, contained) {
                        return Err(StoreError::InvalidContent(format!(
                            "'{}' in collection '{}' is a {}, not a {}",
                            item.name,
                            collection.name,
                            schema.type_def(ty).name,
                            schema.type_def(contained).name
                        )));
                    }
                    entity.items.push(self.node(item, DefRef::Type(ty), ty)?);
                }
            }
        }
        Ok(entity.into())
    }
}

fn unknown_member(owner: &str, member: &str) -> StoreError {
    StoreError::UnknownMember {
        owner: owner.to_string(),
        member: member.to_string(),
    }
}
