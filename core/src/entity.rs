//! Content entities.
//!
//! A [`LoreEntity`] is one piece of parsed lore content bound to the
//! definition that governs it. Entity trees are built outside this crate
//! (by a document parser or by `lore-schema-db`'s content binder) and only
//! read here.

use serde::{Deserialize, Serialize};

use crate::types::DefRef;

/// Identity of an entity within one content tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub usize);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Any content entity.
#[derive(Debug, Clone, PartialEq)]
pub enum LoreEntity {
    Node(LoreNode),
    Section(LoreSection),
    Attribute(LoreAttribute),
    Collection(LoreCollection),
}

impl LoreEntity {
    pub fn id(&self) -> EntityId {
        match self {
            LoreEntity::Node(n) => n.id,
            LoreEntity::Section(s) => s.id,
            LoreEntity::Attribute(a) => a.id,
            LoreEntity::Collection(c) => c.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            LoreEntity::Node(n) => &n.name,
            LoreEntity::Section(s) => &s.name,
            LoreEntity::Attribute(a) => &a.name,
            LoreEntity::Collection(c) => &c.name,
        }
    }

    /// The definition this entity was bound to.
    pub fn definition(&self) -> DefRef {
        match self {
            LoreEntity::Node(n) => n.definition,
            LoreEntity::Section(s) => s.definition,
            LoreEntity::Attribute(a) => a.definition,
            LoreEntity::Collection(c) => c.definition,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            LoreEntity::Node(_) => "node",
            LoreEntity::Section(_) => "section",
            LoreEntity::Attribute(_) => "attribute",
            LoreEntity::Collection(_) => "collection",
        }
    }

    /// Direct children, in slot order.
    pub fn children(&self) -> impl Iterator<Item = &LoreEntity> {
        let slots: [&[LoreEntity]; 4] = match self {
            LoreEntity::Node(n) => [&n.embedded, &n.attributes, &n.sections, &n.collections],
            LoreEntity::Section(s) => [&s.attributes, &s.sections, &[], &[]],
            LoreEntity::Attribute(a) => match &a.value {
                AttributeValue::Nested(nested) => [nested, &[], &[], &[]],
                _ => [&[], &[], &[], &[]],
            },
            LoreEntity::Collection(c) => [&c.items, &[], &[], &[]],
        };
        slots.into_iter().flatten()
    }

    /// Number of entities in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.children().map(LoreEntity::count).sum::<usize>()
    }

    /// Finds an entity by id in this subtree.
    pub fn find(&self, id: EntityId) -> Option<&LoreEntity> {
        if self.id() == id {
            return Some(self);
        }
        self.children().find_map(|child| child.find(id))
    }
}

/// An instance of a type: a document, or a node embedded in one.
///
/// Its definition is a [`DefRef::Type`] for top-level nodes and collection
/// items, or a [`DefRef::Embedded`] for embedded nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct LoreNode {
    pub id: EntityId,
    pub name: String,
    pub definition: DefRef,
    pub embedded: Vec<LoreEntity>,
    pub attributes: Vec<LoreEntity>,
    pub sections: Vec<LoreEntity>,
    pub collections: Vec<LoreEntity>,
}

impl LoreNode {
    pub fn new(id: EntityId, name: impl Into<String>, definition: DefRef) -> Self {
        Self {
            id,
            name: name.into(),
            definition,
            embedded: Vec::new(),
            attributes: Vec::new(),
            sections: Vec::new(),
            collections: Vec::new(),
        }
    }

    pub fn with_embedded(mut self, node: impl Into<LoreEntity>) -> Self {
        self.embedded.push(node.into());
        self
    }

    pub fn with_attribute(mut self, attribute: impl Into<LoreEntity>) -> Self {
        self.attributes.push(attribute.into());
        self
    }

    pub fn with_section(mut self, section: impl Into<LoreEntity>) -> Self {
        self.sections.push(section.into());
        self
    }

    pub fn with_collection(mut self, collection: impl Into<LoreEntity>) -> Self {
        self.collections.push(collection.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoreSection {
    pub id: EntityId,
    pub name: String,
    pub definition: DefRef,
    pub attributes: Vec<LoreEntity>,
    pub sections: Vec<LoreEntity>,
    /// Prose body, for freeform sections.
    pub text: Option<String>,
}

impl LoreSection {
    pub fn new(id: EntityId, name: impl Into<String>, definition: DefRef) -> Self {
        Self {
            id,
            name: name.into(),
            definition,
            attributes: Vec::new(),
            sections: Vec::new(),
            text: None,
        }
    }

    pub fn with_attribute(mut self, attribute: impl Into<LoreEntity>) -> Self {
        self.attributes.push(attribute.into());
        self
    }

    pub fn with_section(mut self, section: impl Into<LoreEntity>) -> Self {
        self.sections.push(section.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoreAttribute {
    pub id: EntityId,
    pub name: String,
    pub definition: DefRef,
    pub value: AttributeValue,
}

impl LoreAttribute {
    pub fn new(
        id: EntityId,
        name: impl Into<String>,
        definition: DefRef,
        value: AttributeValue,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            definition,
            value,
        }
    }
}

/// The value carried by an attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Single(String),
    Multi(Vec<String>),
    /// Nested attributes, for nested-value fields.
    Nested(Vec<LoreEntity>),
}

impl AttributeValue {
    /// Returns `true` if the value holds no text and no items.
    pub fn is_empty(&self) -> bool {
        match self {
            AttributeValue::Single(value) => value.trim().is_empty(),
            AttributeValue::Multi(values) => values.iter().all(|v| v.trim().is_empty()),
            AttributeValue::Nested(nested) => nested.is_empty(),
        }
    }

    /// Scalar values, one for a single value and each item for a list.
    pub fn scalars(&self) -> Vec<&str> {
        match self {
            AttributeValue::Single(value) => vec![value.as_str()],
            AttributeValue::Multi(values) => values.iter().map(String::as_str).collect(),
            AttributeValue::Nested(_) => Vec::new(),
        }
    }
}

/// An ordered group of nodes, or of further collections.
#[derive(Debug, Clone, PartialEq)]
pub struct LoreCollection {
    pub id: EntityId,
    pub name: String,
    pub definition: DefRef,
    pub items: Vec<LoreEntity>,
}

impl LoreCollection {
    pub fn new(id: EntityId, name: impl Into<String>, definition: DefRef) -> Self {
        Self {
            id,
            name: name.into(),
            definition,
            items: Vec::new(),
        }
    }

    pub fn with_item(mut self, item: impl Into<LoreEntity>) -> Self {
        self.items.push(item.into());
        self
    }
}

macro_rules! entity_from {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for LoreEntity {
                fn from(value: $ty) -> Self {
                    LoreEntity::$variant(value)
                }
            }
        )*
    };
}

entity_from!(
    LoreNode => Node,
    LoreSection => Section,
    LoreAttribute => Attribute,
    LoreCollection => Collection,
);
