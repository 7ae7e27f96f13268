//! Core lore schema model, inheritance engine, and content validator.
//!
//! A lore schema describes the categories of world-building content (types
//! such as `Character` or `Location`) and the structure each must have:
//!
//! - [`TypeDefinition`]: a named type, optionally extending one parent type.
//! - [`FieldDefinition`], [`SectionDefinition`], [`CollectionDefinition`],
//!   [`EmbeddedNodeDefinition`]: the structural members of a type.
//! - [`PicklistDefinition`]: a named, possibly hierarchical option set for
//!   pick-list fields.
//!
//! Loading ([`Schema::from_document`]) orders types by inheritance
//! ([`resolve_order`]), merges every parent's structure into its children,
//! and resolves picklist and type references. Each inherited definition keeps
//! a handle to the definition it came from, so [`Schema::is_modified`] can
//! tell author overrides from untouched inheritance and [`prune`] can persist
//! only the overrides.
//!
//! Validation ([`validate`]) checks a tree of [`LoreEntity`] values against
//! the resolved schema and reports a [`ValidationState`] per entity.
//!
//! # Example
//!
//! ```
//! use lore_schema_core::*;
//!
//! let settings = SchemaSettings::default();
//! let doc = SchemaDocument::default()
//!     .with_picklist(PicklistDocument::flat("Alignments", &["Good", "Evil"]))
//!     .with_type(
//!         TypeDocument::new("Character")
//!             .with_field(FieldDocument::required("Name"))
//!             .with_field(FieldDocument::pick_list("Alignment", "Alignments")),
//!     )
//!     .with_type(TypeDocument::new("Villain").extending("Character"));
//! let schema = Schema::from_document(&doc, &settings).unwrap();
//!
//! let villain = schema.find_type("Villain", &settings).unwrap();
//! let alignment = schema
//!     .find_field(&schema.type_def(villain).fields, "Alignment", &settings)
//!     .unwrap();
//!
//! let node = LoreNode::new(EntityId(0), "Morgath", DefRef::Type(villain)).with_attribute(
//!     LoreAttribute::new(
//!         EntityId(1),
//!         "Alignment",
//!         DefRef::Field(alignment),
//!         AttributeValue::Single("Neutral".into()),
//!     ),
//! );
//! let result = validate(&schema, &settings, &[node.into()]);
//!
//! assert_eq!(result.error_count(), 2);
//! assert_eq!(result.state(EntityId(0)), Some(ValidationState::Failed));
//! assert_eq!(result.state(EntityId(1)), Some(ValidationState::Failed));
//!
//! // Villain adds nothing of its own, so only the type header is persisted.
//! let pruned = prune(&schema, &settings);
//! assert!(pruned.types[1].fields.is_empty());
//! ```

mod document;
mod entity;
mod error;
mod inheritance;
mod merge;
mod prune;
mod references;
mod schema;
mod settings;
mod types;
mod validate;

pub use document::{
    CollectionDocument, EmbeddedDocument, FieldDocument, PicklistDocument, SchemaDocument,
    SectionDocument, TypeDocument,
};
pub use entity::{
    AttributeValue, EntityId, LoreAttribute, LoreCollection, LoreEntity, LoreNode, LoreSection,
};
pub use error::{Result, SchemaError};
pub use inheritance::{InheritanceStep, resolve_order};
pub use merge::{apply_inheritance, merge_type};
pub use prune::prune;
pub use references::resolve_references;
pub use schema::Schema;
pub use settings::{SchemaSettings, SortKey};
pub use types::*;
pub use validate::{ValidationResult, ValidationState, validate};
