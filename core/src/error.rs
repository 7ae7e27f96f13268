//! Schema-level errors.
//!
//! Every variant aborts a schema load: no partially resolved schema is ever
//! handed to callers. Each carries the names needed to locate the offending
//! definition in the schema text.

use thiserror::Error;

/// Fatal problems found while loading, resolving, or editing a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Two type definitions share a name.
    #[error("duplicate type name: {0}")]
    DuplicateTypeName(String),
    /// Two top-level collection definitions share a name.
    #[error("duplicate collection name: {0}")]
    DuplicateCollectionName(String),
    /// Two picklists share a name.
    #[error("duplicate picklist name: {0}")]
    DuplicatePicklistName(String),
    /// Two entries of one picklist (at any nesting depth) share a name.
    #[error("duplicate entry '{entry}' in picklist '{picklist}'")]
    DuplicatePicklistEntry { picklist: String, entry: String },
    /// Two members of one fields/sections/collections/embedded list share a name.
    #[error("duplicate member '{member}' in '{owner}'")]
    DuplicateMemberName { owner: String, member: String },
    /// A type extends a name that is not a known type.
    #[error("type '{type_name}' extends unknown parent type '{parent}'")]
    UnknownParentType { type_name: String, parent: String },
    /// The `extends` graph contains a cycle.
    #[error("cyclic inheritance detected at type '{type_name}': {}", .cycle.join(" -> "))]
    CyclicInheritance {
        type_name: String,
        cycle: Vec<String>,
    },
    /// A collection names a contained type that does not exist.
    #[error("collection '{collection}' in '{owner}' contains unknown type '{type_name}'")]
    UnknownContainedType {
        owner: String,
        collection: String,
        type_name: String,
    },
    /// A collection declares neither a contained type nor a nested collection.
    #[error("collection '{collection}' in '{owner}' declares no contained type")]
    MissingContainedType { owner: String, collection: String },
    /// An embedded node names a type that does not exist.
    #[error("embedded node '{embedded}' in '{owner}' refers to unknown type '{type_name}'")]
    UnknownEmbeddedType {
        owner: String,
        embedded: String,
        type_name: String,
    },
    /// A pick-list field names a picklist that does not exist.
    #[error("field '{field}' in '{owner}' refers to unknown picklist '{picklist}'")]
    UnknownPicklist {
        owner: String,
        field: String,
        picklist: String,
    },
    /// A pick-list field does not name a picklist at all.
    #[error("pick-list field '{field}' in '{owner}' names no picklist")]
    MissingPicklist { owner: String, field: String },
    /// An edit addressed a type that is not in the schema.
    #[error("unknown type: {0}")]
    UnknownType(String),
}

/// Convenience alias for results with [`SchemaError`].
pub type Result<T> = std::result::Result<T, SchemaError>;
