//! Inheritance merging.
//!
//! For a child type and its parent, every parent field, section, collection,
//! and embedded-node definition ends up in the child's matching list:
//!
//! - A child entry whose name matches a parent entry is an override. It keeps
//!   its own values, and its `base` is pointed at the parent entry.
//! - A parent entry the child does not mention is copied into the child as an
//!   unmodified inherited entry whose `base` is the parent entry.
//!
//! Nested fields and sections are matched the same way, to any depth. The
//! merged list holds inherited entries in parent order followed by the
//! child's own additions in declaration order, so merging an already merged
//! type changes nothing.
//!
//! # Example
//!
//! ```
//! use lore_schema_core::*;
//!
//! let settings = SchemaSettings::default();
//! let doc = SchemaDocument::default()
//!     .with_type(
//!         TypeDocument::new("Person")
//!             .with_field(FieldDocument::optional("Name"))
//!             .with_field(FieldDocument::optional("Age")),
//!     )
//!     .with_type(
//!         TypeDocument::new("Hero")
//!             .extending("Person")
//!             .with_field(FieldDocument::required("Title"))
//!             .with_field(FieldDocument::required("Name")),
//!     );
//! let schema = Schema::from_document(&doc, &settings).unwrap();
//!
//! let hero = schema.type_def(schema.find_type("Hero", &settings).unwrap());
//! let names: Vec<_> = hero.fields.iter().map(|&f| schema.field(f).name.as_str()).collect();
//! assert_eq!(names, vec!["Name", "Age", "Title"]);
//! ```

use tracing::debug;

use crate::inheritance::InheritanceStep;
use crate::schema::{Member, Schema};
use crate::settings::SchemaSettings;
use crate::types::{
    CollectionDefinition, EmbeddedNodeDefinition, FieldDefinition, SectionDefinition, TypeId,
};

/// Per-kind behavior for copying, linking, and detaching inherited entries.
pub(crate) trait Inherit: Member {
    /// Merges the nested members of override `id` against those of `base`.
    fn merge_nested(schema: &mut Schema, id: Self::Id, base: Self::Id, settings: &SchemaSettings);

    /// Deep-copies `base`, linking every copy to the entry it was copied from.
    fn inherit(schema: &mut Schema, base: Self::Id) -> Self::Id;

    /// Clears `base` on `id` and everything nested inside it.
    fn detach(schema: &mut Schema, id: Self::Id);
}

impl Inherit for FieldDefinition {
    fn merge_nested(schema: &mut Schema, id: Self::Id, base: Self::Id, settings: &SchemaSettings) {
        let own = schema.field(id).clone();
        let inherited = schema.field(base).clone();
        let fields =
            merge_members::<FieldDefinition>(schema, &own.fields, &inherited.fields, settings);

        let def = schema.member_mut::<FieldDefinition>(id);
        def.fields = fields;
        if def.picklist_name.is_none() {
            def.picklist_name = inherited.picklist_name;
        }
    }

    fn inherit(schema: &mut Schema, base: Self::Id) -> Self::Id {
        let template = schema.field(base).clone();
        let fields = template
            .fields
            .iter()
            .map(|&nested| Self::inherit(schema, nested))
            .collect();
        schema.alloc(FieldDefinition {
            fields,
            base: Some(base),
            ..template
        })
    }

    fn detach(schema: &mut Schema, id: Self::Id) {
        let style = schema.field_style(id);
        let def = schema.member_mut::<FieldDefinition>(id);
        def.style = Some(style);
        def.base = None;
        for nested in def.fields.clone() {
            Self::detach(schema, nested);
        }
    }
}

impl Inherit for SectionDefinition {
    fn merge_nested(schema: &mut Schema, id: Self::Id, base: Self::Id, settings: &SchemaSettings) {
        let own = schema.section(id).clone();
        let inherited = schema.section(base).clone();
        let fields =
            merge_members::<FieldDefinition>(schema, &own.fields, &inherited.fields, settings);
        let sections = merge_members::<SectionDefinition>(
            schema,
            &own.sections,
            &inherited.sections,
            settings,
        );

        let def = schema.member_mut::<SectionDefinition>(id);
        def.fields = fields;
        def.sections = sections;
    }

    fn inherit(schema: &mut Schema, base: Self::Id) -> Self::Id {
        let template = schema.section(base).clone();
        let fields = template
            .fields
            .iter()
            .map(|&f| FieldDefinition::inherit(schema, f))
            .collect();
        let sections = template
            .sections
            .iter()
            .map(|&s| Self::inherit(schema, s))
            .collect();
        schema.alloc(SectionDefinition {
            fields,
            sections,
            base: Some(base),
            ..template
        })
    }

    fn detach(schema: &mut Schema, id: Self::Id) {
        let def = schema.member_mut::<SectionDefinition>(id);
        def.base = None;
        let (fields, sections) = (def.fields.clone(), def.sections.clone());
        for field in fields {
            FieldDefinition::detach(schema, field);
        }
        for section in sections {
            Self::detach(schema, section);
        }
    }
}

impl Inherit for CollectionDefinition {
    fn merge_nested(schema: &mut Schema, id: Self::Id, base: Self::Id, settings: &SchemaSettings) {
        let own = schema.collection(id).clone();
        let inherited = schema.collection(base).clone();

        match (own.nested, inherited.nested) {
            (Some(nested), Some(base_nested)) => {
                schema
                    .member_mut::<CollectionDefinition>(nested)
                    .set_base(Some(base_nested));
                Self::merge_nested(schema, nested, base_nested, settings);
            }
            // An override that names no content takes the parent's.
            (None, base_nested) if own.contains.is_none() => {
                let nested = base_nested.map(|n| Self::inherit(schema, n));
                let def = schema.member_mut::<CollectionDefinition>(id);
                def.contains = inherited.contains;
                def.nested = nested;
            }
            _ => {}
        }
    }

    fn inherit(schema: &mut Schema, base: Self::Id) -> Self::Id {
        let template = schema.collection(base).clone();
        let nested = template.nested.map(|n| Self::inherit(schema, n));
        schema.alloc(CollectionDefinition {
            nested,
            base: Some(base),
            ..template
        })
    }

    fn detach(schema: &mut Schema, id: Self::Id) {
        let def = schema.member_mut::<CollectionDefinition>(id);
        def.base = None;
        if let Some(nested) = def.nested {
            Self::detach(schema, nested);
        }
    }
}

impl Inherit for EmbeddedNodeDefinition {
    fn merge_nested(_: &mut Schema, _: Self::Id, _: Self::Id, _: &SchemaSettings) {}

    fn inherit(schema: &mut Schema, base: Self::Id) -> Self::Id {
        let template = schema.embedded(base).clone();
        schema.alloc(EmbeddedNodeDefinition {
            base: Some(base),
            ..template
        })
    }

    fn detach(schema: &mut Schema, id: Self::Id) {
        schema.member_mut::<EmbeddedNodeDefinition>(id).base = None;
    }
}

/// Merges every type that has a parent, in the given parents-first order.
pub fn apply_inheritance(
    schema: &mut Schema,
    steps: &[InheritanceStep],
    settings: &SchemaSettings,
) {
    for step in steps {
        if let Some(parent) = step.parent {
            merge_type(schema, step.type_id, parent, settings);
        }
    }
}

/// Merges `parent`'s structure into `child` and links `child` to it.
///
/// `parent` must already be merged with its own ancestors.
pub fn merge_type(schema: &mut Schema, child: TypeId, parent: TypeId, settings: &SchemaSettings) {
    let own = schema.type_def(child).clone();
    let base = schema.type_def(parent).clone();

    let fields = merge_members::<FieldDefinition>(schema, &own.fields, &base.fields, settings);
    let sections =
        merge_members::<SectionDefinition>(schema, &own.sections, &base.sections, settings);
    let collections = merge_members::<CollectionDefinition>(
        schema,
        &own.collections,
        &base.collections,
        settings,
    );
    let embedded =
        merge_members::<EmbeddedNodeDefinition>(schema, &own.embedded, &base.embedded, settings);

    let def = &mut schema.types[child.index()];
    def.parent = Some(parent);
    def.fields = fields;
    def.sections = sections;
    def.collections = collections;
    def.embedded = embedded;

    debug!(
        type_name = %def.name,
        parent = %base.name,
        fields = def.fields.len(),
        sections = def.sections.len(),
        collections = def.collections.len(),
        embedded = def.embedded.len(),
        "merged inherited definitions"
    );
}

fn merge_members<M: Inherit>(
    schema: &mut Schema,
    own: &[M::Id],
    inherited: &[M::Id],
    settings: &SchemaSettings,
) -> Vec<M::Id> {
    let own_keys: Vec<String> = own
        .iter()
        .map(|&id| settings.name_key(schema.member::<M>(id).key()))
        .collect();
    let mut claimed = vec![false; own.len()];
    let mut merged = Vec::with_capacity(own.len().max(inherited.len()));

    for &base in inherited {
        let key = settings.name_key(schema.member::<M>(base).key());
        let id = match own_keys.iter().position(|k| *k == key) {
            Some(pos) => {
                claimed[pos] = true;
                let id = own[pos];
                schema.member_mut::<M>(id).set_base(Some(base));
                M::merge_nested(schema, id, base, settings);
                id
            }
            None => M::inherit(schema, base),
        };
        merged.push(id);
    }

    merged.extend(
        own.iter()
            .zip(&claimed)
            .filter(|&(_, &taken)| !taken)
            .map(|(&id, _)| id),
    );
    merged
}
