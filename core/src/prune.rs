//! Modification tracking and schema export.
//!
//! A definition is *modified* when it has no base (it was declared locally or
//! detached) or when one of its own scalars or nested members differs from
//! its base. [`prune`] exports only modified definitions, which is enough
//! for the merge engine to rebuild everything else on the next load.

use tracing::debug;

use crate::document::{
    CollectionDocument, EmbeddedDocument, FieldDocument, PicklistDocument, SchemaDocument,
    SectionDocument, TypeDocument,
};
use crate::schema::{Member, Schema};
use crate::settings::SchemaSettings;
use crate::types::{
    CollectionDefinition, CollectionId, DefRef, EmbeddedId, EmbeddedNodeDefinition,
    FieldDefinition, FieldId, FieldStyle, SectionDefinition, SectionId, TypeId,
};

/// Structural comparison of a definition against its base.
pub(crate) trait Delta: Member {
    fn differs(schema: &Schema, id: Self::Id, base: Self::Id) -> bool;
}

impl Delta for FieldDefinition {
    fn differs(schema: &Schema, id: FieldId, base_id: FieldId) -> bool {
        let (own, base) = (schema.field(id), schema.field(base_id));
        own.name != base.name
            || own.required != base.required
            || schema.field_style(id) != schema.field_style(base_id)
            || own.picklist_name != base.picklist_name
            || schema.members_modified::<FieldDefinition>(&own.fields, &base.fields)
    }
}

impl Delta for SectionDefinition {
    fn differs(schema: &Schema, id: SectionId, base: SectionId) -> bool {
        let (own, base) = (schema.section(id), schema.section(base));
        own.name != base.name
            || own.required != base.required
            || own.freeform != base.freeform
            || schema.members_modified::<FieldDefinition>(&own.fields, &base.fields)
            || schema.members_modified::<SectionDefinition>(&own.sections, &base.sections)
    }
}

impl Delta for CollectionDefinition {
    fn differs(schema: &Schema, id: CollectionId, base: CollectionId) -> bool {
        let (own, base) = (schema.collection(id), schema.collection(base));
        let nested_differs = match (own.nested, base.nested) {
            (None, None) => false,
            (Some(nested), Some(base_nested)) => {
                schema.collection(nested).base != Some(base_nested)
                    || Self::differs(schema, nested, base_nested)
            }
            _ => true,
        };
        own.name != base.name
            || own.required != base.required
            || own.contains != base.contains
            || nested_differs
    }
}

impl Delta for EmbeddedNodeDefinition {
    fn differs(schema: &Schema, id: EmbeddedId, base: EmbeddedId) -> bool {
        let (own, base) = (schema.embedded(id), schema.embedded(base));
        own.name != base.name || own.type_name != base.type_name || own.required != base.required
    }
}

impl Schema {
    /// Returns `true` if `def` is not a pure, unedited inheritance.
    ///
    /// A type is modified when it has no parent or any of its member lists
    /// differs from the parent's.
    pub fn is_modified(&self, def: DefRef) -> bool {
        match def {
            DefRef::Type(id) => self.type_modified(id),
            DefRef::Field(id) => self.modified::<FieldDefinition>(id),
            DefRef::Section(id) => self.modified::<SectionDefinition>(id),
            DefRef::Collection(id) => self.modified::<CollectionDefinition>(id),
            DefRef::Embedded(id) => self.modified::<EmbeddedNodeDefinition>(id),
        }
    }

    fn type_modified(&self, id: TypeId) -> bool {
        let own = self.type_def(id);
        let Some(parent) = own.parent else {
            return true;
        };
        let base = self.type_def(parent);
        self.members_modified::<FieldDefinition>(&own.fields, &base.fields)
            || self.members_modified::<SectionDefinition>(&own.sections, &base.sections)
            || self.members_modified::<CollectionDefinition>(&own.collections, &base.collections)
            || self.members_modified::<EmbeddedNodeDefinition>(&own.embedded, &base.embedded)
    }

    fn modified<M: Delta>(&self, id: M::Id) -> bool {
        match self.member::<M>(id).base() {
            None => true,
            Some(base) => M::differs(self, id, base),
        }
    }

    fn members_modified<M: Delta>(&self, own: &[M::Id], inherited: &[M::Id]) -> bool {
        own.len() != inherited.len()
            || own.iter().any(|&id| match self.member::<M>(id).base() {
                Some(base) => !inherited.contains(&base) || M::differs(self, id, base),
                None => true,
            })
    }

    /// Exports the full resolved schema, inherited members included.
    ///
    /// Reloading the result yields the same resolved definitions.
    pub fn to_document(&self, settings: &SchemaSettings) -> SchemaDocument {
        Exporter {
            schema: self,
            delta_only: false,
        }
        .document(settings)
    }
}

impl SchemaDocument {
    /// Exports `schema` in the form selected by
    /// [`save_delta_only`](SchemaSettings::save_delta_only).
    pub fn for_save(schema: &Schema, settings: &SchemaSettings) -> SchemaDocument {
        if settings.save_delta_only {
            prune(schema, settings)
        } else {
            schema.to_document(settings)
        }
    }
}

/// Exports only what differs from inherited bases.
///
/// Every type is kept (with its `extends`), but each member list holds only
/// modified entries, recursively. Top-level collections and picklists have
/// no bases and are always kept. The live schema is not touched.
///
/// # Examples
///
/// ```
/// use lore_schema_core::*;
///
/// let settings = SchemaSettings::default();
/// let doc = SchemaDocument::default()
///     .with_type(TypeDocument::new("Person").with_field(FieldDocument::optional("Name")))
///     .with_type(TypeDocument::new("Hero").extending("Person"));
/// let schema = Schema::from_document(&doc, &settings).unwrap();
///
/// let pruned = prune(&schema, &settings);
/// assert_eq!(pruned.types[0].fields.len(), 1);
/// assert!(pruned.types[1].fields.is_empty());
/// ```
pub fn prune(schema: &Schema, settings: &SchemaSettings) -> SchemaDocument {
    Exporter {
        schema,
        delta_only: true,
    }
    .document(settings)
}

struct Exporter<'a> {
    schema: &'a Schema,
    delta_only: bool,
}

impl Exporter<'_> {
    fn document(&self, settings: &SchemaSettings) -> SchemaDocument {
        SchemaDocument {
            settings: settings.clone(),
            types: self
                .schema
                .types()
                .map(|(id, _)| self.type_doc(id))
                .collect(),
            collections: self
                .schema
                .root_collections()
                .iter()
                .map(|&id| self.collection(id))
                .collect(),
            picklists: self
                .schema
                .picklists()
                .map(|(_, list)| PicklistDocument {
                    name: list.name.clone(),
                    entries: list.entries.clone(),
                })
                .collect(),
        }
    }

    fn keep<M: Delta>(&self, id: M::Id) -> bool {
        !self.delta_only || self.schema.modified::<M>(id)
    }

    fn type_doc(&self, id: TypeId) -> TypeDocument {
        let def = self.schema.type_def(id);
        let doc = TypeDocument {
            name: def.name.clone(),
            extends: def.extends.clone(),
            fields: self.fields(&def.fields),
            sections: self.sections(&def.sections),
            collections: def
                .collections
                .iter()
                .filter(|&&c| self.keep::<CollectionDefinition>(c))
                .map(|&c| self.collection(c))
                .collect(),
            embedded: def
                .embedded
                .iter()
                .filter(|&&e| self.keep::<EmbeddedNodeDefinition>(e))
                .map(|&e| self.embedded(e))
                .collect(),
        };
        if self.delta_only {
            debug!(
                type_name = %doc.name,
                fields = doc.fields.len(),
                sections = doc.sections.len(),
                collections = doc.collections.len(),
                embedded = doc.embedded.len(),
                "pruned type"
            );
        }
        doc
    }

    fn fields(&self, ids: &[FieldId]) -> Vec<FieldDocument> {
        ids.iter()
            .filter(|&&id| self.keep::<FieldDefinition>(id))
            .map(|&id| {
                let def = self.schema.field(id);
                FieldDocument {
                    name: def.name.clone(),
                    required: def.required,
                    style: self.style(id),
                    picklist: def.picklist_name.clone(),
                    fields: self.fields(&def.fields),
                }
            })
            .collect()
    }

    /// The effective style, left out when reloading would infer it anyway.
    fn style(&self, id: FieldId) -> Option<FieldStyle> {
        let style = self.schema.field_style(id);
        let inferred = self.schema.unstyled_field_style(id);
        (style != FieldStyle::SingleValue || style != inferred).then_some(style)
    }

    fn sections(&self, ids: &[SectionId]) -> Vec<SectionDocument> {
        ids.iter()
            .filter(|&&id| self.keep::<SectionDefinition>(id))
            .map(|&id| {
                let def = self.schema.section(id);
                SectionDocument {
                    name: def.name.clone(),
                    required: def.required,
                    freeform: def.freeform,
                    fields: self.fields(&def.fields),
                    sections: self.sections(&def.sections),
                }
            })
            .collect()
    }

    // A kept collection carries its inner definition in full.
    fn collection(&self, id: CollectionId) -> CollectionDocument {
        let def = self.schema.collection(id);
        CollectionDocument {
            name: def.name.clone(),
            required: def.required,
            contains: def.contains.clone(),
            collection: def.nested.map(|nested| Box::new(self.collection(nested))),
        }
    }

    fn embedded(&self, id: EmbeddedId) -> EmbeddedDocument {
        let def = self.schema.embedded(id);
        EmbeddedDocument {
            name: def.name.clone(),
            node_type: def.type_name.clone(),
            required: def.required,
        }
    }
}
