//! The resolved definition graph.
//!
//! A [`Schema`] owns one table per definition kind. Handles index into those
//! tables and stay valid for the lifetime of the schema (and of any clone of
//! it), which is what lets inherited definitions point at their bases without
//! owning them.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::document::{
    CollectionDocument, EmbeddedDocument, FieldDocument, SchemaDocument, SectionDocument,
    TypeDocument,
};
use crate::error::{Result, SchemaError};
use crate::inheritance::{InheritanceStep, resolve_order};
use crate::merge::{Inherit, apply_inheritance, merge_type};
use crate::references::resolve_references;
use crate::settings::SchemaSettings;
use crate::types::{
    CollectionDefinition, CollectionId, DefRef, EmbeddedId, EmbeddedNodeDefinition,
    FieldDefinition, FieldId, FieldStyle, PicklistDefinition, PicklistEntry, PicklistId,
    SectionDefinition, SectionId, TypeDefinition, TypeId,
};

/// A fully resolved lore schema.
///
/// Built with [`Schema::from_document`], which checks names, orders types by
/// inheritance, merges inherited structure, and resolves references. Loading
/// is all-or-nothing: on error no schema is returned.
///
/// # Examples
///
/// ```
/// use lore_schema_core::*;
///
/// let settings = SchemaSettings::default();
/// let doc = SchemaDocument::default()
///     .with_type(TypeDocument::new("TypeA").with_field(FieldDocument::optional("F1")))
///     .with_type(
///         TypeDocument::new("TypeB")
///             .extending("TypeA")
///             .with_field(FieldDocument::required("F1")),
///     );
/// let schema = Schema::from_document(&doc, &settings).unwrap();
///
/// let b = schema.find_type("TypeB", &settings).unwrap();
/// let f1 = schema.type_def(b).fields[0];
/// assert!(schema.field(f1).required);
/// assert!(schema.is_modified(DefRef::Field(f1)));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub(crate) types: Vec<TypeDefinition>,
    pub(crate) fields: Vec<FieldDefinition>,
    pub(crate) sections: Vec<SectionDefinition>,
    pub(crate) collections: Vec<CollectionDefinition>,
    pub(crate) embedded: Vec<EmbeddedNodeDefinition>,
    pub(crate) picklists: Vec<PicklistDefinition>,
    pub(crate) root_collections: Vec<CollectionId>,
}

/// Table access shared by every inheritable definition kind.
pub(crate) trait Member: Clone {
    type Id: Copy + PartialEq;

    fn table(schema: &Schema) -> &Vec<Self>;
    fn table_mut(schema: &mut Schema) -> &mut Vec<Self>;
    fn to_index(id: Self::Id) -> usize;
    fn from_index(index: usize) -> Self::Id;
    /// Name used to match a child entry against its parent's entry.
    fn key(&self) -> &str;
    fn base(&self) -> Option<Self::Id>;
    fn set_base(&mut self, base: Option<Self::Id>);
}

macro_rules! member_impl {
    ($def:ty, $id:ident, $table:ident, |$this:ident| $key:expr) => {
        impl Member for $def {
            type Id = $id;

            fn table(schema: &Schema) -> &Vec<Self> {
                &schema.$table
            }

            fn table_mut(schema: &mut Schema) -> &mut Vec<Self> {
                &mut schema.$table
            }

            fn to_index(id: $id) -> usize {
                id.0
            }

            fn from_index(index: usize) -> $id {
                $id(index)
            }

            fn key(&self) -> &str {
                let $this = self;
                $key
            }

            fn base(&self) -> Option<$id> {
                self.base
            }

            fn set_base(&mut self, base: Option<$id>) {
                self.base = base;
            }
        }
    };
}

member_impl!(FieldDefinition, FieldId, fields, |def| &def.name);
member_impl!(SectionDefinition, SectionId, sections, |def| &def.name);
member_impl!(CollectionDefinition, CollectionId, collections, |def| &def.name);
member_impl!(EmbeddedNodeDefinition, EmbeddedId, embedded, |def| def.display_name());

impl Schema {
    /// Builds and resolves a schema from its document form.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaError`] found: duplicate names, unknown or
    /// cyclic parents, or dangling type/picklist references.
    pub fn from_document(doc: &SchemaDocument, settings: &SchemaSettings) -> Result<Self> {
        let mut schema = Schema::default();

        let mut seen = HashSet::new();
        for list in &doc.picklists {
            if !seen.insert(settings.name_key(&list.name)) {
                return Err(SchemaError::DuplicatePicklistName(list.name.clone()));
            }
            let def = PicklistDefinition {
                name: list.name.clone(),
                entries: list.entries.clone(),
            };
            check_picklist_entries(&def, settings)?;
            schema.picklists.push(def);
        }

        seen.clear();
        for def in &doc.types {
            if !seen.insert(settings.name_key(&def.name)) {
                return Err(SchemaError::DuplicateTypeName(def.name.clone()));
            }
            schema.insert_type(def, settings)?;
        }

        seen.clear();
        for def in &doc.collections {
            if !seen.insert(settings.name_key(&def.name)) {
                return Err(SchemaError::DuplicateCollectionName(def.name.clone()));
            }
            let id = schema.insert_collection(def, "collections", settings)?;
            schema.root_collections.push(id);
        }

        let steps = resolve_order(&schema, settings)?;
        apply_inheritance(&mut schema, &steps, settings);
        resolve_references(&mut schema, settings)?;

        info!(
            types = schema.types.len(),
            collections = schema.root_collections.len(),
            picklists = schema.picklists.len(),
            "schema resolved"
        );
        Ok(schema)
    }

    /// Re-runs reference resolution for types not yet marked processed.
    ///
    /// Already processed types are skipped, so calling this repeatedly (for
    /// example after cloning) is cheap.
    pub fn post_process(&mut self, settings: &SchemaSettings) -> Result<()> {
        resolve_references(self, settings)
    }

    fn insert_type(&mut self, doc: &TypeDocument, settings: &SchemaSettings) -> Result<TypeId> {
        let owner = doc.name.as_str();
        ensure_unique(owner, doc.fields.iter().map(|f| f.name.as_str()), settings)?;
        ensure_unique(owner, doc.sections.iter().map(|s| s.name.as_str()), settings)?;
        ensure_unique(owner, doc.collections.iter().map(|c| c.name.as_str()), settings)?;
        ensure_unique(owner, doc.embedded.iter().map(embedded_key), settings)?;

        let mut def = TypeDefinition::new(&doc.name, doc.extends.clone());
        for field in &doc.fields {
            def.fields.push(self.insert_field(field, owner, settings)?);
        }
        for section in &doc.sections {
            def.sections.push(self.insert_section(section, owner, settings)?);
        }
        for collection in &doc.collections {
            def.collections
                .push(self.insert_collection(collection, owner, settings)?);
        }
        for embedded in &doc.embedded {
            def.embedded.push(self.alloc(EmbeddedNodeDefinition {
                name: embedded.name.clone(),
                type_name: embedded.node_type.clone(),
                node_type: None,
                required: embedded.required,
                base: None,
            }));
        }

        self.types.push(def);
        Ok(TypeId(self.types.len() - 1))
    }

    fn insert_field(
        &mut self,
        doc: &FieldDocument,
        owner: &str,
        settings: &SchemaSettings,
    ) -> Result<FieldId> {
        let path = format!("{owner}.{}", doc.name);
        ensure_unique(&path, doc.fields.iter().map(|f| f.name.as_str()), settings)?;
        let mut fields = Vec::with_capacity(doc.fields.len());
        for nested in &doc.fields {
            fields.push(self.insert_field(nested, &path, settings)?);
        }
        Ok(self.alloc(FieldDefinition {
            name: doc.name.clone(),
            required: doc.required,
            style: doc.style,
            fields,
            picklist_name: doc.picklist.clone(),
            picklist: None,
            base: None,
        }))
    }

    fn insert_section(
        &mut self,
        doc: &SectionDocument,
        owner: &str,
        settings: &SchemaSettings,
    ) -> Result<SectionId> {
        let path = format!("{owner}.{}", doc.name);
        ensure_unique(&path, doc.fields.iter().map(|f| f.name.as_str()), settings)?;
        ensure_unique(&path, doc.sections.iter().map(|s| s.name.as_str()), settings)?;
        let mut fields = Vec::with_capacity(doc.fields.len());
        for field in &doc.fields {
            fields.push(self.insert_field(field, &path, settings)?);
        }
        let mut sections = Vec::with_capacity(doc.sections.len());
        for section in &doc.sections {
            sections.push(self.insert_section(section, &path, settings)?);
        }
        Ok(self.alloc(SectionDefinition {
            name: doc.name.clone(),
            required: doc.required,
            freeform: doc.freeform,
            fields,
            sections,
            base: None,
        }))
    }

    fn insert_collection(
        &mut self,
        doc: &CollectionDocument,
        owner: &str,
        settings: &SchemaSettings,
    ) -> Result<CollectionId> {
        let nested = match &doc.collection {
            Some(inner) => Some(self.insert_collection(inner, owner, settings)?),
            None => None,
        };
        Ok(self.alloc(CollectionDefinition {
            name: doc.name.clone(),
            required: doc.required,
            contains: doc.contains.clone(),
            contained_type: None,
            nested,
            base: None,
        }))
    }

    pub(crate) fn member<M: Member>(&self, id: M::Id) -> &M {
        &M::table(self)[M::to_index(id)]
    }

    pub(crate) fn member_mut<M: Member>(&mut self, id: M::Id) -> &mut M {
        &mut M::table_mut(self)[M::to_index(id)]
    }

    pub(crate) fn alloc<M: Member>(&mut self, def: M) -> M::Id {
        let table = M::table_mut(self);
        table.push(def);
        M::from_index(table.len() - 1)
    }

    /// Returns the type definition behind `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was minted by a different schema.
    pub fn type_def(&self, id: TypeId) -> &TypeDefinition {
        &self.types[id.0]
    }

    pub fn field(&self, id: FieldId) -> &FieldDefinition {
        &self.fields[id.0]
    }

    /// The style in effect for field `id`.
    ///
    /// A field without a style of its own takes its base's style. At the end
    /// of the chain an unstyled field is `NestedValues` when it has nested
    /// fields and `SingleValue` otherwise.
    pub fn field_style(&self, id: FieldId) -> FieldStyle {
        self.field(id)
            .style
            .unwrap_or_else(|| self.unstyled_field_style(id))
    }

    /// The style field `id` would have without a style of its own.
    pub(crate) fn unstyled_field_style(&self, id: FieldId) -> FieldStyle {
        let def = self.field(id);
        match def.base {
            Some(base) => self.field_style(base),
            None if def.fields.is_empty() => FieldStyle::SingleValue,
            None => FieldStyle::NestedValues,
        }
    }

    pub fn section(&self, id: SectionId) -> &SectionDefinition {
        &self.sections[id.0]
    }

    pub fn collection(&self, id: CollectionId) -> &CollectionDefinition {
        &self.collections[id.0]
    }

    pub fn embedded(&self, id: EmbeddedId) -> &EmbeddedNodeDefinition {
        &self.embedded[id.0]
    }

    pub fn picklist(&self, id: PicklistId) -> &PicklistDefinition {
        &self.picklists[id.0]
    }

    /// All type definitions in declaration order.
    pub fn types(&self) -> impl Iterator<Item = (TypeId, &TypeDefinition)> {
        self.types.iter().enumerate().map(|(i, t)| (TypeId(i), t))
    }

    /// Number of type definitions.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Top-level collections in declaration order.
    pub fn root_collections(&self) -> &[CollectionId] {
        &self.root_collections
    }

    /// All picklists in declaration order.
    pub fn picklists(&self) -> impl Iterator<Item = (PicklistId, &PicklistDefinition)> {
        self.picklists
            .iter()
            .enumerate()
            .map(|(i, p)| (PicklistId(i), p))
    }

    /// Finds a type by name.
    pub fn find_type(&self, name: &str, settings: &SchemaSettings) -> Option<TypeId> {
        self.types
            .iter()
            .position(|t| settings.names_match(&t.name, name))
            .map(TypeId)
    }

    /// Finds a top-level collection by name.
    pub fn find_collection(&self, name: &str, settings: &SchemaSettings) -> Option<CollectionId> {
        self.root_collections
            .iter()
            .copied()
            .find(|&id| settings.names_match(&self.collection(id).name, name))
    }

    /// Finds a picklist by name.
    pub fn find_picklist(&self, name: &str, settings: &SchemaSettings) -> Option<PicklistId> {
        self.picklists
            .iter()
            .position(|p| settings.names_match(&p.name, name))
            .map(PicklistId)
    }

    /// Finds a field by name among `ids`.
    pub fn find_field(
        &self,
        ids: &[FieldId],
        name: &str,
        settings: &SchemaSettings,
    ) -> Option<FieldId> {
        self.find_member::<FieldDefinition>(ids, name, settings)
    }

    /// Finds a section by name among `ids`.
    pub fn find_section(
        &self,
        ids: &[SectionId],
        name: &str,
        settings: &SchemaSettings,
    ) -> Option<SectionId> {
        self.find_member::<SectionDefinition>(ids, name, settings)
    }

    /// Finds a collection by name among `ids`.
    pub fn find_member_collection(
        &self,
        ids: &[CollectionId],
        name: &str,
        settings: &SchemaSettings,
    ) -> Option<CollectionId> {
        self.find_member::<CollectionDefinition>(ids, name, settings)
    }

    /// Finds an embedded node definition by alias (or type name) among `ids`.
    pub fn find_embedded(
        &self,
        ids: &[EmbeddedId],
        name: &str,
        settings: &SchemaSettings,
    ) -> Option<EmbeddedId> {
        self.find_member::<EmbeddedNodeDefinition>(ids, name, settings)
    }

    fn find_member<M: Member>(
        &self,
        ids: &[M::Id],
        name: &str,
        settings: &SchemaSettings,
    ) -> Option<M::Id> {
        ids.iter()
            .copied()
            .find(|&id| settings.names_match(self.member::<M>(id).key(), name))
    }

    /// Returns `true` if `ty` is `ancestor` or inherits from it.
    pub fn is_descendant_of(&self, ty: TypeId, ancestor: TypeId) -> bool {
        let mut current = Some(ty);
        let mut hops = 0;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            hops += 1;
            if hops > self.types.len() {
                return false;
            }
            current = self.types[id.0].parent;
        }
        false
    }

    /// Types ordered so that every type follows all of its ancestors.
    pub fn type_order(&self, settings: &SchemaSettings) -> Result<Vec<TypeId>> {
        Ok(resolve_order(self, settings)?
            .into_iter()
            .map(|step| step.type_id)
            .collect())
    }

    /// Detaches `def` from its inherited base, keeping its current values.
    ///
    /// Nested members are detached too. For a type, `extends` is cleared
    /// along with every member's base. Calling this twice is a no-op, and the
    /// former base is never touched.
    pub fn make_independent(&mut self, def: DefRef) {
        match def {
            DefRef::Type(id) => {
                let ty = &mut self.types[id.0];
                ty.extends = None;
                ty.parent = None;
                let ty = ty.clone();
                for field in ty.fields {
                    FieldDefinition::detach(self, field);
                }
                for section in ty.sections {
                    SectionDefinition::detach(self, section);
                }
                for collection in ty.collections {
                    CollectionDefinition::detach(self, collection);
                }
                for embedded in ty.embedded {
                    EmbeddedNodeDefinition::detach(self, embedded);
                }
            }
            DefRef::Field(id) => FieldDefinition::detach(self, id),
            DefRef::Section(id) => SectionDefinition::detach(self, id),
            DefRef::Collection(id) => CollectionDefinition::detach(self, id),
            DefRef::Embedded(id) => EmbeddedNodeDefinition::detach(self, id),
        }
    }

    /// Changes the parent of `type_name` to `parent` (or removes it).
    ///
    /// The new inheritance graph is checked first; on error the schema is
    /// left exactly as it was. Otherwise the type is made independent, linked
    /// to its new parent, and it and every type inheriting from it are merged
    /// and resolved again.
    ///
    /// # Errors
    ///
    /// [`SchemaError::UnknownType`] if `type_name` does not exist, plus any
    /// ordering error the new graph produces.
    pub fn set_parent(
        &mut self,
        type_name: &str,
        parent: Option<&str>,
        settings: &SchemaSettings,
    ) -> Result<()> {
        let id = self
            .find_type(type_name, settings)
            .ok_or_else(|| SchemaError::UnknownType(type_name.to_string()))?;

        let previous = self.types[id.0].extends.clone();
        self.types[id.0].extends = parent.map(str::to_string);
        let steps = match resolve_order(self, settings) {
            Ok(steps) => steps,
            Err(err) => {
                self.types[id.0].extends = previous;
                return Err(err);
            }
        };

        self.make_independent(DefRef::Type(id));
        self.types[id.0].extends = parent.map(str::to_string);

        let affected = dependents_of(id, &steps);
        for step in steps.iter().filter(|s| affected.contains(&s.type_id)) {
            self.types[step.type_id.0].processed = false;
            if let Some(parent) = step.parent {
                merge_type(self, step.type_id, parent, settings);
            }
        }
        debug!(
            type_name = %self.types[id.0].name,
            parent = ?parent,
            affected = affected.len(),
            "re-parented type"
        );
        resolve_references(self, settings)
    }
}

/// `root` plus every type that transitively inherits from it.
fn dependents_of(root: TypeId, steps: &[InheritanceStep]) -> HashSet<TypeId> {
    let mut affected = HashSet::from([root]);
    for step in steps {
        if step.parent.is_some_and(|p| affected.contains(&p)) {
            affected.insert(step.type_id);
        }
    }
    affected
}

fn embedded_key(doc: &EmbeddedDocument) -> &str {
    doc.name.as_deref().unwrap_or(&doc.node_type)
}

fn ensure_unique<'a>(
    owner: &str,
    names: impl Iterator<Item = &'a str>,
    settings: &SchemaSettings,
) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(settings.name_key(name)) {
            return Err(SchemaError::DuplicateMemberName {
                owner: owner.to_string(),
                member: name.to_string(),
            });
        }
    }
    Ok(())
}

fn check_picklist_entries(list: &PicklistDefinition, settings: &SchemaSettings) -> Result<()> {
    fn walk(
        entries: &[PicklistEntry],
        list: &str,
        seen: &mut HashSet<String>,
        settings: &SchemaSettings,
    ) -> Result<()> {
        for entry in entries {
            if !seen.insert(settings.name_key(&entry.name)) {
                return Err(SchemaError::DuplicatePicklistEntry {
                    picklist: list.to_string(),
                    entry: entry.name.clone(),
                });
            }
            walk(&entry.entries, list, seen, settings)?;
        }
        Ok(())
    }

    walk(&list.entries, &list.name, &mut HashSet::new(), settings)
}
