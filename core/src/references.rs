//! Reference resolution.
//!
//! After merging, every type still holds names rather than handles for its
//! picklists, contained types, and embedded node types. Resolution looks
//! those names up and stores the handles, failing on the first dangling one.

use tracing::debug;

use crate::error::{Result, SchemaError};
use crate::schema::Schema;
use crate::settings::SchemaSettings;
use crate::types::{CollectionId, EmbeddedId, FieldId, FieldStyle, SectionId, TypeId};

/// Resolves names for every type not yet marked processed, then for the
/// top-level collections.
pub fn resolve_references(schema: &mut Schema, settings: &SchemaSettings) -> Result<()> {
    for index in 0..schema.types.len() {
        if schema.types[index].processed {
            continue;
        }
        let def = schema.types[index].clone();
        let mut resolver = Resolver {
            schema: &mut *schema,
            settings,
            owner: &def.name,
        };
        resolver.fields(&def.fields)?;
        resolver.sections(&def.sections)?;
        for &collection in &def.collections {
            resolver.collection(collection)?;
        }
        for &embedded in &def.embedded {
            resolver.embedded(embedded)?;
        }

        schema.types[index].processed = true;
        debug!(type_name = %def.name, "resolved references");
    }

    let roots = schema.root_collections.clone();
    let mut resolver = Resolver {
        schema,
        settings,
        owner: "collections",
    };
    for collection in roots {
        resolver.collection(collection)?;
    }
    Ok(())
}

struct Resolver<'a> {
    schema: &'a mut Schema,
    settings: &'a SchemaSettings,
    owner: &'a str,
}

impl Resolver<'_> {
    fn fields(&mut self, ids: &[FieldId]) -> Result<()> {
        for &id in ids {
            let def = self.schema.field(id).clone();
            if self.schema.field_style(id) == FieldStyle::PickList {
                let name = def.picklist_name.as_deref().ok_or_else(|| SchemaError::MissingPicklist {
                    owner: self.owner.to_string(),
                    field: def.name.clone(),
                })?;
                let picklist = self.schema.find_picklist(name, self.settings).ok_or_else(|| {
                    SchemaError::UnknownPicklist {
                        owner: self.owner.to_string(),
                        field: def.name.clone(),
                        picklist: name.to_string(),
                    }
                })?;
                self.schema.fields[id.index()].picklist = Some(picklist);
            }
            self.fields(&def.fields)?;
        }
        Ok(())
    }

    fn sections(&mut self, ids: &[SectionId]) -> Result<()> {
        for &id in ids {
            let def = self.schema.section(id).clone();
            self.fields(&def.fields)?;
            self.sections(&def.sections)?;
        }
        Ok(())
    }

    fn collection(&mut self, id: CollectionId) -> Result<()> {
        let def = self.schema.collection(id).clone();
        if let Some(nested) = def.nested {
            return self.collection(nested);
        }

        let name = def.contains.as_deref().ok_or_else(|| SchemaError::MissingContainedType {
            owner: self.owner.to_string(),
            collection: def.name.clone(),
        })?;
        let ty = self.type_named(name).ok_or_else(|| SchemaError::UnknownContainedType {
            owner: self.owner.to_string(),
            collection: def.name.clone(),
            type_name: name.to_string(),
        })?;
        self.schema.collections[id.index()].contained_type = Some(ty);
        Ok(())
    }

    fn embedded(&mut self, id: EmbeddedId) -> Result<()> {
        let def = self.schema.embedded(id).clone();
        let ty = self
            .type_named(&def.type_name)
            .ok_or_else(|| SchemaError::UnknownEmbeddedType {
                owner: self.owner.to_string(),
                embedded: def.display_name().to_string(),
                type_name: def.type_name.clone(),
            })?;
        self.schema.embedded[id.index()].node_type = Some(ty);
        Ok(())
    }

    fn type_named(&self, name: &str) -> Option<TypeId> {
        self.schema.find_type(name, self.settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{
        CollectionDocument, EmbeddedDocument, FieldDocument, PicklistDocument, SchemaDocument,
        SectionDocument, TypeDocument,
    };

    fn load(doc: &SchemaDocument) -> Result<Schema> {
        Schema::from_document(doc, &SchemaSettings::default())
    }

    #[test]
    fn test_handles_are_filled_in() {
        let doc = SchemaDocument::default()
            .with_picklist(PicklistDocument::flat("Ranks", &["Squire", "Knight"]))
            .with_type(
                TypeDocument::new("Order")
                    .with_section(
                        SectionDocument::new("Roster")
                            .with_field(FieldDocument::pick_list("Rank", "ranks")),
                    )
                    .with_collection(CollectionDocument::of_collections(
                        "Chapters",
                        CollectionDocument::of("Chapter", "Member"),
                    ))
                    .with_embedded(EmbeddedDocument::new("Member").named("Founder")),
            )
            .with_type(TypeDocument::new("Member"))
            .with_collection(CollectionDocument::of("Orders", "Order"));
        let s = SchemaSettings::default();
        let schema = load(&doc).unwrap();
        let order = schema.type_def(schema.find_type("Order", &s).unwrap());
        let member = schema.find_type("Member", &s).unwrap();

        let roster = schema.section(order.sections[0]);
        assert_eq!(
            schema.field(roster.fields[0]).picklist,
            schema.find_picklist("Ranks", &s)
        );
        let inner = schema.collection(order.collections[0]).nested.unwrap();
        assert_eq!(schema.collection(inner).contained_type, Some(member));
        assert_eq!(schema.embedded(order.embedded[0]).node_type, Some(member));

        let orders = schema.find_collection("Orders", &s).unwrap();
        assert_eq!(schema.collection(orders).contained_type, schema.find_type("Order", &s));
        assert!(schema.types().all(|(_, t)| t.processed));
    }

    #[test]
    fn test_unknown_picklist() {
        let doc = SchemaDocument::default().with_type(
            TypeDocument::new("Banner").with_field(FieldDocument::pick_list("Color", "Colours")),
        );
        assert_eq!(
            load(&doc).unwrap_err(),
            SchemaError::UnknownPicklist {
                owner: "Banner".into(),
                field: "Color".into(),
                picklist: "Colours".into(),
            }
        );
    }

    #[test]
    fn test_pick_list_without_picklist_name() {
        let doc = SchemaDocument::default().with_type(
            TypeDocument::new("Banner")
                .with_field(FieldDocument::optional("Color").with_style(FieldStyle::PickList)),
        );
        assert_eq!(
            load(&doc).unwrap_err(),
            SchemaError::MissingPicklist {
                owner: "Banner".into(),
                field: "Color".into(),
            }
        );
    }

    #[test]
    fn test_unknown_contained_and_embedded_types() {
        let doc = SchemaDocument::default().with_type(
            TypeDocument::new("Guild").with_collection(CollectionDocument::of("Members", "Ghost")),
        );
        assert_eq!(
            load(&doc).unwrap_err(),
            SchemaError::UnknownContainedType {
                owner: "Guild".into(),
                collection: "Members".into(),
                type_name: "Ghost".into(),
            }
        );

        let doc = SchemaDocument::default()
            .with_type(TypeDocument::new("Guild").with_embedded(EmbeddedDocument::new("Hall")));
        assert_eq!(
            load(&doc).unwrap_err(),
            SchemaError::UnknownEmbeddedType {
                owner: "Guild".into(),
                embedded: "Hall".into(),
                type_name: "Hall".into(),
            }
        );

        let doc = SchemaDocument::default()
            .with_collection(CollectionDocument::of("Everything", "Thing"));
        assert!(matches!(
            load(&doc).unwrap_err(),
            SchemaError::UnknownContainedType { ref owner, .. } if owner == "collections"
        ));
    }

    #[test]
    fn test_collection_without_content() {
        let doc = SchemaDocument::default().with_type(TypeDocument::new("Guild").with_collection(
            CollectionDocument {
                name: "Members".into(),
                ..Default::default()
            },
        ));
        assert_eq!(
            load(&doc).unwrap_err(),
            SchemaError::MissingContainedType {
                owner: "Guild".into(),
                collection: "Members".into(),
            }
        );
    }

    #[test]
    fn test_processed_types_are_skipped() {
        let doc = SchemaDocument::default().with_type(TypeDocument::new("Thing"));
        let mut schema = load(&doc).unwrap();
        let before = schema.clone();
        schema.post_process(&SchemaSettings::default()).unwrap();
        assert_eq!(schema, before);
    }
}
