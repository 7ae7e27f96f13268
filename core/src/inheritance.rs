//! Inheritance ordering.
//!
//! [`resolve_order`] places every type after its (transitive) parent so the
//! merge engine can fold parents into children in a single pass. It fails
//! before producing any order when a parent name is unknown or the `extends`
//! graph has a cycle.

use std::collections::HashMap;

use crate::error::{Result, SchemaError};
use crate::schema::Schema;
use crate::settings::SchemaSettings;
use crate::types::TypeId;

/// One entry of the inheritance order: a type and its resolved parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InheritanceStep {
    pub type_id: TypeId,
    pub parent: Option<TypeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Orders all types parents-first.
///
/// Independent types keep their declaration order relative to each other.
///
/// # Errors
///
/// - [`SchemaError::UnknownParentType`] when `extends` names no known type.
/// - [`SchemaError::CyclicInheritance`] naming the type at which the cycle
///   closed, plus the cycle path.
///
/// # Examples
///
/// ```
/// use lore_schema_core::*;
///
/// let settings = SchemaSettings::default();
/// let doc = SchemaDocument::default()
///     .with_type(TypeDocument::new("Hero").extending("Person"))
///     .with_type(TypeDocument::new("Person"));
/// let schema = Schema::from_document(&doc, &settings).unwrap();
///
/// let order: Vec<_> = resolve_order(&schema, &settings)
///     .unwrap()
///     .into_iter()
///     .map(|step| schema.type_def(step.type_id).name.as_str())
///     .collect();
/// assert_eq!(order, vec!["Person", "Hero"]);
/// ```
pub fn resolve_order(schema: &Schema, settings: &SchemaSettings) -> Result<Vec<InheritanceStep>> {
    let mut walk = OrderWalk {
        schema,
        settings,
        index: schema
            .types()
            .map(|(id, def)| (settings.name_key(&def.name), id))
            .collect(),
        marks: vec![Mark::Unvisited; schema.type_count()],
        stack: Vec::new(),
        order: Vec::with_capacity(schema.type_count()),
    };

    for (id, _) in schema.types() {
        walk.visit(id)?;
    }
    Ok(walk.order)
}

struct OrderWalk<'a> {
    schema: &'a Schema,
    settings: &'a SchemaSettings,
    index: HashMap<String, TypeId>,
    marks: Vec<Mark>,
    stack: Vec<TypeId>,
    order: Vec<InheritanceStep>,
}

impl OrderWalk<'_> {
    fn visit(&mut self, id: TypeId) -> Result<()> {
        match self.marks[id.index()] {
            Mark::Done => return Ok(()),
            Mark::InProgress => return Err(self.cycle_error(id)),
            Mark::Unvisited => {}
        }

        self.marks[id.index()] = Mark::InProgress;
        self.stack.push(id);

        let def = self.schema.type_def(id);
        let parent = match &def.extends {
            None => None,
            Some(parent_name) => {
                let parent = self
                    .index
                    .get(&self.settings.name_key(parent_name))
                    .copied()
                    .ok_or_else(|| SchemaError::UnknownParentType {
                        type_name: def.name.clone(),
                        parent: parent_name.clone(),
                    })?;
                self.visit(parent)?;
                Some(parent)
            }
        };

        self.stack.pop();
        self.marks[id.index()] = Mark::Done;
        self.order.push(InheritanceStep {
            type_id: id,
            parent,
        });
        Ok(())
    }

    fn cycle_error(&self, id: TypeId) -> SchemaError {
        let start = self.stack.iter().position(|&s| s == id).unwrap_or(0);
        let name = |id: TypeId| self.schema.type_def(id).name.clone();
        let mut cycle: Vec<String> = self.stack[start..].iter().map(|&s| name(s)).collect();
        cycle.push(name(id));
        SchemaError::CyclicInheritance {
            type_name: name(id),
            cycle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{SchemaDocument, TypeDocument};

    fn names(schema: &Schema, steps: &[InheritanceStep]) -> Vec<String> {
        steps
            .iter()
            .map(|s| schema.type_def(s.type_id).name.clone())
            .collect()
    }

    /// Builds a schema without running resolution, so broken graphs can be ordered.
    fn unresolved(doc: &SchemaDocument) -> Schema {
        let no_parents = SchemaDocument {
            types: doc
                .types
                .iter()
                .map(|t| TypeDocument {
                    extends: None,
                    ..t.clone()
                })
                .collect(),
            ..doc.clone()
        };
        let mut schema = Schema::from_document(&no_parents, &SchemaSettings::default()).unwrap();
        for (def, original) in schema.types.iter_mut().zip(&doc.types) {
            def.extends = original.extends.clone();
        }
        schema
    }

    #[test]
    fn test_every_type_follows_its_ancestors() {
        let doc = SchemaDocument::default()
            .with_type(TypeDocument::new("Paladin").extending("Knight"))
            .with_type(TypeDocument::new("Knight").extending("Person"))
            .with_type(TypeDocument::new("Location"))
            .with_type(TypeDocument::new("Person"))
            .with_type(TypeDocument::new("Squire").extending("Person"));
        let schema = unresolved(&doc);
        let steps = resolve_order(&schema, &SchemaSettings::default()).unwrap();
        let order = names(&schema, &steps);

        assert_eq!(order.len(), 5);
        let pos = |n: &str| order.iter().position(|o| o == n).unwrap();
        assert!(pos("Person") < pos("Knight"));
        assert!(pos("Knight") < pos("Paladin"));
        assert!(pos("Person") < pos("Squire"));
        assert_eq!(order, vec!["Person", "Knight", "Paladin", "Location", "Squire"]);
    }

    #[test]
    fn test_steps_carry_resolved_parent() {
        let doc = SchemaDocument::default()
            .with_type(TypeDocument::new("Person"))
            .with_type(TypeDocument::new("Hero").extending("person"));
        let schema = unresolved(&doc);
        let steps = resolve_order(&schema, &SchemaSettings::default()).unwrap();
        assert_eq!(steps[0].parent, None);
        assert_eq!(steps[1].parent, Some(steps[0].type_id));
    }

    #[test]
    fn test_unknown_parent_is_reported() {
        let doc =
            SchemaDocument::default().with_type(TypeDocument::new("Hero").extending("Person"));
        let schema = unresolved(&doc);
        assert_eq!(
            resolve_order(&schema, &SchemaSettings::default()).unwrap_err(),
            SchemaError::UnknownParentType {
                type_name: "Hero".into(),
                parent: "Person".into(),
            }
        );
    }

    #[test]
    fn test_cycle_names_a_type_on_the_cycle() {
        let doc = SchemaDocument::default()
            .with_type(TypeDocument::new("Root"))
            .with_type(TypeDocument::new("A").extending("C"))
            .with_type(TypeDocument::new("B").extending("A"))
            .with_type(TypeDocument::new("C").extending("B"));
        let schema = unresolved(&doc);
        let err = resolve_order(&schema, &SchemaSettings::default()).unwrap_err();
        match err {
            SchemaError::CyclicInheritance { type_name, cycle } => {
                assert_eq!(type_name, "A");
                assert_eq!(cycle, vec!["A", "C", "B", "A"]);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_self_extension_is_a_cycle() {
        let doc = SchemaDocument::default()
            .with_type(TypeDocument::new("Ouroboros").extending("Ouroboros"));
        let err = Schema::from_document(&doc, &SchemaSettings::default()).unwrap_err();
        assert_eq!(
            err,
            SchemaError::CyclicInheritance {
                type_name: "Ouroboros".into(),
                cycle: vec!["Ouroboros".into(), "Ouroboros".into()],
            }
        );
    }
}
