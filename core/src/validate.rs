//! Content validation.
//!
//! [`validate`] walks content entity trees depth-first against a resolved
//! [`Schema`] and records one [`ValidationState`] per entity plus any error
//! and warning messages. Findings never stop the walk.
//!
//! An entity whose definition does not fit the slot it sits in (an attribute
//! governed by a section definition, a field its owner never declared, a
//! collection item of the wrong type) means the entity tree itself was built
//! wrong. Those cases panic instead of being reported.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::entity::{
    AttributeValue, EntityId, LoreAttribute, LoreCollection, LoreEntity, LoreNode, LoreSection,
};
use crate::schema::Schema;
use crate::settings::SchemaSettings;
use crate::types::{DefRef, FieldId, FieldStyle, SectionId, TypeId};

/// Outcome of validating one entity.
///
/// States are totally ordered by [`severity`](Self::severity):
/// `Passed < ChildWarning < Warning < ChildFailed < Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationState {
    Passed,
    /// A descendant has a warning.
    ChildWarning,
    /// This entity has a warning of its own.
    Warning,
    /// A descendant failed.
    ChildFailed,
    /// This entity violates its own definition.
    Failed,
}

impl ValidationState {
    pub fn severity(self) -> u8 {
        match self {
            ValidationState::Passed => 0,
            ValidationState::ChildWarning => 1,
            ValidationState::Warning => 2,
            ValidationState::ChildFailed => 3,
            ValidationState::Failed => 4,
        }
    }

    /// Folds a child's final state into its parent's state.
    ///
    /// A failing child lifts the parent to at least `ChildFailed`, a warning
    /// child to at least `ChildWarning`. The parent never moves down.
    ///
    /// ```
    /// use lore_schema_core::ValidationState::*;
    ///
    /// assert_eq!(Passed.escalate(Failed), ChildFailed);
    /// assert_eq!(Warning.escalate(ChildFailed), ChildFailed);
    /// assert_eq!(Failed.escalate(Warning), Failed);
    /// assert_eq!(ChildFailed.escalate(Warning), ChildFailed);
    /// assert_eq!(Warning.escalate(ChildWarning), Warning);
    /// ```
    pub fn escalate(self, child: ValidationState) -> ValidationState {
        let floor = match child {
            ValidationState::Passed => return self,
            ValidationState::ChildWarning | ValidationState::Warning => {
                ValidationState::ChildWarning
            }
            ValidationState::ChildFailed | ValidationState::Failed => ValidationState::ChildFailed,
        };
        self.max(floor)
    }

    pub fn is_failure(self) -> bool {
        matches!(self, ValidationState::ChildFailed | ValidationState::Failed)
    }
}

impl PartialOrd for ValidationState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ValidationState {
    fn cmp(&self, other: &Self) -> Ordering {
        self.severity().cmp(&other.severity())
    }
}

impl std::fmt::Display for ValidationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ValidationState::Passed => "passed",
            ValidationState::ChildWarning => "child warning",
            ValidationState::Warning => "warning",
            ValidationState::ChildFailed => "child failed",
            ValidationState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// States and messages from one validation pass.
///
/// Every visited entity has exactly one state. Messages are grouped per
/// entity in the order they were found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    states: BTreeMap<EntityId, ValidationState>,
    errors: BTreeMap<EntityId, Vec<String>>,
    warnings: BTreeMap<EntityId, Vec<String>>,
}

impl ValidationResult {
    pub fn state(&self, id: EntityId) -> Option<ValidationState> {
        self.states.get(&id).copied()
    }

    pub fn errors(&self, id: EntityId) -> &[String] {
        self.errors.get(&id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn warnings(&self, id: EntityId) -> &[String] {
        self.warnings.get(&id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Total number of error messages.
    pub fn error_count(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.values().map(Vec::len).sum()
    }

    /// Every recorded state, by entity id.
    pub fn states(&self) -> impl Iterator<Item = (EntityId, ValidationState)> {
        self.states.iter().map(|(&id, &state)| (id, state))
    }

    /// Returns `true` if no errors were recorded. Warnings are allowed.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// The most severe state recorded, or `Passed` for an empty pass.
    pub fn worst(&self) -> ValidationState {
        self.states
            .values()
            .copied()
            .max()
            .unwrap_or(ValidationState::Passed)
    }

    /// Number of entities visited.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub(crate) fn record(&mut self, id: EntityId, state: ValidationState) {
        self.states.insert(id, state);
    }

    pub(crate) fn fail(&mut self, id: EntityId, message: String) {
        self.errors.entry(id).or_default().push(message);
    }

    pub(crate) fn warn(&mut self, id: EntityId, message: String) {
        self.warnings.entry(id).or_default().push(message);
    }
}

/// Validates `roots` (and everything below them) against `schema`.
///
/// Roots are nodes governed by a type, or collections.
///
/// # Panics
///
/// Panics on an entity tree that contradicts the schema's structure; see
/// the module documentation.
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
/// let type_b = schema.find_type("TypeB", &settings).unwrap();
///
/// let node = LoreNode::new(EntityId(0), "b", DefRef::Type(type_b));
/// let result = validate(&schema, &settings, &[node.into()]);
///
/// assert_eq!(result.state(EntityId(0)), Some(ValidationState::Failed));
/// assert_eq!(result.errors(EntityId(0)), ["Missing required attribute 'F1'"]);
/// ```
pub fn validate(
    schema: &Schema,
    settings: &SchemaSettings,
    roots: &[LoreEntity],
) -> ValidationResult {
    let mut validator = Validator {
        schema,
        settings,
        result: ValidationResult::default(),
    };
    for root in roots {
        validator.entity(root);
    }

    let result = validator.result;
    info!(
        entities = result.len(),
        errors = result.error_count(),
        warnings = result.warning_count(),
        "validation finished"
    );
    result
}

struct Validator<'a> {
    schema: &'a Schema,
    settings: &'a SchemaSettings,
    result: ValidationResult,
}

impl Validator<'_> {
    fn entity(&mut self, entity: &LoreEntity) -> ValidationState {
        self.result.record(entity.id(), ValidationState::Passed);
        let state = match entity {
            LoreEntity::Node(node) => self.node(node),
            LoreEntity::Section(section) => self.section(section),
            LoreEntity::Attribute(attribute) => self.attribute(attribute),
            LoreEntity::Collection(collection) => self.collection(collection),
        };
        self.result.record(entity.id(), state);
        state
    }

    fn node(&mut self, node: &LoreNode) -> ValidationState {
        let schema = self.schema;
        let def = schema.type_def(self.node_type(node));
        let mut missing = Vec::new();
        let mut state = ValidationState::Passed;

        for child in &node.embedded {
            let declared = matches!(
                (child, child.definition()),
                (LoreEntity::Node(_), DefRef::Embedded(id)) if def.embedded.contains(&id)
            );
            guard(&node.name, child, declared);
            state = state.escalate(self.entity(child));
        }
        let attributes = self.attributes(&node.name, &node.attributes, &def.fields, &mut missing);
        let sections = self.sections(&node.name, &node.sections, &def.sections, &mut missing);
        state = state.escalate(attributes).escalate(sections);
        for child in &node.collections {
            let declared = matches!(
                (child, child.definition()),
                (LoreEntity::Collection(_), DefRef::Collection(id)) if def.collections.contains(&id)
            );
            guard(&node.name, child, declared);
            state = state.escalate(self.entity(child));
        }

        for &id in &def.collections {
            let collection = schema.collection(id);
            if collection.required && !has_definition(&node.collections, DefRef::Collection(id)) {
                missing.push(format!("Missing required collection '{}'", collection.name));
            }
        }
        for &id in &def.embedded {
            let embedded = schema.embedded(id);
            if embedded.required && !has_definition(&node.embedded, DefRef::Embedded(id)) {
                missing.push(format!(
                    "Missing required embedded node '{}'",
                    embedded.display_name()
                ));
            }
        }
        self.conclude(node.id, state, missing)
    }

    fn node_type(&self, node: &LoreNode) -> TypeId {
        match node.definition {
            DefRef::Type(id) => id,
            DefRef::Embedded(id) => self.schema.embedded(id).node_type.unwrap_or_else(|| {
                panic!(
                    "contract violation: embedded node '{}' has an unresolved type",
                    node.name
                )
            }),
            other => panic!(
                "contract violation: node '{}' is governed by a {} definition",
                node.name,
                other.kind_name()
            ),
        }
    }

    fn section(&mut self, section: &LoreSection) -> ValidationState {
        let DefRef::Section(id) = section.definition else {
            panic!(
                "contract violation: section '{}' is governed by a {} definition",
                section.name,
                section.definition.kind_name()
            );
        };
        let schema = self.schema;
        let def = schema.section(id);
        let mut missing = Vec::new();
        let attributes =
            self.attributes(&section.name, &section.attributes, &def.fields, &mut missing);
        let sections = self.sections(&section.name, &section.sections, &def.sections, &mut missing);
        let state = ValidationState::Passed.escalate(attributes).escalate(sections);
        self.conclude(section.id, state, missing)
    }

    fn attribute(&mut self, attribute: &LoreAttribute) -> ValidationState {
        let DefRef::Field(id) = attribute.definition else {
            panic!(
                "contract violation: attribute '{}' is governed by a {} definition",
                attribute.name,
                attribute.definition.kind_name()
            );
        };
        let schema = self.schema;
        let def = schema.field(id);
        let style = schema.field_style(id);

        if style == FieldStyle::NestedValues {
            let nested = match &attribute.value {
                AttributeValue::Nested(nested) => nested.as_slice(),
                _ => &[],
            };
            let mut missing = Vec::new();
            let state = self.attributes(&attribute.name, nested, &def.fields, &mut missing);
            if nested.is_empty() && missing.is_empty() {
                return self.empty_value(attribute);
            }
            return self.conclude(attribute.id, state, missing);
        }

        if matches!(attribute.value, AttributeValue::Nested(_)) {
            panic!(
                "contract violation: attribute '{}' carries nested values but field '{}' is {:?}",
                attribute.name, def.name, style
            );
        }

        if attribute.value.is_empty() {
            return self.empty_value(attribute);
        }

        if style == FieldStyle::PickList {
            return self.pick_list(attribute, id);
        }
        ValidationState::Passed
    }

    fn empty_value(&mut self, attribute: &LoreAttribute) -> ValidationState {
        warn!(entity = %attribute.id, attribute = %attribute.name, "attribute has no value");
        self.result.warn(
            attribute.id,
            format!("Attribute '{}' has no value", attribute.name),
        );
        ValidationState::Warning
    }

    fn pick_list(&mut self, attribute: &LoreAttribute, field: FieldId) -> ValidationState {
        let def = self.schema.field(field);
        let picklist = def.picklist.unwrap_or_else(|| {
            panic!(
                "contract violation: pick-list field '{}' has an unresolved picklist",
                def.name
            )
        });
        let options = self.schema.picklist(picklist).flatten();

        let mut state = ValidationState::Passed;
        for value in attribute.value.scalars() {
            let value = value.trim();
            if value.is_empty() || options.iter().any(|o| self.settings.names_match(o, value)) {
                continue;
            }
            self.result.fail(
                attribute.id,
                format!(
                    "Value '{value}' for attribute '{}' is not a valid option. Valid options: {}",
                    def.name,
                    options.join(", ")
                ),
            );
            state = ValidationState::Failed;
        }
        state
    }

    fn collection(&mut self, collection: &LoreCollection) -> ValidationState {
        let DefRef::Collection(id) = collection.definition else {
            panic!(
                "contract violation: collection '{}' is governed by a {} definition",
                collection.name,
                collection.definition.kind_name()
            );
        };
        let schema = self.schema;
        let def = schema.collection(id);
        let mut state = ValidationState::Passed;

        for item in &collection.items {
            let fits = match (def.nested, def.contained_type, item, item.definition()) {
                (Some(inner), _, LoreEntity::Collection(_), DefRef::Collection(item_def)) => {
                    item_def == inner
                }
                (None, Some(contained), LoreEntity::Node(_), DefRef::Type(ty)) => {
                    self.schema.is_descendant_of(ty, contained)
                }
                (None, None, _, _) => panic!(
                    "contract violation: collection '{}' has an unresolved contained type",
                    collection.name
                ),
                _ => false,
            };
            guard(&collection.name, item, fits);
            state = state.escalate(self.entity(item));
        }
        state
    }

    /// Validates attribute children and notes required fields that are absent.
    fn attributes(
        &mut self,
        owner: &str,
        children: &[LoreEntity],
        fields: &[FieldId],
        missing: &mut Vec<String>,
    ) -> ValidationState {
        let mut state = ValidationState::Passed;
        for child in children {
            let declared = matches!(
                (child, child.definition()),
                (LoreEntity::Attribute(_), DefRef::Field(id)) if fields.contains(&id)
            );
            guard(owner, child, declared);
            state = state.escalate(self.entity(child));
        }
        for &id in fields {
            let def = self.schema.field(id);
            if def.required && !has_definition(children, DefRef::Field(id)) {
                missing.push(format!("Missing required attribute '{}'", def.name));
            }
        }
        state
    }

    fn sections(
        &mut self,
        owner: &str,
        children: &[LoreEntity],
        sections: &[SectionId],
        missing: &mut Vec<String>,
    ) -> ValidationState {
        let mut state = ValidationState::Passed;
        for child in children {
            let declared = matches!(
                (child, child.definition()),
                (LoreEntity::Section(_), DefRef::Section(id)) if sections.contains(&id)
            );
            guard(owner, child, declared);
            state = state.escalate(self.entity(child));
        }
        for &id in sections {
            let def = self.schema.section(id);
            if def.required && !has_definition(children, DefRef::Section(id)) {
                missing.push(format!("Missing required section '{}'", def.name));
            }
        }
        state
    }

    /// Records missing-member errors on `id`; any makes the entity `Failed`.
    fn conclude(
        &mut self,
        id: EntityId,
        state: ValidationState,
        missing: Vec<String>,
    ) -> ValidationState {
        if missing.is_empty() {
            return state;
        }
        for message in missing {
            self.result.fail(id, message);
        }
        ValidationState::Failed
    }
}

fn has_definition(children: &[LoreEntity], def: DefRef) -> bool {
    children.iter().any(|child| child.definition() == def)
}

fn guard(owner: &str, child: &LoreEntity, declared: bool) {
    if !declared {
        panic!(
            "contract violation: {} '{}' under '{}' is bound to a {} definition \
             its owner does not declare",
            child.kind_name(),
            child.name(),
            owner,
            child.definition().kind_name()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{
        CollectionDocument, EmbeddedDocument, FieldDocument, PicklistDocument, SchemaDocument,
        SectionDocument, TypeDocument,
    };
    use crate::types::{CollectionId, EmbeddedId, PicklistEntry};

    use super::ValidationState::*;

    fn settings() -> SchemaSettings {
        SchemaSettings::default()
    }

    fn world() -> Schema {
        let doc = SchemaDocument::default()
            .with_picklist(PicklistDocument {
                name: "Alignments".into(),
                entries: vec![
                    PicklistEntry::new("Good").with_entry(PicklistEntry::new("Lawful Good")),
                    PicklistEntry::new("Evil"),
                ],
            })
            .with_type(
                TypeDocument::new("Character")
                    .with_field(FieldDocument::required("Name"))
                    .with_field(FieldDocument::pick_list("Alignment", "Alignments"))
                    .with_field(
                        FieldDocument::optional("Stats")
                            .with_field(FieldDocument::required("Strength"))
                            .with_field(FieldDocument::optional("Wits")),
                    )
                    .with_section(
                        SectionDocument::new("History").with_required(true).with_section(
                            SectionDocument::new("Childhood")
                                .with_field(FieldDocument::required("Birthplace")),
                        ),
                    )
                    .with_collection(CollectionDocument::of("Items", "Item"))
                    .with_collection(CollectionDocument::of_collections(
                        "Parties",
                        CollectionDocument::of("Party", "Character"),
                    ))
                    .with_embedded(
                        EmbeddedDocument::new("Location").named("Home").with_required(true),
                    ),
            )
            .with_type(TypeDocument::new("Hero").extending("Character"))
            .with_type(TypeDocument::new("Item"))
            .with_type(TypeDocument::new("Location").with_field(FieldDocument::required("Region")));
        Schema::from_document(&doc, &settings()).unwrap()
    }

    fn ty(schema: &Schema, name: &str) -> TypeId {
        schema.find_type(name, &settings()).unwrap()
    }

    fn field(schema: &Schema, ids: &[FieldId], name: &str) -> FieldId {
        schema.find_field(ids, name, &settings()).unwrap()
    }

    fn section(schema: &Schema, ids: &[SectionId], name: &str) -> SectionId {
        schema.find_section(ids, name, &settings()).unwrap()
    }

    fn collection(schema: &Schema, owner: TypeId, name: &str) -> CollectionId {
        let ids = &schema.type_def(owner).collections;
        schema.find_member_collection(ids, name, &settings()).unwrap()
    }

    fn home(schema: &Schema, owner: TypeId) -> EmbeddedId {
        schema
            .find_embedded(&schema.type_def(owner).embedded, "Home", &settings())
            .unwrap()
    }

    fn single(id: usize, name: &str, def: FieldId, value: &str) -> LoreAttribute {
        LoreAttribute::new(
            EntityId(id),
            name,
            DefRef::Field(def),
            AttributeValue::Single(value.into()),
        )
    }

    /// Entities 100.. : a Home embedded node that satisfies Location.
    fn valid_home(schema: &Schema, owner: TypeId) -> LoreNode {
        let location = ty(schema, "Location");
        let region = field(schema, &schema.type_def(location).fields, "Region");
        LoreNode::new(EntityId(100), "Home", DefRef::Embedded(home(schema, owner)))
            .with_attribute(single(101, "Region", region, "Coast"))
    }

    /// Entities 200.. : a History section, optionally with a complete Childhood.
    fn history(schema: &Schema, owner: TypeId, birthplace: bool) -> LoreSection {
        let history_id = section(schema, &schema.type_def(owner).sections, "History");
        let childhood_id = section(schema, &schema.section(history_id).sections, "Childhood");
        let mut childhood =
            LoreSection::new(EntityId(201), "Childhood", DefRef::Section(childhood_id));
        if birthplace {
            let def = field(schema, &schema.section(childhood_id).fields, "Birthplace");
            childhood = childhood.with_attribute(single(202, "Birthplace", def, "Vell"));
        }
        LoreSection::new(EntityId(200), "History", DefRef::Section(history_id))
            .with_section(childhood)
    }

    fn character(schema: &Schema, type_name: &str) -> LoreNode {
        let id = ty(schema, type_name);
        let name = field(schema, &schema.type_def(id).fields, "Name");
        LoreNode::new(EntityId(0), "Ayla", DefRef::Type(id))
            .with_embedded(valid_home(schema, id))
            .with_attribute(single(1, "Name", name, "Ayla"))
            .with_section(history(schema, id, true))
    }

    #[test]
    fn test_complete_node_passes_everywhere() {
        let schema = world();
        let root: LoreEntity = character(&schema, "Hero").into();
        let result = validate(&schema, &settings(), &[root.clone()]);

        assert!(result.is_clean());
        assert_eq!(result.worst(), Passed);
        assert_eq!(result.len(), root.count());
        assert!(result.states().all(|(_, state)| state == Passed));
    }

    #[test]
    fn test_overridden_requirement_reports_one_error() {
        let doc = SchemaDocument::default()
            .with_type(TypeDocument::new("TypeA").with_field(FieldDocument::optional("F1")))
            .with_type(
                TypeDocument::new("TypeB")
                    .extending("TypeA")
                    .with_field(FieldDocument::required("F1")),
            );
        let schema = Schema::from_document(&doc, &settings()).unwrap();
        let node = LoreNode::new(EntityId(0), "b", DefRef::Type(ty(&schema, "TypeB")));
        let result = validate(&schema, &settings(), &[node.into()]);

        assert_eq!(result.error_count(), 1);
        assert_eq!(result.errors(EntityId(0)), ["Missing required attribute 'F1'"]);
        assert_eq!(result.state(EntityId(0)), Some(Failed));
    }

    #[test]
    fn test_direct_violation_beats_valid_children() {
        let schema = world();
        let mut node = character(&schema, "Character");
        node.attributes.clear();
        let result = validate(&schema, &settings(), &[node.into()]);

        assert_eq!(result.state(EntityId(0)), Some(Failed));
        assert_eq!(result.state(EntityId(200)), Some(Passed));
        assert_eq!(result.errors(EntityId(0)), ["Missing required attribute 'Name'"]);
    }

    #[test]
    fn test_failed_section_escalates_to_child_failed() {
        let schema = world();
        let hero = ty(&schema, "Hero");
        let mut node = character(&schema, "Hero");
        node.sections = vec![history(&schema, hero, false).into()];
        let result = validate(&schema, &settings(), &[node.into()]);

        assert_eq!(result.state(EntityId(201)), Some(Failed));
        assert_eq!(result.state(EntityId(200)), Some(ChildFailed));
        assert_eq!(result.state(EntityId(0)), Some(ChildFailed));
        assert_eq!(
            result.errors(EntityId(201)),
            ["Missing required attribute 'Birthplace'"]
        );
        assert!(result.errors(EntityId(0)).is_empty());
    }

    #[test]
    fn test_missing_section_collection_and_embedded_node() {
        let doc = SchemaDocument::default()
            .with_type(TypeDocument::new("Place"))
            .with_type(
                TypeDocument::new("Realm")
                    .with_section(SectionDocument::new("Geography").with_required(true))
                    .with_collection(CollectionDocument::of("Cities", "Place").with_required(true))
                    .with_embedded(EmbeddedDocument::new("Place").with_required(true)),
            );
        let schema = Schema::from_document(&doc, &settings()).unwrap();
        let node = LoreNode::new(EntityId(0), "Vell", DefRef::Type(ty(&schema, "Realm")));
        let result = validate(&schema, &settings(), &[node.into()]);

        assert_eq!(
            result.errors(EntityId(0)),
            [
                "Missing required section 'Geography'",
                "Missing required collection 'Cities'",
                "Missing required embedded node 'Place'",
            ]
        );
        assert_eq!(result.state(EntityId(0)), Some(Failed));
    }

    #[test]
    fn test_invalid_pick_list_value() {
        let doc = SchemaDocument::default()
            .with_picklist(PicklistDocument::flat("Letters", &["A", "B"]))
            .with_type(
                TypeDocument::new("Glyph")
                    .with_field(FieldDocument::pick_list("Letter", "Letters")),
            );
        let schema = Schema::from_document(&doc, &settings()).unwrap();
        let glyph = ty(&schema, "Glyph");
        let letter = field(&schema, &schema.type_def(glyph).fields, "Letter");
        let node = LoreNode::new(EntityId(0), "g", DefRef::Type(glyph))
            .with_attribute(single(1, "Letter", letter, "C"));
        let result = validate(&schema, &settings(), &[node.into()]);

        assert_eq!(result.error_count(), 1);
        assert_eq!(
            result.errors(EntityId(1)),
            ["Value 'C' for attribute 'Letter' is not a valid option. Valid options: A, B"]
        );
        assert_eq!(result.state(EntityId(1)), Some(Failed));
        assert_eq!(result.state(EntityId(0)), Some(ChildFailed));
    }

    #[test]
    fn test_pick_list_accepts_nested_entries_and_folds_case() {
        let schema = world();
        let hero = ty(&schema, "Hero");
        let alignment = field(&schema, &schema.type_def(hero).fields, "Alignment");
        let node = character(&schema, "Hero")
            .with_attribute(single(2, "Alignment", alignment, "lawful good"));
        let result = validate(&schema, &settings(), &[node.into()]);
        assert!(result.is_clean());

        let strict = SchemaSettings {
            case_sensitive: true,
            ..settings()
        };
        let node = character(&schema, "Hero")
            .with_attribute(single(2, "Alignment", alignment, "lawful good"));
        let result = validate(&schema, &strict, &[node.into()]);
        assert_eq!(result.state(EntityId(2)), Some(Failed));
    }

    #[test]
    fn test_multi_value_pick_list_checks_every_item() {
        let schema = world();
        let hero = ty(&schema, "Hero");
        let alignment = field(&schema, &schema.type_def(hero).fields, "Alignment");
        let node = character(&schema, "Hero").with_attribute(LoreAttribute::new(
            EntityId(2),
            "Alignment",
            DefRef::Field(alignment),
            AttributeValue::Multi(vec!["Good".into(), "Neutral".into(), "Chaotic".into()]),
        ));
        let result = validate(&schema, &settings(), &[node.into()]);

        assert_eq!(result.errors(EntityId(2)).len(), 2);
        assert!(result.errors(EntityId(2))[0].starts_with("Value 'Neutral'"));
        assert!(result.errors(EntityId(2))[1].ends_with("Good, Lawful Good, Evil"));
    }

    #[test]
    fn test_empty_value_is_a_warning() {
        let schema = world();
        let hero = ty(&schema, "Hero");
        let alignment = field(&schema, &schema.type_def(hero).fields, "Alignment");
        let node = character(&schema, "Hero").with_attribute(single(2, "Alignment", alignment, ""));
        let result = validate(&schema, &settings(), &[node.into()]);

        assert!(result.is_clean());
        assert_eq!(result.state(EntityId(2)), Some(Warning));
        assert_eq!(result.state(EntityId(0)), Some(ChildWarning));
        assert_eq!(result.warnings(EntityId(2)), ["Attribute 'Alignment' has no value"]);
        assert_eq!(result.worst(), Warning);
    }

    #[test]
    fn test_failure_outranks_sibling_warning() {
        let schema = world();
        let hero = ty(&schema, "Hero");
        let alignment = field(&schema, &schema.type_def(hero).fields, "Alignment");
        let mut node =
            character(&schema, "Hero").with_attribute(single(2, "Alignment", alignment, ""));
        node.sections = vec![history(&schema, hero, false).into()];
        let result = validate(&schema, &settings(), &[node.into()]);

        assert_eq!(result.state(EntityId(0)), Some(ChildFailed));
        assert_eq!(result.worst(), Failed);
    }

    #[test]
    fn test_nested_values_enforce_nested_requirements() {
        let schema = world();
        let hero = ty(&schema, "Hero");
        let stats = field(&schema, &schema.type_def(hero).fields, "Stats");
        let wits = field(&schema, &schema.field(stats).fields, "Wits");
        let node = character(&schema, "Hero").with_attribute(LoreAttribute::new(
            EntityId(3),
            "Stats",
            DefRef::Field(stats),
            AttributeValue::Nested(vec![single(4, "Wits", wits, "14").into()]),
        ));
        let result = validate(&schema, &settings(), &[node.into()]);

        assert_eq!(result.state(EntityId(4)), Some(Passed));
        assert_eq!(result.state(EntityId(3)), Some(Failed));
        assert_eq!(result.errors(EntityId(3)), ["Missing required attribute 'Strength'"]);
        assert_eq!(result.state(EntityId(0)), Some(ChildFailed));
    }

    #[test]
    fn test_failing_tree_still_records_every_entity() {
        let schema = world();
        let hero = ty(&schema, "Hero");
        let fields = &schema.type_def(hero).fields;
        let alignment = field(&schema, fields, "Alignment");
        let stats = field(&schema, fields, "Stats");
        let wits = field(&schema, &schema.field(stats).fields, "Wits");
        let mut node = character(&schema, "Hero")
            .with_attribute(single(2, "Alignment", alignment, "Neutral"))
            .with_attribute(LoreAttribute::new(
                EntityId(3),
                "Stats",
                DefRef::Field(stats),
                AttributeValue::Nested(vec![single(4, "Wits", wits, "").into()]),
            ));
        node.sections = vec![history(&schema, hero, false).into()];
        let root: LoreEntity = node.into();
        let result = validate(&schema, &settings(), &[root.clone()]);

        assert_eq!(result.len(), root.count());
        assert_eq!(result.state(EntityId(2)), Some(Failed));
        assert_eq!(result.state(EntityId(3)), Some(Failed));
        assert_eq!(result.state(EntityId(4)), Some(Warning));
        assert_eq!(result.state(EntityId(201)), Some(Failed));
        assert_eq!(result.state(EntityId(0)), Some(ChildFailed));
    }

    #[test]
    fn test_override_without_style_checks_parent_picklist() {
        let doc = SchemaDocument::default()
            .with_picklist(PicklistDocument {
                name: "Alignments".into(),
                entries: vec![PicklistEntry::new("Good"), PicklistEntry::new("Evil")],
            })
            .with_type(
                TypeDocument::new("Character")
                    .with_field(FieldDocument::pick_list("Alignment", "Alignments")),
            )
            .with_type(
                TypeDocument::new("Hero")
                    .extending("Character")
                    .with_field(FieldDocument::required("Alignment")),
            );
        let schema = Schema::from_document(&doc, &settings()).unwrap();
        let hero = ty(&schema, "Hero");
        let alignment = field(&schema, &schema.type_def(hero).fields, "Alignment");
        let node = LoreNode::new(EntityId(0), "Ayla", DefRef::Type(hero))
            .with_attribute(single(1, "Alignment", alignment, "Neutral"));
        let result = validate(&schema, &settings(), &[node.into()]);

        assert_eq!(result.state(EntityId(1)), Some(Failed));
        assert_eq!(
            result.errors(EntityId(1)),
            ["Value 'Neutral' for attribute 'Alignment' is not a valid option. \
              Valid options: Good, Evil"]
        );
        assert_eq!(result.state(EntityId(0)), Some(ChildFailed));
    }

    #[test]
    fn test_collection_items_accept_descendant_types() {
        let schema = world();
        let character_id = ty(&schema, "Character");
        let parties = collection(&schema, character_id, "Parties");
        let party = schema.collection(parties).nested.unwrap();

        let mut member = character(&schema, "Hero");
        member.id = EntityId(12);
        let mut broken = character(&schema, "Character");
        broken.id = EntityId(13);
        broken.attributes.clear();

        let name = field(&schema, &schema.type_def(character_id).fields, "Name");
        let node = LoreNode::new(EntityId(10), "Company", DefRef::Type(character_id))
            .with_embedded(valid_home(&schema, character_id))
            .with_attribute(single(14, "Name", name, "Co"))
            .with_section(history(&schema, character_id, true))
            .with_collection(
                LoreCollection::new(EntityId(11), "Parties", DefRef::Collection(parties)).with_item(
                    LoreCollection::new(EntityId(15), "Party", DefRef::Collection(party))
                        .with_item(member)
                        .with_item(broken),
                ),
            );
        let result = validate(&schema, &settings(), &[node.into()]);

        assert_eq!(result.state(EntityId(12)), Some(Passed));
        assert_eq!(result.state(EntityId(13)), Some(Failed));
        assert_eq!(result.state(EntityId(15)), Some(ChildFailed));
        assert_eq!(result.state(EntityId(11)), Some(ChildFailed));
        assert_eq!(result.state(EntityId(10)), Some(ChildFailed));
    }

    #[test]
    fn test_embedded_node_is_checked_against_its_type() {
        let schema = world();
        let mut node = character(&schema, "Hero");
        if let LoreEntity::Node(home) = &mut node.embedded[0] {
            home.attributes.clear();
        }
        let result = validate(&schema, &settings(), &[node.into()]);

        assert_eq!(result.errors(EntityId(100)), ["Missing required attribute 'Region'"]);
        assert_eq!(result.state(EntityId(0)), Some(ChildFailed));
    }

    #[test]
    fn test_multiple_roots_share_one_result() {
        let schema = world();
        let mut second = character(&schema, "Hero");
        second.id = EntityId(50);
        second.attributes.clear();
        let roots = [character(&schema, "Hero").into(), second.into()];
        let result = validate(&schema, &settings(), &roots);

        assert_eq!(result.state(EntityId(0)), Some(Passed));
        assert_eq!(result.state(EntityId(50)), Some(Failed));
    }

    #[test]
    #[should_panic(expected = "contract violation")]
    fn test_attribute_bound_to_section_definition_panics() {
        let schema = world();
        let hero = ty(&schema, "Hero");
        let history = section(&schema, &schema.type_def(hero).sections, "History");
        let node = character(&schema, "Hero").with_attribute(LoreAttribute::new(
            EntityId(9),
            "History",
            DefRef::Section(history),
            AttributeValue::Single("x".into()),
        ));
        validate(&schema, &settings(), &[node.into()]);
    }

    #[test]
    #[should_panic(expected = "contract violation")]
    fn test_field_from_another_type_panics() {
        let schema = world();
        let location = ty(&schema, "Location");
        let region = field(&schema, &schema.type_def(location).fields, "Region");
        let node = character(&schema, "Hero").with_attribute(single(9, "Region", region, "x"));
        validate(&schema, &settings(), &[node.into()]);
    }

    #[test]
    #[should_panic(expected = "contract violation")]
    fn test_collection_item_of_wrong_type_panics() {
        let schema = world();
        let hero = ty(&schema, "Hero");
        let items = collection(&schema, hero, "Items");
        let root = LoreCollection::new(EntityId(0), "Items", DefRef::Collection(items)).with_item(
            LoreNode::new(EntityId(1), "Vell", DefRef::Type(ty(&schema, "Location"))),
        );
        validate(&schema, &settings(), &[root.into()]);
    }

    #[test]
    #[should_panic(expected = "contract violation")]
    fn test_nested_values_on_single_value_field_panics() {
        let schema = world();
        let hero = ty(&schema, "Hero");
        let fields = &schema.type_def(hero).fields;
        let name = field(&schema, fields, "Name");
        let wits = field(&schema, &schema.field(field(&schema, fields, "Stats")).fields, "Wits");
        let node = character(&schema, "Hero").with_attribute(LoreAttribute::new(
            EntityId(2),
            "Name",
            DefRef::Field(name),
            AttributeValue::Nested(vec![single(3, "Wits", wits, "14").into()]),
        ));
        validate(&schema, &settings(), &[node.into()]);
    }

    #[test]
    #[should_panic(expected = "contract violation")]
    fn test_node_bound_to_field_definition_panics() {
        let schema = world();
        let hero = ty(&schema, "Hero");
        let name = field(&schema, &schema.type_def(hero).fields, "Name");
        let node = LoreNode::new(EntityId(0), "Ayla", DefRef::Field(name));
        validate(&schema, &settings(), &[node.into()]);
    }

    #[test]
    fn test_severity_order_is_total() {
        let ordered = [Passed, ChildWarning, Warning, ChildFailed, Failed];
        for pair in ordered.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert!(!Warning.is_failure());
        assert!(ChildFailed.is_failure());
    }
}
