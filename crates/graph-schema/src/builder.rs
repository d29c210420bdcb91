mod error;

use std::collections::{hash_map::Entry, HashMap, HashSet};

pub use error::BuildError;

use crate::{
    attribute::{AttributeOwner, AttributeRecord},
    authorization::resolve_authorization,
    declaration::{AttributeDeclaration, InterfaceDeclaration, NodeDeclaration, RelationshipDeclaration, SchemaDeclaration},
    entity::{CapabilityIndex, ConcreteEntityRecord, FulltextIndex, InterfaceEntityRecord, Limit, UnionEntityRecord, VectorIndex},
    names::{EntityNames, RelationshipNames},
    relationship::{RelationshipDeclarationRecord, RelationshipPropertiesRecord, RelationshipRecord},
    AttributeId, AttributeType, AuthenticationRule, ConcreteEntityId, EntityId, IdRange, InterfaceEntityId,
    RelationshipDeclarationId, RelationshipId, RelationshipPropertiesId, RootField, RootFieldKind, Schema,
    UnionEntityId,
};

pub(crate) fn build(declaration: &SchemaDeclaration) -> Result<Schema, BuildError> {
    let mut builder = Builder {
        declaration,
        schema: Schema {
            concrete_entities: Vec::with_capacity(declaration.nodes.len()),
            interface_entities: Vec::with_capacity(declaration.interfaces.len()),
            union_entities: Vec::with_capacity(declaration.unions.len()),
            attributes: Vec::new(),
            relationships: Vec::new(),
            relationship_declarations: Vec::new(),
            relationship_properties: Vec::with_capacity(declaration.relationship_properties.len()),
            entities_by_name: HashMap::new(),
            root_fields: HashMap::new(),
            authentication: declaration.authentication.as_ref().map(AuthenticationRule::from),
        },
        properties_by_name: HashMap::new(),
    };

    // Every entity gets its id before anything is resolved, so relationships can point at
    // entities declared later, including their own source.
    builder.register_entities()?;
    builder.ingest_relationship_properties()?;
    builder.ingest_interfaces()?;
    builder.ingest_nodes()?;
    builder.ingest_unions()?;
    builder.link_implementations()?;
    builder.index_root_fields()?;

    let schema = builder.schema;

    tracing::debug!(
        nodes = schema.concrete_entities.len(),
        interfaces = schema.interface_entities.len(),
        unions = schema.union_entities.len(),
        relationships = schema.relationships.len(),
        root_fields = schema.root_fields.len(),
        "built graph schema"
    );

    Ok(schema)
}

struct Builder<'a> {
    declaration: &'a SchemaDeclaration,
    schema: Schema,
    properties_by_name: HashMap<&'a str, RelationshipPropertiesId>,
}

impl<'a> Builder<'a> {
    fn register_entities(&mut self) -> Result<(), BuildError> {
        let declaration = self.declaration;

        let nodes = declaration.nodes.iter().enumerate().map(|(i, node)| {
            (node.name.as_str(), EntityId::from(ConcreteEntityId::from(i)))
        });

        let interfaces = declaration.interfaces.iter().enumerate().map(|(i, interface)| {
            (interface.name.as_str(), EntityId::from(InterfaceEntityId::from(i)))
        });

        let unions = declaration.unions.iter().enumerate().map(|(i, union)| {
            (union.name.as_str(), EntityId::from(UnionEntityId::from(i)))
        });

        for (name, id) in nodes.chain(interfaces).chain(unions) {
            match self.schema.entities_by_name.entry(name.to_string()) {
                Entry::Occupied(_) => return Err(BuildError::DuplicateEntity { name: name.to_string() }),
                Entry::Vacant(entry) => {
                    entry.insert(id);
                }
            }
        }

        Ok(())
    }

    fn ingest_relationship_properties(&mut self) -> Result<(), BuildError> {
        let declaration = self.declaration;

        for (i, properties) in declaration.relationship_properties.iter().enumerate() {
            let id = RelationshipPropertiesId::from(i);

            if self.properties_by_name.insert(&properties.name, id).is_some() {
                return Err(BuildError::DuplicateEntity {
                    name: properties.name.clone(),
                });
            }

            let attributes = self.push_attributes(
                &properties.name,
                &properties.attributes,
                AttributeOwner::RelationshipProperties(id),
                |_, record| record,
            )?;

            self.schema.relationship_properties.push(RelationshipPropertiesRecord {
                name: properties.name.clone(),
                attributes,
            });
        }

        Ok(())
    }

    fn ingest_interfaces(&mut self) -> Result<(), BuildError> {
        let declaration = self.declaration;

        for (i, interface) in declaration.interfaces.iter().enumerate() {
            let id = InterfaceEntityId::from(i);

            let attributes = self.push_attributes(
                &interface.name,
                &interface.attributes,
                AttributeOwner::Interface(id),
                |_, record| record,
            )?;

            let start = RelationshipDeclarationId::from(self.schema.relationship_declarations.len());

            for relationship in &interface.relationships {
                self.ensure_unique_field(&interface.name, &interface.attributes, &interface.relationships, &relationship.name)?;

                let target = self.resolve_target(&interface.name, relationship)?;
                let properties = self.resolve_properties(&interface.name, relationship)?;
                let first_declaring_interface = self.first_declaring_interface(&relationship.name).unwrap_or(id);
                let first_declaring_name = &declaration.interfaces[usize::from(first_declaring_interface)].name;

                self.schema.relationship_declarations.push(RelationshipDeclarationRecord {
                    name: relationship.name.clone(),
                    interface: id,
                    target,
                    list: relationship.list,
                    properties,
                    implementations: Vec::new(),
                    first_declaring_interface,
                    names: RelationshipNames::new(first_declaring_name, &relationship.name, &relationship.target),
                });
            }

            let declarations = IdRange {
                start,
                end: RelationshipDeclarationId::from(self.schema.relationship_declarations.len()),
            };

            let capability_index = CapabilityIndex::build(&self.schema, attributes);

            self.schema.interface_entities.push(InterfaceEntityRecord {
                name: interface.name.clone(),
                names: EntityNames::new(&interface.name, interface.plural.as_deref()),
                attributes,
                declarations,
                implementors: Vec::new(),
                capability_index,
                authorization: interface
                    .authorization
                    .as_ref()
                    .map(resolve_authorization)
                    .unwrap_or_default(),
                authentication: interface.authentication.as_ref().map(AuthenticationRule::from),
                limit: interface.limit.map(|limit| Limit {
                    default: limit.default,
                    max: limit.max,
                }),
            });
        }

        Ok(())
    }

    fn ingest_nodes(&mut self) -> Result<(), BuildError> {
        let declaration = self.declaration;

        for (i, node) in declaration.nodes.iter().enumerate() {
            let id = ConcreteEntityId::from(i);

            let interfaces = node
                .implements
                .iter()
                .map(|name| match self.schema.entities_by_name.get(name) {
                    Some(EntityId::Interface(interface)) => Ok(*interface),
                    _ => Err(BuildError::UnknownInterface {
                        entity: node.name.clone(),
                        interface: name.clone(),
                    }),
                })
                .collect::<Result<Vec<_>, _>>()?;

            let inherited = self.implemented_interface_declarations(&interfaces);

            let attributes = self.push_attributes(
                &node.name,
                &node.attributes,
                AttributeOwner::Concrete(id),
                |attribute, mut record| {
                    inherit_annotations(&inherited, attribute, &mut record);
                    record
                },
            )?;

            let relationships = self.push_relationships(id, node)?;
            let capability_index = CapabilityIndex::build(&self.schema, attributes);
            let fulltext_indexes = self.fulltext_indexes(node, attributes)?;

            let labels = match node.labels.is_empty() {
                true => vec![node.name.clone()],
                false => node.labels.clone(),
            };

            self.schema.concrete_entities.push(ConcreteEntityRecord {
                name: node.name.clone(),
                labels,
                names: EntityNames::new(&node.name, node.plural.as_deref()),
                attributes,
                relationships,
                interfaces,
                unions: Vec::new(),
                capability_index,
                authorization: node.authorization.as_ref().map(resolve_authorization).unwrap_or_default(),
                authentication: node.authentication.as_ref().map(AuthenticationRule::from),
                fulltext_indexes,
                vector_indexes: node
                    .vector_indexes
                    .iter()
                    .map(|index| VectorIndex {
                        name: index.name.clone(),
                        embedding_property: index.embedding_property.clone(),
                        query_name: index.query_name.clone(),
                    })
                    .collect(),
                limit: node.limit.map(|limit| Limit {
                    default: limit.default,
                    max: limit.max,
                }),
            });
        }

        Ok(())
    }

    fn push_relationships(&mut self, source: ConcreteEntityId, node: &NodeDeclaration) -> Result<IdRange<RelationshipId>, BuildError> {
        let start = RelationshipId::from(self.schema.relationships.len());

        for relationship in &node.relationships {
            self.ensure_unique_field(&node.name, &node.attributes, &node.relationships, &relationship.name)?;

            let target = self.resolve_target(&node.name, relationship)?;
            let properties = self.resolve_properties(&node.name, relationship)?;

            self.schema.relationships.push(RelationshipRecord {
                name: relationship.name.clone(),
                source,
                target,
                edge_type: relationship.edge_type.clone(),
                direction: relationship.direction,
                query_direction: relationship.query_direction,
                list: relationship.list,
                required: relationship.required,
                nested_operations: relationship.nested_operations.iter().copied().collect(),
                properties,
                aggregate: relationship.aggregate,
                authentication: relationship.authentication.as_ref().map(AuthenticationRule::from),
                declaration: None,
                names: RelationshipNames::new(&node.name, &relationship.name, &relationship.target),
            });
        }

        Ok(IdRange {
            start,
            end: RelationshipId::from(self.schema.relationships.len()),
        })
    }

    fn fulltext_indexes(&self, node: &NodeDeclaration, attributes: IdRange<AttributeId>) -> Result<Vec<FulltextIndex>, BuildError> {
        node.fulltext_indexes
            .iter()
            .map(|index| {
                let fields = index
                    .fields
                    .iter()
                    .map(|field| {
                        self.schema[attributes]
                            .iter()
                            .find(|attribute| &attribute.name == field && attribute.ty == AttributeType::String)
                            .map(|attribute| attribute.storage_name.clone())
                            .ok_or_else(|| BuildError::InvalidIndexField {
                                entity: node.name.clone(),
                                index: index.name.clone(),
                                field: field.clone(),
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(FulltextIndex {
                    name: index.name.clone(),
                    fields,
                })
            })
            .collect()
    }

    fn ingest_unions(&mut self) -> Result<(), BuildError> {
        let declaration = self.declaration;

        for (i, union) in declaration.unions.iter().enumerate() {
            let id = UnionEntityId::from(i);

            let members = union
                .members
                .iter()
                .map(|name| match self.schema.entities_by_name.get(name) {
                    Some(EntityId::Concrete(member)) => Ok(*member),
                    _ => Err(BuildError::InvalidUnionMember {
                        union: union.name.clone(),
                        member: name.clone(),
                    }),
                })
                .collect::<Result<Vec<_>, _>>()?;

            for member in &members {
                self.schema.concrete_entities[usize::from(*member)].unions.push(id);
            }

            self.schema.union_entities.push(UnionEntityRecord {
                name: union.name.clone(),
                names: EntityNames::new(&union.name, union.plural.as_deref()),
                members,
            });
        }

        Ok(())
    }

    /// Registers every node with the interfaces it implements and checks it matches their
    /// declarations: same attribute types, same relationship cardinality, compatible targets.
    fn link_implementations(&mut self) -> Result<(), BuildError> {
        let declaration = self.declaration;

        for (i, node) in declaration.nodes.iter().enumerate() {
            let id = ConcreteEntityId::from(i);
            let interfaces = self.schema[id].interfaces.clone();

            for interface_id in interfaces {
                self.schema.interface_entities[usize::from(interface_id)].implementors.push(id);

                let interface = &self.schema[interface_id];
                let incompatible = |field: &str| BuildError::IncompatibleImplementation {
                    entity: node.name.clone(),
                    interface: interface.name.clone(),
                    field: field.to_string(),
                };
                let missing = |field: &str| BuildError::MissingInterfaceField {
                    entity: node.name.clone(),
                    interface: interface.name.clone(),
                    field: field.to_string(),
                };

                for declared in &self.schema[interface.attributes] {
                    let implemented = self.schema[self.schema[id].attributes]
                        .iter()
                        .find(|attribute| attribute.name == declared.name)
                        .ok_or_else(|| missing(&declared.name))?;

                    if implemented.ty != declared.ty || implemented.list != declared.list {
                        return Err(incompatible(&declared.name));
                    }
                }

                let mut links = Vec::new();

                for declaration_id in interface.declarations.iter() {
                    let declared = &self.schema[declaration_id];

                    let relationship_id = self.schema[id]
                        .relationships
                        .iter()
                        .find(|relationship| self.schema[*relationship].name == declared.name)
                        .ok_or_else(|| missing(&declared.name))?;

                    let implemented = &self.schema[relationship_id];

                    if implemented.list != declared.list || !self.is_compatible_target(declared.target, implemented.target) {
                        return Err(incompatible(&declared.name));
                    }

                    links.push((declaration_id, relationship_id));
                }

                for (declaration_id, relationship_id) in links {
                    self.schema.relationship_declarations[usize::from(declaration_id)]
                        .implementations
                        .push(relationship_id);

                    // The first implemented interface declaring the field wins.
                    self.schema.relationships[usize::from(relationship_id)]
                        .declaration
                        .get_or_insert(declaration_id);
                }
            }
        }

        Ok(())
    }

    fn index_root_fields(&mut self) -> Result<(), BuildError> {
        let mut fields = Vec::new();

        for entity in self.schema.concrete_entities() {
            let id = EntityId::Concrete(entity.id());
            let names = entity.names();

            fields.extend([
                (names.read_field.clone(), RootFieldKind::Read, id),
                (names.connection_field.clone(), RootFieldKind::Connection, id),
                (names.aggregate_field.clone(), RootFieldKind::Aggregate, id),
                (names.create_field.clone(), RootFieldKind::Create, id),
                (names.update_field.clone(), RootFieldKind::Update, id),
                (names.delete_field.clone(), RootFieldKind::Delete, id),
            ]);

            for index in entity.fulltext_indexes() {
                fields.push((names.fulltext_field(&index.name), RootFieldKind::Fulltext(index.name.clone()), id));
            }

            for index in entity.vector_indexes() {
                fields.push((index.query_name.clone(), RootFieldKind::Vector(index.name.clone()), id));
            }
        }

        for entity in self.schema.interface_entities() {
            let id = EntityId::Interface(entity.id());
            let names = entity.names();

            fields.extend([
                (names.read_field.clone(), RootFieldKind::Read, id),
                (names.connection_field.clone(), RootFieldKind::Connection, id),
                (names.aggregate_field.clone(), RootFieldKind::Aggregate, id),
            ]);
        }

        for entity in self.schema.union_entities() {
            let id = EntityId::Union(entity.id());
            let names = entity.names();

            fields.extend([
                (names.read_field.clone(), RootFieldKind::Read, id),
                (names.connection_field.clone(), RootFieldKind::Connection, id),
            ]);
        }

        for (name, kind, entity) in fields {
            match self.schema.root_fields.entry(name) {
                Entry::Occupied(entry) => return Err(BuildError::DuplicateRootField(entry.key().clone())),
                Entry::Vacant(entry) => {
                    entry.insert(RootField { kind, entity });
                }
            }
        }

        Ok(())
    }

    fn push_attributes(
        &mut self,
        owner_name: &str,
        declarations: &[AttributeDeclaration],
        owner: AttributeOwner,
        adjust: impl Fn(&AttributeDeclaration, AttributeRecord) -> AttributeRecord,
    ) -> Result<IdRange<AttributeId>, BuildError> {
        let start = AttributeId::from(self.schema.attributes.len());
        let mut seen = HashSet::new();

        for declaration in declarations {
            if !seen.insert(declaration.name.as_str()) {
                return Err(BuildError::DuplicateField {
                    entity: owner_name.to_string(),
                    field: declaration.name.clone(),
                });
            }

            let record = adjust(declaration, AttributeRecord::new(declaration, owner));
            self.schema.attributes.push(record);
        }

        Ok(IdRange {
            start,
            end: AttributeId::from(self.schema.attributes.len()),
        })
    }

    fn ensure_unique_field(
        &self,
        entity: &str,
        attributes: &[AttributeDeclaration],
        relationships: &[RelationshipDeclaration],
        name: &str,
    ) -> Result<(), BuildError> {
        let occurrences = attributes.iter().filter(|attribute| attribute.name == name).count()
            + relationships.iter().filter(|relationship| relationship.name == name).count();

        if occurrences > 1 {
            return Err(BuildError::DuplicateField {
                entity: entity.to_string(),
                field: name.to_string(),
            });
        }

        Ok(())
    }

    fn resolve_target(&self, entity: &str, relationship: &RelationshipDeclaration) -> Result<EntityId, BuildError> {
        self.schema
            .entities_by_name
            .get(&relationship.target)
            .copied()
            .ok_or_else(|| BuildError::UnknownRelationshipTarget {
                entity: entity.to_string(),
                field: relationship.name.clone(),
                target: relationship.target.clone(),
            })
    }

    fn resolve_properties(
        &self,
        entity: &str,
        relationship: &RelationshipDeclaration,
    ) -> Result<Option<RelationshipPropertiesId>, BuildError> {
        relationship
            .properties
            .as_ref()
            .map(|name| {
                self.properties_by_name
                    .get(name.as_str())
                    .copied()
                    .ok_or_else(|| BuildError::UnknownRelationshipProperties {
                        entity: entity.to_string(),
                        field: relationship.name.clone(),
                        properties: name.clone(),
                    })
            })
            .transpose()
    }

    fn first_declaring_interface(&self, field: &str) -> Option<InterfaceEntityId> {
        self.declaration
            .interfaces
            .iter()
            .position(|interface| interface.relationships.iter().any(|relationship| relationship.name == field))
            .map(InterfaceEntityId::from)
    }

    fn implemented_interface_declarations(&self, interfaces: &[InterfaceEntityId]) -> Vec<&'a InterfaceDeclaration> {
        interfaces
            .iter()
            .map(|id| &self.declaration.interfaces[usize::from(*id)])
            .collect()
    }

    fn is_compatible_target(&self, declared: EntityId, implemented: EntityId) -> bool {
        if declared == implemented {
            return true;
        }

        match (declared, implemented) {
            (EntityId::Interface(interface), EntityId::Concrete(node)) => self.schema[node].interfaces.contains(&interface),
            (EntityId::Union(union), EntityId::Concrete(node)) => self.schema[union].members.contains(&node),
            _ => false,
        }
    }
}

/// A node attribute without its own annotations takes those of the first implemented interface
/// declaring an annotated attribute of the same name.
fn inherit_annotations(interfaces: &[&InterfaceDeclaration], declaration: &AttributeDeclaration, record: &mut AttributeRecord) {
    let declared = || {
        interfaces
            .iter()
            .filter_map(|interface| interface.attributes.iter().find(|attribute| attribute.name == declaration.name))
    };

    if declaration.authorization.is_none() {
        if let Some(authorization) = declared().find_map(|attribute| attribute.authorization.as_ref()) {
            record.authorization = resolve_authorization(authorization);
        }
    }

    if declaration.authentication.is_none() {
        if let Some(authentication) = declared().find_map(|attribute| attribute.authentication.as_ref()) {
            record.authentication = Some(AuthenticationRule::from(authentication));
        }
    }
}
