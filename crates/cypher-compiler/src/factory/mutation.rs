use std::collections::HashSet;

use graph_schema::{
    AttributeWalker, Autogenerate, ConcreteEntityWalker, EntityWalker, NestedOperation, NestedOperations, Operations,
    RelationshipWalker,
};
use serde_json::{Map, Value};

use super::{node_target, object, objects, stored_direction, FilterParser, QueryFactory};
use crate::{
    auth::AuthenticationTarget,
    error::{Error, Result},
    ir::{
        AuthorizationFilters, ConnectOrCreate, CreateInput, CreateOperation, DisconnectMutation, Filter, MathOperator,
        NestedMutation, Operation, PropertyWrite, RelationshipMutation, ResultProjection, UpdateInput, WriteValue,
    },
    request::ResolveTree,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum WriteMode {
    Create,
    Update,
}

impl WriteMode {
    fn operations(self) -> Operations {
        match self {
            WriteMode::Create => Operations::CREATE,
            WriteMode::Update => Operations::UPDATE,
        }
    }
}

/// What written properties belong to.
#[derive(Debug, Clone, Copy)]
pub(super) enum WriteTarget<'a> {
    Node(ConcreteEntityWalker<'a>),
    Edge(RelationshipWalker<'a>),
}

impl<'a> WriteTarget<'a> {
    fn name(self) -> &'a str {
        match self {
            WriteTarget::Node(entity) => entity.name(),
            WriteTarget::Edge(relationship) => relationship
                .properties()
                .map(|properties| properties.name())
                .unwrap_or(relationship.names().relationship_type.as_str()),
        }
    }

    fn find_attribute(self, name: &str) -> Option<AttributeWalker<'a>> {
        match self {
            WriteTarget::Node(entity) => entity.find_attribute(name),
            WriteTarget::Edge(relationship) => relationship.find_attribute(name),
        }
    }

    fn attributes(self) -> Vec<AttributeWalker<'a>> {
        match self {
            WriteTarget::Node(entity) => entity.attributes().collect(),
            WriteTarget::Edge(relationship) => relationship.attributes().collect(),
        }
    }
}

/// The parsed content of a create or update input object.
pub(super) struct Writes<'a, 'v> {
    pub properties: Vec<PropertyWrite>,
    pub attributes: Vec<AttributeWalker<'a>>,
    /// Relationship keys of a node input, handled as nested mutations.
    pub relationships: Vec<(RelationshipWalker<'a>, &'v Value)>,
}

impl<'a> QueryFactory<'a> {
    pub(super) fn create(&self, entity: ConcreteEntityWalker<'a>, tree: &ResolveTree) -> Result<Operation> {
        self.authenticate(AuthenticationTarget::Entity(EntityWalker::Concrete(entity)), Operations::CREATE)?;

        let input = tree
            .argument("input")
            .ok_or_else(|| Error::invalid_argument("input", "expected the nodes to create"))?;

        let mut inputs = Vec::new();

        for input in objects("input", input)? {
            inputs.push(self.create_input(entity, input)?);
        }

        Ok(Operation::Create(CreateOperation {
            entity: entity.name().to_string(),
            inputs,
            projection: self.projection(entity, tree)?,
        }))
    }

    pub(super) fn create_input(&self, entity: ConcreteEntityWalker<'a>, input: &Map<String, Value>) -> Result<CreateInput> {
        self.authenticate(AuthenticationTarget::Entity(EntityWalker::Concrete(entity)), Operations::CREATE)?;

        let writes = self.writes(WriteTarget::Node(entity), WriteMode::Create, input)?;
        let mut mutations = Vec::new();

        for (relationship, value) in writes.relationships {
            let inputs = nested_inputs(relationship, value, None)?;
            mutations.extend(self.relationship_mutations(entity, relationship, inputs, WriteMode::Create)?);
        }

        let authorization = self.authorizer.filters(entity, &writes.attributes, Operations::CREATE)?;

        Ok(CreateInput {
            entity: entity.name().to_string(),
            labels: entity.labels().to_vec(),
            properties: writes.properties,
            mutations,
            validate_after: authorization.validate_after,
        })
    }

    /// The mutated nodes read back under the `<plural>` field of the response.
    pub(super) fn projection(&self, entity: ConcreteEntityWalker<'a>, tree: &ResolveTree) -> Result<Option<ResultProjection>> {
        let Some(field) = tree.find_fields(&entity.names().plural).into_iter().next() else {
            return Ok(None);
        };

        let node = self.node_fields(entity, field)?;

        Ok(Some(ResultProjection {
            fields: node.fields,
            authorization: self.authorizer.filters(entity, &node.attributes, Operations::READ)?,
        }))
    }

    /// Parses the property assignments of an input object. Generated values and defaults
    /// are added for the attributes the input leaves out.
    pub(super) fn writes<'v>(
        &self,
        target: WriteTarget<'a>,
        mode: WriteMode,
        input: &'v Map<String, Value>,
    ) -> Result<Writes<'a, 'v>> {
        let mut writes = Writes {
            properties: Vec::new(),
            attributes: Vec::new(),
            relationships: Vec::new(),
        };

        let mut written = HashSet::new();

        for (key, value) in input {
            if let WriteTarget::Node(entity) = target {
                if let Some(relationship) = entity.find_relationship(key) {
                    writes.relationships.push((relationship, value));
                    continue;
                }
            }

            let (attribute, write) = resolve_write(target, mode, key, value)?;

            self.authenticate(AuthenticationTarget::Attribute(attribute), mode.operations())?;

            // Two names of one stored property, such as an attribute and its alias.
            if !written.insert(attribute.storage_name()) {
                return Err(Error::ConflictingPropertyWrites {
                    entity: target.name().to_string(),
                    property: attribute.storage_name().to_string(),
                });
            }

            writes.properties.push(PropertyWrite {
                property: attribute.storage_name().to_string(),
                ty: attribute.ty().clone(),
                value: write,
            });

            writes.attributes.push(attribute);
        }

        for attribute in target.attributes() {
            if written.contains(attribute.storage_name()) {
                continue;
            }

            let value = match (mode, attribute.autogenerate()) {
                (WriteMode::Create, Some(Autogenerate::Id)) => WriteValue::RandomUuid,
                (WriteMode::Create, Some(generated)) if generated.on_create() => WriteValue::Now,
                (WriteMode::Update, Some(generated)) if generated.on_update() => WriteValue::Now,
                (WriteMode::Create, None) => match attribute.default_value() {
                    Some(default) => WriteValue::Value(default.clone()),
                    None => continue,
                },
                _ => continue,
            };

            writes.properties.push(PropertyWrite {
                property: attribute.storage_name().to_string(),
                ty: attribute.ty().clone(),
                value,
            });
        }

        Ok(writes)
    }

    /// Nested mutations through one relationship of `source`.
    pub(super) fn relationship_mutations(
        &self,
        source: ConcreteEntityWalker<'a>,
        relationship: RelationshipWalker<'a>,
        inputs: Vec<(EntityWalker<'a>, &str, &Value)>,
        mode: WriteMode,
    ) -> Result<Vec<RelationshipMutation>> {
        self.authenticate(AuthenticationTarget::Relationship(relationship), mode.operations())?;

        let mut mutations = Vec::new();

        for (target, key, input) in inputs {
            let operation = match key {
                "create" => NestedOperation::Create,
                "connect" => NestedOperation::Connect,
                "connectOrCreate" => NestedOperation::ConnectOrCreate,
                "update" => NestedOperation::Update,
                "disconnect" => NestedOperation::Disconnect,
                "delete" => NestedOperation::Delete,
                key => return Err(Error::unknown_field(&relationship.names().relationship_type, key)),
            };

            let updating_only = matches!(
                operation,
                NestedOperation::Update | NestedOperation::Disconnect | NestedOperation::Delete
            );

            if mode == WriteMode::Create && updating_only {
                return Err(Error::invalid_argument(key, "only available when updating"));
            }

            if !relationship.allows(NestedOperations::from(operation)) {
                return Err(Error::NestedOperationNotAllowed {
                    entity: source.name().to_string(),
                    relationship: relationship.name().to_string(),
                    operation: operation.to_string(),
                });
            }

            tracing::trace!(relationship = relationship.name(), operation = %operation, "nested mutation");

            for item in objects(key, input)? {
                let nested = match operation {
                    NestedOperation::Create => vec![self.nested_create(relationship, target, item)?],
                    NestedOperation::Connect => vec![self.nested_connect(source, relationship, target, item)?],
                    NestedOperation::ConnectOrCreate => vec![self.nested_connect_or_create(relationship, target, item)?],
                    NestedOperation::Update => vec![self.nested_update(relationship, target, item)?],
                    NestedOperation::Disconnect => vec![self.nested_disconnect(source, relationship, target, item)?],
                    NestedOperation::Delete => self
                        .nested_deletes(relationship, target, item)?
                        .into_iter()
                        .map(NestedMutation::Delete)
                        .collect(),
                };

                mutations.extend(nested.into_iter().map(|mutation| RelationshipMutation {
                    relationship: relationship.name().to_string(),
                    edge_type: relationship.edge_type().to_string(),
                    direction: stored_direction(relationship),
                    mutation,
                }));
            }
        }

        Ok(mutations)
    }

    fn edge_writes(
        &self,
        relationship: RelationshipWalker<'a>,
        mode: WriteMode,
        input: Option<&Value>,
    ) -> Result<Vec<PropertyWrite>> {
        let empty = Map::new();

        let input = match input {
            Some(input) => object("edge", input)?,
            None => &empty,
        };

        if relationship.properties().is_none() && !input.is_empty() {
            return Err(Error::invalid_argument("edge", "the relationship has no properties"));
        }

        Ok(self.writes(WriteTarget::Edge(relationship), mode, input)?.properties)
    }

    /// `{ node, edge }`. Below an interface, `node` is keyed by the implementor to create.
    fn nested_create(
        &self,
        relationship: RelationshipWalker<'a>,
        target: EntityWalker<'a>,
        item: &Map<String, Value>,
    ) -> Result<NestedMutation> {
        let input = object("node", item.get("node").unwrap_or(&Value::Null))?;

        let (entity, input) = match target {
            EntityWalker::Concrete(entity) => (entity, input),
            target => {
                let mut members = input.iter();

                let (Some((name, input)), None) = (members.next(), members.next()) else {
                    return Err(Error::invalid_argument("node", "expected exactly one implementor"));
                };

                let entity = target
                    .concrete_entities()
                    .into_iter()
                    .find(|member| member.name() == name)
                    .ok_or_else(|| Error::UnknownEntity {
                        entity: name.clone(),
                        parent: target.name().to_string(),
                    })?;

                (entity, object(name, input)?)
            }
        };

        Ok(NestedMutation::Create {
            node: self.create_input(entity, input)?,
            edge: self.edge_writes(relationship, WriteMode::Create, item.get("edge"))?,
        })
    }

    /// `{ where: { node }, edge, connect }`, where `connect` continues from the connected
    /// nodes.
    fn nested_connect(
        &self,
        source: ConcreteEntityWalker<'a>,
        relationship: RelationshipWalker<'a>,
        target: EntityWalker<'a>,
        item: &Map<String, Value>,
    ) -> Result<NestedMutation> {
        let filter = match where_part(item, "node")? {
            Some(node) => FilterParser::user().entity_where(target, node)?,
            None => None,
        };

        let authorization = self.target_authorization(target, Operations::CREATE_RELATIONSHIP)?;

        let source_validation = self
            .authorizer
            .filters(source, &[], Operations::CREATE_RELATIONSHIP)?
            .validate_before;

        let mut nested = Vec::new();

        if let Some(connect) = item.get("connect") {
            let EntityWalker::Concrete(entity) = target else {
                return Err(Error::invalid_argument("connect", "cannot continue from an abstract target"));
            };

            for input in objects("connect", connect)? {
                for (key, value) in input {
                    let relationship = entity.find_relationship(key).ok_or_else(|| Error::UnknownRelationship {
                        entity: entity.name().to_string(),
                        relationship: key.clone(),
                    })?;

                    let inputs = nested_inputs(relationship, value, Some("connect"))?;
                    nested.extend(self.relationship_mutations(entity, relationship, inputs, WriteMode::Create)?);
                }
            }
        }

        Ok(NestedMutation::Connect {
            target: node_target(target),
            filter,
            authorization,
            source_validation,
            edge: self.edge_writes(relationship, WriteMode::Create, item.get("edge"))?,
            nested,
        })
    }

    /// `{ where: { node: <unique attributes> }, onCreate: { node, edge } }`.
    fn nested_connect_or_create(
        &self,
        relationship: RelationshipWalker<'a>,
        target: EntityWalker<'a>,
        item: &Map<String, Value>,
    ) -> Result<NestedMutation> {
        let EntityWalker::Concrete(entity) = target else {
            return Err(Error::invalid_argument("connectOrCreate", "cannot create an abstract target"));
        };

        if entity.unique_attributes().next().is_none() {
            return Err(Error::MissingUniqueAttributes {
                entity: entity.name().to_string(),
            });
        }

        self.authenticate(AuthenticationTarget::Entity(target), Operations::CREATE)?;

        let mut unique = Vec::new();

        for (key, value) in where_part(item, "node")?.into_iter().flatten() {
            let attribute = entity
                .find_attribute(key)
                .filter(|attribute| attribute.is_unique())
                .ok_or_else(|| Error::invalid_argument("where", format!("`{key}` is not a unique attribute")))?;

            unique.push((attribute.storage_name().to_string(), value.clone()));
        }

        if unique.is_empty() {
            return Err(Error::invalid_argument("where", "expected a unique attribute"));
        }

        let on_create = item
            .get("onCreate")
            .map(|value| object("onCreate", value))
            .transpose()?;

        let empty = Map::new();
        let node = match on_create.and_then(|on_create| on_create.get("node")) {
            Some(node) => object("node", node)?,
            None => &empty,
        };

        let writes = self.writes(WriteTarget::Node(entity), WriteMode::Create, node)?;

        if !writes.relationships.is_empty() {
            return Err(Error::invalid_argument("onCreate", "cannot create relationships"));
        }

        // The unique properties are part of the merged pattern.
        let on_create_writes = writes
            .properties
            .into_iter()
            .filter(|write| !unique.iter().any(|(property, _)| *property == write.property))
            .collect();

        Ok(NestedMutation::ConnectOrCreate(ConnectOrCreate {
            labels: entity.labels().to_vec(),
            unique,
            on_create: on_create_writes,
            edge: self.edge_writes(
                relationship,
                WriteMode::Create,
                on_create.and_then(|on_create| on_create.get("edge")),
            )?,
        }))
    }

    /// `{ where: { node, edge }, update: { node, edge } }`.
    fn nested_update(
        &self,
        relationship: RelationshipWalker<'a>,
        target: EntityWalker<'a>,
        item: &Map<String, Value>,
    ) -> Result<NestedMutation> {
        let EntityWalker::Concrete(entity) = target else {
            return Err(Error::invalid_argument("update", "cannot update an abstract target"));
        };

        self.authenticate(AuthenticationTarget::Entity(target), Operations::UPDATE)?;

        let filter = match item.get("where") {
            Some(input) => FilterParser::user().connection_where(relationship, target, object("where", input)?)?,
            None => None,
        };

        let update = item.get("update").map(|value| object("update", value)).transpose()?;

        let empty = Map::new();
        let node = match update.and_then(|update| update.get("node")) {
            Some(node) => object("node", node)?,
            None => &empty,
        };

        let writes = self.writes(WriteTarget::Node(entity), WriteMode::Update, node)?;
        let mut nested = Vec::new();

        for (relationship, value) in writes.relationships {
            let inputs = nested_inputs(relationship, value, None)?;
            nested.extend(self.relationship_mutations(entity, relationship, inputs, WriteMode::Update)?);
        }

        Ok(NestedMutation::Update(UpdateInput {
            target: node_target(target),
            filter,
            authorization: self.authorizer.filters(entity, &writes.attributes, Operations::UPDATE)?,
            node: writes.properties,
            edge: self.edge_writes(relationship, WriteMode::Update, update.and_then(|update| update.get("edge")))?,
            nested,
        }))
    }

    /// `{ where: { node, edge } }`.
    fn nested_disconnect(
        &self,
        source: ConcreteEntityWalker<'a>,
        relationship: RelationshipWalker<'a>,
        target: EntityWalker<'a>,
        item: &Map<String, Value>,
    ) -> Result<NestedMutation> {
        let filter = match item.get("where") {
            Some(input) => FilterParser::user().connection_where(relationship, target, object("where", input)?)?,
            None => None,
        };

        let authorization = self.target_authorization(target, Operations::DELETE_RELATIONSHIP)?;

        let source_validation = self
            .authorizer
            .filters(source, &[], Operations::DELETE_RELATIONSHIP)?
            .validate_before;

        Ok(NestedMutation::Disconnect(DisconnectMutation {
            target: node_target(target),
            filter,
            authorization,
            source_validation,
        }))
    }

    /// The rules of every entity the related nodes can be. Below an abstract target, the rules
    /// of a member only constrain the nodes carrying its labels.
    fn target_authorization(&self, target: EntityWalker<'a>, operations: Operations) -> Result<AuthorizationFilters> {
        self.authenticate_entity(target, operations)?;

        let EntityWalker::Concrete(entity) = target else {
            let mut members = Vec::new();

            for member in target.concrete_entities() {
                members.push((member, self.authorizer.filters(member, &[], operations)?));
            }

            let scoped = |rule: fn(&AuthorizationFilters) -> &Option<Filter>| {
                if members.iter().all(|(_, filters)| rule(filters).is_none()) {
                    return None;
                }

                Filter::any(members.iter().filter_map(|(member, filters)| {
                    let labels = Filter::Labels(member.labels().to_vec());
                    Filter::all(std::iter::once(labels).chain(rule(filters).clone()))
                }))
            };

            return Ok(AuthorizationFilters {
                filter: scoped(|filters| &filters.filter),
                validate_before: scoped(|filters| &filters.validate_before),
                validate_after: scoped(|filters| &filters.validate_after),
            });
        };

        self.authorizer.filters(entity, &[], operations)
    }
}

/// Splits a relationship input into `(target, operation, input)` triples. Union inputs are
/// keyed by member first. With `operation` set, the input is the payload of that operation,
/// as in the `connect: { actors: [...] }` argument of an update.
pub(super) fn nested_inputs<'a, 'v>(
    relationship: RelationshipWalker<'a>,
    value: &'v Value,
    operation: Option<&'v str>,
) -> Result<Vec<(EntityWalker<'a>, &'v str, &'v Value)>> {
    let mut scoped = Vec::new();

    match relationship.target() {
        EntityWalker::Union(union) => {
            for input in objects(relationship.name(), value)? {
                for (name, value) in input {
                    let member = union.find_member(name).ok_or_else(|| Error::UnknownEntity {
                        entity: name.clone(),
                        parent: union.name().to_string(),
                    })?;

                    scoped.push((EntityWalker::Concrete(member), value));
                }
            }
        }
        target => scoped.push((target, value)),
    }

    let mut inputs = Vec::new();

    for (target, value) in scoped {
        match operation {
            Some(operation) => inputs.push((target, operation, value)),
            None => {
                for input in objects(relationship.name(), value)? {
                    for (key, value) in input {
                        inputs.push((target, key.as_str(), value));
                    }
                }
            }
        }
    }

    Ok(inputs)
}

/// `where.<part>` of a nested mutation input.
fn where_part<'v>(item: &'v Map<String, Value>, part: &str) -> Result<Option<&'v Map<String, Value>>> {
    let Some(input) = item.get("where") else {
        return Ok(None);
    };

    object("where", input)?
        .get(part)
        .map(|value| object(part, value))
        .transpose()
}

fn resolve_write<'a>(
    target: WriteTarget<'a>,
    mode: WriteMode,
    key: &str,
    value: &Value,
) -> Result<(AttributeWalker<'a>, WriteValue)> {
    let unknown = || Error::unknown_field(target.name(), key);

    let writable = |attribute: &AttributeWalker<'a>| match mode {
        WriteMode::Create => attribute.is_creatable(),
        WriteMode::Update => attribute.is_updatable(),
    };

    if let Some(attribute) = target.find_attribute(key).filter(writable) {
        return Ok((attribute, WriteValue::Value(value.clone())));
    }

    if mode == WriteMode::Create {
        return Err(unknown());
    }

    let find = |name: &str| target.find_attribute(name).filter(writable);

    if let Some(attribute) = key.strip_suffix("_SET").and_then(find) {
        return Ok((attribute, WriteValue::Value(value.clone())));
    }

    if let Some((attribute, operator)) = MathOperator::split(key).and_then(|(name, operator)| Some((find(name)?, operator))) {
        if !attribute.ty().is_numeric() || attribute.is_list() || !value.is_number() {
            return Err(Error::invalid_argument(key, "arithmetic needs a numeric attribute and operand"));
        }

        return Ok((attribute, WriteValue::Math(operator, value.clone())));
    }

    if let Some(attribute) = key.strip_suffix("_PUSH").and_then(find) {
        if !attribute.is_list() {
            return Err(Error::invalid_argument(key, "only lists can be pushed to"));
        }

        return Ok((attribute, WriteValue::Push(value.clone())));
    }

    if let Some(attribute) = key.strip_suffix("_POP").and_then(find) {
        if !attribute.is_list() || !value.is_u64() {
            return Err(Error::invalid_argument(key, "expected a number of elements to pop from a list"));
        }

        return Ok((attribute, WriteValue::Pop(value.clone())));
    }

    Err(unknown())
}
