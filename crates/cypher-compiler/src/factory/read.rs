use graph_schema::{ConcreteEntityWalker, EntityWalker, Operations};
use serde_json::{Map, Value};

use super::{
    fields::{project_attribute, NodeFields},
    sort::{pagination, resolve_sort, sort_fields, sortable, SortField, SortShape},
    Anchor, FilterParser, QueryFactory,
};
use crate::{
    error::Result,
    ir::{
        Cardinality, CompositeReadOperation, Operation, Pagination, PropertyOwner, ReadOperation, Selection, Sort,
        SortKey,
    },
    request::ResolveTree,
};

impl<'a> QueryFactory<'a> {
    pub(super) fn read(&self, anchor: Anchor<'a>, entity: EntityWalker<'a>, tree: &ResolveTree) -> Result<Operation> {
        self.authenticate_entity(entity, Operations::READ)?;

        let search = self.search(anchor, entity, tree)?;

        let cardinality = match anchor.relationship() {
            Some(relationship) if !relationship.is_list() => Cardinality::One,
            _ => Cardinality::Many,
        };

        let members = self.members(entity, tree.argument("where"))?;

        if let EntityWalker::Concrete(entity) = entity {
            let pagination = pagination(tree, entity.limit())?;

            let selection = match &search {
                Some(search) => search.selection(entity, pagination),
                None => anchor.selection(entity),
            };

            let filter = members.first().and_then(|(_, filter)| *filter);
            let mut read = self.read_member(entity, selection, tree, filter)?;

            read.sort = resolve_sort(
                &sort_fields(tree, SortShape::Node)?,
                |name| entity.find_attribute(name),
                |_| None,
            )?;
            read.pagination = pagination;
            read.cardinality = cardinality;

            return Ok(Operation::Read(read));
        }

        let sort = sort_fields(tree, SortShape::Node)?;
        let mut children = Vec::with_capacity(members.len());
        let mut combined_sort = Vec::new();

        for (member, filter) in members {
            let mut child = self.read_member(member, anchor.selection(member), tree, filter)?;
            let mut child_sort = Vec::with_capacity(sort.len());

            for (field, order) in &sort {
                let SortField::Node(name) = field else {
                    continue;
                };

                let property = sortable(name, member.find_attribute(name))?;

                child_sort.push(Sort {
                    key: SortKey::Projected(project_attribute(&mut child.fields, name, &property, PropertyOwner::Node)),
                    order: *order,
                });
            }

            // Every child projects the sort keys under the same names.
            combined_sort = child_sort;
            children.push(child);
        }

        Ok(Operation::CompositeRead(CompositeReadOperation {
            entity: entity.name().to_string(),
            children,
            sort: combined_sort,
            pagination: pagination(tree, entity.limit())?,
            cardinality,
        }))
    }

    /// The read of one concrete entity, without sort and pagination.
    pub(super) fn read_member(
        &self,
        entity: ConcreteEntityWalker<'a>,
        selection: Selection,
        tree: &ResolveTree,
        filter: Option<&Map<String, Value>>,
    ) -> Result<ReadOperation> {
        let filters = match filter {
            Some(filter) => FilterParser::user().concrete_where(entity, filter)?.into_iter().collect(),
            None => Vec::new(),
        };

        let NodeFields { fields, attributes } = self.node_fields(entity, tree)?;
        let authorization = self.authorizer.filters(entity, &attributes, Operations::READ)?;

        Ok(ReadOperation {
            entity: entity.name().to_string(),
            selection,
            filters,
            authorization,
            fields,
            sort: Vec::new(),
            pagination: Pagination::default(),
            cardinality: Cardinality::Many,
        })
    }
}
