use crate::{
    names::EntityNames, AttributeId, AuthenticationRule, AuthorizationRule, Capabilities, ConcreteEntityId, IdRange,
    InterfaceEntityId, RelationshipDeclarationId, RelationshipId, Schema, UnionEntityId,
};

#[derive(Debug, Clone)]
pub struct ConcreteEntityRecord {
    pub(crate) name: String,
    pub(crate) labels: Vec<String>,
    pub(crate) names: EntityNames,
    pub(crate) attributes: IdRange<AttributeId>,
    pub(crate) relationships: IdRange<RelationshipId>,
    pub(crate) interfaces: Vec<InterfaceEntityId>,
    pub(crate) unions: Vec<UnionEntityId>,
    pub(crate) capability_index: CapabilityIndex,
    pub(crate) authorization: Vec<AuthorizationRule>,
    pub(crate) authentication: Option<AuthenticationRule>,
    pub(crate) fulltext_indexes: Vec<FulltextIndex>,
    pub(crate) vector_indexes: Vec<VectorIndex>,
    pub(crate) limit: Option<Limit>,
}

#[derive(Debug, Clone)]
pub struct InterfaceEntityRecord {
    pub(crate) name: String,
    pub(crate) names: EntityNames,
    pub(crate) attributes: IdRange<AttributeId>,
    pub(crate) declarations: IdRange<RelationshipDeclarationId>,
    pub(crate) implementors: Vec<ConcreteEntityId>,
    pub(crate) capability_index: CapabilityIndex,
    pub(crate) authorization: Vec<AuthorizationRule>,
    pub(crate) authentication: Option<AuthenticationRule>,
    pub(crate) limit: Option<Limit>,
}

#[derive(Debug, Clone)]
pub struct UnionEntityRecord {
    pub(crate) name: String,
    pub(crate) names: EntityNames,
    pub(crate) members: Vec<ConcreteEntityId>,
}

/// Attribute ids grouped by capability, computed in one pass when the owner is built.
#[derive(Debug, Clone, Default)]
pub struct CapabilityIndex {
    pub(crate) sortable: Vec<AttributeId>,
    pub(crate) filterable: Vec<AttributeId>,
    pub(crate) aggregable: Vec<AttributeId>,
    pub(crate) unique: Vec<AttributeId>,
    pub(crate) creatable: Vec<AttributeId>,
    pub(crate) updatable: Vec<AttributeId>,
    pub(crate) global_id: Option<AttributeId>,
}

impl CapabilityIndex {
    pub(crate) fn build(schema: &Schema, attributes: IdRange<AttributeId>) -> Self {
        let mut index = Self::default();

        for id in attributes.iter() {
            let capabilities = schema[id].capabilities;

            let buckets = [
                (Capabilities::SORTABLE, &mut index.sortable),
                (Capabilities::FILTERABLE, &mut index.filterable),
                (Capabilities::AGGREGABLE, &mut index.aggregable),
                (Capabilities::UNIQUE, &mut index.unique),
                (Capabilities::CREATABLE, &mut index.creatable),
                (Capabilities::UPDATABLE, &mut index.updatable),
            ];

            for (capability, bucket) in buckets {
                if capabilities.contains(capability) {
                    bucket.push(id);
                }
            }

            if capabilities.contains(Capabilities::GLOBAL_ID) && index.global_id.is_none() {
                index.global_id = Some(id);
            }
        }

        index
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FulltextIndex {
    pub name: String,
    /// Storage names of the indexed attributes.
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorIndex {
    pub name: String,
    pub embedding_property: String,
    /// The root field exposing the index.
    pub query_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    pub default: Option<u64>,
    pub max: Option<u64>,
}

impl Limit {
    /// The limit to apply given the requested one.
    pub fn clamp(&self, requested: Option<u64>) -> Option<u64> {
        match (requested.or(self.default), self.max) {
            (Some(limit), Some(max)) => Some(limit.min(max)),
            (None, Some(max)) => Some(max),
            (limit, None) => limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(None, None, None, None)]
    #[case(None, Some(10), None, Some(10))]
    #[case(Some(5), Some(10), None, Some(5))]
    #[case(Some(50), Some(10), Some(20), Some(20))]
    #[case(None, Some(10), Some(20), Some(10))]
    #[case(None, None, Some(20), Some(20))]
    fn limit_clamping(
        #[case] requested: Option<u64>,
        #[case] default: Option<u64>,
        #[case] max: Option<u64>,
        #[case] expected: Option<u64>,
    ) {
        assert_eq!(Limit { default, max }.clamp(requested), expected);
    }
}
