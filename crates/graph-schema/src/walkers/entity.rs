use super::{AttributeWalker, ConcreteEntityWalker, InterfaceEntityWalker, UnionEntityWalker};
use crate::{AuthenticationRule, AuthorizationRule, EntityId, EntityNames, Limit};

/// Any entity a relationship or a root field can point at.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum EntityWalker<'a> {
    Concrete(ConcreteEntityWalker<'a>),
    Interface(InterfaceEntityWalker<'a>),
    Union(UnionEntityWalker<'a>),
}

impl std::fmt::Debug for EntityWalker<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl<'a> EntityWalker<'a> {
    pub fn id(self) -> EntityId {
        match self {
            Self::Concrete(entity) => entity.id().into(),
            Self::Interface(entity) => entity.id().into(),
            Self::Union(entity) => entity.id().into(),
        }
    }

    pub fn name(self) -> &'a str {
        match self {
            Self::Concrete(entity) => entity.name(),
            Self::Interface(entity) => entity.name(),
            Self::Union(entity) => entity.name(),
        }
    }

    pub fn names(self) -> &'a EntityNames {
        match self {
            Self::Concrete(entity) => entity.names(),
            Self::Interface(entity) => entity.names(),
            Self::Union(entity) => entity.names(),
        }
    }

    pub fn as_concrete(self) -> Option<ConcreteEntityWalker<'a>> {
        match self {
            Self::Concrete(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn as_interface(self) -> Option<InterfaceEntityWalker<'a>> {
        match self {
            Self::Interface(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn as_union(self) -> Option<UnionEntityWalker<'a>> {
        match self {
            Self::Union(entity) => Some(entity),
            _ => None,
        }
    }

    /// Interfaces and unions, which fan out into one operation per concrete entity.
    pub fn is_composite(self) -> bool {
        !matches!(self, Self::Concrete(_))
    }

    /// The nodes this entity stands for: itself, its implementors or its members.
    pub fn concrete_entities(self) -> Vec<ConcreteEntityWalker<'a>> {
        match self {
            Self::Concrete(entity) => vec![entity],
            Self::Interface(entity) => entity.implementors().collect(),
            Self::Union(entity) => entity.members().collect(),
        }
    }

    /// Attributes shared by every concrete entity. Unions have none.
    pub fn find_attribute(self, name: &str) -> Option<AttributeWalker<'a>> {
        match self {
            Self::Concrete(entity) => entity.find_attribute(name),
            Self::Interface(entity) => entity.find_attribute(name),
            Self::Union(_) => None,
        }
    }

    pub fn authorization(self) -> &'a [AuthorizationRule] {
        match self {
            Self::Concrete(entity) => entity.authorization(),
            Self::Interface(entity) => entity.authorization(),
            Self::Union(_) => &[],
        }
    }

    pub fn authentication(self) -> Option<&'a AuthenticationRule> {
        match self {
            Self::Concrete(entity) => entity.authentication(),
            Self::Interface(entity) => entity.authentication(),
            Self::Union(_) => None,
        }
    }

    pub fn limit(self) -> Option<Limit> {
        match self {
            Self::Concrete(entity) => entity.limit(),
            Self::Interface(entity) => entity.limit(),
            Self::Union(_) => None,
        }
    }
}
