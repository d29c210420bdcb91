use super::{ConcreteEntityWalker, Walker};
use crate::{EntityNames, UnionEntityId};

pub type UnionEntityWalker<'a> = Walker<'a, UnionEntityId>;

impl<'a> UnionEntityWalker<'a> {
    pub fn name(self) -> &'a str {
        &self.get().name
    }

    pub fn names(self) -> &'a EntityNames {
        &self.get().names
    }

    pub fn members(self) -> impl ExactSizeIterator<Item = ConcreteEntityWalker<'a>> + 'a {
        self.get().members.iter().map(move |id| self.walk(*id))
    }

    pub fn find_member(self, name: &str) -> Option<ConcreteEntityWalker<'a>> {
        self.members().find(|member| member.name() == name)
    }
}
