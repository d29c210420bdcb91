use serde_json::Value;

use super::Walker;
use crate::{
    AttributeId, AttributeOwner, AttributeType, Autogenerate, AuthenticationRule, AuthorizationRule, Capabilities,
};

/// A scalar field of an entity, an interface or a set of relationship properties.
pub type AttributeWalker<'a> = Walker<'a, AttributeId>;

impl<'a> AttributeWalker<'a> {
    /// The field name clients use.
    pub fn name(self) -> &'a str {
        &self.get().name
    }

    /// The property name in the store.
    pub fn storage_name(self) -> &'a str {
        &self.get().storage_name
    }

    pub fn ty(self) -> &'a AttributeType {
        &self.get().ty
    }

    pub fn is_list(self) -> bool {
        self.get().list
    }

    pub fn is_required(self) -> bool {
        self.get().required
    }

    pub fn capabilities(self) -> Capabilities {
        self.get().capabilities
    }

    pub fn is_sortable(self) -> bool {
        self.capabilities().contains(Capabilities::SORTABLE)
    }

    pub fn is_filterable(self) -> bool {
        self.capabilities().contains(Capabilities::FILTERABLE)
    }

    pub fn is_aggregable(self) -> bool {
        self.capabilities().contains(Capabilities::AGGREGABLE)
    }

    pub fn is_unique(self) -> bool {
        self.capabilities().contains(Capabilities::UNIQUE)
    }

    pub fn is_creatable(self) -> bool {
        self.capabilities().contains(Capabilities::CREATABLE)
    }

    pub fn is_updatable(self) -> bool {
        self.capabilities().contains(Capabilities::UPDATABLE)
    }

    pub fn is_global_id(self) -> bool {
        self.capabilities().contains(Capabilities::GLOBAL_ID)
    }

    pub fn autogenerate(self) -> Option<Autogenerate> {
        self.get().autogenerate
    }

    pub fn default_value(self) -> Option<&'a Value> {
        self.get().default.as_ref()
    }

    pub fn authorization(self) -> &'a [AuthorizationRule] {
        &self.get().authorization
    }

    pub fn authentication(self) -> Option<&'a AuthenticationRule> {
        self.get().authentication.as_ref()
    }

    pub fn owner(self) -> AttributeOwner {
        self.get().owner
    }
}
