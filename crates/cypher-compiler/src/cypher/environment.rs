use indexmap::IndexMap;
use serde_json::Value;

use super::Expr;

/// The variable of the root match.
pub(crate) const ROOT_VARIABLE: &str = "this";

/// Fresh variable names and the parameter table of one compilation. Names are handed out in
/// emission order, so the same input always yields the same text.
#[derive(Debug, Default)]
pub(crate) struct Environment {
    next_variable: usize,
    next_param: usize,
    params: IndexMap<String, Value>,
}

impl Environment {
    /// A fresh node or relationship variable, `this<n>`.
    pub fn node(&mut self) -> String {
        format!("this{}", self.next())
    }

    /// A fresh variable for anything that is not a graph element, `var<n>`.
    pub fn variable(&mut self) -> String {
        format!("var{}", self.next())
    }

    fn next(&mut self) -> usize {
        let next = self.next_variable;
        self.next_variable += 1;
        next
    }

    /// Binds a value as a fresh parameter.
    pub fn param(&mut self, value: Value) -> Expr {
        let name = format!("param{}", self.next_param);
        self.next_param += 1;
        self.params.insert(name.clone(), value);

        Expr::Param(name)
    }

    /// Binds a parameter with a fixed name. The value is computed the first time only.
    pub fn named_param(&mut self, name: &str, value: impl FnOnce() -> Value) -> Expr {
        if !self.params.contains_key(name) {
            self.params.insert(name.to_string(), value());
        }

        Expr::Param(name.to_string())
    }

    pub fn into_params(self) -> IndexMap<String, Value> {
        self.params
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn names_are_sequential() {
        let mut env = Environment::default();

        assert_eq!(env.node(), "this0");
        assert_eq!(env.variable(), "var1");
        assert_eq!(env.param(json!("Matrix")), Expr::Param("param0".into()));
        assert_eq!(env.named_param("jwt", || json!({ "sub": "a" })), Expr::Param("jwt".into()));
        assert_eq!(env.named_param("jwt", || unreachable!()), Expr::Param("jwt".into()));
        assert_eq!(env.node(), "this2");

        let params = env.into_params();
        assert_eq!(params.keys().collect::<Vec<_>>(), ["param0", "jwt"]);
    }
}
