use serde::{Deserialize, Serialize};

pub const DEFAULT_FORBIDDEN_MESSAGE: &str = "@neo4j/graphql/FORBIDDEN";

/// Emission settings. Every field has a default, so an empty TOML document is a valid
/// configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompileOptions {
    /// Prefixes every query with `CYPHER <version>`.
    pub cypher_version: Option<String>,
    /// Planner runtime hint, such as `interpreted` or `pipelined`.
    pub runtime: Option<String>,
    /// Raised by validation predicates when an authorization rule does not hold.
    pub forbidden_message: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            cypher_version: None,
            runtime: None,
            forbidden_message: DEFAULT_FORBIDDEN_MESSAGE.to_string(),
        }
    }
}

impl CompileOptions {
    pub fn from_toml_str(input: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(input)
    }

    pub(crate) fn preamble(&self) -> Option<String> {
        let mut parts = Vec::new();

        if let Some(version) = &self.cypher_version {
            parts.push(version.clone());
        }

        if let Some(runtime) = &self.runtime {
            parts.push(format!("runtime={runtime}"));
        }

        match parts.is_empty() {
            true => None,
            false => Some(format!("CYPHER {}", parts.join(" "))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(CompileOptions::from_toml_str("").unwrap(), CompileOptions::default());
        assert_eq!(CompileOptions::default().preamble(), None);
    }

    #[test]
    fn preamble() {
        let options = CompileOptions::from_toml_str(
            r#"
            cypher_version = "5"
            runtime = "interpreted"
            "#,
        )
        .unwrap();

        assert_eq!(options.preamble().as_deref(), Some("CYPHER 5 runtime=interpreted"));
        assert_eq!(options.forbidden_message, DEFAULT_FORBIDDEN_MESSAGE);
    }
}
