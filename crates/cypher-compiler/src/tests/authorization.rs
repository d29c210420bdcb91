use graph_schema::{AuthenticationRule, AuthorizationRule, Operations};
use serde_json::json;

use super::{schema, select, translate, translate_as, user};
use crate::{
    AuthContext, AuthenticationTarget, AuthorizationPolicy, CompileOptions, Error, ErrorKind, ResolveTree, RuleTarget,
    Translator,
};

#[test]
fn filter_rules_are_alternatives() {
    let query = translate(&select("posts", "Post", &["title"]));

    assert!(
        query.text.contains("$jwt.sub IS NOT NULL AND this.owner = $jwt.sub"),
        "{}",
        query.text
    );
    assert!(query.text.contains(" OR "), "{}", query.text);
    assert!(query.text.contains("$isAuthenticated = true"), "{}", query.text);
    assert_eq!(query.params.get("jwt"), Some(&json!({ "sub": "user-1", "roles": [] })));
}

#[test]
fn anonymous_callers_are_filtered_not_rejected() {
    let query = translate_as(&select("posts", "Post", &["title"]), &AuthContext::anonymous()).unwrap();

    assert_eq!(query.params.get("isAuthenticated"), Some(&json!(false)));
}

#[test]
fn validation_before_update() {
    let tree = ResolveTree::new("updatePosts").arg("update", json!({ "title": "Edited" }));
    let query = translate(&tree);

    assert!(query.text.contains("apoc.util.validatePredicate(NOT ("), "{}", query.text);
    assert!(query.text.contains(r#""@neo4j/graphql/FORBIDDEN", [0])"#), "{}", query.text);
}

#[test]
fn forbidden_message_is_configurable() {
    let schema = schema();
    let options = CompileOptions {
        forbidden_message: "nope".into(),
        ..Default::default()
    };

    let tree = ResolveTree::new("updatePosts").arg("update", json!({ "title": "Edited" }));
    let query = Translator::new(&schema, options)
        .translate(&tree, &user(json!({ "sub": "user-1" })))
        .unwrap();

    assert!(query.text.contains(r#""nope", [0])"#), "{}", query.text);
}

/// Grants everything to everyone, except reads to callers other than `admin`.
struct AdminReads;

impl AuthorizationPolicy for AdminReads {
    fn authorization(&self, _: RuleTarget<'_>) -> Vec<AuthorizationRule> {
        Vec::new()
    }

    fn authentication(&self, target: AuthenticationTarget<'_>) -> Option<AuthenticationRule> {
        match target {
            AuthenticationTarget::Schema(_) => Some(AuthenticationRule {
                operations: Operations::READ,
                jwt: json!({ "sub": "admin" }).as_object().cloned(),
            }),
            _ => None,
        }
    }
}

#[test]
fn custom_policy_replaces_the_declared_rules() {
    let schema = schema();
    let translator = Translator::with_policy(&schema, CompileOptions::default(), &AdminReads);
    let tree = select("posts", "Post", &["title"]);

    let query = translator.translate(&tree, &user(json!({ "sub": "admin" }))).unwrap();
    assert_eq!(query.text, "MATCH (this:Post)\nRETURN this { .title } AS this");

    let error = translator.translate(&tree, &user(json!({ "sub": "guest" }))).unwrap_err();
    assert_eq!(error, Error::Forbidden);
    assert_eq!(error.kind(), ErrorKind::Authorization);

    let error = translator.translate(&tree, &AuthContext::anonymous()).unwrap_err();
    assert_eq!(error, Error::Unauthenticated);
}

#[test]
fn connecting_an_interface_checks_every_implementor() {
    let input = json!([{
        "name": "Paramount",
        "productions": { "connect": [{ "where": { "node": { "title": "Heat" } } }] }
    }]);

    let query = translate(&ResolveTree::new("createStudios").arg("input", input));
    let text = &query.text;

    assert!(text.contains("apoc.util.validatePredicate(NOT (("), "{text}");
    assert!(text.contains(":Movie OR ("), "{text}");
    assert!(text.contains(":Show AND "), "{text}");
}

#[test]
fn disconnecting_an_interface_authenticates_every_implementor() {
    let tree = ResolveTree::new("updateStudios")
        .arg("disconnect", json!({ "productions": [{ "where": { "node": { "title": "Heat" } } }] }));

    let error = translate_as(&tree, &AuthContext::anonymous()).unwrap_err();
    assert_eq!(error, Error::Unauthenticated);

    let query = translate(&tree);
    assert!(query.text.contains(":Show AND "), "{}", query.text);
    assert!(query.text.contains("DELETE this"), "{}", query.text);
}

#[test]
fn filter_rules_are_conjoined_with_the_user_where() {
    let tree = select("posts", "Post", &["title"]).arg("where", json!({ "title": "Draft" }));
    let query = translate(&tree);

    let guard = query
        .text
        .lines()
        .find(|line| line.starts_with("WHERE "))
        .unwrap_or_default();

    assert!(guard.starts_with("WHERE (this.title = $param"), "{}", query.text);
    assert!(guard.contains(" AND ((") && guard.contains(" OR "), "{}", query.text);
    assert!(guard.contains("this.owner = $jwt.sub"), "{}", query.text);
    assert_eq!(query.text.matches("WHERE ").count(), 1, "{}", query.text);
}
