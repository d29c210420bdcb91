use serde_json::json;

use super::{select, translate, translate_as, user};
use crate::{AccessMode, AuthContext, Error, ErrorKind, ResolveTree};

#[test]
fn create_with_nested_connect() {
    let input = json!([{
        "title": "Matrix",
        "actors": { "connect": [{ "where": { "node": { "name": "Keanu" } } }] }
    }]);

    let tree = ResolveTree::new("createMovies")
        .arg("input", input)
        .field("CreateMoviesMutationResponse", select("movies", "Movie", &["title"]));

    let query = translate(&tree);
    let text = &query.text;

    assert!(text.contains("CREATE (this0:Movie)\n"), "{text}");
    assert!(text.contains("SET this0.title = $param0, this0.id = randomUUID()\n"), "{text}");
    assert!(text.contains("MATCH (this1:Actor)\n"), "{text}");
    assert!(text.contains("WHERE this1.name = $param1\n"), "{text}");
    assert!(text.contains("MERGE (this0)<-[this2:ACTED_IN]-(this1)\n"), "{text}");
    assert!(text.contains("UNWIND [var4] AS this\n"), "{text}");
    assert!(text.contains("RETURN collect(this { .title }) AS data"), "{text}");

    assert_eq!(query.params.get("param0"), Some(&json!("Matrix")));
    assert_eq!(query.params.get("param1"), Some(&json!("Keanu")));
    assert_eq!(query.mode, AccessMode::Write);
}

#[test]
fn every_input_is_created_in_its_own_subquery() {
    let tree = ResolveTree::new("createMovies").arg("input", json!([{ "title": "Matrix" }, { "title": "Heat" }]));
    let query = translate(&tree);

    assert_eq!(query.text.matches("CREATE (this").count(), 2, "{}", query.text);
    assert!(query.text.contains("UNWIND [var1, var3] AS this\n"), "{}", query.text);
    assert!(query.text.contains("RETURN count(this) AS data"), "{}", query.text);
}

#[test]
fn update_with_arithmetic() {
    let tree = ResolveTree::new("updateMovies")
        .arg("where", json!({ "title": "Matrix" }))
        .arg("update", json!({ "released_INCREMENT": 1 }));

    let query = translate(&tree);

    assert!(query.text.contains("SET this.released = this.released + $param1\n"), "{}", query.text);
    assert!(query.text.contains("RETURN count(DISTINCT this) AS data"), "{}", query.text);
    assert_eq!(query.params.get("param1"), Some(&json!(1)));
}

#[test]
fn list_push_appends() {
    let tree = ResolveTree::new("updateMovies").arg("update", json!({ "tags_PUSH": ["classic"] }));
    let query = translate(&tree);

    assert!(query.text.contains("SET this.tags = this.tags + $param0\n"), "{}", query.text);
}

#[test]
fn conflicting_writes_are_rejected() {
    let tree = ResolveTree::new("updateMovies").arg("update", json!({ "released": 1999, "released_INCREMENT": 1 }));
    let error = translate_as(&tree, &user(json!({}))).unwrap_err();

    assert_eq!(
        error,
        Error::ConflictingPropertyWrites {
            entity: "Movie".into(),
            property: "released".into(),
        }
    );
    assert_eq!(error.kind(), ErrorKind::UserInput);
}

#[test]
fn connect_or_create_needs_a_unique_attribute() {
    let input = json!([{
        "name": "Keanu",
        "shows": { "connectOrCreate": [{ "where": { "node": { "title": "Heat" } } }] }
    }]);

    let error = translate_as(&ResolveTree::new("createActors").arg("input", input), &user(json!({}))).unwrap_err();

    assert_eq!(error, Error::MissingUniqueAttributes { entity: "Show".into() });
    assert_eq!(error.kind(), ErrorKind::Configuration);
}

#[test]
fn connect_or_create_merges_on_the_unique_attribute() {
    let input = json!([{
        "title": "Matrix",
        "actors": { "connectOrCreate": [{ "where": { "node": { "name": "Keanu" } } }] }
    }]);

    let query = translate(&ResolveTree::new("createMovies").arg("input", input));

    assert!(query.text.contains("MERGE (this1:Actor { name: $param1 })\n"), "{}", query.text);
    assert!(query.text.contains("MERGE (this0)<-[this2:ACTED_IN]-(this1)\n"), "{}", query.text);
}

#[test]
fn disallowed_nested_operation() {
    let input = json!([{
        "title": "Heat",
        "actors": { "create": [{ "node": { "name": "Al" } }] }
    }]);

    let error = translate_as(&ResolveTree::new("createShows").arg("input", input), &user(json!({}))).unwrap_err();

    assert_eq!(
        error,
        Error::NestedOperationNotAllowed {
            entity: "Show".into(),
            relationship: "actors".into(),
            operation: "create".into(),
        }
    );
}

#[test]
fn delete_cascades_before_the_root_nodes() {
    let tree = ResolveTree::new("deleteActors")
        .arg("where", json!({ "name": "Keanu" }))
        .arg("delete", json!({ "movies": [{ "delete": { "actors": [{}] } }] }));

    let query = translate(&tree);

    assert_eq!(query.text.matches("UNWIND").count(), 2, "{}", query.text);
    assert!(query.text.contains("WITH collect(DISTINCT this0) AS"), "{}", query.text);
    assert!(query.text.trim_end().ends_with("DETACH DELETE this"), "{}", query.text);
    assert_eq!(query.mode, AccessMode::Write);
}

#[test]
fn delete_requires_authentication() {
    let tree = ResolveTree::new("deleteActors").arg("where", json!({ "name": "Keanu" }));
    let error = translate_as(&tree, &AuthContext::anonymous()).unwrap_err();

    assert_eq!(error, Error::Unauthenticated);
    assert_eq!(error.kind(), ErrorKind::Authentication);
}

#[test]
fn nested_delete_requires_authentication() {
    let tree = ResolveTree::new("deleteMovies").arg("delete", json!({ "actors": [{}] }));

    assert!(translate_as(&ResolveTree::new("deleteMovies"), &AuthContext::anonymous()).is_ok());

    let error = translate_as(&tree, &AuthContext::anonymous()).unwrap_err();
    assert_eq!(error, Error::Unauthenticated);
}

#[test]
fn aliased_attributes_write_the_same_property() {
    let tree = ResolveTree::new("updateMovies").arg("update", json!({ "released": 1999, "year": 2000 }));
    let error = translate_as(&tree, &user(json!({}))).unwrap_err();

    assert_eq!(
        error,
        Error::ConflictingPropertyWrites {
            entity: "Movie".into(),
            property: "released".into(),
        }
    );
}
