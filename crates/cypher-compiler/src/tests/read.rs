use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

use super::{select, translate, translate_as, user};
use crate::{AccessMode, Error, ErrorCode, ErrorKind, ResolveTree};

fn movies_with_actor_connection() -> ResolveTree {
    let edges = ResolveTree::new("edges").field(
        "MovieActorsRelationship",
        select("node", "Actor", &["name"]),
    );

    ResolveTree::new("movies")
        .arg("where", json!({ "title": "Matrix" }))
        .field("Movie", ResolveTree::new("title"))
        .field(
            "Movie",
            ResolveTree::new("actorsConnection").field("MovieActorsConnection", edges),
        )
}

#[test]
fn nested_connection() {
    let query = translate(&movies_with_actor_connection());

    insta::assert_snapshot!(query.text, @r###"
    MATCH (this:Movie)
    WHERE this.title = $param0
    CALL {
        WITH this
        MATCH (this)<-[this1:ACTED_IN]-(this0:Actor)
        WITH collect({ node: this0, relationship: this1 }) AS var2
        WITH var2, size(var2) AS var3
        CALL {
            WITH var2
            UNWIND var2 AS var4
            WITH var4.node AS this0, var4.relationship AS this1
            RETURN collect({ node: this0 { .name } }) AS var5
        }
        RETURN { edges: var5 } AS var6
    }
    RETURN this { .title, actorsConnection: var6 } AS this
    "###);

    assert_eq!(query.params.get("param0"), Some(&json!("Matrix")));
    assert_eq!(query.params.len(), 1);
    assert_eq!(query.mode, AccessMode::Read);
}

#[test]
fn compilation_is_deterministic() {
    let tree = movies_with_actor_connection()
        .arg("options", json!({ "limit": 5, "sort": [{ "released": "DESC" }] }))
        .field("Movie", select("actors", "Actor", &["name"]));

    let first = translate(&tree);
    let second = translate(&tree);

    assert_eq!(first, second);
    assert_eq!(
        first.params.keys().collect::<Vec<_>>(),
        second.params.keys().collect::<Vec<_>>()
    );
}

#[rstest]
#[case::declared_direction(None, "MATCH (this)<-[this1:ACTED_IN]-(this0:Actor)")]
#[case::explicitly_directed(Some(true), "MATCH (this)<-[this1:ACTED_IN]-(this0:Actor)")]
#[case::undirected(Some(false), "MATCH (this)-[this1:ACTED_IN]-(this0:Actor)")]
fn relationship_directions(#[case] directed: Option<bool>, #[case] expected: &str) {
    let mut actors = select("actors", "Actor", &["name"]);

    if let Some(directed) = directed {
        actors = actors.arg("directed", json!(directed));
    }

    let query = translate(&ResolveTree::new("movies").field("Movie", actors));

    assert!(query.text.contains(expected), "{}", query.text);
}

#[test]
fn outgoing_relationships_point_away_from_the_parent() {
    let tree = ResolveTree::new("actors").field("Actor", select("movies", "Movie", &["title"]));
    let query = translate(&tree);

    assert!(query.text.contains("MATCH (this)-[this1:ACTED_IN]->(this0:Movie)"), "{}", query.text);
    assert!(query.text.contains("RETURN collect(this0 { .title }) AS var2"), "{}", query.text);
}

#[test]
fn sort_and_pagination() {
    let tree = select("movies", "Movie", &["title"]).arg(
        "options",
        json!({ "limit": 5, "offset": 10, "sort": [{ "title": "DESC" }] }),
    );

    let query = translate(&tree);

    insta::assert_snapshot!(query.text, @r###"
    MATCH (this:Movie)
    WITH *
    ORDER BY this.title DESC
    SKIP 10
    LIMIT 5
    RETURN this { .title } AS this
    "###);
}

#[rstest]
#[case::interface(select("productions", "Production", &["title"]), 2)]
#[case::narrowed_interface(
    select("productions", "Production", &["title"]).arg("where", json!({ "typename_IN": ["Show"] })),
    1
)]
#[case::union(select("watchables", "Movie", &["title"]), 2)]
#[case::union_where(
    select("watchables", "Movie", &["title"]).arg("where", json!({ "Movie": { "title": "Matrix" } })),
    1
)]
fn composite_reads_fan_out_per_member(#[case] tree: ResolveTree, #[case] members: usize) {
    let query = translate(&tree);

    assert_eq!(query.text.matches("UNION").count(), members - 1, "{}", query.text);
    assert_eq!(query.text.matches("MATCH (this:").count(), members, "{}", query.text);
    assert!(query.text.contains("__typename"), "{}", query.text);
}

#[test]
fn composite_sort_ignores_selection_aliases() {
    let tree = ResolveTree::new("productions")
        .arg("options", json!({ "sort": [{ "title": "ASC" }] }))
        .field("Movie", ResolveTree::new("released").alias("title"))
        .field("Show", ResolveTree::new("title"));

    let query = translate(&tree);

    assert!(query.text.contains("title: this.released"), "{}", query.text);
    assert_eq!(query.text.matches("__sort_title: this.title").count(), 2, "{}", query.text);
    assert!(query.text.contains(".__sort_title ASC"), "{}", query.text);
}

#[test]
fn invalid_cursor_is_a_user_error() {
    let tree = ResolveTree::new("moviesConnection")
        .arg("after", json!("not a cursor"))
        .field("MoviesConnection", ResolveTree::new("totalCount"));

    let error = translate_as(&tree, &user(json!({}))).unwrap_err();

    assert!(matches!(error, Error::InvalidCursor(_)));
    assert_eq!(error.kind(), ErrorKind::UserInput);
    assert_eq!(error.code(), ErrorCode::InvalidCursor);
}

#[test]
fn cursor_skips_past_the_edge_it_points_to() {
    let edges = ResolveTree::new("edges").field("MovieEdge", select("node", "Movie", &["title"]));

    let tree = ResolveTree::new("moviesConnection")
        .arg("first", json!(10))
        .arg("after", json!(graphql_cursor::offset_to_cursor(4)))
        .field("MoviesConnection", edges);

    let query = translate(&tree);

    assert!(query.text.contains("SKIP 5\n"), "{}", query.text);
    assert!(query.text.contains("LIMIT 10\n"), "{}", query.text);
}

#[test]
fn unknown_root_field() {
    let error = translate_as(&ResolveTree::new("films"), &user(json!({}))).unwrap_err();

    assert_eq!(error, Error::UnknownRootField("films".into()));
    assert_eq!(error.kind(), ErrorKind::Configuration);
}
