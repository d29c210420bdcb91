use serde_json::json;

use super::{select, translate, translate_as, user};
use crate::{Error, ErrorKind, ResolveTree};

#[test]
fn fulltext_root_field() {
    let tree = ResolveTree::new("moviesFulltextMovieTitle")
        .arg("phrase", json!("matrix"))
        .arg("where", json!({ "score": { "min": 0.5 } }))
        .field("MovieFulltextResult", ResolveTree::new("score"))
        .field("MovieFulltextResult", select("movie", "Movie", &["title"]));

    let query = translate(&tree);

    assert!(
        query
            .text
            .contains(r#"CALL db.index.fulltext.queryNodes("MovieTitle", $param0) YIELD node AS this, score AS var0"#),
        "{}",
        query.text
    );
    assert!(query.text.contains("WHERE (this:Movie AND var0 >= $param1)"), "{}", query.text);
    assert!(query.text.contains("score: var0"), "{}", query.text);
    assert_eq!(query.params.get("param0"), Some(&json!("matrix")));
    assert_eq!(query.params.get("param1"), Some(&json!(0.5)));
}

#[test]
fn fulltext_argument_of_a_read() {
    let tree = select("movies", "Movie", &["title"]).arg("fulltext", json!({ "MovieTitle": { "phrase": "matrix" } }));
    let query = translate(&tree);

    assert!(query.text.starts_with("CALL db.index.fulltext.queryNodes("), "{}", query.text);
    assert!(!query.text.contains("MATCH (this:Movie)"), "{}", query.text);
}

#[test]
fn vector_query_asks_for_the_whole_page() {
    let edges = ResolveTree::new("edges")
        .field("MovieEdge", ResolveTree::new("score"))
        .field("MovieEdge", select("node", "Movie", &["title"]));

    let tree = ResolveTree::new("similarMovies")
        .arg("vector", json!([0.1, 0.2, 0.3]))
        .arg("first", json!(2))
        .field("MoviesConnection", edges);

    let query = translate(&tree);

    assert!(
        query
            .text
            .contains(r#"CALL db.index.vector.queryNodes("movie_plot", $param0, $param1) YIELD node AS this, score AS var0"#),
        "{}",
        query.text
    );
    assert_eq!(query.params.get("param0"), Some(&json!(2)));
    assert_eq!(query.params.get("param1"), Some(&json!([0.1, 0.2, 0.3])));
}

#[test]
fn vector_neighbours_saturate() {
    let tree = select("movies", "Movie", &["title"])
        .arg("vector", json!({ "movie_plot": { "vector": [0.1] } }))
        .arg("options", json!({ "offset": u64::MAX, "limit": 1 }));

    let query = translate(&tree);

    assert_eq!(query.params.get("param0"), Some(&json!(u64::MAX)));
}

#[test]
fn one_index_at_a_time() {
    let tree = select("movies", "Movie", &["title"])
        .arg("fulltext", json!({ "MovieTitle": { "phrase": "matrix" } }))
        .arg("vector", json!({ "movie_plot": { "vector": [0.1] } }));

    let error = translate_as(&tree, &user(json!({}))).unwrap_err();

    assert_eq!(error, Error::AmbiguousIndexSearch);
    assert_eq!(error.kind(), ErrorKind::UserInput);
}

#[test]
fn phrases_need_an_embedding_provider() {
    let tree = ResolveTree::new("similarMovies").arg("phrase", json!("a hacker learns the truth"));
    let error = translate_as(&tree, &user(json!({}))).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::UserInput);
}
