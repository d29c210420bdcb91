mod errors;
mod interfaces;

use crate::{AttributeWalker, EntityId, RootField, RootFieldKind, Schema};

const MOVIES: &str = r#"
[[nodes]]
name = "Movie"

[[nodes.attributes]]
name = "id"
type = "ID"
autogenerate = "id"

[[nodes.attributes]]
name = "title"
type = "String"
required = true

[[nodes.attributes]]
name = "released"
type = "Int"
alias = "year"

[[nodes.attributes]]
name = "tags"
type = "String"
list = true

[[nodes.relationships]]
name = "actors"
target = "Actor"
edge_type = "ACTED_IN"
direction = "IN"
list = true
properties = "ActedIn"

[[nodes.fulltext_indexes]]
name = "MovieTitle"
fields = ["title"]

[[nodes.vector_indexes]]
name = "movie_plot"
embedding_property = "plotEmbedding"
query_name = "similarMovies"

[nodes.limit]
default = 10
max = 100

[[nodes]]
name = "Actor"
labels = ["Actor", "Person"]

[[nodes.attributes]]
name = "name"
type = "String"
unique = true

[[nodes.relationships]]
name = "movies"
target = "Movie"
edge_type = "ACTED_IN"
direction = "OUT"
query_direction = "UNDIRECTED_ONLY"
list = true
nested_operations = ["CONNECT"]

[[relationship_properties]]
name = "ActedIn"

[[relationship_properties.attributes]]
name = "roles"
type = "String"
list = true
"#;

fn names<'a>(attributes: impl Iterator<Item = AttributeWalker<'a>>) -> Vec<&'a str> {
    attributes.map(|attribute| attribute.name()).collect()
}

fn movies() -> Schema {
    Schema::from_toml_str(MOVIES).unwrap()
}

#[test]
fn resolves_cyclic_relationships() {
    let schema = movies();
    let movie = schema.find_concrete_entity("Movie").unwrap();
    let actors = movie.find_relationship("actors").unwrap();

    let actor = actors.target().as_concrete().unwrap();
    assert_eq!(actor.name(), "Actor");
    assert_eq!(actor.labels(), ["Actor", "Person"]);

    let back = actor.find_relationship("movies").unwrap();
    assert_eq!(back.target().as_concrete(), Some(movie));
    assert_eq!(back.source(), actor);
    assert_eq!(movie.labels(), ["Movie"]);
}

#[test]
fn capability_views() {
    let schema = movies();
    let movie = schema.find_concrete_entity("Movie").unwrap();

    assert_eq!(names(movie.sortable_attributes()), ["id", "title", "released"]);
    assert_eq!(names(movie.filterable_attributes()), ["id", "title", "released", "tags"]);
    assert_eq!(names(movie.aggregable_attributes()), ["id", "title", "released"]);
    assert_eq!(names(movie.unique_attributes()), ["id"]);
    assert_eq!(names(movie.creatable_attributes()), ["title", "released", "tags"]);
    assert_eq!(names(movie.autogenerated_attributes()), ["id"]);
    assert!(movie.global_id_attribute().is_none());

    let released = movie.find_attribute("released").unwrap();
    assert_eq!(released.storage_name(), "year");
}

#[test]
fn relationship_properties_and_policies() {
    let schema = movies();
    let movie = schema.find_concrete_entity("Movie").unwrap();
    let actors = movie.find_relationship("actors").unwrap();

    assert_eq!(actors.properties().map(|properties| properties.name()), Some("ActedIn"));
    assert_eq!(actors.find_attribute("roles").map(|roles| roles.is_list()), Some(true));
    assert!(actors.allows(crate::NestedOperations::all()));
    assert_eq!(actors.names().connection_field, "actorsConnection");

    let movies = schema.find_concrete_entity("Actor").unwrap().find_relationship("movies").unwrap();

    assert!(movies.allows(crate::NestedOperations::CONNECT));
    assert!(!movies.allows(crate::NestedOperations::CREATE));
    assert!(!movies.query_direction().is_directed(Some(true)));
    assert_eq!(movies.attributes().count(), 0);
}

#[test]
fn root_fields() {
    let schema = movies();
    let movie = EntityId::Concrete(schema.find_concrete_entity("Movie").unwrap().id());

    let field = |name: &str| schema.root_field(name).cloned();

    assert_eq!(field("movies"), Some(RootField { kind: RootFieldKind::Read, entity: movie }));
    assert_eq!(field("moviesConnection").map(|field| field.kind), Some(RootFieldKind::Connection));
    assert_eq!(field("moviesAggregate").map(|field| field.kind), Some(RootFieldKind::Aggregate));
    assert_eq!(field("createMovies").map(|field| field.kind), Some(RootFieldKind::Create));
    assert_eq!(field("updateActors").map(|field| field.kind), Some(RootFieldKind::Update));
    assert_eq!(field("deleteActors").map(|field| field.kind), Some(RootFieldKind::Delete));
    assert_eq!(
        field("moviesFulltextMovieTitle").map(|field| field.kind),
        Some(RootFieldKind::Fulltext("MovieTitle".into()))
    );
    assert_eq!(
        field("similarMovies").map(|field| field.kind),
        Some(RootFieldKind::Vector("movie_plot".into()))
    );
    assert_eq!(field("movie"), None);
}

#[test]
fn indexes_and_limits() {
    let schema = movies();
    let movie = schema.find_concrete_entity("Movie").unwrap();

    assert_eq!(movie.find_fulltext_index("MovieTitle").unwrap().fields, ["title"]);
    assert_eq!(movie.find_vector_index("movie_plot").unwrap().embedding_property, "plotEmbedding");
    assert_eq!(movie.limit().and_then(|limit| limit.clamp(Some(500))), Some(100));
    assert_eq!(movie.limit().and_then(|limit| limit.clamp(None)), Some(10));
}

#[test]
fn schema_is_shareable_between_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Schema>();

    let schema = std::sync::Arc::new(movies());

    let handles = (0..2)
        .map(|_| {
            let schema = schema.clone();
            std::thread::spawn(move || schema.concrete_entities().count())
        })
        .collect::<Vec<_>>();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 2);
    }
}
