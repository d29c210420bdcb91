mod authorization;
mod mutation;
mod read;
mod search;

use graph_schema::Schema;
use serde_json::{json, Value};

use crate::{AuthContext, CompileOptions, CompiledQuery, ResolveTree, Result, Translator};

#[ctor::ctor]
fn setup_logging() {
    let filter = tracing_subscriber::filter::EnvFilter::builder()
        .parse(std::env::var("RUST_LOG").unwrap_or("cypher_compiler=debug".to_string()))
        .unwrap();
    tracing_subscriber::fmt()
        .pretty()
        .with_env_filter(filter)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .without_time()
        .with_test_writer()
        .init();
}

const SCHEMA: &str = r#"
[[interfaces]]
name = "Production"

[[interfaces.attributes]]
name = "title"
type = "String"

[[interfaces.attributes]]
name = "released"
type = "Int"

[[unions]]
name = "Watchable"
members = ["Movie", "Show"]

[[nodes]]
name = "Movie"
implements = ["Production"]

[[nodes.attributes]]
name = "id"
type = "ID"
unique = true
autogenerate = "id"

[[nodes.attributes]]
name = "title"
type = "String"

[[nodes.attributes]]
name = "released"
type = "Int"

[[nodes.attributes]]
name = "year"
type = "Int"
alias = "released"

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

[[nodes]]
name = "Show"
implements = ["Production"]

[nodes.authentication]
operations = ["DELETE_RELATIONSHIP"]

[[nodes.authorization.validate]]
operations = ["CREATE_RELATIONSHIP", "DELETE_RELATIONSHIP"]
when = ["BEFORE"]
where = { jwt = { roles_INCLUDES = "producer" } }

[[nodes.attributes]]
name = "title"
type = "String"

[[nodes.attributes]]
name = "released"
type = "Int"
alias = "premiered"

[[nodes.relationships]]
name = "actors"
target = "Actor"
edge_type = "STARRED_IN"
direction = "IN"
list = true
nested_operations = ["CONNECT"]

[[nodes]]
name = "Actor"

[nodes.authentication]
operations = ["DELETE"]

[[nodes.attributes]]
name = "name"
type = "String"
unique = true

[[nodes.relationships]]
name = "movies"
target = "Movie"
edge_type = "ACTED_IN"
direction = "OUT"
list = true

[[nodes.relationships]]
name = "shows"
target = "Show"
edge_type = "STARRED_IN"
direction = "OUT"
list = true

[[nodes]]
name = "Studio"

[[nodes.attributes]]
name = "name"
type = "String"

[[nodes.relationships]]
name = "productions"
target = "Production"
edge_type = "PRODUCED"
direction = "OUT"
list = true

[[nodes]]
name = "Post"

[[nodes.attributes]]
name = "title"
type = "String"

[[nodes.attributes]]
name = "owner"
type = "ID"

[[nodes.authorization.filter]]
operations = ["READ"]
where = { node = { owner = "$jwt.sub" } }

[[nodes.authorization.filter]]
operations = ["READ"]
where = { jwt = { roles_INCLUDES = "admin" } }

[[nodes.authorization.validate]]
operations = ["UPDATE"]
when = ["BEFORE"]
where = { jwt = { roles_INCLUDES = "editor" } }

[[relationship_properties]]
name = "ActedIn"

[[relationship_properties.attributes]]
name = "roles"
type = "String"
list = true
"#;

fn schema() -> Schema {
    Schema::from_toml_str(SCHEMA).unwrap()
}

fn user(claims: Value) -> AuthContext {
    AuthContext::authenticated(claims.as_object().cloned().unwrap_or_default())
}

fn translate_as(tree: &ResolveTree, auth: &AuthContext) -> Result<CompiledQuery> {
    let schema = schema();
    Translator::new(&schema, CompileOptions::default()).translate(tree, auth)
}

fn translate(tree: &ResolveTree) -> CompiledQuery {
    translate_as(tree, &user(json!({ "sub": "user-1", "roles": [] }))).unwrap()
}

/// `name { <fields> }` selected under `type_name`.
fn select(name: &str, type_name: &str, fields: &[&str]) -> ResolveTree {
    fields
        .iter()
        .fold(ResolveTree::new(name), |tree, field| tree.field(type_name, ResolveTree::new(*field)))
}
