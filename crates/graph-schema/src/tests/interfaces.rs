use crate::{EntityId, Operations, Schema};

const PRODUCTIONS: &str = r#"
[[interfaces]]
name = "Production"

[[interfaces.attributes]]
name = "title"
type = "String"

[[interfaces.attributes.authorization.filter]]
operations = ["READ"]
where = { node = { owner = "$jwt.sub" } }

[[interfaces.relationships]]
name = "actors"
target = "Actor"
list = true

[[interfaces]]
name = "Reviewable"

[[interfaces.attributes]]
name = "title"
type = "String"

[[interfaces.attributes.authorization.validate]]
operations = ["UPDATE"]
where = { jwt = { roles_INCLUDES = "editor" } }

[[interfaces.relationships]]
name = "actors"
target = "Actor"
list = true

[[nodes]]
name = "Actor"

[[nodes.attributes]]
name = "name"
type = "String"

[[nodes]]
name = "Movie"
implements = ["Production", "Reviewable"]

[[nodes.attributes]]
name = "title"
type = "String"

[[nodes.relationships]]
name = "actors"
target = "Actor"
edge_type = "ACTED_IN"
direction = "IN"
list = true

[[nodes]]
name = "Series"
implements = ["Reviewable", "Production"]

[[nodes.attributes]]
name = "title"
type = "String"

[[nodes.relationships]]
name = "actors"
target = "Actor"
edge_type = "STARRED_IN"
direction = "IN"
list = true

[[unions]]
name = "Watchable"
members = ["Movie", "Series"]
"#;

#[test]
fn implementors_are_linked_in_declaration_order() {
    let schema = Schema::from_toml_str(PRODUCTIONS).unwrap();
    let production = schema.find_entity("Production").unwrap();

    let names = production
        .concrete_entities()
        .into_iter()
        .map(|entity| entity.name())
        .collect::<Vec<_>>();

    assert_eq!(names, ["Movie", "Series"]);
    assert!(production.is_composite());

    let movie = schema.find_concrete_entity("Movie").unwrap();
    assert!(movie.is_part_of(production.id()));
    assert!(movie.is_part_of(schema.find_entity("Watchable").unwrap().id()));
    assert!(!movie.is_part_of(EntityId::Concrete(schema.find_concrete_entity("Actor").unwrap().id())));
    assert_eq!(movie.unions().map(|union| union.name()).collect::<Vec<_>>(), ["Watchable"]);
}

#[test]
fn declarations_aggregate_their_implementations() {
    let schema = Schema::from_toml_str(PRODUCTIONS).unwrap();
    let production = schema.find_entity("Production").unwrap().as_interface().unwrap();
    let actors = production.find_declaration("actors").unwrap();

    let edge_types = actors
        .implementations()
        .map(|relationship| relationship.edge_type())
        .collect::<Vec<_>>();

    assert_eq!(edge_types, ["ACTED_IN", "STARRED_IN"]);
    assert_eq!(actors.target().name(), "Actor");

    let series = schema.find_concrete_entity("Series").unwrap();
    assert_eq!(
        actors.implementation_for(series.id()).map(|relationship| relationship.edge_type()),
        Some("STARRED_IN")
    );
}

// Several implemented interfaces redeclaring the same field is ambiguous. The first interface,
// in declaration order for names and in `implements` order for annotations, wins. Nothing is
// merged.
#[test]
fn redeclared_interface_fields_resolve_first_declared_wins() {
    let schema = Schema::from_toml_str(PRODUCTIONS).unwrap();

    let reviewable = schema.find_entity("Reviewable").unwrap().as_interface().unwrap();
    let declaration = reviewable.find_declaration("actors").unwrap();

    assert_eq!(declaration.first_declaring_interface().name(), "Production");
    assert_eq!(declaration.names().connection_type, "ProductionActorsConnection");

    let movie = schema.find_concrete_entity("Movie").unwrap();
    let series = schema.find_concrete_entity("Series").unwrap();

    let movie_rules = movie.find_attribute("title").unwrap().authorization();
    assert_eq!(movie_rules.len(), 1);
    assert!(movie_rules[0].is_filter());
    assert_eq!(movie_rules[0].operations, Operations::READ);

    let series_rules = series.find_attribute("title").unwrap().authorization();
    assert_eq!(series_rules.len(), 1);
    assert!(series_rules[0].validates_before() && series_rules[0].validates_after());
    assert_eq!(series_rules[0].operations, Operations::UPDATE);

    let movie_declaration = movie.find_relationship("actors").unwrap().declaration().unwrap();
    let series_declaration = series.find_relationship("actors").unwrap().declaration().unwrap();

    assert_eq!(movie_declaration.interface().name(), "Production");
    assert_eq!(series_declaration.interface().name(), "Reviewable");
}
