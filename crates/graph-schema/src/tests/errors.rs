use rstest::rstest;

use crate::{BuildError, Schema};

#[rstest]
#[case::unknown_target(
    r#"
    [[nodes]]
    name = "Movie"
    [[nodes.relationships]]
    name = "actors"
    target = "ActedIn"
    edge_type = "ACTED_IN"
    [[relationship_properties]]
    name = "ActedIn"
    "#,
    BuildError::UnknownRelationshipTarget { entity: "Movie".into(), field: "actors".into(), target: "ActedIn".into() }
)]
#[case::unknown_properties(
    r#"
    [[nodes]]
    name = "Movie"
    [[nodes.relationships]]
    name = "sequel"
    target = "Movie"
    edge_type = "SEQUEL_OF"
    properties = "Missing"
    "#,
    BuildError::UnknownRelationshipProperties { entity: "Movie".into(), field: "sequel".into(), properties: "Missing".into() }
)]
#[case::unknown_interface(
    r#"
    [[nodes]]
    name = "Movie"
    implements = ["Movie"]
    "#,
    BuildError::UnknownInterface { entity: "Movie".into(), interface: "Movie".into() }
)]
#[case::union_of_interface(
    r#"
    [[interfaces]]
    name = "Production"
    [[unions]]
    name = "Search"
    members = ["Production"]
    "#,
    BuildError::InvalidUnionMember { union: "Search".into(), member: "Production".into() }
)]
#[case::duplicate_entity(
    r#"
    [[nodes]]
    name = "Movie"
    [[interfaces]]
    name = "Movie"
    "#,
    BuildError::DuplicateEntity { name: "Movie".into() }
)]
#[case::duplicate_field(
    r#"
    [[nodes]]
    name = "Movie"
    [[nodes.attributes]]
    name = "sequel"
    type = "String"
    [[nodes.relationships]]
    name = "sequel"
    target = "Movie"
    edge_type = "SEQUEL_OF"
    "#,
    BuildError::DuplicateField { entity: "Movie".into(), field: "sequel".into() }
)]
#[case::colliding_root_fields(
    r#"
    [[nodes]]
    name = "Movie"
    [[nodes]]
    name = "Film"
    plural = "movies"
    "#,
    BuildError::DuplicateRootField("movies".into())
)]
#[case::fulltext_on_number(
    r#"
    [[nodes]]
    name = "Movie"
    [[nodes.attributes]]
    name = "released"
    type = "Int"
    [[nodes.fulltext_indexes]]
    name = "MovieReleased"
    fields = ["released"]
    "#,
    BuildError::InvalidIndexField { entity: "Movie".into(), index: "MovieReleased".into(), field: "released".into() }
)]
#[case::missing_interface_field(
    r#"
    [[interfaces]]
    name = "Production"
    [[interfaces.attributes]]
    name = "title"
    type = "String"
    [[nodes]]
    name = "Movie"
    implements = ["Production"]
    "#,
    BuildError::MissingInterfaceField { entity: "Movie".into(), interface: "Production".into(), field: "title".into() }
)]
#[case::incompatible_cardinality(
    r#"
    [[interfaces]]
    name = "Production"
    [[interfaces.relationships]]
    name = "actors"
    target = "Actor"
    list = true
    [[nodes]]
    name = "Actor"
    [[nodes]]
    name = "Movie"
    implements = ["Production"]
    [[nodes.relationships]]
    name = "actors"
    target = "Actor"
    edge_type = "ACTED_IN"
    list = false
    "#,
    BuildError::IncompatibleImplementation { entity: "Movie".into(), interface: "Production".into(), field: "actors".into() }
)]
#[case::incompatible_target(
    r#"
    [[interfaces]]
    name = "Production"
    [[interfaces.relationships]]
    name = "actors"
    target = "Actor"
    list = true
    [[nodes]]
    name = "Actor"
    [[nodes]]
    name = "Movie"
    implements = ["Production"]
    [[nodes.relationships]]
    name = "actors"
    target = "Movie"
    edge_type = "ACTED_IN"
    list = true
    "#,
    BuildError::IncompatibleImplementation { entity: "Movie".into(), interface: "Production".into(), field: "actors".into() }
)]
fn configuration_errors(#[case] declaration: &str, #[case] expected: BuildError) {
    assert_eq!(Schema::from_toml_str(declaration).unwrap_err(), expected);
}

#[test]
fn malformed_declarations() {
    let error = Schema::from_toml_str("[[nodes]]\nlabels = []").unwrap_err();

    assert!(matches!(error, BuildError::InvalidDeclaration(_)));
    insta::assert_snapshot!(
        BuildError::UnknownInterface { entity: "Movie".into(), interface: "Show".into() },
        @"`Movie` implements `Show`, which is not an interface"
    );
}
