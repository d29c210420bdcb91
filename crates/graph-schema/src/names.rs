use inflector::Inflector;

/// Client-facing names derived from an entity name, computed once at build time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityNames {
    pub singular: String,
    pub plural: String,
    pub pascal_plural: String,
    pub read_field: String,
    pub connection_field: String,
    pub aggregate_field: String,
    pub create_field: String,
    pub update_field: String,
    pub delete_field: String,
    pub where_type: String,
    pub sort_type: String,
    pub create_input: String,
    pub update_input: String,
    pub connection_type: String,
    pub edge_type: String,
    pub aggregate_selection: String,
    pub create_response: String,
    pub update_response: String,
}

impl EntityNames {
    pub fn new(name: &str, plural: Option<&str>) -> Self {
        let singular = name.to_camel_case();

        let mut plural = match plural {
            Some(plural) => plural.to_camel_case(),
            None => singular.to_plural(),
        };

        // Uncountable nouns would make the list and the single field collide.
        if plural == singular {
            plural = format!("all{}", plural.to_pascal_case());
        }

        let pascal_plural = plural.to_pascal_case();

        Self {
            read_field: plural.clone(),
            connection_field: format!("{plural}Connection"),
            aggregate_field: format!("{plural}Aggregate"),
            create_field: format!("create{pascal_plural}"),
            update_field: format!("update{pascal_plural}"),
            delete_field: format!("delete{pascal_plural}"),
            where_type: format!("{name}Where"),
            sort_type: format!("{name}Sort"),
            create_input: format!("{name}CreateInput"),
            update_input: format!("{name}UpdateInput"),
            connection_type: format!("{pascal_plural}Connection"),
            edge_type: format!("{name}Edge"),
            aggregate_selection: format!("{name}AggregateSelection"),
            create_response: format!("Create{pascal_plural}MutationResponse"),
            update_response: format!("Update{pascal_plural}MutationResponse"),
            singular,
            plural,
            pascal_plural,
        }
    }

    pub fn fulltext_field(&self, index_name: &str) -> String {
        format!("{}Fulltext{}", self.plural, index_name.to_pascal_case())
    }
}

/// Names derived from a relationship field and its endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipNames {
    pub connection_field: String,
    pub aggregate_field: String,
    pub connection_type: String,
    pub relationship_type: String,
    pub aggregate_selection: String,
}

impl RelationshipNames {
    pub fn new(source: &str, field: &str, target: &str) -> Self {
        let pascal_field = field.to_pascal_case();

        Self {
            connection_field: format!("{field}Connection"),
            aggregate_field: format!("{field}Aggregate"),
            connection_type: format!("{source}{pascal_field}Connection"),
            relationship_type: format!("{source}{pascal_field}Relationship"),
            aggregate_selection: format!("{source}{target}{pascal_field}AggregationSelection"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_names() {
        let names = EntityNames::new("Movie", None);

        insta::assert_debug_snapshot!(names, @r###"
        EntityNames {
            singular: "movie",
            plural: "movies",
            pascal_plural: "Movies",
            read_field: "movies",
            connection_field: "moviesConnection",
            aggregate_field: "moviesAggregate",
            create_field: "createMovies",
            update_field: "updateMovies",
            delete_field: "deleteMovies",
            where_type: "MovieWhere",
            sort_type: "MovieSort",
            create_input: "MovieCreateInput",
            update_input: "MovieUpdateInput",
            connection_type: "MoviesConnection",
            edge_type: "MovieEdge",
            aggregate_selection: "MovieAggregateSelection",
            create_response: "CreateMoviesMutationResponse",
            update_response: "UpdateMoviesMutationResponse",
        }
        "###);

        assert_eq!(names.fulltext_field("movie_title"), "moviesFulltextMovieTitle");
    }

    #[test]
    fn plural_override_and_inflection() {
        assert_eq!(EntityNames::new("Category", None).plural, "categories");
        assert_eq!(EntityNames::new("Person", Some("Persons")).read_field, "persons");
        assert_eq!(EntityNames::new("ProductionCompany", None).create_field, "createProductionCompanies");
    }

    #[test]
    fn relationship_names() {
        let names = RelationshipNames::new("Movie", "actors", "Actor");

        assert_eq!(names.connection_field, "actorsConnection");
        assert_eq!(names.aggregate_field, "actorsAggregate");
        assert_eq!(names.connection_type, "MovieActorsConnection");
        assert_eq!(names.relationship_type, "MovieActorsRelationship");
        assert_eq!(names.aggregate_selection, "MovieActorActorsAggregationSelection");
    }
}
