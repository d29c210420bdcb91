use serde_json::Value;

use super::{condition, target_predicate, Emitter, Scope};
use crate::{
    cypher::{BinaryOp, Expr, NodePattern, Pattern},
    ir::{ComparisonOperator, Filter, Operand, PropertyFilter, Quantifier, Traversal},
};

impl Emitter<'_> {
    /// Lowers a filter over the node in scope, and the edge leading to it.
    pub(super) fn predicate(&mut self, filter: &Filter, scope: &Scope) -> Expr {
        match filter {
            Filter::Property(filter) => self.property_predicate(filter, scope),
            Filter::And(filters) => {
                let predicates: Vec<_> = filters.iter().map(|filter| self.predicate(filter, scope)).collect();
                Expr::and(predicates)
            }
            Filter::Or(filters) => {
                let predicates: Vec<_> = filters.iter().map(|filter| self.predicate(filter, scope)).collect();
                Expr::or(predicates)
            }
            Filter::Not(filter) => match self.predicate(filter, scope) {
                Expr::IsNull(expr) => Expr::IsNotNull(expr),
                predicate => predicate.not(),
            },
            Filter::Labels(labels) => Expr::HasLabels {
                variable: scope.node.clone(),
                labels: labels.clone(),
            },
            Filter::Relationship {
                traversal,
                quantifier,
                predicate,
            } => self.quantified(traversal, *quantifier, predicate.as_deref(), scope),
            Filter::RelationshipCount {
                traversal,
                operator,
                value,
            } => {
                let (pattern, related) = self.traversal(traversal, scope);
                let target = target_predicate(&traversal.target, &related.node);
                let count = Expr::count(pattern, target);
                let value = self.env.param(value.clone());

                Expr::binary(binary_op(*operator), count, value)
            }
            Filter::Claim { path, operator, value } => {
                let claim = self.claim(path);
                self.claim_predicate(claim, *operator, value)
            }
            Filter::Authenticated => self.is_authenticated().equals(Expr::Boolean(true)),
            Filter::Score { operator, value } => {
                let score = Expr::variable(scope.score.as_deref().unwrap_or(&scope.node));
                let value = self.env.param(value.clone());

                Expr::binary(binary_op(*operator), score, value)
            }
            Filter::Constant(value) => Expr::Boolean(*value),
        }
    }

    fn property_predicate(&mut self, filter: &PropertyFilter, scope: &Scope) -> Expr {
        let property = scope.owner(filter.owner).property(&filter.property);

        let value = match &filter.operand {
            Operand::Claim(path) => {
                let claim = self.claim(path);
                let comparison = comparison(filter.operator, property, claim.clone());

                return Expr::and([claim.is_not_null(), comparison]);
            }
            Operand::Value(Value::Null) if filter.operator == ComparisonOperator::Equal => {
                return property.is_null();
            }
            Operand::Value(value) => value,
        };

        // Points are compared by their distance to the given point, `{ point, distance }`.
        if filter.ty.is_spatial() && (filter.operator.is_ordering() || filter.operator == ComparisonOperator::Distance) {
            let param = self.env.param(value.clone());

            let distance = Expr::function(
                "point.distance",
                vec![
                    property,
                    Expr::function("point", vec![param.clone().property("point")]),
                ],
            );

            let operator = match filter.operator {
                ComparisonOperator::Distance => BinaryOp::Equal,
                operator => binary_op(operator),
            };

            return Expr::binary(operator, distance, param.property("distance"));
        }

        let value = match filter.operator {
            // Patterns and substrings are plain strings, whatever the type of the attribute.
            operator if operator.is_textual() => self.env.param(value.clone()),
            _ => self.typed_param(&filter.ty, value),
        };

        comparison(filter.operator, property, value)
    }

    fn claim_predicate(&mut self, claim: Expr, operator: ComparisonOperator, value: &Value) -> Expr {
        if value.is_null() && operator == ComparisonOperator::Equal {
            return claim.is_null();
        }

        if operator == ComparisonOperator::Distance {
            return Expr::Boolean(false);
        }

        let value = self.env.param(value.clone());

        Expr::and([claim.clone().is_not_null(), comparison(operator, claim, value)])
    }

    /// The pattern from the node in scope to a related node, and the scope of the related node.
    fn traversal(&mut self, traversal: &Traversal, scope: &Scope) -> (Pattern, Scope) {
        let node = self.env.node();
        let edge = self.env.node();

        let pattern = Pattern::related(
            NodePattern::new(&scope.node),
            Some(edge.clone()),
            &traversal.edge_type,
            traversal.direction,
            NodePattern::new(&node).labels(traversal.target.pattern_labels()),
        );

        let related = Scope {
            node,
            edge: Some(edge),
            score: None,
        };

        (pattern, related)
    }

    fn quantified(
        &mut self,
        traversal: &Traversal,
        quantifier: Quantifier,
        predicate: Option<&Filter>,
        scope: &Scope,
    ) -> Expr {
        let (pattern, related) = self.traversal(traversal, scope);
        let target = target_predicate(&traversal.target, &related.node);
        let predicate = predicate.map(|predicate| self.predicate(predicate, &related));

        match quantifier {
            Quantifier::Some => Expr::exists(pattern, condition(target.into_iter().chain(predicate))),
            Quantifier::None => Expr::exists(pattern, condition(target.into_iter().chain(predicate))).not(),
            Quantifier::Single => {
                Expr::count(pattern, condition(target.into_iter().chain(predicate))).equals(Expr::Integer(1))
            }
            // At least one related node, and none the predicate does not hold for.
            Quantifier::All => {
                let Some(predicate) = predicate else {
                    return Expr::exists(pattern, target);
                };

                let violation = condition(target.clone().into_iter().chain([predicate.not()]));

                Expr::and([
                    Expr::exists(pattern.clone(), target),
                    Expr::exists(pattern, violation).not(),
                ])
            }
        }
    }
}

fn binary_op(operator: ComparisonOperator) -> BinaryOp {
    match operator {
        ComparisonOperator::Equal | ComparisonOperator::Distance => BinaryOp::Equal,
        ComparisonOperator::In | ComparisonOperator::Includes => BinaryOp::In,
        ComparisonOperator::Contains => BinaryOp::Contains,
        ComparisonOperator::StartsWith => BinaryOp::StartsWith,
        ComparisonOperator::EndsWith => BinaryOp::EndsWith,
        ComparisonOperator::Matches => BinaryOp::Matches,
        ComparisonOperator::LessThan => BinaryOp::LessThan,
        ComparisonOperator::LessThanOrEqual => BinaryOp::LessThanOrEqual,
        ComparisonOperator::GreaterThan => BinaryOp::GreaterThan,
        ComparisonOperator::GreaterThanOrEqual => BinaryOp::GreaterThanOrEqual,
    }
}

/// `subject <operator> value`. A list includes the value when the value is in it.
fn comparison(operator: ComparisonOperator, subject: Expr, value: Expr) -> Expr {
    match operator {
        ComparisonOperator::Includes => Expr::binary(BinaryOp::In, value, subject),
        operator => Expr::binary(binary_op(operator), subject, value),
    }
}

#[cfg(test)]
mod tests {
    use graph_schema::AttributeType;
    use serde_json::json;

    use super::*;
    use crate::{
        cypher::Direction,
        ir::{NodeTarget, PropertyOwner},
        options::CompileOptions,
        request::AuthContext,
    };

    fn property(property: &str, ty: AttributeType, operator: ComparisonOperator, value: Value) -> Filter {
        Filter::Property(PropertyFilter {
            owner: PropertyOwner::Node,
            property: property.into(),
            ty,
            list: false,
            operator,
            operand: Operand::Value(value),
        })
    }

    fn lower(filter: &Filter) -> String {
        let options = CompileOptions::default();
        let auth = AuthContext::authenticated(json!({ "sub": "user" }).as_object().cloned().unwrap_or_default());
        let mut emitter = Emitter::new(&options, &auth);

        emitter.predicate(filter, &Scope::node("this")).to_string()
    }

    #[test]
    fn null_equality() {
        let filter = property("title", AttributeType::String, ComparisonOperator::Equal, Value::Null);

        assert_eq!(lower(&filter), "this.title IS NULL");
        assert_eq!(lower(&filter.negate()), "this.title IS NOT NULL");
    }

    #[test]
    fn temporal_and_spatial_operands() {
        let released = property(
            "released",
            AttributeType::DateTime,
            ComparisonOperator::GreaterThan,
            json!("2000-01-01T00:00:00Z"),
        );

        assert_eq!(lower(&released), "this.released > datetime($param0)");

        let location = property(
            "location",
            AttributeType::Point,
            ComparisonOperator::LessThan,
            json!({ "point": { "longitude": 1.0, "latitude": 2.0 }, "distance": 100 }),
        );

        assert_eq!(
            lower(&location),
            "point.distance(this.location, point($param0.point)) < $param0.distance"
        );
    }

    #[test]
    fn quantifiers() {
        let traversal = Traversal {
            edge_type: "ACTED_IN".into(),
            direction: Direction::Left,
            target: NodeTarget::labels(&["Actor".to_string()]),
        };

        let all = Filter::Relationship {
            traversal: traversal.clone(),
            quantifier: Quantifier::All,
            predicate: Some(Box::new(property(
                "name",
                AttributeType::String,
                ComparisonOperator::StartsWith,
                json!("K"),
            ))),
        };

        assert_eq!(
            lower(&all),
            "(EXISTS { MATCH (this)<-[this1:ACTED_IN]-(this0:Actor) } AND \
             NOT (EXISTS { MATCH (this)<-[this1:ACTED_IN]-(this0:Actor) WHERE NOT (this0.name STARTS WITH $param0) }))"
        );

        let none = Filter::Relationship {
            traversal,
            quantifier: Quantifier::None,
            predicate: None,
        };

        assert_eq!(lower(&none), "NOT (EXISTS { MATCH (this)<-[this1:ACTED_IN]-(this0:Actor) })");
    }

    #[test]
    fn claims_are_guarded() {
        let filter = Filter::Property(PropertyFilter {
            owner: PropertyOwner::Node,
            property: "owner".into(),
            ty: AttributeType::Id,
            list: false,
            operator: ComparisonOperator::Equal,
            operand: Operand::Claim(vec!["sub".into()]),
        });

        assert_eq!(lower(&filter), "($jwt.sub IS NOT NULL AND this.owner = $jwt.sub)");
        assert_eq!(lower(&Filter::Authenticated), "$isAuthenticated = true");
    }
}
