//! Visitor dispatch over parsed queries.

use super::model::{Query, Relation};

/// One method per query shape, with no fallbacks: adding a shape is a
/// compile error for every consumer until it is handled.
///
/// Junction methods receive the two sub-queries unvisited so the consumer
/// decides the traversal order (or whether to descend at all).
pub trait QueryVisitor {
    type Output;

    fn visit_all_results(&mut self) -> Self::Output;
    fn visit_and(&mut self, left: &Query, right: &Query) -> Self::Output;
    fn visit_or(&mut self, left: &Query, right: &Query) -> Self::Output;
    fn visit_equals(&mut self, property: &str, value: &str) -> Self::Output;
    fn visit_not_equals(&mut self, property: &str, value: &str) -> Self::Output;
    fn visit_less_than(&mut self, property: &str, value: &str) -> Self::Output;
    fn visit_less_or_equal(&mut self, property: &str, value: &str) -> Self::Output;
    fn visit_greater_than(&mut self, property: &str, value: &str) -> Self::Output;
    fn visit_greater_or_equal(&mut self, property: &str, value: &str) -> Self::Output;
    fn visit_contains(&mut self, property: &str, value: &str) -> Self::Output;
    fn visit_does_not_contain(&mut self, property: &str, value: &str) -> Self::Output;
    fn visit_derived_from(&mut self, property: &str, value: &str) -> Self::Output;
    fn visit_exists(&mut self, property: &str, value: bool) -> Self::Output;
}

impl Query {
    /// Dispatch to the visitor method matching this query's shape.
    pub fn accept<V>(&self, visitor: &mut V) -> V::Output
    where
        V: QueryVisitor + ?Sized,
    {
        match self {
            Query::AllResults => visitor.visit_all_results(),
            Query::And(left, right) => visitor.visit_and(left, right),
            Query::Or(left, right) => visitor.visit_or(left, right),
            Query::Relational { property, relation } => match relation {
                Relation::Equals(v) => visitor.visit_equals(property, v),
                Relation::NotEquals(v) => visitor.visit_not_equals(property, v),
                Relation::LessThan(v) => visitor.visit_less_than(property, v),
                Relation::LessOrEqual(v) => visitor.visit_less_or_equal(property, v),
                Relation::GreaterThan(v) => visitor.visit_greater_than(property, v),
                Relation::GreaterOrEqual(v) => visitor.visit_greater_or_equal(property, v),
                Relation::Contains(v) => visitor.visit_contains(property, v),
                Relation::DoesNotContain(v) => visitor.visit_does_not_contain(property, v),
                Relation::DerivedFrom(v) => visitor.visit_derived_from(property, v),
                Relation::Exists(flag) => visitor.visit_exists(property, *flag),
            },
        }
    }
}
