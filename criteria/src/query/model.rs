//! Parsed search criteria: the predicate tree handed to consumers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A parsed search criteria predicate.
///
/// Values are only produced fully formed and are never mutated afterwards,
/// so a `Query` can be shared freely between threads and consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    /// The `*` wildcard: every item matches.
    AllResults,
    /// A single `property operator operand` comparison.
    Relational { property: String, relation: Relation },
    /// Both sub-queries must match.
    And(Box<Query>, Box<Query>),
    /// Either sub-query may match.
    Or(Box<Query>, Box<Query>),
}

/// Relational operators of the search grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelOp {
    /// `=`
    Equals,
    /// `!=`
    NotEquals,
    /// `<`
    LessThan,
    /// `<=`
    LessOrEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterOrEqual,
    /// `contains`
    Contains,
    /// `doesNotContain`
    DoesNotContain,
    /// `derivedFrom`
    DerivedFrom,
    /// `exists`
    Exists,
}

/// An operator paired with its operand.
///
/// `exists` is the only operator taking a boolean; every other operator
/// takes the text of a double-quoted string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Equals(String),
    NotEquals(String),
    LessThan(String),
    LessOrEqual(String),
    GreaterThan(String),
    GreaterOrEqual(String),
    Contains(String),
    DoesNotContain(String),
    DerivedFrom(String),
    Exists(bool),
}

/// Borrowed view of a relation's operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand<'a> {
    Text(&'a str),
    Flag(bool),
}

/// The `and` / `or` keywords combining two expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Junction {
    And,
    Or,
}

impl Query {
    /// Build a relational leaf.
    pub fn relational(property: impl Into<String>, relation: Relation) -> Self {
        Query::Relational {
            property: property.into(),
            relation,
        }
    }

    /// Combine two queries with `and`.
    pub fn and(left: Query, right: Query) -> Self {
        Query::And(Box::new(left), Box::new(right))
    }

    /// Combine two queries with `or`.
    pub fn or(left: Query, right: Query) -> Self {
        Query::Or(Box::new(left), Box::new(right))
    }

    /// Check if this query is the match-everything wildcard.
    pub fn is_match_all(&self) -> bool {
        matches!(self, Query::AllResults)
    }

    /// The junction at the root of this query, if any.
    pub fn junction(&self) -> Option<Junction> {
        match self {
            Query::And(..) => Some(Junction::And),
            Query::Or(..) => Some(Junction::Or),
            Query::AllResults | Query::Relational { .. } => None,
        }
    }
}

// Junction chains nest as deep as they are long; unlink them with a
// worklist so dropping never recurses.
impl Drop for Query {
    fn drop(&mut self) {
        let mut nested = Vec::new();
        detach_children(self, &mut nested);
        while let Some(mut child) = nested.pop() {
            detach_children(&mut child, &mut nested);
        }
    }
}

fn detach_children(query: &mut Query, nested: &mut Vec<Query>) {
    if let Query::And(left, right) | Query::Or(left, right) = query {
        for side in [left, right] {
            if side.junction().is_some() {
                nested.push(std::mem::replace(&mut **side, Query::AllResults));
            }
        }
    }
}

impl RelOp {
    /// The operator as written in a criteria string.
    pub fn as_str(&self) -> &'static str {
        match self {
            RelOp::Equals => "=",
            RelOp::NotEquals => "!=",
            RelOp::LessThan => "<",
            RelOp::LessOrEqual => "<=",
            RelOp::GreaterThan => ">",
            RelOp::GreaterOrEqual => ">=",
            RelOp::Contains => "contains",
            RelOp::DoesNotContain => "doesNotContain",
            RelOp::DerivedFrom => "derivedFrom",
            RelOp::Exists => "exists",
        }
    }

    /// Pair this operator with a string operand.
    ///
    /// Returns `None` for `exists`, which only takes a boolean.
    pub fn with_text(self, value: String) -> Option<Relation> {
        let relation = match self {
            RelOp::Equals => Relation::Equals(value),
            RelOp::NotEquals => Relation::NotEquals(value),
            RelOp::LessThan => Relation::LessThan(value),
            RelOp::LessOrEqual => Relation::LessOrEqual(value),
            RelOp::GreaterThan => Relation::GreaterThan(value),
            RelOp::GreaterOrEqual => Relation::GreaterOrEqual(value),
            RelOp::Contains => Relation::Contains(value),
            RelOp::DoesNotContain => Relation::DoesNotContain(value),
            RelOp::DerivedFrom => Relation::DerivedFrom(value),
            RelOp::Exists => return None,
        };
        Some(relation)
    }
}

impl Relation {
    pub fn operator(&self) -> RelOp {
        match self {
            Relation::Equals(_) => RelOp::Equals,
            Relation::NotEquals(_) => RelOp::NotEquals,
            Relation::LessThan(_) => RelOp::LessThan,
            Relation::LessOrEqual(_) => RelOp::LessOrEqual,
            Relation::GreaterThan(_) => RelOp::GreaterThan,
            Relation::GreaterOrEqual(_) => RelOp::GreaterOrEqual,
            Relation::Contains(_) => RelOp::Contains,
            Relation::DoesNotContain(_) => RelOp::DoesNotContain,
            Relation::DerivedFrom(_) => RelOp::DerivedFrom,
            Relation::Exists(_) => RelOp::Exists,
        }
    }

    pub fn operand(&self) -> Operand<'_> {
        match self {
            Relation::Equals(v)
            | Relation::NotEquals(v)
            | Relation::LessThan(v)
            | Relation::LessOrEqual(v)
            | Relation::GreaterThan(v)
            | Relation::GreaterOrEqual(v)
            | Relation::Contains(v)
            | Relation::DoesNotContain(v)
            | Relation::DerivedFrom(v) => Operand::Text(v),
            Relation::Exists(flag) => Operand::Flag(*flag),
        }
    }
}

impl Junction {
    /// The keyword as written in a criteria string.
    pub fn keyword(&self) -> &'static str {
        match self {
            Junction::And => "and",
            Junction::Or => "or",
        }
    }

    pub(crate) fn join(self, left: Query, right: Query) -> Query {
        match self {
            Junction::And => Query::and(left, right),
            Junction::Or => Query::or(left, right),
        }
    }
}

impl fmt::Display for RelOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Junction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Junction::And => write!(f, "conjunction"),
            Junction::Or => write!(f, "disjunction"),
        }
    }
}

impl fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Flag(flag) => write!(f, "{}", flag),
            Operand::Text(text) => {
                f.write_str("\"")?;
                for c in text.chars() {
                    if c == '"' || c == '\\' {
                        f.write_str("\\")?;
                    }
                    write!(f, "{}", c)?;
                }
                f.write_str("\"")
            }
        }
    }
}

/// Renders canonical criteria text with only the parentheses needed to
/// parse back into the same tree.
impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::AllResults => f.write_str("*"),
            Query::Relational { property, relation } => {
                write!(f, "{} {} {}", property, relation.operator(), relation.operand())
            }
            Query::And(left, right) => write_junction(f, Junction::And, left, right),
            Query::Or(left, right) => write_junction(f, Junction::Or, left, right),
        }
    }
}

fn write_junction(
    f: &mut fmt::Formatter<'_>,
    junction: Junction,
    left: &Query,
    right: &Query,
) -> fmt::Result {
    write_side(f, left, needs_grouping(junction, left, false))?;
    write!(f, " {} ", junction.keyword())?;
    write_side(f, right, needs_grouping(junction, right, true))
}

fn write_side(f: &mut fmt::Formatter<'_>, side: &Query, grouped: bool) -> fmt::Result {
    if grouped {
        write!(f, "({})", side)
    } else {
        write!(f, "{}", side)
    }
}

// `or` binds looser than `and`, and equal junctions associate to the left.
fn needs_grouping(parent: Junction, child: &Query, right_side: bool) -> bool {
    match (parent, child.junction()) {
        (_, None) => false,
        (Junction::And, Some(Junction::Or)) => true,
        (Junction::Or, Some(Junction::And)) => false,
        (_, Some(_)) => right_side,
    }
}
