//! Junction precedence.
//!
//! Every `and`/`or` gets a priority from its keyword and the number of
//! parentheses open around it. Pending junctions wait on a stack until an
//! operator of lower priority (or the end of input) shows that their right
//! operand is complete.

use super::model::{Junction, Query};

const DISJUNCTION_PRIORITY: usize = 1;
const CONJUNCTION_PRIORITY: usize = 2;
// Must exceed CONJUNCTION_PRIORITY - DISJUNCTION_PRIORITY so one extra level
// of nesting always outranks the keyword difference.
const PARENTHETICAL_BONUS: usize = 3;

/// Binding priority of `junction` written inside `depth` open parentheses.
pub(crate) fn priority(junction: Junction, depth: usize) -> usize {
    let base = match junction {
        Junction::Or => DISJUNCTION_PRIORITY,
        Junction::And => CONJUNCTION_PRIORITY,
    };
    PARENTHETICAL_BONUS.saturating_mul(depth).saturating_add(base)
}

#[derive(Debug)]
struct Pending {
    left: Query,
    junction: Junction,
    priority: usize,
}

/// Junctions whose right-hand operand is still being parsed.
///
/// Priorities strictly increase from the bottom of the stack to the top.
#[derive(Debug, Default)]
pub(crate) struct Chain {
    pending: Vec<Pending>,
    joined: usize,
}

impl Chain {
    /// Defer `junction` with `operand` as its left side.
    ///
    /// Pending junctions binding at least as tightly take `operand` as their
    /// right side first, which keeps equal priorities left-associative.
    pub(crate) fn push(&mut self, operand: Query, junction: Junction, priority: usize) {
        let left = self.reduce(operand, priority);
        self.pending.push(Pending {
            left,
            junction,
            priority,
        });
        self.joined += 1;
    }

    /// Number of junctions pushed so far, folded or not.
    pub(crate) fn joined(&self) -> usize {
        self.joined
    }

    /// Close every pending junction, `operand` being the last expression.
    pub(crate) fn complete(mut self, operand: Query) -> Query {
        self.reduce(operand, 0)
    }

    fn reduce(&mut self, mut operand: Query, floor: usize) -> Query {
        while self.pending.last().is_some_and(|top| top.priority >= floor) {
            if let Some(top) = self.pending.pop() {
                operand = top.junction.join(top.left, operand);
            }
        }
        operand
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::Relation;

    fn leaf(name: &str) -> Query {
        Query::relational(name, Relation::Exists(true))
    }

    #[test]
    fn test_nesting_outranks_keyword() {
        assert!(priority(Junction::Or, 1) > priority(Junction::And, 0));
        assert!(priority(Junction::And, 0) > priority(Junction::Or, 0));
        assert!(priority(Junction::Or, 3) > priority(Junction::And, 2));
    }

    #[test]
    fn test_priority_saturates() {
        assert_eq!(priority(Junction::And, usize::MAX), usize::MAX);
    }

    #[test]
    fn test_equal_priority_is_left_associative() {
        let mut chain = Chain::default();
        chain.push(leaf("a"), Junction::Or, 1);
        chain.push(leaf("b"), Junction::Or, 1);
        let query = chain.complete(leaf("c"));
        assert_eq!(
            query,
            Query::or(Query::or(leaf("a"), leaf("b")), leaf("c"))
        );
    }

    #[test]
    fn test_higher_priority_binds_first() {
        let mut chain = Chain::default();
        chain.push(leaf("a"), Junction::Or, 1);
        chain.push(leaf("b"), Junction::And, 2);
        let query = chain.complete(leaf("c"));
        assert_eq!(
            query,
            Query::or(leaf("a"), Query::and(leaf("b"), leaf("c")))
        );
    }

    #[test]
    fn test_lower_priority_takes_pending_as_left() {
        let mut chain = Chain::default();
        chain.push(leaf("a"), Junction::And, 2);
        chain.push(leaf("b"), Junction::Or, 1);
        let query = chain.complete(leaf("c"));
        assert_eq!(
            query,
            Query::or(Query::and(leaf("a"), leaf("b")), leaf("c"))
        );
    }

    #[test]
    fn test_joined_counts_folded_junctions() {
        let mut chain = Chain::default();
        chain.push(leaf("a"), Junction::And, 2);
        chain.push(leaf("b"), Junction::Or, 1);
        chain.push(leaf("c"), Junction::Or, 1);
        assert_eq!(chain.joined(), 3);
    }

    #[test]
    fn test_empty_chain_returns_operand() {
        assert_eq!(Chain::default().complete(leaf("a")), leaf("a"));
    }
}
