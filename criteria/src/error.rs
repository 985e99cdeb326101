//! Error types for search criteria parsing.

use crate::query::Junction;

/// Why a search criteria string was rejected.
///
/// Parsing stops at the first violation, so a query only ever produces one
/// of these. Wording is informational; match on the variant instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("the query is empty")]
    EmptyQuery,

    #[error("the wildcard must be used alone")]
    WildcardNotAlone,

    #[error("empty expressions are not allowed")]
    EmptyExpression,

    /// `depth` is the nesting left open at the end of input, or -1 for a
    /// close parenthesis without a matching open one.
    #[error("the parentheses are unbalanced (depth {depth})")]
    UnbalancedParentheses { depth: i64 },

    #[error("parentheses nest deeper than the limit of {limit}")]
    NestingTooDeep { limit: usize },

    #[error("more than {limit} expressions are combined")]
    TooManyTerms { limit: usize },

    #[error("the property identifier is not a part of an expression: {property}")]
    DanglingProperty { property: String },

    #[error("no operator is applied to the property identifier: {property}")]
    MissingOperator { property: String },

    /// A keyword prefix cut short by whitespace or the end of input.
    #[error("unexpected operator: {prefix}")]
    UnexpectedOperator { prefix: String },

    /// A keyword prefix followed by a character that cannot continue it.
    #[error("unexpected operator beginning: {fragment}")]
    UnexpectedOperatorBeginning { fragment: String },

    #[error("incomplete operator: {operator}")]
    IncompleteOperator { operator: &'static str },

    #[error("whitespace is required around the operator: {operator}")]
    MissingWhitespace { operator: &'static str },

    #[error("there is no operand for the operator: {operator}")]
    MissingOperand { operator: &'static str },

    #[error("expecting a double-quoted string operand with the operator: {operator}")]
    ExpectedString { operator: &'static str },

    #[error("unexpected escape sequence: \\{character}")]
    UnexpectedEscape { character: char },

    #[error("the double-quoted string is not terminated: \"{content}\"")]
    UnterminatedString { content: String },

    #[error("expecting either \"true\" or \"false\"")]
    ExpectedBoolean,

    #[error("expecting an expression after the {junction}")]
    MissingJunctionOperand { junction: Junction },
}

/// Errors from loading or saving the parser configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbalanced_display_includes_depth() {
        let err = ParseError::UnbalancedParentheses { depth: 2 };
        assert_eq!(err.to_string(), "the parentheses are unbalanced (depth 2)");
    }

    #[test]
    fn test_junction_operand_display_names_junction() {
        let err = ParseError::MissingJunctionOperand {
            junction: Junction::And,
        };
        assert_eq!(err.to_string(), "expecting an expression after the conjunction");
    }

    #[test]
    fn test_io_error_converts_into_crate_error() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.to_string(), "IO error: denied");
    }

    #[test]
    fn test_too_many_terms_names_limit() {
        let err = ParseError::TooManyTerms { limit: 8 };
        assert_eq!(err.to_string(), "more than 8 expressions are combined");
    }
}
