//! Character-at-a-time parser for search criteria strings.
//!
//! The parser never looks ahead or backtracks: each character moves the
//! single live [`State`] to its successor, and the end of input asks the
//! final state for the finished [`Query`].

use log::debug;

use super::model::{Junction, Query, RelOp, Relation};
use super::precedence::{priority, Chain};
use crate::config::ParserConfig;
use crate::error::ParseError;

/// Separators recognised by the grammar.
fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\u{0B}' | '\u{0C}' | '\r')
}

/// Parse a search criteria string with the default limits.
pub fn parse(input: &str) -> Result<Query, ParseError> {
    parse_with(input, &ParserConfig::default())
}

/// Parse a search criteria string.
pub fn parse_with(input: &str, config: &ParserConfig) -> Result<Query, ParseError> {
    debug!("parsing search criteria: {:?}", input);
    let result = Parser::new(config).feed(input).and_then(Parser::finish);
    if let Err(err) = &result {
        debug!("rejected search criteria {:?}: {}", input, err);
    }
    result
}

/// Incremental parser, fed one character (or chunk) at a time.
///
/// Each step consumes the parser and returns its successor, so a parser
/// value is never observed half-way through a transition.
#[derive(Debug)]
pub struct Parser {
    state: State,
    limits: Limits,
}

impl Parser {
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            state: State::Root { depth: 0 },
            limits: Limits {
                depth: config.max_nesting_depth,
                terms: config.max_terms,
            },
        }
    }

    /// Consume one character.
    pub fn advance(self, c: char) -> Result<Self, ParseError> {
        let state = self.state.advance(c, self.limits)?;
        Ok(Self {
            state,
            limits: self.limits,
        })
    }

    /// Consume every character of `input` in order.
    pub fn feed(self, input: &str) -> Result<Self, ParseError> {
        input.chars().try_fold(self, Parser::advance)
    }

    /// Signal the end of input.
    pub fn finish(self) -> Result<Query, ParseError> {
        self.state.finish()
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(&ParserConfig::default())
    }
}

#[derive(Debug, Clone, Copy)]
struct Limits {
    depth: usize,
    terms: usize,
}

/// Where a relational expression lands once its operand is complete.
#[derive(Debug)]
struct Scope {
    chain: Chain,
    depth: usize,
}

#[derive(Debug)]
enum State {
    /// Before the first expression; only `(` and whitespace so far.
    Root { depth: usize },
    /// A lone `*` has been read.
    Wildcard,
    /// Inside the property identifier.
    Property { token: String, scope: Scope },
    /// Waiting for the first character of the operator.
    Operator { property: String, scope: Scope },
    /// Read `!`, `<` or `>`; a `=` may follow.
    Symbol {
        property: String,
        operator: RelOp,
        scope: Scope,
    },
    /// Read `d`; the next character picks `derivedFrom` or `doesNotContain`.
    DerivedOrDoesNot { property: String, scope: Scope },
    /// Part-way through a keyword operator.
    OperatorKeyword {
        property: String,
        operator: RelOp,
        matched: usize,
        scope: Scope,
    },
    /// Operator complete; whitespace, then the operand.
    Spacing {
        property: String,
        operator: RelOp,
        spaced: bool,
        scope: Scope,
    },
    /// Inside a double-quoted operand.
    Text {
        property: String,
        operator: RelOp,
        text: String,
        escaped: bool,
        scope: Scope,
    },
    /// Inside the `true` / `false` operand of `exists`.
    Flag {
        property: String,
        value: bool,
        matched: usize,
        scope: Scope,
    },
    /// A complete expression; a junction or `)` may follow.
    Expression { operand: Query, scope: Scope },
    /// Part-way through `and` / `or`.
    JunctionKeyword {
        junction: Junction,
        matched: usize,
        scope: Scope,
    },
    /// After a junction, waiting for its right-hand expression.
    Joined { junction: Junction, scope: Scope },
}

enum KeywordStep {
    Matched(usize),
    Complete,
}

fn step_keyword(keyword: &str, matched: usize, c: char) -> Result<KeywordStep, ParseError> {
    if matched == keyword.len() {
        if is_whitespace(c) {
            Ok(KeywordStep::Complete)
        } else {
            Err(ParseError::UnexpectedOperatorBeginning {
                fragment: format!("{}{}", keyword, c),
            })
        }
    } else if keyword[matched..].starts_with(c) {
        Ok(KeywordStep::Matched(matched + c.len_utf8()))
    } else if is_whitespace(c) {
        Err(ParseError::UnexpectedOperator {
            prefix: keyword[..matched].to_string(),
        })
    } else {
        Err(ParseError::UnexpectedOperatorBeginning {
            fragment: format!("{}{}", &keyword[..matched], c),
        })
    }
}

fn open_parenthesis(depth: usize, limit: usize) -> Result<usize, ParseError> {
    if depth >= limit {
        Err(ParseError::NestingTooDeep { limit })
    } else {
        Ok(depth + 1)
    }
}

fn incomplete_keyword(keyword: &str, matched: usize) -> ParseError {
    ParseError::UnexpectedOperator {
        prefix: keyword[..matched].to_string(),
    }
}

impl State {
    fn advance(self, c: char, limits: Limits) -> Result<State, ParseError> {
        match self {
            State::Root { depth } => {
                if is_whitespace(c) {
                    return Ok(State::Root { depth });
                }
                match c {
                    '*' if depth == 0 => Ok(State::Wildcard),
                    '*' => Err(ParseError::WildcardNotAlone),
                    '(' => Ok(State::Root {
                        depth: open_parenthesis(depth, limits.depth)?,
                    }),
                    ')' if depth > 0 => Err(ParseError::EmptyExpression),
                    ')' => Err(ParseError::UnbalancedParentheses { depth: -1 }),
                    _ => Ok(State::Property {
                        token: c.to_string(),
                        scope: Scope {
                            chain: Chain::default(),
                            depth,
                        },
                    }),
                }
            }

            State::Wildcard => {
                if is_whitespace(c) {
                    Ok(State::Wildcard)
                } else {
                    Err(ParseError::WildcardNotAlone)
                }
            }

            State::Property { mut token, scope } => {
                if is_whitespace(c) {
                    Ok(State::Operator {
                        property: token,
                        scope,
                    })
                } else {
                    token.push(c);
                    Ok(State::Property { token, scope })
                }
            }

            State::Operator { property, scope } => {
                if is_whitespace(c) {
                    return Ok(State::Operator { property, scope });
                }
                let next = match c {
                    '=' => State::Spacing {
                        property,
                        operator: RelOp::Equals,
                        spaced: false,
                        scope,
                    },
                    '!' => State::Symbol {
                        property,
                        operator: RelOp::NotEquals,
                        scope,
                    },
                    '<' => State::Symbol {
                        property,
                        operator: RelOp::LessThan,
                        scope,
                    },
                    '>' => State::Symbol {
                        property,
                        operator: RelOp::GreaterThan,
                        scope,
                    },
                    'c' | 'e' => State::OperatorKeyword {
                        property,
                        operator: if c == 'c' {
                            RelOp::Contains
                        } else {
                            RelOp::Exists
                        },
                        matched: 1,
                        scope,
                    },
                    'd' => State::DerivedOrDoesNot { property, scope },
                    _ => {
                        return Err(ParseError::UnexpectedOperatorBeginning {
                            fragment: c.to_string(),
                        })
                    }
                };
                Ok(next)
            }

            State::Symbol {
                property,
                operator,
                scope,
            } => {
                let operator = match (operator, c) {
                    (RelOp::NotEquals, '=') => RelOp::NotEquals,
                    (RelOp::NotEquals, _) => {
                        return Err(ParseError::IncompleteOperator { operator: "!=" })
                    }
                    (RelOp::LessThan, '=') => RelOp::LessOrEqual,
                    (RelOp::GreaterThan, '=') => RelOp::GreaterOrEqual,
                    (operator, c) if is_whitespace(c) => {
                        return Ok(State::Spacing {
                            property,
                            operator,
                            spaced: true,
                            scope,
                        })
                    }
                    (operator, _) => {
                        return Err(ParseError::MissingWhitespace {
                            operator: operator.as_str(),
                        })
                    }
                };
                Ok(State::Spacing {
                    property,
                    operator,
                    spaced: false,
                    scope,
                })
            }

            State::DerivedOrDoesNot { property, scope } => {
                let operator = match c {
                    'e' => RelOp::DerivedFrom,
                    'o' => RelOp::DoesNotContain,
                    c if is_whitespace(c) => return Err(incomplete_keyword("d", 1)),
                    c => {
                        return Err(ParseError::UnexpectedOperatorBeginning {
                            fragment: format!("d{}", c),
                        })
                    }
                };
                Ok(State::OperatorKeyword {
                    property,
                    operator,
                    matched: 2,
                    scope,
                })
            }

            State::OperatorKeyword {
                property,
                operator,
                matched,
                scope,
            } => match step_keyword(operator.as_str(), matched, c)? {
                KeywordStep::Matched(matched) => Ok(State::OperatorKeyword {
                    property,
                    operator,
                    matched,
                    scope,
                }),
                KeywordStep::Complete => Ok(State::Spacing {
                    property,
                    operator,
                    spaced: true,
                    scope,
                }),
            },

            State::Spacing {
                property,
                operator,
                spaced,
                scope,
            } => {
                if is_whitespace(c) {
                    return Ok(State::Spacing {
                        property,
                        operator,
                        spaced: true,
                        scope,
                    });
                }
                if !spaced {
                    return Err(ParseError::MissingWhitespace {
                        operator: operator.as_str(),
                    });
                }
                match (operator, c) {
                    (RelOp::Exists, 't' | 'f') => Ok(State::Flag {
                        property,
                        value: c == 't',
                        matched: 1,
                        scope,
                    }),
                    (RelOp::Exists, _) => Err(ParseError::ExpectedBoolean),
                    (_, '"') => Ok(State::Text {
                        property,
                        operator,
                        text: String::new(),
                        escaped: false,
                        scope,
                    }),
                    (operator, _) => Err(ParseError::ExpectedString {
                        operator: operator.as_str(),
                    }),
                }
            }

            State::Text {
                property,
                operator,
                mut text,
                escaped,
                scope,
            } => {
                if escaped {
                    if c != '\\' && c != '"' {
                        return Err(ParseError::UnexpectedEscape { character: c });
                    }
                    text.push(c);
                    return Ok(State::Text {
                        property,
                        operator,
                        text,
                        escaped: false,
                        scope,
                    });
                }
                match c {
                    '\\' => Ok(State::Text {
                        property,
                        operator,
                        text,
                        escaped: true,
                        scope,
                    }),
                    '"' => {
                        let relation = operator
                            .with_text(text)
                            .ok_or(ParseError::ExpectedBoolean)?;
                        Ok(State::expression(Query::relational(property, relation), scope))
                    }
                    _ => {
                        text.push(c);
                        Ok(State::Text {
                            property,
                            operator,
                            text,
                            escaped: false,
                            scope,
                        })
                    }
                }
            }

            State::Flag {
                property,
                value,
                matched,
                scope,
            } => {
                let literal = if value { "true" } else { "false" };
                if matched == literal.len() {
                    let expression =
                        State::expression(Query::relational(property, Relation::Exists(value)), scope);
                    if is_whitespace(c) {
                        Ok(expression)
                    } else if c == '(' || c == ')' {
                        expression.advance(c, limits)
                    } else {
                        Err(ParseError::ExpectedBoolean)
                    }
                } else if literal[matched..].starts_with(c) {
                    Ok(State::Flag {
                        property,
                        value,
                        matched: matched + 1,
                        scope,
                    })
                } else {
                    Err(ParseError::ExpectedBoolean)
                }
            }

            State::Expression { operand, scope } => {
                if is_whitespace(c) {
                    return Ok(State::Expression { operand, scope });
                }
                match c {
                    ')' if scope.depth == 0 => Err(ParseError::UnbalancedParentheses { depth: -1 }),
                    ')' => Ok(State::Expression {
                        operand,
                        scope: Scope {
                            chain: scope.chain,
                            depth: scope.depth - 1,
                        },
                    }),
                    'a' => State::junction(Junction::And, operand, scope, limits.terms),
                    'o' => State::junction(Junction::Or, operand, scope, limits.terms),
                    _ => Err(ParseError::UnexpectedOperatorBeginning {
                        fragment: c.to_string(),
                    }),
                }
            }

            State::JunctionKeyword {
                junction,
                matched,
                scope,
            } => match step_keyword(junction.keyword(), matched, c)? {
                KeywordStep::Matched(matched) => Ok(State::JunctionKeyword {
                    junction,
                    matched,
                    scope,
                }),
                KeywordStep::Complete => Ok(State::Joined { junction, scope }),
            },

            State::Joined { junction, scope } => {
                if is_whitespace(c) {
                    return Ok(State::Joined { junction, scope });
                }
                match c {
                    '(' => Ok(State::Joined {
                        junction,
                        scope: Scope {
                            depth: open_parenthesis(scope.depth, limits.depth)?,
                            chain: scope.chain,
                        },
                    }),
                    ')' => Err(ParseError::MissingJunctionOperand { junction }),
                    _ => Ok(State::Property {
                        token: c.to_string(),
                        scope,
                    }),
                }
            }
        }
    }

    fn finish(self) -> Result<Query, ParseError> {
        match self {
            State::Root { .. } => Err(ParseError::EmptyQuery),
            State::Wildcard => Ok(Query::AllResults),
            State::Property { token, .. } => Err(ParseError::DanglingProperty { property: token }),
            State::Operator { property, .. } => Err(ParseError::MissingOperator { property }),
            State::Symbol {
                operator: RelOp::NotEquals,
                ..
            } => Err(ParseError::IncompleteOperator { operator: "!=" }),
            State::Symbol { operator, .. } | State::Spacing { operator, .. } => {
                Err(ParseError::MissingOperand {
                    operator: operator.as_str(),
                })
            }
            State::DerivedOrDoesNot { .. } => Err(incomplete_keyword("d", 1)),
            State::OperatorKeyword {
                operator, matched, ..
            } => {
                let keyword = operator.as_str();
                if matched == keyword.len() {
                    Err(ParseError::MissingOperand { operator: keyword })
                } else {
                    Err(incomplete_keyword(keyword, matched))
                }
            }
            State::Text { text, .. } => Err(ParseError::UnterminatedString { content: text }),
            State::Flag {
                property,
                value,
                matched,
                scope,
            } => {
                let literal = if value { "true" } else { "false" };
                if matched == literal.len() {
                    State::expression(Query::relational(property, Relation::Exists(value)), scope)
                        .finish()
                } else {
                    Err(ParseError::ExpectedBoolean)
                }
            }
            State::Expression { operand, scope } => {
                if scope.depth == 0 {
                    Ok(scope.chain.complete(operand))
                } else {
                    Err(ParseError::UnbalancedParentheses {
                        depth: scope.depth as i64,
                    })
                }
            }
            State::JunctionKeyword {
                junction, matched, ..
            } => {
                let keyword = junction.keyword();
                if matched < keyword.len() {
                    Err(incomplete_keyword(keyword, matched))
                } else {
                    Err(ParseError::MissingJunctionOperand { junction })
                }
            }
            State::Joined { junction, .. } => Err(ParseError::MissingJunctionOperand { junction }),
        }
    }

    fn expression(operand: Query, scope: Scope) -> State {
        State::Expression { operand, scope }
    }

    /// Defer `operand` as the left side of `junction`, then match the
    /// rest of the keyword.
    ///
    /// A query of `n` expressions has `n - 1` junctions; the one that would
    /// open room for expression `max_terms + 1` is refused.
    fn junction(
        junction: Junction,
        operand: Query,
        scope: Scope,
        max_terms: usize,
    ) -> Result<State, ParseError> {
        let Scope { mut chain, depth } = scope;
        if chain.joined().saturating_add(2) > max_terms {
            return Err(ParseError::TooManyTerms { limit: max_terms });
        }
        chain.push(operand, junction, priority(junction, depth));
        Ok(State::JunctionKeyword {
            junction,
            matched: 1,
            scope: Scope { chain, depth },
        })
    }
}
