//! Search criteria parser.
//!
//! # Syntax Overview
//!
//! - **Wildcard**: `*` alone matches every item
//! - **Relational**: `property op operand`, e.g. `dc:title contains "Foo"`
//! - **Operators**: `=`, `!=`, `<`, `<=`, `>`, `>=`, `contains`,
//!   `doesNotContain`, `derivedFrom`, `exists`
//! - **Operands**: double-quoted strings (`\"` and `\\` escapes), or
//!   `true`/`false` for `exists`
//! - **Junctions**: `and` binds tighter than `or`; parentheses group

mod model;
mod parser;
mod precedence;
mod visitor;

pub use model::{Junction, Operand, Query, RelOp, Relation};
pub use parser::{parse, parse_with, Parser};
pub use visitor::QueryVisitor;
