//! Search criteria parsing for content directory services.
//!
//! Turns a search criteria string such as
//! `upnp:class derivedFrom "object.item.audioItem" and dc:title contains "Blue"`
//! into an immutable [`Query`] tree that consumers walk with a
//! [`QueryVisitor`].

pub mod config;
pub mod error;
pub mod query;
pub mod sql;

pub use config::ParserConfig;
pub use error::{Error, ParseError, Result};
pub use query::{parse, parse_with, Junction, Operand, Parser, Query, QueryVisitor, RelOp, Relation};
pub use sql::SqlFilter;
