//! Rendering queries as SQL filter expressions.
//!
//! Produces a DuckDB-compatible boolean expression for a `WHERE` clause,
//! where each property names a column of the same name.

use crate::query::{Query, QueryVisitor};

/// Visitor rendering a [`Query`] as a SQL boolean expression.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlFilter;

impl SqlFilter {
    /// Render `query` as a SQL boolean expression.
    pub fn render(query: &Query) -> String {
        query.accept(&mut SqlFilter)
    }

    fn compare(property: &str, op: &str, value: &str) -> String {
        format!("{} {} {}", column(property), op, literal(value))
    }
}

/// Quote a property as a column identifier.
fn column(property: &str) -> String {
    format!("\"{}\"", property.replace('"', "\"\""))
}

/// Quote a value as a string literal.
fn literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

impl QueryVisitor for SqlFilter {
    type Output = String;

    fn visit_all_results(&mut self) -> String {
        "TRUE".to_string()
    }

    fn visit_and(&mut self, left: &Query, right: &Query) -> String {
        format!("({} AND {})", left.accept(self), right.accept(self))
    }

    fn visit_or(&mut self, left: &Query, right: &Query) -> String {
        format!("({} OR {})", left.accept(self), right.accept(self))
    }

    fn visit_equals(&mut self, property: &str, value: &str) -> String {
        Self::compare(property, "=", value)
    }

    fn visit_not_equals(&mut self, property: &str, value: &str) -> String {
        Self::compare(property, "<>", value)
    }

    fn visit_less_than(&mut self, property: &str, value: &str) -> String {
        Self::compare(property, "<", value)
    }

    fn visit_less_or_equal(&mut self, property: &str, value: &str) -> String {
        Self::compare(property, "<=", value)
    }

    fn visit_greater_than(&mut self, property: &str, value: &str) -> String {
        Self::compare(property, ">", value)
    }

    fn visit_greater_or_equal(&mut self, property: &str, value: &str) -> String {
        Self::compare(property, ">=", value)
    }

    fn visit_contains(&mut self, property: &str, value: &str) -> String {
        format!("strpos({}, {}) > 0", column(property), literal(value))
    }

    fn visit_does_not_contain(&mut self, property: &str, value: &str) -> String {
        format!("strpos({}, {}) = 0", column(property), literal(value))
    }

    // Classes are dotted paths: a class derives from itself and from every
    // ancestor segment, never from a sibling sharing its spelling.
    fn visit_derived_from(&mut self, property: &str, value: &str) -> String {
        let column = column(property);
        format!(
            "({} = {} OR starts_with({}, {}))",
            column,
            literal(value),
            column,
            literal(&format!("{}.", value))
        )
    }

    fn visit_exists(&mut self, property: &str, value: bool) -> String {
        if value {
            format!("{} IS NOT NULL", column(property))
        } else {
            format!("{} IS NULL", column(property))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use duckdb::Connection;

    fn setup_catalog() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE items (
                "dc:title" VARCHAR,
                "upnp:class" VARCHAR,
                "dc:creator" VARCHAR,
                "upnp:genre" VARCHAR
            );
            INSERT INTO items VALUES
                ('Blue Train', 'object.item.audioItem.musicTrack', 'John Coltrane', 'Jazz'),
                ('Giant Steps', 'object.item.audioItem.musicTrack', 'John Coltrane', NULL),
                ('Kind of Blue', 'object.container.album.musicAlbum', 'Miles Davis', 'Jazz'),
                ('Holiday.jpg', 'object.item.imageItem.photo', NULL, NULL),
                ('It''s "Live"', 'object.item.videoItem', 'Miles Davis', 'Live'),
                ('Radio Jazz', 'object.item.audioItem', 'KEXP', NULL),
                ('Stray', 'object.item.audioItemX', 'Nobody', NULL);
            "#,
        )
        .unwrap();
        conn
    }

    fn titles(conn: &Connection, criteria: &str) -> Vec<String> {
        let filter = SqlFilter::render(&parse(criteria).unwrap());
        let sql = format!(
            "SELECT \"dc:title\" FROM items WHERE {} ORDER BY \"dc:title\"",
            filter
        );
        let mut stmt = conn.prepare(&sql).unwrap();
        let rows = stmt.query_map([], |row| row.get::<_, String>(0)).unwrap();
        rows.collect::<std::result::Result<Vec<_>, _>>().unwrap()
    }

    #[test]
    fn test_render_relational() {
        let query = parse("dc:title contains \"Foo\"").unwrap();
        assert_eq!(SqlFilter::render(&query), "strpos(\"dc:title\", 'Foo') > 0");
    }

    #[test]
    fn test_render_escapes_quotes() {
        let query = parse("a\"b = \"it's\"").unwrap();
        assert_eq!(SqlFilter::render(&query), "\"a\"\"b\" = 'it''s'");
    }

    #[test]
    fn test_render_derived_from_stops_at_segment() {
        let query = parse("upnp:class derivedFrom \"object.item\"").unwrap();
        assert_eq!(
            SqlFilter::render(&query),
            "(\"upnp:class\" = 'object.item' OR starts_with(\"upnp:class\", 'object.item.'))"
        );
    }

    #[test]
    fn test_render_junctions_parenthesized() {
        let query = parse("a = \"1\" and b = \"2\" or c exists false").unwrap();
        assert_eq!(
            SqlFilter::render(&query),
            "((\"a\" = '1' AND \"b\" = '2') OR \"c\" IS NULL)"
        );
    }

    #[test]
    fn test_wildcard_selects_everything() {
        let conn = setup_catalog();
        assert_eq!(titles(&conn, "*").len(), 7);
    }

    #[test]
    fn test_derived_from_filters_by_class() {
        let conn = setup_catalog();
        assert_eq!(
            titles(&conn, "upnp:class derivedFrom \"object.item.audioItem\""),
            vec!["Blue Train", "Giant Steps", "Radio Jazz"]
        );
        assert_eq!(
            titles(&conn, "upnp:class derivedFrom \"object.item.audio\""),
            Vec::<String>::new()
        );
    }

    #[test]
    fn test_precedence_survives_rendering() {
        let conn = setup_catalog();
        assert_eq!(
            titles(
                &conn,
                "dc:creator = \"Miles Davis\" and upnp:genre = \"Jazz\" or dc:title contains \"Steps\""
            ),
            vec!["Giant Steps", "Kind of Blue"]
        );
        assert_eq!(
            titles(
                &conn,
                "dc:creator = \"Miles Davis\" and (upnp:genre = \"Jazz\" or dc:title contains \"Steps\")"
            ),
            vec!["Kind of Blue"]
        );
    }

    #[test]
    fn test_exists_and_does_not_contain() {
        let conn = setup_catalog();
        assert_eq!(
            titles(&conn, "upnp:genre exists true and dc:title doesNotContain \"Blue\""),
            vec!["It's \"Live\""]
        );
        assert_eq!(
            titles(&conn, "dc:creator exists false"),
            vec!["Holiday.jpg"]
        );
    }

    #[test]
    fn test_escaped_operand_matches_literal_text() {
        let conn = setup_catalog();
        assert_eq!(
            titles(&conn, r#"dc:title = "It's \"Live\"""#),
            vec!["It's \"Live\""]
        );
    }

    #[test]
    fn test_ordering_comparisons() {
        let conn = setup_catalog();
        assert_eq!(
            titles(&conn, "dc:title >= \"H\" and dc:title < \"K\""),
            vec!["Holiday.jpg", "It's \"Live\""]
        );
    }
}
