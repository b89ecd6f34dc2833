//! Parameterized SQL composition primitives.
//!
//! # Responsibility
//! - Represent statement pieces as renderable [`Fragment`] values.
//! - Accumulate fragments into one executable statement plus its bound
//!   parameters via [`SqlBuilder`].
//!
//! # Invariants
//! - Rendering is pure: the same fragment always yields the same
//!   `(text, params)` pair.
//! - Parameter order matches placeholder order left to right.
//! - Untrusted data must enter statements only through `Literal`; `Raw`
//!   text is trusted verbatim.

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

/// One renderable piece of a SQL statement.
///
/// A closed set of variants keeps the injection-safety argument local.
/// Identifiers are always quoted and literals always bind as `?`
/// placeholders; lists only recombine other fragments.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// Verbatim SQL text. Caller guarantees it contains no untrusted input.
    Raw(String),
    /// A table/column name, quoted for safe use. Never carries a parameter.
    Identifier(String),
    /// A value bound as a `?` placeholder, passed opaquely to the binder.
    Literal(Value),
    /// Sub-fragments joined by `separator`, wrapped in `prefix`/`postfix`.
    List {
        items: Vec<Fragment>,
        prefix: &'static str,
        separator: &'static str,
        postfix: &'static str,
    },
}

impl Fragment {
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw(sql.into())
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Self::Identifier(name.into())
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Parenthesized comma-separated list, e.g. `("a", "b")`.
    ///
    /// An empty list renders as `()`, which is not valid in value position;
    /// callers must not build statements over zero fields.
    pub fn list(items: Vec<Fragment>) -> Self {
        Self::List {
            items,
            prefix: "(",
            separator: ", ",
            postfix: ")",
        }
    }

    /// Unparenthesized comma-separated join, e.g. `"a", "b"`.
    pub fn joined(items: Vec<Fragment>) -> Self {
        Self::List {
            items,
            prefix: "",
            separator: ", ",
            postfix: "",
        }
    }

    /// Direct concatenation with no separator.
    pub fn concat(items: Vec<Fragment>) -> Self {
        Self::List {
            items,
            prefix: "",
            separator: "",
            postfix: "",
        }
    }

    /// Renders this fragment to statement text plus bound parameters.
    pub fn render(&self) -> (String, Vec<Value>) {
        match self {
            Self::Raw(sql) => (sql.clone(), Vec::new()),
            Self::Identifier(name) => (quote_identifier(name), Vec::new()),
            Self::Literal(value) => ("?".to_string(), vec![value.clone()]),
            Self::List {
                items,
                prefix,
                separator,
                postfix,
            } => {
                let mut builder = SqlBuilder::with(*prefix);
                for (i, item) in items.iter().enumerate() {
                    if i != 0 {
                        builder = builder.sql(*separator);
                    }
                    builder = builder.fragment(item);
                }
                builder.sql(*postfix).build()
            }
        }
    }
}

/// Quotes a name for use as a SQLite identifier.
///
/// Embedded double quotes are escaped by doubling, which is the rule SQLite
/// actually applies when parsing quoted identifiers.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Accumulates fragments into one statement and its flattened parameters.
///
/// Builders compose: a `List` renders its elements through a nested builder,
/// so placeholder counting never happens by hand.
#[derive(Debug, Default)]
pub struct SqlBuilder {
    sql: String,
    params: Vec<Value>,
}

impl SqlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a builder with an initial piece of trusted SQL text.
    pub fn with(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Appends a fragment, accumulating its text and parameters in order.
    pub fn fragment(mut self, fragment: &Fragment) -> Self {
        let (text, params) = fragment.render();
        self.sql.push_str(&text);
        self.params.extend(params);
        self
    }

    /// Appends trusted SQL text.
    pub fn sql(self, sql: impl Into<String>) -> Self {
        self.fragment(&Fragment::Raw(sql.into()))
    }

    /// Appends a quoted identifier.
    pub fn identifier(self, name: impl Into<String>) -> Self {
        self.fragment(&Fragment::identifier(name))
    }

    /// Appends a bound literal placeholder.
    pub fn literal(self, value: impl Into<Value>) -> Self {
        self.fragment(&Fragment::Literal(value.into()))
    }

    /// Finishes the statement, returning text plus positional parameters.
    pub fn build(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }

    /// Builds and executes the statement on the given connection.
    ///
    /// Returns the number of rows changed, as reported by SQLite.
    pub fn execute(self, conn: &Connection) -> rusqlite::Result<usize> {
        let (sql, params) = self.build();
        conn.execute(&sql, params_from_iter(params))
    }
}

#[cfg(test)]
mod tests {
    use super::{quote_identifier, Fragment, SqlBuilder};
    use rusqlite::types::Value;

    #[test]
    fn raw_renders_verbatim_without_params() {
        let (sql, params) = Fragment::raw("SELECT 1").render();
        assert_eq!(sql, "SELECT 1");
        assert!(params.is_empty());
    }

    #[test]
    fn identifier_quoting_doubles_embedded_quotes() {
        assert_eq!(quote_identifier("plain"), "\"plain\"");
        assert_eq!(quote_identifier("odd\"name"), "\"odd\"\"name\"");
    }

    #[test]
    fn literal_renders_placeholder_and_carries_value() {
        let (sql, params) = Fragment::literal("it's; DROP TABLE x".to_string()).render();
        assert_eq!(sql, "?");
        assert_eq!(params, vec![Value::Text("it's; DROP TABLE x".to_string())]);
    }

    #[test]
    fn empty_list_renders_bare_parentheses() {
        let (sql, params) = Fragment::list(Vec::new()).render();
        assert_eq!(sql, "()");
        assert!(params.is_empty());
    }

    #[test]
    fn params_preserve_left_to_right_order() {
        let (sql, params) = SqlBuilder::with("INSERT INTO ")
            .identifier("t")
            .sql(" ")
            .fragment(&Fragment::list(vec![
                Fragment::identifier("a"),
                Fragment::identifier("b"),
            ]))
            .sql(" VALUES ")
            .fragment(&Fragment::list(vec![
                Fragment::literal(1_i64),
                Fragment::literal("two".to_string()),
            ]))
            .build();

        assert_eq!(sql, "INSERT INTO \"t\" (\"a\", \"b\") VALUES (?, ?)");
        assert_eq!(
            params,
            vec![Value::Integer(1), Value::Text("two".to_string())]
        );
    }

    #[test]
    fn rendering_is_deterministic() {
        let fragment = Fragment::joined(vec![
            Fragment::identifier("x"),
            Fragment::literal(7_i64),
        ]);
        assert_eq!(fragment.render(), fragment.render());
    }
}
