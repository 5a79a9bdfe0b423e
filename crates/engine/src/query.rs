//! Parameterized `INSERT`/`UPDATE` statements with a variable set of columns.
//!
//! Every value goes through [`QueryBuilder::push_param`], which appends it to
//! the parameter list and writes a positional `?` placeholder, so the n-th
//! placeholder always binds the n-th value. Table and column names are
//! code-provided identifiers, never user input.
//!
//! ```rust
//! use engine::QueryBuilder;
//! use sea_orm::DbBackend;
//!
//! let mut builder = QueryBuilder::update(DbBackend::Sqlite, "purchases");
//! builder.set("quantity", "2").set("price", "3");
//! builder.where_clause().column("id", 7i64).and().column("account_id", 1i64);
//! let (sql, values) = builder.build();
//! assert_eq!(
//!     sql,
//!     "UPDATE purchases SET quantity = ?, price = ? WHERE id = ? AND account_id = ?"
//! );
//! assert_eq!(values.len(), 4);
//! ```

use sea_orm::{DbBackend, Statement, Value};

/// Builder for a single statement. One instance per statement.
#[derive(Debug)]
pub struct QueryBuilder {
    backend: DbBackend,
    sql: String,
    values: Vec<Value>,
    assignments: usize,
    rows: usize,
}

impl QueryBuilder {
    /// Start an `UPDATE <table> SET` statement.
    pub fn update(backend: DbBackend, table: &str) -> Self {
        Self {
            backend,
            sql: format!("UPDATE {table} SET"),
            values: Vec::new(),
            assignments: 0,
            rows: 0,
        }
    }

    /// Start an `INSERT INTO <table> (<columns>) VALUES` statement.
    pub fn insert(backend: DbBackend, table: &str, columns: &[&str]) -> Self {
        Self {
            backend,
            sql: format!("INSERT INTO {table} ({}) VALUES", columns.join(", ")),
            values: Vec::new(),
            assignments: 0,
            rows: 0,
        }
    }

    /// Append `column = <param>` to the `SET` list.
    pub fn set(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.sql.push_str(if self.assignments == 0 { " " } else { ", " });
        self.sql.push_str(column);
        self.sql.push_str(" = ");
        self.push_param(value.into());
        self.assignments += 1;
        self
    }

    /// Append one value tuple to an insert.
    pub fn add_row<I, V>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.sql.push_str(if self.rows == 0 { " (" } else { ", (" });
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            self.push_param(value.into());
        }
        self.sql.push(')');
        self.rows += 1;
        self
    }

    /// Ask for the given columns back from the affected rows.
    pub fn returning(&mut self, columns: &[&str]) -> &mut Self {
        self.sql.push_str(" RETURNING ");
        self.sql.push_str(&columns.join(", "));
        self
    }

    pub fn where_clause(&mut self) -> &mut Self {
        self.sql.push_str(" WHERE");
        self
    }

    /// Append `column = <param>` to the predicate.
    pub fn column(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.sql.push(' ');
        self.sql.push_str(column);
        self.sql.push_str(" = ");
        self.push_param(value.into());
        self
    }

    pub fn and(&mut self) -> &mut Self {
        self.sql.push_str(" AND");
        self
    }

    /// Append `column IN (<params>)` to the predicate.
    ///
    /// An empty list yields a predicate that matches nothing.
    pub fn column_in<I, V>(&mut self, column: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut values = values.into_iter().peekable();
        if values.peek().is_none() {
            self.sql.push_str(" 1 = 0");
            return self;
        }
        self.sql.push(' ');
        self.sql.push_str(column);
        self.sql.push_str(" IN (");
        for (i, value) in values.enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            self.push_param(value.into());
        }
        self.sql.push(')');
        self
    }

    /// Whether any `set`/`add_row` call happened. An update without
    /// assignments must not be executed.
    pub fn has_assignments(&self) -> bool {
        self.assignments > 0 || self.rows > 0
    }

    /// Statement text and its ordered parameters.
    pub fn build(&self) -> (String, Vec<Value>) {
        (self.sql.clone(), self.values.clone())
    }

    pub fn into_statement(self) -> Statement {
        Statement::from_sql_and_values(self.backend, self.sql, self.values)
    }

    fn push_param(&mut self, value: Value) {
        self.values.push(value);
        self.sql.push('?');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_skips_when_nothing_was_set() {
        let builder = QueryBuilder::update(DbBackend::Sqlite, "purchases");
        assert!(!builder.has_assignments());
    }

    #[test]
    fn update_orders_parameters_like_placeholders() {
        let mut builder = QueryBuilder::update(DbBackend::Sqlite, "purchases");
        builder.set("product_id", 3i64);
        builder.set("price", "4.5");
        builder
            .where_clause()
            .column("id", 10i64)
            .and()
            .column("account_id", 2i64);
        let (sql, values) = builder.build();

        assert_eq!(
            sql,
            "UPDATE purchases SET product_id = ?, price = ? WHERE id = ? AND account_id = ?"
        );
        assert_eq!(
            values,
            vec![
                Value::from(3i64),
                Value::from("4.5"),
                Value::from(10i64),
                Value::from(2i64),
            ]
        );
    }

    #[test]
    fn insert_supports_multiple_rows_and_returning() {
        let mut builder = QueryBuilder::insert(DbBackend::Sqlite, "tags", &["name", "account_id"]);
        builder.add_row([Value::from("Groceries"), Value::from(1i64)]);
        builder.add_row([Value::from("Rent"), Value::from(1i64)]);
        builder.returning(&["id"]);
        let (sql, values) = builder.build();

        assert!(builder.has_assignments());
        assert_eq!(
            sql,
            "INSERT INTO tags (name, account_id) VALUES (?, ?), (?, ?) RETURNING id"
        );
        assert_eq!(values[2], Value::from("Rent"));
    }

    #[test]
    fn in_list_continues_the_parameter_counter() {
        let mut builder = QueryBuilder::update(DbBackend::Sqlite, "tags");
        builder.set("deleted", false);
        builder
            .where_clause()
            .column("account_id", 5i64)
            .and()
            .column_in("id", [7i64, 8, 9])
            .returning(&["id", "name"]);
        let (sql, values) = builder.build();

        assert_eq!(
            sql,
            "UPDATE tags SET deleted = ? WHERE account_id = ? AND id IN (?, ?, ?) RETURNING id, name"
        );
        assert_eq!(values.len(), 5);
        assert_eq!(values[4], Value::from(9i64));
    }

    #[test]
    fn empty_in_list_matches_nothing() {
        let mut builder = QueryBuilder::update(DbBackend::Sqlite, "tags");
        builder.set("deleted", false);
        builder.where_clause().column_in("id", Vec::<i64>::new());
        let (sql, values) = builder.build();

        assert_eq!(sql, "UPDATE tags SET deleted = ? WHERE 1 = 0");
        assert_eq!(values.len(), 1);
    }
}
