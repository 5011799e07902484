use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::model::expected_errors::ExpectedErrors;

pub mod alter_table;
pub mod cte;
pub mod expr;
pub mod select;

pub use alter_table::{AlterTable, AlterTableQuery};
pub use cte::{Cte, WithClause};
pub use select::{Select, SelectQuery};

/// A statement ready for execution, with the error substrings that classify
/// its failures as expected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub sql: String,
    pub expected_errors: ExpectedErrors,
    /// Set for DDL, so the caller refreshes its schema snapshot.
    pub could_affect_schema: bool,
}

impl Query {
    /// True if the database error `message` is a known outcome of this
    /// statement rather than a bug signal.
    pub fn is_expected_error(&self, message: &str) -> bool {
        self.expected_errors.is_expected(message)
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_error_classification() {
        let mut expected_errors = ExpectedErrors::new();
        expected_errors.add("contains null values");
        let query = Query {
            sql: "ALTER TABLE t0 ALTER COLUMN c0 SET NOT NULL".into(),
            expected_errors,
            could_affect_schema: true,
        };
        assert!(query.is_expected_error(r#"column "c0" of relation "t0" contains null values"#));
        assert!(!query.is_expected_error("could not read block 0 in file"));
        assert_eq!(query.to_string(), query.sql);
    }
}
