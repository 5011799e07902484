//! Registry of error-message substrings a generated statement may legitimately
//! trigger on the target database.
//!
//! The generator only ever adds to a registry. The executing side asks
//! [`ExpectedErrors::is_expected`] whether a database error is a known outcome
//! or a candidate bug.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

pub const COMMON_EXPRESSION_ERRORS: &[&str] = &[
    "You might need to add explicit type casts",
    "invalid regular expression",
    "could not determine which collation to use",
    "invalid input syntax for",
    "value too long for type character",
    "argument of NOT must be type boolean",
    "operator does not exist",
    "operator is not unique",
    "division by zero",
    "out of range",
    "cannot cast type",
    "negative substring length not allowed",
    "function does not exist",
    "LIKE pattern must not end with escape character",
    "cannot AND bit strings of different sizes",
    "cannot OR bit strings of different sizes",
    "cannot XOR bit strings of different sizes",
    "is not a valid binary digit",
    "bit string length",
    "result of range difference would not be contiguous",
    "result of range union would not be contiguous",
    "range lower bound must be less than or equal to range upper bound",
    "invalid input syntax for type money",
    "canceling statement due to statement timeout",
];

pub const COMMON_INSERT_UPDATE_ERRORS: &[&str] = &[
    "value too long for type character",
    "not found in view targetlist",
    "violates check constraint",
    "violates not-null constraint",
    "violates unique constraint",
    "violates foreign key constraint",
    "violates exclusion constraint",
    "duplicate key value violates unique constraint",
    "could not create unique index",
    "cannot insert a non-DEFAULT value into column",
    "but expression is of type",
];

pub const COMMON_TABLE_ERRORS: &[&str] = &[
    "is not a table",
    "is not a typed table",
    "cannot use subquery in check constraint",
    "cannot use column reference in DEFAULT expression",
    "generation expression is not immutable",
    "cannot be used in a generation expression",
    "PRIMARY KEY containing generated column",
    "there is no unique constraint matching given keys for referenced table",
    "has no column named",
    "multiple primary keys for table",
    "could not identify an equality operator for type",
    "data type",
];

/// Failures any ALTER TABLE statement may raise regardless of its actions.
pub const ALTER_TABLE_ERRORS: &[&str] = &[
    "cannot drop desired object(s) because other objects depend on them",
    "invalid input syntax for",
    "it has pending trigger events",
    "could not open relation",
    "functions in index expression must be marked IMMUTABLE",
    "functions in index predicate must be marked IMMUTABLE",
    "has no default operator class for access method",
    "does not accept data type",
    "does not exist for access method",
    "could not find cast from",
    "does not exist",
    "constraints on permanent tables may reference only permanent tables",
];

/// Failures specific to the shapes the SELECT generator produces.
pub const SELECT_ERRORS: &[&str] = &[
    "is not allowed with DISTINCT clause",
    "is not allowed with GROUP BY clause",
    "is not allowed with window functions",
    "is not allowed with UNION/INTERSECT/EXCEPT",
    "cannot be applied to the nullable side of an outer join",
    "cannot be applied to a WITH query",
    "SELECT DISTINCT ON expressions must match initial ORDER BY expressions",
    "for SELECT DISTINCT, ORDER BY expressions must appear in select list",
    "must appear in the GROUP BY clause or be used in an aggregate function",
    "each UNION query must have the same number of columns",
    "each INTERSECT query must have the same number of columns",
    "each EXCEPT query must have the same number of columns",
    "could not identify an equality operator for type",
    "could not identify an ordering operator for type",
    "could not identify a comparison function for type",
    "frame starting from",
    "frame ending at",
    "frame starting offset must not be",
    "frame ending offset must not be",
    "requires exactly one ORDER BY column",
    "GROUPS mode requires an ORDER BY clause",
    "window functions are not allowed in",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedErrors {
    errors: IndexSet<String>,
}

impl ExpectedErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one substring. Duplicates collapse.
    pub fn add(&mut self, error: impl Into<String>) {
        self.errors.insert(error.into());
    }

    pub fn add_all<I, S>(&mut self, errors: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.errors.extend(errors.into_iter().map(Into::into));
    }

    pub fn add_common_expression_errors(&mut self) {
        self.add_all(COMMON_EXPRESSION_ERRORS.iter().copied());
    }

    pub fn add_common_insert_update_errors(&mut self) {
        self.add_all(COMMON_INSERT_UPDATE_ERRORS.iter().copied());
    }

    pub fn add_common_table_errors(&mut self) {
        self.add_all(COMMON_TABLE_ERRORS.iter().copied());
    }

    /// True if `message` contains any registered substring.
    pub fn is_expected(&self, message: &str) -> bool {
        self.errors.iter().any(|e| message.contains(e.as_str()))
    }

    /// True if `error` was registered verbatim.
    pub fn contains(&self, error: &str) -> bool {
        self.errors.contains(error)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_collapse() {
        let mut errors = ExpectedErrors::new();
        errors.add("does not exist");
        errors.add("does not exist");
        errors.add_all(["does not exist", "already exists"]);
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.iter().collect::<Vec<_>>(),
            vec!["does not exist", "already exists"]
        );
    }

    #[test]
    fn test_is_expected_matches_substrings() {
        let mut errors = ExpectedErrors::new();
        errors.add("is not an identity column");
        assert!(errors.is_expected(r#"column "c0" of relation "t0" is not an identity column"#));
        assert!(!errors.is_expected("server closed the connection unexpectedly"));
        assert!(!ExpectedErrors::new().is_expected("anything"));
    }

    #[test]
    fn test_common_categories() {
        let mut errors = ExpectedErrors::new();
        errors.add_common_expression_errors();
        errors.add_common_insert_update_errors();
        errors.add_common_table_errors();
        assert!(errors.contains("division by zero"));
        assert!(errors.contains("violates not-null constraint"));
        assert!(errors.contains("is not a table"));
        // "value too long for type character" is in two categories
        assert!(
            errors.len()
                < COMMON_EXPRESSION_ERRORS.len()
                    + COMMON_INSERT_UPDATE_ERRORS.len()
                    + COMMON_TABLE_ERRORS.len()
        );
    }
}
