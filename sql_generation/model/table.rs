use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Column types of the target dialect that generation knows how to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter)]
pub enum ColumnType {
    Int,
    Boolean,
    Text,
    Decimal,
    Float,
    Real,
    Range,
    Money,
    Bit,
    Inet,
}

impl ColumnType {
    pub fn is_integer(&self) -> bool {
        matches!(self, ColumnType::Int)
    }

    /// Numeric-family types only accept `PLAIN` storage.
    pub fn is_numeric_family(&self) -> bool {
        matches!(
            self,
            ColumnType::Int
                | ColumnType::Decimal
                | ColumnType::Float
                | ColumnType::Real
                | ColumnType::Money
        )
    }

    /// Types with a btree ordering, usable in ORDER BY and comparisons.
    pub fn is_orderable(&self) -> bool {
        !matches!(self, ColumnType::Range)
    }
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ColumnType::Int => "INT",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Text => "TEXT",
            ColumnType::Decimal => "DECIMAL",
            ColumnType::Float => "FLOAT",
            ColumnType::Real => "REAL",
            ColumnType::Range => "int4range",
            ColumnType::Money => "MONEY",
            ColumnType::Bit => "BIT VARYING",
            ColumnType::Inet => "INET",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub identity: bool,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
            identity: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Marks the column as `GENERATED ... AS IDENTITY`, which implies NOT NULL.
    pub fn identity(mut self) -> Self {
        self.identity = true;
        self.nullable = false;
        self
    }
}

impl Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.name, self.column_type)?;
        if self.identity {
            write!(f, " GENERATED BY DEFAULT AS IDENTITY")?;
        } else if !self.nullable {
            write!(f, " NOT NULL")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}

impl Index {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            unique: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub indexes: Vec<Index>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
            indexes: Vec::new(),
        }
    }

    pub fn with_index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn has_indexes(&self) -> bool {
        !self.indexes.is_empty()
    }

    pub fn has_integer_column(&self) -> bool {
        self.columns.iter().any(|c| c.column_type.is_integer())
    }

    pub fn integer_columns(&self) -> Vec<&Column> {
        self.columns
            .iter()
            .filter(|c| c.column_type.is_integer())
            .collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let columns = self
            .columns
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "CREATE TABLE {} ({columns})", self.name)
    }
}

/// Read-only snapshot of the catalog that one generation call works against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub tables: Vec<Table>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_display() {
        let table = Table::new(
            "t0",
            vec![
                Column::new("id", ColumnType::Int).identity(),
                Column::new("name", ColumnType::Text).not_null(),
                Column::new("r", ColumnType::Range),
            ],
        );
        assert_eq!(
            table.to_string(),
            "CREATE TABLE t0 (id INT GENERATED BY DEFAULT AS IDENTITY, name TEXT NOT NULL, r int4range)"
        );
    }

    #[test]
    fn test_integer_columns() {
        let table = Table::new(
            "t0",
            vec![
                Column::new("a", ColumnType::Text),
                Column::new("b", ColumnType::Int),
                Column::new("c", ColumnType::Decimal),
            ],
        );
        assert!(table.has_integer_column());
        let ints = table.integer_columns();
        assert_eq!(ints.len(), 1);
        assert_eq!(ints[0].name, "b");
        assert!(!table.has_indexes());
    }

    #[test]
    fn test_numeric_family() {
        assert!(ColumnType::Int.is_numeric_family());
        assert!(ColumnType::Money.is_numeric_family());
        assert!(!ColumnType::Text.is_numeric_family());
        assert!(!ColumnType::Range.is_numeric_family());
    }
}
