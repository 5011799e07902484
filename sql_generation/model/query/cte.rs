//! Common table expressions and the `WITH` clause that carries them.

use std::fmt::Display;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::model::query::select::Select;
use crate::model::table::Column;

/// `name[(alias, ...)] AS (<query>)`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cte {
    name: String,
    column_aliases: Vec<String>,
    query: Select,
    /// Snapshot of the schema columns the query reads, for type-aware callers.
    columns: Vec<Column>,
}

impl Cte {
    /// Fails on an empty name or on a query whose clauses are inconsistent.
    /// Alias arity is not checked against the query.
    pub fn new(
        name: impl Into<String>,
        column_aliases: Vec<String>,
        query: Select,
        columns: Vec<Column>,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::EmptyCteName);
        }
        query.validate()?;
        Ok(Self {
            name,
            column_aliases,
            query,
            columns,
        })
    }

    pub fn builder() -> CteBuilder {
        CteBuilder::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_aliases(&self) -> &[String] {
        &self.column_aliases
    }

    pub fn query(&self) -> &Select {
        &self.query
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }
}

impl Display for Cte {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.column_aliases.is_empty() {
            write!(f, "({})", self.column_aliases.iter().join(", "))?;
        }
        write!(f, " AS ({})", self.query)
    }
}

#[derive(Debug, Default)]
pub struct CteBuilder {
    name: Option<String>,
    column_aliases: Vec<String>,
    query: Option<Select>,
    columns: Vec<Column>,
}

impl CteBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn column_aliases(mut self, aliases: Vec<String>) -> Self {
        self.column_aliases = aliases;
        self
    }

    pub fn add_column_alias(mut self, alias: impl Into<String>) -> Self {
        self.column_aliases.push(alias.into());
        self
    }

    pub fn query(mut self, query: Select) -> Self {
        self.query = Some(query);
        self
    }

    pub fn columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    pub fn build(self) -> Result<Cte> {
        let name = self.name.unwrap_or_default();
        if name.is_empty() {
            return Err(Error::EmptyCteName);
        }
        let Some(query) = self.query else {
            return Err(Error::MissingCteQuery(name));
        };
        Cte::new(name, self.column_aliases, query, self.columns)
    }
}

/// `WITH cte1, cte2, ...`; never empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WithClause {
    ctes: Vec<Cte>,
}

impl WithClause {
    pub fn new(ctes: Vec<Cte>) -> Result<Self> {
        if ctes.is_empty() {
            return Err(Error::EmptyCteList);
        }
        Ok(Self { ctes })
    }

    pub fn builder() -> WithClauseBuilder {
        WithClauseBuilder::default()
    }

    pub fn cte_list(&self) -> &[Cte] {
        &self.ctes
    }

    pub fn into_ctes(self) -> Vec<Cte> {
        self.ctes
    }
}

impl Display for WithClause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WITH {}", self.ctes.iter().join(", "))
    }
}

#[derive(Debug, Default)]
pub struct WithClauseBuilder {
    ctes: Vec<Cte>,
}

impl WithClauseBuilder {
    pub fn add_cte(mut self, cte: Cte) -> Self {
        self.ctes.push(cte);
        self
    }

    pub fn ctes(mut self, ctes: Vec<Cte>) -> Self {
        self.ctes = ctes;
        self
    }

    pub fn build(self) -> Result<WithClause> {
        WithClause::new(self.ctes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::query::expr::Expr;
    use crate::model::query::select::{LockingClause, ResultColumn, SelectType};
    use crate::model::table::ColumnType;

    fn query() -> Select {
        Select::simple("t0", vec![ResultColumn::Expr(Expr::column("c0"), None)])
    }

    #[test]
    fn test_cte_rejects_empty_or_missing_name() {
        assert_eq!(
            Cte::new("", vec![], query(), vec![]),
            Err(Error::EmptyCteName)
        );
        assert_eq!(
            Cte::builder().query(query()).build(),
            Err(Error::EmptyCteName)
        );
        assert_eq!(
            Cte::builder().name("").query(query()).build(),
            Err(Error::EmptyCteName)
        );
    }

    #[test]
    fn test_cte_rejects_missing_query() {
        assert_eq!(
            Cte::builder().name("c").build(),
            Err(Error::MissingCteQuery("c".into()))
        );
    }

    #[test]
    fn test_cte_query_cannot_be_distinct_and_locked() {
        let mut query = query();
        query.set_select_option(SelectType::Distinct).unwrap();
        assert!(query
            .set_locking_clause(Some(LockingClause::Update))
            .is_err());
        // the rejected lock left the query usable as a CTE body
        assert!(Cte::builder().name("c").query(query).build().is_ok());
    }

    #[test]
    fn test_cte_rejects_inconsistent_query() {
        let mut query = query();
        query.set_group_by(vec![Expr::column("c0")]).unwrap();
        let mut value = serde_json::to_value(&query).unwrap();
        value["modifier"] = serde_json::json!({ "Locked": "Share" });
        let tampered: Select = serde_json::from_value(value).unwrap();
        assert_eq!(
            Cte::new("c", vec![], tampered, vec![]),
            Err(Error::LockingWithGroupBy(LockingClause::Share))
        );
    }

    #[test]
    fn test_cte_render() {
        let cte = Cte::builder().name("c").query(query()).build().unwrap();
        assert_eq!(cte.to_string(), "c AS (SELECT c0 FROM t0)");

        let cte = Cte::builder()
            .name("c")
            .column_aliases(vec!["a".into(), "b".into()])
            .query(query())
            .columns(vec![Column::new("c0", ColumnType::Int)])
            .build()
            .unwrap();
        assert_eq!(cte.to_string(), "c(a, b) AS (SELECT c0 FROM t0)");
        assert_eq!(cte.columns().len(), 1);
    }

    #[test]
    fn test_with_clause_rejects_empty_list() {
        assert_eq!(WithClause::new(vec![]), Err(Error::EmptyCteList));
        assert_eq!(WithClause::builder().build(), Err(Error::EmptyCteList));
        assert!(!Error::EmptyCteList.is_invariant_violation());
    }

    #[test]
    fn test_with_clause_render_and_copy() {
        let first = Cte::new("a", vec![], query(), vec![]).unwrap();
        let second = Cte::new("b", vec!["x".into()], query(), vec![]).unwrap();
        let with = WithClause::builder()
            .add_cte(first.clone())
            .add_cte(second.clone())
            .build()
            .unwrap();
        assert_eq!(
            with.to_string(),
            "WITH a AS (SELECT c0 FROM t0), b(x) AS (SELECT c0 FROM t0)"
        );

        let mut copy = with.cte_list().to_vec();
        assert_eq!(copy, vec![first, second]);
        copy.clear();
        assert_eq!(with.cte_list().len(), 2);
    }

    #[test]
    fn test_with_clause_builder_replaces_list() {
        let a = Cte::new("a", vec![], query(), vec![]).unwrap();
        let b = Cte::new("b", vec![], query(), vec![]).unwrap();
        let with = WithClause::builder()
            .add_cte(a)
            .ctes(vec![b.clone()])
            .build()
            .unwrap();
        assert_eq!(with.into_ctes(), vec![b]);
    }
}
