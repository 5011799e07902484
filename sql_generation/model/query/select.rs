use std::fmt::Display;

use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::model::expected_errors::ExpectedErrors;
use crate::model::query::cte::WithClause;
use crate::model::query::expr::{Expr, OrderByTerm, WindowFunction};
use crate::model::query::Query;

/// `SELECT ALL` or `SELECT DISTINCT`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::EnumIter)]
pub enum SelectType {
    All,
    Distinct,
}

/// Row-level locking clause, rendered as `FOR <clause>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter)]
pub enum LockingClause {
    Update,
    NoKeyUpdate,
    Share,
    KeyShare,
}

impl Display for LockingClause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LockingClause::Update => "UPDATE",
            LockingClause::NoKeyUpdate => "NO KEY UPDATE",
            LockingClause::Share => "SHARE",
            LockingClause::KeyShare => "KEY SHARE",
        };
        write!(f, "{s}")
    }
}

/// Set operation joining a statement with the next one in its chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::EnumIter)]
pub enum SetOperator {
    Union,
    UnionAll,
    Intersect,
    Except,
}

impl Display for SetOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SetOperator::Union => "UNION",
            SetOperator::UnionAll => "UNION ALL",
            SetOperator::Intersect => "INTERSECT",
            SetOperator::Except => "EXCEPT",
        };
        write!(f, "{s}")
    }
}

/// Distinctness and row locking of a statement.
///
/// `DISTINCT` and a locking clause exclude each other, so they share one
/// variant slot instead of living in two fields.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum SelectModifier {
    #[default]
    All,
    Distinct {
        on: Option<Expr>,
    },
    Locked(LockingClause),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameMode {
    Range,
    Rows,
    Groups,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameBound {
    UnboundedPreceding,
    Preceding(u32),
    CurrentRow,
    Following(u32),
    UnboundedFollowing,
}

impl Display for FrameBound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameBound::UnboundedPreceding => write!(f, "UNBOUNDED PRECEDING"),
            FrameBound::Preceding(n) => write!(f, "{n} PRECEDING"),
            FrameBound::CurrentRow => write!(f, "CURRENT ROW"),
            FrameBound::Following(n) => write!(f, "{n} FOLLOWING"),
            FrameBound::UnboundedFollowing => write!(f, "UNBOUNDED FOLLOWING"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameExclusion {
    CurrentRow,
    Group,
    Ties,
    NoOthers,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindowFrame {
    pub mode: FrameMode,
    pub start: FrameBound,
    pub end: Option<FrameBound>,
    pub exclusion: Option<FrameExclusion>,
}

impl Display for WindowFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match self.mode {
            FrameMode::Range => "RANGE",
            FrameMode::Rows => "ROWS",
            FrameMode::Groups => "GROUPS",
        };
        match &self.end {
            Some(end) => write!(f, "{mode} BETWEEN {} AND {end}", self.start)?,
            None => write!(f, "{mode} {}", self.start)?,
        }
        match self.exclusion {
            Some(FrameExclusion::CurrentRow) => write!(f, " EXCLUDE CURRENT ROW"),
            Some(FrameExclusion::Group) => write!(f, " EXCLUDE GROUP"),
            Some(FrameExclusion::Ties) => write!(f, " EXCLUDE TIES"),
            Some(FrameExclusion::NoOthers) => write!(f, " EXCLUDE NO OTHERS"),
            None => Ok(()),
        }
    }
}

/// Body of a window, without the surrounding parentheses.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowDefinition {
    pub partition_by: Vec<Expr>,
    pub order_by: Vec<OrderByTerm>,
    pub frame: Option<WindowFrame>,
}

impl Display for WindowDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if !self.partition_by.is_empty() {
            parts.push(format!("PARTITION BY {}", self.partition_by.iter().join(", ")));
        }
        if !self.order_by.is_empty() {
            parts.push(format!("ORDER BY {}", self.order_by.iter().join(", ")));
        }
        if let Some(frame) = &self.frame {
            parts.push(frame.to_string());
        }
        write!(f, "{}", parts.join(" "))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FromItem {
    Table {
        name: String,
        only: bool,
        alias: Option<String>,
    },
    Subquery {
        select: Box<Select>,
        alias: String,
    },
}

impl FromItem {
    pub fn table(name: impl Into<String>) -> Self {
        FromItem::Table {
            name: name.into(),
            only: false,
            alias: None,
        }
    }
}

impl Display for FromItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FromItem::Table { name, only, alias } => {
                if *only {
                    write!(f, "ONLY ")?;
                }
                write!(f, "{name}")?;
                if let Some(alias) = alias {
                    write!(f, " AS {alias}")?;
                }
                Ok(())
            }
            FromItem::Subquery { select, alias } => write!(f, "({select}) AS {alias}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::EnumIter)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinKind {
    pub fn is_outer(&self) -> bool {
        matches!(self, JoinKind::Left | JoinKind::Right | JoinKind::Full)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Join {
    pub kind: JoinKind,
    pub item: FromItem,
    /// Ignored for `CROSS JOIN`.
    pub on: Option<Expr>,
}

impl Display for Join {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT OUTER JOIN",
            JoinKind::Right => "RIGHT OUTER JOIN",
            JoinKind::Full => "FULL OUTER JOIN",
            JoinKind::Cross => "CROSS JOIN",
        };
        write!(f, "{kind} {}", self.item)?;
        if self.kind != JoinKind::Cross {
            match &self.on {
                Some(on) => write!(f, " ON {on}")?,
                None => write!(f, " ON TRUE")?,
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ResultColumn {
    Expr(Expr, Option<String>),
    Star,
}

impl Display for ResultColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultColumn::Expr(expr, None) => write!(f, "{expr}"),
            ResultColumn::Expr(expr, Some(alias)) => write!(f, "{expr} AS {alias}"),
            ResultColumn::Star => write!(f, "*"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompoundSelect {
    pub operator: SetOperator,
    pub select: Select,
}

/// A SELECT statement and, through `compound`, the chain of statements joined
/// to it by set operations. Each node owns the next.
///
/// Clause combinations the grammar rejects are refused by the setters, so a
/// value built through them always renders a statement the parser accepts.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Select {
    with: Option<WithClause>,
    modifier: SelectModifier,
    fetch_columns: Vec<ResultColumn>,
    window_functions: Vec<WindowFunction>,
    from: Vec<FromItem>,
    joins: Vec<Join>,
    where_clause: Option<Expr>,
    group_by: Vec<Expr>,
    having: Option<Expr>,
    window_definitions: IndexMap<String, WindowDefinition>,
    order_by: Vec<OrderByTerm>,
    limit: Option<u64>,
    offset: Option<u64>,
    compound: Option<Box<CompoundSelect>>,
}

impl Select {
    pub fn new() -> Self {
        Self::default()
    }

    /// `SELECT <columns> FROM <table>`.
    pub fn simple(table: impl Into<String>, columns: Vec<ResultColumn>) -> Self {
        Select {
            fetch_columns: columns,
            from: vec![FromItem::table(table)],
            ..Default::default()
        }
    }

    pub fn select_option(&self) -> SelectType {
        match self.modifier {
            SelectModifier::Distinct { .. } => SelectType::Distinct,
            SelectModifier::All | SelectModifier::Locked(_) => SelectType::All,
        }
    }

    pub fn modifier(&self) -> &SelectModifier {
        &self.modifier
    }

    /// Switching to `DISTINCT` fails while a locking clause is set. Switching
    /// to `ALL` drops any DISTINCT ON expression and keeps the locking clause.
    pub fn set_select_option(&mut self, option: SelectType) -> Result<()> {
        let next = match (option, &self.modifier) {
            (SelectType::Distinct, SelectModifier::Locked(clause)) => {
                return Err(Error::LockingWithDistinct(*clause));
            }
            (SelectType::Distinct, SelectModifier::Distinct { .. }) => return Ok(()),
            (SelectType::Distinct, SelectModifier::All) => SelectModifier::Distinct { on: None },
            (SelectType::All, SelectModifier::Locked(clause)) => SelectModifier::Locked(*clause),
            (SelectType::All, _) => SelectModifier::All,
        };
        self.modifier = next;
        Ok(())
    }

    pub fn distinct_on(&self) -> Option<&Expr> {
        match &self.modifier {
            SelectModifier::Distinct { on } => on.as_ref(),
            _ => None,
        }
    }

    pub fn set_distinct_on(&mut self, expr: Expr) -> Result<()> {
        match &mut self.modifier {
            SelectModifier::Distinct { on } => {
                *on = Some(expr);
                Ok(())
            }
            _ => Err(Error::DistinctOnWithoutDistinct),
        }
    }

    pub fn locking_clause(&self) -> Option<LockingClause> {
        match self.modifier {
            SelectModifier::Locked(clause) => Some(clause),
            _ => None,
        }
    }

    /// `None` removes the locking clause and always succeeds.
    pub fn set_locking_clause(&mut self, clause: Option<LockingClause>) -> Result<()> {
        let Some(clause) = clause else {
            if let SelectModifier::Locked(_) = self.modifier {
                self.modifier = SelectModifier::All;
            }
            return Ok(());
        };
        if let SelectModifier::Distinct { .. } = self.modifier {
            return Err(Error::LockingWithDistinct(clause));
        }
        if !self.group_by.is_empty() {
            return Err(Error::LockingWithGroupBy(clause));
        }
        self.modifier = SelectModifier::Locked(clause);
        Ok(())
    }

    pub fn group_by(&self) -> &[Expr] {
        &self.group_by
    }

    pub fn set_group_by(&mut self, group_by: Vec<Expr>) -> Result<()> {
        if let (Some(clause), false) = (self.locking_clause(), group_by.is_empty()) {
            return Err(Error::LockingWithGroupBy(clause));
        }
        self.group_by = group_by;
        Ok(())
    }

    /// Re-checks every cross-clause rule, descending into CTEs, FROM and JOIN
    /// subqueries and set-operation arms. Values built through the setters
    /// always pass; deserialized values may not.
    pub fn validate(&self) -> Result<()> {
        if let (Some(clause), false) = (self.locking_clause(), self.group_by.is_empty()) {
            return Err(Error::LockingWithGroupBy(clause));
        }
        if let Some(with) = &self.with {
            for cte in with.cte_list() {
                cte.query().validate()?;
            }
        }
        for item in self.from.iter().chain(self.joins.iter().map(|join| &join.item)) {
            if let FromItem::Subquery { select, .. } = item {
                select.validate()?;
            }
        }
        if let Some(compound) = &self.compound {
            compound.select.validate()?;
        }
        Ok(())
    }

    pub fn with_clause(&self) -> Option<&WithClause> {
        self.with.as_ref()
    }

    pub fn set_with_clause(&mut self, with: Option<WithClause>) {
        self.with = with;
    }

    pub fn fetch_columns(&self) -> &[ResultColumn] {
        &self.fetch_columns
    }

    pub fn set_fetch_columns(&mut self, columns: Vec<ResultColumn>) {
        self.fetch_columns = columns;
    }

    pub fn window_functions(&self) -> &[WindowFunction] {
        &self.window_functions
    }

    pub fn set_window_functions(&mut self, functions: Vec<WindowFunction>) {
        self.window_functions = functions;
    }

    /// The last definition registered under a name wins.
    pub fn add_window_definition(&mut self, name: impl Into<String>, def: WindowDefinition) {
        self.window_definitions.insert(name.into(), def);
    }

    pub fn window_definition(&self, name: &str) -> Option<&WindowDefinition> {
        self.window_definitions.get(name)
    }

    pub fn window_definitions(&self) -> &IndexMap<String, WindowDefinition> {
        &self.window_definitions
    }

    pub fn from(&self) -> &[FromItem] {
        &self.from
    }

    pub fn set_from(&mut self, from: Vec<FromItem>) {
        self.from = from;
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn set_joins(&mut self, joins: Vec<Join>) {
        self.joins = joins;
    }

    pub fn where_clause(&self) -> Option<&Expr> {
        self.where_clause.as_ref()
    }

    pub fn set_where_clause(&mut self, predicate: Option<Expr>) {
        self.where_clause = predicate;
    }

    pub fn having(&self) -> Option<&Expr> {
        self.having.as_ref()
    }

    pub fn set_having(&mut self, predicate: Option<Expr>) {
        self.having = predicate;
    }

    pub fn order_by(&self) -> &[OrderByTerm] {
        &self.order_by
    }

    pub fn set_order_by(&mut self, terms: Vec<OrderByTerm>) {
        self.order_by = terms;
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn set_limit(&mut self, limit: Option<u64>) {
        self.limit = limit;
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    pub fn set_offset(&mut self, offset: Option<u64>) {
        self.offset = offset;
    }

    /// Appends `next` to the tail of this statement's set-operation chain.
    pub fn attach_union(&mut self, next: Select, operator: SetOperator) {
        match &mut self.compound {
            Some(compound) => compound.select.attach_union(next, operator),
            None => {
                self.compound = Some(Box::new(CompoundSelect {
                    operator,
                    select: next,
                }))
            }
        }
    }

    pub fn compound(&self) -> Option<&CompoundSelect> {
        self.compound.as_deref()
    }

    pub fn has_set_operation(&self) -> bool {
        self.compound.is_some()
    }

    /// Number of columns this statement produces, or `None` for `*`.
    pub fn column_count(&self) -> Option<usize> {
        if self
            .fetch_columns
            .iter()
            .any(|c| matches!(c, ResultColumn::Star))
        {
            return None;
        }
        Some(self.fetch_columns.len() + self.window_functions.len())
    }
}

impl Display for Select {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(with) = &self.with {
            write!(f, "{with} ")?;
        }
        write!(f, "SELECT")?;
        if let SelectModifier::Distinct { on } = &self.modifier {
            write!(f, " DISTINCT")?;
            if let Some(on) = on {
                write!(f, " ON ({on})")?;
            }
        }
        let projection = self
            .fetch_columns
            .iter()
            .map(|c| c.to_string())
            .chain(self.window_functions.iter().map(|w| w.to_string()))
            .join(", ");
        if !projection.is_empty() {
            write!(f, " {projection}")?;
        }
        if !self.from.is_empty() {
            write!(f, " FROM {}", self.from.iter().join(", "))?;
        }
        for join in &self.joins {
            write!(f, " {join}")?;
        }
        if let Some(predicate) = &self.where_clause {
            write!(f, " WHERE {predicate}")?;
        }
        if !self.group_by.is_empty() {
            write!(f, " GROUP BY {}", self.group_by.iter().join(", "))?;
        }
        if let Some(having) = &self.having {
            write!(f, " HAVING {having}")?;
        }
        if !self.window_definitions.is_empty() {
            let windows = self
                .window_definitions
                .iter()
                .map(|(name, def)| format!("{name} AS ({def})"))
                .join(", ");
            write!(f, " WINDOW {windows}")?;
        }
        if !self.order_by.is_empty() {
            write!(f, " ORDER BY {}", self.order_by.iter().join(", "))?;
        }
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {limit}")?;
        }
        if let Some(offset) = self.offset {
            write!(f, " OFFSET {offset}")?;
        }
        if let SelectModifier::Locked(clause) = &self.modifier {
            write!(f, " FOR {clause}")?;
        }
        if let Some(compound) = &self.compound {
            write!(f, " {} {}", compound.operator, compound.select)?;
        }
        Ok(())
    }
}

/// A generated SELECT with the errors it may legitimately raise.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectQuery {
    pub select: Select,
    pub expected_errors: ExpectedErrors,
}

impl SelectQuery {
    pub fn into_query(self) -> Query {
        Query {
            sql: self.select.to_string(),
            expected_errors: self.expected_errors,
            could_affect_schema: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::query::expr::{Constant, SortOrder, WindowFunctionKind, WindowSpec};

    fn base() -> Select {
        Select::simple("t0", vec![ResultColumn::Expr(Expr::column("c0"), None)])
    }

    #[test]
    fn test_locking_after_distinct_fails() {
        let mut select = base();
        select.set_select_option(SelectType::Distinct).unwrap();
        let err = select
            .set_locking_clause(Some(LockingClause::Update))
            .unwrap_err();
        assert_eq!(err, Error::LockingWithDistinct(LockingClause::Update));
        assert!(err.is_invariant_violation());
        assert_eq!(select.locking_clause(), None);
        assert_eq!(select.select_option(), SelectType::Distinct);
    }

    #[test]
    fn test_distinct_after_locking_fails() {
        let mut select = base();
        select
            .set_locking_clause(Some(LockingClause::KeyShare))
            .unwrap();
        assert!(select.set_select_option(SelectType::Distinct).is_err());
        assert_eq!(select.locking_clause(), Some(LockingClause::KeyShare));
    }

    #[test]
    fn test_all_and_locking_commute() {
        let mut select = base();
        select.set_locking_clause(Some(LockingClause::Share)).unwrap();
        select.set_select_option(SelectType::All).unwrap();
        assert_eq!(select.locking_clause(), Some(LockingClause::Share));

        let mut select = base();
        select.set_select_option(SelectType::All).unwrap();
        select.set_locking_clause(Some(LockingClause::Share)).unwrap();
        assert_eq!(select.to_string(), "SELECT c0 FROM t0 FOR SHARE");
    }

    #[test]
    fn test_locking_and_group_by_exclusive() {
        let mut select = base();
        select.set_group_by(vec![Expr::column("c0")]).unwrap();
        assert_eq!(
            select.set_locking_clause(Some(LockingClause::NoKeyUpdate)),
            Err(Error::LockingWithGroupBy(LockingClause::NoKeyUpdate))
        );

        let mut select = base();
        select.set_locking_clause(Some(LockingClause::Update)).unwrap();
        assert!(select.set_group_by(vec![Expr::column("c0")]).is_err());
        // clearing the group by list is always allowed
        select.set_group_by(vec![]).unwrap();
    }

    #[test]
    fn test_clearing_locking_clause() {
        let mut select = base();
        select.set_locking_clause(Some(LockingClause::Update)).unwrap();
        select.set_locking_clause(None).unwrap();
        select.set_select_option(SelectType::Distinct).unwrap();
        assert_eq!(select.to_string(), "SELECT DISTINCT c0 FROM t0");
    }

    #[test]
    fn test_distinct_on_requires_distinct() {
        let mut select = base();
        assert_eq!(
            select.set_distinct_on(Expr::column("c0")),
            Err(Error::DistinctOnWithoutDistinct)
        );
        select.set_select_option(SelectType::Distinct).unwrap();
        select.set_distinct_on(Expr::column("c0")).unwrap();
        assert_eq!(select.to_string(), "SELECT DISTINCT ON (c0) c0 FROM t0");

        select.set_select_option(SelectType::All).unwrap();
        assert!(select.distinct_on().is_none());
    }

    #[test]
    fn test_window_definitions_last_writer_wins() {
        let mut select = base();
        assert!(select.window_definition("w0").is_none());
        select.add_window_definition("w0", WindowDefinition::default());
        let def = WindowDefinition {
            partition_by: vec![Expr::column("c0")],
            order_by: vec![],
            frame: None,
        };
        select.add_window_definition("w0", def.clone());
        assert_eq!(select.window_definition("w0"), Some(&def));
        assert_eq!(select.window_definitions().len(), 1);
    }

    #[test]
    fn test_full_render_order() {
        let mut select = base();
        select.set_window_functions(vec![WindowFunction {
            kind: WindowFunctionKind::Rank,
            argument: None,
            window: WindowSpec::Named("w".into()),
        }]);
        select.add_window_definition(
            "w",
            WindowDefinition {
                partition_by: vec![Expr::column("c0")],
                order_by: vec![OrderByTerm::new(Expr::column("c1"))],
                frame: Some(WindowFrame {
                    mode: FrameMode::Rows,
                    start: FrameBound::Preceding(2),
                    end: Some(FrameBound::CurrentRow),
                    exclusion: Some(FrameExclusion::Ties),
                }),
            },
        );
        select.set_where_clause(Some(Expr::true_()));
        select.set_order_by(vec![OrderByTerm {
            expr: Expr::column("c0"),
            order: Some(SortOrder::Asc),
            nulls: None,
        }]);
        select.set_limit(Some(10));
        select.set_offset(Some(2));
        assert_eq!(
            select.to_string(),
            "SELECT c0, RANK() OVER w FROM t0 WHERE TRUE \
             WINDOW w AS (PARTITION BY c0 ORDER BY c1 ROWS BETWEEN 2 PRECEDING AND CURRENT ROW EXCLUDE TIES) \
             ORDER BY c0 ASC LIMIT 10 OFFSET 2"
        );
    }

    #[test]
    fn test_joins_render() {
        let mut select = base();
        select.set_joins(vec![
            Join {
                kind: JoinKind::Left,
                item: FromItem::table("t1"),
                on: Some(Expr::binary(
                    Expr::qualified_column("t0", "c0"),
                    crate::model::query::expr::BinaryOperator::Equals,
                    Expr::qualified_column("t1", "c0"),
                )),
            },
            Join {
                kind: JoinKind::Cross,
                item: FromItem::Table {
                    name: "t2".into(),
                    only: true,
                    alias: Some("x".into()),
                },
                on: None,
            },
        ]);
        assert_eq!(
            select.to_string(),
            "SELECT c0 FROM t0 LEFT OUTER JOIN t1 ON ((t0.c0) = (t1.c0)) CROSS JOIN ONLY t2 AS x"
        );
    }

    #[test]
    fn test_union_chain_appends_at_tail() {
        let mut select = base();
        select.attach_union(base(), SetOperator::Union);
        let mut third = base();
        third.set_where_clause(Some(Expr::Constant(Constant::Boolean(false))));
        select.attach_union(third, SetOperator::Except);
        assert_eq!(
            select.to_string(),
            "SELECT c0 FROM t0 UNION SELECT c0 FROM t0 EXCEPT SELECT c0 FROM t0 WHERE FALSE"
        );
        assert_eq!(select.compound().unwrap().operator, SetOperator::Union);
    }

    #[test]
    fn test_render_is_idempotent() {
        let mut select = base();
        select.set_select_option(SelectType::Distinct).unwrap();
        select.set_distinct_on(Expr::column("c0")).unwrap();
        select.attach_union(base(), SetOperator::UnionAll);
        assert_eq!(select.to_string(), select.to_string());
    }

    #[test]
    fn test_validate_rejects_deserialized_locking_with_group_by() {
        let mut select = base();
        select.set_group_by(vec![Expr::column("c0")]).unwrap();
        let mut value = serde_json::to_value(&select).unwrap();
        value["modifier"] = serde_json::json!({ "Locked": "Update" });
        let tampered: Select = serde_json::from_value(value).unwrap();
        assert_eq!(
            tampered.validate(),
            Err(Error::LockingWithGroupBy(LockingClause::Update))
        );
        assert!(select.validate().is_ok());
    }

    #[test]
    fn test_validate_descends_into_subqueries() {
        let mut inner = Select::simple("t0", vec![ResultColumn::Star]);
        inner.set_group_by(vec![Expr::column("c0")]).unwrap();
        let mut value = serde_json::to_value(&inner).unwrap();
        value["modifier"] = serde_json::json!({ "Locked": "Update" });
        let tampered: Select = serde_json::from_value(value).unwrap();

        let mut outer = Select::new();
        outer.set_from(vec![FromItem::Subquery {
            select: Box::new(tampered.clone()),
            alias: "s".to_string(),
        }]);
        assert_eq!(
            outer.validate(),
            Err(Error::LockingWithGroupBy(LockingClause::Update))
        );

        let mut joined = base();
        joined.set_joins(vec![Join {
            kind: JoinKind::Cross,
            item: FromItem::Subquery {
                select: Box::new(tampered),
                alias: "s".to_string(),
            },
            on: None,
        }]);
        assert!(joined.validate().is_err());

        let mut clean = Select::new();
        clean.set_from(vec![FromItem::Subquery {
            select: Box::new(inner),
            alias: "s".to_string(),
        }]);
        assert!(clean.validate().is_ok());
    }

    #[test]
    fn test_column_count() {
        let mut select = base();
        assert_eq!(select.column_count(), Some(1));
        select.set_fetch_columns(vec![ResultColumn::Star]);
        assert_eq!(select.column_count(), None);
    }
}
