use std::fmt::Display;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::model::query::select::WindowDefinition;
use crate::model::table::ColumnType;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Constant {
    Null,
    Integer(i64),
    Boolean(bool),
    Text(String),
    Float(f64),
    /// A string literal cast to `ty`, e.g. `'[1,5)'::int4range`.
    Typed { literal: String, ty: ColumnType },
}

impl Display for Constant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Constant::Null => write!(f, "NULL"),
            Constant::Integer(i) => write!(f, "{i}"),
            Constant::Boolean(true) => write!(f, "TRUE"),
            Constant::Boolean(false) => write!(f, "FALSE"),
            Constant::Text(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Constant::Float(v) => write!(f, "{v:?}"),
            Constant::Typed { literal, ty } => {
                write!(f, "'{}'::{ty}", literal.replace('\'', "''"))
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOperator {
    Not,
    Minus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostfixOperator {
    IsNull,
    IsNotNull,
    IsTrue,
    IsNotTrue,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::EnumIter)]
pub enum BinaryOperator {
    Equals,
    NotEquals,
    Less,
    LessEquals,
    Greater,
    GreaterEquals,
    IsDistinctFrom,
    And,
    Or,
}

impl BinaryOperator {
    pub fn is_comparison(&self) -> bool {
        !matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Equals => "=",
            BinaryOperator::NotEquals => "<>",
            BinaryOperator::Less => "<",
            BinaryOperator::LessEquals => "<=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterEquals => ">=",
            BinaryOperator::IsDistinctFrom => "IS DISTINCT FROM",
            BinaryOperator::And => "AND",
            BinaryOperator::Or => "OR",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::EnumIter)]
pub enum WindowFunctionKind {
    RowNumber,
    Rank,
    DenseRank,
    Count,
    Sum,
    Min,
    Max,
}

impl WindowFunctionKind {
    /// Ranking functions take no argument.
    pub fn takes_argument(&self) -> bool {
        !matches!(
            self,
            WindowFunctionKind::RowNumber | WindowFunctionKind::Rank | WindowFunctionKind::DenseRank
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            WindowFunctionKind::RowNumber => "ROW_NUMBER",
            WindowFunctionKind::Rank => "RANK",
            WindowFunctionKind::DenseRank => "DENSE_RANK",
            WindowFunctionKind::Count => "COUNT",
            WindowFunctionKind::Sum => "SUM",
            WindowFunctionKind::Min => "MIN",
            WindowFunctionKind::Max => "MAX",
        }
    }
}

/// The `OVER` target of a window function.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum WindowSpec {
    /// Refers to a definition in the statement's `WINDOW` clause.
    Named(String),
    Inline(WindowDefinition),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindowFunction {
    pub kind: WindowFunctionKind,
    pub argument: Option<Box<Expr>>,
    pub window: WindowSpec,
}

impl Display for WindowFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.kind.name())?;
        if let Some(arg) = &self.argument {
            write!(f, "{arg}")?;
        }
        write!(f, ") OVER ")?;
        match &self.window {
            WindowSpec::Named(name) => write!(f, "{name}"),
            WindowSpec::Inline(def) => write!(f, "({def})"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Column {
        table: Option<String>,
        name: String,
    },
    Constant(Constant),
    Unary(UnaryOperator, Box<Expr>),
    Postfix(Box<Expr>, PostfixOperator),
    Binary(Box<Expr>, BinaryOperator, Box<Expr>),
    Cast(Box<Expr>, ColumnType),
    FunctionCall {
        name: String,
        args: Vec<Expr>,
    },
    WindowFunction(WindowFunction),
}

impl Expr {
    pub fn column(name: impl Into<String>) -> Self {
        Expr::Column {
            table: None,
            name: name.into(),
        }
    }

    pub fn qualified_column(table: impl Into<String>, name: impl Into<String>) -> Self {
        Expr::Column {
            table: Some(table.into()),
            name: name.into(),
        }
    }

    pub fn true_() -> Self {
        Expr::Constant(Constant::Boolean(true))
    }

    pub fn binary(lhs: Expr, op: BinaryOperator, rhs: Expr) -> Self {
        Expr::Binary(Box::new(lhs), op, Box::new(rhs))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(expr: Expr) -> Self {
        Expr::Unary(UnaryOperator::Not, Box::new(expr))
    }

    pub fn and(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(lhs, BinaryOperator::And, rhs)
    }

    pub fn or(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(lhs, BinaryOperator::Or, rhs)
    }

    pub fn is_window_function(&self) -> bool {
        matches!(self, Expr::WindowFunction(_))
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Column {
                table: Some(table),
                name,
            } => write!(f, "{table}.{name}"),
            Expr::Column { table: None, name } => write!(f, "{name}"),
            Expr::Constant(c) => write!(f, "{c}"),
            Expr::Unary(UnaryOperator::Not, expr) => write!(f, "(NOT {expr})"),
            Expr::Unary(UnaryOperator::Minus, expr) => write!(f, "(- {expr})"),
            Expr::Postfix(expr, op) => {
                let op = match op {
                    PostfixOperator::IsNull => "IS NULL",
                    PostfixOperator::IsNotNull => "IS NOT NULL",
                    PostfixOperator::IsTrue => "IS TRUE",
                    PostfixOperator::IsNotTrue => "IS NOT TRUE",
                };
                write!(f, "(({expr}) {op})")
            }
            Expr::Binary(lhs, op, rhs) => write!(f, "(({lhs}) {} ({rhs}))", op.as_str()),
            Expr::Cast(expr, ty) => write!(f, "CAST(({expr}) AS {ty})"),
            Expr::FunctionCall { name, args } => {
                write!(f, "{name}({})", args.iter().join(", "))
            }
            Expr::WindowFunction(func) => write!(f, "{func}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NullsOrder {
    First,
    Last,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderByTerm {
    pub expr: Expr,
    pub order: Option<SortOrder>,
    pub nulls: Option<NullsOrder>,
}

impl OrderByTerm {
    pub fn new(expr: Expr) -> Self {
        Self {
            expr,
            order: None,
            nulls: None,
        }
    }
}

impl Display for OrderByTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.expr)?;
        match self.order {
            Some(SortOrder::Asc) => write!(f, " ASC")?,
            Some(SortOrder::Desc) => write!(f, " DESC")?,
            None => {}
        }
        match self.nulls {
            Some(NullsOrder::First) => write!(f, " NULLS FIRST"),
            Some(NullsOrder::Last) => write!(f, " NULLS LAST"),
            None => Ok(()),
        }
    }
}
