use rand::Rng;
use strum::IntoEnumIterator;

use crate::generation::{pick, ArbitraryFrom, GenerationContext};
use crate::model::query::expr::{BinaryOperator, Constant, Expr, PostfixOperator};
use crate::model::table::{Column, ColumnType};

/// A column visible to an expression, with the name of the FROM item that
/// provides it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeColumn {
    pub source: String,
    pub column: Column,
}

impl ScopeColumn {
    pub fn new(source: impl Into<String>, column: Column) -> Self {
        Self {
            source: source.into(),
            column,
        }
    }

    pub fn to_expr(&self) -> Expr {
        Expr::qualified_column(&self.source, &self.column.name)
    }
}

/// A boolean predicate over `columns`, nested at most `max_predicate_depth`
/// connectives deep.
impl ArbitraryFrom<&[ScopeColumn]> for Expr {
    fn arbitrary_from<R: Rng + ?Sized, C: GenerationContext>(
        rng: &mut R,
        context: &C,
        columns: &[ScopeColumn],
    ) -> Self {
        let depth = context.opts().query.max_predicate_depth;
        predicate(rng, context, columns, depth)
    }
}

fn predicate<R: Rng + ?Sized, C: GenerationContext>(
    rng: &mut R,
    context: &C,
    columns: &[ScopeColumn],
    depth: usize,
) -> Expr {
    if depth == 0 || rng.random_bool(0.6) {
        return leaf(rng, context, columns);
    }
    match rng.random_range(0..3) {
        0 => Expr::and(
            predicate(rng, context, columns, depth - 1),
            predicate(rng, context, columns, depth - 1),
        ),
        1 => Expr::or(
            predicate(rng, context, columns, depth - 1),
            predicate(rng, context, columns, depth - 1),
        ),
        _ => Expr::not(predicate(rng, context, columns, depth - 1)),
    }
}

fn leaf<R: Rng + ?Sized, C: GenerationContext>(
    rng: &mut R,
    context: &C,
    columns: &[ScopeColumn],
) -> Expr {
    if columns.is_empty() {
        return Expr::Constant(Constant::Boolean(rng.random_bool(0.5)));
    }
    let target = pick(columns, rng);
    let column_type = target.column.column_type;
    match rng.random_range(0..3) {
        0 => {
            let op = if rng.random_bool(0.5) {
                PostfixOperator::IsNull
            } else {
                PostfixOperator::IsNotNull
            };
            Expr::Postfix(Box::new(target.to_expr()), op)
        }
        1 if column_type == ColumnType::Boolean => {
            let op = if rng.random_bool(0.5) {
                PostfixOperator::IsTrue
            } else {
                PostfixOperator::IsNotTrue
            };
            Expr::Postfix(Box::new(target.to_expr()), op)
        }
        _ => {
            let operators: Vec<_> = BinaryOperator::iter()
                .filter(|op| op.is_comparison())
                .filter(|op| {
                    column_type.is_orderable()
                        || matches!(
                            op,
                            BinaryOperator::Equals
                                | BinaryOperator::NotEquals
                                | BinaryOperator::IsDistinctFrom
                        )
                })
                .collect();
            let op = *pick(&operators, rng);
            // same-typed columns compare against each other, everything else against a literal
            let same_typed: Vec<_> = columns
                .iter()
                .filter(|c| c.column.column_type == column_type && c != &target)
                .collect();
            let rhs = if !same_typed.is_empty() && rng.random_bool(0.3) {
                pick(&same_typed, rng).to_expr()
            } else {
                Expr::Constant(Constant::arbitrary_from(rng, context, column_type))
            };
            Expr::binary(target.to_expr(), op, rhs)
        }
    }
}
