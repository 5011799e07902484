use rand::Rng;
use strum::IntoEnumIterator;
use tracing::debug;

use crate::errors::Result;
use crate::generation::{
    nonempty_subset, pick, pick_maybe, small_number, ArbitraryFrom, GenerationContext,
    ScopeColumn, TryArbitrary,
};
use crate::model::expected_errors::{ExpectedErrors, SELECT_ERRORS};
use crate::model::query::cte::{Cte, WithClause};
use crate::model::query::expr::{
    Expr, NullsOrder, OrderByTerm, SortOrder, WindowFunction, WindowFunctionKind, WindowSpec,
};
use crate::model::query::select::{
    FrameBound, FrameMode, FromItem, Join, JoinKind, LockingClause, ResultColumn, Select,
    SelectQuery, SelectType, SetOperator, WindowDefinition, WindowFrame,
};
use crate::model::table::{Column, Table};

/// Something a FROM clause can read: a schema table or a CTE.
#[derive(Debug, Clone)]
struct Source {
    name: String,
    columns: Vec<Column>,
    is_cte: bool,
}

impl Source {
    fn from_table(table: &Table) -> Self {
        Self {
            name: table.name.clone(),
            columns: table.columns.clone(),
            is_cte: false,
        }
    }

    fn from_item<R: Rng + ?Sized>(&self, rng: &mut R) -> FromItem {
        FromItem::Table {
            name: self.name.clone(),
            only: !self.is_cte && rng.random_bool(0.1),
            alias: None,
        }
    }

    fn scope(&self) -> impl Iterator<Item = ScopeColumn> + '_ {
        self.columns
            .iter()
            .map(|c| ScopeColumn::new(&self.name, c.clone()))
    }
}

/// Wraps a plain SELECT over a schema table as `cte<i>`. The pseudo-table it
/// exposes uses the alias names when aliases are given.
fn arbitrary_cte<R: Rng + ?Sized, C: GenerationContext>(
    rng: &mut R,
    context: &C,
    index: usize,
) -> Result<Option<(Cte, Source)>> {
    let Some(table) = pick_maybe(context.tables(), rng) else {
        return Ok(None);
    };
    let columns = nonempty_subset(&table.columns, rng);
    if columns.is_empty() {
        return Ok(None);
    }
    let name = format!("cte{index}");

    let projection = columns
        .iter()
        .map(|c| ResultColumn::Expr(Expr::qualified_column(&table.name, &c.name), None))
        .collect();
    let mut query = Select::simple(&table.name, projection);
    if rng.random_bool(context.opts().query.where_prob) {
        let scope: Vec<_> = Source::from_table(table).scope().collect();
        query.set_where_clause(Some(Expr::arbitrary_from(rng, context, scope.as_slice())));
    }

    let aliases: Vec<String> = if rng.random_bool(0.5) {
        (0..columns.len()).map(|i| format!("a{i}")).collect()
    } else {
        Vec::new()
    };
    let exposed = columns
        .iter()
        .enumerate()
        .map(|(i, c)| match aliases.get(i) {
            Some(alias) => Column {
                name: alias.clone(),
                ..c.clone()
            },
            None => c.clone(),
        })
        .collect();

    let cte = Cte::builder()
        .name(&name)
        .column_aliases(aliases)
        .query(query)
        .columns(columns)
        .build()?;
    Ok(Some((
        cte,
        Source {
            name,
            columns: exposed,
            is_cte: true,
        },
    )))
}

fn window_definition<R: Rng + ?Sized>(rng: &mut R, scope: &[ScopeColumn]) -> WindowDefinition {
    let mut def = WindowDefinition::default();
    if let (Some(column), true) = (pick_maybe(scope, rng), rng.random_bool(0.5)) {
        def.partition_by.push(column.to_expr());
    }
    let orderable: Vec<_> = scope
        .iter()
        .filter(|c| c.column.column_type.is_orderable())
        .collect();
    if let (Some(column), true) = (pick_maybe(&orderable, rng), rng.random_bool(0.5)) {
        def.order_by.push(OrderByTerm::new(column.to_expr()));
    }
    if rng.random_bool(0.3) {
        def.frame = Some(WindowFrame {
            mode: FrameMode::Rows,
            start: if rng.random_bool(0.5) {
                FrameBound::UnboundedPreceding
            } else {
                FrameBound::Preceding(rng.random_range(0..5))
            },
            end: Some(FrameBound::CurrentRow),
            exclusion: None,
        });
    }
    def
}

fn window_function<R: Rng + ?Sized>(
    rng: &mut R,
    scope: &[ScopeColumn],
    window: WindowSpec,
) -> WindowFunction {
    let kinds: Vec<_> = WindowFunctionKind::iter().collect();
    let kind = *pick(&kinds, rng);
    let eligible: Vec<_> = scope
        .iter()
        .filter(|c| match kind {
            WindowFunctionKind::Sum => c.column.column_type.is_numeric_family(),
            WindowFunctionKind::Min | WindowFunctionKind::Max => {
                c.column.column_type.is_orderable()
            }
            _ => true,
        })
        .collect();
    match (kind.takes_argument(), pick_maybe(&eligible, rng)) {
        (false, _) => WindowFunction {
            kind,
            argument: None,
            window,
        },
        (true, Some(column)) => WindowFunction {
            kind,
            argument: Some(Box::new(column.to_expr())),
            window,
        },
        (true, None) => WindowFunction {
            kind: WindowFunctionKind::RowNumber,
            argument: None,
            window,
        },
    }
}

impl TryArbitrary for Select {
    fn try_arbitrary<R: Rng + ?Sized, C: GenerationContext>(
        rng: &mut R,
        context: &C,
    ) -> Result<Self> {
        let opts = &context.opts().query;
        let mut select = Select::new();

        let Some(base_table) = pick_maybe(context.tables(), rng) else {
            let no_columns: &[ScopeColumn] = &[];
            select.set_fetch_columns(vec![ResultColumn::Expr(
                Expr::arbitrary_from(rng, context, no_columns),
                None,
            )]);
            return Ok(select);
        };

        let mut sources = context
            .tables()
            .iter()
            .map(Source::from_table)
            .collect::<Vec<_>>();
        let mut base = Source::from_table(base_table);

        if rng.random_bool(opts.with_prob) {
            let count = 1 + small_number(rng, opts.max_ctes.saturating_sub(1));
            let mut ctes = Vec::with_capacity(count);
            for i in 0..count {
                if let Some((cte, source)) = arbitrary_cte(rng, context, i)? {
                    ctes.push(cte);
                    sources.push(source);
                }
            }
            if !ctes.is_empty() {
                if rng.random_bool(0.5) {
                    if let Some(cte_source) = sources.iter().rev().find(|s| s.is_cte) {
                        base = cte_source.clone();
                    }
                }
                select.set_with_clause(Some(WithClause::new(ctes)?));
            }
        }

        let set_operation = rng.random_bool(opts.set_operation_prob);
        let mut scope: Vec<ScopeColumn> = base.scope().collect();
        let mut reads_cte = base.is_cte;
        let mut outer_join = false;
        select.set_from(vec![base.from_item(rng)]);

        let others: Vec<_> = sources.iter().filter(|s| s.name != base.name).collect();
        if let (Some(other), true) = (pick_maybe(&others, rng), rng.random_bool(opts.join_prob)) {
            let kinds: Vec<_> = JoinKind::iter().collect();
            let kind = *pick(&kinds, rng);
            scope.extend(other.scope());
            let on = (kind != JoinKind::Cross)
                .then(|| Expr::arbitrary_from(rng, context, scope.as_slice()));
            select.set_joins(vec![Join {
                kind,
                item: other.from_item(rng),
                on,
            }]);
            reads_cte |= other.is_cte;
            outer_join = kind.is_outer();
        }

        let projected: Vec<ScopeColumn> = nonempty_subset(&scope, rng);
        select.set_fetch_columns(
            projected
                .iter()
                .map(|c| ResultColumn::Expr(c.to_expr(), None))
                .collect(),
        );

        if rng.random_bool(opts.where_prob) {
            select.set_where_clause(Some(Expr::arbitrary_from(rng, context, scope.as_slice())));
        }

        let mut order_by = Vec::new();
        if rng.random_bool(opts.distinct_prob) {
            select.set_select_option(SelectType::Distinct)?;
            let orderable: Vec<_> = projected
                .iter()
                .filter(|c| c.column.column_type.is_orderable())
                .collect();
            if let (Some(column), true) = (
                pick_maybe(&orderable, rng),
                rng.random_bool(opts.distinct_on_prob),
            ) {
                select.set_distinct_on(column.to_expr())?;
                // DISTINCT ON must match the leading ORDER BY term
                order_by.push(OrderByTerm::new(column.to_expr()));
            }
        }

        let grouped = select.select_option() == SelectType::All
            && rng.random_bool(opts.group_by_prob);
        if grouped {
            select.set_group_by(projected.iter().map(ScopeColumn::to_expr).collect())?;
            if rng.random_bool(opts.having_prob) {
                select.set_having(Some(Expr::arbitrary_from(
                    rng,
                    context,
                    projected.as_slice(),
                )));
            }
        } else if rng.random_bool(opts.window_prob) {
            let count = 1 + small_number(rng, 1);
            let named = rng.random_bool(opts.named_window_prob);
            let functions = (0..count)
                .map(|i| {
                    let def = window_definition(rng, &scope);
                    let window = if named {
                        let name = format!("w{i}");
                        select.add_window_definition(&name, def);
                        WindowSpec::Named(name)
                    } else {
                        WindowSpec::Inline(def)
                    };
                    window_function(rng, &scope, window)
                })
                .collect();
            select.set_window_functions(functions);
        }

        if !set_operation {
            let extra = small_number(rng, 2);
            if !order_by.is_empty() || rng.random_bool(opts.order_by_prob) {
                let orderable: Vec<_> = projected
                    .iter()
                    .filter(|c| c.column.column_type.is_orderable())
                    .collect();
                for _ in 0..extra {
                    let Some(column) = pick_maybe(&orderable, rng) else {
                        break;
                    };
                    order_by.push(OrderByTerm {
                        expr: column.to_expr(),
                        order: rng
                            .random_bool(0.5)
                            .then(|| *pick(&[SortOrder::Asc, SortOrder::Desc], rng)),
                        nulls: rng
                            .random_bool(0.3)
                            .then(|| *pick(&[NullsOrder::First, NullsOrder::Last], rng)),
                    });
                }
            }
            select.set_order_by(order_by);
            if rng.random_bool(opts.limit_prob) {
                select.set_limit(Some(rng.random_range(0..=opts.max_limit)));
                if rng.random_bool(0.5) {
                    select.set_offset(Some(rng.random_range(0..=opts.max_limit)));
                }
            }
        }

        let lockable = select.select_option() == SelectType::All
            && select.group_by().is_empty()
            && select.window_functions().is_empty()
            && !outer_join
            && !set_operation
            && !reads_cte;
        if lockable && rng.random_bool(opts.locking_prob) {
            let clauses: Vec<_> = LockingClause::iter().collect();
            select.set_locking_clause(Some(*pick(&clauses, rng)))?;
        }

        if set_operation {
            let mut arm = Select::new();
            arm.set_fetch_columns(select.fetch_columns().to_vec());
            arm.set_window_functions(select.window_functions().to_vec());
            for (name, def) in select.window_definitions() {
                arm.add_window_definition(name, def.clone());
            }
            arm.set_from(select.from().to_vec());
            arm.set_joins(select.joins().to_vec());
            if rng.random_bool(opts.where_prob) {
                arm.set_where_clause(Some(Expr::arbitrary_from(rng, context, scope.as_slice())));
            }
            let operators: Vec<_> = SetOperator::iter().collect();
            select.attach_union(arm, *pick(&operators, rng));
        }

        debug!(
            base = %base.name,
            columns = projected.len(),
            distinct = select.select_option() == SelectType::Distinct,
            grouped,
            locking = ?select.locking_clause(),
            set_operation,
            "generated select"
        );
        Ok(select)
    }
}

impl TryArbitrary for SelectQuery {
    fn try_arbitrary<R: Rng + ?Sized, C: GenerationContext>(
        rng: &mut R,
        context: &C,
    ) -> Result<Self> {
        let select = Select::try_arbitrary(rng, context)?;
        let mut expected_errors = ExpectedErrors::new();
        expected_errors.add_common_expression_errors();
        expected_errors.add_all(SELECT_ERRORS.iter().copied());
        Ok(SelectQuery {
            select,
            expected_errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::generation::{Opts, SchemaContext};
    use crate::model::table::{ColumnType, Schema};

    fn schema() -> Schema {
        Schema::new()
            .add_table(Table::new(
                "t0",
                vec![
                    Column::new("c0", ColumnType::Int),
                    Column::new("c1", ColumnType::Text),
                    Column::new("c2", ColumnType::Boolean),
                ],
            ))
            .add_table(Table::new(
                "t1",
                vec![
                    Column::new("c0", ColumnType::Decimal),
                    Column::new("c1", ColumnType::Range),
                ],
            ))
    }

    #[test]
    fn test_empty_schema_selects_a_constant() {
        let schema = Schema::new();
        let opts = Opts::default();
        let context = SchemaContext::new(&schema, &opts);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let select = Select::try_arbitrary(&mut rng, &context).unwrap();
        assert!(select.from().is_empty());
        assert!(select.to_string().starts_with("SELECT "));
    }

    #[test]
    fn test_generated_selects_hold_invariants() {
        let schema = schema();
        let mut opts = Opts::default();
        opts.query.with_prob = 0.5;
        opts.query.locking_prob = 0.8;
        opts.query.set_operation_prob = 0.3;
        let context = SchemaContext::new(&schema, &opts);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..500 {
            let select = Select::try_arbitrary(&mut rng, &context).unwrap();
            select.validate().unwrap();
            if let Some(clause) = select.locking_clause() {
                assert!(select.group_by().is_empty());
                assert!(select.with_clause().is_none() || select.from().iter().all(|f| {
                    !matches!(f, FromItem::Table { name, .. } if name.starts_with("cte"))
                }), "locking on a CTE: {select}");
                assert!(!select.has_set_operation());
                assert!(select.to_string().contains(&format!("FOR {clause}")));
            }
            if let (Some(on), false) = (select.distinct_on(), select.has_set_operation()) {
                assert_eq!(select.order_by().first().map(|t| &t.expr), Some(on));
            }
            if let Some(compound) = select.compound() {
                assert!(select.order_by().is_empty());
                assert_eq!(compound.select.column_count(), select.column_count());
            }
        }
    }

    #[test]
    fn test_select_query_registers_errors() {
        let schema = schema();
        let opts = Opts::default();
        let context = SchemaContext::new(&schema, &opts);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let query = SelectQuery::try_arbitrary(&mut rng, &context)
            .unwrap()
            .into_query();
        assert!(!query.could_affect_schema);
        assert!(query.is_expected_error("ERROR: division by zero"));
        assert!(query.is_expected_error(
            "FOR UPDATE cannot be applied to the nullable side of an outer join"
        ));
    }
}
