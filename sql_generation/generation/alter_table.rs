use rand::Rng;
use strum::IntoEnumIterator;
use tracing::{debug, trace};

use crate::generation::{
    nonempty_subset, pick, pick_maybe, small_number, subset, Arbitrary, ArbitraryFromMaybe,
    GenerationContext,
};
use crate::model::expected_errors::{ExpectedErrors, ALTER_TABLE_ERRORS};
use crate::model::query::alter_table::{
    AlterTable, AlterTableAction, AlterTableActionKind, AlterTableFragment, AlterTableQuery,
    ConstraintKind, DropBehavior, OwnerRole, ReplicaIdentity, RowLevelSecurity, StorageMode,
};
use crate::model::table::{Column, ColumnType, Table};

/// Removes the actions `table` cannot take and adds the identity group when
/// a sampled column is an integer.
fn prune_actions<R: Rng + ?Sized>(
    rng: &mut R,
    actions: &mut Vec<AlterTableActionKind>,
    table: &Table,
) {
    actions.retain(|kind| kind.is_supported());
    if table.columns.len() <= 1 {
        actions.retain(|kind| *kind != AlterTableActionKind::DropColumn);
    }
    if !table.has_indexes() {
        actions.retain(|kind| !kind.requires_index());
    }
    if !table.has_integer_column() {
        actions.retain(|kind| !kind.is_identity());
        return;
    }
    let sampled = pick(&table.columns, rng);
    if sampled.column_type.is_integer() {
        for kind in AlterTableActionKind::iter().filter(|kind| kind.is_identity()) {
            if !actions.contains(&kind) {
                actions.push(kind);
            }
        }
    }
}

fn index_name<R: Rng + ?Sized>(rng: &mut R, table: &Table) -> Option<String> {
    pick_maybe(&table.indexes, rng).map(|index| index.name.clone())
}

fn constraint_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("c{}", rng.random::<i64>().unsigned_abs())
}

/// Renders one action against `table`, resampling whatever column it
/// touches. `None` when the table offers no valid target.
impl ArbitraryFromMaybe<(&Table, AlterTableActionKind)> for AlterTableAction {
    fn arbitrary_from_maybe<R: Rng + ?Sized, C: GenerationContext>(
        rng: &mut R,
        context: &C,
        (table, kind): (&Table, AlterTableActionKind),
    ) -> Option<Self> {
        use AlterTableActionKind as Kind;

        let column = |rng: &mut R| -> Option<Column> { pick_maybe(&table.columns, rng).cloned() };

        let action = match kind {
            Kind::DropColumn => {
                let if_exists = rng.random_bool(0.5);
                let column = column(rng)?;
                let behavior = rng
                    .random_bool(0.5)
                    .then(|| *pick(&[DropBehavior::Restrict, DropBehavior::Cascade], rng));
                AlterTableAction::DropColumn {
                    if_exists,
                    column: column.name,
                    behavior,
                }
            }
            Kind::AlterColumnType => {
                let column = column(rng)?;
                AlterTableAction::AlterColumnType {
                    column: column.name,
                    set_data: rng.random_bool(0.5),
                    data_type: ColumnType::arbitrary(rng, context),
                }
            }
            Kind::AlterColumnSetDropDefault => {
                let column = column(rng)?;
                AlterTableAction::ColumnDefault {
                    column: column.name,
                    default: rng
                        .random_bool(0.5)
                        .then(|| i64::from(rng.random::<i32>())),
                }
            }
            Kind::AlterColumnSetDropNull => {
                let column = column(rng)?;
                AlterTableAction::ColumnNotNull {
                    column: column.name,
                    not_null: rng.random_bool(0.5),
                }
            }
            Kind::AlterColumnSetStatistics => {
                let column = column(rng)?;
                AlterTableAction::SetStatistics {
                    column: column.name,
                    target: rng.random_range(-1..=10000),
                }
            }
            Kind::AlterColumnSetAttributeOption => {
                let column = column(rng)?;
                AlterTableAction::SetAttributeOption {
                    column: column.name,
                    n_distinct: rng.random::<f64>() * 2.0 - 1.0,
                }
            }
            Kind::AlterColumnResetAttributeOption => {
                let column = column(rng)?;
                AlterTableAction::ResetAttributeOption {
                    column: column.name,
                }
            }
            Kind::AlterColumnSetStorage => {
                let column = column(rng)?;
                let storage = if column.column_type.is_numeric_family() {
                    StorageMode::Plain
                } else {
                    let modes: Vec<_> = StorageMode::iter().collect();
                    *pick(&modes, rng)
                };
                AlterTableAction::SetStorage {
                    column: column.name,
                    storage,
                }
            }
            Kind::AddTableConstraint => AlterTableAction::AddCheckConstraint {
                name: constraint_name(rng),
            },
            Kind::AddTableConstraintUsingIndex => {
                let index = index_name(rng, table)?;
                AlterTableAction::AddConstraintUsingIndex {
                    name: constraint_name(rng),
                    kind: *pick(&[ConstraintKind::Unique, ConstraintKind::PrimaryKey], rng),
                    index,
                }
            }
            Kind::ValidateConstraint => AlterTableAction::ValidateConstraint {
                name: "asdf".to_string(),
            },
            Kind::DisableRowLevelSecurity => {
                AlterTableAction::RowLevelSecurity(RowLevelSecurity::Disable)
            }
            Kind::EnableRowLevelSecurity => {
                AlterTableAction::RowLevelSecurity(RowLevelSecurity::Enable)
            }
            Kind::ForceRowLevelSecurity => AlterTableAction::RowLevelSecurity(RowLevelSecurity::Force),
            Kind::NoForceRowLevelSecurity => {
                AlterTableAction::RowLevelSecurity(RowLevelSecurity::NoForce)
            }
            Kind::ClusterOn => AlterTableAction::ClusterOn {
                index: index_name(rng, table)?,
            },
            Kind::SetWithoutCluster => AlterTableAction::SetWithoutCluster,
            Kind::SetWithOids => return None,
            Kind::SetWithoutOids => AlterTableAction::SetWithoutOids,
            Kind::SetLoggedUnlogged => AlterTableAction::SetLogged(rng.random_bool(0.5)),
            Kind::NotOf => AlterTableAction::NotOf,
            Kind::OwnerTo => AlterTableAction::OwnerTo(*pick(
                &[OwnerRole::CurrentUser, OwnerRole::SessionUser],
                rng,
            )),
            Kind::ReplicaIdentity => AlterTableAction::ReplicaIdentity(*pick(
                &[
                    ReplicaIdentity::Default,
                    ReplicaIdentity::Full,
                    ReplicaIdentity::Nothing,
                ],
                rng,
            )),
            Kind::AlterColumnSetIdentity | Kind::AlterColumnSetGenerated => return None,
            Kind::AlterColumnDropIdentity => {
                let column = pick_maybe(&table.integer_columns(), rng)?.name.clone();
                AlterTableAction::DropIdentity {
                    column,
                    if_exists: rng.random_bool(0.5),
                }
            }
            Kind::AlterColumnRestart => {
                let column = pick_maybe(&table.integer_columns(), rng)?.name.clone();
                AlterTableAction::RestartIdentity {
                    column,
                    with: rng.random_bool(0.5).then(|| rng.random_range(2..=200)),
                }
            }
        };
        Some(action)
    }
}

/// A semicolon-joined `ALTER TABLE` statement on `table`.
///
/// `None` when pruning leaves no action or every retained action skipped
/// itself. Nothing outside the call observes a `None` attempt.
impl ArbitraryFromMaybe<&Table> for AlterTableQuery {
    fn arbitrary_from_maybe<R: Rng + ?Sized, C: GenerationContext>(
        rng: &mut R,
        context: &C,
        table: &Table,
    ) -> Option<Self> {
        let opts = &context.opts().alter_table;

        let mut expected_errors = ExpectedErrors::new();
        expected_errors.add_common_expression_errors();
        expected_errors.add_common_insert_update_errors();
        expected_errors.add_common_table_errors();
        expected_errors.add_all(ALTER_TABLE_ERRORS.iter().copied());

        let catalog: Vec<_> = AlterTableActionKind::iter().collect();
        let mut actions = if rng.random_bool(opts.full_subset_prob) {
            nonempty_subset(&catalog, rng)
        } else {
            // fewer actions make it more likely that the whole statement succeeds
            let n = small_number(rng, opts.small_number_max);
            subset(&catalog, n, rng)
        };
        let drawn = actions.len();
        prune_actions(rng, &mut actions, table);
        debug!(table = %table.name, drawn, retained = actions.len(), "alter table actions");
        if actions.is_empty() {
            debug!(table = %table.name, "no applicable alter table action");
            return None;
        }

        let mut fragments = Vec::with_capacity(actions.len());
        for kind in actions {
            expected_errors.add_all(kind.expected_errors().iter().copied());
            if !kind.renders() {
                continue;
            }
            let only = rng.random_bool(opts.only_prob);
            let Some(action) =
                AlterTableAction::arbitrary_from_maybe(rng, context, (table, kind))
            else {
                trace!(?kind, "alter table action skipped");
                continue;
            };
            expected_errors.add_all(action.expected_errors().iter().copied());
            fragments.push(AlterTableFragment {
                table_name: table.name.clone(),
                only,
                action,
            });
        }

        if fragments.is_empty() {
            debug!(table = %table.name, "every alter table action skipped");
            return None;
        }
        Some(AlterTableQuery {
            statement: AlterTable { fragments },
            expected_errors,
        })
    }
}
