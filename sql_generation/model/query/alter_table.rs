use std::fmt::Display;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::model::expected_errors::ExpectedErrors;
use crate::model::query::Query;
use crate::model::table::ColumnType;

/// The closed catalog of `ALTER TABLE` sub-operations the generator knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::EnumIter)]
pub enum AlterTableActionKind {
    /// `DROP [COLUMN] [IF EXISTS] column [RESTRICT | CASCADE]`
    DropColumn,
    /// `ALTER [COLUMN] column [SET DATA] TYPE data_type`
    AlterColumnType,
    /// `ALTER [COLUMN] column {SET DEFAULT expression | DROP DEFAULT}`
    AlterColumnSetDropDefault,
    /// `ALTER [COLUMN] column {SET | DROP} NOT NULL`
    AlterColumnSetDropNull,
    /// `ALTER [COLUMN] column SET STATISTICS integer`
    AlterColumnSetStatistics,
    /// `ALTER [COLUMN] column SET (attribute_option = value)`
    AlterColumnSetAttributeOption,
    /// `ALTER [COLUMN] column RESET (attribute_option)`
    AlterColumnResetAttributeOption,
    /// `ALTER [COLUMN] column SET STORAGE {PLAIN | EXTERNAL | EXTENDED | MAIN}`
    AlterColumnSetStorage,
    /// `ADD table_constraint`
    AddTableConstraint,
    /// `ADD table_constraint_using_index`
    AddTableConstraintUsingIndex,
    /// `VALIDATE CONSTRAINT constraint_name`
    ValidateConstraint,
    DisableRowLevelSecurity,
    EnableRowLevelSecurity,
    ForceRowLevelSecurity,
    NoForceRowLevelSecurity,
    /// `CLUSTER ON index_name`
    ClusterOn,
    SetWithoutCluster,
    SetWithOids,
    SetWithoutOids,
    /// `SET {LOGGED | UNLOGGED}`
    SetLoggedUnlogged,
    NotOf,
    OwnerTo,
    ReplicaIdentity,
    AlterColumnSetIdentity,
    AlterColumnSetGenerated,
    AlterColumnDropIdentity,
    AlterColumnRestart,
}

impl AlterTableActionKind {
    /// Error substrings this action can raise, registered whether or not it
    /// ends up rendering a fragment.
    pub fn expected_errors(&self) -> &'static [&'static str] {
        use AlterTableActionKind::*;
        match self {
            DropColumn => &[
                "because other objects depend on it",
                "does not exist",
                "cannot drop column",
                "cannot drop inherited column",
            ],
            AlterColumnType => &[
                "cannot be cast automatically to type",
                "foreign key constraint",
                "cannot alter type of a column used by a view or rule",
                "cannot convert infinity to numeric",
                "is duplicated",
                "cannot be cast automatically",
                "is an identity column",
                "identity column type must be smallint, integer, or bigint",
                "out of range",
            ],
            AlterColumnSetDropDefault => &[
                "invalid input syntax",
                "is a generated column",
                "is an identity column",
                "Use ALTER TABLE ... ALTER COLUMN ... DROP IDENTITY instead",
            ],
            // depends on SET vs DROP, see `AlterTableAction::expected_errors`
            AlterColumnSetDropNull => &[],
            AlterColumnSetStatistics => &["must be between"],
            AlterColumnSetAttributeOption => &["value out of bounds for option"],
            AlterColumnResetAttributeOption => &[],
            AlterColumnSetStorage => &["can only have storage PLAIN"],
            AddTableConstraint => &["already exists", "violates check constraint"],
            AddTableConstraintUsingIndex => &[
                "already exists",
                "is not a unique index",
                "is already associated with a constraint",
                "contains expressions",
                "is a partial index",
                "does not have default sorting behavior",
                "cannot create a primary key or unique constraint using such an index",
                "multiple primary keys for table",
                "contains null values",
            ],
            ValidateConstraint => &["does not exist"],
            DisableRowLevelSecurity
            | EnableRowLevelSecurity
            | ForceRowLevelSecurity
            | NoForceRowLevelSecurity => &[],
            ClusterOn => &[
                "cannot cluster on partial index",
                "cannot cluster on invalid index",
                "does not support clustering",
            ],
            SetWithoutCluster | SetWithOids | SetWithoutOids => &[],
            SetLoggedUnlogged => &["because it is temporary"],
            NotOf => &["is not a typed table"],
            OwnerTo | ReplicaIdentity => &[],
            AlterColumnSetIdentity | AlterColumnSetGenerated => &[],
            AlterColumnDropIdentity => &["is not an identity column", "column does not exist"],
            AlterColumnRestart => &[
                "is not an identity column",
                "must be greater than or equal to",
                "cannot restart identity column",
                "column does not exist",
            ],
        }
    }

    /// Actions the target never accepts; they are pruned unconditionally.
    pub fn is_supported(&self) -> bool {
        !matches!(self, AlterTableActionKind::SetWithOids)
    }

    pub fn requires_index(&self) -> bool {
        matches!(
            self,
            AlterTableActionKind::AddTableConstraintUsingIndex | AlterTableActionKind::ClusterOn
        )
    }

    pub fn is_identity(&self) -> bool {
        matches!(
            self,
            AlterTableActionKind::AlterColumnSetIdentity
                | AlterTableActionKind::AlterColumnSetGenerated
                | AlterTableActionKind::AlterColumnDropIdentity
                | AlterTableActionKind::AlterColumnRestart
        )
    }

    /// Identity SET/SET GENERATED stay in the catalog but never render: a
    /// type change earlier in the same statement can make them unresolvable.
    pub fn renders(&self) -> bool {
        !matches!(
            self,
            AlterTableActionKind::AlterColumnSetIdentity
                | AlterTableActionKind::AlterColumnSetGenerated
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropBehavior {
    Restrict,
    Cascade,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::EnumIter)]
pub enum StorageMode {
    Plain,
    External,
    Extended,
    Main,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintKind {
    Unique,
    PrimaryKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowLevelSecurity {
    Disable,
    Enable,
    Force,
    NoForce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OwnerRole {
    CurrentUser,
    SessionUser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplicaIdentity {
    Default,
    Full,
    Nothing,
}

/// A rendered sub-operation, carrying every random choice made for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AlterTableAction {
    DropColumn {
        if_exists: bool,
        column: String,
        behavior: Option<DropBehavior>,
    },
    AlterColumnType {
        column: String,
        set_data: bool,
        data_type: ColumnType,
    },
    /// `SET DEFAULT value` when `Some`, `DROP DEFAULT` otherwise.
    ColumnDefault {
        column: String,
        default: Option<i64>,
    },
    ColumnNotNull {
        column: String,
        not_null: bool,
    },
    SetStatistics {
        column: String,
        target: i32,
    },
    SetAttributeOption {
        column: String,
        n_distinct: f64,
    },
    ResetAttributeOption {
        column: String,
    },
    SetStorage {
        column: String,
        storage: StorageMode,
    },
    AddCheckConstraint {
        name: String,
    },
    AddConstraintUsingIndex {
        name: String,
        kind: ConstraintKind,
        index: String,
    },
    ValidateConstraint {
        name: String,
    },
    RowLevelSecurity(RowLevelSecurity),
    ClusterOn {
        index: String,
    },
    SetWithoutCluster,
    SetWithoutOids,
    SetLogged(bool),
    NotOf,
    OwnerTo(OwnerRole),
    ReplicaIdentity(ReplicaIdentity),
    DropIdentity {
        column: String,
        if_exists: bool,
    },
    RestartIdentity {
        column: String,
        with: Option<i32>,
    },
}

impl AlterTableAction {
    /// Substrings that depend on a choice made while rendering.
    pub fn expected_errors(&self) -> &'static [&'static str] {
        match self {
            AlterTableAction::ColumnNotNull { not_null: true, .. } => &["contains null values"],
            AlterTableAction::ColumnNotNull {
                not_null: false, ..
            } => &["is in a primary key", "is an identity column"],
            _ => &[],
        }
    }
}

impl Display for AlterTableAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlterTableAction::DropColumn {
                if_exists,
                column,
                behavior,
            } => {
                write!(f, "DROP COLUMN ")?;
                if *if_exists {
                    write!(f, "IF EXISTS ")?;
                }
                write!(f, "{column}")?;
                match behavior {
                    Some(DropBehavior::Restrict) => write!(f, " RESTRICT"),
                    Some(DropBehavior::Cascade) => write!(f, " CASCADE"),
                    None => Ok(()),
                }
            }
            AlterTableAction::AlterColumnType {
                column,
                set_data,
                data_type,
            } => {
                write!(f, "ALTER COLUMN {column} ")?;
                if *set_data {
                    write!(f, "SET DATA ")?;
                }
                write!(f, "TYPE {data_type}")
            }
            AlterTableAction::ColumnDefault {
                column,
                default: Some(value),
            } => write!(f, "ALTER COLUMN {column} SET DEFAULT {value}"),
            AlterTableAction::ColumnDefault {
                column,
                default: None,
            } => write!(f, "ALTER COLUMN {column} DROP DEFAULT"),
            AlterTableAction::ColumnNotNull { column, not_null } => {
                let verb = if *not_null { "SET" } else { "DROP" };
                write!(f, "ALTER COLUMN {column} {verb} NOT NULL")
            }
            AlterTableAction::SetStatistics { column, target } => {
                write!(f, "ALTER COLUMN {column} SET STATISTICS {target}")
            }
            AlterTableAction::SetAttributeOption { column, n_distinct } => {
                write!(f, "ALTER COLUMN {column} SET (n_distinct={n_distinct})")
            }
            AlterTableAction::ResetAttributeOption { column } => {
                write!(f, "ALTER COLUMN {column} RESET (n_distinct)")
            }
            AlterTableAction::SetStorage { column, storage } => {
                let storage = match storage {
                    StorageMode::Plain => "PLAIN",
                    StorageMode::External => "EXTERNAL",
                    StorageMode::Extended => "EXTENDED",
                    StorageMode::Main => "MAIN",
                };
                write!(f, "ALTER COLUMN {column} SET STORAGE {storage}")
            }
            AlterTableAction::AddCheckConstraint { name } => {
                write!(f, "ADD CONSTRAINT {name} CHECK (TRUE)")
            }
            AlterTableAction::AddConstraintUsingIndex { name, kind, index } => {
                let kind = match kind {
                    ConstraintKind::Unique => "UNIQUE",
                    ConstraintKind::PrimaryKey => "PRIMARY KEY",
                };
                write!(f, "ADD CONSTRAINT {name} {kind} USING INDEX {index}")
            }
            AlterTableAction::ValidateConstraint { name } => {
                write!(f, "VALIDATE CONSTRAINT {name}")
            }
            AlterTableAction::RowLevelSecurity(rls) => {
                let rls = match rls {
                    RowLevelSecurity::Disable => "DISABLE",
                    RowLevelSecurity::Enable => "ENABLE",
                    RowLevelSecurity::Force => "FORCE",
                    RowLevelSecurity::NoForce => "NO FORCE",
                };
                write!(f, "{rls} ROW LEVEL SECURITY")
            }
            AlterTableAction::ClusterOn { index } => write!(f, "CLUSTER ON {index}"),
            AlterTableAction::SetWithoutCluster => write!(f, "SET WITHOUT CLUSTER"),
            AlterTableAction::SetWithoutOids => write!(f, "SET WITHOUT OIDS"),
            AlterTableAction::SetLogged(true) => write!(f, "SET LOGGED"),
            AlterTableAction::SetLogged(false) => write!(f, "SET UNLOGGED"),
            AlterTableAction::NotOf => write!(f, "NOT OF"),
            AlterTableAction::OwnerTo(OwnerRole::CurrentUser) => write!(f, "OWNER TO CURRENT_USER"),
            AlterTableAction::OwnerTo(OwnerRole::SessionUser) => write!(f, "OWNER TO SESSION_USER"),
            AlterTableAction::ReplicaIdentity(identity) => {
                let identity = match identity {
                    ReplicaIdentity::Default => "DEFAULT",
                    ReplicaIdentity::Full => "FULL",
                    ReplicaIdentity::Nothing => "NOTHING",
                };
                write!(f, "REPLICA IDENTITY {identity}")
            }
            AlterTableAction::DropIdentity { column, if_exists } => {
                write!(f, "ALTER COLUMN {column} DROP IDENTITY")?;
                if *if_exists {
                    write!(f, " IF EXISTS")?;
                }
                Ok(())
            }
            AlterTableAction::RestartIdentity { column, with } => {
                write!(f, "ALTER COLUMN {column} RESTART")?;
                if let Some(with) = with {
                    write!(f, " WITH {with}")?;
                }
                Ok(())
            }
        }
    }
}

/// One `ALTER TABLE [ONLY] <table> <action>` statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlterTableFragment {
    pub table_name: String,
    pub only: bool,
    pub action: AlterTableAction,
}

impl Display for AlterTableFragment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ALTER TABLE ")?;
        if self.only {
            write!(f, "ONLY ")?;
        }
        write!(f, "{} {}", self.table_name, self.action)
    }
}

/// Fragments executed together, joined with `"; "`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlterTable {
    pub fragments: Vec<AlterTableFragment>,
}

impl Display for AlterTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.fragments.iter().join("; "))
    }
}

/// A generated `ALTER TABLE` statement with every error it may legitimately
/// raise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlterTableQuery {
    pub statement: AlterTable,
    pub expected_errors: ExpectedErrors,
}

impl AlterTableQuery {
    pub fn into_query(self) -> Query {
        Query {
            sql: self.statement.to_string(),
            expected_errors: self.expected_errors,
            could_affect_schema: true,
        }
    }
}
