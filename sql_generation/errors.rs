use crate::model::query::select::LockingClause;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures raised while building statements.
///
/// Invariant violations come from a setter that would have produced an illegal
/// clause combination. Argument errors come from a constructor or builder whose
/// required input is missing or empty. Neither is ever corrected silently.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("FOR {0} is not allowed with DISTINCT clause")]
    LockingWithDistinct(LockingClause),
    #[error("FOR {0} is not allowed with GROUP BY clause")]
    LockingWithGroupBy(LockingClause),
    #[error("DISTINCT ON requires SELECT DISTINCT")]
    DistinctOnWithoutDistinct,
    #[error("CTE name cannot be empty")]
    EmptyCteName,
    #[error("CTE {0} has no defining query")]
    MissingCteQuery(String),
    #[error("CTE list cannot be empty")]
    EmptyCteList,
    #[error("invalid generation options: {0}")]
    InvalidOpts(String),
}

impl Error {
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Error::LockingWithDistinct(_)
                | Error::LockingWithGroupBy(_)
                | Error::DistinctOnWithoutDistinct
        )
    }
}
