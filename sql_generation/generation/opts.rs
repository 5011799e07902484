use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields, default)]
pub struct Opts {
    #[garde(dive)]
    pub query: QueryOpts,
    #[garde(dive)]
    pub alter_table: AlterTableOpts,
}

impl Opts {
    /// Parses a JSON profile and range-checks every knob.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let opts: Opts = serde_json::from_str(s).map_err(|e| Error::InvalidOpts(e.to_string()))?;
        opts.check()?;
        Ok(opts)
    }

    /// Range-checks every knob of an `Opts` built in code.
    pub fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|report| Error::InvalidOpts(report.to_string()))
    }
}

/// Shape probabilities for generated `SELECT` statements.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields, default)]
pub struct QueryOpts {
    #[garde(range(min = 0.0, max = 1.0))]
    pub with_prob: f64,
    #[garde(range(min = 1, max = 8))]
    pub max_ctes: usize,
    #[garde(range(min = 0.0, max = 1.0))]
    pub join_prob: f64,
    #[garde(range(min = 0.0, max = 1.0))]
    pub where_prob: f64,
    #[garde(range(min = 1, max = 16))]
    pub max_predicate_depth: usize,
    #[garde(range(min = 0.0, max = 1.0))]
    pub distinct_prob: f64,
    #[garde(range(min = 0.0, max = 1.0))]
    pub distinct_on_prob: f64,
    #[garde(range(min = 0.0, max = 1.0))]
    pub group_by_prob: f64,
    #[garde(range(min = 0.0, max = 1.0))]
    pub having_prob: f64,
    #[garde(range(min = 0.0, max = 1.0))]
    pub locking_prob: f64,
    #[garde(range(min = 0.0, max = 1.0))]
    pub window_prob: f64,
    #[garde(range(min = 0.0, max = 1.0))]
    pub named_window_prob: f64,
    #[garde(range(min = 0.0, max = 1.0))]
    pub order_by_prob: f64,
    #[garde(range(min = 0.0, max = 1.0))]
    pub limit_prob: f64,
    #[garde(range(min = 1))]
    pub max_limit: u64,
    #[garde(range(min = 0.0, max = 1.0))]
    pub set_operation_prob: f64,
}

impl Default for QueryOpts {
    fn default() -> Self {
        Self {
            with_prob: 0.1,
            max_ctes: 2,
            join_prob: 0.3,
            where_prob: 0.7,
            max_predicate_depth: 3,
            distinct_prob: 0.2,
            distinct_on_prob: 0.3,
            group_by_prob: 0.15,
            having_prob: 0.3,
            locking_prob: 0.2,
            window_prob: 0.15,
            named_window_prob: 0.5,
            order_by_prob: 0.3,
            limit_prob: 0.2,
            max_limit: 100,
            set_operation_prob: 0.1,
        }
    }
}

/// Sampling knobs for `ALTER TABLE` generation.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields, default)]
pub struct AlterTableOpts {
    /// Odds of drawing a non-empty subset of the whole catalog instead of a
    /// small-biased number of actions.
    #[garde(range(min = 0.0, max = 1.0))]
    pub full_subset_prob: f64,
    #[garde(range(min = 0.0, max = 1.0))]
    pub only_prob: f64,
    /// Upper bound of the small-biased subset size.
    #[garde(range(min = 1))]
    pub small_number_max: usize,
}

impl Default for AlterTableOpts {
    fn default() -> Self {
        Self {
            full_subset_prob: 0.5,
            only_prob: 0.5,
            small_number_max: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        Opts::default().validate().unwrap();
    }

    #[test]
    fn test_partial_profile_uses_defaults() {
        let opts = Opts::from_json_str(r#"{ "alter_table": { "only_prob": 0.0 } }"#).unwrap();
        assert_eq!(opts.alter_table.only_prob, 0.0);
        assert_eq!(opts.alter_table.full_subset_prob, 0.5);
        assert_eq!(opts.query.max_limit, 100);
    }

    #[test]
    fn test_rejects_out_of_range_and_unknown_fields() {
        let err = Opts::from_json_str(r#"{ "query": { "join_prob": 1.5 } }"#).unwrap_err();
        assert!(matches!(err, Error::InvalidOpts(_)));
        assert!(!err.is_invariant_violation());

        let err = Opts::from_json_str(r#"{ "alter_table": { "nope": 1 } }"#).unwrap_err();
        assert!(matches!(err, Error::InvalidOpts(_)));

        assert!(Opts::from_json_str(r#"{ "alter_table": { "small_number_max": 0 } }"#).is_err());
    }
}
