use rand::seq::index::sample;
use rand::Rng;

use crate::errors::Result;
use crate::model::table::{Schema, Table};

mod alter_table;
mod expr;
mod opts;
mod select;
mod value;

pub use expr::ScopeColumn;
pub use opts::{AlterTableOpts, Opts, QueryOpts};

/// Arbitrary trait for generating random values
/// An implementation of arbitrary is assumed to be a uniform sampling of
/// the possible values of the type, with a bias towards smaller values for
/// practicality.
pub trait Arbitrary {
    fn arbitrary<R: Rng + ?Sized, C: GenerationContext>(rng: &mut R, context: &C) -> Self;
}

/// ArbitraryFrom trait for generating random values from a given value
/// ArbitraryFrom allows for constructing relations, where the generated
/// value is dependent on the given value. These relations could be constraints
/// such as generating an integer within an interval, or a value that fits in a table,
/// or a predicate satisfying a given table.
pub trait ArbitraryFrom<T> {
    fn arbitrary_from<R: Rng + ?Sized, C: GenerationContext>(
        rng: &mut R,
        context: &C,
        t: T,
    ) -> Self;
}

/// ArbitraryFromMaybe trait for fallibly generating random values from a given value.
/// `None` means the input offered nothing to build from; callers retry with
/// fresh randomness.
pub trait ArbitraryFromMaybe<T> {
    fn arbitrary_from_maybe<R: Rng + ?Sized, C: GenerationContext>(
        rng: &mut R,
        context: &C,
        t: T,
    ) -> Option<Self>
    where
        Self: Sized;
}

/// Generation that goes through validating setters. An `Err` means the
/// generator asked for a clause combination the model refuses.
pub trait TryArbitrary: Sized {
    fn try_arbitrary<R: Rng + ?Sized, C: GenerationContext>(rng: &mut R, context: &C)
        -> Result<Self>;
}

/// Read-only view of what a generation call may draw from.
pub trait GenerationContext {
    fn tables(&self) -> &Vec<Table>;
    fn opts(&self) -> &Opts;
}

/// A schema snapshot paired with generation options.
#[derive(Debug, Clone, Copy)]
pub struct SchemaContext<'a> {
    schema: &'a Schema,
    opts: &'a Opts,
}

impl<'a> SchemaContext<'a> {
    /// `opts` must already be range-checked (`Opts::check` or
    /// `Opts::from_json_str`); out-of-range probabilities panic during
    /// generation.
    pub fn new(schema: &'a Schema, opts: &'a Opts) -> Self {
        Self { schema, opts }
    }

    /// Like `new`, but range-checks `opts` first.
    pub fn try_new(schema: &'a Schema, opts: &'a Opts) -> Result<Self> {
        opts.check()?;
        Ok(Self::new(schema, opts))
    }
}

impl GenerationContext for SchemaContext<'_> {
    fn tables(&self) -> &Vec<Table> {
        &self.schema.tables
    }

    fn opts(&self) -> &Opts {
        self.opts
    }
}

/// Picks a uniformly random element. `choices` must not be empty.
pub fn pick<'a, T, R: Rng + ?Sized>(choices: &'a [T], rng: &mut R) -> &'a T {
    let index = rng.random_range(0..choices.len());
    &choices[index]
}

/// Picks a uniformly random element, or `None` from an empty slice.
pub fn pick_maybe<'a, T, R: Rng + ?Sized>(choices: &'a [T], rng: &mut R) -> Option<&'a T> {
    if choices.is_empty() {
        return None;
    }
    Some(pick(choices, rng))
}

/// Picks `n` distinct elements in random order. `n` is clamped to the
/// slice length.
pub fn pick_n_unique<'a, T, R: Rng + ?Sized>(choices: &'a [T], n: usize, rng: &mut R) -> Vec<&'a T> {
    let n = n.min(choices.len());
    sample(rng, choices.len(), n)
        .into_iter()
        .map(|i| &choices[i])
        .collect()
}

/// A number in `0..=max`, skewed towards 0.
pub fn small_number<R: Rng + ?Sized>(rng: &mut R, max: usize) -> usize {
    let n = (rng.random::<f64>() * rng.random::<f64>() * (max as f64 + 1.0)) as usize; // skew towards 0
    n.min(max)
}

/// A uniformly sized, non-empty subset. Empty input yields an empty subset.
pub fn nonempty_subset<T: Clone, R: Rng + ?Sized>(choices: &[T], rng: &mut R) -> Vec<T> {
    if choices.is_empty() {
        return Vec::new();
    }
    let n = rng.random_range(1..=choices.len());
    subset(choices, n, rng)
}

/// `n` distinct elements, kept in their original order.
pub fn subset<T: Clone, R: Rng + ?Sized>(choices: &[T], n: usize, rng: &mut R) -> Vec<T> {
    let mut indices = sample(rng, choices.len(), n.min(choices.len())).into_vec();
    indices.sort_unstable();
    indices.into_iter().map(|i| choices[i].clone()).collect()
}
