use rand::Rng;
use strum::IntoEnumIterator;

use crate::generation::{pick, Arbitrary, ArbitraryFrom, GenerationContext};
use crate::model::query::expr::Constant;
use crate::model::table::ColumnType;

impl Arbitrary for ColumnType {
    fn arbitrary<R: Rng + ?Sized, C: GenerationContext>(rng: &mut R, _context: &C) -> Self {
        let types: Vec<_> = ColumnType::iter().collect();
        *pick(&types, rng)
    }
}

fn random_text<R: Rng + ?Sized>(rng: &mut R) -> String {
    let len = rng.random_range(0..8);
    (0..len)
        .map(|_| rng.random_range(b'a'..=b'z') as char)
        .collect()
}

/// A literal the column type accepts.
impl ArbitraryFrom<ColumnType> for Constant {
    fn arbitrary_from<R: Rng + ?Sized, C: GenerationContext>(
        rng: &mut R,
        _context: &C,
        column_type: ColumnType,
    ) -> Self {
        if rng.random_bool(0.05) {
            return Constant::Null;
        }
        match column_type {
            ColumnType::Int => Constant::Integer(rng.random_range(-1000..=1000)),
            ColumnType::Boolean => Constant::Boolean(rng.random_bool(0.5)),
            ColumnType::Text => Constant::Text(random_text(rng)),
            ColumnType::Decimal | ColumnType::Float | ColumnType::Real => {
                Constant::Float((rng.random::<f64>() * 2000.0 - 1000.0).round() / 100.0)
            }
            ColumnType::Range => {
                let lower = rng.random_range(-100..100);
                let upper = lower + rng.random_range(0..100);
                Constant::Typed {
                    literal: format!("[{lower},{upper})"),
                    ty: ColumnType::Range,
                }
            }
            ColumnType::Money => Constant::Typed {
                literal: format!("{}.{:02}", rng.random_range(0..10_000), rng.random_range(0..100)),
                ty: ColumnType::Money,
            },
            ColumnType::Bit => {
                let len = rng.random_range(1..=8);
                Constant::Typed {
                    literal: (0..len)
                        .map(|_| if rng.random_bool(0.5) { '1' } else { '0' })
                        .collect(),
                    ty: ColumnType::Bit,
                }
            }
            ColumnType::Inet => Constant::Typed {
                literal: format!(
                    "{}.{}.{}.{}",
                    rng.random::<u8>(),
                    rng.random::<u8>(),
                    rng.random::<u8>(),
                    rng.random::<u8>()
                ),
                ty: ColumnType::Inet,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::generation::{Opts, SchemaContext};
    use crate::model::table::Schema;

    #[test]
    fn test_literals_match_type() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let schema = Schema::new();
        let opts = Opts::default();
        let context = SchemaContext::new(&schema, &opts);
        for column_type in ColumnType::iter() {
            for _ in 0..50 {
                let constant = Constant::arbitrary_from(&mut rng, &context, column_type);
                match (column_type, &constant) {
                    (_, Constant::Null) => {}
                    (ColumnType::Int, Constant::Integer(_)) => {}
                    (ColumnType::Boolean, Constant::Boolean(_)) => {}
                    (ColumnType::Text, Constant::Text(_)) => {}
                    (ColumnType::Decimal | ColumnType::Float | ColumnType::Real, Constant::Float(_)) => {}
                    (ty, Constant::Typed { ty: literal_ty, .. }) => assert_eq!(ty, *literal_ty),
                    (ty, other) => panic!("{other:?} generated for {ty}"),
                }
            }
        }
    }
}
