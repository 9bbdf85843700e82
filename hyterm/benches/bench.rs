use std::hash::{DefaultHasher, Hash, Hasher};

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use hyterm::fold::identity;
use hyterm::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

struct Ops {
    and: Operation,
    or: Operation,
    not: Operation,
}

impl Ops {
    fn new() -> Self {
        let binary = |name: &str, f: fn(bool, bool) -> bool| {
            Operation::function(name)
                .param("a", Ty::bool())
                .param("b", Ty::bool())
                .returns(Ty::bool())
                .implementation(move |args| match args {
                    [Value::Bool(a), Value::Bool(b)] => Ok(Value::Bool(f(*a, *b))),
                    _ => Err("expected two bools".to_string()),
                })
                .build()
        };
        let not = Operation::function("not")
            .param("a", Ty::bool())
            .returns(Ty::bool())
            .implementation(|args| match args {
                [Value::Bool(a)] => Ok(Value::Bool(!a)),
                _ => Err("expected a bool".to_string()),
            })
            .build();
        Self {
            and: binary("and", |a, b| a && b),
            or: binary("or", |a, b| a || b),
            not,
        }
    }

    fn library(&self) -> RuleLibrary {
        let mut library = RuleLibrary::new();
        for op in [&self.and, &self.or, &self.not] {
            library
                .register(DEFAULT, default_rule(op))
                .expect("default rules are well formed");
        }
        library
    }
}

fn build_random_tree(ops: &Ops, budget: usize) -> Value {
    // Use randomness seeded for determinism.
    let mut rng = ChaCha20Rng::seed_from_u64(0x42);

    fn next_create(ops: &Ops, budget: usize, rng: &mut impl Rng) -> Value {
        if budget == 0 || rng.random_bool(0.1) {
            return Value::Bool(rng.random_bool(0.5));
        }
        let expr = match rng.random_range(0..=2) {
            0 => {
                let a = next_create(ops, budget - 1, rng);
                let b = next_create(ops, budget - 1, rng);
                ops.and.call([a, b])
            }
            1 => {
                let a = next_create(ops, budget - 1, rng);
                let b = next_create(ops, budget - 1, rng);
                ops.or.call([a, b])
            }
            _ => ops.not.call([next_create(ops, budget - 1, rng)]),
        };
        expr.expect("boolean operations accept boolean operands").into()
    }

    next_create(ops, budget, &mut rng)
}

fn bench_construct(c: &mut Criterion) {
    let ops = Ops::new();

    c.bench_function("construct_random_tree", |b| {
        b.iter(|| {
            black_box(build_random_tree(&ops, 10));
        })
    });
}

fn bench_fold(c: &mut Criterion) {
    let ops = Ops::new();
    let tree = build_random_tree(&ops, 12);

    c.bench_function("fold_identity", |b| {
        b.iter(|| {
            black_box(fold(&tree, &mut identity).unwrap());
        })
    });
}

fn bench_equality(c: &mut Criterion) {
    let ops = Ops::new();
    let tree = build_random_tree(&ops, 12);
    let copy = fold(&tree, &mut identity).unwrap();

    c.bench_function("structural_eq", |b| {
        b.iter(|| {
            black_box(tree == copy);
        })
    });

    c.bench_function("hash_cached", |b| {
        b.iter(|| {
            let mut hasher = DefaultHasher::new();
            tree.hash(&mut hasher);
            black_box(hasher.finish());
        })
    });
}

fn bench_rewrite(c: &mut Criterion) {
    let ops = Ops::new();
    let library = ops.library();
    let rewriter = Rewriter::new(&library);
    let tree = build_random_tree(&ops, 8);

    c.bench_function("execute_default_rules", |b| {
        b.iter(|| {
            black_box(rewriter.execute(tree.clone(), DEFAULT).unwrap());
        })
    });
}

criterion_group!(
    benches,
    bench_construct,
    bench_fold,
    bench_equality,
    bench_rewrite,
);
criterion_main!(benches);
