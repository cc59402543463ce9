use collage_core::prelude::*;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn generate_pictures(count: usize, min_size: u32, max_size: u32) -> Vec<(String, Size)> {
    let mut rng = StdRng::seed_from_u64(count as u64);
    (0..count)
        .map(|i| {
            let w = rng.gen_range(min_size..=max_size);
            let h = rng.gen_range(min_size..=max_size);
            (format!("pic_{i}"), Size::new(w as f64, h as f64))
        })
        .collect()
}

fn bench_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan");

    for count in [50, 200, 500] {
        let pictures = generate_pictures(count, 120, 900);
        group.throughput(Throughput::Elements(count as u64));

        for cost in [CostFunction::Axis, CostFunction::Area] {
            group.bench_with_input(
                BenchmarkId::new(cost.to_string(), count),
                &pictures,
                |b, pictures| {
                    b.iter(|| {
                        let cfg = CollageConfig::builder().cost(cost).seed(Some(1)).build();
                        let mut collage = Collage::new(cfg, pictures.clone()).expect("collage");
                        black_box(collage.plan().expect("plan"))
                    });
                },
            );
        }

        group.bench_with_input(
            BenchmarkId::new("Nearest", count),
            &pictures,
            |b, pictures| {
                b.iter(|| {
                    let cfg = CollageConfig::builder()
                        .corner(CornerStrategy::Nearest)
                        .build();
                    let mut collage = Collage::new(cfg, pictures.clone()).expect("collage");
                    black_box(collage.plan().expect("plan"))
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_plan);
criterion_main!(benches);
