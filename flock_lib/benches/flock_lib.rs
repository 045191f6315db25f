use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use flock_lib::{
    borders::RectBorders,
    flock::Flock,
    options::{BehaviourFlags, BoidSettings, BorderSettings},
    rectangle::Rectangle,
    simulation::MAX_DT,
};

fn flock_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("flock_update");
    let borders = RectBorders::new(
        Rectangle::new(0., 0., 1920., 1080.),
        BorderSettings::default(),
    );

    for no_boids in [50, 200, 500].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(no_boids),
            no_boids,
            |b, &n| {
                let mut flock = Flock::new(BoidSettings::default(), BehaviourFlags::default(), 0);
                flock.set_number_of_boids(n, &borders.free_zone());

                b.iter(|| flock.update(black_box(MAX_DT), &borders, None));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, flock_update);
criterion_main!(benches);
