use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::DVec2;
use rigid2d::config::WorldConfig;
use rigid2d::core::shape::ColliderShape;
use rigid2d::core::{BodyKind, RigidBody};
use rigid2d::{EntityId, PhysicsWorld};

fn build_stack(count: usize) -> PhysicsWorld {
    let mut world = PhysicsWorld::new(WorldConfig::default());

    let floor = RigidBody::builder(EntityId::default(), BodyKind::Static, ColliderShape::aabb(50.0, 0.5))
        .position(DVec2::new(0.0, -0.5))
        .build();
    world.create_body(floor).unwrap();

    for i in 0..count {
        let body = RigidBody::builder(EntityId::default(), BodyKind::Dynamic, ColliderShape::circle(0.5))
            .position(DVec2::new((i as f64) * 0.05, 0.6 + i as f64 * 1.05))
            .build();
        world.create_body(body).unwrap();
    }
    world
}

fn bench_step_100_bodies(c: &mut Criterion) {
    c.bench_function("step_100_bodies", |b| {
        let mut world = build_stack(100);
        b.iter(|| {
            world.step(black_box(1.0 / 60.0));
        })
    });
}

fn bench_broad_phase_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("broad_phase_scaling");
    for &count in &[10usize, 100, 500] {
        group.bench_with_input(
            criterion::BenchmarkId::new("step", count),
            &count,
            |b, &count| {
                let mut world = build_stack(count);
                b.iter(|| {
                    world.step(black_box(1.0 / 60.0));
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_step_100_bodies, bench_broad_phase_scaling);
criterion_main!(benches);
