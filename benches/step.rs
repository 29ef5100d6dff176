//! Benchmarks for the simulation step and the packing pass.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec3;

use cinder::prelude::*;

const STEP: f32 = 1.0 / 60.0;

/// A saturated system with the full modifier set, pre-rolled to steady
/// state so every slot is in play.
fn saturated_system(count: usize) -> ParticleSystem {
    let mut system = ParticleSystem::new(
        count as f32, // 1s lifetime: capacity == rate
        Sampler::Constant(1.0),
        Some(EmitterShape::Sphere {
            radius: Sampler::Constant(5.0),
        }),
        StartDirection::Outward,
        Some(Sampler::Uniform { min: 1.0, max: 3.0 }),
    )
    .unwrap()
    .with_seed(1234);

    system.add(Modifier::StartSize {
        size: Sampler::Uniform { min: 0.1, max: 0.5 },
    });
    system.add(Modifier::ColorOverTime {
        start: Vec3::ONE,
        end: Vec3::ZERO,
    });
    system.add(Modifier::ConstantForce {
        force: Vec3::new(0.0, -9.8, 0.0),
    });
    system.fast_forward(2.0, 60);
    system
}

fn bench_update_system(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_system");
    for count in [1_000, 4_000, 16_000] {
        let mut system = saturated_system(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| system.update_system(black_box(STEP), true))
        });
    }
    group.finish();
}

fn bench_update_vertex_buffer(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_vertex_buffer");
    for count in [1_000, 4_000, 16_000] {
        let mut system = saturated_system(count);
        system.update_system(STEP, true);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                system.update_vertex_buffer();
                black_box(system.vertex_buffer().live_count())
            })
        });
    }
    group.finish();
}

fn bench_sorted_pack(c: &mut Criterion) {
    let mut group = c.benchmark_group("sorted_pack");
    for count in [1_000, 4_000, 16_000] {
        let mut system = saturated_system(count).with_depth_sorting(DepthSorting::BackToFront);
        system.set_camera_position(Vec3::new(0.0, 0.0, 30.0));
        system.update_system(STEP, true);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                system.update_vertex_buffer();
                black_box(system.vertex_buffer().live_count())
            })
        });
    }
    group.finish();
}

fn bench_full_frame(c: &mut Criterion) {
    let mut system = saturated_system(10_000);
    system.on_target_added();
    system.on_renderer_added();
    system.play();
    c.bench_function("full_frame_10k", |b| {
        b.iter(|| {
            system.enter_frame_with(black_box(STEP));
            black_box(system.live_count())
        })
    });
}

criterion_group!(
    benches,
    bench_update_system,
    bench_update_vertex_buffer,
    bench_sorted_pack,
    bench_full_frame
);
criterion_main!(benches);
