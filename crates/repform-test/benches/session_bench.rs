//! Benchmarks for REPFORM per-frame processing

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};

use repform_analyzer::{ExerciseAnalyzer, ExerciseProfile};
use repform_geometry::{compute_angles, AngleMode};
use repform_runtime::AnalysisSession;
use repform_test::{oscillation, PoseSimulator, PushupForm, SimulatorConfig, SquatForm};

fn bench_compute_angles(c: &mut Criterion) {
    let frame = PoseSimulator::clean().pushup(120.0, PushupForm::CLEAN);
    let specs = ExerciseProfile::pushup().angle_specs();

    c.bench_function("compute_angles_pushup", |b| {
        b.iter(|| black_box(compute_angles(black_box(&frame), &specs, AngleMode::Planar)))
    });
}

fn bench_analyzer_step(c: &mut Criterion) {
    let mut sim = PoseSimulator::new(SimulatorConfig::noisy());
    let frames = sim.squat_sequence(&oscillation(170.0, 90.0, 20, 15, 5), SquatForm::CLEAN);

    let mut group = c.benchmark_group("analyzer_step");
    group.throughput(Throughput::Elements(frames.len() as u64));
    group.bench_function("squat_noisy", |b| {
        b.iter_batched(
            || ExerciseAnalyzer::new(ExerciseProfile::squat()).unwrap(),
            |mut analyzer| {
                for frame in &frames {
                    black_box(analyzer.step(frame));
                }
                analyzer
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_full_session(c: &mut Criterion) {
    let mut sim = PoseSimulator::new(SimulatorConfig::noisy());
    let frames = sim.pushup_sequence(&oscillation(170.0, 80.0, 30, 15, 5), PushupForm::SAGGING);

    let mut group = c.benchmark_group("session");
    group.throughput(Throughput::Elements(frames.len() as u64));
    group.bench_function("pushup_process_and_finalize", |b| {
        b.iter(|| {
            let mut session = AnalysisSession::start("pushup").unwrap();
            session.process_all(&frames).unwrap();
            black_box(session.finalize().unwrap())
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_compute_angles,
    bench_analyzer_step,
    bench_full_session,
);

criterion_main!(benches);
