use chrono::NaiveDate;
use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use riskmap::analysis::{PortfolioSummary, verify_records};
use riskmap::config::GeneratorConfig;
use riskmap::generator::Generator;
use riskmap::scoring::RiskScorer;
use riskmap::types::Position;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 30).expect("valid date")
}

// ── Group 1: batch — population size scaling ────────────────────────────────

fn bench_batch(c: &mut Criterion) {
    let generator = Generator::new(GeneratorConfig::canonical()).expect("canonical config");
    let mut group = c.benchmark_group("batch");
    for &count in &[1_000usize, 5_000, 20_000] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &n| {
            b.iter_batched(
                || ChaCha20Rng::seed_from_u64(42),
                |mut rng| generator.generate(n, today(), &mut rng).expect("generate"),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

// ── Group 2: scoring — hotspot count scaling ────────────────────────────────

fn bench_scoring(c: &mut Criterion) {
    let base = GeneratorConfig::canonical();
    let mut group = c.benchmark_group("scoring");
    for &copies in &[1usize, 10, 100] {
        let hotspots: Vec<_> = base.hotspots.iter().copied().cycle().take(base.hotspots.len() * copies).collect();
        let scorer = RiskScorer::new(&base.risk).expect("risk config");
        let at = Position::new(-122.45, 37.75);
        group.throughput(Throughput::Elements(hotspots.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(hotspots.len()), &hotspots, |b, spots| {
            let mut rng = ChaCha20Rng::seed_from_u64(42);
            b.iter(|| scorer.assess(spots, at, &mut rng))
        });
    }
    group.finish();
}

// ── Group 3: analysis — verification and summary over a fixed batch ──────────

fn bench_analysis(c: &mut Criterion) {
    let config = GeneratorConfig::canonical();
    let batch = Generator::new(config.clone())
        .expect("canonical config")
        .generate_seeded(20_000, today(), 42)
        .expect("generate");
    let mut group = c.benchmark_group("analysis");
    group.throughput(Throughput::Elements(batch.len() as u64));
    group.bench_function("verify_records", |b| b.iter(|| verify_records(&batch, &config)));
    group.bench_function("summary", |b| b.iter(|| PortfolioSummary::from_properties(&batch, 50.0)));
    group.finish();
}

criterion_group!(benches, bench_batch, bench_scoring, bench_analysis);
criterion_main!(benches);
